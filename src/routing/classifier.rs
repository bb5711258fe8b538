//! Rule-based intent classification.
//!
//! Rules are `(intent, matchers, priority)` value objects. They are sorted
//! once by descending priority; classification walks them in that order and
//! the first rule with any matching predicate wins. Nothing is scored.

use regex::Regex;
use std::cmp::Reverse;
use std::fmt;

use super::{Intent, RoutingResult};

/// Predicate over normalized (trimmed, lower-cased) user input.
pub trait IntentMatcher: Send + Sync {
    fn matches(&self, normalized: &str) -> bool;
}

impl IntentMatcher for Regex {
    fn matches(&self, normalized: &str) -> bool {
        self.is_match(normalized)
    }
}

/// Matches when any keyword occurs as a substring.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
}

impl KeywordMatcher {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

impl IntentMatcher for KeywordMatcher {
    fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|k| normalized.contains(k.as_str()))
    }
}

/// Adapts a closure into an [`IntentMatcher`].
pub struct PredicateMatcher<F>(pub F);

impl<F> IntentMatcher for PredicateMatcher<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, normalized: &str) -> bool {
        (self.0)(normalized)
    }
}

/// One classification rule.
pub struct ClassificationRule {
    intent: Intent,
    priority: i32,
    matchers: Vec<Box<dyn IntentMatcher>>,
}

impl ClassificationRule {
    pub fn new(intent: Intent, priority: i32) -> Self {
        Self {
            intent,
            priority,
            matchers: Vec::new(),
        }
    }

    /// Add an arbitrary predicate.
    pub fn with_matcher(mut self, matcher: impl IntentMatcher + 'static) -> Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    /// Add one regex matcher per pattern.
    pub fn with_patterns(mut self, patterns: &[&str]) -> RoutingResult<Self> {
        for pattern in patterns {
            self.matchers.push(Box::new(Regex::new(pattern)?));
        }
        Ok(self)
    }

    /// Add a substring matcher over the given keywords.
    pub fn with_keywords(self, keywords: &[&str]) -> Self {
        self.with_matcher(KeywordMatcher::new(keywords))
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    fn matches(&self, normalized: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(normalized))
    }
}

impl fmt::Debug for ClassificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationRule")
            .field("intent", &self.intent)
            .field("priority", &self.priority)
            .field("matchers", &self.matchers.len())
            .finish()
    }
}

/// Maps free text to exactly one [`Intent`].
///
/// Pure and total: no I/O, never fails, and unmatched or blank input
/// degrades to the default intent.
#[derive(Debug)]
pub struct IntentClassifier {
    rules: Vec<ClassificationRule>,
    default_intent: Intent,
}

impl IntentClassifier {
    /// Build a classifier; rules are sorted by descending priority.
    ///
    /// The sort is stable, so rules sharing a priority keep their given order.
    pub fn new(mut rules: Vec<ClassificationRule>) -> Self {
        rules.sort_by_key(|rule| Reverse(rule.priority));
        Self {
            rules,
            default_intent: Intent::default(),
        }
    }

    /// Override the fallback intent.
    pub fn with_default(mut self, intent: Intent) -> Self {
        self.default_intent = intent;
        self
    }

    /// Classifier with the built-in rule table.
    pub fn builtin() -> RoutingResult<Self> {
        Ok(Self::new(builtin_rules()?))
    }

    pub fn classify(&self, input: &str) -> Intent {
        let normalized = input.trim().to_lowercase();
        if normalized.is_empty() {
            return self.default_intent;
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map(|rule| rule.intent)
            .unwrap_or(self.default_intent)
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub fn default_intent(&self) -> Intent {
        self.default_intent
    }
}

/// Built-in rules. More specific intents carry higher priority so that, for
/// example, an accessibility request that also says "add" is not routed to
/// plain implementation.
pub fn builtin_rules() -> RoutingResult<Vec<ClassificationRule>> {
    Ok(vec![
        ClassificationRule::new(Intent::Accessibility, 100).with_patterns(&[
            r"\baccessib",
            r"\ba11y\b",
            r"\bscreen[- ]?readers?\b",
            r"\baria[- ]",
            r"\bwcag\b",
            r"\bcontrast ratio",
            r"\bkeyboard navigation\b",
        ])?,
        ClassificationRule::new(Intent::UxDesign, 90).with_patterns(&[
            r"\bux\b",
            r"\buser experience\b",
            r"\bwireframes?\b",
            r"\bmock-?ups?\b",
            r"\buser flows?\b",
            r"\busability\b",
            r"\bui design\b",
        ])?,
        ClassificationRule::new(Intent::Debug, 80).with_patterns(&[
            r"\bdebug",
            r"\bwaveforms?\b",
            r"\b(vcd|fsdb|fst)\b",
            r"\bglitch",
            r"\btiming violations?\b",
            r"\bx[- ]propagation\b",
            r"\broot[- ]cause\b",
            r"\bsimulation (fails|failed|failure|mismatch)",
            r"\bwhy (does|is|did)\b.*\b(fail|stuck|hang|wrong)",
        ])?,
        ClassificationRule::new(Intent::Review, 70).with_patterns(&[
            r"\breview",
            r"\baudit\b",
            r"\bcritique\b",
            r"\blint\b",
            r"\bcheck (my|this|the) (code|rtl|design)\b",
        ])?,
        ClassificationRule::new(Intent::Docs, 60).with_patterns(&[
            r"\bdocument(ation)?\b",
            r"\breadme\b",
            r"\bdocstrings?\b",
            r"\bwrite[- ]?up\b",
            r"\bdatasheet\b",
            r"\bregister map\b",
        ])?,
        ClassificationRule::new(Intent::Design, 50).with_patterns(&[
            r"\bdesign\b",
            r"\barchitect",
            r"\bmicro-?architecture\b",
            r"\bblock diagram\b",
            r"\bplan (out|for|a|the)\b",
        ])?,
        ClassificationRule::new(Intent::Research, 40).with_patterns(&[
            r"\bresearch",
            r"\binvestigate\b",
            r"\bcompare\b",
            r"\bsurvey\b",
            r"\bwhat (is|are)\b",
            r"\bdifference between\b",
            r"\blook up\b",
        ])?,
        ClassificationRule::new(Intent::Implement, 30).with_patterns(&[
            r"\bimplement",
            r"\bwrite\b",
            r"\bcode\b",
            r"\badd\b",
            r"\bbuild\b",
            r"\bcreate\b",
            r"\bgenerate\b",
            r"\bfix\b",
            r"\brefactor",
        ])?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::builtin().unwrap()
    }

    #[test]
    fn test_blank_input_falls_back_to_default() {
        let classifier = classifier();
        assert_eq!(classifier.classify(""), Intent::General);
        assert_eq!(classifier.classify("   "), Intent::General);
        assert_eq!(classifier.classify("\n\t"), Intent::General);
    }

    #[test]
    fn test_unmatched_input_falls_back_to_default() {
        assert_eq!(classifier().classify("hello there"), Intent::General);
    }

    #[test]
    fn test_builtin_examples() {
        let classifier = classifier();
        let cases = [
            ("What is the AXI4 burst boundary rule?", Intent::Research),
            ("Design a 4-entry async FIFO", Intent::Design),
            ("Implement a gray-code counter in SystemVerilog", Intent::Implement),
            ("Why does the handshake get stuck after reset?", Intent::Debug),
            ("Look at this waveform around cycle 1200", Intent::Debug),
            ("Please review my arbiter RTL", Intent::Review),
            ("Write a README for the uart block", Intent::Docs),
            ("Sketch a wireframe for the signal browser", Intent::UxDesign),
            ("Is the color contrast ratio ok for the plot legend?", Intent::Accessibility),
        ];
        for (input, expected) in cases {
            assert_eq!(classifier.classify(input), expected, "input: {input}");
        }
    }

    #[test]
    fn test_higher_priority_rule_wins() {
        let classifier = classifier();
        // matches both accessibility and implement
        assert_eq!(
            classifier.classify("Add screen reader support to the waveform legend"),
            Intent::Accessibility
        );
        // matches both review and design
        assert_eq!(classifier.classify("design review for the DMA engine"), Intent::Review);
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(classifier().classify("DEBUG THE VCD"), Intent::Debug);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = classifier();
        let input = "create a testbench and review the coverage";
        let first = classifier.classify(input);
        for _ in 0..10 {
            assert_eq!(classifier.classify(input), first);
        }
    }

    #[test]
    fn test_rules_sorted_by_descending_priority() {
        let classifier = IntentClassifier::new(vec![
            ClassificationRule::new(Intent::Implement, 1).with_keywords(&["x"]),
            ClassificationRule::new(Intent::Review, 10).with_keywords(&["x"]),
            ClassificationRule::new(Intent::Docs, 5).with_keywords(&["x"]),
        ]);
        let order: Vec<Intent> = classifier.rules().iter().map(|r| r.intent()).collect();
        assert_eq!(order, vec![Intent::Review, Intent::Docs, Intent::Implement]);
        assert_eq!(classifier.classify("x"), Intent::Review);
    }

    #[test]
    fn test_equal_priority_keeps_declaration_order() {
        let classifier = IntentClassifier::new(vec![
            ClassificationRule::new(Intent::Docs, 5).with_keywords(&["spec"]),
            ClassificationRule::new(Intent::Design, 5).with_keywords(&["spec"]),
        ]);
        assert_eq!(classifier.classify("the spec"), Intent::Docs);
    }

    #[test]
    fn test_predicate_matcher_and_custom_default() {
        let classifier = IntentClassifier::new(vec![ClassificationRule::new(Intent::Debug, 1)
            .with_matcher(PredicateMatcher(|input: &str| input.ends_with("?!")))])
        .with_default(Intent::Research);

        assert_eq!(classifier.classify("it broke again?!"), Intent::Debug);
        assert_eq!(classifier.classify("nothing special"), Intent::Research);
        assert_eq!(classifier.classify(""), Intent::Research);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let result = ClassificationRule::new(Intent::Docs, 1).with_patterns(&["(unclosed"]);
        assert!(result.is_err());
    }
}
