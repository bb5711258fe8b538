//! Intent enumeration.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::RoutingError;

/// What kind of work a user request represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Catch-all when no rule matches.
    #[default]
    General,
    Research,
    Design,
    Implement,
    Debug,
    Review,
    Docs,
    UxDesign,
    Accessibility,
}

impl Intent {
    /// Every intent, default first.
    pub const ALL: [Intent; 9] = [
        Intent::General,
        Intent::Research,
        Intent::Design,
        Intent::Implement,
        Intent::Debug,
        Intent::Review,
        Intent::Docs,
        Intent::UxDesign,
        Intent::Accessibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::General => "general",
            Intent::Research => "research",
            Intent::Design => "design",
            Intent::Implement => "implement",
            Intent::Debug => "debug",
            Intent::Review => "review",
            Intent::Docs => "docs",
            Intent::UxDesign => "ux_design",
            Intent::Accessibility => "accessibility",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Intent {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Intent::ALL
            .iter()
            .copied()
            .find(|intent| intent.as_str() == normalized)
            .ok_or_else(|| RoutingError::UnknownIntent(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_general() {
        assert_eq!(Intent::default(), Intent::General);
    }

    #[test]
    fn test_parse() {
        assert_eq!("ux_design".parse::<Intent>().unwrap(), Intent::UxDesign);
        assert_eq!("Docs".parse::<Intent>().unwrap(), Intent::Docs);
        assert!(matches!(
            "synthesis".parse::<Intent>(),
            Err(RoutingError::UnknownIntent(_))
        ));
    }
}
