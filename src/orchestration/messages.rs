//! Per-step message construction.

use crate::context::OrchestrationContext;
use crate::provider::{system_message, user_message, InternalMessage};
use crate::registry::Agent;

/// Fixed text placed between space instructions and the role fragment
pub const SYSTEM_PREAMBLE: &str = "You are an AI assistant with a specialized role.";

/// Input text for the step at `order_index`.
///
/// The first step receives the original request verbatim; later steps see
/// the previous step's output followed by the original request.
pub fn step_input(order_index: usize, original_input: &str, previous_output: &str) -> String {
    if order_index == 0 {
        original_input.to_string()
    } else {
        format!(
            "Previous output:\n{}\n\nOriginal request: {}",
            previous_output, original_input
        )
    }
}

/// System prompt for one agent: space instructions, preamble, role
/// fragment, then source context. Absent or blank parts are skipped and the
/// rest are separated by a blank line.
pub fn system_prompt(agent: &Agent, context: &OrchestrationContext) -> String {
    let parts = [
        context.space_instructions().unwrap_or(""),
        SYSTEM_PREAMBLE,
        agent.prompt_fragment.as_str(),
        context.source_context(),
    ];

    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Full message list for one step: system prompt, prior history in
/// original order, then the step input as the final user message.
///
/// Rebuilt for every step; only the system prompt's role fragment and the
/// trailing user message differ between steps of a run.
pub fn build_step_messages(
    agent: &Agent,
    context: &OrchestrationContext,
    input: &str,
) -> Vec<InternalMessage> {
    let mut messages = Vec::with_capacity(context.messages().len() + 2);
    messages.push(system_message(system_prompt(agent, context)));
    messages.extend(context.messages().iter().cloned());
    messages.push(user_message(input));
    messages
}
