//! Condition evaluation and branch selection

use crate::graph::order::Link;

/// Source handle of the branch taken when a condition holds
pub const TRUE_HANDLE: &str = "true";

/// Source handle of the branch taken when a condition fails
pub const FALSE_HANDLE: &str = "false";

/// Evaluate a condition expression against the current text.
///
/// An empty expression always holds; otherwise the expression must appear in
/// the input, ignoring case.
pub fn evaluate_condition(expression: &str, input: &str) -> bool {
    let expression = expression.trim();
    if expression.is_empty() {
        return true;
    }
    input.to_lowercase().contains(&expression.to_lowercase())
}

/// Pick the outgoing link of a condition node for `result`.
///
/// Falls back to the first link when no link carries the matching handle.
pub fn select_branch(links: &[Link], result: bool) -> Option<&Link> {
    let wanted = if result { TRUE_HANDLE } else { FALSE_HANDLE };
    links
        .iter()
        .find(|link| link.handle.as_deref() == Some(wanted))
        .or_else(|| links.first())
}
