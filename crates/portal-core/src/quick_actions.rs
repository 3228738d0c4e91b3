/// Canned queries offered as one-key shortcuts. They go through the same
/// `ChatSession::submit` path as typed input.
pub const QUICK_ACTIONS: [&str; 5] = [
    "Show me all my projects",
    "What dates are available for project 12347?",
    "Tell me about project 12345",
    "What are your business hours?",
    "Add a note to project 12345: Customer prefers morning appointments",
];

/// Quick action bound to a 1-based shortcut number
pub fn quick_action(number: usize) -> Option<&'static str> {
    number
        .checked_sub(1)
        .and_then(|idx| QUICK_ACTIONS.get(idx))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_action_lookup() {
        assert_eq!(quick_action(1), Some("Show me all my projects"));
        assert_eq!(quick_action(4), Some("What are your business hours?"));
        assert_eq!(quick_action(0), None);
        assert_eq!(quick_action(6), None);
    }
}
