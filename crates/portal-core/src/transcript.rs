use crate::state::ChatMessage;

/// Greeting every session starts with.
pub const GREETING: &str =
    "Hello! I'm your property management assistant. How can I help you today?";

/// Ordered, append-only history of the chat. Messages are never removed,
/// edited or reordered.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// New transcript holding only the assistant greeting
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn snapshot(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Never zero: the greeting is always present.
    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatRole;

    #[test]
    fn test_starts_with_greeting() {
        let transcript = Transcript::new();
        assert_eq!(transcript.len(), 1);
        let first = &transcript.snapshot()[0];
        assert_eq!(first.role, ChatRole::Assistant);
        assert_eq!(first.content, GREETING);
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut transcript = Transcript::new();
        transcript.append(ChatMessage::user("first"));
        transcript.append(ChatMessage::user("first"));
        transcript.append(ChatMessage::assistant("second"));

        let contents: Vec<&str> = transcript
            .snapshot()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec![GREETING, "first", "first", "second"]);
        assert_eq!(transcript.snapshot()[3].role, ChatRole::Assistant);
    }
}
