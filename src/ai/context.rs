//! Bounded conversation history.

use crate::ai::backend::Message;
use std::collections::VecDeque;

/// Rolling window of past exchanges fed back to the backends. Oldest
/// messages drop first; the system prompt is injected per request and never
/// stored here.
pub struct ConversationContext {
    messages: VecDeque<Message>,
    max_messages: usize,
}

impl ConversationContext {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(max_messages),
            max_messages,
        }
    }

    /// Record one user/assistant exchange, evicting the oldest messages
    /// when over capacity.
    pub fn add_exchange(&mut self, user_input: &str, assistant_reply: &str) {
        self.messages.push_back(Message::user(user_input));
        self.messages.push_back(Message::assistant(assistant_reply));
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchanges_accumulate_in_order() {
        let mut ctx = ConversationContext::new(10);
        ctx.add_exchange("hi", "hello");
        ctx.add_exchange("how are you", "operational");

        let roles: Vec<&str> = ctx.messages().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["user", "assistant", "user", "assistant"]);
        assert_eq!(ctx.len(), 4);
    }

    #[test]
    fn oldest_messages_evict_first() {
        let mut ctx = ConversationContext::new(4);
        ctx.add_exchange("one", "1");
        ctx.add_exchange("two", "2");
        ctx.add_exchange("three", "3");

        assert_eq!(ctx.len(), 4);
        let first = ctx.messages().next().unwrap();
        assert_eq!(first.content, "two");
    }

    #[test]
    fn clear_empties_history() {
        let mut ctx = ConversationContext::new(4);
        ctx.add_exchange("one", "1");
        ctx.clear();
        assert!(ctx.is_empty());
    }
}
