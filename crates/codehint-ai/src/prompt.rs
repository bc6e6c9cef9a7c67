//! Prompt construction for hint requests.

use crate::engine::ChatMessage;

/// The code under study and the part of it a hint is wanted for.
#[derive(Debug, Clone, Copy)]
pub struct HintRequest<'a> {
    pub code: &'a str,
    pub highlighted: &'a str,
}

impl<'a> HintRequest<'a> {
    pub fn new(code: &'a str, highlighted: &'a str) -> Self {
        Self { code, highlighted }
    }

    /// The full snippet goes in the system message, the highlight in the user message.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(format!("<code>\n{}\n</code>\n", self.code)),
            ChatMessage::user(format!("<highlight>\n{}\n</highlight>", self.highlighted)),
        ]
    }
}
