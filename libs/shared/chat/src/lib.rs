use anyhow::Result;
use async_trait::async_trait;

pub mod test_utils;

/// Identity of one chat conversation, as assigned by the chat transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of selectable text choices rendered as a grid with a fixed
/// column count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    pub choices: Vec<String>,
    pub columns: usize,
}

impl Keyboard {
    pub fn grid(choices: Vec<String>, columns: usize) -> Self {
        Self { choices, columns }
    }

    /// Choices chunked into rows of `columns` entries each.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.choices
            .chunks(self.columns.max(1))
            .map(|row| row.to_vec())
            .collect()
    }
}

/// One outbound message produced by the booking flow or the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl BotReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_choices(text: impl Into<String>, choices: Vec<String>, columns: usize) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(Keyboard::grid(choices, columns)),
        }
    }
}

/// Outbound side of the chat transport. The core only needs to push text
/// (optionally with a choice keyboard) to a conversation; polling and
/// inbound delivery live in the driver binary.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<()>;

    async fn send_choices(&self, chat: ChatId, text: &str, keyboard: &Keyboard) -> Result<()>;

    async fn send_reply(&self, chat: ChatId, reply: &BotReply) -> Result<()> {
        match &reply.keyboard {
            Some(keyboard) => self.send_choices(chat, &reply.text, keyboard).await,
            None => self.send_text(chat, &reply.text).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_chunks_into_rows() {
        let keyboard = Keyboard::grid(
            vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()],
            2,
        );
        assert_eq!(
            keyboard.rows(),
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string(), "d".to_string()],
                vec!["e".to_string()],
            ]
        );
    }

    #[test]
    fn zero_columns_does_not_panic() {
        let keyboard = Keyboard::grid(vec!["a".into()], 0);
        assert_eq!(keyboard.rows(), vec![vec!["a".to_string()]]);
    }
}
