//! Transport test doubles shared across cell test suites.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::{ChatId, ChatTransport, Keyboard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat: ChatId,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

/// Records every outbound message instead of delivering it.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts_for(&self, chat: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.chat == chat)
            .map(|m| m.text.clone())
            .collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(SentMessage {
            chat,
            text: text.to_string(),
            keyboard: None,
        });
        Ok(())
    }

    async fn send_choices(&self, chat: ChatId, text: &str, keyboard: &Keyboard) -> Result<()> {
        self.sent.lock().unwrap().push(SentMessage {
            chat,
            text: text.to_string(),
            keyboard: Some(keyboard.clone()),
        });
        Ok(())
    }
}

/// Delivers the first `succeed_for` messages, then fails every send.
/// Used to exercise partial-failure behavior in the reconciler.
pub struct FlakyTransport {
    inner: RecordingTransport,
    succeed_for: usize,
    attempts: AtomicUsize,
}

impl FlakyTransport {
    pub fn failing_after(succeed_for: usize) -> Self {
        Self {
            inner: RecordingTransport::new(),
            succeed_for,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.inner.sent()
    }
}

#[async_trait]
impl ChatTransport for FlakyTransport {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<()> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) >= self.succeed_for {
            return Err(anyhow!("transport unavailable"));
        }
        self.inner.send_text(chat, text).await
    }

    async fn send_choices(&self, chat: ChatId, text: &str, keyboard: &Keyboard) -> Result<()> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) >= self.succeed_for {
            return Err(anyhow!("transport unavailable"));
        }
        self.inner.send_choices(chat, text, keyboard).await
    }
}
