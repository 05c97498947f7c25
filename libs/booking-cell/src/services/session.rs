use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;
use uuid::Uuid;

use shared_chat::ChatId;

use crate::models::BookingSession;

/// Process-wide map from conversation to its booking session.
///
/// Each entry carries its own async mutex so that two messages for the
/// same chat are serialized while different chats proceed in parallel.
/// Entries live until the flow completes or errors; there is no expiry
/// for abandoned dialogs.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<ChatId, Arc<tokio::sync::Mutex<BookingSession>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `chat`, creating one at the Start step when
    /// none exists.
    pub fn fetch_or_create(&self, chat: ChatId) -> Arc<tokio::sync::Mutex<BookingSession>> {
        let mut sessions = self.sessions.lock().unwrap();
        Arc::clone(sessions.entry(chat).or_insert_with(|| {
            debug!("Creating booking session for chat {}", chat);
            Arc::new(tokio::sync::Mutex::new(BookingSession::new()))
        }))
    }

    pub fn remove(&self, chat: ChatId) {
        if self.sessions.lock().unwrap().remove(&chat).is_some() {
            debug!("Removed booking session for chat {}", chat);
        }
    }

    pub fn contains(&self, chat: ChatId) -> bool {
        self.sessions.lock().unwrap().contains_key(&chat)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().unwrap().is_empty()
    }
}

/// Best-effort association between resolved patients and the chat that
/// most recently resolved them. Written when identity lookup succeeds,
/// reverse-scanned by the notification reconciler to find a delivery
/// target. Not a source of truth: entries go stale, and when several
/// chats resolved the same patient an arbitrary one wins.
#[derive(Default)]
pub struct PatientChatIndex {
    entries: Mutex<HashMap<ChatId, Uuid>>,
}

impl PatientChatIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `chat` resolved `patient_id`. Last writer wins per chat.
    pub fn record(&self, chat: ChatId, patient_id: Uuid) {
        self.entries.lock().unwrap().insert(chat, patient_id);
    }

    pub fn chat_for_patient(&self, patient_id: Uuid) -> Option<ChatId> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|(_, mapped)| **mapped == patient_id)
            .map(|(chat, _)| *chat)
    }
}
