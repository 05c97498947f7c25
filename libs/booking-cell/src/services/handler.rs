use std::sync::Arc;

use tracing::{error, warn};

use shared_chat::{ChatId, ChatTransport};
use shared_config::AppConfig;

use crate::services::flow::BookingFlowService;
use crate::services::session::{PatientChatIndex, SessionRegistry};

const RESTART_MESSAGE: &str = "Something went wrong. Please start over.";

/// Top-level inbound message handling: session lifecycle around the state
/// machine, plus the catch-all error policy. Any failure mid-flow is
/// logged, answered with a restart message and the session is discarded;
/// no partial-state recovery is attempted.
pub struct MessageHandler {
    flow: BookingFlowService,
    registry: Arc<SessionRegistry>,
}

impl MessageHandler {
    pub fn new(
        config: &AppConfig,
        registry: Arc<SessionRegistry>,
        index: Arc<PatientChatIndex>,
    ) -> Self {
        Self {
            flow: BookingFlowService::new(config, index),
            registry,
        }
    }

    pub async fn handle(&self, chat: ChatId, text: &str, transport: &dyn ChatTransport) {
        let session = self.registry.fetch_or_create(chat);
        // Per-chat lock: a second message for the same chat waits here
        // instead of racing on the session state.
        let mut session = session.lock().await;

        match self.flow.advance(chat, &mut session, text).await {
            Ok(outcome) => {
                for reply in &outcome.replies {
                    if let Err(e) = transport.send_reply(chat, reply).await {
                        error!("Failed to send reply to chat {}: {:#}", chat, e);
                        self.abort(chat, transport).await;
                        return;
                    }
                }
                if outcome.done {
                    self.registry.remove(chat);
                }
            }
            Err(e) => {
                error!("Error handling message for chat {}: {:#}", chat, e);
                self.abort(chat, transport).await;
            }
        }
    }

    async fn abort(&self, chat: ChatId, transport: &dyn ChatTransport) {
        if let Err(e) = transport.send_text(chat, RESTART_MESSAGE).await {
            warn!("Failed to send restart message to chat {}: {:#}", chat, e);
        }
        self.registry.remove(chat);
    }
}
