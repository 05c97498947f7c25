//! Telegram side of the bot: outbound transport implementation and the
//! long-polling dispatcher that feeds inbound text to the message handler.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, Recipient};
use tracing::debug;

use booking_cell::services::MessageHandler;
use shared_chat::{ChatId, ChatTransport, Keyboard};

pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn recipient(chat: ChatId) -> Recipient {
        Recipient::Id(teloxide::types::ChatId(chat.0))
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<()> {
        self.bot.send_message(Self::recipient(chat), text).await?;
        Ok(())
    }

    async fn send_choices(&self, chat: ChatId, text: &str, keyboard: &Keyboard) -> Result<()> {
        let rows: Vec<Vec<KeyboardButton>> = keyboard
            .rows()
            .into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect())
            .collect();
        let markup = KeyboardMarkup::new(rows).resize_keyboard().one_time_keyboard();

        self.bot
            .send_message(Self::recipient(chat), text)
            .reply_markup(markup)
            .await?;
        Ok(())
    }
}

/// Long-polls Telegram and routes each inbound text message through the
/// booking message handler. Non-text updates are ignored.
pub async fn run_dispatcher(
    bot: Bot,
    handler: Arc<MessageHandler>,
    transport: Arc<TelegramTransport>,
) {
    let update_handler = Update::filter_message().endpoint(move |msg: Message| {
        let handler = Arc::clone(&handler);
        let transport = Arc::clone(&transport);
        async move {
            let chat = ChatId(msg.chat.id.0);
            match msg.text() {
                Some(text) => handler.handle(chat, text, transport.as_ref()).await,
                None => debug!("Ignoring non-text message in chat {}", chat),
            }
            respond(())
        }
    });

    Dispatcher::builder(bot, update_handler)
        .default_handler(|_| async {}) // Silently ignore non-message updates
        .build()
        .dispatch()
        .await;
}
