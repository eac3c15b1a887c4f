//! Telegram transport: long polling in, text replies with optional keyboards out.

use crate::application::conversation::{ConversationService, IncomingMessage, Reply};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};

/// Polls for updates until the process is stopped.
///
/// Updates from one chat are delivered in order; chats are handled concurrently.
pub async fn run(bot: Bot, service: Arc<ConversationService>) {
    tracing::info!("telegram bot started");

    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let service = Arc::clone(&service);
        async move {
            handle_message(&bot, &service, &msg).await;
            respond(())
        }
    })
    .await;
}

async fn handle_message(bot: &Bot, service: &ConversationService, msg: &Message) {
    let Some(message) = incoming(msg) else {
        tracing::debug!(chat_id = msg.chat.id.0, "ignoring non-text update");
        return;
    };

    let reply = service.handle(message).await;
    if let Err(e) = bot
        .send_message(msg.chat.id, reply.text.clone())
        .reply_markup(markup(&reply))
        .await
    {
        tracing::error!(chat_id = msg.chat.id.0, error = %e, "failed to send reply");
    }
}

fn incoming(msg: &Message) -> Option<IncomingMessage> {
    let text = msg.text()?;
    let sender = msg
        .chat
        .username()
        .or(msg.chat.first_name())
        .unwrap_or_default();

    Some(IncomingMessage {
        chat: msg.chat.id.0,
        sender: sender.to_string(),
        text: text.to_string(),
    })
}

fn markup(reply: &Reply) -> ReplyMarkup {
    match &reply.buttons {
        Some(buttons) => {
            let row: Vec<KeyboardButton> = buttons.iter().map(KeyboardButton::new).collect();
            ReplyMarkup::Keyboard(KeyboardMarkup::new(vec![row]))
        }
        None => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}
