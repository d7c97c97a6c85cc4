//! Telegram channel
//!
//! Text messages and new chat members are turned into inbound activities for
//! the controller; outbound choice prompts go out with a one-time reply
//! keyboard so a tap comes back as plain text.

use std::sync::Arc;
use async_trait::async_trait;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, KeyboardRemove};
use tracing::{debug, error, info, warn};

use crate::models::{InboundActivity, OutboundActivity};
use crate::state::ConversationId;
use crate::utils::errors::{AzBuddyError, Result};
use super::controller::{ActivitySink, RootController};

pub const TELEGRAM_CHANNEL: &str = "telegram";

type HandlerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// The bot's own user id, used as the activity recipient
#[derive(Debug, Clone)]
pub struct BotIdentity(pub String);

pub fn conversation_for(chat_id: ChatId) -> ConversationId {
    ConversationId::new(TELEGRAM_CHANNEL, &chat_id.0.to_string())
}

pub fn text_activity(chat_id: ChatId, bot_id: &str, text: &str) -> InboundActivity {
    InboundActivity::message(conversation_for(chat_id), bot_id, text)
}

pub fn members_activity(chat_id: ChatId, bot_id: &str, member_ids: Vec<String>) -> InboundActivity {
    InboundActivity::conversation_update(conversation_for(chat_id), bot_id, member_ids)
}

/// One button per row, hidden after the first tap
pub fn choice_keyboard(choices: &[String]) -> KeyboardMarkup {
    KeyboardMarkup::new(
        choices
            .iter()
            .map(|choice| vec![KeyboardButton::new(choice.as_str())]),
    )
    .one_time_keyboard()
    .resize_keyboard()
}

/// Delivers outbound activities with the Bot API
#[derive(Debug, Clone)]
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ActivitySink for TelegramSink {
    async fn send(&self, conversation: &ConversationId, activity: &OutboundActivity) -> Result<()> {
        let chat_id = conversation.conversation_id.parse::<i64>().map_err(|_| {
            AzBuddyError::InvalidInput(format!("Not a Telegram chat id: {}", conversation.conversation_id))
        })?;

        let request = self.bot.send_message(ChatId(chat_id), activity.text.as_str());
        match &activity.choices {
            Some(choices) => request.reply_markup(choice_keyboard(choices)).await?,
            None => request.reply_markup(KeyboardRemove::new()).await?,
        };

        Ok(())
    }
}

/// Long-poll Telegram until the process is stopped
pub async fn run_telegram(bot: Bot, controller: Arc<RootController>) -> Result<()> {
    let me = bot.get_me().await?;
    let identity = BotIdentity(me.id.0.to_string());
    info!(bot_id = %identity.0, username = ?me.username, "Connected to Telegram");

    let sink = Arc::new(TelegramSink::new(bot.clone()));

    Dispatcher::builder(bot, create_handler())
        .dependencies(dptree::deps![controller, sink, identity])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram dispatcher stopped");
    Ok(())
}

fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use teloxide::dispatching::UpdateFilterExt;

    Update::filter_message()
        .branch(
            dptree::filter(|msg: Message| msg.new_chat_members().is_some())
                .endpoint(handle_new_members),
        )
        .branch(
            dptree::filter(|msg: Message| msg.text().is_some())
                .endpoint(handle_text),
        )
}

async fn handle_text(
    msg: Message,
    controller: Arc<RootController>,
    sink: Arc<TelegramSink>,
    identity: BotIdentity,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let activity = text_activity(msg.chat.id, &identity.0, text);
    if let Err(e) = controller.on_turn(&activity, sink.as_ref()).await {
        error!(error = %e, severity = %e.severity(), chat_id = %msg.chat.id, "Error handling message");
        return Err(e.into());
    }

    Ok(())
}

async fn handle_new_members(
    msg: Message,
    controller: Arc<RootController>,
    sink: Arc<TelegramSink>,
    identity: BotIdentity,
) -> HandlerResult {
    let member_ids: Vec<String> = msg
        .new_chat_members()
        .unwrap_or_default()
        .iter()
        .filter(|user| !user.is_bot || user.id.0.to_string() == identity.0)
        .map(|user| user.id.0.to_string())
        .collect();

    if member_ids.is_empty() {
        warn!(chat_id = %msg.chat.id, "Only bots joined, ignoring");
        return Ok(());
    }

    let activity = members_activity(msg.chat.id, &identity.0, member_ids);
    if let Err(e) = controller.on_turn(&activity, sink.as_ref()).await {
        error!(error = %e, severity = %e.severity(), chat_id = %msg.chat.id, "Error handling new chat members");
        return Err(e.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityKind;

    #[test]
    fn test_text_activity_keys_by_chat() {
        let activity = text_activity(ChatId(-1001), "77", "storage account");

        assert_eq!(activity.kind, ActivityKind::Message);
        assert_eq!(activity.conversation, ConversationId::new("telegram", "-1001"));
        assert_eq!(activity.text.as_deref(), Some("storage account"));
        assert_eq!(activity.recipient_id, "77");
    }

    #[test]
    fn test_members_activity_excludes_bot_from_added() {
        let activity = members_activity(
            ChatId(5),
            "77",
            vec!["77".to_string(), "1234".to_string()],
        );

        assert_eq!(activity.kind, ActivityKind::ConversationUpdate);
        assert_eq!(activity.added_members().collect::<Vec<_>>(), vec!["1234"]);
    }

    #[test]
    fn test_choice_keyboard_layout() {
        let keyboard = choice_keyboard(&["Yes".to_string(), "No".to_string()]);

        assert_eq!(keyboard.keyboard.len(), 2);
        assert_eq!(keyboard.keyboard[0][0].text, "Yes");
        assert_eq!(keyboard.keyboard[1][0].text, "No");
    }
}
