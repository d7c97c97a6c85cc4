//! Console channel
//!
//! Runs a single conversation over stdin/stdout for local use.

use std::sync::Arc;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::models::{InboundActivity, OutboundActivity};
use crate::state::ConversationId;
use crate::utils::errors::Result;
use crate::utils::helpers::format_choices;
use super::controller::{ActivitySink, RootController};

pub const CONSOLE_CHANNEL: &str = "console";
pub const CONSOLE_BOT_ID: &str = "azbuddy";
pub const CONSOLE_USER_ID: &str = "console-user";

pub fn render(activity: &OutboundActivity) -> String {
    match activity.choices.as_deref() {
        Some(choices) if !choices.is_empty() => {
            format!("{}\n{}\n", activity.text, format_choices(choices))
        }
        _ => format!("{}\n", activity.text),
    }
}

/// Writes each outbound activity as plain text
pub struct ConsoleSink<W> {
    writer: Mutex<W>,
}

impl ConsoleSink<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> ConsoleSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> ActivitySink for ConsoleSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&self, _conversation: &ConversationId, activity: &OutboundActivity) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(render(activity).as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Read lines from stdin until EOF, one turn per non-empty line
pub async fn run_console(controller: Arc<RootController>) -> Result<()> {
    let conversation = ConversationId::new(CONSOLE_CHANNEL, "local");
    let sink = ConsoleSink::stdout();

    info!(conversation = %conversation, "Console session started");

    let joined = InboundActivity::conversation_update(
        conversation.clone(),
        CONSOLE_BOT_ID,
        vec![CONSOLE_USER_ID.to_string()],
    );
    controller.on_turn(&joined, &sink).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let activity = InboundActivity::message(conversation.clone(), CONSOLE_BOT_ID, line);
        if let Err(e) = controller.on_turn(&activity, &sink).await {
            error!(error = %e, severity = %e.severity(), "Error handling console input");
            if !e.is_recoverable() {
                return Err(e);
            }
        }
    }

    info!("Console input closed");
    Ok(())
}
