use std::sync::Arc;

use teloxide::prelude::*;

use tracing::debug;

use wfb_core::status::{format_status_text, StatusSource};

use crate::router::AppState;

const START_TEXT: &str = "👋 Welcome to WhatsApp Forwarder Bot!\n\n\
Send any media and it will be forwarded to WhatsApp.\n\
Commands:\n/status - Check connection status";

const HELP_TEXT: &str = "Just send me any media or message!\n\n\
Supported formats:\n\
• Photos 📸\n\
• Videos 🎥\n\
• Documents 📄\n\
• Audio 🎵\n\
• Voice Messages 🎤\n\
• Stickers\n\
• Text Messages 💬\n\n\
I will forward it to the configured WhatsApp chats.";

fn parse_command(text: &str) -> String {
    // Telegram may send `/cmd@botname arg1 ...`
    let first = text.split_whitespace().next().unwrap_or("");
    first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

/// Unknown commands get no reply and are not forwarded.
fn reply_for(cmd: &str, status: &StatusSource) -> Option<String> {
    match cmd {
        "start" => Some(START_TEXT.to_string()),
        "help" => Some(HELP_TEXT.to_string()),
        "status" => Some(format_status_text(&status.snapshot())),
        _ => None,
    }
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let cmd = parse_command(text);
    let Some(reply) = reply_for(&cmd, &state.status) else {
        debug!(chat_id = msg.chat.id.0, "ignoring unknown command /{cmd}");
        return Ok(());
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}
