//! Telegram update handlers.
//!
//! Commands get static / summary replies; every other message is handed to
//! the core forwarder, which reports its own outcome back to the chat.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod commands;
mod forward;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if is_command(&msg) {
        return commands::handle_command(bot, msg, state).await;
    }

    forward::handle_forward(msg, state).await
}

/// Only plain text starting with `/` is a command; captions never are.
fn is_command(msg: &Message) -> bool {
    msg.text().is_some_and(|t| t.starts_with('/'))
}

/// Build a private-chat message from the Bot API JSON shape, with `content`
/// merged over the common fields.
#[cfg(test)]
pub(crate) fn message_from_json(content: serde_json::Value) -> Message {
    let mut v = serde_json::json!({
        "message_id": 7,
        "date": 1_700_000_000,
        "chat": {"id": 42, "type": "private", "first_name": "Ann"},
        "from": {"id": 42, "is_bot": false, "first_name": "Ann"}
    });
    if let (Some(base), Some(extra)) = (v.as_object_mut(), content.as_object()) {
        for (k, val) in extra {
            base.insert(k.clone(), val.clone());
        }
    }
    serde_json::from_value(v).unwrap()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn routes_slash_text_to_commands() {
        assert!(is_command(&message_from_json(json!({"text": "/status"}))));
        assert!(is_command(&message_from_json(json!({"text": "/unknown arg"}))));
        assert!(!is_command(&message_from_json(json!({"text": "hello /status"}))));
    }

    #[test]
    fn media_with_slash_caption_is_forwarded() {
        let msg = message_from_json(json!({
            "caption": "/not-a-command",
            "photo": [{"file_id": "p1", "file_unique_id": "u1", "width": 90, "height": 90}]
        }));
        assert!(!is_command(&msg));
    }
}
