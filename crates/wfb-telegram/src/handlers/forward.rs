use std::sync::Arc;

use teloxide::prelude::*;
use tracing::debug;

use wfb_core::{
    domain::ChatId,
    messaging::types::{DocumentRef, InboundParts},
};

use crate::router::AppState;

/// Copy every content slot of a Telegram message into the core model. The
/// core decides precedence.
fn inbound_parts(msg: &Message) -> InboundParts {
    InboundParts {
        text: msg.text().map(|s| s.to_string()),
        caption: msg.caption().map(|s| s.to_string()),
        photo: msg
            .photo()
            .and_then(|sizes| sizes.last())
            .map(|p| p.file.id.clone()),
        video: msg.video().map(|v| v.file.id.clone()),
        document: msg.document().map(|d| DocumentRef {
            file_id: d.file.id.clone(),
            file_name: d.file_name.clone(),
        }),
        audio: msg.audio().map(|a| a.file.id.clone()),
        voice: msg.voice().map(|v| v.file.id.clone()),
        sticker: msg.sticker().map(|s| s.file.id.clone()),
    }
}

pub async fn handle_forward(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = ChatId(msg.chat.id.0);
    let outcome = state
        .forwarder
        .dispatch(state.origin.as_ref(), chat_id, inbound_parts(&msg))
        .await;
    debug!(chat_id = chat_id.0, ?outcome, "message handled");
    Ok(())
}
