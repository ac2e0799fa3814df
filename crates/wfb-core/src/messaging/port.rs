use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    Result,
};

/// Port onto the origin messenger.
///
/// Telegram is the only implementation; the dispatcher only needs plain-text
/// replies, edits of its own progress notice, and whole-file downloads.
#[async_trait]
pub trait OriginPort: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;
    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()>;

    /// Download a file by its origin file id, fully into memory.
    async fn download(&self, file_id: &str) -> Result<Vec<u8>>;
}
