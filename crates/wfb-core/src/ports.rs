use std::sync::Arc;

use async_trait::async_trait;

use crate::{domain::Destination, Result};

/// Invoked by the destination client every time it issues a new pairing
/// challenge (raw data to be rendered as a QR code).
pub type PairingCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Hexagonal port onto the destination network (WhatsApp).
///
/// The wire protocol and session persistence are the implementation's
/// business; the bot only needs session establishment and one send primitive
/// per payload kind.
#[async_trait]
pub trait DestinationClient: Send + Sync {
    /// Establish a session. Resolves once the session is usable; reports
    /// pairing challenges through `on_pairing` while waiting.
    async fn connect(&self, on_pairing: PairingCallback) -> Result<()>;

    /// Whether an established session is still usable.
    async fn is_alive(&self) -> bool {
        true
    }

    async fn send_text(&self, to: &Destination, text: &str) -> Result<()>;
    async fn send_image(&self, to: &Destination, bytes: &[u8], caption: &str) -> Result<()>;
    async fn send_video(
        &self,
        to: &Destination,
        bytes: &[u8],
        caption: &str,
        thumbnail: Option<&[u8]>,
    ) -> Result<()>;
    async fn send_file(
        &self,
        to: &Destination,
        bytes: &[u8],
        file_name: &str,
        caption: &str,
    ) -> Result<()>;
    async fn send_voice(&self, to: &Destination, bytes: &[u8]) -> Result<()>;
    async fn send_audio(&self, to: &Destination, bytes: &[u8], caption: &str) -> Result<()>;
    async fn send_sticker(&self, to: &Destination, bytes: &[u8]) -> Result<()>;
}

/// Produces a still image for a video. Best effort: `None` means "no
/// thumbnail", never an error.
#[async_trait]
pub trait ThumbnailSource: Send + Sync {
    async fn extract(&self, video: &[u8]) -> Option<Vec<u8>>;
}
