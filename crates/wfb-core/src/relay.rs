use std::sync::Arc;

use tracing::{error, warn};

use crate::{
    connectivity::ConnectivityReader, domain::Destination, payload::RelayPayload,
    ports::DestinationClient,
};

/// Outbound relay adapter: one payload, one destination, one send.
#[derive(Clone)]
pub struct Relay {
    client: Arc<dyn DestinationClient>,
    connectivity: ConnectivityReader,
}

impl Relay {
    pub fn new(client: Arc<dyn DestinationClient>, connectivity: ConnectivityReader) -> Self {
        Self {
            client,
            connectivity,
        }
    }

    /// Send `payload` to `to`. Returns `false` (after logging) when the
    /// session is down or the client fails; never retries.
    pub async fn send(&self, to: &Destination, payload: &RelayPayload) -> bool {
        if !self.connectivity.is_connected() {
            warn!(destination = %to, "whatsapp not connected; dropping {}", payload.kind());
            return false;
        }

        let res = match payload {
            RelayPayload::Text { text } => self.client.send_text(to, text).await,
            RelayPayload::Photo { bytes, caption } => {
                self.client.send_image(to, bytes, caption).await
            }
            RelayPayload::Video {
                bytes,
                caption,
                thumbnail,
            } => {
                self.client
                    .send_video(to, bytes, caption, thumbnail.as_deref())
                    .await
            }
            RelayPayload::Document {
                bytes,
                file_name,
                caption,
            } => self.client.send_file(to, bytes, file_name, caption).await,
            RelayPayload::Audio {
                bytes,
                voice: true,
                ..
            } => self.client.send_voice(to, bytes).await,
            RelayPayload::Audio { bytes, caption, .. } => {
                self.client.send_audio(to, bytes, caption).await
            }
            RelayPayload::Sticker { bytes } => self.client.send_sticker(to, bytes).await,
        };

        match res {
            Ok(()) => true,
            Err(e) => {
                error!(destination = %to, "error sending {} to whatsapp: {e}", payload.kind());
                false
            }
        }
    }
}
