use base64::{engine::general_purpose::STANDARD, Engine as _};
use qrcode::{render::svg, QrCode};
use serde::Serialize;
use tracing::warn;

use crate::{connectivity::ConnectivityReader, domain::Destination};

const QR_MIN_SIZE: u32 = 256;

/// What the status page (and `/status` command) shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub connected: bool,
    /// Pairing challenge as a `data:` URL, when one is pending.
    pub qr: Option<String>,
    pub targets: Vec<String>,
    /// Whether the Telegram listener is running.
    pub telegram: bool,
}

/// Read-only view over connectivity plus the static bits of configuration.
#[derive(Clone)]
pub struct StatusSource {
    connectivity: ConnectivityReader,
    targets: Vec<Destination>,
    telegram: bool,
}

impl StatusSource {
    pub fn new(connectivity: ConnectivityReader, targets: Vec<Destination>, telegram: bool) -> Self {
        Self {
            connectivity,
            targets,
            telegram,
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let conn = self.connectivity.snapshot();
        StatusSnapshot {
            connected: conn.connected,
            qr: conn.pairing.as_deref().and_then(qr_data_url),
            targets: self.targets.iter().map(|d| d.to_string()).collect(),
            telegram: self.telegram,
        }
    }
}

/// Render `data` as a QR code SVG wrapped in a base64 `data:` URL.
pub fn qr_data_url(data: &str) -> Option<String> {
    let code = match QrCode::new(data.as_bytes()) {
        Ok(c) => c,
        Err(e) => {
            warn!("cannot encode pairing data as QR: {e}");
            return None;
        }
    };
    let image = code
        .render::<svg::Color>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .build();
    Some(format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(image.as_bytes())
    ))
}

/// Plain-text summary for the Telegram `/status` command.
pub fn format_status_text(snapshot: &StatusSnapshot) -> String {
    let mut text = format!(
        "📱 WhatsApp: {}\n🎯 Targets: {}\n",
        if snapshot.connected {
            "✅ Connected"
        } else {
            "❌ Disconnected"
        },
        snapshot.targets.len()
    );
    for (i, jid) in snapshot.targets.iter().enumerate() {
        text.push_str(&format!("  {}. {jid}\n", i + 1));
    }
    text
}
