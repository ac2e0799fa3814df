//! WhatsApp adapter.
//!
//! Talks to a WhatsApp Web gateway sidecar over HTTP. The gateway owns the
//! multi-device protocol and session storage; this crate only starts the
//! session, relays pairing challenges, and posts outbound messages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use wfb_core::{
    config::Config,
    domain::Destination,
    errors::Error,
    ports::{DestinationClient, PairingCallback},
    Result,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Session state as reported by `GET /sessions/{session}/status`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct GatewayStatus {
    pub state: SessionState,
    #[serde(default)]
    pub qr: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Connected,
    Pairing,
    Disconnected,
}

#[derive(Clone, Debug)]
pub struct GatewayClient {
    base_url: String,
    session: String,
    connect_timeout: Duration,
    poll_interval: Duration,
    http: reqwest::Client,
}

/// Multipart media kinds the gateway accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MediaKind {
    Image,
    Video,
    Document,
    Audio,
    Sticker,
}

impl MediaKind {
    fn path(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Document => "document",
            MediaKind::Audio => "audio",
            MediaKind::Sticker => "sticker",
        }
    }

    fn default_file(self) -> (&'static str, &'static str) {
        match self {
            MediaKind::Image => ("photo.jpg", "image/jpeg"),
            MediaKind::Video => ("video.mp4", "video/mp4"),
            MediaKind::Document => ("file", "application/octet-stream"),
            MediaKind::Audio => ("audio.ogg", "audio/ogg"),
            MediaKind::Sticker => ("sticker.webp", "image/webp"),
        }
    }
}

/// Optional fields of a media message.
#[derive(Default)]
struct MediaFields<'a> {
    caption: Option<&'a str>,
    file_name: Option<&'a str>,
    ptt: bool,
    thumbnail: Option<&'a [u8]>,
}

impl GatewayClient {
    pub fn new(
        base_url: impl Into<String>,
        session: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::External(format!("whatsapp http client error: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: session.into(),
            connect_timeout,
            poll_interval: STATUS_POLL_INTERVAL,
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.gateway_url.clone(),
            cfg.whatsapp_session.clone(),
            cfg.connect_timeout,
        )
    }

    #[cfg(test)]
    fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/sessions/{}/{tail}", self.base_url, self.session)
    }

    pub async fn status(&self) -> Result<GatewayStatus> {
        let resp = self
            .http
            .get(self.url("status"))
            .send()
            .await
            .map_err(|e| Error::External(format!("whatsapp request error: {e}")))?;
        let resp = check(resp, "status").await?;
        resp.json::<GatewayStatus>()
            .await
            .map_err(|e| Error::External(format!("whatsapp json error: {e}")))
    }

    async fn post_json(&self, tail: &str, body: serde_json::Value) -> Result<()> {
        let resp = self
            .http
            .post(self.url(tail))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::External(format!("whatsapp request error: {e}")))?;
        check(resp, tail).await?;
        Ok(())
    }

    async fn post_media(
        &self,
        kind: MediaKind,
        to: &Destination,
        bytes: &[u8],
        fields: MediaFields<'_>,
    ) -> Result<()> {
        let (default_name, mime) = kind.default_file();
        let file_name = fields.file_name.unwrap_or(default_name).to_string();

        let mut form = Form::new().text("to", to.to_string()).part(
            "file",
            Part::bytes(bytes.to_vec())
                .file_name(file_name.clone())
                .mime_str(mime)
                .map_err(|e| Error::External(format!("whatsapp multipart error: {e}")))?,
        );
        if let Some(c) = fields.caption.filter(|c| !c.is_empty()) {
            form = form.text("caption", c.to_string());
        }
        if kind == MediaKind::Document {
            form = form.text("filename", file_name);
        }
        if fields.ptt {
            form = form.text("ptt", "true");
        }
        if let Some(t) = fields.thumbnail {
            form = form.part(
                "thumbnail",
                Part::bytes(t.to_vec())
                    .file_name("thumbnail.jpg")
                    .mime_str("image/jpeg")
                    .map_err(|e| Error::External(format!("whatsapp multipart error: {e}")))?,
            );
        }

        let tail = format!("messages/{}", kind.path());
        let resp = self
            .http
            .post(self.url(&tail))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::External(format!("whatsapp request error: {e}")))?;
        check(resp, &tail).await?;
        Ok(())
    }
}

async fn check(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(Error::External(format!(
        "whatsapp {what} failed: {status} {}",
        body.chars().take(200).collect::<String>()
    )))
}

#[async_trait]
impl DestinationClient for GatewayClient {
    async fn connect(&self, on_pairing: PairingCallback) -> Result<()> {
        self.post_json("start", serde_json::json!({})).await?;

        let deadline = Instant::now() + self.connect_timeout;
        let mut last_qr: Option<String> = None;
        loop {
            let st = self.status().await?;
            match st.state {
                SessionState::Connected => return Ok(()),
                SessionState::Pairing => {
                    if let Some(qr) = st.qr {
                        if last_qr.as_deref() != Some(qr.as_str()) {
                            info!("📱 whatsapp pairing code issued");
                            on_pairing(qr.clone());
                            last_qr = Some(qr);
                        }
                    }
                }
                SessionState::Disconnected => debug!("whatsapp session still starting"),
            }

            if Instant::now() >= deadline {
                return Err(Error::External(format!(
                    "whatsapp session not connected after {:?}",
                    self.connect_timeout
                )));
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn is_alive(&self) -> bool {
        matches!(
            self.status().await,
            Ok(GatewayStatus {
                state: SessionState::Connected,
                ..
            })
        )
    }

    async fn send_text(&self, to: &Destination, text: &str) -> Result<()> {
        self.post_json(
            "messages/text",
            serde_json::json!({ "to": to.as_str(), "text": text }),
        )
        .await
    }

    async fn send_image(&self, to: &Destination, bytes: &[u8], caption: &str) -> Result<()> {
        let fields = MediaFields {
            caption: Some(caption),
            ..Default::default()
        };
        self.post_media(MediaKind::Image, to, bytes, fields).await
    }

    async fn send_video(
        &self,
        to: &Destination,
        bytes: &[u8],
        caption: &str,
        thumbnail: Option<&[u8]>,
    ) -> Result<()> {
        let fields = MediaFields {
            caption: Some(caption),
            thumbnail,
            ..Default::default()
        };
        self.post_media(MediaKind::Video, to, bytes, fields).await
    }

    async fn send_file(
        &self,
        to: &Destination,
        bytes: &[u8],
        file_name: &str,
        caption: &str,
    ) -> Result<()> {
        let fields = MediaFields {
            caption: Some(caption),
            file_name: Some(file_name),
            ..Default::default()
        };
        self.post_media(MediaKind::Document, to, bytes, fields).await
    }

    async fn send_voice(&self, to: &Destination, bytes: &[u8]) -> Result<()> {
        let fields = MediaFields {
            ptt: true,
            ..Default::default()
        };
        self.post_media(MediaKind::Audio, to, bytes, fields).await
    }

    async fn send_audio(&self, to: &Destination, bytes: &[u8], caption: &str) -> Result<()> {
        let fields = MediaFields {
            caption: Some(caption),
            ..Default::default()
        };
        self.post_media(MediaKind::Audio, to, bytes, fields).await
    }

    async fn send_sticker(&self, to: &Destination, bytes: &[u8]) -> Result<()> {
        self.post_media(MediaKind::Sticker, to, bytes, MediaFields::default())
            .await
    }
}
