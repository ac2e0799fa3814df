//! Inbound dispatcher: one origin message in, one relay call per destination
//! out, one outcome notice back to the origin chat.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    connectivity::ConnectivityReader,
    domain::{ChatId, Destination, MessageRef},
    messaging::{
        port::OriginPort,
        types::{InboundContent, InboundParts},
    },
    payload::{PayloadKind, RelayPayload},
    ports::ThumbnailSource,
    relay::Relay,
    Result,
};

pub const NOT_READY_TEXT: &str = "❌ WhatsApp not connected or no targets configured";
pub const UNSUPPORTED_TEXT: &str = "❌ Unsupported message type";

const VIDEO_DOWNLOADING: &str = "📥 Downloading video...";
const VIDEO_THUMBNAIL: &str = "🖼️ Generating thumbnail...";
const VIDEO_SENDING: &str = "📤 Sending to WhatsApp...";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Disconnected or no destinations; nothing was downloaded or sent.
    NotReady,
    Unsupported,
    Forwarded {
        kind: PayloadKind,
        delivered: usize,
        total: usize,
    },
    Failed(String),
}

pub struct Dispatcher {
    relay: Relay,
    targets: Arc<Vec<Destination>>,
    connectivity: ConnectivityReader,
    thumbnails: Arc<dyn ThumbnailSource>,
}

impl Dispatcher {
    pub fn new(
        relay: Relay,
        targets: Arc<Vec<Destination>>,
        connectivity: ConnectivityReader,
        thumbnails: Arc<dyn ThumbnailSource>,
    ) -> Self {
        Self {
            relay,
            targets,
            connectivity,
            thumbnails,
        }
    }

    pub fn targets(&self) -> &[Destination] {
        &self.targets
    }

    /// Handle one inbound message. Never fails: every error ends up as a
    /// notice in the origin chat and a [`DispatchOutcome::Failed`].
    pub async fn dispatch(
        &self,
        origin: &dyn OriginPort,
        chat_id: ChatId,
        parts: InboundParts,
    ) -> DispatchOutcome {
        if !self.connectivity.is_connected() || self.targets.is_empty() {
            notify(origin, chat_id, None, NOT_READY_TEXT).await;
            return DispatchOutcome::NotReady;
        }

        let Some(content) = parts.classify() else {
            notify(origin, chat_id, None, UNSUPPORTED_TEXT).await;
            return DispatchOutcome::Unsupported;
        };
        let kind = content.kind();

        let mut progress: Option<MessageRef> = None;
        match self.forward(origin, chat_id, content, &mut progress).await {
            Ok((delivered, text)) => {
                let total = self.targets.len();
                info!(chat_id = chat_id.0, "{kind} forwarded to {delivered}/{total} destinations");
                notify(origin, chat_id, progress, &text).await;
                DispatchOutcome::Forwarded {
                    kind,
                    delivered,
                    total,
                }
            }
            Err(e) => {
                error!(chat_id = chat_id.0, "failed to forward {kind}: {e}");
                let text = e.to_string();
                notify(origin, chat_id, progress, &format!("❌ Error: {text}")).await;
                DispatchOutcome::Failed(text)
            }
        }
    }

    /// Download, build the payload, fan out. Returns the delivered count and
    /// the success text.
    async fn forward(
        &self,
        origin: &dyn OriginPort,
        chat_id: ChatId,
        content: InboundContent,
        progress: &mut Option<MessageRef>,
    ) -> Result<(usize, String)> {
        let (payload, text) = match content {
            InboundContent::Text { text } => (RelayPayload::Text { text }, "✅ Text forwarded!"),
            InboundContent::Photo { file_id, caption } => {
                let bytes = origin.download(&file_id).await?;
                (RelayPayload::Photo { bytes, caption }, "✅ Photo forwarded!")
            }
            InboundContent::Video { file_id, caption } => {
                *progress = origin.send_text(chat_id, VIDEO_DOWNLOADING).await.ok();
                let bytes = origin.download(&file_id).await?;

                self.progress(origin, *progress, VIDEO_THUMBNAIL).await;
                let thumbnail = self.thumbnails.extract(&bytes).await;

                self.progress(origin, *progress, VIDEO_SENDING).await;
                let text = if thumbnail.is_some() {
                    "✅ Video forwarded with thumbnail!"
                } else {
                    "✅ Video forwarded!"
                };
                (
                    RelayPayload::Video {
                        bytes,
                        caption,
                        thumbnail,
                    },
                    text,
                )
            }
            InboundContent::Document {
                file_id,
                file_name,
                caption,
            } => {
                let bytes = origin.download(&file_id).await?;
                (
                    RelayPayload::Document {
                        bytes,
                        file_name,
                        caption,
                    },
                    "✅ Document forwarded!",
                )
            }
            InboundContent::Audio {
                file_id,
                caption,
                voice,
            } => {
                let bytes = origin.download(&file_id).await?;
                (
                    RelayPayload::Audio {
                        bytes,
                        caption,
                        voice,
                    },
                    "✅ Audio forwarded!",
                )
            }
            InboundContent::Sticker { file_id } => {
                let bytes = origin.download(&file_id).await?;
                (RelayPayload::Sticker { bytes }, "✅ Sticker forwarded!")
            }
        };

        let delivered = self.fan_out(&payload).await;
        Ok((delivered, text.to_string()))
    }

    /// Sequential fan-out; a failing destination does not stop the rest.
    async fn fan_out(&self, payload: &RelayPayload) -> usize {
        let mut delivered = 0;
        for to in self.targets.iter() {
            if self.relay.send(to, payload).await {
                delivered += 1;
            }
        }
        delivered
    }

    async fn progress(&self, origin: &dyn OriginPort, msg: Option<MessageRef>, text: &str) {
        if let Some(m) = msg {
            if let Err(e) = origin.edit_text(m, text).await {
                warn!("failed to update progress notice: {e}");
            }
        }
    }
}

/// Edit the progress notice when there is one, otherwise send a new message.
async fn notify(origin: &dyn OriginPort, chat_id: ChatId, progress: Option<MessageRef>, text: &str) {
    let res = match progress {
        Some(m) => origin.edit_text(m, text).await,
        None => origin.send_text(chat_id, text).await.map(|_| ()),
    };
    if let Err(e) = res {
        warn!(chat_id = chat_id.0, "failed to notify origin chat: {e}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        connectivity::{self, ConnectivityWriter},
        domain::MessageId,
        errors::Error,
        messaging::types::DocumentRef,
        relay::testing::{FakeWhatsApp, Sent},
    };

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum OriginCall {
        Send(String),
        Edit(i32, String),
        Download(String),
    }

    #[derive(Default)]
    struct FakeOrigin {
        calls: Mutex<Vec<OriginCall>>,
        fail_downloads: bool,
    }

    impl FakeOrigin {
        fn calls(&self) -> Vec<OriginCall> {
            self.calls.lock().unwrap().clone()
        }

        fn downloads(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, OriginCall::Download(_)))
                .count()
        }
    }

    #[async_trait]
    impl OriginPort for FakeOrigin {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(OriginCall::Send(text.to_string()));
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(calls.len() as i32),
            })
        }

        async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(OriginCall::Edit(msg.message_id.0, text.to_string()));
            Ok(())
        }

        async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
            self.calls
                .lock()
                .unwrap()
                .push(OriginCall::Download(file_id.to_string()));
            if self.fail_downloads {
                return Err(Error::External("file is too big".to_string()));
            }
            Ok(format!("bytes:{file_id}").into_bytes())
        }
    }

    struct FakeThumbnails {
        result: Option<Vec<u8>>,
        calls: Mutex<Vec<Vec<u8>>>,
    }

    impl FakeThumbnails {
        fn returning(result: Option<Vec<u8>>) -> Self {
            Self {
                result,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ThumbnailSource for FakeThumbnails {
        async fn extract(&self, video: &[u8]) -> Option<Vec<u8>> {
            self.calls.lock().unwrap().push(video.to_vec());
            self.result.clone()
        }
    }

    struct Harness {
        dispatcher: Dispatcher,
        whatsapp: Arc<FakeWhatsApp>,
        thumbs: Arc<FakeThumbnails>,
        origin: FakeOrigin,
        _writer: ConnectivityWriter,
    }

    fn harness(targets: &[&str], connected: bool, whatsapp: FakeWhatsApp) -> Harness {
        harness_with_thumbnail(targets, connected, whatsapp, Some(b"jpeg".to_vec()))
    }

    fn harness_with_thumbnail(
        targets: &[&str],
        connected: bool,
        whatsapp: FakeWhatsApp,
        thumbnail: Option<Vec<u8>>,
    ) -> Harness {
        let (writer, reader) = connectivity::channel();
        if connected {
            writer.mark_connected();
        }
        let whatsapp = Arc::new(whatsapp);
        let thumbs = Arc::new(FakeThumbnails::returning(thumbnail));
        let targets: Vec<Destination> = targets
            .iter()
            .filter_map(|t| Destination::new(t))
            .collect();
        let dispatcher = Dispatcher::new(
            Relay::new(whatsapp.clone(), reader.clone()),
            Arc::new(targets),
            reader,
            thumbs.clone(),
        );
        Harness {
            dispatcher,
            whatsapp,
            thumbs,
            origin: FakeOrigin::default(),
            _writer: writer,
        }
    }

    const CHAT: ChatId = ChatId(42);

    #[tokio::test]
    async fn text_is_sent_to_every_destination_then_confirmed() {
        let h = harness(&["a@g.us", "b@g.us"], true, FakeWhatsApp::default());
        let parts = InboundParts {
            text: Some("hello".to_string()),
            ..Default::default()
        };

        let outcome = h.dispatcher.dispatch(&h.origin, CHAT, parts).await;

        assert_eq!(
            outcome,
            DispatchOutcome::Forwarded {
                kind: PayloadKind::Text,
                delivered: 2,
                total: 2
            }
        );
        assert_eq!(
            h.whatsapp.sent(),
            vec![
                Sent::Text("a@g.us".to_string(), "hello".to_string()),
                Sent::Text("b@g.us".to_string(), "hello".to_string()),
            ]
        );
        assert_eq!(
            h.origin.calls(),
            vec![OriginCall::Send("✅ Text forwarded!".to_string())]
        );
    }

    #[tokio::test]
    async fn video_downloads_extracts_and_sends_with_thumbnail() {
        let h = harness(&["a@g.us"], true, FakeWhatsApp::default());
        let parts = InboundParts {
            video: Some("vid".to_string()),
            caption: Some("clip".to_string()),
            ..Default::default()
        };

        let outcome = h.dispatcher.dispatch(&h.origin, CHAT, parts).await;

        assert!(matches!(
            outcome,
            DispatchOutcome::Forwarded {
                kind: PayloadKind::Video,
                delivered: 1,
                ..
            }
        ));
        assert_eq!(h.origin.downloads(), 1);
        assert_eq!(*h.thumbs.calls.lock().unwrap(), vec![b"bytes:vid".to_vec()]);
        assert_eq!(
            h.whatsapp.sent(),
            vec![Sent::Video(
                "a@g.us".to_string(),
                b"bytes:vid".to_vec(),
                "clip".to_string(),
                Some(b"jpeg".to_vec())
            )]
        );

        // Progress notice is sent once, then edited until the final outcome.
        assert_eq!(
            h.origin.calls(),
            vec![
                OriginCall::Send(VIDEO_DOWNLOADING.to_string()),
                OriginCall::Download("vid".to_string()),
                OriginCall::Edit(1, VIDEO_THUMBNAIL.to_string()),
                OriginCall::Edit(1, VIDEO_SENDING.to_string()),
                OriginCall::Edit(1, "✅ Video forwarded with thumbnail!".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn video_without_thumbnail_is_still_delivered() {
        let h = harness_with_thumbnail(&["a@g.us"], true, FakeWhatsApp::default(), None);
        let parts = InboundParts {
            video: Some("vid".to_string()),
            ..Default::default()
        };

        h.dispatcher.dispatch(&h.origin, CHAT, parts).await;

        assert!(matches!(
            h.whatsapp.sent().as_slice(),
            [Sent::Video(_, _, _, None)]
        ));
        assert_eq!(
            h.origin.calls().last(),
            Some(&OriginCall::Edit(1, "✅ Video forwarded!".to_string()))
        );
    }

    #[tokio::test]
    async fn sticker_while_disconnected_is_not_ready() {
        let h = harness(&["a@g.us"], false, FakeWhatsApp::default());
        let parts = InboundParts {
            sticker: Some("stk".to_string()),
            ..Default::default()
        };

        let outcome = h.dispatcher.dispatch(&h.origin, CHAT, parts).await;

        assert_eq!(outcome, DispatchOutcome::NotReady);
        assert!(h.whatsapp.sent().is_empty());
        assert_eq!(
            h.origin.calls(),
            vec![OriginCall::Send(NOT_READY_TEXT.to_string())]
        );
    }

    #[tokio::test]
    async fn no_destinations_is_not_ready() {
        let h = harness(&[], true, FakeWhatsApp::default());
        let parts = InboundParts {
            photo: Some("p".to_string()),
            ..Default::default()
        };

        let outcome = h.dispatcher.dispatch(&h.origin, CHAT, parts).await;

        assert_eq!(outcome, DispatchOutcome::NotReady);
        assert_eq!(h.origin.downloads(), 0);
        assert!(h.whatsapp.sent().is_empty());
    }

    #[tokio::test]
    async fn one_send_per_destination_for_every_kind() {
        let kinds = vec![
            InboundParts {
                text: Some("t".to_string()),
                ..Default::default()
            },
            InboundParts {
                photo: Some("p".to_string()),
                ..Default::default()
            },
            InboundParts {
                video: Some("v".to_string()),
                ..Default::default()
            },
            InboundParts {
                document: Some(DocumentRef {
                    file_id: "d".to_string(),
                    file_name: Some("a.pdf".to_string()),
                }),
                ..Default::default()
            },
            InboundParts {
                audio: Some("a".to_string()),
                ..Default::default()
            },
            InboundParts {
                voice: Some("o".to_string()),
                ..Default::default()
            },
            InboundParts {
                sticker: Some("s".to_string()),
                ..Default::default()
            },
        ];

        for parts in kinds {
            let h = harness(&["a@g.us", "b@g.us", "c@g.us"], true, FakeWhatsApp::default());
            h.dispatcher.dispatch(&h.origin, CHAT, parts).await;
            assert_eq!(h.whatsapp.sent().len(), 3);
        }
    }

    #[tokio::test]
    async fn failing_destination_does_not_stop_the_rest() {
        let h = harness(
            &["a@g.us", "bad@g.us", "c@g.us"],
            true,
            FakeWhatsApp::failing_for("bad@g.us"),
        );
        let parts = InboundParts {
            document: Some(DocumentRef {
                file_id: "d".to_string(),
                file_name: None,
            }),
            caption: Some("report".to_string()),
            ..Default::default()
        };

        let outcome = h.dispatcher.dispatch(&h.origin, CHAT, parts).await;

        assert_eq!(
            outcome,
            DispatchOutcome::Forwarded {
                kind: PayloadKind::Document,
                delivered: 2,
                total: 3
            }
        );
        assert_eq!(h.whatsapp.sent().len(), 3);
        assert!(matches!(
            &h.whatsapp.sent()[2],
            Sent::File(to, _, name, caption) if to == "c@g.us" && name == "file" && caption == "report"
        ));
        assert_eq!(
            h.origin.calls().last(),
            Some(&OriginCall::Send("✅ Document forwarded!".to_string()))
        );
    }

    #[tokio::test]
    async fn download_error_is_reported_to_origin() {
        let mut h = harness(&["a@g.us"], true, FakeWhatsApp::default());
        h.origin.fail_downloads = true;
        let parts = InboundParts {
            voice: Some("o".to_string()),
            ..Default::default()
        };

        let outcome = h.dispatcher.dispatch(&h.origin, CHAT, parts).await;

        assert_eq!(
            outcome,
            DispatchOutcome::Failed("external error: file is too big".to_string())
        );
        assert!(h.whatsapp.sent().is_empty());
        assert_eq!(
            h.origin.calls().last(),
            Some(&OriginCall::Send(
                "❌ Error: external error: file is too big".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn video_download_error_replaces_progress_notice() {
        let mut h = harness(&["a@g.us"], true, FakeWhatsApp::default());
        h.origin.fail_downloads = true;
        let parts = InboundParts {
            video: Some("v".to_string()),
            ..Default::default()
        };

        h.dispatcher.dispatch(&h.origin, CHAT, parts).await;

        assert!(h.thumbs.calls.lock().unwrap().is_empty());
        assert!(matches!(
            h.origin.calls().last(),
            Some(OriginCall::Edit(1, text)) if text.starts_with("❌ Error:")
        ));
    }

    #[tokio::test]
    async fn unsupported_message_is_reported() {
        let h = harness(&["a@g.us"], true, FakeWhatsApp::default());

        let outcome = h
            .dispatcher
            .dispatch(&h.origin, CHAT, InboundParts::default())
            .await;

        assert_eq!(outcome, DispatchOutcome::Unsupported);
        assert_eq!(
            h.origin.calls(),
            vec![OriginCall::Send(UNSUPPORTED_TEXT.to_string())]
        );
    }
}
