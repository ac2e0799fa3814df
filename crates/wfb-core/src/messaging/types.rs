use crate::payload::PayloadKind;

/// Raw content slots of one inbound message, as reported by the origin
/// client. More than one slot may be populated (e.g. a caption next to a
/// photo); [`InboundParts::classify`] decides which one wins.
#[derive(Clone, Debug, Default)]
pub struct InboundParts {
    pub text: Option<String>,
    pub caption: Option<String>,
    /// File id of the largest photo size.
    pub photo: Option<String>,
    pub video: Option<String>,
    pub document: Option<DocumentRef>,
    pub audio: Option<String>,
    pub voice: Option<String>,
    pub sticker: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRef {
    pub file_id: String,
    pub file_name: Option<String>,
}

/// Classified inbound content, before any download happens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundContent {
    Text {
        text: String,
    },
    Photo {
        file_id: String,
        caption: String,
    },
    Video {
        file_id: String,
        caption: String,
    },
    Document {
        file_id: String,
        file_name: String,
        caption: String,
    },
    Audio {
        file_id: String,
        caption: String,
        voice: bool,
    },
    Sticker {
        file_id: String,
    },
}

/// Fallback name for documents sent without one.
pub const DEFAULT_FILE_NAME: &str = "file";

impl InboundParts {
    /// Pick exactly one payload kind using the fixed precedence order:
    /// text, photo, video, document, audio-or-voice, sticker.
    pub fn classify(self) -> Option<InboundContent> {
        let caption = self.caption.unwrap_or_default();

        if let Some(text) = self.text {
            return Some(InboundContent::Text { text });
        }
        if let Some(file_id) = self.photo {
            return Some(InboundContent::Photo { file_id, caption });
        }
        if let Some(file_id) = self.video {
            return Some(InboundContent::Video { file_id, caption });
        }
        if let Some(doc) = self.document {
            return Some(InboundContent::Document {
                file_id: doc.file_id,
                file_name: doc
                    .file_name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()),
                caption,
            });
        }
        // Audio wins over voice when both are present.
        if let Some(file_id) = self.audio {
            return Some(InboundContent::Audio {
                file_id,
                caption,
                voice: false,
            });
        }
        if let Some(file_id) = self.voice {
            return Some(InboundContent::Audio {
                file_id,
                caption,
                voice: true,
            });
        }
        self.sticker
            .map(|file_id| InboundContent::Sticker { file_id })
    }
}

impl InboundContent {
    pub fn kind(&self) -> PayloadKind {
        match self {
            InboundContent::Text { .. } => PayloadKind::Text,
            InboundContent::Photo { .. } => PayloadKind::Photo,
            InboundContent::Video { .. } => PayloadKind::Video,
            InboundContent::Document { .. } => PayloadKind::Document,
            InboundContent::Audio { .. } => PayloadKind::Audio,
            InboundContent::Sticker { .. } => PayloadKind::Sticker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_wins_over_everything_else() {
        let parts = InboundParts {
            text: Some("hi".to_string()),
            photo: Some("p".to_string()),
            sticker: Some("s".to_string()),
            ..Default::default()
        };
        assert_eq!(
            parts.classify(),
            Some(InboundContent::Text {
                text: "hi".to_string()
            })
        );
    }

    #[test]
    fn photo_before_video_and_caption_is_kept() {
        let parts = InboundParts {
            caption: Some("look".to_string()),
            photo: Some("p".to_string()),
            video: Some("v".to_string()),
            ..Default::default()
        };
        assert_eq!(
            parts.classify(),
            Some(InboundContent::Photo {
                file_id: "p".to_string(),
                caption: "look".to_string()
            })
        );
    }

    #[test]
    fn document_without_name_gets_default() {
        let parts = InboundParts {
            document: Some(DocumentRef {
                file_id: "d".to_string(),
                file_name: None,
            }),
            ..Default::default()
        };
        assert_eq!(
            parts.classify(),
            Some(InboundContent::Document {
                file_id: "d".to_string(),
                file_name: "file".to_string(),
                caption: String::new(),
            })
        );
    }

    #[test]
    fn voice_sets_voice_flag() {
        let parts = InboundParts {
            voice: Some("v".to_string()),
            sticker: Some("s".to_string()),
            ..Default::default()
        };
        let content = parts.classify().unwrap();
        assert_eq!(content.kind(), PayloadKind::Audio);
        assert!(matches!(content, InboundContent::Audio { voice: true, .. }));
    }

    #[test]
    fn empty_message_is_unclassified() {
        assert_eq!(InboundParts::default().classify(), None);
    }
}
