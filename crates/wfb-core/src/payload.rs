use std::fmt;

/// The closed set of content categories the dispatcher recognizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Text,
    Photo,
    Video,
    Document,
    /// Audio files and voice notes.
    Audio,
    Sticker,
}

impl PayloadKind {
    pub fn label(self) -> &'static str {
        match self {
            PayloadKind::Text => "Text",
            PayloadKind::Photo => "Photo",
            PayloadKind::Video => "Video",
            PayloadKind::Document => "Document",
            PayloadKind::Audio => "Audio",
            PayloadKind::Sticker => "Sticker",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Content relayed to a single destination. Each variant only carries the
/// optional fields its send primitive understands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayPayload {
    Text {
        text: String,
    },
    Photo {
        bytes: Vec<u8>,
        caption: String,
    },
    Video {
        bytes: Vec<u8>,
        caption: String,
        thumbnail: Option<Vec<u8>>,
    },
    Document {
        bytes: Vec<u8>,
        file_name: String,
        caption: String,
    },
    Audio {
        bytes: Vec<u8>,
        caption: String,
        voice: bool,
    },
    Sticker {
        bytes: Vec<u8>,
    },
}

impl RelayPayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            RelayPayload::Text { .. } => PayloadKind::Text,
            RelayPayload::Photo { .. } => PayloadKind::Photo,
            RelayPayload::Video { .. } => PayloadKind::Video,
            RelayPayload::Document { .. } => PayloadKind::Document,
            RelayPayload::Audio { .. } => PayloadKind::Audio,
            RelayPayload::Sticker { .. } => PayloadKind::Sticker,
        }
    }
}
