use std::fmt;

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message (used to edit progress notices).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// WhatsApp recipient (JID). Opaque, never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Destination(String);

impl Destination {
    /// Returns `None` for blank input; surrounding whitespace is trimmed.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a comma-separated destination list, keeping order and dropping blanks.
pub fn parse_destinations(csv: &str) -> Vec<Destination> {
    csv.split(',').filter_map(Destination::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_csv_in_order_and_drops_blanks() {
        let dests = parse_destinations(" 123@s.whatsapp.net, ,456@g.us,,123@s.whatsapp.net ");
        let raw: Vec<&str> = dests.iter().map(|d| d.as_str()).collect();
        assert_eq!(
            raw,
            vec!["123@s.whatsapp.net", "456@g.us", "123@s.whatsapp.net"]
        );
    }

    #[test]
    fn empty_input_yields_no_destinations() {
        assert!(parse_destinations("").is_empty());
        assert!(Destination::new("   ").is_none());
    }
}
