//! Command channel protocol.
//!
//! The command characteristic accepts short ASCII strings. Recognized
//! commands are case-sensitive exact matches; anything else (including
//! non-UTF-8 payloads) is accepted by the channel and ignored.

/// A recognized text command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// Enable telemetry collection.
    Start,
    /// Disable telemetry collection.
    Stop,
}

impl Command {
    /// Parse a raw write payload into a command.
    ///
    /// Returns `None` for empty, non-UTF-8, or unrecognized payloads; the
    /// channel treats all of those as a no-op.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        match std::str::from_utf8(payload).ok()? {
            "START" => Some(Self::Start),
            "STOP" => Some(Self::Stop),
            _ => None,
        }
    }

    /// The wire string for this command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Stop => "STOP",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_recognized() {
        assert_eq!(Command::parse(b"START"), Some(Command::Start));
        assert_eq!(Command::parse(b"STOP"), Some(Command::Stop));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!(Command::parse(b"start"), None);
        assert_eq!(Command::parse(b"Stop"), None);
    }

    #[test]
    fn test_parse_rejects_near_misses() {
        assert_eq!(Command::parse(b""), None);
        assert_eq!(Command::parse(b"START "), None);
        assert_eq!(Command::parse(b"STARTSTOP"), None);
        assert_eq!(Command::parse(b"START\0"), None);
        assert_eq!(Command::parse(&[0xFF, 0xFE]), None);
    }

    #[test]
    fn test_round_trip() {
        assert_eq!(Command::parse(Command::Start.as_str().as_bytes()), Some(Command::Start));
        assert_eq!(Command::parse(Command::Stop.as_str().as_bytes()), Some(Command::Stop));
    }

    proptest! {
        #[test]
        fn parse_never_panics(payload in proptest::collection::vec(any::<u8>(), 0..64)) {
            let parsed = Command::parse(&payload);
            // Only the two exact wire strings may parse.
            if let Some(command) = parsed {
                prop_assert_eq!(command.as_str().as_bytes(), payload.as_slice());
            }
        }
    }
}
