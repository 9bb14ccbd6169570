//! Output channels and the three value representations
use serde::{Deserialize, Serialize};
use std::fmt;

/// An output destination with its own representation preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    File,
    Email,
    ConfirmationEmail,
    Screen,
    Processing,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::File,
        Channel::Email,
        Channel::ConfirmationEmail,
        Channel::Screen,
        Channel::Processing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::File => "file",
            Channel::Email => "email",
            Channel::ConfirmationEmail => "confirmation_email",
            Channel::Screen => "screen",
            Channel::Processing => "processing",
        }
    }

    /// Parse a channel key as written in an `output` override map.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "file" => Some(Channel::File),
            "email" => Some(Channel::Email),
            "confirmation_email" | "confirmationEmail" => Some(Channel::ConfirmationEmail),
            "screen" => Some(Channel::Screen),
            "processing" => Some(Channel::Processing),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the derived forms of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    /// Structured components (line lists, per-value flags, date parts, ...)
    RawComponents,
    /// Machine-joined single value
    Compiled,
    /// Human-readable value
    Presented,
}

impl Representation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Representation::RawComponents => "rawcomponents",
            Representation::Compiled => "compiled",
            Representation::Presented => "presented",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "rawcomponents" => Some(Representation::RawComponents),
            "compiled" => Some(Representation::Compiled),
            "presented" => Some(Representation::Presented),
            _ => None,
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_parse_accepts_both_spellings() {
        assert_eq!(Channel::parse("confirmation_email"), Some(Channel::ConfirmationEmail));
        assert_eq!(Channel::parse("confirmationEmail"), Some(Channel::ConfirmationEmail));
        assert_eq!(Channel::parse("fax"), None);
    }

    #[test]
    fn test_representation_names() {
        for repr in [
            Representation::RawComponents,
            Representation::Compiled,
            Representation::Presented,
        ] {
            assert_eq!(Representation::parse(repr.as_str()), Some(repr));
        }
        assert_eq!(Representation::parse("raw"), None);
    }
}
