//! The color channel: a single string field that carries either a paint
//! color or a command token prefixed with [`COMMAND_MARKER`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved prefix that turns the color field into a command carrier.
pub const COMMAND_MARKER: &str = "CMD:";

/// What a non-empty color field means once decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Signal {
    /// A genuine color encoding (usually `#RRGGBB`).
    Color(String),
    /// An opaque command token with the marker stripped. May be empty.
    Command(String),
}

impl Signal {
    /// Decode a color field.
    ///
    /// Returns `None` for an empty field, which means "not specified".
    #[must_use]
    pub fn decode(field: &str) -> Option<Self> {
        if field.is_empty() {
            return None;
        }
        Some(match field.strip_prefix(COMMAND_MARKER) {
            Some(token) => Self::Command(token.to_string()),
            None => Self::Color(field.to_string()),
        })
    }

    /// Encode back into the shared color field.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Color(color) => color.clone(),
            Self::Command(token) => format!("{COMMAND_MARKER}{token}"),
        }
    }
}

/// Well-known media tokens carried on the command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCommand {
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    /// Jump to a track by index.
    Track(u32),
}

impl MediaCommand {
    /// Interpret a command token, case-insensitively. Unknown tokens yield `None`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        match token.to_ascii_uppercase().as_str() {
            "PLAY" => Some(Self::Play),
            "PAUSE" => Some(Self::Pause),
            "STOP" => Some(Self::Stop),
            "NEXT" => Some(Self::Next),
            "PREV" | "PREVIOUS" => Some(Self::Previous),
            _ => token.parse().ok().map(Self::Track),
        }
    }
}

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self {
        r: 0xFF,
        g: 0xFF,
        b: 0xFF,
    };

    /// Parse `#RRGGBB`, `RRGGBB` or `#RGB`.
    #[must_use]
    pub fn parse_hex(input: &str) -> Option<Self> {
        let hex = input.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            6 => Some(Self {
                r: u8::from_str_radix(&hex[0..2], 16).ok()?,
                g: u8::from_str_radix(&hex[2..4], 16).ok()?,
                b: u8::from_str_radix(&hex[4..6], 16).ok()?,
            }),
            3 => {
                let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).map(|n| n * 0x11);
                Some(Self {
                    r: nibble(0).ok()?,
                    g: nibble(1).ok()?,
                    b: nibble(2).ok()?,
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_decode_command_token_without_marker() {
        assert_eq!(
            Signal::decode("CMD:PLAY"),
            Some(Signal::Command("PLAY".to_string()))
        );
    }

    #[test]
    fn should_decode_hex_as_color() {
        assert_eq!(
            Signal::decode("#00FF00"),
            Some(Signal::Color("#00FF00".to_string()))
        );
    }

    #[test]
    fn should_decode_marker_only_as_empty_command() {
        assert_eq!(Signal::decode("CMD:"), Some(Signal::Command(String::new())));
    }

    #[test]
    fn should_decode_empty_field_as_nothing() {
        assert_eq!(Signal::decode(""), None);
    }

    #[test]
    fn should_treat_marker_case_sensitively() {
        assert_eq!(
            Signal::decode("cmd:play"),
            Some(Signal::Color("cmd:play".to_string()))
        );
    }

    #[test]
    fn should_encode_command_with_marker() {
        assert_eq!(Signal::Command("NEXT".to_string()).encode(), "CMD:NEXT");
    }

    #[test]
    fn should_encode_color_verbatim_and_decode_back() {
        let color = Signal::Color("#FFAA00".to_string());
        assert_eq!(color.encode(), "#FFAA00");
        assert_eq!(Signal::decode(&color.encode()), Some(color));
        let command = Signal::Command("PLAY".to_string());
        assert_eq!(Signal::decode(&command.encode()), Some(command));
    }

    #[test]
    fn should_parse_media_tokens() {
        assert_eq!(MediaCommand::parse("play"), Some(MediaCommand::Play));
        assert_eq!(MediaCommand::parse("PREVIOUS"), Some(MediaCommand::Previous));
        assert_eq!(MediaCommand::parse("PREV"), Some(MediaCommand::Previous));
        assert_eq!(MediaCommand::parse("3"), Some(MediaCommand::Track(3)));
        assert_eq!(MediaCommand::parse("DANCE"), None);
        assert_eq!(MediaCommand::parse(""), None);
    }

    #[test]
    fn should_parse_long_and_short_hex() {
        assert_eq!(
            Rgb::parse_hex("#FFAA00"),
            Some(Rgb {
                r: 0xFF,
                g: 0xAA,
                b: 0x00
            })
        );
        assert_eq!(
            Rgb::parse_hex("0f0"),
            Some(Rgb {
                r: 0x00,
                g: 0xFF,
                b: 0x00
            })
        );
    }

    #[test]
    fn should_reject_invalid_hex() {
        assert_eq!(Rgb::parse_hex("#GGGGGG"), None);
        assert_eq!(Rgb::parse_hex("#12345"), None);
        assert_eq!(Rgb::parse_hex("CMD:PLAY"), None);
    }

    #[test]
    fn should_display_uppercase_hex() {
        assert_eq!(Rgb::WHITE.to_string(), "#FFFFFF");
    }
}
