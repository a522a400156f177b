//! Wire Protocol Codec
//!
//! Every transport delivers notification requests in the same pipe-delimited
//! record format:
//!
//! `priority|blinkMode|text|color|bgColor|speed|audioPath|speechFlag`
//!
//! The codec parses a raw record into a [`NotificationRequest`] and
//! serializes one back. There is no escaping for `|` inside `text`; a record
//! containing one fails the field-count check. That limitation is part of
//! the protocol.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of `|`-separated fields in a wire record.
pub const FIELD_COUNT: usize = 8;

/// Result type for codec operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors produced while parsing a wire record
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// Record did not split into exactly eight fields
    #[error("expected {FIELD_COUNT} fields, got {got}")]
    FieldCount { got: usize },

    /// A numeric field failed to parse or violated its range
    #[error("invalid {field} field: {value:?}")]
    InvalidField { field: &'static str, value: String },

    /// Record was not valid UTF-8
    #[error("record is not valid UTF-8")]
    InvalidUtf8,
}

impl DecodeError {
    fn invalid(field: &'static str, value: &str) -> Self {
        Self::InvalidField {
            field,
            value: value.to_string(),
        }
    }
}

/// Which subset of a message's glyphs toggles visibility while displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlinkMode {
    /// Everything stays visible
    None,
    /// Only non-symbolic characters blink; pictographs stay lit
    Text,
    /// Only symbolic/pictographic characters blink
    Symbols,
    /// The whole glyph run blinks
    All,
}

impl BlinkMode {
    /// Map a wire integer onto a mode. Unknown values behave as `None`,
    /// which is what legacy senders relying on the fall-through got.
    pub fn from_wire(value: i64) -> Self {
        match value {
            1 => BlinkMode::Text,
            2 => BlinkMode::Symbols,
            3 => BlinkMode::All,
            0 => BlinkMode::None,
            other => {
                log::debug!("unknown blink mode {}, treating as no-blink", other);
                BlinkMode::None
            }
        }
    }

    /// Inverse of [`BlinkMode::from_wire`]
    pub fn to_wire(self) -> i64 {
        match self {
            BlinkMode::None => 0,
            BlinkMode::Text => 1,
            BlinkMode::Symbols => 2,
            BlinkMode::All => 3,
        }
    }
}

/// A colour as it travels on the wire: a name, `#RRGGBB`, or the literal
/// `glass` token for a translucent panel. Kept verbatim so records
/// round-trip; helpers interpret it where a renderer needs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorSpec(String);

impl ColorSpec {
    pub fn new(spec: impl Into<String>) -> Self {
        Self(spec.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The translucent-panel token, a presentation-layer concern passed
    /// through unchanged.
    pub fn is_glass(&self) -> bool {
        self.0 == "glass"
    }

    /// Interpret `#RRGGBB` specs; named colours return `None` and are left
    /// to the presentation layer's own tables.
    pub fn as_rgb(&self) -> Option<(u8, u8, u8)> {
        let hex = self.0.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some((r, g, b))
    }
}

impl std::fmt::Display for ColorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A decoded, validated notification request. Transient: the engine turns
/// an accepted request into a queued `Notification`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Lower value = more urgent
    pub priority: i32,
    pub blink_mode: BlinkMode,
    pub text: String,
    pub color: ColorSpec,
    pub bg_color: ColorSpec,
    /// Seconds of delay per scroll step
    pub speed: f64,
    /// Path to an audio clip, empty for silence
    pub audio_path: String,
    /// Reserved for a text-to-speech collaborator; carried verbatim
    pub speech_flag: String,
}

/// Parse a raw wire record into a request.
///
/// An empty `bgColor` field defaults to `"black"`. Non-integer
/// `priority`/`blinkMode` and non-numeric or non-positive `speed` are
/// rejected; callers log and discard, they never propagate past the
/// transport boundary.
pub fn decode(raw: &[u8]) -> DecodeResult<NotificationRequest> {
    let text = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)?;
    decode_str(text.trim_end_matches(['\r', '\n']))
}

/// Parse an already-decoded record string.
pub fn decode_str(record: &str) -> DecodeResult<NotificationRequest> {
    let parts: Vec<&str> = record.split('|').collect();
    if parts.len() != FIELD_COUNT {
        return Err(DecodeError::FieldCount { got: parts.len() });
    }

    let priority: i32 = parts[0]
        .trim()
        .parse()
        .map_err(|_| DecodeError::invalid("priority", parts[0]))?;

    let blink_raw: i64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| DecodeError::invalid("blinkMode", parts[1]))?;

    let speed: f64 = parts[5]
        .trim()
        .parse()
        .map_err(|_| DecodeError::invalid("speed", parts[5]))?;
    if !speed.is_finite() || speed <= 0.0 {
        return Err(DecodeError::invalid("speed", parts[5]));
    }

    let bg_color = if parts[4].trim().is_empty() {
        ColorSpec::new("black")
    } else {
        ColorSpec::new(parts[4])
    };

    Ok(NotificationRequest {
        priority,
        blink_mode: BlinkMode::from_wire(blink_raw),
        text: parts[2].to_string(),
        color: ColorSpec::new(parts[3]),
        bg_color,
        speed,
        audio_path: parts[6].to_string(),
        speech_flag: parts[7].to_string(),
    })
}

/// Serialize a request back into the 8-field wire format. Used by
/// collaborators that bridge structured submissions (e.g. JSON) onto the
/// same intake path the sockets use.
pub fn encode(req: &NotificationRequest) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}|{}|{}",
        req.priority,
        req.blink_mode.to_wire(),
        req.text,
        req.color,
        req.bg_color,
        req.speed,
        req.audio_path,
        req.speech_flag
    )
}
