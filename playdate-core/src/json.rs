//! Event-driven JSON decoding.
//!
//! A decoder walks the document once and reports every value to a
//! [`DecodeHandler`]. Arrays and tables are announced with
//! [`will_decode_sublist`](DecodeHandler::will_decode_sublist), filled with
//! `did_decode_*_value` calls, and closed with
//! [`did_decode_sublist`](DecodeHandler::did_decode_sublist), whose return
//! value becomes the [`ListRef`] the parent receives.
//!
//! The top-level container is reported as a sublist named [`ROOT_NAME`]. A
//! top-level scalar is reported as array position 0.

use crate::handle::ListRef;
use crate::value::{Value, ValueType};

/// Sublist name of the top-level container.
pub const ROOT_NAME: &str = "_root";

/// Receives decoding events. Every method has a no-op default.
///
/// Values borrow from the decoder and are only valid for the call.
pub trait DecodeHandler {
    /// The document is malformed. Decoding stops after this call.
    fn decode_error(&mut self, _message: &str, _line: u32) {}

    /// An array or table named `name` starts.
    ///
    /// Inside a table `name` is the key; inside an array it is the decimal
    /// 1-based position.
    fn will_decode_sublist(&mut self, _name: &str, _kind: ValueType) {}

    /// Return `false` to skip the value stored under `key`.
    fn should_decode_table_value_for_key(&mut self, _key: &str) -> bool {
        true
    }

    fn did_decode_table_value(&mut self, _key: &str, _value: Value<'_>) {}

    /// Return `false` to skip the value at 1-based `pos`.
    fn should_decode_array_value_at_index(&mut self, _pos: usize) -> bool {
        true
    }

    /// `pos` is 1-based, or 0 for a top-level scalar.
    fn did_decode_array_value(&mut self, _pos: usize, _value: Value<'_>) {}

    /// The sublist named `name` ended. The returned reference is passed to
    /// the parent as `Value::Array`/`Value::Table`; `None` passes
    /// `Value::Null` instead.
    fn did_decode_sublist(&mut self, _name: &str, _kind: ValueType) -> Option<ListRef> {
        None
    }
}

/// What went wrong while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeErrorKind {
    /// The firmware table lacks the entry point.
    Missing,
    UnexpectedEof,
    UnexpectedCharacter,
    InvalidNumber,
    InvalidEscape,
    /// A string does not fit the decoder's buffer.
    StringTooLong,
    /// Containers nest deeper than the decoder supports.
    TooDeep,
    /// Non-whitespace after the top-level value.
    TrailingCharacters,
    /// The firmware decoder reported an error. The message went to the handler.
    Firmware,
}

impl DecodeErrorKind {
    /// Message passed to [`DecodeHandler::decode_error`].
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Missing => "decoder unavailable",
            Self::UnexpectedEof => "unexpected end of input",
            Self::UnexpectedCharacter => "unexpected character",
            Self::InvalidNumber => "invalid number",
            Self::InvalidEscape => "invalid escape sequence",
            Self::StringTooLong => "string too long",
            Self::TooDeep => "nesting too deep",
            Self::TrailingCharacters => "trailing characters",
            Self::Firmware => "decode failed",
        }
    }
}

/// Error type for decoding, with the 1-based line it occurred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub line: u32,
}

impl DecodeError {
    #[must_use]
    pub const fn new(kind: DecodeErrorKind, line: u32) -> Self {
        Self { kind, line }
    }
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind.message())
    }
}

/// The `JSON` table's decoding half.
pub trait Json {
    /// Decode a complete document held in memory.
    fn decode_str<H: DecodeHandler>(&self, text: &str, handler: &mut H) -> Result<(), DecodeError>;

    /// Decode from `read`, which fills the buffer and returns the byte
    /// count, 0 at end of input.
    fn decode_reader<H: DecodeHandler>(
        &self,
        read: &mut dyn FnMut(&mut [u8]) -> usize,
        handler: &mut H,
    ) -> Result<(), DecodeError>;
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    struct Defaults;
    impl DecodeHandler for Defaults {}

    #[test]
    fn test_handler_defaults() {
        let mut h = Defaults;
        assert!(h.should_decode_table_value_for_key("a"));
        assert!(h.should_decode_array_value_at_index(1));
        assert_eq!(h.did_decode_sublist(ROOT_NAME, ValueType::Table), None);
    }

    #[test]
    fn test_error_display() {
        let err = DecodeError::new(DecodeErrorKind::InvalidNumber, 3);
        assert_eq!(err.to_string(), "line 3: invalid number");
    }
}
