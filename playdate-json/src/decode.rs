//! Callback-driven JSON decoder.
//!
//! Walks a document held in memory and reports it to a [`DecodeHandler`]
//! following the firmware decoder's contract:
//!
//! - the top-level array or table is a sublist named
//!   [`ROOT_NAME`](playdate_core::json::ROOT_NAME)
//! - a top-level scalar is reported as array position 0
//! - array positions are 1-based and sublists inside arrays are named by
//!   their position
//! - skipped values are still parsed, but nothing inside them is reported
//!
//! Strings without escapes are borrowed from the input. Escaped strings are
//! unescaped into a stack buffer of [`MAX_STRING_LENGTH`] bytes
//! ([`MAX_KEY_LENGTH`] for keys).

use playdate_core::handle::ListRef;
use playdate_core::json::{DecodeError, DecodeErrorKind, DecodeHandler, ROOT_NAME};
use playdate_core::value::{Value, ValueType};

use crate::fmt::{hex_value, write_u32};

/// Deepest nesting of arrays and tables accepted.
pub const MAX_DEPTH: usize = 32;

/// Longest escaped string value, in bytes after unescaping.
pub const MAX_STRING_LENGTH: usize = 256;

/// Longest escaped table key, in bytes after unescaping.
pub const MAX_KEY_LENGTH: usize = 64;

/// Decode `text`, reporting every value to `handler`.
///
/// On malformed input the handler's
/// [`decode_error`](DecodeHandler::decode_error) is called once with the
/// message and line before the error is returned.
///
/// # Example
///
/// ```
/// use playdate_core::json::DecodeHandler;
/// use playdate_core::Value;
///
/// #[derive(Default)]
/// struct Sum(i32);
///
/// impl DecodeHandler for Sum {
///     fn did_decode_array_value(&mut self, _pos: usize, value: Value<'_>) {
///         self.0 += value.int_value();
///     }
/// }
///
/// let mut sum = Sum::default();
/// playdate_json::decode("[1, 2.9, \"3 apples\", true]", &mut sum).unwrap();
/// assert_eq!(sum.0, 1 + 2 + 3 + 1);
/// ```
pub fn decode<H: DecodeHandler>(text: &str, handler: &mut H) -> Result<(), DecodeError> {
    let mut decoder = Decoder::new(text);
    let result = decoder.document(handler);
    if let Err(e) = result {
        handler.decode_error(e.kind.message(), e.line);
    }
    result
}

/// Swallows everything inside a skipped value.
struct Skip;

impl DecodeHandler for Skip {}

struct Decoder<'a> {
    bytes: &'a [u8],
    text: &'a str,
    pos: usize,
    line: u32,
    depth: usize,
}

impl<'a> Decoder<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            text,
            pos: 0,
            line: 1,
            depth: 0,
        }
    }

    fn error(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(kind, self.line)
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn next(&mut self) -> Result<u8, DecodeError> {
        let b = self
            .peek()
            .ok_or_else(|| self.error(DecodeErrorKind::UnexpectedEof))?;
        self.pos += 1;
        Ok(b)
    }

    fn expect(&mut self, expected: u8) -> Result<(), DecodeError> {
        match self.next()? {
            b if b == expected => Ok(()),
            _ => Err(self.error(DecodeErrorKind::UnexpectedCharacter)),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b'\n' => self.line += 1,
                b' ' | b'\t' | b'\r' => {}
                _ => break,
            }
            self.pos += 1;
        }
    }

    fn document<H: DecodeHandler>(&mut self, handler: &mut H) -> Result<(), DecodeError> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'{' | b'[') => {
                self.value(ROOT_NAME, handler, &mut [])?;
            }
            Some(_) => {
                let mut scratch = [0u8; MAX_STRING_LENGTH];
                let value = self.value(ROOT_NAME, handler, &mut scratch)?;
                handler.did_decode_array_value(0, value);
            }
            None => return Err(self.error(DecodeErrorKind::UnexpectedEof)),
        }

        self.skip_whitespace();
        if self.pos < self.bytes.len() {
            return Err(self.error(DecodeErrorKind::TrailingCharacters));
        }
        Ok(())
    }

    /// Parse one value. Containers are reported to `handler` as a sublist
    /// named `name`; scalars are returned without being reported.
    fn value<'s, H: DecodeHandler>(
        &mut self,
        name: &str,
        handler: &mut H,
        scratch: &'s mut [u8],
    ) -> Result<Value<'s>, DecodeError>
    where
        'a: 's,
    {
        self.skip_whitespace();
        match self.peek() {
            Some(b'{') => {
                let list = self.sublist(name, ValueType::Table, handler)?;
                Ok(list.map_or(Value::Null, Value::Table))
            }
            Some(b'[') => {
                let list = self.sublist(name, ValueType::Array, handler)?;
                Ok(list.map_or(Value::Null, Value::Array))
            }
            Some(b'"') => Ok(Value::String(self.string(scratch)?)),
            Some(b't') => self.literal(b"true", Value::True),
            Some(b'f') => self.literal(b"false", Value::False),
            Some(b'n') => self.literal(b"null", Value::Null),
            Some(b'-' | b'0'..=b'9') => self.number(),
            Some(_) => Err(self.error(DecodeErrorKind::UnexpectedCharacter)),
            None => Err(self.error(DecodeErrorKind::UnexpectedEof)),
        }
    }

    fn sublist<H: DecodeHandler>(
        &mut self,
        name: &str,
        kind: ValueType,
        handler: &mut H,
    ) -> Result<Option<ListRef>, DecodeError> {
        if self.depth == MAX_DEPTH {
            return Err(self.error(DecodeErrorKind::TooDeep));
        }
        self.depth += 1;

        handler.will_decode_sublist(name, kind);
        if kind == ValueType::Table {
            self.table_body(handler)?;
        } else {
            self.array_body(handler)?;
        }

        self.depth -= 1;
        Ok(handler.did_decode_sublist(name, kind))
    }

    fn table_body<H: DecodeHandler>(&mut self, handler: &mut H) -> Result<(), DecodeError> {
        self.expect(b'{')?;
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(());
        }

        loop {
            self.skip_whitespace();
            let mut key_buf = [0u8; MAX_KEY_LENGTH];
            let key = self.string(&mut key_buf)?;
            self.skip_whitespace();
            self.expect(b':')?;

            let mut scratch = [0u8; MAX_STRING_LENGTH];
            if handler.should_decode_table_value_for_key(key) {
                let value = self.value(key, handler, &mut scratch)?;
                handler.did_decode_table_value(key, value);
            } else {
                self.value(key, &mut Skip, &mut scratch)?;
            }

            self.skip_whitespace();
            match self.next()? {
                b',' => continue,
                b'}' => return Ok(()),
                _ => return Err(self.error(DecodeErrorKind::UnexpectedCharacter)),
            }
        }
    }

    fn array_body<H: DecodeHandler>(&mut self, handler: &mut H) -> Result<(), DecodeError> {
        self.expect(b'[')?;
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(());
        }

        let mut pos: usize = 1;
        loop {
            let mut name_buf = [0u8; 10];
            let len = write_u32(&mut name_buf, pos as u32);
            let name = core::str::from_utf8(&name_buf[..len]).unwrap_or_default();

            let mut scratch = [0u8; MAX_STRING_LENGTH];
            if handler.should_decode_array_value_at_index(pos) {
                let value = self.value(name, handler, &mut scratch)?;
                handler.did_decode_array_value(pos, value);
            } else {
                self.value(name, &mut Skip, &mut scratch)?;
            }

            self.skip_whitespace();
            match self.next()? {
                b',' => pos += 1,
                b']' => return Ok(()),
                _ => return Err(self.error(DecodeErrorKind::UnexpectedCharacter)),
            }
        }
    }

    fn literal<'s>(&mut self, word: &[u8], value: Value<'s>) -> Result<Value<'s>, DecodeError> {
        let end = self.pos + word.len();
        if end > self.bytes.len() {
            return Err(self.error(DecodeErrorKind::UnexpectedEof));
        }
        if &self.bytes[self.pos..end] != word {
            return Err(self.error(DecodeErrorKind::UnexpectedCharacter));
        }
        self.pos = end;
        Ok(value)
    }

    /// Integers that fit `i32` become `Integer`; everything else `Float`.
    fn number<'s>(&mut self) -> Result<Value<'s>, DecodeError> {
        let start = self.pos;
        let mut is_float = false;

        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.skip_digits(),
            _ => return Err(self.error(DecodeErrorKind::InvalidNumber)),
        }
        if self.peek() == Some(b'.') {
            is_float = true;
            self.pos += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.error(DecodeErrorKind::InvalidNumber));
            }
            self.skip_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            is_float = true;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.error(DecodeErrorKind::InvalidNumber));
            }
            self.skip_digits();
        }

        // Number syntax is ASCII, so these are char boundaries
        let text = &self.text[start..self.pos];
        if !is_float {
            if let Ok(i) = text.parse::<i32>() {
                return Ok(Value::Integer(i));
            }
        }
        text.parse::<f32>()
            .map(Value::Float)
            .map_err(|_| self.error(DecodeErrorKind::InvalidNumber))
    }

    fn skip_digits(&mut self) {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
    }

    /// Parse a quoted string. Borrowed from the input when it has no
    /// escapes, unescaped into `scratch` otherwise.
    fn string<'s>(&mut self, scratch: &'s mut [u8]) -> Result<&'s str, DecodeError>
    where
        'a: 's,
    {
        self.expect(b'"')?;
        let text = self.text;
        let start = self.pos;

        loop {
            match self.next()? {
                b'"' => return Ok(&text[start..self.pos - 1]),
                b'\\' => break,
                0x00..=0x1f => return Err(self.error(DecodeErrorKind::UnexpectedCharacter)),
                _ => {}
            }
        }

        // Slow path: copy what we have so far, then unescape the rest
        let plain = &self.bytes[start..self.pos - 1];
        let mut len = plain.len();
        scratch
            .get_mut(..len)
            .ok_or_else(|| self.error(DecodeErrorKind::StringTooLong))?
            .copy_from_slice(plain);

        let mut escaped = true;
        loop {
            let mut utf8 = [0u8; 4];
            let piece: &[u8] = if escaped {
                escaped = false;
                let c = self.escape()?;
                c.encode_utf8(&mut utf8).as_bytes()
            } else {
                match self.next()? {
                    b'"' => break,
                    b'\\' => {
                        escaped = true;
                        continue;
                    }
                    0x00..=0x1f => return Err(self.error(DecodeErrorKind::UnexpectedCharacter)),
                    b => {
                        utf8[0] = b;
                        &utf8[..1]
                    }
                }
            };

            let end = len + piece.len();
            scratch
                .get_mut(len..end)
                .ok_or_else(|| self.error(DecodeErrorKind::StringTooLong))?
                .copy_from_slice(piece);
            len = end;
        }

        core::str::from_utf8(&scratch[..len]).map_err(|_| self.error(DecodeErrorKind::InvalidEscape))
    }

    /// Decode the escape after a backslash.
    fn escape(&mut self) -> Result<char, DecodeError> {
        let c = match self.next()? {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => return self.unicode_escape(),
            _ => return Err(self.error(DecodeErrorKind::InvalidEscape)),
        };
        Ok(c)
    }

    fn unicode_escape(&mut self) -> Result<char, DecodeError> {
        let high = self.hex4()?;
        let code = if (0xd800..0xdc00).contains(&high) {
            if self.next()? != b'\\' || self.next()? != b'u' {
                return Err(self.error(DecodeErrorKind::InvalidEscape));
            }
            let low = self.hex4()?;
            if !(0xdc00..0xe000).contains(&low) {
                return Err(self.error(DecodeErrorKind::InvalidEscape));
            }
            0x10000 + ((high - 0xd800) << 10) + (low - 0xdc00)
        } else {
            high
        };
        char::from_u32(code).ok_or_else(|| self.error(DecodeErrorKind::InvalidEscape))
    }

    fn hex4(&mut self) -> Result<u32, DecodeError> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = hex_value(self.next()?).ok_or_else(|| self.error(DecodeErrorKind::InvalidEscape))?;
            code = (code << 4) | digit;
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::format;
    use std::string::{String, ToString};
    use std::vec::Vec;

    /// Records every callback as a line of text.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        next_list: usize,
        skip_key: Option<&'static str>,
        skip_pos: Option<usize>,
    }

    fn describe(value: &Value<'_>) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::True => "true".to_string(),
            Value::False => "false".to_string(),
            Value::Integer(i) => format!("int {i}"),
            Value::Float(f) => format!("float {f}"),
            Value::String(s) => format!("str {s:?}"),
            Value::Array(l) => format!("array #{}", l.raw()),
            Value::Table(l) => format!("table #{}", l.raw()),
        }
    }

    impl DecodeHandler for Recorder {
        fn decode_error(&mut self, message: &str, line: u32) {
            self.events.push(format!("error {message} @{line}"));
        }

        fn will_decode_sublist(&mut self, name: &str, kind: ValueType) {
            self.events.push(format!("begin {name} {kind:?}"));
        }

        fn should_decode_table_value_for_key(&mut self, key: &str) -> bool {
            self.skip_key != Some(key)
        }

        fn did_decode_table_value(&mut self, key: &str, value: Value<'_>) {
            self.events.push(format!("{key} = {}", describe(&value)));
        }

        fn should_decode_array_value_at_index(&mut self, pos: usize) -> bool {
            self.skip_pos != Some(pos)
        }

        fn did_decode_array_value(&mut self, pos: usize, value: Value<'_>) {
            self.events.push(format!("[{pos}] = {}", describe(&value)));
        }

        fn did_decode_sublist(&mut self, name: &str, kind: ValueType) -> Option<ListRef> {
            self.next_list += 1;
            self.events.push(format!("end {name} {kind:?} #{}", self.next_list));
            ListRef::from_raw(self.next_list)
        }
    }

    fn events(text: &str) -> Vec<String> {
        let mut rec = Recorder::default();
        let _ = decode(text, &mut rec);
        rec.events
    }

    #[test]
    fn test_root_table() {
        assert_eq!(
            events(r#"{"a": 1, "b": [true, null], "c": "x"}"#),
            [
                "begin _root Table",
                "a = int 1",
                "begin b Array",
                "[1] = true",
                "[2] = null",
                "end b Array #1",
                "b = array #1",
                "c = str \"x\"",
                "end _root Table #2",
            ]
        );
    }

    #[test]
    fn test_bare_scalar_is_position_zero() {
        assert_eq!(events(" 42 "), ["[0] = int 42"]);
        assert_eq!(events("\"hi\""), ["[0] = str \"hi\""]);
    }

    #[test]
    fn test_nested_arrays_named_by_position() {
        assert_eq!(
            events("[[1], {}]"),
            [
                "begin _root Array",
                "begin 1 Array",
                "[1] = int 1",
                "end 1 Array #1",
                "[1] = array #1",
                "begin 2 Table",
                "end 2 Table #2",
                "[2] = table #2",
                "end _root Array #3",
            ]
        );
    }

    #[test]
    fn test_skipped_values_are_silent() {
        let mut rec = Recorder {
            skip_key: Some("big"),
            ..Recorder::default()
        };
        decode(r#"{"big": {"x": [1, 2]}, "keep": 3}"#, &mut rec).unwrap();
        assert_eq!(
            rec.events,
            ["begin _root Table", "keep = int 3", "end _root Table #1"]
        );

        let mut rec = Recorder {
            skip_pos: Some(2),
            ..Recorder::default()
        };
        decode("[10, 20, 30]", &mut rec).unwrap();
        assert_eq!(
            rec.events,
            [
                "begin _root Array",
                "[1] = int 10",
                "[3] = int 30",
                "end _root Array #1"
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(events("-7"), ["[0] = int -7"]);
        assert_eq!(events("2.5"), ["[0] = float 2.5"]);
        assert_eq!(events("1e2"), ["[0] = float 100"]);
        // Too big for i32
        assert_eq!(events("3000000000"), ["[0] = float 3000000000"]);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(
            events(r#""a\"b\\c\/d\n\u00e9\ud83d\ude00""#),
            ["[0] = str \"a\\\"b\\\\c/d\\né😀\""]
        );
    }

    #[test]
    fn test_errors_report_line() {
        let mut rec = Recorder::default();
        let err = decode("{\n\"a\": tru\n}", &mut rec).unwrap_err();
        assert_eq!(err, DecodeError::new(DecodeErrorKind::UnexpectedCharacter, 2));
        assert_eq!(rec.events.last().unwrap(), "error unexpected character @2");
    }

    #[test]
    fn test_error_kinds() {
        let kind = |text: &str| decode(text, &mut Skip).unwrap_err().kind;
        assert_eq!(kind(""), DecodeErrorKind::UnexpectedEof);
        assert_eq!(kind("[1, 2"), DecodeErrorKind::UnexpectedEof);
        assert_eq!(kind("[1] x"), DecodeErrorKind::TrailingCharacters);
        assert_eq!(kind("-"), DecodeErrorKind::InvalidNumber);
        assert_eq!(kind("1."), DecodeErrorKind::InvalidNumber);
        assert_eq!(kind(r#""\x""#), DecodeErrorKind::InvalidEscape);
        assert_eq!(kind(r#""\ud800""#), DecodeErrorKind::InvalidEscape);
        assert_eq!(kind("{1: 2}"), DecodeErrorKind::UnexpectedCharacter);

        let deep = "[".repeat(MAX_DEPTH + 1);
        assert_eq!(kind(&deep), DecodeErrorKind::TooDeep);
    }

    #[test]
    fn test_long_escaped_string() {
        let long = format!("\"\\n{}\"", "x".repeat(MAX_STRING_LENGTH));
        let err = decode(&long, &mut Skip).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::StringTooLong);

        // Unescaped strings are borrowed and have no limit
        let plain = format!("\"{}\"", "x".repeat(MAX_STRING_LENGTH * 2));
        assert!(decode(&plain, &mut Skip).is_ok());
    }

    #[test]
    fn test_sublist_without_ref_is_null() {
        struct NoRefs(Vec<String>);
        impl DecodeHandler for NoRefs {
            fn did_decode_table_value(&mut self, key: &str, value: Value<'_>) {
                self.0.push(format!("{key} = {}", describe(&value)));
            }
        }

        let mut h = NoRefs(Vec::new());
        decode(r#"{"list": [1]}"#, &mut h).unwrap();
        assert_eq!(h.0, ["list = null"]);
    }
}
