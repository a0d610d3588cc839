//! Dynamically typed JSON values and their coercion rules.
//!
//! [`Value`] replaces the firmware's manually tagged `json_value` union.
//! Payloads for strings, arrays and tables are borrowed: the decoder that
//! produced them owns the storage, and a `Value` is only a view.
//!
//! The coercions are total. Nothing here returns an error; malformed input
//! degrades to zero, `false` or `None`.
//!
//! | tag     | [`Value::int_value`] | [`Value::float_value`] |
//! |---------|----------------------|------------------------|
//! | Integer | payload              | payload as float       |
//! | Float   | truncated            | payload                |
//! | String  | `strtol` prefix      | 0.0 (never parsed)     |
//! | True    | 1                    | 1.0                    |
//! | other   | 0                    | 0.0                    |

use crate::handle::ListRef;

/// Type tag of a [`Value`] (`json_value_type`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ValueType {
    Null = 0,
    True = 1,
    False = 2,
    Integer = 3,
    Float = 4,
    String = 5,
    Array = 6,
    Table = 7,
}

impl ValueType {
    /// Decode a raw tag byte.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => Self::Null,
            1 => Self::True,
            2 => Self::False,
            3 => Self::Integer,
            4 => Self::Float,
            5 => Self::String,
            6 => Self::Array,
            7 => Self::Table,
            _ => return None,
        })
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// A dynamically typed value.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value<'a> {
    Null,
    True,
    False,
    Integer(i32),
    Float(f32),
    String(&'a str),
    Array(ListRef),
    Table(ListRef),
}

impl<'a> Value<'a> {
    #[inline]
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }

    /// The tag of this value.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::True => ValueType::True,
            Self::False => ValueType::False,
            Self::Integer(_) => ValueType::Integer,
            Self::Float(_) => ValueType::Float,
            Self::String(_) => ValueType::String,
            Self::Array(_) => ValueType::Array,
            Self::Table(_) => ValueType::Table,
        }
    }

    /// Coerce to an integer (`json_intValue`).
    ///
    /// Floats truncate toward zero. Strings are read with [`parse_int_prefix`].
    #[must_use]
    pub fn int_value(&self) -> i32 {
        match *self {
            Self::Integer(i) => i,
            // `as` truncates toward zero and saturates out-of-range values
            Self::Float(f) => f as i32,
            Self::String(s) => parse_int_prefix(s),
            Self::True => 1,
            _ => 0,
        }
    }

    /// Coerce to a float (`json_floatValue`).
    ///
    /// Unlike [`int_value`](Self::int_value), strings are not parsed and
    /// always yield `0.0`.
    #[must_use]
    pub fn float_value(&self) -> f32 {
        match *self {
            Self::Integer(i) => i as f32,
            Self::Float(f) => f,
            Self::True => 1.0,
            _ => 0.0,
        }
    }

    /// Coerce to a boolean (`json_boolValue`).
    ///
    /// A string is true when non-empty, whatever it contains. Every other tag
    /// is true when its integer coercion is non-zero.
    #[must_use]
    pub fn bool_value(&self) -> bool {
        match *self {
            Self::String(s) => !s.is_empty(),
            _ => self.int_value() != 0,
        }
    }

    /// The string payload, if this is a string (`json_stringValue`).
    ///
    /// Numbers are never formatted.
    #[must_use]
    pub const fn string_value(&self) -> Option<&'a str> {
        match *self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The list reference, if this is an array or a table.
    #[must_use]
    pub const fn list_ref(&self) -> Option<ListRef> {
        match *self {
            Self::Array(list) | Self::Table(list) => Some(list),
            _ => None,
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl From<i32> for Value<'_> {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<f32> for Value<'_> {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Self::String(value)
    }
}

/// Parse the longest base-10 integer prefix of `s`, C `strtol` style.
///
/// Leading whitespace (space, `\t`, `\n`, `\v`, `\f`, `\r`) and one optional
/// sign are skipped. Parsing stops at the first non-digit. No digits yields
/// 0. Out-of-range values saturate to `i32::MIN`/`i32::MAX`.
///
/// ```
/// use playdate_core::value::parse_int_prefix;
///
/// assert_eq!(parse_int_prefix("  -42abc"), -42);
/// assert_eq!(parse_int_prefix("abc"), 0);
/// ```
#[must_use]
pub fn parse_int_prefix(s: &str) -> i32 {
    // One past i32::MAX, so i32::MIN still fits after negation
    const LIMIT: i64 = i32::MAX as i64 + 1;

    let bytes = s.as_bytes();
    let mut pos = bytes
        .iter()
        .position(|&b| !matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r'))
        .unwrap_or(bytes.len());

    let negative = match bytes.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let mut magnitude: i64 = 0;
    for &b in &bytes[pos..] {
        if !b.is_ascii_digit() {
            break;
        }
        magnitude = (magnitude * 10 + i64::from(b - b'0')).min(LIMIT);
    }

    let signed = if negative { -magnitude } else { magnitude };
    signed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(raw: usize) -> ListRef {
        ListRef::from_raw(raw).unwrap()
    }

    #[test]
    fn test_int_value() {
        assert_eq!(Value::Integer(5).int_value(), 5);
        assert_eq!(Value::Float(5.9).int_value(), 5);
        assert_eq!(Value::Float(-5.9).int_value(), -5);
        assert_eq!(Value::String("42abc").int_value(), 42);
        assert_eq!(Value::String("abc").int_value(), 0);
        assert_eq!(Value::True.int_value(), 1);
        assert_eq!(Value::False.int_value(), 0);
        assert_eq!(Value::Null.int_value(), 0);
        assert_eq!(Value::Array(list(1)).int_value(), 0);
        assert_eq!(Value::Table(list(1)).int_value(), 0);
    }

    #[test]
    fn test_float_value() {
        assert_eq!(Value::Integer(-3).float_value(), -3.0);
        assert_eq!(Value::Float(2.5).float_value(), 2.5);
        assert_eq!(Value::String("42").float_value(), 0.0);
        assert_eq!(Value::True.float_value(), 1.0);
        assert_eq!(Value::False.float_value(), 0.0);
        assert_eq!(Value::Null.float_value(), 0.0);
        assert_eq!(Value::Table(list(8)).float_value(), 0.0);
    }

    #[test]
    fn test_bool_value() {
        assert!(!Value::String("").bool_value());
        assert!(Value::String("0").bool_value());
        assert!(Value::String("false").bool_value());
        assert!(!Value::Integer(0).bool_value());
        assert!(Value::Integer(-1).bool_value());
        assert!(Value::True.bool_value());
        assert!(!Value::False.bool_value());
        assert!(!Value::Null.bool_value());
        // 0.4 truncates to 0
        assert!(!Value::Float(0.4).bool_value());
        assert!(Value::Float(1.5).bool_value());
        assert!(!Value::Array(list(4)).bool_value());
    }

    #[test]
    fn test_string_value() {
        assert_eq!(Value::String("hi").string_value(), Some("hi"));
        assert_eq!(Value::Integer(5).string_value(), None);
        assert_eq!(Value::True.string_value(), None);
    }

    #[test]
    fn test_string_with_leading_digits() {
        let v = Value::String("17dogs");
        assert_eq!(v.int_value(), 17);
        assert_eq!(v.float_value(), 0.0);
        assert!(v.bool_value());
        assert_eq!(v.string_value(), Some("17dogs"));
    }

    #[test]
    fn test_float_saturates() {
        assert_eq!(Value::Float(1e20).int_value(), i32::MAX);
        assert_eq!(Value::Float(-1e20).int_value(), i32::MIN);
        assert_eq!(Value::Float(f32::NAN).int_value(), 0);
    }

    #[test]
    fn test_parse_int_prefix_whitespace_and_sign() {
        assert_eq!(parse_int_prefix(" \t\n42"), 42);
        assert_eq!(parse_int_prefix("+7"), 7);
        assert_eq!(parse_int_prefix("-12x"), -12);
        assert_eq!(parse_int_prefix("- 3"), 0);
        assert_eq!(parse_int_prefix("   "), 0);
        assert_eq!(parse_int_prefix(""), 0);
        assert_eq!(parse_int_prefix("0x1F"), 0);
        assert_eq!(parse_int_prefix("3.99"), 3);
    }

    #[test]
    fn test_parse_int_prefix_saturates() {
        assert_eq!(parse_int_prefix("2147483647"), i32::MAX);
        assert_eq!(parse_int_prefix("2147483648"), i32::MAX);
        assert_eq!(parse_int_prefix("-2147483648"), i32::MIN);
        assert_eq!(parse_int_prefix("-99999999999999999999"), i32::MIN);
    }

    #[test]
    fn test_value_type_tags() {
        assert_eq!(Value::Null.value_type(), ValueType::Null);
        assert_eq!(Value::from(true).value_type(), ValueType::True);
        assert_eq!(Value::from(false).value_type(), ValueType::False);
        assert_eq!(Value::from(1i32).value_type(), ValueType::Integer);
        assert_eq!(Value::from(1.0f32).value_type(), ValueType::Float);
        assert_eq!(Value::from("x").value_type(), ValueType::String);
        assert_eq!(ValueType::from_raw(7), Some(ValueType::Table));
        assert_eq!(ValueType::from_raw(8), None);
        assert_eq!(ValueType::Array.raw(), 6);
    }
}
