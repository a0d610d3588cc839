//! No-std formatting helpers shared by the decoder and the encoder.

/// Write a u32 as a decimal string.
///
/// Returns the number of bytes written (1-10 bytes).
///
/// # Panics
///
/// Panics if `buf.len() < 10` (max size: "4294967295").
#[inline]
pub fn write_u32(buf: &mut [u8], value: u32) -> usize {
    debug_assert!(buf.len() >= 10, "buffer too small for u32");

    if value == 0 {
        buf[0] = b'0';
        return 1;
    }

    let mut temp = [0u8; 10];
    let mut n = value;
    let mut len = 0;
    while n > 0 {
        temp[len] = b'0' + (n % 10) as u8;
        n /= 10;
        len += 1;
    }

    for i in 0..len {
        buf[i] = temp[len - 1 - i];
    }
    len
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Write `s` as the body of a JSON string, escaping as needed.
pub fn write_escaped<W: core::fmt::Write>(w: &mut W, s: &str) -> core::fmt::Result {
    let bytes = s.as_bytes();
    let mut start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        let escape: &str = match b {
            b'"' => "\\\"",
            b'\\' => "\\\\",
            b'\n' => "\\n",
            b'\r' => "\\r",
            b'\t' => "\\t",
            0x08 => "\\b",
            0x0c => "\\f",
            0x00..=0x1f => "",
            _ => continue,
        };

        // Escapes are ASCII, so `i` is always a char boundary
        w.write_str(&s[start..i])?;
        if escape.is_empty() {
            let hex = [
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX_DIGITS[(b >> 4) as usize],
                HEX_DIGITS[(b & 0xf) as usize],
            ];
            for c in hex {
                w.write_char(c as char)?;
            }
        } else {
            w.write_str(escape)?;
        }
        start = i + 1;
    }

    w.write_str(&s[start..])
}

/// Value of an ASCII hex digit.
#[inline]
pub fn hex_value(b: u8) -> Option<u32> {
    match b {
        b'0'..=b'9' => Some(u32::from(b - b'0')),
        b'a'..=b'f' => Some(u32::from(b - b'a' + 10)),
        b'A'..=b'F' => Some(u32::from(b - b'A' + 10)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::String;

    #[test]
    fn test_write_u32() {
        let mut buf = [0u8; 10];

        let len = write_u32(&mut buf, 0);
        assert_eq!(&buf[..len], b"0");

        let len = write_u32(&mut buf, 7);
        assert_eq!(&buf[..len], b"7");

        let len = write_u32(&mut buf, 1200);
        assert_eq!(&buf[..len], b"1200");

        let len = write_u32(&mut buf, u32::MAX);
        assert_eq!(&buf[..len], b"4294967295");
    }

    #[test]
    fn test_write_escaped() {
        let mut out = String::new();
        write_escaped(&mut out, "a\"b\\c\nd\u{1}é").unwrap();
        assert_eq!(out, "a\\\"b\\\\c\\nd\\u0001é");
    }

    #[test]
    fn test_hex_value() {
        assert_eq!(hex_value(b'0'), Some(0));
        assert_eq!(hex_value(b'f'), Some(15));
        assert_eq!(hex_value(b'B'), Some(11));
        assert_eq!(hex_value(b'g'), None);
    }
}
