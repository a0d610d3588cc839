//! Streaming JSON encoder.
//!
//! Mirrors the firmware encoder: containers are opened and closed
//! explicitly, and every element is announced with
//! [`add_array_member`](Encoder::add_array_member) or
//! [`add_table_member`](Encoder::add_table_member) before its value is
//! written.

use core::fmt::Write;

use playdate_core::value::Value;

use crate::decode::MAX_DEPTH;
use crate::fmt::write_escaped;

/// Error type for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// The underlying writer failed (usually out of space).
    Write,
    /// A container was closed that is not open, or the wrong kind was closed.
    Unbalanced,
    /// More than [`MAX_DEPTH`] containers are open.
    TooDeep,
    /// An array or table value cannot be written without its contents.
    List,
}

impl From<core::fmt::Error> for EncodeError {
    fn from(_: core::fmt::Error) -> Self {
        Self::Write
    }
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Write => write!(f, "Writer failed"),
            Self::Unbalanced => write!(f, "Unbalanced container"),
            Self::TooDeep => write!(f, "Nesting too deep"),
            Self::List => write!(f, "List value without contents"),
        }
    }
}

/// JSON writer over any [`core::fmt::Write`].
///
/// # Example
///
/// ```
/// use playdate_json::Encoder;
///
/// let mut enc = Encoder::new(String::new(), false);
/// enc.start_table().unwrap();
/// enc.add_table_member("hp").unwrap();
/// enc.write_int(3).unwrap();
/// enc.add_table_member("tags").unwrap();
/// enc.start_array().unwrap();
/// enc.add_array_member().unwrap();
/// enc.write_string("boss").unwrap();
/// enc.end_array().unwrap();
/// enc.end_table().unwrap();
///
/// assert_eq!(enc.finish().unwrap(), r#"{"hp":3,"tags":["boss"]}"#);
/// ```
pub struct Encoder<W: Write> {
    writer: W,
    pretty: bool,
    depth: usize,
    /// Bit `n` set when the container at depth `n + 1` is a table.
    tables: u32,
    /// No member has been added to the innermost container yet.
    empty: bool,
}

impl<W: Write> Encoder<W> {
    /// Create an encoder. `pretty` adds newlines and two-space indentation.
    pub const fn new(writer: W, pretty: bool) -> Self {
        Self {
            writer,
            pretty,
            depth: 0,
            tables: 0,
            empty: true,
        }
    }

    /// Number of open containers.
    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    pub fn start_array(&mut self) -> Result<(), EncodeError> {
        self.open(false)?;
        self.writer.write_char('[')?;
        Ok(())
    }

    pub fn add_array_member(&mut self) -> Result<(), EncodeError> {
        self.member(false)
    }

    pub fn end_array(&mut self) -> Result<(), EncodeError> {
        self.close(false, ']')
    }

    pub fn start_table(&mut self) -> Result<(), EncodeError> {
        self.open(true)?;
        self.writer.write_char('{')?;
        Ok(())
    }

    /// Start a table entry named `name`. The value is written next.
    pub fn add_table_member(&mut self, name: &str) -> Result<(), EncodeError> {
        self.member(true)?;
        self.writer.write_char('"')?;
        write_escaped(&mut self.writer, name)?;
        self.writer.write_str(if self.pretty { "\": " } else { "\":" })?;
        Ok(())
    }

    pub fn end_table(&mut self) -> Result<(), EncodeError> {
        self.close(true, '}')
    }

    pub fn write_null(&mut self) -> Result<(), EncodeError> {
        self.writer.write_str("null")?;
        Ok(())
    }

    pub fn write_true(&mut self) -> Result<(), EncodeError> {
        self.writer.write_str("true")?;
        Ok(())
    }

    pub fn write_false(&mut self) -> Result<(), EncodeError> {
        self.writer.write_str("false")?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), EncodeError> {
        if value {
            self.write_true()
        } else {
            self.write_false()
        }
    }

    pub fn write_int(&mut self, value: i32) -> Result<(), EncodeError> {
        write!(self.writer, "{value}")?;
        Ok(())
    }

    /// Write a number. JSON has no NaN or infinity, so those become `null`.
    pub fn write_double(&mut self, value: f64) -> Result<(), EncodeError> {
        if value.is_finite() {
            write!(self.writer, "{value}")?;
            Ok(())
        } else {
            self.write_null()
        }
    }

    pub fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.writer.write_char('"')?;
        write_escaped(&mut self.writer, value)?;
        self.writer.write_char('"')?;
        Ok(())
    }

    /// Write a scalar [`Value`].
    ///
    /// Arrays and tables only carry a reference, so they are rejected with
    /// [`EncodeError::List`]; write their contents member by member.
    pub fn write_value(&mut self, value: &Value<'_>) -> Result<(), EncodeError> {
        match *value {
            Value::Null => self.write_null(),
            Value::True => self.write_true(),
            Value::False => self.write_false(),
            Value::Integer(i) => self.write_int(i),
            Value::Float(f) => self.write_double(f64::from(f)),
            Value::String(s) => self.write_string(s),
            Value::Array(_) | Value::Table(_) => Err(EncodeError::List),
        }
    }

    /// Return the writer once every container is closed.
    pub fn finish(self) -> Result<W, EncodeError> {
        if self.depth != 0 {
            return Err(EncodeError::Unbalanced);
        }
        Ok(self.writer)
    }

    /// Return the writer, whatever state the document is in.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn open(&mut self, table: bool) -> Result<(), EncodeError> {
        if self.depth == MAX_DEPTH {
            return Err(EncodeError::TooDeep);
        }
        if table {
            self.tables |= 1 << self.depth;
        } else {
            self.tables &= !(1 << self.depth);
        }
        self.depth += 1;
        self.empty = true;
        Ok(())
    }

    fn member(&mut self, table: bool) -> Result<(), EncodeError> {
        if self.depth == 0 || self.innermost_is_table() != table {
            return Err(EncodeError::Unbalanced);
        }
        if !self.empty {
            self.writer.write_char(',')?;
        }
        self.empty = false;
        self.newline()
    }

    fn close(&mut self, table: bool, bracket: char) -> Result<(), EncodeError> {
        if self.depth == 0 || self.innermost_is_table() != table {
            return Err(EncodeError::Unbalanced);
        }
        self.depth -= 1;
        if !self.empty {
            self.newline()?;
        }
        self.writer.write_char(bracket)?;
        // The parent got a member announced before this container opened
        self.empty = false;
        Ok(())
    }

    #[inline]
    fn innermost_is_table(&self) -> bool {
        self.tables & (1 << (self.depth - 1)) != 0
    }

    fn newline(&mut self) -> Result<(), EncodeError> {
        if self.pretty {
            self.writer.write_char('\n')?;
            for _ in 0..self.depth {
                self.writer.write_str("  ")?;
            }
        }
        Ok(())
    }
}

#[cfg(feature = "heapless")]
impl<const N: usize> Encoder<heapless::String<N>> {
    /// Encode into a fixed-capacity string.
    pub const fn heapless(pretty: bool) -> Self {
        Self::new(heapless::String::new(), pretty)
    }
}

/// Adapts an [`embedded_io::Write`] sink to [`core::fmt::Write`].
///
/// The I/O error is kept and can be recovered with
/// [`error`](IoWriter::error) after an [`EncodeError::Write`].
#[cfg(feature = "embedded-io")]
pub struct IoWriter<W: embedded_io::Write> {
    inner: W,
    error: Option<W::Error>,
}

#[cfg(feature = "embedded-io")]
impl<W: embedded_io::Write> IoWriter<W> {
    pub const fn new(inner: W) -> Self {
        Self { inner, error: None }
    }

    /// The last I/O error, if any.
    pub fn error(&self) -> Option<&W::Error> {
        self.error.as_ref()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(feature = "embedded-io")]
impl<W: embedded_io::Write> Write for IoWriter<W> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.inner.write_all(s.as_bytes()).map_err(|e| {
            self.error = Some(e);
            core::fmt::Error
        })
    }
}
