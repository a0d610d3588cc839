//! Helpers for crossing the C boundary: bounded C strings, handle and
//! pointer conversion, and string borrowing.

use core::ffi::{c_char, c_int, CStr};
use core::fmt;

use playdate_core::handle::{
    Bitmap, BitmapTable, File, Font, ListRef, LuaObject, MenuItem, Opaque, SoundChannel,
    SoundEffect, SoundSource, Sprite, VideoPlayer,
};

/// Paths, titles and names passed to the firmware.
pub const NAME_CAPACITY: usize = 256;

/// Call a function from a firmware table. Yields `None` when the table
/// lacks the entry point.
macro_rules! invoke {
    ($table:expr, $name:ident($($arg:expr),* $(,)?)) => {
        match $table.$name {
            // SAFETY: entries come from the firmware and follow the C ABI
            // declared in playdate-sys.
            Some(f) => Some(unsafe { f($($arg),*) }),
            None => {
                log::warn!(concat!(stringify!($name), " is missing"));
                None
            }
        }
    };
}

pub(crate) use invoke;

/// A NUL-terminated string held inline.
///
/// [`CStrBuf::new`] rejects text the firmware cannot take. Writing through
/// [`fmt::Write`] truncates instead, which suits log lines.
#[derive(Clone, Default)]
pub struct CStrBuf<const N: usize> {
    bytes: heapless::Vec<u8, N>,
}

impl<const N: usize> CStrBuf<N> {
    /// Copy `text`. `None` if it holds a NUL byte or does not fit with the
    /// terminator.
    pub fn new(text: &str) -> Option<Self> {
        if text.len() >= N || text.as_bytes().contains(&0) {
            return None;
        }
        let mut buf = Self::default();
        buf.bytes.extend_from_slice(text.as_bytes()).ok()?;
        buf.bytes.push(0).ok()?;
        Some(buf)
    }

    /// Text without the terminator.
    pub fn as_str(&self) -> &str {
        let text = self.bytes.strip_suffix(&[0]).unwrap_or(&self.bytes);
        core::str::from_utf8(text).unwrap_or_default()
    }

    /// Pointer valid while `self` is alive. Always NUL-terminated.
    pub fn as_ptr(&mut self) -> *const c_char {
        if self.bytes.last() != Some(&0) {
            if self.bytes.is_full() {
                self.bytes.pop();
            }
            // Room was made above
            let _ = self.bytes.push(0);
        }
        self.bytes.as_ptr().cast()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl<const N: usize> fmt::Write for CStrBuf<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.bytes.last() == Some(&0) {
            self.bytes.pop();
        }
        for ch in s.chars() {
            let ch = if ch == '\0' { '?' } else { ch };
            let mut utf8 = [0u8; 4];
            let encoded = ch.encode_utf8(&mut utf8).as_bytes();
            // Keep one byte for the terminator
            if self.bytes.len() + encoded.len() >= N {
                break;
            }
            let _ = self.bytes.extend_from_slice(encoded);
        }
        Ok(())
    }
}

/// Name buffer used for most API arguments.
pub type Name = CStrBuf<NAME_CAPACITY>;

/// Borrow a firmware string. `None` for null or non-UTF-8 text.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for `'a`.
pub unsafe fn borrow_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per the caller.
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

#[inline]
pub const fn flag(value: bool) -> c_int {
    value as c_int
}

/// Conversion between a handle and the firmware pointer it wraps.
pub trait RawHandle: Sized + Copy {
    fn from_ptr<T>(ptr: *mut T) -> Option<Self>;
    fn as_ptr<T>(self) -> *mut T;
}

macro_rules! raw_handle {
    ($($name:ident),* $(,)?) => {
        $(
            impl RawHandle for $name {
                #[inline]
                fn from_ptr<T>(ptr: *mut T) -> Option<Self> {
                    Self::from_raw(ptr as usize)
                }

                #[inline]
                fn as_ptr<T>(self) -> *mut T {
                    self.raw() as *mut T
                }
            }
        )*
    };
}

raw_handle!(
    Bitmap,
    BitmapTable,
    Font,
    Sprite,
    MenuItem,
    File,
    VideoPlayer,
    SoundChannel,
    SoundSource,
    SoundEffect,
    LuaObject,
    ListRef,
    Opaque,
);

/// Pointer for an optional handle, null for `None`.
#[inline]
pub fn ptr_or_null<H: RawHandle, T>(handle: Option<H>) -> *mut T {
    handle.map_or(core::ptr::null_mut(), H::as_ptr)
}
