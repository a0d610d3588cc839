//! Sandboxed file access.
//!
//! Paths are relative to the game's data directory; reads fall back to the
//! game bundle when [`FileOptions::READ`] is set.

use core::ops::BitOr;

use crate::handle::File;

/// Open mode bitflags (`FileOptions`).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FileOptions(pub u32);

impl FileOptions {
    /// Read from the game bundle.
    pub const READ: Self = Self(1 << 0);
    /// Read from the data directory.
    pub const READ_DATA: Self = Self(1 << 1);
    pub const WRITE: Self = Self(1 << 2);
    pub const APPEND: Self = Self(1 << 3);

    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    #[must_use]
    pub const fn is_writable(self) -> bool {
        self.0 & (Self::WRITE.0 | Self::APPEND.0) != 0
    }
}

impl BitOr for FileOptions {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Result of [`FileSystem::stat`] (`FileStat`).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FileStat {
    pub is_dir: bool,
    pub size: u32,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
}

/// Origin for [`FileSystem::seek`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Whence {
    Start,
    Current,
    End,
}

impl Whence {
    /// C `SEEK_SET`/`SEEK_CUR`/`SEEK_END`.
    #[must_use]
    pub const fn raw(self) -> i32 {
        match self {
            Self::Start => 0,
            Self::Current => 1,
            Self::End => 2,
        }
    }
}

/// Error type for file operations.
///
/// The firmware only reports failure; details are in
/// [`FileSystem::last_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FileError {
    /// The firmware table lacks the entry point.
    Missing,
    /// Path contains a NUL byte or is too long.
    InvalidPath,
    /// No such file or directory.
    NotFound,
    /// Handle was opened without the required mode.
    BadMode,
    /// Buffer length does not fit the firmware's length type.
    TooLarge,
    /// Any other failure reported by the firmware.
    Failed,
}

/// The `File` table.
pub trait FileSystem {
    /// Call `f` once per entry in `path`. Directories end in `/`.
    ///
    /// Hidden entries are skipped unless `show_hidden` is set.
    fn list_files(
        &self,
        path: &str,
        show_hidden: bool,
        f: &mut dyn FnMut(&str),
    ) -> Result<(), FileError>;

    fn stat(&self, path: &str) -> Result<FileStat, FileError>;

    fn mkdir(&self, path: &str) -> Result<(), FileError>;

    /// Delete a file, or a directory and its contents when `recursive`.
    fn unlink(&self, path: &str, recursive: bool) -> Result<(), FileError>;

    fn rename(&self, from: &str, to: &str) -> Result<(), FileError>;

    fn open(&self, path: &str, mode: FileOptions) -> Result<File, FileError>;

    fn close(&self, file: File) -> Result<(), FileError>;

    /// Returns the number of bytes read, 0 at end of file.
    fn read(&self, file: File, buf: &mut [u8]) -> Result<usize, FileError>;

    fn write(&self, file: File, buf: &[u8]) -> Result<usize, FileError>;

    fn flush(&self, file: File) -> Result<(), FileError>;

    fn tell(&self, file: File) -> Result<u32, FileError>;

    fn seek(&self, file: File, offset: i32, whence: Whence) -> Result<(), FileError>;

    /// Text of the most recent error, if any.
    fn last_error(&self) -> Option<&str>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options() {
        let mode = FileOptions::READ | FileOptions::READ_DATA;
        assert!(mode.contains(FileOptions::READ));
        assert!(!mode.is_writable());
        assert!(FileOptions::APPEND.is_writable());
        assert_eq!(mode.0, 3);
    }

    #[test]
    fn test_whence_raw() {
        assert_eq!(Whence::Start.raw(), 0);
        assert_eq!(Whence::End.raw(), 2);
    }
}
