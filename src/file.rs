use core::ffi::{c_char, c_int, c_uint, c_void};

use ::playdate_sys as sys;
use playdate_core::file::{FileError, FileOptions, FileStat, FileSystem, Whence};
use playdate_core::handle::File;
use sys::playdate_file;

use crate::ffi::{borrow_str, flag, invoke, Name, RawHandle};

type Visitor<'a> = &'a mut dyn FnMut(&str);

unsafe extern "C" fn list_trampoline(path: *const c_char, userdata: *mut c_void) {
    // SAFETY: userdata is the `Visitor` borrowed by `list_files` for the
    // duration of the call.
    let visit = unsafe { &mut *userdata.cast::<Visitor<'_>>() };
    // SAFETY: the firmware passes a NUL-terminated name.
    if let Some(path) = unsafe { borrow_str(path) } {
        visit(path);
    }
}

fn path(text: &str) -> Result<Name, FileError> {
    Name::new(text).ok_or(FileError::InvalidPath)
}

/// [`FileSystem`] over `playdate_file`.
///
/// The firmware reports every failure as `-1` and keeps the reason for
/// [`FileSystem::last_error`]. Lookups that come back empty are reported as
/// [`FileError::NotFound`], anything else as [`FileError::Failed`].
#[derive(Clone, Copy)]
pub struct DeviceFile {
    table: &'static playdate_file,
}

impl DeviceFile {
    pub(crate) fn new(table: &'static playdate_file) -> Self {
        Self { table }
    }

    fn check(&self, result: Option<c_int>, failure: FileError) -> Result<c_int, FileError> {
        match result {
            None => Err(FileError::Missing),
            Some(code) if code < 0 => {
                if let Some(reason) = self.last_error() {
                    log::debug!("file: {}", reason);
                }
                Err(failure)
            }
            Some(code) => Ok(code),
        }
    }
}

impl FileSystem for DeviceFile {
    fn list_files(
        &self,
        path: &str,
        show_hidden: bool,
        mut f: &mut dyn FnMut(&str),
    ) -> Result<(), FileError> {
        let mut dir = self::path(path)?;
        let userdata: *mut Visitor<'_> = &mut f;
        let result = invoke!(
            self.table,
            listfiles(
                dir.as_ptr(),
                Some(list_trampoline),
                userdata.cast(),
                flag(show_hidden),
            )
        );
        self.check(result, FileError::NotFound).map(drop)
    }

    fn stat(&self, path: &str) -> Result<FileStat, FileError> {
        let mut path = self::path(path)?;
        let mut raw = sys::FileStat::default();
        let result = invoke!(self.table, stat(path.as_ptr(), &mut raw));
        self.check(result, FileError::NotFound)?;
        Ok(FileStat {
            is_dir: raw.isdir != 0,
            size: raw.size,
            year: raw.m_year,
            month: raw.m_month,
            day: raw.m_day,
            hour: raw.m_hour,
            minute: raw.m_minute,
            second: raw.m_second,
        })
    }

    fn mkdir(&self, path: &str) -> Result<(), FileError> {
        let mut path = self::path(path)?;
        let result = invoke!(self.table, mkdir(path.as_ptr()));
        self.check(result, FileError::Failed).map(drop)
    }

    fn unlink(&self, path: &str, recursive: bool) -> Result<(), FileError> {
        let mut path = self::path(path)?;
        let result = invoke!(self.table, unlink(path.as_ptr(), flag(recursive)));
        self.check(result, FileError::Failed).map(drop)
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), FileError> {
        let (mut from, mut to) = (path(from)?, path(to)?);
        let result = invoke!(self.table, rename(from.as_ptr(), to.as_ptr()));
        self.check(result, FileError::Failed).map(drop)
    }

    fn open(&self, path: &str, mode: FileOptions) -> Result<File, FileError> {
        if mode.0 == 0 {
            return Err(FileError::BadMode);
        }
        let mut path = self::path(path)?;
        let file = invoke!(self.table, open(path.as_ptr(), mode.0)).ok_or(FileError::Missing)?;
        File::from_ptr(file).ok_or_else(|| {
            if let Some(reason) = self.last_error() {
                log::debug!("open: {}", reason);
            }
            FileError::NotFound
        })
    }

    fn close(&self, file: File) -> Result<(), FileError> {
        let result = invoke!(self.table, close(file.as_ptr()));
        self.check(result, FileError::Failed).map(drop)
    }

    fn read(&self, file: File, buf: &mut [u8]) -> Result<usize, FileError> {
        let len = c_uint::try_from(buf.len()).map_err(|_| FileError::TooLarge)?;
        let result = invoke!(self.table, read(file.as_ptr(), buf.as_mut_ptr().cast(), len));
        self.check(result, FileError::Failed).map(|n| n as usize)
    }

    fn write(&self, file: File, buf: &[u8]) -> Result<usize, FileError> {
        let len = c_uint::try_from(buf.len()).map_err(|_| FileError::TooLarge)?;
        let result = invoke!(self.table, write(file.as_ptr(), buf.as_ptr().cast(), len));
        self.check(result, FileError::Failed).map(|n| n as usize)
    }

    fn flush(&self, file: File) -> Result<(), FileError> {
        let result = invoke!(self.table, flush(file.as_ptr()));
        self.check(result, FileError::Failed).map(drop)
    }

    fn tell(&self, file: File) -> Result<u32, FileError> {
        let result = invoke!(self.table, tell(file.as_ptr()));
        self.check(result, FileError::Failed).map(|pos| pos as u32)
    }

    fn seek(&self, file: File, offset: i32, whence: Whence) -> Result<(), FileError> {
        let result = invoke!(self.table, seek(file.as_ptr(), offset, whence.raw()));
        self.check(result, FileError::Failed).map(drop)
    }

    fn last_error(&self) -> Option<&str> {
        let reason = invoke!(self.table, geterr())?;
        // SAFETY: the firmware keeps the message until the next failing call.
        unsafe { borrow_str(reason) }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::ffi::CStr;
    use std::boxed::Box;
    use std::string::{String, ToString};
    use std::vec::Vec;

    const MISSING: &[u8] = b"file not found\0";

    unsafe extern "C" fn geterr() -> *const c_char {
        MISSING.as_ptr().cast()
    }

    unsafe extern "C" fn listfiles(
        path: *const c_char,
        callback: Option<sys::ListFilesCallback>,
        userdata: *mut c_void,
        showhidden: c_int,
    ) -> c_int {
        if unsafe { CStr::from_ptr(path) }.to_bytes() != b"levels" {
            return -1;
        }
        let callback = callback.unwrap();
        for name in [&b"one.json\0"[..], b"two.json\0", b".hidden\0"] {
            if name[0] == b'.' && showhidden == 0 {
                continue;
            }
            unsafe { callback(name.as_ptr().cast(), userdata) };
        }
        0
    }

    unsafe extern "C" fn stat(_path: *const c_char, stat: *mut sys::FileStat) -> c_int {
        unsafe {
            (*stat).size = 42;
            (*stat).m_year = 2024;
        }
        0
    }

    unsafe extern "C" fn open(_name: *const c_char, _mode: sys::FileOptions) -> *mut sys::SDFile {
        core::ptr::null_mut()
    }

    fn files() -> DeviceFile {
        // SAFETY: every field is an optional function pointer; zero is None.
        let mut table: playdate_file = unsafe { core::mem::zeroed() };
        table.geterr = Some(geterr);
        table.listfiles = Some(listfiles);
        table.stat = Some(stat);
        table.open = Some(open);
        DeviceFile::new(Box::leak(Box::new(table)))
    }

    #[test]
    fn test_list_files() {
        let files = files();
        let mut names: Vec<String> = Vec::new();
        files
            .list_files("levels", false, &mut |name| names.push(name.to_string()))
            .unwrap();
        assert_eq!(names, ["one.json", "two.json"]);

        names.clear();
        files
            .list_files("levels", true, &mut |name| names.push(name.to_string()))
            .unwrap();
        assert_eq!(names.len(), 3);

        assert_eq!(
            files.list_files("nope", false, &mut |_| {}),
            Err(FileError::NotFound)
        );
    }

    #[test]
    fn test_stat() {
        let stat = files().stat("save.json").unwrap();
        assert_eq!(stat.size, 42);
        assert_eq!(stat.year, 2024);
        assert!(!stat.is_dir);
    }

    #[test]
    fn test_open_errors() {
        let files = files();
        assert_eq!(files.open("x", FileOptions::READ), Err(FileError::NotFound));
        assert_eq!(files.open("x", FileOptions::default()), Err(FileError::BadMode));
        assert_eq!(files.open("x\0y", FileOptions::READ), Err(FileError::InvalidPath));
        assert_eq!(files.last_error(), Some("file not found"));
        assert_eq!(files.mkdir("x"), Err(FileError::Missing));
    }
}
