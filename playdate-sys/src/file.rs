//! `playdate_file`: sandboxed file access.

use core::ffi::{c_char, c_int, c_uint, c_void};

use crate::SDFile;

pub type FileOptions = u32;
pub const kFileRead: FileOptions = 1 << 0;
pub const kFileReadData: FileOptions = 1 << 1;
pub const kFileWrite: FileOptions = 1 << 2;
pub const kFileAppend: FileOptions = 1 << 3;

pub const SEEK_SET: c_int = 0;
pub const SEEK_CUR: c_int = 1;
pub const SEEK_END: c_int = 2;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileStat {
    pub isdir: c_int,
    pub size: c_uint,
    pub m_year: c_int,
    pub m_month: c_int,
    pub m_day: c_int,
    pub m_hour: c_int,
    pub m_minute: c_int,
    pub m_second: c_int,
}

pub type ListFilesCallback = unsafe extern "C" fn(path: *const c_char, userdata: *mut c_void);

#[repr(C)]
pub struct playdate_file {
    pub geterr: Option<unsafe extern "C" fn() -> *const c_char>,
    pub listfiles: Option<
        unsafe extern "C" fn(
            path: *const c_char,
            callback: Option<ListFilesCallback>,
            userdata: *mut c_void,
            showhidden: c_int,
        ) -> c_int,
    >,
    pub stat: Option<unsafe extern "C" fn(path: *const c_char, stat: *mut FileStat) -> c_int>,
    pub mkdir: Option<unsafe extern "C" fn(path: *const c_char) -> c_int>,
    pub unlink: Option<unsafe extern "C" fn(name: *const c_char, recursive: c_int) -> c_int>,
    pub rename: Option<unsafe extern "C" fn(from: *const c_char, to: *const c_char) -> c_int>,
    pub open: Option<unsafe extern "C" fn(name: *const c_char, mode: FileOptions) -> *mut SDFile>,
    pub close: Option<unsafe extern "C" fn(file: *mut SDFile) -> c_int>,
    pub read: Option<unsafe extern "C" fn(file: *mut SDFile, buf: *mut c_void, len: c_uint) -> c_int>,
    pub write:
        Option<unsafe extern "C" fn(file: *mut SDFile, buf: *const c_void, len: c_uint) -> c_int>,
    pub flush: Option<unsafe extern "C" fn(file: *mut SDFile) -> c_int>,
    pub tell: Option<unsafe extern "C" fn(file: *mut SDFile) -> c_int>,
    pub seek: Option<unsafe extern "C" fn(file: *mut SDFile, pos: c_int, whence: c_int) -> c_int>,
}
