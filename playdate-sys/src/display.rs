//! `playdate_display`.

use core::ffi::{c_int, c_uint};

#[repr(C)]
pub struct playdate_display {
    pub getWidth: Option<unsafe extern "C" fn() -> c_int>,
    pub getHeight: Option<unsafe extern "C" fn() -> c_int>,
    pub setRefreshRate: Option<unsafe extern "C" fn(rate: f32)>,
    pub setInverted: Option<unsafe extern "C" fn(flag: c_int)>,
    pub setScale: Option<unsafe extern "C" fn(s: c_uint)>,
    pub setMosaic: Option<unsafe extern "C" fn(x: c_uint, y: c_uint)>,
    pub setFlipped: Option<unsafe extern "C" fn(x: c_int, y: c_int)>,
    pub setOffset: Option<unsafe extern "C" fn(x: c_int, y: c_int)>,
}
