//! `playdate_sys`: console, clock, input, menu and power.

use core::ffi::{c_char, c_int, c_uint, c_void};

use crate::{LCDBitmap, PDCallbackFunction, PDMenuItem};

pub type PDButtons = u32;
pub const kButtonLeft: PDButtons = 1 << 0;
pub const kButtonRight: PDButtons = 1 << 1;
pub const kButtonUp: PDButtons = 1 << 2;
pub const kButtonDown: PDButtons = 1 << 3;
pub const kButtonB: PDButtons = 1 << 4;
pub const kButtonA: PDButtons = 1 << 5;

pub type PDLanguage = u32;
pub const kPDLanguageEnglish: PDLanguage = 0;
pub const kPDLanguageJapanese: PDLanguage = 1;
pub const kPDLanguageUnknown: PDLanguage = 2;

pub type PDPeripherals = u32;
pub const kNone: PDPeripherals = 0;
pub const kAccelerometer: PDPeripherals = 1 << 0;
pub const kAllPeripherals: PDPeripherals = 0xffff;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PDDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

pub type PDMenuItemCallbackFunction = unsafe extern "C" fn(userdata: *mut c_void);

#[repr(C)]
pub struct playdate_sys {
    pub realloc: Option<unsafe extern "C" fn(ptr: *mut c_void, size: usize) -> *mut c_void>,
    pub formatString:
        Option<unsafe extern "C" fn(ret: *mut *mut c_char, fmt: *const c_char, ...) -> c_int>,
    pub logToConsole: Option<unsafe extern "C" fn(fmt: *const c_char, ...)>,
    pub error: Option<unsafe extern "C" fn(fmt: *const c_char, ...)>,
    pub getLanguage: Option<unsafe extern "C" fn() -> PDLanguage>,
    pub getCurrentTimeMilliseconds: Option<unsafe extern "C" fn() -> c_uint>,
    pub getSecondsSinceEpoch: Option<unsafe extern "C" fn(milliseconds: *mut c_uint) -> c_uint>,
    pub drawFPS: Option<unsafe extern "C" fn(x: c_int, y: c_int)>,
    pub setUpdateCallback:
        Option<unsafe extern "C" fn(update: Option<PDCallbackFunction>, userdata: *mut c_void)>,
    pub getButtonState: Option<
        unsafe extern "C" fn(current: *mut PDButtons, pushed: *mut PDButtons, released: *mut PDButtons),
    >,
    pub setPeripheralsEnabled: Option<unsafe extern "C" fn(mask: PDPeripherals)>,
    pub getAccelerometer: Option<unsafe extern "C" fn(outx: *mut f32, outy: *mut f32, outz: *mut f32)>,
    pub getCrankChange: Option<unsafe extern "C" fn() -> f32>,
    pub getCrankAngle: Option<unsafe extern "C" fn() -> f32>,
    pub isCrankDocked: Option<unsafe extern "C" fn() -> c_int>,
    pub setCrankSoundsDisabled: Option<unsafe extern "C" fn(flag: c_int) -> c_int>,
    pub getFlipped: Option<unsafe extern "C" fn() -> c_int>,
    pub setAutoLockDisabled: Option<unsafe extern "C" fn(disable: c_int)>,
    pub setMenuImage: Option<unsafe extern "C" fn(bitmap: *mut LCDBitmap, x_offset: c_int)>,
    pub addMenuItem: Option<
        unsafe extern "C" fn(
            title: *const c_char,
            callback: Option<PDMenuItemCallbackFunction>,
            userdata: *mut c_void,
        ) -> *mut PDMenuItem,
    >,
    pub addCheckmarkMenuItem: Option<
        unsafe extern "C" fn(
            title: *const c_char,
            value: c_int,
            callback: Option<PDMenuItemCallbackFunction>,
            userdata: *mut c_void,
        ) -> *mut PDMenuItem,
    >,
    pub addOptionsMenuItem: Option<
        unsafe extern "C" fn(
            title: *const c_char,
            option_titles: *const *const c_char,
            options_count: c_int,
            callback: Option<PDMenuItemCallbackFunction>,
            userdata: *mut c_void,
        ) -> *mut PDMenuItem,
    >,
    pub removeAllMenuItems: Option<unsafe extern "C" fn()>,
    pub removeMenuItem: Option<unsafe extern "C" fn(item: *mut PDMenuItem)>,
    pub getMenuItemValue: Option<unsafe extern "C" fn(item: *mut PDMenuItem) -> c_int>,
    pub setMenuItemValue: Option<unsafe extern "C" fn(item: *mut PDMenuItem, value: c_int)>,
    pub getMenuItemTitle: Option<unsafe extern "C" fn(item: *mut PDMenuItem) -> *const c_char>,
    pub setMenuItemTitle: Option<unsafe extern "C" fn(item: *mut PDMenuItem, title: *const c_char)>,
    pub getMenuItemUserdata: Option<unsafe extern "C" fn(item: *mut PDMenuItem) -> *mut c_void>,
    pub setMenuItemUserdata: Option<unsafe extern "C" fn(item: *mut PDMenuItem, ud: *mut c_void)>,
    pub getReduceFlashing: Option<unsafe extern "C" fn() -> c_int>,
    pub getElapsedTime: Option<unsafe extern "C" fn() -> f32>,
    pub resetElapsedTime: Option<unsafe extern "C" fn()>,
    pub getBatteryPercentage: Option<unsafe extern "C" fn() -> f32>,
    pub getBatteryVoltage: Option<unsafe extern "C" fn() -> f32>,
    pub getTimezoneOffset: Option<unsafe extern "C" fn() -> i32>,
    pub shouldDisplay24HourTime: Option<unsafe extern "C" fn() -> c_int>,
    pub convertEpochToDateTime: Option<unsafe extern "C" fn(epoch: u32, datetime: *mut PDDateTime)>,
    pub convertDateTimeToEpoch: Option<unsafe extern "C" fn(datetime: *mut PDDateTime) -> u32>,
    pub clearICache: Option<unsafe extern "C" fn()>,
}
