//! Raw C ABI of the Playdate firmware.
//!
//! Every table is a `#[repr(C)]` struct of optional function pointers, laid
//! out in firmware order. Enums are plain integer aliases with constants so
//! an unexpected value from the firmware is never undefined behaviour.
//!
//! Nothing here is safe to call; the `playdate` crate wraps it.

#![no_std]
#![allow(non_camel_case_types, non_snake_case, non_upper_case_globals)]

use core::ffi::{c_int, c_void};

macro_rules! opaque {
    ($($name:ident),* $(,)?) => {
        $(
            #[repr(C)]
            pub struct $name {
                _private: [u8; 0],
            }
        )*
    };
}

pub mod display;
pub mod file;
pub mod graphics;
pub mod json;
pub mod lua;
pub mod scoreboards;
pub mod sound;
pub mod sprite;
pub mod system;

pub use display::*;
pub use file::*;
pub use graphics::*;
pub use json::*;
pub use lua::*;
pub use scoreboards::*;
pub use sound::*;
pub use sprite::*;
pub use system::*;

/// Root of the API, passed to `eventHandler`.
#[repr(C)]
pub struct PlaydateAPI {
    pub system: *const playdate_sys,
    pub file: *const playdate_file,
    pub graphics: *const playdate_graphics,
    pub sprite: *const playdate_sprite,
    pub display: *const playdate_display,
    pub sound: *const playdate_sound,
    pub lua: *const playdate_lua,
    pub json: *const playdate_json,
    pub scoreboards: *const playdate_scoreboards,
}

pub type PDSystemEvent = u32;
pub const kEventInit: PDSystemEvent = 0;
pub const kEventInitLua: PDSystemEvent = 1;
pub const kEventLock: PDSystemEvent = 2;
pub const kEventUnlock: PDSystemEvent = 3;
pub const kEventPause: PDSystemEvent = 4;
pub const kEventResume: PDSystemEvent = 5;
pub const kEventTerminate: PDSystemEvent = 6;
pub const kEventKeyPressed: PDSystemEvent = 7;
pub const kEventKeyReleased: PDSystemEvent = 8;
pub const kEventLowPower: PDSystemEvent = 9;

/// Signature of the exported `eventHandler` symbol.
pub type PDEventHandler =
    unsafe extern "C" fn(playdate: *mut PlaydateAPI, event: PDSystemEvent, arg: u32) -> c_int;

/// Update callback. Return non-zero if the display should be refreshed.
pub type PDCallbackFunction = unsafe extern "C" fn(userdata: *mut c_void) -> c_int;

/// Integer rectangle with exclusive `right` and `bottom`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LCDRect {
    pub left: c_int,
    pub right: c_int,
    pub top: c_int,
    pub bottom: c_int,
}

/// Float rectangle used by sprites.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PDRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

opaque!(
    LCDBitmap,
    LCDBitmapTable,
    LCDFont,
    LCDFontData,
    LCDFontPage,
    LCDFontGlyph,
    LCDVideoPlayer,
    LCDSprite,
    PDMenuItem,
    SDFile,
    SoundChannel,
    SoundSource,
    SoundEffect,
    PDSynthSignalValue,
    LuaUDObject,
    lua_State,
);

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::{align_of, size_of};

    #[test]
    fn test_root_table_layout() {
        assert_eq!(size_of::<PlaydateAPI>(), 9 * size_of::<usize>());
        assert_eq!(align_of::<PlaydateAPI>(), align_of::<usize>());
    }

    #[test]
    fn test_rect_layouts() {
        assert_eq!(size_of::<LCDRect>(), 16);
        assert_eq!(size_of::<PDRect>(), 16);
    }
}
