use ::playdate_sys as sys;
use playdate_core::display::Display;
use sys::playdate_display;

use crate::ffi::{flag, invoke};

/// [`Display`] over `playdate_display`.
#[derive(Clone, Copy)]
pub struct DeviceDisplay {
    table: &'static playdate_display,
}

impl DeviceDisplay {
    pub(crate) fn new(table: &'static playdate_display) -> Self {
        Self { table }
    }
}

impl Display for DeviceDisplay {
    fn width(&self) -> i32 {
        invoke!(self.table, getWidth()).unwrap_or_default()
    }

    fn height(&self) -> i32 {
        invoke!(self.table, getHeight()).unwrap_or_default()
    }

    fn set_refresh_rate(&self, rate: f32) {
        invoke!(self.table, setRefreshRate(rate));
    }

    fn set_inverted(&self, inverted: bool) {
        invoke!(self.table, setInverted(flag(inverted)));
    }

    fn set_scale(&self, scale: u32) {
        invoke!(self.table, setScale(scale));
    }

    fn set_mosaic(&self, x: u32, y: u32) {
        invoke!(self.table, setMosaic(x, y));
    }

    fn set_flipped(&self, x: bool, y: bool) {
        invoke!(self.table, setFlipped(flag(x), flag(y)));
    }

    fn set_offset(&self, dx: i32, dy: i32) {
        invoke!(self.table, setOffset(dx, dy));
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::Cell;
    use core::ffi::{c_int, c_uint};
    use std::boxed::Box;

    std::thread_local! {
        static SCALE: Cell<c_uint> = const { Cell::new(1) };
        static FLIPPED: Cell<(c_int, c_int)> = const { Cell::new((0, 0)) };
    }

    unsafe extern "C" fn get_width() -> c_int {
        400 / SCALE.with(Cell::get) as c_int
    }

    unsafe extern "C" fn set_scale(s: c_uint) {
        SCALE.with(|scale| scale.set(s));
    }

    unsafe extern "C" fn set_flipped(x: c_int, y: c_int) {
        FLIPPED.with(|f| f.set((x, y)));
    }

    fn display() -> DeviceDisplay {
        // SAFETY: every field is an optional function pointer; zero is None.
        let mut table: playdate_display = unsafe { core::mem::zeroed() };
        table.getWidth = Some(get_width);
        table.setScale = Some(set_scale);
        table.setFlipped = Some(set_flipped);
        DeviceDisplay::new(Box::leak(Box::new(table)))
    }

    #[test]
    fn test_forwards_to_table() {
        let display = display();
        assert_eq!(display.width(), 400);
        display.set_scale(4);
        assert_eq!(display.width(), 100);
        display.set_flipped(true, false);
        FLIPPED.with(|f| assert_eq!(f.get(), (1, 0)));
    }

    #[test]
    fn test_missing_entries() {
        let display = display();
        assert_eq!(display.height(), 0);
        display.set_inverted(true);
    }
}
