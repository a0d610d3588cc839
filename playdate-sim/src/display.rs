use std::cell::Cell;

use playdate_core::display::Display;

pub const SCREEN_WIDTH: i32 = 400;
pub const SCREEN_HEIGHT: i32 = 240;

/// Host [`Display`]. Settings are only recorded.
pub struct SimDisplay {
    refresh_rate: Cell<f32>,
    inverted: Cell<bool>,
    scale: Cell<u32>,
    mosaic: Cell<(u32, u32)>,
    flipped: Cell<(bool, bool)>,
    offset: Cell<(i32, i32)>,
}

impl Default for SimDisplay {
    fn default() -> Self {
        Self {
            refresh_rate: Cell::new(30.0),
            inverted: Cell::new(false),
            scale: Cell::new(1),
            mosaic: Cell::new((0, 0)),
            flipped: Cell::new((false, false)),
            offset: Cell::new((0, 0)),
        }
    }
}

impl SimDisplay {
    pub fn refresh_rate(&self) -> f32 {
        self.refresh_rate.get()
    }

    pub fn inverted(&self) -> bool {
        self.inverted.get()
    }

    pub fn scale(&self) -> u32 {
        self.scale.get()
    }

    pub fn mosaic(&self) -> (u32, u32) {
        self.mosaic.get()
    }

    pub fn flipped(&self) -> (bool, bool) {
        self.flipped.get()
    }

    pub fn offset(&self) -> (i32, i32) {
        self.offset.get()
    }
}

impl Display for SimDisplay {
    fn width(&self) -> i32 {
        SCREEN_WIDTH / self.scale.get() as i32
    }

    fn height(&self) -> i32 {
        SCREEN_HEIGHT / self.scale.get() as i32
    }

    fn set_refresh_rate(&self, rate: f32) {
        self.refresh_rate.set(rate.max(0.0));
    }

    fn set_inverted(&self, inverted: bool) {
        self.inverted.set(inverted);
    }

    fn set_scale(&self, scale: u32) {
        match scale {
            1 | 2 | 4 | 8 => self.scale.set(scale),
            _ => log::warn!("ignoring display scale {}", scale),
        }
    }

    fn set_mosaic(&self, x: u32, y: u32) {
        self.mosaic.set((x.min(3), y.min(3)));
    }

    fn set_flipped(&self, x: bool, y: bool) {
        self.flipped.set((x, y));
    }

    fn set_offset(&self, dx: i32, dy: i32) {
        self.offset.set((dx, dy));
    }
}
