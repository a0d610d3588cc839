//! Compile-time configuration applied when a game starts.
//!
//! Customize by declaring your own const and returning it from
//! [`Game::CONFIG`](crate::runner::Game::CONFIG).

use crate::display::Display;
use crate::platform::Playdate;
use crate::system::{Peripherals, System};

/// Screen settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayConfig {
    /// Frames per second; 0 means as fast as possible.
    pub refresh_rate: f32,
    /// Pixel scale: 1, 2, 4 or 8.
    pub scale: u32,
    pub inverted: bool,
    /// Mirror along the X and Y axes.
    pub flipped: (bool, bool),
    /// Mosaic effect, each axis 0..=3.
    pub mosaic: (u32, u32),
    pub offset: (i32, i32),
}

impl DisplayConfig {
    pub fn apply<D: Display + ?Sized>(&self, display: &D) {
        display.set_refresh_rate(self.refresh_rate);
        display.set_scale(self.scale);
        display.set_inverted(self.inverted);
        display.set_flipped(self.flipped.0, self.flipped.1);
        display.set_mosaic(self.mosaic.0, self.mosaic.1);
        display.set_offset(self.offset.0, self.offset.1);
    }
}

/// Firmware defaults: 30 fps, unscaled, not inverted.
pub const DEFAULT_DISPLAY: DisplayConfig = DisplayConfig {
    refresh_rate: 30.0,
    scale: 1,
    inverted: false,
    flipped: (false, false),
    mosaic: (0, 0),
    offset: (0, 0),
};

/// Everything [`Runner`](crate::runner::Runner) sets up before calling
/// [`Game::init`](crate::runner::Game::init).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerConfig {
    /// Hardware to power up. The accelerometer costs battery.
    pub peripherals: Peripherals,
    /// Draw the frame rate at this position after every update.
    pub fps_overlay: Option<(i32, i32)>,
    pub auto_lock_disabled: bool,
    pub crank_sounds_disabled: bool,
    pub display: DisplayConfig,
}

impl RunnerConfig {
    pub fn apply<P: Playdate + ?Sized>(&self, pd: &P) {
        let system = pd.system();
        system.set_peripherals_enabled(self.peripherals);
        system.set_auto_lock_disabled(self.auto_lock_disabled);
        system.set_crank_sounds_disabled(self.crank_sounds_disabled);
        self.display.apply(pd.display());
    }
}

pub const DEFAULT_RUNNER_CONFIG: RunnerConfig = RunnerConfig {
    peripherals: Peripherals::NONE,
    fps_overlay: None,
    auto_lock_disabled: false,
    crank_sounds_disabled: false,
    display: DEFAULT_DISPLAY,
};
