//! System services: console, clock, input, menu, power and date/time.

use core::ops::{BitAnd, BitOr, BitOrAssign, Not};

use crate::handle::MenuItem;

/// Button state bitfield (`PDButtons`).
///
/// # Example
///
/// ```
/// use playdate_core::Buttons;
///
/// let buttons = Buttons::A | Buttons::UP;
/// assert!(buttons.contains(Buttons::A));
/// assert!(!buttons.contains(Buttons::B));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(pub u8);

impl Buttons {
    pub const LEFT: Self = Self(1 << 0);
    pub const RIGHT: Self = Self(1 << 1);
    pub const UP: Self = Self(1 << 2);
    pub const DOWN: Self = Self(1 << 3);
    pub const B: Self = Self(1 << 4);
    pub const A: Self = Self(1 << 5);

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Check if the given button(s) are set.
    #[inline]
    #[must_use]
    pub const fn contains(self, button: Buttons) -> bool {
        (self.0 & button.0) == button.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl BitOr for Buttons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Buttons {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl Not for Buttons {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

/// Snapshot returned by [`System::button_state`].
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonState {
    /// Held down now.
    pub current: Buttons,
    /// Went down since the last update.
    pub pushed: Buttons,
    /// Went up since the last update.
    pub released: Buttons,
}

/// System language (`PDLanguage`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Language {
    English,
    Japanese,
    Unknown,
}

impl Language {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::English,
            1 => Self::Japanese,
            _ => Self::Unknown,
        }
    }
}

/// Optional hardware to power up (`PDPeripherals`).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Peripherals(pub u16);

impl Peripherals {
    pub const NONE: Self = Self(0);
    pub const ACCELEROMETER: Self = Self(1 << 0);
    pub const ALL: Self = Self(0xffff);
}

/// Calendar time (`PDDateTime`).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub year: u16,
    /// 1-12
    pub month: u8,
    /// 1-31
    pub day: u8,
    /// 1 = Monday, 7 = Sunday
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Seconds since 2000-01-01 00:00 UTC plus the millisecond part.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EpochTime {
    pub seconds: u32,
    pub milliseconds: u32,
}

/// Accelerometer reading in g.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Acceleration {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Error type for menu operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuError {
    /// The firmware table lacks the entry point.
    Missing,
    /// Title or option contains a NUL byte or is too long.
    InvalidText,
    /// Too many options for one item.
    TooManyOptions,
    /// The firmware refused the item (the menu holds at most three).
    Rejected,
}

/// Called when a menu item is selected or its value changes.
pub type MenuCallback = fn();

/// The `System` table.
pub trait System {
    /// Write a line to the console.
    fn log_to_console(&self, message: &str);

    /// Report an error. On device this halts the game.
    fn error(&self, message: &str);

    fn language(&self) -> Language;

    /// Milliseconds since an arbitrary fixed point.
    fn current_time_ms(&self) -> u32;

    fn seconds_since_epoch(&self) -> EpochTime;

    /// Overlay the frame rate at the given screen position.
    fn draw_fps(&self, x: i32, y: i32);

    fn button_state(&self) -> ButtonState;

    fn set_peripherals_enabled(&self, mask: Peripherals);

    fn accelerometer(&self) -> Acceleration;

    /// Degrees the crank moved since the last call.
    fn crank_change(&self) -> f32;

    /// Absolute crank angle in degrees.
    fn crank_angle(&self) -> f32;

    fn is_crank_docked(&self) -> bool;

    /// Returns the previous setting.
    fn set_crank_sounds_disabled(&self, disabled: bool) -> bool;

    fn is_flipped(&self) -> bool;

    fn set_auto_lock_disabled(&self, disabled: bool);

    fn add_menu_item(&self, title: &str, callback: MenuCallback) -> Result<MenuItem, MenuError>;

    fn add_checkmark_menu_item(
        &self,
        title: &str,
        checked: bool,
        callback: MenuCallback,
    ) -> Result<MenuItem, MenuError>;

    fn add_options_menu_item(
        &self,
        title: &str,
        options: &[&str],
        callback: MenuCallback,
    ) -> Result<MenuItem, MenuError>;

    fn remove_menu_item(&self, item: MenuItem);

    fn remove_all_menu_items(&self);

    /// Checkmark state (0/1) or selected option index.
    fn menu_item_value(&self, item: MenuItem) -> i32;

    fn set_menu_item_value(&self, item: MenuItem, value: i32);

    fn set_menu_item_title(&self, item: MenuItem, title: &str) -> Result<(), MenuError>;

    /// The user's "reduce flashing" accessibility setting.
    fn reduce_flashing(&self) -> bool;

    /// Seconds since the last [`reset_elapsed_time`](Self::reset_elapsed_time).
    fn elapsed_time(&self) -> f32;

    fn reset_elapsed_time(&self);

    fn battery_percentage(&self) -> f32;

    fn battery_voltage(&self) -> f32;

    /// Offset from UTC in seconds.
    fn timezone_offset(&self) -> i32;

    fn should_display_24_hour_time(&self) -> bool;

    fn convert_epoch_to_date_time(&self, epoch: u32) -> DateTime;

    fn convert_date_time_to_epoch(&self, date_time: &DateTime) -> u32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buttons_bitwise() {
        let buttons = Buttons::LEFT | Buttons::B;
        assert!(buttons.contains(Buttons::LEFT));
        assert!(buttons.contains(Buttons::B));
        assert!(!buttons.contains(Buttons::A));
        assert_eq!((buttons & !Buttons::LEFT), Buttons::B);
        assert_eq!(buttons.raw(), 0b01_0001);
    }

    #[test]
    fn test_language_from_raw() {
        assert_eq!(Language::from_raw(0), Language::English);
        assert_eq!(Language::from_raw(1), Language::Japanese);
        assert_eq!(Language::from_raw(2), Language::Unknown);
        assert_eq!(Language::from_raw(77), Language::Unknown);
    }
}
