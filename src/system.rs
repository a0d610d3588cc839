use core::ffi::{c_char, c_int, c_void};

use playdate_core::handle::MenuItem;
use playdate_core::system::{
    Acceleration, ButtonState, Buttons, DateTime, EpochTime, Language, MenuCallback, MenuError,
    Peripherals, System,
};
use ::playdate_sys as sys;
use sys::{playdate_sys, PDDateTime};

use crate::ffi::{flag, invoke, CStrBuf, Name, RawHandle};
use crate::logger::{emit, LINE_CAPACITY};

/// Options accepted by one options menu item.
pub const MAX_MENU_OPTIONS: usize = 16;

type OptionTitle = CStrBuf<64>;

unsafe extern "C" fn menu_trampoline(userdata: *mut c_void) {
    if userdata.is_null() {
        return;
    }
    // SAFETY: userdata was made from a `MenuCallback` in `add_*_menu_item`.
    let callback = unsafe { core::mem::transmute::<*mut c_void, MenuCallback>(userdata) };
    callback();
}

fn menu_userdata(callback: MenuCallback) -> *mut c_void {
    callback as *mut c_void
}

fn to_date_time(raw: PDDateTime) -> DateTime {
    DateTime {
        year: raw.year,
        month: raw.month,
        day: raw.day,
        weekday: raw.weekday,
        hour: raw.hour,
        minute: raw.minute,
        second: raw.second,
    }
}

fn from_date_time(dt: &DateTime) -> PDDateTime {
    PDDateTime {
        year: dt.year,
        month: dt.month,
        day: dt.day,
        weekday: dt.weekday,
        hour: dt.hour,
        minute: dt.minute,
        second: dt.second,
    }
}

/// [`System`] over `playdate_sys`.
#[derive(Clone, Copy)]
pub struct DeviceSystem {
    table: &'static playdate_sys,
}

impl DeviceSystem {
    pub(crate) fn new(table: &'static playdate_sys) -> Self {
        Self { table }
    }

    pub(crate) fn table(&self) -> &'static playdate_sys {
        self.table
    }

    fn print(&self, message: &str, error: bool) {
        use core::fmt::Write;
        let mut line = CStrBuf::<LINE_CAPACITY>::default();
        let _ = line.write_str(message);
        emit(self.table, &mut line, error);
    }

    fn added(item: *mut sys::PDMenuItem) -> Result<MenuItem, MenuError> {
        MenuItem::from_ptr(item).ok_or(MenuError::Rejected)
    }
}

impl System for DeviceSystem {
    fn log_to_console(&self, message: &str) {
        self.print(message, false);
    }

    fn error(&self, message: &str) {
        self.print(message, true);
    }

    fn language(&self) -> Language {
        invoke!(self.table, getLanguage())
            .map_or(Language::Unknown, Language::from_raw)
    }

    fn current_time_ms(&self) -> u32 {
        invoke!(self.table, getCurrentTimeMilliseconds()).unwrap_or_default()
    }

    fn seconds_since_epoch(&self) -> EpochTime {
        let mut milliseconds = 0;
        let seconds = invoke!(self.table, getSecondsSinceEpoch(&mut milliseconds));
        EpochTime {
            seconds: seconds.unwrap_or_default(),
            milliseconds,
        }
    }

    fn draw_fps(&self, x: i32, y: i32) {
        invoke!(self.table, drawFPS(x, y));
    }

    fn button_state(&self) -> ButtonState {
        let (mut current, mut pushed, mut released) = (0, 0, 0);
        invoke!(self.table, getButtonState(&mut current, &mut pushed, &mut released));
        ButtonState {
            current: Buttons(current as u8),
            pushed: Buttons(pushed as u8),
            released: Buttons(released as u8),
        }
    }

    fn set_peripherals_enabled(&self, mask: Peripherals) {
        invoke!(self.table, setPeripheralsEnabled(u32::from(mask.0)));
    }

    fn accelerometer(&self) -> Acceleration {
        let mut a = Acceleration::default();
        invoke!(self.table, getAccelerometer(&mut a.x, &mut a.y, &mut a.z));
        a
    }

    fn crank_change(&self) -> f32 {
        invoke!(self.table, getCrankChange()).unwrap_or_default()
    }

    fn crank_angle(&self) -> f32 {
        invoke!(self.table, getCrankAngle()).unwrap_or_default()
    }

    fn is_crank_docked(&self) -> bool {
        invoke!(self.table, isCrankDocked()).is_some_and(|docked| docked != 0)
    }

    fn set_crank_sounds_disabled(&self, disabled: bool) -> bool {
        invoke!(self.table, setCrankSoundsDisabled(flag(disabled))).is_some_and(|prev| prev != 0)
    }

    fn is_flipped(&self) -> bool {
        invoke!(self.table, getFlipped()).is_some_and(|flipped| flipped != 0)
    }

    fn set_auto_lock_disabled(&self, disabled: bool) {
        invoke!(self.table, setAutoLockDisabled(flag(disabled)));
    }

    fn add_menu_item(&self, title: &str, callback: MenuCallback) -> Result<MenuItem, MenuError> {
        let mut title = Name::new(title).ok_or(MenuError::InvalidText)?;
        let item = invoke!(
            self.table,
            addMenuItem(title.as_ptr(), Some(menu_trampoline), menu_userdata(callback))
        )
        .ok_or(MenuError::Missing)?;
        Self::added(item)
    }

    fn add_checkmark_menu_item(
        &self,
        title: &str,
        checked: bool,
        callback: MenuCallback,
    ) -> Result<MenuItem, MenuError> {
        let mut title = Name::new(title).ok_or(MenuError::InvalidText)?;
        let item = invoke!(
            self.table,
            addCheckmarkMenuItem(
                title.as_ptr(),
                flag(checked),
                Some(menu_trampoline),
                menu_userdata(callback),
            )
        )
        .ok_or(MenuError::Missing)?;
        Self::added(item)
    }

    fn add_options_menu_item(
        &self,
        title: &str,
        options: &[&str],
        callback: MenuCallback,
    ) -> Result<MenuItem, MenuError> {
        if options.len() > MAX_MENU_OPTIONS {
            return Err(MenuError::TooManyOptions);
        }
        let mut title = Name::new(title).ok_or(MenuError::InvalidText)?;
        let mut names: heapless::Vec<OptionTitle, MAX_MENU_OPTIONS> = heapless::Vec::new();
        for option in options {
            let name = OptionTitle::new(option).ok_or(MenuError::InvalidText)?;
            names.push(name).map_err(|_| MenuError::TooManyOptions)?;
        }
        let mut ptrs: heapless::Vec<*const c_char, MAX_MENU_OPTIONS> = heapless::Vec::new();
        for name in names.iter_mut() {
            let _ = ptrs.push(name.as_ptr());
        }
        let item = invoke!(
            self.table,
            addOptionsMenuItem(
                title.as_ptr(),
                ptrs.as_ptr(),
                ptrs.len() as c_int,
                Some(menu_trampoline),
                menu_userdata(callback),
            )
        )
        .ok_or(MenuError::Missing)?;
        Self::added(item)
    }

    fn remove_menu_item(&self, item: MenuItem) {
        invoke!(self.table, removeMenuItem(item.as_ptr()));
    }

    fn remove_all_menu_items(&self) {
        invoke!(self.table, removeAllMenuItems());
    }

    fn menu_item_value(&self, item: MenuItem) -> i32 {
        invoke!(self.table, getMenuItemValue(item.as_ptr())).unwrap_or_default()
    }

    fn set_menu_item_value(&self, item: MenuItem, value: i32) {
        invoke!(self.table, setMenuItemValue(item.as_ptr(), value));
    }

    fn set_menu_item_title(&self, item: MenuItem, title: &str) -> Result<(), MenuError> {
        let mut title = Name::new(title).ok_or(MenuError::InvalidText)?;
        invoke!(self.table, setMenuItemTitle(item.as_ptr(), title.as_ptr()))
            .ok_or(MenuError::Missing)
    }

    fn reduce_flashing(&self) -> bool {
        invoke!(self.table, getReduceFlashing()).is_some_and(|v| v != 0)
    }

    fn elapsed_time(&self) -> f32 {
        invoke!(self.table, getElapsedTime()).unwrap_or_default()
    }

    fn reset_elapsed_time(&self) {
        invoke!(self.table, resetElapsedTime());
    }

    fn battery_percentage(&self) -> f32 {
        invoke!(self.table, getBatteryPercentage()).unwrap_or_default()
    }

    fn battery_voltage(&self) -> f32 {
        invoke!(self.table, getBatteryVoltage()).unwrap_or_default()
    }

    fn timezone_offset(&self) -> i32 {
        invoke!(self.table, getTimezoneOffset()).unwrap_or_default()
    }

    fn should_display_24_hour_time(&self) -> bool {
        invoke!(self.table, shouldDisplay24HourTime()).is_some_and(|v| v != 0)
    }

    fn convert_epoch_to_date_time(&self, epoch: u32) -> DateTime {
        let mut raw = PDDateTime::default();
        invoke!(self.table, convertEpochToDateTime(epoch, &mut raw));
        to_date_time(raw)
    }

    fn convert_date_time_to_epoch(&self, date_time: &DateTime) -> u32 {
        let mut raw = from_date_time(date_time);
        invoke!(self.table, convertDateTimeToEpoch(&mut raw)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::{Cell, RefCell};
    use core::ffi::CStr;
    use std::boxed::Box;
    use std::string::{String, ToString};
    use std::vec::Vec;

    std::thread_local! {
        static MENU: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
        static SELECTED: Cell<usize> = const { Cell::new(0) };
    }

    unsafe extern "C" fn get_button_state(current: *mut u32, pushed: *mut u32, released: *mut u32) {
        unsafe {
            *current = sys::kButtonA | sys::kButtonUp;
            *pushed = sys::kButtonA;
            *released = 0;
        }
    }

    unsafe extern "C" fn add_options_menu_item(
        title: *const c_char,
        options: *const *const c_char,
        count: c_int,
        callback: Option<sys::PDMenuItemCallbackFunction>,
        userdata: *mut c_void,
    ) -> *mut sys::PDMenuItem {
        let mut names = Vec::new();
        names.push(unsafe { CStr::from_ptr(title) }.to_str().unwrap().to_string());
        for i in 0..count as usize {
            let option = unsafe { CStr::from_ptr(*options.add(i)) };
            names.push(option.to_str().unwrap().to_string());
        }
        MENU.with(|m| *m.borrow_mut() = names);
        // Simulate the user picking the item
        unsafe { callback.unwrap()(userdata) };
        0x40 as *mut sys::PDMenuItem
    }

    fn on_select() {
        SELECTED.with(|s| s.set(s.get() + 1));
    }

    fn system() -> DeviceSystem {
        // SAFETY: every field is an optional function pointer; zero is None.
        let mut table: playdate_sys = unsafe { core::mem::zeroed() };
        table.getButtonState = Some(get_button_state);
        table.addOptionsMenuItem = Some(add_options_menu_item);
        DeviceSystem::new(Box::leak(Box::new(table)))
    }

    #[test]
    fn test_button_state() {
        let state = system().button_state();
        assert_eq!(state.current, Buttons::A | Buttons::UP);
        assert_eq!(state.pushed, Buttons::A);
        assert!(state.released.is_empty());
    }

    #[test]
    fn test_options_menu_item() {
        let system = system();
        let item = system
            .add_options_menu_item("difficulty", &["easy", "hard"], on_select)
            .unwrap();
        assert_eq!(item.raw(), 0x40);
        MENU.with(|m| assert_eq!(*m.borrow(), ["difficulty", "easy", "hard"]));
        SELECTED.with(|s| assert_eq!(s.get(), 1));

        assert_eq!(
            system.add_options_menu_item("x", &["a\0"], on_select),
            Err(MenuError::InvalidText)
        );
        let many = ["o"; MAX_MENU_OPTIONS + 1];
        assert_eq!(
            system.add_options_menu_item("x", &many, on_select),
            Err(MenuError::TooManyOptions)
        );
    }

    #[test]
    fn test_missing_entries_default() {
        let system = system();
        assert_eq!(system.crank_angle(), 0.0);
        assert!(!system.is_crank_docked());
        assert_eq!(system.language(), Language::Unknown);
        assert_eq!(system.add_menu_item("pause", on_select), Err(MenuError::Missing));
        // Console output without an entry point is dropped silently
        system.log_to_console("lost");
    }
}
