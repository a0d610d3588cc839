//! Clock, input, menu and console state.

use std::cell::{Cell, RefCell};

use playdate_core::handle::MenuItem;
use playdate_core::system::{
    Acceleration, ButtonState, Buttons, DateTime, EpochTime, Language, MenuCallback, MenuError,
    Peripherals, System,
};

/// The firmware menu holds at most this many custom items.
pub const MAX_MENU_ITEMS: usize = 3;

/// Options accepted by one options item.
pub const MAX_MENU_OPTIONS: usize = 16;

/// Days from 1970-01-01 to 2000-01-01, the firmware epoch.
const EPOCH_DAYS: i64 = 10_957;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuKind {
    Plain,
    Checkmark,
    Options(Vec<String>),
}

#[derive(Clone, Debug)]
pub struct MenuEntry {
    pub item: MenuItem,
    pub title: String,
    pub kind: MenuKind,
    pub value: i32,
    callback: MenuCallback,
}

/// Host [`System`]. Everything the device would sense is set by the test.
pub struct SimSystem {
    console: RefCell<Vec<String>>,
    errors: RefCell<Vec<String>>,
    language: Cell<Language>,
    now_ms: Cell<u32>,
    epoch: Cell<u32>,
    elapsed_start: Cell<u32>,
    fps: Cell<Option<(i32, i32)>>,
    buttons: Cell<ButtonState>,
    peripherals: Cell<Peripherals>,
    acceleration: Cell<Acceleration>,
    crank_angle: Cell<f32>,
    crank_change: Cell<f32>,
    crank_docked: Cell<bool>,
    crank_sounds_disabled: Cell<bool>,
    flipped: Cell<bool>,
    auto_lock_disabled: Cell<bool>,
    reduce_flashing: Cell<bool>,
    battery: Cell<(f32, f32)>,
    timezone_offset: Cell<i32>,
    use_24_hour: Cell<bool>,
    menu: RefCell<Vec<MenuEntry>>,
    next_menu_id: Cell<usize>,
}

impl Default for SimSystem {
    fn default() -> Self {
        Self {
            console: RefCell::new(Vec::new()),
            errors: RefCell::new(Vec::new()),
            language: Cell::new(Language::English),
            now_ms: Cell::new(0),
            epoch: Cell::new(0),
            elapsed_start: Cell::new(0),
            fps: Cell::new(None),
            buttons: Cell::new(ButtonState::default()),
            peripherals: Cell::new(Peripherals::NONE),
            acceleration: Cell::new(Acceleration::default()),
            crank_angle: Cell::new(0.0),
            crank_change: Cell::new(0.0),
            crank_docked: Cell::new(true),
            crank_sounds_disabled: Cell::new(false),
            flipped: Cell::new(false),
            auto_lock_disabled: Cell::new(false),
            reduce_flashing: Cell::new(false),
            battery: Cell::new((100.0, 4.2)),
            timezone_offset: Cell::new(0),
            use_24_hour: Cell::new(true),
            menu: RefCell::new(Vec::new()),
            next_menu_id: Cell::new(1),
        }
    }
}

impl SimSystem {
    /// Advance both clocks by `ms`.
    pub fn advance(&self, ms: u32) {
        let before = self.now_ms.get();
        let after = before.wrapping_add(ms);
        self.now_ms.set(after);
        // Whole seconds crossed since the last advance
        let seconds = (after / 1000).wrapping_sub(before / 1000);
        self.epoch.set(self.epoch.get().wrapping_add(seconds));
    }

    pub fn set_epoch(&self, seconds: u32) {
        self.epoch.set(seconds);
    }

    /// Set the held buttons. Pushed and released are derived from the
    /// previous call.
    pub fn set_buttons(&self, current: Buttons) {
        let previous = self.buttons.get().current;
        self.buttons.set(ButtonState {
            current,
            pushed: current & !previous,
            released: previous & !current,
        });
    }

    /// Turn the crank to `angle` degrees, undocking it.
    pub fn set_crank(&self, angle: f32) {
        let mut change = angle - self.crank_angle.get();
        if change > 180.0 {
            change -= 360.0;
        } else if change < -180.0 {
            change += 360.0;
        }
        self.crank_change.set(change);
        self.crank_angle.set(angle);
        self.crank_docked.set(false);
    }

    pub fn set_crank_docked(&self, docked: bool) {
        self.crank_docked.set(docked);
    }

    pub fn set_acceleration(&self, acceleration: Acceleration) {
        self.acceleration.set(acceleration);
    }

    pub fn set_language(&self, language: Language) {
        self.language.set(language);
    }

    pub fn set_flipped(&self, flipped: bool) {
        self.flipped.set(flipped);
    }

    pub fn set_battery(&self, percentage: f32, voltage: f32) {
        self.battery.set((percentage, voltage));
    }

    pub fn console(&self) -> Vec<String> {
        self.console.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }

    pub fn fps_position(&self) -> Option<(i32, i32)> {
        self.fps.get()
    }

    pub fn peripherals(&self) -> Peripherals {
        self.peripherals.get()
    }

    pub fn auto_lock_disabled(&self) -> bool {
        self.auto_lock_disabled.get()
    }

    pub fn crank_sounds_disabled(&self) -> bool {
        self.crank_sounds_disabled.get()
    }

    pub fn menu(&self) -> Vec<MenuEntry> {
        self.menu.borrow().clone()
    }

    /// Select `item` the way the system menu would: checkmarks toggle,
    /// options advance, then the callback runs.
    pub fn select_menu_item(&self, item: MenuItem) -> bool {
        let callback = {
            let mut menu = self.menu.borrow_mut();
            let Some(entry) = menu.iter_mut().find(|e| e.item == item) else {
                return false;
            };
            match &entry.kind {
                MenuKind::Plain => {}
                MenuKind::Checkmark => entry.value = i32::from(entry.value == 0),
                MenuKind::Options(options) => {
                    entry.value = (entry.value + 1) % options.len().max(1) as i32;
                }
            }
            entry.callback
        };
        // Borrow released so the callback may touch the menu
        callback();
        true
    }

    fn add_entry(
        &self,
        title: &str,
        kind: MenuKind,
        value: i32,
        callback: MenuCallback,
    ) -> Result<MenuItem, MenuError> {
        if title.contains('\0') {
            return Err(MenuError::InvalidText);
        }
        let mut menu = self.menu.borrow_mut();
        if menu.len() == MAX_MENU_ITEMS {
            return Err(MenuError::Rejected);
        }

        let id = self.next_menu_id.get();
        self.next_menu_id.set(id + 1);
        let item = MenuItem::from_raw(id).ok_or(MenuError::Rejected)?;
        menu.push(MenuEntry {
            item,
            title: title.to_string(),
            kind,
            value,
            callback,
        });
        log::debug!("menu item {id} added: {title}");
        Ok(item)
    }
}

impl System for SimSystem {
    fn log_to_console(&self, message: &str) {
        self.console.borrow_mut().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }

    fn language(&self) -> Language {
        self.language.get()
    }

    fn current_time_ms(&self) -> u32 {
        self.now_ms.get()
    }

    fn seconds_since_epoch(&self) -> EpochTime {
        EpochTime {
            seconds: self.epoch.get(),
            milliseconds: self.now_ms.get() % 1000,
        }
    }

    fn draw_fps(&self, x: i32, y: i32) {
        self.fps.set(Some((x, y)));
    }

    fn button_state(&self) -> ButtonState {
        self.buttons.get()
    }

    fn set_peripherals_enabled(&self, mask: Peripherals) {
        self.peripherals.set(mask);
    }

    fn accelerometer(&self) -> Acceleration {
        if self.peripherals.get().0 & Peripherals::ACCELEROMETER.0 == 0 {
            return Acceleration::default();
        }
        self.acceleration.get()
    }

    fn crank_change(&self) -> f32 {
        self.crank_change.replace(0.0)
    }

    fn crank_angle(&self) -> f32 {
        self.crank_angle.get()
    }

    fn is_crank_docked(&self) -> bool {
        self.crank_docked.get()
    }

    fn set_crank_sounds_disabled(&self, disabled: bool) -> bool {
        self.crank_sounds_disabled.replace(disabled)
    }

    fn is_flipped(&self) -> bool {
        self.flipped.get()
    }

    fn set_auto_lock_disabled(&self, disabled: bool) {
        self.auto_lock_disabled.set(disabled);
    }

    fn add_menu_item(&self, title: &str, callback: MenuCallback) -> Result<MenuItem, MenuError> {
        self.add_entry(title, MenuKind::Plain, 0, callback)
    }

    fn add_checkmark_menu_item(
        &self,
        title: &str,
        checked: bool,
        callback: MenuCallback,
    ) -> Result<MenuItem, MenuError> {
        self.add_entry(title, MenuKind::Checkmark, i32::from(checked), callback)
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
        if options.iter().any(|o| o.contains('\0')) {
            return Err(MenuError::InvalidText);
        }
        let options = options.iter().map(|o| o.to_string()).collect();
        self.add_entry(title, MenuKind::Options(options), 0, callback)
    }

    fn remove_menu_item(&self, item: MenuItem) {
        self.menu.borrow_mut().retain(|e| e.item != item);
    }

    fn remove_all_menu_items(&self) {
        self.menu.borrow_mut().clear();
    }

    fn menu_item_value(&self, item: MenuItem) -> i32 {
        self.menu
            .borrow()
            .iter()
            .find(|e| e.item == item)
            .map_or(0, |e| e.value)
    }

    fn set_menu_item_value(&self, item: MenuItem, value: i32) {
        if let Some(entry) = self.menu.borrow_mut().iter_mut().find(|e| e.item == item) {
            entry.value = value;
        }
    }

    fn set_menu_item_title(&self, item: MenuItem, title: &str) -> Result<(), MenuError> {
        if title.contains('\0') {
            return Err(MenuError::InvalidText);
        }
        let mut menu = self.menu.borrow_mut();
        let entry = menu.iter_mut().find(|e| e.item == item).ok_or(MenuError::Rejected)?;
        entry.title = title.to_string();
        Ok(())
    }

    fn reduce_flashing(&self) -> bool {
        self.reduce_flashing.get()
    }

    fn elapsed_time(&self) -> f32 {
        self.now_ms.get().wrapping_sub(self.elapsed_start.get()) as f32 / 1000.0
    }

    fn reset_elapsed_time(&self) {
        self.elapsed_start.set(self.now_ms.get());
    }

    fn battery_percentage(&self) -> f32 {
        self.battery.get().0
    }

    fn battery_voltage(&self) -> f32 {
        self.battery.get().1
    }

    fn timezone_offset(&self) -> i32 {
        self.timezone_offset.get()
    }

    fn should_display_24_hour_time(&self) -> bool {
        self.use_24_hour.get()
    }

    fn convert_epoch_to_date_time(&self, epoch: u32) -> DateTime {
        let days = i64::from(epoch / 86_400) + EPOCH_DAYS;
        let secs = epoch % 86_400;
        let (year, month, day) = civil_from_days(days);
        DateTime {
            year: year as u16,
            month: month as u8,
            day: day as u8,
            // 1970-01-01 was a Thursday
            weekday: ((days + 3).rem_euclid(7) + 1) as u8,
            hour: (secs / 3600) as u8,
            minute: (secs / 60 % 60) as u8,
            second: (secs % 60) as u8,
        }
    }

    fn convert_date_time_to_epoch(&self, date_time: &DateTime) -> u32 {
        let days = days_from_civil(
            i64::from(date_time.year),
            u32::from(date_time.month),
            u32::from(date_time.day),
        ) - EPOCH_DAYS;
        let secs = days * 86_400
            + i64::from(date_time.hour) * 3600
            + i64::from(date_time.minute) * 60
            + i64::from(date_time.second);
        secs.clamp(0, i64::from(u32::MAX)) as u32
    }
}

/// Days since 1970-01-01 of a proleptic Gregorian date.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let yoe = year - era * 400;
    let mp = i64::from((month + 9) % 12);
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static SELECTED: AtomicU32 = AtomicU32::new(0);

    fn on_select() {
        SELECTED.fetch_add(1, Ordering::Relaxed);
    }

    fn noop() {}

    #[test]
    fn test_button_edges() {
        let sys = SimSystem::default();
        sys.set_buttons(Buttons::A | Buttons::LEFT);
        sys.set_buttons(Buttons::A | Buttons::UP);

        let state = sys.button_state();
        assert_eq!(state.current, Buttons::A | Buttons::UP);
        assert_eq!(state.pushed, Buttons::UP);
        assert_eq!(state.released, Buttons::LEFT);
    }

    #[test]
    fn test_crank_change_wraps_and_resets() {
        let sys = SimSystem::default();
        sys.set_crank(350.0);
        sys.set_crank(10.0);
        assert!(!sys.is_crank_docked());
        assert_eq!(sys.crank_change(), 20.0);
        assert_eq!(sys.crank_change(), 0.0);
        assert_eq!(sys.crank_angle(), 10.0);
    }

    #[test]
    fn test_accelerometer_needs_peripheral() {
        let sys = SimSystem::default();
        let reading = Acceleration { x: 0.0, y: 1.0, z: 0.0 };
        sys.set_acceleration(reading);
        assert_eq!(sys.accelerometer(), Acceleration::default());

        sys.set_peripherals_enabled(Peripherals::ACCELEROMETER);
        assert_eq!(sys.accelerometer(), reading);
    }

    #[test]
    fn test_clock() {
        let sys = SimSystem::default();
        sys.set_epoch(100);
        sys.advance(1500);
        assert_eq!(sys.current_time_ms(), 1500);
        assert_eq!(
            sys.seconds_since_epoch(),
            EpochTime {
                seconds: 101,
                milliseconds: 500
            }
        );

        sys.reset_elapsed_time();
        sys.advance(250);
        assert_eq!(sys.elapsed_time(), 0.25);
    }

    #[test]
    fn test_menu_limits() {
        let sys = SimSystem::default();
        sys.add_menu_item("one", noop).unwrap();
        sys.add_checkmark_menu_item("two", true, noop).unwrap();
        sys.add_options_menu_item("three", &["a", "b"], noop).unwrap();
        assert_eq!(sys.add_menu_item("four", noop), Err(MenuError::Rejected));
        assert_eq!(sys.add_menu_item("bad\0", noop), Err(MenuError::InvalidText));

        sys.remove_all_menu_items();
        let options = ["x"; MAX_MENU_OPTIONS + 1];
        assert_eq!(
            sys.add_options_menu_item("many", &options, noop),
            Err(MenuError::TooManyOptions)
        );
    }

    #[test]
    fn test_menu_selection() {
        let sys = SimSystem::default();
        let check = sys.add_checkmark_menu_item("sound", false, on_select).unwrap();
        let opts = sys.add_options_menu_item("speed", &["slow", "fast"], on_select).unwrap();

        let before = SELECTED.load(Ordering::Relaxed);
        assert!(sys.select_menu_item(check));
        assert_eq!(sys.menu_item_value(check), 1);

        assert!(sys.select_menu_item(opts));
        assert!(sys.select_menu_item(opts));
        assert_eq!(sys.menu_item_value(opts), 0);
        assert_eq!(SELECTED.load(Ordering::Relaxed) - before, 3);

        sys.set_menu_item_title(check, "music").unwrap();
        sys.remove_menu_item(opts);
        let menu = sys.menu();
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].title, "music");
        assert!(!sys.select_menu_item(opts));
    }

    #[test]
    fn test_date_conversion() {
        let sys = SimSystem::default();

        let start = sys.convert_epoch_to_date_time(0);
        assert_eq!(
            start,
            DateTime {
                year: 2000,
                month: 1,
                day: 1,
                weekday: 6,
                hour: 0,
                minute: 0,
                second: 0,
            }
        );

        // 2000 is a leap year
        let next_year = sys.convert_epoch_to_date_time(366 * 86_400 + 3_723);
        assert_eq!((next_year.year, next_year.month, next_year.day), (2001, 1, 1));
        assert_eq!(next_year.weekday, 1);
        assert_eq!((next_year.hour, next_year.minute, next_year.second), (1, 2, 3));

        let leap_day = DateTime {
            year: 2024,
            month: 2,
            day: 29,
            weekday: 4,
            hour: 12,
            minute: 0,
            second: 0,
        };
        let epoch = sys.convert_date_time_to_epoch(&leap_day);
        assert_eq!(sys.convert_epoch_to_date_time(epoch), leap_day);
    }

    #[test]
    fn test_console_capture() {
        let sys = SimSystem::default();
        sys.log_to_console("hello");
        sys.error("boom");
        assert_eq!(sys.console(), ["hello"]);
        assert_eq!(sys.errors(), ["boom"]);
    }
}
