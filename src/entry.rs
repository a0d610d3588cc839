//! The exported `eventHandler` and the per-frame update callback.
//!
//! [`playdate_game!`](crate::playdate_game) defines both for a [`Game`]; the
//! game itself lives in a [`HostCell`] static next to them.

use core::ffi::{c_int, c_void};
use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use log::LevelFilter;
use playdate_core::event::SystemEvent;
use playdate_core::runner::{Game, Runner};
use static_cell::StaticCell;
use ::playdate_sys as sys;
use sys::PlaydateAPI;

use crate::api::Api;
use crate::ffi::invoke;
use crate::logger;

/// What the entry point keeps between calls.
pub struct Host<G: Game> {
    api: Api,
    runner: Runner<G>,
}

impl<G: Game> Host<G> {
    pub fn runner(&self) -> &Runner<G> {
        &self.runner
    }
}

/// Static storage for the [`Host`], filled on the first `Init`.
///
/// The host is only reached through [`HostCell::with_host`] and the entry
/// points, one borrow at a time. A nested borrow gets `None`.
pub struct HostCell<G: Game + 'static> {
    cell: StaticCell<Host<G>>,
    host: AtomicPtr<Host<G>>,
    borrowed: AtomicBool,
}

impl<G: Game + 'static> HostCell<G> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: StaticCell::new(),
            host: AtomicPtr::new(ptr::null_mut()),
            borrowed: AtomicBool::new(false),
        }
    }

    fn lend<R>(&self, f: impl FnOnce(&mut Host<G>) -> R) -> Option<R> {
        if self.borrowed.swap(true, Ordering::Acquire) {
            log::warn!("host re-entered");
            return None;
        }
        // SAFETY: the pointer comes from a `StaticCell` and the flag above
        // keeps this the only live reference.
        let out = unsafe { self.host.load(Ordering::Acquire).as_mut() }.map(f);
        self.borrowed.store(false, Ordering::Release);
        out
    }

    fn init(&'static self, api: Api) -> bool {
        if !self.host.load(Ordering::Acquire).is_null() {
            return true;
        }
        let Some(host) = self.cell.try_init(Host {
            api,
            runner: Runner::new(),
        }) else {
            return false;
        };
        self.host.store(ptr::from_mut(host), Ordering::Release);
        true
    }

    fn userdata(&'static self) -> *mut c_void {
        ptr::from_ref(self).cast_mut().cast()
    }

    /// Run `f` on the host. `None` before `Init`, or when called from
    /// inside the game's own callbacks.
    pub fn with_host<R>(&self, f: impl FnOnce(&Host<G>) -> R) -> Option<R> {
        self.lend(|host| f(host))
    }
}

impl<G: Game + 'static> Default for HostCell<G> {
    fn default() -> Self {
        Self::new()
    }
}

unsafe extern "C" fn update_trampoline<G: Game + 'static>(userdata: *mut c_void) -> c_int {
    // SAFETY: `userdata` is the static cell registered in `dispatch`.
    let Some(cell) = (unsafe { userdata.cast::<HostCell<G>>().as_ref() }) else {
        return 0;
    };
    // A stopped runner has nothing to draw.
    cell.lend(|host| host.runner.update(&host.api).map_or(0, c_int::from))
        .unwrap_or(0)
}

/// Body of the exported `eventHandler`.
///
/// On `Init` this wraps the tables, installs the console logger, starts
/// the game and registers the update callback. Other events are forwarded
/// to the running game. Returns non-zero only if the tables are unusable.
///
/// # Safety
///
/// `pd` must be the pointer the firmware passed to `eventHandler`, and this
/// must only be called from the firmware's thread.
pub unsafe fn dispatch<G: Game + 'static>(
    cell: &'static HostCell<G>,
    pd: *mut PlaydateAPI,
    event: u32,
    arg: u32,
) -> c_int {
    let Some(event) = SystemEvent::from_raw(event, arg) else {
        log::debug!("ignoring unknown system event {}", event);
        return 0;
    };

    if event == SystemEvent::Init {
        // SAFETY: per the caller.
        let Some(api) = (unsafe { Api::from_raw(pd) }) else {
            return 1;
        };
        api.install();
        if logger::init(LevelFilter::Info).is_err() {
            log::debug!("logger already installed");
        }
        if !cell.init(api) {
            return 1;
        }
        let system = api.raw_system();
        let userdata = cell.userdata();
        if invoke!(system, setUpdateCallback(Some(update_trampoline::<G>), userdata)).is_none() {
            return 1;
        }
        let started = cell.lend(|host| host.runner.handle_event(&host.api, event));
        if let Some(Err(e)) = started {
            log::error!("game init failed: {:?}", e);
        }
        return 0;
    }

    match cell.lend(|host| host.runner.handle_event(&host.api, event)) {
        None => log::warn!("{:?} before init", event),
        Some(Err(e)) => log::debug!("{:?} not delivered: {:?}", event, e),
        Some(Ok(())) => {}
    }
    0
}

/// Export `eventHandler` for a [`Game`].
///
/// ```ignore
/// struct Hello;
///
/// impl playdate::playdate_core::Game for Hello {
///     /* ... */
/// }
///
/// playdate::playdate_game!(Hello);
/// ```
#[macro_export]
macro_rules! playdate_game {
    ($game:ty) => {
        static PLAYDATE_HOST: $crate::entry::HostCell<$game> = $crate::entry::HostCell::new();

        #[no_mangle]
        pub unsafe extern "C" fn eventHandler(
            pd: *mut $crate::sys::PlaydateAPI,
            event: $crate::sys::PDSystemEvent,
            arg: u32,
        ) -> ::core::ffi::c_int {
            // SAFETY: called by the firmware with its own API pointer.
            unsafe { $crate::entry::dispatch(&PLAYDATE_HOST, pd, event, arg) }
        }
    };
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use playdate_core::platform::Playdate;
    use playdate_core::system::System;
    use std::boxed::Box;
    use sys::{
        playdate_display, playdate_file, playdate_graphics, playdate_json, playdate_lua,
        playdate_scoreboards, playdate_sound, playdate_sound_channel, playdate_sound_effect,
        playdate_sprite, playdate_sys, playdate_video, PDCallbackFunction,
    };

    unsafe extern "C" fn set_update_callback(
        _update: Option<PDCallbackFunction>,
        _userdata: *mut c_void,
    ) {
    }

    unsafe extern "C" fn get_elapsed_time() -> f32 {
        1.5
    }

    fn leak<T>() -> *const T {
        // SAFETY: firmware tables are optional function pointers and raw
        // pointers; all-zero is a table with every entry missing.
        Box::leak(Box::new(unsafe { core::mem::zeroed::<T>() }))
    }

    fn fake_api(system: playdate_sys) -> *mut PlaydateAPI {
        // SAFETY: as in `leak`.
        let mut graphics: playdate_graphics = unsafe { core::mem::zeroed() };
        graphics.video = leak::<playdate_video>();
        let mut sound: playdate_sound = unsafe { core::mem::zeroed() };
        sound.channel = leak::<playdate_sound_channel>();
        sound.effect = leak::<playdate_sound_effect>();
        Box::leak(Box::new(PlaydateAPI {
            system: Box::leak(Box::new(system)),
            file: leak::<playdate_file>(),
            graphics: Box::leak(Box::new(graphics)),
            sprite: leak::<playdate_sprite>(),
            display: leak::<playdate_display>(),
            sound: Box::leak(Box::new(sound)),
            lua: leak::<playdate_lua>(),
            json: leak::<playdate_json>(),
            scoreboards: leak::<playdate_scoreboards>(),
        }))
    }

    fn console() -> playdate_sys {
        // SAFETY: as in `leak`.
        let mut system: playdate_sys = unsafe { core::mem::zeroed() };
        system.setUpdateCallback = Some(set_update_callback);
        system.getElapsedTime = Some(get_elapsed_time);
        system
    }

    struct Clock {
        frames: u32,
        events: u32,
        started_at: f32,
    }

    impl Game for Clock {
        type Error = ();

        fn init<P: Playdate>(pd: &P) -> Result<Self, ()> {
            Ok(Self {
                frames: 0,
                events: 0,
                started_at: pd.system().elapsed_time(),
            })
        }

        fn update<P: Playdate>(&mut self, _pd: &P) -> bool {
            self.frames += 1;
            self.frames % 2 == 1
        }

        fn event<P: Playdate>(&mut self, _pd: &P, _event: SystemEvent) {
            self.events += 1;
        }
    }

    fn update(cell: &'static HostCell<Clock>) -> c_int {
        unsafe { update_trampoline::<Clock>(cell.userdata()) }
    }

    #[test]
    fn test_init_then_update() {
        static HOST: HostCell<Clock> = HostCell::new();
        let pd = fake_api(console());

        assert_eq!(unsafe { dispatch(&HOST, pd, sys::kEventInit, 0) }, 0);
        assert_eq!(update(&HOST), 1);
        assert_eq!(update(&HOST), 0);

        let (frames, game_frames, started_at) = HOST
            .with_host(|host| {
                let game = host.runner().game().expect("running");
                (host.runner().frames(), game.frames, game.started_at)
            })
            .expect("host");
        assert_eq!((frames, game_frames), (2, 2));
        assert_eq!(started_at, 1.5);
    }

    #[test]
    fn test_events_after_init() {
        static HOST: HostCell<Clock> = HostCell::new();
        let pd = fake_api(console());

        // Nothing to deliver to yet.
        assert_eq!(unsafe { dispatch(&HOST, pd, sys::kEventPause, 0) }, 0);
        assert!(HOST.with_host(|_| ()).is_none());

        unsafe { dispatch(&HOST, pd, sys::kEventInit, 0) };
        unsafe { dispatch(&HOST, pd, sys::kEventKeyPressed, 65) };
        unsafe { dispatch(&HOST, pd, 42, 0) };
        unsafe { dispatch(&HOST, pd, sys::kEventTerminate, 0) };

        let (terminated, game) = HOST
            .with_host(|host| (host.runner().is_terminated(), host.runner().game().is_some()))
            .expect("host");
        assert!(terminated);
        assert!(!game);
        assert_eq!(update(&HOST), 0);
    }

    #[test]
    fn test_events_reach_game() {
        static HOST: HostCell<Clock> = HostCell::new();
        let pd = fake_api(console());

        unsafe { dispatch(&HOST, pd, sys::kEventInit, 0) };
        unsafe { dispatch(&HOST, pd, sys::kEventLock, 0) };
        unsafe { dispatch(&HOST, pd, sys::kEventUnlock, 0) };
        let events = HOST.with_host(|host| host.runner().game().map(|g| g.events));
        assert_eq!(events, Some(Some(2)));
    }

    #[test]
    fn test_nested_borrow_is_refused() {
        static HOST: HostCell<Clock> = HostCell::new();
        let pd = fake_api(console());

        unsafe { dispatch(&HOST, pd, sys::kEventInit, 0) };
        let inner = HOST.with_host(|_| HOST.with_host(|_| ()));
        assert_eq!(inner, Some(None));
        // The update callback is refused while the host is lent out.
        assert_eq!(HOST.with_host(|_| update(&HOST)), Some(0));
        assert_eq!(HOST.with_host(|host| host.runner().frames()), Some(0));
    }

    #[test]
    fn test_unusable_tables() {
        static NULL_HOST: HostCell<Clock> = HostCell::new();
        assert_eq!(unsafe { dispatch(&NULL_HOST, ptr::null_mut(), sys::kEventInit, 0) }, 1);
        assert!(NULL_HOST.with_host(|_| ()).is_none());

        // Without `setUpdateCallback` the game would never run.
        static BARE_HOST: HostCell<Clock> = HostCell::new();
        // SAFETY: as in `leak`.
        let pd = fake_api(unsafe { core::mem::zeroed() });
        assert_eq!(unsafe { dispatch(&BARE_HOST, pd, sys::kEventInit, 0) }, 1);
        assert_eq!(BARE_HOST.with_host(|host| host.runner().is_running()), Some(false));
    }
}
