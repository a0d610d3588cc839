//! The firmware API as one [`Playdate`] value.

use core::sync::atomic::{AtomicPtr, Ordering};

use playdate_core::platform::Playdate;
use ::playdate_sys as sys;
use sys::{playdate_sys, PlaydateAPI};

use crate::display::DeviceDisplay;
use crate::file::DeviceFile;
use crate::graphics::{DeviceGraphics, DeviceVideo};
use crate::json::DeviceJson;
use crate::lua::DeviceLua;
use crate::scoreboards::DeviceScoreboards;
use crate::sound::DeviceSound;
use crate::sprite::DeviceSprites;
use crate::system::DeviceSystem;

/// System table for code that runs without an [`Api`] at hand: the
/// logger, the allocator, the panic handler and firmware callbacks.
static SYSTEM: AtomicPtr<playdate_sys> = AtomicPtr::new(core::ptr::null_mut());

pub(crate) fn system_table() -> Option<&'static playdate_sys> {
    let ptr = SYSTEM.load(Ordering::Acquire);
    // SAFETY: only ever set from a table the firmware keeps alive for the
    // whole run.
    unsafe { ptr.as_ref() }
}

pub(crate) fn install_system_table(system: &'static playdate_sys) {
    SYSTEM.store(core::ptr::from_ref(system).cast_mut(), Ordering::Release);
}

/// Every firmware table, wrapped.
#[derive(Clone, Copy)]
pub struct Api {
    system: DeviceSystem,
    file: DeviceFile,
    graphics: DeviceGraphics,
    video: DeviceVideo,
    sprite: DeviceSprites,
    display: DeviceDisplay,
    sound: DeviceSound,
    lua: DeviceLua,
    json: DeviceJson,
    scoreboards: DeviceScoreboards,
}

impl Api {
    /// Wrap the pointer passed to `eventHandler`.
    ///
    /// Returns `None` if the root or any table pointer is null.
    ///
    /// # Safety
    ///
    /// `pd` must be null or point to a `PlaydateAPI` whose tables stay valid
    /// and unchanged for the rest of the program.
    pub unsafe fn from_raw(pd: *const PlaydateAPI) -> Option<Self> {
        // SAFETY: per the caller.
        let pd = unsafe { pd.as_ref() }?;
        // SAFETY: the firmware's tables are static.
        let (system, file, graphics, sprite, display, sound, lua, json, scoreboards) = unsafe {
            (
                pd.system.as_ref()?,
                pd.file.as_ref()?,
                pd.graphics.as_ref()?,
                pd.sprite.as_ref()?,
                pd.display.as_ref()?,
                pd.sound.as_ref()?,
                pd.lua.as_ref()?,
                pd.json.as_ref()?,
                pd.scoreboards.as_ref()?,
            )
        };
        // SAFETY: as above.
        let (video, channel, effect) = unsafe {
            (
                graphics.video.as_ref()?,
                sound.channel.as_ref()?,
                sound.effect.as_ref()?,
            )
        };
        Some(Self {
            system: DeviceSystem::new(system),
            file: DeviceFile::new(file),
            graphics: DeviceGraphics::new(graphics),
            video: DeviceVideo::new(video),
            sprite: DeviceSprites::new(sprite, system),
            display: DeviceDisplay::new(display),
            sound: DeviceSound::new(sound, channel, effect),
            lua: DeviceLua::new(lua),
            json: DeviceJson::new(json),
            scoreboards: DeviceScoreboards::new(scoreboards),
        })
    }

    pub(crate) fn raw_system(&self) -> &'static playdate_sys {
        self.system.table()
    }

    /// Make the system table available to the logger, allocator and
    /// callbacks.
    pub fn install(&self) {
        install_system_table(self.system.table());
    }
}

impl Playdate for Api {
    type System = DeviceSystem;
    type File = DeviceFile;
    type Graphics = DeviceGraphics;
    type Video = DeviceVideo;
    type Sprite = DeviceSprites;
    type Display = DeviceDisplay;
    type Sound = DeviceSound;
    type Lua = DeviceLua;
    type Json = DeviceJson;
    type Scoreboards = DeviceScoreboards;

    fn system(&self) -> &DeviceSystem {
        &self.system
    }

    fn file(&self) -> &DeviceFile {
        &self.file
    }

    fn graphics(&self) -> &DeviceGraphics {
        &self.graphics
    }

    fn video(&self) -> &DeviceVideo {
        &self.video
    }

    fn sprite(&self) -> &DeviceSprites {
        &self.sprite
    }

    fn display(&self) -> &DeviceDisplay {
        &self.display
    }

    fn sound(&self) -> &DeviceSound {
        &self.sound
    }

    fn lua(&self) -> &DeviceLua {
        &self.lua
    }

    fn json(&self) -> &DeviceJson {
        &self.json
    }

    fn scoreboards(&self) -> &DeviceScoreboards {
        &self.scoreboards
    }
}
