//! Host implementation of the Playdate tables.
//!
//! [`Sim`] implements [`Playdate`] with in-memory state so games written
//! against `playdate-core` can be tested with `cargo test`. Each table is a
//! public field with extra methods to script results and inspect calls:
//!
//! - [`SimSystem`]: clock, buttons, crank, accelerometer, menu, console
//! - [`SimFiles`]: a data directory held in a map
//! - [`SimGraphics`]: a log of draw calls and a raw frame buffer
//! - [`SimVideo`]: registered video metadata
//! - [`SimSprites`]: display list, scripted collisions and queries
//! - [`SimDisplay`]: recorded screen settings
//! - [`SimSound`]: channel routing, with sources pulled one at a time
//! - [`SimLua`]: direct calls into native functions
//! - [`SimJson`]: the `playdate-json` decoder
//! - [`SimScoreboards`]: a leaderboard server answering on demand
//!
//! # Example
//!
//! ```rust
//! use playdate_core::{Buttons, Playdate, System};
//! use playdate_sim::Sim;
//!
//! let pd = Sim::default();
//! pd.system.set_buttons(Buttons::A);
//! assert!(pd.system().button_state().current.contains(Buttons::A));
//! ```
//!
//! Callbacks handed to a table (menu items, sprite hooks, audio sources)
//! run synchronously from the driving method, never from another thread.

pub mod display;
pub mod file;
pub mod graphics;
pub mod json;
pub mod lua;
pub mod scoreboards;
pub mod sound;
pub mod sprite;
pub mod system;

pub use display::SimDisplay;
pub use file::SimFiles;
pub use graphics::{DrawCall, SimGraphics, SimVideo};
pub use json::SimJson;
pub use lua::{LuaSlot, NativeFn, SimLua};
pub use scoreboards::SimScoreboards;
pub use sound::SimSound;
pub use sprite::{CollisionRequest, SimSprites, SpriteQuery};
pub use system::{MenuEntry, MenuKind, SimSystem};

use playdate_core::platform::Playdate;

/// Every table backed by host state.
#[derive(Default)]
pub struct Sim {
    pub system: SimSystem,
    pub file: SimFiles,
    pub graphics: SimGraphics,
    pub video: SimVideo,
    pub sprite: SimSprites,
    pub display: SimDisplay,
    pub sound: SimSound,
    pub lua: SimLua,
    pub json: SimJson,
    pub scoreboards: SimScoreboards,
}

impl Playdate for Sim {
    type System = SimSystem;
    type File = SimFiles;
    type Graphics = SimGraphics;
    type Video = SimVideo;
    type Sprite = SimSprites;
    type Display = SimDisplay;
    type Sound = SimSound;
    type Lua = SimLua;
    type Json = SimJson;
    type Scoreboards = SimScoreboards;

    fn system(&self) -> &SimSystem {
        &self.system
    }

    fn file(&self) -> &SimFiles {
        &self.file
    }

    fn graphics(&self) -> &SimGraphics {
        &self.graphics
    }

    fn video(&self) -> &SimVideo {
        &self.video
    }

    fn sprite(&self) -> &SimSprites {
        &self.sprite
    }

    fn display(&self) -> &SimDisplay {
        &self.display
    }

    fn sound(&self) -> &SimSound {
        &self.sound
    }

    fn lua(&self) -> &SimLua {
        &self.lua
    }

    fn json(&self) -> &SimJson {
        &self.json
    }

    fn scoreboards(&self) -> &SimScoreboards {
        &self.scoreboards
    }
}
