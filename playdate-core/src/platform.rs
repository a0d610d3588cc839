//! The whole API as one value.

use crate::display::Display;
use crate::file::FileSystem;
use crate::graphics::{Graphics, Video};
use crate::json::Json;
use crate::lua::Lua;
use crate::scoreboards::Scoreboards;
use crate::sound::Sound;
use crate::sprite::Sprites;
use crate::system::System;

/// Access to every function table.
///
/// The device implementation wraps the firmware's `PlaydateAPI`; a host
/// implementation can back each table with plain state.
pub trait Playdate {
    type System: System;
    type File: FileSystem;
    type Graphics: Graphics;
    type Video: Video;
    type Sprite: Sprites;
    type Display: Display;
    type Sound: Sound;
    type Lua: Lua;
    type Json: Json;
    type Scoreboards: Scoreboards;

    fn system(&self) -> &Self::System;
    fn file(&self) -> &Self::File;
    fn graphics(&self) -> &Self::Graphics;
    fn video(&self) -> &Self::Video;
    fn sprite(&self) -> &Self::Sprite;
    fn display(&self) -> &Self::Display;
    fn sound(&self) -> &Self::Sound;
    fn lua(&self) -> &Self::Lua;
    fn json(&self) -> &Self::Json;
    fn scoreboards(&self) -> &Self::Scoreboards;
}
