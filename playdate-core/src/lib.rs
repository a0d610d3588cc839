//! Platform-agnostic Playdate types and API traits.
//!
//! This crate describes the handheld's C API without touching it: value
//! types, opaque handles and one trait per firmware function table. The
//! `playdate` crate implements the traits over the real tables, and
//! `playdate-sim` implements them on the host for tests.
//!
//! # Overview
//!
//! - [`geometry`]: [`Rect`] and [`make_rect`], sprite rects and points
//! - [`value`]: the tagged JSON [`Value`] and its coercions
//! - [`handle`]: opaque handles such as [`Bitmap`] and [`Sprite`]
//! - [`system`], [`file`], [`graphics`], [`sprite`], [`display`],
//!   [`sound`], [`lua`], [`json`], [`scoreboards`]: one trait per table
//! - [`platform`]: [`Playdate`], all tables together
//! - [`runner`]: [`Game`] and the [`Runner`] that drives it
//!
//! # Example
//!
//! ```rust
//! use playdate_core::{Rect, Value};
//!
//! let r = Rect::new(0, 0, 10, 10).translate(5, 5);
//! assert_eq!((r.left, r.right), (5, 15));
//!
//! let v = Value::String("17dogs");
//! assert_eq!(v.int_value(), 17);
//! assert_eq!(v.float_value(), 0.0);
//! assert!(v.bool_value());
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and never allocates.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod display;
pub mod event;
pub mod file;
pub mod geometry;
pub mod graphics;
pub mod handle;
pub mod json;
pub mod lua;
pub mod platform;
pub mod runner;
pub mod scoreboards;
pub mod sound;
pub mod sprite;
pub mod system;
pub mod value;

// Re-export main types at crate root
pub use config::{DisplayConfig, RunnerConfig, DEFAULT_DISPLAY, DEFAULT_RUNNER_CONFIG};
pub use display::Display;
pub use event::SystemEvent;
pub use file::{FileError, FileOptions, FileStat, FileSystem, Whence};
pub use geometry::{make_rect, PdRect, Point, Rect, Vector};
pub use graphics::{
    BitmapFlip, BitmapInfo, Color, DrawMode, Graphics, GraphicsError, LineCapStyle, Pattern,
    PolygonFillRule, SolidColor, Video, VideoInfo, LCD_COLUMNS, LCD_ROWS, LCD_ROWSIZE,
};
pub use handle::{
    Bitmap, BitmapTable, File, Font, ListRef, LuaObject, MenuItem, Opaque, SoundChannel,
    SoundEffect, SoundSource, Sprite, VideoPlayer,
};
pub use json::{DecodeError, DecodeErrorKind, DecodeHandler, Json};
pub use lua::{Lua, LuaError, LuaType};
pub use platform::Playdate;
pub use runner::{Game, Runner, RunnerError};
pub use scoreboards::{Board, BoardsList, ScoreboardError, Scoreboards, Score, ScoresList};
pub use sound::{
    AudioSource, EffectProcessor, HeadphoneState, MicSource, Recorder, Sample, Sound, SoundError,
};
pub use sprite::{CollisionInfo, CollisionResponseType, QueryInfo, SpriteError, SpriteHooks, Sprites};
pub use system::{
    Acceleration, ButtonState, Buttons, DateTime, EpochTime, Language, MenuCallback, MenuError,
    Peripherals, System,
};
pub use value::{Value, ValueType};
