//! Playdate firmware bindings for games written in Rust.
//!
//! [`Api`] implements the [`playdate_core`] table traits over the real
//! firmware tables, and [`playdate_game!`] exports the `eventHandler` that
//! drives a [`Game`](playdate_core::Game) through them. Games written
//! against the traits run unchanged on `playdate-sim` in host tests.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`allocator`**: Global allocator over the firmware's `realloc`
//! - **`panic-handler`**: Report panics through `system->error`
//! - **`defmt`**: Enable defmt formatting
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default. Nothing in it allocates; the
//! `allocator` feature is there for games that want `alloc`.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

mod ffi;

#[cfg(feature = "allocator")]
pub mod alloc;
pub mod api;
pub mod display;
pub mod entry;
pub mod file;
pub mod graphics;
pub mod json;
pub mod logger;
pub mod lua;
#[cfg(feature = "panic-handler")]
pub mod panic;
pub mod scoreboards;
pub mod sound;
pub mod sprite;
pub mod system;

pub use ::playdate_sys as sys;
pub use playdate_core;

pub use api::Api;
pub use display::DeviceDisplay;
pub use ffi::{CStrBuf, Name, NAME_CAPACITY};
pub use file::DeviceFile;
pub use graphics::{DeviceGraphics, DeviceVideo};
pub use json::DeviceJson;
pub use logger::{ConsoleLogger, LINE_CAPACITY};
pub use lua::DeviceLua;
pub use scoreboards::DeviceScoreboards;
pub use sound::DeviceSound;
pub use sprite::DeviceSprites;
pub use system::DeviceSystem;
