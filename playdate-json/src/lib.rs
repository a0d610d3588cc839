//! Native JSON decoding and encoding for Playdate games.
//!
//! The decoder speaks the same callback contract as the firmware's
//! `playdate->json` table, so a [`DecodeHandler`] written for the device
//! works unchanged on the host:
//!
//! - **Decoding**
//!   - [`decode()`] - Walk a document and report it to a handler
//!   - [`DecodeHandler`] - Receives sublists and values
//!   - [`Value`] - The tagged value handed to the handler
//!
//! - **Encoding**
//!   - [`Encoder`] - Streaming writer over [`core::fmt::Write`]
//!   - [`EncodeError`] - What can go wrong while writing
//!
//! # Callback Order
//!
//! ```text
//! {"a": [1]}
//!
//! will_decode_sublist("_root", Table)
//!   will_decode_sublist("a", Array)
//!     did_decode_array_value(1, Integer(1))
//!   did_decode_sublist("a", Array)      -> Some(list)
//!   did_decode_table_value("a", Array(list))
//! did_decode_sublist("_root", Table)
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`heapless`**: Enable `Encoder::heapless()` over `heapless::String`
//! - **`embedded-io`**: Enable [`IoWriter`] for I/O sinks
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.
//! Escaped strings are unescaped into stack buffers of
//! [`MAX_STRING_LENGTH`] bytes.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod decode;
pub mod encode;
mod fmt;

pub use decode::{decode, MAX_DEPTH, MAX_KEY_LENGTH, MAX_STRING_LENGTH};
#[cfg(feature = "embedded-io")]
pub use encode::IoWriter;
pub use encode::{EncodeError, Encoder};
pub use playdate_core::json::{DecodeError, DecodeErrorKind, DecodeHandler, ROOT_NAME};
pub use playdate_core::value::{Value, ValueType};
