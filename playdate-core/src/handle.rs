//! Opaque handles to firmware-owned resources.
//!
//! The firmware hands out raw pointers for bitmaps, sprites, files and the
//! like. The core never dereferences them, so each one is carried as a
//! non-null address wrapped in its own type. A device implementation converts
//! between pointers and handles at the boundary; a host implementation is
//! free to use any non-zero id.

use core::num::NonZeroUsize;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name(NonZeroUsize);

        impl $name {
            /// Wrap a raw address or id. Returns `None` for zero (null).
            #[inline]
            #[must_use]
            pub const fn from_raw(raw: usize) -> Option<Self> {
                match NonZeroUsize::new(raw) {
                    Some(raw) => Some(Self(raw)),
                    None => None,
                }
            }

            /// Get the raw address or id.
            #[inline]
            #[must_use]
            pub const fn raw(self) -> usize {
                self.0.get()
            }
        }
    };
}

handle!(
    /// A 1-bit bitmap (`LCDBitmap*`).
    Bitmap
);
handle!(
    /// A table of equally sized bitmaps (`LCDBitmapTable*`).
    BitmapTable
);
handle!(
    /// A loaded font (`LCDFont*`).
    Font
);
handle!(
    /// A sprite (`LCDSprite*`).
    Sprite
);
handle!(
    /// An entry in the system menu (`PDMenuItem*`).
    MenuItem
);
handle!(
    /// An open file (`SDFile*`).
    File
);
handle!(
    /// A video player (`LCDVideoPlayer*`).
    VideoPlayer
);
handle!(
    /// A mixer channel (`SoundChannel*`).
    SoundChannel
);
handle!(
    /// A sound source attached to a channel (`SoundSource*`).
    SoundSource
);
handle!(
    /// A channel effect (`SoundEffect*`).
    SoundEffect
);
handle!(
    /// A reference-counted Lua userdata object (`LuaUDObject*`).
    LuaObject
);
handle!(
    /// Reference to an array or table produced by a JSON decoder.
    ///
    /// The value that carries it does not own it; the decoder's handler
    /// decides what it points at.
    ListRef
);
handle!(
    /// Caller-owned data passed through the firmware untouched.
    Opaque
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_rejected() {
        assert_eq!(Bitmap::from_raw(0), None);
        assert_eq!(ListRef::from_raw(0), None);
    }

    #[test]
    fn test_raw_round_trips() {
        let sprite = Sprite::from_raw(0x2000_0040).unwrap();
        assert_eq!(sprite.raw(), 0x2000_0040);
    }
}
