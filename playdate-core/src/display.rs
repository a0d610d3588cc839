//! Screen properties.

/// The `Display` table.
pub trait Display {
    /// Width in pixels after scaling.
    fn width(&self) -> i32;

    /// Height in pixels after scaling.
    fn height(&self) -> i32;

    /// Target frames per second. 0 runs `update` as fast as possible.
    fn set_refresh_rate(&self, rate: f32);

    fn set_inverted(&self, inverted: bool);

    /// Pixel scale. Only 1, 2, 4 and 8 are honoured.
    fn set_scale(&self, scale: u32);

    /// Mosaic effect, each axis 0..=3.
    fn set_mosaic(&self, x: u32, y: u32);

    fn set_flipped(&self, x: bool, y: bool);

    fn set_offset(&self, dx: i32, dy: i32);
}
