//! 1-bit drawing, bitmaps, fonts and video playback.

use crate::geometry::Rect;
use crate::handle::{Bitmap, BitmapTable, Font, VideoPlayer};

/// Screen width in pixels.
pub const LCD_COLUMNS: usize = 400;
/// Screen height in pixels.
pub const LCD_ROWS: usize = 240;
/// Bytes per frame buffer row, including padding.
pub const LCD_ROWSIZE: usize = 52;
/// Frame buffer size in bytes.
pub const LCD_FRAME_SIZE: usize = LCD_ROWSIZE * LCD_ROWS;

/// Solid colour (`LCDSolidColor`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SolidColor {
    Black = 0,
    White = 1,
    Clear = 2,
    Xor = 3,
}

/// 8x8 pattern followed by an 8x8 mask, one byte per row (`LCDPattern`).
pub type Pattern = [u8; 16];

/// Fill colour (`LCDColor`): a solid colour or a pointer to a pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Color {
    Solid(SolidColor),
    Pattern(&'static Pattern),
}

impl Color {
    pub const BLACK: Self = Self::Solid(SolidColor::Black);
    pub const WHITE: Self = Self::Solid(SolidColor::White);
    pub const CLEAR: Self = Self::Solid(SolidColor::Clear);
    pub const XOR: Self = Self::Solid(SolidColor::Xor);

    /// The firmware encoding: the colour number or the pattern address.
    #[must_use]
    pub fn raw(self) -> usize {
        match self {
            Self::Solid(c) => c as usize,
            Self::Pattern(p) => p.as_ptr() as usize,
        }
    }
}

impl From<SolidColor> for Color {
    fn from(color: SolidColor) -> Self {
        Self::Solid(color)
    }
}

/// How bitmap pixels combine with the target (`LCDBitmapDrawMode`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DrawMode {
    Copy = 0,
    WhiteTransparent = 1,
    BlackTransparent = 2,
    FillWhite = 3,
    FillBlack = 4,
    Xor = 5,
    Nxor = 6,
    Inverted = 7,
}

impl DrawMode {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Copy,
            1 => Self::WhiteTransparent,
            2 => Self::BlackTransparent,
            3 => Self::FillWhite,
            4 => Self::FillBlack,
            5 => Self::Xor,
            6 => Self::Nxor,
            7 => Self::Inverted,
            _ => return None,
        })
    }
}

/// Bitmap mirroring (`LCDBitmapFlip`).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitmapFlip {
    #[default]
    Unflipped = 0,
    FlippedX = 1,
    FlippedY = 2,
    FlippedXY = 3,
}

impl BitmapFlip {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw & 3 {
            1 => Self::FlippedX,
            2 => Self::FlippedY,
            3 => Self::FlippedXY,
            _ => Self::Unflipped,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineCapStyle {
    Butt = 0,
    Square = 1,
    Round = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PolygonFillRule {
    NonZero = 0,
    EvenOdd = 1,
}

/// Dimensions of a bitmap.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitmapInfo {
    pub width: i32,
    pub height: i32,
    pub row_bytes: i32,
    pub has_mask: bool,
}

/// Properties of a loaded video.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VideoInfo {
    pub width: i32,
    pub height: i32,
    pub frame_rate: f32,
    pub frame_count: i32,
    pub current_frame: i32,
}

/// Error type for graphics and video operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GraphicsError {
    /// The firmware table lacks the entry point.
    Missing,
    /// Text or path contains a NUL byte or is too long.
    InvalidText,
    /// Loading an asset failed. The reason is logged.
    Load,
    /// The firmware could not allocate the object.
    OutOfMemory,
    /// Polygon has more points than fit the conversion buffer.
    TooManyPoints,
    /// Any other failure reported by the firmware.
    Failed,
}

/// The `Graphics` table.
pub trait Graphics {
    fn clear(&self, color: Color);

    fn set_background_color(&self, color: SolidColor);

    /// Draw into `target` until the matching [`pop_context`](Self::pop_context).
    /// `None` targets the frame buffer.
    fn push_context(&self, target: Option<Bitmap>);

    fn pop_context(&self);

    fn set_stencil(&self, stencil: Option<Bitmap>);

    fn set_draw_mode(&self, mode: DrawMode);

    fn set_draw_offset(&self, dx: i32, dy: i32);

    /// Clip in world coordinates, i.e. affected by the draw offset.
    fn set_clip_rect(&self, rect: Rect);

    fn clear_clip_rect(&self);

    fn set_line_cap_style(&self, style: LineCapStyle);

    fn set_font(&self, font: Font);

    fn set_text_tracking(&self, tracking: i32);

    fn draw_bitmap(&self, bitmap: Bitmap, x: i32, y: i32, flip: BitmapFlip);

    fn tile_bitmap(&self, bitmap: Bitmap, rect: Rect, flip: BitmapFlip);

    fn draw_scaled_bitmap(&self, bitmap: Bitmap, x: i32, y: i32, x_scale: f32, y_scale: f32);

    /// Rotate by `degrees` around the (`center_x`, `center_y`) fraction of
    /// the bitmap, placed at (`x`, `y`).
    #[allow(clippy::too_many_arguments)]
    fn draw_rotated_bitmap(
        &self,
        bitmap: Bitmap,
        x: i32,
        y: i32,
        degrees: f32,
        center_x: f32,
        center_y: f32,
        x_scale: f32,
        y_scale: f32,
    );

    fn draw_line(&self, x1: i32, y1: i32, x2: i32, y2: i32, width: i32, color: Color);

    #[allow(clippy::too_many_arguments)]
    fn fill_triangle(&self, x1: i32, y1: i32, x2: i32, y2: i32, x3: i32, y3: i32, color: Color);

    fn draw_rect(&self, rect: Rect, color: Color);

    fn fill_rect(&self, rect: Rect, color: Color);

    /// Angles in degrees, 0 at twelve o'clock. Equal angles draw a full ellipse.
    fn draw_ellipse(&self, rect: Rect, line_width: i32, start: f32, end: f32, color: Color);

    fn fill_ellipse(&self, rect: Rect, start: f32, end: f32, color: Color);

    fn fill_polygon(
        &self,
        points: &[(i32, i32)],
        color: Color,
        rule: PolygonFillRule,
    ) -> Result<(), GraphicsError>;

    /// Draw UTF-8 text with the current font. Returns the drawn width.
    fn draw_text(&self, text: &str, x: i32, y: i32) -> Result<i32, GraphicsError>;

    fn new_bitmap(&self, width: i32, height: i32, background: Color)
        -> Result<Bitmap, GraphicsError>;

    fn free_bitmap(&self, bitmap: Bitmap);

    fn load_bitmap(&self, path: &str) -> Result<Bitmap, GraphicsError>;

    fn copy_bitmap(&self, bitmap: Bitmap) -> Result<Bitmap, GraphicsError>;

    fn clear_bitmap(&self, bitmap: Bitmap, background: Color);

    fn bitmap_info(&self, bitmap: Bitmap) -> BitmapInfo;

    /// A new bitmap holding the rotated and scaled copy.
    fn rotated_bitmap(
        &self,
        bitmap: Bitmap,
        degrees: f32,
        x_scale: f32,
        y_scale: f32,
    ) -> Result<Bitmap, GraphicsError>;

    fn new_bitmap_table(
        &self,
        count: i32,
        width: i32,
        height: i32,
    ) -> Result<BitmapTable, GraphicsError>;

    fn free_bitmap_table(&self, table: BitmapTable);

    fn load_bitmap_table(&self, path: &str) -> Result<BitmapTable, GraphicsError>;

    fn table_bitmap(&self, table: BitmapTable, index: i32) -> Option<Bitmap>;

    fn load_font(&self, path: &str) -> Result<Font, GraphicsError>;

    /// Width of `text` in `font`, or the current font when `None`.
    fn text_width(&self, font: Option<Font>, text: &str, tracking: i32) -> i32;

    fn font_height(&self, font: Option<Font>) -> u8;

    /// Run `f` over the working frame buffer, [`LCD_FRAME_SIZE`] bytes.
    fn with_frame(&self, f: &mut dyn FnMut(&mut [u8]));

    /// Flag rows as changed after writing to the frame buffer directly.
    fn mark_updated_rows(&self, start: i32, end: i32);

    /// Push the frame buffer to the screen now instead of after `update`.
    fn display(&self);

    /// Whether opaque pixels of the two bitmaps overlap inside `rect`.
    #[allow(clippy::too_many_arguments)]
    fn check_mask_collision(
        &self,
        a: Bitmap,
        ax: i32,
        ay: i32,
        a_flip: BitmapFlip,
        b: Bitmap,
        bx: i32,
        by: i32,
        b_flip: BitmapFlip,
        rect: Rect,
    ) -> bool;

    /// Clip in screen coordinates, ignoring the draw offset.
    fn set_screen_clip_rect(&self, rect: Rect);
}

/// The `Video` table nested in `Graphics`.
pub trait Video {
    fn load_video(&self, path: &str) -> Result<VideoPlayer, GraphicsError>;

    fn free_video(&self, player: VideoPlayer);

    /// Render into `target` instead of the screen.
    fn set_video_context(&self, player: VideoPlayer, target: Bitmap) -> Result<(), GraphicsError>;

    fn use_screen_context(&self, player: VideoPlayer);

    fn render_frame(&self, player: VideoPlayer, frame: i32) -> Result<(), GraphicsError>;

    fn video_info(&self, player: VideoPlayer) -> VideoInfo;

    /// Text of the player's last error.
    fn video_error(&self, player: VideoPlayer) -> Option<&str>;
}

#[cfg(test)]
mod tests {
    use super::*;

    static CHECKER: Pattern = [
        0xaa, 0x55, 0xaa, 0x55, 0xaa, 0x55, 0xaa, 0x55, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff,
    ];

    #[test]
    fn test_color_raw() {
        assert_eq!(Color::BLACK.raw(), 0);
        assert_eq!(Color::XOR.raw(), 3);
        assert_eq!(Color::Pattern(&CHECKER).raw(), CHECKER.as_ptr() as usize);
    }

    #[test]
    fn test_frame_size() {
        assert!(LCD_ROWSIZE * 8 >= LCD_COLUMNS);
        assert_eq!(LCD_FRAME_SIZE, 12_480);
    }

    #[test]
    fn test_flip_from_raw() {
        assert_eq!(BitmapFlip::from_raw(3), BitmapFlip::FlippedXY);
        assert_eq!(BitmapFlip::from_raw(4), BitmapFlip::Unflipped);
        assert_eq!(DrawMode::from_raw(6), Some(DrawMode::Nxor));
        assert_eq!(DrawMode::from_raw(8), None);
    }
}
