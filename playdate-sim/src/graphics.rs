//! Recording graphics table.
//!
//! Draw calls are logged, never rasterized. The frame buffer is plain bytes
//! that the game may write through `with_frame`. Bitmap handles carry only
//! their size, and mask collisions return a scripted answer.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use playdate_core::geometry::Rect;
use playdate_core::graphics::{
    BitmapFlip, BitmapInfo, Color, DrawMode, Graphics, GraphicsError, LineCapStyle,
    PolygonFillRule, SolidColor, Video, VideoInfo, LCD_FRAME_SIZE,
};
use playdate_core::handle::{Bitmap, BitmapTable, Font, VideoPlayer};

/// Width of every glyph in the built-in test font.
pub const GLYPH_WIDTH: i32 = 8;

/// Height of the built-in test font.
pub const FONT_HEIGHT: u8 = 16;

/// Most polygon points the device conversion buffer holds.
pub const MAX_POLYGON_POINTS: usize = 64;

/// One recorded drawing operation.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Clear(Color),
    Bitmap { bitmap: Bitmap, x: i32, y: i32, flip: BitmapFlip },
    TileBitmap { bitmap: Bitmap, rect: Rect },
    ScaledBitmap { bitmap: Bitmap, x: i32, y: i32 },
    RotatedBitmap { bitmap: Bitmap, x: i32, y: i32, degrees: f32 },
    Line { from: (i32, i32), to: (i32, i32), width: i32, color: Color },
    Triangle { points: [(i32, i32); 3], color: Color },
    Rect { rect: Rect, color: Color },
    FillRect { rect: Rect, color: Color },
    Ellipse { rect: Rect, filled: bool, color: Color },
    Polygon { points: Vec<(i32, i32)>, color: Color },
    Text { text: String, x: i32, y: i32 },
}

#[derive(Clone, Copy, Debug)]
struct Context {
    target: Option<Bitmap>,
    offset: (i32, i32),
    clip: Option<Rect>,
    mode: DrawMode,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            target: None,
            offset: (0, 0),
            clip: None,
            mode: DrawMode::Copy,
        }
    }
}

/// Host [`Graphics`].
pub struct SimGraphics {
    frame: RefCell<Vec<u8>>,
    calls: RefCell<Vec<DrawCall>>,
    context: Cell<Context>,
    stack: RefCell<Vec<Context>>,
    background: Cell<SolidColor>,
    line_cap: Cell<LineCapStyle>,
    stencil: Cell<Option<Bitmap>>,
    font: Cell<Option<Font>>,
    tracking: Cell<i32>,
    updated_rows: Cell<Option<(i32, i32)>>,
    displayed: Cell<u32>,
    mask_hit: Cell<bool>,
    next_id: Cell<usize>,
    bitmaps: RefCell<BTreeMap<Bitmap, BitmapInfo>>,
    tables: RefCell<BTreeMap<BitmapTable, Vec<Bitmap>>>,
    images: RefCell<BTreeMap<String, (i32, i32)>>,
    image_tables: RefCell<BTreeMap<String, (i32, i32, i32)>>,
    fonts: RefCell<Vec<String>>,
}

impl Default for SimGraphics {
    fn default() -> Self {
        Self {
            frame: RefCell::new(vec![0xff; LCD_FRAME_SIZE]),
            calls: RefCell::new(Vec::new()),
            context: Cell::new(Context::default()),
            stack: RefCell::new(Vec::new()),
            background: Cell::new(SolidColor::White),
            line_cap: Cell::new(LineCapStyle::Butt),
            stencil: Cell::new(None),
            font: Cell::new(None),
            tracking: Cell::new(0),
            updated_rows: Cell::new(None),
            displayed: Cell::new(0),
            mask_hit: Cell::new(false),
            next_id: Cell::new(1),
            bitmaps: RefCell::new(BTreeMap::new()),
            tables: RefCell::new(BTreeMap::new()),
            images: RefCell::new(BTreeMap::new()),
            image_tables: RefCell::new(BTreeMap::new()),
            fonts: RefCell::new(Vec::new()),
        }
    }
}

impl SimGraphics {
    /// Make `load_bitmap(path)` succeed with the given size.
    pub fn add_image(&self, path: &str, width: i32, height: i32) {
        self.images.borrow_mut().insert(path.to_string(), (width, height));
    }

    /// Make `load_bitmap_table(path)` succeed.
    pub fn add_image_table(&self, path: &str, count: i32, width: i32, height: i32) {
        self.image_tables
            .borrow_mut()
            .insert(path.to_string(), (count, width, height));
    }

    /// Make `load_font(path)` succeed.
    pub fn add_font(&self, path: &str) {
        self.fonts.borrow_mut().push(path.to_string());
    }

    /// Drain the recorded draw calls.
    pub fn take_calls(&self) -> Vec<DrawCall> {
        self.calls.take()
    }

    /// Bytes of the frame buffer as the game last left them.
    pub fn frame(&self) -> Vec<u8> {
        self.frame.borrow().clone()
    }

    /// Answer every later `check_mask_collision` with `hit`.
    pub fn script_mask_collision(&self, hit: bool) {
        self.mask_hit.set(hit);
    }

    pub fn updated_rows(&self) -> Option<(i32, i32)> {
        self.updated_rows.get()
    }

    pub fn display_count(&self) -> u32 {
        self.displayed.get()
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.context.get().mode
    }

    pub fn draw_offset(&self) -> (i32, i32) {
        self.context.get().offset
    }

    pub fn clip_rect(&self) -> Option<Rect> {
        self.context.get().clip
    }

    pub fn context_target(&self) -> Option<Bitmap> {
        self.context.get().target
    }

    pub fn background(&self) -> SolidColor {
        self.background.get()
    }

    pub fn font(&self) -> Option<Font> {
        self.font.get()
    }

    pub fn stencil(&self) -> Option<Bitmap> {
        self.stencil.get()
    }

    pub fn bitmap_count(&self) -> usize {
        self.bitmaps.borrow().len()
    }

    fn record(&self, call: DrawCall) {
        self.calls.borrow_mut().push(call);
    }

    fn next_raw(&self) -> usize {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn alloc_bitmap(&self, width: i32, height: i32) -> Result<Bitmap, GraphicsError> {
        if width < 0 || height < 0 {
            return Err(GraphicsError::OutOfMemory);
        }
        let bitmap = Bitmap::from_raw(self.next_raw()).ok_or(GraphicsError::OutOfMemory)?;
        let info = BitmapInfo {
            width,
            height,
            row_bytes: (width + 7) / 8,
            has_mask: false,
        };
        self.bitmaps.borrow_mut().insert(bitmap, info);
        Ok(bitmap)
    }
}

impl Graphics for SimGraphics {
    fn clear(&self, color: Color) {
        self.record(DrawCall::Clear(color));
    }

    fn set_background_color(&self, color: SolidColor) {
        self.background.set(color);
    }

    fn push_context(&self, target: Option<Bitmap>) {
        let ctx = self.context.get();
        self.stack.borrow_mut().push(ctx);
        self.context.set(Context { target, ..ctx });
    }

    fn pop_context(&self) {
        if let Some(ctx) = self.stack.borrow_mut().pop() {
            self.context.set(ctx);
        } else {
            log::warn!("pop_context with an empty stack");
        }
    }

    fn set_stencil(&self, stencil: Option<Bitmap>) {
        self.stencil.set(stencil);
    }

    fn set_draw_mode(&self, mode: DrawMode) {
        let ctx = self.context.get();
        self.context.set(Context { mode, ..ctx });
    }

    fn set_draw_offset(&self, dx: i32, dy: i32) {
        let ctx = self.context.get();
        self.context.set(Context {
            offset: (dx, dy),
            ..ctx
        });
    }

    fn set_clip_rect(&self, rect: Rect) {
        let ctx = self.context.get();
        let clip = rect.translate(ctx.offset.0, ctx.offset.1);
        self.context.set(Context {
            clip: Some(clip),
            ..ctx
        });
    }

    fn clear_clip_rect(&self) {
        let ctx = self.context.get();
        self.context.set(Context { clip: None, ..ctx });
    }

    fn set_line_cap_style(&self, style: LineCapStyle) {
        self.line_cap.set(style);
    }

    fn set_font(&self, font: Font) {
        self.font.set(Some(font));
    }

    fn set_text_tracking(&self, tracking: i32) {
        self.tracking.set(tracking);
    }

    fn draw_bitmap(&self, bitmap: Bitmap, x: i32, y: i32, flip: BitmapFlip) {
        self.record(DrawCall::Bitmap { bitmap, x, y, flip });
    }

    fn tile_bitmap(&self, bitmap: Bitmap, rect: Rect, _flip: BitmapFlip) {
        self.record(DrawCall::TileBitmap { bitmap, rect });
    }

    fn draw_scaled_bitmap(&self, bitmap: Bitmap, x: i32, y: i32, _x_scale: f32, _y_scale: f32) {
        self.record(DrawCall::ScaledBitmap { bitmap, x, y });
    }

    fn draw_rotated_bitmap(
        &self,
        bitmap: Bitmap,
        x: i32,
        y: i32,
        degrees: f32,
        _center_x: f32,
        _center_y: f32,
        _x_scale: f32,
        _y_scale: f32,
    ) {
        self.record(DrawCall::RotatedBitmap {
            bitmap,
            x,
            y,
            degrees,
        });
    }

    fn draw_line(&self, x1: i32, y1: i32, x2: i32, y2: i32, width: i32, color: Color) {
        self.record(DrawCall::Line {
            from: (x1, y1),
            to: (x2, y2),
            width,
            color,
        });
    }

    fn fill_triangle(&self, x1: i32, y1: i32, x2: i32, y2: i32, x3: i32, y3: i32, color: Color) {
        self.record(DrawCall::Triangle {
            points: [(x1, y1), (x2, y2), (x3, y3)],
            color,
        });
    }

    fn draw_rect(&self, rect: Rect, color: Color) {
        self.record(DrawCall::Rect { rect, color });
    }

    fn fill_rect(&self, rect: Rect, color: Color) {
        self.record(DrawCall::FillRect { rect, color });
    }

    fn draw_ellipse(&self, rect: Rect, _line_width: i32, _start: f32, _end: f32, color: Color) {
        self.record(DrawCall::Ellipse {
            rect,
            filled: false,
            color,
        });
    }

    fn fill_ellipse(&self, rect: Rect, _start: f32, _end: f32, color: Color) {
        self.record(DrawCall::Ellipse {
            rect,
            filled: true,
            color,
        });
    }

    fn fill_polygon(
        &self,
        points: &[(i32, i32)],
        color: Color,
        _rule: PolygonFillRule,
    ) -> Result<(), GraphicsError> {
        if points.len() > MAX_POLYGON_POINTS {
            return Err(GraphicsError::TooManyPoints);
        }
        self.record(DrawCall::Polygon {
            points: points.to_vec(),
            color,
        });
        Ok(())
    }

    fn draw_text(&self, text: &str, x: i32, y: i32) -> Result<i32, GraphicsError> {
        if text.contains('\0') {
            return Err(GraphicsError::InvalidText);
        }
        self.record(DrawCall::Text {
            text: text.to_string(),
            x,
            y,
        });
        Ok(self.text_width(None, text, self.tracking.get()))
    }

    fn new_bitmap(&self, width: i32, height: i32, _background: Color) -> Result<Bitmap, GraphicsError> {
        self.alloc_bitmap(width, height)
    }

    fn free_bitmap(&self, bitmap: Bitmap) {
        self.bitmaps.borrow_mut().remove(&bitmap);
    }

    fn load_bitmap(&self, path: &str) -> Result<Bitmap, GraphicsError> {
        let size = self.images.borrow().get(path).copied();
        let (width, height) = size.ok_or(GraphicsError::Load)?;
        self.alloc_bitmap(width, height)
    }

    fn copy_bitmap(&self, bitmap: Bitmap) -> Result<Bitmap, GraphicsError> {
        let info = self.bitmap_info(bitmap);
        self.alloc_bitmap(info.width, info.height)
    }

    fn clear_bitmap(&self, _bitmap: Bitmap, _background: Color) {}

    fn bitmap_info(&self, bitmap: Bitmap) -> BitmapInfo {
        self.bitmaps.borrow().get(&bitmap).copied().unwrap_or_default()
    }

    fn rotated_bitmap(
        &self,
        bitmap: Bitmap,
        degrees: f32,
        x_scale: f32,
        y_scale: f32,
    ) -> Result<Bitmap, GraphicsError> {
        let info = self.bitmap_info(bitmap);
        let (w, h) = (info.width as f32 * x_scale, info.height as f32 * y_scale);
        let (sin, cos) = degrees.to_radians().sin_cos();
        let width = (w * cos.abs() + h * sin.abs()).round() as i32;
        let height = (w * sin.abs() + h * cos.abs()).round() as i32;
        self.alloc_bitmap(width, height)
    }

    fn new_bitmap_table(
        &self,
        count: i32,
        width: i32,
        height: i32,
    ) -> Result<BitmapTable, GraphicsError> {
        let table = BitmapTable::from_raw(self.next_raw()).ok_or(GraphicsError::OutOfMemory)?;
        let bitmaps = (0..count.max(0))
            .map(|_| self.alloc_bitmap(width, height))
            .collect::<Result<Vec<_>, _>>()?;
        self.tables.borrow_mut().insert(table, bitmaps);
        Ok(table)
    }

    fn free_bitmap_table(&self, table: BitmapTable) {
        if let Some(bitmaps) = self.tables.borrow_mut().remove(&table) {
            let mut all = self.bitmaps.borrow_mut();
            for bitmap in bitmaps {
                all.remove(&bitmap);
            }
        }
    }

    fn load_bitmap_table(&self, path: &str) -> Result<BitmapTable, GraphicsError> {
        let entry = self.image_tables.borrow().get(path).copied();
        let (count, width, height) = entry.ok_or(GraphicsError::Load)?;
        self.new_bitmap_table(count, width, height)
    }

    fn table_bitmap(&self, table: BitmapTable, index: i32) -> Option<Bitmap> {
        let index = usize::try_from(index).ok()?;
        self.tables.borrow().get(&table)?.get(index).copied()
    }

    fn load_font(&self, path: &str) -> Result<Font, GraphicsError> {
        let fonts = self.fonts.borrow();
        let index = fonts.iter().position(|f| f == path).ok_or(GraphicsError::Load)?;
        // Fonts get ids above the bitmap range
        Font::from_raw(usize::MAX - index).ok_or(GraphicsError::Load)
    }

    fn text_width(&self, _font: Option<Font>, text: &str, tracking: i32) -> i32 {
        let chars = text.chars().count() as i32;
        if chars == 0 {
            return 0;
        }
        chars * GLYPH_WIDTH + (chars - 1) * tracking
    }

    fn font_height(&self, _font: Option<Font>) -> u8 {
        FONT_HEIGHT
    }

    fn with_frame(&self, f: &mut dyn FnMut(&mut [u8])) {
        f(&mut self.frame.borrow_mut());
    }

    fn mark_updated_rows(&self, start: i32, end: i32) {
        let rows = match self.updated_rows.get() {
            Some((s, e)) => (s.min(start), e.max(end)),
            None => (start, end),
        };
        self.updated_rows.set(Some(rows));
    }

    fn display(&self) {
        self.displayed.set(self.displayed.get() + 1);
        self.updated_rows.set(None);
    }

    fn check_mask_collision(
        &self,
        _a: Bitmap,
        _ax: i32,
        _ay: i32,
        _a_flip: BitmapFlip,
        _b: Bitmap,
        _bx: i32,
        _by: i32,
        _b_flip: BitmapFlip,
        _rect: Rect,
    ) -> bool {
        self.mask_hit.get()
    }

    fn set_screen_clip_rect(&self, rect: Rect) {
        let ctx = self.context.get();
        self.context.set(Context {
            clip: Some(rect),
            ..ctx
        });
    }
}

#[derive(Clone, Copy, Debug)]
struct Player {
    info: VideoInfo,
    target: Option<Bitmap>,
    error: Option<&'static str>,
}

/// Host [`Video`]. Videos registered with [`add_video`](Self::add_video)
/// can be loaded.
#[derive(Default)]
pub struct SimVideo {
    library: RefCell<BTreeMap<String, VideoInfo>>,
    players: RefCell<BTreeMap<VideoPlayer, Player>>,
    next_id: Cell<usize>,
}

impl SimVideo {
    pub fn add_video(&self, path: &str, info: VideoInfo) {
        self.library.borrow_mut().insert(path.to_string(), info);
    }

    pub fn target(&self, player: VideoPlayer) -> Option<Bitmap> {
        self.players.borrow().get(&player).and_then(|p| p.target)
    }
}

impl Video for SimVideo {
    fn load_video(&self, path: &str) -> Result<VideoPlayer, GraphicsError> {
        let info = self.library.borrow().get(path).copied().ok_or(GraphicsError::Load)?;
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let player = VideoPlayer::from_raw(id).ok_or(GraphicsError::OutOfMemory)?;
        self.players.borrow_mut().insert(
            player,
            Player {
                info,
                target: None,
                error: None,
            },
        );
        Ok(player)
    }

    fn free_video(&self, player: VideoPlayer) {
        self.players.borrow_mut().remove(&player);
    }

    fn set_video_context(&self, player: VideoPlayer, target: Bitmap) -> Result<(), GraphicsError> {
        let mut players = self.players.borrow_mut();
        let p = players.get_mut(&player).ok_or(GraphicsError::Failed)?;
        p.target = Some(target);
        Ok(())
    }

    fn use_screen_context(&self, player: VideoPlayer) {
        if let Some(p) = self.players.borrow_mut().get_mut(&player) {
            p.target = None;
        }
    }

    fn render_frame(&self, player: VideoPlayer, frame: i32) -> Result<(), GraphicsError> {
        let mut players = self.players.borrow_mut();
        let p = players.get_mut(&player).ok_or(GraphicsError::Failed)?;
        if frame < 0 || frame >= p.info.frame_count {
            p.error = Some("frame out of range");
            return Err(GraphicsError::Failed);
        }
        p.info.current_frame = frame;
        p.error = None;
        Ok(())
    }

    fn video_info(&self, player: VideoPlayer) -> VideoInfo {
        self.players
            .borrow()
            .get(&player)
            .map(|p| p.info)
            .unwrap_or_default()
    }

    fn video_error(&self, player: VideoPlayer) -> Option<&str> {
        self.players.borrow().get(&player).and_then(|p| p.error)
    }
}
