use core::ffi::{c_char, c_int};

use ::playdate_sys as sys;
use playdate_core::geometry::Rect;
use playdate_core::graphics::{
    BitmapFlip, BitmapInfo, Color, DrawMode, Graphics, GraphicsError, LineCapStyle,
    PolygonFillRule, SolidColor, Video, VideoInfo, LCD_FRAME_SIZE,
};
use playdate_core::handle::{Bitmap, BitmapTable, Font, VideoPlayer};
use sys::{playdate_graphics, playdate_video, LCDRect};

use crate::ffi::{borrow_str, invoke, ptr_or_null, Name, RawHandle};

/// Vertices accepted by [`Graphics::fill_polygon`].
pub const MAX_POLYGON_POINTS: usize = 64;

fn lcd_rect(rect: Rect) -> LCDRect {
    LCDRect {
        left: rect.left,
        right: rect.right,
        top: rect.top,
        bottom: rect.bottom,
    }
}

fn load_failed(what: &str, path: &str, err: *const c_char) -> GraphicsError {
    // SAFETY: the firmware sets `outerr` to null or a static message.
    match unsafe { borrow_str(err) } {
        Some(reason) => log::warn!("{} {}: {}", what, path, reason),
        None => log::warn!("{} {} failed", what, path),
    }
    GraphicsError::Load
}

/// [`Graphics`] over `playdate_graphics`.
#[derive(Clone, Copy)]
pub struct DeviceGraphics {
    table: &'static playdate_graphics,
}

impl DeviceGraphics {
    pub(crate) fn new(table: &'static playdate_graphics) -> Self {
        Self { table }
    }

    fn allocated<H: RawHandle, T>(ptr: Option<*mut T>) -> Result<H, GraphicsError> {
        H::from_ptr(ptr.ok_or(GraphicsError::Missing)?).ok_or(GraphicsError::OutOfMemory)
    }
}

impl Graphics for DeviceGraphics {
    fn clear(&self, color: Color) {
        invoke!(self.table, clear(color.raw()));
    }

    fn set_background_color(&self, color: SolidColor) {
        invoke!(self.table, setBackgroundColor(color as u32));
    }

    fn push_context(&self, target: Option<Bitmap>) {
        invoke!(self.table, pushContext(ptr_or_null(target)));
    }

    fn pop_context(&self) {
        invoke!(self.table, popContext());
    }

    fn set_stencil(&self, stencil: Option<Bitmap>) {
        invoke!(self.table, setStencil(ptr_or_null(stencil)));
    }

    fn set_draw_mode(&self, mode: DrawMode) {
        invoke!(self.table, setDrawMode(mode as u32));
    }

    fn set_draw_offset(&self, dx: i32, dy: i32) {
        invoke!(self.table, setDrawOffset(dx, dy));
    }

    fn set_clip_rect(&self, rect: Rect) {
        invoke!(
            self.table,
            setClipRect(rect.x(), rect.y(), rect.width(), rect.height())
        );
    }

    fn clear_clip_rect(&self) {
        invoke!(self.table, clearClipRect());
    }

    fn set_line_cap_style(&self, style: LineCapStyle) {
        invoke!(self.table, setLineCapStyle(style as u32));
    }

    fn set_font(&self, font: Font) {
        invoke!(self.table, setFont(font.as_ptr()));
    }

    fn set_text_tracking(&self, tracking: i32) {
        invoke!(self.table, setTextTracking(tracking));
    }

    fn draw_bitmap(&self, bitmap: Bitmap, x: i32, y: i32, flip: BitmapFlip) {
        invoke!(self.table, drawBitmap(bitmap.as_ptr(), x, y, flip as u32));
    }

    fn tile_bitmap(&self, bitmap: Bitmap, rect: Rect, flip: BitmapFlip) {
        invoke!(
            self.table,
            tileBitmap(
                bitmap.as_ptr(),
                rect.x(),
                rect.y(),
                rect.width(),
                rect.height(),
                flip as u32,
            )
        );
    }

    fn draw_scaled_bitmap(&self, bitmap: Bitmap, x: i32, y: i32, x_scale: f32, y_scale: f32) {
        invoke!(self.table, drawScaledBitmap(bitmap.as_ptr(), x, y, x_scale, y_scale));
    }

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
    ) {
        invoke!(
            self.table,
            drawRotatedBitmap(
                bitmap.as_ptr(),
                x,
                y,
                degrees,
                center_x,
                center_y,
                x_scale,
                y_scale,
            )
        );
    }

    fn draw_line(&self, x1: i32, y1: i32, x2: i32, y2: i32, width: i32, color: Color) {
        invoke!(self.table, drawLine(x1, y1, x2, y2, width, color.raw()));
    }

    fn fill_triangle(&self, x1: i32, y1: i32, x2: i32, y2: i32, x3: i32, y3: i32, color: Color) {
        invoke!(self.table, fillTriangle(x1, y1, x2, y2, x3, y3, color.raw()));
    }

    fn draw_rect(&self, rect: Rect, color: Color) {
        invoke!(
            self.table,
            drawRect(rect.x(), rect.y(), rect.width(), rect.height(), color.raw())
        );
    }

    fn fill_rect(&self, rect: Rect, color: Color) {
        invoke!(
            self.table,
            fillRect(rect.x(), rect.y(), rect.width(), rect.height(), color.raw())
        );
    }

    fn draw_ellipse(&self, rect: Rect, line_width: i32, start: f32, end: f32, color: Color) {
        invoke!(
            self.table,
            drawEllipse(
                rect.x(),
                rect.y(),
                rect.width(),
                rect.height(),
                line_width,
                start,
                end,
                color.raw(),
            )
        );
    }

    fn fill_ellipse(&self, rect: Rect, start: f32, end: f32, color: Color) {
        invoke!(
            self.table,
            fillEllipse(
                rect.x(),
                rect.y(),
                rect.width(),
                rect.height(),
                start,
                end,
                color.raw(),
            )
        );
    }

    fn fill_polygon(
        &self,
        points: &[(i32, i32)],
        color: Color,
        rule: PolygonFillRule,
    ) -> Result<(), GraphicsError> {
        let mut coords: heapless::Vec<c_int, { MAX_POLYGON_POINTS * 2 }> = heapless::Vec::new();
        for &(x, y) in points {
            coords
                .extend_from_slice(&[x, y])
                .map_err(|_| GraphicsError::TooManyPoints)?;
        }
        invoke!(
            self.table,
            fillPolygon(
                points.len() as c_int,
                coords.as_mut_ptr(),
                color.raw(),
                rule as u32,
            )
        )
        .ok_or(GraphicsError::Missing)
    }

    fn draw_text(&self, text: &str, x: i32, y: i32) -> Result<i32, GraphicsError> {
        invoke!(
            self.table,
            drawText(text.as_ptr().cast(), text.len(), sys::kUTF8Encoding, x, y)
        )
        .ok_or(GraphicsError::Missing)
    }

    fn new_bitmap(
        &self,
        width: i32,
        height: i32,
        background: Color,
    ) -> Result<Bitmap, GraphicsError> {
        Self::allocated(invoke!(self.table, newBitmap(width, height, background.raw())))
    }

    fn free_bitmap(&self, bitmap: Bitmap) {
        invoke!(self.table, freeBitmap(bitmap.as_ptr()));
    }

    fn load_bitmap(&self, path: &str) -> Result<Bitmap, GraphicsError> {
        let mut name = Name::new(path).ok_or(GraphicsError::InvalidText)?;
        let mut err = core::ptr::null();
        let bitmap =
            invoke!(self.table, loadBitmap(name.as_ptr(), &mut err)).ok_or(GraphicsError::Missing)?;
        Bitmap::from_ptr(bitmap).ok_or_else(|| load_failed("bitmap", path, err))
    }

    fn copy_bitmap(&self, bitmap: Bitmap) -> Result<Bitmap, GraphicsError> {
        Self::allocated(invoke!(self.table, copyBitmap(bitmap.as_ptr())))
    }

    fn clear_bitmap(&self, bitmap: Bitmap, background: Color) {
        invoke!(self.table, clearBitmap(bitmap.as_ptr(), background.raw()));
    }

    fn bitmap_info(&self, bitmap: Bitmap) -> BitmapInfo {
        let (mut width, mut height, mut row_bytes) = (0, 0, 0);
        let mut mask = core::ptr::null_mut();
        let mut data = core::ptr::null_mut();
        invoke!(
            self.table,
            getBitmapData(
                bitmap.as_ptr(),
                &mut width,
                &mut height,
                &mut row_bytes,
                &mut mask,
                &mut data,
            )
        );
        BitmapInfo {
            width,
            height,
            row_bytes,
            has_mask: !mask.is_null(),
        }
    }

    fn rotated_bitmap(
        &self,
        bitmap: Bitmap,
        degrees: f32,
        x_scale: f32,
        y_scale: f32,
    ) -> Result<Bitmap, GraphicsError> {
        let mut allocated = 0;
        Self::allocated(invoke!(
            self.table,
            rotatedBitmap(bitmap.as_ptr(), degrees, x_scale, y_scale, &mut allocated)
        ))
    }

    fn new_bitmap_table(
        &self,
        count: i32,
        width: i32,
        height: i32,
    ) -> Result<BitmapTable, GraphicsError> {
        Self::allocated(invoke!(self.table, newBitmapTable(count, width, height)))
    }

    fn free_bitmap_table(&self, table: BitmapTable) {
        invoke!(self.table, freeBitmapTable(table.as_ptr()));
    }

    fn load_bitmap_table(&self, path: &str) -> Result<BitmapTable, GraphicsError> {
        let mut name = Name::new(path).ok_or(GraphicsError::InvalidText)?;
        let mut err = core::ptr::null();
        let table = invoke!(self.table, loadBitmapTable(name.as_ptr(), &mut err))
            .ok_or(GraphicsError::Missing)?;
        BitmapTable::from_ptr(table).ok_or_else(|| load_failed("bitmap table", path, err))
    }

    fn table_bitmap(&self, table: BitmapTable, index: i32) -> Option<Bitmap> {
        Bitmap::from_ptr(invoke!(self.table, getTableBitmap(table.as_ptr(), index))?)
    }

    fn load_font(&self, path: &str) -> Result<Font, GraphicsError> {
        let mut name = Name::new(path).ok_or(GraphicsError::InvalidText)?;
        let mut err = core::ptr::null();
        let font =
            invoke!(self.table, loadFont(name.as_ptr(), &mut err)).ok_or(GraphicsError::Missing)?;
        Font::from_ptr(font).ok_or_else(|| load_failed("font", path, err))
    }

    fn text_width(&self, font: Option<Font>, text: &str, tracking: i32) -> i32 {
        invoke!(
            self.table,
            getTextWidth(
                ptr_or_null(font),
                text.as_ptr().cast(),
                text.len(),
                sys::kUTF8Encoding,
                tracking,
            )
        )
        .unwrap_or_default()
    }

    fn font_height(&self, font: Option<Font>) -> u8 {
        invoke!(self.table, getFontHeight(ptr_or_null(font))).unwrap_or_default()
    }

    fn with_frame(&self, f: &mut dyn FnMut(&mut [u8])) {
        let Some(frame) = invoke!(self.table, getFrame()) else {
            return;
        };
        if frame.is_null() {
            log::warn!("getFrame returned null");
            return;
        }
        // SAFETY: the working frame buffer is LCD_ROWS rows of LCD_ROWSIZE
        // bytes and is only touched from the game thread.
        let frame = unsafe { core::slice::from_raw_parts_mut(frame, LCD_FRAME_SIZE) };
        f(frame);
    }

    fn mark_updated_rows(&self, start: i32, end: i32) {
        invoke!(self.table, markUpdatedRows(start, end));
    }

    fn display(&self) {
        invoke!(self.table, display());
    }

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
    ) -> bool {
        invoke!(
            self.table,
            checkMaskCollision(
                a.as_ptr(),
                ax,
                ay,
                a_flip as u32,
                b.as_ptr(),
                bx,
                by,
                b_flip as u32,
                lcd_rect(rect),
            )
        )
        .is_some_and(|hit| hit != 0)
    }

    fn set_screen_clip_rect(&self, rect: Rect) {
        invoke!(
            self.table,
            setScreenClipRect(rect.x(), rect.y(), rect.width(), rect.height())
        );
    }
}

/// [`Video`] over `playdate_video`.
#[derive(Clone, Copy)]
pub struct DeviceVideo {
    table: &'static playdate_video,
}

impl DeviceVideo {
    pub(crate) fn new(table: &'static playdate_video) -> Self {
        Self { table }
    }

    fn report(&self, player: VideoPlayer, result: Option<c_int>) -> Result<(), GraphicsError> {
        match result {
            None => Err(GraphicsError::Missing),
            Some(0) => {
                if let Some(reason) = self.video_error(player) {
                    log::warn!("video: {}", reason);
                }
                Err(GraphicsError::Failed)
            }
            Some(_) => Ok(()),
        }
    }
}

impl Video for DeviceVideo {
    fn load_video(&self, path: &str) -> Result<VideoPlayer, GraphicsError> {
        let mut name = Name::new(path).ok_or(GraphicsError::InvalidText)?;
        let player = invoke!(self.table, loadVideo(name.as_ptr())).ok_or(GraphicsError::Missing)?;
        VideoPlayer::from_ptr(player).ok_or_else(|| {
            log::warn!("video {} failed to load", path);
            GraphicsError::Load
        })
    }

    fn free_video(&self, player: VideoPlayer) {
        invoke!(self.table, freePlayer(player.as_ptr()));
    }

    fn set_video_context(&self, player: VideoPlayer, target: Bitmap) -> Result<(), GraphicsError> {
        let result = invoke!(self.table, setContext(player.as_ptr(), target.as_ptr()));
        self.report(player, result)
    }

    fn use_screen_context(&self, player: VideoPlayer) {
        invoke!(self.table, useScreenContext(player.as_ptr()));
    }

    fn render_frame(&self, player: VideoPlayer, frame: i32) -> Result<(), GraphicsError> {
        let result = invoke!(self.table, renderFrame(player.as_ptr(), frame));
        self.report(player, result)
    }

    fn video_info(&self, player: VideoPlayer) -> VideoInfo {
        let mut info = VideoInfo::default();
        invoke!(
            self.table,
            getInfo(
                player.as_ptr(),
                &mut info.width,
                &mut info.height,
                &mut info.frame_rate,
                &mut info.frame_count,
                &mut info.current_frame,
            )
        );
        info
    }

    fn video_error(&self, player: VideoPlayer) -> Option<&str> {
        let reason = invoke!(self.table, getError(player.as_ptr()))?;
        // SAFETY: owned by the player, which outlives this borrow of `self`
        // until `free_video`.
        unsafe { borrow_str(reason) }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::RefCell;
    use core::ffi::c_void;
    use std::boxed::Box;
    use std::vec::Vec;

    std::thread_local! {
        static CALLS: RefCell<Vec<Vec<i32>>> = const { RefCell::new(Vec::new()) };
        static FRAME: RefCell<Vec<u8>> = RefCell::new(std::vec![0xff; LCD_FRAME_SIZE]);
    }

    const NOT_FOUND: &[u8] = b"no such file\0";

    unsafe extern "C" fn fill_rect(x: c_int, y: c_int, w: c_int, h: c_int, color: sys::LCDColor) {
        CALLS.with(|c| c.borrow_mut().push(std::vec![x, y, w, h, color as i32]));
    }

    unsafe extern "C" fn fill_polygon(
        n: c_int,
        coords: *mut c_int,
        _color: sys::LCDColor,
        rule: sys::LCDPolygonFillRule,
    ) {
        let mut call = unsafe { core::slice::from_raw_parts(coords, n as usize * 2) }.to_vec();
        call.push(rule as i32);
        CALLS.with(|c| c.borrow_mut().push(call));
    }

    unsafe extern "C" fn draw_text(
        text: *const c_void,
        len: usize,
        encoding: sys::PDStringEncoding,
        _x: c_int,
        _y: c_int,
    ) -> c_int {
        assert_eq!(encoding, sys::kUTF8Encoding);
        let text = unsafe { core::slice::from_raw_parts(text.cast::<u8>(), len) };
        core::str::from_utf8(text).unwrap().chars().count() as c_int * 8
    }

    unsafe extern "C" fn load_bitmap(
        _path: *const c_char,
        outerr: *mut *const c_char,
    ) -> *mut sys::LCDBitmap {
        unsafe { *outerr = NOT_FOUND.as_ptr().cast() };
        core::ptr::null_mut()
    }

    unsafe extern "C" fn get_frame() -> *mut u8 {
        FRAME.with(|f| f.borrow_mut().as_mut_ptr())
    }

    fn graphics() -> DeviceGraphics {
        // SAFETY: optional function pointers and one raw pointer; zero is
        // None and null.
        let mut table: playdate_graphics = unsafe { core::mem::zeroed() };
        table.fillRect = Some(fill_rect);
        table.fillPolygon = Some(fill_polygon);
        table.drawText = Some(draw_text);
        table.loadBitmap = Some(load_bitmap);
        table.getFrame = Some(get_frame);
        DeviceGraphics::new(Box::leak(Box::new(table)))
    }

    #[test]
    fn test_fill_rect_converts_rect() {
        graphics().fill_rect(Rect::new(10, 20, 30, 40), Color::WHITE);
        CALLS.with(|c| assert_eq!(c.borrow().last().unwrap(), &[10, 20, 30, 40, 1]));
    }

    #[test]
    fn test_fill_polygon() {
        let graphics = graphics();
        graphics
            .fill_polygon(&[(0, 0), (5, 0), (5, 5)], Color::BLACK, PolygonFillRule::EvenOdd)
            .unwrap();
        CALLS.with(|c| assert_eq!(c.borrow().last().unwrap(), &[0, 0, 5, 0, 5, 5, 1]));

        let many = [(0, 0); MAX_POLYGON_POINTS + 1];
        assert_eq!(
            graphics.fill_polygon(&many, Color::BLACK, PolygonFillRule::NonZero),
            Err(GraphicsError::TooManyPoints)
        );
    }

    #[test]
    fn test_draw_text_passes_utf8() {
        assert_eq!(graphics().draw_text("héllo", 0, 0), Ok(40));
    }

    #[test]
    fn test_load_failure() {
        let graphics = graphics();
        assert_eq!(graphics.load_bitmap("missing"), Err(GraphicsError::Load));
        assert_eq!(graphics.load_font("missing"), Err(GraphicsError::Missing));
        assert_eq!(graphics.load_bitmap("a\0b"), Err(GraphicsError::InvalidText));
    }

    #[test]
    fn test_with_frame() {
        graphics().with_frame(&mut |frame| {
            assert_eq!(frame.len(), LCD_FRAME_SIZE);
            frame[0] = 0;
        });
        FRAME.with(|f| assert_eq!(f.borrow()[..2], [0, 0xff]));
    }
}
