//! `playdate_graphics` and `playdate_video`.

use core::ffi::{c_char, c_int, c_void};

use crate::{
    LCDBitmap, LCDBitmapTable, LCDFont, LCDFontData, LCDFontGlyph, LCDFontPage, LCDRect,
    LCDVideoPlayer,
};

pub const LCD_COLUMNS: u32 = 400;
pub const LCD_ROWS: u32 = 240;
pub const LCD_ROWSIZE: u32 = 52;

/// A solid colour number or the address of an `LCDPattern`.
pub type LCDColor = usize;
pub type LCDPattern = [u8; 16];

pub type LCDSolidColor = u32;
pub const kColorBlack: LCDSolidColor = 0;
pub const kColorWhite: LCDSolidColor = 1;
pub const kColorClear: LCDSolidColor = 2;
pub const kColorXOR: LCDSolidColor = 3;

pub type LCDBitmapDrawMode = u32;
pub const kDrawModeCopy: LCDBitmapDrawMode = 0;
pub const kDrawModeWhiteTransparent: LCDBitmapDrawMode = 1;
pub const kDrawModeBlackTransparent: LCDBitmapDrawMode = 2;
pub const kDrawModeFillWhite: LCDBitmapDrawMode = 3;
pub const kDrawModeFillBlack: LCDBitmapDrawMode = 4;
pub const kDrawModeXOR: LCDBitmapDrawMode = 5;
pub const kDrawModeNXOR: LCDBitmapDrawMode = 6;
pub const kDrawModeInverted: LCDBitmapDrawMode = 7;

pub type LCDBitmapFlip = u32;
pub const kBitmapUnflipped: LCDBitmapFlip = 0;
pub const kBitmapFlippedX: LCDBitmapFlip = 1;
pub const kBitmapFlippedY: LCDBitmapFlip = 2;
pub const kBitmapFlippedXY: LCDBitmapFlip = 3;

pub type LCDLineCapStyle = u32;
pub const kLineCapStyleButt: LCDLineCapStyle = 0;
pub const kLineCapStyleSquare: LCDLineCapStyle = 1;
pub const kLineCapStyleRound: LCDLineCapStyle = 2;

pub type LCDPolygonFillRule = u32;
pub const kPolygonFillNonZero: LCDPolygonFillRule = 0;
pub const kPolygonFillEvenOdd: LCDPolygonFillRule = 1;

pub type PDStringEncoding = u32;
pub const kASCIIEncoding: PDStringEncoding = 0;
pub const kUTF8Encoding: PDStringEncoding = 1;
pub const k16BitLEEncoding: PDStringEncoding = 2;

#[repr(C)]
pub struct playdate_video {
    pub loadVideo: Option<unsafe extern "C" fn(path: *const c_char) -> *mut LCDVideoPlayer>,
    pub freePlayer: Option<unsafe extern "C" fn(p: *mut LCDVideoPlayer)>,
    pub setContext:
        Option<unsafe extern "C" fn(p: *mut LCDVideoPlayer, context: *mut LCDBitmap) -> c_int>,
    pub useScreenContext: Option<unsafe extern "C" fn(p: *mut LCDVideoPlayer)>,
    pub renderFrame: Option<unsafe extern "C" fn(p: *mut LCDVideoPlayer, n: c_int) -> c_int>,
    pub getError: Option<unsafe extern "C" fn(p: *mut LCDVideoPlayer) -> *const c_char>,
    pub getInfo: Option<
        unsafe extern "C" fn(
            p: *mut LCDVideoPlayer,
            out_width: *mut c_int,
            out_height: *mut c_int,
            out_frame_rate: *mut f32,
            out_frame_count: *mut c_int,
            out_current_frame: *mut c_int,
        ),
    >,
    pub getContext: Option<unsafe extern "C" fn(p: *mut LCDVideoPlayer) -> *mut LCDBitmap>,
}

#[repr(C)]
pub struct playdate_graphics {
    pub video: *const playdate_video,

    pub clear: Option<unsafe extern "C" fn(color: LCDColor)>,
    pub setBackgroundColor: Option<unsafe extern "C" fn(color: LCDSolidColor)>,
    pub setStencil: Option<unsafe extern "C" fn(stencil: *mut LCDBitmap)>,
    pub setDrawMode: Option<unsafe extern "C" fn(mode: LCDBitmapDrawMode)>,
    pub setDrawOffset: Option<unsafe extern "C" fn(dx: c_int, dy: c_int)>,
    pub setClipRect: Option<unsafe extern "C" fn(x: c_int, y: c_int, width: c_int, height: c_int)>,
    pub clearClipRect: Option<unsafe extern "C" fn()>,
    pub setLineCapStyle: Option<unsafe extern "C" fn(style: LCDLineCapStyle)>,
    pub setFont: Option<unsafe extern "C" fn(font: *mut LCDFont)>,
    pub setTextTracking: Option<unsafe extern "C" fn(tracking: c_int)>,
    pub pushContext: Option<unsafe extern "C" fn(target: *mut LCDBitmap)>,
    pub popContext: Option<unsafe extern "C" fn()>,

    pub drawBitmap:
        Option<unsafe extern "C" fn(bitmap: *mut LCDBitmap, x: c_int, y: c_int, flip: LCDBitmapFlip)>,
    pub tileBitmap: Option<
        unsafe extern "C" fn(
            bitmap: *mut LCDBitmap,
            x: c_int,
            y: c_int,
            width: c_int,
            height: c_int,
            flip: LCDBitmapFlip,
        ),
    >,
    pub drawLine: Option<
        unsafe extern "C" fn(x1: c_int, y1: c_int, x2: c_int, y2: c_int, width: c_int, color: LCDColor),
    >,
    pub fillTriangle: Option<
        unsafe extern "C" fn(
            x1: c_int,
            y1: c_int,
            x2: c_int,
            y2: c_int,
            x3: c_int,
            y3: c_int,
            color: LCDColor,
        ),
    >,
    pub drawRect: Option<
        unsafe extern "C" fn(x: c_int, y: c_int, width: c_int, height: c_int, color: LCDColor),
    >,
    pub fillRect: Option<
        unsafe extern "C" fn(x: c_int, y: c_int, width: c_int, height: c_int, color: LCDColor),
    >,
    pub drawEllipse: Option<
        unsafe extern "C" fn(
            x: c_int,
            y: c_int,
            width: c_int,
            height: c_int,
            line_width: c_int,
            start_angle: f32,
            end_angle: f32,
            color: LCDColor,
        ),
    >,
    pub fillEllipse: Option<
        unsafe extern "C" fn(
            x: c_int,
            y: c_int,
            width: c_int,
            height: c_int,
            start_angle: f32,
            end_angle: f32,
            color: LCDColor,
        ),
    >,
    pub drawScaledBitmap: Option<
        unsafe extern "C" fn(bitmap: *mut LCDBitmap, x: c_int, y: c_int, xscale: f32, yscale: f32),
    >,
    pub drawText: Option<
        unsafe extern "C" fn(
            text: *const c_void,
            len: usize,
            encoding: PDStringEncoding,
            x: c_int,
            y: c_int,
        ) -> c_int,
    >,

    pub newBitmap:
        Option<unsafe extern "C" fn(width: c_int, height: c_int, bgcolor: LCDColor) -> *mut LCDBitmap>,
    pub freeBitmap: Option<unsafe extern "C" fn(bitmap: *mut LCDBitmap)>,
    pub loadBitmap: Option<
        unsafe extern "C" fn(path: *const c_char, outerr: *mut *const c_char) -> *mut LCDBitmap,
    >,
    pub copyBitmap: Option<unsafe extern "C" fn(bitmap: *mut LCDBitmap) -> *mut LCDBitmap>,
    pub loadIntoBitmap: Option<
        unsafe extern "C" fn(path: *const c_char, bitmap: *mut LCDBitmap, outerr: *mut *const c_char),
    >,
    pub getBitmapData: Option<
        unsafe extern "C" fn(
            bitmap: *mut LCDBitmap,
            width: *mut c_int,
            height: *mut c_int,
            rowbytes: *mut c_int,
            mask: *mut *mut u8,
            data: *mut *mut u8,
        ),
    >,
    pub clearBitmap: Option<unsafe extern "C" fn(bitmap: *mut LCDBitmap, bgcolor: LCDColor)>,
    pub rotatedBitmap: Option<
        unsafe extern "C" fn(
            bitmap: *mut LCDBitmap,
            rotation: f32,
            xscale: f32,
            yscale: f32,
            alloced_size: *mut c_int,
        ) -> *mut LCDBitmap,
    >,

    pub newBitmapTable:
        Option<unsafe extern "C" fn(count: c_int, width: c_int, height: c_int) -> *mut LCDBitmapTable>,
    pub freeBitmapTable: Option<unsafe extern "C" fn(table: *mut LCDBitmapTable)>,
    pub loadBitmapTable: Option<
        unsafe extern "C" fn(path: *const c_char, outerr: *mut *const c_char) -> *mut LCDBitmapTable,
    >,
    pub loadIntoBitmapTable: Option<
        unsafe extern "C" fn(
            path: *const c_char,
            table: *mut LCDBitmapTable,
            outerr: *mut *const c_char,
        ),
    >,
    pub getTableBitmap:
        Option<unsafe extern "C" fn(table: *mut LCDBitmapTable, idx: c_int) -> *mut LCDBitmap>,

    pub loadFont:
        Option<unsafe extern "C" fn(path: *const c_char, out_err: *mut *const c_char) -> *mut LCDFont>,
    pub getFontPage: Option<unsafe extern "C" fn(font: *mut LCDFont, c: u32) -> *mut LCDFontPage>,
    pub getPageGlyph: Option<
        unsafe extern "C" fn(
            page: *mut LCDFontPage,
            c: u32,
            bitmap: *mut *mut LCDBitmap,
            advance: *mut c_int,
        ) -> *mut LCDFontGlyph,
    >,
    pub getGlyphKerning: Option<
        unsafe extern "C" fn(glyph: *mut LCDFontGlyph, glyphcode: u32, nextcode: u32) -> c_int,
    >,
    pub getTextWidth: Option<
        unsafe extern "C" fn(
            font: *mut LCDFont,
            text: *const c_void,
            len: usize,
            encoding: PDStringEncoding,
            tracking: c_int,
        ) -> c_int,
    >,

    pub getFrame: Option<unsafe extern "C" fn() -> *mut u8>,
    pub getDisplayFrame: Option<unsafe extern "C" fn() -> *mut u8>,
    /// Simulator only; null on device.
    pub getDebugBitmap: Option<unsafe extern "C" fn() -> *mut LCDBitmap>,
    pub copyFrameBufferBitmap: Option<unsafe extern "C" fn() -> *mut LCDBitmap>,
    pub markUpdatedRows: Option<unsafe extern "C" fn(start: c_int, end: c_int)>,
    pub display: Option<unsafe extern "C" fn()>,

    pub setColorToPattern: Option<
        unsafe extern "C" fn(color: *mut LCDColor, bitmap: *mut LCDBitmap, x: c_int, y: c_int),
    >,
    pub checkMaskCollision: Option<
        unsafe extern "C" fn(
            bitmap1: *mut LCDBitmap,
            x1: c_int,
            y1: c_int,
            flip1: LCDBitmapFlip,
            bitmap2: *mut LCDBitmap,
            x2: c_int,
            y2: c_int,
            flip2: LCDBitmapFlip,
            rect: LCDRect,
        ) -> c_int,
    >,

    pub setScreenClipRect:
        Option<unsafe extern "C" fn(x: c_int, y: c_int, width: c_int, height: c_int)>,

    pub fillPolygon: Option<
        unsafe extern "C" fn(
            n_points: c_int,
            coords: *mut c_int,
            color: LCDColor,
            fillrule: LCDPolygonFillRule,
        ),
    >,
    pub getFontHeight: Option<unsafe extern "C" fn(font: *mut LCDFont) -> u8>,

    pub getDisplayBufferBitmap: Option<unsafe extern "C" fn() -> *mut LCDBitmap>,
    pub drawRotatedBitmap: Option<
        unsafe extern "C" fn(
            bitmap: *mut LCDBitmap,
            x: c_int,
            y: c_int,
            rotation: f32,
            centerx: f32,
            centery: f32,
            xscale: f32,
            yscale: f32,
        ),
    >,
    pub setTextLeading: Option<unsafe extern "C" fn(line_height_adjustment: c_int)>,

    pub setBitmapMask:
        Option<unsafe extern "C" fn(bitmap: *mut LCDBitmap, mask: *mut LCDBitmap) -> c_int>,
    pub getBitmapMask: Option<unsafe extern "C" fn(bitmap: *mut LCDBitmap) -> *mut LCDBitmap>,

    pub setStencilImage: Option<unsafe extern "C" fn(stencil: *mut LCDBitmap, tile: c_int)>,

    pub makeFontFromData:
        Option<unsafe extern "C" fn(data: *mut LCDFontData, wide: c_int) -> *mut LCDFont>,
}
