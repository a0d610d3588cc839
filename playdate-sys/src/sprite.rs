//! `playdate_sprite`: display list and collision world.
//!
//! Arrays returned by queries and collision checks are allocated with the
//! system `realloc` and must be freed by the caller.

use core::ffi::{c_int, c_void};

use crate::{LCDBitmap, LCDBitmapDrawMode, LCDBitmapFlip, LCDRect, LCDSprite, PDRect};

pub type SpriteCollisionResponseType = u32;
pub const kCollisionTypeSlide: SpriteCollisionResponseType = 0;
pub const kCollisionTypeFreeze: SpriteCollisionResponseType = 1;
pub const kCollisionTypeOverlap: SpriteCollisionResponseType = 2;
pub const kCollisionTypeBounce: SpriteCollisionResponseType = 3;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CollisionPoint {
    pub x: f32,
    pub y: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollisionVector {
    pub x: c_int,
    pub y: c_int,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct SpriteCollisionInfo {
    pub sprite: *mut LCDSprite,
    pub other: *mut LCDSprite,
    pub responseType: SpriteCollisionResponseType,
    pub overlaps: u8,
    pub ti: f32,
    pub move_: CollisionPoint,
    pub normal: CollisionVector,
    pub touch: CollisionPoint,
    pub spriteRect: PDRect,
    pub otherRect: PDRect,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct SpriteQueryInfo {
    pub sprite: *mut LCDSprite,
    pub ti1: f32,
    pub ti2: f32,
    pub entryPoint: CollisionPoint,
    pub exitPoint: CollisionPoint,
}

pub type LCDSpriteDrawFunction =
    unsafe extern "C" fn(sprite: *mut LCDSprite, bounds: PDRect, drawrect: PDRect);
pub type LCDSpriteUpdateFunction = unsafe extern "C" fn(sprite: *mut LCDSprite);
pub type LCDSpriteCollisionFilterProc =
    unsafe extern "C" fn(sprite: *mut LCDSprite, other: *mut LCDSprite) -> SpriteCollisionResponseType;

#[repr(C)]
pub struct playdate_sprite {
    pub setAlwaysRedraw: Option<unsafe extern "C" fn(flag: c_int)>,
    pub addDirtyRect: Option<unsafe extern "C" fn(dirty_rect: LCDRect)>,
    pub drawSprites: Option<unsafe extern "C" fn()>,
    pub updateAndDrawSprites: Option<unsafe extern "C" fn()>,

    pub newSprite: Option<unsafe extern "C" fn() -> *mut LCDSprite>,
    pub freeSprite: Option<unsafe extern "C" fn(sprite: *mut LCDSprite)>,
    pub copy: Option<unsafe extern "C" fn(sprite: *mut LCDSprite) -> *mut LCDSprite>,

    pub addSprite: Option<unsafe extern "C" fn(sprite: *mut LCDSprite)>,
    pub removeSprite: Option<unsafe extern "C" fn(sprite: *mut LCDSprite)>,
    pub removeSprites: Option<unsafe extern "C" fn(sprites: *mut *mut LCDSprite, count: c_int)>,
    pub removeAllSprites: Option<unsafe extern "C" fn()>,
    pub getSpriteCount: Option<unsafe extern "C" fn() -> c_int>,

    pub setBounds: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, bounds: PDRect)>,
    pub getBounds: Option<unsafe extern "C" fn(sprite: *mut LCDSprite) -> PDRect>,
    pub moveTo: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, x: f32, y: f32)>,
    pub moveBy: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, dx: f32, dy: f32)>,

    pub setImage: Option<
        unsafe extern "C" fn(sprite: *mut LCDSprite, image: *mut LCDBitmap, flip: LCDBitmapFlip),
    >,
    pub getImage: Option<unsafe extern "C" fn(sprite: *mut LCDSprite) -> *mut LCDBitmap>,
    pub setSize: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, width: f32, height: f32)>,
    pub setZIndex: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, z_index: i16)>,
    pub getZIndex: Option<unsafe extern "C" fn(sprite: *mut LCDSprite) -> i16>,

    pub setDrawMode: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, mode: LCDBitmapDrawMode)>,
    pub setImageFlip: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, flip: LCDBitmapFlip)>,
    pub getImageFlip: Option<unsafe extern "C" fn(sprite: *mut LCDSprite) -> LCDBitmapFlip>,
    pub setStencil: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, stencil: *mut LCDBitmap)>,

    pub setClipRect: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, clip_rect: LCDRect)>,
    pub clearClipRect: Option<unsafe extern "C" fn(sprite: *mut LCDSprite)>,
    pub setClipRectsInRange:
        Option<unsafe extern "C" fn(clip_rect: LCDRect, start_z: c_int, end_z: c_int)>,
    pub clearClipRectsInRange: Option<unsafe extern "C" fn(start_z: c_int, end_z: c_int)>,

    pub setUpdatesEnabled: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, flag: c_int)>,
    pub updatesEnabled: Option<unsafe extern "C" fn(sprite: *mut LCDSprite) -> c_int>,
    pub setCollisionsEnabled: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, flag: c_int)>,
    pub collisionsEnabled: Option<unsafe extern "C" fn(sprite: *mut LCDSprite) -> c_int>,
    pub setVisible: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, flag: c_int)>,
    pub isVisible: Option<unsafe extern "C" fn(sprite: *mut LCDSprite) -> c_int>,
    pub setOpaque: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, flag: c_int)>,
    pub markDirty: Option<unsafe extern "C" fn(sprite: *mut LCDSprite)>,

    pub setTag: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, tag: u8)>,
    pub getTag: Option<unsafe extern "C" fn(sprite: *mut LCDSprite) -> u8>,

    pub setIgnoresDrawOffset: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, flag: c_int)>,

    pub setUpdateFunction:
        Option<unsafe extern "C" fn(sprite: *mut LCDSprite, func: Option<LCDSpriteUpdateFunction>)>,
    pub setDrawFunction:
        Option<unsafe extern "C" fn(sprite: *mut LCDSprite, func: Option<LCDSpriteDrawFunction>)>,

    pub getPosition: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, x: *mut f32, y: *mut f32)>,

    pub resetCollisionWorld: Option<unsafe extern "C" fn()>,

    pub setCollideRect: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, collide_rect: PDRect)>,
    pub getCollideRect: Option<unsafe extern "C" fn(sprite: *mut LCDSprite) -> PDRect>,
    pub clearCollideRect: Option<unsafe extern "C" fn(sprite: *mut LCDSprite)>,

    pub setCollisionResponseFunction: Option<
        unsafe extern "C" fn(sprite: *mut LCDSprite, func: Option<LCDSpriteCollisionFilterProc>),
    >,
    pub checkCollisions: Option<
        unsafe extern "C" fn(
            sprite: *mut LCDSprite,
            goal_x: f32,
            goal_y: f32,
            actual_x: *mut f32,
            actual_y: *mut f32,
            len: *mut c_int,
        ) -> *mut SpriteCollisionInfo,
    >,
    pub moveWithCollisions: Option<
        unsafe extern "C" fn(
            sprite: *mut LCDSprite,
            goal_x: f32,
            goal_y: f32,
            actual_x: *mut f32,
            actual_y: *mut f32,
            len: *mut c_int,
        ) -> *mut SpriteCollisionInfo,
    >,
    pub querySpritesAtPoint:
        Option<unsafe extern "C" fn(x: f32, y: f32, len: *mut c_int) -> *mut *mut LCDSprite>,
    pub querySpritesInRect: Option<
        unsafe extern "C" fn(
            x: f32,
            y: f32,
            width: f32,
            height: f32,
            len: *mut c_int,
        ) -> *mut *mut LCDSprite,
    >,
    pub querySpritesAlongLine: Option<
        unsafe extern "C" fn(
            x1: f32,
            y1: f32,
            x2: f32,
            y2: f32,
            len: *mut c_int,
        ) -> *mut *mut LCDSprite,
    >,
    pub querySpriteInfoAlongLine: Option<
        unsafe extern "C" fn(
            x1: f32,
            y1: f32,
            x2: f32,
            y2: f32,
            len: *mut c_int,
        ) -> *mut SpriteQueryInfo,
    >,
    pub overlappingSprites:
        Option<unsafe extern "C" fn(sprite: *mut LCDSprite, len: *mut c_int) -> *mut *mut LCDSprite>,
    pub allOverlappingSprites: Option<unsafe extern "C" fn(len: *mut c_int) -> *mut *mut LCDSprite>,

    pub setStencilPattern: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, pattern: *mut u8)>,
    pub clearStencil: Option<unsafe extern "C" fn(sprite: *mut LCDSprite)>,

    pub setUserdata: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, userdata: *mut c_void)>,
    pub getUserdata: Option<unsafe extern "C" fn(sprite: *mut LCDSprite) -> *mut c_void>,

    pub setStencilImage:
        Option<unsafe extern "C" fn(sprite: *mut LCDSprite, stencil: *mut LCDBitmap, tile: c_int)>,

    pub setCenter: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, x: f32, y: f32)>,
    pub getCenter: Option<unsafe extern "C" fn(sprite: *mut LCDSprite, x: *mut f32, y: *mut f32)>,
}
