use core::ffi::c_int;
use core::sync::atomic::{AtomicPtr, Ordering};

use ::playdate_sys as sys;
use playdate_core::geometry::{PdRect, Point, Rect, Vector};
use playdate_core::graphics::{BitmapFlip, DrawMode};
use playdate_core::handle::{Bitmap, Sprite};
use playdate_core::sprite::{
    CollisionInfo, CollisionResponseType, QueryInfo, SpriteError, SpriteHooks, Sprites,
};
use sys::{playdate_sprite, playdate_sys, LCDRect, LCDSprite, PDRect};

use crate::ffi::{flag, invoke, ptr_or_null, RawHandle};

/// Sprite table used by the callback trampolines to find a sprite's hooks.
static HOOK_TABLE: AtomicPtr<playdate_sprite> = AtomicPtr::new(core::ptr::null_mut());

fn hooks_of(sprite: *mut LCDSprite) -> Option<(Sprite, &'static SpriteHooks)> {
    // SAFETY: stored from a `&'static playdate_sprite` in `set_hooks`.
    let table = unsafe { HOOK_TABLE.load(Ordering::Acquire).as_ref() }?;
    // SAFETY: firmware entry point; `sprite` came from the firmware.
    let userdata = table.getUserdata.map(|get| unsafe { get(sprite) })?;
    // SAFETY: `set_hooks` is the only writer of sprite userdata and stores
    // a `&'static SpriteHooks`.
    let hooks = unsafe { userdata.cast::<SpriteHooks>().as_ref() }?;
    Some((Sprite::from_ptr(sprite)?, hooks))
}

unsafe extern "C" fn update_trampoline(sprite: *mut LCDSprite) {
    if let Some((sprite, SpriteHooks { update: Some(update), .. })) = hooks_of(sprite) {
        update(sprite);
    }
}

unsafe extern "C" fn draw_trampoline(sprite: *mut LCDSprite, bounds: PDRect, draw_rect: PDRect) {
    if let Some((sprite, SpriteHooks { draw: Some(draw), .. })) = hooks_of(sprite) {
        draw(sprite, to_rect(bounds), to_rect(draw_rect));
    }
}

unsafe extern "C" fn collision_trampoline(
    sprite: *mut LCDSprite,
    other: *mut LCDSprite,
) -> sys::SpriteCollisionResponseType {
    let response = match (hooks_of(sprite), Sprite::from_ptr(other)) {
        (Some((sprite, SpriteHooks { collision_response: Some(respond), .. })), Some(other)) => {
            respond(sprite, other)
        }
        _ => CollisionResponseType::default(),
    };
    response as u32
}

fn to_rect(rect: PDRect) -> PdRect {
    PdRect::new(rect.x, rect.y, rect.width, rect.height)
}

fn from_rect(rect: PdRect) -> PDRect {
    PDRect {
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
    }
}

fn lcd_rect(rect: Rect) -> LCDRect {
    LCDRect {
        left: rect.left,
        right: rect.right,
        top: rect.top,
        bottom: rect.bottom,
    }
}

fn collision_info(raw: &sys::SpriteCollisionInfo) -> Option<CollisionInfo> {
    Some(CollisionInfo {
        sprite: Sprite::from_ptr(raw.sprite)?,
        other: Sprite::from_ptr(raw.other)?,
        response: CollisionResponseType::from_raw(raw.responseType),
        overlaps: raw.overlaps != 0,
        ti: raw.ti,
        movement: Point::new(raw.move_.x, raw.move_.y),
        normal: Vector {
            x: raw.normal.x,
            y: raw.normal.y,
        },
        touch: Point::new(raw.touch.x, raw.touch.y),
        sprite_rect: to_rect(raw.spriteRect),
        other_rect: to_rect(raw.otherRect),
    })
}

fn query_info(raw: &sys::SpriteQueryInfo) -> Option<QueryInfo> {
    Some(QueryInfo {
        sprite: Sprite::from_ptr(raw.sprite)?,
        ti1: raw.ti1,
        ti2: raw.ti2,
        entry_point: Point::new(raw.entryPoint.x, raw.entryPoint.y),
        exit_point: Point::new(raw.exitPoint.x, raw.exitPoint.y),
    })
}

/// [`Sprites`] over `playdate_sprite`.
///
/// Query results are visited in place and handed back to the firmware's
/// allocator afterwards, so nothing here needs a heap.
#[derive(Clone, Copy)]
pub struct DeviceSprites {
    table: &'static playdate_sprite,
    system: &'static playdate_sys,
}

impl DeviceSprites {
    pub(crate) fn new(table: &'static playdate_sprite, system: &'static playdate_sys) -> Self {
        Self { table, system }
    }

    /// Visit `len` items of a firmware-allocated array, then free it.
    fn drain<T>(&self, items: Option<*mut T>, len: c_int, mut f: impl FnMut(&T)) {
        let Some(items) = items.filter(|items| !items.is_null()) else {
            return;
        };
        // SAFETY: the firmware returns `len` initialized items.
        let slice = unsafe { core::slice::from_raw_parts(items, len.max(0) as usize) };
        slice.iter().for_each(&mut f);
        invoke!(self.system, realloc(items.cast(), 0));
    }

    fn drain_sprites(
        &self,
        items: Option<*mut *mut LCDSprite>,
        len: c_int,
        f: &mut dyn FnMut(Sprite),
    ) {
        self.drain(items, len, |&ptr| {
            if let Some(sprite) = Sprite::from_ptr(ptr) {
                f(sprite);
            }
        });
    }
}

impl Sprites for DeviceSprites {
    fn new_sprite(&self) -> Result<Sprite, SpriteError> {
        let sprite = invoke!(self.table, newSprite()).ok_or(SpriteError::Missing)?;
        Sprite::from_ptr(sprite).ok_or(SpriteError::OutOfMemory)
    }

    fn free_sprite(&self, sprite: Sprite) {
        invoke!(self.table, freeSprite(sprite.as_ptr()));
    }

    fn copy_sprite(&self, sprite: Sprite) -> Result<Sprite, SpriteError> {
        let copy = invoke!(self.table, copy(sprite.as_ptr())).ok_or(SpriteError::Missing)?;
        Sprite::from_ptr(copy).ok_or(SpriteError::OutOfMemory)
    }

    fn add_sprite(&self, sprite: Sprite) {
        invoke!(self.table, addSprite(sprite.as_ptr()));
    }

    fn remove_sprite(&self, sprite: Sprite) {
        invoke!(self.table, removeSprite(sprite.as_ptr()));
    }

    fn remove_all_sprites(&self) {
        invoke!(self.table, removeAllSprites());
    }

    fn sprite_count(&self) -> usize {
        invoke!(self.table, getSpriteCount()).map_or(0, |n| n.max(0) as usize)
    }

    fn draw_sprites(&self) {
        invoke!(self.table, drawSprites());
    }

    fn update_and_draw_sprites(&self) {
        invoke!(self.table, updateAndDrawSprites());
    }

    fn set_bounds(&self, sprite: Sprite, bounds: PdRect) {
        invoke!(self.table, setBounds(sprite.as_ptr(), from_rect(bounds)));
    }

    fn bounds(&self, sprite: Sprite) -> PdRect {
        invoke!(self.table, getBounds(sprite.as_ptr())).map_or_else(PdRect::default, to_rect)
    }

    fn move_to(&self, sprite: Sprite, x: f32, y: f32) {
        invoke!(self.table, moveTo(sprite.as_ptr(), x, y));
    }

    fn move_by(&self, sprite: Sprite, dx: f32, dy: f32) {
        invoke!(self.table, moveBy(sprite.as_ptr(), dx, dy));
    }

    fn position(&self, sprite: Sprite) -> Point {
        let mut at = Point::default();
        invoke!(self.table, getPosition(sprite.as_ptr(), &mut at.x, &mut at.y));
        at
    }

    fn set_size(&self, sprite: Sprite, width: f32, height: f32) {
        invoke!(self.table, setSize(sprite.as_ptr(), width, height));
    }

    fn set_center(&self, sprite: Sprite, x: f32, y: f32) {
        invoke!(self.table, setCenter(sprite.as_ptr(), x, y));
    }

    fn set_z_index(&self, sprite: Sprite, z_index: i16) {
        invoke!(self.table, setZIndex(sprite.as_ptr(), z_index));
    }

    fn z_index(&self, sprite: Sprite) -> i16 {
        invoke!(self.table, getZIndex(sprite.as_ptr())).unwrap_or_default()
    }

    fn set_image(&self, sprite: Sprite, image: Option<Bitmap>, flip: BitmapFlip) {
        invoke!(self.table, setImage(sprite.as_ptr(), ptr_or_null(image), flip as u32));
    }

    fn image(&self, sprite: Sprite) -> Option<Bitmap> {
        Bitmap::from_ptr(invoke!(self.table, getImage(sprite.as_ptr()))?)
    }

    fn set_image_flip(&self, sprite: Sprite, flip: BitmapFlip) {
        invoke!(self.table, setImageFlip(sprite.as_ptr(), flip as u32));
    }

    fn image_flip(&self, sprite: Sprite) -> BitmapFlip {
        invoke!(self.table, getImageFlip(sprite.as_ptr()))
            .map_or_else(BitmapFlip::default, BitmapFlip::from_raw)
    }

    fn set_draw_mode(&self, sprite: Sprite, mode: DrawMode) {
        invoke!(self.table, setDrawMode(sprite.as_ptr(), mode as u32));
    }

    fn set_clip_rect(&self, sprite: Sprite, rect: Rect) {
        invoke!(self.table, setClipRect(sprite.as_ptr(), lcd_rect(rect)));
    }

    fn clear_clip_rect(&self, sprite: Sprite) {
        invoke!(self.table, clearClipRect(sprite.as_ptr()));
    }

    fn set_clip_rects_in_range(&self, rect: Rect, start: i32, end: i32) {
        invoke!(self.table, setClipRectsInRange(lcd_rect(rect), start, end));
    }

    fn clear_clip_rects_in_range(&self, start: i32, end: i32) {
        invoke!(self.table, clearClipRectsInRange(start, end));
    }

    fn set_updates_enabled(&self, sprite: Sprite, enabled: bool) {
        invoke!(self.table, setUpdatesEnabled(sprite.as_ptr(), flag(enabled)));
    }

    fn updates_enabled(&self, sprite: Sprite) -> bool {
        invoke!(self.table, updatesEnabled(sprite.as_ptr())).is_some_and(|v| v != 0)
    }

    fn set_visible(&self, sprite: Sprite, visible: bool) {
        invoke!(self.table, setVisible(sprite.as_ptr(), flag(visible)));
    }

    fn is_visible(&self, sprite: Sprite) -> bool {
        invoke!(self.table, isVisible(sprite.as_ptr())).is_some_and(|v| v != 0)
    }

    fn set_opaque(&self, sprite: Sprite, opaque: bool) {
        invoke!(self.table, setOpaque(sprite.as_ptr(), flag(opaque)));
    }

    fn set_ignores_draw_offset(&self, sprite: Sprite, ignores: bool) {
        invoke!(self.table, setIgnoresDrawOffset(sprite.as_ptr(), flag(ignores)));
    }

    fn mark_dirty(&self, sprite: Sprite) {
        invoke!(self.table, markDirty(sprite.as_ptr()));
    }

    fn add_dirty_rect(&self, rect: Rect) {
        invoke!(self.table, addDirtyRect(lcd_rect(rect)));
    }

    fn set_tag(&self, sprite: Sprite, tag: u8) {
        invoke!(self.table, setTag(sprite.as_ptr(), tag));
    }

    fn tag(&self, sprite: Sprite) -> u8 {
        invoke!(self.table, getTag(sprite.as_ptr())).unwrap_or_default()
    }

    fn set_hooks(&self, sprite: Sprite, hooks: Option<&'static SpriteHooks>) {
        HOOK_TABLE.store(core::ptr::from_ref(self.table).cast_mut(), Ordering::Release);
        let ptr = sprite.as_ptr();
        let userdata = hooks.map_or(core::ptr::null_mut(), |h| core::ptr::from_ref(h).cast_mut());
        invoke!(self.table, setUserdata(ptr, userdata.cast()));

        let hooks = hooks.copied().unwrap_or_default();
        let update = hooks.update.map(|_| update_trampoline as sys::LCDSpriteUpdateFunction);
        let draw = hooks.draw.map(|_| draw_trampoline as sys::LCDSpriteDrawFunction);
        let respond = hooks
            .collision_response
            .map(|_| collision_trampoline as sys::LCDSpriteCollisionFilterProc);
        invoke!(self.table, setUpdateFunction(ptr, update));
        invoke!(self.table, setDrawFunction(ptr, draw));
        invoke!(self.table, setCollisionResponseFunction(ptr, respond));
    }

    fn set_collisions_enabled(&self, sprite: Sprite, enabled: bool) {
        invoke!(self.table, setCollisionsEnabled(sprite.as_ptr(), flag(enabled)));
    }

    fn collisions_enabled(&self, sprite: Sprite) -> bool {
        invoke!(self.table, collisionsEnabled(sprite.as_ptr())).is_some_and(|v| v != 0)
    }

    fn set_collide_rect(&self, sprite: Sprite, rect: PdRect) {
        invoke!(self.table, setCollideRect(sprite.as_ptr(), from_rect(rect)));
    }

    fn collide_rect(&self, sprite: Sprite) -> PdRect {
        invoke!(self.table, getCollideRect(sprite.as_ptr())).map_or_else(PdRect::default, to_rect)
    }

    fn clear_collide_rect(&self, sprite: Sprite) {
        invoke!(self.table, clearCollideRect(sprite.as_ptr()));
    }

    fn reset_collision_world(&self) {
        invoke!(self.table, resetCollisionWorld());
    }

    fn check_collisions(
        &self,
        sprite: Sprite,
        goal_x: f32,
        goal_y: f32,
        f: &mut dyn FnMut(&CollisionInfo),
    ) -> Point {
        let (mut actual, mut len) = (Point::new(goal_x, goal_y), 0);
        let items = invoke!(
            self.table,
            checkCollisions(
                sprite.as_ptr(),
                goal_x,
                goal_y,
                &mut actual.x,
                &mut actual.y,
                &mut len,
            )
        );
        self.drain(items, len, |raw| {
            if let Some(info) = collision_info(raw) {
                f(&info);
            }
        });
        actual
    }

    fn move_with_collisions(
        &self,
        sprite: Sprite,
        goal_x: f32,
        goal_y: f32,
        f: &mut dyn FnMut(&CollisionInfo),
    ) -> Point {
        let (mut actual, mut len) = (Point::new(goal_x, goal_y), 0);
        let items = invoke!(
            self.table,
            moveWithCollisions(
                sprite.as_ptr(),
                goal_x,
                goal_y,
                &mut actual.x,
                &mut actual.y,
                &mut len,
            )
        );
        self.drain(items, len, |raw| {
            if let Some(info) = collision_info(raw) {
                f(&info);
            }
        });
        actual
    }

    fn query_at_point(&self, x: f32, y: f32, f: &mut dyn FnMut(Sprite)) {
        let mut len = 0;
        let items = invoke!(self.table, querySpritesAtPoint(x, y, &mut len));
        self.drain_sprites(items, len, f);
    }

    fn query_in_rect(&self, rect: PdRect, f: &mut dyn FnMut(Sprite)) {
        let mut len = 0;
        let items = invoke!(
            self.table,
            querySpritesInRect(rect.x, rect.y, rect.width, rect.height, &mut len)
        );
        self.drain_sprites(items, len, f);
    }

    fn query_along_line(&self, x1: f32, y1: f32, x2: f32, y2: f32, f: &mut dyn FnMut(Sprite)) {
        let mut len = 0;
        let items = invoke!(self.table, querySpritesAlongLine(x1, y1, x2, y2, &mut len));
        self.drain_sprites(items, len, f);
    }

    fn query_info_along_line(
        &self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        f: &mut dyn FnMut(&QueryInfo),
    ) {
        let mut len = 0;
        let items = invoke!(self.table, querySpriteInfoAlongLine(x1, y1, x2, y2, &mut len));
        self.drain(items, len, |raw| {
            if let Some(info) = query_info(raw) {
                f(&info);
            }
        });
    }

    fn overlapping(&self, sprite: Sprite, f: &mut dyn FnMut(Sprite)) {
        let mut len = 0;
        let items = invoke!(self.table, overlappingSprites(sprite.as_ptr(), &mut len));
        self.drain_sprites(items, len, f);
    }

    fn all_overlapping(&self, f: &mut dyn FnMut(Sprite)) {
        let mut len = 0;
        let items = invoke!(self.table, allOverlappingSprites(&mut len));
        self.drain_sprites(items, len, f);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::{Cell, RefCell};
    use core::ffi::c_void;
    use std::boxed::Box;
    use std::vec::Vec;

    std::thread_local! {
        static FREED: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
        static USERDATA: Cell<*mut c_void> = const { Cell::new(core::ptr::null_mut()) };
        static UPDATE_FN: Cell<Option<sys::LCDSpriteUpdateFunction>> = const { Cell::new(None) };
        static UPDATED: Cell<usize> = const { Cell::new(0) };
        static HITS: Cell<[*mut LCDSprite; 2]> =
            const { Cell::new([core::ptr::null_mut(); 2]) };
    }

    unsafe extern "C" fn realloc(ptr: *mut c_void, size: usize) -> *mut c_void {
        assert_eq!(size, 0);
        FREED.with(|f| f.borrow_mut().push(ptr as usize));
        core::ptr::null_mut()
    }

    unsafe extern "C" fn query_at_point(_x: f32, _y: f32, len: *mut c_int) -> *mut *mut LCDSprite {
        unsafe { *len = 2 };
        HITS.with(|h| {
            h.set([0x100 as *mut LCDSprite, 0x200 as *mut LCDSprite]);
            h.as_ptr().cast()
        })
    }

    unsafe extern "C" fn set_userdata(_sprite: *mut LCDSprite, userdata: *mut c_void) {
        USERDATA.with(|u| u.set(userdata));
    }

    unsafe extern "C" fn get_userdata(_sprite: *mut LCDSprite) -> *mut c_void {
        USERDATA.with(Cell::get)
    }

    unsafe extern "C" fn set_update_function(
        _sprite: *mut LCDSprite,
        func: Option<sys::LCDSpriteUpdateFunction>,
    ) {
        UPDATE_FN.with(|u| u.set(func));
    }

    fn on_update(sprite: Sprite) {
        assert_eq!(sprite.raw(), 0x300);
        UPDATED.with(|u| u.set(u.get() + 1));
    }

    static HOOKS: SpriteHooks = SpriteHooks {
        update: Some(on_update),
        draw: None,
        collision_response: None,
    };

    fn sprites() -> DeviceSprites {
        // SAFETY: every field is an optional function pointer; zero is None.
        let mut table: playdate_sprite = unsafe { core::mem::zeroed() };
        table.querySpritesAtPoint = Some(query_at_point);
        table.setUserdata = Some(set_userdata);
        table.getUserdata = Some(get_userdata);
        table.setUpdateFunction = Some(set_update_function);
        // SAFETY: as above.
        let mut system: playdate_sys = unsafe { core::mem::zeroed() };
        system.realloc = Some(realloc);
        DeviceSprites::new(Box::leak(Box::new(table)), Box::leak(Box::new(system)))
    }

    #[test]
    fn test_query_frees_result() {
        let mut found = Vec::new();
        sprites().query_at_point(1.0, 2.0, &mut |s| found.push(s.raw()));
        assert_eq!(found, [0x100, 0x200]);
        let array = HITS.with(|h| h.as_ptr() as usize);
        FREED.with(|f| assert_eq!(*f.borrow(), [array]));
    }

    #[test]
    fn test_hooks_reach_update() {
        let sprites = sprites();
        let sprite = Sprite::from_raw(0x300).unwrap();
        sprites.set_hooks(sprite, Some(&HOOKS));
        let update = UPDATE_FN.with(Cell::get).unwrap();
        unsafe { update(sprite.as_ptr()) };
        UPDATED.with(|u| assert_eq!(u.get(), 1));

        sprites.set_hooks(sprite, None);
        assert!(UPDATE_FN.with(Cell::get).is_none());
        assert!(USERDATA.with(Cell::get).is_null());
    }

    #[test]
    fn test_missing_query_is_empty() {
        let mut count = 0;
        sprites().all_overlapping(&mut |_| count += 1);
        assert_eq!(count, 0);
    }
}
