//! Sprite display list and collision world.

use crate::geometry::{PdRect, Point, Rect, Vector};
use crate::graphics::{BitmapFlip, DrawMode};
use crate::handle::{Bitmap, Sprite};

/// How a moving sprite reacts to a collision (`SpriteCollisionResponseType`).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CollisionResponseType {
    /// Stop along the normal, keep moving along the surface.
    #[default]
    Slide = 0,
    /// Stop at the point of contact.
    Freeze = 1,
    /// Pass through, but report the collision.
    Overlap = 2,
    /// Reflect off the surface.
    Bounce = 3,
}

impl CollisionResponseType {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Freeze,
            2 => Self::Overlap,
            3 => Self::Bounce,
            _ => Self::Slide,
        }
    }
}

/// One collision found by a move or a check (`SpriteCollisionInfo`).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CollisionInfo {
    pub sprite: Sprite,
    pub other: Sprite,
    pub response: CollisionResponseType,
    /// The sprites already overlapped before the move.
    pub overlaps: bool,
    /// Fraction of the move completed at contact, 0.0..=1.0.
    pub ti: f32,
    /// Difference between the goal and the resolved position.
    pub movement: Point,
    pub normal: Vector,
    /// Where the sprite touched `other`.
    pub touch: Point,
    pub sprite_rect: PdRect,
    pub other_rect: PdRect,
}

/// One sprite hit by a line query (`SpriteQueryInfo`).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueryInfo {
    pub sprite: Sprite,
    /// Line fraction where it enters the sprite.
    pub ti1: f32,
    /// Line fraction where it exits the sprite.
    pub ti2: f32,
    pub entry_point: Point,
    pub exit_point: Point,
}

/// Per-sprite callbacks.
///
/// Attach with [`Sprites::set_hooks`]. The table must outlive the sprite,
/// hence `'static`.
#[derive(Clone, Copy, Default)]
pub struct SpriteHooks {
    /// Run from `update_and_draw_sprites`.
    pub update: Option<fn(Sprite)>,
    /// Custom drawing, given the sprite bounds and the dirty rect.
    pub draw: Option<fn(Sprite, PdRect, PdRect)>,
    /// Decide the response when `sprite` collides with `other`.
    pub collision_response: Option<fn(Sprite, Sprite) -> CollisionResponseType>,
}

/// Error type for sprite operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpriteError {
    /// The firmware table lacks the entry point.
    Missing,
    /// The firmware could not allocate the sprite.
    OutOfMemory,
}

/// The `Sprite` table.
pub trait Sprites {
    fn new_sprite(&self) -> Result<Sprite, SpriteError>;

    fn free_sprite(&self, sprite: Sprite);

    fn copy_sprite(&self, sprite: Sprite) -> Result<Sprite, SpriteError>;

    /// Put the sprite on the display list.
    fn add_sprite(&self, sprite: Sprite);

    fn remove_sprite(&self, sprite: Sprite);

    fn remove_all_sprites(&self);

    fn sprite_count(&self) -> usize;

    fn draw_sprites(&self);

    /// Run update hooks, then draw.
    fn update_and_draw_sprites(&self);

    fn set_bounds(&self, sprite: Sprite, bounds: PdRect);

    fn bounds(&self, sprite: Sprite) -> PdRect;

    fn move_to(&self, sprite: Sprite, x: f32, y: f32);

    fn move_by(&self, sprite: Sprite, dx: f32, dy: f32);

    fn position(&self, sprite: Sprite) -> Point;

    fn set_size(&self, sprite: Sprite, width: f32, height: f32);

    /// Anchor as a fraction of the size; (0.5, 0.5) is the middle.
    fn set_center(&self, sprite: Sprite, x: f32, y: f32);

    fn set_z_index(&self, sprite: Sprite, z_index: i16);

    fn z_index(&self, sprite: Sprite) -> i16;

    fn set_image(&self, sprite: Sprite, image: Option<Bitmap>, flip: BitmapFlip);

    fn image(&self, sprite: Sprite) -> Option<Bitmap>;

    fn set_image_flip(&self, sprite: Sprite, flip: BitmapFlip);

    fn image_flip(&self, sprite: Sprite) -> BitmapFlip;

    fn set_draw_mode(&self, sprite: Sprite, mode: DrawMode);

    fn set_clip_rect(&self, sprite: Sprite, rect: Rect);

    fn clear_clip_rect(&self, sprite: Sprite);

    /// Clip every sprite whose z-index is within `start..=end`.
    fn set_clip_rects_in_range(&self, rect: Rect, start: i32, end: i32);

    fn clear_clip_rects_in_range(&self, start: i32, end: i32);

    fn set_updates_enabled(&self, sprite: Sprite, enabled: bool);

    fn updates_enabled(&self, sprite: Sprite) -> bool;

    fn set_visible(&self, sprite: Sprite, visible: bool);

    fn is_visible(&self, sprite: Sprite) -> bool;

    /// An opaque sprite hides everything below it, which skips redraws.
    fn set_opaque(&self, sprite: Sprite, opaque: bool);

    fn set_ignores_draw_offset(&self, sprite: Sprite, ignores: bool);

    fn mark_dirty(&self, sprite: Sprite);

    /// Force a redraw of everything inside `rect`.
    fn add_dirty_rect(&self, rect: Rect);

    fn set_tag(&self, sprite: Sprite, tag: u8);

    fn tag(&self, sprite: Sprite) -> u8;

    /// Replace the sprite's callbacks. `None` removes them all.
    fn set_hooks(&self, sprite: Sprite, hooks: Option<&'static SpriteHooks>);

    fn set_collisions_enabled(&self, sprite: Sprite, enabled: bool);

    fn collisions_enabled(&self, sprite: Sprite) -> bool;

    /// Collision box relative to the sprite's bounds.
    fn set_collide_rect(&self, sprite: Sprite, rect: PdRect);

    fn collide_rect(&self, sprite: Sprite) -> PdRect;

    fn clear_collide_rect(&self, sprite: Sprite);

    /// Re-index every sprite. Needed after bulk moves outside the API.
    fn reset_collision_world(&self);

    /// Report collisions a move to the goal would cause, without moving.
    /// Returns the resolved position.
    fn check_collisions(
        &self,
        sprite: Sprite,
        goal_x: f32,
        goal_y: f32,
        f: &mut dyn FnMut(&CollisionInfo),
    ) -> Point;

    /// Move towards the goal, stopping per each collision's response.
    /// Returns the resolved position.
    fn move_with_collisions(
        &self,
        sprite: Sprite,
        goal_x: f32,
        goal_y: f32,
        f: &mut dyn FnMut(&CollisionInfo),
    ) -> Point;

    fn query_at_point(&self, x: f32, y: f32, f: &mut dyn FnMut(Sprite));

    fn query_in_rect(&self, rect: PdRect, f: &mut dyn FnMut(Sprite));

    fn query_along_line(&self, x1: f32, y1: f32, x2: f32, y2: f32, f: &mut dyn FnMut(Sprite));

    fn query_info_along_line(
        &self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        f: &mut dyn FnMut(&QueryInfo),
    );

    /// Sprites whose collide rects overlap this one's.
    fn overlapping(&self, sprite: Sprite, f: &mut dyn FnMut(Sprite));

    fn all_overlapping(&self, f: &mut dyn FnMut(Sprite));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_from_raw() {
        assert_eq!(CollisionResponseType::from_raw(0), CollisionResponseType::Slide);
        assert_eq!(CollisionResponseType::from_raw(3), CollisionResponseType::Bounce);
        assert_eq!(CollisionResponseType::from_raw(9), CollisionResponseType::Slide);
    }

    #[test]
    fn test_hooks_default_empty() {
        let hooks = SpriteHooks::default();
        assert!(hooks.update.is_none());
        assert!(hooks.draw.is_none());
        assert!(hooks.collision_response.is_none());
    }
}
