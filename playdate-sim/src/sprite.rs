//! Recording sprite table.
//!
//! Sprite properties and the display list are plain state. Collision moves
//! and queries do no geometry: they answer from scripted results and log
//! what was asked.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};

use playdate_core::geometry::{PdRect, Point, Rect};
use playdate_core::graphics::{BitmapFlip, DrawMode, LCD_COLUMNS, LCD_ROWS};
use playdate_core::handle::{Bitmap, Sprite};
use playdate_core::sprite::{CollisionInfo, QueryInfo, SpriteError, SpriteHooks, Sprites};

#[derive(Clone, Copy)]
struct SpriteState {
    bounds: PdRect,
    center: Point,
    z_index: i16,
    image: Option<Bitmap>,
    flip: BitmapFlip,
    mode: DrawMode,
    clip: Option<Rect>,
    updates: bool,
    visible: bool,
    opaque: bool,
    ignores_offset: bool,
    tag: u8,
    hooks: Option<&'static SpriteHooks>,
    collisions: bool,
    collide_rect: Option<PdRect>,
    listed: bool,
    /// Insertion order within the display list.
    order: u64,
}

impl Default for SpriteState {
    fn default() -> Self {
        Self {
            bounds: PdRect::default(),
            center: Point::new(0.5, 0.5),
            z_index: 0,
            image: None,
            flip: BitmapFlip::Unflipped,
            mode: DrawMode::Copy,
            clip: None,
            updates: true,
            visible: true,
            opaque: false,
            ignores_offset: false,
            tag: 0,
            hooks: None,
            collisions: true,
            collide_rect: None,
            listed: false,
            order: 0,
        }
    }
}

impl SpriteState {
    fn position(&self) -> Point {
        Point::new(
            self.bounds.x + self.bounds.width * self.center.x,
            self.bounds.y + self.bounds.height * self.center.y,
        )
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.bounds.x = x - self.bounds.width * self.center.x;
        self.bounds.y = y - self.bounds.height * self.center.y;
    }
}

/// A query made through [`Sprites`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpriteQuery {
    Point { x: f32, y: f32 },
    Rect(PdRect),
    Line { x1: f32, y1: f32, x2: f32, y2: f32 },
    Overlapping(Sprite),
    AllOverlapping,
}

/// A collision check or move: the sprite and its goal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionRequest {
    pub sprite: Sprite,
    pub goal: Point,
    /// `true` for `move_with_collisions`, `false` for a check.
    pub moved: bool,
}

struct Scripted {
    hits: Vec<CollisionInfo>,
    resolved: Point,
}

/// Host [`Sprites`].
pub struct SimSprites {
    sprites: RefCell<BTreeMap<Sprite, SpriteState>>,
    next_id: Cell<usize>,
    next_order: Cell<u64>,
    drawn: RefCell<Vec<Sprite>>,
    dirty: RefCell<Vec<Rect>>,
    collisions: RefCell<VecDeque<Scripted>>,
    requests: RefCell<Vec<CollisionRequest>>,
    found: RefCell<VecDeque<Vec<Sprite>>>,
    found_on_line: RefCell<VecDeque<Vec<QueryInfo>>>,
    queries: RefCell<Vec<SpriteQuery>>,
    world_resets: Cell<u32>,
}

impl Default for SimSprites {
    fn default() -> Self {
        Self {
            sprites: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
            next_order: Cell::new(0),
            drawn: RefCell::new(Vec::new()),
            dirty: RefCell::new(Vec::new()),
            collisions: RefCell::new(VecDeque::new()),
            requests: RefCell::new(Vec::new()),
            found: RefCell::new(VecDeque::new()),
            found_on_line: RefCell::new(VecDeque::new()),
            queries: RefCell::new(Vec::new()),
            world_resets: Cell::new(0),
        }
    }
}

impl SimSprites {
    /// Answer the next collision check or move with `hits`, ending at
    /// `resolved`. Unscripted requests reach their goal with no hits.
    pub fn script_collisions(&self, hits: Vec<CollisionInfo>, resolved: Point) {
        self.collisions
            .borrow_mut()
            .push_back(Scripted { hits, resolved });
    }

    /// Answer the next point, rect, line or overlap query with `sprites`.
    pub fn script_query(&self, sprites: Vec<Sprite>) {
        self.found.borrow_mut().push_back(sprites);
    }

    /// Answer the next `query_info_along_line` with `hits`.
    pub fn script_line_query(&self, hits: Vec<QueryInfo>) {
        self.found_on_line.borrow_mut().push_back(hits);
    }

    /// Collision checks and moves, oldest first.
    pub fn collision_requests(&self) -> Vec<CollisionRequest> {
        self.requests.borrow().clone()
    }

    pub fn queries(&self) -> Vec<SpriteQuery> {
        self.queries.borrow().clone()
    }

    pub fn world_resets(&self) -> u32 {
        self.world_resets.get()
    }

    /// Sprites drawn by the last draw pass, back to front.
    pub fn drawn(&self) -> Vec<Sprite> {
        self.drawn.borrow().clone()
    }

    /// Drain the rects marked dirty since the last call.
    pub fn dirty_rects(&self) -> Vec<Rect> {
        self.dirty.take()
    }

    pub fn clip_rect(&self, sprite: Sprite) -> Option<Rect> {
        self.get(sprite, |s| s.clip).flatten()
    }

    pub fn is_opaque(&self, sprite: Sprite) -> bool {
        self.get(sprite, |s| s.opaque).unwrap_or(false)
    }

    pub fn ignores_draw_offset(&self, sprite: Sprite) -> bool {
        self.get(sprite, |s| s.ignores_offset).unwrap_or(false)
    }

    pub fn draw_mode(&self, sprite: Sprite) -> Option<DrawMode> {
        self.get(sprite, |s| s.mode)
    }

    fn get<T>(&self, sprite: Sprite, f: impl FnOnce(&SpriteState) -> T) -> Option<T> {
        self.sprites.borrow().get(&sprite).map(f)
    }

    fn update(&self, sprite: Sprite, f: impl FnOnce(&mut SpriteState)) {
        if let Some(state) = self.sprites.borrow_mut().get_mut(&sprite) {
            f(state);
        } else {
            log::warn!("unknown sprite {:#x}", sprite.raw());
        }
    }

    fn insert(&self, state: SpriteState) -> Result<Sprite, SpriteError> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let sprite = Sprite::from_raw(id).ok_or(SpriteError::OutOfMemory)?;
        self.sprites.borrow_mut().insert(sprite, state);
        Ok(sprite)
    }

    /// Listed sprites sorted back to front.
    fn display_list(&self) -> Vec<(Sprite, SpriteState)> {
        let mut list: Vec<_> = self
            .sprites
            .borrow()
            .iter()
            .filter(|(_, s)| s.listed)
            .map(|(id, s)| (*id, *s))
            .collect();
        list.sort_by_key(|(_, s)| (s.z_index, s.order));
        list
    }

    fn collide(
        &self,
        sprite: Sprite,
        goal: Point,
        moved: bool,
        f: &mut dyn FnMut(&CollisionInfo),
    ) -> Point {
        self.requests.borrow_mut().push(CollisionRequest {
            sprite,
            goal,
            moved,
        });
        let Some(scripted) = self.collisions.borrow_mut().pop_front() else {
            return goal;
        };
        for hit in &scripted.hits {
            f(hit);
        }
        scripted.resolved
    }

    fn answer(&self, query: SpriteQuery, f: &mut dyn FnMut(Sprite)) {
        self.queries.borrow_mut().push(query);
        let found = self.found.borrow_mut().pop_front().unwrap_or_default();
        for sprite in found {
            f(sprite);
        }
    }
}

impl Sprites for SimSprites {
    fn new_sprite(&self) -> Result<Sprite, SpriteError> {
        self.insert(SpriteState::default())
    }

    fn free_sprite(&self, sprite: Sprite) {
        self.sprites.borrow_mut().remove(&sprite);
    }

    fn copy_sprite(&self, sprite: Sprite) -> Result<Sprite, SpriteError> {
        let state = self.get(sprite, |s| *s).ok_or(SpriteError::OutOfMemory)?;
        self.insert(SpriteState {
            listed: false,
            ..state
        })
    }

    fn add_sprite(&self, sprite: Sprite) {
        let order = self.next_order.get();
        self.next_order.set(order + 1);
        self.update(sprite, |s| {
            if !s.listed {
                s.listed = true;
                s.order = order;
            }
        });
    }

    fn remove_sprite(&self, sprite: Sprite) {
        self.update(sprite, |s| s.listed = false);
    }

    fn remove_all_sprites(&self) {
        for state in self.sprites.borrow_mut().values_mut() {
            state.listed = false;
        }
    }

    fn sprite_count(&self) -> usize {
        self.sprites.borrow().values().filter(|s| s.listed).count()
    }

    fn draw_sprites(&self) {
        let screen = PdRect::new(0.0, 0.0, LCD_COLUMNS as f32, LCD_ROWS as f32);
        let mut drawn = Vec::new();
        for (sprite, state) in self.display_list() {
            if !state.visible {
                continue;
            }
            if let Some(draw) = state.hooks.and_then(|h| h.draw) {
                draw(sprite, state.bounds, screen);
            }
            drawn.push(sprite);
        }
        *self.drawn.borrow_mut() = drawn;
    }

    fn update_and_draw_sprites(&self) {
        for (sprite, state) in self.display_list() {
            if !state.updates {
                continue;
            }
            if let Some(update) = state.hooks.and_then(|h| h.update) {
                update(sprite);
            }
        }
        self.draw_sprites();
    }

    fn set_bounds(&self, sprite: Sprite, bounds: PdRect) {
        self.update(sprite, |s| s.bounds = bounds);
    }

    fn bounds(&self, sprite: Sprite) -> PdRect {
        self.get(sprite, |s| s.bounds).unwrap_or_default()
    }

    fn move_to(&self, sprite: Sprite, x: f32, y: f32) {
        self.update(sprite, |s| s.move_to(x, y));
    }

    fn move_by(&self, sprite: Sprite, dx: f32, dy: f32) {
        self.update(sprite, |s| {
            s.bounds.x += dx;
            s.bounds.y += dy;
        });
    }

    fn position(&self, sprite: Sprite) -> Point {
        self.get(sprite, SpriteState::position).unwrap_or_default()
    }

    fn set_size(&self, sprite: Sprite, width: f32, height: f32) {
        self.update(sprite, |s| {
            let at = s.position();
            s.bounds.width = width;
            s.bounds.height = height;
            s.move_to(at.x, at.y);
        });
    }

    fn set_center(&self, sprite: Sprite, x: f32, y: f32) {
        self.update(sprite, |s| {
            let at = s.position();
            s.center = Point::new(x, y);
            s.move_to(at.x, at.y);
        });
    }

    fn set_z_index(&self, sprite: Sprite, z_index: i16) {
        self.update(sprite, |s| s.z_index = z_index);
    }

    fn z_index(&self, sprite: Sprite) -> i16 {
        self.get(sprite, |s| s.z_index).unwrap_or(0)
    }

    fn set_image(&self, sprite: Sprite, image: Option<Bitmap>, flip: BitmapFlip) {
        self.update(sprite, |s| {
            s.image = image;
            s.flip = flip;
        });
    }

    fn image(&self, sprite: Sprite) -> Option<Bitmap> {
        self.get(sprite, |s| s.image).flatten()
    }

    fn set_image_flip(&self, sprite: Sprite, flip: BitmapFlip) {
        self.update(sprite, |s| s.flip = flip);
    }

    fn image_flip(&self, sprite: Sprite) -> BitmapFlip {
        self.get(sprite, |s| s.flip).unwrap_or_default()
    }

    fn set_draw_mode(&self, sprite: Sprite, mode: DrawMode) {
        self.update(sprite, |s| s.mode = mode);
    }

    fn set_clip_rect(&self, sprite: Sprite, rect: Rect) {
        self.update(sprite, |s| s.clip = Some(rect));
    }

    fn clear_clip_rect(&self, sprite: Sprite) {
        self.update(sprite, |s| s.clip = None);
    }

    fn set_clip_rects_in_range(&self, rect: Rect, start: i32, end: i32) {
        for state in self.sprites.borrow_mut().values_mut() {
            if (start..=end).contains(&i32::from(state.z_index)) {
                state.clip = Some(rect);
            }
        }
    }

    fn clear_clip_rects_in_range(&self, start: i32, end: i32) {
        for state in self.sprites.borrow_mut().values_mut() {
            if (start..=end).contains(&i32::from(state.z_index)) {
                state.clip = None;
            }
        }
    }

    fn set_updates_enabled(&self, sprite: Sprite, enabled: bool) {
        self.update(sprite, |s| s.updates = enabled);
    }

    fn updates_enabled(&self, sprite: Sprite) -> bool {
        self.get(sprite, |s| s.updates).unwrap_or(false)
    }

    fn set_visible(&self, sprite: Sprite, visible: bool) {
        self.update(sprite, |s| s.visible = visible);
    }

    fn is_visible(&self, sprite: Sprite) -> bool {
        self.get(sprite, |s| s.visible).unwrap_or(false)
    }

    fn set_opaque(&self, sprite: Sprite, opaque: bool) {
        self.update(sprite, |s| s.opaque = opaque);
    }

    fn set_ignores_draw_offset(&self, sprite: Sprite, ignores: bool) {
        self.update(sprite, |s| s.ignores_offset = ignores);
    }

    fn mark_dirty(&self, sprite: Sprite) {
        if let Some(b) = self.get(sprite, |s| s.bounds) {
            let (w, h) = (b.width.ceil() as i32, b.height.ceil() as i32);
            self.dirty.borrow_mut().push(Rect::new(b.x as i32, b.y as i32, w, h));
        }
    }

    fn add_dirty_rect(&self, rect: Rect) {
        self.dirty.borrow_mut().push(rect);
    }

    fn set_tag(&self, sprite: Sprite, tag: u8) {
        self.update(sprite, |s| s.tag = tag);
    }

    fn tag(&self, sprite: Sprite) -> u8 {
        self.get(sprite, |s| s.tag).unwrap_or(0)
    }

    fn set_hooks(&self, sprite: Sprite, hooks: Option<&'static SpriteHooks>) {
        self.update(sprite, |s| s.hooks = hooks);
    }

    fn set_collisions_enabled(&self, sprite: Sprite, enabled: bool) {
        self.update(sprite, |s| s.collisions = enabled);
    }

    fn collisions_enabled(&self, sprite: Sprite) -> bool {
        self.get(sprite, |s| s.collisions).unwrap_or(false)
    }

    fn set_collide_rect(&self, sprite: Sprite, rect: PdRect) {
        self.update(sprite, |s| s.collide_rect = Some(rect));
    }

    fn collide_rect(&self, sprite: Sprite) -> PdRect {
        self.get(sprite, |s| s.collide_rect).flatten().unwrap_or_default()
    }

    fn clear_collide_rect(&self, sprite: Sprite) {
        self.update(sprite, |s| s.collide_rect = None);
    }

    fn reset_collision_world(&self) {
        self.world_resets.set(self.world_resets.get() + 1);
    }

    fn check_collisions(
        &self,
        sprite: Sprite,
        goal_x: f32,
        goal_y: f32,
        f: &mut dyn FnMut(&CollisionInfo),
    ) -> Point {
        self.collide(sprite, Point::new(goal_x, goal_y), false, f)
    }

    fn move_with_collisions(
        &self,
        sprite: Sprite,
        goal_x: f32,
        goal_y: f32,
        f: &mut dyn FnMut(&CollisionInfo),
    ) -> Point {
        let resolved = self.collide(sprite, Point::new(goal_x, goal_y), true, f);
        self.move_to(sprite, resolved.x, resolved.y);
        resolved
    }

    fn query_at_point(&self, x: f32, y: f32, f: &mut dyn FnMut(Sprite)) {
        self.answer(SpriteQuery::Point { x, y }, f);
    }

    fn query_in_rect(&self, rect: PdRect, f: &mut dyn FnMut(Sprite)) {
        self.answer(SpriteQuery::Rect(rect), f);
    }

    fn query_along_line(&self, x1: f32, y1: f32, x2: f32, y2: f32, f: &mut dyn FnMut(Sprite)) {
        self.answer(SpriteQuery::Line { x1, y1, x2, y2 }, f);
    }

    fn query_info_along_line(
        &self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        f: &mut dyn FnMut(&QueryInfo),
    ) {
        self.queries
            .borrow_mut()
            .push(SpriteQuery::Line { x1, y1, x2, y2 });
        let hits = self.found_on_line.borrow_mut().pop_front().unwrap_or_default();
        for hit in &hits {
            f(hit);
        }
    }

    fn overlapping(&self, sprite: Sprite, f: &mut dyn FnMut(Sprite)) {
        self.answer(SpriteQuery::Overlapping(sprite), f);
    }

    fn all_overlapping(&self, f: &mut dyn FnMut(Sprite)) {
        self.answer(SpriteQuery::AllOverlapping, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playdate_core::geometry::Vector;
    use playdate_core::sprite::CollisionResponseType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_position_follows_center() {
        let sprites = SimSprites::default();
        let s = sprites.new_sprite().unwrap();
        sprites.set_size(s, 10.0, 20.0);
        sprites.move_to(s, 100.0, 50.0);
        assert_eq!(sprites.bounds(s), PdRect::new(95.0, 40.0, 10.0, 20.0));

        sprites.set_center(s, 0.0, 0.0);
        assert_eq!(sprites.position(s), Point::new(100.0, 50.0));
        sprites.move_by(s, 1.0, 2.0);
        assert_eq!(sprites.bounds(s), PdRect::new(101.0, 52.0, 10.0, 20.0));
    }

    #[test]
    fn test_display_list() {
        let sprites = SimSprites::default();
        let a = sprites.new_sprite().unwrap();
        let b = sprites.new_sprite().unwrap();
        let c = sprites.new_sprite().unwrap();
        for s in [a, b, c] {
            sprites.add_sprite(s);
        }
        sprites.set_z_index(a, 5);
        sprites.set_visible(c, false);
        assert_eq!(sprites.sprite_count(), 3);

        sprites.draw_sprites();
        assert_eq!(sprites.drawn(), [b, a]);

        sprites.remove_sprite(b);
        let copy = sprites.copy_sprite(a).unwrap();
        assert_eq!(sprites.z_index(copy), 5);
        assert_eq!(sprites.sprite_count(), 2);

        sprites.remove_all_sprites();
        assert_eq!(sprites.sprite_count(), 0);
    }

    static UPDATES: AtomicUsize = AtomicUsize::new(0);

    fn count_update(_: Sprite) {
        UPDATES.fetch_add(1, Ordering::Relaxed);
    }

    static COUNTING: SpriteHooks = SpriteHooks {
        update: Some(count_update),
        draw: None,
        collision_response: None,
    };

    #[test]
    fn test_update_hooks() {
        let sprites = SimSprites::default();
        let a = sprites.new_sprite().unwrap();
        let b = sprites.new_sprite().unwrap();
        sprites.add_sprite(a);
        sprites.add_sprite(b);
        sprites.set_hooks(a, Some(&COUNTING));
        sprites.set_hooks(b, Some(&COUNTING));
        sprites.set_updates_enabled(b, false);

        let before = UPDATES.load(Ordering::Relaxed);
        sprites.update_and_draw_sprites();
        assert_eq!(UPDATES.load(Ordering::Relaxed) - before, 1);
        assert_eq!(sprites.drawn(), [a, b]);
    }

    #[test]
    fn test_scripted_move() {
        let sprites = SimSprites::default();
        let mover = sprites.new_sprite().unwrap();
        let wall = sprites.new_sprite().unwrap();
        let hit = CollisionInfo {
            sprite: mover,
            other: wall,
            response: CollisionResponseType::Slide,
            overlaps: false,
            ti: 0.5,
            movement: Point::new(-10.0, 0.0),
            normal: Vector { x: -1, y: 0 },
            touch: Point::new(15.0, 10.0),
            sprite_rect: PdRect::new(0.0, 0.0, 10.0, 10.0),
            other_rect: PdRect::new(20.0, 0.0, 10.0, 100.0),
        };
        sprites.script_collisions(vec![hit], Point::new(15.0, 15.0));

        let mut hits = Vec::new();
        let at = sprites.move_with_collisions(mover, 25.0, 15.0, &mut |c| hits.push(*c));
        assert_eq!(at, Point::new(15.0, 15.0));
        assert_eq!(hits, [hit]);
        assert_eq!(sprites.position(mover), at);

        // Nothing scripted: the goal is reached and nothing is reported.
        let at = sprites.check_collisions(mover, 40.0, 15.0, &mut |_| panic!("no hits"));
        assert_eq!(at, Point::new(40.0, 15.0));
        assert_eq!(sprites.position(mover), Point::new(15.0, 15.0));

        let requests = sprites.collision_requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].moved);
        assert_eq!(requests[1].goal, Point::new(40.0, 15.0));
        assert!(!requests[1].moved);
    }

    #[test]
    fn test_scripted_queries() {
        let sprites = SimSprites::default();
        let a = sprites.new_sprite().unwrap();
        let b = sprites.new_sprite().unwrap();
        sprites.script_query(vec![a, b]);
        sprites.script_line_query(vec![QueryInfo {
            sprite: b,
            ti1: 0.5,
            ti2: 0.6,
            entry_point: Point::new(50.0, 2.0),
            exit_point: Point::new(60.0, 2.0),
        }]);

        let mut found = Vec::new();
        sprites.query_at_point(7.0, 7.0, &mut |s| found.push(s));
        assert_eq!(found, [a, b]);

        found.clear();
        sprites.overlapping(a, &mut |s| found.push(s));
        assert!(found.is_empty());

        let mut infos = Vec::new();
        sprites.query_info_along_line(0.0, 2.0, 100.0, 2.0, &mut |q| infos.push(*q));
        assert_eq!(infos[0].sprite, b);

        assert_eq!(
            sprites.queries(),
            [
                SpriteQuery::Point { x: 7.0, y: 7.0 },
                SpriteQuery::Overlapping(a),
                SpriteQuery::Line {
                    x1: 0.0,
                    y1: 2.0,
                    x2: 100.0,
                    y2: 2.0
                },
            ]
        );
        sprites.reset_collision_world();
        assert_eq!(sprites.world_resets(), 1);
    }

    #[test]
    fn test_clip_rects_in_range() {
        let sprites = SimSprites::default();
        let low = sprites.new_sprite().unwrap();
        let high = sprites.new_sprite().unwrap();
        sprites.set_z_index(high, 10);

        let clip = Rect::new(0, 0, 50, 50);
        sprites.set_clip_rects_in_range(clip, -5, 5);
        assert_eq!(sprites.clip_rect(low), Some(clip));
        assert_eq!(sprites.clip_rect(high), None);

        sprites.clear_clip_rects_in_range(0, 0);
        assert_eq!(sprites.clip_rect(low), None);
    }
}
