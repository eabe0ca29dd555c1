//! Axis-aligned collision geometry and the world hit-test contract

use macroquad::math::IVec2;
use serde::{Deserialize, Serialize};

/// Impassable rectangle in map-pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl CollisionRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Box of the given size centred on `center`
    pub fn centered(center: IVec2, width: i32, height: i32) -> Self {
        Self {
            x: center.x - width / 2,
            y: center.y - height / 2,
            w: width,
            h: height,
        }
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Strict overlap: rectangles sharing only an edge do not overlap
    pub fn overlaps(&self, other: &CollisionRect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    pub fn contains(&self, point: IVec2) -> bool {
        point.x >= self.left() && point.x < self.right() && point.y >= self.top() && point.y < self.bottom()
    }

    pub fn center(&self) -> IVec2 {
        IVec2::new(self.x + self.w / 2, self.y + self.h / 2)
    }
}

/// True when a `width` x `height` box centred on `center` overlaps any rect
pub fn box_collides(rects: &[CollisionRect], center: IVec2, width: i32, height: i32) -> bool {
    let probe = CollisionRect::centered(center, width, height);
    rects.iter().any(|r| probe.overlaps(r))
}

/// Anything the player can walk around in.
///
/// Screen/map conversion uses the scroll offset of the current tick, so the
/// camera must be updated before these are called.
pub trait CollisionWorld {
    fn screen_to_map(&self, screen: IVec2) -> IVec2;

    fn map_to_screen(&self, map: IVec2) -> IVec2;

    /// Does a box of the given size centred on `map_point` hit any collision rect?
    fn is_collision_at(&self, map_point: IVec2, width: i32, height: i32) -> bool;
}
