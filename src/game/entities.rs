use macroquad::math::IVec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionRect, CollisionWorld};
use crate::input::{InputFrame, Key};
use crate::render::animation::FrameAnimation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Direction {
    #[default]
    Down = 0,
    Left = 1,
    Up = 2,
    Right = 3,
    DownLeft = 4,
    DownRight = 5,
    UpLeft = 6,
    UpRight = 7,
}

impl Direction {
    /// Direction of a step with components in -1..=1
    pub fn from_axis(dx: i32, dy: i32) -> Option<Self> {
        match (dx.signum(), dy.signum()) {
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (0, -1) => Some(Direction::Up),
            (1, 0) => Some(Direction::Right),
            (-1, 1) => Some(Direction::DownLeft),
            (1, 1) => Some(Direction::DownRight),
            (-1, -1) => Some(Direction::UpLeft),
            (1, -1) => Some(Direction::UpRight),
            _ => None,
        }
    }

    /// Per-axis step sign. Diagonals are not normalized.
    pub fn axis(&self) -> IVec2 {
        match self {
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Up => IVec2::new(0, -1),
            Direction::Right => IVec2::new(1, 0),
            Direction::DownLeft => IVec2::new(-1, 1),
            Direction::DownRight => IVec2::new(1, 1),
            Direction::UpLeft => IVec2::new(-1, -1),
            Direction::UpRight => IVec2::new(1, -1),
        }
    }

    pub fn sheet_row(&self) -> usize {
        *self as usize
    }
}

/// Held direction keys for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveInput {
    pub fn from_frame(frame: &InputFrame) -> Self {
        Self {
            up: frame.down(Key::Up),
            down: frame.down(Key::Down),
            left: frame.down(Key::Left),
            right: frame.down(Key::Right),
        }
    }

    /// Opposite keys held together cancel out
    pub fn direction(&self) -> Option<Direction> {
        let dx = self.right as i32 - self.left as i32;
        let dy = self.down as i32 - self.up as i32;
        Direction::from_axis(dx, dy)
    }
}

/// Collision box near the feet, narrower than the sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hitbox {
    pub width: i32,
    pub height: i32,
    /// Vertical distance from the character's position to the box centre
    pub foot_offset: i32,
}

impl Hitbox {
    pub fn center(&self, position: IVec2) -> IVec2 {
        IVec2::new(position.x, position.y + self.foot_offset)
    }

    pub fn rect(&self, position: IVec2) -> CollisionRect {
        CollisionRect::centered(self.center(position), self.width, self.height)
    }

    pub fn collides(&self, world: &impl CollisionWorld, position: IVec2) -> bool {
        world.is_collision_at(self.center(position), self.width, self.height)
    }
}

/// How a movement attempt was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResolution {
    Full,
    /// Only the horizontal component applied (sliding along a vertical wall)
    SlideX,
    /// Only the vertical component applied (sliding along a horizontal wall)
    SlideY,
    Blocked,
}

impl MoveResolution {
    pub fn moved(&self) -> bool {
        !matches!(self, MoveResolution::Blocked)
    }
}

/// Try the full displacement, then each axis alone. Returns the new position.
pub fn resolve_move(
    world: &impl CollisionWorld,
    hitbox: &Hitbox,
    position: IVec2,
    delta: IVec2,
) -> (IVec2, MoveResolution) {
    let full = position + delta;
    if !hitbox.collides(world, full) {
        return (full, MoveResolution::Full);
    }

    if delta.x != 0 {
        let horizontal = IVec2::new(position.x + delta.x, position.y);
        if !hitbox.collides(world, horizontal) {
            return (horizontal, MoveResolution::SlideX);
        }
    }

    if delta.y != 0 {
        let vertical = IVec2::new(position.x, position.y + delta.y);
        if !hitbox.collides(world, vertical) {
            return (vertical, MoveResolution::SlideY);
        }
    }

    (position, MoveResolution::Blocked)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementState {
    Idle,
    Moving(Direction),
}

#[derive(Debug, Clone)]
pub struct Player {
    /// Map-pixel position; the screen position is derived from the camera
    pub position: IVec2,
    pub facing: Direction,
    pub state: MovementState,
    pub hitbox: Hitbox,
    /// Pixels per tick on each active axis
    pub step: i32,
    pub animation: FrameAnimation,
}

impl Player {
    pub fn new(position: IVec2, hitbox: Hitbox, step: i32, animation: FrameAnimation) -> Self {
        Self {
            position,
            facing: Direction::Down,
            state: MovementState::Idle,
            hitbox,
            step,
            animation,
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.state, MovementState::Moving(_))
    }

    /// One tick of movement against the world
    pub fn update(&mut self, input: MoveInput, world: &impl CollisionWorld) -> MoveResolution {
        let resolution = match input.direction() {
            Some(direction) => {
                if direction != self.facing {
                    self.facing = direction;
                    self.animation.on_direction_changed(direction);
                }
                let (next, resolution) = resolve_move(world, &self.hitbox, self.position, direction.axis() * self.step);
                self.position = next;
                self.state = if resolution.moved() {
                    MovementState::Moving(direction)
                } else {
                    MovementState::Idle
                };
                resolution
            }
            None => {
                self.state = MovementState::Idle;
                MoveResolution::Blocked
            }
        };
        self.animation.tick(self.is_moving());
        resolution
    }

    /// Stop without moving, e.g. while a dialogue is open
    pub fn idle(&mut self) {
        self.state = MovementState::Idle;
        self.animation.tick(false);
    }

    pub fn hitbox_rect(&self) -> CollisionRect {
        self.hitbox.rect(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::collision::box_collides;

    /// Minimal world: fixed rects, no scrolling
    struct Walls(Vec<CollisionRect>);

    impl CollisionWorld for Walls {
        fn screen_to_map(&self, screen: IVec2) -> IVec2 {
            screen
        }

        fn map_to_screen(&self, map: IVec2) -> IVec2 {
            map
        }

        fn is_collision_at(&self, map_point: IVec2, width: i32, height: i32) -> bool {
            box_collides(&self.0, map_point, width, height)
        }
    }

    fn hitbox() -> Hitbox {
        Hitbox { width: 40, height: 18, foot_offset: 0 }
    }

    fn player_at(x: i32, y: i32) -> Player {
        Player::new(IVec2::new(x, y), hitbox(), 10, FrameAnimation::new(4, 1))
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let input = MoveInput { up: true, down: true, left: false, right: true };
        assert_eq!(input.direction(), Some(Direction::Right));
        let input = MoveInput { up: true, down: true, left: true, right: true };
        assert_eq!(input.direction(), None);
        let input = MoveInput { up: true, down: false, left: true, right: false };
        assert_eq!(input.direction(), Some(Direction::UpLeft));
    }

    #[test]
    fn test_diagonal_is_not_normalized() {
        assert_eq!(Direction::DownRight.axis() * 4, IVec2::new(4, 4));
        assert_eq!(Direction::from_axis(-3, 2), Some(Direction::DownLeft));
    }

    #[test]
    fn test_full_move_when_clear() {
        let world = Walls(vec![]);
        let (pos, res) = resolve_move(&world, &hitbox(), IVec2::new(100, 100), IVec2::new(10, 10));
        assert_eq!(pos, IVec2::new(110, 110));
        assert_eq!(res, MoveResolution::Full);
    }

    #[test]
    fn test_slides_horizontally_along_floor() {
        // Wall just below the hitbox: blocks +y, leaves +x clear
        let world = Walls(vec![CollisionRect::new(0, 110, 1000, 50)]);
        let (pos, res) = resolve_move(&world, &hitbox(), IVec2::new(100, 100), IVec2::new(10, 10));
        assert_eq!(res, MoveResolution::SlideX);
        assert_eq!(pos, IVec2::new(110, 100));
    }

    #[test]
    fn test_slides_vertically_along_wall() {
        // Wall just right of the hitbox: blocks +x, leaves +y clear
        let world = Walls(vec![CollisionRect::new(121, 0, 50, 1000)]);
        let (pos, res) = resolve_move(&world, &hitbox(), IVec2::new(100, 100), IVec2::new(10, 10));
        assert_eq!(res, MoveResolution::SlideY);
        assert_eq!(pos, IVec2::new(100, 110));
    }

    #[test]
    fn test_blocked_in_corner() {
        let world = Walls(vec![
            CollisionRect::new(0, 110, 1000, 50),
            CollisionRect::new(121, 0, 50, 1000),
        ]);
        let (pos, res) = resolve_move(&world, &hitbox(), IVec2::new(100, 100), IVec2::new(10, 10));
        assert_eq!(res, MoveResolution::Blocked);
        assert_eq!(pos, IVec2::new(100, 100));
    }

    #[test]
    fn test_end_to_end_collision_scenario() {
        let world = Walls(vec![CollisionRect::new(480, 480, 96, 96)]);
        assert!(world.is_collision_at(IVec2::new(510, 500), 40, 18));
        assert!(!world.is_collision_at(IVec2::new(460, 500), 40, 18));

        // Walking right from (500, 500) into the rect is blocked on both axes
        let mut player = player_at(500, 500);
        let res = player.update(MoveInput { right: true, ..Default::default() }, &world);
        assert_eq!(res, MoveResolution::Blocked);
        assert_eq!(player.position, IVec2::new(500, 500));
        assert_eq!(player.state, MovementState::Idle);
    }

    #[test]
    fn test_player_state_and_facing() {
        let world = Walls(vec![]);
        let mut player = player_at(100, 100);

        player.update(MoveInput { left: true, ..Default::default() }, &world);
        assert_eq!(player.facing, Direction::Left);
        assert_eq!(player.state, MovementState::Moving(Direction::Left));
        assert_eq!(player.animation.direction(), Direction::Left);
        assert_eq!(player.position, IVec2::new(90, 100));

        player.update(MoveInput::default(), &world);
        assert_eq!(player.state, MovementState::Idle);
        // Facing is kept while idle
        assert_eq!(player.facing, Direction::Left);
    }

    #[test]
    fn test_foot_offset_moves_hitbox() {
        let hb = Hitbox { width: 40, height: 18, foot_offset: 30 };
        assert_eq!(hb.center(IVec2::new(100, 100)), IVec2::new(100, 130));
        assert_eq!(hb.rect(IVec2::new(100, 100)), CollisionRect::new(80, 121, 40, 18));
    }
}
