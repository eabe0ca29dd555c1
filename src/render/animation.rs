use crate::game::Direction;

/// Default walk-cycle length per direction row
pub const WALK_FRAMES: usize = 4;

/// Walk-cycle animation for a character sprite sheet.
///
/// The sheet has one row per [`Direction`] and `frames` columns. Frame 0 is
/// the standing pose.
#[derive(Debug, Clone)]
pub struct FrameAnimation {
    direction: Direction,
    frame: usize,
    frames: usize,
    /// Ticks each frame is held while moving
    frame_delay: u32,
    counter: u32,
}

impl FrameAnimation {
    pub fn new(frames: usize, frame_delay: u32) -> Self {
        Self {
            direction: Direction::Down,
            frame: 0,
            frames: frames.max(1),
            frame_delay: frame_delay.max(1),
            counter: 0,
        }
    }

    /// Switch to another direction's frame set, restarting the cycle
    pub fn on_direction_changed(&mut self, direction: Direction) {
        if self.direction != direction {
            self.direction = direction;
            self.frame = 0;
            self.counter = 0;
        }
    }

    /// Advance one tick. Idle characters hold the standing frame.
    pub fn tick(&mut self, moving: bool) {
        if !moving {
            self.frame = 0;
            self.counter = 0;
            return;
        }
        self.counter += 1;
        if self.counter >= self.frame_delay {
            self.counter = 0;
            self.frame = (self.frame + 1) % self.frames;
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    /// (column, row) of the current frame in the sprite sheet
    pub fn sprite_cell(&self) -> (usize, usize) {
        (self.frame, self.direction.sheet_row())
    }
}

impl Default for FrameAnimation {
    fn default() -> Self {
        Self::new(WALK_FRAMES, 8)
    }
}
