use serde::{Deserialize, Serialize};

/// One of the four cardinal facings of a grid actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Down,
    Left,
    Right,
    Up,
}

impl Direction {
    /// Search order used by the host engine: down, left, right, up.
    pub const ALL: [Direction; 4] = [Direction::Down, Direction::Left, Direction::Right, Direction::Up];

    pub fn dx(self) -> i32 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Down | Direction::Up => 0,
        }
    }

    pub fn dy(self) -> i32 {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
            Direction::Left | Direction::Right => 0,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
        }
    }

    /// Quarter turn clockwise as seen on screen (down -> left -> up -> right).
    pub fn clockwise(self) -> Self {
        match self {
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
        }
    }

    /// Quarter turn counter-clockwise as seen on screen.
    pub fn counter_clockwise(self) -> Self {
        match self {
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Up,
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Rotate a local offset, authored for a down-facing actor, into the
    /// absolute frame of an actor facing `self`.
    ///
    /// Facing down is the identity. Facing left is one clockwise quarter turn,
    /// facing right one counter-clockwise quarter turn and facing up a half turn.
    pub fn rotate_offset(self, dx: i32, dy: i32) -> (i32, i32) {
        match self {
            Direction::Down => (dx, dy),
            Direction::Left => (-dy, dx),
            Direction::Right => (dy, -dx),
            Direction::Up => (-dx, -dy),
        }
    }

    /// Numpad-style code used by the host engine (2/4/6/8).
    pub fn numpad(self) -> u8 {
        match self {
            Direction::Down => 2,
            Direction::Left => 4,
            Direction::Right => 6,
            Direction::Up => 8,
        }
    }

    pub fn from_numpad(code: u8) -> Option<Self> {
        match code {
            2 => Some(Direction::Down),
            4 => Some(Direction::Left),
            6 => Some(Direction::Right),
            8 => Some(Direction::Up),
            _ => None,
        }
    }

    /// Dominant cardinal direction of a (dx, dy) vector, horizontal winning
    /// only when strictly larger. `None` for the zero vector.
    pub fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        if dx.abs() > dy.abs() {
            Some(if dx < 0 { Direction::Left } else { Direction::Right })
        } else if dy != 0 {
            Some(if dy < 0 { Direction::Up } else { Direction::Down })
        } else {
            None
        }
    }
}
