use crate::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position on the tile grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    pub fn new(x: i32, y: i32) -> Self {
        Tile { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Tile::new(self.x + dx, self.y + dy)
    }

    /// Neighbour in `direction`, without any map wrap correction
    pub fn step(self, direction: Direction) -> Self {
        self.offset(direction.dx(), direction.dy())
    }
}

impl From<(i32, i32)> for Tile {
    fn from((x, y): (i32, i32)) -> Self {
        Tile::new(x, y)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Format a tile list for display
pub fn format_tiles(tiles: &[Tile]) -> String {
    if tiles.is_empty() {
        return "No tiles".to_string();
    }

    let mut result = String::new();
    for (i, tile) in tiles.iter().enumerate() {
        if i > 0 {
            result.push(' ');
        }
        result.push_str(&tile.to_string());
    }
    result
}
