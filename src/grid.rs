use crate::{Direction, Tile};
use bitflags::bitflags;

bitflags! {
    /// Tile edges a single-tile actor may cross when leaving the tile
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Passage: u8 {
        const DOWN = 0b0001;
        const LEFT = 0b0010;
        const RIGHT = 0b0100;
        const UP = 0b1000;
    }
}

impl Passage {
    pub fn from_direction(direction: Direction) -> Self {
        match direction {
            Direction::Down => Passage::DOWN,
            Direction::Left => Passage::LEFT,
            Direction::Right => Passage::RIGHT,
            Direction::Up => Passage::UP,
        }
    }
}

/// Read-only view of the host map: bounds, directional passability and
/// wraparound. Everything the occupancy core needs from the tile engine.
pub trait MapView {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn is_valid(&self, x: i32, y: i32) -> bool;
    /// True if a single-tile actor standing on (x, y) may cross the edge in `direction`
    fn is_passable(&self, x: i32, y: i32, direction: Direction) -> bool;
    fn loops_horizontally(&self) -> bool;
    fn loops_vertically(&self) -> bool;

    fn round_x(&self, x: i32) -> i32 {
        if self.loops_horizontally() && self.width() > 0 {
            x.rem_euclid(self.width())
        } else {
            x
        }
    }

    fn round_y(&self, y: i32) -> i32 {
        if self.loops_vertically() && self.height() > 0 {
            y.rem_euclid(self.height())
        } else {
            y
        }
    }

    fn wrap(&self, tile: Tile) -> Tile {
        Tile::new(self.round_x(tile.x), self.round_y(tile.y))
    }

    /// Wrap-corrected neighbour of `tile` in `direction`
    fn step(&self, tile: Tile, direction: Direction) -> Tile {
        self.wrap(tile.step(direction))
    }

    /// Signed x distance from `x2` to `x1`, taking the short way round on looping maps
    fn delta_x(&self, x1: i32, x2: i32) -> i32 {
        let mut result = x1 - x2;
        if self.loops_horizontally() && result.abs() > self.width() / 2 {
            if result < 0 {
                result += self.width();
            } else {
                result -= self.width();
            }
        }
        result
    }

    fn delta_y(&self, y1: i32, y2: i32) -> i32 {
        let mut result = y1 - y2;
        if self.loops_vertically() && result.abs() > self.height() / 2 {
            if result < 0 {
                result += self.height();
            } else {
                result -= self.height();
            }
        }
        result
    }

    /// Grid distance used by the pathfinder heuristic
    fn distance(&self, a: Tile, b: Tile) -> i32 {
        self.delta_x(a.x, b.x).abs() + self.delta_y(a.y, b.y).abs()
    }
}

/// Grid structure storing per-tile passage flags
#[derive(Clone, Debug)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    pub cells: Vec<Passage>,
    pub loop_horizontal: bool,
    pub loop_vertical: bool,
    /// Revision number - incremented whenever grid cells change
    pub revision: u64,
}

impl Grid {
    /// Create a new grid with every edge open
    pub fn new(width: i32, height: i32) -> Self {
        Grid {
            width,
            height,
            cells: vec![Passage::all(); (width.max(0) * height.max(0)) as usize],
            loop_horizontal: false,
            loop_vertical: false,
            revision: 0,
        }
    }

    /// Create a grid with specific fully blocked tiles
    pub fn with_blocked(width: i32, height: i32, blocked: &[Tile]) -> Self {
        let mut grid = Self::new(width, height);
        for tile in blocked {
            grid.set_blocked(tile.x, tile.y, true);
        }
        grid
    }

    pub fn with_loops(mut self, horizontal: bool, vertical: bool) -> Self {
        self.loop_horizontal = horizontal;
        self.loop_vertical = vertical;
        self
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return None;
        }
        Some((x + y * self.width) as usize)
    }

    /// Passage flags at (x, y); out of bounds has none
    pub fn passage(&self, x: i32, y: i32) -> Passage {
        self.index(x, y).map(|i| self.cells[i]).unwrap_or(Passage::empty())
    }

    pub fn set_passage(&mut self, x: i32, y: i32, passage: Passage) {
        if let Some(i) = self.index(x, y) {
            if self.cells[i] != passage {
                self.cells[i] = passage;
                self.revision += 1;
            }
        }
    }

    pub fn set_blocked(&mut self, x: i32, y: i32, blocked: bool) {
        let passage = if blocked { Passage::empty() } else { Passage::all() };
        self.set_passage(x, y, passage);
    }

    /// A tile is blocked when no edge can be crossed out of it
    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.passage(x, y).is_empty()
    }

    pub fn toggle(&mut self, x: i32, y: i32) {
        let blocked = self.is_blocked(x, y);
        self.set_blocked(x, y, !blocked);
    }

    /// Get current grid revision number
    pub fn get_revision(&self) -> u64 {
        self.revision
    }

    /// Parse a text layout: `■` is a blocked tile, anything else is free.
    /// Every non-empty line is a row; the widest row sets the width.
    pub fn from_layout(layout: &str) -> Self {
        let lines: Vec<&str> = layout
            .lines()
            .map(|line| line.trim_end())
            .filter(|line| !line.is_empty())
            .collect();
        let height = lines.len() as i32;
        let width = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0) as i32;

        let mut grid = Grid::new(width, height);
        for (y, line) in lines.iter().enumerate() {
            for (x, ch) in line.chars().enumerate() {
                if ch == '■' {
                    grid.set_blocked(x as i32, y as i32, true);
                }
            }
        }
        grid.revision = 0;
        grid
    }

    /// Render the grid in the `from_layout` format
    pub fn to_layout(&self) -> String {
        let mut result = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                result.push(if self.is_blocked(x, y) { '■' } else { '□' });
            }
            result.push('\n');
        }
        result
    }
}

impl MapView for Grid {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn is_valid(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn is_passable(&self, x: i32, y: i32, direction: Direction) -> bool {
        self.passage(x, y).contains(Passage::from_direction(direction))
    }

    fn loops_horizontally(&self) -> bool {
        self.loop_horizontal
    }

    fn loops_vertically(&self) -> bool {
        self.loop_vertical
    }
}
