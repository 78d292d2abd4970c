#![allow(dead_code)]

use bigsprite::{Direction, Grid, ShapeSpec, Tile};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

/// Shape fixture: one resolved footprint
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeFixture {
    pub name: String,
    pub anchor: Tile,
    pub facing: Direction,
    pub shape: ShapeSpec,
    pub expected: Vec<Tile>,
    /// Compare the tile list in order instead of as a set
    #[serde(default)]
    pub ordered: bool,
}

/// Load a fixture from JSON file
pub fn load_fixture(path: &Path) -> Result<ShapeFixture, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    let fixture: ShapeFixture = serde_json::from_str(&contents)?;
    Ok(fixture)
}

/// Every fixture under `test_data/shapes`, sorted by file name
pub fn load_all_fixtures() -> Vec<ShapeFixture> {
    let mut entries: Vec<_> = fs::read_dir("./test_data/shapes")
        .expect("test_data/shapes is missing")
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    entries.sort();
    entries
        .iter()
        .map(|p| load_fixture(p).unwrap_or_else(|e| panic!("bad fixture {}: {}", p.display(), e)))
        .collect()
}

/// A parsed scene layout
pub struct Scene {
    pub grid: Grid,
    /// Tiles marked with a letter, in reading order
    pub markers: HashMap<char, Vec<Tile>>,
}

impl Scene {
    pub fn marker(&self, ch: char) -> Tile {
        self.markers.get(&ch).and_then(|tiles| tiles.first().copied()).unwrap_or_else(|| panic!("no marker '{}'", ch))
    }

    pub fn all(&self, ch: char) -> BTreeSet<Tile> {
        self.markers.get(&ch).map(|tiles| tiles.iter().copied().collect()).unwrap_or_default()
    }
}

/// Parse a scene layout
/// Format:
/// - ■: blocked tile
/// - □: free tile
/// - any other character: free tile carrying that marker
pub fn parse_scene(layout: &str) -> Scene {
    let mut markers: HashMap<char, Vec<Tile>> = HashMap::new();
    let rows: Vec<&str> = layout.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            if ch != '■' && ch != '□' {
                markers.entry(ch).or_default().push(Tile::new(x as i32, y as i32));
            }
        }
    }

    let cleaned: String = rows
        .iter()
        .map(|row| row.chars().map(|c| if c == '■' { '■' } else { '□' }).collect::<String>() + "\n")
        .collect();
    Scene {
        grid: Grid::from_layout(&cleaned),
        markers,
    }
}

pub fn tile_set(tiles: &[Tile]) -> BTreeSet<Tile> {
    tiles.iter().copied().collect()
}

/// Draw tiles over the grid, for failure output
pub fn visualize(grid: &Grid, tiles: &[Tile]) -> String {
    let mut result = String::new();
    for y in 0..grid.height {
        for x in 0..grid.width {
            let symbol = if tiles.contains(&Tile::new(x, y)) {
                '*'
            } else if grid.is_blocked(x, y) {
                '■'
            } else {
                '.'
            };
            result.push(symbol);
        }
        result.push('\n');
    }
    result
}
