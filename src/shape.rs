//! Footprint geometry for multi-tile actors.
//!
//! A [`ShapeSpec`] describes which tiles an actor covers relative to its
//! anchor. There are three families:
//!
//! - category A: a rectangle grown up and sideways from the anchor tile,
//!   identical for every facing ([`ShapeKind::RectangleAroundAnchor`])
//! - category B: shapes centred on the *shifted* anchor, which sits
//!   `floor(sprite_size / 2)` tiles above the logical anchor so the footprint
//!   follows the middle of a tall sprite ([`ShapeKind::RectangleShiftedCenter`],
//!   [`ShapeKind::Diamond`], [`ShapeKind::Circle`])
//! - category C: an independent category A rectangle per facing
//!   ([`ShapeKind::CustomPerDirection`])
//!
//! Extra tiles can be layered on top of any of them.

use crate::{Direction, MapView, Tile};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upward and sideways extents of an anchor-rooted rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Extents {
    pub back: i32,
    pub left: i32,
    pub right: i32,
}

impl Extents {
    pub fn new(back: i32, left: i32, right: i32) -> Self {
        Extents { back, left, right }
    }
}

/// One value per facing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerDirection<T> {
    pub down: T,
    pub left: T,
    pub right: T,
    pub up: T,
}

impl<T> PerDirection<T> {
    pub fn new(down: T, left: T, right: T, up: T) -> Self {
        PerDirection { down, left, right, up }
    }

    pub fn get(&self, direction: Direction) -> &T {
        match direction {
            Direction::Down => &self.down,
            Direction::Left => &self.left,
            Direction::Right => &self.right,
            Direction::Up => &self.up,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        [&self.down, &self.left, &self.right, &self.up].into_iter()
    }
}

/// Offset of an extra tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub fn new(dx: i32, dy: i32) -> Self {
        Offset { dx, dy }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeKind {
    /// Single tile, or only the extra tiles when any are set
    #[default]
    None,
    /// Category A
    RectangleAroundAnchor { back: i32, left: i32, right: i32 },
    /// Category B rectangle. Extents are authored for a down-facing actor and
    /// rotate with it.
    RectangleShiftedCenter {
        sprite_size: i32,
        front: i32,
        back: i32,
        left: i32,
        right: i32,
    },
    /// Category B, every tile within Manhattan distance `radius`
    Diamond { sprite_size: i32, radius: i32 },
    /// Category B, the traced midpoint circle of `radius` plus the centre.
    /// A ring, not a disk.
    Circle { sprite_size: i32, radius: i32 },
    /// Category C
    CustomPerDirection { extents: PerDirection<Extents> },
}

/// Extra tiles layered over the base shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "tiles", rename_all = "snake_case")]
pub enum ExtraTiles {
    /// Offsets from the logical anchor, identical for every facing
    Fixed(Vec<Offset>),
    /// Offsets from the shifted anchor, authored facing down and rotated with the actor
    Rotating(Vec<Offset>),
    /// A separate offset list per facing, from the logical anchor
    PerDirection(PerDirection<Vec<Offset>>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("sprite size must be at least 1, got {0}")]
    SpriteSize(i32),
    #[error("shape extent `{name}` must not be negative, got {value}")]
    NegativeExtent { name: &'static str, value: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShapeSpec {
    #[serde(flatten)]
    pub kind: ShapeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<ExtraTiles>,
}

impl ShapeSpec {
    pub fn new(kind: ShapeKind) -> Self {
        ShapeSpec { kind, extra: None }
    }

    pub fn with_extra(mut self, extra: ExtraTiles) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn rectangle_a(back: i32, left: i32, right: i32) -> Self {
        Self::new(ShapeKind::RectangleAroundAnchor { back, left, right })
    }

    pub fn rectangle_b(sprite_size: i32, front: i32, back: i32, left: i32, right: i32) -> Self {
        Self::new(ShapeKind::RectangleShiftedCenter { sprite_size, front, back, left, right })
    }

    pub fn diamond(sprite_size: i32, radius: i32) -> Self {
        Self::new(ShapeKind::Diamond { sprite_size, radius })
    }

    pub fn circle(sprite_size: i32, radius: i32) -> Self {
        Self::new(ShapeKind::Circle { sprite_size, radius })
    }

    pub fn custom(extents: PerDirection<Extents>) -> Self {
        Self::new(ShapeKind::CustomPerDirection { extents })
    }

    /// Side length of the sprite in tiles; 1 for kinds that don't carry one
    pub fn sprite_size(&self) -> i32 {
        match self.kind {
            ShapeKind::RectangleShiftedCenter { sprite_size, .. }
            | ShapeKind::Diamond { sprite_size, .. }
            | ShapeKind::Circle { sprite_size, .. } => sprite_size,
            _ => 1,
        }
    }

    /// Category B: the footprint hangs off the shifted anchor
    pub fn is_shifted(&self) -> bool {
        matches!(
            self.kind,
            ShapeKind::RectangleShiftedCenter { .. } | ShapeKind::Diamond { .. } | ShapeKind::Circle { .. }
        )
    }

    /// Anything other than the plain single-tile default
    pub fn is_big(&self) -> bool {
        self.kind != ShapeKind::None || self.extra.is_some()
    }

    /// Whether turning can change the absolute footprint
    pub fn varies_with_facing(&self) -> bool {
        let kind_varies = matches!(
            self.kind,
            ShapeKind::RectangleShiftedCenter { .. } | ShapeKind::CustomPerDirection { .. }
        );
        let extra_varies = matches!(self.extra, Some(ExtraTiles::Rotating(_)) | Some(ExtraTiles::PerDirection(_)));
        kind_varies || extra_varies
    }

    /// Rows between the logical anchor and the shifted anchor
    pub fn anchor_shift(&self) -> i32 {
        if self.is_shifted() {
            self.sprite_size().div_euclid(2)
        } else {
            0
        }
    }

    /// Shifted anchor row for an actor whose logical anchor row is `y`
    pub fn shifted_anchor_y(&self, y: i32) -> i32 {
        y - self.anchor_shift()
    }

    pub fn validate(&self) -> Result<(), ShapeError> {
        fn non_negative(name: &'static str, value: i32) -> Result<(), ShapeError> {
            if value < 0 {
                return Err(ShapeError::NegativeExtent { name, value });
            }
            Ok(())
        }

        match &self.kind {
            ShapeKind::None => {}
            ShapeKind::RectangleAroundAnchor { back, left, right } => {
                non_negative("back", *back)?;
                non_negative("left", *left)?;
                non_negative("right", *right)?;
            }
            ShapeKind::RectangleShiftedCenter { front, back, left, right, .. } => {
                non_negative("front", *front)?;
                non_negative("back", *back)?;
                non_negative("left", *left)?;
                non_negative("right", *right)?;
            }
            ShapeKind::Diamond { radius, .. } | ShapeKind::Circle { radius, .. } => {
                non_negative("radius", *radius)?;
            }
            ShapeKind::CustomPerDirection { extents } => {
                for e in extents.iter() {
                    non_negative("back", e.back)?;
                    non_negative("left", e.left)?;
                    non_negative("right", e.right)?;
                }
            }
        }
        if self.sprite_size() < 1 {
            return Err(ShapeError::SpriteSize(self.sprite_size()));
        }
        Ok(())
    }

    /// Tiles covered by an actor anchored at `anchor` facing `facing`, in
    /// generation order, without wrap correction. Duplicates are dropped,
    /// keeping the first occurrence.
    pub fn footprint(&self, anchor: Tile, facing: Direction) -> Vec<Tile> {
        debug_assert!(self.validate().is_ok(), "malformed shape reached the resolver: {:?}", self);

        let x0 = anchor.x;
        let y0 = self.shifted_anchor_y(anchor.y);
        let mut tiles = Vec::new();

        match &self.kind {
            ShapeKind::None => {}
            ShapeKind::RectangleAroundAnchor { back, left, right } => {
                push_anchor_rect(&mut tiles, anchor, Extents::new(*back, *left, *right));
            }
            ShapeKind::RectangleShiftedCenter { front, back, left, right, .. } => {
                let side = rotated_extents(facing, *front, *back, *left, *right);
                for j in 0..=(side.up + side.down) {
                    for i in 0..=(side.left + side.right) {
                        tiles.push(Tile::new(x0 - side.left + i, y0 - side.up + j));
                    }
                }
            }
            ShapeKind::Diamond { radius, .. } => {
                let rad = *radius;
                for y in -rad..=rad {
                    for x in -rad..=rad {
                        if x.abs() + y.abs() <= rad {
                            tiles.push(Tile::new(x0 + x, y0 + y));
                        }
                    }
                }
            }
            ShapeKind::Circle { radius, .. } => {
                tiles.push(Tile::new(x0, y0));
                trace_circle(&mut tiles, Tile::new(x0, y0), *radius);
            }
            ShapeKind::CustomPerDirection { extents } => {
                push_anchor_rect(&mut tiles, anchor, *extents.get(facing));
            }
        }

        match &self.extra {
            None => {}
            Some(ExtraTiles::Fixed(offsets)) => {
                tiles.extend(offsets.iter().map(|o| anchor.offset(o.dx, o.dy)));
            }
            Some(ExtraTiles::Rotating(offsets)) => {
                tiles.extend(offsets.iter().map(|o| {
                    let (dx, dy) = facing.rotate_offset(o.dx, o.dy);
                    Tile::new(x0 + dx, y0 + dy)
                }));
            }
            Some(ExtraTiles::PerDirection(per_direction)) => {
                tiles.extend(per_direction.get(facing).iter().map(|o| anchor.offset(o.dx, o.dy)));
            }
        }

        if !self.is_big() {
            tiles.push(anchor);
        }

        dedup_in_order(tiles)
    }
}

/// Absolute up/down/left/right extents of a category B rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SideExtents {
    up: i32,
    down: i32,
    left: i32,
    right: i32,
}

/// Rotate the local front/back/left/right extents, authored for a down-facing
/// actor, into absolute sides. Uses the same quarter turns as
/// [`Direction::rotate_offset`].
fn rotated_extents(facing: Direction, front: i32, back: i32, left: i32, right: i32) -> SideExtents {
    match facing {
        Direction::Down => SideExtents { up: back, down: front, left, right },
        Direction::Left => SideExtents { up: left, down: right, left: front, right: back },
        Direction::Right => SideExtents { up: right, down: left, left: back, right: front },
        Direction::Up => SideExtents { up: front, down: back, left: right, right: left },
    }
}

/// Rectangle from `back` rows above the anchor down to the anchor row, `left`
/// and `right` columns either side. Never extends below the anchor.
fn push_anchor_rect(tiles: &mut Vec<Tile>, anchor: Tile, extents: Extents) {
    let top_left = anchor.offset(-extents.left, -extents.back);
    for j in 0..=extents.back {
        for i in 0..=(extents.left + extents.right) {
            tiles.push(top_left.offset(i, j));
        }
    }
}

/// Midpoint circle: walk one octant from (radius, 0) and mirror each point
/// into the other seven.
fn trace_circle(tiles: &mut Vec<Tile>, center: Tile, radius: i32) {
    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - x;
    while x >= y {
        tiles.push(center.offset(x, y));
        tiles.push(center.offset(y, x));
        tiles.push(center.offset(-x, y));
        tiles.push(center.offset(-y, x));
        tiles.push(center.offset(-x, -y));
        tiles.push(center.offset(-y, -x));
        tiles.push(center.offset(x, -y));
        tiles.push(center.offset(y, -x));
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x + 1);
        }
    }
}

fn dedup_in_order(tiles: Vec<Tile>) -> Vec<Tile> {
    let mut result: Vec<Tile> = Vec::with_capacity(tiles.len());
    for tile in tiles {
        if !result.contains(&tile) {
            result.push(tile);
        }
    }
    result
}

/// Resolve the absolute, wrap-corrected tile list of an actor anchored at
/// `anchor` facing `facing` on `map`.
pub fn resolve<M: MapView + ?Sized>(anchor: Tile, facing: Direction, shape: &ShapeSpec, map: &M) -> Vec<Tile> {
    let tiles = shape.footprint(anchor, facing);
    if !map.loops_horizontally() && !map.loops_vertically() {
        return tiles;
    }
    dedup_in_order(tiles.into_iter().map(|t| map.wrap(t)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Grid;
    use std::collections::HashSet;

    fn set(tiles: &[Tile]) -> HashSet<Tile> {
        tiles.iter().copied().collect()
    }

    #[test]
    fn test_default_is_single_anchor_tile() {
        let shape = ShapeSpec::default();
        for d in Direction::ALL {
            assert_eq!(shape.footprint(Tile::new(4, 7), d), vec![Tile::new(4, 7)]);
        }
    }

    #[test]
    fn test_rectangle_a_never_extends_below_anchor() {
        let shape = ShapeSpec::rectangle_a(2, 1, 3);
        let tiles = shape.footprint(Tile::new(10, 10), Direction::Down);
        assert_eq!(tiles.len(), 3 * 5);
        assert!(tiles.contains(&Tile::new(10, 10)));
        assert!(tiles.iter().all(|t| t.y <= 10 && t.y >= 8));
        assert!(tiles.iter().all(|t| t.x >= 9 && t.x <= 13));
        assert_eq!(tiles.first(), Some(&Tile::new(9, 8)));
        assert_eq!(tiles.last(), Some(&Tile::new(13, 10)));
    }

    #[test]
    fn test_rectangle_a_ignores_facing() {
        let shape = ShapeSpec::rectangle_a(1, 1, 1);
        let down = shape.footprint(Tile::new(5, 5), Direction::Down);
        for d in Direction::ALL {
            assert_eq!(shape.footprint(Tile::new(5, 5), d), down);
        }
        assert!(!shape.varies_with_facing());
    }

    #[test]
    fn test_rectangle_b_rotates_with_facing() {
        // 2 wide, 3 tall when facing down
        let shape = ShapeSpec::rectangle_b(7, 1, 1, 1, 0);
        let anchor = Tile::new(10, 10);

        let down = set(&shape.footprint(anchor, Direction::Down));
        let left = set(&shape.footprint(anchor, Direction::Left));
        let right = set(&shape.footprint(anchor, Direction::Right));
        let up = set(&shape.footprint(anchor, Direction::Up));

        let rect = |x1: i32, y1: i32, x2: i32, y2: i32| -> HashSet<Tile> {
            let mut s = HashSet::new();
            for y in y1..=y2 {
                for x in x1..=x2 {
                    s.insert(Tile::new(x, y));
                }
            }
            s
        };

        assert_eq!(down, rect(9, 6, 10, 8));
        // front -> left, back -> right, left -> up, right -> down
        assert_eq!(left, rect(9, 6, 11, 7));
        // front -> right, back -> left, left -> down, right -> up
        assert_eq!(right, rect(9, 7, 11, 8));
        // front -> up, back -> down, left -> right, right -> left
        assert_eq!(up, rect(10, 6, 11, 8));
    }

    #[test]
    fn test_diamond_radius_two() {
        let shape = ShapeSpec::diamond(5, 2);
        let tiles = shape.footprint(Tile::new(0, 2), Direction::Down);
        assert_eq!(tiles.len(), 13);
        // centred on the shifted anchor (0, 0)
        assert!(tiles.contains(&Tile::new(0, 0)));
        assert!(tiles.contains(&Tile::new(0, -2)));
        assert!(tiles.contains(&Tile::new(1, 1)));
        assert!(!tiles.contains(&Tile::new(2, 1)));
    }

    #[test]
    fn test_circle_radius_zero_is_center_only() {
        let shape = ShapeSpec::circle(1, 0);
        assert_eq!(shape.footprint(Tile::new(3, 3), Direction::Up), vec![Tile::new(3, 3)]);
    }

    #[test]
    fn test_custom_per_direction_selects_by_facing() {
        let shape = ShapeSpec::custom(PerDirection::new(
            Extents::new(1, 0, 0),
            Extents::new(0, 1, 1),
            Extents::new(0, 1, 1),
            Extents::new(1, 0, 0),
        ));
        let anchor = Tile::new(5, 5);
        assert_eq!(
            shape.footprint(anchor, Direction::Down),
            vec![Tile::new(5, 4), Tile::new(5, 5)]
        );
        assert_eq!(
            shape.footprint(anchor, Direction::Left),
            vec![Tile::new(4, 5), Tile::new(5, 5), Tile::new(6, 5)]
        );
    }

    #[test]
    fn test_fixed_extra_tiles_make_l_shape() {
        let shape = ShapeSpec::rectangle_a(0, 1, 1)
            .with_extra(ExtraTiles::Fixed(vec![Offset::new(-1, -1), Offset::new(-1, -2)]));
        let tiles = shape.footprint(Tile::new(5, 5), Direction::Right);
        assert_eq!(
            tiles,
            vec![
                Tile::new(4, 5),
                Tile::new(5, 5),
                Tile::new(6, 5),
                Tile::new(4, 4),
                Tile::new(4, 3),
            ]
        );
    }

    #[test]
    fn test_rotating_extra_tiles_without_kind() {
        let shape = ShapeSpec::default().with_extra(ExtraTiles::Rotating(vec![Offset::new(0, 0), Offset::new(0, 1)]));
        let anchor = Tile::new(5, 5);
        assert_eq!(shape.footprint(anchor, Direction::Down), vec![Tile::new(5, 5), Tile::new(5, 6)]);
        assert_eq!(shape.footprint(anchor, Direction::Left), vec![Tile::new(5, 5), Tile::new(4, 5)]);
        assert_eq!(shape.footprint(anchor, Direction::Up), vec![Tile::new(5, 5), Tile::new(5, 4)]);
        assert!(shape.varies_with_facing());
    }

    #[test]
    fn test_per_direction_extra_tiles() {
        let shape = ShapeSpec::default().with_extra(ExtraTiles::PerDirection(PerDirection::new(
            vec![Offset::new(0, 0)],
            vec![Offset::new(-1, 0)],
            vec![Offset::new(1, 0)],
            vec![],
        )));
        let anchor = Tile::new(2, 2);
        assert_eq!(shape.footprint(anchor, Direction::Left), vec![Tile::new(1, 2)]);
        assert!(shape.footprint(anchor, Direction::Up).is_empty());
    }

    #[test]
    fn test_resolve_wraps_on_looping_map() {
        let grid = Grid::new(10, 10).with_loops(true, true);
        let shape = ShapeSpec::rectangle_a(1, 1, 0);
        let tiles = resolve(Tile::new(0, 0), Direction::Down, &shape, &grid);
        assert_eq!(
            tiles,
            vec![Tile::new(9, 9), Tile::new(0, 9), Tile::new(9, 0), Tile::new(0, 0)]
        );
    }

    #[test]
    fn test_validate_rejects_negative_extents() {
        assert!(ShapeSpec::rectangle_a(-1, 0, 0).validate().is_err());
        assert!(ShapeSpec::circle(0, 2).validate().is_err());
        assert_eq!(
            ShapeSpec::diamond(3, -2).validate(),
            Err(ShapeError::NegativeExtent { name: "radius", value: -2 })
        );
        assert!(ShapeSpec::rectangle_b(7, 1, 1, 1, 0).validate().is_ok());
    }

    #[test]
    fn test_shape_spec_from_toml() {
        let shape: ShapeSpec = toml::from_str(
            r#"
            kind = "rectangle_shifted_center"
            sprite_size = 7
            front = 1
            back = 1
            left = 1
            right = 0

            [extra]
            mode = "rotating"
            tiles = [{ dx = 0, dy = 3 }]
            "#,
        )
        .unwrap();
        assert_eq!(
            shape,
            ShapeSpec::rectangle_b(7, 1, 1, 1, 0).with_extra(ExtraTiles::Rotating(vec![Offset::new(0, 3)]))
        );
    }
}
