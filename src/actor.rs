use crate::{Direction, ShapeSpec, Tile};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque actor identity handed out by the map context. Two actors never
/// share an id, even with identical shape and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub usize);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleKind {
    Boat,
    Ship,
    Airship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActorKind {
    Player,
    Event { event_id: u32 },
    Vehicle { vehicle: VehicleKind },
}

/// Drawing layer relative to other characters. Only `Same` blocks movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Below,
    #[default]
    Same,
    Above,
}

/// Visual jump arc scheduled by a committed jump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpArc {
    /// Frames until the top of the arc
    pub peak: i32,
    /// Total frames of the jump
    pub count: i32,
}

impl JumpArc {
    /// `peak = 10 + round(|(dx, dy)|) - move_speed`
    pub fn new(dx: i32, dy: i32, move_speed: u8) -> Self {
        let distance = ((dx * dx + dy * dy) as f64).sqrt().round() as i32;
        let peak = 10 + distance - move_speed as i32;
        JumpArc { peak, count: peak * 2 }
    }
}

/// Anything that stands on the map with a footprint. Occupancy queries only
/// need these four facts, whatever else the implementor carries.
pub trait Occupant {
    /// Logical anchor
    fn position(&self) -> Tile;
    fn facing(&self) -> Direction;
    fn shape(&self) -> &ShapeSpec;
    /// Absolute tiles currently covered
    fn occupied_tiles(&self) -> &[Tile];

    fn covers(&self, tile: Tile) -> bool {
        self.occupied_tiles().contains(&tile)
    }
}

/// Occupancy state of one actor: where it stands, which way it faces, the
/// shape it carries and the tiles that shape currently covers.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    /// Logical anchor
    pub position: Tile,
    pub facing: Direction,
    pub shape: ShapeSpec,
    /// Row of the shifted anchor, derived from `position.y` and the shape
    pub shifted_anchor_y: i32,
    /// Absolute tiles covered; derived, recomputed after every change
    pub occupied_tiles: Vec<Tile>,
    pub priority: Priority,
    pub through: bool,
    /// 1 (slowest) to 6 (fastest)
    pub move_speed: u8,
}

impl Body {
    pub fn new(position: Tile, facing: Direction, shape: ShapeSpec) -> Self {
        let shifted_anchor_y = shape.shifted_anchor_y(position.y);
        Body {
            position,
            facing,
            shape,
            shifted_anchor_y,
            occupied_tiles: vec![position],
            priority: Priority::Same,
            through: false,
            move_speed: 4,
        }
    }

    /// Anchor the pathfinder and swaps work from: the shifted anchor for
    /// category B shapes, the logical anchor otherwise
    pub fn search_anchor(&self) -> Tile {
        Tile::new(self.position.x, self.shifted_anchor_y)
    }

    /// Only same-layer, solid actors can block others
    pub fn blocks_others(&self) -> bool {
        self.priority == Priority::Same && !self.through
    }
}

impl Occupant for Body {
    fn position(&self) -> Tile {
        self.position
    }

    fn facing(&self) -> Direction {
        self.facing
    }

    fn shape(&self) -> &ShapeSpec {
        &self.shape
    }

    fn occupied_tiles(&self) -> &[Tile] {
        &self.occupied_tiles
    }
}

/// A player, event or vehicle on the current map
#[derive(Clone, Debug)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    pub body: Body,
    /// Set while a player rides a vehicle
    pub boarded: Option<ActorId>,
    /// Arc of the most recent committed jump
    pub jump: Option<JumpArc>,
}

impl Actor {
    pub fn new(id: ActorId, kind: ActorKind, position: Tile, facing: Direction, shape: ShapeSpec) -> Self {
        Actor {
            id,
            kind,
            body: Body::new(position, facing, shape),
            boarded: None,
            jump: None,
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == ActorKind::Player
    }

    pub fn is_vehicle(&self) -> bool {
        matches!(self.kind, ActorKind::Vehicle { .. })
    }

    /// Swap the shape back to the single-tile default. The caller recomputes
    /// occupancy afterwards.
    pub fn reset_shape(&mut self) -> ShapeSpec {
        std::mem::take(&mut self.body.shape)
    }
}

impl Occupant for Actor {
    fn position(&self) -> Tile {
        self.body.position()
    }

    fn facing(&self) -> Direction {
        self.body.facing()
    }

    fn shape(&self) -> &ShapeSpec {
        self.body.shape()
    }

    fn occupied_tiles(&self) -> &[Tile] {
        self.body.occupied_tiles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_body_shifts_anchor_for_category_b() {
        let body = Body::new(Tile::new(10, 10), Direction::Down, ShapeSpec::rectangle_b(7, 1, 1, 1, 0));
        assert_eq!(body.shifted_anchor_y, 7);
        assert_eq!(body.search_anchor(), Tile::new(10, 7));

        let body = Body::new(Tile::new(10, 10), Direction::Down, ShapeSpec::rectangle_a(2, 0, 0));
        assert_eq!(body.search_anchor(), Tile::new(10, 10));
    }

    #[test]
    fn test_jump_arc() {
        // distance 2, normal speed
        assert_eq!(JumpArc::new(2, 0, 4), JumpArc { peak: 8, count: 16 });
        // sqrt(5) rounds to 2
        assert_eq!(JumpArc::new(1, -2, 3), JumpArc { peak: 9, count: 18 });
        assert_eq!(JumpArc::new(0, 0, 6), JumpArc { peak: 4, count: 8 });
    }

    #[test]
    fn test_reset_shape_returns_previous() {
        let mut actor = Actor::new(
            ActorId(1),
            ActorKind::Event { event_id: 3 },
            Tile::new(1, 1),
            Direction::Left,
            ShapeSpec::circle(3, 1),
        );
        let old = actor.reset_shape();
        assert_eq!(old, ShapeSpec::circle(3, 1));
        assert_eq!(actor.shape(), &ShapeSpec::default());
    }

    #[test]
    fn test_actor_reports_its_body_as_occupant() {
        let mut actor = Actor::new(
            ActorId(2),
            ActorKind::Vehicle { vehicle: VehicleKind::Boat },
            Tile::new(4, 4),
            Direction::Up,
            ShapeSpec::rectangle_a(0, 0, 1),
        );
        actor.body.occupied_tiles = actor.shape().footprint(actor.position(), actor.facing());

        let occupant: &dyn Occupant = &actor;
        assert_eq!(occupant.position(), Tile::new(4, 4));
        assert_eq!(occupant.facing(), Direction::Up);
        assert_eq!(occupant.occupied_tiles(), actor.body.occupied_tiles());
        assert!(occupant.covers(Tile::new(5, 4)));
        assert!(!occupant.covers(Tile::new(3, 4)));
    }

    #[test]
    fn test_through_or_layered_actors_do_not_block() {
        let mut body = Body::new(Tile::new(0, 0), Direction::Down, ShapeSpec::default());
        assert!(body.blocks_others());
        body.priority = Priority::Below;
        assert!(!body.blocks_others());
        body.priority = Priority::Same;
        body.through = true;
        assert!(!body.blocks_others());
    }
}
