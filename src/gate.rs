//! Validation of every state change that alters an actor's footprint.
//!
//! Each attempt builds a candidate [`Placement`], validates the tiles the
//! actor would newly enter and only then commits. A rejected attempt leaves
//! the actor and the registry untouched.

use crate::actor::JumpArc;
use crate::shape::resolve;
use crate::tracker::{self, Placement};
use crate::{Actor, ActorId, Direction, MapView, OccupancyRegistry, Tile};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Map-wide movement policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRules {
    /// Corner tiles of a diagonal step must also be passable along both
    /// component directions, not only enterable from them
    pub diagonal_blocking: bool,
    /// Path cost after which the pathfinder stops expanding a node
    pub search_limit: i32,
}

impl Default for MovementRules {
    fn default() -> Self {
        MovementRules {
            diagonal_blocking: true,
            search_limit: 12,
        }
    }
}

/// Why an attempt was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    OutOfBounds(Tile),
    Impassable(Tile),
    Collision { tile: Tile, occupant: ActorId },
    /// The actor is riding a vehicle and can't move on its own
    Boarded,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::OutOfBounds(tile) => write!(f, "{} is off the map", tile),
            Rejection::Impassable(tile) => write!(f, "{} is impassable", tile),
            Rejection::Collision { tile, occupant } => write!(f, "{} is occupied by {}", tile, occupant),
            Rejection::Boarded => write!(f, "actor is boarded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Committed,
    Rejected(Rejection),
}

impl Outcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Outcome::Committed)
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Outcome::Committed => None,
            Outcome::Rejected(r) => Some(*r),
        }
    }
}

impl From<Result<(), Rejection>> for Outcome {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => Outcome::Committed,
            Err(r) => Outcome::Rejected(r),
        }
    }
}

/// How a tile's passability is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    /// Entered by a step: passable in the direction and its reverse
    Step(Direction),
    /// Entered diagonally: both component steps
    Diagonal(Direction, Direction),
    /// Corner of a diagonal step: enterable through both component edges
    Corner(Direction, Direction),
    /// Occupied without travel (turn, jump landing, swap): all four edges
    Settle,
}

/// Tiles newly entered when `tiles` shift one step in `direction`: each
/// tile's neighbour, minus anything already in the set. De-duplicated, in
/// the order of `tiles`.
pub fn leading_edge<M: MapView + ?Sized>(map: &M, tiles: &[Tile], direction: Direction) -> Vec<Tile> {
    let mut edge = Vec::new();
    for &tile in tiles {
        let next = map.step(tile, direction);
        if !tiles.contains(&next) && !edge.contains(&next) {
            edge.push(next);
        }
    }
    edge
}

/// Leading edge of a diagonal step: the horizontal edge, the vertical edge and
/// the tiles newly entered at the diagonal destination, de-duplicated.
pub fn diagonal_leading_edge<M: MapView + ?Sized>(
    map: &M,
    tiles: &[Tile],
    horizontal: Direction,
    vertical: Direction,
) -> Vec<Tile> {
    let mut edge = leading_edge(map, tiles, horizontal);
    for tile in leading_edge(map, tiles, vertical)
        .into_iter()
        .chain(diagonal_entries(map, tiles, horizontal, vertical))
    {
        if !edge.contains(&tile) {
            edge.push(tile);
        }
    }
    edge
}

/// Tiles of the diagonally shifted body that the current body doesn't cover
fn diagonal_entries<M: MapView + ?Sized>(
    map: &M,
    tiles: &[Tile],
    horizontal: Direction,
    vertical: Direction,
) -> Vec<Tile> {
    let mut entries = Vec::new();
    for &tile in tiles {
        let next = map.step(map.step(tile, horizontal), vertical);
        if !tiles.contains(&next) && !entries.contains(&next) {
            entries.push(next);
        }
    }
    entries
}

/// Read-only validation against one map and its registry. Answers the
/// hypothetical questions the pathfinder and touch triggers ask without
/// needing to mutate anything.
pub struct GateQuery<'a, M: MapView + ?Sized> {
    map: &'a M,
    registry: &'a OccupancyRegistry,
    rules: &'a MovementRules,
}

impl<'a, M: MapView + ?Sized> GateQuery<'a, M> {
    pub fn new(map: &'a M, registry: &'a OccupancyRegistry, rules: &'a MovementRules) -> Self {
        GateQuery { map, registry, rules }
    }

    /// Geometric footprint, ignoring the through flag. Validation works on
    /// geometry so a through actor still respects the map bounds.
    fn geometry(&self, actor: &Actor, position: Tile, facing: Direction) -> Vec<Tile> {
        resolve(position, facing, &actor.body.shape, self.map)
    }

    fn check_tile(&self, actor: &Actor, tile: Tile, check: Check, excluded: &[ActorId]) -> Result<(), Rejection> {
        if !self.map.is_valid(tile.x, tile.y) {
            return Err(Rejection::OutOfBounds(tile));
        }
        if actor.body.through {
            return Ok(());
        }

        let passable = |d: Direction| {
            self.map.is_passable(tile.x, tile.y, d) && self.map.is_passable(tile.x, tile.y, d.reverse())
        };
        let ok = match check {
            Check::Step(d) => passable(d),
            Check::Diagonal(h, v) => passable(h) && passable(v),
            Check::Corner(h, v) => {
                self.map.is_passable(tile.x, tile.y, h.reverse()) && self.map.is_passable(tile.x, tile.y, v.reverse())
            }
            Check::Settle => Direction::ALL.iter().all(|&d| self.map.is_passable(tile.x, tile.y, d)),
        };
        if !ok {
            return Err(Rejection::Impassable(tile));
        }

        if let Some(occupant) = self.registry.blocker_at(tile, excluded) {
            return Err(Rejection::Collision { tile, occupant });
        }
        Ok(())
    }

    fn check_all(&self, actor: &Actor, tiles: &[Tile], check: Check, excluded: &[ActorId]) -> Result<(), Rejection> {
        for &tile in tiles {
            self.check_tile(actor, tile, check, excluded)?;
        }
        Ok(())
    }

    /// Validate the footprint the actor would have after turning in place.
    /// Only tiles it doesn't already cover are checked.
    fn validate_turn(&self, actor: &Actor, facing: Direction) -> Result<Placement, Rejection> {
        let position = actor.body.position;
        let current = self.geometry(actor, position, actor.body.facing);
        let turned = self.geometry(actor, position, facing);
        if facing != actor.body.facing && actor.body.shape.varies_with_facing() {
            let entered: Vec<Tile> = turned.iter().copied().filter(|t| !current.contains(t)).collect();
            self.check_all(actor, &entered, Check::Settle, &[actor.id])?;
        }
        Ok(tracker::place(actor, position, facing, self.map))
    }

    /// Validate a one-tile step: the turn toward `direction`, then the
    /// leading edge of the turned body. Returns the placement to commit.
    fn validate_move(&self, actor: &Actor, direction: Direction) -> Result<Placement, Rejection> {
        let turned = self.validate_turn(actor, direction)?;
        let body = self.geometry(actor, actor.body.position, direction);
        let edge = leading_edge(self.map, &body, direction);
        self.check_all(actor, &edge, Check::Step(direction), &[actor.id])?;

        let destination = self.map.step(turned.position, direction);
        Ok(tracker::place(actor, destination, direction, self.map))
    }

    /// Validate a diagonal step. Both cardinal leading edges are always
    /// checked, so a body can't slip between two blocked edges. The corner
    /// tiles entered only by the diagonal must be enterable from both
    /// components, and with diagonal blocking also passable along them.
    fn validate_diagonal(&self, actor: &Actor, horizontal: Direction, vertical: Direction) -> Result<Placement, Rejection> {
        let position = actor.body.position;
        let facing = actor.body.facing;
        let body = self.geometry(actor, position, facing);
        let excluded = [actor.id];

        let horizontal_edge = leading_edge(self.map, &body, horizontal);
        self.check_all(actor, &horizontal_edge, Check::Step(horizontal), &excluded)?;
        let vertical_edge = leading_edge(self.map, &body, vertical);
        self.check_all(actor, &vertical_edge, Check::Step(vertical), &excluded)?;

        let corner: Vec<Tile> = diagonal_entries(self.map, &body, horizontal, vertical)
            .into_iter()
            .filter(|t| !horizontal_edge.contains(t) && !vertical_edge.contains(t))
            .collect();
        let corner_check = if self.rules.diagonal_blocking {
            Check::Diagonal(horizontal, vertical)
        } else {
            Check::Corner(horizontal, vertical)
        };
        self.check_all(actor, &corner, corner_check, &excluded)?;

        let destination = self.map.step(self.map.step(position, horizontal), vertical);
        Ok(tracker::place(actor, destination, facing, self.map))
    }

    /// Validate the whole body standing at `position` facing `facing`
    fn validate_settle(
        &self,
        actor: &Actor,
        position: Tile,
        facing: Direction,
        excluded: &[ActorId],
    ) -> Result<Placement, Rejection> {
        let body = self.geometry(actor, position, facing);
        self.check_all(actor, &body, Check::Settle, excluded)?;
        Ok(tracker::place(actor, position, facing, self.map))
    }

    /// Whether a body anchored at `position` could step in `direction`,
    /// facing that way. Used by the pathfinder on hypothetical positions.
    pub fn can_pass_from(&self, actor: &Actor, position: Tile, direction: Direction) -> bool {
        let body = self.geometry(actor, position, direction);
        let edge = leading_edge(self.map, &body, direction);
        self.check_all(actor, &edge, Check::Step(direction), &[actor.id]).is_ok()
    }

    /// Actors touched by the leading edge in `direction`, for touch and
    /// action-button triggers
    pub fn touch_front(&self, actor: &Actor, direction: Direction) -> Vec<ActorId> {
        let body = self.geometry(actor, actor.body.position, actor.body.facing);
        let mut touched = Vec::new();
        for tile in leading_edge(self.map, &body, direction) {
            if let Some(occupant) = self.registry.occupant_at(tile, Some(actor.id)) {
                if !touched.contains(&occupant) {
                    touched.push(occupant);
                }
            }
        }
        touched
    }
}

/// Checks and commits footprint changes against one map and its registry
pub struct MovementGate<'a, M: MapView + ?Sized> {
    map: &'a M,
    registry: &'a mut OccupancyRegistry,
    rules: &'a MovementRules,
}

impl<'a, M: MapView + ?Sized> MovementGate<'a, M> {
    pub fn new(map: &'a M, registry: &'a mut OccupancyRegistry, rules: &'a MovementRules) -> Self {
        MovementGate { map, registry, rules }
    }

    /// Read-only view over the same map and registry
    pub fn query(&self) -> GateQuery<'_, M> {
        GateQuery::new(self.map, &*self.registry, self.rules)
    }

    fn commit(&mut self, actor: &mut Actor, placement: Placement) {
        tracker::commit(actor, placement, self.registry);
    }

    /// Turn in place. Fails if the reshaped body would enter a blocked tile.
    pub fn attempt_turn(&mut self, actor: &mut Actor, facing: Direction) -> Outcome {
        let validated = self.query().validate_turn(actor, facing);
        let result = validated.map(|placement| self.commit(actor, placement));
        log_outcome(actor.id, "turn", &result);
        result.into()
    }

    /// Step one tile. Turning toward `direction` is part of the step: it is
    /// validated first and rolled back with the step if either fails.
    pub fn attempt_move(&mut self, actor: &mut Actor, direction: Direction) -> Outcome {
        let validated = self.query().validate_move(actor, direction);
        let result = validated.map(|placement| self.commit(actor, placement));
        log_outcome(actor.id, "move", &result);
        result.into()
    }

    /// Step diagonally without changing facing. If the actor was facing away
    /// from either component it turns toward it afterwards, when it can.
    pub fn attempt_diagonal(&mut self, actor: &mut Actor, horizontal: Direction, vertical: Direction) -> Outcome {
        debug_assert!(horizontal.is_horizontal(), "{:?} is not horizontal", horizontal);
        debug_assert!(!vertical.is_horizontal(), "{:?} is not vertical", vertical);

        let validated = self.query().validate_diagonal(actor, horizontal, vertical);
        let result = validated.map(|placement| self.commit(actor, placement));
        log_outcome(actor.id, "diagonal", &result);
        if result.is_ok() {
            if actor.body.facing == horizontal.reverse() {
                self.attempt_turn(actor, horizontal);
            }
            if actor.body.facing == vertical.reverse() {
                self.attempt_turn(actor, vertical);
            }
        }
        result.into()
    }

    /// Jump by (dx, dy). The actor first turns toward the dominant axis, then
    /// its whole footprint at the landing spot is validated.
    pub fn attempt_jump(&mut self, actor: &mut Actor, dx: i32, dy: i32) -> Outcome {
        let result = self.try_jump(actor, dx, dy);
        log_outcome(actor.id, "jump", &result);
        result.into()
    }

    fn try_jump(&mut self, actor: &mut Actor, dx: i32, dy: i32) -> Result<(), Rejection> {
        let facing = Direction::from_delta(dx, dy).unwrap_or(actor.body.facing);
        let query = self.query();
        let turned = query.validate_turn(actor, facing)?;
        let landing = self.map.wrap(turned.position.offset(dx, dy));
        let placement = query.validate_settle(actor, landing, facing, &[actor.id])?;

        self.commit(actor, placement);
        actor.jump = Some(JumpArc::new(dx, dy, actor.body.move_speed));
        Ok(())
    }

    /// Exchange places: each actor's search anchor lands where the other's
    /// was. Both full footprints are validated, ignoring each other; either
    /// failure leaves both where they were.
    pub fn attempt_swap(&mut self, a: &mut Actor, b: &mut Actor) -> Outcome {
        let result = self.try_swap(a, b);
        log_outcome(a.id, "swap", &result);
        result.into()
    }

    fn try_swap(&mut self, a: &mut Actor, b: &mut Actor) -> Result<(), Rejection> {
        let excluded = [a.id, b.id];
        let a_destination = self.map.wrap(b.body.search_anchor().offset(0, a.body.shape.anchor_shift()));
        let b_destination = self.map.wrap(a.body.search_anchor().offset(0, b.body.shape.anchor_shift()));

        let query = self.query();
        let a_placement = query.validate_settle(a, a_destination, a.body.facing, &excluded)?;
        let b_placement = query.validate_settle(b, b_destination, b.body.facing, &excluded)?;

        self.commit(a, a_placement);
        self.commit(b, b_placement);
        Ok(())
    }

    /// Put the actor down at `position` facing `facing`, validating its whole
    /// body there. Used when a rider leaves its vehicle.
    pub fn attempt_place(&mut self, actor: &mut Actor, position: Tile, facing: Direction) -> Outcome {
        let position = self.map.wrap(position);
        let validated = self.query().validate_settle(actor, position, facing, &[actor.id]);
        let result = validated.map(|placement| self.commit(actor, placement));
        log_outcome(actor.id, "place", &result);
        result.into()
    }

    /// Turn toward `target`, measuring from whichever occupied tile is
    /// nearest to it
    pub fn attempt_turn_toward(&mut self, actor: &mut Actor, target: Tile) -> Outcome {
        let anchor = actor.body.search_anchor();
        let mut sx = self.map.delta_x(anchor.x, target.x);
        let mut sy = self.map.delta_y(anchor.y, target.y);
        for tile in &actor.body.occupied_tiles {
            let dx = self.map.delta_x(tile.x, target.x);
            let dy = self.map.delta_y(tile.y, target.y);
            if dx.abs() + dy.abs() < sx.abs() + sy.abs() {
                sx = dx;
                sy = dy;
            }
        }
        match Direction::from_delta(-sx, -sy) {
            Some(facing) => self.attempt_turn(actor, facing),
            None => Outcome::Committed,
        }
    }
}

fn log_outcome(actor: ActorId, what: &str, result: &Result<(), Rejection>) {
    match result {
        Ok(()) => debug!("{} {} committed", actor, what),
        Err(rejection) => debug!("{} {} rejected: {}", actor, what, rejection),
    }
}
