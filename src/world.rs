//! The map context: one map, the actors standing on it and the occupancy
//! registry they share.
//!
//! Every host-facing operation goes through [`World`]. Movement attempts come
//! back as an [`Outcome`]; only integration mistakes such as an unknown actor
//! id surface as [`Error`].

use crate::action_log::{Action, ActionLog};
use crate::actor::{Occupant, Priority};
use crate::gate::{GateQuery, MovementGate, MovementRules, Outcome, Rejection};
use crate::pathfinding::find_direction;
use crate::tracker;
use crate::{Actor, ActorId, ActorKind, Direction, Error, Grid, MapView, OccupancyRegistry, Result, ShapeSpec, Tile};
use rand::Rng;
use tracing::{debug, info};

pub struct World<M: MapView = Grid> {
    map: M,
    registry: OccupancyRegistry,
    rules: MovementRules,
    /// In spawn order
    actors: Vec<Actor>,
    next_id: usize,
    log: Option<ActionLog>,
}

impl<M: MapView> World<M> {
    pub fn new(map: M, rules: MovementRules) -> Self {
        World {
            map,
            registry: OccupancyRegistry::new(),
            rules,
            actors: Vec::new(),
            next_id: 0,
            log: None,
        }
    }

    /// Record every attempt in an [`ActionLog`]
    pub fn with_action_log(mut self) -> Self {
        self.log = Some(ActionLog::new());
        self
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    /// Mutable map access for editing passability. Footprints don't depend
    /// on passability, so nothing needs recomputing.
    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn rules(&self) -> &MovementRules {
        &self.rules
    }

    pub fn registry(&self) -> &OccupancyRegistry {
        &self.registry
    }

    pub fn action_log(&self) -> Option<&ActionLog> {
        self.log.as_ref()
    }

    pub fn action_log_mut(&mut self) -> Option<&mut ActionLog> {
        self.log.as_mut()
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    fn index_of(&self, id: ActorId) -> Result<usize> {
        self.actors
            .iter()
            .position(|a| a.id == id)
            .ok_or(Error::UnknownActor(id))
    }

    pub fn actor(&self, id: ActorId) -> Result<&Actor> {
        Ok(&self.actors[self.index_of(id)?])
    }

    /// Place a new actor without validation and register its footprint.
    /// Spawning on top of walls or other actors is allowed, as a map editor
    /// would allow it.
    pub fn spawn(&mut self, kind: ActorKind, position: Tile, facing: Direction, shape: ShapeSpec) -> Result<ActorId> {
        shape.validate()?;
        let id = ActorId(self.next_id);
        self.next_id += 1;

        let mut actor = Actor::new(id, kind, self.map.wrap(position), facing, shape);
        tracker::recompute(&mut actor, &self.map, &mut self.registry);
        debug!("spawned {} {:?} at {} covering {} tiles", id, kind, actor.position(), actor.occupied_tiles().len());
        self.actors.push(actor);
        Ok(id)
    }

    /// Take an actor off the map and drop its registry entry. Anyone riding
    /// it is put down where it stood and tracked again.
    pub fn remove(&mut self, id: ActorId) -> Result<Actor> {
        let index = self.index_of(id)?;
        self.registry.remove_for(id);
        let actor = self.actors.remove(index);
        for i in 0..self.actors.len() {
            if self.actors[i].boarded == Some(id) {
                self.actors[i].boarded = None;
                self.refresh(i);
                debug!("{} dropped off at {} as {} left", self.actors[i].id, self.actors[i].position(), id);
            }
        }
        Ok(actor)
    }

    pub fn occupied_tiles(&self, id: ActorId) -> Result<&[Tile]> {
        Ok(self.actor(id)?.occupied_tiles())
    }

    /// First actor whose footprint covers `tile`, skipping `asking`
    pub fn occupant_at(&self, tile: Tile, asking: Option<ActorId>) -> Option<ActorId> {
        self.registry.occupant_at(self.map.wrap(tile), asking)
    }

    fn log_attempt(&mut self, action: Action, outcome: Outcome) {
        if let Some(log) = self.log.as_mut() {
            log.log_attempt(action, outcome);
        }
    }

    /// Run a gated operation on one actor, then bring its riders along
    fn gated<F>(&mut self, id: ActorId, action: Action, attempt: F) -> Result<Outcome>
    where
        F: FnOnce(&mut MovementGate<'_, M>, &mut Actor) -> Outcome,
    {
        let index = self.index_of(id)?;
        let outcome = if self.actors[index].boarded.is_some() {
            Outcome::Rejected(Rejection::Boarded)
        } else {
            let mut gate = MovementGate::new(&self.map, &mut self.registry, &self.rules);
            attempt(&mut gate, &mut self.actors[index])
        };
        if outcome.is_committed() {
            self.sync_riders(id);
        }
        self.log_attempt(action, outcome);
        Ok(outcome)
    }

    pub fn attempt_move(&mut self, id: ActorId, direction: Direction) -> Result<Outcome> {
        self.gated(id, Action::Move { actor: id, direction }, |gate, actor| {
            gate.attempt_move(actor, direction)
        })
    }

    pub fn attempt_diagonal(&mut self, id: ActorId, horizontal: Direction, vertical: Direction) -> Result<Outcome> {
        let action = Action::Diagonal { actor: id, horizontal, vertical };
        self.gated(id, action, |gate, actor| gate.attempt_diagonal(actor, horizontal, vertical))
    }

    pub fn attempt_turn(&mut self, id: ActorId, direction: Direction) -> Result<Outcome> {
        self.gated(id, Action::Turn { actor: id, direction }, |gate, actor| {
            gate.attempt_turn(actor, direction)
        })
    }

    pub fn attempt_turn_toward(&mut self, id: ActorId, target: Tile) -> Result<Outcome> {
        self.gated(id, Action::TurnToward { actor: id, target }, |gate, actor| {
            gate.attempt_turn_toward(actor, target)
        })
    }

    /// Face another actor's logical anchor
    pub fn attempt_turn_toward_actor(&mut self, id: ActorId, other: ActorId) -> Result<Outcome> {
        let target = self.actor(other)?.position();
        self.attempt_turn_toward(id, target)
    }

    pub fn attempt_jump(&mut self, id: ActorId, dx: i32, dy: i32) -> Result<Outcome> {
        self.gated(id, Action::Jump { actor: id, dx, dy }, |gate, actor| gate.attempt_jump(actor, dx, dy))
    }

    pub fn attempt_random_move<R: Rng + ?Sized>(&mut self, id: ActorId, rng: &mut R) -> Result<Outcome> {
        let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
        self.attempt_move(id, direction)
    }

    /// Exchange the places of two actors. Both move or neither does.
    pub fn attempt_swap(&mut self, a: ActorId, b: ActorId) -> Result<Outcome> {
        let ia = self.index_of(a)?;
        let ib = self.index_of(b)?;
        if ia == ib {
            return Ok(Outcome::Committed);
        }

        let outcome = if self.actors[ia].boarded.is_some() || self.actors[ib].boarded.is_some() {
            Outcome::Rejected(Rejection::Boarded)
        } else {
            let (first, second) = pair_mut(&mut self.actors, ia, ib);
            MovementGate::new(&self.map, &mut self.registry, &self.rules).attempt_swap(first, second)
        };
        if outcome.is_committed() {
            self.sync_riders(a);
            self.sync_riders(b);
        }
        self.log_attempt(Action::Swap { a, b }, outcome);
        Ok(outcome)
    }

    /// Commit the first step toward `goal` chosen by the pathfinder
    pub fn attempt_step_toward(&mut self, id: ActorId, goal: Tile) -> Result<Outcome> {
        match self.direction_toward(id, goal)? {
            Some(direction) => self.attempt_move(id, direction),
            None => Ok(Outcome::Committed),
        }
    }

    /// First step of a path toward `goal`, searched over the actor's shifted
    /// anchor with its real body. `None` when the actor is already there.
    pub fn direction_toward(&self, id: ActorId, goal: Tile) -> Result<Option<Direction>> {
        let actor = self.actor(id)?;
        let shift = actor.body.shape.anchor_shift();
        let start = actor.body.search_anchor();
        let map = &self.map;
        let goal = map.wrap(goal);

        let query = GateQuery::new(map, &self.registry, &self.rules);
        let can_pass = |tile: Tile, direction: Direction| {
            query.can_pass_from(actor, map.wrap(tile.offset(0, shift)), direction)
        };
        Ok(find_direction(map, start, goal, self.rules.search_limit, can_pass))
    }

    /// Actors the body would touch stepping in `direction`
    pub fn touch_front(&self, id: ActorId, direction: Direction) -> Result<Vec<ActorId>> {
        let actor = self.actor(id)?;
        Ok(GateQuery::new(&self.map, &self.registry, &self.rules).touch_front(actor, direction))
    }

    /// Teleport without validation
    pub fn locate(&mut self, id: ActorId, position: Tile) -> Result<()> {
        let index = self.index_of(id)?;
        let position = self.map.wrap(position);
        self.actors[index].body.position = position;
        self.refresh(index);
        self.sync_riders(id);
        if let Some(log) = self.log.as_mut() {
            log.log(Action::Locate { actor: id, position }, None);
        }
        Ok(())
    }

    /// Replace the actor's shape and recompute its footprint right away. No
    /// validation, like any shape assignment from the host.
    pub fn set_shape(&mut self, id: ActorId, shape: ShapeSpec) -> Result<()> {
        shape.validate()?;
        let index = self.index_of(id)?;
        self.actors[index].body.shape = shape;
        self.refresh(index);
        Ok(())
    }

    /// Back to a single-tile body; returns the shape it had
    pub fn reset_shape(&mut self, id: ActorId) -> Result<ShapeSpec> {
        let index = self.index_of(id)?;
        let old = self.actors[index].reset_shape();
        self.refresh(index);
        Ok(old)
    }

    pub fn set_through(&mut self, id: ActorId, through: bool) -> Result<()> {
        let index = self.index_of(id)?;
        self.actors[index].body.through = through;
        self.refresh(index);
        Ok(())
    }

    pub fn set_priority(&mut self, id: ActorId, priority: Priority) -> Result<()> {
        let index = self.index_of(id)?;
        self.actors[index].body.priority = priority;
        self.refresh(index);
        Ok(())
    }

    pub fn set_move_speed(&mut self, id: ActorId, speed: u8) -> Result<()> {
        let index = self.index_of(id)?;
        self.actors[index].body.move_speed = speed.clamp(1, 6);
        Ok(())
    }

    fn refresh(&mut self, index: usize) {
        let actor = &mut self.actors[index];
        if actor.boarded.is_some() {
            actor.body.shifted_anchor_y = actor.body.shape.shifted_anchor_y(actor.body.position.y);
            return;
        }
        tracker::recompute(actor, &self.map, &mut self.registry);
    }

    /// Riders stand on their vehicle's anchor and face its way, untracked
    fn sync_riders(&mut self, vehicle: ActorId) {
        let Some(carrier) = self.actors.iter().find(|a| a.id == vehicle) else {
            return;
        };
        let position = carrier.position();
        let facing = carrier.facing();
        for rider in self.actors.iter_mut().filter(|a| a.boarded == Some(vehicle)) {
            rider.body.position = position;
            rider.body.facing = facing;
            rider.body.shifted_anchor_y = rider.body.shape.shifted_anchor_y(position.y);
        }
    }

    /// Put the player in a vehicle. The player stops being tracked on its
    /// own: its registry entry goes away and it rides along on the vehicle's
    /// anchor until it alights.
    pub fn board(&mut self, player: ActorId, vehicle: ActorId) -> Result<()> {
        let pi = self.index_of(player)?;
        let vi = self.index_of(vehicle)?;
        let refuse = |reason| Err(Error::Boarding { actor: player, vehicle, reason });
        if !self.actors[pi].is_player() {
            return refuse("only the player can board");
        }
        if !self.actors[vi].is_vehicle() {
            return refuse("target is not a vehicle");
        }
        if self.actors[pi].boarded.is_some() {
            return refuse("already boarded");
        }

        self.registry.remove_for(player);
        let rider = &mut self.actors[pi];
        rider.boarded = Some(vehicle);
        rider.body.occupied_tiles.clear();
        self.sync_riders(vehicle);
        debug!("{} boarded {}", player, vehicle);
        if let Some(log) = self.log.as_mut() {
            log.log(Action::Board { player, vehicle }, None);
        }
        Ok(())
    }

    /// Step off the vehicle onto the adjacent tile in `direction`. The whole
    /// body is validated there; on rejection the player stays aboard.
    pub fn alight(&mut self, player: ActorId, direction: Direction) -> Result<Outcome> {
        let index = self.index_of(player)?;
        let Some(vehicle) = self.actors[index].boarded else {
            return Err(Error::NotBoarded(player));
        };
        let landing = self.map.step(self.actor(vehicle)?.position(), direction);

        let rider = &mut self.actors[index];
        let outcome = MovementGate::new(&self.map, &mut self.registry, &self.rules).attempt_place(rider, landing, direction);
        if outcome.is_committed() {
            rider.boarded = None;
            debug!("{} alighted from {} at {}", player, vehicle, landing);
        }
        self.log_attempt(Action::Alight { player, direction }, outcome);
        Ok(outcome)
    }

    /// Move the player to another map. Every actor except the player and the
    /// vehicle it rides is dropped, the registry starts empty and the player
    /// (or its vehicle) is registered at `position`.
    pub fn transfer(&mut self, map: M, player: ActorId, position: Tile) -> Result<()> {
        let index = self.index_of(player)?;
        let carrier = self.actors[index].boarded;

        self.map = map;
        self.registry.clear();
        self.actors.retain(|a| a.id == player || Some(a.id) == carrier);
        let position = self.map.wrap(position);

        match carrier {
            Some(vehicle) => {
                let vi = self.index_of(vehicle)?;
                let actor = &mut self.actors[vi];
                actor.body.position = position;
                tracker::recompute(actor, &self.map, &mut self.registry);
                self.sync_riders(vehicle);
            }
            None => {
                let pi = self.index_of(player)?;
                let actor = &mut self.actors[pi];
                actor.body.position = position;
                tracker::recompute(actor, &self.map, &mut self.registry);
            }
        }
        info!("transferred {} to {} ({} actors kept)", player, position, self.actors.len());
        if let Some(log) = self.log.as_mut() {
            log.log(Action::Transfer { position }, None);
        }
        Ok(())
    }

    /// Check that every tracked actor's registry entry matches its tiles
    pub fn is_consistent(&self) -> bool {
        self.actors.iter().all(|a| match a.boarded {
            Some(_) => self.registry.entry_for(a.id).is_none(),
            None => self.registry.entry_for(a.id) == Some(a.occupied_tiles()),
        })
    }
}

impl World<Grid> {
    /// Flip a tile between open and blocked
    pub fn toggle_cell(&mut self, x: i32, y: i32) {
        self.map.toggle(x, y);
        if let Some(log) = self.log.as_mut() {
            log.log(Action::ToggleCell { x, y }, None);
        }
    }
}

fn pair_mut(actors: &mut [Actor], a: usize, b: usize) -> (&mut Actor, &mut Actor) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = actors.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = actors.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::VehicleKind;

    fn world(width: i32, height: i32) -> World {
        World::new(Grid::new(width, height), MovementRules::default())
    }

    #[test]
    fn test_unknown_actor_is_an_error() {
        let mut world = world(5, 5);
        assert!(matches!(world.attempt_move(ActorId(9), Direction::Up), Err(Error::UnknownActor(ActorId(9)))));
        assert!(world.actor(ActorId(0)).is_err());
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut world = world(5, 5);
        let a = world.spawn(ActorKind::Player, Tile::new(1, 1), Direction::Down, ShapeSpec::default()).unwrap();
        world.remove(a).unwrap();
        let b = world.spawn(ActorKind::Player, Tile::new(1, 1), Direction::Down, ShapeSpec::default()).unwrap();
        assert_ne!(a, b);
        assert!(world.registry().entry_for(a).is_none());
    }

    #[test]
    fn test_spawn_rejects_malformed_shape() {
        let mut world = world(5, 5);
        let result = world.spawn(ActorKind::Player, Tile::new(1, 1), Direction::Down, ShapeSpec::circle(1, -1));
        assert!(matches!(result, Err(Error::InvalidShape(_))));
        assert_eq!(world.actors().count(), 0);
    }

    #[test]
    fn test_board_and_alight() {
        let mut world = world(10, 10);
        let player = world.spawn(ActorKind::Player, Tile::new(2, 2), Direction::Down, ShapeSpec::default()).unwrap();
        let boat = world
            .spawn(ActorKind::Vehicle { vehicle: VehicleKind::Boat }, Tile::new(3, 2), Direction::Down, ShapeSpec::default())
            .unwrap();

        world.board(player, boat).unwrap();
        assert!(world.registry().entry_for(player).is_none());
        assert_eq!(world.actor(player).unwrap().position(), Tile::new(3, 2));
        assert_eq!(world.attempt_move(player, Direction::Down).unwrap(), Outcome::Rejected(Rejection::Boarded));

        assert!(world.attempt_move(boat, Direction::Right).unwrap().is_committed());
        assert_eq!(world.actor(player).unwrap().position(), Tile::new(4, 2));
        assert!(world.is_consistent());

        assert!(world.alight(player, Direction::Down).unwrap().is_committed());
        assert_eq!(world.actor(player).unwrap().position(), Tile::new(4, 3));
        assert_eq!(world.occupant_at(Tile::new(4, 3), None), Some(player));
        assert!(world.is_consistent());
    }

    #[test]
    fn test_only_player_boards_vehicles() {
        let mut world = world(10, 10);
        let npc = world.spawn(ActorKind::Event { event_id: 1 }, Tile::new(2, 2), Direction::Down, ShapeSpec::default()).unwrap();
        let player = world.spawn(ActorKind::Player, Tile::new(5, 5), Direction::Down, ShapeSpec::default()).unwrap();
        assert!(matches!(world.board(npc, player), Err(Error::Boarding { .. })));
        assert!(matches!(world.board(player, npc), Err(Error::Boarding { .. })));
    }

    #[test]
    fn test_transfer_keeps_only_the_player() {
        let mut world = world(10, 10);
        let player = world.spawn(ActorKind::Player, Tile::new(2, 2), Direction::Down, ShapeSpec::rectangle_a(1, 0, 0)).unwrap();
        let npc = world.spawn(ActorKind::Event { event_id: 1 }, Tile::new(6, 6), Direction::Down, ShapeSpec::default()).unwrap();

        world.transfer(Grid::new(20, 20), player, Tile::new(15, 15)).unwrap();
        assert!(world.actor(npc).is_err());
        assert_eq!(world.registry().len(), 1);
        assert_eq!(world.occupied_tiles(player).unwrap(), &[Tile::new(15, 14), Tile::new(15, 15)]);
        assert_eq!(world.map().width(), 20);
    }

    #[test]
    fn test_direction_toward_uses_shifted_anchor() {
        let mut world = world(20, 20);
        // sprite size 5 lifts the search anchor two rows
        let npc = world
            .spawn(ActorKind::Event { event_id: 1 }, Tile::new(5, 10), Direction::Down, ShapeSpec::diamond(5, 0))
            .unwrap();
        assert_eq!(world.direction_toward(npc, Tile::new(5, 8)).unwrap(), None);
        assert_eq!(world.direction_toward(npc, Tile::new(5, 10)).unwrap(), Some(Direction::Down));
    }
}
