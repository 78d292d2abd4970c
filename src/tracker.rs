use crate::shape::resolve;
use crate::{Actor, Direction, MapView, OccupancyRegistry, Tile};

/// A candidate body state: where the actor would stand, which way it would
/// face and the tiles it would then cover. Building one never mutates the actor.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub position: Tile,
    pub facing: Direction,
    pub tiles: Vec<Tile>,
}

/// Tiles the actor would cover standing at `position` facing `facing`. A
/// through actor covers nothing.
pub fn footprint_at<M: MapView + ?Sized>(actor: &Actor, position: Tile, facing: Direction, map: &M) -> Vec<Tile> {
    if actor.body.through {
        return Vec::new();
    }
    resolve(position, facing, &actor.body.shape, map)
}

pub fn place<M: MapView + ?Sized>(actor: &Actor, position: Tile, facing: Direction, map: &M) -> Placement {
    Placement {
        position,
        facing,
        tiles: footprint_at(actor, position, facing, map),
    }
}

/// Install a placement: move the anchor, refresh the shifted anchor, store
/// the tiles and publish them to the registry.
pub fn commit(actor: &mut Actor, placement: Placement, registry: &mut OccupancyRegistry) {
    let body = &mut actor.body;
    body.position = placement.position;
    body.facing = placement.facing;
    body.shifted_anchor_y = body.shape.shifted_anchor_y(body.position.y);
    body.occupied_tiles = placement.tiles;
    registry.update(actor.id, body.blocks_others(), body.occupied_tiles.clone());
}

/// Recompute the actor's tiles from its current position, facing and shape
/// and publish them. Always succeeds, even if the result overlaps walls or
/// other actors.
pub fn recompute<'a, M: MapView + ?Sized>(
    actor: &'a mut Actor,
    map: &M,
    registry: &mut OccupancyRegistry,
) -> &'a [Tile] {
    let placement = place(actor, actor.body.position, actor.body.facing, map);
    commit(actor, placement, registry);
    debug_assert_eq!(
        registry.entry_for(actor.id),
        Some(actor.body.occupied_tiles.as_slice()),
        "registry out of sync for actor {}",
        actor.id
    );
    &actor.body.occupied_tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActorId, ActorKind, Grid, Occupant, ShapeSpec};

    #[test]
    fn test_recompute_publishes_to_registry() {
        let grid = Grid::new(20, 20);
        let mut registry = OccupancyRegistry::new();
        let mut actor = Actor::new(
            ActorId(0),
            ActorKind::Event { event_id: 1 },
            Tile::new(10, 10),
            Direction::Down,
            ShapeSpec::rectangle_b(7, 1, 1, 1, 0),
        );

        let tiles = recompute(&mut actor, &grid, &mut registry).to_vec();
        assert_eq!(tiles.len(), 6);
        assert_eq!(actor.body.shifted_anchor_y, 7);
        assert_eq!(registry.entry_for(ActorId(0)), Some(tiles.as_slice()));
    }

    #[test]
    fn test_through_actor_publishes_empty_footprint() {
        let grid = Grid::new(5, 5);
        let mut registry = OccupancyRegistry::new();
        let mut actor = Actor::new(ActorId(2), ActorKind::Player, Tile::new(1, 1), Direction::Up, ShapeSpec::default());
        actor.body.through = true;

        assert!(recompute(&mut actor, &grid, &mut registry).is_empty());
        assert_eq!(registry.occupant_at(Tile::new(1, 1), None), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_place_does_not_mutate() {
        let grid = Grid::new(5, 5);
        let actor = Actor::new(ActorId(0), ActorKind::Player, Tile::new(1, 1), Direction::Up, ShapeSpec::default());
        let placement = place(&actor, Tile::new(2, 1), Direction::Right, &grid);
        assert_eq!(placement.tiles, vec![Tile::new(2, 1)]);
        assert_eq!(actor.position(), Tile::new(1, 1));
        assert_eq!(actor.facing(), Direction::Up);
    }
}
