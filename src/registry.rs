use crate::{ActorId, Tile};

/// One actor's published footprint
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyEntry {
    pub actor: ActorId,
    /// Whether this footprint blocks other actors (same priority, not through)
    pub solid: bool,
    pub tiles: Vec<Tile>,
}

/// Map-scoped table of every tracked actor's occupied tiles.
///
/// At most one entry per actor; entries are replaced wholesale, never merged.
/// Tiles may appear in several entries; overlap is resolved at query time by
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct OccupancyRegistry {
    entries: Vec<OccupancyEntry>,
}

impl OccupancyRegistry {
    pub fn new() -> Self {
        OccupancyRegistry { entries: Vec::new() }
    }

    /// Replace the actor's entry, or append one if it has none
    pub fn update(&mut self, actor: ActorId, solid: bool, tiles: Vec<Tile>) {
        let entry = OccupancyEntry { actor, solid, tiles };
        match self.entries.iter_mut().find(|e| e.actor == actor) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// First actor, in registration order, whose tiles contain `tile`.
    /// `asking` is skipped so an actor never finds itself.
    pub fn occupant_at(&self, tile: Tile, asking: Option<ActorId>) -> Option<ActorId> {
        self.entries
            .iter()
            .filter(|e| Some(e.actor) != asking)
            .find(|e| e.tiles.contains(&tile))
            .map(|e| e.actor)
    }

    /// First solid occupant of `tile` other than the excluded actors
    pub fn blocker_at(&self, tile: Tile, excluded: &[ActorId]) -> Option<ActorId> {
        self.entries
            .iter()
            .filter(|e| e.solid && !excluded.contains(&e.actor))
            .find(|e| e.tiles.contains(&tile))
            .map(|e| e.actor)
    }

    pub fn entry_for(&self, actor: ActorId) -> Option<&[Tile]> {
        self.entries.iter().find(|e| e.actor == actor).map(|e| e.tiles.as_slice())
    }

    /// Drop the actor's entry. Returns whether one existed.
    pub fn remove_for(&mut self, actor: ActorId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.actor != actor);
        self.entries.len() != before
    }

    /// Clear all entries (map transfer)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OccupancyEntry> {
        self.entries.iter()
    }
}
