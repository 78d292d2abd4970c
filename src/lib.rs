pub mod action_log;
pub mod actor;
pub mod config;
pub mod direction;
pub mod error;
pub mod gate;
pub mod grid;
pub mod pathfinding;
pub mod registry;
pub mod shape;
pub mod tile;
pub mod tracker;
pub mod world;

pub use actor::{Actor, ActorId, ActorKind, Occupant, Priority, VehicleKind};
pub use direction::Direction;
pub use error::{Error, Result};
pub use gate::{GateQuery, MovementGate, MovementRules, Outcome, Rejection};
pub use grid::{Grid, MapView, Passage};
pub use pathfinding::find_direction;
pub use registry::OccupancyRegistry;
pub use shape::{resolve, ShapeKind, ShapeSpec};
pub use tile::Tile;
pub use world::World;
