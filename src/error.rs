use crate::shape::ShapeError;
use crate::ActorId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to (de)serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid shape: {0}")]
    InvalidShape(#[from] ShapeError),
    #[error("Unknown actor {0}")]
    UnknownActor(ActorId),
    #[error("Actor {actor} can't board {vehicle}: {reason}")]
    Boarding {
        actor: ActorId,
        vehicle: ActorId,
        reason: &'static str,
    },
    #[error("Actor {0} is not riding a vehicle")]
    NotBoarded(ActorId),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
