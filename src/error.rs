//! Error types

use std::io;

use glam::IVec2;
use thiserror::Error;

use crate::sim::TileKind;

/// Level artwork decode and level data validation failures
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level image has no pixels")]
    EmptyImage,
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("no start (red) pixel in level image")]
    MissingStart,
    #[error("no finish (green) pixel in level image")]
    MissingFinish,
    #[error("more than one {marker} pixel: {first} and {second}")]
    DuplicateMarker {
        marker: &'static str,
        first: IVec2,
        second: IVec2,
    },
    #[error("{marker} tile at {at} is {kind:?}, expected a straight piece")]
    EndpointNotStraight {
        marker: &'static str,
        at: IVec2,
        kind: TileKind,
    },
    #[error("{what} at {at} is not on the track")]
    OffTrack { what: &'static str, at: IVec2 },
    #[error("tile {at} belongs to more than one teleporter")]
    TeleporterOverlap { at: IVec2 },
    #[error("teleporter {color:#08x} links a tile to itself")]
    TeleporterDegenerate { color: u32 },
    #[error("cannot decode level image: {0}")]
    Image(#[from] image::ImageError),
}

/// Direction queue edits rejected by the queue
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("directions cannot be edited while the robot is running")]
    Locked,
    #[error("no queued direction at {index} (queue holds {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Tuning / manifest configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tuning value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Save hook failures
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("save data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Storage(String),
    #[error("unsupported save version {0}")]
    UnsupportedVersion(u32),
}

/// Navigation and gameplay command failures
#[derive(Debug, Error)]
pub enum GameError {
    #[error("unknown game `{0}`")]
    UnknownGame(String),
    #[error("unknown level {index} (game has {count})")]
    UnknownLevel { index: usize, count: usize },
    #[error("level {0} is locked")]
    LevelLocked(usize),
    #[error("no level entered")]
    NoLevel,
    #[error("cannot read level asset `{name}`: {source}")]
    Asset {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("level {index} failed to load: {source}")]
    Level {
        index: usize,
        #[source]
        source: LevelError,
    },
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
