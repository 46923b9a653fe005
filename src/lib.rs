//! Robot Directions - a track puzzle game
//!
//! Core modules:
//! - `sim`: Level simulation (track decoding, movement, scoring)
//! - `game`: Game contract, inbound commands, the Directions game
//! - `registry`: Explicitly constructed game registry
//! - `persistence`: Level progress save/load
//! - `platform`: Browser/native platform abstraction
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod error;
pub mod game;
pub mod persistence;
pub mod platform;
pub mod registry;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, GameError, LevelError, PersistError, QueueError};
pub use game::{Command, DirectionsGame, Game, GameManifest};
pub use registry::GameRegistry;
pub use tuning::{Tuning, UnderrunPolicy};

/// Game configuration constants
pub mod consts {
    /// Attempt points granted at level entry
    pub const START_POINTS: u8 = 3;
    /// Pixel pitch of one track tile
    pub const TILE_SIZE: f32 = 64.0;
    /// Robot displacement per movement tick
    pub const ROBOT_STEP: f32 = 10.0;
    /// Frames between movement ticks while a run is in progress
    pub const RUN_CADENCE: f32 = 5.0;
    /// Frames between ticks while no run is in progress
    pub const IDLE_CADENCE: f32 = 15.0;
    /// Off-track scale lost per tick
    pub const FALL_SHRINK: f32 = 0.15;
    /// Scale below which the robot has fallen
    pub const FALL_THRESHOLD: f32 = 0.1;
    /// Frames (~1 s at 60 fps) between level complete and the next level
    pub const COMPLETION_DELAY: f32 = 60.0;

    /// Points value persisted for a level that was never completed
    pub const UNPLAYED_POINTS: i32 = -1;
}
