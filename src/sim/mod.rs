//! Level simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Frame-driven ticks only, no timers or threads
//! - Level data is immutable once decoded
//! - No rendering or platform dependencies

pub mod decode;
pub mod direction;
pub mod level;
pub mod queue;
pub mod score;
pub mod state;
pub mod tick;
pub mod tile;

pub use decode::{Pixmap, decode_png, decode_track};
pub use direction::Direction;
pub use level::{LevelDef, LevelModel, LevelProgress, TeleporterDef, TeleporterPair, Track};
pub use queue::DirectionQueue;
pub use score::ScoreKeeper;
pub use state::{GameEvent, RunPhase, RunState};
pub use tick::Simulator;
pub use tile::TileKind;
