//! Run state and outbound events

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::direction::Direction;
use super::level::Track;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Robot parked on the start tile, directions editable
    Idle,
    /// Robot walking, one step per run tick
    Running,
    /// Robot fell off; waits out the penalty pause, then resets to `Idle`
    Fell { ticks_left: u32 },
    /// Robot reached the finish
    Finished,
}

/// Transient robot state, owned by the simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Bumped on every start and reset; ties delayed work to one run
    pub run_id: u64,
    pub phase: RunPhase,
    /// Pixel position (tile centres at `coord * tile_size`)
    pub position: Vec2,
    pub facing: Direction,
    /// Tile occupied on the previous tick; the departure end right after a
    /// teleport
    pub tile: IVec2,
    /// Junction decisions already taken this run
    pub consumed: usize,
    /// Visual scale, shrinks while off track
    pub fall_scale: f32,
    /// Frames accumulated toward the next tick
    pub accumulator: f32,
}

impl RunState {
    /// Robot parked at the start tile
    pub fn at_start(track: &Track, tile_size: f32) -> Self {
        Self {
            run_id: 0,
            phase: RunPhase::Idle,
            position: track.start.as_vec2() * tile_size,
            facing: track.start_facing,
            tile: track.start,
            consumed: 0,
            fall_scale: 1.0,
            accumulator: 0.0,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }
}

/// Events raised by the simulation and the game for the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    LevelEntered {
        level: usize,
    },
    RunStarted {
        run_id: u64,
    },
    /// Start pressed while running: the run was stopped and reset
    RunCancelled,
    /// Robot back on the start tile
    RunReset,
    Moved {
        position: Vec2,
        tile: IVec2,
    },
    Falling {
        scale: f32,
    },
    FellOff,
    /// Penalty pause over, robot back on the start tile
    Recovered,
    Teleported {
        from: IVec2,
        to: IVec2,
        facing: Direction,
    },
    BlockedReversed {
        at: IVec2,
        facing: Direction,
    },
    JunctionConsumed {
        at: IVec2,
        index: usize,
        direction: Direction,
    },
    /// Junction reached with no direction left in the queue
    QueueUnderrun {
        at: IVec2,
    },
    ReachedFinish,
    PointsChanged {
        points: u8,
    },
    LevelComplete {
        level: usize,
        /// Points left on this attempt
        points: u8,
        /// Score stored for the level (first completion wins)
        recorded: u8,
        /// Level unlocked by this completion, if any
        next: Option<usize>,
    },
    ShowLevelSelection,
    SaveFailed {
        reason: String,
    },
}
