//! Frame-driven movement simulation
//!
//! The robot advances a fixed step per run tick along its facing. Tile
//! membership uses a trailing lookback, so a tile counts as entered only once
//! the robot has reached its centre.

use glam::{IVec2, Vec2};

use super::direction::Direction;
use super::level::LevelModel;
use super::queue::DirectionQueue;
use super::state::{GameEvent, RunPhase, RunState};
use crate::tuning::{Tuning, UnderrunPolicy};

/// Movement state machine for one level
#[derive(Debug, Clone)]
pub struct Simulator {
    state: RunState,
    tuning: Tuning,
}

impl Simulator {
    pub fn new(level: &LevelModel, tuning: Tuning) -> Self {
        Self {
            state: RunState::at_start(&level.track, tuning.tile_size),
            tuning,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn phase(&self) -> RunPhase {
        self.state.phase
    }

    pub fn run_id(&self) -> u64 {
        self.state.run_id
    }

    /// Start command.
    ///
    /// While running this acts as cancel: the run is stopped and reset and
    /// `RunCancelled` is reported instead of `RunStarted`.
    pub fn start(
        &mut self,
        level: &LevelModel,
        queue: &mut DirectionQueue,
        events: &mut Vec<GameEvent>,
    ) {
        match self.state.phase {
            RunPhase::Running => {
                self.stop(level, queue);
                events.push(GameEvent::RunCancelled);
                log::info!("Run cancelled");
                return;
            }
            RunPhase::Fell { .. } | RunPhase::Finished => self.stop(level, queue),
            RunPhase::Idle => {}
        }

        self.state.run_id += 1;
        self.state.phase = RunPhase::Running;
        self.state.consumed = 0;
        self.state.accumulator = 0.0;
        queue.lock();

        log::info!(
            "Run {} started on level {} with {} directions",
            self.state.run_id,
            level.index + 1,
            queue.len()
        );
        events.push(GameEvent::RunStarted {
            run_id: self.state.run_id,
        });
    }

    /// Stop and reset: robot back on the start tile, queue editable again.
    /// The queue contents are kept.
    pub fn stop(&mut self, level: &LevelModel, queue: &mut DirectionQueue) {
        let run_id = self.state.run_id + 1;
        self.state = RunState::at_start(&level.track, self.tuning.tile_size);
        self.state.run_id = run_id;
        queue.unlock();
    }

    /// Feed elapsed frames; performs at most one tick once the cadence for the
    /// current phase has accumulated
    pub fn update(
        &mut self,
        level: &LevelModel,
        queue: &mut DirectionQueue,
        frames: f32,
        events: &mut Vec<GameEvent>,
    ) {
        let cadence = match self.state.phase {
            RunPhase::Running => self.tuning.run_cadence,
            _ => self.tuning.idle_cadence,
        };
        self.state.accumulator += frames;
        if self.state.accumulator < cadence {
            return;
        }
        self.state.accumulator = 0.0;

        match self.state.phase {
            RunPhase::Running => self.step(level, queue, events),
            RunPhase::Fell { ticks_left } if ticks_left > 1 => {
                self.state.phase = RunPhase::Fell {
                    ticks_left: ticks_left - 1,
                };
            }
            RunPhase::Fell { .. } => {
                self.stop(level, queue);
                events.push(GameEvent::Recovered);
            }
            RunPhase::Idle | RunPhase::Finished => {}
        }
    }

    /// Tile the robot is on, judged from its trailing edge
    fn tile_under(&self, delta: Vec2) -> IVec2 {
        let t = &self.tuning;
        ((self.state.position - delta * t.lookback) / t.tile_size)
            .round()
            .as_ivec2()
    }

    /// Advance the robot by one step. No-op unless running.
    pub fn step(
        &mut self,
        level: &LevelModel,
        queue: &mut DirectionQueue,
        events: &mut Vec<GameEvent>,
    ) {
        if self.state.phase != RunPhase::Running {
            return;
        }

        let delta = self.state.facing.delta().as_vec2();
        self.state.position += delta * self.tuning.step;
        let tile = self.tile_under(delta);
        let kind = level.track.tile(tile);
        let previous = std::mem::replace(&mut self.state.tile, tile);
        events.push(GameEvent::Moved {
            position: self.state.position,
            tile,
        });

        // Off track: keep walking while shrinking
        if !kind.is_track() {
            self.state.fall_scale -= self.tuning.fall_shrink;
            events.push(GameEvent::Falling {
                scale: self.state.fall_scale,
            });
            if self.state.fall_scale < self.tuning.fall_threshold {
                self.fall(level, queue, events);
            }
            return;
        }

        if tile == level.track.finish {
            self.state.phase = RunPhase::Finished;
            queue.unlock();
            log::info!("Run {} reached the finish", self.state.run_id);
            events.push(GameEvent::ReachedFinish);
            return;
        }

        let entered = tile != previous;

        if entered && level.is_blocking(tile) {
            self.state.facing = self.state.facing.reversed();
            log::debug!("Blocked at {}, now facing {:?}", tile, self.state.facing);
            events.push(GameEvent::BlockedReversed {
                at: tile,
                facing: self.state.facing,
            });
            return;
        }

        // Edge-triggered: only when arriving from outside the pair
        if let Some(pair) = level.teleporter_at(tile)
            && !pair.contains(previous)
            && let Some(dest) = pair.other(tile)
        {
            // `tile` keeps the departure end so the next tick counts as
            // entering the destination
            self.state.position = dest.as_vec2() * self.tuning.tile_size;
            self.state.tile = tile;
            if let Some(facing) = level.track.facing_at(dest) {
                self.state.facing = facing;
            }
            log::debug!("Teleported {} -> {}", tile, dest);
            events.push(GameEvent::Teleported {
                from: tile,
                to: dest,
                facing: self.state.facing,
            });
            return;
        }

        let via_teleport =
            entered && level.teleporter_at(tile).is_some_and(|pair| pair.contains(previous));
        if (via_teleport || kind != level.track.tile(previous)) && !kind.is_straight() {
            self.take_junction(level, queue, tile, events);
        }
    }

    fn take_junction(
        &mut self,
        level: &LevelModel,
        queue: &mut DirectionQueue,
        at: IVec2,
        events: &mut Vec<GameEvent>,
    ) {
        match queue.get(self.state.consumed) {
            Some(direction) => {
                self.turn(direction);
                events.push(GameEvent::JunctionConsumed {
                    at,
                    index: self.state.consumed,
                    direction,
                });
                self.state.consumed += 1;
            }
            None => {
                log::warn!("No direction queued for junction at {}", at);
                events.push(GameEvent::QueueUnderrun { at });
                if self.tuning.underrun == UnderrunPolicy::FailRun {
                    self.fall(level, queue, events);
                }
            }
        }
    }

    fn turn(&mut self, direction: Direction) {
        log::debug!("Turning {:?} -> {:?}", self.state.facing, direction);
        self.state.facing = direction;
    }

    fn fall(
        &mut self,
        level: &LevelModel,
        queue: &mut DirectionQueue,
        events: &mut Vec<GameEvent>,
    ) {
        log::info!("Run {} fell off the track", self.state.run_id);
        queue.unlock();
        events.push(GameEvent::FellOff);
        if self.tuning.fall_penalty_ticks == 0 {
            self.stop(level, queue);
            events.push(GameEvent::Recovered);
        } else {
            self.state.phase = RunPhase::Fell {
                ticks_left: self.tuning.fall_penalty_ticks,
            };
            self.state.accumulator = 0.0;
        }
    }
}
