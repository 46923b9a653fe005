//! Game contract and the Directions game
//!
//! The UI layer drives a game through [`Command`]s and per-frame
//! [`Game::update`] calls, and reacts to the returned [`GameEvent`]s.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, GameError, PersistError};
use crate::persistence::{SaveData, SaveStore};
use crate::platform::{self, AssetSource};
use crate::sim::{
    Direction, DirectionQueue, GameEvent, LevelDef, LevelModel, LevelProgress, RunPhase,
    ScoreKeeper, Simulator, TeleporterDef, TileKind, decode_png, decode_track,
};
use crate::tuning::Tuning;

/// Inbound commands from the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Start a run; while running, stop and reset instead
    StartRun,
    StopRun,
    AppendDirection { direction: Direction },
    RemoveDirection { index: usize },
    /// Reset button: stop the run and drop every queued direction
    ClearDirections,
    EnterLevel { level: usize },
    /// Layout only
    Resize { width: f32, height: f32 },
    /// Debug: unlock every level
    UnlockAll,
    /// Debug: jump to the next level
    SkipLevel,
}

/// Capability contract every game implements
pub trait Game {
    fn name(&self) -> &str;
    fn level_count(&self) -> usize;
    fn level_progress(&self, index: usize) -> Option<LevelProgress>;
    fn current_level_index(&self) -> Option<usize>;
    /// Enter a level (zero-based)
    fn init(&mut self, level: usize) -> Result<Vec<GameEvent>, GameError>;
    fn resize(&mut self, width: f32, height: f32);
    fn handle(&mut self, command: Command) -> Result<Vec<GameEvent>, GameError>;
    /// Advance by `frames` rendering frames (60 per second)
    fn update(&mut self, frames: f32) -> Vec<GameEvent>;
    fn save(&mut self) -> Result<(), PersistError>;
    fn load(&mut self) -> Result<(), PersistError>;
    /// What the UI draws for the level being played
    fn snapshot(&self) -> Option<LevelSnapshot>;
}

fn default_name() -> String {
    "Directions".to_string()
}

/// Everything needed to build a game: tuning plus the level list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameManifest {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub tuning: Tuning,
    pub levels: Vec<LevelDef>,
}

impl GameManifest {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let manifest: GameManifest = serde_json::from_str(json)?;
        manifest.tuning.validate()?;
        Ok(manifest)
    }
}

/// A level is decoded on first entry and cached afterwards
#[derive(Debug, Clone)]
enum LevelSlot {
    Pending {
        def: LevelDef,
        progress: LevelProgress,
    },
    Loaded(LevelModel),
}

impl LevelSlot {
    fn progress(&self) -> &LevelProgress {
        match self {
            LevelSlot::Pending { progress, .. } => progress,
            LevelSlot::Loaded(model) => &model.progress,
        }
    }

    fn progress_mut(&mut self) -> &mut LevelProgress {
        match self {
            LevelSlot::Pending { progress, .. } => progress,
            LevelSlot::Loaded(model) => &mut model.progress,
        }
    }

    fn model(&self) -> Option<&LevelModel> {
        match self {
            LevelSlot::Loaded(model) => Some(model),
            LevelSlot::Pending { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    NextLevel(usize),
    LevelSelection,
}

/// Delayed transition after a level is completed, bound to the run that
/// completed it
#[derive(Debug, Clone, Copy)]
struct PendingTransition {
    run_id: u64,
    frames_left: f32,
    target: Transition,
}

/// State of the level being played
#[derive(Debug)]
struct Session {
    level: usize,
    sim: Simulator,
    queue: DirectionQueue,
    score: ScoreKeeper,
    pending: Option<PendingTransition>,
}

/// Screen size and the scale that fits the track field into it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub field_scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            field_scale: 1.0,
        }
    }
}

/// Robot pose for drawing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotSnapshot {
    pub position: Vec2,
    pub tile: IVec2,
    pub facing: Direction,
    /// Sprite rotation in radians
    pub rotation: f32,
    /// Shrinks while falling off the track
    pub scale: f32,
    pub running: bool,
}

/// Drawable state of the level being played
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSnapshot {
    pub level: usize,
    pub tile_size: f32,
    pub field_scale: f32,
    /// Tile kinds, one row per entry, top to bottom
    pub tiles: Vec<Vec<TileKind>>,
    pub start: IVec2,
    pub finish: IVec2,
    pub start_facing: Direction,
    pub finish_facing: Direction,
    /// Finish marker rotation in radians
    pub finish_rotation: f32,
    /// Sorted row-major
    pub blocking: Vec<IVec2>,
    pub teleporters: Vec<TeleporterDef>,
    pub queue: Vec<Direction>,
    /// Queued directions already taken this run
    pub consumed: usize,
    pub points: u8,
    pub robot: RobotSnapshot,
}

/// The track puzzle: queue turns, run the robot, reach the finish
pub struct DirectionsGame {
    name: String,
    tuning: Tuning,
    levels: Vec<LevelSlot>,
    assets: Box<dyn AssetSource>,
    store: Box<dyn SaveStore>,
    session: Option<Session>,
    viewport: Viewport,
}

impl DirectionsGame {
    pub fn new(
        manifest: GameManifest,
        assets: Box<dyn AssetSource>,
        store: Box<dyn SaveStore>,
    ) -> Self {
        let levels = manifest
            .levels
            .into_iter()
            .enumerate()
            .map(|(i, def)| LevelSlot::Pending {
                def,
                progress: LevelProgress {
                    // first level is always open
                    unlocked: i == 0,
                    best: None,
                },
            })
            .collect();
        Self {
            name: manifest.name,
            tuning: manifest.tuning,
            levels,
            assets,
            store,
            session: None,
            viewport: Viewport::default(),
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Decoded model of the level being played
    pub fn level(&self) -> Option<&LevelModel> {
        let session = self.session.as_ref()?;
        self.levels[session.level].model()
    }

    pub fn queue(&self) -> Option<&DirectionQueue> {
        self.session.as_ref().map(|s| &s.queue)
    }

    pub fn simulator(&self) -> Option<&Simulator> {
        self.session.as_ref().map(|s| &s.sim)
    }

    /// Points left on the current attempt
    pub fn points(&self) -> Option<u8> {
        self.session.as_ref().map(|s| s.score.points())
    }

    /// Decode a level's artwork unless it is already cached
    fn ensure_loaded(&mut self, index: usize) -> Result<(), GameError> {
        let LevelSlot::Pending { def, progress } = &self.levels[index] else {
            return Ok(());
        };

        let bytes = self.assets.read(&def.asset).map_err(|source| GameError::Asset {
            name: def.asset.clone(),
            source,
        })?;
        let model = decode_png(&bytes)
            .and_then(|pixmap| decode_track(&pixmap))
            .and_then(|track| LevelModel::build(index, def, track, *progress))
            .map_err(|source| GameError::Level { index, source })?;

        log::info!(
            "Level {} decoded: {}x{} tiles, {} blocking, {} teleporters",
            index + 1,
            model.track.width(),
            model.track.height(),
            model.blocking().count(),
            model.teleporters().count()
        );
        self.levels[index] = LevelSlot::Loaded(model);
        Ok(())
    }

    fn session_mut(&mut self) -> Result<&mut Session, GameError> {
        self.session.as_mut().ok_or(GameError::NoLevel)
    }

    /// Stop any run and cancel a pending transition
    fn stop_run(&mut self, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        let session = self.session.as_mut().ok_or(GameError::NoLevel)?;
        let level = self.levels[session.level].model().ok_or(GameError::NoLevel)?;
        session.sim.stop(level, &mut session.queue);
        session.pending = None;
        events.push(GameEvent::RunReset);
        Ok(())
    }

    fn start_run(&mut self, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        let session = self.session.as_mut().ok_or(GameError::NoLevel)?;
        let level = self.levels[session.level].model().ok_or(GameError::NoLevel)?;
        session.sim.start(level, &mut session.queue, events);
        session.pending = None;
        Ok(())
    }

    /// Apply score, unlock and save for a completed level, then schedule the
    /// transition
    fn complete_level(&mut self, events: &mut Vec<GameEvent>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let index = session.level;
        let points = session.score.points();
        let recorded = session.score.on_success(self.levels[index].progress_mut());
        let run_id = session.sim.run_id();

        let next = index + 1;
        let next = match self.levels.get_mut(next) {
            Some(slot) => {
                slot.progress_mut().unlocked = true;
                Some(next)
            }
            None => None,
        };

        log::info!(
            "Level {} complete with {} points (recorded {})",
            index + 1,
            points,
            recorded
        );
        events.push(GameEvent::LevelComplete {
            level: index,
            points,
            recorded,
            next,
        });

        if let Err(e) = self.save() {
            log::warn!("Failed to save progress: {}", e);
            events.push(GameEvent::SaveFailed {
                reason: e.to_string(),
            });
        }

        if let Some(session) = self.session.as_mut() {
            session.pending = Some(PendingTransition {
                run_id,
                frames_left: self.tuning.completion_delay,
                target: next.map_or(Transition::LevelSelection, Transition::NextLevel),
            });
        }
    }

    /// Count down a pending transition; returns it once due
    fn due_transition(&mut self, frames: f32) -> Option<Transition> {
        let session = self.session.as_mut()?;
        let pending = session.pending.as_mut()?;
        if pending.run_id != session.sim.run_id() {
            log::debug!("Dropping transition of stale run {}", pending.run_id);
            session.pending = None;
            return None;
        }
        pending.frames_left -= frames;
        if pending.frames_left > 0.0 {
            return None;
        }
        let target = pending.target;
        session.pending = None;
        Some(target)
    }

    fn fire(&mut self, transition: Transition, events: &mut Vec<GameEvent>) {
        match transition {
            Transition::NextLevel(index) => match self.init(index) {
                Ok(entered) => events.extend(entered),
                Err(e) => {
                    log::warn!("Cannot advance to level {}: {}", index + 1, e);
                    self.session = None;
                    events.push(GameEvent::ShowLevelSelection);
                }
            },
            Transition::LevelSelection => {
                self.session = None;
                events.push(GameEvent::ShowLevelSelection);
            }
        }
    }

    fn refit(&mut self) {
        let field = self.level().map(|level| {
            let ts = self.tuning.tile_size;
            (
                level.track.width() as f32 * ts,
                level.track.height() as f32 * ts,
            )
        });
        self.viewport.field_scale = match field {
            Some((fw, fh)) if self.viewport.width > 0.0 && self.viewport.height > 0.0 => {
                (self.viewport.width / fw).min(self.viewport.height / fh)
            }
            _ => 1.0,
        };
    }
}

impl Game for DirectionsGame {
    fn name(&self) -> &str {
        &self.name
    }

    fn level_count(&self) -> usize {
        self.levels.len()
    }

    fn level_progress(&self, index: usize) -> Option<LevelProgress> {
        self.levels.get(index).map(|slot| *slot.progress())
    }

    fn current_level_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.level)
    }

    fn init(&mut self, level: usize) -> Result<Vec<GameEvent>, GameError> {
        let slot = self.levels.get(level).ok_or(GameError::UnknownLevel {
            index: level,
            count: self.levels.len(),
        })?;
        if !slot.progress().unlocked {
            return Err(GameError::LevelLocked(level));
        }
        self.ensure_loaded(level)?;

        let model = self.levels[level].model().ok_or(GameError::NoLevel)?;
        let score = ScoreKeeper::new(self.tuning.start_points);
        self.session = Some(Session {
            level,
            sim: Simulator::new(model, self.tuning.clone()),
            queue: DirectionQueue::new(),
            score,
            pending: None,
        });
        self.refit();

        log::info!(
            "Entered level {} (underrun: {})",
            level + 1,
            self.tuning.underrun.as_str()
        );
        Ok(vec![
            GameEvent::LevelEntered { level },
            GameEvent::PointsChanged {
                points: score.points(),
            },
        ])
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.viewport.width = width;
        self.viewport.height = height;
        self.refit();
    }

    fn handle(&mut self, command: Command) -> Result<Vec<GameEvent>, GameError> {
        let mut events = Vec::new();
        match command {
            Command::StartRun => self.start_run(&mut events)?,
            Command::StopRun => self.stop_run(&mut events)?,
            Command::AppendDirection { direction } => {
                self.session_mut()?.queue.push(direction)?;
            }
            Command::RemoveDirection { index } => {
                self.session_mut()?.queue.remove(index)?;
            }
            Command::ClearDirections => {
                self.stop_run(&mut events)?;
                self.session_mut()?.queue.clear()?;
            }
            Command::EnterLevel { level } => events = self.init(level)?,
            Command::Resize { width, height } => self.resize(width, height),
            Command::UnlockAll => {
                log::info!("Unlocking all levels");
                for slot in &mut self.levels {
                    slot.progress_mut().unlocked = true;
                }
            }
            Command::SkipLevel => {
                let current = self.current_level_index().ok_or(GameError::NoLevel)?;
                let next = current + 1;
                if let Some(slot) = self.levels.get_mut(next) {
                    slot.progress_mut().unlocked = true;
                }
                events = self.init(next)?;
            }
        }
        Ok(events)
    }

    fn update(&mut self, frames: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if let Some(transition) = self.due_transition(frames) {
            self.fire(transition, &mut events);
            return events;
        }

        let Some(session) = self.session.as_mut() else {
            return events;
        };
        let Some(level) = self.levels[session.level].model() else {
            return events;
        };
        let was_running = session.sim.phase() == RunPhase::Running;
        let first = events.len();
        session.sim.update(level, &mut session.queue, frames, &mut events);

        let mut finished = false;
        let mut fell = 0;
        for event in &events[first..] {
            match event {
                GameEvent::FellOff => fell += 1,
                GameEvent::ReachedFinish => finished = true,
                _ => {}
            }
        }
        for _ in 0..fell {
            let points = session.score.on_failure();
            events.push(GameEvent::PointsChanged { points });
        }
        if finished && was_running {
            self.complete_level(&mut events);
        }
        events
    }

    fn save(&mut self) -> Result<(), PersistError> {
        let data = SaveData::new(
            self.levels.iter().map(LevelSlot::progress),
            platform::now_ms(),
        );
        self.store.store(&data)
    }

    fn load(&mut self) -> Result<(), PersistError> {
        let Some(data) = self.store.fetch()? else {
            log::info!("No saved progress, starting fresh");
            return Ok(());
        };
        for (i, slot) in self.levels.iter_mut().enumerate() {
            if let Some(mut progress) = data.progress(i) {
                progress.unlocked |= i == 0;
                *slot.progress_mut() = progress;
            }
        }
        log::info!(
            "Loaded progress for {} levels (last visit {})",
            data.levels.len(),
            data.last_visit
        );
        Ok(())
    }

    fn snapshot(&self) -> Option<LevelSnapshot> {
        let session = self.session.as_ref()?;
        let level = self.level()?;
        let track = &level.track;
        let run = session.sim.state();

        let mut blocking: Vec<IVec2> = level.blocking().collect();
        blocking.sort_by_key(|at| (at.y, at.x));

        Some(LevelSnapshot {
            level: session.level,
            tile_size: self.tuning().tile_size,
            field_scale: self.viewport.field_scale,
            tiles: track.rows().map(<[TileKind]>::to_vec).collect(),
            start: track.start,
            finish: track.finish,
            start_facing: track.start_facing,
            finish_facing: track.finish_facing,
            finish_rotation: track.finish_facing.rotation(),
            blocking,
            teleporters: level
                .teleporters()
                .map(|pair| TeleporterDef {
                    color: pair.color,
                    a: pair.a,
                    b: pair.b,
                })
                .collect(),
            queue: session.queue.as_slice().to_vec(),
            consumed: run.consumed,
            points: session.score.points(),
            robot: RobotSnapshot {
                position: run.position,
                tile: run.tile,
                facing: run.facing,
                rotation: run.facing.rotation(),
                scale: run.fall_scale,
                running: run.is_running(),
            },
        })
    }
}
