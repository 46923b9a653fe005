//! Robot Directions entry point
//!
//! In the browser this exposes `WebGame` to the page script. Natively it runs
//! one level headlessly from the command line.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use wasm_bindgen::prelude::*;

    use robot_directions::audio::SoundCue;
    use robot_directions::persistence::{LevelRecord, LocalStorageStore};
    use robot_directions::platform::MemoryAssets;
    use robot_directions::sim::GameEvent;
    use robot_directions::{Command, DirectionsGame, Game, GameManifest, GameRegistry};

    fn js_err(e: impl std::fmt::Display) -> JsValue {
        JsValue::from_str(&e.to_string())
    }

    /// Game handle driven by the page: assets are fetched by JS and handed
    /// over before `boot`, then commands and frames flow in and events flow
    /// out as JSON
    #[wasm_bindgen]
    pub struct WebGame {
        manifest: Option<GameManifest>,
        assets: MemoryAssets,
        registry: GameRegistry,
        active: String,
        volume: f64,
    }

    #[wasm_bindgen]
    impl WebGame {
        #[wasm_bindgen(constructor)]
        pub fn new(manifest_json: &str) -> Result<WebGame, JsValue> {
            let manifest = GameManifest::from_json(manifest_json).map_err(js_err)?;
            log::info!(
                "Manifest `{}` with {} levels",
                manifest.name,
                manifest.levels.len()
            );
            Ok(Self {
                active: manifest.name.clone(),
                manifest: Some(manifest),
                assets: MemoryAssets::new(),
                registry: GameRegistry::new(),
                volume: 0.7,
            })
        }

        /// Asset names the page needs to fetch before `boot`
        pub fn asset_names(&self) -> Vec<String> {
            self.manifest
                .iter()
                .flat_map(|m| m.levels.iter().map(|l| l.asset.clone()))
                .collect()
        }

        pub fn provide_asset(&mut self, name: String, bytes: Vec<u8>) {
            self.assets.insert(name, bytes);
        }

        /// Build the game from the provided assets and restore saved progress
        pub fn boot(&mut self) -> Result<(), JsValue> {
            let manifest = self
                .manifest
                .take()
                .ok_or_else(|| JsValue::from_str("already booted"))?;
            let assets = std::mem::take(&mut self.assets);
            let store = LocalStorageStore::new(LocalStorageStore::DEFAULT_KEY);
            let mut game = DirectionsGame::new(manifest, Box::new(assets), Box::new(store));
            if let Err(e) = game.load() {
                log::warn!("Ignoring unreadable save: {}", e);
            }
            self.registry.register(Box::new(game));
            Ok(())
        }

        pub fn set_volume(&mut self, volume: f64) {
            self.volume = volume.clamp(0.0, 1.0);
        }

        pub fn level_count(&self) -> usize {
            self.registry
                .game(&self.active)
                .map_or(0, |g| g.level_count())
        }

        /// `{ index, unlocked, points }` for a level, `points = -1` when unplayed
        pub fn level_progress(&self, index: usize) -> Result<String, JsValue> {
            let game = self.registry.game(&self.active).map_err(js_err)?;
            let progress = game
                .level_progress(index)
                .ok_or_else(|| JsValue::from_str("no such level"))?;
            serde_json::to_string(&LevelRecord::from_progress(index, &progress)).map_err(js_err)
        }

        /// Tiles, markers, queue and robot pose of the current level as JSON,
        /// `null` outside a level
        pub fn snapshot(&self) -> Result<String, JsValue> {
            let game = self.registry.game(&self.active).map_err(js_err)?;
            serde_json::to_string(&game.snapshot()).map_err(js_err)
        }

        /// Handle one JSON command, returns the raised events as JSON
        pub fn send(&mut self, command_json: &str) -> Result<String, JsValue> {
            let command: Command = serde_json::from_str(command_json).map_err(js_err)?;
            let game = self.registry.game_mut(&self.active).map_err(js_err)?;
            let events = game.handle(command).map_err(js_err)?;
            self.emit(&events)
        }

        /// Advance by elapsed frames (60 per second)
        pub fn frame(&mut self, frames: f32) -> Result<String, JsValue> {
            let game = self.registry.game_mut(&self.active).map_err(js_err)?;
            let events = game.update(frames);
            self.emit(&events)
        }
    }

    impl WebGame {
        /// Play the sound cues for `events` and serialize them for the page
        fn emit(&self, events: &[GameEvent]) -> Result<String, JsValue> {
            for cue in events.iter().filter_map(SoundCue::for_event) {
                cue.play(self.volume);
            }
            serde_json::to_string(events).map_err(js_err)
        }
    }

    pub fn init() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }
        log::info!("Robot Directions starting...");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::init();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::error::Error;
    use std::path::Path;

    use robot_directions::persistence::MemoryStore;
    use robot_directions::platform::DirAssets;
    use robot_directions::sim::{Direction, GameEvent};
    use robot_directions::{Command, DirectionsGame, Game, GameManifest};

    pub const USAGE: &str = "usage: robot-directions <manifest.json> <level> [U|R|D|L ...]";

    /// Frames to simulate before giving up on a run
    const FRAME_LIMIT: u32 = 60 * 60 * 5;

    /// Runs one level with the given turns; returns whether the robot finished
    pub fn run(args: &[String]) -> Result<bool, Box<dyn Error>> {
        let [manifest_path, level, turns @ ..] = args else {
            return Err(USAGE.into());
        };
        let level: usize = level.parse()?;
        let directions = turns
            .iter()
            .map(|t| Direction::from_str(t).ok_or_else(|| format!("unknown direction `{t}`")))
            .collect::<Result<Vec<_>, _>>()?;

        let manifest = GameManifest::from_json(&std::fs::read_to_string(manifest_path)?)?;
        let root = Path::new(manifest_path).parent().unwrap_or(Path::new("."));
        let mut game = DirectionsGame::new(
            manifest,
            Box::new(DirAssets::new(root)),
            Box::new(MemoryStore::new()),
        );

        game.handle(Command::UnlockAll)?;
        game.handle(Command::EnterLevel { level })?;
        for direction in directions {
            game.handle(Command::AppendDirection { direction })?;
        }
        game.handle(Command::StartRun)?;

        for _ in 0..FRAME_LIMIT {
            for event in game.update(1.0) {
                match event {
                    GameEvent::JunctionConsumed { at, index, direction } => {
                        println!("turn #{} at {}: {}", index + 1, at, direction.as_str());
                    }
                    GameEvent::QueueUnderrun { at } => println!("no turn left at {at}"),
                    GameEvent::Teleported { from, to, .. } => println!("teleport {from} -> {to}"),
                    GameEvent::BlockedReversed { at, .. } => println!("blocked at {at}, reversing"),
                    GameEvent::FellOff => {
                        println!("fell off the track");
                        return Ok(false);
                    }
                    GameEvent::LevelComplete { points, .. } => {
                        println!("finished with {points} points");
                        return Ok(true);
                    }
                    _ => {}
                }
            }
        }
        println!("gave up after {FRAME_LIMIT} frames");
        Ok(false)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match headless::run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("{}", headless::USAGE);
            std::process::exit(2);
        }
    }
}
