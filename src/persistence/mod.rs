//! Level progress save/load
//!
//! Features:
//! - Versioned JSON envelope (`{ version, levels, lastVisit }`)
//! - One record per level: `{ index, unlocked, points }`, `points = -1` when
//!   the level was never completed
//! - Pluggable store: in-memory, or LocalStorage in the browser

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::consts::UNPLAYED_POINTS;
use crate::error::PersistError;
use crate::sim::LevelProgress;

/// Current save format version
pub const SAVE_VERSION: u32 = 1;

/// Persisted state of one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    /// Zero-based level index
    pub index: usize,
    pub unlocked: bool,
    pub points: i32,
}

impl LevelRecord {
    pub fn from_progress(index: usize, progress: &LevelProgress) -> Self {
        Self {
            index,
            unlocked: progress.unlocked,
            points: progress.best.map_or(UNPLAYED_POINTS, i32::from),
        }
    }

    pub fn to_progress(&self) -> LevelProgress {
        LevelProgress {
            unlocked: self.unlocked,
            best: u8::try_from(self.points).ok(),
        }
    }
}

fn current_version() -> u32 {
    SAVE_VERSION
}

/// Persisted state of a whole game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    #[serde(default = "current_version")]
    pub version: u32,
    pub levels: Vec<LevelRecord>,
    /// Unix timestamp (ms) of the last save
    pub last_visit: f64,
}

impl SaveData {
    pub fn new<'a>(progress: impl IntoIterator<Item = &'a LevelProgress>, last_visit: f64) -> Self {
        Self {
            version: SAVE_VERSION,
            levels: progress
                .into_iter()
                .enumerate()
                .map(|(i, p)| LevelRecord::from_progress(i, p))
                .collect(),
            last_visit,
        }
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let data: SaveData = serde_json::from_str(json)?;
        if data.version != SAVE_VERSION {
            return Err(PersistError::UnsupportedVersion(data.version));
        }
        Ok(data)
    }

    /// Progress for level `index`; records for unknown levels are ignored
    pub fn progress(&self, index: usize) -> Option<LevelProgress> {
        self.levels
            .iter()
            .find(|r| r.index == index)
            .map(LevelRecord::to_progress)
    }
}

/// External save hook
pub trait SaveStore {
    fn fetch(&self) -> Result<Option<SaveData>, PersistError>;
    fn store(&mut self, data: &SaveData) -> Result<(), PersistError>;
}

/// In-memory store; clones share the same slot
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON last written, if any
    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl SaveStore for MemoryStore {
    fn fetch(&self) -> Result<Option<SaveData>, PersistError> {
        self.slot
            .borrow()
            .as_deref()
            .map(SaveData::from_json)
            .transpose()
    }

    fn store(&mut self, data: &SaveData) -> Result<(), PersistError> {
        *self.slot.borrow_mut() = Some(data.to_json()?);
        Ok(())
    }
}

/// Browser LocalStorage store
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    pub const DEFAULT_KEY: &'static str = "robot_directions_save";

    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Result<web_sys::Storage, PersistError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| PersistError::Storage("LocalStorage unavailable".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl SaveStore for LocalStorageStore {
    fn fetch(&self) -> Result<Option<SaveData>, PersistError> {
        let json = Self::storage()?
            .get_item(&self.key)
            .map_err(|e| PersistError::Storage(format!("{e:?}")))?;
        json.as_deref().map(SaveData::from_json).transpose()
    }

    fn store(&mut self, data: &SaveData) -> Result<(), PersistError> {
        let json = data.to_json()?;
        Self::storage()?
            .set_item(&self.key, &json)
            .map_err(|e| PersistError::Storage(format!("{e:?}")))?;
        log::info!("Progress saved ({} levels)", data.levels.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_points_sentinel() {
        let unplayed = LevelRecord::from_progress(
            2,
            &LevelProgress {
                unlocked: true,
                best: None,
            },
        );
        assert_eq!(unplayed.points, -1);
        assert_eq!(unplayed.to_progress().best, None);

        let done = LevelRecord::from_progress(
            0,
            &LevelProgress {
                unlocked: true,
                best: Some(2),
            },
        );
        assert_eq!(done.points, 2);
        assert_eq!(done.to_progress().best, Some(2));
    }

    #[test]
    fn test_json_shape() {
        let progress = [
            LevelProgress {
                unlocked: true,
                best: Some(3),
            },
            LevelProgress::default(),
        ];
        let data = SaveData::new(&progress, 1234.0);
        let json = data.to_json().unwrap();
        assert!(json.contains("\"lastVisit\":1234.0"));
        assert!(json.contains("{\"index\":1,\"unlocked\":false,\"points\":-1}"));
        assert_eq!(SaveData::from_json(&json).unwrap(), data);
    }

    #[test]
    fn test_rejects_future_version() {
        let err = SaveData::from_json(r#"{"version":9,"levels":[],"lastVisit":0}"#).unwrap_err();
        assert!(matches!(err, PersistError::UnsupportedVersion(9)));
    }

    #[test]
    fn test_memory_store_shares_slot() {
        let store = MemoryStore::new();
        let mut handle = store.clone();
        assert_eq!(store.fetch().unwrap(), None);

        let data = SaveData::new(&[LevelProgress::default()], 5.0);
        handle.store(&data).unwrap();
        assert_eq!(store.fetch().unwrap(), Some(data));
        assert!(store.contents().is_some());
    }
}
