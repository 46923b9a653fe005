//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time (save timestamps)
//! - Level asset access

use std::collections::HashMap;
use std::io;

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or_default()
}

/// Read-only access to level artwork by asset name
pub trait AssetSource {
    fn read(&self, name: &str) -> io::Result<Vec<u8>>;
}

/// Assets handed over in memory (browser fetches, tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(name.into(), bytes);
    }

    pub fn with(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl AssetSource for MemoryAssets {
    fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        self.files.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("asset `{name}` not provided"))
        })
    }
}

/// Assets read from a directory on disk (native only)
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl DirAssets {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AssetSource for DirAssets {
    fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(name))
    }
}
