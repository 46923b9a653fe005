//! Level model: decoded track grid plus static level data
//!
//! The grid is built once from the level artwork and never mutated; only
//! [`LevelProgress`] changes over the lifetime of a level.

use std::collections::{BTreeMap, HashSet};

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::direction::Direction;
use super::tile::{Neighbors, TileKind};
use crate::error::LevelError;

/// Teleporter link as written in level data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeleporterDef {
    /// Colour key (0xRRGGBB) shared by both ends
    pub color: u32,
    pub a: IVec2,
    pub b: IVec2,
}

/// Static data of one level, as listed in the game manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelDef {
    /// Artwork asset name (PNG)
    pub asset: String,
    /// One-way blocking tiles
    pub blocking: Vec<IVec2>,
    pub teleporters: Vec<TeleporterDef>,
}

/// Unlock state and best recorded score of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelProgress {
    pub unlocked: bool,
    /// Points frozen on first completion, `None` until then
    pub best: Option<u8>,
}

/// The decoded track grid
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    width: i32,
    height: i32,
    /// Raw track / non-track state per cell (row-major)
    cells: Vec<bool>,
    /// Connectivity kind per cell (row-major)
    tiles: Vec<TileKind>,
    pub start: IVec2,
    pub finish: IVec2,
    pub start_facing: Direction,
    pub finish_facing: Direction,
}

impl Track {
    /// Build the tile grid from a track mask and the two endpoint cells.
    ///
    /// Both endpoints must classify as straight pieces so that their facing
    /// is well defined.
    pub fn from_mask(
        width: u32,
        height: u32,
        cells: Vec<bool>,
        start: IVec2,
        finish: IVec2,
    ) -> Result<Self, LevelError> {
        let expected = width as usize * height as usize;
        if expected == 0 {
            return Err(LevelError::EmptyImage);
        }
        if cells.len() != expected {
            return Err(LevelError::BufferSize {
                expected,
                actual: cells.len(),
            });
        }

        let mut track = Self {
            width: width as i32,
            height: height as i32,
            cells,
            tiles: Vec::with_capacity(expected),
            start,
            finish,
            start_facing: Direction::Right,
            finish_facing: Direction::Left,
        };

        for y in 0..track.height {
            for x in 0..track.width {
                let coord = IVec2::new(x, y);
                let kind = if track.is_track_cell(coord) {
                    TileKind::classify(track.neighbors(coord))
                } else {
                    TileKind::Empty
                };
                track.tiles.push(kind);
            }
        }

        track.start_facing = track.endpoint_facing("start", start)?;
        track.finish_facing = track.endpoint_facing("finish", finish)?;
        Ok(track)
    }

    fn endpoint_facing(&self, marker: &'static str, at: IVec2) -> Result<Direction, LevelError> {
        let kind = self.tile(at);
        self.facing_at(at)
            .ok_or(LevelError::EndpointNotStraight { marker, at, kind })
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    #[inline]
    pub fn in_bounds(&self, coord: IVec2) -> bool {
        coord.x >= 0 && coord.y >= 0 && coord.x < self.width && coord.y < self.height
    }

    #[inline]
    fn offset(&self, coord: IVec2) -> usize {
        (coord.y * self.width + coord.x) as usize
    }

    /// Raw track test; out of bounds is never track
    pub fn is_track_cell(&self, coord: IVec2) -> bool {
        self.in_bounds(coord) && self.cells[self.offset(coord)]
    }

    /// Tile kind at a coordinate; out of bounds is `Empty`
    pub fn tile(&self, coord: IVec2) -> TileKind {
        if self.in_bounds(coord) {
            self.tiles[self.offset(coord)]
        } else {
            TileKind::Empty
        }
    }

    pub fn neighbors(&self, coord: IVec2) -> Neighbors {
        Neighbors {
            up: self.is_track_cell(coord + Direction::Up.delta()),
            right: self.is_track_cell(coord + Direction::Right.delta()),
            down: self.is_track_cell(coord + Direction::Down.delta()),
            left: self.is_track_cell(coord + Direction::Left.delta()),
        }
    }

    /// Facing derived from the local tile, `None` unless it is a straight piece
    pub fn facing_at(&self, coord: IVec2) -> Option<Direction> {
        self.tile(coord).facing(self.neighbors(coord))
    }

    /// Iterate rows of tile kinds (top to bottom)
    pub fn rows(&self) -> impl Iterator<Item = &[TileKind]> {
        self.tiles.chunks(self.width as usize)
    }
}

/// Two linked teleporter tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeleporterPair {
    pub color: u32,
    pub a: IVec2,
    pub b: IVec2,
}

impl TeleporterPair {
    #[inline]
    pub fn contains(&self, coord: IVec2) -> bool {
        coord == self.a || coord == self.b
    }

    /// The opposite end of the pair
    pub fn other(&self, coord: IVec2) -> Option<IVec2> {
        if coord == self.a {
            Some(self.b)
        } else if coord == self.b {
            Some(self.a)
        } else {
            None
        }
    }
}

/// A playable level
#[derive(Debug, Clone)]
pub struct LevelModel {
    /// Zero-based position in the game's level list
    pub index: usize,
    pub track: Track,
    blocking: HashSet<IVec2>,
    teleporters: BTreeMap<u32, TeleporterPair>,
    pub progress: LevelProgress,
}

impl LevelModel {
    /// Combine a decoded track with the level's static data.
    ///
    /// Blocking tiles and teleporter ends must sit on the track, and a tile
    /// may belong to at most one teleporter.
    pub fn build(
        index: usize,
        def: &LevelDef,
        track: Track,
        progress: LevelProgress,
    ) -> Result<Self, LevelError> {
        let mut blocking = HashSet::with_capacity(def.blocking.len());
        for &at in &def.blocking {
            if !track.tile(at).is_track() {
                return Err(LevelError::OffTrack {
                    what: "blocking tile",
                    at,
                });
            }
            blocking.insert(at);
        }

        let mut teleporters = BTreeMap::new();
        let mut claimed: HashSet<IVec2> = HashSet::new();
        for tp in &def.teleporters {
            if tp.a == tp.b {
                return Err(LevelError::TeleporterDegenerate { color: tp.color });
            }
            for at in [tp.a, tp.b] {
                if !track.tile(at).is_track() {
                    return Err(LevelError::OffTrack {
                        what: "teleporter",
                        at,
                    });
                }
                if !claimed.insert(at) {
                    return Err(LevelError::TeleporterOverlap { at });
                }
            }
            let pair = TeleporterPair {
                color: tp.color,
                a: tp.a,
                b: tp.b,
            };
            // one pair per colour key
            if let Some(previous) = teleporters.insert(tp.color, pair) {
                return Err(LevelError::TeleporterOverlap { at: previous.a });
            }
        }

        Ok(Self {
            index,
            track,
            blocking,
            teleporters,
            progress,
        })
    }

    #[inline]
    pub fn is_blocking(&self, coord: IVec2) -> bool {
        self.blocking.contains(&coord)
    }

    pub fn blocking(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.blocking.iter().copied()
    }

    /// Teleporter pair registered under a colour
    pub fn teleporter(&self, color: u32) -> Option<&TeleporterPair> {
        self.teleporters.get(&color)
    }

    /// Teleporter pair with an end at `coord`
    pub fn teleporter_at(&self, coord: IVec2) -> Option<&TeleporterPair> {
        self.teleporters.values().find(|tp| tp.contains(coord))
    }

    pub fn teleporters(&self) -> impl Iterator<Item = &TeleporterPair> {
        self.teleporters.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::decode::{decode_track, pixmap_from_ascii};

    fn loop_track() -> Track {
        decode_track(&pixmap_from_ascii(&[
            ".....", //
            "S##..", //
            ".#.#.", //
            ".####", //
            "....F",
        ]))
        .unwrap()
    }

    #[test]
    fn test_build_accepts_track_tiles() {
        let def = LevelDef {
            asset: "level1.png".into(),
            blocking: vec![IVec2::new(2, 1)],
            teleporters: vec![TeleporterDef {
                color: 0x3366ff,
                a: IVec2::new(1, 2),
                b: IVec2::new(3, 2),
            }],
        };
        let level = LevelModel::build(0, &def, loop_track(), LevelProgress::default()).unwrap();
        assert!(level.is_blocking(IVec2::new(2, 1)));
        assert!(!level.is_blocking(IVec2::new(1, 1)));

        let pair = level.teleporter(0x3366ff).unwrap();
        assert_eq!(pair.other(IVec2::new(1, 2)), Some(IVec2::new(3, 2)));
        assert_eq!(pair.other(IVec2::new(3, 2)), Some(IVec2::new(1, 2)));
        assert_eq!(pair.other(IVec2::new(0, 0)), None);
        assert_eq!(level.teleporter_at(IVec2::new(3, 2)).map(|tp| tp.color), Some(0x3366ff));
    }

    #[test]
    fn test_build_rejects_blocking_off_track() {
        let def = LevelDef {
            blocking: vec![IVec2::new(0, 0)],
            ..Default::default()
        };
        let err = LevelModel::build(0, &def, loop_track(), LevelProgress::default()).unwrap_err();
        assert!(matches!(err, LevelError::OffTrack { what: "blocking tile", .. }));
    }

    #[test]
    fn test_build_rejects_shared_teleporter_tile() {
        let def = LevelDef {
            teleporters: vec![
                TeleporterDef {
                    color: 1,
                    a: IVec2::new(1, 2),
                    b: IVec2::new(3, 2),
                },
                TeleporterDef {
                    color: 2,
                    a: IVec2::new(3, 2),
                    b: IVec2::new(2, 3),
                },
            ],
            ..Default::default()
        };
        let err = LevelModel::build(0, &def, loop_track(), LevelProgress::default()).unwrap_err();
        assert!(matches!(err, LevelError::TeleporterOverlap { .. }));
    }

    #[test]
    fn test_build_rejects_self_linked_teleporter() {
        let def = LevelDef {
            teleporters: vec![TeleporterDef {
                color: 7,
                a: IVec2::new(1, 2),
                b: IVec2::new(1, 2),
            }],
            ..Default::default()
        };
        let err = LevelModel::build(0, &def, loop_track(), LevelProgress::default()).unwrap_err();
        assert!(matches!(err, LevelError::TeleporterDegenerate { color: 7 }));
    }

    #[test]
    fn test_level_def_json_defaults() {
        let def: LevelDef = serde_json::from_str(r#"{ "asset": "level2.png" }"#).unwrap();
        assert_eq!(def.asset, "level2.png");
        assert!(def.blocking.is_empty());
        assert!(def.teleporters.is_empty());

        let def: LevelDef = serde_json::from_str(
            r#"{ "asset": "l.png", "blocking": [[1, 2]], "teleporters": [{ "color": 255, "a": [0, 1], "b": [4, 1] }] }"#,
        )
        .unwrap();
        assert_eq!(def.blocking, vec![IVec2::new(1, 2)]);
        assert_eq!(def.teleporters[0].b, IVec2::new(4, 1));
    }
}
