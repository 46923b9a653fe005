//! Track tile kinds
//!
//! A tile's kind is fully determined by which of its four neighbours are
//! track cells. Names follow the open sides: `TurnUpRight` connects up and
//! right, `JunctionNoLeft` is a T-junction with the left side closed.

use serde::{Deserialize, Serialize};

use super::direction::Direction;

/// Connectivity kind of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    /// Not part of the track
    #[default]
    Empty,
    Horizontal,
    Vertical,
    TurnUpRight,
    TurnUpLeft,
    TurnDownRight,
    TurnDownLeft,
    JunctionNoUp,
    JunctionNoRight,
    JunctionNoDown,
    JunctionNoLeft,
    Cross,
}

/// Track / non-track state of the four axis neighbours of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Neighbors {
    pub up: bool,
    pub right: bool,
    pub down: bool,
    pub left: bool,
}

impl Neighbors {
    pub fn get(&self, dir: Direction) -> bool {
        match dir {
            Direction::Up => self.up,
            Direction::Right => self.right,
            Direction::Down => self.down,
            Direction::Left => self.left,
        }
    }
}

impl TileKind {
    /// Classify a track cell from its neighbours.
    ///
    /// The order of the checks is significant: four-way first, then T-junctions
    /// (left-closed after right-closed), then turns, then straights with the
    /// vertical fallback ahead of the horizontal one.
    pub fn classify(n: Neighbors) -> TileKind {
        let Neighbors {
            up,
            right,
            down,
            left,
        } = n;

        if left && right && up && down {
            TileKind::Cross
        } else if left && up && down {
            TileKind::JunctionNoRight
        } else if right && up && down {
            TileKind::JunctionNoLeft
        } else if left && right && down {
            TileKind::JunctionNoUp
        } else if left && right && up {
            TileKind::JunctionNoDown
        } else if left && down {
            TileKind::TurnDownLeft
        } else if left && up {
            TileKind::TurnUpLeft
        } else if right && down {
            TileKind::TurnDownRight
        } else if right && up {
            TileKind::TurnUpRight
        } else if up || down {
            TileKind::Vertical
        } else if left || right {
            TileKind::Horizontal
        } else {
            TileKind::Empty
        }
    }

    #[inline]
    pub fn is_track(self) -> bool {
        self != TileKind::Empty
    }

    /// Pure straight piece: the robot never needs a turn decision here
    #[inline]
    pub fn is_straight(self) -> bool {
        matches!(self, TileKind::Horizontal | TileKind::Vertical)
    }

    /// Facing of a straight piece: along its axis, toward the neighbouring
    /// track cell on the left (or up) side when there is one.
    ///
    /// Returns `None` for every other kind.
    pub fn facing(self, n: Neighbors) -> Option<Direction> {
        match self {
            TileKind::Horizontal if n.left => Some(Direction::Left),
            TileKind::Horizontal => Some(Direction::Right),
            TileKind::Vertical if n.up => Some(Direction::Up),
            TileKind::Vertical => Some(Direction::Down),
            _ => None,
        }
    }
}
