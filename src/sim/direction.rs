//! Robot facing / turn command values

use std::f32::consts::PI;

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// One of the four grid directions, in clockwise order starting at `Up`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Clockwise index in `0..4`
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Direction for a clockwise index, wrapping into `0..4`
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    /// Facing turned by 180°
    #[inline]
    pub fn reversed(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// Unit step in grid space (y grows downward)
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::NEG_Y,
            Direction::Right => IVec2::X,
            Direction::Down => IVec2::Y,
            Direction::Left => IVec2::NEG_X,
        }
    }

    /// Sprite rotation in radians (Right = 0, clockwise on screen)
    pub fn rotation(self) -> f32 {
        match self {
            Direction::Right => 0.0,
            Direction::Down => PI * 0.5,
            Direction::Left => PI,
            Direction::Up => PI * 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }

    /// Parse a command token: full name or its first letter, any case
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "u" | "up" => Some(Direction::Up),
            "r" | "right" => Some(Direction::Right),
            "d" | "down" => Some(Direction::Down),
            "l" | "left" => Some(Direction::Left),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_wraps() {
        assert_eq!(Direction::Up.reversed(), Direction::Down);
        assert_eq!(Direction::Right.reversed(), Direction::Left);
        assert_eq!(Direction::Down.reversed(), Direction::Up);
        assert_eq!(Direction::Left.reversed(), Direction::Right);
        for dir in Direction::ALL {
            assert_eq!(dir.reversed().reversed(), dir);
        }
    }

    #[test]
    fn test_delta_opposes_reversed() {
        for dir in Direction::ALL {
            assert_eq!(dir.delta() + dir.reversed().delta(), IVec2::ZERO);
        }
    }

    #[test]
    fn test_rotation_turns_clockwise() {
        assert_eq!(Direction::Right.rotation(), 0.0);
        assert_eq!(Direction::Down.rotation(), PI / 2.0);
        assert_eq!(Direction::Left.rotation(), PI);
        assert_eq!(Direction::Up.rotation(), PI * 1.5);
        // reversing is a half turn
        for dir in Direction::ALL {
            let diff = (dir.reversed().rotation() - dir.rotation()).abs();
            assert!((diff - PI).abs() < 1e-6);
        }
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!(Direction::from_str("U"), Some(Direction::Up));
        assert_eq!(Direction::from_str("left"), Some(Direction::Left));
        assert_eq!(Direction::from_str("x"), None);
    }
}
