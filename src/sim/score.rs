//! Attempt points for the level in progress

use super::level::LevelProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreKeeper {
    points: u8,
    start: u8,
}

impl ScoreKeeper {
    pub fn new(start: u8) -> Self {
        Self {
            points: start,
            start,
        }
    }

    pub fn points(&self) -> u8 {
        self.points
    }

    /// Back to the starting points (level entry)
    pub fn reset(&mut self) {
        self.points = self.start;
    }

    /// A failed run costs one point, never going below zero
    pub fn on_failure(&mut self) -> u8 {
        self.points = self.points.saturating_sub(1);
        self.points
    }

    /// Freeze the remaining points as the level score.
    ///
    /// First completion wins: an existing score is never overwritten.
    /// Returns the score now recorded for the level.
    pub fn on_success(&self, progress: &mut LevelProgress) -> u8 {
        *progress.best.get_or_insert(self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_floors_at_zero() {
        let mut score = ScoreKeeper::new(3);
        assert_eq!(score.on_failure(), 2);
        assert_eq!(score.on_failure(), 1);
        assert_eq!(score.on_failure(), 0);
        assert_eq!(score.on_failure(), 0);
        score.reset();
        assert_eq!(score.points(), 3);
    }

    #[test]
    fn test_first_completion_wins() {
        let mut progress = LevelProgress {
            unlocked: true,
            best: None,
        };
        let mut score = ScoreKeeper::new(3);
        score.on_failure();
        assert_eq!(score.on_success(&mut progress), 2);
        assert_eq!(progress.best, Some(2));

        // a later, better replay does not overwrite
        score.reset();
        assert_eq!(score.on_success(&mut progress), 2);
        assert_eq!(progress.best, Some(2));
    }
}
