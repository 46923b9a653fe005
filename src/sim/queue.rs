//! Player-authored list of turn commands
//!
//! One entry is consumed per junction, in order. Consumption is tracked by an
//! index held in the run state, so the queue itself stays intact for replay
//! and display after a run.

use super::direction::Direction;
use crate::error::QueueError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionQueue {
    steps: Vec<Direction>,
    /// Set while a run is in progress
    locked: bool,
}

impl DirectionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a planned turn, returning its position
    pub fn push(&mut self, dir: Direction) -> Result<usize, QueueError> {
        self.ensure_unlocked()?;
        self.steps.push(dir);
        Ok(self.steps.len() - 1)
    }

    /// Delete a previously planned turn
    pub fn remove(&mut self, index: usize) -> Result<Direction, QueueError> {
        self.ensure_unlocked()?;
        if index >= self.steps.len() {
            return Err(QueueError::OutOfRange {
                index,
                len: self.steps.len(),
            });
        }
        Ok(self.steps.remove(index))
    }

    pub fn clear(&mut self) -> Result<(), QueueError> {
        self.ensure_unlocked()?;
        self.steps.clear();
        Ok(())
    }

    /// Direction for the `index`-th junction of a run
    #[inline]
    pub fn get(&self, index: usize) -> Option<Direction> {
        self.steps.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn as_slice(&self) -> &[Direction] {
        &self.steps
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub(crate) fn lock(&mut self) {
        self.locked = true;
    }

    pub(crate) fn unlock(&mut self) {
        self.locked = false;
    }

    fn ensure_unlocked(&self) -> Result<(), QueueError> {
        if self.locked {
            Err(QueueError::Locked)
        } else {
            Ok(())
        }
    }
}

impl FromIterator<Direction> for DirectionQueue {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
            locked: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_get_remove() {
        let mut queue = DirectionQueue::new();
        assert_eq!(queue.push(Direction::Up), Ok(0));
        assert_eq!(queue.push(Direction::Left), Ok(1));
        assert_eq!(queue.push(Direction::Down), Ok(2));

        assert_eq!(queue.remove(1), Ok(Direction::Left));
        assert_eq!(queue.as_slice(), &[Direction::Up, Direction::Down]);
        assert_eq!(queue.get(1), Some(Direction::Down));
        assert_eq!(queue.get(2), None);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut queue: DirectionQueue = [Direction::Right].into_iter().collect();
        assert_eq!(queue.remove(3), Err(QueueError::OutOfRange { index: 3, len: 1 }));
    }

    #[test]
    fn test_locked_queue_rejects_edits() {
        let mut queue: DirectionQueue = [Direction::Right, Direction::Up].into_iter().collect();
        queue.lock();
        assert_eq!(queue.push(Direction::Up), Err(QueueError::Locked));
        assert_eq!(queue.remove(0), Err(QueueError::Locked));
        assert_eq!(queue.clear(), Err(QueueError::Locked));
        assert_eq!(queue.len(), 2);

        queue.unlock();
        assert!(queue.clear().is_ok());
        assert!(queue.is_empty());
    }
}
