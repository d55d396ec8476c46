use std::fmt;

use serde::{Deserialize, Serialize};

pub mod board;
pub mod catalog;
pub mod device;
pub mod input;
pub mod map;
pub mod movement;
pub mod session;
pub mod win;

/// Represents a 2D coordinate. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Returns the neighbouring position one step in `direction`.
    ///
    /// Returns `None` when the step would leave the non-negative quadrant;
    /// the upper bound is the board's business.
    pub fn step(self, direction: Direction) -> Option<Position> {
        let (dx, dy) = direction.delta();
        Some(Position {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four moves the player can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit vector of the direction on a grid whose `y` grows downward.
    #[inline]
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_follows_unit_vectors() {
        let origin = Position::new(3, 3);
        assert_eq!(origin.step(Direction::Up), Some(Position::new(3, 2)));
        assert_eq!(origin.step(Direction::Down), Some(Position::new(3, 4)));
        assert_eq!(origin.step(Direction::Left), Some(Position::new(2, 3)));
        assert_eq!(origin.step(Direction::Right), Some(Position::new(4, 3)));
    }

    #[test]
    fn step_off_the_top_left_edge_is_none() {
        assert_eq!(Position::new(0, 5).step(Direction::Left), None);
        assert_eq!(Position::new(5, 0).step(Direction::Up), None);
    }
}
