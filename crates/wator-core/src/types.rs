//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a fish. Assigned from 1 upwards and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FishId(pub u64);

impl fmt::Display for FishId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fish-{}", self.0)
    }
}

/// Unique identifier for a shark. Assigned from 1 upwards and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SharkId(pub u64);

impl fmt::Display for SharkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shark-{}", self.0)
    }
}

/// 2D position in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Apply toroidal wrapping for given world dimensions
    pub fn wrap(&self, width: i32, height: i32) -> Self {
        Self {
            x: ((self.x % width) + width) % width,
            y: ((self.y % height) + height) % height,
        }
    }

    /// Position one step away in `direction`, not yet wrapped.
    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.to_delta();
        self.add(dx, dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Orthogonal direction for movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    /// The four neighbor directions in classification order.
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ]
    }
}

/// Occupancy of a single grid cell.
///
/// A cell references at most one entity; the entity itself is owned by the
/// simulation's collections, the grid only stores its id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Fish(FishId),
    Shark(SharkId),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_fish(&self) -> bool {
        matches!(self, Cell::Fish(_))
    }

    pub fn is_shark(&self) -> bool {
        matches!(self, Cell::Shark(_))
    }

    pub fn fish_id(&self) -> Option<FishId> {
        match self {
            Cell::Fish(id) => Some(*id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_wrap() {
        let pos = Position::new(5, 5);
        let wrapped = pos.wrap(10, 10);
        assert_eq!(wrapped, Position::new(5, 5));

        let pos = Position::new(-1, -1);
        let wrapped = pos.wrap(10, 10);
        assert_eq!(wrapped, Position::new(9, 9));

        let pos = Position::new(10, 10);
        let wrapped = pos.wrap(10, 10);
        assert_eq!(wrapped, Position::new(0, 0));

        // Far outside the grid still lands inside it
        let pos = Position::new(-21, 35);
        assert_eq!(pos.wrap(10, 10), Position::new(9, 5));
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::North.to_delta(), (0, -1));
        assert_eq!(Direction::South.to_delta(), (0, 1));
        assert_eq!(Direction::East.to_delta(), (1, 0));
        assert_eq!(Direction::West.to_delta(), (-1, 0));
    }

    #[test]
    fn test_position_step() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.step(Direction::North), Position::new(0, -1));
        assert_eq!(origin.step(Direction::West).wrap(4, 4), Position::new(3, 0));
    }

    #[test]
    fn test_cell_accessors() {
        assert!(Cell::default().is_empty());
        assert_eq!(Cell::Fish(FishId(3)).fish_id(), Some(FishId(3)));
        assert_eq!(Cell::Shark(SharkId(3)).fish_id(), None);
        assert!(Cell::Shark(SharkId(1)).is_shark());
        assert!(!Cell::Shark(SharkId(1)).is_fish());
    }

    #[test]
    fn test_cell_serialization() {
        let cell = Cell::Shark(SharkId(7));
        let json = serde_json::to_string(&cell).unwrap();
        let back: Cell = serde_json::from_str(&json).unwrap();
        assert_eq!(cell, back);
    }
}
