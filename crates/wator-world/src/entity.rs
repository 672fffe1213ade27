//! Fish and shark state and their per-chronon rules.
//!
//! Entities are small `Copy` values. Workers copy one out of its collection,
//! apply the rules and write it back, so no entity is borrowed while the grid
//! or another collection is being locked.

use serde::{Deserialize, Serialize};
use wator_core::{Cell, FishId, Position, SharkId};

/// A fish: prey that moves, ages and breeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fish {
    pub id: FishId,
    pub position: Position,
    /// Chronons since birth or since the last reproduction
    pub age: u32,
}

impl Fish {
    pub fn new(id: FishId, position: Position) -> Self {
        Self {
            id,
            position,
            age: 0,
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::Fish(self.id)
    }

    pub fn tick(&mut self) {
        self.age += 1;
    }

    pub fn can_reproduce(&self, breed_age: u32) -> bool {
        self.age >= breed_age
    }

    pub fn move_to(&mut self, new_position: Position) {
        self.position = new_position;
    }

    /// Produce an offspring at `position` and reset the breeding clock
    pub fn reproduce(&mut self, child_id: FishId, position: Position) -> Fish {
        self.age = 0;
        Fish::new(child_id, position)
    }
}

/// A shark: predator that hunts fish and starves without them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shark {
    pub id: SharkId,
    pub position: Position,
    pub age: u32,
    pub energy: i32,
}

impl Shark {
    pub fn new(id: SharkId, position: Position, energy: i32) -> Self {
        Self {
            id,
            position,
            age: 0,
            energy,
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::Shark(self.id)
    }

    pub fn is_alive(&self) -> bool {
        self.energy > 0
    }

    pub fn eat(&mut self, energy_per_fish: i32) {
        self.energy += energy_per_fish;
    }

    /// Pay the per-chronon energy cost and grow one chronon older
    pub fn tick(&mut self) {
        self.energy -= 1;
        self.age += 1;
    }

    pub fn can_reproduce(&self, breed_age: u32) -> bool {
        self.age >= breed_age
    }

    pub fn move_to(&mut self, new_position: Position) {
        self.position = new_position;
    }

    /// Produce an offspring at `position` carrying half of this shark's
    /// energy (rounded down); the parent keeps the same amount.
    pub fn reproduce(&mut self, child_id: SharkId, position: Position) -> Shark {
        self.energy /= 2;
        self.age = 0;
        Shark::new(child_id, position, self.energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fish_lifecycle() {
        let mut fish = Fish::new(FishId(1), Position::new(5, 5));
        assert_eq!(fish.cell(), Cell::Fish(FishId(1)));
        assert!(!fish.can_reproduce(2));

        fish.tick();
        fish.tick();
        assert!(fish.can_reproduce(2));

        fish.move_to(Position::new(5, 6));
        let child = fish.reproduce(FishId(2), Position::new(5, 5));
        assert_eq!(fish.age, 0);
        assert_eq!(fish.position, Position::new(5, 6));
        assert_eq!(child.position, Position::new(5, 5));
        assert_eq!(child.age, 0);
    }

    #[test]
    fn test_shark_energy() {
        let mut shark = Shark::new(SharkId(1), Position::new(0, 0), 2);
        assert!(shark.is_alive());

        shark.tick();
        assert_eq!(shark.energy, 1);
        assert_eq!(shark.age, 1);

        shark.eat(3);
        shark.tick();
        // Eating nets energy_per_fish - 1
        assert_eq!(shark.energy, 3);

        shark.tick();
        shark.tick();
        shark.tick();
        assert!(!shark.is_alive());
    }

    #[test]
    fn test_shark_reproduction_splits_energy() {
        let mut shark = Shark::new(SharkId(1), Position::new(1, 1), 7);
        shark.age = 8;
        assert!(shark.can_reproduce(8));

        let child = shark.reproduce(SharkId(2), Position::new(1, 2));
        assert_eq!(shark.energy, 3);
        assert_eq!(child.energy, 3);
        assert_eq!(shark.age, 0);
        assert_eq!(child.id, SharkId(2));
    }
}
