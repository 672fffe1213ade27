//! 2D toroidal grid shared by all workers of a chronon.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use wator_core::{Cell, Direction, Position};

/// A square toroidal grid of cells.
///
/// Every access locks only the row it touches, so each `get`, `set` or
/// `compare_and_set` is atomic for its cell and a reader never sees a
/// half-written cell. Two separate calls are never atomic together.
#[derive(Debug)]
pub struct Grid {
    size: i32,
    rows: Vec<RwLock<Vec<Cell>>>,
}

/// Orthogonal neighbors of a position, classified by occupancy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub empty: Vec<Position>,
    pub fish: Vec<Position>,
    pub sharks: Vec<Position>,
}

impl Grid {
    pub fn new(size: i32) -> Self {
        debug_assert!(size > 0, "grid size must be positive");
        let rows = (0..size)
            .map(|_| RwLock::new(vec![Cell::Empty; size as usize]))
            .collect();
        Self { size, rows }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn area(&self) -> usize {
        (self.size as usize) * (self.size as usize)
    }

    /// Wrap any integer position onto the grid
    pub fn wrap(&self, pos: Position) -> Position {
        pos.wrap(self.size, self.size)
    }

    /// Get cell at position (with toroidal wrapping)
    pub fn get(&self, pos: Position) -> Cell {
        let pos = self.wrap(pos);
        self.rows[pos.y as usize].read()[pos.x as usize]
    }

    /// Set cell at position (with toroidal wrapping)
    pub fn set(&self, pos: Position, cell: Cell) {
        let pos = self.wrap(pos);
        self.rows[pos.y as usize].write()[pos.x as usize] = cell;
    }

    /// Write `new` only if the cell still holds `expected`. Returns whether
    /// the write happened.
    pub fn compare_and_set(&self, pos: Position, expected: Cell, new: Cell) -> bool {
        let pos = self.wrap(pos);
        let mut row = self.rows[pos.y as usize].write();
        let slot = &mut row[pos.x as usize];
        if *slot == expected {
            *slot = new;
            true
        } else {
            false
        }
    }

    /// Classify the four orthogonal neighbors (north, south, east, west).
    /// Each cell is read independently of the others.
    pub fn neighbors(&self, pos: Position) -> Neighbors {
        let mut neighbors = Neighbors::default();

        for direction in Direction::all() {
            let neighbor_pos = self.wrap(pos.step(direction));
            match self.get(neighbor_pos) {
                Cell::Empty => neighbors.empty.push(neighbor_pos),
                Cell::Fish(_) => neighbors.fish.push(neighbor_pos),
                Cell::Shark(_) => neighbors.sharks.push(neighbor_pos),
            }
        }

        neighbors
    }

    /// Copy every cell, one row at a time
    pub fn snapshot(&self) -> GridSnapshot {
        let mut cells = Vec::with_capacity(self.area());
        for row in &self.rows {
            cells.extend_from_slice(&row.read());
        }
        GridSnapshot {
            size: self.size,
            cells,
        }
    }

    /// Iterator over all positions, row by row
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.size).flat_map(move |y| (0..self.size).map(move |x| Position::new(x, y)))
    }
}

/// Read-only copy of a grid, safe to hand to a renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    size: i32,
    cells: Vec<Cell>,
}

impl GridSnapshot {
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Cell at position (with toroidal wrapping)
    pub fn get(&self, pos: Position) -> Cell {
        let pos = pos.wrap(self.size, self.size);
        self.cells[(pos.y * self.size + pos.x) as usize]
    }

    /// Rows from north to south
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks(self.size as usize)
    }

    /// Iterator over all cells with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, Cell)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (Position::new(i as i32 % size, i as i32 / size), *cell))
    }

    pub fn fish_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_fish()).count()
    }

    pub fn shark_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_shark()).count()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wator_core::{FishId, SharkId};

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(10);
        assert_eq!(grid.size(), 10);
        assert_eq!(grid.area(), 100);
        assert_eq!(grid.positions().count(), 100);
        assert!(grid.positions().all(|pos| grid.get(pos).is_empty()));
    }

    #[test]
    fn test_toroidal_wrapping() {
        let grid = Grid::new(10);

        grid.set(Position::new(-1, -1), Cell::Fish(FishId(1)));
        // Should wrap to (9, 9)
        assert_eq!(grid.get(Position::new(9, 9)), Cell::Fish(FishId(1)));

        grid.set(Position::new(10, 10), Cell::Shark(SharkId(2)));
        // Should wrap to (0, 0)
        assert_eq!(grid.get(Position::new(0, 0)), Cell::Shark(SharkId(2)));
    }

    #[test]
    fn test_neighbors_wrap_around_corner() {
        let grid = Grid::new(10);
        let neighbors = grid.neighbors(Position::new(0, 0));

        assert_eq!(neighbors.empty.len(), 4);
        assert!(neighbors.empty.contains(&Position::new(9, 0)));
        assert!(neighbors.empty.contains(&Position::new(0, 9)));
        assert!(neighbors.empty.contains(&Position::new(1, 0)));
        assert!(neighbors.empty.contains(&Position::new(0, 1)));
    }

    #[test]
    fn test_neighbors_classification() {
        let grid = Grid::new(5);
        let center = Position::new(2, 2);
        grid.set(Position::new(2, 1), Cell::Fish(FishId(1)));
        grid.set(Position::new(3, 2), Cell::Shark(SharkId(1)));
        grid.set(Position::new(1, 2), Cell::Fish(FishId(2)));

        let neighbors = grid.neighbors(center);
        assert_eq!(neighbors.empty, vec![Position::new(2, 3)]);
        assert_eq!(neighbors.fish, vec![Position::new(2, 1), Position::new(1, 2)]);
        assert_eq!(neighbors.sharks, vec![Position::new(3, 2)]);
    }

    #[test]
    fn test_compare_and_set() {
        let grid = Grid::new(4);
        let pos = Position::new(1, 1);

        assert!(grid.compare_and_set(pos, Cell::Empty, Cell::Fish(FishId(1))));
        // A second claim of the same empty cell must fail
        assert!(!grid.compare_and_set(pos, Cell::Empty, Cell::Fish(FishId(2))));
        assert_eq!(grid.get(pos), Cell::Fish(FishId(1)));

        assert!(grid.compare_and_set(pos, Cell::Fish(FishId(1)), Cell::Shark(SharkId(1))));
        assert_eq!(grid.get(pos), Cell::Shark(SharkId(1)));
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        let grid = Grid::new(3);
        let target = Position::new(1, 1);

        let winners: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (1..=8u64)
                .map(|id| {
                    let grid = &grid;
                    scope.spawn(move || {
                        grid.compare_and_set(target, Cell::Empty, Cell::Fish(FishId(id)))
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap() as usize)
                .sum()
        });

        assert_eq!(winners, 1);
        assert!(grid.get(target).is_fish());
    }

    #[test]
    fn test_snapshot() {
        let grid = Grid::new(3);
        grid.set(Position::new(2, 0), Cell::Fish(FishId(1)));
        grid.set(Position::new(0, 2), Cell::Shark(SharkId(1)));

        let snapshot = grid.snapshot();
        assert_eq!(snapshot.size(), 3);
        assert_eq!(snapshot.get(Position::new(2, 0)), Cell::Fish(FishId(1)));
        assert_eq!(snapshot.get(Position::new(-3, -1)), Cell::Shark(SharkId(1)));
        assert_eq!(snapshot.fish_count(), 1);
        assert_eq!(snapshot.shark_count(), 1);
        assert_eq!(snapshot.empty_count(), 7);
        assert_eq!(snapshot.rows().count(), 3);

        let (pos, _) = snapshot.iter().find(|(_, c)| c.is_shark()).unwrap();
        assert_eq!(pos, Position::new(0, 2));

        // Later writes do not leak into an existing snapshot
        grid.set(Position::new(2, 0), Cell::Empty);
        assert_eq!(snapshot.fish_count(), 1);
        assert_eq!(grid.snapshot().empty_count(), 8);
    }
}
