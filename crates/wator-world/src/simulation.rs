//! Simulation engine: one Wa-Tor world and its chronon stepping.

use crate::entity::{Fish, Shark};
use crate::grid::{Grid, GridSnapshot};
use crate::parallel::process_chunks;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::ThreadPoolBuilder;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, trace, warn};
use wator_core::{
    Cell, Error, FishId, PopulationStats, Position, Result, SharkId, SimulationConfig,
};

/// Random placement tries allowed per grid cell before construction gives up
const PLACEMENT_ATTEMPTS_PER_CELL: usize = 64;

/// A Wa-Tor world.
///
/// All methods take `&self`, so a simulation can be shared between a stepping
/// thread and readers such as a renderer. Steps hold the write side of the
/// chronon lock for the whole chronon; `stats` and `grid_snapshot` take the
/// read side and therefore never observe a half-finished chronon.
pub struct Simulation {
    grid: Grid,
    fish: DashMap<FishId, Fish>,
    sharks: DashMap<SharkId, Shark>,
    fish_count: AtomicUsize,
    shark_count: AtomicUsize,
    next_fish_id: AtomicU64,
    next_shark_id: AtomicU64,
    chronon: RwLock<u64>,
    rng: Mutex<ChaCha8Rng>,
    config: SimulationConfig,
}

impl Simulation {
    /// Build a world and scatter the initial population over random empty
    /// cells. Initial sharks start with `shark_starve_time` energy.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let sim = Self {
            grid: Grid::new(config.grid_size),
            fish: DashMap::new(),
            sharks: DashMap::new(),
            fish_count: AtomicUsize::new(0),
            shark_count: AtomicUsize::new(0),
            next_fish_id: AtomicU64::new(1),
            next_shark_id: AtomicU64::new(1),
            chronon: RwLock::new(0),
            rng: Mutex::new(rng),
            config,
        };

        {
            let mut rng = sim.rng.lock();
            for _ in 0..sim.config.initial_fish {
                let pos = sim.random_empty_position(&mut rng)?;
                sim.insert_fish(pos);
            }
            for _ in 0..sim.config.initial_sharks {
                let pos = sim.random_empty_position(&mut rng)?;
                sim.insert_shark(pos, sim.config.shark_starve_time);
            }
        }

        debug!(
            event = "simulation_created",
            grid_size = sim.config.grid_size,
            fish = sim.config.initial_fish,
            sharks = sim.config.initial_sharks,
            fish_breed_age = sim.config.fish_breed_age,
            shark_breed_age = sim.config.shark_breed_age,
            shark_starve_time = sim.config.shark_starve_time,
            seeded = sim.config.seed.is_some(),
            "Simulation created"
        );

        Ok(sim)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Advance one chronon: every fish, then every shark, on this thread.
    pub fn step(&self) {
        let mut chronon = self.chronon.write();
        let mut rng = self.rng.lock();

        for id in self.fish_ids() {
            self.process_fish(id, &mut rng);
        }
        for id in self.shark_ids() {
            self.process_shark(id, &mut rng);
        }

        *chronon += 1;
        self.trace_chronon(*chronon, 1);
    }

    /// Advance one chronon with `workers` threads per phase.
    ///
    /// Each phase splits its work list into contiguous chunks processed
    /// concurrently; the fish phase completes before the shark phase starts.
    /// With one worker or fewer this is exactly [`Simulation::step`].
    pub fn step_parallel(&self, workers: usize) {
        if workers <= 1 {
            self.step();
            return;
        }

        let pool = match ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("wator-worker-{}", i))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                warn!(workers, error = %e, "Failed to build worker pool, stepping sequentially");
                self.step();
                return;
            }
        };

        let mut chronon = self.chronon.write();
        let mut rng = self.rng.lock();

        let fish_ids = self.fish_ids();
        process_chunks(&pool, &fish_ids, workers, &mut rng, |id, rng| {
            self.process_fish(id, rng)
        });

        let shark_ids = self.shark_ids();
        process_chunks(&pool, &shark_ids, workers, &mut rng, |id, rng| {
            self.process_shark(id, rng)
        });

        *chronon += 1;
        self.trace_chronon(*chronon, workers);
    }

    /// Chronon and population counts as of the last completed chronon
    pub fn stats(&self) -> PopulationStats {
        let chronon = self.chronon.read();
        PopulationStats {
            chronon: *chronon,
            fish: self.fish_count.load(Ordering::SeqCst),
            sharks: self.shark_count.load(Ordering::SeqCst),
        }
    }

    /// Copy of the whole grid as of the last completed chronon
    pub fn grid_snapshot(&self) -> GridSnapshot {
        let _chronon = self.chronon.read();
        self.grid.snapshot()
    }

    /// Place a new fish at `pos` if that cell is empty
    pub fn spawn_fish(&self, pos: Position) -> Option<FishId> {
        let _chronon = self.chronon.write();
        let pos = self.grid.wrap(pos);
        if !self.grid.get(pos).is_empty() {
            return None;
        }
        Some(self.insert_fish(pos))
    }

    /// Place a new shark with `energy` at `pos` if that cell is empty.
    /// A shark needs positive energy to be alive.
    pub fn spawn_shark(&self, pos: Position, energy: i32) -> Option<SharkId> {
        if energy <= 0 {
            return None;
        }
        let _chronon = self.chronon.write();
        let pos = self.grid.wrap(pos);
        if !self.grid.get(pos).is_empty() {
            return None;
        }
        Some(self.insert_shark(pos, energy))
    }

    pub fn fish(&self, id: FishId) -> Option<Fish> {
        let _chronon = self.chronon.read();
        self.fish.get(&id).map(|entry| *entry)
    }

    pub fn shark(&self, id: SharkId) -> Option<Shark> {
        let _chronon = self.chronon.read();
        self.sharks.get(&id).map(|entry| *entry)
    }

    /// Every live fish, ordered by id
    pub fn fish_list(&self) -> Vec<Fish> {
        let _chronon = self.chronon.read();
        let mut fish: Vec<Fish> = self.fish.iter().map(|entry| *entry.value()).collect();
        fish.sort_by_key(|f| f.id);
        fish
    }

    /// Every live shark, ordered by id
    pub fn shark_list(&self) -> Vec<Shark> {
        let _chronon = self.chronon.read();
        let mut sharks: Vec<Shark> = self.sharks.iter().map(|entry| *entry.value()).collect();
        sharks.sort_by_key(|s| s.id);
        sharks
    }

    fn fish_ids(&self) -> Vec<FishId> {
        let mut ids: Vec<FishId> = self.fish.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    fn shark_ids(&self) -> Vec<SharkId> {
        let mut ids: Vec<SharkId> = self.sharks.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    fn random_empty_position(&self, rng: &mut ChaCha8Rng) -> Result<Position> {
        let size = self.grid.size();
        let attempts = self.grid.area() * PLACEMENT_ATTEMPTS_PER_CELL;

        for _ in 0..attempts {
            let pos = Position::new(rng.gen_range(0..size), rng.gen_range(0..size));
            if self.grid.get(pos).is_empty() {
                return Ok(pos);
            }
        }

        Err(Error::Configuration(format!(
            "no empty cell found after {} attempts on a {}x{} grid",
            attempts, size, size
        )))
    }

    fn insert_fish(&self, pos: Position) -> FishId {
        let id = FishId(self.next_fish_id.fetch_add(1, Ordering::SeqCst));
        self.grid.set(pos, Cell::Fish(id));
        self.fish.insert(id, Fish::new(id, pos));
        self.fish_count.fetch_add(1, Ordering::SeqCst);
        id
    }

    fn insert_shark(&self, pos: Position, energy: i32) -> SharkId {
        let id = SharkId(self.next_shark_id.fetch_add(1, Ordering::SeqCst));
        self.grid.set(pos, Cell::Shark(id));
        self.sharks.insert(id, Shark::new(id, pos, energy));
        self.shark_count.fetch_add(1, Ordering::SeqCst);
        id
    }

    /// Move the occupant `me` from `origin` into one of `candidates`, which
    /// are expected to be empty. The first candidate is a uniform pick; if a
    /// racing worker claimed it first the others are tried in random order.
    ///
    /// The target is claimed before the origin is vacated, so the occupant is
    /// never missing from the grid.
    fn relocate(
        &self,
        origin: Position,
        me: Cell,
        mut candidates: Vec<Position>,
        rng: &mut ChaCha8Rng,
    ) -> Option<Position> {
        candidates.shuffle(rng);
        for target in candidates {
            if self.grid.compare_and_set(target, Cell::Empty, me) {
                let vacated = self.grid.compare_and_set(origin, me, Cell::Empty);
                debug_assert!(vacated, "{:?} lost its cell at {}", me, origin);
                return Some(target);
            }
        }
        None
    }

    /// Move a shark onto a neighboring fish and remove that fish. Returns the
    /// cell eaten from, or `None` when every candidate was taken by a racing
    /// shark.
    fn hunt(
        &self,
        origin: Position,
        me: Cell,
        mut prey: Vec<Position>,
        rng: &mut ChaCha8Rng,
    ) -> Option<Position> {
        prey.shuffle(rng);
        for target in prey {
            let cell = self.grid.get(target);
            let Some(fish_id) = cell.fish_id() else {
                continue;
            };
            if !self.grid.compare_and_set(target, cell, me) {
                continue;
            }

            if self.fish.remove(&fish_id).is_some() {
                self.fish_count.fetch_sub(1, Ordering::SeqCst);
            }
            let vacated = self.grid.compare_and_set(origin, me, Cell::Empty);
            debug_assert!(vacated, "{:?} lost its cell at {}", me, origin);
            return Some(target);
        }
        None
    }

    fn process_fish(&self, id: FishId, rng: &mut ChaCha8Rng) {
        // Copy out so no map guard is held across grid or map writes
        let Some(mut fish) = self.fish.get(&id).map(|entry| *entry) else {
            return;
        };

        let origin = fish.position;
        let neighbors = self.grid.neighbors(origin);
        let moved = self.relocate(origin, fish.cell(), neighbors.empty, rng);
        if let Some(target) = moved {
            fish.move_to(target);
        }

        fish.tick();

        // Offspring take the vacated cell; a fish that could not move waits.
        if moved.is_some() && fish.can_reproduce(self.config.fish_breed_age) {
            let child_id = FishId(self.next_fish_id.fetch_add(1, Ordering::SeqCst));
            if self
                .grid
                .compare_and_set(origin, Cell::Empty, Cell::Fish(child_id))
            {
                let child = fish.reproduce(child_id, origin);
                self.fish.insert(child_id, child);
                self.fish_count.fetch_add(1, Ordering::SeqCst);
            }
        }

        if let Some(mut entry) = self.fish.get_mut(&id) {
            *entry = fish;
        }
    }

    fn process_shark(&self, id: SharkId, rng: &mut ChaCha8Rng) {
        let Some(mut shark) = self.sharks.get(&id).map(|entry| *entry) else {
            return;
        };

        let origin = shark.position;
        let me = shark.cell();
        let neighbors = self.grid.neighbors(origin);

        let mut moved = None;
        if !neighbors.fish.is_empty() {
            moved = self.hunt(origin, me, neighbors.fish, rng);
            if moved.is_some() {
                shark.eat(self.config.energy_per_fish);
            }
        }
        if moved.is_none() {
            moved = self.relocate(origin, me, neighbors.empty, rng);
        }
        if let Some(target) = moved {
            shark.move_to(target);
        }

        shark.tick();

        if !shark.is_alive() {
            self.grid.compare_and_set(shark.position, me, Cell::Empty);
            if self.sharks.remove(&id).is_some() {
                self.shark_count.fetch_sub(1, Ordering::SeqCst);
            }
            return;
        }

        if moved.is_some() && shark.can_reproduce(self.config.shark_breed_age) {
            let child_id = SharkId(self.next_shark_id.fetch_add(1, Ordering::SeqCst));
            if self
                .grid
                .compare_and_set(origin, Cell::Empty, Cell::Shark(child_id))
            {
                let child = shark.reproduce(child_id, origin);
                self.sharks.insert(child_id, child);
                self.shark_count.fetch_add(1, Ordering::SeqCst);
            }
        }

        if let Some(mut entry) = self.sharks.get_mut(&id) {
            *entry = shark;
        }
    }

    fn trace_chronon(&self, chronon: u64, workers: usize) {
        trace!(
            chronon,
            workers,
            fish = self.fish_count.load(Ordering::SeqCst),
            sharks = self.shark_count.load(Ordering::SeqCst),
            "Chronon complete"
        );
    }
}
