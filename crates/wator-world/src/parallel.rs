//! Splitting a phase's work list across worker threads.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::ops::Range;

/// Split `len` items into at most `workers` contiguous, non-empty ranges of
/// roughly equal size. The last range absorbs the remainder.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1).min(len);
    if workers == 0 {
        return Vec::new();
    }

    let chunk = len / workers;
    (0..workers)
        .map(|i| {
            let start = i * chunk;
            let end = if i + 1 == workers { len } else { start + chunk };
            start..end
        })
        .collect()
}

/// Run `process` over every item of `items` on `pool`, one task per chunk.
///
/// Each chunk gets its own generator seeded from `rng`, so workers never
/// share random state. Returns once every chunk has finished.
pub fn process_chunks<T, F>(
    pool: &ThreadPool,
    items: &[T],
    workers: usize,
    rng: &mut ChaCha8Rng,
    process: F,
) where
    T: Copy + Sync,
    F: Fn(T, &mut ChaCha8Rng) + Sync,
{
    let chunks: Vec<(Range<usize>, u64)> = partition(items.len(), workers)
        .into_iter()
        .map(|range| (range, rng.gen()))
        .collect();

    pool.install(|| {
        chunks.into_par_iter().for_each(|(range, seed)| {
            let mut chunk_rng = ChaCha8Rng::seed_from_u64(seed);
            for &item in &items[range] {
                process(item, &mut chunk_rng);
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::ThreadPoolBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_partition_even() {
        assert_eq!(partition(12, 3), vec![0..4, 4..8, 8..12]);
    }

    #[test]
    fn test_partition_remainder_goes_last() {
        assert_eq!(partition(10, 3), vec![0..3, 3..6, 6..10]);
    }

    #[test]
    fn test_partition_fewer_items_than_workers() {
        assert_eq!(partition(2, 8), vec![0..1, 1..2]);
        assert!(partition(0, 4).is_empty());
    }

    #[test]
    fn test_partition_single_worker() {
        assert_eq!(partition(7, 1), vec![0..7]);
        assert_eq!(partition(7, 0), vec![0..7]);
    }

    #[test]
    fn test_partition_covers_every_index_once() {
        for len in 0..40 {
            for workers in 1..10 {
                let ranges = partition(len, workers);
                let covered: Vec<usize> = ranges.into_iter().flatten().collect();
                assert_eq!(covered, (0..len).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn test_process_chunks_visits_each_item() {
        let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
        let items: Vec<usize> = (0..1000).collect();
        let sum = AtomicUsize::new(0);
        let visits = AtomicUsize::new(0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        process_chunks(&pool, &items, 4, &mut rng, |item, _rng| {
            sum.fetch_add(item, Ordering::Relaxed);
            visits.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(visits.load(Ordering::Relaxed), 1000);
        assert_eq!(sum.load(Ordering::Relaxed), 999 * 1000 / 2);
    }
}
