//! Population statistics and their history over a run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Population counts as of the end of a chronon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationStats {
    /// Chronons completed so far
    pub chronon: u64,
    pub fish: usize,
    pub sharks: usize,
}

impl PopulationStats {
    pub fn total(&self) -> usize {
        self.fish + self.sharks
    }

    /// Sharks per fish. `None` while there are no fish.
    pub fn predator_ratio(&self) -> Option<f64> {
        if self.fish == 0 {
            None
        } else {
            Some(self.sharks as f64 / self.fish as f64)
        }
    }
}

impl fmt::Display for PopulationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Chronon: {} | Fish: {} | Sharks: {}",
            self.chronon, self.fish, self.sharks
        )
    }
}

/// Sequence of population samples, one per recorded chronon
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopulationHistory {
    samples: Vec<PopulationStats>,
}

impl PopulationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, stats: PopulationStats) {
        self.samples.push(stats);
    }

    pub fn samples(&self) -> &[PopulationStats] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&PopulationStats> {
        self.samples.last()
    }

    /// Sample with the most fish; the earliest one on ties
    pub fn peak_fish(&self) -> Option<&PopulationStats> {
        self.samples
            .iter()
            .rev()
            .max_by_key(|s| s.fish)
    }

    /// Sample with the most sharks; the earliest one on ties
    pub fn peak_sharks(&self) -> Option<&PopulationStats> {
        self.samples
            .iter()
            .rev()
            .max_by_key(|s| s.sharks)
    }

    /// First chronon at which the fish died out
    pub fn fish_extinct_at(&self) -> Option<u64> {
        self.samples.iter().find(|s| s.fish == 0).map(|s| s.chronon)
    }

    /// First chronon at which the sharks died out
    pub fn sharks_extinct_at(&self) -> Option<u64> {
        self.samples.iter().find(|s| s.sharks == 0).map(|s| s.chronon)
    }

    /// Mean fish and shark counts over all samples
    pub fn mean_population(&self) -> Option<(f64, f64)> {
        if self.samples.is_empty() {
            return None;
        }
        let n = self.samples.len() as f64;
        let fish: usize = self.samples.iter().map(|s| s.fish).sum();
        let sharks: usize = self.samples.iter().map(|s| s.sharks).sum();
        Some((fish as f64 / n, sharks as f64 / n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(chronon: u64, fish: usize, sharks: usize) -> PopulationStats {
        PopulationStats {
            chronon,
            fish,
            sharks,
        }
    }

    #[test]
    fn test_display_matches_report_line() {
        assert_eq!(
            sample(50, 812, 93).to_string(),
            "Chronon: 50 | Fish: 812 | Sharks: 93"
        );
    }

    #[test]
    fn test_predator_ratio() {
        assert_eq!(sample(0, 0, 5).predator_ratio(), None);
        assert_eq!(sample(0, 10, 5).predator_ratio(), Some(0.5));
    }

    #[test]
    fn test_history_peaks() {
        let mut history = PopulationHistory::new();
        history.record(sample(1, 10, 4));
        history.record(sample(2, 30, 4));
        history.record(sample(3, 30, 9));
        history.record(sample(4, 5, 2));

        assert_eq!(history.len(), 4);
        assert_eq!(history.peak_fish().unwrap().chronon, 2);
        assert_eq!(history.peak_sharks().unwrap().chronon, 3);
        assert_eq!(history.latest().unwrap().chronon, 4);
        assert_eq!(history.fish_extinct_at(), None);
    }

    #[test]
    fn test_history_extinction() {
        let mut history = PopulationHistory::new();
        history.record(sample(1, 3, 2));
        history.record(sample(2, 1, 0));
        history.record(sample(3, 0, 0));

        assert_eq!(history.sharks_extinct_at(), Some(2));
        assert_eq!(history.fish_extinct_at(), Some(3));
    }

    #[test]
    fn test_mean_population() {
        let mut history = PopulationHistory::new();
        assert!(history.mean_population().is_none());

        history.record(sample(1, 10, 2));
        history.record(sample(2, 20, 4));
        assert_eq!(history.mean_population(), Some((15.0, 3.0)));
    }
}
