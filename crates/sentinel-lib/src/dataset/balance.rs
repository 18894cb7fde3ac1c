//! Class balancing by oversampling
//!
//! Minority classes are padded up to the majority count by sampling their
//! own rows with replacement. Duplication is deliberate: it keeps the
//! balancing step simple and reproducible.

use crate::models::{DisasterClass, TrainingSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed used by the trainer so balancing is reproducible across runs
pub const DEFAULT_BALANCE_SEED: u64 = 42;

/// Equalize per-class counts by oversampling minority classes.
///
/// Output row count is `max_class_count * distinct_classes_present`;
/// classes already at the maximum are passed through untouched, and every
/// padded class keeps its original rows ahead of the duplicates.
pub fn balance_by_oversample(set: &TrainingSet, seed: u64) -> TrainingSet {
    let mut by_class: Vec<(DisasterClass, Vec<usize>)> = Vec::new();
    for class in DisasterClass::ALL {
        let idx: Vec<usize> = set
            .labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == class)
            .map(|(i, _)| i)
            .collect();
        if !idx.is_empty() {
            by_class.push((class, idx));
        }
    }

    let max_count = by_class.iter().map(|(_, idx)| idx.len()).max().unwrap_or(0);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut balanced = TrainingSet::default();
    for (class, idx) in by_class {
        for &i in &idx {
            balanced.push(set.features[i], class);
        }
        for _ in idx.len()..max_count {
            let i = idx[rng.gen_range(0..idx.len())];
            balanced.push(set.features[i], class);
        }
    }
    balanced
}
