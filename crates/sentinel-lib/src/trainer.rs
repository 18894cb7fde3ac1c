//! Training orchestration
//!
//! Ordered chain of fallible attempts: merged CSV dataset, then the
//! synthetic generator, then fitting the ensemble or wrapping the
//! heuristic when no statistical backend is compiled in. Dataset failures
//! are swallowed here; only persistence failures propagate.

#[cfg(feature = "ml")]
use crate::classifier::ForestClassifier;
#[cfg(not(feature = "ml"))]
use crate::classifier::HeuristicClassifier;
use crate::classifier::RiskModel;
use crate::dataset::{
    balance_by_oversample, generate_balanced, DatasetLoader, DEFAULT_BALANCE_SEED,
};
use crate::models::{ModelMetadata, TrainingSet};
use crate::store::ModelStore;
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Synthetic rows per class for a full training run
pub const DEFAULT_ROWS_PER_CLASS: usize = 1500;

/// Seed shared by balancing, splitting and fitting for reproducible runs
pub const TRAIN_SEED: u64 = 42;

/// Held-out share of the dataset used for the accuracy estimate
#[cfg(feature = "ml")]
const TEST_FRACTION: f64 = 0.2;

/// Orchestrates dataset selection, fitting and persistence
#[derive(Debug, Clone)]
pub struct Trainer {
    data_dir: PathBuf,
}

impl Trainer {
    /// `data_dir` is the base search root for CSV training files
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Train a model and publish it through the store.
    ///
    /// `rows_per_class_if_synthetic` sizes the generated dataset when no
    /// usable CSV data exists; `prefer_existing_dataset` controls whether
    /// CSV discovery is attempted at all.
    pub fn train_and_persist(
        &self,
        store: &ModelStore,
        rows_per_class_if_synthetic: usize,
        prefer_existing_dataset: bool,
    ) -> Result<ModelMetadata> {
        let dataset = if prefer_existing_dataset {
            self.load_existing()
        } else {
            None
        };
        let set = match dataset {
            Some(set) => {
                info!(rows = set.len(), "training on merged CSV dataset");
                set
            }
            None => {
                info!(
                    rows_per_class = rows_per_class_if_synthetic,
                    "training on synthetic dataset"
                );
                generate_balanced(rows_per_class_if_synthetic, TRAIN_SEED)
            }
        };

        let (model, metadata) = fit(set)?;
        let stored = store.save(&model, &metadata)?;
        info!(
            model_kind = %stored.model_kind,
            accuracy = ?stored.accuracy,
            "training complete"
        );
        Ok(stored)
    }

    /// CSV attempt of the fallback chain; every dataset failure collapses
    /// to "no dataset available"
    fn load_existing(&self) -> Option<TrainingSet> {
        match DatasetLoader::new(self.data_dir.clone()).load() {
            Ok(set) if !set.is_empty() => Some(balance_by_oversample(&set, DEFAULT_BALANCE_SEED)),
            Ok(_) => {
                info!("discovered dataset is empty after cleaning, falling back to synthetic");
                None
            }
            Err(e) => {
                info!(error = %e, "no usable CSV dataset, falling back to synthetic");
                None
            }
        }
    }
}

#[cfg(feature = "ml")]
fn fit(set: TrainingSet) -> Result<(RiskModel, ModelMetadata)> {
    let (train, test) = stratified_split(&set, TEST_FRACTION, TRAIN_SEED);
    let forest = ForestClassifier::fit(&train.features, &train.labels, TRAIN_SEED)?;
    let accuracy = if test.is_empty() {
        None
    } else {
        let predictions = forest.predict_batch(&test.features)?;
        let correct = predictions.iter().zip(&test.labels).filter(|(p, l)| p == l).count();
        Some(correct as f64 / test.len() as f64)
    };
    Ok((RiskModel::Forest(forest), ModelMetadata::new("random_forest", accuracy)))
}

/// No statistical backend compiled in: wrap the heuristic, accuracy unknown
#[cfg(not(feature = "ml"))]
fn fit(_set: TrainingSet) -> Result<(RiskModel, ModelMetadata)> {
    Ok((
        RiskModel::Heuristic(HeuristicClassifier),
        ModelMetadata::new("heuristic", None),
    ))
}

/// Per-class shuffled split, keeping at least one training row per class
#[cfg(feature = "ml")]
fn stratified_split(set: &TrainingSet, test_fraction: f64, seed: u64) -> (TrainingSet, TrainingSet) {
    use crate::models::DisasterClass;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = TrainingSet::default();
    let mut test = TrainingSet::default();
    for class in DisasterClass::ALL {
        let mut idx: Vec<usize> = set
            .labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == class)
            .map(|(i, _)| i)
            .collect();
        if idx.is_empty() {
            continue;
        }
        idx.shuffle(&mut rng);
        let n_test = ((idx.len() as f64) * test_fraction).round() as usize;
        let n_test = n_test.min(idx.len().saturating_sub(1));
        for (k, &i) in idx.iter().enumerate() {
            if k < n_test {
                test.push(set.features[i], set.labels[i]);
            } else {
                train.push(set.features[i], set.labels[i]);
            }
        }
    }
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DisasterClass, FEATURE_NAMES};
    use tempfile::TempDir;

    #[test]
    fn test_training_succeeds_with_no_dataset_present() {
        let model_dir = TempDir::new().unwrap();
        let store = ModelStore::new(model_dir.path());
        let trainer = Trainer::new(model_dir.path().join("does-not-exist"));

        let meta = trainer.train_and_persist(&store, 40, true).unwrap();
        if let Some(accuracy) = meta.accuracy {
            assert!((0.0..=1.0).contains(&accuracy));
        }
        assert_eq!(meta.features, FEATURE_NAMES.to_vec());
        assert_eq!(meta.classes.len(), 6);
        assert!(store.load().is_some());
        assert_eq!(store.load_metadata().unwrap(), meta);
    }

    #[test]
    fn test_training_prefers_existing_csv() {
        let model_dir = TempDir::new().unwrap();
        let data_dir = TempDir::new().unwrap();
        let mut csv = format!("{},label\n", FEATURE_NAMES.join(","));
        for i in 0..10 {
            let flood: Vec<String> = vec![
                "26".into(), "85".into(), format!("{}", 90 + i), "12".into(), "0.8".into(),
                "0.2".into(), "0.2".into(), "0.1".into(), "1005".into(), "80".into(),
            ];
            csv += &format!("{},flood\n", flood.join(","));
            let quiet: Vec<String> = vec![
                "24".into(), "50".into(), "2".into(), "4".into(), "0.3".into(),
                format!("0.{}", i + 1), "0.2".into(), "0.2".into(), "1012".into(), "40".into(),
            ];
            csv += &format!("{},none\n", quiet.join(","));
        }
        std::fs::write(data_dir.path().join("history.csv"), csv).unwrap();

        let store = ModelStore::new(model_dir.path());
        let trainer = Trainer::new(data_dir.path());
        let meta = trainer.train_and_persist(&store, 40, true).unwrap();
        assert!(store.load().is_some());
        assert!(!meta.model_sha256.is_empty());
    }

    #[test]
    fn test_synthetic_forced_when_not_preferring_csv() {
        let model_dir = TempDir::new().unwrap();
        let store = ModelStore::new(model_dir.path());
        let trainer = Trainer::new(model_dir.path());
        let meta = trainer.train_and_persist(&store, 30, false).unwrap();
        assert!(store.exists());
        assert!(!meta.model_kind.is_empty());
    }

    #[cfg(feature = "ml")]
    #[test]
    fn test_stratified_split_proportions() {
        let set = generate_balanced(50, 9);
        let (train, test) = stratified_split(&set, 0.2, TRAIN_SEED);
        assert_eq!(train.len() + test.len(), set.len());
        for class in DisasterClass::ALL {
            let in_test = test.labels.iter().filter(|l| **l == class).count();
            assert_eq!(in_test, 10, "expected 20% of 50 rows for {class}");
        }
    }

    #[cfg(feature = "ml")]
    #[test]
    fn test_forest_metadata_kind_and_accuracy() {
        let model_dir = TempDir::new().unwrap();
        let store = ModelStore::new(model_dir.path());
        let trainer = Trainer::new(model_dir.path().join("missing"));
        let meta = trainer.train_and_persist(&store, 40, true).unwrap();
        assert_eq!(meta.model_kind, "random_forest");
        // Synthetic regimes are cleanly separated
        assert!(meta.accuracy.unwrap() > 0.8);
    }

    #[cfg(not(feature = "ml"))]
    #[test]
    fn test_heuristic_metadata_without_backend() {
        let model_dir = TempDir::new().unwrap();
        let store = ModelStore::new(model_dir.path());
        let trainer = Trainer::new(model_dir.path().join("missing"));
        let meta = trainer.train_and_persist(&store, 40, true).unwrap();
        assert_eq!(meta.model_kind, "heuristic");
        assert!(meta.accuracy.is_none());
    }
}
