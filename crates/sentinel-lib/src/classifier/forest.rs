//! Random forest classifier backend
//!
//! Wraps a smartcore ensemble of randomized decision trees. Training is
//! seeded so runs are reproducible; probabilities are synthesized one-hot
//! from the majority-vote prediction since the ensemble exposes no
//! calibrated probability output.

use super::{one_hot, Classifier};
use crate::models::{DisasterClass, FeatureVector, NUM_CLASSES, NUM_FEATURES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::warn;

/// Trees in the ensemble
const N_TREES: u16 = 200;

type Forest = RandomForestClassifier<f64, usize, DenseMatrix<f64>, Vec<usize>>;

/// Trained ensemble over the fixed 10-feature input order
#[derive(Serialize, Deserialize)]
pub struct ForestClassifier {
    forest: Forest,
}

impl ForestClassifier {
    /// Fit the ensemble on an encoded training set
    pub fn fit(features: &[[f64; NUM_FEATURES]], labels: &[DisasterClass], seed: u64) -> Result<Self> {
        let mut flat = Vec::with_capacity(features.len() * NUM_FEATURES);
        for row in features {
            flat.extend_from_slice(row);
        }
        let x = DenseMatrix::new(features.len(), NUM_FEATURES, flat, false)
            .context("building training matrix")?;
        let y: Vec<usize> = labels.iter().map(|c| c.index()).collect();

        let params = RandomForestClassifierParameters::default()
            .with_n_trees(N_TREES)
            .with_seed(seed);
        let forest =
            RandomForestClassifier::fit(&x, &y, params).context("fitting random forest")?;
        Ok(Self { forest })
    }

    /// Predict encoded classes for a batch of feature rows
    pub fn predict_batch(&self, rows: &[[f64; NUM_FEATURES]]) -> Result<Vec<DisasterClass>> {
        let mut flat = Vec::with_capacity(rows.len() * NUM_FEATURES);
        for row in rows {
            flat.extend_from_slice(row);
        }
        let x = DenseMatrix::new(rows.len(), NUM_FEATURES, flat, false)
            .context("building prediction matrix")?;
        let encoded = self.forest.predict(&x).context("forest prediction")?;
        Ok(encoded
            .into_iter()
            .map(|i| DisasterClass::from_index(i).unwrap_or(DisasterClass::None))
            .collect())
    }

    fn predict_one(&self, features: &FeatureVector) -> Result<DisasterClass> {
        let predictions = self.predict_batch(&[features.to_array()])?;
        Ok(predictions.into_iter().next().unwrap_or(DisasterClass::None))
    }
}

impl Classifier for ForestClassifier {
    fn predict(&self, features: &FeatureVector) -> DisasterClass {
        match self.predict_one(features) {
            Ok(class) => class,
            Err(e) => {
                // Scoring failure degrades to the background class rather
                // than aborting the caller's sweep
                warn!(error = %e, "forest scoring failed");
                DisasterClass::None
            }
        }
    }

    fn predict_probability(&self, features: &FeatureVector) -> [f64; NUM_CLASSES] {
        one_hot(self.predict(features))
    }

    fn kind(&self) -> &'static str {
        "random_forest"
    }
}
