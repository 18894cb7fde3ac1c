//! Risk classification models
//!
//! One capability interface backed by two variants: a trained ensemble and
//! a deterministic heuristic. Callers never branch on which one they hold.

#[cfg(feature = "ml")]
mod forest;
mod heuristic;

#[cfg(feature = "ml")]
pub use forest::ForestClassifier;
pub use heuristic::HeuristicClassifier;

use crate::models::{DisasterClass, FeatureVector, NUM_CLASSES};
use serde::{Deserialize, Serialize};

/// Classification contract shared by every model variant
pub trait Classifier: Send + Sync {
    /// Most likely class for the given readings
    fn predict(&self, features: &FeatureVector) -> DisasterClass;

    /// Probability per class, indexed by [`DisasterClass::ALL`] order.
    /// Non-negative and sums to 1 for every input.
    fn predict_probability(&self, features: &FeatureVector) -> [f64; NUM_CLASSES];

    /// Stable identifier recorded in model metadata
    fn kind(&self) -> &'static str;
}

/// The persistable model artifact.
///
/// `Heuristic` stays the first variant so artifacts written by builds
/// without the `ml` feature decode identically everywhere.
#[derive(Serialize, Deserialize)]
pub enum RiskModel {
    Heuristic(HeuristicClassifier),
    #[cfg(feature = "ml")]
    Forest(ForestClassifier),
}

impl Classifier for RiskModel {
    fn predict(&self, features: &FeatureVector) -> DisasterClass {
        match self {
            RiskModel::Heuristic(m) => m.predict(features),
            #[cfg(feature = "ml")]
            RiskModel::Forest(m) => m.predict(features),
        }
    }

    fn predict_probability(&self, features: &FeatureVector) -> [f64; NUM_CLASSES] {
        match self {
            RiskModel::Heuristic(m) => m.predict_probability(features),
            #[cfg(feature = "ml")]
            RiskModel::Forest(m) => m.predict_probability(features),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RiskModel::Heuristic(m) => m.kind(),
            #[cfg(feature = "ml")]
            RiskModel::Forest(m) => m.kind(),
        }
    }
}

/// Index of the largest probability; ties resolve to the earlier class
pub(crate) fn argmax(probabilities: &[f64; NUM_CLASSES]) -> usize {
    let mut best = 0;
    for (i, p) in probabilities.iter().enumerate() {
        if *p > probabilities[best] {
            best = i;
        }
    }
    best
}

/// One-hot distribution for classifiers without calibrated probabilities
pub(crate) fn one_hot(class: DisasterClass) -> [f64; NUM_CLASSES] {
    let mut p = [0.0; NUM_CLASSES];
    p[class.index()] = 1.0;
    p
}
