//! Rule-based fallback classifier
//!
//! Used when no trainable statistical backend is present. Each hazard
//! class gets a non-negative score from fixed feature thresholds; the
//! background class takes whatever headroom the hazards leave.

use super::{argmax, Classifier};
use crate::models::{DisasterClass, FeatureVector, NUM_CLASSES};
use serde::{Deserialize, Serialize};

/// Deterministic, parameter-free scorer over the fixed feature set
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    /// Raw per-class scores in [`DisasterClass::ALL`] order, all non-negative
    fn raw_scores(f: &FeatureVector) -> [f64; NUM_CLASSES] {
        let flood = ((f.rainfall - 50.0) / 100.0).max(0.0) + (f.soil_moisture - 0.6).max(0.0);
        let cyclone = ((f.wind_speed - 20.0) / 50.0).max(0.0);
        let wildfire =
            ((f.temperature - 30.0) / 20.0).max(0.0) + (f.sat_fire_index - 0.5).max(0.0);
        let earthquake = (f.seismic_activity / 6.0).clamp(0.0, 1.0);
        let drought = (f.drought_index - 0.5).max(0.0) + ((f.temperature - 35.0) / 20.0).max(0.0);

        let hazard_total = flood + cyclone + wildfire + earthquake + drought;
        let none = (1.0 - hazard_total.min(1.0)).max(0.0);
        [none, flood, cyclone, wildfire, earthquake, drought]
    }
}

impl Classifier for HeuristicClassifier {
    fn predict(&self, features: &FeatureVector) -> DisasterClass {
        let probabilities = self.predict_probability(features);
        DisasterClass::ALL[argmax(&probabilities)]
    }

    fn predict_probability(&self, features: &FeatureVector) -> [f64; NUM_CLASSES] {
        let scores = Self::raw_scores(features);
        let total: f64 = scores.iter().sum();
        if total <= 0.0 {
            let mut p = [0.0; NUM_CLASSES];
            p[DisasterClass::None.index()] = 1.0;
            return p;
        }
        scores.map(|s| s / total)
    }

    fn kind(&self) -> &'static str {
        "heuristic"
    }
}
