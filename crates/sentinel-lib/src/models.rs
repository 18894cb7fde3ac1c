//! Core data models for the risk pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of input features expected by every model
pub const NUM_FEATURES: usize = 10;

/// Number of disaster classes, including the background class
pub const NUM_CLASSES: usize = 6;

/// Feature names in wire order.
///
/// This order is shared between the dataset loader, the trainer and the
/// predictor: a trained model expects its inputs in exactly this order,
/// so reordering here is a silent correctness bug.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "temperature",
    "humidity",
    "rainfall",
    "wind_speed",
    "soil_moisture",
    "seismic_activity",
    "sat_fire_index",
    "drought_index",
    "pressure",
    "cloud_cover",
];

/// Closed set of disaster classes. `None` is the background class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisasterClass {
    None,
    Flood,
    Cyclone,
    Wildfire,
    Earthquake,
    Drought,
}

impl DisasterClass {
    /// All classes, in the order used for probability vectors and label encoding
    pub const ALL: [DisasterClass; NUM_CLASSES] = [
        DisasterClass::None,
        DisasterClass::Flood,
        DisasterClass::Cyclone,
        DisasterClass::Wildfire,
        DisasterClass::Earthquake,
        DisasterClass::Drought,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DisasterClass::None => "none",
            DisasterClass::Flood => "flood",
            DisasterClass::Cyclone => "cyclone",
            DisasterClass::Wildfire => "wildfire",
            DisasterClass::Earthquake => "earthquake",
            DisasterClass::Drought => "drought",
        }
    }

    /// Parse a normalized (trimmed, lower-case) label. Unknown labels map
    /// to `None` so callers can drop them as noise.
    pub fn from_label(label: &str) -> Option<DisasterClass> {
        match label {
            "none" => Some(DisasterClass::None),
            "flood" => Some(DisasterClass::Flood),
            "cyclone" => Some(DisasterClass::Cyclone),
            "wildfire" => Some(DisasterClass::Wildfire),
            "earthquake" => Some(DisasterClass::Earthquake),
            "drought" => Some(DisasterClass::Drought),
            _ => None,
        }
    }

    /// Position within [`DisasterClass::ALL`], used as the encoded label
    pub fn index(self) -> usize {
        match self {
            DisasterClass::None => 0,
            DisasterClass::Flood => 1,
            DisasterClass::Cyclone => 2,
            DisasterClass::Wildfire => 3,
            DisasterClass::Earthquake => 4,
            DisasterClass::Drought => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<DisasterClass> {
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for DisasterClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered tuple of environmental readings used as classifier input
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    pub wind_speed: f64,
    pub soil_moisture: f64,
    pub seismic_activity: f64,
    pub sat_fire_index: f64,
    pub drought_index: f64,
    pub pressure: f64,
    pub cloud_cover: f64,
}

impl FeatureVector {
    /// Flatten into wire order, matching [`FEATURE_NAMES`]
    pub fn to_array(self) -> [f64; NUM_FEATURES] {
        [
            self.temperature,
            self.humidity,
            self.rainfall,
            self.wind_speed,
            self.soil_moisture,
            self.seismic_activity,
            self.sat_fire_index,
            self.drought_index,
            self.pressure,
            self.cloud_cover,
        ]
    }

    pub fn from_array(values: [f64; NUM_FEATURES]) -> Self {
        Self {
            temperature: values[0],
            humidity: values[1],
            rainfall: values[2],
            wind_speed: values[3],
            soil_moisture: values[4],
            seismic_activity: values[5],
            sat_fire_index: values[6],
            drought_index: values[7],
            pressure: values[8],
            cloud_cover: values[9],
        }
    }

    /// Build a vector from a partial reading map. Missing or non-finite
    /// values default to 0.0 so upstream fetch failures never abort a sweep.
    pub fn from_map(readings: &HashMap<String, f64>) -> Self {
        let mut values = [0.0; NUM_FEATURES];
        for (i, name) in FEATURE_NAMES.iter().enumerate() {
            if let Some(v) = readings.get(*name) {
                if v.is_finite() {
                    values[i] = *v;
                }
            }
        }
        Self::from_array(values)
    }
}

/// Labeled training data: parallel feature matrix and label vector
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub features: Vec<[f64; NUM_FEATURES]>,
    pub labels: Vec<DisasterClass>,
}

impl TrainingSet {
    pub fn push(&mut self, features: [f64; NUM_FEATURES], label: DisasterClass) {
        self.features.push(features);
        self.labels.push(label);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Metadata persisted alongside every trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Kind of classifier backing the artifact ("random_forest" or "heuristic")
    pub model_kind: String,
    /// UTC training timestamp
    pub trained_at: DateTime<Utc>,
    /// Feature order the model was trained with
    pub features: Vec<String>,
    /// Class order of the model's probability output
    pub classes: Vec<String>,
    /// Held-out accuracy; `None` when no evaluation was possible
    pub accuracy: Option<f64>,
    /// SHA-256 digest of the model blob, filled in by the store on save
    #[serde(default)]
    pub model_sha256: String,
}

impl ModelMetadata {
    pub fn new(model_kind: &str, accuracy: Option<f64>) -> Self {
        Self {
            model_kind: model_kind.to_string(),
            trained_at: Utc::now(),
            features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            classes: DisasterClass::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            accuracy,
            model_sha256: String::new(),
        }
    }
}

/// A location scored on every scheduler sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl MonitoredLocation {
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
        }
    }

    /// Default watchlist used when no locations are configured
    pub fn default_watchlist() -> Vec<MonitoredLocation> {
        vec![
            MonitoredLocation::new("Tokyo, Japan", 35.6762, 139.6503),
            MonitoredLocation::new("San Francisco, USA", 37.7749, -122.4194),
            MonitoredLocation::new("Delhi, India", 28.7041, 77.1025),
            MonitoredLocation::new("Jakarta, Indonesia", -6.2088, 106.8456),
            MonitoredLocation::new("Santiago, Chile", -33.4489, -70.6693),
        ]
    }
}

/// Four-level risk label derived from the winning class probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Severe,
}

impl RiskLevel {
    /// Pure step function over the winning probability
    pub fn from_probability(probability: f64) -> RiskLevel {
        if probability >= 0.85 {
            RiskLevel::Severe
        } else if probability >= 0.70 {
            RiskLevel::High
        } else if probability >= 0.50 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::Severe => "Severe",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scoring one location, created fresh each sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub location: String,
    pub disaster_class: DisasterClass,
    pub risk_level: RiskLevel,
    pub probability: f64,
    pub timestamp: DateTime<Utc>,
}
