//! Core library for background disaster risk inference
//!
//! This crate provides the building blocks of the pipeline:
//! - CSV dataset discovery, cleaning and balancing
//! - Synthetic dataset generation for cold starts
//! - Risk classification (random forest or deterministic heuristic)
//! - Atomic model persistence with metadata
//! - Environmental feature sources
//! - Location scoring, alerting and background scheduling

pub mod classifier;
pub mod dataset;
pub mod error;
pub mod models;
pub mod predictor;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod trainer;

pub use classifier::{Classifier, RiskModel};
pub use error::DatasetError;
pub use models::*;
pub use predictor::{AlertEvent, AlertSink, Predictor, DEFAULT_ALERT_THRESHOLD};
pub use scheduler::{Scheduler, SchedulerState, SweepRunner, MIN_SWEEP_INTERVAL};
pub use source::{CompositeSource, FeatureSource};
pub use store::ModelStore;
pub use trainer::Trainer;
