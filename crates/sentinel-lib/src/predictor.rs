//! Location scoring and alert emission
//!
//! Builds a feature vector per monitored location, scores it with the
//! current model, and surfaces high-confidence non-background predictions
//! as structured alert events. Low-confidence and background predictions
//! are suppressed by design; that is the noise filter, not an error.

use crate::classifier::{argmax, Classifier};
use crate::models::{
    DisasterClass, FeatureVector, MonitoredLocation, RiskAssessment, RiskLevel,
};
use crate::scheduler::SweepRunner;
use crate::source::FeatureSource;
use crate::store::ModelStore;
use crate::trainer::Trainer;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default minimum winning probability before an alert is emitted
pub const DEFAULT_ALERT_THRESHOLD: f64 = 0.70;

/// Synthetic rows per class when a sweep has to train on demand
const ON_DEMAND_ROWS_PER_CLASS: usize = 500;

/// The alert shape consumed by downstream collaborators
#[derive(Debug, Clone, Serialize)]
pub struct AlertEvent {
    pub location: String,
    pub disaster_class: DisasterClass,
    pub risk_level: RiskLevel,
    pub probability: f64,
    /// UTC, second precision
    pub timestamp: String,
}

impl From<&RiskAssessment> for AlertEvent {
    fn from(assessment: &RiskAssessment) -> Self {
        Self {
            location: assessment.location.clone(),
            disaster_class: assessment.disaster_class,
            risk_level: assessment.risk_level,
            probability: assessment.probability,
            timestamp: assessment.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Destination for emitted alerts (log pipeline, webhook, queue, ...)
pub trait AlertSink: Send + Sync {
    fn emit(&self, event: &AlertEvent);
}

/// Default sink: logs the serialized event for downstream routing
#[derive(Debug, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn emit(&self, event: &AlertEvent) {
        match serde_json::to_string(event) {
            Ok(json) => info!(target: "sentinel::alerts", alert = %json, "risk alert"),
            Err(e) => warn!(error = %e, "failed to serialize alert event"),
        }
    }
}

/// Scores monitored locations against the current model
pub struct Predictor {
    store: Arc<ModelStore>,
    source: Arc<dyn FeatureSource>,
    sink: Arc<dyn AlertSink>,
    trainer: Trainer,
    locations: Vec<MonitoredLocation>,
    threshold: f64,
}

impl Predictor {
    pub fn new(
        store: Arc<ModelStore>,
        source: Arc<dyn FeatureSource>,
        trainer: Trainer,
        locations: Vec<MonitoredLocation>,
    ) -> Self {
        Self {
            store,
            source,
            sink: Arc::new(TracingAlertSink),
            trainer,
            locations,
            threshold: DEFAULT_ALERT_THRESHOLD,
        }
    }

    /// Override the alert probability threshold (0.0 to 1.0)
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Score one location. Returns `None` when the prediction is the
    /// background class or falls below the alert threshold.
    pub fn assess<C: Classifier>(
        &self,
        model: &C,
        location: &MonitoredLocation,
    ) -> Option<RiskAssessment> {
        let readings = self.source.fetch(location.latitude, location.longitude);
        let features = FeatureVector::from_map(&readings);

        let probabilities = model.predict_probability(&features);
        let best = argmax(&probabilities);
        let disaster_class = DisasterClass::ALL[best];
        let probability = probabilities[best];

        if disaster_class == DisasterClass::None || probability < self.threshold {
            debug!(
                location = %location.name,
                class = %disaster_class,
                probability,
                "prediction suppressed"
            );
            return None;
        }

        let assessment = RiskAssessment {
            location: location.name.clone(),
            disaster_class,
            risk_level: RiskLevel::from_probability(probability),
            probability,
            timestamp: Utc::now(),
        };
        self.sink.emit(&AlertEvent::from(&assessment));
        Some(assessment)
    }

    /// One full sweep over all monitored locations.
    ///
    /// Re-reads the current model every sweep so a newly trained artifact
    /// is picked up; trains on demand when none exists. Returns the number
    /// of alerts emitted.
    pub fn sweep(&self) -> usize {
        let model = match self.current_model() {
            Some(model) => model,
            None => return 0,
        };
        let mut emitted = 0;
        for location in &self.locations {
            if let Some(assessment) = self.assess(&model, location) {
                info!(
                    location = %assessment.location,
                    class = %assessment.disaster_class,
                    risk_level = %assessment.risk_level,
                    probability = assessment.probability,
                    "risk assessment emitted"
                );
                emitted += 1;
            }
        }
        debug!(locations = self.locations.len(), emitted, "sweep finished");
        emitted
    }

    fn current_model(&self) -> Option<crate::classifier::RiskModel> {
        if let Some(model) = self.store.load() {
            return Some(model);
        }
        info!("no model artifact present, training on demand");
        if let Err(e) = self
            .trainer
            .train_and_persist(&self.store, ON_DEMAND_ROWS_PER_CLASS, true)
        {
            warn!(error = %e, "on-demand training failed");
            return None;
        }
        let model = self.store.load();
        if model.is_none() {
            warn!("model still unavailable after on-demand training");
        }
        model
    }
}

impl SweepRunner for Predictor {
    fn run_sweep(&self) {
        self.sweep();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NUM_CLASSES;
    use crate::source::FeatureSource;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Classifier returning a fixed distribution, for boundary tests
    struct FixedModel([f64; NUM_CLASSES]);

    impl Classifier for FixedModel {
        fn predict(&self, _features: &FeatureVector) -> DisasterClass {
            DisasterClass::ALL[argmax(&self.0)]
        }

        fn predict_probability(&self, _features: &FeatureVector) -> [f64; NUM_CLASSES] {
            self.0
        }

        fn kind(&self) -> &'static str {
            "fixed"
        }
    }

    struct EmptySource;

    impl FeatureSource for EmptySource {
        fn fetch(&self, _lat: f64, _lon: f64) -> HashMap<String, f64> {
            HashMap::new()
        }
    }

    #[derive(Default)]
    struct CollectingSink(Mutex<Vec<AlertEvent>>);

    impl AlertSink for CollectingSink {
        fn emit(&self, event: &AlertEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn predictor(sink: Arc<CollectingSink>) -> Predictor {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ModelStore::new(dir.path()));
        let trainer = Trainer::new(dir.path().join("nodata"));
        // TempDir dropped here; the store path only matters for sweep tests
        Predictor::new(store, Arc::new(EmptySource), trainer, vec![tokyo()]).with_sink(sink)
    }

    fn tokyo() -> MonitoredLocation {
        MonitoredLocation::new("Tokyo, Japan", 35.6762, 139.6503)
    }

    fn flood_distribution(p: f64) -> [f64; NUM_CLASSES] {
        let mut dist = [0.0; NUM_CLASSES];
        dist[DisasterClass::Flood.index()] = p;
        dist[DisasterClass::None.index()] = 1.0 - p;
        dist
    }

    #[test]
    fn test_emission_at_threshold() {
        let sink = Arc::new(CollectingSink::default());
        let predictor = predictor(sink.clone());
        let model = FixedModel(flood_distribution(0.70));

        let assessment = predictor.assess(&model, &tokyo()).expect("should emit at threshold");
        assert_eq!(assessment.disaster_class, DisasterClass::Flood);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.probability, 0.70);
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_suppressed_below_threshold() {
        let sink = Arc::new(CollectingSink::default());
        let predictor = predictor(sink.clone());
        let model = FixedModel(flood_distribution(0.69));

        assert!(predictor.assess(&model, &tokyo()).is_none());
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_background_class_never_emits() {
        let sink = Arc::new(CollectingSink::default());
        let predictor = predictor(sink.clone());
        let mut dist = [0.0; NUM_CLASSES];
        dist[DisasterClass::None.index()] = 0.99;
        dist[DisasterClass::Flood.index()] = 0.01;
        let model = FixedModel(dist);

        assert!(predictor.assess(&model, &tokyo()).is_none());
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_severe_level_above_085() {
        let sink = Arc::new(CollectingSink::default());
        let predictor = predictor(sink);
        let model = FixedModel(flood_distribution(0.95));
        let assessment = predictor.assess(&model, &tokyo()).unwrap();
        assert_eq!(assessment.risk_level, RiskLevel::Severe);
    }

    #[test]
    fn test_alert_event_shape() {
        let sink = Arc::new(CollectingSink::default());
        let predictor = predictor(sink.clone());
        let model = FixedModel(flood_distribution(0.75));
        predictor.assess(&model, &tokyo()).unwrap();

        let events = sink.0.lock().unwrap();
        let event = &events[0];
        assert_eq!(event.location, "Tokyo, Japan");
        assert_eq!(event.disaster_class, DisasterClass::Flood);
        // second precision, trailing Z
        assert!(event.timestamp.ends_with('Z'));
        assert!(!event.timestamp.contains('.'));
    }

    #[test]
    fn test_sweep_trains_on_demand() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ModelStore::new(dir.path().join("models")));
        let trainer = Trainer::new(dir.path().join("nodata"));
        let sink = Arc::new(CollectingSink::default());
        let predictor = Predictor::new(
            store.clone(),
            Arc::new(EmptySource),
            trainer,
            MonitoredLocation::default_watchlist(),
        )
        .with_sink(sink);

        assert!(store.load().is_none());
        predictor.sweep();
        assert!(store.load().is_some(), "sweep should have trained a model");
    }
}
