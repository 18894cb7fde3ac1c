//! Synthetic training data
//!
//! Deterministic generator used when no CSV dataset is available. Each
//! class draws from its own fixed marginal ranges: floods favor heavy
//! rainfall and saturated soil, wildfires favor heat and high fire index,
//! earthquakes are driven by a magnitude-like seismic field, and the
//! background class sits at moderate baseline conditions.

use crate::models::{DisasterClass, FeatureVector, TrainingSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate `rows_per_class` rows for each of the six classes.
///
/// Deterministic for a fixed seed so training runs are reproducible.
pub fn generate_balanced(rows_per_class: usize, seed: u64) -> TrainingSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut set = TrainingSet::default();
    for class in DisasterClass::ALL {
        for _ in 0..rows_per_class {
            set.push(sample(class, &mut rng).to_array(), class);
        }
    }
    set
}

fn sample(class: DisasterClass, rng: &mut StdRng) -> FeatureVector {
    match class {
        // Baseline conditions, no event
        DisasterClass::None => FeatureVector {
            temperature: normal(rng, 25.0, 5.0),
            humidity: rng.gen_range(40.0..70.0),
            rainfall: rng.gen_range(0.0..10.0),
            wind_speed: rng.gen_range(0.0..10.0),
            soil_moisture: rng.gen_range(0.2..0.5),
            seismic_activity: exponential(rng, 0.5),
            sat_fire_index: rng.gen_range(0.1..0.4),
            drought_index: rng.gen_range(0.1..0.4),
            pressure: normal(rng, 1010.0, 5.0),
            cloud_cover: rng.gen_range(20.0..60.0),
        },
        DisasterClass::Flood => FeatureVector {
            temperature: normal(rng, 26.0, 3.0),
            humidity: rng.gen_range(70.0..95.0),
            rainfall: rng.gen_range(60.0..150.0),
            wind_speed: rng.gen_range(5.0..20.0),
            soil_moisture: rng.gen_range(0.6..0.95),
            seismic_activity: exponential(rng, 0.4),
            sat_fire_index: rng.gen_range(0.1..0.3),
            drought_index: rng.gen_range(0.0..0.3),
            pressure: normal(rng, 1005.0, 5.0),
            cloud_cover: rng.gen_range(60.0..100.0),
        },
        DisasterClass::Cyclone => FeatureVector {
            temperature: normal(rng, 28.0, 3.0),
            humidity: rng.gen_range(60.0..90.0),
            rainfall: rng.gen_range(20.0..100.0),
            wind_speed: rng.gen_range(25.0..60.0),
            soil_moisture: rng.gen_range(0.4..0.8),
            seismic_activity: exponential(rng, 0.4),
            sat_fire_index: rng.gen_range(0.1..0.4),
            drought_index: rng.gen_range(0.0..0.4),
            pressure: normal(rng, 995.0, 6.0),
            cloud_cover: rng.gen_range(60.0..100.0),
        },
        DisasterClass::Wildfire => FeatureVector {
            temperature: rng.gen_range(32.0..48.0),
            humidity: rng.gen_range(10.0..35.0),
            rainfall: rng.gen_range(0.0..3.0),
            wind_speed: rng.gen_range(5.0..25.0),
            soil_moisture: rng.gen_range(0.05..0.25),
            seismic_activity: exponential(rng, 0.4),
            sat_fire_index: rng.gen_range(0.5..0.95),
            drought_index: rng.gen_range(0.5..0.9),
            pressure: normal(rng, 1008.0, 4.0),
            cloud_cover: rng.gen_range(0.0..30.0),
        },
        // Magnitude-like seismic field dominates
        DisasterClass::Earthquake => FeatureVector {
            temperature: normal(rng, 25.0, 5.0),
            humidity: rng.gen_range(30.0..70.0),
            rainfall: rng.gen_range(0.0..20.0),
            wind_speed: rng.gen_range(0.0..15.0),
            soil_moisture: rng.gen_range(0.2..0.5),
            seismic_activity: rng.gen_range(3.0..7.5),
            sat_fire_index: rng.gen_range(0.1..0.4),
            drought_index: rng.gen_range(0.1..0.5),
            pressure: normal(rng, 1010.0, 5.0),
            cloud_cover: rng.gen_range(0.0..80.0),
        },
        DisasterClass::Drought => FeatureVector {
            temperature: rng.gen_range(30.0..45.0),
            humidity: rng.gen_range(10.0..40.0),
            rainfall: rng.gen_range(0.0..2.0),
            wind_speed: rng.gen_range(0.0..12.0),
            soil_moisture: rng.gen_range(0.05..0.2),
            seismic_activity: exponential(rng, 0.4),
            sat_fire_index: rng.gen_range(0.3..0.7),
            drought_index: rng.gen_range(0.6..0.95),
            pressure: normal(rng, 1008.0, 4.0),
            cloud_cover: rng.gen_range(0.0..40.0),
        },
    }
}

/// Gaussian draw via the Box-Muller transform
fn normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen::<f64>();
    mean + std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Exponential draw via inverse CDF
fn exponential(rng: &mut StdRng, scale: f64) -> f64 {
    let u: f64 = rng.gen_range(f64::EPSILON..1.0);
    -scale * u.ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NUM_CLASSES;

    #[test]
    fn test_balanced_counts() {
        let set = generate_balanced(25, 1);
        assert_eq!(set.len(), 25 * NUM_CLASSES);
        for class in DisasterClass::ALL {
            assert_eq!(set.labels.iter().filter(|l| **l == class).count(), 25);
        }
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let a = generate_balanced(10, 42);
        let b = generate_balanced(10, 42);
        assert_eq!(a.features, b.features);
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_all_features_finite() {
        let set = generate_balanced(100, 3);
        for features in &set.features {
            assert!(features.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_class_marginals_separate() {
        let set = generate_balanced(50, 5);
        for (features, label) in set.features.iter().zip(&set.labels) {
            let v = FeatureVector::from_array(*features);
            match label {
                DisasterClass::Flood => {
                    assert!(v.rainfall >= 60.0);
                    assert!(v.soil_moisture >= 0.6);
                }
                DisasterClass::Cyclone => assert!(v.wind_speed >= 25.0),
                DisasterClass::Wildfire => {
                    assert!(v.temperature >= 32.0);
                    assert!(v.sat_fire_index >= 0.5);
                }
                DisasterClass::Earthquake => assert!(v.seismic_activity >= 3.0),
                DisasterClass::Drought => assert!(v.drought_index >= 0.6),
                DisasterClass::None => assert!(v.rainfall < 10.0),
            }
        }
    }
}
