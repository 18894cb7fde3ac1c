//! Environmental feature sources
//!
//! Adapters that fetch raw readings for a coordinate. The pipeline only
//! depends on the key/value contract: a partial mapping of feature names
//! to numbers. Upstream failures yield empty or partial maps; sources
//! never raise into the predictor.

use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Env var holding the OpenWeather API key
pub const OPENWEATHER_API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Supplier of raw readings for one coordinate
pub trait FeatureSource: Send + Sync {
    /// Partial mapping of feature names to values. Implementations must
    /// not fail; on upstream errors they return whatever subset they have.
    fn fetch(&self, latitude: f64, longitude: f64) -> HashMap<String, f64>;
}

fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(HTTP_TIMEOUT)
        .build()
}

/// Current weather via the OpenWeather API.
///
/// Without an API key this degrades to plausible randomized baseline
/// readings so the pipeline keeps functioning in development setups.
pub struct OpenWeatherSource {
    api_key: Option<String>,
    endpoint: String,
}

impl OpenWeatherSource {
    pub fn new() -> Self {
        Self {
            api_key: std::env::var(OPENWEATHER_API_KEY_ENV).ok().filter(|k| !k.is_empty()),
            endpoint: "https://api.openweathermap.org/data/2.5/weather".to_string(),
        }
    }

    fn fetch_live(&self, key: &str, latitude: f64, longitude: f64) -> Option<HashMap<String, f64>> {
        let response = agent()
            .get(&self.endpoint)
            .query("lat", &latitude.to_string())
            .query("lon", &longitude.to_string())
            .query("appid", key)
            .query("units", "metric")
            .call()
            .map_err(|e| warn!(error = %e, "weather fetch failed"))
            .ok()?;
        let body: serde_json::Value = response
            .into_json()
            .map_err(|e| warn!(error = %e, "weather response not JSON"))
            .ok()?;

        let mut readings = HashMap::new();
        let mut put = |name: &str, value: Option<f64>| {
            if let Some(v) = value {
                readings.insert(name.to_string(), v);
            }
        };
        put("temperature", body["main"]["temp"].as_f64());
        put("humidity", body["main"]["humidity"].as_f64());
        put(
            "rainfall",
            body["rain"]["1h"].as_f64().or_else(|| body["rain"]["3h"].as_f64()).or(Some(0.0)),
        );
        put("wind_speed", body["wind"]["speed"].as_f64());
        put("pressure", body["main"]["pressure"].as_f64());
        put("cloud_cover", body["clouds"]["all"].as_f64());
        Some(readings)
    }

    fn mock_weather() -> HashMap<String, f64> {
        let mut rng = rand::thread_rng();
        HashMap::from([
            ("temperature".to_string(), rng.gen_range(20.0..35.0)),
            ("humidity".to_string(), rng.gen_range(30.0..90.0)),
            ("rainfall".to_string(), rng.gen_range(0.0..50.0)),
            ("wind_speed".to_string(), rng.gen_range(0.0..30.0)),
            ("pressure".to_string(), rng.gen_range(1000.0..1020.0)),
            ("cloud_cover".to_string(), rng.gen_range(0.0..100.0)),
        ])
    }
}

impl Default for OpenWeatherSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureSource for OpenWeatherSource {
    fn fetch(&self, latitude: f64, longitude: f64) -> HashMap<String, f64> {
        match &self.api_key {
            Some(key) => self.fetch_live(key, latitude, longitude).unwrap_or_default(),
            None => {
                debug!("no OpenWeather API key, using mock weather readings");
                Self::mock_weather()
            }
        }
    }
}

/// Most recent earthquake magnitude within 300 km, via the USGS event API
pub struct UsgsQuakeSource {
    endpoint: String,
    radius_km: u32,
}

impl UsgsQuakeSource {
    pub fn new() -> Self {
        Self {
            endpoint: "https://earthquake.usgs.gov/fdsnws/event/1/query".to_string(),
            radius_km: 300,
        }
    }

    fn latest_magnitude(&self, latitude: f64, longitude: f64) -> Option<f64> {
        let response = agent()
            .get(&self.endpoint)
            .query("format", "geojson")
            .query("latitude", &latitude.to_string())
            .query("longitude", &longitude.to_string())
            .query("maxradiuskm", &self.radius_km.to_string())
            .query("orderby", "time")
            .query("limit", "1")
            .call()
            .map_err(|e| warn!(error = %e, "seismic fetch failed"))
            .ok()?;
        let body: serde_json::Value = response.into_json().ok()?;
        body["features"][0]["properties"]["mag"].as_f64()
    }
}

impl Default for UsgsQuakeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureSource for UsgsQuakeSource {
    fn fetch(&self, latitude: f64, longitude: f64) -> HashMap<String, f64> {
        let magnitude = self.latest_magnitude(latitude, longitude).unwrap_or(0.0);
        HashMap::from([("seismic_activity".to_string(), magnitude)])
    }
}

/// Satellite-derived indices. Placeholder values until a real upstream
/// (NASA/Copernicus soil and fire products) is wired in.
#[derive(Debug, Default)]
pub struct SatelliteIndexSource;

impl FeatureSource for SatelliteIndexSource {
    fn fetch(&self, _latitude: f64, _longitude: f64) -> HashMap<String, f64> {
        let mut rng = rand::thread_rng();
        HashMap::from([
            ("soil_moisture".to_string(), rng.gen_range(0.05..0.95)),
            ("sat_fire_index".to_string(), rng.gen_range(0.0..1.0)),
            ("drought_index".to_string(), rng.gen_range(0.0..1.0)),
        ])
    }
}

/// Merges the readings of several sources; later sources win on key clashes
pub struct CompositeSource {
    sources: Vec<Box<dyn FeatureSource>>,
}

impl CompositeSource {
    pub fn new(sources: Vec<Box<dyn FeatureSource>>) -> Self {
        Self { sources }
    }
}

impl Default for CompositeSource {
    /// Weather, seismic and satellite feeds, matching the full feature set
    fn default() -> Self {
        Self::new(vec![
            Box::new(OpenWeatherSource::new()),
            Box::new(UsgsQuakeSource::new()),
            Box::new(SatelliteIndexSource),
        ])
    }
}

impl FeatureSource for CompositeSource {
    fn fetch(&self, latitude: f64, longitude: f64) -> HashMap<String, f64> {
        let mut merged = HashMap::new();
        for source in &self.sources {
            merged.extend(source.fetch(latitude, longitude));
        }
        merged
    }
}
