//! Model artifact persistence
//!
//! The store keeps two co-located files: the opaque model blob and its
//! metadata record. Writes publish atomically (temp file + rename, blob
//! before metadata) so a reader never observes a half-written artifact;
//! anything unreadable on load degrades to "no model", never an error.

use crate::classifier::RiskModel;
use crate::models::ModelMetadata;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Model blob file name within the store directory
pub const MODEL_FILE: &str = "risk_model.bin";

/// Metadata file name within the store directory
pub const META_FILE: &str = "model_meta.json";

/// Durable storage for exactly one current model artifact
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True when a model blob has been published
    pub fn exists(&self) -> bool {
        self.dir.join(MODEL_FILE).is_file()
    }

    /// Persist a model and its metadata, replacing any previous artifact.
    ///
    /// Returns the stored metadata with the blob digest filled in. The
    /// metadata file is written only after the blob rename lands, so a
    /// concurrent reader sees either the old pair or the new pair.
    pub fn save(&self, model: &RiskModel, metadata: &ModelMetadata) -> Result<ModelMetadata> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating model directory {}", self.dir.display()))?;

        let bytes = bincode::serialize(model).context("encoding model blob")?;
        let digest = hex::encode(Sha256::digest(&bytes));
        write_atomic(&self.dir.join(MODEL_FILE), &bytes)?;

        let stored = ModelMetadata {
            model_sha256: digest,
            ..metadata.clone()
        };
        let meta_bytes = serde_json::to_vec_pretty(&stored).context("encoding model metadata")?;
        write_atomic(&self.dir.join(META_FILE), &meta_bytes)?;

        debug!(
            dir = %self.dir.display(),
            model_kind = %stored.model_kind,
            sha256 = %stored.model_sha256,
            "model artifact published"
        );
        Ok(stored)
    }

    /// Load the current model, or `None` when nothing has ever been trained
    /// or the artifact on disk fails validation.
    pub fn load(&self) -> Option<RiskModel> {
        let path = self.dir.join(MODEL_FILE);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read model blob");
                return None;
            }
        };

        if let Some(meta) = self.load_metadata() {
            if !meta.model_sha256.is_empty() {
                let digest = hex::encode(Sha256::digest(&bytes));
                if digest != meta.model_sha256 {
                    warn!(
                        path = %path.display(),
                        expected = %meta.model_sha256,
                        actual = %digest,
                        "model blob checksum mismatch, treating artifact as absent"
                    );
                    return None;
                }
            }
        }

        match bincode::deserialize(&bytes) {
            Ok(model) => Some(model),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to decode model blob");
                None
            }
        }
    }

    /// Load the metadata record, or `None` when absent or unreadable
    pub fn load_metadata(&self) -> Option<ModelMetadata> {
        let path = self.dir.join(META_FILE);
        let bytes = fs::read(&path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse model metadata");
                None
            }
        }
    }
}

/// Write to a sibling temp file, then rename into place
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("publishing {} over {}", tmp.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classifier, HeuristicClassifier};
    use crate::models::FeatureVector;
    use tempfile::TempDir;

    fn store() -> (TempDir, ModelStore) {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_load_before_any_save_is_none() {
        let (_dir, store) = store();
        assert!(store.load().is_none());
        assert!(store.load_metadata().is_none());
        assert!(!store.exists());
    }

    #[test]
    fn test_round_trip_preserves_behavior_and_metadata() {
        let (_dir, store) = store();
        let model = RiskModel::Heuristic(HeuristicClassifier);
        let meta = ModelMetadata::new("heuristic", None);
        let stored = store.save(&model, &meta).unwrap();
        assert!(!stored.model_sha256.is_empty());

        let loaded = store.load().expect("model should load");
        let probe = FeatureVector {
            rainfall: 120.0,
            soil_moisture: 0.9,
            ..FeatureVector::default()
        };
        assert_eq!(loaded.predict(&probe), model.predict(&probe));
        assert_eq!(
            loaded.predict_probability(&probe),
            model.predict_probability(&probe)
        );

        let loaded_meta = store.load_metadata().expect("metadata should load");
        assert_eq!(loaded_meta, stored);
    }

    #[test]
    fn test_corrupted_blob_degrades_to_none() {
        let (dir, store) = store();
        let model = RiskModel::Heuristic(HeuristicClassifier);
        store.save(&model, &ModelMetadata::new("heuristic", None)).unwrap();

        fs::write(dir.path().join(MODEL_FILE), b"not a model").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_replaces_previous_artifact() {
        let (_dir, store) = store();
        let model = RiskModel::Heuristic(HeuristicClassifier);
        let first = store.save(&model, &ModelMetadata::new("heuristic", None)).unwrap();
        let second = store
            .save(&model, &ModelMetadata::new("heuristic", Some(0.93)))
            .unwrap();
        assert_eq!(first.model_sha256, second.model_sha256);

        let meta = store.load_metadata().unwrap();
        assert_eq!(meta.accuracy, Some(0.93));
    }

    #[test]
    fn test_garbage_metadata_degrades_to_none() {
        let (dir, store) = store();
        fs::write(dir.path().join(META_FILE), b"{ not json").unwrap();
        assert!(store.load_metadata().is_none());
    }
}
