//! CSV discovery and cleaning
//!
//! Merges every readable CSV found under the search roots into one table,
//! then runs the cleaning pipeline: numeric coercion, label resolution,
//! median imputation, class filtering and per-column outlier rejection.

use crate::error::DatasetError;
use crate::models::{DisasterClass, TrainingSet, FEATURE_NAMES, NUM_FEATURES};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Env var naming an explicit glob pattern of extra training files
pub const GLOB_OVERRIDE_ENV: &str = "TRAINING_DATA_GLOB";

/// Env var naming an explicit directory of extra training files
pub const DIR_OVERRIDE_ENV: &str = "TRAINING_DATA_DIR";

/// Accepted label column names when no column is literally named "label",
/// tried in order
pub const LABEL_ALIASES: [&str; 4] = ["target", "class", "disaster", "disaster_type"];

/// Subdirectories of the base dir searched for CSV files
const CANDIDATE_SUBDIRS: [&str; 6] = [
    "data/raw",
    "data",
    "dataset",
    "datasets",
    "models",
    "models/data",
];

/// "label" plus the aliases, in resolution preference order
const LABEL_COLUMNS: [&str; 5] = ["label", "target", "class", "disaster", "disaster_type"];

/// One merged row before cleaning: coerced feature cells plus the raw cell
/// of every label-ish column present in the source file
struct RawRow {
    features: [Option<f64>; NUM_FEATURES],
    labels: [Option<String>; LABEL_COLUMNS.len()],
}

/// Loads and cleans the merged training table under a base search root
pub struct DatasetLoader {
    base_dir: PathBuf,
    glob_override: Option<String>,
    dir_override: Option<PathBuf>,
}

impl DatasetLoader {
    /// Create a loader rooted at `base_dir`, picking up the env overrides
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            glob_override: std::env::var(GLOB_OVERRIDE_ENV).ok().filter(|s| !s.is_empty()),
            dir_override: std::env::var(DIR_OVERRIDE_ENV)
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Create a loader with explicit overrides, ignoring the environment
    pub fn with_overrides(
        base_dir: impl Into<PathBuf>,
        glob_override: Option<String>,
        dir_override: Option<PathBuf>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            glob_override,
            dir_override,
        }
    }

    /// Discover, merge and clean all training files.
    ///
    /// Row order is preserved modulo drops. Unreadable files are skipped;
    /// only a complete absence of files or of readable files is an error.
    pub fn load(&self) -> Result<TrainingSet, DatasetError> {
        let files = self.discover_files();
        if files.is_empty() {
            return Err(DatasetError::NoDataFound(self.base_dir.display().to_string()));
        }

        let mut rows: Vec<RawRow> = Vec::new();
        let mut label_present = [false; LABEL_COLUMNS.len()];
        let mut parsed_files = 0usize;
        for path in &files {
            match read_file(path) {
                Ok((file_rows, present)) => {
                    debug!(path = %path.display(), rows = file_rows.len(), "merged training file");
                    parsed_files += 1;
                    rows.extend(file_rows);
                    for (merged, seen) in label_present.iter_mut().zip(present) {
                        *merged |= seen;
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable training file");
                }
            }
        }
        if parsed_files == 0 {
            return Err(DatasetError::UnreadableDataset(files.len()));
        }

        let Some(label_slot) = (0..LABEL_COLUMNS.len()).find(|&j| label_present[j]) else {
            return Err(DatasetError::Schema(&LABEL_ALIASES));
        };

        Ok(clean(rows, label_slot))
    }

    /// All candidate CSV paths, deduplicated by resolved path
    fn discover_files(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        push_csvs_in_dir(&self.base_dir, &mut candidates);
        for sub in CANDIDATE_SUBDIRS {
            push_csvs_in_dir(&self.base_dir.join(sub), &mut candidates);
        }
        if let Some(pattern) = &self.glob_override {
            match glob::glob(pattern) {
                Ok(paths) => candidates.extend(paths.flatten()),
                Err(e) => warn!(pattern = %pattern, error = %e, "invalid training data glob"),
            }
        }
        if let Some(dir) = &self.dir_override {
            push_csvs_in_dir(dir, &mut candidates);
        }

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for path in candidates {
            let resolved = path.canonicalize().unwrap_or_else(|_| path.clone());
            if seen.insert(resolved) {
                files.push(path);
            }
        }
        files
    }
}

fn push_csvs_in_dir(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else { return };
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .collect();
    paths.sort();
    out.extend(paths);
}

/// Parse one file into raw rows plus the set of label-ish columns it carries
fn read_file(path: &Path) -> Result<(Vec<RawRow>, [bool; LABEL_COLUMNS.len()]), csv::Error> {
    let mut reader = csv::ReaderBuilder::new().from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut feature_idx = [None; NUM_FEATURES];
    for (i, name) in FEATURE_NAMES.iter().enumerate() {
        feature_idx[i] = headers.iter().position(|h| h == *name);
    }
    let mut label_idx = [None; LABEL_COLUMNS.len()];
    let mut label_present = [false; LABEL_COLUMNS.len()];
    for (j, name) in LABEL_COLUMNS.iter().enumerate() {
        label_idx[j] = headers.iter().position(|h| h == *name);
        label_present[j] = label_idx[j].is_some();
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut features = [None; NUM_FEATURES];
        for (cell, idx) in features.iter_mut().zip(feature_idx) {
            *cell = idx.and_then(|c| record.get(c)).and_then(parse_numeric);
        }
        let mut labels: [Option<String>; LABEL_COLUMNS.len()] = Default::default();
        for (cell, idx) in labels.iter_mut().zip(label_idx) {
            *cell = idx.and_then(|c| record.get(c)).map(|s| s.to_string());
        }
        rows.push(RawRow { features, labels });
    }
    Ok((rows, label_present))
}

/// Numeric coercion: unparseable or non-finite cells become missing
fn parse_numeric(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// The cleaning pipeline over the merged table
fn clean(rows: Vec<RawRow>, label_slot: usize) -> TrainingSet {
    // Normalize labels and drop rows without one
    let mut features: Vec<[Option<f64>; NUM_FEATURES]> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    for mut row in rows {
        let Some(raw) = row.labels[label_slot].take() else { continue };
        let label = raw.trim().to_lowercase();
        if label.is_empty() {
            continue;
        }
        features.push(row.features);
        labels.push(label);
    }

    // Per-feature median imputation; an all-missing column imputes to 0.0
    for c in 0..NUM_FEATURES {
        let mut present: Vec<f64> = features.iter().filter_map(|row| row[c]).collect();
        let med = median(&mut present);
        let fill = if med.is_finite() { med } else { 0.0 };
        for row in &mut features {
            if row[c].is_none() {
                row[c] = Some(fill);
            }
        }
    }

    // Keep only rows labeled with a known class; unknown labels are noise
    let mut set = TrainingSet::default();
    for (row, label) in features.into_iter().zip(labels) {
        if let Some(class) = DisasterClass::from_label(&label) {
            set.push(row.map(|v| v.unwrap_or(0.0)), class);
        }
    }

    // Sequential per-column 5-sigma rejection. Statistics are recomputed on
    // the table as it shrinks, matching the reference cleaning behavior.
    for c in 0..NUM_FEATURES {
        let n = set.len();
        if n == 0 {
            break;
        }
        let mean = set.features.iter().map(|row| row[c]).sum::<f64>() / n as f64;
        let variance =
            set.features.iter().map(|row| (row[c] - mean).powi(2)).sum::<f64>() / n as f64;
        let sigma = variance.sqrt();
        if !mean.is_finite() || !sigma.is_finite() || sigma <= 0.0 {
            continue;
        }
        let (lo, hi) = (mean - 5.0 * sigma, mean + 5.0 * sigma);
        let keep: Vec<bool> = set.features.iter().map(|row| row[c] >= lo && row[c] <= hi).collect();
        retain_rows(&mut set, &keep);
    }
    set
}

fn retain_rows(set: &mut TrainingSet, keep: &[bool]) {
    let mut idx = 0;
    set.features.retain(|_| {
        let k = keep[idx];
        idx += 1;
        k
    });
    idx = 0;
    set.labels.retain(|_| {
        let k = keep[idx];
        idx += 1;
        k
    });
}

/// Median with midpoint interpolation for even counts; NaN when empty
fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}
