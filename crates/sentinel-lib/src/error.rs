//! Error taxonomy for dataset ingestion
//!
//! Every variant here is recoverable: the trainer treats any of them as
//! "no dataset available" and falls back to synthetic generation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    /// No training files were found under any search root
    #[error("no training data files found under {0}")]
    NoDataFound(String),

    /// Files were discovered but none could be parsed
    #[error("none of the {0} discovered training file(s) were readable")]
    UnreadableDataset(usize),

    /// The merged table has no resolvable label column
    #[error("no label column found: expected `label` or one of {0:?}")]
    Schema(&'static [&'static str]),
}
