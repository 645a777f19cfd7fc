use std::path::PathBuf;
use thiserror::Error;

use crate::fingerprint::{Fingerprint, HashKind};

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("Failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to move {from:?} → {to:?}: {source}")]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fingerprint {fingerprint} is already indexed; cannot add {path:?}")]
    DuplicateFingerprint {
        fingerprint: Fingerprint,
        path: PathBuf,
    },

    #[error("Destination already holds {path:?}")]
    Collision { path: PathBuf },

    #[error("Invalid source directory: {path:?}")]
    InvalidSource { path: PathBuf },

    #[error("Threshold must be within 0.0..=1.0, got {0}")]
    InvalidThreshold(f64),

    #[error("{kind:?} hash produced {bits} bits, expected 64")]
    HashWidth { kind: HashKind, bits: usize },

    #[error("History journal {path:?}: {source}")]
    Journal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T, E = DedupError> = std::result::Result<T, E>;
