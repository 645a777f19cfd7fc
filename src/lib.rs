//! Find visually duplicate images in a folder tree and move the inferior
//! copy of each pair into a holding directory.

pub mod config;
pub mod discovery;
pub mod error;
pub mod fingerprint;
pub mod history;
pub mod index;
pub mod pipeline;
pub mod policy;
pub mod quality;
pub mod relocate;
pub mod source;

pub use config::{Cli, Config};
pub use error::{DedupError, Result};
pub use fingerprint::{Fingerprint, Fingerprinter, HashKind, similarity};
pub use index::DuplicateIndex;
pub use pipeline::{Deduper, Processed, Summary};
pub use policy::{Action, IndexUpdate, Match, Policy, Resolution, Threshold};
pub use quality::{PixelArea, Ranking, QualityComparator, RawContent};
pub use source::{Candidate, ImageDecoder, ImageRecord, PixelSource};
