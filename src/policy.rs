//! Decides, for each new image, which file of a duplicate pair is relocated
//! and how the [`DuplicateIndex`] changes.
//!
//! The index is scanned in insertion order and the first entry whose
//! similarity reaches the threshold is the match; later entries are never
//! looked at even if they would score higher. The quality comparator then
//! picks the loser:
//!
//! | verdict for the new image | relocated          | index             |
//! |---------------------------|--------------------|-------------------|
//! | `Greater`                 | new file           | unchanged         |
//! | `Equal`                   | new file           | unchanged         |
//! | `Less`                    | indexed file       | see [`IndexUpdate`] |
//!
//! Independently of any match, the new fingerprint is inserted unless the
//! similarity computed by the last comparison of the scan was exactly 1.0
//! (or 0.0 when the index was empty). Near-duplicates therefore accumulate
//! as separate entries when the threshold is below 1.0. If that insert
//! meets a fingerprint already in the index (the scan stopped at an earlier
//! near-match) the resolution fails with
//! [`DedupError::DuplicateFingerprint`].
//!
//! Nothing here touches the filesystem except through the injected
//! [`PixelSource`]; relocation is left to the caller.

use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::debug;

use crate::error::{DedupError, Result};
use crate::fingerprint::similarity;
use crate::index::DuplicateIndex;
use crate::quality::QualityComparator;
use crate::source::{Candidate, PixelSource};

/// Minimum similarity for two fingerprints to count as duplicates.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold(f64);

impl Threshold {
    pub const EXACT: Threshold = Threshold(1.0);

    pub fn new(value: f64) -> Result<Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DedupError::InvalidThreshold(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_met_by(self, similarity: f64) -> bool {
        similarity >= self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::EXACT
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Threshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
        Threshold::new(value).map_err(|e| e.to_string())
    }
}

/// What happens to the matched index entry when the indexed file loses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexUpdate {
    /// Leave the entry pointing at the relocated file.
    #[default]
    Preserve,
    /// Point the entry at the surviving new file.
    FollowSurvivor,
}

/// The index entry a new image was matched against.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub similarity: f64,
    /// Verdict for the new image relative to the indexed one.
    pub verdict: Ordering,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// No entry reached the threshold.
    InsertOnly,
    /// The new file is the inferior copy.
    RelocateNew(Match),
    /// The indexed file is the inferior copy.
    RelocateExisting(Match),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub action: Action,
    /// Similarity from the last comparison made during the scan.
    pub last_similarity: f64,
    /// Whether the new fingerprint was added to the index.
    pub indexed: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Policy {
    pub threshold: Threshold,
    pub update: IndexUpdate,
}

impl Policy {
    pub fn new(threshold: Threshold, update: IndexUpdate) -> Self {
        Self { threshold, update }
    }

    /// Resolve `candidate` against `index`, mutating the index and returning
    /// the relocation the caller must carry out.
    ///
    /// Both images of a matching pair are decoded through `source` so the
    /// comparator sees pixels; a decode failure aborts with the error.
    pub fn resolve<S, C>(
        &self,
        index: &mut DuplicateIndex,
        candidate: &Candidate,
        source: &S,
        comparator: &C,
    ) -> Result<Resolution>
    where
        S: PixelSource + ?Sized,
        C: QualityComparator + ?Sized,
    {
        let mut last_similarity = 0.0;
        let mut hit = None;

        for (fingerprint, path) in index.candidates() {
            last_similarity = similarity(candidate.fingerprint, fingerprint);
            if self.threshold.is_met_by(last_similarity) {
                hit = Some((fingerprint, path.to_path_buf()));
                break;
            }
        }

        let action = match hit {
            None => Action::InsertOnly,
            Some((fingerprint, indexed_path)) => {
                let new_image = source.decode(&candidate.path)?;
                let indexed_image = source.decode(&indexed_path)?;
                let verdict = comparator.compare(&new_image, &indexed_image);
                debug!(
                    "{} vs {}: sim = {}, verdict = {:?}",
                    candidate.path.display(),
                    indexed_path.display(),
                    last_similarity,
                    verdict
                );

                let found = Match {
                    path: indexed_path,
                    width: indexed_image.width,
                    height: indexed_image.height,
                    similarity: last_similarity,
                    verdict,
                };
                match verdict {
                    Ordering::Greater | Ordering::Equal => Action::RelocateNew(found),
                    Ordering::Less => {
                        if self.update == IndexUpdate::FollowSurvivor {
                            index.replace(fingerprint, candidate.path.clone());
                        }
                        Action::RelocateExisting(found)
                    }
                }
            }
        };

        let indexed = last_similarity != 1.0;
        if indexed {
            index.insert(candidate.fingerprint, candidate.path.clone())?;
        }

        Ok(Resolution {
            action,
            last_similarity,
            indexed,
        })
    }
}
