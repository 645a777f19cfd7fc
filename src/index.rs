use std::path::{Path, PathBuf};

use crate::error::{DedupError, Result};
use crate::fingerprint::Fingerprint;

/// Insertion-ordered map from fingerprint to the file currently representing it.
///
/// Lookups are a linear scan. Matching is "first entry over the threshold",
/// so the order entries were inserted in is part of the contract.
#[derive(Debug, Default, Clone)]
pub struct DuplicateIndex {
    entries: Vec<(Fingerprint, PathBuf)>,
}

impl DuplicateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn candidates(&self) -> impl Iterator<Item = (Fingerprint, &Path)> {
        self.entries.iter().map(|(fp, path)| (*fp, path.as_path()))
    }

    /// Append a new entry. A key maps to one path only; inserting a key that
    /// is already present fails and leaves the index untouched.
    pub fn insert(&mut self, fingerprint: Fingerprint, path: PathBuf) -> Result<()> {
        if self.position(fingerprint).is_some() {
            return Err(DedupError::DuplicateFingerprint { fingerprint, path });
        }
        self.entries.push((fingerprint, path));
        Ok(())
    }

    /// Point an existing entry at `path`, keeping its position. Returns the
    /// previous path, or `None` if the key is absent.
    pub fn replace(&mut self, fingerprint: Fingerprint, path: PathBuf) -> Option<PathBuf> {
        let i = self.position(fingerprint)?;
        Some(std::mem::replace(&mut self.entries[i].1, path))
    }

    fn position(&self, fingerprint: Fingerprint) -> Option<usize> {
        self.entries.iter().position(|(fp, _)| *fp == fingerprint)
    }
}
