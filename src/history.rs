use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{DedupError, Result};

/// File name of the journal inside the holding directory.
pub const HISTORY_FILE: &str = ".imgdedup-history.jsonl";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RelocationRecord {
    pub timestamp: String,
    pub kept: String,
    pub relocated: String,
    pub destination: String,
    pub similarity: f64,
    pub verdict: String, // "less", "equal" or "greater"
}

impl RelocationRecord {
    pub fn now(
        kept: &Path,
        relocated: &Path,
        destination: &Path,
        similarity: f64,
        verdict: std::cmp::Ordering,
    ) -> Self {
        let verdict = match verdict {
            std::cmp::Ordering::Less => "less",
            std::cmp::Ordering::Equal => "equal",
            std::cmp::Ordering::Greater => "greater",
        };
        Self {
            timestamp: Utc::now().to_rfc3339(),
            kept: kept.to_string_lossy().into_owned(),
            relocated: relocated.to_string_lossy().into_owned(),
            destination: destination.to_string_lossy().into_owned(),
            similarity,
            verdict: verdict.to_string(),
        }
    }
}

/// Append-only JSON-lines log of relocations.
pub struct Journal {
    path: PathBuf,
    out: File,
}

impl Journal {
    pub fn open(holding: &Path) -> Result<Self> {
        let path = holding.join(HISTORY_FILE);
        let out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| DedupError::Journal {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, out })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, record: &RelocationRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(self.out, "{line}").map_err(|source| DedupError::Journal {
            path: self.path.clone(),
            source,
        })
    }
}

/// Read every well-formed record from the journal in `holding`.
pub fn read_history(holding: &Path) -> Result<Vec<RelocationRecord>> {
    let path = holding.join(HISTORY_FILE);
    let journal_err = |source| DedupError::Journal {
        path: path.clone(),
        source,
    };
    let reader = BufReader::new(File::open(&path).map_err(journal_err)?);

    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(journal_err)?;
        match serde_json::from_str::<RelocationRecord>(&line) {
            Ok(rec) => records.push(rec),
            Err(err) => warn!("skipping malformed entry {i}: {err}"),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn appends_across_reopen() {
        let temp = TempDir::new().unwrap();
        let holding = temp.path();

        let mut journal = Journal::open(holding).unwrap();
        journal
            .append(&RelocationRecord::now(
                Path::new("src/a.png"),
                Path::new("src/b.png"),
                &holding.join("b.png"),
                1.0,
                Ordering::Equal,
            ))
            .unwrap();
        drop(journal);

        let mut journal = Journal::open(holding).unwrap();
        journal
            .append(&RelocationRecord::now(
                Path::new("src/d.png"),
                Path::new("src/c.png"),
                &holding.join("c.png"),
                0.96875,
                Ordering::Less,
            ))
            .unwrap();

        let records = read_history(holding).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].relocated, "src/b.png");
        assert_eq!(records[0].verdict, "equal");
        assert_eq!(records[1].kept, "src/d.png");
        assert_eq!(records[1].similarity, 0.96875);
        assert_eq!(records[1].verdict, "less");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let temp = TempDir::new().unwrap();
        let good = RelocationRecord::now(
            Path::new("k.png"),
            Path::new("r.png"),
            Path::new("h/r.png"),
            1.0,
            Ordering::Greater,
        );
        let content = format!("not json\n{}\n", serde_json::to_string(&good).unwrap());
        fs::write(temp.path().join(HISTORY_FILE), content).unwrap();

        assert_eq!(read_history(temp.path()).unwrap(), vec![good]);
    }
}
