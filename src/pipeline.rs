//! One dedup run: discover → fingerprint (parallel) → resolve and relocate
//! (sequential, in discovery order).

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{debug, info};
use rayon::prelude::*;

use crate::config::Config;
use crate::discovery::scan_directory;
use crate::error::{DedupError, Result};
use crate::fingerprint::Fingerprinter;
use crate::history::{Journal, RelocationRecord};
use crate::index::DuplicateIndex;
use crate::policy::{Action, Resolution};
use crate::quality::QualityComparator;
use crate::relocate::{DryRun, MoveToDir, Relocator};
use crate::source::{Candidate, ImageDecoder, ImageRecord, PixelSource};

/// Per-file result handed to the caller's observer.
#[derive(Debug)]
pub struct Processed<'a> {
    pub candidate: &'a Candidate,
    pub resolution: &'a Resolution,
    /// The file that was moved and where it went.
    pub relocated: Option<(PathBuf, PathBuf)>,
    /// `relocated` only reports where the file would have gone.
    pub dry_run: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub scanned: usize,
    pub indexed: usize,
    pub relocated: usize,
}

pub struct Deduper<S = ImageDecoder> {
    config: Config,
    source: S,
    comparator: Box<dyn QualityComparator>,
    fingerprinter: Fingerprinter,
}

impl Deduper<ImageDecoder> {
    pub fn new(config: Config) -> Self {
        Self::with_source(config, ImageDecoder)
    }
}

impl<S: PixelSource> Deduper<S> {
    pub fn with_source(config: Config, source: S) -> Self {
        let comparator = config.ranking.comparator();
        let fingerprinter = Fingerprinter::new(config.hash_kind);
        Self {
            config,
            source,
            comparator,
            fingerprinter,
        }
    }

    /// Run to completion, calling `on_file` after each file is resolved.
    /// The first decode or relocation error aborts the run; files already
    /// moved stay moved.
    pub fn run<F>(&self, mut on_file: F) -> Result<Summary>
    where
        F: FnMut(&Processed<'_>),
    {
        if !self.config.source.is_dir() {
            return Err(DedupError::InvalidSource {
                path: self.config.source.clone(),
            });
        }

        let relocator: Box<dyn Relocator> = if self.config.dry_run {
            Box::new(DryRun::new(&self.config.destination))
        } else {
            Box::new(MoveToDir::new(&self.config.destination)?)
        };
        let mut journal = if self.config.dry_run {
            None
        } else {
            Some(Journal::open(&self.config.destination)?)
        };

        let files = benchmark("discovery", || {
            scan_directory(
                &self.config.source,
                Some(&self.config.destination),
                self.config.progress,
            )
        });
        debug!("fingerprinting with {:?} hash", self.fingerprinter.kind());
        let candidates = benchmark("fingerprinting", || self.fingerprint_all(&files))?;

        // A dry run never removes files, so a file it pretended to move has to
        // fail to decode the way it would after a real move.
        let source = InPlace {
            inner: &self.source,
            relocator: relocator.as_ref(),
        };
        let mut index = DuplicateIndex::new();
        let mut summary = Summary {
            scanned: candidates.len(),
            ..Summary::default()
        };

        for candidate in &candidates {
            let resolution = self.config.policy.resolve(
                &mut index,
                candidate,
                &source,
                self.comparator.as_ref(),
            )?;

            let relocated = match &resolution.action {
                Action::InsertOnly => None,
                Action::RelocateNew(m) => {
                    let dest = relocator.relocate(&candidate.path)?;
                    if let Some(journal) = journal.as_mut() {
                        journal.append(&RelocationRecord::now(
                            &m.path,
                            &candidate.path,
                            &dest,
                            m.similarity,
                            m.verdict,
                        ))?;
                    }
                    Some((candidate.path.clone(), dest))
                }
                Action::RelocateExisting(m) => {
                    let dest = relocator.relocate(&m.path)?;
                    if let Some(journal) = journal.as_mut() {
                        journal.append(&RelocationRecord::now(
                            &candidate.path,
                            &m.path,
                            &dest,
                            m.similarity,
                            m.verdict,
                        ))?;
                    }
                    Some((m.path.clone(), dest))
                }
            };
            if relocated.is_some() {
                summary.relocated += 1;
            }

            on_file(&Processed {
                candidate,
                resolution: &resolution,
                relocated,
                dry_run: self.config.dry_run,
            });
        }

        summary.indexed = index.len();
        info!(
            "{} scanned, {} indexed, {} relocated into {}",
            summary.scanned,
            summary.indexed,
            summary.relocated,
            relocator.holding_dir().display()
        );
        if let Some(journal) = &journal {
            info!("relocations recorded in {}", journal.path().display());
        }
        Ok(summary)
    }

    /// Decode and fingerprint every file in parallel, keeping input order.
    ///
    /// Pixels are dropped as soon as the fingerprint is taken, so memory
    /// holds one decoded image per worker rather than the whole tree. A
    /// match decodes both files again to compare them.
    fn fingerprint_all(&self, files: &[PathBuf]) -> Result<Vec<Candidate>> {
        let bar = if self.config.progress {
            ProgressBar::new(files.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) =
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} fingerprinting {msg}")
        {
            bar.set_style(style);
        }

        let work = || {
            files
                .par_iter()
                .progress_with(bar.clone())
                .map(|path| {
                    let record = self.source.decode(path)?;
                    Candidate::from_record(&record, &self.fingerprinter)
                })
                .collect::<Result<Vec<_>>>()
        };

        let candidates = match self.config.jobs {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()?
                .install(work),
            None => work(),
        }?;
        bar.finish_and_clear();
        Ok(candidates)
    }
}

/// Decodes through `inner` unless `relocator` has already taken the file.
struct InPlace<'a, S: ?Sized> {
    inner: &'a S,
    relocator: &'a dyn Relocator,
}

impl<S: PixelSource + ?Sized> PixelSource for InPlace<'_, S> {
    fn decode(&self, path: &Path) -> Result<ImageRecord> {
        if self.relocator.vacated(path) {
            return Err(DedupError::Decode {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(io::ErrorKind::NotFound.into()),
            });
        }
        self.inner.decode(path)
    }
}

/// Run `f()`, log how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    info!("⏱ {} took {:.2?}", label, start.elapsed());
    result
}
