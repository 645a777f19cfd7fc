use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::info;

use crate::error::{DedupError, Result};

/// Moves an inferior copy out of the source tree.
pub trait Relocator: Sync {
    /// Relocate `file`, returning where it ended up (or would end up).
    fn relocate(&self, file: &Path) -> Result<PathBuf>;

    fn holding_dir(&self) -> &Path;

    /// Whether `file` has been relocated without the filesystem showing it.
    fn vacated(&self, _file: &Path) -> bool {
        false
    }
}

fn destination_for(holding: &Path, file: &Path) -> Result<PathBuf> {
    let name = file.file_name().ok_or_else(|| DedupError::Relocate {
        from: file.to_path_buf(),
        to: holding.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
    })?;
    Ok(holding.join(name))
}

/// Renames files into a holding directory. An existing file of the same
/// name in the holding directory is never overwritten.
#[derive(Debug, Clone)]
pub struct MoveToDir {
    holding: PathBuf,
}

impl MoveToDir {
    /// Creates `holding` if it does not exist yet.
    pub fn new(holding: impl Into<PathBuf>) -> Result<Self> {
        let holding = holding.into();
        fs::create_dir_all(&holding).map_err(|source| DedupError::Relocate {
            from: holding.clone(),
            to: holding.clone(),
            source,
        })?;
        Ok(Self { holding })
    }
}

impl Relocator for MoveToDir {
    fn relocate(&self, file: &Path) -> Result<PathBuf> {
        let dest = destination_for(&self.holding, file)?;
        if dest.exists() {
            return Err(DedupError::Collision { path: dest });
        }
        fs::rename(file, &dest).map_err(|source| DedupError::Relocate {
            from: file.to_path_buf(),
            to: dest.clone(),
            source,
        })?;
        info!("moved {} → {}", file.display(), dest.display());
        Ok(dest)
    }

    fn holding_dir(&self) -> &Path {
        &self.holding
    }
}

/// Reports the destination without touching the filesystem.
///
/// Moves are recorded so later calls fail the way a real [`MoveToDir`] run
/// would: a file cannot leave twice and a destination name cannot be reused.
#[derive(Debug, Default)]
pub struct DryRun {
    holding: PathBuf,
    moves: Mutex<Moves>,
}

#[derive(Debug, Default)]
struct Moves {
    vacated: HashSet<PathBuf>,
    placed: HashSet<PathBuf>,
}

impl DryRun {
    pub fn new(holding: impl Into<PathBuf>) -> Self {
        Self {
            holding: holding.into(),
            moves: Mutex::default(),
        }
    }

    fn moves(&self) -> std::sync::MutexGuard<'_, Moves> {
        self.moves.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Relocator for DryRun {
    fn relocate(&self, file: &Path) -> Result<PathBuf> {
        let dest = destination_for(&self.holding, file)?;
        let mut moves = self.moves();
        if moves.vacated.contains(file) {
            return Err(DedupError::Relocate {
                from: file.to_path_buf(),
                to: dest,
                source: io::ErrorKind::NotFound.into(),
            });
        }
        if moves.placed.contains(&dest) || dest.exists() {
            return Err(DedupError::Collision { path: dest });
        }
        moves.vacated.insert(file.to_path_buf());
        moves.placed.insert(dest.clone());
        info!("[dry-run] would move {} → {}", file.display(), dest.display());
        Ok(dest)
    }

    fn holding_dir(&self) -> &Path {
        &self.holding
    }

    fn vacated(&self, file: &Path) -> bool {
        self.moves().vacated.contains(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn moves_into_created_holding_dir() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.jpg");
        fs::write(&file, b"pixels").unwrap();
        let holding = temp.path().join("held").join("nested");

        let mover = MoveToDir::new(&holding).unwrap();
        let dest = mover.relocate(&file).unwrap();

        assert_eq!(dest, holding.join("a.jpg"));
        assert!(!file.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"pixels");
    }

    #[test]
    fn refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let holding = temp.path().join("held");
        let mover = MoveToDir::new(&holding).unwrap();
        fs::write(holding.join("a.jpg"), b"first").unwrap();
        let file = temp.path().join("a.jpg");
        fs::write(&file, b"second").unwrap();

        let err = mover.relocate(&file).unwrap_err();
        assert!(matches!(err, DedupError::Collision { .. }));
        assert!(file.exists());
        assert_eq!(fs::read(holding.join("a.jpg")).unwrap(), b"first");
    }

    #[test]
    fn missing_source_is_a_relocate_error() {
        let temp = TempDir::new().unwrap();
        let mover = MoveToDir::new(temp.path().join("held")).unwrap();
        let err = mover.relocate(&temp.path().join("gone.png")).unwrap_err();
        assert!(matches!(err, DedupError::Relocate { .. }));
    }

    #[test]
    fn dry_run_leaves_files_alone() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("b.png");
        fs::write(&file, b"x").unwrap();
        let holding = temp.path().join("held");

        let dest = DryRun::new(&holding).relocate(&file).unwrap();
        assert_eq!(dest, holding.join("b.png"));
        assert!(file.exists());
        assert!(!holding.exists());
    }

    #[test]
    fn dry_run_remembers_what_it_moved() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.png");
        fs::write(&file, b"x").unwrap();
        let dry = DryRun::new(temp.path().join("held"));

        assert!(!dry.vacated(&file));
        dry.relocate(&file).unwrap();
        assert!(dry.vacated(&file));
        assert!(file.exists());

        let err = dry.relocate(&file).unwrap_err();
        assert!(matches!(err, DedupError::Relocate { .. }));
    }

    #[test]
    fn dry_run_detects_reused_destination_name() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("one").join("img.png");
        let second = temp.path().join("two").join("img.png");
        let holding = temp.path().join("held");
        let dry = DryRun::new(&holding);

        dry.relocate(&first).unwrap();
        let err = dry.relocate(&second).unwrap_err();
        assert!(matches!(err, DedupError::Collision { path } if path == holding.join("img.png")));
    }

    #[test]
    fn dry_run_detects_existing_destination() {
        let temp = TempDir::new().unwrap();
        let holding = temp.path().join("held");
        fs::create_dir_all(&holding).unwrap();
        fs::write(holding.join("a.png"), b"old").unwrap();

        let err = DryRun::new(&holding)
            .relocate(&temp.path().join("a.png"))
            .unwrap_err();
        assert!(matches!(err, DedupError::Collision { .. }));
    }
}
