use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use walkdir::WalkDir;

/// Extensions picked up by [`scan_directory`], matched case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff"];

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Recursively walk `dir`, returning image paths in discovery order.
///
/// Entries are visited sorted by file name so repeated runs see the same
/// order. Anything under `exclude` (the holding directory) is skipped, as are
/// entries that cannot be read.
pub fn scan_directory(dir: &Path, exclude: Option<&Path>, progress: bool) -> Vec<PathBuf> {
    let spinner = if progress {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Scanning for images…");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let exclude = exclude.and_then(|p| p.canonicalize().ok());
    let mut images = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| match &exclude {
            Some(ex) if e.file_type().is_dir() => e.path().canonicalize().ok().as_ref() != Some(ex),
            _ => true,
        });
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_file() && is_image(path) {
            debug!("found {}", path.display());
            images.push(path.to_path_buf());
        }
        spinner.tick();
    }
    spinner.finish_with_message(format!("Scan complete: {} image(s)", images.len()));
    images
}
