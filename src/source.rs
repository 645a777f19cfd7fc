use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, ImageReader};

use crate::error::{DedupError, Result};
use crate::fingerprint::{Fingerprint, Fingerprinter};

/// A decoded image. `width` and `height` are kept for display only.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub pixels: DynamicImage,
    pub width: u32,
    pub height: u32,
}

impl ImageRecord {
    pub fn new(path: impl Into<PathBuf>, pixels: DynamicImage) -> Self {
        let (width, height) = pixels.dimensions();
        Self {
            path: path.into(),
            pixels,
            width,
            height,
        }
    }
}

/// What survives of an [`ImageRecord`] once it has been fingerprinted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub fingerprint: Fingerprint,
    pub width: u32,
    pub height: u32,
}

impl Candidate {
    pub fn from_record(record: &ImageRecord, fingerprinter: &Fingerprinter) -> Result<Self> {
        Ok(Self {
            path: record.path.clone(),
            fingerprint: fingerprinter.fingerprint(&record.pixels)?,
            width: record.width,
            height: record.height,
        })
    }
}

/// Turns a file into pixels.
pub trait PixelSource: Sync {
    fn decode(&self, path: &Path) -> Result<ImageRecord>;
}

impl<S: PixelSource + ?Sized> PixelSource for &S {
    fn decode(&self, path: &Path) -> Result<ImageRecord> {
        (**self).decode(path)
    }
}

/// [`PixelSource`] backed by the `image` crate's format detection.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

impl PixelSource for ImageDecoder {
    fn decode(&self, path: &Path) -> Result<ImageRecord> {
        let decode_err = |source| DedupError::Decode {
            path: path.to_path_buf(),
            source,
        };
        let pixels = ImageReader::open(path)
            .map_err(|e| decode_err(image::ImageError::IoError(e)))?
            .with_guessed_format()
            .map_err(|e| decode_err(image::ImageError::IoError(e)))?
            .decode()
            .map_err(decode_err)?;
        Ok(ImageRecord::new(path, pixels))
    }
}
