//! 64-bit perceptual fingerprints and the similarity score between them.
//!
//! The default fingerprint is a difference hash: the image is resampled to a
//! 9×8 grayscale grid and every sample is compared to its right-hand
//! neighbour, yielding 8 bits per row. Because only the relative ordering of
//! neighbouring intensities is kept, re-encodes and mild resizes leave the
//! fingerprint unchanged or nearly so.

use std::fmt;

use clap::ValueEnum;
use image::DynamicImage;
use image::imageops::FilterType;
use image_hasher::{HashAlg, Hasher, HasherConfig};

use crate::error::{DedupError, Result};

/// Number of bits in a fingerprint.
pub const FINGERPRINT_BITS: u32 = 64;

const GRID_WIDTH: u32 = 9;
const GRID_HEIGHT: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Hamming distance to `other`.
    pub fn distance(self, other: Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// `1 - hamming(a, b) / 64`, in `[0, 1]`.
pub fn similarity(a: Fingerprint, b: Fingerprint) -> f64 {
    1.0 - f64::from(a.distance(b)) / f64::from(FINGERPRINT_BITS)
}

/// Difference hash of `image`, packed row-major with the first comparison in
/// the most significant bit. A bit is set when the right neighbour is brighter.
pub fn difference_hash(image: &DynamicImage) -> Fingerprint {
    let grid = image
        .resize_exact(GRID_WIDTH, GRID_HEIGHT, FilterType::Triangle)
        .to_luma8();

    let mut bits = 0u64;
    for y in 0..GRID_HEIGHT {
        for x in 0..GRID_WIDTH - 1 {
            let left = grid.get_pixel(x, y)[0];
            let right = grid.get_pixel(x + 1, y)[0];
            bits = (bits << 1) | u64::from(right > left);
        }
    }
    Fingerprint(bits)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum HashKind {
    /// Horizontal gradient (dHash) over a 9×8 grid
    #[default]
    Difference,
    /// Pixels above the mean intensity (aHash)
    Mean,
    /// Pixels above the median intensity
    Median,
    /// Blockhash.io block sums
    Block,
}

/// Produces fingerprints of the configured [`HashKind`].
pub struct Fingerprinter {
    kind: HashKind,
    hasher: Option<Hasher>,
}

impl Fingerprinter {
    pub fn new(kind: HashKind) -> Self {
        let alg = match kind {
            HashKind::Difference => None,
            HashKind::Mean => Some(HashAlg::Mean),
            HashKind::Median => Some(HashAlg::Median),
            HashKind::Block => Some(HashAlg::Blockhash),
        };
        let hasher = alg.map(|alg| HasherConfig::new().hash_size(8, 8).hash_alg(alg).to_hasher());
        Self { kind, hasher }
    }

    pub fn kind(&self) -> HashKind {
        self.kind
    }

    pub fn fingerprint(&self, image: &DynamicImage) -> Result<Fingerprint> {
        let Some(hasher) = &self.hasher else {
            return Ok(difference_hash(image));
        };

        let hash = hasher.hash_image(image);
        let bytes: [u8; 8] = hash
            .as_bytes()
            .try_into()
            .map_err(|_| DedupError::HashWidth {
                kind: self.kind,
                bits: hash.as_bytes().len() * 8,
            })?;
        Ok(Fingerprint(u64::from_be_bytes(bytes)))
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(HashKind::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use rstest::rstest;

    fn horizontal_ramp(rising: bool) -> DynamicImage {
        let img = GrayImage::from_fn(90, 80, |x, _| {
            let v = (x * 2) as u8;
            Luma([if rising { v } else { 255 - v }])
        });
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn rising_ramp_sets_every_bit() {
        assert_eq!(difference_hash(&horizontal_ramp(true)), Fingerprint(u64::MAX));
    }

    #[test]
    fn falling_ramp_clears_every_bit() {
        assert_eq!(difference_hash(&horizontal_ramp(false)), Fingerprint(0));
    }

    #[test]
    fn flat_image_has_no_gradient() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([128])));
        assert_eq!(difference_hash(&img), Fingerprint(0));
    }

    #[test]
    fn identical_pixels_give_identical_fingerprints() {
        let make = || {
            DynamicImage::ImageRgb8(RgbImage::from_fn(64, 48, |x, y| {
                Rgb([(x * 3) as u8, (y * 5) as u8, ((x ^ y) * 7) as u8])
            }))
        };
        for kind in HashKind::value_variants() {
            let fingerprinter = Fingerprinter::new(*kind);
            assert_eq!(
                fingerprinter.fingerprint(&make()).unwrap(),
                fingerprinter.fingerprint(&make()).unwrap(),
                "{kind:?}"
            );
        }
    }

    #[test]
    fn default_fingerprinter_is_difference_hash() {
        let img = horizontal_ramp(true);
        let fingerprinter = Fingerprinter::default();
        assert_eq!(fingerprinter.kind(), HashKind::Difference);
        assert_eq!(fingerprinter.fingerprint(&img).unwrap(), difference_hash(&img));
    }

    #[test]
    fn similarity_is_reflexive() {
        for v in [0, 1, 0xdead_beef, u64::MAX] {
            assert_eq!(similarity(Fingerprint(v), Fingerprint(v)), 1.0);
        }
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = Fingerprint(0x0123_4567_89ab_cdef);
        let b = Fingerprint(0xfedc_ba98_7654_3210);
        assert_eq!(similarity(a, b), similarity(b, a));
    }

    #[rstest]
    #[case(0, 1.0)]
    #[case(1, 63.0 / 64.0)]
    #[case(4, 0.9375)]
    #[case(32, 0.5)]
    #[case(64, 0.0)]
    fn similarity_counts_differing_bits(#[case] k: u32, #[case] expected: f64) {
        let a = Fingerprint(0xa5a5_a5a5_a5a5_a5a5);
        let mask = if k == 64 { u64::MAX } else { (1u64 << k) - 1 };
        let b = Fingerprint(a.0 ^ mask);
        assert_eq!(a.distance(b), k);
        assert_eq!(similarity(a, b), expected);
    }

    #[test]
    fn display_is_zero_padded_hex() {
        assert_eq!(Fingerprint(0xff).to_string(), "00000000000000ff");
    }
}
