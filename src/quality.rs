use std::cmp::Ordering;

use clap::ValueEnum;

use crate::source::ImageRecord;

/// Ranks two visually similar images. `Greater` means `candidate` ranks above
/// `indexed`.
pub trait QualityComparator: Sync {
    fn compare(&self, candidate: &ImageRecord, indexed: &ImageRecord) -> Ordering;
}

/// Total order over the decoded pixel buffers. Dimensions play no part.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawContent;

impl QualityComparator for RawContent {
    fn compare(&self, candidate: &ImageRecord, indexed: &ImageRecord) -> Ordering {
        candidate.pixels.as_bytes().cmp(indexed.pixels.as_bytes())
    }
}

/// Orders by pixel area; equal areas fall back to [`RawContent`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PixelArea;

impl QualityComparator for PixelArea {
    fn compare(&self, candidate: &ImageRecord, indexed: &ImageRecord) -> Ordering {
        let area = |r: &ImageRecord| u64::from(r.width) * u64::from(r.height);
        area(candidate)
            .cmp(&area(indexed))
            .then_with(|| RawContent.compare(candidate, indexed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Ranking {
    /// Raw pixel-content ordering
    #[default]
    Content,
    /// Pixel area, ties broken by content
    Area,
}

impl Ranking {
    pub fn comparator(self) -> Box<dyn QualityComparator> {
        match self {
            Ranking::Content => Box::new(RawContent),
            Ranking::Area => Box::new(PixelArea),
        }
    }
}
