pub mod preprocessing;
pub mod labeling;
pub mod aggregation;
pub mod keypoints;

pub use preprocessing::*;
pub use labeling::*;
pub use aggregation::*;
pub use keypoints::*;

use image::GrayImage;
use crate::{
    cancel::Cancellation,
    error::Result,
    types::Line,
    traits::{Binarizer, RegionLabeler, RegionAggregator, LineTracer},
};

/// Statically composed binarize, label and aggregate stages
#[derive(Debug)]
pub struct StandardLineTracer<B, L, A>
where
    B: Binarizer,
    L: RegionLabeler,
    A: RegionAggregator,
{
    pub binarizer: B,
    pub labeler: L,
    pub aggregator: A,
}

impl<B, L, A> StandardLineTracer<B, L, A>
where
    B: Binarizer,
    L: RegionLabeler,
    A: RegionAggregator,
{
    pub fn new(binarizer: B, labeler: L, aggregator: A) -> Self {
        Self {
            binarizer,
            labeler,
            aggregator,
        }
    }
}

impl<B, L, A> LineTracer for StandardLineTracer<B, L, A>
where
    B: Binarizer,
    L: RegionLabeler,
    A: RegionAggregator,
{
    fn trace_lines(&self, image: &GrayImage, cancel: &Cancellation) -> Result<Vec<Line>> {
        let bitmap = self.binarizer.binarize(image, cancel)?;
        let regions = self.labeler.label(&bitmap, cancel)?;
        Ok(self.aggregator.aggregate(regions))
    }
}
