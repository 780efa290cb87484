use image::GrayImage;
use crate::{
    cancel::Cancellation,
    error::Result,
    types::{BinaryBitmap, Line, Region},
};

/// Trait for binarization algorithms
pub trait Binarizer: Send + Sync {
    /// Split an intensity image into ink and background
    fn binarize(&self, image: &GrayImage, cancel: &Cancellation) -> Result<BinaryBitmap>;

    /// Short human-readable name for logs and pipeline info
    fn name(&self) -> &'static str;
}

/// Trait for connected-component labeling algorithms
pub trait RegionLabeler: Send + Sync {
    /// Find the connected ink regions of a bitmap
    fn label(&self, bitmap: &BinaryBitmap, cancel: &Cancellation) -> Result<Vec<Region>>;
}

/// Trait for grouping regions into reading-order lines
pub trait RegionAggregator: Send + Sync {
    fn aggregate(&self, regions: Vec<Region>) -> Vec<Line>;
}

/// Main trait for turning an intensity image into reading-order lines
pub trait LineTracer: Send + Sync {
    fn trace_lines(&self, image: &GrayImage, cancel: &Cancellation) -> Result<Vec<Line>>;
}
