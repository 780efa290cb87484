//! # Raster-to-Text Encoding Library
//!
//! Turns a decoded raster image into one of two compact textual forms:
//!
//! - a **character matrix**, where each block of pixels becomes one glyph from
//!   a light-to-dark ramp, or
//! - a **vector description**, where connected blocks of ink are found by
//!   flood fill, grouped into reading-order lines and summarised by bounding
//!   box, density and a handful of key points.
//!
//! ## Core Features
//!
//! - **Trait-based stages**: swap binarizers, labelers and aggregators
//! - **Global and adaptive thresholding**: the adaptive mode uses a summed-area table
//! - **4- or 8-connected labeling**: iterative flood fill, safe on any image size
//! - **Cooperative cancellation**: long scans poll a token once per row
//! - **TOML / JSON configuration** and **GeoJSON export**
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use inkscan::{Pipeline, ScanConfig};
//!
//! let pipeline = Pipeline::from_config(&ScanConfig::default())?;
//! let image = image::open("page.png")?;
//!
//! let vectors = pipeline.encode_vectors(&image)?;
//! let matrix = pipeline.encode_char_matrix(&image)?;
//! std::fs::write("page.txt", vectors + &matrix)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use inkscan::{Pipeline, algorithms::*, Connectivity, VectorStyle};
//!
//! let pipeline = Pipeline::builder()
//!     .with_binarizer(AdaptiveThreshold { window_size: 21, c: 0.12 })
//!     .with_connectivity(Connectivity::Eight, 10)
//!     .with_line_gap(12)
//!     .with_vector_style(VectorStyle::DensityKeypoints)
//!     .build();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod traits;
pub mod cancel;
pub mod algorithms;
pub mod encoders;
pub mod config;
pub mod pipeline;
pub mod io;
pub mod scanner;

pub use error::{ScanError, Result};
pub use types::{BinaryBitmap, Connectivity, Line, RasterSource, Region, VisitedSet};
pub use traits::*;
pub use cancel::Cancellation;
pub use algorithms::*;
pub use encoders::*;
pub use config::{AdaptiveParams, Binarization, CharMatrixConfig, ScanConfig, Shading};
pub use pipeline::{OutputFormat, Pipeline, TracedLines, builder::PipelineBuilder};
pub use scanner::{ScanCommand, Scanner};

/// Global threshold, 4-connected flood fill, vertical-gap lines
pub type SimpleLineTracer = StandardLineTracer<
    GlobalThreshold,
    FloodFillLabeler,
    VerticalGapAggregator,
>;

/// Adaptive threshold, 8-connected flood fill, vertical-gap lines
pub type AdaptiveLineTracer = StandardLineTracer<
    AdaptiveThreshold,
    FloodFillLabeler,
    VerticalGapAggregator,
>;

impl Default for SimpleLineTracer {
    fn default() -> Self {
        Self::new(
            GlobalThreshold::default(),
            FloodFillLabeler::default(),
            VerticalGapAggregator::default(),
        )
    }
}

impl Default for AdaptiveLineTracer {
    fn default() -> Self {
        Self::new(
            AdaptiveThreshold::default(),
            FloodFillLabeler::new(Connectivity::Eight, 10),
            VerticalGapAggregator::default(),
        )
    }
}
