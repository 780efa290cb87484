pub mod builder;

use image::GrayImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use crate::{
    algorithms::{downsample, intensity_map, upscale, AdaptiveThreshold},
    cancel::Cancellation,
    config::ScanConfig,
    encoders::{CharMatrixEncoder, VectorEncoder, VectorStyle},
    error::Result,
    traits::{Binarizer, RegionAggregator, RegionLabeler},
    types::{BinaryBitmap, Line, RasterSource},
};

/// Which textual form a scan produces
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutputFormat {
    /// Glyph-per-block density rendering
    CharMatrix,
    /// Line and region summaries
    #[default]
    Vectors,
    /// Region bounding boxes as a GeoJSON feature collection
    GeoJson,
}

/// Regions grouped into lines, with the dimensions of the bitmap they came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TracedLines {
    pub lines: Vec<Line>,
    pub bitmap_width: u32,
    pub bitmap_height: u32,
}

impl TracedLines {
    pub fn region_count(&self) -> usize {
        self.lines.iter().map(Line::len).sum()
    }
}

/// Raster-to-text pipeline.
///
/// The vector path runs intensity, downsample, binarize, label, aggregate and
/// encode. The character path runs intensity, upscale, optional adaptive
/// shading and block quantisation. Nothing is retained between calls.
pub struct Pipeline {
    downsample: u32,
    binarizer: Box<dyn Binarizer>,
    labeler: Box<dyn RegionLabeler>,
    aggregator: Box<dyn RegionAggregator>,
    vector_encoder: VectorEncoder,
    upscale: f64,
    shading: Option<AdaptiveThreshold>,
    char_encoder: CharMatrixEncoder,
    cancel: Cancellation,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Build the pipeline described by a configuration file
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        builder::PipelineBuilder::from_config(config).map(builder::PipelineBuilder::build)
    }

    /// Replace the cancellation handle polled by the long-running stages
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancel
    }

    /// Downsampled intensity image the vector path thresholds
    pub fn intensity<S>(&self, image: &S) -> Result<GrayImage>
    where
        S: RasterSource + ?Sized,
    {
        let gray = intensity_map(image, &self.cancel)?;
        downsample(&gray, self.downsample, &self.cancel)
    }

    /// Ink bitmap for the vector path
    pub fn binarize<S>(&self, image: &S) -> Result<BinaryBitmap>
    where
        S: RasterSource + ?Sized,
    {
        let gray = self.intensity(image)?;
        self.binarizer.binarize(&gray, &self.cancel)
    }

    /// Label and group the ink regions of an image
    pub fn trace<S>(&self, image: &S) -> Result<TracedLines>
    where
        S: RasterSource + ?Sized,
    {
        self.trace_bitmap(&self.binarize(image)?)
    }

    /// Label and group the ink regions of an already binarized page
    pub fn trace_bitmap(&self, bitmap: &BinaryBitmap) -> Result<TracedLines> {
        let regions = self.labeler.label(bitmap, &self.cancel)?;
        let region_count = regions.len();
        let lines = self.aggregator.aggregate(regions);

        tracing::info!(
            width = bitmap.width(),
            height = bitmap.height(),
            regions = region_count,
            lines = lines.len(),
            "traced ink regions"
        );

        Ok(TracedLines {
            lines,
            bitmap_width: bitmap.width(),
            bitmap_height: bitmap.height(),
        })
    }

    pub fn trace_lines<S>(&self, image: &S) -> Result<Vec<Line>>
    where
        S: RasterSource + ?Sized,
    {
        Ok(self.trace(image)?.lines)
    }

    /// Vector text in the configured style
    pub fn encode_vectors<S>(&self, image: &S) -> Result<String>
    where
        S: RasterSource + ?Sized,
    {
        let lines = self.trace_lines(image)?;
        Ok(self.vector_encoder.encode(&lines))
    }

    /// Vector text in an explicit style, ignoring the configured one
    pub fn encode_vectors_styled<S>(&self, image: &S, style: VectorStyle) -> Result<String>
    where
        S: RasterSource + ?Sized,
    {
        let lines = self.trace_lines(image)?;
        Ok(VectorEncoder::new(style).encode(&lines))
    }

    /// Intensity image the character matrix samples
    pub fn shade<S>(&self, image: &S) -> Result<GrayImage>
    where
        S: RasterSource + ?Sized,
    {
        let gray = upscale(&intensity_map(image, &self.cancel)?, self.upscale);
        match &self.shading {
            Some(threshold) => threshold.render(&gray, &self.cancel),
            None => Ok(gray),
        }
    }

    pub fn encode_char_matrix<S>(&self, image: &S) -> Result<String>
    where
        S: RasterSource + ?Sized,
    {
        let shaded = self.shade(image)?;
        let text = self.char_encoder.encode(&shaded)?;
        tracing::info!(width = shaded.width(), height = shaded.height(), "rendered character matrix");
        Ok(text)
    }

    /// GeoJSON feature collection of the traced regions
    pub fn encode_geojson<S>(&self, image: &S) -> Result<String>
    where
        S: RasterSource + ?Sized,
    {
        self.trace(image)?.to_geojson_string()
    }

    pub fn encode<S>(&self, image: &S, format: OutputFormat) -> Result<String>
    where
        S: RasterSource + ?Sized,
    {
        match format {
            OutputFormat::CharMatrix => self.encode_char_matrix(image),
            OutputFormat::Vectors => self.encode_vectors(image),
            OutputFormat::GeoJson => self.encode_geojson(image),
        }
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: {} on {}x downsampled intensity, {} style vectors; char matrix {}x{} blocks at {}x upscale ({})",
            self.binarizer.name(),
            self.downsample.max(1),
            self.vector_encoder.style,
            self.char_encoder.sample_width,
            self.char_encoder.sample_height,
            self.upscale,
            if self.shading.is_some() { "adaptive shading" } else { "grayscale" },
        )
    }
}
