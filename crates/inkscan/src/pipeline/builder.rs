use crate::{
    algorithms::{AdaptiveThreshold, FloodFillLabeler, GlobalThreshold, VerticalGapAggregator},
    cancel::Cancellation,
    config::{Binarization, ScanConfig, Shading},
    encoders::{CharMatrixEncoder, VectorEncoder, VectorStyle},
    error::Result,
    pipeline::Pipeline,
    traits::{Binarizer, RegionAggregator, RegionLabeler},
    types::Connectivity,
};

/// Builder for creating processing pipelines with a fluent API
pub struct PipelineBuilder {
    downsample: u32,
    binarizer: Option<Box<dyn Binarizer>>,
    labeler: Option<Box<dyn RegionLabeler>>,
    aggregator: Option<Box<dyn RegionAggregator>>,
    vector_style: VectorStyle,
    upscale: f64,
    shading: Option<AdaptiveThreshold>,
    char_encoder: CharMatrixEncoder,
    cancel: Cancellation,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            downsample: 1,
            binarizer: None,
            labeler: None,
            aggregator: None,
            vector_style: VectorStyle::default(),
            upscale: 1.0,
            shading: None,
            char_encoder: CharMatrixEncoder::default(),
            cancel: Cancellation::new(),
        }
    }

    /// Builder preloaded from a validated configuration
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        config.validate()?;

        let builder = Self::new()
            .with_downsample(config.downsample)
            .with_labeler(FloodFillLabeler::new(config.connectivity, config.min_points))
            .with_aggregator(VerticalGapAggregator::new(config.line_gap))
            .with_vector_style(config.vector_style)
            .with_upscale(config.char_matrix.upscale)
            .with_char_encoder(CharMatrixEncoder {
                sample_width: config.char_matrix.sample_width,
                sample_height: config.char_matrix.sample_height,
                ramp: config.char_matrix.ramp.chars().collect(),
            });

        let builder = match config.binarization {
            Binarization::Global { threshold } => builder.with_binarizer(GlobalThreshold { threshold }),
            Binarization::Adaptive(params) => builder.with_binarizer(AdaptiveThreshold {
                window_size: params.window_size,
                c: params.c,
            }),
        };

        Ok(match config.char_matrix.shading {
            Shading::Grayscale => builder,
            Shading::Adaptive(params) => builder.with_adaptive_shading(AdaptiveThreshold {
                window_size: params.window_size,
                c: params.c,
            }),
        })
    }

    /// Average `factor x factor` blocks before thresholding
    pub fn with_downsample(mut self, factor: u32) -> Self {
        self.downsample = factor.max(1);
        self
    }

    /// Set the binarizer (replaces any existing one)
    pub fn with_binarizer<B>(mut self, binarizer: B) -> Self
    where
        B: Binarizer + 'static,
    {
        self.binarizer = Some(Box::new(binarizer));
        self
    }

    /// Set the region labeler (replaces any existing one)
    pub fn with_labeler<L>(mut self, labeler: L) -> Self
    where
        L: RegionLabeler + 'static,
    {
        self.labeler = Some(Box::new(labeler));
        self
    }

    /// Set the line aggregator (replaces any existing one)
    pub fn with_aggregator<A>(mut self, aggregator: A) -> Self
    where
        A: RegionAggregator + 'static,
    {
        self.aggregator = Some(Box::new(aggregator));
        self
    }

    /// Shorthand for a flood-fill labeler with the given settings
    pub fn with_connectivity(self, connectivity: Connectivity, min_points: usize) -> Self {
        self.with_labeler(FloodFillLabeler::new(connectivity, min_points))
    }

    /// Shorthand for a vertical-gap aggregator
    pub fn with_line_gap(self, line_gap: u32) -> Self {
        self.with_aggregator(VerticalGapAggregator::new(line_gap))
    }

    pub fn with_vector_style(mut self, style: VectorStyle) -> Self {
        self.vector_style = style;
        self
    }

    /// Bilinear upscale ahead of character-matrix rendering
    pub fn with_upscale(mut self, scale: f64) -> Self {
        self.upscale = scale;
        self
    }

    /// Threshold the character-matrix input instead of sampling raw intensities
    pub fn with_adaptive_shading(mut self, threshold: AdaptiveThreshold) -> Self {
        self.shading = Some(threshold);
        self
    }

    pub fn with_char_encoder(mut self, encoder: CharMatrixEncoder) -> Self {
        self.char_encoder = encoder;
        self
    }

    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let binarizer = self.binarizer
            .unwrap_or_else(|| Box::new(GlobalThreshold::default()));

        let labeler = self.labeler
            .unwrap_or_else(|| Box::new(FloodFillLabeler::default()));

        let aggregator = self.aggregator
            .unwrap_or_else(|| Box::new(VerticalGapAggregator::default()));

        Pipeline {
            downsample: self.downsample,
            binarizer,
            labeler,
            aggregator,
            vector_encoder: VectorEncoder::new(self.vector_style),
            upscale: self.upscale,
            shading: self.shading,
            char_encoder: self.char_encoder,
            cancel: self.cancel,
        }
    }

    /// Global threshold on a downsampled page with 4-connected components
    pub fn build_downsampled(threshold: u8, factor: u32) -> Pipeline {
        Self::new()
            .with_downsample(factor)
            .with_binarizer(GlobalThreshold { threshold })
            .with_connectivity(Connectivity::Four, 6)
            .build()
    }

    /// Adaptive threshold at full resolution with 8-connected components
    pub fn build_adaptive(window_size: u32, c: f64, min_points: usize) -> Pipeline {
        Self::new()
            .with_binarizer(AdaptiveThreshold { window_size, c })
            .with_connectivity(Connectivity::Eight, min_points)
            .build()
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = ScanConfig { downsample: 0, ..ScanConfig::default() };
        assert!(PipelineBuilder::from_config(&config).is_err());
    }

    #[test]
    fn test_default_config_info() {
        let pipeline = Pipeline::from_config(&ScanConfig::default()).unwrap();
        let info = pipeline.info();
        assert!(info.contains("global threshold"));
        assert!(info.contains("2x downsampled"));
        assert!(info.contains("adaptive shading"));
    }

    #[test]
    fn test_bare_builder_samples_raw_intensity() {
        let pipeline = Pipeline::builder().build();
        let image = GrayImage::from_pixel(6, 6, Luma([0u8]));
        assert_eq!(pipeline.encode_char_matrix(&image).unwrap(), "██\n");
    }

    #[test]
    fn test_presets() {
        let downsampled = PipelineBuilder::build_downsampled(120, 3);
        assert!(downsampled.info().contains("global threshold on 3x downsampled"));

        let adaptive = PipelineBuilder::build_adaptive(21, 0.2, 4);
        assert!(adaptive.info().contains("adaptive threshold on 1x downsampled"));
    }
}
