use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use crate::{
    config::ScanConfig,
    encoders::{VectorEncoder, VectorStyle},
    error::{Result, ScanError},
    pipeline::Pipeline,
    types::BinaryBitmap,
};

#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScanCommand {
    /// Render the image as a glyph density matrix
    CharMatrix,

    /// Describe ink regions line by line
    Vectors {
        #[serde(default)]
        style: VectorStyle,
    },

    /// Export ink region boxes as GeoJSON
    GeoJson,
}

impl ScanCommand {
    /// Get the JSON schema for all commands
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ScanCommand)
    }

    /// Get a list of all available command names
    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::CharMatrix => "Render block-average intensity as rows of ramp glyphs",
            Self::Vectors { .. } => "Describe connected ink regions grouped into reading-order lines",
            Self::GeoJson => "Export connected ink region bounding boxes as a GeoJSON feature collection",
        }
    }
}

/// Holds one loaded image and answers scan commands against it
#[derive(Clone)]
pub struct Scanner {
    image: Option<DynamicImage>,
    pipeline: Arc<Pipeline>,
}

impl Scanner {
    /// Scanner using the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&ScanConfig::default())
    }

    pub fn with_config(config: &ScanConfig) -> Result<Self> {
        Ok(Self::with_pipeline(Pipeline::from_config(config)?))
    }

    /// Create a new Scanner with a custom pipeline
    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        Self {
            image: None,
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Decode an image file
    pub fn load_image<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let img = image::open(path)?;
        tracing::debug!(path = %path.display(), width = img.width(), height = img.height(), "loaded image");
        self.image = Some(img);
        Ok(())
    }

    /// Decode an image held in memory
    pub fn load_image_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.image = Some(image::load_from_memory(bytes)?);
        Ok(())
    }

    pub fn set_image(&mut self, image: DynamicImage) {
        self.image = Some(image);
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    pub fn execute(&self, command: ScanCommand) -> Result<String> {
        let image = self.image.as_ref().ok_or(ScanError::NoImageLoaded)?;

        match command {
            ScanCommand::CharMatrix => self.pipeline.encode_char_matrix(image),
            ScanCommand::Vectors { style } => self.pipeline.encode_vectors_styled(image, style),
            ScanCommand::GeoJson => self.pipeline.encode_geojson(image),
        }
    }

    /// Like [`Scanner::execute`], but hands the binarized page to `inspect`
    /// first. The vector commands reuse that bitmap instead of binarizing again.
    pub fn execute_with_bitmap<F>(&self, command: ScanCommand, inspect: F) -> Result<String>
    where
        F: FnOnce(&BinaryBitmap) -> Result<()>,
    {
        let image = self.image.as_ref().ok_or(ScanError::NoImageLoaded)?;
        let bitmap = self.pipeline.binarize(image)?;
        inspect(&bitmap)?;

        match command {
            ScanCommand::CharMatrix => self.pipeline.encode_char_matrix(image),
            ScanCommand::Vectors { style } => {
                let traced = self.pipeline.trace_bitmap(&bitmap)?;
                Ok(VectorEncoder::new(style).encode(&traced.lines))
            }
            ScanCommand::GeoJson => self.pipeline.trace_bitmap(&bitmap)?.to_geojson_string(),
        }
    }
}
