use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::{
    encoders::{VectorStyle, DEFAULT_RAMP},
    error::{Result, ScanError},
    types::Connectivity,
};

/// Parameters of the local-mean threshold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AdaptiveParams {
    /// Side of the square averaging window, in pixels
    #[schemars(range(min = 1))]
    pub window_size: u32,
    /// Fraction below the local mean a pixel must fall to count as ink
    #[schemars(range(min = 0.0, max = 1.0))]
    pub c: f64,
}

impl Default for AdaptiveParams {
    fn default() -> Self {
        Self {
            window_size: 15,
            c: 0.1,
        }
    }
}

/// How the vector path splits ink from background
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Binarization {
    /// Ink wherever intensity is below `threshold`
    Global { threshold: u8 },
    /// Ink wherever intensity is below the scaled local mean
    Adaptive(AdaptiveParams),
}

impl Default for Binarization {
    fn default() -> Self {
        Self::Global { threshold: 180 }
    }
}

/// What the character matrix samples
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Shading {
    /// Raw intensities
    Grayscale,
    /// Adaptive-thresholded black and white
    Adaptive(AdaptiveParams),
}

impl Default for Shading {
    fn default() -> Self {
        Self::Adaptive(AdaptiveParams::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct CharMatrixConfig {
    /// Bilinear upscale applied before shading
    pub upscale: f64,
    /// Block width in (upscaled) pixels
    pub sample_width: u32,
    /// Block height in (upscaled) pixels
    pub sample_height: u32,
    /// Glyphs ordered from lightest to darkest
    pub ramp: String,
    pub shading: Shading,
}

impl Default for CharMatrixConfig {
    fn default() -> Self {
        Self {
            upscale: 2.0,
            sample_width: 3,
            sample_height: 6,
            ramp: DEFAULT_RAMP.iter().collect(),
            shading: Shading::default(),
        }
    }
}

/// Every tunable of the scan in one place, loadable from TOML or JSON.
///
/// Defaults favour printed text: global threshold at 180 on a 2x downsampled
/// page, 4-connected components of at least 6 pixels, 20px line gap.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// Integer block size averaged before thresholding; 1 disables
    #[schemars(range(min = 1))]
    pub downsample: u32,
    pub connectivity: Connectivity,
    /// Components with fewer pixels are treated as noise
    pub min_points: usize,
    /// Largest vertical step between region tops within one line, in bitmap pixels
    pub line_gap: u32,
    pub vector_style: VectorStyle,
    pub binarization: Binarization,
    pub char_matrix: CharMatrixConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            downsample: 2,
            connectivity: Connectivity::Four,
            min_points: 6,
            line_gap: 20,
            vector_style: VectorStyle::RelativeTuple,
            binarization: Binarization::default(),
            char_matrix: CharMatrixConfig::default(),
        }
    }
}

impl ScanConfig {
    /// JSON schema of the configuration file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ScanConfig)
    }

    pub fn validate(&self) -> Result<()> {
        if self.downsample == 0 {
            return Err(invalid("downsample must be at least 1"));
        }
        if let Binarization::Adaptive(params) = self.binarization {
            validate_adaptive(params)?;
        }

        let matrix = &self.char_matrix;
        if !(matrix.upscale.is_finite() && matrix.upscale > 0.0) {
            return Err(invalid("char_matrix.upscale must be a positive number"));
        }
        if let Shading::Adaptive(params) = matrix.shading {
            validate_adaptive(params)?;
        }
        if matrix.sample_width == 0 || matrix.sample_height == 0 {
            return Err(invalid("char_matrix sample size must be at least 1x1"));
        }
        if matrix.ramp.is_empty() {
            return Err(invalid("char_matrix.ramp must contain at least one glyph"));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ScanConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: ScanConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect file format from the extension and load
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            _ => Err(invalid("unsupported config format, use .toml or .json")),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn validate_adaptive(params: AdaptiveParams) -> Result<()> {
    if params.window_size == 0 {
        return Err(invalid("adaptive window_size must be at least 1"));
    }
    if !(0.0..1.0).contains(&params.c) {
        return Err(invalid("adaptive c must lie in [0, 1)"));
    }
    Ok(())
}

fn invalid(message: &str) -> ScanError {
    ScanError::InvalidConfig(message.to_string())
}
