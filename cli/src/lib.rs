use inkscan::{OutputFormat, ScanConfig};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Scan(#[from] inkscan::ScanError),
    #[error("Job 'input' must name an image file")]
    MissingInput,
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// One scan described in a job file
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Job {
    /// Image to scan
    pub input: String,
    /// Where to write the result; stdout when absent
    pub output: Option<String>,
    #[serde(default)]
    pub format: OutputFormat,
    /// Inline scan settings; defaults when absent
    pub config: Option<ScanConfig>,
}

impl Job {
    /// Load a job from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a job from TOML string
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        let job: Job = toml::from_str(content)?;
        job.validate()?;
        Ok(job)
    }

    /// Load a job from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load a job from JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        let job: Job = serde_json::from_str(content)?;
        job.validate()?;
        Ok(job)
    }

    /// Auto-detect file format and load the job
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Convert the job to TOML string
    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Convert the job to JSON string
    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// Settings to scan with, falling back to the defaults
    pub fn scan_config(&self) -> ScanConfig {
        self.config.clone().unwrap_or_default()
    }

    fn validate(&self) -> Result<(), CliError> {
        if self.input.trim().is_empty() {
            return Err(CliError::MissingInput);
        }
        if let Some(config) = &self.config {
            config.validate()?;
        }
        Ok(())
    }
}

/// Write to `path`, or to stdout when there is none
pub fn write_output(path: Option<&Path>, text: &str) -> Result<(), CliError> {
    match path {
        Some(path) => fs::write(path, text)?,
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkscan::{Binarization, VectorStyle};

    #[test]
    fn test_job_from_toml() {
        let job = Job::from_toml(
            r#"
            input = "page.png"
            output = "page.txt"
            format = "char_matrix"

            [config]
            line_gap = 8
            vector_style = "density_keypoints"

            [config.binarization]
            mode = "global"
            threshold = 150
            "#,
        )
        .unwrap();

        assert_eq!(job.format, OutputFormat::CharMatrix);
        assert_eq!(job.output.as_deref(), Some("page.txt"));
        let config = job.scan_config();
        assert_eq!(config.line_gap, 8);
        assert_eq!(config.vector_style, VectorStyle::DensityKeypoints);
        assert_eq!(config.binarization, Binarization::Global { threshold: 150 });
    }

    #[test]
    fn test_job_from_json_defaults() {
        let job = Job::from_json(r#"{ "input": "scan.jpg" }"#).unwrap();
        assert_eq!(job.format, OutputFormat::Vectors);
        assert!(job.output.is_none());
        assert_eq!(job.scan_config(), ScanConfig::default());
    }

    #[test]
    fn test_job_rejects_invalid_config() {
        let result = Job::from_json(r#"{ "input": "scan.jpg", "config": { "downsample": 0 } }"#);
        assert!(matches!(result, Err(CliError::Scan(_))));
    }

    #[test]
    fn test_job_requires_input() {
        assert!(matches!(Job::from_json(r#"{ "input": " " }"#), Err(CliError::MissingInput)));
    }

    #[test]
    fn test_unknown_extension() {
        assert!(matches!(Job::from_file("job.yaml"), Err(CliError::UnsupportedFileFormat)));
    }

    #[test]
    fn test_job_toml_round_trip() {
        let job = Job {
            input: "in.png".to_string(),
            output: Some("out.geojson".to_string()),
            format: OutputFormat::GeoJson,
            config: Some(ScanConfig::default()),
        };
        assert_eq!(Job::from_toml(&job.to_toml().unwrap()).unwrap(), job);
    }
}
