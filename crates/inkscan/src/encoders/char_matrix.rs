use image::GrayImage;
use crate::error::{Result, ScanError};

/// Light-to-dark block glyphs
pub const DEFAULT_RAMP: [char; 5] = [' ', '░', '▒', '▓', '█'];

/// Quantises block-average intensity into glyphs from a light-to-dark ramp.
///
/// Works directly on intensities and never looks at connected components, so
/// a blank page still renders as a full grid of the lightest glyph.
#[derive(Debug, Clone)]
pub struct CharMatrixEncoder {
    pub sample_width: u32,
    pub sample_height: u32,
    pub ramp: Vec<char>,
}

impl Default for CharMatrixEncoder {
    fn default() -> Self {
        Self {
            sample_width: 3,
            sample_height: 6,
            ramp: DEFAULT_RAMP.to_vec(),
        }
    }
}

impl CharMatrixEncoder {
    /// Glyph for a mean intensity: `(255 - mean) * (len - 1) / 255`, clamped
    pub fn glyph_for(&self, mean: u8) -> Option<char> {
        let top = self.ramp.len().checked_sub(1)?;
        let index = (255 - mean as usize) * top / 255;
        self.ramp.get(index.min(top)).copied()
    }

    /// One glyph per `sample_width x sample_height` block, a newline after each
    /// row of blocks. Blocks on the right and bottom edges are clipped.
    pub fn encode(&self, image: &GrayImage) -> Result<String> {
        if self.sample_width == 0 || self.sample_height == 0 {
            return Err(ScanError::InvalidConfig("sample size must be at least 1x1".into()));
        }
        if self.ramp.is_empty() {
            return Err(ScanError::InvalidConfig("glyph ramp is empty".into()));
        }

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(String::new());
        }

        let rows: Vec<String> = (0..height)
            .step_by(self.sample_height as usize)
            .map(|y| {
                let mut row: String = (0..width)
                    .step_by(self.sample_width as usize)
                    .filter_map(|x| self.glyph_for(self.block_mean(image, x, y)))
                    .collect();
                row.push('\n');
                row
            })
            .collect();

        tracing::debug!(rows = rows.len(), width, height, "encoded character matrix");
        Ok(rows.concat())
    }

    fn block_mean(&self, image: &GrayImage, x0: u32, y0: u32) -> u8 {
        let x1 = (x0 + self.sample_width).min(image.width());
        let y1 = (y0 + self.sample_height).min(image.height());
        let mut total = 0u64;
        let mut samples = 0u64;
        for y in y0..y1 {
            for x in x0..x1 {
                total += image.get_pixel(x, y)[0] as u64;
                samples += 1;
            }
        }
        (total / samples.max(1)) as u8
    }
}
