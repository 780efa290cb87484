use image::{imageops::FilterType, GrayImage, ImageBuffer, Luma};
use imageproc::integral_image::integral_image;
use crate::{
    cancel::Cancellation,
    error::Result,
    traits::Binarizer,
    types::{intensity, BinaryBitmap, RasterSource},
};

/// Convert any raster source into an intensity image
pub fn intensity_map<S>(source: &S, cancel: &Cancellation) -> Result<GrayImage>
where
    S: RasterSource + ?Sized,
{
    let (width, height) = (source.width(), source.height());
    let mut gray = GrayImage::new(width, height);
    for y in 0..height {
        cancel.check()?;
        for x in 0..width {
            gray.put_pixel(x, y, Luma([intensity(source.pixel_rgb(x, y))]));
        }
    }
    Ok(gray)
}

/// Average each `factor x factor` block into one output pixel.
///
/// The output is `floor(W / factor) x floor(H / factor)`; a factor of 0 or 1
/// returns the input unchanged.
pub fn downsample(image: &GrayImage, factor: u32, cancel: &Cancellation) -> Result<GrayImage> {
    if factor <= 1 {
        return Ok(image.clone());
    }

    let (src_w, src_h) = image.dimensions();
    let (width, height) = (src_w / factor, src_h / factor);
    let mut output = GrayImage::new(width, height);

    for y in 0..height {
        cancel.check()?;
        for x in 0..width {
            // factor^2 samples of up to 255 outgrow u32 past factor ~4100
            let mut total = 0u64;
            let mut samples = 0u64;
            for sy in y * factor..((y + 1) * factor).min(src_h) {
                for sx in x * factor..((x + 1) * factor).min(src_w) {
                    total += image.get_pixel(sx, sy)[0] as u64;
                    samples += 1;
                }
            }
            let mean = if samples == 0 { 255 } else { total / samples };
            output.put_pixel(x, y, Luma([mean as u8]));
        }
    }

    tracing::debug!(factor, src_w, src_h, width, height, "downsampled intensity map");
    Ok(output)
}

/// Bilinear upscale by `scale`, used only ahead of character-matrix rendering
pub fn upscale(image: &GrayImage, scale: f64) -> GrayImage {
    let width = (image.width() as f64 * scale) as u32;
    let height = (image.height() as f64 * scale) as u32;

    if (width, height) == image.dimensions() {
        return image.clone();
    }
    if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
        return GrayImage::new(width, height);
    }

    image::imageops::resize(image, width, height, FilterType::Triangle)
}

/// Fixed cutoff: ink wherever intensity is below `threshold`
#[derive(Debug, Clone)]
pub struct GlobalThreshold {
    pub threshold: u8,
}

impl Default for GlobalThreshold {
    fn default() -> Self {
        Self { threshold: 180 }
    }
}

impl Binarizer for GlobalThreshold {
    fn binarize(&self, image: &GrayImage, cancel: &Cancellation) -> Result<BinaryBitmap> {
        let (width, height) = image.dimensions();
        let mut ink = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            cancel.check()?;
            ink.extend((0..width).map(|x| image.get_pixel(x, y)[0] < self.threshold));
        }
        BinaryBitmap::from_pixels(width, height, ink)
    }

    fn name(&self) -> &'static str {
        "global threshold"
    }
}

/// Local-mean cutoff that compensates for uneven illumination.
///
/// A pixel is ink when its intensity is below `mean * (1 - c)`, where `mean`
/// is taken over the `window_size` square centred on it and clipped to the
/// image. Window sums come from a summed-area table, so the cost does not
/// depend on the window size.
#[derive(Debug, Clone)]
pub struct AdaptiveThreshold {
    pub window_size: u32,
    pub c: f64,
}

impl Default for AdaptiveThreshold {
    fn default() -> Self {
        Self {
            window_size: 15,
            c: 0.1,
        }
    }
}

impl AdaptiveThreshold {
    /// Per-pixel ink decisions in row-major order
    fn classify(&self, image: &GrayImage, cancel: &Cancellation) -> Result<Vec<bool>> {
        let (width, height) = image.dimensions();
        let mut ink = Vec::with_capacity(width as usize * height as usize);
        if width == 0 || height == 0 {
            return Ok(ink);
        }

        // (width + 1) x (height + 1), first row and column zero
        let table: ImageBuffer<Luma<u64>, Vec<u64>> = integral_image::<_, u64>(image);
        let at = |x: u32, y: u32| table.get_pixel(x, y)[0];

        let half = self.window_size / 2;
        let factor = 1.0 - self.c;

        for y in 0..height {
            cancel.check()?;
            let top = y.saturating_sub(half);
            let bottom = (y + half).min(height - 1);
            for x in 0..width {
                let left = x.saturating_sub(half);
                let right = (x + half).min(width - 1);

                let sum = at(right + 1, bottom + 1) + at(left, top)
                    - at(left, bottom + 1)
                    - at(right + 1, top);
                let count = (right - left + 1) as u64 * (bottom - top + 1) as u64;
                let mean = sum as f64 / count as f64;

                ink.push((image.get_pixel(x, y)[0] as f64) < mean * factor);
            }
        }
        Ok(ink)
    }

    /// Thresholded image with ink as 0 and background as 255
    pub fn render(&self, image: &GrayImage, cancel: &Cancellation) -> Result<GrayImage> {
        let bitmap = self.binarize(image, cancel)?;
        Ok(bitmap.to_gray_image())
    }
}

impl Binarizer for AdaptiveThreshold {
    fn binarize(&self, image: &GrayImage, cancel: &Cancellation) -> Result<BinaryBitmap> {
        let ink = self.classify(image, cancel)?;
        BinaryBitmap::from_pixels(image.width(), image.height(), ink)
    }

    fn name(&self) -> &'static str {
        "adaptive threshold"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| Luma([(x * 255 / width.max(1)) as u8]))
    }

    /// Naive window scan, kept as the reference for the summed-area version
    fn naive_adaptive(image: &GrayImage, window_size: u32, c: f64) -> Vec<bool> {
        let (w, h) = image.dimensions();
        let half = window_size / 2;
        let mut ink = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let mut sum = 0u64;
                let mut count = 0u64;
                for wy in y.saturating_sub(half)..=(y + half).min(h - 1) {
                    for wx in x.saturating_sub(half)..=(x + half).min(w - 1) {
                        sum += image.get_pixel(wx, wy)[0] as u64;
                        count += 1;
                    }
                }
                let mean = sum as f64 / count as f64;
                ink.push((image.get_pixel(x, y)[0] as f64) < mean * (1.0 - c));
            }
        }
        ink
    }

    #[test]
    fn test_intensity_map_uses_channel_mean() {
        let mut rgb = RgbImage::from_pixel(3, 2, Rgb([255, 255, 255]));
        rgb.put_pixel(2, 1, Rgb([0, 30, 60]));
        let gray = intensity_map(&rgb, &Cancellation::new()).unwrap();
        assert_eq!(gray.dimensions(), (3, 2));
        assert_eq!(gray.get_pixel(0, 0)[0], 255);
        assert_eq!(gray.get_pixel(2, 1)[0], 30);
    }

    #[test]
    fn test_global_threshold_marks_dark_pixels() {
        let mut image = GrayImage::from_pixel(4, 4, Luma([255u8]));
        image.put_pixel(1, 1, Luma([179u8]));
        image.put_pixel(2, 2, Luma([180u8]));

        let bitmap = GlobalThreshold::default().binarize(&image, &Cancellation::new()).unwrap();
        assert!(bitmap.get(1, 1));
        assert!(!bitmap.get(2, 2));
        assert_eq!(bitmap.foreground_count(), 1);
    }

    #[test]
    fn test_downsample_floors_dimensions_and_averages() {
        let mut image = GrayImage::from_pixel(5, 3, Luma([200u8]));
        image.put_pixel(0, 0, Luma([0u8]));
        let out = downsample(&image, 2, &Cancellation::new()).unwrap();

        assert_eq!(out.dimensions(), (2, 1));
        assert_eq!(out.get_pixel(0, 0)[0], 150);
        assert_eq!(out.get_pixel(1, 0)[0], 200);
    }

    #[test]
    fn test_downsample_huge_factor_keeps_exact_mean() {
        let image = GrayImage::from_pixel(4200, 4200, Luma([255u8]));
        let out = downsample(&image, 4200, &Cancellation::new()).unwrap();
        assert_eq!(out.dimensions(), (1, 1));
        assert_eq!(out.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_global_threshold_keeps_row_major_layout() {
        let image = GrayImage::from_fn(5, 3, |x, y| Luma([if x == 4 && y == 1 { 0 } else { 255 }]));
        let bitmap = GlobalThreshold::default().binarize(&image, &Cancellation::new()).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (5, 3));
        assert!(bitmap.get(4, 1));
        assert_eq!(bitmap.foreground_count(), 1);
    }

    #[test]
    fn test_downsample_factor_one_is_identity() {
        let image = gradient(7, 3);
        assert_eq!(downsample(&image, 1, &Cancellation::new()).unwrap(), image);
    }

    #[test]
    fn test_adaptive_matches_naive_window_scan() {
        let mut image = gradient(23, 17);
        for x in 5..9 {
            image.put_pixel(x, 8, Luma([10u8]));
        }
        let threshold = AdaptiveThreshold { window_size: 5, c: 0.1 };
        let bitmap = threshold.binarize(&image, &Cancellation::new()).unwrap();
        let expected = naive_adaptive(&image, 5, 0.1);

        for y in 0..17 {
            for x in 0..23 {
                assert_eq!(bitmap.get(x, y), expected[(y * 23 + x) as usize], "pixel ({x}, {y})");
            }
        }
        assert!(bitmap.get(6, 8));
    }

    #[test]
    fn test_adaptive_ignores_uniform_areas() {
        let image = GrayImage::from_pixel(10, 10, Luma([90u8]));
        let bitmap = AdaptiveThreshold::default().binarize(&image, &Cancellation::new()).unwrap();
        assert_eq!(bitmap.foreground_count(), 0);
    }

    #[test]
    fn test_adaptive_render_is_black_on_white() {
        let mut image = GrayImage::from_pixel(9, 9, Luma([220u8]));
        image.put_pixel(4, 4, Luma([0u8]));
        let rendered = AdaptiveThreshold::default().render(&image, &Cancellation::new()).unwrap();
        assert_eq!(rendered.get_pixel(4, 4)[0], 0);
        assert_eq!(rendered.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_upscale_doubles_dimensions() {
        let image = gradient(4, 3);
        assert_eq!(upscale(&image, 2.0).dimensions(), (8, 6));
        assert_eq!(upscale(&image, 1.0), image);
    }

    #[test]
    fn test_cancelled_scan_stops() {
        let cancel = Cancellation::new();
        cancel.cancel();
        let image = gradient(4, 4);
        assert!(GlobalThreshold::default().binarize(&image, &cancel).is_err());
        assert!(AdaptiveThreshold::default().binarize(&image, &cancel).is_err());
        assert!(downsample(&image, 2, &cancel).is_err());
    }

    #[test]
    fn test_empty_image_binarizes_to_empty_bitmap() {
        let image = GrayImage::new(0, 0);
        let bitmap = AdaptiveThreshold::default().binarize(&image, &Cancellation::new()).unwrap();
        assert!(bitmap.is_empty());
    }
}
