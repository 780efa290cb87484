use image::{DynamicImage, GenericImageView, GrayImage, ImageBuffer, Luma, RgbImage, RgbaImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use crate::error::{Result, ScanError};

/// Read-only view over decoded pixel data.
///
/// The pipeline never decodes files itself; anything that can report its
/// dimensions and hand out RGB triples can be scanned.
pub trait RasterSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// RGB triple at `(x, y)`. Callers guarantee `x < width` and `y < height`.
    fn pixel_rgb(&self, x: u32, y: u32) -> [u8; 3];
}

impl RasterSource for RgbImage {
    fn width(&self) -> u32 {
        ImageBuffer::width(self)
    }

    fn height(&self) -> u32 {
        ImageBuffer::height(self)
    }

    fn pixel_rgb(&self, x: u32, y: u32) -> [u8; 3] {
        self.get_pixel(x, y).0
    }
}

impl RasterSource for RgbaImage {
    fn width(&self) -> u32 {
        ImageBuffer::width(self)
    }

    fn height(&self) -> u32 {
        ImageBuffer::height(self)
    }

    fn pixel_rgb(&self, x: u32, y: u32) -> [u8; 3] {
        over_white(self.get_pixel(x, y).0)
    }
}

impl RasterSource for GrayImage {
    fn width(&self) -> u32 {
        ImageBuffer::width(self)
    }

    fn height(&self) -> u32 {
        ImageBuffer::height(self)
    }

    fn pixel_rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let [v] = self.get_pixel(x, y).0;
        [v, v, v]
    }
}

impl RasterSource for DynamicImage {
    fn width(&self) -> u32 {
        GenericImageView::dimensions(self).0
    }

    fn height(&self) -> u32 {
        GenericImageView::dimensions(self).1
    }

    fn pixel_rgb(&self, x: u32, y: u32) -> [u8; 3] {
        over_white(GenericImageView::get_pixel(self, x, y).0)
    }
}

/// Composite a straight-alpha pixel over a white page.
fn over_white([r, g, b, a]: [u8; 4]) -> [u8; 3] {
    if a == u8::MAX {
        return [r, g, b];
    }
    let alpha = a as f32 / 255.0;
    let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
    [blend(r), blend(g), blend(b)]
}

/// Unweighted mean of the three channels, truncated.
pub fn intensity([r, g, b]: [u8; 3]) -> u8 {
    ((r as u16 + g as u16 + b as u16) / 3) as u8
}

/// Foreground adjacency used by flood fill.
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Connectivity {
    /// North, south, east and west neighbours only
    #[default]
    Four,
    /// Orthogonal neighbours plus the four diagonals
    Eight,
}

impl Connectivity {
    const FOUR: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
    const EIGHT: [(i64, i64); 8] = [
        (1, 0), (-1, 0), (0, 1), (0, -1),
        (1, 1), (1, -1), (-1, 1), (-1, -1),
    ];

    /// Neighbour offsets as `(dx, dy)` pairs
    pub fn offsets(self) -> &'static [(i64, i64)] {
        match self {
            Self::Four => &Self::FOUR,
            Self::Eight => &Self::EIGHT,
        }
    }
}

/// Two-level bitmap where `true` marks a foreground ("ink") pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryBitmap {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl BinaryBitmap {
    /// Build a bitmap by evaluating `f` at every coordinate in row-major order
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self { width, height, pixels }
    }

    /// Wrap row-major ink flags; the length must be `width * height`
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<bool>) -> Result<Self> {
        if pixels.len() != width as usize * height as usize {
            return Err(ScanError::InvalidConfig(format!(
                "{} pixels do not fill a {width}x{height} bitmap",
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// Treat every pure black pixel (value 0) of a mask image as ink
    pub fn from_mask(mask: &GrayImage) -> Self {
        Self::from_fn(mask.width(), mask.height(), |x, y| mask.get_pixel(x, y)[0] == 0)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Bounds-checked lookup for signed neighbour coordinates
    pub fn is_foreground(&self, x: i64, y: i64) -> bool {
        x >= 0
            && y >= 0
            && x < self.width as i64
            && y < self.height as i64
            && self.get(x as u32, y as u32)
    }

    pub fn foreground_count(&self) -> usize {
        self.pixels.iter().filter(|&&ink| ink).count()
    }

    /// Render as black ink on a white page
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.get(x, y) { Luma([0u8]) } else { Luma([255u8]) }
        })
    }
}

/// Per-pixel visited flags for one labeling run. Flags are only ever set.
#[derive(Debug, Clone)]
pub struct VisitedSet {
    width: u32,
    height: u32,
    flags: Vec<bool>,
}

impl VisitedSet {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            flags: vec![false; width as usize * height as usize],
        }
    }

    /// Visited set shaped like `bitmap`
    pub fn for_bitmap(bitmap: &BinaryBitmap) -> Self {
        Self::new(bitmap.width(), bitmap.height())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_visited(&self, x: u32, y: u32) -> bool {
        self.flags[self.index(x, y)]
    }

    /// Mark `(x, y)`; returns `false` if it was already visited.
    pub fn mark(&mut self, x: u32, y: u32) -> bool {
        let index = self.index(x, y);
        !std::mem::replace(&mut self.flags[index], true)
    }

    pub fn visited_count(&self) -> usize {
        self.flags.iter().filter(|&&v| v).count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// One connected component: inclusive bounding box plus member pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub start_x: u32,
    pub start_y: u32,
    pub end_x: u32,
    pub end_y: u32,
    /// Member pixels as `[x, y]` in discovery order
    pub points: Vec<[u32; 2]>,
}

impl Region {
    /// Start a region from its seed pixel
    pub fn new(x: u32, y: u32) -> Self {
        Self {
            start_x: x,
            start_y: y,
            end_x: x,
            end_y: y,
            points: vec![[x, y]],
        }
    }

    /// Add a member pixel, growing the box as needed
    pub fn add_point(&mut self, x: u32, y: u32) {
        self.start_x = self.start_x.min(x);
        self.start_y = self.start_y.min(y);
        self.end_x = self.end_x.max(x);
        self.end_y = self.end_y.max(y);
        self.points.push([x, y]);
    }

    /// `end_x - start_x`; zero for a single-column region
    pub fn width(&self) -> u32 {
        self.end_x - self.start_x
    }

    /// `end_y - start_y`; zero for a single-row region
    pub fn height(&self) -> u32 {
        self.end_y - self.start_y
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Member pixels per unit of box area.
    ///
    /// Degenerate boxes (zero width or height) report the raw point count.
    pub fn density(&self) -> f64 {
        let area = self.width() as u64 * self.height() as u64;
        if area == 0 {
            self.point_count() as f64
        } else {
            self.point_count() as f64 / area as f64
        }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.start_x..=self.end_x).contains(&x) && (self.start_y..=self.end_y).contains(&y)
    }
}

/// Regions sharing a horizontal band, ordered left to right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// `start_y` of the topmost region in the line
    pub reference_y: u32,
    pub regions: Vec<Region>,
}

impl Line {
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
