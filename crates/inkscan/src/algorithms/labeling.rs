use crate::{
    cancel::Cancellation,
    error::{Result, ScanError},
    traits::RegionLabeler,
    types::{BinaryBitmap, Connectivity, Region, VisitedSet},
};

/// Connected-component labeler backed by an explicit-stack flood fill.
///
/// Components smaller than `min_points` are dropped after they have been fully
/// explored, so their pixels still count as visited.
#[derive(Debug, Clone)]
pub struct FloodFillLabeler {
    pub connectivity: Connectivity,
    pub min_points: usize,
}

impl Default for FloodFillLabeler {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::Four,
            min_points: 6,
        }
    }
}

impl FloodFillLabeler {
    pub fn new(connectivity: Connectivity, min_points: usize) -> Self {
        Self { connectivity, min_points }
    }

    /// Label against a caller-owned visited set.
    ///
    /// Pixels already marked in `visited` are never revisited, so running this
    /// twice over the same bitmap and set yields nothing the second time.
    pub fn label_with_visited(
        &self,
        bitmap: &BinaryBitmap,
        visited: &mut VisitedSet,
        cancel: &Cancellation,
    ) -> Result<Vec<Region>> {
        if (visited.width(), visited.height()) != (bitmap.width(), bitmap.height()) {
            return Err(ScanError::InvalidConfig(format!(
                "visited set is {}x{} but the bitmap is {}x{}",
                visited.width(),
                visited.height(),
                bitmap.width(),
                bitmap.height()
            )));
        }

        let mut regions = Vec::new();
        let mut stack = Vec::new();
        let mut discarded = 0usize;

        for y in 0..bitmap.height() {
            cancel.check()?;
            for x in 0..bitmap.width() {
                if visited.is_visited(x, y) || !bitmap.get(x, y) {
                    continue;
                }

                let region = self.flood_fill(bitmap, visited, &mut stack, x, y);
                if region.point_count() < self.min_points {
                    discarded += 1;
                    continue;
                }
                regions.push(region);
            }
        }

        tracing::debug!(
            kept = regions.len(),
            discarded,
            connectivity = %self.connectivity,
            "labeled connected components"
        );
        Ok(regions)
    }

    /// Collect every ink pixel reachable from the seed.
    fn flood_fill(
        &self,
        bitmap: &BinaryBitmap,
        visited: &mut VisitedSet,
        stack: &mut Vec<(u32, u32)>,
        seed_x: u32,
        seed_y: u32,
    ) -> Region {
        visited.mark(seed_x, seed_y);
        let mut region = Region::new(seed_x, seed_y);
        stack.clear();
        stack.push((seed_x, seed_y));

        while let Some((x, y)) = stack.pop() {
            for &(dx, dy) in self.connectivity.offsets() {
                let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                if !bitmap.is_foreground(nx, ny) {
                    continue;
                }
                let (nx, ny) = (nx as u32, ny as u32);
                if visited.mark(nx, ny) {
                    region.add_point(nx, ny);
                    stack.push((nx, ny));
                }
            }
        }

        region
    }
}

impl RegionLabeler for FloodFillLabeler {
    fn label(&self, bitmap: &BinaryBitmap, cancel: &Cancellation) -> Result<Vec<Region>> {
        let mut visited = VisitedSet::for_bitmap(bitmap);
        self.label_with_visited(bitmap, &mut visited, cancel)
    }
}
