use crate::{
    traits::RegionAggregator,
    types::{Line, Region},
};

/// Groups regions into lines by the vertical distance between consecutive
/// region tops.
///
/// Regions are visited top to bottom (ties broken left to right). A new line
/// starts whenever a region's `start_y` differs from the previously added
/// region's `start_y` by more than `line_gap`, so a line can drift slowly
/// downwards across a skewed page.
#[derive(Debug, Clone)]
pub struct VerticalGapAggregator {
    pub line_gap: u32,
}

impl Default for VerticalGapAggregator {
    fn default() -> Self {
        Self { line_gap: 20 }
    }
}

impl VerticalGapAggregator {
    pub fn new(line_gap: u32) -> Self {
        Self { line_gap }
    }

    fn flush(lines: &mut Vec<Line>, mut regions: Vec<Region>) {
        if regions.is_empty() {
            return;
        }
        let reference_y = regions[0].start_y;
        regions.sort_by_key(|r| r.start_x);
        lines.push(Line { reference_y, regions });
    }
}

impl RegionAggregator for VerticalGapAggregator {
    fn aggregate(&self, mut regions: Vec<Region>) -> Vec<Line> {
        regions.sort_by_key(|r| (r.start_y, r.start_x));

        let mut lines = Vec::new();
        let mut current: Vec<Region> = Vec::new();
        let mut last_y: Option<u32> = None;

        for region in regions {
            let starts_line = last_y.is_some_and(|y| region.start_y.abs_diff(y) > self.line_gap);
            if starts_line {
                Self::flush(&mut lines, std::mem::take(&mut current));
            }
            last_y = Some(region.start_y);
            current.push(region);
        }
        Self::flush(&mut lines, current);

        tracing::debug!(lines = lines.len(), line_gap = self.line_gap, "grouped regions into lines");
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: u32, y: u32, size: u32) -> Region {
        let mut region = Region::new(x, y);
        for dy in 0..size {
            for dx in 0..size {
                if dx != 0 || dy != 0 {
                    region.add_point(x + dx, y + dy);
                }
            }
        }
        region
    }

    #[test]
    fn test_no_regions_no_lines() {
        assert!(VerticalGapAggregator::default().aggregate(Vec::new()).is_empty());
    }

    #[test]
    fn test_wide_vertical_gap_splits_lines() {
        // 10px squares, 40px of blank rows between them
        let regions = vec![square(0, 50, 10), square(0, 0, 10)];
        let lines = VerticalGapAggregator::new(20).aggregate(regions);

        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.len() == 1));
        assert_eq!(lines[0].regions[0].start_y, 0);
        assert_eq!(lines[1].regions[0].start_y, 50);
    }

    #[test]
    fn test_narrow_vertical_gap_shares_line() {
        // 5px of blank rows, horizontal ranges overlap
        let regions = vec![square(4, 15, 10), square(0, 0, 10)];
        let lines = VerticalGapAggregator::new(20).aggregate(regions);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 2);
        assert_eq!(lines[0].regions[0].start_x, 0);
        assert_eq!(lines[0].regions[1].start_x, 4);
        assert_eq!(lines[0].reference_y, 0);
    }

    #[test]
    fn test_line_orders_left_to_right() {
        let regions = vec![square(40, 0, 5), square(0, 3, 5), square(20, 1, 5)];
        let lines = VerticalGapAggregator::new(20).aggregate(regions);

        assert_eq!(lines.len(), 1);
        let xs: Vec<u32> = lines[0].regions.iter().map(|r| r.start_x).collect();
        assert_eq!(xs, vec![0, 20, 40]);
    }

    #[test]
    fn test_lines_drift_with_last_region() {
        let regions = vec![square(0, 0, 3), square(10, 15, 3), square(20, 30, 3), square(30, 45, 3)];
        let lines = VerticalGapAggregator::new(20).aggregate(regions);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 4);
    }

    #[test]
    fn test_trailing_line_is_flushed() {
        let regions = vec![square(0, 0, 3), square(0, 100, 3), square(8, 101, 3)];
        let lines = VerticalGapAggregator::new(20).aggregate(regions);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].len(), 2);
        assert_eq!(lines[1].reference_y, 100);
    }
}
