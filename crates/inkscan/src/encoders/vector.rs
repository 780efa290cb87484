use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use crate::{
    algorithms::key_points,
    types::{Line, Region},
};

/// Layout of the per-region summaries written by [`VectorEncoder`]
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VectorStyle {
    /// `L<i>: x,dy,w,h ...` with `dy` relative to the line's top
    #[default]
    #[strum(to_string = "relative_tuple", serialize = "relative")]
    RelativeTuple,
    /// `R<j>:x,y,w,h,density` followed by a `K:` key-point line per region
    #[strum(to_string = "density_keypoints", serialize = "density")]
    DensityKeypoints,
}

/// Writes lines of regions as compact text
#[derive(Debug, Clone, Default)]
pub struct VectorEncoder {
    pub style: VectorStyle,
}

impl VectorEncoder {
    pub fn new(style: VectorStyle) -> Self {
        Self { style }
    }

    /// Encode lines in order. No lines yields an empty string.
    pub fn encode(&self, lines: &[Line]) -> String {
        let rows = match self.style {
            VectorStyle::RelativeTuple => relative_rows(lines),
            VectorStyle::DensityKeypoints => density_rows(lines),
        };
        rows.into_iter().map(|row| row + "\n").collect()
    }
}

fn relative_rows(lines: &[Line]) -> Vec<String> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let tuples: String = line
                .regions
                .iter()
                .map(|region| {
                    let dy = region.start_y as i64 - line.reference_y as i64;
                    format!(" {},{},{},{}", region.start_x, dy, region.width(), region.height())
                })
                .collect();
            format!("L{index}:{tuples}")
        })
        .collect()
}

fn density_rows(lines: &[Line]) -> Vec<String> {
    let mut next_region = 0usize;
    let mut rows = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        rows.push(format!("L{index}:"));
        for region in &line.regions {
            rows.push(region_summary(next_region, region));
            rows.push(key_point_row(region));
            next_region += 1;
        }
    }
    rows
}

fn region_summary(index: usize, region: &Region) -> String {
    format!(
        "R{index}:{},{},{},{},{:.3}",
        region.start_x,
        region.start_y,
        region.width(),
        region.height(),
        region.density()
    )
}

fn key_point_row(region: &Region) -> String {
    let points: String = key_points(region)
        .into_iter()
        .map(|[x, y]| format!("{},{};", x - region.start_x, y - region.start_y))
        .collect();
    format!("K:{points}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn block(x: u32, y: u32, w: u32, h: u32) -> Region {
        let mut region = Region::new(x, y);
        for dy in 0..h {
            for dx in 0..w {
                if dx != 0 || dy != 0 {
                    region.add_point(x + dx, y + dy);
                }
            }
        }
        region
    }

    fn sample_lines() -> Vec<Line> {
        vec![
            Line { reference_y: 2, regions: vec![block(1, 2, 3, 2), block(10, 4, 2, 2)] },
            Line { reference_y: 40, regions: vec![block(5, 40, 1, 1)] },
        ]
    }

    #[test]
    fn test_relative_tuple_layout() {
        let text = VectorEncoder::new(VectorStyle::RelativeTuple).encode(&sample_lines());
        assert_eq!(text, "L0: 1,0,2,1 10,2,1,1\nL1: 5,0,0,0\n");
    }

    #[test]
    fn test_density_keypoint_layout() {
        let text = VectorEncoder::new(VectorStyle::DensityKeypoints).encode(&sample_lines());
        let expected = "\
L0:
R0:1,2,2,1,3.000
K:0,0;0,1;1,0;1,1;2,0;2,1;
R1:10,4,1,1,4.000
K:0,0;1,1;
L1:
R2:5,40,0,0,1.000
K:0,0;
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_no_lines_is_empty() {
        assert!(VectorEncoder::new(VectorStyle::RelativeTuple).encode(&[]).is_empty());
        assert!(VectorEncoder::new(VectorStyle::DensityKeypoints).encode(&[]).is_empty());
    }

    #[test]
    fn test_style_parses_short_names() {
        assert_eq!(VectorStyle::from_str("density").unwrap(), VectorStyle::DensityKeypoints);
        assert_eq!(VectorStyle::from_str("relative_tuple").unwrap(), VectorStyle::RelativeTuple);
        assert_eq!(VectorStyle::DensityKeypoints.to_string(), "density_keypoints");
    }
}
