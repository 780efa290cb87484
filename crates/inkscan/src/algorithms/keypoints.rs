use crate::types::Region;

/// Number of evenly spaced samples taken between the extreme points
const KEY_POINT_DIVISIONS: usize = 5;

/// Summarise a region's silhouette with a handful of its pixels.
///
/// Members are ordered by x (stable, so equal columns keep discovery order).
/// The leftmost and rightmost pixels are always kept; in between, every
/// `point_count / 5`-th pixel is taken. Small regions where that stride is
/// zero keep only the two extremes.
pub fn key_points(region: &Region) -> Vec<[u32; 2]> {
    let mut sorted = region.points.clone();
    sorted.sort_by_key(|&[x, _]| x);

    let count = sorted.len();
    if count <= 1 {
        return sorted;
    }

    let last = count - 1;
    let stride = count / KEY_POINT_DIVISIONS;
    let mut keys = vec![sorted[0]];
    if stride > 0 {
        keys.extend((stride..last).step_by(stride).map(|i| sorted[i]));
    }
    keys.push(sorted[last]);
    keys
}
