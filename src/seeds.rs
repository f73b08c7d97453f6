use crate::mean_shift::Seed;
use crate::points::{FeaturePoint, WeightedPoints};
use std::collections::HashMap;

#[derive(Default)]
struct BinAccumulator {
    sum: [f64; 3],
    count: u64,
}

/// Bin seeding: one seed per occupied cubical bin of side `bin_size`.
///
/// The grid starts at the per-axis minimum and the last bin of each axis is closed, so a point
/// set whose extent is not larger than `bin_size` falls into exactly one bin. Each seed sits at
/// the mean of its bin's points. Bins with fewer than `min_bin_freq` points are skipped unless
/// that would skip all of them. Seeds come out in lexicographic bin order.
pub fn bin_seeds(weighted: &WeightedPoints, bin_size: f32, min_bin_freq: u32) -> Vec<Seed> {
    debug_assert!(bin_size > 0.0);
    if weighted.is_empty() {
        return Vec::new();
    }
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for point in &weighted.points {
        for d in 0..3 {
            min[d] = min[d].min(point[d]);
            max[d] = max[d].max(point[d]);
        }
    }
    let bins_per_axis: [u32; 3] =
        std::array::from_fn(|d| (((max[d] - min[d]) / bin_size).ceil() as u32).max(1));

    let mut bins: HashMap<[u32; 3], BinAccumulator> = HashMap::new();
    for (point, weight) in weighted.points.iter().zip(&weighted.weights) {
        let key: [u32; 3] = std::array::from_fn(|d| {
            (((point[d] - min[d]) / bin_size).floor() as u32).min(bins_per_axis[d] - 1)
        });
        let bin = bins.entry(key).or_default();
        let w = *weight as f64;
        for d in 0..3 {
            bin.sum[d] += point[d] as f64 * w;
        }
        bin.count += *weight as u64;
    }

    let mut occupied: Vec<([u32; 3], BinAccumulator)> = bins.into_iter().collect();
    occupied.sort_unstable_by_key(|(key, _)| *key);
    if occupied
        .iter()
        .any(|(_, bin)| bin.count >= min_bin_freq as u64)
    {
        occupied.retain(|(_, bin)| bin.count >= min_bin_freq as u64);
    }
    occupied
        .into_iter()
        .map(|(_, bin)| {
            let n = bin.count as f64;
            let position: FeaturePoint = [
                (bin.sum[0] / n) as f32,
                (bin.sum[1] / n) as f32,
                (bin.sum[2] / n) as f32,
            ];
            Seed { position }
        })
        .collect()
}
