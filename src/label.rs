use crate::cluster::Mode;
use crate::common::ThreadingStrategy;
use crate::points::{distance_sq, FeaturePoint, WeightedPoints};
use multiversion::multiversion;
use rayon::prelude::*;

const LABEL_CHUNK: usize = 1024;

/// Nearest mode for each point. Ties go to the lowest mode id.
#[multiversion(targets = "simd")]
fn nearest_modes(points: &[FeaturePoint], centers: &[FeaturePoint], labels: &mut [u32]) {
    for (point, label) in points.iter().zip(labels.iter_mut()) {
        let mut best = 0u32;
        let mut best_dist = f32::INFINITY;
        for (id, center) in centers.iter().enumerate() {
            let dist = distance_sq(point, center);
            if dist < best_dist {
                best_dist = dist;
                best = id as u32;
            }
        }
        *label = best;
    }
}

/// Labels every original point with its nearest mode and fills `Mode::num_members`.
///
/// Returns one label per original point, index-aligned with the point set the weighted points
/// were built from. Every point gets exactly one label. With no modes there is nothing to label
/// and the result is empty.
pub fn assign_labels(
    weighted: &WeightedPoints,
    modes: &mut [Mode],
    threading_strategy: ThreadingStrategy,
) -> Vec<u32> {
    if modes.is_empty() {
        return Vec::new();
    }
    debug_assert!(modes.iter().enumerate().all(|(i, m)| m.id as usize == i));
    let centers: Vec<FeaturePoint> = modes.iter().map(|m| m.position).collect();
    let mut unique_labels = vec![0u32; weighted.len()];
    match threading_strategy {
        ThreadingStrategy::SingleThread => {
            nearest_modes(&weighted.points, &centers, &mut unique_labels)
        }
        ThreadingStrategy::Parallel => weighted
            .points
            .par_chunks(LABEL_CHUNK)
            .zip(unique_labels.par_chunks_mut(LABEL_CHUNK))
            .for_each(|(points, labels)| nearest_modes(points, &centers, labels)),
    }

    for mode in modes.iter_mut() {
        mode.num_members = 0;
    }
    for (label, weight) in unique_labels.iter().zip(&weighted.weights) {
        modes[*label as usize].num_members += weight;
    }
    weighted
        .membership
        .iter()
        .map(|unique| unique_labels[*unique as usize])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::assign_labels;
    use crate::cluster::Mode;
    use crate::common::ThreadingStrategy;
    use crate::points::PointSet;

    #[test]
    fn labels_follow_nearest_mode() {
        let set = PointSet::from_points(vec![
            [1.0, 0.0, 0.0],
            [9.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
        ]);
        let mut modes = vec![Mode::new(0, [0.0, 0.0, 0.0], 1), Mode::new(1, [10.0, 0.0, 0.0], 1)];
        let labels = assign_labels(&set.deduplicate(), &mut modes, ThreadingStrategy::SingleThread);
        assert_eq!(labels, vec![0, 1, 0, 0]);
        assert_eq!(modes[0].num_members, 3);
        assert_eq!(modes[1].num_members, 1);
    }

    #[test]
    fn ties_go_to_lowest_id() {
        let set = PointSet::from_points(vec![[5.0, 0.0, 0.0]]);
        let mut modes = vec![Mode::new(0, [10.0, 0.0, 0.0], 1), Mode::new(1, [0.0, 0.0, 0.0], 1)];
        let labels = assign_labels(&set.deduplicate(), &mut modes, ThreadingStrategy::Parallel);
        assert_eq!(labels, vec![0]);
    }

    #[test]
    fn parallel_matches_single_thread() {
        let set = PointSet::from_points(
            (0..5000)
                .map(|i| [(i % 97) as f32, (i % 13) as f32 * 7.0, (i % 7) as f32 * 11.0])
                .collect(),
        );
        let weighted = set.deduplicate();
        let mut modes_a: Vec<Mode> = (0..6)
            .map(|i| Mode::new(i, [i as f32 * 16.0, 40.0, 30.0], 1))
            .collect();
        let mut modes_b = modes_a.clone();
        let a = assign_labels(&weighted, &mut modes_a, ThreadingStrategy::SingleThread);
        let b = assign_labels(&weighted, &mut modes_b, ThreadingStrategy::Parallel);
        assert_eq!(a, b);
        assert_eq!(a.len(), set.len());
        assert_eq!(modes_a, modes_b);
        assert_eq!(
            modes_a.iter().map(|m| m.num_members as usize).sum::<usize>(),
            set.len()
        );
    }

    #[test]
    fn no_modes_no_labels() {
        let mut modes = Vec::new();
        let labels = assign_labels(
            &PointSet::default().deduplicate(),
            &mut modes,
            ThreadingStrategy::Parallel,
        );
        assert!(labels.is_empty());
    }
}
