//! Proximity queries over weighted feature points.
//!
//! Every mean-shift iteration is a radius query around the current seed position. This k-d tree
//! answers them without scanning all points; results do not depend on the tree layout.

use crate::points::{distance_sq, FeaturePoint, WeightedPoints};
use assume::assume;

/// Weighted sum of the points inside a query ball.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Neighborhood {
    pub sum: [f64; 3],
    pub weight: u64,
}

impl Neighborhood {
    #[inline(always)]
    fn add(&mut self, point: &FeaturePoint, weight: u32) {
        let w = weight as f64;
        self.sum[0] += point[0] as f64 * w;
        self.sum[1] += point[1] as f64 * w;
        self.sum[2] += point[2] as f64 * w;
        self.weight += weight as u64;
    }

    /// Flat-kernel mean, `None` when the ball is empty.
    pub fn mean(&self) -> Option<FeaturePoint> {
        if self.weight == 0 {
            return None;
        }
        let w = self.weight as f64;
        Some([
            (self.sum[0] / w) as f32,
            (self.sum[1] / w) as f32,
            (self.sum[2] / w) as f32,
        ])
    }
}

#[derive(Debug, Clone)]
struct KdNode {
    /// Index into the points array
    point_idx: usize,
    left: Option<usize>,
    right: Option<usize>,
    split_dim: usize,
}

/// A 3-D k-d tree built once per clustering run and queried by every seed.
#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    points: Vec<FeaturePoint>,
    weights: Vec<u32>,
}

impl KdTree {
    /// Builds a balanced tree with median splits, cycling through the axes.
    pub fn build(weighted: &WeightedPoints) -> Self {
        let mut indices: Vec<usize> = (0..weighted.points.len()).collect();
        let mut nodes = Vec::with_capacity(weighted.points.len());
        Self::build_recursive(&weighted.points, &mut indices, 0, &mut nodes);
        Self {
            nodes,
            points: weighted.points.clone(),
            weights: weighted.weights.clone(),
        }
    }

    fn build_recursive(
        points: &[FeaturePoint],
        indices: &mut [usize],
        depth: usize,
        nodes: &mut Vec<KdNode>,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }
        let split_dim = depth % 3;
        let median = indices.len() / 2;
        indices.select_nth_unstable_by(median, |&a, &b| {
            points[a][split_dim].total_cmp(&points[b][split_dim])
        });
        let node_idx = nodes.len();
        nodes.push(KdNode {
            point_idx: indices[median],
            left: None,
            right: None,
            split_dim,
        });

        let (left_indices, right_part) = indices.split_at_mut(median);
        let right_indices = &mut right_part[1..];
        let left = Self::build_recursive(points, left_indices, depth + 1, nodes);
        let right = Self::build_recursive(points, right_indices, depth + 1, nodes);
        nodes[node_idx].left = left;
        nodes[node_idx].right = right;
        Some(node_idx)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Weighted sum of all points with distance `<= radius` from `query`.
    pub fn neighborhood(&self, query: &FeaturePoint, radius: f32) -> Neighborhood {
        let mut acc = Neighborhood::default();
        if !self.nodes.is_empty() {
            self.neighborhood_recursive(0, query, radius * radius, &mut acc);
        }
        acc
    }

    fn neighborhood_recursive(
        &self,
        node_idx: usize,
        query: &FeaturePoint,
        radius_sq: f32,
        acc: &mut Neighborhood,
    ) {
        // NOTE: node and point indices are produced by `build` and are always in range.
        assume!(unsafe: node_idx < self.nodes.len(), "node: {node_idx} > {}", self.nodes.len());
        let node = &self.nodes[node_idx];
        let point_idx = node.point_idx;
        assume!(unsafe: point_idx < self.points.len(), "point index {point_idx} out of range");
        let point = &self.points[point_idx];
        if distance_sq(query, point) <= radius_sq {
            acc.add(point, self.weights[node.point_idx]);
        }
        let diff = query[node.split_dim] - point[node.split_dim];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(near) = near {
            self.neighborhood_recursive(near, query, radius_sq, acc);
        }
        if diff * diff <= radius_sq {
            if let Some(far) = far {
                self.neighborhood_recursive(far, query, radius_sq, acc);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::PointSet;

    fn pseudo_random_points(n: usize) -> PointSet {
        let mut state = 0x2545_f491_u32;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % 64) as f32
        };
        PointSet::from_points((0..n).map(|_| [next(), next(), next()]).collect())
    }

    fn brute_force(weighted: &WeightedPoints, query: &FeaturePoint, radius: f32) -> Neighborhood {
        let mut acc = Neighborhood::default();
        for (point, weight) in weighted.points.iter().zip(&weighted.weights) {
            if distance_sq(query, point) <= radius * radius {
                acc.add(point, *weight);
            }
        }
        acc
    }

    #[test]
    fn neighborhood_matches_brute_force() {
        let weighted = pseudo_random_points(3000).deduplicate();
        let tree = KdTree::build(&weighted);
        for query in [[0.0, 0.0, 0.0], [31.5, 10.0, 60.0], [63.0, 63.0, 63.0], [20.0, 40.0, 5.0]] {
            for radius in [0.5, 4.0, 11.0, 100.0] {
                let expected = brute_force(&weighted, &query, radius);
                let got = tree.neighborhood(&query, radius);
                assert_eq!(got.weight, expected.weight, "query {query:?} radius {radius}");
                for d in 0..3 {
                    assert!((got.sum[d] - expected.sum[d]).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn ball_boundary_is_inclusive() {
        let weighted = PointSet::from_points(vec![[0.0, 0.0, 0.0], [3.0, 4.0, 0.0]]).deduplicate();
        let tree = KdTree::build(&weighted);
        assert_eq!(tree.neighborhood(&[0.0, 0.0, 0.0], 5.0).weight, 2);
        assert_eq!(tree.neighborhood(&[0.0, 0.0, 0.0], 4.99).weight, 1);
    }

    #[test]
    fn empty_tree_has_empty_neighborhood() {
        let tree = KdTree::build(&WeightedPoints::default());
        assert!(tree.is_empty());
        let hood = tree.neighborhood(&[1.0, 1.0, 1.0], 10.0);
        assert_eq!(hood.weight, 0);
        assert_eq!(hood.mean(), None);
    }
}
