use crate::arrays::FeatureImage;
use std::collections::HashMap;

/// A position in the 3-channel feature space.
pub type FeaturePoint = [f32; 3];

#[inline(always)]
pub fn distance_sq(a: &FeaturePoint, b: &FeaturePoint) -> f32 {
    let d0 = a[0] - b[0];
    let d1 = a[1] - b[1];
    let d2 = a[2] - b[2];
    d0 * d0 + d1 * d1 + d2 * d2
}

/// Ordered feature points of one clustering run, index-aligned with the source pixels.
#[derive(Debug, Clone, Default)]
pub struct PointSet {
    pub points: Vec<FeaturePoint>,
}

impl PointSet {
    pub fn from_points(points: Vec<FeaturePoint>) -> Self {
        Self { points }
    }

    pub fn from_image(image: &FeatureImage) -> Self {
        Self {
            points: image
                .pixels()
                .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Collapses exact duplicates into weighted unique points.
    ///
    /// Unique points keep first-occurrence order, so everything built on top of them is
    /// deterministic for a given point order.
    pub fn deduplicate(&self) -> WeightedPoints {
        let mut lookup: HashMap<[u32; 3], u32> = HashMap::new();
        let mut weighted = WeightedPoints {
            points: Vec::new(),
            weights: Vec::new(),
            membership: Vec::with_capacity(self.points.len()),
        };
        for point in &self.points {
            let key = point.map(f32::to_bits);
            let unique = *lookup.entry(key).or_insert_with(|| {
                weighted.points.push(*point);
                weighted.weights.push(0);
                (weighted.points.len() - 1) as u32
            });
            weighted.weights[unique as usize] += 1;
            weighted.membership.push(unique);
        }
        weighted
    }
}

/// Unique feature values with their multiplicity.
///
/// A flat-kernel mean over these, weighted by `weights`, equals the mean over the original
/// points. Images rarely have more than a few tens of thousands of distinct colors.
#[derive(Debug, Clone, Default)]
pub struct WeightedPoints {
    pub points: Vec<FeaturePoint>,
    pub weights: Vec<u32>,
    /// For every original point the index of its unique value.
    pub membership: Vec<u32>,
}

impl WeightedPoints {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
