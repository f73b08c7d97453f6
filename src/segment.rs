use crate::arrays::{Array2D, FeatureImage};
use crate::cluster::Mode;
use crate::common::Config;
use crate::error::Result;
use crate::kdtree::KdTree;
use crate::label::assign_labels;
use crate::mean_shift::seek_modes;
use crate::merge::merge_modes;
use crate::points::PointSet;
use crate::seeds::bin_seeds;

/// Counters of one clustering run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusteringStats {
    pub num_points: usize,
    pub num_unique_points: usize,
    pub num_seeds: usize,
    /// Seeds which hit `max_iterations`.
    pub num_unconverged: usize,
}

/// Result of one mean-shift clustering run over a point set.
#[derive(Debug, Clone)]
pub struct Clustering {
    pub modes: Vec<Mode>,
    /// One label per point, the value is an index into `modes`.
    pub labels: Vec<u32>,
    pub stats: ClusteringStats,
}

/// Runs the whole mean-shift pipeline over a point set.
///
/// The steps are:
/// - deduplicate points and build the k-d tree
/// - bin seeding
/// - converge every seed (in parallel unless single-threaded)
/// - merge converged seeds closer than the bandwidth into modes
/// - label every point with its nearest mode
///
/// An empty point set gives zero modes and zero labels.
pub fn cluster(points: &PointSet, config: &Config) -> Result<Clustering> {
    config.validate()?;
    let weighted = points.deduplicate();
    let tree = KdTree::build(&weighted);
    let seeds = bin_seeds(&weighted, config.bandwidth, config.min_bin_freq);
    let converged = seek_modes(&seeds, &tree, config);
    let mut modes = merge_modes(&converged, config.bandwidth);
    let labels = assign_labels(&weighted, &mut modes, config.threading_strategy);
    let stats = ClusteringStats {
        num_points: points.len(),
        num_unique_points: weighted.len(),
        num_seeds: seeds.len(),
        num_unconverged: converged.iter().filter(|c| !c.converged).count(),
    };
    Ok(Clustering {
        modes,
        labels,
        stats,
    })
}

/// Per-pixel clustering of a feature image.
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub modes: Vec<Mode>,
    pub labels: Array2D<u32>,
    pub stats: ClusteringStats,
}

impl Segmentation {
    /// Label values carried by at least one pixel, ascending.
    pub fn present_labels(&self) -> impl Iterator<Item = u32> + '_ {
        self.modes
            .iter()
            .filter(|mode| mode.num_members > 0)
            .map(|mode| mode.id)
    }
}

/// Clusters the pixels of `image` by color only, ignoring their position.
pub fn segment_image(image: &FeatureImage, config: &Config) -> Result<Segmentation> {
    let points = PointSet::from_image(image);
    let clustering = cluster(&points, config)?;
    let labels = Array2D::from_slice(&clustering.labels, image.width, image.height)?;
    Ok(Segmentation {
        modes: clustering.modes,
        labels,
        stats: clustering.stats,
    })
}
