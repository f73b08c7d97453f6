use crate::common::{Config, ThreadingStrategy};
use crate::kdtree::KdTree;
use crate::points::{distance_sq, FeaturePoint};
use rayon::prelude::*;

/// Working position of one mean-shift search. Owned by a single `seek_mode` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed {
    pub position: FeaturePoint,
}

/// Where a seed ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergedSeed {
    pub position: FeaturePoint,
    /// Total weight inside the bandwidth ball at the last step.
    pub intensity: u64,
    pub iterations: u16,
    /// `false` when the iteration cap was hit. Not an error, the last position is used as-is.
    pub converged: bool,
}

/// Shifts a seed to the flat-kernel mean of its bandwidth ball until it stops moving.
///
/// Stops when the shift is below `convergence_tolerance * bandwidth` or after
/// `max_iterations`. An empty ball leaves the seed where it is and counts as converged.
pub fn seek_mode(seed: Seed, tree: &KdTree, config: &Config) -> ConvergedSeed {
    let stop_sq = config.stop_threshold_sq();
    let mut seed = seed;
    let mut intensity = 0;
    for iteration in 1..=config.max_iterations {
        let neighborhood = tree.neighborhood(&seed.position, config.bandwidth);
        intensity = neighborhood.weight;
        let Some(mean) = neighborhood.mean() else {
            return ConvergedSeed {
                position: seed.position,
                intensity: 0,
                iterations: iteration,
                converged: true,
            };
        };
        let shift_sq = distance_sq(&mean, &seed.position);
        seed.position = mean;
        if shift_sq < stop_sq {
            return ConvergedSeed {
                position: seed.position,
                intensity,
                iterations: iteration,
                converged: true,
            };
        }
    }
    ConvergedSeed {
        position: seed.position,
        intensity,
        iterations: config.max_iterations,
        converged: false,
    }
}

/// Converges every seed. Seeds only read the shared tree, so they run independently; the output
/// is in seed order regardless of the threading strategy.
pub fn seek_modes(seeds: &[Seed], tree: &KdTree, config: &Config) -> Vec<ConvergedSeed> {
    match config.threading_strategy {
        ThreadingStrategy::SingleThread => seeds
            .iter()
            .map(|seed| seek_mode(*seed, tree, config))
            .collect(),
        ThreadingStrategy::Parallel => seeds
            .par_iter()
            .map(|seed| seek_mode(*seed, tree, config))
            .collect(),
    }
}
