use crate::error::{Error, Result};
use std::ops::Range;

/// Changes between parallelization schemas of one clustering run.
#[derive(Clone, PartialEq, Debug, Copy)]
pub enum ThreadingStrategy {
    /// No threading - used for correctness checks and very small point sets.
    SingleThread,
    /// Seeds are converged and points are labeled on the rayon thread pool.
    ///
    /// Results are gathered in seed order, so mode ids do not depend on scheduling.
    Parallel,
}

/// Config of a single mean-shift pass.
#[derive(Clone, Debug)]
pub struct Config {
    /// Radius of the flat kernel in feature space units (8-bit L*u*v*).
    ///
    /// It is also the bin side for seeding and the merge threshold for converged seeds.
    pub bandwidth: f32,
    /// Iteration cap for a single seed. A seed which did not converge keeps its last position.
    pub max_iterations: u16,
    /// Convergence tolerance relative to the bandwidth. A seed is converged when it shifts by
    /// less than `convergence_tolerance * bandwidth`.
    pub convergence_tolerance: f32,
    /// Bins with fewer points than this do not produce a seed.
    pub min_bin_freq: u32,
    pub threading_strategy: ThreadingStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bandwidth: 15.0,
            max_iterations: 300,
            convergence_tolerance: 1e-3,
            min_bin_freq: 1,
            threading_strategy: ThreadingStrategy::Parallel,
        }
    }
}

impl Config {
    pub fn with_bandwidth(bandwidth: f32) -> Self {
        Self {
            bandwidth,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.bandwidth.is_finite() && self.bandwidth > 0.0) {
            return Err(Error::InvalidBandwidth(self.bandwidth));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.convergence_tolerance.is_finite() && self.convergence_tolerance >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "convergence_tolerance must be finite and non-negative, got {}",
                self.convergence_tolerance
            )));
        }
        Ok(())
    }

    /// Squared distance under which a seed counts as converged.
    pub(crate) fn stop_threshold_sq(&self) -> f32 {
        let stop = self.convergence_tolerance * self.bandwidth;
        stop * stop
    }
}

/// Bandwidths and pass settings for both cascade stages.
///
/// The second stage normally uses a larger bandwidth to merge rather than over-split.
#[derive(Clone, Debug)]
pub struct CascadeConfig {
    pub first: Config,
    pub second: Config,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            first: Config::with_bandwidth(15.0),
            second: Config::with_bandwidth(25.0),
        }
    }
}

impl CascadeConfig {
    pub fn validate(&self) -> Result<()> {
        self.first.validate()?;
        self.second.validate()
    }
}

pub(crate) fn split_length_to_ranges(length: usize, splits: usize) -> Vec<Range<usize>> {
    let splits = splits.max(1);
    let chunk_size = length / splits;
    let rem = length % splits;
    (0..splits)
        .scan((rem, 0usize), |(r, acc), _split| {
            let mut size = chunk_size;
            if *r > 0 {
                *r -= 1;
                size += 1;
            }
            let out = (*acc, *acc + size);
            *acc += size;
            Some(out.0..out.1)
        })
        .filter(|range| !range.is_empty())
        .collect()
}
