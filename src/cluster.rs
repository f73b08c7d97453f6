use crate::points::FeaturePoint;

/// Discovered cluster center.
///
/// `position` is fixed once the mode is created by `merge::merge_modes()`. `num_members` is
/// filled by `label::assign_labels()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mode {
    /// Id in discovery order, also the label value of its points.
    pub id: u32,
    /// L, u, v of the center
    pub position: FeaturePoint,
    /// Number of converged seeds merged into this mode
    pub num_seeds: u32,
    /// Highest ball weight among the merged seeds
    pub intensity: u64,
    /// Number of points labeled with this mode
    pub num_members: u32,
}

impl Mode {
    pub(crate) fn new(id: u32, position: FeaturePoint, intensity: u64) -> Self {
        Self {
            id,
            position,
            num_seeds: 1,
            intensity,
            num_members: 0,
        }
    }
}
