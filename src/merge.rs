use crate::cluster::Mode;
use crate::mean_shift::ConvergedSeed;
use crate::points::distance_sq;

/// Collapses converged seeds closer than `threshold` into unique modes.
///
/// Seeds are visited in input order. A seed joins the first existing mode within `threshold`,
/// otherwise it opens a new mode with the next id. Ids are therefore stable for a fixed seed
/// order but not a canonical numbering: reordering the seeds can renumber the modes.
///
/// Needs every seed converged first, it must not overlap with `seek_modes()` of the same run.
pub fn merge_modes(converged: &[ConvergedSeed], threshold: f32) -> Vec<Mode> {
    let threshold_sq = threshold * threshold;
    let mut modes: Vec<Mode> = Vec::new();
    for seed in converged {
        match modes
            .iter_mut()
            .find(|mode| distance_sq(&mode.position, &seed.position) < threshold_sq)
        {
            Some(mode) => {
                mode.num_seeds += 1;
                mode.intensity = mode.intensity.max(seed.intensity);
            }
            None => {
                let id = modes.len() as u32;
                modes.push(Mode::new(id, seed.position, seed.intensity));
            }
        }
    }
    modes
}
