use crate::arrays::{Array2D, SourceImage};
use crate::error::{Error, Result};
use crate::segment::Segmentation;
use rayon::prelude::*;
use std::fmt::{Display, Formatter};

/// Cascade stage a region was produced by.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Stage {
    First,
    Second,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::First => "first",
            Stage::Second => "second",
        }
    }

    /// Output subdirectory of the stage.
    pub fn directory(&self) -> &'static str {
        match self {
            Stage::First => "cluster1",
            Stage::Second => "cluster2",
        }
    }
}

/// Identity of one region within its own stage.
#[derive(Clone, PartialEq, Debug)]
pub struct RegionId {
    /// Source image name without extension
    pub image: String,
    pub stage: Stage,
    pub bandwidth: f32,
    /// Mode id the region's pixels are labeled with
    pub label: u32,
}

impl Display for RegionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_bandwidth{}_label{}",
            self.image,
            self.stage.as_str(),
            self.bandwidth,
            self.label
        )
    }
}

/// One cluster of a segmentation, materialized.
#[derive(Clone, Debug)]
pub struct Region {
    pub id: RegionId,
    /// The first-stage region this one was carved out of, `None` in the first stage.
    pub parent: Option<RegionId>,
    /// `true` where the pixel carries `id.label`
    pub mask: Array2D<bool>,
    /// Source image with everything outside `mask` zeroed, same dimensions as the source.
    pub image: SourceImage,
}

impl Region {
    /// Stable file stem. Second-stage stems end with the parent stem so siblings of different
    /// parents never collide.
    pub fn file_stem(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}_{}", self.id, parent),
            None => self.id.to_string(),
        }
    }

    pub fn num_pixels(&self) -> usize {
        self.mask.count()
    }
}

/// Builds one region per label present in `segmentation`.
///
/// Masks of all regions together cover every pixel exactly once. The background of each masked
/// image is zero, which is itself a valid feature value: clustering it again usually finds an
/// extra background mode.
pub fn extract_regions(
    source: &SourceImage,
    segmentation: &Segmentation,
    image_name: &str,
    stage: Stage,
    bandwidth: f32,
    parent: Option<&RegionId>,
) -> Result<Vec<Region>> {
    let labels = &segmentation.labels;
    if labels.width != source.width() || labels.height != source.height() {
        return Err(Error::DimensionMismatch {
            expected: source.width() * source.height(),
            actual: labels.len(),
        });
    }
    let present: Vec<u32> = segmentation.present_labels().collect();
    present
        .into_par_iter()
        .map(|label| {
            let mut mask = Array2D::from_fill(false, labels.width, labels.height);
            for (m, l) in mask.data.iter_mut().zip(labels.as_slice()) {
                *m = *l == label;
            }
            let image = source.masked(&mask)?;
            Ok(Region {
                id: RegionId {
                    image: image_name.to_string(),
                    stage,
                    bandwidth,
                    label,
                },
                parent: parent.cloned(),
                mask,
                image,
            })
        })
        .collect()
}
