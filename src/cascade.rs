use crate::arrays::SourceImage;
use crate::common::CascadeConfig;
use crate::error::{Error, Result};
use crate::io::{image_name, load_image, RegionSink};
use crate::region::{extract_regions, Region, RegionId, Stage};
use crate::segment::{segment_image, ClusteringStats};
use rayon::prelude::*;
use std::path::Path;
use std::time::{Duration, Instant};

/// A second-stage branch which failed. Its first-stage region is already written.
#[derive(Debug)]
pub struct RegionFailure {
    pub region: RegionId,
    pub error: Error,
}

/// Outcome of the cascade for one image.
#[derive(Debug)]
pub struct ImageReport {
    pub image: String,
    /// File stems of the first-stage regions, in label order.
    pub first_stage: Vec<String>,
    /// Counters of the whole-image clustering run.
    pub first_stage_stats: ClusteringStats,
    /// Number of second-stage regions written, over all branches.
    pub second_stage_regions: usize,
    pub failed_regions: Vec<RegionFailure>,
    pub elapsed: Duration,
}

/// Receives image-level outcomes of the cascade.
pub trait Reporter: Sync {
    fn image_processed(&self, report: &ImageReport);
    fn image_failed(&self, image: &str, error: &Error);
}

/// Reports through the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn image_processed(&self, report: &ImageReport) {
        for failure in &report.failed_regions {
            log::warn!(
                "Second pass failed for region '{}' of image '{}': {}",
                failure.region,
                report.image,
                failure.error
            );
        }
        let stats = &report.first_stage_stats;
        log::debug!(
            "'{}': first pass over {} pixels ({} distinct colors) used {} seeds, {} unconverged",
            report.image,
            stats.num_points,
            stats.num_unique_points,
            stats.num_seeds,
            stats.num_unconverged
        );
        log::info!(
            "Processed image '{}' in {:.4} seconds ({} first-stage, {} second-stage regions)",
            report.image,
            report.elapsed.as_secs_f64(),
            report.first_stage.len(),
            report.second_stage_regions
        );
    }

    fn image_failed(&self, image: &str, error: &Error) {
        log::error!("Error processing image '{image}': {error}");
    }
}

/// Two fixed stages of mean-shift zoning.
///
/// Stage 1 clusters the whole image with `config.first`. Stage 2 clusters every stage-1 region
/// on its own with `config.second`. Stage-2 branches are independent: a failing branch is
/// recorded in the report and its siblings carry on.
pub struct Cascade<'a, S: RegionSink, R: Reporter> {
    pub config: CascadeConfig,
    pub sink: &'a S,
    pub reporter: &'a R,
}

impl<'a, S: RegionSink, R: Reporter> Cascade<'a, S, R> {
    pub fn new(config: CascadeConfig, sink: &'a S, reporter: &'a R) -> Self {
        Self {
            config,
            sink,
            reporter,
        }
    }

    /// Decodes and processes one image file, reporting the outcome either way.
    pub fn process_image(&self, path: &Path) -> Result<ImageReport> {
        let name = image_name(path);
        let result = load_image(path).and_then(|source| self.run(&name, &source));
        match &result {
            Ok(report) => self.reporter.image_processed(report),
            Err(error) => self.reporter.image_failed(&name, error),
        }
        result
    }

    /// Runs both stages on an already decoded image. Does not report.
    pub fn run(&self, name: &str, source: &SourceImage) -> Result<ImageReport> {
        let start_time = Instant::now();
        let (first_regions, first_stage_stats) = self.first_stage(name, source)?;
        let branches: Vec<(RegionId, Result<usize>)> = first_regions
            .par_iter()
            .map(|region| (region.id.clone(), self.second_stage(region)))
            .collect();

        let mut second_stage_regions = 0;
        let mut failed_regions = Vec::new();
        for (region, result) in branches {
            match result {
                Ok(count) => second_stage_regions += count,
                Err(error) => failed_regions.push(RegionFailure { region, error }),
            }
        }
        Ok(ImageReport {
            image: name.to_string(),
            first_stage: first_regions.iter().map(Region::file_stem).collect(),
            first_stage_stats,
            second_stage_regions,
            failed_regions,
            elapsed: start_time.elapsed(),
        })
    }

    fn first_stage(
        &self,
        name: &str,
        source: &SourceImage,
    ) -> Result<(Vec<Region>, ClusteringStats)> {
        let config = &self.config.first;
        let segmentation = segment_image(&source.features, config)?;
        let regions =
            extract_regions(source, &segmentation, name, Stage::First, config.bandwidth, None)?;
        for region in &regions {
            self.sink.write(region)?;
        }
        Ok((regions, segmentation.stats))
    }

    /// Re-clusters the masked image of one first-stage region. Returns the number of regions
    /// written.
    fn second_stage(&self, parent: &Region) -> Result<usize> {
        let config = &self.config.second;
        let segmentation = segment_image(&parent.image.features, config)?;
        let regions = extract_regions(
            &parent.image,
            &segmentation,
            &parent.id.image,
            Stage::Second,
            config.bandwidth,
            Some(&parent.id),
        )?;
        for region in &regions {
            self.sink.write(region)?;
        }
        Ok(regions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::sync::Mutex;

    /// Keeps regions in memory, optionally failing for some second-stage parents.
    #[derive(Default)]
    struct MemorySink {
        written: Mutex<Vec<(String, usize)>>,
        fail_parent_label: Option<u32>,
    }

    impl RegionSink for MemorySink {
        fn write(&self, region: &Region) -> Result<()> {
            if let (Some(label), Some(parent)) = (self.fail_parent_label, &region.parent) {
                if parent.label == label {
                    return Err(Error::InvalidConfig("refused".to_string()));
                }
            }
            self.written
                .lock()
                .unwrap()
                .push((region.file_stem(), region.num_pixels()));
            Ok(())
        }
    }

    struct SilentReporter;
    impl Reporter for SilentReporter {
        fn image_processed(&self, _report: &ImageReport) {}
        fn image_failed(&self, _image: &str, _error: &Error) {}
    }

    fn two_halves() -> SourceImage {
        let colors = RgbImage::from_fn(10, 4, |x, _| {
            if x < 4 {
                Rgb([240, 200, 20])
            } else {
                Rgb([30, 60, 200])
            }
        });
        SourceImage::from_rgb(colors).unwrap()
    }

    #[test]
    fn second_stage_finds_region_and_background() {
        let sink = MemorySink::default();
        let cascade = Cascade::new(CascadeConfig::default(), &sink, &SilentReporter);
        let report = cascade.run("halves", &two_halves()).unwrap();
        assert_eq!(report.first_stage.len(), 2);
        assert_eq!(report.first_stage_stats.num_points, 40);
        assert_eq!(report.first_stage_stats.num_unique_points, 2);
        assert!(report.failed_regions.is_empty());
        // each masked half re-clusters into itself plus the zeroed background
        assert_eq!(report.second_stage_regions, 4);
        let written = sink.written.lock().unwrap();
        assert_eq!(written.len(), 6);
        let first_pixels: usize = written
            .iter()
            .filter(|(stem, _)| stem.starts_with("halves_first"))
            .map(|(_, n)| n)
            .sum();
        assert_eq!(first_pixels, 40);
    }

    #[test]
    fn failing_branch_does_not_stop_siblings() {
        let sink = MemorySink {
            fail_parent_label: Some(0),
            ..MemorySink::default()
        };
        let cascade = Cascade::new(CascadeConfig::default(), &sink, &SilentReporter);
        let report = cascade.run("halves", &two_halves()).unwrap();
        assert_eq!(report.failed_regions.len(), 1);
        assert_eq!(report.failed_regions[0].region.label, 0);
        assert_eq!(report.second_stage_regions, 2);
        let written = sink.written.lock().unwrap();
        // both first-stage regions stay written
        assert_eq!(
            written
                .iter()
                .filter(|(stem, _)| stem.starts_with("halves_first"))
                .count(),
            2
        );
    }

    #[test]
    fn invalid_config_fails_the_image() {
        let sink = MemorySink::default();
        let mut config = CascadeConfig::default();
        config.first.bandwidth = 0.0;
        let cascade = Cascade::new(config, &sink, &SilentReporter);
        assert!(matches!(
            cascade.run("halves", &two_halves()),
            Err(Error::InvalidBandwidth(_))
        ));
        assert!(sink.written.lock().unwrap().is_empty());
    }
}
