//! Mean-shift color zoning in Rust.
//!
//! This crate partitions raster images into color regions with a two-stage cascade of mean-shift
//! clustering. The first stage clusters all pixels of an image, the second stage clusters every
//! first-stage region again on its own. Clustering looks at color only (8-bit L*u*v*), pixel
//! position plays no role.
//!
//! The mean-shift engine is implemented here from scratch: bin seeding, flat-kernel mode seeking
//! on a k-d tree, merging of converged seeds closer than the bandwidth and nearest-mode labeling.
//! All of its parameters are fixed in [`common::Config`].
//!
//! The following example clusters a single image and writes both stages into a directory:
//!
//! ```no_run
//! use meanshift_zoning::cascade::{Cascade, LogReporter};
//! use meanshift_zoning::common::CascadeConfig;
//! use meanshift_zoning::io::{DirectorySink, OutputFormat};
//! use std::path::Path;
//!
//! fn main() {
//!     // where the regions go: out/cluster1/<image>/..., out/cluster2/<image>/...
//!     let sink = DirectorySink::new("out", OutputFormat::Png);
//!     // bandwidth 15 for the first stage, 25 for the second
//!     let config = CascadeConfig::default();
//!     let cascade = Cascade::new(config, &sink, &LogReporter);
//!     let report = cascade.process_image(Path::new("photo.jpg")).unwrap();
//!     println!("{} first-stage regions", report.first_stage.len());
//! }
//! ```
//!
//! The engine can also be used without the cascade, see [`segment::cluster`] for point sets and
//! [`segment::segment_image`] for images.
//!
//! Second-stage images are the first-stage regions with everything else zeroed. The zeroed
//! background is a valid color, so the second stage normally reports one extra background
//! region per first-stage region.

pub mod arrays;
pub mod batch;
pub mod cascade;
pub mod cluster;
pub mod common;
pub mod error;
pub mod io;
pub mod kdtree;
pub mod label;
pub mod luv;
pub mod mean_shift;
pub mod merge;
pub mod points;
pub mod region;
pub mod seeds;
pub mod segment;

pub use error::{Error, Result};
