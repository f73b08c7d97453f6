//! Image source and output sink.
//!
//! - `load_image`: decode a PNG/JPEG/etc. into a [`SourceImage`].
//! - `RegionSink`: where extracted regions go. `DirectorySink` writes them as image files.

use crate::arrays::SourceImage;
use crate::error::{Error, Result};
use crate::region::Region;
use image::{ImageFormat, ImageReader};
use std::fs;
use std::path::{Path, PathBuf};

/// Decode an image from disk into original colors plus L*u*v* features.
///
/// The format is guessed from the file contents, the extension is only a fallback. A file which
/// cannot be opened is [`Error::Io`], anything else is [`Error::Decode`].
pub fn load_image(path: &Path) -> Result<SourceImage> {
    let colors = ImageReader::open(path)
        .map_err(|e| Error::io(path, e))?
        .with_guessed_format()
        .map_err(|e| Error::io(path, e))?
        .decode()
        .map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .into_rgb8();
    SourceImage::from_rgb(colors)
}

/// File name of `path` without its extension.
pub fn image_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    /// Lossy. Re-reading the output does not give back the exact region colors.
    Jpeg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// Consumer of extracted regions. Shared between parallel second-stage branches.
pub trait RegionSink: Sync {
    /// Called once before a batch starts.
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    fn write(&self, region: &Region) -> Result<()>;
}

/// Writes `<root>/cluster1/<image>/<stem>.<ext>` and `<root>/cluster2/<image>/<stem>.<ext>`.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    pub root: PathBuf,
    pub format: OutputFormat,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    pub fn path_for(&self, region: &Region) -> PathBuf {
        self.root
            .join(region.id.stage.directory())
            .join(&region.id.image)
            .join(format!("{}.{}", region.file_stem(), self.format.extension()))
    }
}

impl RegionSink for DirectorySink {
    /// Creates the output root.
    fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| Error::io(&self.root, e))
    }

    fn write(&self, region: &Region) -> Result<()> {
        let path = self.path_for(region);
        ensure_parent_dir(&path)?;
        region
            .image
            .colors
            .save_with_format(&path, self.format.image_format())
            .map_err(|source| Error::Encode {
                path: path.clone(),
                source,
            })?;
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }
    Ok(())
}
