use crate::cascade::{Cascade, Reporter};
use crate::error::{Error, Result};
use crate::io::RegionSink;
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Counts of one batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: Vec<String>,
    pub failed: Vec<String>,
}

/// Image files directly inside `dir`, sorted by file name. Extension match is case-insensitive.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false);
        if is_image && path.is_file() {
            images.push(path);
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// Runs the cascade for every image of `input_dir`.
///
/// The sink is prepared (the output directory created) before the first image. A failing image
/// is reported and skipped. Only an unreadable input directory or an unusable sink stops the
/// batch.
pub fn process_directory<S: RegionSink, R: Reporter>(
    cascade: &Cascade<'_, S, R>,
    input_dir: &Path,
) -> Result<BatchSummary> {
    let images = collect_images(input_dir)?;
    cascade.sink.prepare()?;
    log::info!("Found {} images in {}", images.len(), input_dir.display());
    let mut summary = BatchSummary::default();
    for path in images {
        let name = crate::io::image_name(&path);
        match cascade.process_image(&path) {
            Ok(_) => summary.processed.push(name),
            Err(_) => summary.failed.push(name),
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::LogReporter;
    use crate::common::CascadeConfig;
    use crate::io::{DirectorySink, OutputFormat};

    #[test]
    fn collects_only_images_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "c.jpeg", "notes.txt", "d.gif"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();
        let names: Vec<String> = collect_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG", "c.jpeg"]);
    }

    #[test]
    fn output_root_is_created_before_processing() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let root = output.path().join("zones").join("run1");
        let sink = DirectorySink::new(&root, OutputFormat::Png);
        let cascade = Cascade::new(CascadeConfig::default(), &sink, &LogReporter);
        let summary = process_directory(&cascade, input.path()).unwrap();
        assert_eq!(summary, BatchSummary::default());
        assert!(root.is_dir());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            collect_images(&dir.path().join("nope")),
            Err(Error::Io { .. })
        ));
    }
}
