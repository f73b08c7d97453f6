use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use flexi_logger::{Duplicate, FileSpec, Logger, LoggerHandle};
use meanshift_zoning::batch::process_directory;
use meanshift_zoning::cascade::{Cascade, LogReporter};
use meanshift_zoning::common::{CascadeConfig, Config, ThreadingStrategy};
use meanshift_zoning::io::{DirectorySink, OutputFormat};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Png,
    Jpg,
}

/// Two-stage mean-shift color zoning of every image in a directory
#[derive(Parser)]
#[command(name = "meanshift-zoning", version)]
struct Cli {
    /// Directory with .jpg/.jpeg/.png images
    input_dir: PathBuf,
    /// Output root; regions go to cluster1/<image>/ and cluster2/<image>/
    output_dir: PathBuf,
    /// Bandwidth of the whole-image pass
    #[arg(long, default_value_t = 15.0)]
    first_bandwidth: f32,
    /// Bandwidth of the per-region pass
    #[arg(long, default_value_t = 25.0)]
    second_bandwidth: f32,
    /// Iteration cap per seed
    #[arg(long, default_value_t = 300)]
    max_iterations: u16,
    /// Minimal number of points in a seeding bin
    #[arg(long, default_value_t = 1)]
    min_bin_freq: u32,
    #[arg(long, value_enum, default_value_t = Format::Png)]
    format: Format,
    /// Converge seeds on the calling thread only
    #[arg(long)]
    single_thread: bool,
    /// Log specification, e.g. "info" or "meanshift_zoning=debug"
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

impl Cli {
    fn pass_config(&self, bandwidth: f32) -> Config {
        Config {
            bandwidth,
            max_iterations: self.max_iterations,
            min_bin_freq: self.min_bin_freq,
            threading_strategy: if self.single_thread {
                ThreadingStrategy::SingleThread
            } else {
                ThreadingStrategy::Parallel
            },
            ..Config::default()
        }
    }
}

fn setup_logging(spec: &str, directory: &Path) -> Result<LoggerHandle> {
    Logger::try_with_str(spec)
        .context("invalid log specification")?
        .log_to_file(
            FileSpec::default()
                .directory(directory)
                .basename("meanshift_zoning"),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .rotate(
            flexi_logger::Criterion::Size(1024 * 1024),
            flexi_logger::Naming::Timestamps,
            flexi_logger::Cleanup::KeepLogFiles(5),
        )
        .start()
        .context("logger initialization failed")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = setup_logging(&cli.log_level, &cli.log_dir)?;

    let config = CascadeConfig {
        first: cli.pass_config(cli.first_bandwidth),
        second: cli.pass_config(cli.second_bandwidth),
    };
    config.validate().context("invalid settings")?;

    let format = match cli.format {
        Format::Png => OutputFormat::Png,
        Format::Jpg => OutputFormat::Jpeg,
    };
    let sink = DirectorySink::new(&cli.output_dir, format);
    let cascade = Cascade::new(config, &sink, &LogReporter);
    let summary = process_directory(&cascade, &cli.input_dir)
        .with_context(|| format!("batch over {} failed", cli.input_dir.display()))?;
    log::info!(
        "Batch done: {} processed, {} failed",
        summary.processed.len(),
        summary.failed.len()
    );
    Ok(())
}
