//! BorderBatch CLI - Concurrent Bordered Image Batches
//!
//! Borders every JPEG/PNG in a folder onto a fixed-size white canvas using
//! a pool of workers, then prints per-image lines and a run summary.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, CommandFactory, Parser};
use console::style;
use tracing::{debug, error};

use borderbatch::{init_logging, process_folder, BorderbatchError, Config, ConfigOverrides, ReportMode, Summary};

/// BorderBatch - Concurrent Bordered Image Batches
#[derive(Parser)]
#[command(
    name = "borderbatch",
    version,
    about = "Scale a folder of images onto bordered, fixed-size white canvases",
    long_about = "BorderBatch scales every JPEG and PNG in a folder onto a white canvas of a \
                  fixed size, keeping each image's aspect ratio and reserving a border whose \
                  proportions depend on whether the image is landscape or portrait. Images are \
                  grouped into batches and processed concurrently by a pool of workers."
)]
struct Cli {
    /// Folder containing the images to border
    #[arg(value_name = "FOLDER")]
    folder: Option<PathBuf>,

    /// Folder containing the images to border (alternative to the positional argument)
    #[arg(short, long, value_name = "FOLDER", conflicts_with = "folder")]
    input: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long, value_name = "PIXELS")]
    width: Option<u32>,

    /// Canvas height in pixels
    #[arg(long, value_name = "PIXELS")]
    height: Option<u32>,

    /// Vertical border ratio for landscape images
    #[arg(long, value_name = "RATIO")]
    landscape_vert: Option<f64>,

    /// Horizontal border ratio for landscape images
    #[arg(long, value_name = "RATIO")]
    landscape_horiz: Option<f64>,

    /// Vertical border ratio for portrait and square images
    #[arg(long, value_name = "RATIO")]
    portrait_vert: Option<f64>,

    /// Horizontal border ratio for portrait and square images
    #[arg(long, value_name = "RATIO")]
    portrait_horiz: Option<f64>,

    /// Images per batch
    #[arg(long, value_name = "COUNT")]
    batch_size: Option<usize>,

    /// Maximum number of concurrent workers
    #[arg(long, value_name = "COUNT")]
    workers: Option<usize>,

    /// JPEG output quality (1-100)
    #[arg(long, value_name = "QUALITY")]
    jpeg_quality: Option<u8>,

    /// Prefix prepended to every output file name
    #[arg(long, value_name = "PREFIX")]
    prefix: Option<String>,

    /// Write results into a `bordered_images` subfolder instead of next to the inputs
    #[arg(long, value_name = "BOOL", action = ArgAction::Set, value_parser = clap::value_parser!(bool))]
    separate_folder: Option<bool>,

    /// Configuration file (.toml or .yaml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the effective configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    dump_config: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (summary only)
    #[arg(short = 'Q', long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn input_folder(&self) -> Option<&Path> {
        self.folder.as_deref().or(self.input.as_deref())
    }

    fn overrides(&self) -> ConfigOverrides {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        ConfigOverrides {
            target_width: self.width,
            target_height: self.height,
            landscape_vertical: self.landscape_vert,
            landscape_horizontal: self.landscape_horiz,
            portrait_vertical: self.portrait_vert,
            portrait_horizontal: self.portrait_horiz,
            batch_size: self.batch_size,
            workers: self.workers,
            jpeg_quality: self.jpeg_quality,
            output_prefix: self.prefix.clone(),
            separate_folder: self.separate_folder,
            log_level,
        }
    }

    fn report_mode(&self) -> ReportMode {
        if self.quiet || self.json {
            ReportMode::Silent
        } else {
            ReportMode::Interactive
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => {}
        Err(e) => {
            eprintln!("{}: {:#}", style("Error").red().bold(), e);
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = cli.overrides();
    let base = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    let config = base.with_overrides(&overrides);

    init_logging(&config.logging);
    debug!("Effective configuration: {:?}", config);

    if let Some(path) = &cli.dump_config {
        config.validate().map_err(fatal)?;
        config.to_file(path).map_err(fatal)?;
        if !cli.quiet {
            ignore_broken_pipe(writeln!(
                io::stdout().lock(),
                "{} Configuration written to {}",
                style("✓").green(),
                path.display()
            ))?;
        }
        return Ok(());
    }

    let input = match cli.input_folder() {
        Some(input) => input.to_path_buf(),
        None => {
            eprintln!("{}: An input folder is required", style("Error").red().bold());
            eprintln!();
            // Help output failing to print is not worth reporting
            let _ = Cli::command().print_help();
            process::exit(1);
        }
    };

    config.validate().map_err(fatal)?;

    let verbose_output = !cli.quiet && !cli.json;
    if verbose_output {
        let defaults_only = cli.config.is_none() && overrides.is_empty();
        ignore_broken_pipe(print_config_banner(&mut io::stdout().lock(), &config, defaults_only))?;
    }

    let start = Instant::now();
    let summary = process_folder(&input, config, cli.report_mode())
        .await
        .map_err(fatal)?;
    let wall_time = start.elapsed();

    let mut out = io::stdout().lock();
    let printed = if cli.json {
        print_json_summary(&mut out, &summary, wall_time)
    } else {
        print_summary(&mut out, &summary, wall_time)
    };
    ignore_broken_pipe(printed)?;

    Ok(())
}

/// Log a fatal library error and turn it into the operator-facing message
fn fatal(e: BorderbatchError) -> anyhow::Error {
    error!("Run aborted: {}", e);
    anyhow::anyhow!(e.user_message())
}

/// A reader that hung up on stdout does not change the outcome of the run
fn ignore_broken_pipe(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("stdout closed: {}", e);
            Ok(())
        }
        other => other,
    }
}

fn print_config_banner(out: &mut impl Write, config: &Config, defaults_only: bool) -> io::Result<()> {
    if defaults_only {
        writeln!(out, "{}", style("Using default configuration (no flags provided)").dim())?;
    }
    writeln!(out, "{}", style("Processing with configuration:").bold())?;
    writeln!(out, "  Canvas:            {}x{}", config.target_width, config.target_height)?;
    writeln!(
        out,
        "  Landscape borders: vertical {:.3}, horizontal {:.3}",
        config.landscape.vertical, config.landscape.horizontal
    )?;
    writeln!(
        out,
        "  Portrait borders:  vertical {:.3}, horizontal {:.3}",
        config.portrait.vertical, config.portrait.horizontal
    )?;
    writeln!(out, "  Batch size:        {}", config.batch_size)?;
    writeln!(out, "  Workers:           {}", config.workers)?;
    writeln!(out, "  JPEG quality:      {}", config.jpeg_quality)?;
    writeln!(out, "  Output prefix:     {}", config.output_prefix)?;
    writeln!(out, "  Separate folder:   {}", config.separate_folder)?;
    writeln!(out)
}

fn print_summary(out: &mut impl Write, summary: &Summary, wall_time: Duration) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Total execution time: {:.2} seconds", wall_time.as_secs_f64())?;
    writeln!(out)?;
    writeln!(out, "{}", style("Processing Summary").bold().underlined())?;
    writeln!(out, "  Total images processed: {}", style(summary.total_images).green())?;
    if summary.failed_images > 0 {
        writeln!(out, "  Failed images:          {}", style(summary.failed_images).red())?;
        for failure in &summary.failures {
            writeln!(out, "    {} {}: {}", style("✗").red(), failure.filename, failure.message)?;
        }
    }
    writeln!(out, "  Total processing time:  {:.2} seconds", summary.total_duration.as_secs_f64())?;

    if let Some(average) = summary.average_duration {
        writeln!(out, "  Average time per image: {:.2} seconds", average.as_secs_f64())?;
    }
    if let Some(fastest) = &summary.fastest {
        writeln!(
            out,
            "  Fastest image:          {} ({:.2} seconds)",
            fastest.filename,
            fastest.duration.as_secs_f64()
        )?;
    }
    if let Some(slowest) = &summary.slowest {
        writeln!(
            out,
            "  Slowest image:          {} ({:.2} seconds)",
            slowest.filename,
            slowest.duration.as_secs_f64()
        )?;
    }

    if !summary.batches.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", style("Batch Statistics").bold())?;
        for batch in &summary.batches {
            writeln!(
                out,
                "  📦 Batch {} (worker {}): {}/{} successful, took {:.2} seconds",
                batch.batch_id,
                batch.worker_id,
                batch.succeeded,
                batch.total,
                batch.elapsed.as_secs_f64()
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "  Throughput: {:.2} images/second", summary.throughput(wall_time))
}

fn print_json_summary(out: &mut impl Write, summary: &Summary, wall_time: Duration) -> io::Result<()> {
    let report = serde_json::json!({
        "summary": summary,
        "wall_time": wall_time.as_secs_f64(),
        "throughput": summary.throughput(wall_time),
    });
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)
}
