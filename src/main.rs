//! stack-export - convert image stacks to 16-bit datasets.
//!
//! This binary parses the command line, sets up logging and runs one
//! subcommand.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stack_export::{
    config::{Cli, Command, ExportConfig, ImportConfig, InfoConfig},
    convert::{ImageConversionAdapter, IntensityRange, RangeMode},
    export::{ExportedDataset, StackExporter},
    stack::{ImageStack, PlaneCache, RawStack},
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Info(config) => run_info(config),
        Command::Export(config) => run_export(config),
        Command::Import(config) => run_import(config),
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "stack_export=debug"
    } else {
        "stack_export=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// =============================================================================
// Info Command
// =============================================================================

fn run_info(config: InfoConfig) -> ExitCode {
    let stack = match RawStack::open(&config.descriptor) {
        Ok(stack) => stack,
        Err(e) => {
            error!("Failed to open {}: {}", config.descriptor.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let (display_min, display_max) = stack.display_range();
    println!("Stack: {}", stack.identifier());
    println!("  Data file: {}", stack.source_identifier());
    println!(
        "  Size: {} x {} x {} ({} channel(s), {} timepoint(s))",
        stack.width(),
        stack.height(),
        stack.depth(),
        stack.num_channels(),
        stack.num_timepoints()
    );
    println!("  Sample type: {}", stack.sample_type());
    println!("  Byte order: {:?}", stack.byte_order());
    println!("  Display range: [{}, {}]", display_min, display_max);
    if let Some(voxel) = stack.voxel_size() {
        println!(
            "  Voxel size: {} x {} x {} {}",
            voxel.x, voxel.y, voxel.z, voxel.unit
        );
    }

    if config.compute_range {
        match ImageConversionAdapter::from_stack(stack, RangeMode::ComputeGlobal) {
            Ok(adapter) => {
                let IntensityRange { min, max } = adapter.intensity_range();
                println!("  Global range: [{}, {}]", min, max);
            }
            Err(e) => {
                error!("Failed to compute intensity range: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Export Command
// =============================================================================

fn run_export(config: ExportConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let stack = match RawStack::open(&config.descriptor) {
        Ok(stack) => stack,
        Err(e) => {
            error!("Failed to open {}: {}", config.descriptor.display(), e);
            return ExitCode::FAILURE;
        }
    };

    info!("Configuration:");
    info!("  Descriptor: {}", config.descriptor.display());
    info!("  Output: {}", config.output.display());
    info!("  Range mode: {}", config.range_mode().name());
    info!("  Plane cache: {}MB", config.cache_bytes / (1024 * 1024));

    let cache = PlaneCache::with_capacity(config.cache_bytes);
    let adapter =
        match ImageConversionAdapter::from_stack_with_cache(stack, config.range_mode(), cache) {
            Ok(adapter) => adapter,
            Err(e) => {
                error!("Failed to prepare conversion: {}", e);
                return ExitCode::FAILURE;
            }
        };

    let exporter = StackExporter::new(config.export_options());
    match exporter.export(&adapter, &config.output) {
        Ok(summary) => {
            info!(
                "Wrote {} view(s), {} plane(s), {:.2} MB to {}",
                summary.views,
                summary.planes,
                summary.bytes_written as f64 / (1024.0 * 1024.0),
                config.output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Export failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Import Command
// =============================================================================

fn run_import(config: ImportConfig) -> ExitCode {
    let dataset = match ExportedDataset::open(&config.dataset) {
        Ok(dataset) => dataset,
        Err(e) => {
            error!("Failed to open {}: {}", config.dataset.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let view = match dataset.read_view(config.timepoint, config.channel) {
        Ok(view) => view,
        Err(e) => {
            error!("Failed to read view: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (depth, height, width) = view.volume.dim();
    let range = IntensityRange::of_samples(view.volume.iter());
    println!("{} {} {}", dataset.manifest().name, view.key.timepoint, view.key.channel);
    println!("  Size: {} x {} x {}", width, height, depth);
    println!("  Values: [{}, {}]", range.min, range.max);
    if let Some(voxel) = &view.voxel_size {
        println!(
            "  Voxel size: {} x {} x {} {}",
            voxel.x, voxel.y, voxel.z, voxel.unit
        );
    }

    ExitCode::SUCCESS
}
