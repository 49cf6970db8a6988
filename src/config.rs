//! Configuration management for stack-export.
//!
//! This module provides the command-line interface:
//! - Subcommands for inspecting, exporting and importing stacks
//! - Environment variables with `STACK_EXPORT_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Environment Variables
//!
//! - `STACK_EXPORT_RANGE_MODE` - How the intensity range is chosen (default: compute)
//! - `STACK_EXPORT_MIN` / `STACK_EXPORT_MAX` - Explicit range bounds
//! - `STACK_EXPORT_CACHE_BYTES` - Plane cache capacity in bytes (default: 256MB)
//! - `STACK_EXPORT_COMPRESSION` - PNG compression effort (default: default)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::convert::RangeMode;
use crate::export::{ExportOptions, PngCompression};
use crate::stack::DEFAULT_PLANE_CACHE_CAPACITY;

// =============================================================================
// CLI Arguments
// =============================================================================

/// stack-export - convert image stacks to 16-bit datasets.
///
/// Reads a raw multi-timepoint, multi-channel stack described by a JSON
/// descriptor, rescales every view to unsigned 16-bit with one global
/// intensity range, and writes the result as PNG planes.
#[derive(Parser, Debug, Clone)]
#[command(name = "stack-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the layout of a stack
    Info(InfoConfig),

    /// Convert every view of a stack and write it to a dataset directory
    Export(ExportConfig),

    /// Read one view back from an exported dataset
    Import(ImportConfig),
}

/// How the export chooses its intensity range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RangeModeArg {
    /// Use --min and --max
    Explicit,
    /// Scan every view for the global min and max
    Compute,
    /// Use the display range from the descriptor
    Display,
}

// =============================================================================
// Info
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct InfoConfig {
    /// Path to the stack descriptor (JSON).
    pub descriptor: PathBuf,

    /// Also scan every view for the global intensity range.
    #[arg(long, default_value_t = false)]
    pub compute_range: bool,
}

// =============================================================================
// Export
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ExportConfig {
    /// Path to the stack descriptor (JSON).
    pub descriptor: PathBuf,

    /// Output dataset directory.
    pub output: PathBuf,

    /// How to determine the intensity range.
    #[arg(
        long,
        value_enum,
        default_value_t = RangeModeArg::Compute,
        env = "STACK_EXPORT_RANGE_MODE"
    )]
    pub range_mode: RangeModeArg,

    /// Lower bound for --range-mode explicit.
    #[arg(long, allow_hyphen_values = true, env = "STACK_EXPORT_MIN")]
    pub min: Option<f64>,

    /// Upper bound for --range-mode explicit.
    #[arg(long, allow_hyphen_values = true, env = "STACK_EXPORT_MAX")]
    pub max: Option<f64>,

    /// Plane cache capacity in bytes.
    #[arg(long, default_value_t = DEFAULT_PLANE_CACHE_CAPACITY, env = "STACK_EXPORT_CACHE_BYTES")]
    pub cache_bytes: usize,

    /// PNG compression effort.
    #[arg(
        long,
        value_enum,
        default_value_t = PngCompression::Default,
        env = "STACK_EXPORT_COMPRESSION"
    )]
    pub compression: PngCompression,

    /// Replace an existing dataset in the output directory.
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

impl ExportConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        match self.range_mode {
            RangeModeArg::Explicit => {
                let (Some(min), Some(max)) = (self.min, self.max) else {
                    return Err("--range-mode explicit requires both --min and --max".to_string());
                };
                if !min.is_finite() || !max.is_finite() {
                    return Err("--min and --max must be finite".to_string());
                }
                if min > max {
                    return Err(format!("--min {} is greater than --max {}", min, max));
                }
            }
            RangeModeArg::Compute | RangeModeArg::Display => {
                if self.min.is_some() || self.max.is_some() {
                    return Err(
                        "--min and --max are only used with --range-mode explicit".to_string()
                    );
                }
            }
        }

        if self.cache_bytes == 0 {
            return Err("cache_bytes must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Range mode for the adapter (call validate() first).
    pub fn range_mode(&self) -> RangeMode {
        match self.range_mode {
            RangeModeArg::Explicit => RangeMode::Explicit {
                min: self.min.unwrap_or(0.0),
                max: self.max.unwrap_or(0.0),
            },
            RangeModeArg::Compute => RangeMode::ComputeGlobal,
            RangeModeArg::Display => RangeMode::TakeFromSourceDisplayRange,
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            overwrite: self.overwrite,
            compression: self.compression,
        }
    }
}

// =============================================================================
// Import
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ImportConfig {
    /// Exported dataset directory.
    pub dataset: PathBuf,

    /// Timepoint index; clamped to the dataset.
    #[arg(short, long, default_value_t = 0)]
    pub timepoint: usize,

    /// Channel index; clamped to the dataset.
    #[arg(short, long, default_value_t = 0)]
    pub channel: usize,
}

// =============================================================================
// Tests
// =============================================================================
