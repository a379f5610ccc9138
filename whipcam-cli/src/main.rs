//! whipcam: write and inspect Whipple camera geometry JSON.
#![allow(clippy::uninlined_format_args)]

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use whipcam_core::{dataset, CameraManifest, Dataset, GeometryDocument, GeometryRecord};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Core(#[from] whipcam_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no camera read out by {0} channels")]
    NoSuchCamera(u32),
}

/// Whipple camera geometry tool.
#[derive(Parser)]
#[command(name = "whipcam")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode raw camera tables into the geometry JSON document
    Convert {
        /// Raw geometry tables (JSON)
        #[arg(short, long)]
        tables: PathBuf,

        /// Camera manifest (JSON); defaults to the five Whipple cameras
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Output file path, or "-" for standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize a geometry JSON document
    Info {
        /// Geometry document (JSON)
        input: PathBuf,

        /// Show the camera read out by this many channels (or pixels)
        #[arg(short, long)]
        channels: Option<u32>,

        /// Print the selected camera record as JSON
        #[arg(long, requires = "channels")]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Convert {
            tables,
            manifest,
            output,
        } => convert(&tables, manifest.as_deref(), output.as_deref()),
        Commands::Info {
            input,
            channels,
            json,
        } => info(&input, channels, json),
    }
}

fn convert(tables: &Path, manifest: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let manifest = match manifest {
        Some(path) => CameraManifest::from_file(path)?,
        None => CameraManifest::whipple(),
    };
    let dataset = dataset::install(Dataset::from_file(tables)?)?;
    let document = dataset.encode(&manifest)?;

    match output {
        Some(path) if path != Path::new("-") => {
            let file = File::create(path)?;
            document.write_json(BufWriter::new(file))?;
            log::info!("wrote {} cameras to {}", document.len(), path.display());
        }
        _ => document.write_json(io::stdout().lock())?,
    }
    Ok(())
}

fn info(input: &Path, channels: Option<u32>, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(input)?;
    let document = GeometryDocument::from_json(&text)?;

    let Some(channels) = channels else {
        println!("File: {}", input.display());
        println!("Cameras: {}", document.len());
        println!(
            "{:<6} | {:<6} | {:<10} | {:<24}",
            "nadc", "npix", "neighbors", "extent (x, y)"
        );
        println!("{:-<56}", "");
        for record in &document {
            print_summary(record);
        }
        return Ok(());
    };

    let record = document
        .camera_for_channels(channels)
        .ok_or(CliError::NoSuchCamera(channels))?;
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        print_summary(record);
    }
    Ok(())
}

fn print_summary(record: &GeometryRecord) {
    let extent = |values: &[f32]| {
        let max = values.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
        format!("{:.3}", max)
    };
    println!(
        "{:<6} | {:<6} | {:<10} | ({}, {})",
        record.nadc,
        record.npix,
        record.neighbor_count(),
        extent(&record.x),
        extent(&record.y)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TABLES: &str = r#"{ "tables": { "TRI": {
        "x": [0.0, 1.0, 0.5], "y": [0.0, 0.0, 0.866], "radius": [0.5, 0.5, 0.5],
        "neighbors": [[1, 2, -1], [0, 2, -1], [0, 1, -1]]
    } } }"#;

    const MANIFEST: &str = r#"{ "header": "triangle", "cameras": [
        { "nadc": 12, "table": "TRI", "npix": 3 },
        { "nadc": 24, "table": "TRI", "npix": 2 }
    ] }"#;

    #[test]
    fn test_convert_then_info() {
        let dir = tempdir().unwrap();
        let tables = dir.path().join("tables.json");
        let manifest = dir.path().join("manifest.json");
        let output = dir.path().join("cams.json");
        std::fs::write(&tables, TABLES).unwrap();
        std::fs::write(&manifest, MANIFEST).unwrap();

        convert(&tables, Some(&manifest), Some(&output)).unwrap();

        let document =
            GeometryDocument::from_json(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(document.header(), Some("triangle"));
        assert_eq!(document.get(24).unwrap().neighbors, vec![vec![1], vec![0]]);

        assert!(info(&output, None, false).is_ok());
        assert!(info(&output, Some(13), true).is_ok());
        assert!(matches!(
            info(&output, Some(25), false),
            Err(CliError::NoSuchCamera(25))
        ));
    }

    #[test]
    fn test_cli_parses_convert() {
        let cli = Cli::try_parse_from(["whipcam", "-v", "convert", "-t", "raw.json", "-o", "-"])
            .unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Convert { manifest: None, output: Some(_), .. }
        ));
        assert!(Cli::try_parse_from(["whipcam", "info", "cams.json", "--json"]).is_err());
    }
}
