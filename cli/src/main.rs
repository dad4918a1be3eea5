use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use jsonshape_core::{Bundle, DecodeError, Registry, RegistryBuilder, Shape};
use serde_json::json;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "jsonshape")]
#[command(about = "Validate and normalize JSON documents against declared record types")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a document against the bundle's root type and report every
    /// field error found
    Check {
        /// Type bundle file (record/enum definitions plus the root shape)
        bundle: PathBuf,

        /// Input JSON document
        input: PathBuf,

        /// Tolerate object keys that match no declared component
        #[arg(long)]
        ignore_unknown: bool,
    },

    /// Decode then re-encode a document, printing the normalized form
    Normalize {
        /// Type bundle file (record/enum definitions plus the root shape)
        bundle: PathBuf,

        /// Input JSON document
        input: PathBuf,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Tolerate object keys that match no declared component
        #[arg(long)]
        ignore_unknown: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            bundle,
            input,
            ignore_unknown,
        } => {
            let (registry, root) = load_registry(&bundle, ignore_unknown)?;
            let document = read_json(&input)?;

            match registry.decode(&document, &root) {
                Ok(_) => {
                    write_json(&json!({"ok": true}), None, OutputFormat::Compact)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(DecodeError::Invalid(tree)) => {
                    let report: Vec<_> = tree
                        .flatten()
                        .into_iter()
                        .map(|e| json!({"path": e.pointer(), "message": e.message}))
                        .collect();
                    write_json(&report, None, OutputFormat::Pretty)?;
                    Ok(ExitCode::FAILURE)
                }
                Err(error @ DecodeError::Config(_)) => {
                    Err(anyhow::Error::from(error).context("Bundle configuration is invalid"))
                }
            }
        }
        Commands::Normalize {
            bundle,
            input,
            output,
            ignore_unknown,
            format,
        } => {
            let (registry, root) = load_registry(&bundle, ignore_unknown)?;
            let document = read_json(&input)?;

            let datum = registry
                .decode(&document, &root)
                .map_err(|e| anyhow::Error::from(e).context("Document does not match its type"))?;
            let normalized = registry
                .encode(&datum, &root)
                .map_err(|e| anyhow::Error::from(e).context("Re-encoding failed"))?;

            write_json(&normalized, output.as_ref(), format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_registry(path: &PathBuf, ignore_unknown: bool) -> Result<(Registry, Shape)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open bundle file: {}", path.display()))?;
    let reader = BufReader::new(file);
    let bundle: Bundle = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse bundle from: {}", path.display()))?;

    tracing::debug!(
        products = bundle.products.len(),
        enums = bundle.enums.len(),
        "loaded type bundle"
    );
    let registry = RegistryBuilder::new()
        .bundle(&bundle)
        .map_err(|e| anyhow::Error::from(e).context("Bundle contains conflicting types"))?
        .ignore_unknown_properties(ignore_unknown)
        .seal();

    Ok((registry, bundle.root))
}

fn read_json(path: &PathBuf) -> Result<serde_json::Value> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse JSON from: {}", path.display()))
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    // Ensure trailing newline
    writeln!(writer).context("Failed to write trailing newline")?;

    Ok(())
}
