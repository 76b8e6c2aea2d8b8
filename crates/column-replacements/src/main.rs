//! CLI entry point for column replacements.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use column_replacements::{ColumnReplacement, InMemoryRegistry, ReplacementType};
use dotenv::dotenv;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Dataset id under which the input file is registered.
const CLI_DATA_ID: &str = "cli";

/// CLI-compatible replacement type enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliReplacementType {
    /// Blank and whitespace-only strings
    Spaces,
    /// String matching and substitution
    Strings,
    /// Ordered list of value rules
    Value,
    /// Statistical imputation of missing values
    Imputer,
}

impl From<CliReplacementType> for ReplacementType {
    fn from(cli: CliReplacementType) -> Self {
        match cli {
            CliReplacementType::Spaces => ReplacementType::Spaces,
            CliReplacementType::Strings => ReplacementType::Strings,
            CliReplacementType::Value => ReplacementType::Value,
            CliReplacementType::Imputer => ReplacementType::Imputer,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Replace the values of a CSV column",
    long_about = "Applies one column replacement to a CSV file and prints the replaced \
                  column along with equivalent pandas code.\n\n\
                  EXAMPLES:\n  \
                  # Blank strings become missing\n  \
                  column-replacements -i data.csv -c b -t spaces\n\n  \
                  # Case-insensitive string replacement\n  \
                  column-replacements -i data.csv -c a -t strings \\\n    \
                  --config '{\"value\": \"unknown\", \"ignoreCase\": true, \"replace\": \"missing\"}'\n\n  \
                  # Median fill, written to a new file\n  \
                  column-replacements -i data.csv -c d -t value \\\n    \
                  --config '{\"value\": [{\"value\": \"nan\", \"agg\": \"median\"}]}' -o out.csv\n\n  \
                  # Show the code only\n  \
                  column-replacements -i data.csv -c d -t imputer --config '{\"type\": \"knn\"}' --dry-run"
)]
struct Args {
    /// Path to the CSV file to read
    #[arg(short, long)]
    input: String,

    /// Column to replace
    #[arg(short, long)]
    column: String,

    /// Replacement type
    #[arg(short = 't', long = "type", value_enum)]
    replacement_type: CliReplacementType,

    /// Replacement options as JSON, or @path to a JSON file
    #[arg(long, default_value = "{}")]
    config: String,

    /// Name of the output column (defaults to the replaced column)
    #[arg(short, long)]
    name: Option<String>,

    /// Write the dataset with the replaced column to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only print the generated code
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    // Load environment variables from .env file (RUST_LOG)
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level);

    let cfg = read_config(&args.config)?;
    let registry = Arc::new(InMemoryRegistry::new());

    let mut replacement = ColumnReplacement::new(
        registry.clone(),
        CLI_DATA_ID,
        args.column.as_str(),
        ReplacementType::from(args.replacement_type).as_str(),
        &cfg,
    )?;
    if let Some(ref name) = args.name {
        replacement = replacement.with_name(name);
    }

    if args.dry_run {
        println!("{}", replacement.build_code());
        return Ok(());
    }

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let data = load_csv(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());
    registry.insert(CLI_DATA_ID, data);

    let series = replacement
        .build_replacements()
        .map_err(|e| anyhow!("Replacement failed [{}]: {}", e.error_code(), e))?;

    println!("{}", series);
    println!();
    println!("{}", replacement.build_code());

    if let Some(ref output) = args.output {
        let mut df = registry
            .remove(CLI_DATA_ID)
            .ok_or_else(|| anyhow!("Dataset '{}' is no longer registered", CLI_DATA_ID))?;
        df.with_column(series)?;
        write_csv(&mut df, output)?;
        info!("Wrote {} rows to {}", df.height(), output.display());
    }

    Ok(())
}

/// Parse the `--config` argument, reading the file for `@path`.
fn read_config(raw: &str) -> Result<serde_json::Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path))?,
        None => raw.to_string(),
    };
    debug!("Replacement config: {}", text);
    serde_json::from_str(&text).context("Invalid JSON in --config")
}

fn load_csv(path: &str) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
        .map_err(|e| anyhow!("Failed to read {}: {}", path, e))
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Could not create output file: {}", path.display()))?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}
