//! MDRO CLI - Turn patient spreadsheets into surveillance map data
//!
//! # Main Commands
//!
//! ```bash
//! mdro process 副本MDRO.xlsx          # Full pipeline, writes ./data/*.json
//! mdro process input.csv -o out     # Custom output directory
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! mdro parse input.csv              # Dump the loaded table as JSON
//! mdro columns input.xlsx           # Show which columns were picked
//! mdro validate data                # Check written documents against schemas
//! ```

use clap::{Parser, Subcommand};
use mdro::export::OutputDocument;
use mdro::logs::{log_error, log_info, log_success, LogFormat, LOGGER};
use mdro::validation::validate_document;
use mdro::{
    load_table, process_file, resolve_columns, ColumnRules, GeoBounds, PipelineError,
    ProcessOptions, ProcessSummary,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Exit status when the run completed but no row survived cleaning.
const EXIT_EMPTY_RESULT: i32 = 2;

#[derive(Parser)]
#[command(name = "mdro")]
#[command(about = "Clean MDRO patient spreadsheets into GeoJSON, heatmap and stats documents", long_about = None)]
struct Cli {
    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit progress as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: spreadsheet → cleaned records → three JSON documents
    Process {
        /// Input spreadsheet (xlsx, xls, ods, csv, tsv, txt)
        input: PathBuf,

        /// Output directory
        #[arg(short, long, env = "MDRO_OUTPUT_DIR", default_value = "data")]
        output: PathBuf,

        /// Minimum accepted latitude
        #[arg(long, env = "MDRO_MIN_LAT", default_value_t = GeoBounds::DEFAULT.min_lat, allow_negative_numbers = true)]
        min_lat: f64,

        /// Maximum accepted latitude
        #[arg(long, env = "MDRO_MAX_LAT", default_value_t = GeoBounds::DEFAULT.max_lat, allow_negative_numbers = true)]
        max_lat: f64,

        /// Minimum accepted longitude
        #[arg(long, env = "MDRO_MIN_LON", default_value_t = GeoBounds::DEFAULT.min_lon, allow_negative_numbers = true)]
        min_lon: f64,

        /// Maximum accepted longitude
        #[arg(long, env = "MDRO_MAX_LON", default_value_t = GeoBounds::DEFAULT.max_lon, allow_negative_numbers = true)]
        max_lon: f64,

        /// Skip schema validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Load a spreadsheet and output its rows as JSON
    Parse {
        /// Input spreadsheet
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the column role assignment for a spreadsheet
    Columns {
        /// Input spreadsheet
        input: PathBuf,
    },

    /// Validate previously written documents against their schemas
    Validate {
        /// Directory holding the three documents
        #[arg(default_value = "data")]
        dir: PathBuf,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    LOGGER.configure(cli.quiet, format);

    let result = match cli.command {
        Commands::Process {
            input,
            output,
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            no_validate,
        } => {
            let options = ProcessOptions {
                bounds: GeoBounds {
                    min_lat,
                    max_lat,
                    min_lon,
                    max_lon,
                },
                rules: ColumnRules::default(),
                skip_validation: no_validate,
            };
            cmd_process(&input, &output, &options)
        }

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Columns { input } => cmd_columns(&input),

        Commands::Validate { dir } => cmd_validate(&dir),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(exit_code(e.as_ref()));
    }
}

fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    match err.downcast_ref::<PipelineError>() {
        Some(e) if e.is_empty_result() => EXIT_EMPTY_RESULT,
        _ => 1,
    }
}

fn cmd_process(
    input: &Path,
    output: &Path,
    options: &ProcessOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    log_info(format!("📄 Processing: {}", input.display()));

    let summary = process_file(input, output, options)?;
    print_summary(&summary);

    log_info("✨ Done!");
    Ok(())
}

fn print_summary(summary: &ProcessSummary) {
    let stats = &summary.stats;
    log_info("📊 Summary:");
    log_success(format!("Total patients: {}", stats.total_patients));
    for (strain, count) in &stats.strain_distribution {
        log_success(format!("{}: {}", strain, count));
    }
    let b = &stats.coordinate_bounds;
    log_success(format!("Latitude: {:.4} .. {:.4}", b.min_lat, b.max_lat));
    log_success(format!("Longitude: {:.4} .. {:.4}", b.min_lon, b.max_lon));
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    log_info(format!("📄 Parsing: {}", input.display()));

    let parsed = load_table(input)?;
    log_success(format!("Columns: {}", parsed.table.headers().join(", ")));
    log_success(format!("Parsed {} rows", parsed.table.row_count()));

    let json = serde_json::to_string_pretty(&parsed.table.to_records())?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_columns(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = load_table(input)?;
    let columns = resolve_columns(parsed.table.headers(), &ColumnRules::default())?;

    println!("{}", serde_json::to_string_pretty(&columns)?);
    Ok(())
}

fn cmd_validate(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log_info(format!("✔️  Validating: {}", dir.display()));

    let mut invalid = 0;
    for document in OutputDocument::ALL {
        let path = dir.join(document.file_name());
        let content = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
        let data: Value = serde_json::from_str(&content)?;

        match validate_document(document, &data) {
            Ok(()) => log_success(format!("{} valid", document)),
            Err(errors) => {
                invalid += 1;
                log_error(format!("{} invalid:", document));
                for err in errors.iter().take(5) {
                    log_error(format!("   - {}", err));
                }
            }
        }
    }

    if invalid > 0 {
        return Err(format!("{} document(s) failed validation", invalid).into());
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            log_success(format!("💾 Output written to: {}", p.display()));
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
