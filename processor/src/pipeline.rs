//! High-level pipeline API: spreadsheet in, three documents out.
//!
//! # Example
//!
//! ```rust,ignore
//! use mdro::pipeline::{process_file, ProcessOptions};
//! use std::path::Path;
//!
//! let summary = process_file(
//!     Path::new("副本MDRO.xlsx"),
//!     Path::new("data"),
//!     &ProcessOptions::default(),
//! )?;
//! println!("{} patients", summary.stats.total_patients);
//! ```

use std::path::{Path, PathBuf};

use crate::clean::{clean_table, CleanedTable, CleaningReport};
use crate::error::{PipelineError, PipelineResult};
use crate::export::{render_documents, DataStats, RenderedDocuments};
use crate::logs::{log_info, log_info_indent, log_success, log_warning_indent};
use crate::models::{GeoBounds, RawTable};
use crate::parser::{load_table, ParsedTable, SourceFormat};
use crate::resolve::{resolve_columns, ColumnRules, ResolvedColumns};

/// Options for the processing pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOptions {
    /// Coordinate validity window
    pub bounds: GeoBounds,

    /// Header matching rules
    pub rules: ColumnRules,

    /// Skip schema validation of the rendered documents
    pub skip_validation: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            bounds: GeoBounds::default(),
            rules: ColumnRules::default(),
            skip_validation: false,
        }
    }
}

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct ProcessSummary {
    pub source: SourceFormat,
    pub columns: ResolvedColumns,
    pub report: CleaningReport,
    pub stats: DataStats,
    /// Paths of the written documents
    pub written: Vec<PathBuf>,
}

/// Run the whole pipeline on a file and write the documents into `output_dir`.
///
/// 1. Load the spreadsheet
/// 2. Resolve column roles
/// 3. Clean rows
/// 4. Render and validate all documents
/// 5. Write them
///
/// Nothing is written (and `output_dir` is not created) unless every earlier
/// step succeeded.
pub fn process_file(
    input: &Path,
    output_dir: &Path,
    options: &ProcessOptions,
) -> PipelineResult<ProcessSummary> {
    options.bounds.check().map_err(PipelineError::Config)?;

    log_info(format!("📖 Reading {}", input.display()));
    let ParsedTable { table, source } = load_table(input)?;
    print_source(&source, &table);

    let (columns, cleaned) = run_table(&table, options)?;

    log_info("📝 Rendering documents...");
    let rendered = render_documents(&cleaned.records, !options.skip_validation)?;
    if !options.skip_validation {
        log_success("All documents match their schemas");
    }

    let written = write_documents(&rendered, output_dir)?;

    Ok(ProcessSummary {
        source,
        columns,
        report: cleaned.report,
        stats: rendered.stats,
        written,
    })
}

/// Resolve and clean an already-loaded table.
pub fn process_table(table: &RawTable, options: &ProcessOptions) -> PipelineResult<CleanedTable> {
    options.bounds.check().map_err(PipelineError::Config)?;
    run_table(table, options).map(|(_, cleaned)| cleaned)
}

fn run_table(
    table: &RawTable,
    options: &ProcessOptions,
) -> PipelineResult<(ResolvedColumns, CleanedTable)> {
    log_info("🔎 Resolving columns...");
    let columns = resolve_columns(table.headers(), &options.rules)?;
    print_columns(&columns);

    log_info("🧹 Cleaning rows...");
    let cleaned = match clean_table(table, &columns, &options.bounds) {
        Ok(cleaned) => cleaned,
        Err(err) => {
            let err = PipelineError::from(err);
            if let PipelineError::EmptyResult(ref empty) = err {
                print_report(&empty.report);
            }
            return Err(err);
        }
    };
    print_report(&cleaned.report);
    log_success(format!("{} valid patient records", cleaned.records.len()));

    Ok((columns, cleaned))
}

fn write_documents(rendered: &RenderedDocuments, output_dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let written = rendered.write_to(output_dir)?;
    for path in &written {
        log_success(format!("💾 Saved {}", path.display()));
    }
    Ok(written)
}

/// Print where the table came from
fn print_source(source: &SourceFormat, table: &RawTable) {
    match source {
        SourceFormat::Delimited { encoding, delimiter } => {
            log_success(format!("Detected encoding: {}", encoding));
            log_success(format!("Detected separator: '{}'", format_delimiter(*delimiter)));
        }
        SourceFormat::Workbook { sheet } => {
            log_success(format!("Worksheet: {}", sheet));
        }
    }
    log_success(format!("Read {} rows", table.row_count()));
    log_info(format!("📋 {} columns:", table.headers().len()));
    for (i, col) in table.headers().iter().enumerate() {
        log_info_indent(format!("[{:2}] {}", i + 1, col), 1);
    }
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

fn print_columns(columns: &ResolvedColumns) {
    log_success(format!("Patient id: {}", columns.patient_id.name));
    log_success(format!("Latitude: {}", columns.latitude.name));
    log_success(format!("Longitude: {}", columns.longitude.name));
    let indicators: Vec<&str> = columns
        .strain_indicators
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    log_success(format!("Strain indicators: {}", indicators.join(", ")));
}

/// Print every row-count transition
fn print_report(report: &CleaningReport) {
    log_info(format!("{} input rows", report.input_rows));
    for stage in &report.stages {
        let line = format!(
            "{}: {} → {} ({})",
            stage.stage, stage.rows_before, stage.rows_after, stage.reason
        );
        if stage.dropped() > 0 {
            log_warning_indent(line, 1);
        } else {
            log_info_indent(line, 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn table() -> RawTable {
        let row = |cells: [&str; 4]| -> Vec<Cell> { cells.iter().map(|c| Cell::from_text(c)).collect() };
        RawTable::new(
            ["id", "lat", "lon", "MRSA"].iter().map(|h| h.to_string()).collect(),
            vec![
                row(["P1", "22.2", "113.5", "1"]),
                row(["P2", "24.5", "119.0", "0"]),
            ],
        )
    }

    #[test]
    fn test_default_options() {
        let opts = ProcessOptions::default();
        assert_eq!(opts.bounds, GeoBounds::DEFAULT);
        assert!(!opts.skip_validation);
    }

    #[test]
    fn test_process_table() {
        let cleaned = process_table(&table(), &ProcessOptions::default()).unwrap();
        assert_eq!(cleaned.records.len(), 2);
    }

    #[test]
    fn test_custom_bounds() {
        let options = ProcessOptions {
            bounds: GeoBounds {
                min_lat: 21.8,
                max_lat: 22.5,
                min_lon: 113.0,
                max_lon: 114.0,
            },
            ..ProcessOptions::default()
        };
        let cleaned = process_table(&table(), &options).unwrap();

        assert_eq!(cleaned.records.len(), 1);
        assert_eq!(cleaned.records[0].id, "P1");
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let options = ProcessOptions {
            bounds: GeoBounds {
                min_lon: 120.0,
                max_lon: 110.0,
                ..GeoBounds::DEFAULT
            },
            ..ProcessOptions::default()
        };
        let err = process_table(&table(), &options).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_format_delimiter() {
        assert_eq!(format_delimiter('\t'), "TAB");
        assert_eq!(format_delimiter(';'), ";");
    }
}
