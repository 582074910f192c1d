//! Error types for the MDRO processing pipeline.
//!
//! One error type per stage, composed into a top-level [`PipelineError`]:
//!
//! - [`LoadError`] - input unreadable or not tabular
//! - [`ColumnResolutionError`] - a required column role could not be inferred
//! - [`TypeCoercionError`] - a coordinate column is not numeric at all
//! - [`EmptyResultError`] - the pipeline ran but no row survived cleaning
//! - [`ExportError`] - rendering, schema-checking or writing output documents
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across stage boundaries.

use std::path::PathBuf;

use thiserror::Error;

use crate::clean::CleaningReport;
use crate::resolve::ColumnRole;

// =============================================================================
// Loading Errors
// =============================================================================

/// Errors while reading the input spreadsheet into a raw table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Workbook could not be opened or the sheet could not be read.
    #[error("Invalid workbook: {0}")]
    Workbook(String),

    /// Failed to decode the text content.
    #[error("Failed to decode content as {encoding}: {message}")]
    Encoding { encoding: String, message: String },

    /// Invalid delimited-text syntax.
    #[error("Invalid CSV format at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Empty file.
    #[error("Input file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in input")]
    NoHeaders,
}

// =============================================================================
// Column Resolution Errors
// =============================================================================

/// One or more required column roles could not be inferred from the headers.
#[derive(Debug, Clone, Error)]
#[error(
    "Cannot resolve column(s) for {}; available headers: [{}]",
    format_roles(.missing),
    .headers.join(", ")
)]
pub struct ColumnResolutionError {
    /// Roles with no matching column, in declaration order.
    pub missing: Vec<ColumnRole>,
    /// Headers that were inspected.
    pub headers: Vec<String>,
}

fn format_roles(roles: &[ColumnRole]) -> String {
    roles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Cleaning Errors
// =============================================================================

/// A coordinate column holds values but none of them is numeric.
#[derive(Debug, Clone, Error)]
#[error(
    "Column '{column}' ({role}) could not be converted to numbers: \
     {non_empty} non-empty cell(s), none numeric (e.g. '{sample}')"
)]
pub struct TypeCoercionError {
    pub column: String,
    pub role: ColumnRole,
    pub non_empty: usize,
    pub sample: String,
}

/// Cleaning completed but every row was filtered out.
#[derive(Debug, Clone, Error)]
#[error("No valid rows remain after cleaning ({} input rows)", .report.input_rows)]
pub struct EmptyResultError {
    /// Stage-by-stage row counts, to localize which filter discarded rows.
    pub report: CleaningReport,
}

/// Errors produced by the cleaner.
#[derive(Debug, Clone, Error)]
pub enum CleanError {
    #[error(transparent)]
    TypeCoercion(#[from] TypeCoercionError),

    #[error(transparent)]
    EmptyResult(#[from] EmptyResultError),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while rendering or writing the output documents.
#[derive(Debug, Error)]
pub enum ExportError {
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Nothing to export.
    #[error("No records to export")]
    NoRecords,

    /// A rendered document does not match its schema.
    #[error("{document} failed schema validation: {}", .errors.join("; "))]
    Schema {
        document: String,
        errors: Vec<String>,
    },

    /// Failed to create the output directory or write a document.
    #[error("Failed to write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline error.
///
/// This is the error type returned by [`crate::pipeline::process_file`].
/// Every variant is terminal for the run; nothing is retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Column resolution error: {0}")]
    ColumnResolution(#[from] ColumnResolutionError),

    #[error("Type coercion error: {0}")]
    TypeCoercion(#[from] TypeCoercionError),

    #[error("{0}")]
    EmptyResult(#[from] EmptyResultError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Invalid processing options.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<CleanError> for PipelineError {
    fn from(err: CleanError) -> Self {
        match err {
            CleanError::TypeCoercion(e) => Self::TypeCoercion(e),
            CleanError::EmptyResult(e) => Self::EmptyResult(e),
        }
    }
}

impl PipelineError {
    /// True when the run completed structurally but produced nothing usable.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::EmptyResult(_))
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for cleaning operations.
pub type CleanResult<T> = Result<T, CleanError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // LoadError -> PipelineError
        let pipeline_err: PipelineError = LoadError::EmptyFile.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // CleanError -> PipelineError keeps the specific variant
        let coercion = TypeCoercionError {
            column: "纬度".into(),
            role: ColumnRole::Latitude,
            non_empty: 3,
            sample: "north".into(),
        };
        let pipeline_err: PipelineError = CleanError::from(coercion).into();
        assert!(matches!(pipeline_err, PipelineError::TypeCoercion(_)));
        assert!(pipeline_err.to_string().contains("纬度"));
        assert!(pipeline_err.to_string().contains("north"));
    }

    #[test]
    fn test_column_resolution_message() {
        let err = ColumnResolutionError {
            missing: vec![ColumnRole::Longitude, ColumnRole::StrainIndicator],
            headers: vec!["id".into(), "lat".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("longitude"));
        assert!(msg.contains("strain indicator"));
        assert!(msg.contains("id, lat"));
    }

    #[test]
    fn test_empty_result_is_distinct() {
        let err: PipelineError = EmptyResultError {
            report: CleaningReport::new(4),
        }
        .into();
        assert!(err.is_empty_result());
        assert!(err.to_string().contains("4 input rows"));

        let hard: PipelineError = LoadError::NoHeaders.into();
        assert!(!hard.is_empty_result());
    }
}
