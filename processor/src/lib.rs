//! # MDRO - patient spreadsheet cleaning for surveillance maps
//!
//! Turns a free-form spreadsheet of multidrug-resistant organism (MDRO)
//! patient observations into three documents for a map front end: a GeoJSON
//! point collection, a heatmap coordinate list and summary statistics.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌─────────────┐   ┌──────────────────┐
//! │ Spreadsheet │──▶│   Parser    │──▶│  Resolver   │──▶│     Cleaner      │
//! │ (xlsx/csv)  │   │ (auto-enc)  │   │ (header     │   │ (coerce, bounds, │
//! └─────────────┘   └─────────────┘   │  rules)     │   │  strain, dedup)  │
//!                                     └─────────────┘   └────────┬─────────┘
//!                                                                │
//!                          ┌──────────────┬──────────────────────┤
//!                          ▼              ▼                      ▼
//!                   mdro_patients   heatmap_data            data_stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mdro::{process_file, ProcessOptions};
//! use std::path::Path;
//!
//! let summary = process_file(Path::new("MDRO.xlsx"), Path::new("data"), &ProcessOptions::default())?;
//! println!("Wrote {} patients", summary.stats.total_patients);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`models`] - Cells, raw table, strain, patient record, bounds
//! - [`parser`] - Workbook and delimited-text loading
//! - [`resolve`] - Column role inference
//! - [`clean`] - Cleaning stages and row-count reports
//! - [`export`] - GeoJSON, heatmap and statistics documents
//! - [`validation`] - Output schema validation
//! - [`pipeline`] - End-to-end processing
//! - [`logs`] - Progress logging

// Core modules
pub mod error;
pub mod models;

// Loading
pub mod parser;

// Cleaning
pub mod clean;
pub mod resolve;

// Output
pub mod export;
pub mod validation;

// Orchestration
pub mod logs;
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CleanError, ColumnResolutionError, EmptyResultError, ExportError, LoadError, PipelineError,
    PipelineResult, TypeCoercionError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, GeoBounds, PatientRecord, RawTable, Strain};

// =============================================================================
// Re-exports - Loading
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, load_table, parse_bytes_auto,
    parse_delimited, ParsedTable, SourceFormat,
};

// =============================================================================
// Re-exports - Resolution & Cleaning
// =============================================================================

pub use clean::{
    clean_table, CleanedTable, CleaningReport, CleaningStage, Indicator, StageReport,
};
pub use resolve::{resolve_columns, ColumnRef, ColumnRole, ColumnRule, ColumnRules, ResolvedColumns};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{
    render_documents, to_feature_collection, to_heatmap, CoordinateBounds, DataStats,
    FeatureCollection, OutputDocument, RenderedDocuments,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{process_file, process_table, ProcessOptions, ProcessSummary};
