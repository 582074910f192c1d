//! JSON Schema validation for the output documents.
//!
//! Every document is checked before it is written, and `mdro validate` runs
//! the same checks over an existing output directory.
//!
//! # Embedded Schemas
//!
//! Schemas are embedded at compile time from the `schemas/` directory:
//! - `mdro-patients.json` - GeoJSON FeatureCollection of patient points
//! - `heatmap-data.json` - `[lat, lon, intensity]` triples
//! - `data-stats.json` - summary statistics
//!
//! Structure and the strain enumeration are enforced by the schemas; the
//! configurable bounds window is enforced by the cleaner, not here.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use mdro::validation::validate_heatmap;
//!
//! assert!(validate_heatmap(&json!([[22.2, 113.5, 1.0]])).is_ok());
//! assert!(validate_heatmap(&json!([[22.2, 113.5]])).is_err());
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::export::OutputDocument;

static PATIENTS_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/mdro-patients.json"))
        .expect("Invalid embedded schema")
});

static HEATMAP_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/heatmap-data.json"))
        .expect("Invalid embedded schema")
});

static STATS_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/data-stats.json"))
        .expect("Invalid embedded schema")
});

/// Validate a JSON value against a draft 7 schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per violation
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick check, no messages.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Schema for an output document.
pub fn schema_for(document: OutputDocument) -> &'static Value {
    match document {
        OutputDocument::Patients => &*PATIENTS_SCHEMA,
        OutputDocument::Heatmap => &*HEATMAP_SCHEMA,
        OutputDocument::Stats => &*STATS_SCHEMA,
    }
}

/// Validate a rendered document against its embedded schema.
pub fn validate_document(document: OutputDocument, data: &Value) -> Result<(), Vec<String>> {
    validate(schema_for(document), data)
}

pub fn validate_patients_geojson(data: &Value) -> Result<(), Vec<String>> {
    validate_document(OutputDocument::Patients, data)
}

pub fn validate_heatmap(data: &Value) -> Result<(), Vec<String>> {
    validate_document(OutputDocument::Heatmap, data)
}

pub fn validate_stats(data: &Value) -> Result<(), Vec<String>> {
    validate_document(OutputDocument::Stats, data)
}
