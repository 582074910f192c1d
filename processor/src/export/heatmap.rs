//! Heatmap point list: `[latitude, longitude, intensity]`.

use crate::models::PatientRecord;

/// Every point carries the same weight.
pub const DEFAULT_INTENSITY: f64 = 1.0;

pub type HeatmapPoint = [f64; 3];

pub fn to_heatmap(records: &[PatientRecord]) -> Vec<HeatmapPoint> {
    records
        .iter()
        .map(|r| [r.latitude, r.longitude, DEFAULT_INTENSITY])
        .collect()
}
