//! Summary statistics over the cleaned records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{PatientRecord, Strain};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataStats {
    pub total_patients: usize,
    /// Only categories that occur; keys in category order.
    pub strain_distribution: BTreeMap<Strain, usize>,
    pub coordinate_bounds: CoordinateBounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl CoordinateBounds {
    /// Bounding box of the records; `None` when there are none.
    pub fn of(records: &[PatientRecord]) -> Option<Self> {
        let (first, rest) = records.split_first()?;
        let start = CoordinateBounds {
            min_lat: first.latitude,
            max_lat: first.latitude,
            min_lon: first.longitude,
            max_lon: first.longitude,
        };
        Some(rest.iter().fold(start, |b, r| CoordinateBounds {
            min_lat: b.min_lat.min(r.latitude),
            max_lat: b.max_lat.max(r.latitude),
            min_lon: b.min_lon.min(r.longitude),
            max_lon: b.max_lon.max(r.longitude),
        }))
    }
}

impl DataStats {
    pub fn from_records(records: &[PatientRecord]) -> Option<Self> {
        let coordinate_bounds = CoordinateBounds::of(records)?;
        let mut strain_distribution = BTreeMap::new();
        for record in records {
            *strain_distribution.entry(record.strain).or_insert(0) += 1;
        }
        Some(DataStats {
            total_patients: records.len(),
            strain_distribution,
            coordinate_bounds,
        })
    }
}
