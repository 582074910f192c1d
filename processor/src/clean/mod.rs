//! Row cleaning and validation.
//!
//! Turns a [`RawTable`] plus its [`ResolvedColumns`] into [`PatientRecord`]s.
//! Stages run in a fixed order, each on the survivors of the previous one,
//! and each returns a [`StageReport`]:
//!
//! ```text
//! blank rows → coercion + strain assignment → missing values
//!            → bounds → strain category → duplicates
//! ```
//!
//! Rows are only ever removed; a surviving row is never altered once its
//! fields are projected.

pub mod indicator;
pub mod report;

use std::collections::HashSet;

use crate::error::{CleanResult, EmptyResultError, TypeCoercionError};
use crate::models::{Cell, GeoBounds, PatientRecord, RawTable, Strain};
use crate::resolve::{ColumnRef, ColumnRole, ResolvedColumns};

pub use indicator::Indicator;
pub use report::{CleaningReport, CleaningStage, StageReport};

/// Cleaned records and how they were obtained.
#[derive(Debug, Clone)]
pub struct CleanedTable {
    pub records: Vec<PatientRecord>,
    pub report: CleaningReport,
}

/// A row after projection onto canonical fields.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    patient_id: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    label: String,
}

/// A candidate with every required field present.
#[derive(Debug, Clone, PartialEq)]
struct Located {
    patient_id: String,
    latitude: f64,
    longitude: f64,
    label: String,
}

/// Run every cleaning stage.
///
/// Fails with [`TypeCoercionError`] when a coordinate column is not numeric
/// at all, and with [`EmptyResultError`] when nothing survives.
pub fn clean_table(
    table: &RawTable,
    columns: &ResolvedColumns,
    bounds: &GeoBounds,
) -> CleanResult<CleanedTable> {
    let mut report = CleaningReport::new(table.row_count());

    let (rows, stage) = remove_blank_rows(table);
    report.add(stage);

    let (candidates, stage) = project_rows(&rows, columns)?;
    report.add(stage);

    let (located, stage) = drop_missing(candidates);
    report.add(stage);

    let (located, stage) = drop_out_of_bounds(located, bounds);
    report.add(stage);

    let (records, stage) = check_strain_domain(located);
    report.add(stage);

    let (records, stage) = dedupe_by_id(records);
    report.add(stage);

    if records.is_empty() {
        return Err(EmptyResultError { report }.into());
    }

    Ok(CleanedTable { records, report })
}

fn remove_blank_rows(table: &RawTable) -> (Vec<&[Cell]>, StageReport) {
    let before = table.row_count();
    let rows: Vec<&[Cell]> = table
        .rows()
        .iter()
        .map(Vec::as_slice)
        .filter(|row| !row.iter().all(Cell::is_empty))
        .collect();
    let stage = StageReport::new(
        CleaningStage::BlankRows,
        before,
        rows.len(),
        format!("{} fully blank row(s) removed", before - rows.len()),
    );
    (rows, stage)
}

/// Rename, coerce coordinates and collapse indicator columns into one label.
fn project_rows(
    rows: &[&[Cell]],
    columns: &ResolvedColumns,
) -> Result<(Vec<Candidate>, StageReport), TypeCoercionError> {
    let lat_failures = check_numeric_column(rows, &columns.latitude, ColumnRole::Latitude)?;
    let lon_failures = check_numeric_column(rows, &columns.longitude, ColumnRole::Longitude)?;

    let candidates: Vec<Candidate> = rows
        .iter()
        .map(|row| Candidate {
            patient_id: cell_at(row, &columns.patient_id).to_key_string(),
            latitude: cell_at(row, &columns.latitude).as_f64(),
            longitude: cell_at(row, &columns.longitude).as_f64(),
            label: assign_strain(row, &columns.strain_indicators),
        })
        .collect();

    let stage = StageReport::new(
        CleaningStage::Coercion,
        rows.len(),
        candidates.len(),
        format!(
            "{} latitude and {} longitude cell(s) not numeric, treated as missing",
            lat_failures, lon_failures
        ),
    );
    Ok((candidates, stage))
}

/// Count unparseable cells in a coordinate column, failing if none parse.
fn check_numeric_column(
    rows: &[&[Cell]],
    column: &ColumnRef,
    role: ColumnRole,
) -> Result<usize, TypeCoercionError> {
    let mut non_empty = 0;
    let mut parsed = 0;
    let mut sample = None;

    for row in rows {
        let cell = cell_at(row, column);
        if cell.is_empty() {
            continue;
        }
        non_empty += 1;
        if cell.as_f64().is_some() {
            parsed += 1;
        } else if sample.is_none() {
            sample = Some(cell.to_string());
        }
    }

    if non_empty > 0 && parsed == 0 {
        return Err(TypeCoercionError {
            column: column.name.clone(),
            role,
            non_empty,
            sample: sample.unwrap_or_default(),
        });
    }
    Ok(non_empty - parsed)
}

/// Category label of the first positive indicator column, or `OTHER`.
///
/// The label is the indicator's column name upper-cased; it is checked
/// against the known categories later.
fn assign_strain(row: &[Cell], indicators: &[ColumnRef]) -> String {
    indicators
        .iter()
        .find(|column| Indicator::classify(cell_at(row, column)).is_positive())
        .map(|column| column.name.to_uppercase())
        .unwrap_or_else(|| Strain::Other.as_str().to_string())
}

fn cell_at<'a>(row: &'a [Cell], column: &ColumnRef) -> &'a Cell {
    static EMPTY: Cell = Cell::Empty;
    row.get(column.index).unwrap_or(&EMPTY)
}

fn drop_missing(candidates: Vec<Candidate>) -> (Vec<Located>, StageReport) {
    let before = candidates.len();
    let located: Vec<Located> = candidates
        .into_iter()
        .filter_map(|c| {
            Some(Located {
                patient_id: c.patient_id?,
                latitude: c.latitude?,
                longitude: c.longitude?,
                label: c.label,
            })
        })
        .collect();
    let stage = StageReport::new(
        CleaningStage::MissingValues,
        before,
        located.len(),
        format!(
            "{} row(s) without identifier or coordinates removed",
            before - located.len()
        ),
    );
    (located, stage)
}

fn drop_out_of_bounds(located: Vec<Located>, bounds: &GeoBounds) -> (Vec<Located>, StageReport) {
    let before = located.len();
    let kept: Vec<Located> = located
        .into_iter()
        .filter(|l| bounds.contains(l.latitude, l.longitude))
        .collect();
    let stage = StageReport::new(
        CleaningStage::Bounds,
        before,
        kept.len(),
        format!(
            "{} row(s) outside lat [{}, {}] / lon [{}, {}] removed",
            before - kept.len(),
            bounds.min_lat,
            bounds.max_lat,
            bounds.min_lon,
            bounds.max_lon
        ),
    );
    (kept, stage)
}

fn check_strain_domain(located: Vec<Located>) -> (Vec<PatientRecord>, StageReport) {
    let before = located.len();
    let records: Vec<PatientRecord> = located
        .into_iter()
        .filter_map(|l| {
            let strain = Strain::from_label(&l.label)?;
            Some(PatientRecord {
                id: l.patient_id,
                latitude: l.latitude,
                longitude: l.longitude,
                strain,
            })
        })
        .collect();
    let stage = StageReport::new(
        CleaningStage::StrainDomain,
        before,
        records.len(),
        format!(
            "{} row(s) with a label outside MRSA/ESBLE/CRO/OTHER removed",
            before - records.len()
        ),
    );
    (records, stage)
}

/// Keep the first record of every identifier, in table order.
fn dedupe_by_id(records: Vec<PatientRecord>) -> (Vec<PatientRecord>, StageReport) {
    let before = records.len();
    let mut seen = HashSet::new();
    let unique: Vec<PatientRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    let stage = StageReport::new(
        CleaningStage::Duplicates,
        before,
        unique.len(),
        format!("{} duplicate identifier row(s) removed", before - unique.len()),
    );
    (unique, stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CleanError;
    use crate::resolve::{resolve_columns, ColumnRules};

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| Cell::from_text(c)).collect())
                .collect(),
        )
    }

    fn clean(t: &RawTable) -> CleanResult<CleanedTable> {
        let columns = resolve_columns(t.headers(), &ColumnRules::default()).unwrap();
        clean_table(t, &columns, &GeoBounds::default())
    }

    const HEADERS: [&str; 5] = ["id", "lat", "lon", "MRSA", "ESBLE"];

    #[test]
    fn test_single_positive_indicator() {
        let t = table(&HEADERS, &[&["P1", "22.2", "113.5", "1", "0"]]);
        let cleaned = clean(&t).unwrap();

        assert_eq!(
            cleaned.records,
            vec![PatientRecord {
                id: "P1".into(),
                latitude: 22.2,
                longitude: 113.5,
                strain: Strain::Mrsa,
            }]
        );
    }

    #[test]
    fn test_no_positive_indicator_is_other() {
        let t = table(&HEADERS, &[&["P1", "22.2", "113.5", "0", ""]]);
        let cleaned = clean(&t).unwrap();

        assert_eq!(cleaned.records.len(), 1);
        assert_eq!(cleaned.records[0].strain, Strain::Other);
    }

    #[test]
    fn test_first_positive_indicator_wins() {
        let t = table(&HEADERS, &[
            &["P1", "22.2", "113.5", "no", "yes"],
            &["P2", "22.3", "113.6", "x", "1"],
        ]);
        let cleaned = clean(&t).unwrap();

        assert_eq!(cleaned.records[0].strain, Strain::Esble);
        assert_eq!(cleaned.records[1].strain, Strain::Mrsa);
    }

    #[test]
    fn test_out_of_bounds_dropped() {
        let t = table(&HEADERS, &[
            &["P1", "22.2", "113.5", "1", "0"],
            &["P2", "30.0", "113.5", "1", "0"],
        ]);
        let cleaned = clean(&t).unwrap();

        assert_eq!(cleaned.records.len(), 1);
        assert_eq!(cleaned.records[0].id, "P1");
        let bounds = cleaned.report.stage(CleaningStage::Bounds).unwrap();
        assert_eq!((bounds.rows_before, bounds.rows_after), (2, 1));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let t = table(&HEADERS, &[
            &["P2", "22.2", "113.5", "1", "0"],
            &["P2", "22.9", "114.1", "0", "1"],
        ]);
        let cleaned = clean(&t).unwrap();

        assert_eq!(cleaned.records.len(), 1);
        assert_eq!(cleaned.records[0].latitude, 22.2);
        assert_eq!(cleaned.records[0].strain, Strain::Mrsa);
        assert_eq!(
            cleaned.report.stage(CleaningStage::Duplicates).map(|s| s.dropped()),
            Some(1)
        );
    }

    #[test]
    fn test_numeric_ids_canonicalized() {
        let row = |id: Cell, lat: f64| {
            vec![id, Cell::Number(lat), Cell::Number(113.5), Cell::Number(1.0), Cell::Empty]
        };
        let t = RawTable::new(
            HEADERS.iter().map(|h| h.to_string()).collect(),
            vec![
                row(Cell::Number(5.0), 22.2),
                row(Cell::Text("5".into()), 22.3),
                row(Cell::Text("5.0".into()), 22.4),
            ],
        );
        let cleaned = clean(&t).unwrap();
        let ids: Vec<_> = cleaned.records.iter().map(|r| r.id.as_str()).collect();

        assert_eq!(ids, ["5", "5.0"]);
    }

    #[test]
    fn test_blank_rows_removed() {
        let t = table(&HEADERS, &[
            &["", "", "", "", ""],
            &["P1", "22.2", "113.5", "1", "0"],
            &[" ", "", "", "", ""],
        ]);
        let cleaned = clean(&t).unwrap();

        let blank = cleaned.report.stage(CleaningStage::BlankRows).unwrap();
        assert_eq!((blank.rows_before, blank.rows_after), (3, 1));
    }

    #[test]
    fn test_unparseable_coordinates_become_missing() {
        let t = table(&HEADERS, &[
            &["P1", "22.2", "113.5", "1", "0"],
            &["P2", "unknown", "113.5", "1", "0"],
            &["P3", "22.4", "", "1", "0"],
        ]);
        let cleaned = clean(&t).unwrap();

        assert_eq!(cleaned.records.len(), 1);
        let missing = cleaned.report.stage(CleaningStage::MissingValues).unwrap();
        assert_eq!(missing.dropped(), 2);
        let coercion = cleaned.report.stage(CleaningStage::Coercion).unwrap();
        assert_eq!(coercion.dropped(), 0);
        assert!(coercion.reason.starts_with("1 latitude"));
    }

    #[test]
    fn test_missing_identifier_dropped() {
        let t = table(&HEADERS, &[
            &["", "22.2", "113.5", "1", "0"],
            &["P1", "22.3", "113.6", "1", "0"],
        ]);
        let cleaned = clean(&t).unwrap();

        assert_eq!(cleaned.records.len(), 1);
        assert_eq!(cleaned.records[0].id, "P1");
    }

    #[test]
    fn test_na_placeholders_never_count_as_positive() {
        let t = table(&["id", "lat", "lon", "MRSA", "CRO"], &[
            &["P1", "22.2", "113.5", "N/A", "1"],
            &["P2", "22.3", "113.6", "NaN", "0"],
            &["P3", "22.4", "113.7", "null", ""],
        ]);
        let cleaned = clean(&t).unwrap();
        let strains: Vec<Strain> = cleaned.records.iter().map(|r| r.strain).collect();

        assert_eq!(strains, [Strain::Cro, Strain::Other, Strain::Other]);
    }

    #[test]
    fn test_na_identifier_dropped() {
        let t = table(&HEADERS, &[
            &["N/A", "22.2", "113.5", "1", "0"],
            &["P1", "22.3", "113.6", "1", "0"],
        ]);
        let cleaned = clean(&t).unwrap();

        assert_eq!(cleaned.records.len(), 1);
        assert_eq!(cleaned.records[0].id, "P1");
        assert_eq!(cleaned.report.stage(CleaningStage::MissingValues).unwrap().dropped(), 1);
    }

    #[test]
    fn test_non_numeric_column_is_systemic_failure() {
        let t = table(&HEADERS, &[
            &["P1", "north", "113.5", "1", "0"],
            &["P2", "south", "113.6", "1", "0"],
        ]);
        let err = clean(&t).unwrap_err();

        match err {
            CleanError::TypeCoercion(e) => {
                assert_eq!(e.column, "lat");
                assert_eq!(e.role, ColumnRole::Latitude);
                assert_eq!(e.non_empty, 2);
                assert_eq!(e.sample, "north");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_indicator_outside_domain_dropped() {
        let headers = ["id", "lat", "lon", "菌种"];
        let t = table(&headers, &[
            &["P1", "22.2", "113.5", "阳性"],
            &["P2", "22.3", "113.6", ""],
        ]);
        let cleaned = clean(&t).unwrap();

        // "菌种" is not a category: the positive row is dropped, the other is OTHER
        assert_eq!(cleaned.records.len(), 1);
        assert_eq!(cleaned.records[0].id, "P2");
        assert_eq!(cleaned.records[0].strain, Strain::Other);
        assert_eq!(
            cleaned.report.stage(CleaningStage::StrainDomain).map(|s| s.dropped()),
            Some(1)
        );
    }

    #[test]
    fn test_lowercase_indicator_header() {
        let headers = ["id", "lat", "lon", "esble"];
        let t = table(&headers, &[&["P1", "22.2", "113.5", "true"]]);
        let cleaned = clean(&t).unwrap();

        assert_eq!(cleaned.records[0].strain, Strain::Esble);
    }

    #[test]
    fn test_empty_result() {
        let t = table(&HEADERS, &[
            &["P1", "40.0", "113.5", "1", "0"],
            &["P2", "22.2", "150.0", "1", "0"],
        ]);
        let err = clean(&t).unwrap_err();

        match err {
            CleanError::EmptyResult(e) => {
                assert_eq!(e.report.input_rows, 2);
                assert_eq!(e.report.final_rows(), 0);
                assert_eq!(e.report.stages.len(), 6);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_report_covers_every_stage_in_order() {
        let t = table(&HEADERS, &[&["P1", "22.2", "113.5", "1", "0"]]);
        let cleaned = clean(&t).unwrap();
        let stages: Vec<_> = cleaned.report.stages.iter().map(|s| s.stage).collect();

        assert_eq!(
            stages,
            [
                CleaningStage::BlankRows,
                CleaningStage::Coercion,
                CleaningStage::MissingValues,
                CleaningStage::Bounds,
                CleaningStage::StrainDomain,
                CleaningStage::Duplicates,
            ]
        );
    }
}
