//! Domain models for the MDRO processing pipeline.
//!
//! - [`Cell`] / [`RawTable`] - untyped tabular input, exactly as loaded
//! - [`Strain`] - the four surveillance categories
//! - [`PatientRecord`] - one cleaned, validated patient observation
//! - [`GeoBounds`] - the coordinate validity window

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Raw Cells
// =============================================================================

/// Placeholder texts that stand for a missing value, compared
/// case-insensitively after trimming.
pub const NA_TOKENS: &[&str] = &[
    "#n/a", "#n/a n/a", "#na", "-1.#ind", "-1.#qnan", "-nan", "1.#ind", "1.#qnan", "<na>", "n/a",
    "na", "nan", "null", "none",
];

/// True when `text` is one of [`NA_TOKENS`].
pub fn is_na_token(text: &str) -> bool {
    let token = text.trim().to_lowercase();
    NA_TOKENS.contains(&token.as_str())
}

/// A single untyped spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing or blank.
    Empty,
    /// Numeric cell (workbooks only; delimited text stays [`Cell::Text`]).
    Number(f64),
    /// Boolean cell (workbooks only).
    Bool(bool),
    /// Trimmed, non-empty text.
    Text(String),
}

impl Cell {
    /// Build a cell from raw text, trimming it and mapping blanks and
    /// NA placeholders (`N/A`, `NaN`, `null`, ...) to `Empty`.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || is_na_token(trimmed) {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Interpret the cell as a finite float.
    ///
    /// Text is parsed leniently (surrounding whitespace ignored); `NaN` and
    /// infinities count as unparseable.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Empty | Cell::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Canonical string form used for identifiers.
    ///
    /// Integral numbers drop their fractional part so that a workbook's `5`
    /// and `5.0` are the same identifier. Text is kept verbatim.
    pub fn to_key_string(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) if is_na_token(s) => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Number(n) if n.is_nan() => None,
            Cell::Number(n) => Some(format_number(*n)),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) => f.write_str(&format_number(*n)),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

fn format_number(n: f64) -> String {
    // 2^53: beyond this an f64 no longer holds every integer exactly
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// =============================================================================
// Raw Table
// =============================================================================

static EMPTY_CELL: Cell = Cell::Empty;

/// Input table: ordered headers and row-major cells.
///
/// Rows are padded (or truncated) to the header width on construction, so
/// every row has exactly one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell at `(row, column)`, or `Empty` when out of range.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Rows as JSON objects keyed by header, for inspection output.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = self
                    .headers
                    .iter()
                    .zip(row)
                    .map(|(header, cell)| {
                        let value = serde_json::to_value(cell).unwrap_or(Value::Null);
                        (header.clone(), value)
                    })
                    .collect();
                Value::Object(obj)
            })
            .collect()
    }
}

// =============================================================================
// Strain
// =============================================================================

/// Resistant-organism category of a patient record.
///
/// Declaration order is the order used wherever categories are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strain {
    /// Methicillin-resistant Staphylococcus aureus.
    #[serde(rename = "MRSA")]
    Mrsa,
    /// Extended-spectrum beta-lactamase producing Enterobacterales.
    #[serde(rename = "ESBLE")]
    Esble,
    /// Carbapenem-resistant organisms.
    #[serde(rename = "CRO")]
    Cro,
    /// No positive indicator.
    #[serde(rename = "OTHER")]
    Other,
}

impl Strain {
    pub const ALL: [Strain; 4] = [Strain::Mrsa, Strain::Esble, Strain::Cro, Strain::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mrsa => "MRSA",
            Self::Esble => "ESBLE",
            Self::Cro => "CRO",
            Self::Other => "OTHER",
        }
    }

    /// Parse a category label; case-insensitive, surrounding whitespace ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_uppercase();
        Self::ALL.into_iter().find(|s| s.as_str() == normalized)
    }
}

impl fmt::Display for Strain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown strain category '{}'", s))
    }
}

// =============================================================================
// Patient Record
// =============================================================================

/// A cleaned patient observation.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRecord {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub strain: Strain,
}

// =============================================================================
// Geographic Bounds
// =============================================================================

/// Inclusive latitude/longitude validity window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    /// Window around Zhuhai, widened to tolerate nearby outliers.
    pub const DEFAULT: GeoBounds = GeoBounds {
        min_lat: 20.0,
        max_lat: 25.0,
        min_lon: 110.0,
        max_lon: 120.0,
    };

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&latitude)
            && (self.min_lon..=self.max_lon).contains(&longitude)
    }

    /// Reject inverted or non-finite windows.
    pub fn check(&self) -> Result<(), String> {
        let values = [self.min_lat, self.max_lat, self.min_lon, self.max_lon];
        if values.iter().any(|v| !v.is_finite()) {
            return Err("bounds must be finite numbers".to_string());
        }
        if self.min_lat > self.max_lat {
            return Err(format!(
                "min latitude {} is greater than max latitude {}",
                self.min_lat, self.max_lat
            ));
        }
        if self.min_lon > self.max_lon {
            return Err(format!(
                "min longitude {} is greater than max longitude {}",
                self.min_lon, self.max_lon
            ));
        }
        Ok(())
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// =============================================================================
// Tests
// =============================================================================
