//! Spreadsheet loading with format, encoding and delimiter auto-detection.
//!
//! Produces a [`RawTable`]; no MDRO-specific logic here.
//!
//! - Workbooks (`xlsx`, `xlsm`, `xlsb`, `xls`, `ods`) are read with calamine,
//!   first worksheet only, first row as headers.
//! - Everything else is treated as delimited text.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde::Serialize;

use crate::error::{LoadError, LoadResult};
use crate::models::{Cell, RawTable};

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Where a table came from and how it was decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceFormat {
    Delimited { encoding: String, delimiter: char },
    Workbook { sheet: String },
}

/// Result of loading with metadata.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub table: RawTable,
    pub source: SourceFormat,
}

/// Load a spreadsheet, picking the reader from the file extension.
pub fn load_table<P: AsRef<Path>>(path: P) -> LoadResult<ParsedTable> {
    let path = path.as_ref();
    if is_workbook(path) {
        parse_workbook(path)
    } else {
        parse_delimited_file(path)
    }
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| WORKBOOK_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

// =============================================================================
// Workbooks
// =============================================================================

/// Read the first worksheet of a workbook.
pub fn parse_workbook(path: &Path) -> LoadResult<ParsedTable> {
    if let Err(source) = std::fs::metadata(path) {
        return Err(LoadError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    let mut workbook =
        open_workbook_auto(path).map_err(|e| LoadError::Workbook(e.to_string()))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| LoadError::Workbook("workbook has no worksheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| LoadError::Workbook(format!("sheet '{}': {}", sheet, e)))?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(LoadError::EmptyFile)?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|c| c.to_string().trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(LoadError::NoHeaders);
    }

    let data = rows
        .map(|row| row.iter().map(workbook_cell).collect())
        .collect();

    Ok(ParsedTable {
        table: RawTable::new(headers, data),
        source: SourceFormat::Workbook { sheet },
    })
}

fn workbook_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_text(s),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
    }
}

// =============================================================================
// Delimited text
// =============================================================================

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    // chardet guesses poorly on short samples; valid UTF-8 is taken as such
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "gb2312" | "gbk" | "gb18030" => "gb18030".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding label.
///
/// A leading UTF-8 byte-order mark is removed.
pub fn decode_content(bytes: &[u8], encoding: &str) -> LoadResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match String::from_utf8(bytes.to_vec()) {
            Ok(s) => s,
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        },
        // WHATWG maps the latin1 labels onto windows-1252
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        label => {
            let codec = encoding_rs::Encoding::for_label(label.as_bytes()).ok_or_else(|| {
                LoadError::Encoding {
                    encoding: label.to_string(),
                    message: "unsupported encoding label".to_string(),
                }
            })?;
            codec.decode(bytes).0.into_owned()
        }
    };

    Ok(decoded
        .strip_prefix('\u{feff}')
        .map(str::to_string)
        .unwrap_or(decoded))
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Read and parse a delimited text file with auto-detection.
pub fn parse_delimited_file(path: &Path) -> LoadResult<ParsedTable> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytes_auto(&bytes)
}

/// Parse delimited bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> LoadResult<ParsedTable> {
    if bytes.is_empty() {
        return Err(LoadError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let table = parse_delimited(&content, delimiter)?;

    Ok(ParsedTable {
        table,
        source: SourceFormat::Delimited {
            encoding,
            delimiter,
        },
    })
}

/// Parse decoded delimited text with an explicit delimiter.
///
/// Quoted fields are honoured, ragged rows are padded, cells are trimmed.
pub fn parse_delimited(content: &str, delimiter: char) -> LoadResult<RawTable> {
    if content.trim().is_empty() {
        return Err(LoadError::EmptyFile);
    }
    if !delimiter.is_ascii() {
        return Err(LoadError::Parse {
            line: 1,
            message: format!("delimiter '{}' is not a single-byte character", delimiter),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(LoadError::NoHeaders);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    Ok(RawTable::new(headers, rows))
}

fn csv_error(err: csv::Error) -> LoadError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    LoadError::Parse {
        line,
        message: err.to_string(),
    }
}
