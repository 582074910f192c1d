//! Output documents.
//!
//! Three independent projections of the cleaned records:
//! - [`geojson`] - `mdro_patients.json`
//! - [`heatmap`] - `heatmap_data.json`
//! - [`stats`] - `data_stats.json`
//!
//! All three are rendered (and schema-checked) in memory first, then staged
//! as temporary files and renamed into place together, so a failed run never
//! leaves a partial set behind.

pub mod geojson;
pub mod heatmap;
pub mod stats;

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{ExportError, ExportResult};
use crate::models::PatientRecord;
use crate::validation::validate_document;

pub use geojson::{to_feature_collection, Feature, FeatureCollection};
pub use heatmap::{to_heatmap, HeatmapPoint, DEFAULT_INTENSITY};
pub use stats::{CoordinateBounds, DataStats};

/// The three documents a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputDocument {
    Patients,
    Heatmap,
    Stats,
}

impl OutputDocument {
    pub const ALL: [OutputDocument; 3] = [
        OutputDocument::Patients,
        OutputDocument::Heatmap,
        OutputDocument::Stats,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Patients => "mdro_patients.json",
            Self::Heatmap => "heatmap_data.json",
            Self::Stats => "data_stats.json",
        }
    }
}

impl fmt::Display for OutputDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Rendered, ready-to-write documents.
#[derive(Debug, Clone)]
pub struct RenderedDocuments {
    pub stats: DataStats,
    documents: Vec<(OutputDocument, String)>,
}

impl RenderedDocuments {
    /// Pretty-printed JSON of one document.
    pub fn get(&self, document: OutputDocument) -> Option<&str> {
        self.documents
            .iter()
            .find(|(d, _)| *d == document)
            .map(|(_, content)| content.as_str())
    }

    /// Create `dir` if needed and write every document into it.
    ///
    /// Each document is first written to a temporary file inside `dir`; the
    /// temporaries are renamed into place only once all of them were written
    /// and no target is blocked. A document already renamed is removed again
    /// if a later rename fails.
    pub fn write_to(&self, dir: &Path) -> ExportResult<Vec<PathBuf>> {
        fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut staged = Vec::with_capacity(self.documents.len());
        for (document, content) in &self.documents {
            let path = dir.join(document.file_name());
            if path.is_dir() {
                return Err(ExportError::Io {
                    path,
                    source: io::Error::other("target is a directory"),
                });
            }
            let file = stage_file(dir, content).map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;
            staged.push((file, path));
        }

        let mut written: Vec<PathBuf> = Vec::with_capacity(staged.len());
        for (file, path) in staged {
            if let Err(err) = file.persist(&path) {
                for done in &written {
                    let _ = fs::remove_file(done);
                }
                return Err(ExportError::Io {
                    path,
                    source: err.error,
                });
            }
            written.push(path);
        }
        Ok(written)
    }
}

fn stage_file(dir: &Path, content: &str) -> io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    // Temporaries are created owner-only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file().set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    file.as_file().sync_all()?;
    Ok(file)
}

/// Render all three documents, optionally checking each against its schema.
pub fn render_documents(
    records: &[PatientRecord],
    check_schemas: bool,
) -> ExportResult<RenderedDocuments> {
    let stats = DataStats::from_records(records).ok_or(ExportError::NoRecords)?;

    let documents = vec![
        render(OutputDocument::Patients, &to_feature_collection(records), check_schemas)?,
        render(OutputDocument::Heatmap, &to_heatmap(records), check_schemas)?,
        render(OutputDocument::Stats, &stats, check_schemas)?,
    ];

    Ok(RenderedDocuments { stats, documents })
}

fn render<T: Serialize>(
    document: OutputDocument,
    data: &T,
    check_schema: bool,
) -> ExportResult<(OutputDocument, String)> {
    if check_schema {
        let value = serde_json::to_value(data)?;
        validate_document(document, &value).map_err(|errors| ExportError::Schema {
            document: document.file_name().to_string(),
            errors,
        })?;
    }
    // Serialized from the struct, not the Value, to keep field order
    let content = serde_json::to_string_pretty(data)?;
    Ok((document, content))
}
