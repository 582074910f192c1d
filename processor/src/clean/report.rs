//! Per-stage row accounting for the cleaner.

use std::fmt;

use serde::Serialize;

/// Cleaning stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStage {
    BlankRows,
    Coercion,
    MissingValues,
    Bounds,
    StrainDomain,
    Duplicates,
}

impl fmt::Display for CleaningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BlankRows => "blank row removal",
            Self::Coercion => "numeric coercion",
            Self::MissingValues => "missing value check",
            Self::Bounds => "coordinate bounds check",
            Self::StrainDomain => "strain category check",
            Self::Duplicates => "deduplication",
        })
    }
}

/// Row counts around one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: CleaningStage,
    pub rows_before: usize,
    pub rows_after: usize,
    pub reason: String,
}

impl StageReport {
    pub fn new(
        stage: CleaningStage,
        rows_before: usize,
        rows_after: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            rows_before,
            rows_after,
            reason: reason.into(),
        }
    }

    pub fn dropped(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// All stage reports of one cleaning run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub stages: Vec<StageReport>,
}

impl CleaningReport {
    pub fn new(input_rows: usize) -> Self {
        Self {
            input_rows,
            stages: Vec::new(),
        }
    }

    pub fn add(&mut self, stage: StageReport) {
        self.stages.push(stage);
    }

    pub fn stage(&self, stage: CleaningStage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Rows left after the last recorded stage.
    pub fn final_rows(&self) -> usize {
        self.stages
            .last()
            .map(|s| s.rows_after)
            .unwrap_or(self.input_rows)
    }

    pub fn total_dropped(&self) -> usize {
        self.input_rows.saturating_sub(self.final_rows())
    }
}
