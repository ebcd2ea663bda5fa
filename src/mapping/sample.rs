use std::path::Path;

use serde::Deserialize;

use super::error::PlanError;

/// One row of the sample table, indexed by `(project_id, sample_id)`.
#[derive(Debug, Clone, Deserialize)]
pub struct SampleRow {
    pub project_id: String,
    pub sample_id: String,
    pub species: String,
    #[serde(default)]
    pub map_strategy: Option<String>,
    #[serde(default)]
    pub is_merged: bool,
}

/// The sample table loaded once at planner construction and never mutated
/// for the duration of a run.
#[derive(Debug, Clone, Default)]
pub struct SampleTable(Vec<SampleRow>);

impl SampleTable {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|source| PlanError::SampleTableIo {
                path: path.to_path_buf(),
                source,
            })?;

        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let row: SampleRow = record.map_err(|source| PlanError::SampleTableIo {
                path: path.to_path_buf(),
                source,
            })?;
            rows.push(row);
        }
        Ok(SampleTable(rows))
    }

    pub fn rows(&self) -> &[SampleRow] {
        &self.0
    }

    /// Rows the plan builder must actually build plans for: merged samples
    /// inherit their plan from upstream merging logic and are skipped.
    pub fn non_merged(&self) -> impl Iterator<Item = &SampleRow> {
        self.0.iter().filter(|r| !r.is_merged)
    }

    #[cfg(test)]
    pub(crate) fn from_rows(rows: Vec<SampleRow>) -> Self {
        SampleTable(rows)
    }
}
