use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::defaults::{DefaultMapperParams, DefaultParams};
use super::error::PlanError;

/// A named reference sequence (and optional annotation) a strategy may
/// align against. Immutable once loaded into a `ReferenceRegistry` --
/// flags and index locations here are *overrides*; anything left unset
/// falls back to `DefaultParams` at resolution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub sequence: PathBuf,
    #[serde(default)]
    pub annotation: Option<PathBuf>,
    #[serde(rename = "STAR_flags", default)]
    pub star_flags: Option<String>,
    #[serde(rename = "BT2_flags", default)]
    pub bt2_flags: Option<String>,
    #[serde(rename = "BT2_index", default)]
    pub bt2_index: Option<PathBuf>,
    #[serde(rename = "index_dir", default)]
    pub index_dir: Option<PathBuf>,
}

/// A reference after defaults have been applied: every field a map rule
/// needs to run is fully resolved, never `None` where the rule requires it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub sequence: PathBuf,
    pub annotation: Option<PathBuf>,
    pub star_flags: String,
    pub bt2_flags: String,
    pub star_index_dir: PathBuf,
    pub star_index_file: PathBuf,
    pub bt2_index_param: PathBuf,
    pub bt2_index_file: PathBuf,
    /// Shared, reference-scoped compiled annotation side-table. Present iff
    /// `annotation` is. Computed once per reference, reused by every sample
    /// and every rule that aligns against it.
    pub annotation_compiled_target: Option<PathBuf>,
}

/// Per species, a mapping from reference name to its registration. Loaded
/// once from a JSON document at planner construction and never mutated.
#[derive(Debug, Default)]
pub struct ReferenceRegistry(HashMap<String, HashMap<String, Reference>>);

impl ReferenceRegistry {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let text = fs::read_to_string(path).map_err(|source| PlanError::RegistryIo {
            path: path.to_path_buf(),
            source,
        })?;
        let inner: HashMap<String, HashMap<String, Reference>> =
            serde_json::from_str(&text).map_err(|source| PlanError::RegistryJson {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(ReferenceRegistry(inner))
    }

    pub fn resolve(&self, species: &str, ref_name: &str) -> Result<ResolvedReference, PlanError> {
        let r = self
            .0
            .get(species)
            .and_then(|refs| refs.get(ref_name))
            .ok_or_else(|| PlanError::UnknownReference {
                ref_name: ref_name.to_string(),
                species: species.to_string(),
            })?;

        if r.sequence.as_os_str().is_empty() {
            return Err(PlanError::MissingSequence(ref_name.to_string()));
        }

        let base_dir = r
            .index_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("species_data").join(species).join(ref_name));

        let star_index_dir = base_dir.join(DefaultParams::STAR_INDEX_DIRNAME);
        let star_index_file = star_index_dir.join(DefaultParams::STAR_INDEX_SENTINEL);

        let bt2_index_param = r.bt2_index.clone().unwrap_or_else(|| {
            base_dir
                .join(DefaultParams::BOWTIE2_INDEX_DIRNAME)
                .join(ref_name)
        });
        let bt2_index_file = {
            let stem = bt2_index_param
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            bt2_index_param.with_file_name(format!("{stem}.1.bt2"))
        };

        let annotation_compiled_target = r
            .annotation
            .as_ref()
            .map(|_| base_dir.join("annotation").join("compiled.ann"));

        Ok(ResolvedReference {
            sequence: r.sequence.clone(),
            annotation: r.annotation.clone(),
            star_flags: r
                .star_flags
                .clone()
                .unwrap_or_else(|| DefaultParams::STAR_FLAGS.to_string()),
            bt2_flags: r
                .bt2_flags
                .clone()
                .unwrap_or_else(|| DefaultParams::BOWTIE2_FLAGS.to_string()),
            star_index_dir,
            star_index_file,
            bt2_index_param,
            bt2_index_file,
            annotation_compiled_target,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_map(inner: HashMap<String, HashMap<String, Reference>>) -> Self {
        ReferenceRegistry(inner)
    }
}
