use std::path::PathBuf;

use super::mapper::Mapper;

/// One alignment step, fully qualified by the plan builder: every path is
/// absolute (relative to the run root), every flag and index location has
/// had reference-registry defaults applied. Immutable once built.
#[derive(Debug, Clone)]
pub struct MapRule {
    pub input_name: String,
    pub mapper: Mapper,
    pub ref_name: String,
    pub out_name: String,

    pub project_id: String,
    pub sample_id: String,

    pub input_path: PathBuf,
    pub out_path: PathBuf,
    pub unmapped_path: PathBuf,
    pub log_path: PathBuf,
    pub splice_header_log_path: PathBuf,

    pub map_index: PathBuf,
    pub map_index_param: PathBuf,
    pub map_index_file: PathBuf,
    pub map_flags: String,

    /// Source annotation registered against this rule's reference, if any.
    pub ann_path: Option<PathBuf>,
    /// Per-rule copy of the annotation consulted by the tagging stage.
    pub ann_final: Option<PathBuf>,
    /// Per-rule path to the compiled annotation side-table.
    pub ann_final_compiled: Option<PathBuf>,
    /// Shared, reference-scoped compiled side-table `ann_final_compiled`
    /// resolves to -- compiled once per reference, not once per sample.
    pub ann_final_compiled_target: Option<PathBuf>,
}

impl MapRule {
    pub fn is_annotated(&self) -> bool {
        self.ann_path.is_some()
    }
}

/// A pure renaming of an existing map rule's output. Fully qualified by the
/// plan builder in the same pass as `MapRule`.
#[derive(Debug, Clone)]
pub struct SymlinkRule {
    pub link_src: String,
    pub link_name: String,
    pub ref_name: String,
    pub project_id: String,
    pub sample_id: String,
    pub src_path: PathBuf,
    pub link_path: PathBuf,
}
