use std::path::{Path, PathBuf};

use super::commands::{synthesize_annotation_command, AnnotationCommand};
use super::error::PlanError;
use super::plan::Plan;

/// What `inputs(path)` returns for a map-rule artifact: the BAM it reads,
/// the index file its mapper depends on, and (if annotated) the compiled
/// annotation side-table it consults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInputs {
    pub bam: PathBuf,
    pub index_file: PathBuf,
    pub annotation: Option<PathBuf>,
}

/// What `params(path)` returns: the flags the mapper is invoked with, the
/// index it reads, and the annotation stage description the executor
/// should run downstream of the raw alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactParams {
    pub flags: String,
    pub index: PathBuf,
    pub annotation: Option<PathBuf>,
    pub annotation_cmd: AnnotationCommand,
}

/// The result of `ribo_log`: either the bowtie2/STAR log of the sample's
/// rRNA-depletion rule, or an explicit marker that no such rule exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiboLog {
    Path(PathBuf),
    NoRibosomalIndex,
}

impl Plan {
    /// Resolves `path` to its inputs. `path` must be one the plan itself
    /// produced (a map rule's `out_path` or a symlink's `link_path`);
    /// anything else is `UnknownArtifact`.
    pub fn inputs(&self, path: &Path) -> Result<ArtifactInputs, PlanError> {
        let rule = self.resolve_map_rule(path)?;
        Ok(ArtifactInputs {
            bam: rule.input_path.clone(),
            index_file: rule.map_index_file.clone(),
            annotation: rule.ann_final_compiled_target.clone(),
        })
    }

    pub fn params(&self, path: &Path) -> Result<ArtifactParams, PlanError> {
        let rule = self.resolve_map_rule(path)?;
        Ok(ArtifactParams {
            flags: rule.map_flags.clone(),
            index: rule.map_index_param.clone(),
            annotation: rule.ann_final.clone(),
            annotation_cmd: synthesize_annotation_command(rule),
        })
    }

    pub fn symlink_source(&self, path: &Path) -> Result<PathBuf, PlanError> {
        self.symlink(path)
            .map(|s| s.src_path.clone())
            .ok_or_else(|| PlanError::UnknownArtifact(path.to_path_buf()))
    }

    /// The bowtie2 log path of the sample's rRNA-depletion rule, if its
    /// strategy registered one. A `STAR:rRNA` rule does not count -- the
    /// spec names this as specifically the bowtie2 log.
    pub fn ribo_log(&self) -> RiboLog {
        self.map_rules()
            .find(|r| r.ref_name == "rRNA" && r.mapper == super::mapper::Mapper::Bowtie2)
            .map(|r| RiboLog::Path(r.log_path.clone()))
            .unwrap_or(RiboLog::NoRibosomalIndex)
    }

    /// Resolves `path` to the map rule that produced it, following a
    /// symlink one hop if `path` names a `SymlinkRule` instead.
    fn resolve_map_rule(&self, path: &Path) -> Result<&super::rules::MapRule, PlanError> {
        if let Some(rule) = self.map_rule(path) {
            return Ok(rule);
        }
        if let Some(symlink) = self.symlink(path) {
            return self
                .map_rule(&symlink.src_path)
                .ok_or_else(|| PlanError::UnknownArtifact(path.to_path_buf()));
        }
        Err(PlanError::UnknownArtifact(path.to_path_buf()))
    }
}
