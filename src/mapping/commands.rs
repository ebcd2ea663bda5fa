use std::path::PathBuf;

use niffler::compression::Format;

use super::mapper::Mapper;
use super::reference::ResolvedReference;
use super::rules::MapRule;
use crate::utils::prog_utils::detect_compression;

/// The declarative description of how to build one mapper's index. The
/// synthesiser never runs this -- it only describes it -- so the executor
/// decides when and how to dispatch the index builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBuildDescription {
    pub mapper: Mapper,
    pub sequence: PathBuf,
    pub sequence_compression: Format,
    pub annotation: Option<PathBuf>,
    pub annotation_compression: Option<Format>,
    /// Directory (STAR) or path prefix (bowtie2) the index is built into.
    pub output: PathBuf,
    /// Sentinel file whose existence proves the index is already built.
    pub sentinel: PathBuf,
    pub min_version: &'static str,
}

impl IndexBuildDescription {
    pub fn requires_decompression(&self) -> bool {
        self.sequence_compression != Format::No
            || matches!(self.annotation_compression, Some(f) if f != Format::No)
    }
}

pub fn synthesize_index_build(mapper: Mapper, resolved: &ResolvedReference) -> IndexBuildDescription {
    let sequence_compression = detect_compression(&resolved.sequence);
    let annotation_compression = resolved.annotation.as_deref().map(detect_compression);

    match mapper {
        Mapper::Star => IndexBuildDescription {
            mapper,
            sequence: resolved.sequence.clone(),
            sequence_compression,
            annotation: resolved.annotation.clone(),
            annotation_compression,
            output: resolved.star_index_dir.clone(),
            sentinel: resolved.star_index_file.clone(),
            min_version: ">=2.7.0, <3.0.0",
        },
        Mapper::Bowtie2 => IndexBuildDescription {
            mapper,
            sequence: resolved.sequence.clone(),
            sequence_compression,
            annotation: None,
            annotation_compression: None,
            output: resolved.bt2_index_param.clone(),
            sentinel: resolved.bt2_index_file.clone(),
            min_version: ">=2.4.0, <3.0.0",
        },
    }
}

/// The post-alignment stage spliced between a mapper's raw BAM stream and
/// the artifact the plan registers as that rule's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationCommand {
    /// No annotation is registered for this rule's reference: the stage
    /// merely repackages the mapper's stream unchanged.
    PassThrough,
    /// Tags every mapped record with gene/feature annotations read from a
    /// pre-compiled side-table, logging as it goes.
    Tag {
        compiled_annotation: PathBuf,
        log: PathBuf,
    },
}

impl AnnotationCommand {
    pub fn describe(&self) -> String {
        match self {
            AnnotationCommand::PassThrough => {
                "pass-through: repackage the mapped BAM stream unchanged".to_string()
            }
            AnnotationCommand::Tag {
                compiled_annotation,
                log,
            } => format!(
                "tag: consult {} and append gene/feature tags to each mapped record, logging to {}",
                compiled_annotation.display(),
                log.display()
            ),
        }
    }
}

pub fn synthesize_annotation_command(rule: &MapRule) -> AnnotationCommand {
    match (&rule.ann_final_compiled_target, &rule.log_path) {
        (Some(target), log) => AnnotationCommand::Tag {
            compiled_annotation: target.clone(),
            log: log.clone(),
        },
        (None, _) => AnnotationCommand::PassThrough,
    }
}

/// The header-provenance stage: merges the program-record history of the
/// upstream BAM with the new mapper's own program record, so every
/// produced BAM carries a complete chain back to the uBAM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSpliceStage {
    pub upstream_bam: PathBuf,
    pub mapper_program_record: String,
    pub log: PathBuf,
}

pub fn synthesize_header_splice(rule: &MapRule) -> HeaderSpliceStage {
    HeaderSpliceStage {
        upstream_bam: rule.input_path.clone(),
        mapper_program_record: format!("{}:{}", rule.mapper, rule.ref_name),
        log: rule.splice_header_log_path.clone(),
    }
}
