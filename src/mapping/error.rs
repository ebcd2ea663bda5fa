use std::path::PathBuf;
use thiserror::Error;

/// The closed taxonomy of failures the planner can raise. Every variant
/// surfaces immediately and aborts plan construction for the offending
/// sample only; other samples' plans are unaffected.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("strategy string is empty; at least one mapping rule is required")]
    EmptyStrategy,

    #[error("malformed rule `{0}`: expected `mapper:ref` or `mapper:ref:label`")]
    MalformedRule(String),

    #[error("unknown mapper `{0}`; expected `STAR` or `bowtie2`")]
    UnknownMapper(String),

    #[error("`{0}` is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("reference `{ref_name}` is not registered for species `{species}`")]
    UnknownReference { ref_name: String, species: String },

    #[error("reference `{0}` has no sequence path configured")]
    MissingSequence(String),

    #[error("duplicate artifact path {path} produced by more than one rule in sample {project_id}/{sample_id}")]
    DuplicateArtifact {
        path: PathBuf,
        project_id: String,
        sample_id: String,
    },

    #[error("symlink rule `{link_name}` has no matching map rule `{link_src}` in sample {project_id}/{sample_id}")]
    DanglingSymlink {
        link_src: String,
        link_name: String,
        project_id: String,
        sample_id: String,
    },

    #[error("sample {project_id}/{sample_id} has no `final` symlink registered")]
    MissingFinal {
        project_id: String,
        sample_id: String,
    },

    #[error("no artifact registered at path {0}")]
    UnknownArtifact(PathBuf),

    #[error("unknown template token `{{{0}}}`")]
    UnknownTemplateToken(String),

    #[error("template is missing a value for `{{{0}}}`")]
    MissingTemplateField(String),

    #[error("template does not consume supplied field(s): {0}")]
    ExtraTemplateField(String),

    #[error("malformed path template `{0}`: unterminated `{{`")]
    MalformedTemplate(String),

    #[error("failed to read sample table at {path}: {source}")]
    SampleTableIo {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read reference registry at {path}: {source}")]
    RegistryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse reference registry at {path}: {source}")]
    RegistryJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
