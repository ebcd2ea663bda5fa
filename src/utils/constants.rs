/// Default name of the unmapped input BAM a sample's strategy starts from,
/// used when a caller does not override it explicitly.
pub(crate) static DEFAULT_UBAM_NAME: &str = "ubam";

/// Default `final` token used when a caller does not override it explicitly.
pub(crate) static DEFAULT_FINAL_TOKEN: &str = "final";
