use std::collections::{BTreeMap, BTreeSet};

use super::error::PlanError;

/// The named substitution points recognised inside a path template. Every
/// template in this module consumes a fixed subset of these; `render`
/// enforces that the fields supplied exactly match the fields consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Token {
    Root,
    LogDir,
    RefName,
    Mapper,
    LinkName,
}

impl Token {
    fn name(self) -> &'static str {
        match self {
            Token::Root => "root",
            Token::LogDir => "log_dir",
            Token::RefName => "ref_name",
            Token::Mapper => "mapper",
            Token::LinkName => "link_name",
        }
    }

    fn from_name(name: &str) -> Option<Token> {
        match name {
            "root" => Some(Token::Root),
            "log_dir" => Some(Token::LogDir),
            "ref_name" => Some(Token::RefName),
            "mapper" => Some(Token::Mapper),
            "link_name" => Some(Token::LinkName),
            _ => None,
        }
    }
}

/// The concrete values available for substitution in one `render` call.
#[derive(Debug, Default, Clone)]
pub struct Fields<'a> {
    values: BTreeMap<Token, &'a str>,
}

impl<'a> Fields<'a> {
    pub fn new() -> Self {
        Fields {
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, token: Token, value: &'a str) -> Self {
        self.values.insert(token, value);
        self
    }
}

/// Substitutes every `{token}` placeholder in `template` with the matching
/// value from `fields`. Every placeholder in the template must have a
/// supplied field, and every supplied field must be used by the template --
/// this is the one typed path-construction primitive the rest of the
/// planner funnels through, in place of ad-hoc `format!` calls scattered
/// across the module.
pub fn render(template: &str, fields: &Fields) -> Result<String, PlanError> {
    let mut out = String::with_capacity(template.len());
    let mut used = BTreeSet::new();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let end = rest[start..]
            .find('}')
            .map(|i| i + start)
            .ok_or_else(|| PlanError::MalformedTemplate(template.to_string()))?;

        out.push_str(&rest[..start]);
        let name = &rest[start + 1..end];
        let token = Token::from_name(name)
            .ok_or_else(|| PlanError::UnknownTemplateToken(name.to_string()))?;
        let value = fields
            .values
            .get(&token)
            .ok_or_else(|| PlanError::MissingTemplateField(name.to_string()))?;
        out.push_str(value);
        used.insert(token);
        rest = &rest[end + 1..];
    }
    out.push_str(rest);

    if used.len() != fields.values.len() {
        let extra: Vec<&str> = fields
            .values
            .keys()
            .filter(|t| !used.contains(t))
            .map(|t| t.name())
            .collect();
        return Err(PlanError::ExtraTemplateField(extra.join(", ")));
    }

    Ok(out)
}

pub const LINKED_BAM: &str = "{root}/{link_name}.bam";
pub const MAPPED_BAM: &str = "{root}/{ref_name}.{mapper}.bam";
pub const UNMAPPED_BAM: &str = "{root}/not_{ref_name}.{mapper}.bam";
pub const MAP_LOG: &str = "{log_dir}/{ref_name}.{mapper}.log";
pub const SPLICE_HEADER_LOG: &str = "{log_dir}/{ref_name}.{mapper}.splice_bam_header.log";
/// Canonical STAR final-log path downstream consumers look up by the
/// sample's `final` link name, independent of which mapper actually
/// produced `final`.
pub const CANONICAL_FINAL_LOG: &str = "{log_dir}/{link_name}.STAR.log";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_mapped_bam_path() {
        let fields = Fields::new()
            .with(Token::Root, "/data/proj/sample1")
            .with(Token::RefName, "genome")
            .with(Token::Mapper, "STAR");
        let p = render(MAPPED_BAM, &fields).unwrap();
        assert_eq!(p, "/data/proj/sample1/genome.STAR.bam");
    }

    #[test]
    fn renders_unmapped_bam_path() {
        let fields = Fields::new()
            .with(Token::Root, "/data/proj/sample1")
            .with(Token::RefName, "rRNA")
            .with(Token::Mapper, "bowtie2");
        let p = render(UNMAPPED_BAM, &fields).unwrap();
        assert_eq!(p, "/data/proj/sample1/not_rRNA.bowtie2.bam");
    }

    #[test]
    fn rejects_unknown_token() {
        let fields = Fields::new().with(Token::Root, "/data");
        let err = render("{root}/{bogus}.bam", &fields).unwrap_err();
        assert!(matches!(err, PlanError::UnknownTemplateToken(_)));
    }

    #[test]
    fn rejects_missing_field() {
        let fields = Fields::new().with(Token::Root, "/data");
        let err = render(MAPPED_BAM, &fields).unwrap_err();
        assert!(matches!(err, PlanError::MissingTemplateField(_)));
    }

    #[test]
    fn rejects_unconsumed_field() {
        let fields = Fields::new()
            .with(Token::Root, "/data")
            .with(Token::LinkName, "final");
        let err = render("{root}/flat.bam", &fields).unwrap_err();
        assert!(matches!(err, PlanError::ExtraTemplateField(_)));
    }
}
