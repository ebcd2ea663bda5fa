use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use super::error::PlanError;
use super::mapper::Mapper;

static IDENTIFIER_RE: OnceLock<Regex> = OnceLock::new();

fn identifier_re() -> &'static Regex {
    IDENTIFIER_RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap())
}

fn validate_identifier(s: &str) -> Result<(), PlanError> {
    if identifier_re().is_match(s) {
        Ok(())
    } else {
        Err(PlanError::InvalidIdentifier(s.to_string()))
    }
}

/// One alignment step as parsed from a strategy string, before the plan
/// builder has consulted a sample row or a reference registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule {
    pub input_name: String,
    pub mapper: Mapper,
    pub ref_name: String,
}

impl ParsedRule {
    pub fn out_name(&self) -> String {
        format!("{}.{}", self.ref_name, self.mapper)
    }
}

/// A pure renaming of an existing map rule's output, parsed either from a
/// rule's explicit label or synthesised for the `final` artifact when no
/// rule in the strategy carries that label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSymlink {
    pub link_src: String,
    pub link_name: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedStrategy {
    pub rules: Vec<ParsedRule>,
    pub symlinks: Vec<ParsedSymlink>,
}

/// Parses a strategy string into an ordered list of map rules and symlink
/// rules. Pure: no filesystem access, no sample context -- `left` (the
/// uBAM's logical name) and `final_token` (the caller's canonical `final`
/// name, which may itself carry processing-flag suffixes) are the only
/// external inputs.
pub fn parse_strategy(
    strategy: &str,
    left: &str,
    final_token: &str,
) -> Result<ParsedStrategy, PlanError> {
    if strategy.trim().is_empty() {
        return Err(PlanError::EmptyStrategy);
    }

    let mut rules = Vec::new();
    let mut symlinks = Vec::new();
    let mut saw_final = false;
    let mut current_left = left.to_string();
    let mut prev_stage_text: Option<&str> = None;

    for stage_text in strategy.split("->") {
        // consecutive stages with identical text collapse silently -- the
        // second occurrence would otherwise just redo the same alignment.
        if prev_stage_text == Some(stage_text) {
            prev_stage_text = Some(stage_text);
            continue;
        }
        prev_stage_text = Some(stage_text);

        let mut last_out_name: Option<String> = None;
        for rule_text in stage_text.split(',') {
            let fields: Vec<&str> = rule_text.split(':').collect();
            let (mapper_str, ref_name, label) = match fields.as_slice() {
                [m, r] => (*m, *r, None),
                [m, r, l] => (*m, *r, Some(*l)),
                _ => return Err(PlanError::MalformedRule(rule_text.to_string())),
            };

            if mapper_str.is_empty() || ref_name.is_empty() {
                return Err(PlanError::MalformedRule(rule_text.to_string()));
            }
            validate_identifier(ref_name)?;

            let mapper = Mapper::from_str(mapper_str)
                .map_err(|_| PlanError::UnknownMapper(mapper_str.to_string()))?;

            let parsed = ParsedRule {
                input_name: current_left.clone(),
                mapper,
                ref_name: ref_name.to_string(),
            };
            let out_name = parsed.out_name();
            last_out_name = Some(out_name.clone());

            if let Some(label) = label {
                validate_identifier(label)?;
                if label.contains("final") {
                    saw_final = true;
                }
                let link_name = label.replace("final", final_token);
                symlinks.push(ParsedSymlink {
                    link_src: out_name,
                    link_name,
                });
            }

            rules.push(parsed);
        }

        // the unmapped residue of all rules in a stage is, per the observed
        // "last-wins" policy (see SPEC_FULL.md open questions), the
        // residue of the last rule parsed in that stage.
        if let Some(last_out) = last_out_name {
            current_left = format!("not_{}", last_out);
        }
    }

    if rules.is_empty() {
        return Err(PlanError::EmptyStrategy);
    }

    if !saw_final {
        let last_out = rules.last().expect("checked non-empty above").out_name();
        symlinks.push(ParsedSymlink {
            link_src: last_out,
            link_name: final_token.to_string(),
        });
    }

    Ok(ParsedStrategy { rules, symlinks })
}

#[cfg(test)]
mod tests {
    use super::*;

    const UBAM: &str = "ubam";
    const FINAL: &str = "final";

    #[test]
    fn single_star_rule() {
        let ps = parse_strategy("STAR:genome", UBAM, FINAL).unwrap();
        assert_eq!(ps.rules.len(), 1);
        assert_eq!(ps.rules[0].out_name(), "genome.STAR");
        assert_eq!(ps.rules[0].input_name, UBAM);
        assert_eq!(ps.symlinks.len(), 1);
        assert_eq!(ps.symlinks[0].link_src, "genome.STAR");
        assert_eq!(ps.symlinks[0].link_name, FINAL);
    }

    #[test]
    fn sequential_stages_chain_unmapped_residue() {
        let ps = parse_strategy("bowtie2:rRNA->STAR:genome:final", UBAM, FINAL).unwrap();
        assert_eq!(ps.rules.len(), 2);
        assert_eq!(ps.rules[0].out_name(), "rRNA.bowtie2");
        assert_eq!(ps.rules[0].input_name, UBAM);
        assert_eq!(ps.rules[1].out_name(), "genome.STAR");
        assert_eq!(ps.rules[1].input_name, "not_rRNA.bowtie2");
        assert_eq!(ps.symlinks.len(), 1);
        assert_eq!(ps.symlinks[0].link_src, "genome.STAR");
    }

    #[test]
    fn parallel_stage_with_explicit_label() {
        let ps = parse_strategy("bowtie2:rRNA:rRNA,STAR:genome:final", UBAM, FINAL).unwrap();
        assert_eq!(ps.rules.len(), 2);
        assert_eq!(ps.rules[0].input_name, UBAM);
        assert_eq!(ps.rules[1].input_name, UBAM);
        assert_eq!(ps.symlinks.len(), 2);
        assert_eq!(ps.symlinks[0].link_src, "rRNA.bowtie2");
        assert_eq!(ps.symlinks[0].link_name, "rRNA");
        assert_eq!(ps.symlinks[1].link_src, "genome.STAR");
        assert_eq!(ps.symlinks[1].link_name, FINAL);
    }

    #[test]
    fn default_final_synthesised_when_absent() {
        let ps = parse_strategy("STAR:phiX->STAR:genome", UBAM, FINAL).unwrap();
        assert_eq!(ps.rules[0].out_name(), "phiX.STAR");
        assert_eq!(ps.rules[1].input_name, "not_phiX.STAR");
        assert_eq!(ps.symlinks.len(), 1);
        assert_eq!(ps.symlinks[0].link_src, "genome.STAR");
        assert_eq!(ps.symlinks[0].link_name, FINAL);
    }

    #[test]
    fn final_from_bowtie2_only_rule() {
        let ps = parse_strategy("bowtie2:rRNA:final", UBAM, FINAL).unwrap();
        assert_eq!(ps.rules.len(), 1);
        assert_eq!(ps.symlinks[0].link_src, "rRNA.bowtie2");
    }

    #[test]
    fn parallel_stage_last_wins_residue() {
        let ps = parse_strategy("STAR:genome:final,bowtie2:rRNA->STAR:spike", UBAM, FINAL).unwrap();
        // both parallel rules see the same uBAM input
        assert_eq!(ps.rules[0].input_name, UBAM);
        assert_eq!(ps.rules[1].input_name, UBAM);
        // the next stage's input is the residue of the LAST rule parsed in
        // the previous stage (bowtie2:rRNA), discarding STAR:genome's residue
        assert_eq!(ps.rules[2].input_name, "not_rRNA.bowtie2");
        assert_eq!(ps.symlinks[0].link_src, "genome.STAR");
    }

    #[test]
    fn final_label_substitutes_processing_suffix() {
        let ps = parse_strategy(
            "STAR:genome:final",
            UBAM,
            "final.polyA_adapter_trimmed",
        )
        .unwrap();
        assert_eq!(ps.symlinks[0].link_name, "final.polyA_adapter_trimmed");
    }

    #[test]
    fn consecutive_identical_stages_collapse() {
        let ps = parse_strategy("STAR:genome->STAR:genome", UBAM, FINAL).unwrap();
        assert_eq!(ps.rules.len(), 1);
    }

    #[test]
    fn empty_strategy_is_rejected() {
        assert!(matches!(
            parse_strategy("", UBAM, FINAL),
            Err(PlanError::EmptyStrategy)
        ));
        assert!(matches!(
            parse_strategy("   ", UBAM, FINAL),
            Err(PlanError::EmptyStrategy)
        ));
    }

    #[test]
    fn malformed_rule_arity_is_rejected() {
        assert!(matches!(
            parse_strategy("STAR", UBAM, FINAL),
            Err(PlanError::MalformedRule(_))
        ));
        assert!(matches!(
            parse_strategy("STAR:genome:final:extra", UBAM, FINAL),
            Err(PlanError::MalformedRule(_))
        ));
    }

    #[test]
    fn unknown_mapper_is_rejected() {
        assert!(matches!(
            parse_strategy("bwa:genome", UBAM, FINAL),
            Err(PlanError::UnknownMapper(_))
        ));
    }

    #[test]
    fn parser_is_idempotent() {
        let a = parse_strategy("bowtie2:rRNA->STAR:genome:final", UBAM, FINAL).unwrap();
        let b = parse_strategy("bowtie2:rRNA->STAR:genome:final", UBAM, FINAL).unwrap();
        assert_eq!(a, b);
    }
}
