use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::error::PlanError;
use super::mapper::Mapper;
use super::reference::ReferenceRegistry;
use super::rules::{MapRule, SymlinkRule};
use super::sample::{SampleRow, SampleTable};
use super::strategy::parse_strategy;
use super::template::{
    render, Fields, Token, CANONICAL_FINAL_LOG, LINKED_BAM, MAPPED_BAM, MAP_LOG,
    SPLICE_HEADER_LOG, UNMAPPED_BAM,
};
use crate::utils::constants::{DEFAULT_FINAL_TOKEN, DEFAULT_UBAM_NAME};

/// Identifies a sample's plan within a run: `(project_id, sample_id)`.
pub type SampleKey = (String, String);

/// A fully-built, read-only plan for one sample: every map rule and
/// symlink rule the strategy induces, plus the derived lookup tables the
/// query surface is a view over.
#[derive(Debug, Clone)]
pub struct Plan {
    pub project_id: String,
    pub sample_id: String,
    map_rules: BTreeMap<PathBuf, MapRule>,
    symlinks: BTreeMap<PathBuf, SymlinkRule>,
    index_table: BTreeMap<PathBuf, Mapper>,
    annotated: BTreeSet<PathBuf>,
    star_final_log_symlinks: BTreeMap<PathBuf, PathBuf>,
    final_path: PathBuf,
}

impl Plan {
    pub fn map_rule(&self, path: &Path) -> Option<&MapRule> {
        self.map_rules.get(path)
    }

    pub fn symlink(&self, path: &Path) -> Option<&SymlinkRule> {
        self.symlinks.get(path)
    }

    /// All artifact paths the plan produces, map rules and symlinks alike,
    /// in sorted order.
    pub fn all_bams(&self) -> impl Iterator<Item = &PathBuf> {
        self.map_rules.keys().chain(self.symlinks.keys())
    }

    pub fn annotated_bams(&self) -> impl Iterator<Item = &PathBuf> {
        self.annotated.iter()
    }

    pub fn is_annotated(&self, path: &Path) -> bool {
        self.annotated.contains(path)
    }

    pub fn index_table(&self) -> &BTreeMap<PathBuf, Mapper> {
        &self.index_table
    }

    pub fn star_final_log_symlinks(&self) -> &BTreeMap<PathBuf, PathBuf> {
        &self.star_final_log_symlinks
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    pub fn map_rules(&self) -> impl Iterator<Item = &MapRule> {
        self.map_rules.values()
    }
}

/// Builds `Plan`s from parsed strategies, the sample table, and the
/// reference registry. Stateless: construction is the only thing it does.
pub struct PlanBuilder;

impl PlanBuilder {
    /// Builds a plan for every non-merged row of `sample_table`. A failure
    /// building one sample's plan never poisons another's -- each result
    /// is reported independently, keyed by `(project_id, sample_id)`.
    pub fn build_all(
        sample_table: &SampleTable,
        registry: &ReferenceRegistry,
        global_default_strategy: &str,
        root: &Path,
    ) -> Vec<(SampleKey, Result<Plan, PlanError>)> {
        sample_table
            .non_merged()
            .map(|row| {
                let key = (row.project_id.clone(), row.sample_id.clone());
                let result = Self::build_one(row, registry, global_default_strategy, root);
                (key, result)
            })
            .collect()
    }

    fn build_one(
        row: &SampleRow,
        registry: &ReferenceRegistry,
        global_default_strategy: &str,
        root: &Path,
    ) -> Result<Plan, PlanError> {
        let strategy_str = row.map_strategy.as_deref().unwrap_or(global_default_strategy);
        let parsed = parse_strategy(strategy_str, DEFAULT_UBAM_NAME, DEFAULT_FINAL_TOKEN)?;

        let sample_root = root.join(&row.project_id).join(&row.sample_id);
        let log_dir = sample_root.join("logs");
        let root_str = sample_root.to_string_lossy().into_owned();
        let log_dir_str = log_dir.to_string_lossy().into_owned();

        let mut map_rules: BTreeMap<PathBuf, MapRule> = BTreeMap::new();
        let mut index_table: BTreeMap<PathBuf, Mapper> = BTreeMap::new();
        let mut annotated: BTreeSet<PathBuf> = BTreeSet::new();

        for parsed_rule in &parsed.rules {
            let resolved = registry.resolve(&row.species, &parsed_rule.ref_name)?;
            let out_name = parsed_rule.out_name();
            let mapper_str = parsed_rule.mapper.to_string();

            let input_path = PathBuf::from(render(
                LINKED_BAM,
                &Fields::new()
                    .with(Token::Root, &root_str)
                    .with(Token::LinkName, &parsed_rule.input_name),
            )?);
            let out_path = PathBuf::from(render(
                MAPPED_BAM,
                &Fields::new()
                    .with(Token::Root, &root_str)
                    .with(Token::RefName, &parsed_rule.ref_name)
                    .with(Token::Mapper, &mapper_str),
            )?);
            let unmapped_path = PathBuf::from(render(
                UNMAPPED_BAM,
                &Fields::new()
                    .with(Token::Root, &root_str)
                    .with(Token::RefName, &parsed_rule.ref_name)
                    .with(Token::Mapper, &mapper_str),
            )?);
            let log_path = PathBuf::from(render(
                MAP_LOG,
                &Fields::new()
                    .with(Token::LogDir, &log_dir_str)
                    .with(Token::RefName, &parsed_rule.ref_name)
                    .with(Token::Mapper, &mapper_str),
            )?);
            let splice_header_log_path = PathBuf::from(render(
                SPLICE_HEADER_LOG,
                &Fields::new()
                    .with(Token::LogDir, &log_dir_str)
                    .with(Token::RefName, &parsed_rule.ref_name)
                    .with(Token::Mapper, &mapper_str),
            )?);

            if map_rules.contains_key(&out_path) {
                return Err(PlanError::DuplicateArtifact {
                    path: out_path,
                    project_id: row.project_id.clone(),
                    sample_id: row.sample_id.clone(),
                });
            }

            let (map_index, map_index_param, map_index_file) = match parsed_rule.mapper {
                Mapper::Star => (
                    resolved.star_index_dir.clone(),
                    resolved.star_index_dir.clone(),
                    resolved.star_index_file.clone(),
                ),
                Mapper::Bowtie2 => (
                    resolved.bt2_index_param.clone(),
                    resolved.bt2_index_param.clone(),
                    resolved.bt2_index_file.clone(),
                ),
            };
            let map_flags = match parsed_rule.mapper {
                Mapper::Star => resolved.star_flags.clone(),
                Mapper::Bowtie2 => resolved.bt2_flags.clone(),
            };

            let (ann_path, ann_final, ann_final_compiled, ann_final_compiled_target) =
                if resolved.annotation.is_some() {
                    (
                        resolved.annotation.clone(),
                        Some(sample_root.join(format!("{out_name}.annotation.gtf"))),
                        Some(sample_root.join(format!("{out_name}.annotation_compiled.bin"))),
                        resolved.annotation_compiled_target.clone(),
                    )
                } else {
                    (None, None, None, None)
                };

            if ann_path.is_some() {
                annotated.insert(out_path.clone());
            }
            index_table.insert(map_index_file.clone(), parsed_rule.mapper);

            let rule = MapRule {
                input_name: parsed_rule.input_name.clone(),
                mapper: parsed_rule.mapper,
                ref_name: parsed_rule.ref_name.clone(),
                out_name,
                project_id: row.project_id.clone(),
                sample_id: row.sample_id.clone(),
                input_path,
                out_path: out_path.clone(),
                unmapped_path,
                log_path,
                splice_header_log_path,
                map_index,
                map_index_param,
                map_index_file,
                map_flags,
                ann_path,
                ann_final,
                ann_final_compiled,
                ann_final_compiled_target,
            };

            map_rules.insert(out_path, rule);
        }

        let mut symlinks: BTreeMap<PathBuf, SymlinkRule> = BTreeMap::new();
        let mut star_final_log_symlinks: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
        let mut final_path: Option<PathBuf> = None;

        for parsed_symlink in &parsed.symlinks {
            let src_rule = map_rules
                .values()
                .find(|r| r.out_name == parsed_symlink.link_src)
                .ok_or_else(|| PlanError::DanglingSymlink {
                    link_src: parsed_symlink.link_src.clone(),
                    link_name: parsed_symlink.link_name.clone(),
                    project_id: row.project_id.clone(),
                    sample_id: row.sample_id.clone(),
                })?;

            let link_path = PathBuf::from(render(
                LINKED_BAM,
                &Fields::new()
                    .with(Token::Root, &root_str)
                    .with(Token::LinkName, &parsed_symlink.link_name),
            )?);

            if symlinks.contains_key(&link_path) || map_rules.contains_key(&link_path) {
                return Err(PlanError::DuplicateArtifact {
                    path: link_path,
                    project_id: row.project_id.clone(),
                    sample_id: row.sample_id.clone(),
                });
            }

            if parsed_symlink.link_name == DEFAULT_FINAL_TOKEN {
                final_path = Some(link_path.clone());
                if src_rule.mapper == Mapper::Star {
                    let canonical = PathBuf::from(render(
                        CANONICAL_FINAL_LOG,
                        &Fields::new()
                            .with(Token::LogDir, &log_dir_str)
                            .with(Token::LinkName, &parsed_symlink.link_name),
                    )?);
                    star_final_log_symlinks.insert(canonical, src_rule.log_path.clone());
                }
            }

            let symlink = SymlinkRule {
                link_src: parsed_symlink.link_src.clone(),
                link_name: parsed_symlink.link_name.clone(),
                ref_name: src_rule.ref_name.clone(),
                project_id: row.project_id.clone(),
                sample_id: row.sample_id.clone(),
                src_path: src_rule.out_path.clone(),
                link_path: link_path.clone(),
            };
            symlinks.insert(link_path, symlink);
        }

        let final_path = final_path.ok_or_else(|| PlanError::MissingFinal {
            project_id: row.project_id.clone(),
            sample_id: row.sample_id.clone(),
        })?;

        Ok(Plan {
            project_id: row.project_id.clone(),
            sample_id: row.sample_id.clone(),
            map_rules,
            symlinks,
            index_table,
            annotated,
            star_final_log_symlinks,
            final_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::reference::Reference;
    use std::collections::HashMap;

    fn registry() -> ReferenceRegistry {
        let mut human = HashMap::new();
        human.insert(
            "genome".to_string(),
            Reference {
                sequence: PathBuf::from("/refs/genome.fa"),
                annotation: Some(PathBuf::from("/refs/genome.gtf")),
                star_flags: None,
                bt2_flags: None,
                bt2_index: None,
                index_dir: None,
            },
        );
        human.insert(
            "rRNA".to_string(),
            Reference {
                sequence: PathBuf::from("/refs/rrna.fa.gz"),
                annotation: None,
                star_flags: None,
                bt2_flags: None,
                bt2_index: None,
                index_dir: None,
            },
        );
        let mut m = HashMap::new();
        m.insert("human".to_string(), human);
        ReferenceRegistry::from_map(m)
    }

    fn row(strategy: &str) -> SampleRow {
        SampleRow {
            project_id: "proj1".to_string(),
            sample_id: "sample1".to_string(),
            species: "human".to_string(),
            map_strategy: Some(strategy.to_string()),
            is_merged: false,
        }
    }

    #[test]
    fn single_star_rule_builds_final_and_star_log_symlink() {
        let reg = registry();
        let plan = PlanBuilder::build_one(&row("STAR:genome"), &reg, "STAR:genome", Path::new("/data")).unwrap();

        assert_eq!(
            plan.final_path(),
            Path::new("/data/proj1/sample1/final.bam")
        );
        let final_rule = plan.symlink(plan.final_path()).unwrap();
        assert_eq!(final_rule.link_src, "genome.STAR");
        assert_eq!(plan.star_final_log_symlinks().len(), 1);
        assert!(plan.is_annotated(&Path::new("/data/proj1/sample1/genome.STAR.bam").to_path_buf()));
    }

    #[test]
    fn bowtie2_final_has_no_star_log_symlink() {
        let reg = registry();
        let plan =
            PlanBuilder::build_one(&row("bowtie2:rRNA:final"), &reg, "STAR:genome", Path::new("/data")).unwrap();
        assert!(plan.star_final_log_symlinks().is_empty());
    }

    #[test]
    fn chained_strategy_builds_two_rules_with_chain_invariant() {
        let reg = registry();
        let plan = PlanBuilder::build_one(
            &row("bowtie2:rRNA->STAR:genome:final"),
            &reg,
            "STAR:genome",
            Path::new("/data"),
        )
        .unwrap();

        let rules: Vec<_> = plan.map_rules().collect();
        assert_eq!(rules.len(), 2);
        let star_rule = rules.iter().find(|r| r.mapper == Mapper::Star).unwrap();
        assert_eq!(star_rule.input_name, "not_rRNA.bowtie2");
        assert_eq!(
            star_rule.input_path,
            PathBuf::from("/data/proj1/sample1/not_rRNA.bowtie2.bam")
        );
    }

    #[test]
    fn duplicate_out_name_is_rejected() {
        let reg = registry();
        let err = PlanBuilder::build_one(
            &row("STAR:genome,STAR:genome"),
            &reg,
            "STAR:genome",
            Path::new("/data"),
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::DuplicateArtifact { .. }));
    }

    #[test]
    fn merged_samples_are_skipped_by_build_all() {
        let reg = registry();
        let mut merged = row("STAR:genome");
        merged.is_merged = true;
        let table = SampleTable::from_rows(vec![row("STAR:genome"), merged]);
        let results = PlanBuilder::build_all(&table, &reg, "STAR:genome", Path::new("/data"));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn annotated_rule_points_at_shared_compiled_target() {
        let reg = registry();
        let plan = PlanBuilder::build_one(&row("STAR:genome:final"), &reg, "STAR:genome", Path::new("/data")).unwrap();
        let rule = plan
            .map_rule(Path::new("/data/proj1/sample1/genome.STAR.bam"))
            .unwrap();
        assert!(rule.is_annotated());
        assert_eq!(
            rule.ann_final_compiled_target,
            Some(PathBuf::from("species_data/human/genome/annotation/compiled.ann"))
        );
    }
}
