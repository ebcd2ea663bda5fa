/// default per-mapper parameters applied when a reference does not
/// override them in the registry
pub trait DefaultMapperParams {
    const STAR_FLAGS: &'static str;
    const BOWTIE2_FLAGS: &'static str;
    const STAR_INDEX_DIRNAME: &'static str;
    const STAR_INDEX_SENTINEL: &'static str;
    const BOWTIE2_INDEX_DIRNAME: &'static str;
}

pub struct DefaultParams;

impl DefaultMapperParams for DefaultParams {
    // unsorted BAM on stdout, all attributes retained, every multimapper
    // tagged as a best-scoring primary, no shared-memory genome load, and a
    // bounded splice-junction collapse cap so pathological samples don't
    // blow up STAR's sjdb insertion table.
    const STAR_FLAGS: &'static str = "--outSAMtype BAM Unsorted --outStd BAM_Unsorted \
         --outSAMunmapped Within --outSAMprimaryFlag AllBestScore --outSAMattributes All \
         --genomeLoad NoSharedMemory --limitSjdbInsertNsj 1000000";

    // local alignment, ~75% match required (L,0,1.5), base qualities ignored
    // (barcoded reads carry synthetic quality strings), seed length 10 with
    // a 30/30 descent budget.
    const BOWTIE2_FLAGS: &'static str =
        "--local --score-min L,0,1.5 --ignore-quals -L 10 -D 30 -R 30";

    const STAR_INDEX_DIRNAME: &'static str = "star_index";
    const STAR_INDEX_SENTINEL: &'static str = "SAindex";
    const BOWTIE2_INDEX_DIRNAME: &'static str = "bt2_index";
}
