use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The closed set of alignment programs a map rule may invoke. New mappers
/// are added by extending this variant, never by string dispatch scattered
/// through the planner.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum Mapper {
    #[strum(serialize = "STAR", to_string = "STAR")]
    #[serde(rename = "STAR")]
    Star,
    #[strum(serialize = "bowtie2", to_string = "bowtie2")]
    #[serde(rename = "bowtie2")]
    Bowtie2,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trips_through_display_and_fromstr() {
        assert_eq!(Mapper::Star.to_string(), "STAR");
        assert_eq!(Mapper::Bowtie2.to_string(), "bowtie2");
        assert_eq!(Mapper::from_str("STAR").unwrap(), Mapper::Star);
        assert_eq!(Mapper::from_str("bowtie2").unwrap(), Mapper::Bowtie2);
        assert!(Mapper::from_str("star").is_err());
        assert!(Mapper::from_str("bwa").is_err());
    }
}
