pub mod commands;
pub mod defaults;
pub mod error;
pub mod mapper;
pub mod plan;
pub mod query;
pub mod reference;
pub mod rules;
pub mod sample;
pub mod strategy;
pub mod template;

pub use error::PlanError;
pub use mapper::Mapper;
pub use plan::{Plan, PlanBuilder, SampleKey};
pub use query::RiboLog;
pub use reference::{Reference, ReferenceRegistry, ResolvedReference};
pub use rules::{MapRule, SymlinkRule};
pub use sample::{SampleRow, SampleTable};
