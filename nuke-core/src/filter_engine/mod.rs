mod engine;
pub mod rules;

pub use engine::{should_include, ResourceValue};
pub use rules::{FilterRule, NamePattern, ResourceRules, TagMatch};
