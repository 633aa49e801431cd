//! Paragraph role classification.
//!
//! A deterministic rule pass runs first; paragraphs it cannot settle
//! authoritatively are referred to an optional [`RoleOracle`] and the two
//! opinions are arbitrated.

mod classifier;
mod config;
mod oracle;
pub mod rules;

pub use classifier::{arbitrate, ClassificationSummary, Classifier};
pub use config::{ClassifierConfig, FallbackPolicy};
pub use oracle::{
    call_with_timeout, ContextEntry, OracleAnswer, OracleRequest, RoleOracle, VerifyAnswer,
};
pub use rules::{apply_rules, RuleContext, RuleDecision};
