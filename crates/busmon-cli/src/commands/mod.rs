//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`rules`] - Rule management
//! - [`evaluate`] - One-shot evaluation of a snapshot file
//! - [`test`] - Test alerts for a stored rule

pub mod evaluate;
pub mod rules;
pub mod test;

pub use evaluate::EvaluateCommand;
pub use rules::RuleCommand;
pub use test::TestCommand;
