//! Rule-based validation of mixin compositions.
//!
//! The [`Validator`] walks a [`CompositionGraph`](mixdef_core::CompositionGraph)
//! with the core visitor protocol, runs the rules registered for each node
//! kind and collects the outcomes in a [`ValidationLog`]. Validation never
//! mutates the graph and never stops early: a rule that errors is recorded as
//! an exception and the walk continues.

pub mod catalog;
pub mod log;
pub mod rule;
pub mod validator;

pub use catalog::default_rules;
pub use log::{LogEntry, NodeResult, Outcome, ValidationLog};
pub use rule::{FnRule, Rule, RuleContext, RuleError, RuleSet, Verdict};
pub use validator::Validator;
