//! Rules and rule sets.
//!
//! A [`Rule`] inspects one node and returns a [`Verdict`]. Rules declare the
//! node kinds they apply to; a [`RuleSet`] indexes them by kind so the
//! validator only runs the rules relevant to each visited node.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use mixdef_core::error::CoreError;
use mixdef_core::graph::CompositionGraph;
use mixdef_core::id::NodeId;
use mixdef_core::node::{DefinitionNode, NodeKind};

/// What a rule concluded about a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Warn(String),
    Fail(String),
}

/// A rule could not reach a verdict.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{0}")]
    Other(String),
}

/// The node a rule is applied to.
pub struct RuleContext<'a> {
    pub graph: &'a CompositionGraph,
    pub node: NodeId,
    pub definition: &'a DefinitionNode,
}

impl<'a> RuleContext<'a> {
    pub fn kind(&self) -> NodeKind {
        self.definition.kind()
    }

    pub fn full_name(&self) -> &'a str {
        self.graph.full_name(self.node).unwrap_or_default()
    }

    /// Full name of any other node in the same graph.
    pub fn name_of(&self, id: NodeId) -> &'a str {
        self.graph.full_name(id).unwrap_or("?")
    }
}

pub trait Rule: Send + Sync {
    /// Stable rule name, recorded in log entries.
    fn name(&self) -> &str;

    /// Node kinds this rule applies to.
    fn kinds(&self) -> &[NodeKind];

    fn check(&self, cx: &RuleContext<'_>) -> Result<Verdict, RuleError>;
}

/// A rule backed by a closure.
pub struct FnRule<F> {
    name: String,
    kinds: Vec<NodeKind>,
    check: F,
}

impl<F> FnRule<F>
where
    F: Fn(&RuleContext<'_>) -> Result<Verdict, RuleError> + Send + Sync,
{
    pub fn new(name: &str, kinds: &[NodeKind], check: F) -> Self {
        FnRule {
            name: name.to_string(),
            kinds: kinds.to_vec(),
            check,
        }
    }
}

impl<F> Rule for FnRule<F>
where
    F: Fn(&RuleContext<'_>) -> Result<Verdict, RuleError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kinds(&self) -> &[NodeKind] {
        &self.kinds
    }

    fn check(&self, cx: &RuleContext<'_>) -> Result<Verdict, RuleError> {
        (self.check)(cx)
    }
}

/// Rules grouped by the node kind they apply to, in insertion order.
#[derive(Clone, Default)]
pub struct RuleSet {
    by_kind: HashMap<NodeKind, Vec<Arc<dyn Rule>>>,
    names: Vec<String>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<R: Rule + 'static>(&mut self, rule: R) -> &mut Self {
        let rule: Arc<dyn Rule> = Arc::new(rule);
        for kind in rule.kinds() {
            self.by_kind.entry(*kind).or_default().push(Arc::clone(&rule));
        }
        self.names.push(rule.name().to_string());
        self
    }

    pub fn with<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.add(rule);
        self
    }

    /// Rules registered for `kind`, in insertion order.
    pub fn rules_for(&self, kind: NodeKind) -> &[Arc<dyn Rule>] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet").field("rules", &self.names).finish()
    }
}
