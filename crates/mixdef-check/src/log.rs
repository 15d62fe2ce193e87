//! Validation log: per-node rule outcomes collected during one or more
//! validation passes.

use std::fmt;

use serde::{Deserialize, Serialize};

use mixdef_core::graph::CompositionGraph;
use mixdef_core::id::NodeId;
use mixdef_core::node::NodeKind;

/// Result of running one rule against one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Warning,
    Failure,
    /// The rule itself raised an error while checking the node.
    Exception,
}

impl Outcome {
    /// Failures and exceptions both make a configuration invalid.
    pub fn is_failure(self) -> bool {
        matches!(self, Outcome::Failure | Outcome::Exception)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Success => "ok",
            Outcome::Warning => "warning",
            Outcome::Failure => "failure",
            Outcome::Exception => "exception",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub rule: String,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// All entries recorded for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeResult {
    pub node: NodeId,
    pub kind: NodeKind,
    pub full_name: String,
    /// Full names from the composition unit down to the node.
    pub path: Vec<String>,
    pub entries: Vec<LogEntry>,
}

impl NodeResult {
    /// The most severe outcome among the entries.
    pub fn worst(&self) -> Outcome {
        self.entries
            .iter()
            .map(|e| e.outcome)
            .max()
            .unwrap_or(Outcome::Success)
    }

    pub fn location(&self) -> String {
        self.path.join(" > ")
    }
}

/// Ordered collection of [`NodeResult`]s, in the order nodes were visited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationLog {
    results: Vec<NodeResult>,
}

impl ValidationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry for `node`. Entries join the last result when it
    /// belongs to the same node, otherwise a new result is opened; a
    /// traversal visits each node once, so its entries arrive together.
    pub fn record(&mut self, graph: &CompositionGraph, node: NodeId, entry: LogEntry) {
        if let Some(last) = self.results.last_mut().filter(|r| r.node == node) {
            last.entries.push(entry);
            return;
        }
        self.results.push(NodeResult {
            node,
            kind: graph.kind(node).unwrap_or(NodeKind::Target),
            full_name: graph.full_name(node).unwrap_or_default().to_string(),
            path: graph.path(node),
            entries: vec![entry],
        });
    }

    /// Folds another log into this one. Results for the same node and path
    /// are combined, new ones are appended in order.
    pub fn merge(&mut self, other: ValidationLog) {
        for result in other.results {
            match self
                .results
                .iter_mut()
                .find(|r| r.node == result.node && r.path == result.path)
            {
                Some(existing) => existing.entries.extend(result.entries),
                None => self.results.push(result),
            }
        }
    }

    pub fn results(&self) -> &[NodeResult] {
        &self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Every entry with its node, in log order.
    pub fn entries(&self) -> impl Iterator<Item = (&NodeResult, &LogEntry)> {
        self.results
            .iter()
            .flat_map(|r| r.entries.iter().map(move |e| (r, e)))
    }

    fn count(&self, outcome: Outcome) -> usize {
        self.entries().filter(|(_, e)| e.outcome == outcome).count()
    }

    pub fn success_count(&self) -> usize {
        self.count(Outcome::Success)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Outcome::Warning)
    }

    pub fn failure_count(&self) -> usize {
        self.count(Outcome::Failure)
    }

    pub fn exception_count(&self) -> usize {
        self.count(Outcome::Exception)
    }

    /// True if any entry is a failure or an exception.
    pub fn has_failures(&self) -> bool {
        self.entries().any(|(_, e)| e.outcome.is_failure())
    }

    pub fn has_warnings(&self) -> bool {
        self.warning_count() > 0
    }

    /// Failure and exception entries, in log order.
    pub fn failures(&self) -> impl Iterator<Item = (&NodeResult, &LogEntry)> {
        self.entries().filter(|(_, e)| e.outcome.is_failure())
    }

    pub fn warnings(&self) -> impl Iterator<Item = (&NodeResult, &LogEntry)> {
        self.entries().filter(|(_, e)| e.outcome == Outcome::Warning)
    }
}

/// Lists every non-success entry, then a one-line summary.
impl fmt::Display for ValidationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (result, entry) in self.entries().filter(|(_, e)| e.outcome != Outcome::Success) {
            write!(f, "{}: {} [{}]", entry.outcome, result.location(), entry.rule)?;
            if !entry.message.is_empty() {
                write!(f, ": {}", entry.message)?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "{} nodes checked: {} ok, {} warnings, {} failures, {} exceptions",
            self.results.len(),
            self.success_count(),
            self.warning_count(),
            self.failure_count(),
            self.exception_count()
        )
    }
}
