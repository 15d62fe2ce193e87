//! Drives a [`RuleSet`] over a composition through the visitor protocol.

use std::sync::Arc;

use mixdef_core::graph::CompositionGraph;
use mixdef_core::id::NodeId;
use mixdef_core::node::{
    AttributeIntroductionNode, AttributeNode, CompositionUnit, DependencyNode,
    InterfaceIntroductionNode, MemberIntroductionNode, MemberNode, MixinUnit, RequiredMethodNode,
    RequirementNode, SuppressedInterfaceNode,
};
use mixdef_core::visitor::DefinitionVisitor;

use crate::catalog::default_rules;
use crate::log::{LogEntry, Outcome, ValidationLog};
use crate::rule::{RuleContext, RuleSet, Verdict};

/// Validates compositions against a shared rule set. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Validator {
    rules: Arc<RuleSet>,
}

impl Default for Validator {
    fn default() -> Self {
        Validator::new(default_rules())
    }
}

impl Validator {
    pub fn new(rules: RuleSet) -> Self {
        Validator {
            rules: Arc::new(rules),
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Validates every node of `graph`.
    pub fn validate(&self, graph: &CompositionGraph) -> ValidationLog {
        self.validate_node(graph, NodeId::ROOT)
    }

    /// Validates `start` and everything it owns.
    pub fn validate_node(&self, graph: &CompositionGraph, start: NodeId) -> ValidationLog {
        let mut log = ValidationLog::new();
        let mut dispatcher = RuleDispatcher {
            rules: &self.rules,
            log: &mut log,
        };
        graph.accept_from(start, &mut dispatcher);
        log
    }

    /// Validates every node of `graph`, appending to an existing log.
    pub fn validate_with(&self, graph: &CompositionGraph, log: &mut ValidationLog) {
        let mut dispatcher = RuleDispatcher {
            rules: &self.rules,
            log,
        };
        graph.accept(&mut dispatcher);
    }
}

/// Visitor running the rules registered for each visited node's kind.
struct RuleDispatcher<'a> {
    rules: &'a RuleSet,
    log: &'a mut ValidationLog,
}

impl RuleDispatcher<'_> {
    fn run(&mut self, graph: &CompositionGraph, id: NodeId) {
        let Some(definition) = graph.node(id) else {
            return;
        };
        let cx = RuleContext {
            graph,
            node: id,
            definition,
        };
        for rule in self.rules.rules_for(definition.kind()) {
            let (outcome, message) = match rule.check(&cx) {
                Ok(Verdict::Pass) => (Outcome::Success, String::new()),
                Ok(Verdict::Warn(message)) => (Outcome::Warning, message),
                Ok(Verdict::Fail(message)) => (Outcome::Failure, message),
                Err(err) => (Outcome::Exception, err.to_string()),
            };
            let entry = LogEntry {
                rule: rule.name().to_string(),
                outcome,
                message,
            };
            self.log.record(graph, id, entry);
        }
    }
}

/// Routes every visitor method to [`RuleDispatcher::run`].
macro_rules! dispatch_all {
    ($($method:ident: $node:ty),* $(,)?) => {
        impl DefinitionVisitor for RuleDispatcher<'_> {
            $(
                fn $method(&mut self, graph: &CompositionGraph, id: NodeId, _: &$node) {
                    self.run(graph, id);
                }
            )*
        }
    };
}

dispatch_all! {
    visit_target: CompositionUnit,
    visit_mixin: MixinUnit,
    visit_interface_introduction: InterfaceIntroductionNode,
    visit_suppressed_interface_introduction: SuppressedInterfaceNode,
    visit_method_introduction: MemberIntroductionNode,
    visit_property_introduction: MemberIntroductionNode,
    visit_event_introduction: MemberIntroductionNode,
    visit_method: MemberNode,
    visit_property: MemberNode,
    visit_event: MemberNode,
    visit_face_requirement: RequirementNode,
    visit_base_call_requirement: RequirementNode,
    visit_mixin_requirement: RequirementNode,
    visit_required_method: RequiredMethodNode,
    visit_this_dependency: DependencyNode,
    visit_base_dependency: DependencyNode,
    visit_mixin_dependency: DependencyNode,
    visit_attribute: AttributeNode,
    visit_attribute_introduction: AttributeIntroductionNode,
}
