//! Indented text rendering of a composition, one line per node in
//! traversal order.

use std::fmt::Write;

use crate::graph::CompositionGraph;
use crate::id::NodeId;
use crate::node::{
    AttributeIntroductionNode, AttributeNode, CompositionUnit, DependencyNode,
    InterfaceIntroductionNode, MemberIntroductionNode, MemberNode, MixinUnit, RequiredMethodNode,
    RequirementNode, SuppressedInterfaceNode, SuppressionReason,
};
use crate::visitor::DefinitionVisitor;

/// Renders the whole graph.
///
/// Dependencies show their implementer (`-> Unit`) or `(unimplemented)`,
/// overriding members their base, suppressed interfaces their reason.
pub fn render_tree(graph: &CompositionGraph) -> String {
    let mut renderer = TreeRenderer::default();
    graph.accept(&mut renderer);
    renderer.out
}

#[derive(Default)]
struct TreeRenderer {
    out: String,
}

impl TreeRenderer {
    fn line(&mut self, graph: &CompositionGraph, id: NodeId, detail: Option<String>) {
        let depth = graph.path(id).len().saturating_sub(1);
        let kind = graph.kind(id).map(|k| k.as_str()).unwrap_or("?");
        let name = graph.full_name(id).unwrap_or("?");
        let _ = write!(self.out, "{:indent$}{kind} {name}", "", indent = depth * 2);
        if let Some(detail) = detail {
            let _ = write!(self.out, " {detail}");
        }
        self.out.push('\n');
    }

    fn unit_name(graph: &CompositionGraph, unit: NodeId) -> String {
        graph.full_name(unit).unwrap_or("?").to_string()
    }

    fn member(&mut self, graph: &CompositionGraph, id: NodeId, node: &MemberNode) {
        let detail = node
            .base
            .and_then(|base| graph.full_name(base))
            .map(|base| format!("overrides {base}"));
        self.line(graph, id, detail);
    }

    fn dependency(&mut self, graph: &CompositionGraph, id: NodeId, _node: &DependencyNode) {
        let detail = match graph.implementer(id) {
            Ok(Some(unit)) => format!("-> {}", Self::unit_name(graph, unit)),
            Ok(None) => "(unimplemented)".to_string(),
            Err(err) => format!("(error: {err})"),
        };
        self.line(graph, id, Some(detail));
    }
}

impl DefinitionVisitor for TreeRenderer {
    fn visit_target(&mut self, graph: &CompositionGraph, id: NodeId, _: &CompositionUnit) {
        self.line(graph, id, None);
    }

    fn visit_mixin(&mut self, graph: &CompositionGraph, id: NodeId, node: &MixinUnit) {
        self.line(graph, id, Some(format!("#{}", node.index)));
    }

    fn visit_interface_introduction(
        &mut self,
        graph: &CompositionGraph,
        id: NodeId,
        _: &InterfaceIntroductionNode,
    ) {
        self.line(graph, id, None);
    }

    fn visit_suppressed_interface_introduction(
        &mut self,
        graph: &CompositionGraph,
        id: NodeId,
        node: &SuppressedInterfaceNode,
    ) {
        let reason = match node.reason {
            SuppressionReason::Explicit => "(explicit)".to_string(),
            SuppressionReason::ImplementedByTarget => "(implemented by target)".to_string(),
            SuppressionReason::IntroducedBy(unit) => {
                format!("(introduced by {})", Self::unit_name(graph, unit))
            }
        };
        self.line(graph, id, Some(reason));
    }

    fn visit_method_introduction(&mut self, graph: &CompositionGraph, id: NodeId, node: &MemberIntroductionNode) {
        let detail = graph
            .full_name(node.implementing_member)
            .map(|m| format!("-> {m}"));
        self.line(graph, id, detail);
    }

    fn visit_property_introduction(&mut self, graph: &CompositionGraph, id: NodeId, node: &MemberIntroductionNode) {
        self.visit_method_introduction(graph, id, node);
    }

    fn visit_event_introduction(&mut self, graph: &CompositionGraph, id: NodeId, node: &MemberIntroductionNode) {
        self.visit_method_introduction(graph, id, node);
    }

    fn visit_method(&mut self, graph: &CompositionGraph, id: NodeId, node: &MemberNode) {
        self.member(graph, id, node);
    }

    fn visit_property(&mut self, graph: &CompositionGraph, id: NodeId, node: &MemberNode) {
        self.member(graph, id, node);
    }

    fn visit_event(&mut self, graph: &CompositionGraph, id: NodeId, node: &MemberNode) {
        self.member(graph, id, node);
    }

    fn visit_face_requirement(&mut self, graph: &CompositionGraph, id: NodeId, _: &RequirementNode) {
        self.line(graph, id, None);
    }

    fn visit_base_call_requirement(&mut self, graph: &CompositionGraph, id: NodeId, _: &RequirementNode) {
        self.line(graph, id, None);
    }

    fn visit_mixin_requirement(&mut self, graph: &CompositionGraph, id: NodeId, _: &RequirementNode) {
        self.line(graph, id, None);
    }

    fn visit_required_method(&mut self, graph: &CompositionGraph, id: NodeId, node: &RequiredMethodNode) {
        let detail = match node.implementer.and_then(|m| graph.full_name(m)) {
            Some(member) => format!("-> {member}"),
            None => "(unimplemented)".to_string(),
        };
        self.line(graph, id, Some(detail));
    }

    fn visit_this_dependency(&mut self, graph: &CompositionGraph, id: NodeId, node: &DependencyNode) {
        self.dependency(graph, id, node);
    }

    fn visit_base_dependency(&mut self, graph: &CompositionGraph, id: NodeId, node: &DependencyNode) {
        self.dependency(graph, id, node);
    }

    fn visit_mixin_dependency(&mut self, graph: &CompositionGraph, id: NodeId, node: &DependencyNode) {
        self.dependency(graph, id, node);
    }

    fn visit_attribute(&mut self, graph: &CompositionGraph, id: NodeId, node: &AttributeNode) {
        let detail = (!node.arguments.is_empty()).then(|| format!("({})", node.arguments.join(", ")));
        self.line(graph, id, detail);
    }

    fn visit_attribute_introduction(
        &mut self,
        graph: &CompositionGraph,
        id: NodeId,
        node: &AttributeIntroductionNode,
    ) {
        let detail = graph.full_name(node.receiver).map(|r| format!("-> {r}"));
        self.line(graph, id, detail);
    }
}
