use std::sync::Arc;

use mixdef_check::{default_rules, FnRule, LogEntry, Outcome, RuleError, ValidationLog, Validator, Verdict};
use mixdef_core::node::{DependencyKind, NodeKind, RequirementKind, SuppressionReason};
use mixdef_core::signature::{MemberSignature, MethodSignature};
use mixdef_core::types::{TypeDecl, TypeUniverse};
use mixdef_core::{CompositionGraph, KeyedCollection, NodeId};

fn universe() -> Arc<TypeUniverse> {
    let universe = TypeUniverse::from_decls([
        TypeDecl::interface("ISink").with_method(MethodSignature::action("Accept")),
        TypeDecl::interface("ILogger").with_method(MethodSignature::new("Log", ["string"], "void")),
        TypeDecl::interface("IMarker"),
        TypeDecl::class("OrderBase"),
        TypeDecl::class("Unrelated"),
        TypeDecl::class("Order")
            .extending("OrderBase")
            .implementing("ISink")
            .with_method(MethodSignature::action("Accept")),
        TypeDecl::class("LoggingMixin").implementing("ILogger"),
        TypeDecl::class("AuditMixin").implementing("ILogger"),
    ])
    .unwrap();
    Arc::new(universe)
}

fn depend(graph: &mut CompositionGraph, kind: DependencyKind, depender: NodeId, name: &str) -> NodeId {
    let required = graph.universe().lookup(name).unwrap();
    let requirement_kind = kind.requirement_kind();
    let requirement = match graph.requirement_for(requirement_kind, required) {
        Some(existing) => existing,
        None => graph.add_requirement(requirement_kind, required).unwrap(),
    };
    graph.add_dependency(kind, depender, requirement, None).unwrap()
}

/// `Order` with two mixins that both implement `ILogger`, plus a set of
/// deliberately broken dependencies on `AuditMixin`.
fn broken_graph() -> CompositionGraph {
    let universe = universe();
    let lookup = |name: &str| universe.lookup(name).unwrap();
    let mut graph = CompositionGraph::new(Arc::clone(&universe), lookup("Order")).unwrap();
    graph
        .add_member(NodeId::ROOT, MemberSignature::Method(MethodSignature::action("Accept")), None)
        .unwrap();

    let logging = graph.add_mixin(lookup("LoggingMixin")).unwrap();
    graph.add_interface_introduction(logging, lookup("ILogger")).unwrap();
    depend(&mut graph, DependencyKind::This, logging, "ISink");

    let audit = graph.add_mixin(lookup("AuditMixin")).unwrap();
    graph
        .add_suppressed_interface(audit, lookup("ILogger"), SuppressionReason::IntroducedBy(logging))
        .unwrap();
    depend(&mut graph, DependencyKind::This, audit, "IMarker");
    depend(&mut graph, DependencyKind::This, audit, "Unrelated");
    depend(&mut graph, DependencyKind::Mixin, audit, "Unrelated");

    let sink = graph.requirement_for(RequirementKind::Face, lookup("ISink")).unwrap();
    graph
        .add_required_method(sink, MethodSignature::action("Flush"), None)
        .unwrap();
    graph
}

#[test]
fn default_rules_report_every_problem_in_visit_order() {
    let graph = broken_graph();
    let log = Validator::default().validate(&graph);

    let problems: Vec<_> = log
        .entries()
        .filter(|(_, e)| e.outcome != Outcome::Success)
        .map(|(r, e)| format!("{} {} [{}]", e.outcome, r.location(), e.rule))
        .collect();
    insta::assert_json_snapshot!(problems, @r###"
    [
      "warning Order > AuditMixin > ILogger [introduction-shadowed-by-earlier-mixin]",
      "failure Order > AuditMixin > IMarker [dependency-must-be-satisfied]",
      "failure Order > AuditMixin > Unrelated [mixin-dependency-must-be-satisfied]",
      "warning Order > ISink > ISink.Flush [required-method-should-have-implementer]",
      "failure Order > Unrelated [face-class-must-be-assignable]"
    ]
    "###);
    assert!(log.has_failures());
    assert_eq!(log.failure_count(), 3);
    assert_eq!(log.warning_count(), 2);
}

#[test]
fn valid_composition_has_only_successes() {
    let universe = universe();
    let order = universe.lookup("Order").unwrap();
    let logging_type = universe.lookup("LoggingMixin").unwrap();
    let mut graph = CompositionGraph::new(universe, order).unwrap();
    let logging = graph.add_mixin(logging_type).unwrap();
    depend(&mut graph, DependencyKind::This, logging, "ISink");
    depend(&mut graph, DependencyKind::Base, logging, "OrderBase");

    let log = Validator::default().validate(&graph);
    assert!(!log.has_failures());
    assert!(!log.has_warnings());
    assert!(log.success_count() > 0);
}

#[test]
fn mixin_applied_to_itself_fails() {
    let universe = universe();
    let order = universe.lookup("Order").unwrap();
    let mut graph = CompositionGraph::new(universe, order).unwrap();
    graph.add_mixin(order).unwrap();

    let log = Validator::default().validate(&graph);
    let rules: Vec<_> = log.failures().map(|(_, e)| e.rule.as_str()).collect();
    assert_eq!(rules, vec!["mixin-must-not-be-its-own-target"]);
}

#[test]
fn override_cycle_detected() {
    let universe = universe();
    let order = universe.lookup("Order").unwrap();
    let logging_type = universe.lookup("LoggingMixin").unwrap();
    let mut graph = CompositionGraph::new(universe, order).unwrap();
    let target_save = graph
        .add_member(NodeId::ROOT, MemberSignature::Method(MethodSignature::action("Save")), None)
        .unwrap();
    let logging = graph.add_mixin(logging_type).unwrap();
    let mixin_save = graph
        .add_member(logging, MemberSignature::Method(MethodSignature::action("Save")), None)
        .unwrap();
    graph.set_base(mixin_save, Some(target_save)).unwrap();
    graph.set_base(target_save, Some(mixin_save)).unwrap();

    let log = Validator::default().validate(&graph);
    let failing: Vec<_> = log.failures().map(|(r, _)| r.full_name.clone()).collect();
    assert_eq!(failing, vec!["Order.Save", "LoggingMixin.Save"]);
}

#[test]
fn rule_errors_become_exceptions_and_traversal_continues() {
    let graph = broken_graph();
    let rules = default_rules().with(FnRule::new("always-errors", &[NodeKind::Mixin], |_| {
        Err(RuleError::Other("rule crashed".to_string()))
    }));
    let log = Validator::new(rules).validate(&graph);

    assert_eq!(log.exception_count(), 2);
    // Rules on nodes visited after the failing mixins still ran.
    assert_eq!(log.failure_count(), 3);
    let exception = log
        .entries()
        .find(|(_, e)| e.outcome == Outcome::Exception)
        .unwrap();
    assert_eq!(exception.1.message, "rule crashed");
}

#[test]
fn validate_node_covers_only_the_subtree() {
    let graph = broken_graph();
    let logging = graph.target().mixins.iter().next().unwrap().node;
    let log = Validator::default().validate_node(&graph, logging);

    assert!(!log.has_failures());
    assert!(log
        .results()
        .iter()
        .all(|r| r.path.get(1).map(String::as_str) == Some("LoggingMixin")));
}

#[test]
fn validate_with_accumulates() {
    let graph = broken_graph();
    let validator = Validator::new(default_rules().with(FnRule::new(
        "mixins-are-fine",
        &[NodeKind::Mixin],
        |_| Ok(Verdict::Pass),
    )));
    let mut log = validator.validate(&graph);
    let first = log.entries().count();
    validator.validate_with(&graph, &mut log);
    assert_eq!(log.entries().count(), first * 2);
    assert_eq!(log.failure_count(), 6);
}

#[test]
fn consecutive_entries_for_a_node_share_one_result() {
    let graph = broken_graph();
    let logging = graph.target().mixins.iter().next().unwrap().node;
    let entry = |rule: &str| LogEntry {
        rule: rule.to_string(),
        outcome: Outcome::Success,
        message: String::new(),
    };

    let mut log = ValidationLog::new();
    log.record(&graph, NodeId::ROOT, entry("a"));
    log.record(&graph, NodeId::ROOT, entry("b"));
    log.record(&graph, logging, entry("c"));
    log.record(&graph, NodeId::ROOT, entry("d"));

    let grouped: Vec<_> = log
        .results()
        .iter()
        .map(|r| (r.full_name.clone(), r.entries.len()))
        .collect();
    assert_eq!(
        grouped,
        vec![
            ("Order".to_string(), 2),
            ("LoggingMixin".to_string(), 1),
            ("Order".to_string(), 1),
        ]
    );
}
