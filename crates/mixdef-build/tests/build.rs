mod common;

use common::*;
use mixdef_build::{BuildError, ClassContext, MixinContext};
use mixdef_core::collection::KeyedCollection;
use mixdef_core::signature::{
    EventSignature, MemberSignature, MethodSignature, PropertySignature, StructuralSignatures,
};
use mixdef_core::types::{AttributeDecl, MemberDecl, OverrideDirective, TypeDecl};
use mixdef_core::{render_tree, CompositionGraph, CoreError, NodeId, SuppressionReason};

fn member(graph: &CompositionGraph, unit: NodeId, signature: MemberSignature) -> NodeId {
    graph
        .find_member(unit, &signature, &StructuralSignatures)
        .unwrap()
        .unwrap()
}

fn this_dependency(graph: &CompositionGraph, mixin: &str, required: &str) -> NodeId {
    let unit = mixin_unit(graph, mixin);
    let required = graph.universe().lookup(required).unwrap();
    graph.mixin(unit).unwrap().this_dependencies.get(&required).unwrap().node
}

#[test]
fn builds_order_composition() {
    let graph = builder().build(&order_context()).unwrap();
    insta::assert_snapshot!(render_tree(&graph).trim_end(), @r###"
    target Order
      method Order.Save
      method Order.Accept
      method Order.Validate
      property Order.Name
        method Order.get_Name
        method Order.set_Name
      property Order.Id
        method Order.get_Id
      attribute Serializable
      mixin LoggingMixin #0
        method LoggingMixin.Log
        attribute Serializable
        attribute Audited
        interface-introduction ILogger
          method-introduction ILogger.Log -> LoggingMixin.Log
        attribute-introduction Audited -> Order
        this-dependency IOrderSink -> Order
      mixin AuditedOrder #1
        method AuditedOrder.Save overrides Order.Save
          attribute Tracked
          attribute-introduction Tracked -> Order.Save
        property AuditedOrder.Name overrides Order.Name
          method AuditedOrder.get_Name overrides Order.get_Name
          method AuditedOrder.set_Name overrides Order.set_Name
        this-dependency ILogger -> LoggingMixin
        base-dependency IOrderSink -> Order
      mixin TotalsMixin #2
        property TotalsMixin.Total
          method TotalsMixin.get_Total
        interface-introduction IHasTotal
          property-introduction IHasTotal.Total -> TotalsMixin.Total
        this-dependency IAuditable (unimplemented)
          this-dependency ILogger -> LoggingMixin
          this-dependency IHasTotal -> TotalsMixin
      face-requirement IOrderSink
        required-method IOrderSink.Accept -> Order.Accept
      face-requirement ILogger
        required-method ILogger.Log -> LoggingMixin.Log
      face-requirement IAuditable
      face-requirement IHasTotal
        required-method IHasTotal.get_Total -> TotalsMixin.get_Total
      base-call-requirement IOrderSink
        required-method IOrderSink.Accept -> Order.Accept
    "###);
}

#[test]
fn traversal_visits_every_node_once() {
    for context in [order_context(), shadowed_context(), marker_context()] {
        let graph = builder().build(&context).unwrap();
        assert_eq!(render_tree(&graph).lines().count(), graph.len(), "{context}");
    }
}

#[test]
fn building_is_deterministic() {
    let builder = builder();
    let first = builder.build(&order_context()).unwrap();
    let second = builder.build(&order_context()).unwrap();
    assert_eq!(render_tree(&first), render_tree(&second));
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[test]
fn direct_implementer_is_the_target() {
    let graph = builder().build(&order_context()).unwrap();
    let dependency = this_dependency(&graph, "LoggingMixin", "IOrderSink");
    assert_eq!(graph.implementer(dependency).unwrap(), Some(NodeId::ROOT));
}

#[test]
fn introduced_interface_resolves_to_the_introducing_mixin() {
    let graph = builder().build(&order_context()).unwrap();
    let dependency = this_dependency(&graph, "AuditedOrder", "ILogger");
    assert_eq!(
        graph.implementer(dependency).unwrap(),
        Some(mixin_unit(&graph, "LoggingMixin"))
    );
}

#[test]
fn unimplemented_non_empty_interface_is_duck_typed_to_the_target() {
    let graph = builder()
        .build(&ClassContext::new("Order").mixin("TotalsReport"))
        .unwrap();
    let dependency = this_dependency(&graph, "TotalsReport", "IHasTotal");
    assert_eq!(graph.implementer(dependency).unwrap(), Some(NodeId::ROOT));
    assert!(graph.is_satisfied(dependency).unwrap());
}

#[test]
fn empty_interface_without_provider_is_unimplemented() {
    let graph = builder().build(&marker_context()).unwrap();
    let dependency = this_dependency(&graph, "MarkerMixin", "IMarker");
    assert_eq!(graph.implementer(dependency).unwrap(), None);
    assert!(!graph.is_satisfied(dependency).unwrap());
}

#[test]
fn aggregator_dependency_is_satisfied_through_nested_dependencies() {
    let graph = builder().build(&order_context()).unwrap();
    let aggregate = this_dependency(&graph, "TotalsMixin", "IAuditable");
    assert!(graph.is_aggregate(aggregate).unwrap());
    assert_eq!(graph.implementer(aggregate).unwrap(), None);
    assert!(graph.is_satisfied(aggregate).unwrap());

    let nested: Vec<_> = graph
        .dependency(aggregate)
        .unwrap()
        .aggregated
        .iter()
        .map(|c| c.node)
        .collect();
    assert_eq!(names(&graph, nested.iter().copied()), vec!["ILogger", "IHasTotal"]);
    for id in nested {
        assert_eq!(graph.dependency(id).unwrap().aggregator, Some(aggregate));
        assert_eq!(graph.parent(id), Some(aggregate));
    }

    // The ILogger requirement is shared by AuditedOrder and the nested dependency.
    let logger = graph.universe().lookup("ILogger").unwrap();
    let requirement = graph
        .requirement_for(mixdef_core::RequirementKind::Face, logger)
        .unwrap();
    let requiring = &graph.requirement(requirement).unwrap().requiring_dependencies;
    assert_eq!(requiring.len(), 2);
}

#[test]
fn target_directive_wires_both_sides_of_the_override() {
    let graph = builder().build(&order_context()).unwrap();
    let audited = mixin_unit(&graph, "AuditedOrder");
    let base = member(&graph, NodeId::ROOT, MemberSignature::Method(MethodSignature::action("Save")));
    let overrider = member(&graph, audited, MemberSignature::Method(MethodSignature::action("Save")));

    assert_eq!(graph.member(base).unwrap().override_by(audited), Some(overrider));
    assert_eq!(graph.member(overrider).unwrap().base, Some(base));

    let name = MemberSignature::Property(PropertySignature::read_write("Name", "string"));
    let base_property = graph.member(member(&graph, NodeId::ROOT, name.clone())).unwrap();
    let overriding_property = graph.member(member(&graph, audited, name)).unwrap();
    for (base_accessor, accessor) in base_property
        .accessors
        .into_iter()
        .zip(overriding_property.accessors)
    {
        let (base_accessor, accessor) = (base_accessor.unwrap(), accessor.unwrap());
        assert_eq!(graph.member(accessor).unwrap().base, Some(base_accessor));
        assert_eq!(graph.member(base_accessor).unwrap().override_by(audited), Some(accessor));
    }
}

#[test]
fn overriding_member_attributes_are_introduced_onto_the_base() {
    let graph = builder().build(&order_context()).unwrap();
    let save = member(&graph, NodeId::ROOT, MemberSignature::Method(MethodSignature::action("Save")));
    let tracked = graph.universe().lookup("Tracked").unwrap();
    let received = &graph.member(save).unwrap().received_attributes;
    assert_eq!(received.count(&tracked), 1);
    assert_eq!(
        received.first(&tracked).unwrap().unit,
        mixin_unit(&graph, "AuditedOrder")
    );
}

#[test]
fn target_carries_inherited_members_and_attributes() {
    let graph = builder().build(&order_context()).unwrap();
    let target = graph.target();
    let methods: Vec<_> = target.members.methods.keys().map(|m| m.name.as_str()).collect();
    assert_eq!(methods, vec!["Save", "Accept", "Validate"]);
    let properties: Vec<_> = target.members.properties.keys().map(|p| p.name.as_str()).collect();
    assert_eq!(properties, vec!["Name", "Id"]);

    let serializable = graph.universe().lookup("Serializable").unwrap();
    let audited = graph.universe().lookup("Audited").unwrap();
    assert_eq!(target.attributes.count(&serializable), 1);
    // LoggingMixin's Serializable is single-use and already present.
    assert_eq!(target.received_attributes.count(&serializable), 0);
    assert_eq!(target.received_attributes.count(&audited), 1);
}

#[test]
fn derived_member_hides_compatible_base_member() {
    let builder = builder_with(vec![TypeDecl::class("SpecialOrder")
        .extending("Order")
        .with_method(MethodSignature::action("Validate"))]);
    let graph = builder.build(&ClassContext::new("SpecialOrder")).unwrap();
    let validates: Vec<_> = graph
        .target()
        .members
        .methods
        .iter()
        .filter(|c| c.key.name == "Validate")
        .collect();
    assert_eq!(validates.len(), 1);
    assert_eq!(graph.target().members.methods.len(), 3);
}

#[test]
fn event_override_reaches_adder_and_remover() {
    let completed = EventSignature::new("Completed", "EventHandler");
    let builder = builder_with(vec![
        TypeDecl::class("Checkout").with_event(completed.clone()),
        TypeDecl::class("CompletionMixin")
            .with_member(MemberDecl::event(completed.clone()).overriding(OverrideDirective::Target)),
    ]);
    let graph = builder
        .build(&ClassContext::new("Checkout").mixin("CompletionMixin"))
        .unwrap();
    let mixin = mixin_unit(&graph, "CompletionMixin");
    let base = graph
        .member(member(&graph, NodeId::ROOT, MemberSignature::Event(completed.clone())))
        .unwrap();
    let overrider = graph
        .member(member(&graph, mixin, MemberSignature::Event(completed)))
        .unwrap();

    let pairs = [
        (base.adder().unwrap(), overrider.adder().unwrap()),
        (base.remover().unwrap(), overrider.remover().unwrap()),
    ];
    for (base_accessor, accessor) in pairs {
        assert_eq!(graph.member(accessor).unwrap().base, Some(base_accessor));
        assert_eq!(graph.member(base_accessor).unwrap().override_by(mixin), Some(accessor));
    }
    assert_eq!(
        names(&graph, pairs.iter().map(|(_, accessor)| *accessor)),
        vec!["CompletionMixin.add_Completed", "CompletionMixin.remove_Completed"]
    );
}

/// `LoggerBase` implements `ILogger` and carries `Audited`; both mixins
/// derive from it, `QuietLoggingMixin` redeclaring `Log` and `Audited`.
fn logger_base_builder() -> mixdef_build::DefinitionBuilder {
    builder_with(vec![
        TypeDecl::class("LoggerBase")
            .implementing("ILogger")
            .with_method(MethodSignature::new("Log", ["string"], "void"))
            .with_attribute(AttributeDecl::new("Audited")),
        TypeDecl::class("DerivedLoggingMixin").extending("LoggerBase"),
        TypeDecl::class("QuietLoggingMixin")
            .extending("LoggerBase")
            .with_method(MethodSignature::new("Log", ["string"], "void"))
            .with_attribute(AttributeDecl::new("Audited")),
    ])
}

#[test]
fn mixin_inherits_base_class_members_and_attributes() {
    let graph = logger_base_builder()
        .build(&ClassContext::new("Order").mixin("DerivedLoggingMixin"))
        .unwrap();
    let unit = mixin_unit(&graph, "DerivedLoggingMixin");
    let log = member(
        &graph,
        unit,
        MemberSignature::Method(MethodSignature::new("Log", ["string"], "void")),
    );
    assert_eq!(graph.full_name(log), Some("DerivedLoggingMixin.Log"));

    let universe = graph.universe();
    let logger = universe.lookup("ILogger").unwrap();
    let received = graph.target().received_interfaces.get(&logger).unwrap();
    assert_eq!(received.unit, unit);
    let introduction = graph.interface_introduction(received.node).unwrap();
    let introduced_log = introduction.methods.get_at(0).unwrap().node;
    assert_eq!(
        graph.member_introduction(introduced_log).unwrap().implementing_member,
        log
    );

    let audited = universe.lookup("Audited").unwrap();
    assert_eq!(graph.mixin(unit).unwrap().attributes.count(&audited), 1);
    assert_eq!(graph.target().received_attributes.count(&audited), 1);
}

#[test]
fn mixin_member_hides_compatible_base_class_member() {
    let graph = logger_base_builder()
        .build(&ClassContext::new("Order").mixin("QuietLoggingMixin"))
        .unwrap();
    let unit = graph.mixin(mixin_unit(&graph, "QuietLoggingMixin")).unwrap();
    assert_eq!(unit.members.methods.len(), 1);
    // Audited is single-use, so the base class copy is not inherited.
    let audited = graph.universe().lookup("Audited").unwrap();
    assert_eq!(unit.attributes.count(&audited), 1);
}

#[test]
fn suppressed_interfaces_record_their_reason() {
    let graph = builder().build(&shadowed_context()).unwrap();
    let console = mixin_unit(&graph, "ConsoleSink");
    let logging = mixin_unit(&graph, "LoggingMixin");
    let universe = graph.universe();
    let suppressed = &graph.mixin(console).unwrap().suppressed_interfaces;
    let reason = |name: &str| {
        let child = suppressed.get(&universe.lookup(name).unwrap()).unwrap();
        graph.suppressed_interface(child.node).unwrap().reason
    };
    assert_eq!(reason("ILogger"), SuppressionReason::IntroducedBy(logging));
    assert_eq!(reason("IOrderSink"), SuppressionReason::ImplementedByTarget);
    assert!(graph.mixin(console).unwrap().interface_introductions.is_empty());

    let graph = builder().build(&marker_context()).unwrap();
    let marker = mixin_unit(&graph, "MarkerMixin");
    let suppressed = &graph.mixin(marker).unwrap().suppressed_interfaces;
    let child = suppressed.get_at(0).unwrap();
    assert!(graph.suppressed_interface(child.node).unwrap().is_explicit());
}

#[test]
fn introduced_interfaces_reach_the_target() {
    let graph = builder().build(&order_context()).unwrap();
    let universe = graph.universe();
    let received: Vec<_> = graph
        .target()
        .received_interfaces
        .iter()
        .map(|c| (universe.name_of(c.key).to_string(), graph.full_name(c.unit).unwrap().to_string()))
        .collect();
    assert_eq!(
        received,
        vec![
            ("ILogger".to_string(), "LoggingMixin".to_string()),
            ("IHasTotal".to_string(), "TotalsMixin".to_string()),
        ]
    );
}

#[test]
fn explicit_dependencies_become_mixin_dependencies() {
    let context = ClassContext::new("Order").mixin("LoggingMixin").with_mixin(
        MixinContext::new("TotalsReport")
            .depending_on("LoggingMixin")
            .depending_on("ILogger"),
    );
    let graph = builder().build(&context).unwrap();
    let report = mixin_unit(&graph, "TotalsReport");
    let logging = mixin_unit(&graph, "LoggingMixin");
    let dependencies: Vec<_> = graph
        .mixin(report)
        .unwrap()
        .mixin_dependencies
        .iter()
        .map(|c| c.node)
        .collect();
    assert_eq!(dependencies.len(), 2);
    for id in dependencies {
        assert_eq!(graph.implementer(id).unwrap(), Some(logging));
    }
    assert_eq!(graph.target().mixin_requirements.len(), 2);
}

#[test]
fn unknown_types_are_reported_with_their_context() {
    let err = builder().build(&ClassContext::new("Missing")).unwrap_err();
    assert!(matches!(err, BuildError::UnknownType { ref name, .. } if name == "Missing"));

    let err = builder()
        .build(&ClassContext::new("Order").mixin("Ghost"))
        .unwrap_err();
    assert_eq!(err.to_string(), "unknown type 'Ghost' in configuration of 'Order'");
}

#[test]
fn interfaces_cannot_be_targets_or_mixins() {
    let err = builder().build(&ClassContext::new("ILogger")).unwrap_err();
    assert_eq!(err.to_string(), "'ILogger' cannot be used as a target class: it is not a class");

    let err = builder()
        .build(&ClassContext::new("Order").mixin("ILogger"))
        .unwrap_err();
    assert!(matches!(err, BuildError::NotAClass { role: "a mixin", .. }));
}

#[test]
fn applying_a_mixin_twice_fails() {
    let err = builder()
        .build(&ClassContext::new("Order").mixin("LoggingMixin").mixin("LoggingMixin"))
        .unwrap_err();
    assert!(matches!(err, BuildError::Core(CoreError::Collection(_))));
}

#[test]
fn introduced_interface_members_must_be_implemented() {
    let builder = builder_with(vec![TypeDecl::class("SilentLogger").implementing("ILogger")]);
    let err = builder
        .build(&ClassContext::new("Order").mixin("SilentLogger"))
        .unwrap_err();
    match err {
        BuildError::InterfaceMemberNotImplemented {
            mixin,
            interface,
            member,
        } => {
            assert_eq!(mixin, "SilentLogger");
            assert_eq!(interface, "ILogger");
            assert_eq!(member, "void Log(string)");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn target_directive_without_compatible_member_fails() {
    let builder = builder_with(vec![TypeDecl::class("BatchSave").with_member(
        MemberDecl::method(MethodSignature::new("Save", ["int"], "void"))
            .overriding(OverrideDirective::Target),
    )]);
    let err = builder
        .build(&ClassContext::new("Order").mixin("BatchSave"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "'BatchSave.Save' is marked as an override, but no compatible member exists in target class 'Order'"
    );
}

fn printing_builder() -> mixdef_build::DefinitionBuilder {
    builder_with(vec![
        TypeDecl::class("Invoice").with_member(
            MemberDecl::method(MethodSignature::action("Print")).overriding(OverrideDirective::Mixin),
        ),
        TypeDecl::class("PrintMixin").with_method(MethodSignature::action("Print")),
        TypeDecl::class("FancyPrintMixin").with_method(MethodSignature::action("Print")),
    ])
}

#[test]
fn mixin_directive_overrides_the_single_candidate() {
    let graph = printing_builder()
        .build(&ClassContext::new("Invoice").mixin("PrintMixin"))
        .unwrap();
    let print = MemberSignature::Method(MethodSignature::action("Print"));
    let invoice_print = member(&graph, NodeId::ROOT, print.clone());
    let mixin_print = member(&graph, mixin_unit(&graph, "PrintMixin"), print);
    assert_eq!(graph.member(invoice_print).unwrap().base, Some(mixin_print));
    assert_eq!(
        graph.member(mixin_print).unwrap().override_by(NodeId::ROOT),
        Some(invoice_print)
    );
}

#[test]
fn mixin_directive_needs_exactly_one_candidate() {
    let builder = printing_builder();
    let err = builder.build(&ClassContext::new("Invoice")).unwrap_err();
    assert!(matches!(err, BuildError::OverriddenMemberNotFound { .. }));

    let err = builder
        .build(
            &ClassContext::new("Invoice")
                .mixin("PrintMixin")
                .mixin("FancyPrintMixin"),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "'Invoice.Print' overrides more than one mixin member: PrintMixin.Print, FancyPrintMixin.Print"
    );
}
