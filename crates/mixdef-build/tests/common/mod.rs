//! Order-processing universe shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use mixdef_build::{ClassContext, DefinitionBuilder, MixinContext};
use mixdef_core::signature::{MethodSignature, PropertySignature};
use mixdef_core::types::{AttributeDecl, AttributeUsage, MemberDecl, MixinDecl, OverrideDirective, TypeDecl};
use mixdef_core::{CompositionGraph, NodeId, TypeUniverse};

fn mixin(face: Option<&str>, base_call: Option<&str>, non_introduced: &[&str]) -> MixinDecl {
    MixinDecl {
        face: face.map(str::to_string),
        base_call: base_call.map(str::to_string),
        non_introduced: non_introduced.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn shop_decls() -> Vec<TypeDecl> {
    let single = AttributeUsage {
        allow_multiple: false,
        inherited: true,
    };
    let local = AttributeUsage {
        allow_multiple: true,
        inherited: false,
    };
    vec![
        TypeDecl::interface("IOrderSink").with_method(MethodSignature::action("Accept")),
        TypeDecl::interface("ILogger").with_method(MethodSignature::new("Log", ["string"], "void")),
        TypeDecl::interface("IHasTotal").with_property(PropertySignature::read_only("Total", "decimal")),
        TypeDecl::interface("IMarker"),
        TypeDecl::interface("IAuditable")
            .implementing("ILogger")
            .implementing("IHasTotal"),
        TypeDecl::attribute("Serializable", single),
        TypeDecl::attribute("Audited", single),
        TypeDecl::attribute("Tracked", local),
        TypeDecl::class("EntityBase")
            .with_method(MethodSignature::action("Validate"))
            .with_property(PropertySignature::read_only("Id", "int"))
            .with_attribute(AttributeDecl::new("Serializable")),
        TypeDecl::class("Order")
            .extending("EntityBase")
            .implementing("IOrderSink")
            .with_method(MethodSignature::action("Save"))
            .with_method(MethodSignature::action("Accept"))
            .with_property(PropertySignature::read_write("Name", "string")),
        TypeDecl::class("LoggingMixin")
            .implementing("ILogger")
            .with_method(MethodSignature::new("Log", ["string"], "void"))
            .with_attribute(AttributeDecl::new("Serializable"))
            .with_attribute(AttributeDecl::new("Audited"))
            .as_mixin(mixin(Some("IOrderSink"), None, &[])),
        TypeDecl::class("AuditedOrder")
            .with_member(
                MemberDecl::method(MethodSignature::action("Save"))
                    .overriding(OverrideDirective::Target)
                    .with_attribute(AttributeDecl::new("Tracked").copied()),
            )
            .with_member(
                MemberDecl::property(PropertySignature::read_write("Name", "string"))
                    .overriding(OverrideDirective::Target),
            )
            .as_mixin(mixin(Some("ILogger"), Some("IOrderSink"), &[])),
        TypeDecl::class("TotalsMixin")
            .implementing("IHasTotal")
            .with_property(PropertySignature::read_only("Total", "decimal"))
            .as_mixin(mixin(Some("IAuditable"), None, &[])),
        TypeDecl::class("ConsoleSink")
            .implementing("ILogger")
            .implementing("IOrderSink")
            .with_method(MethodSignature::new("Log", ["string"], "void"))
            .with_method(MethodSignature::action("Accept")),
        TypeDecl::class("TotalsReport").as_mixin(mixin(Some("IHasTotal"), None, &[])),
        TypeDecl::class("MarkerMixin")
            .implementing("IMarker")
            .as_mixin(mixin(Some("IMarker"), None, &["IMarker"])),
    ]
}

pub fn shop_universe() -> Arc<TypeUniverse> {
    Arc::new(TypeUniverse::from_decls(shop_decls()).unwrap())
}

pub fn builder() -> DefinitionBuilder {
    DefinitionBuilder::new(shop_universe())
}

/// A builder over the shop types followed by `extra`.
pub fn builder_with(extra: Vec<TypeDecl>) -> DefinitionBuilder {
    let mut decls = shop_decls();
    decls.extend(extra);
    DefinitionBuilder::new(Arc::new(TypeUniverse::from_decls(decls).unwrap()))
}

/// Logging, auditing and totals applied to `Order`; builds and validates
/// cleanly.
pub fn order_context() -> ClassContext {
    ClassContext::new("Order")
        .mixin("LoggingMixin")
        .mixin("AuditedOrder")
        .mixin("TotalsMixin")
}

/// A context whose validation fails: `IMarker` is required but nothing
/// provides it.
pub fn marker_context() -> ClassContext {
    ClassContext::new("Order").mixin("MarkerMixin")
}

/// Builds, but `ConsoleSink` is shadowed by `LoggingMixin`, which the
/// validator reports as a warning.
pub fn shadowed_context() -> ClassContext {
    ClassContext::new("Order")
        .mixin("LoggingMixin")
        .with_mixin(MixinContext::new("ConsoleSink"))
}

pub fn mixin_unit(graph: &CompositionGraph, name: &str) -> NodeId {
    let type_id = graph.universe().lookup(name).unwrap();
    graph.target().mixins.get(&type_id).unwrap().node
}

/// Full names of `ids`.
pub fn names(graph: &CompositionGraph, ids: impl IntoIterator<Item = NodeId>) -> Vec<String> {
    ids.into_iter()
        .map(|id| graph.full_name(id).unwrap().to_string())
        .collect()
}
