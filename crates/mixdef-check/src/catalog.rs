//! Default rule catalog.

use std::collections::HashSet;

use mixdef_core::node::{DefinitionNode, NodeKind, SuppressionReason};

use crate::rule::{Rule, RuleContext, RuleError, RuleSet, Verdict};

/// The rules every validator starts with.
pub fn default_rules() -> RuleSet {
    RuleSet::new()
        .with(DependencyMustBeSatisfied)
        .with(MixinDependencyMustBeSatisfied)
        .with(MixinMustNotBeItsOwnTarget)
        .with(FaceClassMustBeAssignable)
        .with(OverrideMustNotBeCyclic)
        .with(RequiredMethodShouldHaveImplementer)
        .with(IntroductionShadowedByEarlierMixin)
}

fn wrong_node(cx: &RuleContext<'_>) -> RuleError {
    RuleError::Other(format!("rule applied to a {} node", cx.kind()))
}

/// This and base dependencies need an implementer. Nested dependencies are
/// judged through their aggregate.
pub struct DependencyMustBeSatisfied;

impl Rule for DependencyMustBeSatisfied {
    fn name(&self) -> &str {
        "dependency-must-be-satisfied"
    }

    fn kinds(&self) -> &[NodeKind] {
        &[NodeKind::ThisDependency, NodeKind::BaseDependency]
    }

    fn check(&self, cx: &RuleContext<'_>) -> Result<Verdict, RuleError> {
        let DefinitionNode::Dependency(dep) = cx.definition else {
            return Err(wrong_node(cx));
        };
        if dep.aggregator.is_some() || cx.graph.is_satisfied(cx.node)? {
            return Ok(Verdict::Pass);
        }
        Ok(Verdict::Fail(format!(
            "mixin '{}' requires '{}', which neither the target class nor any mixin provides",
            cx.name_of(dep.depender),
            cx.full_name()
        )))
    }
}

/// Mixin dependencies must name a mixin applied to the same target, or an
/// interface one of them introduces.
pub struct MixinDependencyMustBeSatisfied;

impl Rule for MixinDependencyMustBeSatisfied {
    fn name(&self) -> &str {
        "mixin-dependency-must-be-satisfied"
    }

    fn kinds(&self) -> &[NodeKind] {
        &[NodeKind::MixinDependency]
    }

    fn check(&self, cx: &RuleContext<'_>) -> Result<Verdict, RuleError> {
        let DefinitionNode::Dependency(dep) = cx.definition else {
            return Err(wrong_node(cx));
        };
        if cx.graph.is_satisfied(cx.node)? {
            return Ok(Verdict::Pass);
        }
        Ok(Verdict::Fail(format!(
            "mixin '{}' depends on '{}', which is not part of the composition",
            cx.name_of(dep.depender),
            cx.full_name()
        )))
    }
}

pub struct MixinMustNotBeItsOwnTarget;

impl Rule for MixinMustNotBeItsOwnTarget {
    fn name(&self) -> &str {
        "mixin-must-not-be-its-own-target"
    }

    fn kinds(&self) -> &[NodeKind] {
        &[NodeKind::Mixin]
    }

    fn check(&self, cx: &RuleContext<'_>) -> Result<Verdict, RuleError> {
        let DefinitionNode::Mixin(mixin) = cx.definition else {
            return Err(wrong_node(cx));
        };
        if mixin.type_id == cx.graph.target().type_id {
            return Ok(Verdict::Fail(format!(
                "'{}' is applied as a mixin to itself",
                mixin.name
            )));
        }
        Ok(Verdict::Pass)
    }
}

/// A class used as a face type must be a base of the target class; only
/// interfaces can be satisfied by mixins or by duck typing.
pub struct FaceClassMustBeAssignable;

impl Rule for FaceClassMustBeAssignable {
    fn name(&self) -> &str {
        "face-class-must-be-assignable"
    }

    fn kinds(&self) -> &[NodeKind] {
        &[NodeKind::FaceRequirement]
    }

    fn check(&self, cx: &RuleContext<'_>) -> Result<Verdict, RuleError> {
        let DefinitionNode::Requirement(req) = cx.definition else {
            return Err(wrong_node(cx));
        };
        let universe = cx.graph.universe();
        let target = cx.graph.target();
        if universe.is_interface(req.type_id) || universe.is_assignable_from(req.type_id, target.type_id) {
            return Ok(Verdict::Pass);
        }
        Ok(Verdict::Fail(format!(
            "face class '{}' is not a base of target class '{}'",
            req.name, target.name
        )))
    }
}

/// Following `base` links from a member must never come back to it.
pub struct OverrideMustNotBeCyclic;

impl Rule for OverrideMustNotBeCyclic {
    fn name(&self) -> &str {
        "override-must-not-be-cyclic"
    }

    fn kinds(&self) -> &[NodeKind] {
        &[NodeKind::Method, NodeKind::Property, NodeKind::Event]
    }

    fn check(&self, cx: &RuleContext<'_>) -> Result<Verdict, RuleError> {
        let mut seen = HashSet::from([cx.node]);
        let mut current = cx.graph.member(cx.node)?.base;
        while let Some(base) = current {
            if !seen.insert(base) {
                return Ok(Verdict::Fail(format!(
                    "override chain of '{}' loops back through '{}'",
                    cx.full_name(),
                    cx.name_of(base)
                )));
            }
            current = cx.graph.member(base)?.base;
        }
        Ok(Verdict::Pass)
    }
}

pub struct RequiredMethodShouldHaveImplementer;

impl Rule for RequiredMethodShouldHaveImplementer {
    fn name(&self) -> &str {
        "required-method-should-have-implementer"
    }

    fn kinds(&self) -> &[NodeKind] {
        &[NodeKind::RequiredMethod]
    }

    fn check(&self, cx: &RuleContext<'_>) -> Result<Verdict, RuleError> {
        let DefinitionNode::RequiredMethod(method) = cx.definition else {
            return Err(wrong_node(cx));
        };
        match method.implementer {
            Some(_) => Ok(Verdict::Pass),
            None => Ok(Verdict::Warn(format!(
                "no member implements required method '{}'",
                method.signature
            ))),
        }
    }
}

pub struct IntroductionShadowedByEarlierMixin;

impl Rule for IntroductionShadowedByEarlierMixin {
    fn name(&self) -> &str {
        "introduction-shadowed-by-earlier-mixin"
    }

    fn kinds(&self) -> &[NodeKind] {
        &[NodeKind::SuppressedInterfaceIntroduction]
    }

    fn check(&self, cx: &RuleContext<'_>) -> Result<Verdict, RuleError> {
        let DefinitionNode::SuppressedInterface(suppressed) = cx.definition else {
            return Err(wrong_node(cx));
        };
        match suppressed.reason {
            SuppressionReason::IntroducedBy(earlier) => Ok(Verdict::Warn(format!(
                "interface '{}' of '{}' is already introduced by '{}'",
                suppressed.name,
                cx.name_of(suppressed.implementer),
                cx.name_of(earlier)
            ))),
            SuppressionReason::Explicit | SuppressionReason::ImplementedByTarget => Ok(Verdict::Pass),
        }
    }
}
