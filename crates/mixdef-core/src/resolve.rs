//! Dependency resolution: which unit implements the type a dependency
//! requires, and whether the dependency is satisfied.

use crate::collection::KeyedCollection;
use crate::error::CoreError;
use crate::graph::CompositionGraph;
use crate::id::NodeId;
use crate::node::DependencyKind;

impl CompositionGraph {
    /// The unit that implements the type required by `dependency`.
    ///
    /// For this and base dependencies:
    /// 1. the composition unit, if the target class is assignable to the
    ///    required type;
    /// 2. otherwise the mixin introducing the required interface;
    /// 3. otherwise the composition unit again, unless the required type is
    ///    an empty interface. Non-empty faces and base calls are resolved by
    ///    member matching against the target.
    ///
    /// For mixin dependencies an interface resolves to the mixin introducing
    /// it and a class to the applied mixin of that type.
    ///
    /// `None` means unimplemented.
    pub fn implementer(&self, dependency: NodeId) -> Result<Option<NodeId>, CoreError> {
        let dep = self.dependency(dependency)?;
        let required = dep.required_type;
        let universe = self.universe();
        let target = self.target();
        let introduced_by = target.received_interfaces.get(&required).map(|c| c.unit);

        let found = match dep.kind {
            DependencyKind::This | DependencyKind::Base => {
                if universe.is_assignable_from(required, target.type_id) {
                    Some(NodeId::ROOT)
                } else if introduced_by.is_some() {
                    introduced_by
                } else if !universe.is_empty_interface(required) {
                    Some(NodeId::ROOT)
                } else {
                    None
                }
            }
            DependencyKind::Mixin => {
                if universe.is_interface(required) {
                    introduced_by
                } else {
                    target.mixins.get(&required).map(|c| c.node)
                }
            }
        };
        Ok(found)
    }

    /// A dependency is satisfied when it has an implementer, or when it is an
    /// aggregate and at least one of its nested dependencies is satisfied.
    pub fn is_satisfied(&self, dependency: NodeId) -> Result<bool, CoreError> {
        if self.implementer(dependency)?.is_some() {
            return Ok(true);
        }
        let dep = self.dependency(dependency)?;
        for nested in dep.aggregated.iter() {
            if self.is_satisfied(nested.node)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// A dependency with nested dependencies.
    pub fn is_aggregate(&self, dependency: NodeId) -> Result<bool, CoreError> {
        Ok(self.dependency(dependency)?.is_aggregate())
    }
}
