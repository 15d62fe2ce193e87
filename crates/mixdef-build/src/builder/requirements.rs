//! Phase 5: the methods each face and base-call interface requirement asks
//! of its implementer.

use mixdef_core::collection::KeyedCollection;
use mixdef_core::id::{NodeId, TypeId};
use mixdef_core::node::RequirementKind;
use mixdef_core::signature::{MemberSignature, MethodSignature};

use super::BuildRun;
use crate::error::BuildError;

impl<'a> BuildRun<'a> {
    /// Aggregator requirements get no methods of their own; their nested
    /// requirements carry them.
    pub(super) fn add_required_methods(&mut self) -> Result<(), BuildError> {
        for kind in [RequirementKind::Face, RequirementKind::BaseCall] {
            let requirements: Vec<NodeId> = self
                .graph
                .target()
                .requirements(kind)
                .iter()
                .map(|c| c.node)
                .collect();
            for requirement in requirements {
                self.add_required_methods_of(requirement)?;
            }
        }
        Ok(())
    }

    fn add_required_methods_of(&mut self, requirement: NodeId) -> Result<(), BuildError> {
        let (required_type, first_dependency) = {
            let node = self.graph.requirement(requirement)?;
            if node.is_aggregator || !self.universe.is_interface(node.type_id) {
                return Ok(());
            }
            (node.type_id, node.requiring_dependencies.iter().next().map(|c| c.node))
        };

        let implementer = match first_dependency {
            Some(dependency) => self.graph.implementer(dependency)?,
            None => None,
        };

        for signature in self.required_signatures(required_type) {
            let implementing = match implementer {
                Some(unit) => self.graph.find_method(unit, &signature, self.checker)?,
                None => None,
            };
            self.graph
                .add_required_method(requirement, signature, implementing)?;
        }
        Ok(())
    }

    /// Every method of the interface and the interfaces it extends, with
    /// properties and events expanded to their accessors.
    fn required_signatures(&self, interface: TypeId) -> Vec<MethodSignature> {
        let mut signatures: Vec<MethodSignature> = Vec::new();
        for (_, member) in self.universe.interface_members(interface) {
            let methods = match &member.signature {
                MemberSignature::Method(method) => vec![method.clone()],
                other => other.accessors().into_iter().flatten().collect(),
            };
            for method in methods {
                if !signatures.contains(&method) {
                    signatures.push(method);
                }
            }
        }
        signatures
    }
}
