//! Member signatures and the signature-compatibility predicate.
//!
//! Signatures carry type names rather than [`TypeId`](crate::id::TypeId)s:
//! parameter and return types such as `void` or `int` do not need to be
//! registered in the universe to take part in a comparison.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Return type name of members that produce no value.
pub const VOID: &str = "void";

fn void() -> String {
    VOID.to_string()
}

fn yes() -> bool {
    true
}

/// The three member kinds a unit can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Method,
    Property,
    Event,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemberKind::Method => "method",
            MemberKind::Property => "property",
            MemberKind::Event => "event",
        };
        f.write_str(name)
    }
}

/// Name, parameter types and return type of a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default = "void")]
    pub return_type: String,
}

impl MethodSignature {
    /// Creates a method signature.
    pub fn new<P, S>(name: &str, parameters: P, return_type: &str) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MethodSignature {
            name: name.to_string(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            return_type: return_type.to_string(),
        }
    }

    /// Creates a parameterless method returning `void`.
    pub fn action(name: &str) -> Self {
        MethodSignature {
            name: name.to_string(),
            parameters: Vec::new(),
            return_type: void(),
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}({})",
            self.return_type,
            self.name,
            self.parameters.join(", ")
        )
    }
}

/// Name, type and accessor shape of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertySignature {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default = "yes")]
    pub has_getter: bool,
    #[serde(default)]
    pub has_setter: bool,
}

impl PropertySignature {
    /// A property with a getter only.
    pub fn read_only(name: &str, property_type: &str) -> Self {
        PropertySignature {
            name: name.to_string(),
            property_type: property_type.to_string(),
            has_getter: true,
            has_setter: false,
        }
    }

    /// A property with both getter and setter.
    pub fn read_write(name: &str, property_type: &str) -> Self {
        PropertySignature {
            has_setter: true,
            ..Self::read_only(name, property_type)
        }
    }

    /// Signature of the `get_X` accessor, if the property has one.
    pub fn getter(&self) -> Option<MethodSignature> {
        self.has_getter.then(|| MethodSignature {
            name: format!("get_{}", self.name),
            parameters: Vec::new(),
            return_type: self.property_type.clone(),
        })
    }

    /// Signature of the `set_X` accessor, if the property has one.
    pub fn setter(&self) -> Option<MethodSignature> {
        self.has_setter.then(|| MethodSignature {
            name: format!("set_{}", self.name),
            parameters: vec![self.property_type.clone()],
            return_type: void(),
        })
    }
}

impl fmt::Display for PropertySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accessors = match (self.has_getter, self.has_setter) {
            (true, true) => "get; set;",
            (true, false) => "get;",
            (false, true) => "set;",
            (false, false) => "",
        };
        write!(f, "{} {} {{ {} }}", self.property_type, self.name, accessors)
    }
}

/// Name and handler type of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventSignature {
    pub name: String,
    pub handler_type: String,
}

impl EventSignature {
    pub fn new(name: &str, handler_type: &str) -> Self {
        EventSignature {
            name: name.to_string(),
            handler_type: handler_type.to_string(),
        }
    }

    /// Signature of the `add_X` accessor.
    pub fn adder(&self) -> MethodSignature {
        MethodSignature {
            name: format!("add_{}", self.name),
            parameters: vec![self.handler_type.clone()],
            return_type: void(),
        }
    }

    /// Signature of the `remove_X` accessor.
    pub fn remover(&self) -> MethodSignature {
        MethodSignature {
            name: format!("remove_{}", self.name),
            parameters: vec![self.handler_type.clone()],
            return_type: void(),
        }
    }
}

impl fmt::Display for EventSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event {} {}", self.handler_type, self.name)
    }
}

/// Signature of any member kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberSignature {
    Method(MethodSignature),
    Property(PropertySignature),
    Event(EventSignature),
}

impl MemberSignature {
    pub fn name(&self) -> &str {
        match self {
            MemberSignature::Method(m) => &m.name,
            MemberSignature::Property(p) => &p.name,
            MemberSignature::Event(e) => &e.name,
        }
    }

    pub fn kind(&self) -> MemberKind {
        match self {
            MemberSignature::Method(_) => MemberKind::Method,
            MemberSignature::Property(_) => MemberKind::Property,
            MemberSignature::Event(_) => MemberKind::Event,
        }
    }

    /// Accessor method signatures in accessor order: `[get, set]` for
    /// properties, `[add, remove]` for events, none for methods.
    pub fn accessors(&self) -> [Option<MethodSignature>; 2] {
        match self {
            MemberSignature::Method(_) => [None, None],
            MemberSignature::Property(p) => [p.getter(), p.setter()],
            MemberSignature::Event(e) => [Some(e.adder()), Some(e.remover())],
        }
    }
}

impl fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberSignature::Method(m) => m.fmt(f),
            MemberSignature::Property(p) => p.fmt(f),
            MemberSignature::Event(e) => e.fmt(f),
        }
    }
}

/// Pure predicate deciding whether two member signatures are compatible
/// enough for one member to override the other.
///
/// Names are not part of the comparison; callers match names themselves.
pub trait SignatureChecker: Send + Sync {
    fn methods_compatible(&self, base: &MethodSignature, candidate: &MethodSignature) -> bool;

    fn properties_compatible(
        &self,
        base: &PropertySignature,
        candidate: &PropertySignature,
    ) -> bool;

    fn events_compatible(&self, base: &EventSignature, candidate: &EventSignature) -> bool;

    /// Dispatches on the member kind. Members of different kinds are never compatible.
    fn compatible(&self, base: &MemberSignature, candidate: &MemberSignature) -> bool {
        match (base, candidate) {
            (MemberSignature::Method(b), MemberSignature::Method(c)) => {
                self.methods_compatible(b, c)
            }
            (MemberSignature::Property(b), MemberSignature::Property(c)) => {
                self.properties_compatible(b, c)
            }
            (MemberSignature::Event(b), MemberSignature::Event(c)) => {
                self.events_compatible(b, c)
            }
            _ => false,
        }
    }
}

/// Exact structural comparison of parameter, return, property and handler types.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralSignatures;

impl SignatureChecker for StructuralSignatures {
    fn methods_compatible(&self, base: &MethodSignature, candidate: &MethodSignature) -> bool {
        base.parameters == candidate.parameters && base.return_type == candidate.return_type
    }

    fn properties_compatible(
        &self,
        base: &PropertySignature,
        candidate: &PropertySignature,
    ) -> bool {
        base.property_type == candidate.property_type
    }

    fn events_compatible(&self, base: &EventSignature, candidate: &EventSignature) -> bool {
        base.handler_type == candidate.handler_type
    }
}
