//! Composition configuration: which mixins apply to which target class.
//!
//! [`ClassContext`] is an immutable value with structural equality and
//! hashing, so it can key the definition cache directly.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One mixin applied to a target, with the mixins it explicitly depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MixinContext {
    #[serde(rename = "type")]
    pub mixin_type: String,
    /// Mixin or interface types this mixin needs applied alongside it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub explicit_dependencies: Vec<String>,
}

impl MixinContext {
    pub fn new(mixin_type: &str) -> Self {
        MixinContext {
            mixin_type: mixin_type.to_string(),
            explicit_dependencies: Vec::new(),
        }
    }

    pub fn depending_on(mut self, dependency: &str) -> Self {
        self.explicit_dependencies.push(dependency.to_string());
        self
    }
}

/// A target class and its ordered mixin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassContext {
    pub target: String,
    #[serde(default)]
    pub mixins: Vec<MixinContext>,
}

impl ClassContext {
    pub fn new(target: &str) -> Self {
        ClassContext {
            target: target.to_string(),
            mixins: Vec::new(),
        }
    }

    pub fn with_mixin(mut self, mixin: MixinContext) -> Self {
        self.mixins.push(mixin);
        self
    }

    /// Shorthand for a mixin without explicit dependencies.
    pub fn mixin(self, mixin_type: &str) -> Self {
        self.with_mixin(MixinContext::new(mixin_type))
    }

    /// Stable content hash of the configuration.
    ///
    /// Every string is length-prefixed so that different splits of the same
    /// characters hash differently.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        update_str(&mut hasher, &self.target);
        hasher.update(&(self.mixins.len() as u64).to_le_bytes());
        for mixin in &self.mixins {
            update_str(&mut hasher, &mixin.mixin_type);
            hasher.update(&(mixin.explicit_dependencies.len() as u64).to_le_bytes());
            for dependency in &mixin.explicit_dependencies {
                update_str(&mut hasher, dependency);
            }
        }
        hasher.finalize()
    }

    /// First 16 hex digits of [`fingerprint`](Self::fingerprint), for logs.
    pub fn short_fingerprint(&self) -> String {
        self.fingerprint().to_hex()[..16].to_string()
    }
}

fn update_str(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

impl fmt::Display for ClassContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target)?;
        if !self.mixins.is_empty() {
            let names: Vec<_> = self.mixins.iter().map(|m| m.mixin_type.as_str()).collect();
            write!(f, " + [{}]", names.join(", "))?;
        }
        Ok(())
    }
}
