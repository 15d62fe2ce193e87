//! Error types for building and caching definitions.

use thiserror::Error;

use mixdef_check::ValidationLog;
use mixdef_core::error::CoreError;

/// A configuration could not be turned into a definition graph.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unknown type '{name}' in configuration of '{target}'")]
    UnknownType { target: String, name: String },

    #[error("'{name}' cannot be used as {role}: it is not a class")]
    NotAClass { name: String, role: &'static str },

    #[error(transparent)]
    Core(#[from] CoreError),

    /// An override directive matched no compatible member.
    #[error("'{member}' is marked as an override, but no compatible member exists in {searched}")]
    OverriddenMemberNotFound { member: String, searched: String },

    /// A target member marked as overriding a mixin member matched several.
    #[error("'{member}' overrides more than one mixin member: {}", .candidates.join(", "))]
    AmbiguousOverride {
        member: String,
        candidates: Vec<String>,
    },

    #[error("mixin '{mixin}' introduces '{interface}' but does not implement '{member}'")]
    InterfaceMemberNotImplemented {
        mixin: String,
        interface: String,
        member: String,
    },
}

/// A definition could not be obtained from the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cannot build definition for '{target}': {source}")]
    Build {
        target: String,
        #[source]
        source: BuildError,
    },

    /// The built definition failed validation; nothing was cached.
    #[error("{}", validation_report(.target, .log))]
    Validation { target: String, log: ValidationLog },
}

impl CacheError {
    /// The validation log, if validation was the cause.
    pub fn log(&self) -> Option<&ValidationLog> {
        match self {
            CacheError::Validation { log, .. } => Some(log),
            CacheError::Build { .. } => None,
        }
    }
}

fn validation_report(target: &str, log: &ValidationLog) -> String {
    let mut report = format!(
        "configuration of '{}' is invalid ({} failures, {} exceptions, {} warnings)",
        target,
        log.failure_count(),
        log.exception_count(),
        log.warning_count()
    );
    for (result, entry) in log.entries() {
        if entry.outcome == mixdef_check::Outcome::Success {
            continue;
        }
        report.push_str(&format!(
            "\n  {} {} [{}]: {}",
            entry.outcome,
            result.location(),
            entry.rule,
            entry.message
        ));
    }
    report
}
