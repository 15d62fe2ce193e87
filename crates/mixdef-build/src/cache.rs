//! Build-and-cache orchestrator.
//!
//! [`DefinitionCache`] maps a [`ClassContext`] to its validated
//! [`CompositionGraph`]. Lookups and publishing are short `DashMap` shard
//! operations; building and validating run outside any lock, so builds of
//! different contexts never wait on each other. Two threads missing on the
//! same context may both build; the first to publish wins and the other
//! returns the winner's graph.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use mixdef_check::Validator;
use mixdef_core::graph::CompositionGraph;

use crate::builder::DefinitionBuilder;
use crate::context::ClassContext;
use crate::error::CacheError;

/// Options for [`DefinitionCache`].
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Treat validation warnings like failures.
    pub fail_on_warnings: bool,
}

/// Snapshot of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub builds: u64,
    pub published: u64,
    /// Graphs built by a thread that lost the publish race.
    pub discarded: u64,
    pub validation_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
    published: AtomicU64,
    discarded: AtomicU64,
    validation_failures: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Caller-owned cache of validated composition graphs.
#[derive(Debug)]
pub struct DefinitionCache {
    builder: DefinitionBuilder,
    validator: Validator,
    options: CacheOptions,
    entries: DashMap<ClassContext, Arc<CompositionGraph>>,
    counters: Counters,
}

impl DefinitionCache {
    pub fn new(builder: DefinitionBuilder, validator: Validator) -> Self {
        Self::with_options(builder, validator, CacheOptions::default())
    }

    pub fn with_options(builder: DefinitionBuilder, validator: Validator, options: CacheOptions) -> Self {
        DefinitionCache {
            builder,
            validator,
            options,
            entries: DashMap::new(),
            counters: Counters::default(),
        }
    }

    pub fn builder(&self) -> &DefinitionBuilder {
        &self.builder
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// The cached graph for `context`, without building.
    pub fn get(&self, context: &ClassContext) -> Option<Arc<CompositionGraph>> {
        self.entries.get(context).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the cached graph for `context`, building, validating and
    /// publishing it on a miss.
    ///
    /// Once a graph is published for a context every later call returns that
    /// same instance. A graph that fails validation is never published, so
    /// the next call builds again.
    pub fn get_or_build(&self, context: &ClassContext) -> Result<Arc<CompositionGraph>, CacheError> {
        if let Some(graph) = self.get(context) {
            Counters::bump(&self.counters.hits);
            tracing::debug!(context = %context, fingerprint = %context.short_fingerprint(), "definition cache hit");
            return Ok(graph);
        }
        Counters::bump(&self.counters.misses);
        tracing::debug!(context = %context, fingerprint = %context.short_fingerprint(), "definition cache miss");

        let graph = self.build_validated(context)?;

        match self.entries.entry(context.clone()) {
            Entry::Occupied(existing) => {
                Counters::bump(&self.counters.discarded);
                tracing::debug!(
                    context = %context,
                    "definition published concurrently, discarding own build"
                );
                Ok(Arc::clone(existing.get()))
            }
            Entry::Vacant(slot) => {
                let graph = Arc::new(graph);
                slot.insert(Arc::clone(&graph));
                Counters::bump(&self.counters.published);
                tracing::info!(
                    context = %context,
                    fingerprint = %context.short_fingerprint(),
                    nodes = graph.len(),
                    "definition published"
                );
                Ok(graph)
            }
        }
    }

    fn build_validated(&self, context: &ClassContext) -> Result<CompositionGraph, CacheError> {
        Counters::bump(&self.counters.builds);
        let graph = self.builder.build(context).map_err(|source| CacheError::Build {
            target: context.target.clone(),
            source,
        })?;

        let log = self.validator.validate(&graph);
        let rejected = log.has_failures() || (self.options.fail_on_warnings && log.has_warnings());
        if rejected {
            Counters::bump(&self.counters.validation_failures);
            tracing::warn!(
                context = %context,
                failures = log.failure_count(),
                exceptions = log.exception_count(),
                warnings = log.warning_count(),
                "definition failed validation"
            );
            return Err(CacheError::Validation {
                target: context.target.clone(),
                log,
            });
        }
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Contexts with a published graph, in no particular order.
    pub fn contexts(&self) -> Vec<ClassContext> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        CacheStats {
            hits: load(&self.counters.hits),
            misses: load(&self.counters.misses),
            builds: load(&self.counters.builds),
            published: load(&self.counters.published),
            discarded: load(&self.counters.discarded),
            validation_failures: load(&self.counters.validation_failures),
        }
    }
}
