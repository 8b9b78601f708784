//! Routing table core - the lookup hot path.
//!
//! Reads go through an [`ArcSwap`] snapshot and never block. Writes build the
//! next snapshot from the current one under a mutex and publish it in a single
//! store, so a reader sees a whole registration or none of it.

use arc_swap::ArcSwap;
use http::Method;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::template::{Template, INTROSPECT_SEGMENT};
use super::trie::{PartVec, PathTrie};
use crate::spec::SUPPORTED_METHODS;

/// One method's routing structure, shared between snapshots until modified.
type MethodTrie<T> = Arc<PathTrie<Arc<T>>>;

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<T> {
    pub method: Method,
    pub value: Arc<T>,
    /// Captured parts, keyed by (substituted) wildcard name
    pub parts: PartVec,
}

impl<T> RouteMatch<T> {
    /// Captured part by name.
    #[inline]
    #[must_use]
    pub fn part(&self, name: &str) -> Option<&str> {
        self.parts
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Note: This allocates - use `part()` in hot paths
    #[must_use]
    pub fn parts_map(&self) -> HashMap<String, String> {
        self.parts
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// A binding waiting to be committed: `(method, template) -> value`.
#[derive(Debug, Clone)]
pub struct RouteEntry<T> {
    pub method: Method,
    pub template: Template,
    pub value: Arc<T>,
}

/// Per-method routing tables.
pub struct RoutingTable<T> {
    tables: ArcSwap<HashMap<Method, MethodTrie<T>>>,
    writer: Mutex<()>,
}

impl<T> std::fmt::Debug for RoutingTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingTable")
            .field("methods", &self.methods())
            .finish_non_exhaustive()
    }
}

impl<T> Default for RoutingTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RoutingTable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: ArcSwap::from_pointee(HashMap::new()),
            writer: Mutex::new(()),
        }
    }

    /// Commit every entry, or none of them, as one published snapshot.
    ///
    /// Tables for methods seen for the first time are created here. An entry for a
    /// `(method, template)` pair that is already bound replaces the old value.
    pub fn insert_all(&self, entries: Vec<RouteEntry<T>>) {
        if entries.is_empty() {
            return;
        }
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next: HashMap<Method, MethodTrie<T>> = (**self.tables.load()).clone();
        for entry in entries {
            let trie = next
                .entry(entry.method.clone())
                .or_insert_with(|| Arc::new(PathTrie::new([INTROSPECT_SEGMENT])));
            let template = entry.template.to_string();
            if Arc::make_mut(trie).insert(&entry.template, entry.value).is_some() {
                warn!(method = %entry.method, template = %template, "Replaced existing binding");
            } else {
                debug!(method = %entry.method, template = %template, "Route bound");
            }
        }

        info!(
            methods = next.len(),
            "Routing table updated"
        );
        self.tables.store(Arc::new(next));
    }

    /// Bind a single `(method, template)`.
    pub fn insert(&self, method: Method, template: Template, value: Arc<T>) {
        self.insert_all(vec![RouteEntry {
            method,
            template,
            value,
        }]);
    }

    /// Find the value bound to a template matching `path`.
    ///
    /// With `method` given only that method's table is searched. Without it the
    /// tables are tried in the fixed order GET, POST, PUT, DELETE and the first
    /// match wins, even if another method binds the same path differently.
    #[must_use]
    pub fn lookup(&self, path: &str, method: Option<&Method>) -> Option<RouteMatch<T>> {
        let start = Instant::now();
        let tables = self.tables.load();

        let found = match method {
            Some(m) => tables
                .get(m)
                .and_then(|trie| Self::search(m, trie, path)),
            None => SUPPORTED_METHODS.iter().find_map(|name| {
                let m = Method::from_bytes(name.as_bytes()).ok()?;
                let trie = tables.get(&m)?;
                Self::search(&m, trie, path)
            }),
        };

        debug!(
            path = %path,
            method = ?method.map(Method::as_str),
            matched = found.is_some(),
            duration_us = start.elapsed().as_micros(),
            "Route lookup"
        );
        found
    }

    fn search(method: &Method, trie: &PathTrie<Arc<T>>, path: &str) -> Option<RouteMatch<T>> {
        trie.lookup(path).map(|(value, parts)| RouteMatch {
            method: method.clone(),
            value: Arc::clone(value),
            parts,
        })
    }

    /// Templates registered for `method`, empty if the method has no table.
    #[must_use]
    pub fn templates(&self, method: &Method) -> Vec<String> {
        self.tables
            .load()
            .get(method)
            .map(|trie| trie.templates())
            .unwrap_or_default()
    }

    /// Methods that currently have a routing structure.
    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.tables.load().keys().cloned().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }
}
