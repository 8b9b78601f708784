//! Segment trie matching concrete paths against registered templates.
//!
//! ## Implementation Details
//!
//! - Each node represents one path segment
//! - Literal segments (e.g. `schema`) match exactly
//! - Each position has at most one wildcard child, matching any single segment
//!   except reserved ones
//! - Values are stored at terminal nodes together with the capture names of the
//!   template that bound them
//!
//! Capture names belong to the binding, not to the node, so `/things/{id}` and
//! `/things/{thing}` are the same route and the later insert replaces the earlier.
//!
//! Lookup tries the literal child first, then the wildcard child, backtracking on
//! failure. The first complete match wins; there is no scoring between several
//! templates that could match the same path.

use smallvec::SmallVec;
use std::sync::Arc;

use super::template::{path_segments, Segment, Template};

/// Maximum number of captured parts before heap allocation.
pub const MAX_INLINE_PARTS: usize = 8;

/// Captured `(wildcard name, concrete segment)` pairs in template order.
pub type PartVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARTS]>;

type NameVec = SmallVec<[Arc<str>; MAX_INLINE_PARTS]>;

#[derive(Debug, Clone)]
struct Binding<T> {
    value: T,
    /// Wildcard names of the bound template, in order
    names: NameVec,
}

#[derive(Debug, Clone)]
struct TrieNode<T> {
    /// Literal segment, empty for the root and wildcard nodes
    segment: String,
    binding: Option<Binding<T>>,
    children: Vec<TrieNode<T>>,
    wildcard: Option<Box<TrieNode<T>>>,
}

impl<T: Clone> TrieNode<T> {
    fn new(segment: String) -> Self {
        Self {
            segment,
            binding: None,
            children: Vec::new(),
            wildcard: None,
        }
    }

    /// Store `value` at the end of `segments`, returning the value it replaced.
    fn insert(&mut self, segments: &[Segment], mut names: NameVec, value: T) -> Option<T> {
        let Some((first, remaining)) = segments.split_first() else {
            return self
                .binding
                .replace(Binding { value, names })
                .map(|old| old.value);
        };

        match first {
            Segment::Wildcard(name) => {
                names.push(Arc::clone(name));
                self.wildcard
                    .get_or_insert_with(|| Box::new(TrieNode::new(String::new())))
                    .insert(remaining, names, value)
            }
            Segment::Literal(segment) => {
                if let Some(child) = self.children.iter_mut().find(|c| &c.segment == segment) {
                    return child.insert(remaining, names, value);
                }
                let mut child = TrieNode::new(segment.clone());
                child.insert(remaining, names, value);
                self.children.push(child);
                None
            }
        }
    }

    fn search<'p>(
        &self,
        segments: &[&'p str],
        reserved: &[String],
        captured: &mut SmallVec<[&'p str; MAX_INLINE_PARTS]>,
    ) -> Option<&Binding<T>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.binding.as_ref();
        };

        if let Some(child) = self.children.iter().find(|c| c.segment == *segment) {
            if let Some(found) = child.search(remaining, reserved, captured) {
                return Some(found);
            }
        }

        if reserved.iter().any(|r| r == segment) {
            return None;
        }

        let child = self.wildcard.as_ref()?;
        captured.push(*segment);
        let found = child.search(remaining, reserved, captured);
        if found.is_none() {
            // Backtrack
            captured.pop();
        }
        found
    }

    fn collect(&self, prefix: &mut Vec<Option<String>>, out: &mut Vec<String>) {
        if let Some(binding) = &self.binding {
            let mut names = binding.names.iter();
            let rendered: Vec<String> = prefix
                .iter()
                .map(|seg| match seg {
                    Some(literal) => literal.clone(),
                    None => names
                        .next()
                        .map_or_else(|| "{}".to_owned(), |n| format!("{{{n}}}")),
                })
                .collect();
            out.push(format!("/{}", rendered.join("/")));
        }
        for child in &self.children {
            prefix.push(Some(child.segment.clone()));
            child.collect(prefix, out);
            prefix.pop();
        }
        if let Some(child) = &self.wildcard {
            prefix.push(None);
            child.collect(prefix, out);
            prefix.pop();
        }
    }
}

/// Routing structure for one HTTP method.
///
/// Cloning is used to build the next version of a table before it is published,
/// so values are expected to be cheap handles such as `Arc`s.
#[derive(Debug, Clone)]
pub struct PathTrie<T> {
    root: TrieNode<T>,
    /// Segments wildcards never capture
    reserved: Vec<String>,
}

impl<T: Clone> PathTrie<T> {
    pub fn new<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: TrieNode::new(String::new()),
            reserved: reserved.into_iter().map(Into::into).collect(),
        }
    }

    /// Bind `template` to `value`, returning the previous binding of the same template.
    pub fn insert(&mut self, template: &Template, value: T) -> Option<T> {
        self.root.insert(template.segments(), NameVec::new(), value)
    }

    /// First value whose template matches `path`, with the captured parts.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<(&T, PartVec)> {
        let segments: SmallVec<[&str; 16]> = path_segments(path).collect();
        let mut captured = SmallVec::new();
        let found = self.root.search(&segments, &self.reserved, &mut captured)?;
        let parts = found
            .names
            .iter()
            .zip(captured)
            .map(|(name, segment)| (Arc::clone(name), segment.to_owned()))
            .collect();
        Some((&found.value, parts))
    }

    /// Every registered template, rendered with its capture names.
    #[must_use]
    pub fn templates(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.collect(&mut Vec::new(), &mut out);
        out
    }
}
