//! Explicit cross-field dependency edges.
//!
//! When one field's value gates or invalidates another's (the classic case:
//! a relationship's chosen collection gates its label-field and sort-order
//! pickers), the edge is declared here once and a single propagation
//! function computes what to reset - instead of ad hoc "on change of A,
//! clear B" handlers scattered per component.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Directed dependency edges between field slugs: `upstream -> dependents`.
/// Changing an upstream value resets every transitive dependent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeGraph {
    edges: BTreeMap<String, Vec<String>>,
}

impl CascadeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depends_on(&mut self, downstream: impl Into<String>, upstream: impl Into<String>) {
        let downstream = downstream.into();
        let dependents = self.edges.entry(upstream.into()).or_default();
        if !dependents.contains(&downstream) {
            dependents.push(downstream);
        }
    }

    /// Direct dependents of one field.
    pub fn dependents_of(&self, upstream: &str) -> &[String] {
        self.edges
            .get(upstream)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every field to reset when `changed` takes a new value, in breadth-first
    /// order, each at most once. Recomputed on every upstream change, not
    /// just on first load.
    pub fn cascade_from(&self, changed: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<&str> = self.dependents_of(changed).iter().map(String::as_str).collect();
        while let Some(slug) = queue.pop_front() {
            if !seen.insert(slug.to_string()) {
                continue;
            }
            out.push(slug.to_string());
            queue.extend(self.dependents_of(slug).iter().map(String::as_str));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_resets_transitively() {
        let mut graph = CascadeGraph::new();
        graph.depends_on("display_field", "collection");
        graph.depends_on("sort_order", "collection");
        graph.depends_on("sort_direction", "sort_order");

        assert_eq!(
            graph.cascade_from("collection"),
            vec!["display_field", "sort_order", "sort_direction"]
        );
        assert_eq!(graph.cascade_from("sort_order"), vec!["sort_direction"]);
        assert!(graph.cascade_from("display_field").is_empty());
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut graph = CascadeGraph::new();
        graph.depends_on("b", "a");
        graph.depends_on("b", "a");
        assert_eq!(graph.dependents_of("a"), ["b".to_string()]);
    }

    #[test]
    fn diamond_visits_each_once() {
        let mut graph = CascadeGraph::new();
        graph.depends_on("b", "a");
        graph.depends_on("c", "a");
        graph.depends_on("d", "b");
        graph.depends_on("d", "c");
        assert_eq!(graph.cascade_from("a"), vec!["b", "c", "d"]);
    }
}
