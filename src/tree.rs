//! The bounded-fanout parse tree (spec.md §3, §4.4): a node owns a map
//! from string keys to child nodes (the reserved key [`WILDCARD_KEY`]
//! denotes the fallback child) and, at leaves, an ordered sequence of
//! cluster indices into the engine's arena.

use std::collections::HashMap;

use crate::cluster::LogCluster;

/// The reserved child-map key for the wildcard fallback child. Distinct
/// from [`crate::patterns::WILDCARD`] (a template token value) — this is
/// a tree-edge label, never confused with a token by callers since the
/// two live in different namespaces (spec.md §9's design note: the
/// wildcard child is a map entry, not a synthetic cluster).
pub const WILDCARD_KEY: &str = "<WILDCARD>";

/// A node in the parse tree. Clusters are stored by index into the
/// engine's cluster arena rather than owned directly, so the engine's
/// flat iteration list and the tree's leaves can both reference the same
/// cluster without a second owner (spec.md §9's "self-referential
/// mutation" design note, option (b): stable indices in an arena).
#[derive(Debug, Default)]
pub struct Node {
    children: HashMap<String, Node>,
    cluster_indices: Vec<usize>,
    depth: usize,
}

impl Node {
    fn new(depth: usize) -> Self {
        Self {
            children: HashMap::new(),
            cluster_indices: Vec::new(),
            depth,
        }
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn get_child(&self, key: &str) -> Option<&Node> {
        self.children.get(key)
    }

    #[must_use]
    pub fn has_child(&self, key: &str) -> bool {
        self.children.contains_key(key)
    }

    /// Get or create the child at `key`; its depth is this node's depth + 1.
    pub fn get_or_create_child(&mut self, key: &str) -> &mut Node {
        let depth = self.depth + 1;
        self.children
            .entry(key.to_string())
            .or_insert_with(|| Node::new(depth))
    }

    pub fn add_cluster(&mut self, cluster_index: usize) {
        self.cluster_indices.push(cluster_index);
    }

    #[must_use]
    pub fn cluster_indices(&self) -> &[usize] {
        &self.cluster_indices
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.cluster_indices.len()
    }

    /// Find, among this leaf's clusters, the one with the highest
    /// similarity to `tokens` that strictly exceeds `threshold`. Ties
    /// break on insertion order — the clusters are scanned in the order
    /// they were added and a later equal similarity never displaces an
    /// earlier one (spec.md §4.5 step 5).
    #[must_use]
    pub fn best_match<'a>(
        &self,
        tokens: &[String],
        threshold: f64,
        arena: &'a [LogCluster],
    ) -> Option<(usize, &'a LogCluster)> {
        let mut best: Option<(usize, &LogCluster, f64)> = None;
        for &idx in &self.cluster_indices {
            let cluster = &arena[idx];
            let sim = cluster.similarity(tokens);
            if sim > threshold {
                match best {
                    Some((_, _, best_sim)) if sim <= best_sim => {}
                    _ => best = Some((idx, cluster, sim)),
                }
            }
        }
        best.map(|(idx, cluster, _)| (idx, cluster))
    }
}

/// The tree root. A thin wrapper distinguishing "the root, whose children
/// are keyed by token count" from an ordinary node — it's still a [`Node`]
/// at depth 0.
#[derive(Debug, Default)]
pub struct Tree {
    root: Node,
}

impl Tree {
    #[must_use]
    pub fn new() -> Self {
        Self { root: Node::new(0) }
    }

    #[must_use]
    pub const fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }
}
