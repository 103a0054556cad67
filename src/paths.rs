use std::collections::{BTreeSet, HashMap};

use crate::side::{NodeId, Traversal};

/// A named walk through the graph: an ordered sequence of oriented node
/// visits. Paths are purely logical and may visit a node several times, in
/// either orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub name: String,
    pub steps: Vec<Traversal>,
}

impl Path {
    pub fn new(name: impl Into<String>) -> Self {
        Path { name: name.into(), steps: Vec::new() }
    }

    pub fn add_step(&mut self, step: Traversal) {
        self.steps.push(step);
    }

    /// Whether any step visits the given node, in either orientation.
    pub fn visits(&self, node: NodeId) -> bool {
        self.steps.iter().any(|s| s.node == node)
    }
}

/// Owns the named paths of a graph and keeps them in sync with structural
/// mutations (node division, merging, renumbering, destruction).
#[derive(Debug, Clone, Default)]
pub struct PathStore {
    paths: Vec<Path>,
}

impl PathStore {
    pub fn new() -> Self {
        PathStore { paths: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.paths.iter().map(|p| p.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.paths.iter().find(|p| p.name == name)
    }

    pub fn has_path(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Create an empty path, replacing any existing path of the same name.
    pub fn create(&mut self, name: impl Into<String>) -> &mut Path {
        let name = name.into();
        if let Some(i) = self.paths.iter().position(|p| p.name == name) {
            self.paths[i].steps.clear();
            return &mut self.paths[i];
        }
        self.paths.push(Path::new(name));
        self.paths.last_mut().unwrap()
    }

    /// Append a step to a path, creating the path if needed.
    pub fn append_step(&mut self, name: &str, step: Traversal) {
        if let Some(i) = self.paths.iter().position(|p| p.name == name) {
            self.paths[i].steps.push(step);
        } else {
            let mut p = Path::new(name);
            p.steps.push(step);
            self.paths.push(p);
        }
    }

    pub fn insert(&mut self, path: Path) {
        if let Some(i) = self.paths.iter().position(|p| p.name == path.name) {
            self.paths[i] = path;
        } else {
            self.paths.push(path);
        }
    }

    /// Drop every step that visits the given node.
    pub fn remove_node_steps(&mut self, node: NodeId) {
        for path in &mut self.paths {
            path.steps.retain(|s| s.node != node);
        }
    }

    /// Remove whole paths that visit the given node.
    pub fn remove_paths_containing(&mut self, node: NodeId) -> Vec<String> {
        let mut removed = Vec::new();
        self.paths.retain(|p| {
            if p.visits(node) {
                removed.push(p.name.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Rewrite visits of a divided node: a forward visit becomes
    /// `left+, right+`, a backward visit becomes `right-, left-`.
    pub fn replace_node_with_pair(&mut self, old: NodeId, left: NodeId, right: NodeId) {
        for path in &mut self.paths {
            let mut steps = Vec::with_capacity(path.steps.len());
            for &s in &path.steps {
                if s.node == old {
                    if s.backward {
                        steps.push(Traversal::reverse(right));
                        steps.push(Traversal::reverse(left));
                    } else {
                        steps.push(Traversal::forward(left));
                        steps.push(Traversal::forward(right));
                    }
                } else {
                    steps.push(s);
                }
            }
            path.steps = steps;
        }
    }

    /// Replace every complete run of `chain` with `merged`, and every run of
    /// the flipped, reversed chain with `merged.flip()`.
    pub fn replace_run(&mut self, chain: &[Traversal], merged: Traversal) {
        if chain.is_empty() {
            return;
        }
        let rev: Vec<Traversal> = chain.iter().rev().map(|t| t.flip()).collect();
        for path in &mut self.paths {
            let mut steps = Vec::with_capacity(path.steps.len());
            let mut i = 0;
            while i < path.steps.len() {
                if path.steps[i..].starts_with(chain) {
                    steps.push(merged);
                    i += chain.len();
                } else if path.steps[i..].starts_with(&rev) {
                    steps.push(merged.flip());
                    i += rev.len();
                } else {
                    steps.push(path.steps[i]);
                    i += 1;
                }
            }
            path.steps = steps;
        }
    }

    /// Replace every occurrence of one step with another.
    pub fn replace_step(&mut self, old: Traversal, new: Traversal) {
        for path in &mut self.paths {
            for step in &mut path.steps {
                if *step == old {
                    *step = new;
                }
            }
        }
    }

    /// Apply a node id translation to every step. Ids absent from the map
    /// are left alone.
    pub fn translate_ids(&mut self, mapping: &HashMap<NodeId, NodeId>) {
        for path in &mut self.paths {
            for step in &mut path.steps {
                if let Some(&new_id) = mapping.get(&step.node) {
                    step.node = new_id;
                }
            }
        }
    }

    /// Flip the orientation of every visit of a node whose forward sequence
    /// was reverse-complemented, preserving the path's sequence.
    pub fn flip_node_orientation(&mut self, node: NodeId) {
        for path in &mut self.paths {
            for step in &mut path.steps {
                if step.node == node {
                    *step = step.flip();
                }
            }
        }
    }

    /// Keep only the named paths; returns the names actually found.
    pub fn keep_only(&mut self, names: &BTreeSet<String>) -> BTreeSet<String> {
        let mut kept = BTreeSet::new();
        self.paths.retain(|p| {
            if names.contains(&p.name) {
                kept.insert(p.name.clone());
                true
            } else {
                false
            }
        });
        kept
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Every step must reference an existing node; returns offending
    /// (path name, node) pairs.
    pub fn invalid_steps(&self, node_exists: impl Fn(NodeId) -> bool) -> Vec<(String, NodeId)> {
        let mut bad = Vec::new();
        for path in &self.paths {
            for step in &path.steps {
                if !node_exists(step.node) {
                    bad.push((path.name.clone(), step.node));
                }
            }
        }
        bad
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(name: &str, steps: &[(NodeId, bool)]) -> PathStore {
        let mut store = PathStore::new();
        for &(id, backward) in steps {
            store.append_step(name, Traversal::new(id, backward));
        }
        store
    }

    #[test]
    fn test_replace_node_with_pair_forward_and_backward() {
        let mut store = store_with("p", &[(1, false), (2, true), (1, true)]);
        store.replace_node_with_pair(1, 10, 11);
        let steps = &store.get("p").unwrap().steps;
        assert_eq!(
            steps,
            &vec![
                Traversal::forward(10),
                Traversal::forward(11),
                Traversal::reverse(2),
                Traversal::reverse(11),
                Traversal::reverse(10),
            ]
        );
    }

    #[test]
    fn test_replace_run_both_orientations() {
        let chain = vec![Traversal::forward(1), Traversal::forward(2)];
        let mut store = store_with("p", &[(1, false), (2, false), (3, false)]);
        store.append_step("q", Traversal::reverse(2));
        store.append_step("q", Traversal::reverse(1));
        store.replace_run(&chain, Traversal::forward(9));
        assert_eq!(
            store.get("p").unwrap().steps,
            vec![Traversal::forward(9), Traversal::forward(3)]
        );
        assert_eq!(store.get("q").unwrap().steps, vec![Traversal::reverse(9)]);
    }

    #[test]
    fn test_remove_paths_containing() {
        let mut store = store_with("p", &[(1, false), (2, false)]);
        store.append_step("q", Traversal::forward(3));
        let removed = store.remove_paths_containing(2);
        assert_eq!(removed, vec!["p".to_string()]);
        assert!(store.has_path("q"));
    }

    #[test]
    fn test_translate_ids() {
        let mut store = store_with("p", &[(1, false), (2, true)]);
        let mapping: HashMap<NodeId, NodeId> = [(1, 5), (2, 6)].into_iter().collect();
        store.translate_ids(&mapping);
        assert_eq!(
            store.get("p").unwrap().steps,
            vec![Traversal::forward(5), Traversal::reverse(6)]
        );
    }
}
