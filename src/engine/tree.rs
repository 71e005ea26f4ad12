//! Proof tree storage.
//!
//! Nodes live in one arena (`Vec<ProofNode>`) and point to their parent and
//! children by [`NodeId`]. Every `append` creates its nodes with a layer one
//! higher than any existing node, and nodes are only ever pushed at the end,
//! so the arena is sorted by layer:
//!
//! ```text
//! nodes: [root(0)] [p(1) ~p(1)] [q(2)] [r(3)]
//!                                      ^ prune_from(3) truncates here
//! ```
//!
//! Removing "every node whose layer is at least L" is therefore a truncation
//! plus a sweep of dangling child ids.
//!
//! A branch is identified by the [`BranchId`] of its leaf. A linear append
//! keeps the leaf's id; a fork gives every new child a fresh id from the
//! per-tree allocator. The allocator always hands out `max id + 1`, which
//! keeps ids unique among leaves and makes them reproducible on replay.

use std::fmt::Write as _;

use super::canonical::History;
use crate::{BranchId, Close, Decomposition, EngineError, Formula, HistoryOp};

pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct ProofNode {
    pub formula: Formula,
    pub branch: BranchId,
    /// Index of the rule application that created the node (root: 0).
    pub layer: usize,
    /// Position of the node on its branch (root: 0).
    pub depth: usize,
    pub history: History,
    pub closed: Option<Close>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl ProofNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ProofTree {
    nodes: Vec<ProofNode>,
    next_branch: u32,
}

impl ProofTree {
    pub fn new(root: Formula) -> Self {
        let root = ProofNode {
            formula: root,
            branch: BranchId::ROOT,
            layer: 0,
            depth: 0,
            history: History::new(),
            closed: None,
            parent: None,
            children: Vec::new(),
        };
        ProofTree { nodes: vec![root], next_branch: 1 }
    }

    pub fn root(&self) -> &ProofNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> Option<&ProofNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ProofNode)> {
        self.nodes.iter().enumerate()
    }

    pub fn last_layer(&self) -> usize {
        self.nodes.last().map_or(0, |n| n.layer)
    }

    // --- Navigation ---------------------------------------------------------

    /// Leaves from left to right.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![0];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.is_leaf() {
                leaves.push(id);
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        leaves
    }

    pub fn open_leaves(&self) -> Vec<NodeId> {
        self.leaves().into_iter().filter(|&id| self.nodes[id].closed.is_none()).collect()
    }

    /// Ids of all current branches, left to right.
    pub fn branch_ids(&self) -> Vec<BranchId> {
        self.leaves().into_iter().map(|id| self.nodes[id].branch).collect()
    }

    pub fn leaf(&self, branch: BranchId) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.branch == branch && n.is_leaf())
    }

    pub fn leaf_node(&self, branch: BranchId) -> Result<&ProofNode, EngineError> {
        self.leaf(branch).map(|id| &self.nodes[id]).ok_or(EngineError::UnknownBranch(branch))
    }

    /// Node ids from the root down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(id).map(|_| id);
        while let Some(node) = current {
            path.push(node);
            current = self.nodes[node].parent;
        }
        path.reverse();
        path
    }

    /// Formulas from the root down to `id`.
    pub fn formulas(&self, id: NodeId) -> Vec<Formula> {
        self.path(id).into_iter().map(|n| self.nodes[n].formula.clone()).collect()
    }

    pub fn branch_formulas(&self, branch: BranchId) -> Result<Vec<Formula>, EngineError> {
        let leaf = self.leaf(branch).ok_or(EngineError::UnknownBranch(branch))?;
        Ok(self.formulas(leaf))
    }

    pub fn nodes_in_layer(&self, layer: usize) -> Vec<NodeId> {
        self.nodes.iter().enumerate().filter(|(_, n)| n.layer == layer).map(|(id, _)| id).collect()
    }

    pub fn is_branch_closed(&self, branch: BranchId) -> bool {
        self.leaf(branch).is_some_and(|id| self.nodes[id].closed.is_some())
    }

    /// Every leaf is closed.
    pub fn is_closed(&self) -> bool {
        self.leaves().into_iter().all(|id| self.nodes[id].closed.is_some())
    }

    /// Every leaf is closed by a contradiction.
    pub fn is_successful(&self) -> bool {
        self.leaves().into_iter().all(|id| self.nodes[id].closed.is_some_and(|c| c.success()))
    }

    // --- Modification -------------------------------------------------------

    /// Attach a decomposition below the leaf of `branch`.
    ///
    /// `history[i]` is applied to every node of the i-th new branch. Returns
    /// the layer of the new nodes and the ids of the resulting branches.
    pub fn append(
        &mut self,
        branch: BranchId,
        decomposition: Decomposition,
        history: &[HistoryOp],
    ) -> Result<(usize, Vec<BranchId>), EngineError> {
        let leaf = self.leaf(branch).ok_or(EngineError::UnknownBranch(branch))?;
        if self.nodes[leaf].closed.is_some() {
            return Err(EngineError::BranchClosed(branch));
        }

        let branches = decomposition.into_branches();
        if branches.is_empty() || branches.iter().any(Vec::is_empty) {
            return Err(EngineError::Invariant("a rule produced an empty branch".to_string()));
        }
        if branches.len() != history.len() {
            return Err(EngineError::Invariant(format!(
                "{} branch(es) produced but {} history update(s) given",
                branches.len(),
                history.len()
            )));
        }

        let layer = self.last_layer() + 1;
        let fork = branches.len() > 1;
        let mut created = Vec::with_capacity(branches.len());

        for (formulas, op) in branches.into_iter().zip(history) {
            let id = if fork { self.allocate_branch() } else { branch };
            let mut node_history = self.nodes[leaf].history.clone();
            if let HistoryOp::Add(key) = op {
                node_history.insert(key.clone());
            }

            let mut parent = leaf;
            for formula in formulas {
                let node_id = self.nodes.len();
                let depth = self.nodes[parent].depth + 1;
                self.nodes.push(ProofNode {
                    formula,
                    branch: id,
                    layer,
                    depth,
                    history: node_history.clone(),
                    closed: None,
                    parent: Some(parent),
                    children: Vec::new(),
                });
                self.nodes[parent].children.push(node_id);
                parent = node_id;
            }
            created.push(id);
        }
        Ok((layer, created))
    }

    pub fn close(&mut self, branch: BranchId, close: Close) -> Result<(), EngineError> {
        let leaf = self.leaf(branch).ok_or(EngineError::UnknownBranch(branch))?;
        let node = &mut self.nodes[leaf];
        if node.closed.is_some() {
            return Err(EngineError::BranchClosed(branch));
        }
        node.closed = Some(close);
        Ok(())
    }

    /// Remove every node whose layer is `layer` or higher. The root stays.
    pub fn prune_from(&mut self, layer: usize) {
        let layer = layer.max(1);
        if let Some(cut) = self.nodes.iter().position(|n| n.layer >= layer) {
            self.nodes.truncate(cut);
            for node in &mut self.nodes {
                node.children.retain(|&c| c < cut);
            }
        }
        self.next_branch = self.nodes.iter().map(|n| n.branch.0).max().unwrap_or(0) + 1;
    }

    fn allocate_branch(&mut self) -> BranchId {
        let id = BranchId(self.next_branch);
        self.next_branch += 1;
        id
    }

    // --- Rendering ----------------------------------------------------------

    /// Plain-text outline of the tree, one formula per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_node(0, "", &mut out);
        out
    }

    fn render_node(&self, id: NodeId, indent: &str, out: &mut String) {
        let node = &self.nodes[id];
        let _ = write!(out, "{indent}{}", node.formula);
        if let Some(close) = node.closed {
            let _ = write!(out, "  [{} closed: {close}]", node.branch);
        } else if node.is_leaf() {
            let _ = write!(out, "  [{} open]", node.branch);
        }
        out.push('\n');

        match node.children.as_slice() {
            [] => {}
            [only] => self.render_node(*only, indent, out),
            many => {
                for (i, child) in many.iter().enumerate() {
                    let last = i + 1 == many.len();
                    let _ = writeln!(out, "{indent}{}", if last { "└─┐" } else { "├─┐" });
                    let nested = format!("{indent}{}", if last { "  " } else { "│ " });
                    self.render_node(*child, &nested, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::canonical::canonical_key;
    use crate::formula::tests::formula;

    fn forked_tree() -> ProofTree {
        let mut tree = ProofTree::new(formula("neg ( a and b )"));
        let key = canonical_key(&tree.root().formula);
        let split = Decomposition::NewBranches(vec![vec![formula("neg a")], vec![formula("neg b")]]);
        tree.append(BranchId::ROOT, split, &[HistoryOp::Add(key.clone()), HistoryOp::Add(key)]).unwrap();
        tree
    }

    #[test]
    fn fork_allocates_fresh_branch_ids() {
        let tree = forked_tree();
        assert_eq!(tree.branch_ids(), vec![BranchId(1), BranchId(2)]);
        assert!(tree.leaf(BranchId::ROOT).is_none());
        assert_eq!(tree.last_layer(), 1);
    }

    #[test]
    fn linear_append_keeps_branch_and_history() {
        let mut tree = ProofTree::new(formula("a and b"));
        let key = canonical_key(&tree.root().formula);
        let (layer, created) = tree
            .append(BranchId::ROOT, Decomposition::SameBranch(vec![formula("a"), formula("b")]), &[HistoryOp::Add(key)])
            .unwrap();
        assert_eq!((layer, created), (1, vec![BranchId::ROOT]));

        let leaf = tree.leaf_node(BranchId::ROOT).unwrap();
        assert_eq!(leaf.depth, 2);
        assert!(leaf.history.contains(&formula("( a and b )")));
        assert_eq!(tree.branch_formulas(BranchId::ROOT).unwrap().len(), 3);
    }

    #[test]
    fn closed_leaf_gains_no_children() {
        let mut tree = forked_tree();
        tree.close(BranchId(1), Close::Emptiness).unwrap();
        let err = tree.append(BranchId(1), Decomposition::SameBranch(vec![formula("c")]), &[HistoryOp::Keep]);
        assert!(matches!(err, Err(EngineError::BranchClosed(BranchId(1)))));
        assert!(matches!(tree.close(BranchId(1), Close::Emptiness), Err(EngineError::BranchClosed(_))));
    }

    #[test]
    fn prune_restores_the_leaf_and_the_allocator() {
        let mut tree = forked_tree();
        tree.append(BranchId(2), Decomposition::SameBranch(vec![formula("c")]), &[HistoryOp::Keep]).unwrap();
        assert_eq!(tree.len(), 4);

        tree.prune_from(1);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.branch_ids(), vec![BranchId::ROOT]);

        let again = Decomposition::NewBranches(vec![vec![formula("a")], vec![formula("b")]]);
        let (_, created) = tree.append(BranchId::ROOT, again, &[HistoryOp::Keep, HistoryOp::Keep]).unwrap();
        assert_eq!(created, vec![BranchId(1), BranchId(2)]);
    }

    #[test]
    fn closure_state_of_the_whole_tree() {
        let mut tree = forked_tree();
        assert!(!tree.is_closed());
        tree.close(BranchId(1), Close::Contradiction { first: 0, second: 1 }).unwrap();
        tree.close(BranchId(2), Close::Emptiness).unwrap();
        assert!(tree.is_closed());
        assert!(!tree.is_successful());
    }

    #[test]
    fn render_lists_every_branch() {
        let rendered = forked_tree().render();
        assert!(rendered.starts_with("neg (a and b)"));
        assert!(rendered.contains("[1 open]"));
        assert!(rendered.contains("[2 open]"));
    }
}
