//! Rule-priority index.
//!
//! The solver consults rules in a fixed order. The order is a tree of rule
//! ids built once per formal system: every rule has an optional parent and an
//! ordered list of children. The propositional system uses a plain chain:
//!
//! ```text
//! double not -> true and -> false or -> false imp -> true or -> false and -> true imp
//! ```
//!
//! ## Invariants
//!
//! - `RuleId` is an index into `names`, `children` and `paths`. Those
//!   vectors stay aligned.
//! - Rule 0 is the root; it has no parent.
//! - `paths[id]` lists the ancestors of `id` from the root down to `id`
//!   itself, which is the set of rules the solver keeps saturating while it
//!   works at `id`.

/// Rule identifier (index into the index vectors).
pub type RuleId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleIndex {
    names: Vec<&'static str>,
    children: Vec<Vec<RuleId>>,
    paths: Vec<Vec<RuleId>>,
}

impl RuleIndex {
    /// Linear priority chain in the given order.
    pub fn chain(names: &[&'static str]) -> Self {
        let parents = (0..names.len()).map(|i| i.checked_sub(1)).collect();
        Self::build(names.to_vec(), parents)
    }

    fn build(names: Vec<&'static str>, parents: Vec<Option<RuleId>>) -> Self {
        let mut children = vec![Vec::new(); names.len()];
        let mut paths: Vec<Vec<RuleId>> = Vec::with_capacity(names.len());

        for (id, parent) in parents.iter().enumerate() {
            let mut path = match parent {
                Some(p) => {
                    children[*p].push(id);
                    paths[*p].clone()
                }
                None => Vec::new(),
            };
            path.push(id);
            paths.push(path);
        }
        RuleIndex { names, children, paths }
    }

    pub fn root(&self) -> RuleId {
        0
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn id(&self, name: &str) -> Option<RuleId> {
        self.names.iter().position(|n| *n == name)
    }

    pub fn name(&self, id: RuleId) -> &'static str {
        self.names[id]
    }

    pub fn children(&self, id: RuleId) -> &[RuleId] {
        &self.children[id]
    }

    /// Ancestors of `id` from the root, `id` included.
    pub fn path(&self, id: RuleId) -> &[RuleId] {
        &self.paths[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_links_each_rule_to_the_next() {
        let index = RuleIndex::chain(&["a", "b", "c"]);
        assert_eq!(index.root(), 0);
        assert_eq!(index.children(0), &[1]);
        assert_eq!(index.children(2), &[] as &[RuleId]);
        assert_eq!(index.path(2), &[0, 1, 2]);
        assert_eq!(index.id("c"), Some(2));
        assert_eq!(index.name(1), "b");
    }
}
