use super::{StoreError, StoredTree, TreeStore};

/// In-memory tree store.
#[derive(Debug, Clone, Default)]
pub struct MemTreeStore {
    trees: Vec<StoredTree>,
}

impl MemTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored trees, borrowed.
    pub fn trees(&self) -> &[StoredTree] {
        &self.trees
    }
}

impl TreeStore for MemTreeStore {
    fn append(&mut self, tree: StoredTree) -> Result<(), StoreError> {
        self.trees.push(tree);
        Ok(())
    }

    fn list(&self) -> Result<Vec<StoredTree>, StoreError> {
        Ok(self.trees.clone())
    }

    fn size(&self) -> usize {
        self.trees.len()
    }
}
