use hashbrown::HashMap;
use serde_derive::{Deserialize, Serialize};

/// Bijection between external ids and dense matrix positions, assigned in
/// order of first appearance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdIndex {
    id_to_index: HashMap<u64, usize>,
    index_to_id: Vec<u64>,
}

impl IdIndex {
    pub fn from_ids<I: IntoIterator<Item = u64>>(ids: I) -> Self {
        let mut index = IdIndex::default();
        for id in ids {
            if !index.id_to_index.contains_key(&id) {
                index.id_to_index.insert(id, index.index_to_id.len());
                index.index_to_id.push(id);
            }
        }
        index
    }

    pub fn index_of(&self, id: u64) -> Option<usize> {
        self.id_to_index.get(&id).copied()
    }

    pub fn id_at(&self, index: usize) -> Option<u64> {
        self.index_to_id.get(index).copied()
    }

    pub fn ids(&self) -> &[u64] {
        &self.index_to_id
    }

    pub fn len(&self) -> usize {
        self.index_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_id.is_empty()
    }

    /// Forward and inverse maps agree.
    pub fn is_consistent(&self) -> bool {
        self.id_to_index.len() == self.index_to_id.len()
            && self
                .index_to_id
                .iter()
                .enumerate()
                .all(|(position, id)| self.id_to_index.get(id) == Some(&position))
    }
}
