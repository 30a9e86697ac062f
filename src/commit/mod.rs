pub mod types;

pub use types::{Commit, CommitId, CommitSource};

use tracing::debug;

/// Ordered, session-scoped collection of commits.
///
/// Insertion order is the order commits appear in the generated prompt.
/// There is no dedup: the same change added twice shows up twice.
#[derive(Debug, Default)]
pub struct CommitStore {
    commits: Vec<Commit>,
}

impl CommitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commit to the end of the collection.
    pub fn add(&mut self, commit: Commit) {
        debug!(id = %commit.id(), hash = %commit.hash(), source = %commit.source(), "adding commit");
        self.commits.push(commit);
    }

    /// Remove the commit with the given id. Unknown ids are a no-op.
    /// Returns the removed commit, if any.
    pub fn remove(&mut self, id: CommitId) -> Option<Commit> {
        let index = self.commits.iter().position(|c| c.id() == id)?;
        debug!(id = %id, "removing commit");
        Some(self.commits.remove(index))
    }

    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual(msg: &str) -> Commit {
        Commit::manual(format!("+{}", msg), Some(msg.to_string()))
    }

    #[test]
    fn test_add_preserves_order() {
        let mut store = CommitStore::new();
        store.add(manual("first"));
        store.add(manual("second"));
        store.add(manual("third"));
        let messages: Vec<&str> = store.commits().iter().map(|c| c.message()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_remove_keeps_relative_order() {
        let mut store = CommitStore::new();
        store.add(manual("a"));
        store.add(manual("b"));
        store.add(manual("c"));
        store.add(manual("d"));
        let id = store.commits()[1].id();

        let removed = store.remove(id).unwrap();
        assert_eq!(removed.message(), "b");
        assert_eq!(store.len(), 3);
        let messages: Vec<&str> = store.commits().iter().map(|c| c.message()).collect();
        assert_eq!(messages, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut store = CommitStore::new();
        store.add(manual("a"));
        let stranger = manual("not stored");

        assert!(store.remove(stranger.id()).is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.commits()[0].message(), "a");
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut store = CommitStore::new();
        store.add(manual("same"));
        store.add(manual("same"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.commits()[0].hash(), store.commits()[1].hash());
        assert_ne!(store.commits()[0].id(), store.commits()[1].id());

        let id = store.commits()[0].id();
        store.remove(id).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.commits().iter().all(|c| c.id() != id));
        assert!(store.remove(id).is_none());
    }

    #[test]
    fn test_empty_store() {
        let store = CommitStore::new();
        assert!(store.is_empty());
        assert!(store.commits().is_empty());
    }
}
