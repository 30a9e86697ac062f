use std::sync::atomic::{AtomicU64, Ordering};

/// Placeholder message for manual entries submitted without one.
pub const MANUAL_MESSAGE_PLACEHOLDER: &str = "Manual Entry";

/// Hash sentinel used for manually pasted diffs.
pub const MANUAL_HASH: &str = "manual";

static NEXT_COMMIT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-local identifier of a commit record. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitId(u64);

impl CommitId {
    fn next() -> Self {
        CommitId(NEXT_COMMIT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a commit record came from. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitSource {
    GitHub,
    Azure,
    Manual,
}

impl std::fmt::Display for CommitSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitSource::GitHub => write!(f, "GITHUB"),
            CommitSource::Azure => write!(f, "AZURE"),
            CommitSource::Manual => write!(f, "MANUAL"),
        }
    }
}

/// A normalized code change, regardless of provider.
///
/// Fields are private so a record cannot be altered once built; the
/// constructors below are the only way in. Not `Clone`: every record owns
/// an id no other record carries.
#[derive(Debug)]
pub struct Commit {
    id: CommitId,
    hash: String,
    message: String,
    diff: String,
    author: Option<String>,
    date: Option<String>,
    source: CommitSource,
}

impl Commit {
    /// Record fetched from GitHub. `sha` is the full SHA; only its
    /// 7-character prefix is kept.
    pub fn from_github(
        sha: &str,
        message: String,
        author: Option<String>,
        date: Option<String>,
        diff: String,
    ) -> Self {
        Self::build(CommitSource::GitHub, short_hash(sha), message, diff, author, date)
    }

    /// Record fetched from Azure DevOps. `commit_id` is the full id.
    pub fn from_azure(
        commit_id: &str,
        message: String,
        author: Option<String>,
        date: Option<String>,
        diff: String,
    ) -> Self {
        Self::build(CommitSource::Azure, short_hash(commit_id), message, diff, author, date)
    }

    /// Record pasted by the user. An empty or missing message falls back
    /// to [`MANUAL_MESSAGE_PLACEHOLDER`].
    pub fn manual(diff: String, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| MANUAL_MESSAGE_PLACEHOLDER.to_string());
        Self::build(CommitSource::Manual, MANUAL_HASH.to_string(), message, diff, None, None)
    }

    fn build(
        source: CommitSource,
        hash: String,
        message: String,
        diff: String,
        author: Option<String>,
        date: Option<String>,
    ) -> Self {
        Commit {
            id: CommitId::next(),
            hash,
            message,
            diff,
            author,
            date,
            source,
        }
    }

    pub fn id(&self) -> CommitId {
        self.id
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn diff(&self) -> &str {
        &self.diff
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn source(&self) -> CommitSource {
        self.source
    }
}

/// First 7 characters of a full commit identifier.
fn short_hash(full: &str) -> String {
    full.chars().take(7).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_commit_keeps_short_sha() {
        let commit = Commit::from_github(
            "0123456789abcdef",
            "Fix bug".to_string(),
            Some("alice".to_string()),
            Some("2024-01-01T00:00:00Z".to_string()),
            String::new(),
        );
        assert_eq!(commit.hash(), "0123456");
        assert_eq!(commit.source(), CommitSource::GitHub);
        assert_eq!(commit.author(), Some("alice"));
    }

    #[test]
    fn test_short_hash_of_short_input() {
        assert_eq!(short_hash("abc"), "abc");
    }

    #[test]
    fn test_manual_commit_defaults() {
        let commit = Commit::manual("+line".to_string(), None);
        assert_eq!(commit.hash(), MANUAL_HASH);
        assert_eq!(commit.message(), MANUAL_MESSAGE_PLACEHOLDER);
        assert!(commit.author().is_none());
        assert!(commit.date().is_none());
        assert_eq!(commit.source(), CommitSource::Manual);

        let blank = Commit::manual("+line".to_string(), Some("   ".to_string()));
        assert_eq!(blank.message(), MANUAL_MESSAGE_PLACEHOLDER);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Commit::manual(String::new(), None);
        let b = Commit::manual(String::new(), None);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_source_display() {
        assert_eq!(CommitSource::GitHub.to_string(), "GITHUB");
        assert_eq!(CommitSource::Azure.to_string(), "AZURE");
        assert_eq!(CommitSource::Manual.to_string(), "MANUAL");
    }
}
