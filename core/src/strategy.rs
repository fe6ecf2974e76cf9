use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

use crate::corpus::QuestionRecord;
use crate::index::{self, IndexSnapshot};
use crate::search::{self, SearchResult};

/// Errors a strategy can surface to the service boundary. Input anomalies
/// (empty or unmatched queries) are empty result lists, never errors.
#[derive(Debug, Error)]
pub enum SearchError {
    /// One-time backend initialization has not completed yet.
    #[error("search backend is not ready")]
    NotReady,
    /// The backing store failed; maps to a service-unavailable response.
    #[error("search backend unavailable: {0}")]
    Backend(String),
}

/// The query contract every backend implements interchangeably.
pub trait SearchStrategy: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn describe(&self) -> &'static str;
    fn search(
        &self,
        query: &str,
        top_n: usize,
        questions_only: bool,
    ) -> Result<Vec<SearchResult>, SearchError>;
}

/// In-memory TF-IDF strategy. One immutable snapshot serves all queries
/// without locks; `swap` installs a rebuilt snapshot atomically, and
/// in-flight queries keep the snapshot they started with.
pub struct MemorySearch {
    snapshot: RwLock<Arc<IndexSnapshot>>,
}

impl MemorySearch {
    pub fn new(snapshot: IndexSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn from_records(records: Vec<QuestionRecord>) -> anyhow::Result<Self> {
        Ok(Self::new(index::build(records)?))
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    pub fn swap(&self, snapshot: IndexSnapshot) {
        *self.snapshot.write() = Arc::new(snapshot);
    }
}

impl SearchStrategy for MemorySearch {
    fn id(&self) -> &'static str {
        "memory"
    }

    fn name(&self) -> &'static str {
        "In-Memory Index"
    }

    fn describe(&self) -> &'static str {
        "Fast TF-IDF based search"
    }

    fn search(
        &self,
        query: &str,
        top_n: usize,
        questions_only: bool,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let snapshot = self.snapshot();
        Ok(search::search(&snapshot, query, top_n, questions_only))
    }
}
