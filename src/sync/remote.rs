//! Remote document store contract and an in-process implementation.
//!
//! Documents are addressed as `{collection}/{owner}/{subcollection}/{documentId}`,
//! e.g. `goals/{userId}/daily/{date}`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::db::helpers::format_date;
use crate::error::RemoteSyncFailure;

pub type Fields = Map<String, Value>;

const GOALS_COLLECTION: &str = "goals";
const DAILY_SUBCOLLECTION: &str = "daily";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    pub collection: String,
    pub owner: String,
    pub subcollection: String,
}

impl CollectionPath {
    pub fn daily_goals(user_id: &str) -> Self {
        Self {
            collection: GOALS_COLLECTION.to_string(),
            owner: user_id.to_string(),
            subcollection: DAILY_SUBCOLLECTION.to_string(),
        }
    }

    pub fn document(&self, document_id: impl Into<String>) -> DocumentPath {
        DocumentPath {
            parent: self.clone(),
            document_id: document_id.into(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.collection, self.owner, self.subcollection)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    pub parent: CollectionPath,
    pub document_id: String,
}

impl DocumentPath {
    /// `goals/{userId}/daily/{YYYY-MM-DD}`
    pub fn daily_goal(user_id: &str, date: NaiveDate) -> Self {
        CollectionPath::daily_goals(user_id).document(format_date(date))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.parent, self.document_id)
    }
}

/// The remote authoritative store. Implementations must not retry on
/// their own; callers bound every call with a timeout.
#[async_trait]
pub trait RemoteDocumentStore: Send + Sync {
    /// Create the document or shallow-merge `fields` into it.
    async fn upsert_merge(&self, path: &DocumentPath, fields: Fields)
        -> Result<(), RemoteSyncFailure>;

    /// Every document directly under `collection`.
    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Value>, RemoteSyncFailure>;
}

/// In-process document store with switchable availability and latency,
/// used by tests and the local-only CLI mode.
#[derive(Default)]
pub struct MemoryRemoteStore {
    documents: Mutex<BTreeMap<String, Value>>,
    offline: AtomicBool,
    latency_ms: AtomicU64,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Store a document exactly as given, bypassing field merge.
    pub fn put_raw(&self, path: &DocumentPath, document: Value) {
        if let Ok(mut documents) = self.documents.lock() {
            documents.insert(path.to_string(), document);
        }
    }

    pub fn document(&self, path: &DocumentPath) -> Option<Value> {
        self.documents
            .lock()
            .ok()
            .and_then(|documents| documents.get(&path.to_string()).cloned())
    }

    pub fn len(&self) -> usize {
        self.documents.lock().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn simulate_network(&self) -> Result<(), RemoteSyncFailure> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteSyncFailure::Unavailable("network unreachable".into()));
        }
        Ok(())
    }
}

fn poisoned() -> RemoteSyncFailure {
    RemoteSyncFailure::Unavailable("memory remote store lock poisoned".into())
}

#[async_trait]
impl RemoteDocumentStore for MemoryRemoteStore {
    async fn upsert_merge(
        &self,
        path: &DocumentPath,
        fields: Fields,
    ) -> Result<(), RemoteSyncFailure> {
        self.simulate_network().await?;
        let mut documents = self.documents.lock().map_err(|_| poisoned())?;
        let entry = documents
            .entry(path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(existing) => {
                for (name, value) in fields {
                    if value.is_null() {
                        existing.remove(&name);
                    } else {
                        existing.insert(name, value);
                    }
                }
            }
            other => {
                let mut fresh = fields;
                fresh.retain(|_, value| !value.is_null());
                *other = Value::Object(fresh);
            }
        }
        Ok(())
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Value>, RemoteSyncFailure> {
        self.simulate_network().await?;
        let prefix = format!("{collection}/");
        let documents = self.documents.lock().map_err(|_| poisoned())?;
        Ok(documents
            .iter()
            .filter(|(path, _)| {
                path.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
            })
            .map(|(_, document)| document.clone())
            .collect())
    }
}
