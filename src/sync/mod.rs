pub mod adapter;
pub mod http;
pub mod merge;
pub mod remote;
pub mod state;

pub use adapter::{PullOutcome, PushOutcome, SyncAdapter, DEFAULT_REMOTE_TIMEOUT};
pub use http::{RemoteConfig, RestDocumentStore};
pub use merge::{merge, merge_with_report, MergeDecision, MergeReport};
pub use remote::{CollectionPath, DocumentPath, Fields, MemoryRemoteStore, RemoteDocumentStore};
pub use state::{SyncLedger, SyncState};
