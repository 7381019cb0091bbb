//! Typed accessors for each record family, layered on [`RecordStore`].
//!
//! [`RecordStore`]: crate::db::store::RecordStore

pub mod articles;
pub mod goals;
pub mod stats;
