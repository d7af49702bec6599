//! Infrastructure layer.

pub mod cache;
pub mod record_store;

pub use self::{cache::Cache, record_store::RecordStore};
#[cfg(feature = "rest")]
pub use self::record_store::{rest, Rest};
