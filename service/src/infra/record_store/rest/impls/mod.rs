//! [`RecordStore`] implementations of [`Rest`].
//!
//! [`Rest`]: super::Rest
//! [`RecordStore`]: crate::infra::RecordStore

mod opportunity;
mod product;
