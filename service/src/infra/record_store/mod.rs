//! [`RecordStore`]-related implementations.

#[cfg(feature = "rest")]
pub mod rest;

use derive_more::{Display, Error as StdError, From};

#[cfg(feature = "rest")]
pub use self::rest::Rest;

/// Operation upon the remote record store.
pub use common::Handler as RecordStore;

/// [`RecordStore`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Rest`] transport error.
    #[cfg(feature = "rest")]
    #[display("REST request failed: {_0}")]
    Rest(rest::Error),

    /// Record store rejected the request.
    #[display("record store responded with `{status}`: {body}")]
    #[from(ignore)]
    Rejected {
        /// HTTP status code of the response.
        status: u16,

        /// Raw response body.
        body: String,
    },

    /// Record returned by the record store cannot be represented in the
    /// domain.
    #[display("malformed record: {_0}")]
    #[from(ignore)]
    Malformed(#[error(not(source))] String),
}

impl Error {
    /// Indicates whether the failed request may succeed if simply retried.
    ///
    /// Transport failures, timeouts, throttling and server errors are
    /// retryable, while rejections and malformed records are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            #[cfg(feature = "rest")]
            Self::Rest(e) => e.is_retryable(),
            Self::Rejected { status, .. } => {
                matches!(status, 408 | 429 | 500..=599)
            }
            Self::Malformed(_) => false,
        }
    }

    /// Indicates whether the request targeted a record which doesn't exist
    /// (anymore), so the caller's view of the records is outdated.
    #[must_use]
    pub fn is_stale_reference(&self) -> bool {
        matches!(self, Self::Rejected { status: 404, .. })
    }
}
