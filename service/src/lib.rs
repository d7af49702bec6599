//! Service contains the opportunity pricing and pipeline logic of the CRM
//! console.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

#[cfg(test)]
use futures as _;
#[cfg(test)]
use tokio as _;

pub mod command;
pub mod controller;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;

use common::CurrencyCode;

use self::domain::opportunity::{draft, Probability};
#[cfg(doc)]
use self::infra::RecordStore;

pub use self::{
    command::Command,
    controller::{OpportunityForm, PipelineBoard},
    query::Query,
};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Currency new opportunities are priced in.
    pub default_currency: CurrencyCode,

    /// Chance of winning new opportunities.
    pub default_probability: Probability,
}

impl Config {
    /// Returns [`draft::Defaults`] new opportunity drafts are seeded with.
    #[must_use]
    pub fn draft_defaults(&self) -> draft::Defaults {
        draft::Defaults {
            currency: self.default_currency.clone(),
            probability: self.default_probability,
        }
    }
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Store> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`RecordStore`] of this [`Service`].
    record_store: Store,
}

impl<Store> Service<Store> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub fn new(config: Config, record_store: Store) -> Self {
        Self {
            config,
            record_store,
        }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`RecordStore`] of this [`Service`].
    #[must_use]
    pub fn record_store(&self) -> &Store {
        &self.record_store
    }
}
