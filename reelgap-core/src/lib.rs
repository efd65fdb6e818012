//! Availability resolution for media libraries.
//!
//! A lookup flows through [`meta::MetaParser`] (raw title to descriptor),
//! [`identifier::MediaIdentifier`] (descriptor to catalog identity), the
//! [`chain::ExistenceChain`] (local index, then live media servers) and, for
//! gap queries, the [`gap::GapAnalyzer`]. [`service::AvailabilityService`]
//! wires these together for the HTTP layer.

pub mod catalog;
pub mod chain;
pub mod error;
pub mod gap;
pub mod identifier;
pub mod meta;
pub mod servers;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::{Catalog, ProviderError, TmdbCatalog};
pub use chain::{
    ExistenceChain, ExistenceProvider, ExistenceQuery, LocalIndexProvider,
    MediaServerProvider, ProviderOutcome,
};
pub use error::{AvailabilityError, Result};
pub use gap::GapAnalyzer;
pub use identifier::MediaIdentifier;
pub use meta::{MetaParser, QueryOverrides};
pub use servers::{
    EmbyClient, MediaServerClient, ProbeError, ProbePolicy, ProbeUnavailable,
    RetryPolicy, ServerExistenceProbe, ServerFlavor,
};
pub use service::AvailabilityService;
pub use store::{ExistenceStore, InMemoryExistenceStore, IndexLookup, IndexedItem};
#[cfg(feature = "database")]
pub use store::PostgresExistenceStore;

/// Embedded schema migrations for the local index.
#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
