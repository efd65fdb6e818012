//! Configuration models and loading for Reelgap.
//!
//! Values come from an optional TOML file (`reelgap.toml`) and the process
//! environment (optionally seeded from `.env`). Environment values override
//! file values.

pub mod loader;
pub mod models;
pub mod sources;
pub mod util;
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions, compose,
};
pub use models::{
    CatalogConfig, Config, ConfigMetadata, DatabaseConfig, MediaServerConfig,
    MediaServerKind, MediaServersConfig, ProbeConfig, ServerConfig,
};
pub use validation::{ConfigWarning, ConfigWarnings};
