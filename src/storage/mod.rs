pub mod config;
pub mod identifiers;

pub use config::{Config, ConfigError};
pub use identifiers::{IdentifierStore, StoreError};
