//! keyprov CLI Library
//!
//! Shared functionality for the key provisioning command-line tool.

pub mod args;
pub mod config;
pub mod summary;

pub use args::ProvisioningArgs;
pub use config::{Config, ConfigError, HttpConfig};
pub use summary::{describe_key_source, display_key_source, format_key_id, provisioning_failed};
