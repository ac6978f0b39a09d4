//! Shared plumbing used by every `local-chat` crate.
//!
//! - [`env`]: environment lookups with typed parsing and [`ConfigError`]
//! - [`cancel`]: racing futures against a [`CancellationToken`]
//! - [`error_class`]: the error taxonomy surfaced to users
//! - [`http`]: URL joining and body snippets for error messages
//! - [`ids`]: chunk identifiers for vector-store records

pub mod cancel;
pub mod env;
pub mod error_class;
pub mod http;
pub mod ids;

pub use cancel::cancellable;
pub use env::{ConfigError, EnvReader};
pub use error_class::ErrorClass;
pub use tokio_util::sync::CancellationToken;
