//! Application core shared by every front end.
//!
//! [`Assistant`] owns the service clients, the busy flag and the token of the
//! operation in flight. Front ends only feed it prompts, render what comes
//! back and call [`Assistant::cancel_active`] when the user aborts.

pub mod assistant;
pub mod busy;
pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod routing;

pub use assistant::{AskOutcome, Assistant, DictationOutcome, StreamStats};
pub use config::AppConfig;
pub use error_handler::AppError;
pub use health_service::{HealthService, HealthStatus};
pub use routing::should_generate_image;

pub use rag_store::IngestionResult;
