//! Error taxonomy shared by all crates.
//!
//! Each crate keeps its own `thiserror` enum; `class()` on those enums maps
//! every variant onto one of these buckets so the orchestrator can react
//! uniformly (e.g. exit code 130 for [`ErrorClass::Cancelled`]).

use std::fmt;

/// Coarse category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Transport failure reaching a local server.
    Connection,
    /// Server answered with a non-2xx status.
    Remote,
    /// Success status but the expected payload field is missing or empty.
    EmptyResult,
    /// A required local file (model, PDF) does not exist.
    NotFound,
    /// Input yielded no usable text.
    NoContent,
    /// User- or timeout-initiated abort.
    Cancelled,
    /// Invalid configuration.
    Config,
    /// Anything else (I/O, decoding, device errors).
    Other,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorClass::Connection => "connection",
            ErrorClass::Remote => "remote",
            ErrorClass::EmptyResult => "empty-result",
            ErrorClass::NotFound => "not-found",
            ErrorClass::NoContent => "no-content",
            ErrorClass::Cancelled => "cancelled",
            ErrorClass::Config => "config",
            ErrorClass::Other => "other",
        };
        f.write_str(s)
    }
}
