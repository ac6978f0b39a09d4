use std::io::{self, IsTerminal};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Workspace crates raised to `debug` by `--verbose`.
const WORKSPACE_TARGETS: &[&str] = &[
    "local_chat",
    "orchestrator",
    "ai_llm_service",
    "image_gen_service",
    "speech_service",
    "rag_store",
    "services",
];

const DEFAULT_FILTER: &str = "warn,local_chat=info";

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        w.write_str(&now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

/// Filter from `RUST_LOG`, or [`DEFAULT_FILTER`]; `verbose` adds `debug`
/// directives for every workspace crate on top.
fn env_filter(verbose: bool) -> EnvFilter {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    if !verbose {
        return base;
    }
    WORKSPACE_TARGETS.iter().fold(base, |filter, target| {
        match format!("{target}=debug").parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    })
}

/// Installs the global subscriber.
///
/// Events go to stderr; stdout carries model output only.
pub fn init(verbose: bool) {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(ChronoRfc3339Utc)
        .with_target(verbose)
        .with_ansi(io::stderr().is_terminal())
        .compact();

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_adds_workspace_directives() {
        let rendered = env_filter(true).to_string();
        for target in WORKSPACE_TARGETS {
            assert!(rendered.contains(&format!("{target}=debug")), "{rendered}");
        }
    }
}
