//! Cooperative cancellation for a single await point.

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Runs `fut` until it completes or `token` is cancelled.
///
/// Returns `None` when the token fires first; the future is dropped at that
/// point, which aborts any in-flight HTTP read it owns. A token that is
/// already cancelled short-circuits without polling `fut`.
pub async fn cancellable<F>(token: &CancellationToken, fut: F) -> Option<F::Output>
where
    F: Future,
{
    if token.is_cancelled() {
        return None;
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        out = fut => Some(out),
    }
}
