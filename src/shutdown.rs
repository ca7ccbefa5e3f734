//! Binds process signals to the shared cancellation token.

use tokio::{signal, task::JoinHandle};
use tokio_util::sync::CancellationToken;

/// Spawns a task that cancels `token` when SIGINT (Ctrl+C) or SIGTERM is
/// received.
///
/// The token fans out to every dispatch loop and generator; cancelling it
/// starts a graceful shutdown.
pub fn trigger_on_signal(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to register SIGTERM handler")
                .recv()
                .await;
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("SIGINT (Ctrl+C) received, initiating graceful shutdown."),
            _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown."),
        }

        token.cancel();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_cancellation_is_observable_by_clones() {
        let token = CancellationToken::new();
        let observer = token.clone();

        token.cancel();
        observer.cancelled().await;
        assert!(observer.is_cancelled());
    }
}
