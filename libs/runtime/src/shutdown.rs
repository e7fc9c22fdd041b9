use anyhow::Result;
use tokio_util::sync::CancellationToken;

/// Resolve once the process is asked to stop (SIGINT/SIGTERM, Ctrl-C on Windows).
pub async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("shutdown: SIGTERM received"),
            _ = sigint.recv()  => tracing::info!("shutdown: SIGINT received"),
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("shutdown: Ctrl-C received");
        Ok(())
    }
}

/// Token cancelled on the first shutdown signal. Must be called inside a tokio runtime.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(()) => trigger.cancel(),
            Err(e) => tracing::error!(error = %e, "shutdown: failed to install signal handlers"),
        }
    });
    token
}
