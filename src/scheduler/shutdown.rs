use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Detects signals sent to the process. `stop` terminates the service with SIGTERM on unix, so it
/// is handled next to Ctrl-C.
///
/// On Windows detached processes can't detect signals sent to them, so there the service is simply
/// killed and relies on settings being persisted while it runs.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(terminate) => terminate,
            Err(e) => {
                error!("Failed to listen for SIGTERM {e:?}");
                wait_for_ctrl_c().await;
                cancelation.cancel();
                return;
            }
        };

        select! {
            _ = wait_for_ctrl_c() => (),
            _ = terminate.recv() => info!("Received SIGTERM"),
            _ = cancelation.cancelled() => (),
        };
    }

    #[cfg(not(unix))]
    {
        select! {
            _ = wait_for_ctrl_c() => (),
            _ = cancelation.cancelled() => (),
        };
    }

    cancelation.cancel();
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C"),
        Err(e) => {
            error!("Failed to listen for Ctrl-C {e:?}");
            std::future::pending::<()>().await
        }
    }
}
