//! Honours SIGINT/SIGTERM by cancelling a [`Context`] (§4.11, §5).

use wessley_core::Context;

/// Spawns a task that cancels `ctx` on SIGINT (any platform) or SIGTERM
/// (Unix). The running supervisor's scan loop observes the cancellation and
/// exits within one tick.
pub fn install_shutdown_handler(ctx: Context) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        ctx.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
