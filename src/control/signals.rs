// src/control/signals.rs
// =============================================================================
// Translates OS signals into ControlEvents.
//
//   SIGINT  -> Terminate
//   SIGUSR1 -> ExtendDepth   (unix only)
//
// On platforms without SIGUSR1 only Ctrl-C is wired up.
// =============================================================================

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::ControlEvent;

// Starts a background task that forwards signals into `events` until the
// receiving side goes away. Fails only if the signal handlers cannot be
// installed.
#[cfg(unix)]
pub fn spawn_signal_listener(
    events: mpsc::Sender<ControlEvent>,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut user1 = signal(SignalKind::user_defined1())?;

    Ok(tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                Some(()) = interrupt.recv() => ControlEvent::Terminate,
                Some(()) = user1.recv() => ControlEvent::ExtendDepth,
                else => break,
            };
            debug!(?event, "signal received");
            if events.send(event).await.is_err() {
                break;
            }
        }
    }))
}

#[cfg(not(unix))]
pub fn spawn_signal_listener(
    events: mpsc::Sender<ControlEvent>,
) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            debug!("ctrl-c received");
            if events.send(ControlEvent::Terminate).await.is_err() {
                break;
            }
        }
    }))
}
