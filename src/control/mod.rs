// src/control/mod.rs
// =============================================================================
// Runtime control of a running crawl.
//
// The outside world can ask for exactly two things:
// - Terminate:   stop the crawl gracefully (cancel the shared token)
// - ExtendDepth: hand the crawler `extend_by` more levels of depth
//
// The ControlLoop turns those events into actions. It also owns the optional
// runtime limit, and it exits as soon as the crawl is cancelled, whoever
// cancelled it.
//
// Where the events come from is not this module's business; see signals.rs
// for the OS signal translation the binary uses.
// =============================================================================

mod signals;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::crawl::DepthControl;

pub use signals::spawn_signal_listener;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Terminate,
    ExtendDepth,
}

pub struct ControlLoop {
    cancel: CancellationToken,
    depth: DepthControl,
    extend_by: u32,
    max_runtime: Option<Duration>,
}

impl ControlLoop {
    pub fn new(
        cancel: CancellationToken,
        depth: DepthControl,
        extend_by: u32,
        max_runtime: Option<Duration>,
    ) -> Self {
        Self {
            cancel,
            depth,
            extend_by,
            max_runtime,
        }
    }

    pub async fn run(self, mut events: mpsc::Receiver<ControlEvent>) {
        let deadline = async {
            match self.max_runtime {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        // Once every event sender is gone only cancellation or the deadline remain
        let mut events_open = true;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("control loop exiting, crawl cancelled");
                    return;
                }
                _ = &mut deadline => {
                    info!("maximum runtime reached, stopping crawl");
                    self.cancel.cancel();
                    return;
                }
                event = events.recv(), if events_open => match event {
                    Some(ControlEvent::Terminate) => {
                        info!("interrupt received, stopping crawl");
                        self.cancel.cancel();
                        return;
                    }
                    Some(ControlEvent::ExtendDepth) => {
                        if self.depth.extend(self.extend_by) {
                            info!("extending crawl depth by {}", self.extend_by);
                        } else {
                            warn!("depth extension ignored, crawler already finished");
                        }
                    }
                    None => events_open = false,
                },
            }
        }
    }
}
