//! Frame server
//!
//! The consumer side of the network frame handoff. A named thread waits for
//! publish notifications and copies every viewport's ready frame out of the
//! exchange, one viewport lock at a time, into owned `ClientFrame`s.
//!
//! Encoding frames for the wire happens downstream of the output channel.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, select, Receiver, Sender};

use crate::graphics::geometry::Vector;
use crate::graphics::network::NetworkFrameExchange;
use crate::graphics::surface::Surface;
use crate::graphics::viewport::MAX_SCREENS;

/// Errors from the frame server
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to spawn frame server thread: {0}")]
    SpawnFailed(String),

    #[error("Frame server thread panicked")]
    JoinFailed,

    #[error("Viewport count {0} is out of range")]
    InvalidViewportCount(usize),
}

/// One viewport of one published frame, ready to send to a client
#[derive(Debug, Clone)]
pub struct ClientFrame {
    pub viewport: usize,
    pub frame_number: u64,
    pub scene: Surface,
    pub gui: Surface,
    pub target_pos: Vector,
    pub layer_offsets: Vec<Vector>,
}

/// What the server did before it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerStats {
    /// Publish notifications acted on
    pub frames_served: u64,
    /// Notifications skipped because a newer one was already queued
    pub frames_skipped: u64,
    /// Client frames handed to the output channel
    pub snapshots_sent: u64,
}

/// Handle to the running frame server thread
pub struct FrameServer {
    handle: Option<JoinHandle<ServerStats>>,
    stop: Sender<()>,
}

impl FrameServer {
    /// Start serving `viewports` viewports of `exchange`
    ///
    /// The thread runs until `shutdown`, until the publisher drops its end
    /// of `notifications`, or until nobody listens on `output` any more.
    pub fn spawn(
        exchange: Arc<NetworkFrameExchange>,
        notifications: Receiver<u64>,
        viewports: usize,
        output: Sender<ClientFrame>,
    ) -> Result<Self, ServerError> {
        if viewports == 0 || viewports > MAX_SCREENS {
            return Err(ServerError::InvalidViewportCount(viewports));
        }
        let (stop, stop_rx) = bounded(1);

        let handle = thread::Builder::new()
            .name("frame-server".to_string())
            .spawn(move || serve(&exchange, &notifications, &stop_rx, viewports, &output))
            .map_err(|e| ServerError::SpawnFailed(e.to_string()))?;

        log::info!("Frame server started for {} viewport(s)", viewports);
        Ok(Self {
            handle: Some(handle),
            stop,
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the thread and wait for it
    pub fn shutdown(mut self) -> Result<ServerStats, ServerError> {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> Result<ServerStats, ServerError> {
        let Some(handle) = self.handle.take() else {
            return Ok(ServerStats::default());
        };
        // Already stopped on its own if the send fails
        let _ = self.stop.try_send(());
        let stats = handle.join().map_err(|_| ServerError::JoinFailed)?;
        log::info!(
            "Frame server stopped after {} frame(s), {} skipped",
            stats.frames_served,
            stats.frames_skipped
        );
        Ok(stats)
    }
}

impl Drop for FrameServer {
    fn drop(&mut self) {
        if let Err(e) = self.stop_and_join() {
            log::error!("{}", e);
        }
    }
}

fn serve(
    exchange: &NetworkFrameExchange,
    notifications: &Receiver<u64>,
    stop: &Receiver<()>,
    viewports: usize,
    output: &Sender<ClientFrame>,
) -> ServerStats {
    let mut stats = ServerStats::default();
    loop {
        let published = select! {
            recv(stop) -> _ => break,
            recv(notifications) -> msg => match msg {
                Ok(n) => n,
                Err(_) => break,
            },
        };

        // Only the newest publish matters once we fall behind
        let backlog = notifications.try_iter().count() as u64;
        stats.frames_skipped += backlog;
        stats.frames_served += 1;
        log::debug!("Serving frame {} ({} skipped)", published, backlog);

        for viewport in 0..viewports {
            let Some(frame) = exchange.snapshot(viewport) else {
                continue;
            };
            let client = ClientFrame {
                viewport,
                frame_number: frame.frame_number,
                scene: frame.scene,
                gui: frame.gui,
                target_pos: frame.target_pos,
                layer_offsets: frame.layer_offsets,
            };
            if output.send(client).is_err() {
                log::debug!("Frame server output closed");
                return stats;
            }
            stats.snapshots_sent += 1;
        }
    }
    stats
}
