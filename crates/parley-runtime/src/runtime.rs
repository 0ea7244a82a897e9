//! Conversation-lane scheduling around a dispatcher.
//!
//! The runtime gives every conversation its own lane: a bounded queue
//! plus one worker task that dispatches the lane's envelopes strictly in
//! arrival order. Different lanes run on independent tasks, so distinct
//! conversations are processed in parallel while no conversation ever
//! sees two of its envelopes in flight at once.
//!
//! Lanes are created lazily on the first envelope for a conversation and
//! torn down through [`ParleyRuntime::close_conversation`], which cancels
//! the in-flight dispatch and drops anything still queued. A graceful
//! [`ParleyRuntime::shutdown`] instead stops intake and drains every lane
//! to completion.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use parley_runtime::ParleyRuntime;
//!
//! let runtime = ParleyRuntime::new(dispatcher);
//! runtime.submit(envelope).await?;
//! runtime.run().await;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::signal;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use parley_core::{ConversationId, Envelope};
use parley_framework::{DispatchOutcome, Dispatcher};

use crate::config::DispatchConfig;
use crate::error::{RuntimeError, RuntimeResult};

/// One conversation's queue and worker.
struct Lane {
    queue: mpsc::Sender<Envelope>,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
}

/// Per-conversation envelope scheduler.
///
/// Cheap to share: wrap in `Arc` and submit from any task.
pub struct ParleyRuntime {
    dispatcher: Arc<Dispatcher>,
    lanes: Mutex<HashMap<ConversationId, Lane>>,
    lane_capacity: usize,
    /// Cancelling this aborts every lane, in-flight dispatch included.
    abort: CancellationToken,
    accepting: AtomicBool,
}

impl ParleyRuntime {
    /// Creates a runtime with default scheduling settings.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::with_config(dispatcher, &DispatchConfig::default())
    }

    /// Creates a runtime from dispatch configuration.
    ///
    /// Only the lane settings apply here; `max_signal_depth` is consumed
    /// when the signal bus is built.
    pub fn with_config(dispatcher: Dispatcher, config: &DispatchConfig) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            lanes: Mutex::new(HashMap::new()),
            lane_capacity: config.lane_capacity.max(1),
            abort: CancellationToken::new(),
            accepting: AtomicBool::new(true),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Number of live lanes.
    pub async fn lane_count(&self) -> usize {
        self.lanes.lock().await.len()
    }

    /// Queues an envelope on its conversation's lane.
    ///
    /// Creates the lane on first use. Applies backpressure: when the lane
    /// queue is full this waits for space rather than dropping.
    pub async fn submit(&self, envelope: Envelope) -> RuntimeResult<()> {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(RuntimeError::ShuttingDown);
        }

        let conversation = envelope.conversation().clone();
        // Clone the sender out so a full queue never blocks other lanes.
        let queue = {
            let mut lanes = self.lanes.lock().await;
            lanes
                .entry(conversation.clone())
                .or_insert_with(|| self.spawn_lane(&conversation))
                .queue
                .clone()
        };

        queue
            .send(envelope)
            .await
            .map_err(|_| RuntimeError::LaneClosed { conversation })
    }

    fn spawn_lane(&self, conversation: &ConversationId) -> Lane {
        let (queue, mut inbox) = mpsc::channel::<Envelope>(self.lane_capacity);
        let cancel = self.abort.child_token();
        let dispatcher = Arc::clone(&self.dispatcher);
        let token = cancel.clone();
        let lane_id = conversation.clone();

        debug!(conversation = %conversation, "lane opened");
        let worker = tokio::spawn(async move {
            loop {
                let envelope = tokio::select! {
                    _ = token.cancelled() => break,
                    next = inbox.recv() => match next {
                        Some(envelope) => envelope,
                        None => break,
                    },
                };

                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(conversation = %lane_id, "in-flight dispatch cancelled");
                        break;
                    }
                    outcome = dispatcher.dispatch(envelope) => {
                        if outcome == DispatchOutcome::Failed {
                            warn!(conversation = %lane_id, "dispatch failed");
                        }
                    }
                }
            }
            debug!(conversation = %lane_id, "lane closed");
        });

        Lane {
            queue,
            cancel,
            worker,
        }
    }

    /// Tears down one conversation's lane.
    ///
    /// Cancels the in-flight dispatch, drops queued envelopes, and waits
    /// for the worker to stop. A later envelope for the same conversation
    /// opens a fresh lane.
    pub async fn close_conversation(&self, conversation: &ConversationId) {
        let lane = self.lanes.lock().await.remove(conversation);
        if let Some(lane) = lane {
            lane.cancel.cancel();
            let _ = lane.worker.await;
            debug!(conversation = %conversation, "conversation closed");
        }
    }

    /// Gracefully shuts down: refuses new envelopes, drains every lane.
    pub async fn shutdown(&self) {
        if self.accepting.swap(false, Ordering::SeqCst) {
            info!("Draining lanes for shutdown");
        }

        let lanes = std::mem::take(&mut *self.lanes.lock().await);
        for (conversation, lane) in lanes {
            // Dropping the sender lets the worker finish its queue.
            drop(lane.queue);
            let _ = lane.worker.await;
            debug!(conversation = %conversation, "lane drained");
        }

        info!("Runtime stopped");
    }

    /// Aborts immediately: cancels every lane, in-flight work included.
    pub async fn abort(&self) {
        self.accepting.store(false, Ordering::SeqCst);
        self.abort.cancel();

        let lanes = std::mem::take(&mut *self.lanes.lock().await);
        for (_, lane) in lanes {
            let _ = lane.worker.await;
        }

        info!("Runtime aborted");
    }

    /// Runs until a shutdown signal arrives, then drains.
    pub async fn run(&self) {
        info!("Runtime running. Press Ctrl+C to stop.");
        wait_for_shutdown_signal().await;
        self.shutdown().await;
    }

    /// Runs until the given future resolves, then drains.
    pub async fn run_until<F>(&self, until: F)
    where
        F: std::future::Future<Output = ()>,
    {
        until.await;
        self.shutdown().await;
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let sigterm = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(error) => {
                    warn!(%error, "Failed to register SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
            _ = sigterm => info!("Received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        }
    }
}
