//! Isolated worker context.
//!
//! The worker owns a [`Dispatcher`] and runs on a dedicated blocking thread
//! fed by a bounded request queue. It emits `ready` once, then processes
//! requests strictly one at a time in arrival order. A running computation
//! cannot be interrupted; a host that gives up on one abandons the context
//! with [`WorkerHandle::terminate`] or [`WorkerHandle::restart`].

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use telemetry_core::{Error, Result};

use crate::config::WorkerConfig;
use crate::dispatch::Dispatcher;
use crate::message::{InboundMessage, OutboundMessage, Request};

/// Lifecycle of the worker context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Starting,
    /// Waiting for a request
    Idle,
    /// Running a request to completion
    Processing,
    Stopped,
}

pub struct TelemetryWorker {
    dispatcher: Dispatcher,
    requests: mpsc::Receiver<InboundMessage>,
    responses: mpsc::Sender<OutboundMessage>,
    state: watch::Sender<WorkerState>,
}

impl TelemetryWorker {
    /// Start a worker context. Must be called from within a Tokio runtime.
    pub fn spawn(config: WorkerConfig) -> Result<WorkerHandle> {
        config.validate()?;

        let (request_tx, request_rx) = mpsc::channel(config.queue.request_capacity);
        let (response_tx, response_rx) = mpsc::channel(config.queue.response_capacity);
        let (state_tx, state_rx) = watch::channel(WorkerState::Starting);

        let worker = TelemetryWorker {
            dispatcher: Dispatcher::new(&config),
            requests: request_rx,
            responses: response_tx,
            state: state_tx,
        };

        let task = tokio::task::spawn_blocking(move || worker.run());

        Ok(WorkerHandle {
            requests: request_tx,
            responses: response_rx,
            state: state_rx,
            task,
            config,
        })
    }

    fn run(mut self) {
        self.state.send_replace(WorkerState::Idle);
        if self.responses.blocking_send(OutboundMessage::ready()).is_err() {
            self.state.send_replace(WorkerState::Stopped);
            return;
        }
        info!("telemetry worker ready");

        while let Some(message) = self.requests.blocking_recv() {
            self.state.send_replace(WorkerState::Processing);
            let response = self.dispatcher.handle(message);

            if self
                .responses
                .blocking_send(OutboundMessage::Response(response))
                .is_err()
            {
                debug!("response receiver dropped");
                break;
            }
            self.state.send_replace(WorkerState::Idle);
        }

        self.state.send_replace(WorkerState::Stopped);
        info!("telemetry worker stopped");
    }
}

/// Host side of a worker context
pub struct WorkerHandle {
    requests: mpsc::Sender<InboundMessage>,
    responses: mpsc::Receiver<OutboundMessage>,
    state: watch::Receiver<WorkerState>,
    task: JoinHandle<()>,
    config: WorkerConfig,
}

impl WorkerHandle {
    /// Queue an envelope; waits while the request queue is full
    pub async fn send(&self, message: InboundMessage) -> Result<()> {
        self.requests
            .send(message)
            .await
            .map_err(|_| Error::WorkerClosed)
    }

    /// Queue a typed request under the given correlation id
    pub async fn submit(&self, request: Request, id: impl Into<String>) -> Result<()> {
        self.send(request.into_message(id)?).await
    }

    /// Queue a JSON envelope
    pub async fn send_json(&self, text: &str) -> Result<()> {
        self.send(InboundMessage::from_json(text)?).await
    }

    /// Next outbound message; `None` once the context has stopped
    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        self.responses.recv().await
    }

    /// Wait for the startup signal
    pub async fn wait_ready(&mut self) -> Result<()> {
        match self.recv().await {
            Some(OutboundMessage::Ready(_)) => Ok(()),
            Some(OutboundMessage::Response(response)) => Err(Error::InvalidInput(format!(
                "expected ready signal, got response '{}'",
                response.id
            ))),
            None => Err(Error::WorkerClosed),
        }
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Close the queue and wait for the in-flight request to finish.
    ///
    /// Queued requests whose responses can no longer be delivered are
    /// dropped.
    pub async fn shutdown(self) {
        let WorkerHandle {
            requests,
            responses,
            task,
            ..
        } = self;
        drop(requests);
        drop(responses);

        if let Err(e) = task.await {
            warn!(error = %e, "worker context ended abnormally");
        }
    }

    /// Abandon the context without waiting for the in-flight request
    pub fn terminate(self) {
        info!("terminating telemetry worker");
        // The blocking thread exits after its current request
        drop(self);
    }

    /// Abandon this context and start a fresh one with the same configuration
    pub fn restart(self) -> Result<WorkerHandle> {
        let config = self.config.clone();
        self.terminate();
        TelemetryWorker::spawn(config)
    }
}
