// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Duplex relay between a client connection and a provisioning job.
//!
//! For one authenticated session the bridge starts exactly one job and then
//! multiplexes two sources until a terminal state:
//! - job events, forwarded to the client as JSON text
//! - inbound client messages, which are only logged
//!
//! The job finishing (its event channel closing) ends the bridge in
//! [`BridgeOutcome::Completed`]. A failed send or the inbound side closing
//! ends it in [`BridgeOutcome::Disconnected`]. The job is not owned by the
//! bridge and keeps running after a disconnect unless the bridge was built
//! with `cancel_on_disconnect`.

use crate::error::AppError;
use crate::models::{Event, SetupScheme, User};
use crate::services::jobs::{JobEventSource, JobRequest};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Capacity of the channel between the inbound reader and the relay loop.
const INBOUND_BUFFER: usize = 16;

/// Terminal state of a bridge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// The job closed its event stream.
    Completed,
    /// The client went away first.
    Disconnected,
}

/// Factory for bridge sessions, shared through `AppState`.
#[derive(Clone)]
pub struct EventBridge {
    source: Arc<dyn JobEventSource>,
    setup: Arc<SetupScheme>,
    event_buffer: usize,
    cancel_on_disconnect: bool,
}

impl EventBridge {
    pub fn new(source: Arc<dyn JobEventSource>, setup: Arc<SetupScheme>, event_buffer: usize) -> Self {
        Self {
            source,
            setup,
            event_buffer: event_buffer.max(1),
            cancel_on_disconnect: false,
        }
    }

    /// Propagate client disconnects to the job as a cancellation.
    pub fn cancel_on_disconnect(mut self, enabled: bool) -> Self {
        self.cancel_on_disconnect = enabled;
        self
    }

    /// Validate the caller and build an idle session for `user`.
    ///
    /// Fails without starting anything if the user has not completed the
    /// OAuth handshake.
    pub fn prepare(&self, user: &User) -> Result<BridgeSession, AppError> {
        let Some(access_token) = user.access_token() else {
            tracing::error!(user_id = user.id, "Refusing to start job for unauthenticated session");
            return Err(AppError::PreconditionViolation(
                "session is not authenticated".to_string(),
            ));
        };

        Ok(BridgeSession {
            source: self.source.clone(),
            request: JobRequest {
                user_id: user.id,
                username: user.username.clone(),
                setup: self.setup.clone(),
                access_token: access_token.to_string(),
                tracks: user.tracks.clone(),
                cancel: CancellationToken::new(),
            },
            event_buffer: self.event_buffer,
            cancel_on_disconnect: self.cancel_on_disconnect,
        })
    }
}

/// A prepared, not yet running bridge for one connection.
pub struct BridgeSession {
    source: Arc<dyn JobEventSource>,
    request: JobRequest,
    event_buffer: usize,
    cancel_on_disconnect: bool,
}

impl BridgeSession {
    pub fn user_id(&self) -> u64 {
        self.request.user_id
    }

    /// Token handed to the job; cancelling it asks the job to stop.
    pub fn cancel_token(&self) -> CancellationToken {
        self.request.cancel.clone()
    }

    /// Start the job and relay until a terminal state.
    ///
    /// `outbound` receives one JSON text per event and is closed once the
    /// job completes. `inbound` yields client text frames; an error item or
    /// the end of the stream means the client is gone.
    pub async fn run<Tx, Rx, E>(self, mut outbound: Tx, inbound: Rx) -> BridgeOutcome
    where
        Tx: Sink<String> + Unpin,
        Tx::Error: Display,
        Rx: Stream<Item = Result<String, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let BridgeSession {
            source,
            request,
            event_buffer,
            cancel_on_disconnect,
        } = self;
        let user_id = request.user_id;
        let username = request.username.clone();
        let cancel = request.cancel.clone();

        let (event_tx, mut events) = mpsc::channel::<Event>(event_buffer);
        tokio::spawn(async move {
            source.run(request, event_tx).await;
        });
        tracing::info!(user_id, "Job started");

        let (message_tx, mut messages) = mpsc::channel::<String>(INBOUND_BUFFER);
        let reader = tokio::spawn(read_inbound(user_id, inbound, message_tx));

        // Job events win ties so anything already queued is delivered before
        // a disconnect is acted on.
        let outcome = loop {
            tokio::select! {
                biased;

                event = events.recv() => match event {
                    Some(event) => match serde_json::to_string(&event) {
                        Ok(json) => {
                            tracing::info!(user_id, kind = ?event.kind, "Sending event");
                            if let Err(e) = outbound.send(json).await {
                                let err = AppError::TransportClosed(e.to_string());
                                tracing::info!(user_id, username = %username, error = %err, "Client disconnected");
                                break BridgeOutcome::Disconnected;
                            }
                        }
                        Err(e) => {
                            tracing::error!(user_id, error = %e, "Failed to serialize event");
                        }
                    },
                    None => {
                        tracing::info!(user_id, "The job has completed");
                        break BridgeOutcome::Completed;
                    }
                },

                message = messages.recv() => match message {
                    Some(text) => {
                        tracing::info!(user_id, message = %text, "Received client message");
                    }
                    None => {
                        tracing::info!(user_id, username = %username, "Client disconnected");
                        break BridgeOutcome::Disconnected;
                    }
                },
            }
        };

        reader.abort();

        if outcome == BridgeOutcome::Completed {
            if let Err(e) = outbound.close().await {
                tracing::debug!(user_id, error = %e, "Failed to close client connection");
            }
        }

        if outcome == BridgeOutcome::Disconnected && cancel_on_disconnect {
            tracing::info!(user_id, "Cancelling job after disconnect");
            cancel.cancel();
        }

        outcome
    }
}

/// Pump client frames into `messages`; dropping the sender signals disconnect.
async fn read_inbound<Rx, E>(user_id: u64, inbound: Rx, messages: mpsc::Sender<String>)
where
    Rx: Stream<Item = Result<String, E>>,
    E: Display,
{
    let mut inbound = std::pin::pin!(inbound);
    while let Some(frame) = inbound.next().await {
        match frame {
            Ok(text) => {
                if messages.send(text).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::debug!(user_id, error = %e, "Inbound read failed");
                return;
            }
        }
    }
    tracing::debug!(user_id, "Inbound stream ended");
}
