//! WebSocket event types and broadcasting for real-time session observation.
//!
//! Events are broadcast to all connected clients as the session moves
//! through its states.
//!
//! # Event Types
//!
//! - `connected` - Sent when a client connects, includes the current snapshot
//! - `status_changed` - The status or position changed
//! - `answer_evaluated` - A scored answer came back
//! - `session_complete` - The last question was handled
//! - `error` - Generation or evaluation failed
//!
//! # Example
//!
//! ```no_run
//! use prepmaster_orchestrator::websocket::{EventBroadcaster, SessionEvent};
//! use prepmaster_orchestrator::SessionState;
//!
//! # async fn example() {
//! let broadcaster = EventBroadcaster::new(100);
//! let mut receiver = broadcaster.subscribe();
//!
//! broadcaster.send(SessionEvent::connected(SessionState::new()));
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {:?}", event);
//! }
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::machine::Orchestrator;
use crate::session::{Progress, SessionState, SessionStatus};

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload for the `connected` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedPayload {
    /// The current snapshot.
    pub state: SessionState,
    /// Position within the session, if one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
}

/// Payload for the `status_changed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedPayload {
    /// The new status.
    pub status: SessionStatus,
    /// Position within the session, if one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
}

/// Payload for the `answer_evaluated` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvaluatedPayload {
    /// The question that was answered.
    pub question_id: String,
    /// Its score.
    pub score: u8,
}

/// Payload for the `session_complete` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCompletePayload {
    /// Number of questions in the session.
    pub question_count: usize,
    /// Average score, for scored sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
}

/// Payload for the `error` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable error message.
    pub message: String,
}

// ============================================================================
// Event Enum
// ============================================================================

/// WebSocket event types for session observation.
///
/// All events are serialized as JSON objects with "event" and "payload" fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Sent when a client connects.
    Connected(ConnectedPayload),
    /// Sent after every transition.
    StatusChanged(StatusChangedPayload),
    /// Sent when a scored answer is recorded.
    AnswerEvaluated(AnswerEvaluatedPayload),
    /// Sent when the session reaches results.
    SessionComplete(SessionCompletePayload),
    /// Sent when a remote call fails.
    Error(ErrorPayload),
}

impl SessionEvent {
    /// Creates a `Connected` event from a snapshot.
    #[must_use]
    pub fn connected(state: SessionState) -> Self {
        let progress = state.progress();
        Self::Connected(ConnectedPayload { state, progress })
    }

    /// Creates a `StatusChanged` event.
    #[must_use]
    pub const fn status_changed(status: SessionStatus, progress: Option<Progress>) -> Self {
        Self::StatusChanged(StatusChangedPayload { status, progress })
    }

    /// Creates an `AnswerEvaluated` event.
    #[must_use]
    pub fn answer_evaluated(question_id: impl Into<String>, score: u8) -> Self {
        Self::AnswerEvaluated(AnswerEvaluatedPayload {
            question_id: question_id.into(),
            score,
        })
    }

    /// Creates a `SessionComplete` event.
    #[must_use]
    pub const fn session_complete(question_count: usize, average_score: Option<f64>) -> Self {
        Self::SessionComplete(SessionCompletePayload {
            question_count,
            average_score,
        })
    }

    /// Creates an `Error` event.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            message: message.into(),
        })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::StatusChanged(_) => "status_changed",
            Self::AnswerEvaluated(_) => "answer_evaluated",
            Self::SessionComplete(_) => "session_complete",
            Self::Error(_) => "error",
        }
    }
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Broadcasts session events to all connected WebSocket clients.
///
/// Events are not persisted for disconnected clients.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBroadcaster {
    /// Creates a new `EventBroadcaster` with the given per-subscriber buffer.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new subscriber. A subscriber that falls behind receives a
    /// `Lagged` error and misses events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event. Returns the number of receivers reached.
    pub fn send(&self, event: SessionEvent) -> usize {
        // send() returns Err only if there are no receivers, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

// ============================================================================
// WebSocket Handler
// ============================================================================

/// Interval between heartbeat pings.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Maximum number of missed pong responses before disconnecting.
const MAX_MISSED_PONGS: u8 = 3;

/// WebSocket upgrade handler for `/ws`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(orchestrator): State<Arc<Orchestrator>>,
) -> Response {
    info!("New WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, orchestrator))
}

/// Handles a single WebSocket connection.
///
/// - Sends `connected` with the current snapshot immediately
/// - Forwards all broadcast events to the client
/// - Sends heartbeat pings every 30 seconds
/// - Closes the connection after 3 missed pongs
async fn handle_socket(socket: WebSocket, orchestrator: Arc<Orchestrator>) {
    let (mut sender, mut receiver) = socket.split();

    // subscribe before the snapshot so no transition slips between them
    let mut event_receiver = orchestrator.subscribe();
    let snapshot = orchestrator.snapshot().await;

    let connected_json = match serde_json::to_string(&SessionEvent::connected(snapshot)) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize connected event: {}", e);
            return;
        }
    };

    if sender.send(Message::Text(connected_json)).await.is_err() {
        debug!("Client disconnected before receiving connected event");
        return;
    }

    info!("WebSocket client connected, sent initial state");

    let mut heartbeat_interval = interval(HEARTBEAT_INTERVAL);
    let mut missed_pongs = 0u8;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Pong(_))) => {
                        missed_pongs = 0;
                        debug!("Received pong from client");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client requested close");
                        break;
                    }
                    Some(Ok(Message::Text(_) | Message::Binary(_))) => {
                        debug!("Ignoring data message from client");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            debug!("Failed to send pong, client disconnected");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }

            event = event_receiver.recv() => {
                match event {
                    Ok(session_event) => {
                        let json = match serde_json::to_string(&session_event) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!("Failed to serialize event: {}", e);
                                continue;
                            }
                        };

                        if sender.send(Message::Text(json)).await.is_err() {
                            debug!("Failed to send event, client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Client lagged, missed {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Broadcaster closed");
                        break;
                    }
                }
            }

            _ = heartbeat_interval.tick() => {
                if sender.send(Message::Ping(vec![])).await.is_err() {
                    debug!("Failed to send ping, client disconnected");
                    break;
                }
                missed_pongs += 1;
                if missed_pongs >= MAX_MISSED_PONGS {
                    info!("Client missed {} pongs, closing connection", MAX_MISSED_PONGS);
                    break;
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}

// ============================================================================
// Tests
// ============================================================================
