//! Connection management.
//!
//! Owns the single logical connection to the game server. The actual
//! socket lives behind the [`Transport`] trait; this module only tracks the
//! three-state lifecycle and the one-slot outbound queue.
//!
//! ```text
//!            open()                 on_open()
//! ┌────────┐ ──────▶ ┌────────────┐ ────────▶ ┌──────┐
//! │ Closed │         │ Connecting │           │ Open │
//! └────────┘ ◀────── └────────────┘ ◀─ ─ ─ ─  └──────┘
//!     ▲     on_close /                              │
//!     │     connect failure                         │
//!     └─────────────────────────────────────────────┘
//!                   on_close / send failure
//! ```
//!
//! While `Connecting`, `send` parks the message in the queue slot (a later
//! send replaces it). While `Closed`, `send` parks the message and reopens.

use chrono::{DateTime, Utc};

use super::protocol::{self, OutboundMessage, Snapshot};
use crate::error::{Result, TransportError};

/// Byte-level link to the server.
///
/// `connect` only starts opening; completion is reported back through
/// [`ConnectionManager::on_open`], failures through `on_error`/`on_close`.
pub trait Transport {
    fn connect(&mut self, endpoint: &str) -> std::result::Result<(), TransportError>;

    fn send_text(&mut self, frame: &str) -> std::result::Result<(), TransportError>;
}

/// Connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Open requested, not yet established
    Connecting,

    /// Frames can be sent
    Open,

    /// No connection; the next send reopens
    #[default]
    Closed,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// What `send` did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Written to the transport
    Sent,
    /// Parked until the connection opens
    Queued,
    /// Parked, and a fresh connection was started
    Reconnecting,
}

/// Lifecycle and queue for the single server connection.
#[derive(Debug)]
pub struct ConnectionManager<T> {
    transport: T,

    /// Endpoint of the last `open`
    endpoint: Option<String>,

    status: ConnectionStatus,

    /// At most one message waiting for the connection to open
    queued: Option<OutboundMessage>,

    /// Detail of the last transport error
    last_error: Option<String>,

    /// An error event arrived since the last `open`
    faulted: bool,

    pub opened_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub frames_sent: u64,
    pub frames_received: u64,

    /// Opens triggered by a send while closed
    pub reconnects: u64,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            endpoint: None,
            status: ConnectionStatus::Closed,
            queued: None,
            last_error: None,
            faulted: false,
            opened_at: None,
            closed_at: None,
            frames_sent: 0,
            frames_received: 0,
            reconnects: 0,
        }
    }

    /// Start opening a connection.
    pub fn open(&mut self, endpoint: &str) -> Result<()> {
        tracing::info!(endpoint, "Opening connection");
        self.endpoint = Some(endpoint.to_string());
        self.status = ConnectionStatus::Connecting;
        self.faulted = false;

        if let Err(e) = self.transport.connect(endpoint) {
            tracing::warn!(endpoint, error = %e, "Connection failed to open");
            self.mark_closed();
            self.last_error = Some(e.to_string());
            return Err(e.into());
        }
        Ok(())
    }

    /// Transport reports the connection is established.
    ///
    /// Flushes the queued message if there is one, otherwise sends `resync`
    /// (the snapshot request for an already-chosen game). Returns the
    /// message that went out.
    pub fn on_open(&mut self, resync: Option<OutboundMessage>) -> Result<Option<OutboundMessage>> {
        tracing::info!(endpoint = ?self.endpoint, "Connection open");
        self.status = ConnectionStatus::Open;
        self.opened_at = Some(Utc::now());

        let outgoing = self.queued.take().or(resync);
        if let Some(message) = &outgoing {
            self.transmit(message)?;
        }
        Ok(outgoing)
    }

    /// Transport reports an error. No retry happens here.
    pub fn on_error(&mut self, detail: &str) {
        tracing::warn!(detail, status = self.status.as_str(), "Transport error");
        self.last_error = Some(detail.to_string());
        self.faulted = true;
    }

    /// Transport reports the connection is gone.
    ///
    /// Returns true when this ended a live connection (open or still
    /// connecting) with no error event reported for it.
    pub fn on_close(&mut self) -> bool {
        tracing::info!(endpoint = ?self.endpoint, "Connection closed");
        let unreported = self.status != ConnectionStatus::Closed && !self.faulted;
        self.mark_closed();
        unreported
    }

    /// Transport delivered a frame.
    pub fn on_message(&mut self, raw: &str) -> Result<Snapshot> {
        self.frames_received += 1;
        tracing::debug!(frame = raw, "Received frame");
        protocol::decode(raw).map_err(|e| {
            tracing::warn!(error = %e, "Undecodable frame");
            e
        })
    }

    /// Send a message, queueing or reconnecting as the status requires.
    pub fn send(&mut self, message: OutboundMessage) -> Result<SendOutcome> {
        match self.status {
            ConnectionStatus::Open => {
                self.transmit(&message)?;
                Ok(SendOutcome::Sent)
            }
            ConnectionStatus::Connecting => {
                if let Some(dropped) = self.queued.replace(message) {
                    tracing::debug!(action = dropped.action.as_str(), "Superseded queued message");
                }
                Ok(SendOutcome::Queued)
            }
            ConnectionStatus::Closed => {
                let Some(endpoint) = self.endpoint.clone() else {
                    return Err(TransportError::Closed.into());
                };
                self.reconnects += 1;
                self.open(&endpoint)?;
                self.queued = Some(message);
                Ok(SendOutcome::Reconnecting)
            }
        }
    }

    fn transmit(&mut self, message: &OutboundMessage) -> Result<()> {
        let frame = protocol::encode(message)?;
        tracing::debug!(frame = %frame, "Sending frame");
        match self.transport.send_text(&frame) {
            Ok(()) => {
                self.frames_sent += 1;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Send failed");
                self.mark_closed();
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    fn mark_closed(&mut self) {
        self.status = ConnectionStatus::Closed;
        self.closed_at = Some(Utc::now());
        if let Some(dropped) = self.queued.take() {
            tracing::debug!(action = dropped.action.as_str(), "Dropped queued message on close");
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn queued(&self) -> Option<&OutboundMessage> {
        self.queued.as_ref()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// In-memory transport that records everything written to it.
///
/// Useful for tests and for driving the engine without a network.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    /// Endpoints passed to `connect`, in order
    pub connects: Vec<String>,

    /// Frames passed to `send_text`, in order
    pub sent: Vec<String>,

    /// Make the next `connect` calls fail
    pub fail_connect: bool,

    /// Make the next `send_text` calls fail
    pub fail_send: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sent frames parsed back into JSON.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .iter()
            .filter_map(|f| serde_json::from_str(f).ok())
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn connect(&mut self, endpoint: &str) -> std::result::Result<(), TransportError> {
        if self.fail_connect {
            return Err(TransportError::Open {
                endpoint: endpoint.to_string(),
                reason: "refused".to_string(),
            });
        }
        self.connects.push(endpoint.to_string());
        Ok(())
    }

    fn send_text(&mut self, frame: &str) -> std::result::Result<(), TransportError> {
        if self.fail_send {
            return Err(TransportError::Send("broken pipe".to_string()));
        }
        self.sent.push(frame.to_string());
        Ok(())
    }
}
