//! Subscriber: connects to a Nexo broker, subscribes to one channel and feeds
//! every delivered message into the slot manager, one at a time.
//!
//! No reconnection: `run` returns when the connection ends.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::config::BrokerConfig;
use crate::slot::SlotManager;
use crate::subscriber::protocol::{
    BrokerCodec, InboundFrame, OutboundFrame, ProtocolError, PushMessage, Response,
    DATA_TYPE_JSON, DATA_TYPE_RAW, DATA_TYPE_STRING, PUSH_TYPE_PUBSUB, TYPE_PUSH, TYPE_RESPONSE,
};

const SUBSCRIBE_ID: u32 = 1;

// ========================================
// ERRORS
// ========================================

#[derive(Debug)]
pub enum SubscriberError {
    Io(std::io::Error),
    Protocol(ProtocolError),
    /// The broker answered the subscribe request with an error.
    Rejected(String),
    /// The broker closed the connection.
    Disconnected,
}

impl fmt::Display for SubscriberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriberError::Io(e) => write!(f, "broker connection failed: {}", e),
            SubscriberError::Protocol(e) => write!(f, "broker protocol error: {}", e),
            SubscriberError::Rejected(msg) => write!(f, "subscription rejected: {}", msg),
            SubscriberError::Disconnected => write!(f, "broker closed the connection"),
        }
    }
}

impl std::error::Error for SubscriberError {}

impl From<std::io::Error> for SubscriberError {
    fn from(error: std::io::Error) -> Self {
        SubscriberError::Io(error)
    }
}

impl From<ProtocolError> for SubscriberError {
    fn from(error: ProtocolError) -> Self {
        SubscriberError::Protocol(error)
    }
}

// ========================================
// SUBSCRIBER
// ========================================

#[derive(Debug, Clone)]
pub struct Subscriber {
    addr: String,
    channel: String,
}

impl Subscriber {
    pub fn new(addr: impl Into<String>, channel: impl Into<String>) -> Self {
        Self { addr: addr.into(), channel: channel.into() }
    }

    pub fn from_config(config: &BrokerConfig) -> Self {
        Self::new(config.addr(), config.channel.clone())
    }

    pub async fn run(&self, slots: Arc<SlotManager>) -> Result<(), SubscriberError> {
        let socket = TcpStream::connect(&self.addr).await?;
        tracing::info!(addr = %self.addr, channel = %self.channel, "Connected to broker");
        self.run_on(socket, slots).await
    }

    /// Drives an already-connected socket until the broker hangs up.
    pub async fn run_on(
        &self,
        socket: TcpStream,
        slots: Arc<SlotManager>,
    ) -> Result<(), SubscriberError> {
        let mut framed = Framed::new(socket, BrokerCodec::new());
        framed
            .send(OutboundFrame::subscribe(SUBSCRIBE_ID, &self.channel))
            .await?;

        while let Some(frame) = framed.next().await {
            self.handle_frame(frame?, &slots)?;
        }

        tracing::warn!(addr = %self.addr, "Broker connection closed");
        Err(SubscriberError::Disconnected)
    }

    fn handle_frame(&self, frame: InboundFrame, slots: &SlotManager) -> Result<(), SubscriberError> {
        match (frame.header.frame_type, frame.header.meta) {
            (TYPE_RESPONSE, status) if frame.header.id() == SUBSCRIBE_ID => {
                match Response::parse(status, frame.payload)? {
                    Response::Error(msg) => return Err(SubscriberError::Rejected(msg)),
                    _ => tracing::info!(channel = %self.channel, "Subscribed"),
                }
            }
            (TYPE_PUSH, PUSH_TYPE_PUBSUB) => {
                let msg = PushMessage::parse(frame.payload)?;
                self.deliver(msg, slots);
            }
            (frame_type, meta) => {
                tracing::debug!(frame_type, meta, id = frame.header.id(), "Ignoring unexpected frame");
            }
        }
        Ok(())
    }

    /// A bad message is logged and dropped; it never ends the subscription.
    fn deliver(&self, msg: PushMessage, slots: &SlotManager) {
        if msg.topic != self.channel {
            tracing::debug!(topic = %msg.topic, "Message for another topic ignored");
            return;
        }

        let text = match decode_text(&msg.data) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(topic = %msg.topic, "Dropping message: {}", e);
                return;
            }
        };
        tracing::info!(topic = %msg.topic, "Message received: {}", text);

        if let Err(e) = slots.accept(Bytes::from(text)) {
            tracing::warn!(topic = %msg.topic, "Payload rejected: {}", e);
        }
    }
}

/// Extracts the UTF-8 text carried by a message's data section.
/// A leading data-type byte is stripped; JSON strings are unquoted, other JSON is kept verbatim.
pub fn decode_text(data: &[u8]) -> Result<String, String> {
    let (data_type, content) = match data.first() {
        Some(&tag @ (DATA_TYPE_RAW | DATA_TYPE_STRING | DATA_TYPE_JSON)) => (Some(tag), &data[1..]),
        _ => (None, data),
    };

    let text = std::str::from_utf8(content)
        .map_err(|e| format!("payload is not valid UTF-8: {}", e))?;

    match data_type {
        Some(DATA_TYPE_JSON) => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::String(s)) => Ok(s),
            _ => Ok(text.to_string()),
        },
        _ => Ok(text.to_string()),
    }
}
