//! Nexo Binary Protocol, client side: frame types and constants.
//!
//! Every frame (Total Header: 10 bytes):
//! [FrameType: 1 byte] [Meta: 1 byte] [CorrelationID: 4 bytes (BE)] [PayloadLen: 4 bytes (BE)]
//!
//! Meta is the opcode on requests, the status on responses, the push type on pushes.
//!
//! PubSub push payload:
//! [TopicLen: 4 bytes (BE)] [Topic] [Data...]
//!
//! Data Structure (auto-contained):
//! [DataType: 1 byte] [Data...]

use bytes::{BufMut, Bytes, BytesMut};
use bytemuck::{Pod, Zeroable};

use super::errors::ProtocolError;
use crate::subscriber::payload_cursor::PayloadCursor;

// ========================================
// FRAME TYPES
// ========================================
pub const TYPE_REQUEST: u8 = 0x01;
pub const TYPE_RESPONSE: u8 = 0x02;
pub const TYPE_PUSH: u8 = 0x03;

// ========================================
// PUSH TYPES (Meta byte for Push frames)
// ========================================
pub const PUSH_TYPE_PUBSUB: u8 = 0x01;

// ========================================
// RESPONSE STATUS (Meta byte for Response frames)
// ========================================
pub const STATUS_OK: u8 = 0x00;
pub const STATUS_ERR: u8 = 0x01;
pub const STATUS_NULL: u8 = 0x02;
pub const STATUS_DATA: u8 = 0x03;

// ========================================
// DATA TYPE FLAGS (First byte of data payload)
// ========================================
pub const DATA_TYPE_RAW: u8 = 0x00;
pub const DATA_TYPE_STRING: u8 = 0x01;
pub const DATA_TYPE_JSON: u8 = 0x02;

// ========================================
// PUBSUB OPCODES (Meta byte for Request frames)
// ========================================
pub const OP_SUB: u8 = 0x22;

// ========================================
// FRAME HEADER
// ========================================

/// Fixed-size Header: [FrameType: 1] [Meta: 1] [CorrelationID: 4] [PayloadLen: 4]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameHeader {
    pub frame_type: u8,
    pub meta: u8,
    pub id: [u8; 4],
    pub payload_len: [u8; 4],
}

impl FrameHeader {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn id(&self) -> u32 {
        u32::from_be_bytes(self.id)
    }

    pub fn payload_len(&self) -> u32 {
        u32::from_be_bytes(self.payload_len)
    }
}

// ========================================
// FRAMES
// ========================================

/// Inbound frame: decoded by BrokerCodec from the socket
#[derive(Debug)]
pub struct InboundFrame {
    pub header: FrameHeader,
    pub payload: Bytes,
}

/// Outbound frame: encoded by BrokerCodec to the socket
#[derive(Debug)]
pub enum OutboundFrame {
    Request { id: u32, opcode: u8, payload: Bytes },
}

impl OutboundFrame {
    /// SUB: [TopicLen:4][Topic]
    pub fn subscribe(id: u32, topic: &str) -> Self {
        let mut buf = BytesMut::with_capacity(4 + topic.len());
        buf.put_u32(topic.len() as u32);
        buf.put_slice(topic.as_bytes());
        OutboundFrame::Request { id, opcode: OP_SUB, payload: buf.freeze() }
    }
}

// ========================================
// DECODED VIEWS
// ========================================

/// Broker answer to a request
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ok,
    Data(Bytes),
    Error(String),
    Null,
}

impl Response {
    pub fn parse(status: u8, payload: Bytes) -> Result<Self, ProtocolError> {
        match status {
            STATUS_OK => Ok(Response::Ok),
            STATUS_NULL => Ok(Response::Null),
            STATUS_DATA => Ok(Response::Data(payload)),
            STATUS_ERR => {
                let mut cursor = PayloadCursor::new(payload);
                let msg = cursor.read_string().map_err(ProtocolError::Invalid)?;
                Ok(Response::Error(msg))
            }
            other => Err(ProtocolError::Invalid(format!(
                "Unknown response status: 0x{:02X}",
                other
            ))),
        }
    }
}

/// A message delivered on a subscribed topic
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub topic: String,
    pub data: Bytes,
}

impl PushMessage {
    pub fn parse(payload: Bytes) -> Result<Self, ProtocolError> {
        let mut cursor = PayloadCursor::new(payload);
        let topic = cursor.read_string().map_err(ProtocolError::Invalid)?;
        let data = cursor.read_remaining();
        Ok(Self { topic, data })
    }
}
