use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::errors::ProtocolError;
use super::frame::{FrameHeader, InboundFrame, OutboundFrame, TYPE_REQUEST};

/// Largest payload a single inbound frame may carry.
pub const MAX_FRAME_PAYLOAD: usize = 16 * 1024 * 1024;

#[derive(Debug, Default)]
pub struct BrokerCodec;

impl BrokerCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for BrokerCodec {
    type Item = InboundFrame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < FrameHeader::SIZE {
            return Ok(None);
        }

        let header_ref: &FrameHeader = match bytemuck::try_from_bytes(&src[..FrameHeader::SIZE]) {
            Ok(header) => header,
            Err(_) => {
                return Err(ProtocolError::Invalid(
                    "Header alignment or size mismatch".to_string(),
                ))
            }
        };

        let payload_len = header_ref.payload_len() as usize;
        if payload_len > MAX_FRAME_PAYLOAD {
            return Err(ProtocolError::FrameTooLarge { len: payload_len, max: MAX_FRAME_PAYLOAD });
        }
        let total_len = FrameHeader::SIZE + payload_len;

        if src.len() < total_len {
            src.reserve(total_len - src.len());
            return Ok(None);
        }

        let header = *header_ref;
        let frame_bytes = src.split_to(total_len).freeze();
        let payload = frame_bytes.slice(FrameHeader::SIZE..);

        Ok(Some(InboundFrame { header, payload }))
    }
}

impl Encoder<OutboundFrame> for BrokerCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: OutboundFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            OutboundFrame::Request { id, opcode, payload } => {
                dst.reserve(FrameHeader::SIZE + payload.len());
                dst.put_u8(TYPE_REQUEST);
                dst.put_u8(opcode);
                dst.put_u32(id);
                dst.put_u32(payload.len() as u32);
                dst.extend_from_slice(&payload);
            }
        }

        Ok(())
    }
}
