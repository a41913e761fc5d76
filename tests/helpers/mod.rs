#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use qrflash::artifact::{Artifact, ArtifactError, ArtifactRenderer, QrPngRenderer, RenderStrategy};
use qrflash::config::{Config, SlotConfig};
use qrflash::QrFlashEngine;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

pub const WINDOW: Duration = Duration::from_secs(30);
pub const CHANNEL: &str = "qrflash/codes";

pub fn config_with(window: Duration, strategy: RenderStrategy) -> Config {
    let mut config = Config::default();
    config.slot = SlotConfig::with_window(window);
    config.artifact.strategy = strategy;
    config
}

pub fn setup_engine(strategy: RenderStrategy) -> QrFlashEngine {
    QrFlashEngine::new(&config_with(WINDOW, strategy))
}

/// Wraps the real renderer but refuses any payload containing the marker character,
/// standing in for content the encoder cannot handle.
pub struct PickyRenderer {
    inner: QrPngRenderer,
    pub marker: char,
}

impl PickyRenderer {
    pub fn new(marker: char) -> Self {
        Self { inner: QrPngRenderer::default(), marker }
    }
}

impl ArtifactRenderer for PickyRenderer {
    fn render(&self, payload: &[u8]) -> Result<Artifact, ArtifactError> {
        if String::from_utf8_lossy(payload).contains(self.marker) {
            return Err(ArtifactError::Encode(format!("'{}' is not encodable", self.marker)));
        }
        self.inner.render(payload)
    }
}

pub fn setup_picky_engine(strategy: RenderStrategy) -> QrFlashEngine {
    QrFlashEngine::with_renderer(&config_with(WINDOW, strategy), Arc::new(PickyRenderer::new('∅')))
}

// ========================================
// FAKE BROKER FRAMES
// ========================================

pub fn frame(frame_type: u8, meta: u8, id: u32, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(10 + payload.len());
    buf.put_u8(frame_type);
    buf.put_u8(meta);
    buf.put_u32(id);
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.freeze()
}

/// [TopicLen:4][Topic][DataType:1][Data]
pub fn push_payload(topic: &str, data_type: u8, data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(5 + topic.len() + data.len());
    buf.extend_from_slice(&(topic.len() as u32).to_be_bytes());
    buf.extend_from_slice(topic.as_bytes());
    buf.push(data_type);
    buf.extend_from_slice(data);
    buf
}

pub async fn send_frame(stream: &mut TcpStream, bytes: Bytes) {
    stream.write_all(&bytes).await.expect("fake broker write");
}
