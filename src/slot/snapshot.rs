use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SlotSnapshot {
    pub available: bool,
    pub generation: u64,
    pub window_secs: u64,
    pub strategy: &'static str,
    pub current: Option<CurrentDetail>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CurrentDetail {
    pub generation: u64,
    pub payload_preview: String,
    pub received_at: String, // ISO8601
    pub expires_at: String,  // ISO8601
    pub remaining_ms: u64,
    pub prerendered: bool,
}
