pub mod client;
pub mod payload_cursor;
pub mod protocol;

pub use client::*;
