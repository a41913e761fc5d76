pub mod page;
pub mod server;

pub use server::*;
