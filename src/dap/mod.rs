//! The DAP wire layer: framing, request/response/event types, and the
//! blocking client that drives a debug adapter subprocess.

pub mod client;
pub mod events;
pub mod message;
pub mod requests;
pub mod types;
