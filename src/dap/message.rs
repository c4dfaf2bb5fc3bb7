//! Framing and dispatch for messages read off the adapter's stdout.
//!
//! DAP multiplexes responses and events onto a single stream distinguished
//! only by a `type` field (`"response"` or `"event"`; a third `"request"`
//! variant exists for reverse requests, which this orchestrator never
//! answers and folds into `Sendable::Other`). A message is first decoded
//! into this untyped envelope, then specialized.

use std::io::BufRead;

use serde::Deserialize;
use serde_json::Value;

use super::events;
use super::requests::Response;
use crate::error::{Error, Result};
use crate::header::Header;

#[derive(Debug, Clone, Deserialize)]
struct GenericMessage {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(flatten)]
    body: Value,
}

/// A message read from the adapter, specialized into the three shapes this
/// orchestrator cares about.
#[derive(Debug, Clone)]
pub enum Sendable {
    Response(Response),
    Event(events::Event),
    /// A reverse request or any message shape this crate doesn't model.
    Other,
}

/// Read one `Content-Length`-framed message from `input` and specialize it.
pub fn read_from<R: BufRead>(input: &mut R) -> Result<Sendable> {
    let header = Header::read_from(input)?;

    let mut raw = vec![0u8; header.len];
    std::io::Read::read_exact(input, &mut raw)?;

    let generic: GenericMessage = serde_json::from_slice(&raw)?;

    match generic.message_type.as_str() {
        "response" => {
            let response: Response = serde_json::from_value(generic.body)?;
            Ok(Sendable::Response(response))
        }
        "event" => {
            let event_name = generic
                .body
                .get("event")
                .and_then(Value::as_str)
                .ok_or(Error::BadMessage)?
                .to_string();
            let body = generic.body.get("body").cloned();
            Ok(Sendable::Event(events::parse_event(&event_name, body)?))
        }
        _ => Ok(Sendable::Other),
    }
}
