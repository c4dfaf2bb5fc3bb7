//! The events this orchestrator observes while a session is running.
//!
//! Doc comments are adapted from the DAP specification. Dispatch is an
//! explicit `match` in `crate::orchestrator`; there is no duck-typed field
//! probing anywhere in this crate.

use serde::Deserialize;
use serde_json::Value;

use super::types::Breakpoint;

#[derive(Debug, Clone)]
pub enum Event {
    /// Sent after the adapter has received the `initialize` request and is
    /// ready to receive further configuration requests.
    Initialized,
    /// The execution of the debuggee has stopped.
    Stopped(StoppedEventBody),
    /// The execution of the debuggee has continued.
    Continued,
    /// The debuggee has exited and returns its exit code.
    Exited(ExitedEventBody),
    /// Debugging of the debuggee has terminated.
    Terminated,
    /// The target has produced output on one of its streams.
    Output(OutputEventBody),
    /// Some information about a breakpoint has changed.
    Breakpoint(BreakpointEventBody),
    /// Any event this crate doesn't need to act on.
    Other { event: String, body: Option<Value> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoppedEventBody {
    pub reason: StoppedReason,
    pub description: Option<String>,
    #[serde(rename = "threadId")]
    pub thread_id: Option<i64>,
    #[serde(rename = "hitBreakpointIds", default)]
    pub hit_breakpoint_ids: Vec<i64>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoppedReason {
    Step,
    Breakpoint,
    Exception,
    Pause,
    Entry,
    Goto,
    Other(String),
}

impl<'de> Deserialize<'de> for StoppedReason {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "step" => StoppedReason::Step,
            "breakpoint" => StoppedReason::Breakpoint,
            "exception" => StoppedReason::Exception,
            "pause" => StoppedReason::Pause,
            "entry" => StoppedReason::Entry,
            "goto" => StoppedReason::Goto,
            _ => StoppedReason::Other(raw),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExitedEventBody {
    #[serde(rename = "exitCode")]
    pub exit_code: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputEventBody {
    pub output: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BreakpointEventBody {
    pub breakpoint: Breakpoint,
}

/// Parses the `event` field of a generic message body into a typed [`Event`].
pub fn parse_event(event: &str, body: Option<Value>) -> crate::error::Result<Event> {
    let parsed = match event {
        "initialized" => Event::Initialized,
        "stopped" => Event::Stopped(decode(body, "stopped")?),
        "continued" => Event::Continued,
        "exited" => Event::Exited(decode(body, "exited")?),
        "terminated" => Event::Terminated,
        "output" => Event::Output(decode(body, "output")?),
        "breakpoint" => Event::Breakpoint(decode(body, "breakpoint")?),
        other => Event::Other { event: other.to_string(), body },
    };
    Ok(parsed)
}

fn decode<T: serde::de::DeserializeOwned>(
    body: Option<Value>,
    event: &'static str,
) -> crate::error::Result<T> {
    let body = body.ok_or_else(|| crate::error::Error::Protocol {
        command: event,
        detail: "missing event body".to_string(),
    })?;
    serde_json::from_value(body).map_err(|err| crate::error::Error::Protocol {
        command: event,
        detail: err.to_string(),
    })
}
