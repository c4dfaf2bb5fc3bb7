//! The requests this orchestrator issues, and the responses it expects back.
//!
//! Only the subset of the DAP 1.x request vocabulary the orchestrator
//! actually drives is modeled: `initialize`, `setBreakpoints`,
//! `configurationDone`, `launch`, `continue`, `evaluate`, `stackTrace`,
//! `terminate`. Doc comments are adapted from the DAP specification.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::types::Source;
use crate::dap::types::SourceBreakpoint;

/// The `initialize` request is sent as the first request from the client to
/// the debug adapter in order to configure it with client capabilities and
/// to retrieve capabilities from the debug adapter. Until the debug adapter
/// has responded with an `initialize` response, the client must not send any
/// additional requests to the debug adapter.
#[derive(Debug, Clone)]
pub struct InitializeArguments {
    pub adapter_id: String,
    pub lines_start_at1: bool,
    pub columns_start_at1: bool,
}

/// Since launching is debugger/runtime specific, the arguments for this
/// request are not part of the DAP specification proper; `lldb-dap` expects
/// `program`, `args`, `env`, `stopOnEntry`, and `initCommands`. Built by
/// `crate::setup` rather than modeled as a fixed struct.
pub type LaunchArguments = Value;

#[derive(Debug, Clone)]
pub enum Command {
    Initialize(InitializeArguments),
    SetBreakpoints { source: Source, breakpoints: Vec<SourceBreakpoint> },
    ConfigurationDone,
    Launch(LaunchArguments),
    Continue { thread_id: i64 },
    Evaluate { expression: String, frame_id: i64 },
    StackTrace { thread_id: i64 },
    Terminate,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Initialize(_) => "initialize",
            Command::SetBreakpoints { .. } => "setBreakpoints",
            Command::ConfigurationDone => "configurationDone",
            Command::Launch(_) => "launch",
            Command::Continue { .. } => "continue",
            Command::Evaluate { .. } => "evaluate",
            Command::StackTrace { .. } => "stackTrace",
            Command::Terminate => "terminate",
        }
    }

    pub fn arguments(&self) -> Option<Value> {
        match self {
            Command::Initialize(args) => Some(json!({
                "clientID": "witness-dap",
                "adapterID": args.adapter_id,
                "linesStartAt1": args.lines_start_at1,
                "columnsStartAt1": args.columns_start_at1,
                "pathFormat": "path",
            })),
            Command::SetBreakpoints { source, breakpoints } => Some(json!({
                "source": source,
                "breakpoints": breakpoints,
                "lines": breakpoints.iter().map(|b| b.line).collect::<Vec<_>>(),
            })),
            Command::ConfigurationDone => None,
            Command::Launch(args) => Some(args.clone()),
            Command::Continue { thread_id } => Some(json!({ "threadId": thread_id })),
            Command::Evaluate { expression, frame_id } => Some(json!({
                "expression": expression,
                "frameId": frame_id,
                "context": "watch",
            })),
            Command::StackTrace { thread_id } => Some(json!({ "threadId": thread_id })),
            Command::Terminate => None,
        }
    }
}

/// A sent request envelope: `{"seq", "type": "request", "command", "arguments"}`.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    pub seq: i64,
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub command: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl RequestEnvelope {
    pub fn new(seq: i64, command: &Command) -> Self {
        RequestEnvelope {
            seq,
            message_type: "request",
            command: command.name(),
            arguments: command.arguments(),
        }
    }
}

/// Response for a request.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    pub request_seq: i64,
    pub success: bool,
    pub command: String,
    pub message: Option<String>,
    pub body: Option<Value>,
}

impl Response {
    /// Deserialize `body` into the shape a given response is expected to
    /// carry. Missing/malformed bodies become `Error::Protocol`, consistent
    /// with §4.6's "any unexpected adapter response shape -> warning".
    pub fn body_as<T: serde::de::DeserializeOwned>(&self, command: &'static str) -> crate::error::Result<T> {
        let body = self.body.clone().ok_or_else(|| crate::error::Error::Protocol {
            command,
            detail: "missing body".to_string(),
        })?;
        serde_json::from_value(body).map_err(|err| crate::error::Error::Protocol {
            command,
            detail: err.to_string(),
        })
    }
}
