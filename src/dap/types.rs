//! The DAP value types this orchestrator actually touches.
//!
//! Field shapes and doc comments are adapted from the DAP 1.x specification
//! (Creative Commons Attribution 3.0 United States License), trimmed down to
//! what `crate::orchestrator` reads or writes. Capability flags the
//! orchestrator never inspects are dropped rather than carried as dead
//! `Option<bool>` fields.

use serde::{Deserialize, Serialize};

/// Information about the capabilities of a debug adapter.
///
/// This orchestrator doesn't gate its own behavior on any individual
/// capability (it targets `lldb-dap`/`lldb-vscode` specifically), so the
/// body is kept opaque rather than fully enumerated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(flatten)]
    pub raw: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub name: Option<String>,
    pub path: Option<String>,
}

impl Source {
    pub fn for_path(path: impl Into<String>) -> Self {
        let path = path.into();
        Source { name: None, path: Some(path) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceBreakpoint {
    pub line: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breakpoint {
    pub id: Option<i64>,
    pub verified: bool,
    pub message: Option<String>,
    pub source: Option<Source>,
    pub line: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackFrame {
    pub id: i64,
    pub name: String,
    pub source: Option<Source>,
    pub line: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponseBody {
    pub result: String,
    #[serde(default)]
    pub variables_reference: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointsResponseBody {
    pub breakpoints: Vec<Breakpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTraceResponseBody {
    pub stack_frames: Vec<StackFrame>,
}
