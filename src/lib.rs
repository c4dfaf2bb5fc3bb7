//! Drives a native DAP debug adapter to execute a compiled program, hit a
//! declared set of source-line breakpoints, sample expression values and
//! call stacks at each hit, and return a structured report.
//!
//! The one public entry point is [`run`]. Everything else in this crate is
//! a collaborator of the [`orchestrator`] that implements it:
//! [`location`] resolves `"file:line"` specs to absolute paths,
//! [`registry`] owns the adapter-id↔spec↔report bookkeeping, [`eval`]
//! wraps expression evaluation, [`backtrace`] formats call stacks,
//! [`timeout`] enforces the session's wall-clock budget, [`setup`]
//! discovers the adapter and stages the debuggee's stdio, and [`dap`] is
//! the wire-level client.

pub mod backtrace;
pub mod dap;
pub mod error;
pub mod eval;
pub mod header;
pub mod location;
pub mod orchestrator;
pub mod output;
pub mod registry;
pub mod setup;
pub mod timeout;

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use error::{Error, Result};

/// Session-wide configuration, independent of the per-call breakpoint specs
/// (`SPEC_FULL.md` §6: "these are not part of the literal per-call schema
/// ... because they are session-wide, not per-breakpoint").
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Explicit path to the debug adapter binary. If unset, discovered from
    /// `PATH` (`lldb-dap`, falling back to `lldb-vscode`).
    pub adapter_path: Option<PathBuf>,
    /// Extra environment variables forwarded to the debuggee's launch,
    /// taking precedence over the inherited process environment.
    pub env: HashMap<String, String>,
    /// Repository root used as the second-priority location-resolution
    /// candidate (§4.1, step 2).
    pub repo_root: Option<PathBuf>,
    /// Absolute source paths extracted from the executable's debug info,
    /// used as the final location-resolution fallback, matched by
    /// basename (§4.1, step 3).
    pub source_map: Vec<PathBuf>,
}

/// A caller-declared request to break at a source line and sample data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakpointSpec {
    /// `"file:line"`, rewritten to absolute form by the Location Normalizer
    /// before registration; never mutated afterward.
    pub location: String,
    /// Maximum number of times this breakpoint may report a hit before it
    /// is removed from the adapter. Must be at least 1.
    #[serde(default = "default_hit_limit")]
    pub hit_limit: u32,
    /// Expressions evaluated, in this order, at every hit.
    #[serde(default)]
    pub inline_expr: Vec<String>,
    /// Whether to capture and render the call stack at each hit.
    #[serde(default)]
    pub print_call_stack: bool,
}

fn default_hit_limit() -> u32 {
    10
}

impl BreakpointSpec {
    /// A breakpoint at `location` with the spec defaults: `hit_limit=10`,
    /// no inline expressions, no call stack.
    pub fn new(location: impl Into<String>) -> Self {
        BreakpointSpec {
            location: location.into(),
            hit_limit: default_hit_limit(),
            inline_expr: Vec::new(),
            print_call_stack: false,
        }
    }
}

/// One evaluated expression at a hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineExprValue {
    pub name: String,
    pub value: String,
}

/// One stop at one breakpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitReport {
    /// Empty unless the spec's `print_call_stack` was set.
    pub callstack: String,
    /// Same length and order as the spec's `inline_expr`.
    pub inline_expr: Vec<InlineExprValue>,
}

/// Accumulated result for one spec the adapter successfully registered.
/// Specs the adapter rejected are absent from [`RunReport::breakpoints`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakpointReport {
    pub id: i64,
    pub file_path: String,
    pub line: i64,
    pub function_name: String,
    pub hit_times: u32,
    pub hits_info: Vec<HitReport>,
}

/// The full result of one [`run`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// The debuggee's stderr, decoded lossily (invalid sequences replaced).
    pub stderr: String,
    /// Present only on normal termination.
    pub exit_code: Option<i64>,
    /// Present only on abnormal termination (e.g. a signal/exception); a
    /// descriptive string from the adapter, not a numeric signal.
    pub signal: Option<String>,
    /// Whether the session's wall-clock budget was exhausted before the
    /// debuggee finished.
    pub has_timeout: bool,
    /// In spec-registration order, not adapter-id order.
    pub breakpoints: Vec<BreakpointReport>,
}

/// Launch `cmd` under a debug adapter, register `breakpoints`, run to
/// completion (or until `timeout_sec` elapses), and return the
/// accumulated report.
///
/// `cmd[0]` is the debuggee's executable path; the rest is forwarded as its
/// argv. `stdin` is written to the debuggee's standard input up front, if
/// given. `timeout_sec` bounds the combined wall-clock time of the launch
/// and every subsequent continue/evaluate round-trip; `None` means no
/// budget is enforced.
///
/// Only adapter unavailability (missing binary, spawn failure, a closed
/// pipe) surfaces as `Err`. Every other failure mode named in
/// `SPEC_FULL.md` §7 — breakpoint registration, expression evaluation,
/// protocol-shape surprises, timeouts, abnormal termination — is folded
/// into the returned [`RunReport`] instead.
pub fn run(
    cmd: &[String],
    stdin: Option<&[u8]>,
    timeout_sec: Option<f64>,
    breakpoints: &[BreakpointSpec],
    config: &Config,
) -> Result<RunReport> {
    let (result, registry) = orchestrator::run(cmd, stdin, timeout_sec, breakpoints, config)?;
    Ok(output::build(&result, registry.reports_in_order()))
}
