//! The Session Orchestrator: the state machine described in `SPEC_FULL.md`
//! §4.6 — `INIT → SET_BREAKPOINTS → LAUNCH → RUNNING ⇄ STOPPED → TERMINATE
//! → DONE` — wiring `crate::setup`, `crate::dap::client::Client`,
//! `crate::registry::BreakpointRegistry`, `crate::eval`, and
//! `crate::timeout::TimeoutGate` together.
//!
//! Grounded on `SPEC_FULL.md` §4.6 directly; the explicit `match` on
//! `Event`/`StoppedReason` and warn-and-continue discipline for shapes this
//! crate doesn't expect mirrors `ark/src/dap/dap_server.rs`'s `serve`
//! dispatch loop (`posit-dev-ark`).

use std::time::Duration;

use crate::dap::client::Client;
use crate::dap::events::{Event, StoppedEventBody, StoppedReason};
use crate::dap::message::Sendable;
use crate::dap::requests::{Command, InitializeArguments};
use crate::dap::types::StackFrame;
use crate::error::{Error, Result};
use crate::eval;
use crate::registry::{BreakpointRegistry, HitInfo};
use crate::setup::{self, StdioFiles};
use crate::timeout::TimeoutGate;
use crate::{BreakpointSpec, Config};

/// Accumulated result of one session, before projection into the public
/// [`crate::RunReport`] schema by `crate::output`.
#[derive(Debug, Default)]
pub struct RunResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub timeout: bool,
    pub exit_code: Option<i64>,
    pub signal: Option<String>,
}

/// What one round through the stop-loop produced.
enum StopOutcome {
    Stopped { thread_id: i64, body: StoppedEventBody },
    Exited { exit_code: Option<i64> },
    TimedOut,
}

/// Whether a `continue`/`launch` round-trip completed or ran out of budget.
enum Proceed {
    Ok,
    TimedOut,
}

/// Drive one full debug session and return the accumulated [`RunResult`]
/// alongside the [`BreakpointRegistry`] that owns the per-spec reports.
///
/// This is the only function in the crate that owns the adapter child
/// process and the staged stdio files; both are released before returning,
/// on every exit path, including an early return on a fatal error.
pub fn run(
    cmd: &[String],
    stdin_data: Option<&[u8]>,
    timeout_sec: Option<f64>,
    breakpoints: &[BreakpointSpec],
    config: &Config,
) -> Result<(RunResult, BreakpointRegistry)> {
    let (program, argv_tail) = cmd.split_first().ok_or_else(|| Error::Protocol {
        command: "launch",
        detail: "cmd must name at least the debuggee executable".to_string(),
    })?;

    let adapter_path = match &config.adapter_path {
        Some(path) => path.clone(),
        None => setup::discover_adapter()?,
    };

    let gate = TimeoutGate::new(timeout_sec.map(Duration::from_secs_f64));
    let stdio = StdioFiles::stage(stdin_data)?;
    let env = setup::build_environment(&adapter_path, &config.env);

    let mut registry = BreakpointRegistry::new(breakpoints, config.repo_root.as_deref(), &config.source_map);
    let mut result = RunResult::default();

    // `Client::spawn` launches the *adapter*, not the debuggee: the
    // debuggee is started later by the `launch` request below.
    let mut client = Client::spawn(&adapter_path.to_string_lossy(), &[])?;
    let mut events: Vec<Event> = Vec::new();

    let session = drive(
        &mut client,
        &gate,
        &mut events,
        &mut registry,
        &mut result,
        program,
        argv_tail,
        &env,
        &stdio,
    );

    // Teardown always runs, in the order §5/§9 requires: read stdio, then
    // terminate the adapter, then let the temp files drop (unlinking them).
    let _ = client.request(&Command::Terminate, Duration::from_secs(2), &mut Vec::new());
    client.kill();
    result.stdout = std::fs::read(stdio.stdout.path()).unwrap_or_default();
    result.stderr = std::fs::read(stdio.stderr.path()).unwrap_or_default();

    session?;
    Ok((result, registry))
}

/// INIT → SET_BREAKPOINTS → LAUNCH → stop-loop, up to (but not including)
/// teardown, which the caller always runs regardless of how this returns.
#[allow(clippy::too_many_arguments)]
fn drive(
    client: &mut Client,
    gate: &TimeoutGate,
    events: &mut Vec<Event>,
    registry: &mut BreakpointRegistry,
    result: &mut RunResult,
    program: &str,
    argv_tail: &[String],
    env: &std::collections::HashMap<String, String>,
    stdio: &StdioFiles,
) -> Result<()> {
    client.request(
        &Command::Initialize(InitializeArguments {
            adapter_id: "lldb-dap".to_string(),
            lines_start_at1: true,
            columns_start_at1: true,
        }),
        gate.remaining(),
        events,
    )?;

    registry.register_all(client, gate.remaining(), events)?;

    // `configurationDone` tells the adapter every `setBreakpoints` call has
    // been issued and it's free to let the debuggee run once launched.
    client.request(&Command::ConfigurationDone, gate.remaining(), events)?;

    let launch_args = setup::launch_arguments(program, argv_tail, env, stdio);
    match proceed(client, gate, &Command::Launch(launch_args), events)? {
        Proceed::Ok => {}
        Proceed::TimedOut => {
            result.timeout = true;
            return Ok(());
        }
    }

    loop {
        match next_stop(client, gate, events)? {
            StopOutcome::TimedOut => {
                result.timeout = true;
                return Ok(());
            }
            StopOutcome::Exited { exit_code } => {
                result.exit_code = exit_code;
                return Ok(());
            }
            StopOutcome::Stopped { thread_id, body } => match &body.reason {
                StoppedReason::Breakpoint => {
                    handle_breakpoint_stop(client, gate, events, registry, thread_id, &body);

                    match proceed(client, gate, &Command::Continue { thread_id }, events)? {
                        Proceed::Ok => continue,
                        Proceed::TimedOut => {
                            result.timeout = true;
                            return Ok(());
                        }
                    }
                }
                StoppedReason::Exception => {
                    result.signal = Some(
                        body.description
                            .clone()
                            .or_else(|| body.text.clone())
                            .unwrap_or_else(|| "unknown exception".to_string()),
                    );
                    // The debuggee has crashed; no further useful stops.
                    return Ok(());
                }
                other => {
                    log::warn!("unexpected stop reason {other:?}; continuing");
                    match proceed(client, gate, &Command::Continue { thread_id }, events)? {
                        Proceed::Ok => continue,
                        Proceed::TimedOut => {
                            result.timeout = true;
                            return Ok(());
                        }
                    }
                }
            },
        }
    }
}

/// Fetch the stopped thread's frames, record a hit for every breakpoint id
/// the stop reported, and evaluate each hit spec's declared expressions.
/// Never escalates: registration/evaluation/protocol hiccups here are
/// warnings, per §7.
fn handle_breakpoint_stop(
    client: &mut Client,
    gate: &TimeoutGate,
    events: &mut Vec<Event>,
    registry: &mut BreakpointRegistry,
    thread_id: i64,
    body: &StoppedEventBody,
) {
    let frames = match client.request(&Command::StackTrace { thread_id }, gate.remaining(), events) {
        Ok(response) if response.success => {
            match response.body_as::<crate::dap::types::StackTraceResponseBody>("stackTrace") {
                Ok(body) => body.stack_frames,
                Err(err) => {
                    log::warn!("unexpected stackTrace response: {err}");
                    Vec::new()
                }
            }
        }
        Ok(response) => {
            log::warn!("stackTrace failed: {:?}", response.message);
            Vec::new()
        }
        Err(err) => {
            log::warn!("stackTrace request failed: {err}");
            Vec::new()
        }
    };

    if frames.is_empty() {
        log::warn!("stop at breakpoint {:?} carried no frames; spurious stop", body.hit_breakpoint_ids);
        return;
    }

    let top_frame: &StackFrame = &frames[0];

    for adapter_id in &body.hit_breakpoint_ids {
        let Some((inline_expr, print_call_stack)) = registry.spec_for_adapter_id(*adapter_id) else {
            log::warn!("hit reported for unregistered breakpoint id {adapter_id}");
            continue;
        };
        let inline_expr = inline_expr.to_vec();

        let callstack = if print_call_stack { crate::backtrace::format(&frames) } else { String::new() };
        let evaluated = eval::evaluate_all(client, gate, top_frame.id, &inline_expr, events);

        let hit_info = HitInfo { callstack, inline_expr: evaluated };
        registry.on_hit(*adapter_id, Some(top_frame), hit_info, client, gate.remaining(), events);
    }
}

/// Drain `pending`, then the adapter's stream, until a `stopped` event, an
/// `exited`+`terminated` pair, or the session's budget runs out.
fn next_stop(client: &mut Client, gate: &TimeoutGate, pending: &mut Vec<Event>) -> Result<StopOutcome> {
    let mut exit_code = None;

    loop {
        let event = if !pending.is_empty() {
            Some(pending.remove(0))
        } else {
            if gate.expired() {
                return Ok(StopOutcome::TimedOut);
            }
            match client.recv_timeout(gate.remaining())? {
                Some(Sendable::Event(event)) => Some(event),
                Some(Sendable::Response(_)) | Some(Sendable::Other) => None,
                None => return Ok(StopOutcome::TimedOut),
            }
        };

        match event {
            Some(Event::Stopped(body)) => {
                let thread_id = body.thread_id.unwrap_or_default();
                return Ok(StopOutcome::Stopped { thread_id, body });
            }
            Some(Event::Exited(body)) => exit_code = Some(body.exit_code),
            Some(Event::Terminated) => return Ok(StopOutcome::Exited { exit_code }),
            Some(Event::Output(_)) | Some(Event::Initialized) | Some(Event::Continued) => {}
            Some(Event::Breakpoint(_)) | Some(Event::Other { .. }) => {}
            None => {}
        }
    }
}

/// Send `command` and wait for its acknowledgement, treating a timed-out
/// wait as `Proceed::TimedOut` rather than a fatal error — per §4.5/§7,
/// timeouts at launch/continue are session state, not exceptions.
fn proceed(client: &mut Client, gate: &TimeoutGate, command: &Command, events: &mut Vec<Event>) -> Result<Proceed> {
    if gate.expired() {
        return Ok(Proceed::TimedOut);
    }
    match client.request(command, gate.remaining(), events) {
        Ok(_) => Ok(Proceed::Ok),
        Err(Error::Timeout) => Ok(Proceed::TimedOut),
        Err(err) => Err(err),
    }
}
