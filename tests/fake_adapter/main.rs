//! A scripted, standalone fake debug adapter speaking DAP 1.x over stdio.
//!
//! Used only by `tests/orchestrator.rs` so the orchestrator's stop-loop,
//! registry bookkeeping, and evaluation classification are verifiable
//! without a real `lldb-dap` on the test host (`SPEC_FULL.md` §8, "Test
//! tooling"). The script to play is taken from the basename of the
//! `program` the `launch` request names, so parallel `cargo test` threads
//! never share mutable process state (an env var would race across
//! threads in the same test binary).
//!
//! This mirrors the role `ark_test::DapClient` plays from the client side,
//! but from the adapter side.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read, Write};

use serde_json::{json, Value};

fn main() {
    let mut script = "basic_loop".to_string();
    let stdin = io::stdin();
    let mut input = BufReader::new(stdin.lock());
    let stdout = io::stdout();
    let mut output = stdout.lock();

    let mut breakpoint_ids: HashMap<i64, i64> = HashMap::new();
    let mut line_order: Vec<i64> = Vec::new();
    let mut next_id: i64 = 1;
    let mut stop_count: u32 = 0;
    // For "stdin_consume": the loop bound read back from the debuggee's
    // staged stdin file, proving `run`'s `stdin` argument actually reached
    // the launched session rather than just the temp file that stages it.
    let mut stdin_n: u32 = 0;

    loop {
        let message = match read_message(&mut input) {
            Some(message) => message,
            None => break,
        };

        if message.get("type").and_then(Value::as_str) != Some("request") {
            continue;
        }

        let seq = message.get("seq").and_then(Value::as_i64).unwrap_or(0);
        let command = message.get("command").and_then(Value::as_str).unwrap_or("").to_string();
        let arguments = message.get("arguments").cloned().unwrap_or(Value::Null);

        match command.as_str() {
            "initialize" => write_response(&mut output, seq, "initialize", true, Some(json!({}))),
            "setBreakpoints" => {
                let lines: Vec<i64> = arguments
                    .get("lines")
                    .and_then(Value::as_array)
                    .map(|lines| lines.iter().filter_map(Value::as_i64).collect())
                    .unwrap_or_default();

                let breakpoints: Vec<Value> = lines
                    .iter()
                    .map(|line| {
                        if !breakpoint_ids.contains_key(line) {
                            line_order.push(*line);
                            breakpoint_ids.insert(*line, next_id);
                            next_id += 1;
                        }
                        let id = breakpoint_ids[line];
                        json!({ "id": id, "verified": true, "line": line })
                    })
                    .collect();

                write_response(
                    &mut output,
                    seq,
                    "setBreakpoints",
                    true,
                    Some(json!({ "breakpoints": breakpoints })),
                );
            }
            "configurationDone" => write_response(&mut output, seq, "configurationDone", true, None),
            "launch" => {
                script = arguments
                    .get("program")
                    .and_then(Value::as_str)
                    .and_then(|program| program.rsplit('/').next())
                    .unwrap_or("basic_loop")
                    .to_string();

                stdin_n = stage_stdio(&arguments, &script);
                write_response(&mut output, seq, "launch", true, None);
                drive(&mut output, &script, &mut stop_count, &breakpoint_ids, &line_order, stdin_n);
            }
            "continue" => {
                write_response(&mut output, seq, "continue", true, None);
                drive(&mut output, &script, &mut stop_count, &breakpoint_ids, &line_order, stdin_n);
            }
            "stackTrace" => {
                let frames = json!([
                    { "id": 1, "name": "worker", "source": { "path": "/tmp/fixture.c" }, "line": 10 },
                    { "id": 2, "name": "main", "source": { "path": "/tmp/fixture.c" }, "line": 30 },
                ]);
                write_response(&mut output, seq, "stackTrace", true, Some(json!({ "stackFrames": frames })));
            }
            "evaluate" => {
                let expr = arguments.get("expression").and_then(Value::as_str).unwrap_or("");
                let value = evaluate(&script, expr, stop_count);
                write_response(
                    &mut output,
                    seq,
                    "evaluate",
                    true,
                    Some(json!({ "result": value, "variablesReference": 0 })),
                );
            }
            "terminate" => {
                write_response(&mut output, seq, "terminate", true, None);
                break;
            }
            other => write_response(&mut output, seq, other, true, None),
        }
    }
}

/// Emit the next scripted stop, exit, or nothing (to let a caller's
/// deadline expire), advancing `stop_count` as it goes.
fn drive(
    output: &mut impl Write,
    script: &str,
    stop_count: &mut u32,
    breakpoint_ids: &HashMap<i64, i64>,
    line_order: &[i64],
    stdin_n: u32,
) {
    match script {
        "stdin_consume" => {
            if *stop_count < stdin_n {
                *stop_count += 1;
                let id = breakpoint_ids.get(&line_order[0]).copied().unwrap_or(1);
                stopped(output, id);
            } else {
                exited(output, 0);
            }
        }
        "basic_loop" => {
            if *stop_count < 5 {
                *stop_count += 1;
                let id = breakpoint_ids.get(&line_order[0]).copied().unwrap_or(1);
                stopped(output, id);
            } else {
                exited(output, 0);
            }
        }
        "two_specs" => {
            if *stop_count < 10 {
                *stop_count += 1;
                let id = if *stop_count % 2 == 1 {
                    breakpoint_ids[&line_order[0]]
                } else {
                    breakpoint_ids[&line_order[1]]
                };
                stopped(output, id);
            } else {
                exited(output, 0);
            }
        }
        "exit_nonzero" => exited(output, 1),
        "exception" => {
            if *stop_count == 0 {
                *stop_count += 1;
                write_event(
                    output,
                    "stopped",
                    Some(json!({
                        "reason": "exception",
                        "threadId": 1,
                        "description": "EXC_BAD_ACCESS (SIGSEGV)",
                    })),
                );
            }
        }
        "continue_spin" => {
            if *stop_count == 0 {
                *stop_count += 1;
                let id = breakpoint_ids.get(&line_order[0]).copied().unwrap_or(1);
                stopped(output, id);
            }
            // Second drive (after the first continue): emit nothing, so the
            // caller's deadline runs out waiting for the next stop.
        }
        // "spin": never emit anything, on launch or on continue.
        _ => {}
    }
}

fn stopped(output: &mut impl Write, breakpoint_id: i64) {
    write_event(
        output,
        "stopped",
        Some(json!({
            "reason": "breakpoint",
            "threadId": 1,
            "hitBreakpointIds": [breakpoint_id],
        })),
    );
}

fn exited(output: &mut impl Write, exit_code: i64) {
    write_event(output, "exited", Some(json!({ "exitCode": exit_code })));
    write_event(output, "terminated", None);
}

/// Canned expression values for each script, keyed by the 1-based hit count
/// at the moment the expression is evaluated (i.e. after `drive` has already
/// recorded the stop that triggered this evaluation).
fn evaluate(script: &str, expr: &str, stop_count: u32) -> String {
    match script {
        "stdin_consume" => {
            // i = 1..n at each hit; acc holds the product of 1..i-1 going
            // into the hit (n is fixed at 4 by the scenario this mirrors).
            let idx = stop_count.max(1) as usize;
            match expr {
                "i" => idx.to_string(),
                "acc" => [1, 1, 2, 6][(idx - 1).min(3)].to_string(),
                _ => "0".to_string(),
            }
        }
        "basic_loop" => {
            let idx = stop_count.saturating_sub(1) as usize;
            match expr {
                "i" => idx.to_string(),
                "sum" => [0, 0, 1, 3, 6][idx.min(4)].to_string(),
                _ => "0".to_string(),
            }
        }
        "two_specs" => {
            let overall = stop_count.max(1);
            let iter_idx = ((overall - 1) / 2) as usize;
            let is_a = overall % 2 == 1;
            match expr {
                "i" => iter_idx.to_string(),
                "sum" => {
                    let at_a = [0, 1, 3, 6, 10];
                    let at_b = [0, 2, 5, 9, 14];
                    if is_a { at_a[iter_idx.min(4)] } else { at_b[iter_idx.min(4)] }.to_string()
                }
                _ => "0".to_string(),
            }
        }
        "continue_spin" => match expr {
            "x" => "0".to_string(),
            _ => "0".to_string(),
        },
        _ => "0".to_string(),
    }
}

/// Write the debuggee's simulated stdio, found via the `launch` request's
/// `initCommands` (the same `settings set target.*-path` strings
/// `crate::setup::launch_arguments` emits). Returns the integer `stdin`
/// consumed from the staged input file, for scripts that loop on it
/// (`stdin_consume`); other scripts ignore the return value.
fn stage_stdio(launch_args: &Value, script: &str) -> u32 {
    let init_commands = launch_args.get("initCommands").and_then(Value::as_array).cloned().unwrap_or_default();

    let mut input_path = None;
    let mut output_path = None;
    let mut error_path = None;
    for command in init_commands {
        let Some(command) = command.as_str() else { continue };
        if let Some(path) = command.strip_prefix("settings set target.input-path ") {
            input_path = Some(path.to_string());
        } else if let Some(path) = command.strip_prefix("settings set target.output-path ") {
            output_path = Some(path.to_string());
        } else if let Some(path) = command.strip_prefix("settings set target.error-path ") {
            error_path = Some(path.to_string());
        }
    }

    if matches!(script, "basic_loop" | "two_specs") {
        if let Some(path) = error_path {
            let _ = std::fs::write(path, b"sum=10\n");
        }
        return 0;
    }

    if script == "stdin_consume" {
        let n = input_path
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|contents| contents.trim().parse::<u32>().ok())
            .unwrap_or(0);
        if let Some(path) = output_path {
            let _ = std::fs::write(path, b"acc=24\n");
        }
        return n;
    }

    0
}

fn read_message<R: BufRead>(input: &mut R) -> Option<Value> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        if input.read_line(&mut line).ok()? == 0 {
            return None;
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if let Some(value) = trimmed.strip_prefix("Content-Length:") {
            content_length = value.trim().parse().ok();
        }
    }

    let len = content_length?;
    let mut buffer = vec![0u8; len];
    input.read_exact(&mut buffer).ok()?;
    serde_json::from_slice(&buffer).ok()
}

fn write_message(output: &mut impl Write, value: &Value) {
    let body = serde_json::to_vec(value).expect("DAP message is valid JSON");
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    output.write_all(header.as_bytes()).expect("stdout is writable");
    output.write_all(&body).expect("stdout is writable");
    output.flush().expect("stdout is writable");
}

fn write_response(output: &mut impl Write, request_seq: i64, command: &str, success: bool, body: Option<Value>) {
    let mut message = json!({
        "seq": request_seq + 10_000,
        "type": "response",
        "request_seq": request_seq,
        "success": success,
        "command": command,
    });
    if let Some(body) = body {
        message["body"] = body;
    }
    write_message(output, &message);
}

fn write_event(output: &mut impl Write, event: &str, body: Option<Value>) {
    let mut message = json!({ "seq": 0, "type": "event", "event": event });
    if let Some(body) = body {
        message["body"] = body;
    }
    write_message(output, &message);
}
