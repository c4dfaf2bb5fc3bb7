//! A blocking DAP client driving a debug adapter over its stdio pipes.
//!
//! Grounded on the teacher's `Adapter::single_session_mode` (`src/adapter.rs`),
//! which spawns a background thread to turn a blocking reader into an
//! `mpsc` channel, generalized from "read this process's own stdin" to "read
//! a child adapter process's stdout", and on `ark_test::DapClient`
//! (`posit-dev-ark/crates/ark_test/src/dap_client.rs`) for the
//! request/response/event bookkeeping (`seq` counter, `recv_timeout`-style
//! deadline handling, draining pending events before a response is
//! expected).

use std::io::{BufReader, BufWriter, Write};
use std::process::{Child, ChildStdin, Command as ProcessCommand, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::dap::message::{self, Sendable};
use crate::dap::requests::{Command, RequestEnvelope, Response};
use crate::error::{Error, Result};
use crate::header::Header;

/// A running debug adapter process, speaking DAP over its stdio.
pub struct Client {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    inbox: Receiver<Result<Sendable>>,
    next_seq: i64,
}

impl Client {
    /// Spawn `program` with `args` and wire up its stdio. The adapter's
    /// stderr is inherited so adapter-side diagnostics reach the caller's
    /// own stderr rather than being silently dropped.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let mut child = ProcessCommand::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| Error::AdapterSpawn { program: program.to_string(), source })?;

        let stdout = child.stdout.take().expect("stdout was piped");
        let stdin = child.stdin.take().expect("stdin was piped");

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut reader = BufReader::new(stdout);
            loop {
                match message::read_from(&mut reader) {
                    Ok(sendable) => {
                        if tx.send(Ok(sendable)).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        let _ = tx.send(Err(err));
                        break;
                    }
                }
            }
        });

        Ok(Client { child, stdin: BufWriter::new(stdin), inbox: rx, next_seq: 1 })
    }

    /// Send `command` to the adapter and return the `seq` it was sent under.
    pub fn send(&mut self, command: &Command) -> Result<i64> {
        let seq = self.next_seq;
        self.next_seq += 1;

        let envelope = RequestEnvelope::new(seq, command);
        let body = serde_json::to_vec(&envelope)?;
        let header = Header::render(body.len());

        self.stdin.write_all(header.as_bytes())?;
        self.stdin.write_all(&body)?;
        self.stdin.flush()?;

        Ok(seq)
    }

    /// Block until a message arrives or `deadline` elapses, whichever is
    /// first. Never blocks past `deadline`, matching the Timeout Gate's
    /// requirement that no single read can stall a run indefinitely.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<Sendable>> {
        match self.inbox.recv_timeout(timeout) {
            Ok(Ok(sendable)) => Ok(Some(sendable)),
            Ok(Err(err)) => Err(err),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::AdapterClosed),
        }
    }

    /// Send `command` and wait (subject to `timeout`) for the response whose
    /// `request_seq` matches, silently forwarding any events seen in the
    /// meantime onto `events`.
    pub fn request(
        &mut self,
        command: &Command,
        timeout: Duration,
        events: &mut Vec<crate::dap::events::Event>,
    ) -> Result<Response> {
        let deadline = std::time::Instant::now() + timeout;
        let seq = self.send(command)?;

        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout);
            }

            match self.recv_timeout(remaining)? {
                Some(Sendable::Response(response)) if response.request_seq == seq => {
                    return Ok(response);
                }
                Some(Sendable::Response(_)) | Some(Sendable::Other) => continue,
                Some(Sendable::Event(event)) => events.push(event),
                None => return Err(Error::Timeout),
            }
        }
    }

    /// Tear down the child process. Idempotent: killing an already-exited
    /// child is not an error.
    pub fn kill(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.kill();
    }
}
