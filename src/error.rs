use std::io;

use thiserror::Error;

/// Errors that can escape [`crate::run`].
///
/// Per-spec and per-expression failures are never represented here: they are
/// folded into the returned report (see `crate::registry` and `crate::eval`).
/// Only failures that leave the orchestrator unable to drive a session at all
/// surface as `Error`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed DAP message")]
    BadMessage,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("no debug adapter found on PATH (tried: {tried:?})")]
    AdapterNotFound { tried: Vec<String> },

    #[error("failed to spawn debug adapter {program}: {source}")]
    AdapterSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("debug adapter closed its output stream unexpectedly")]
    AdapterClosed,

    #[error("unexpected response to {command}: {detail}")]
    Protocol { command: &'static str, detail: String },

    /// A single suspension point (launch, continue, evaluate, ...) outran
    /// the session's wall-clock budget. Callers never see this variant:
    /// `crate::orchestrator` catches it at every suspension point and folds
    /// it into `RunResult::timeout` instead of propagating it, per
    /// `SPEC_FULL.md` §4.5/§7 ("timeouts are not errors").
    #[error("suspension point timed out")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, Error>;
