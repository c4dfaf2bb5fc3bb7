//! Adapter discovery and launch-argument assembly.
//!
//! Discovery is grounded on `original_source/tests/__init__.py`'s
//! `_which_lldb_adapter()` (search `PATH` for `lldb-dap`, then the renamed
//! predecessor `lldb-vscode`), generalized here into a reusable search over
//! every `PATH` entry rather than the test scaffolding's single check.
//! Stdio staging is grounded on `SPEC_FULL.md` §5's requirement that the
//! three temp files survive past the child's exit: `crate::orchestrator`
//! holds the owning `StdioFiles` for the whole session and reads them back
//! before it drops, so `tempfile::NamedTempFile`'s own `Drop` unlinks them
//! only after their contents have been collected.

use std::env;
use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

const ADAPTER_CANDIDATES: [&str; 2] = ["lldb-dap", "lldb-vscode"];

/// Search `PATH` for a usable debug adapter binary, preferring `lldb-dap`
/// over the older `lldb-vscode` name.
pub fn discover_adapter() -> Result<PathBuf> {
    let path_var = env::var_os("PATH").unwrap_or_default();
    let mut tried = Vec::new();

    for candidate in ADAPTER_CANDIDATES {
        for dir in env::split_paths(&path_var) {
            let full = dir.join(candidate);
            tried.push(full.to_string_lossy().into_owned());
            if full.is_file() {
                return Ok(full);
            }
        }
    }

    Err(Error::AdapterNotFound { tried })
}

/// Three temporary files staged to collect the debuggee's stdio, and
/// (optionally) feed its stdin.
pub struct StdioFiles {
    pub stdout: NamedTempFile,
    pub stderr: NamedTempFile,
    pub stdin: NamedTempFile,
}

impl StdioFiles {
    /// Create the three temp files, writing `stdin_data` (if any) into the
    /// stdin file up front so the debuggee can read it once launched.
    pub fn stage(stdin_data: Option<&[u8]>) -> Result<Self> {
        use std::io::Write;

        let stdout = NamedTempFile::new()?;
        let stderr = NamedTempFile::new()?;
        let mut stdin = NamedTempFile::new()?;

        if let Some(data) = stdin_data {
            stdin.write_all(data)?;
            stdin.flush()?;
        }

        Ok(StdioFiles { stdout, stderr, stdin })
    }
}

/// Build the `launch` request arguments: program, argv tail, the filtered
/// string-valued environment, and `initCommands` redirecting the
/// debuggee's streams to the staged temp files.
pub fn launch_arguments(
    program: &str,
    args: &[String],
    env_vars: &std::collections::HashMap<String, String>,
    stdio: &StdioFiles,
) -> serde_json::Value {
    let env_list: Vec<String> = env_vars.iter().map(|(key, value)| format!("{key}={value}")).collect();

    let init_commands = vec![
        format!("settings set target.input-path {}", stdio.stdin.path().display()),
        format!("settings set target.output-path {}", stdio.stdout.path().display()),
        format!("settings set target.error-path {}", stdio.stderr.path().display()),
    ];

    json!({
        "type": "lldb",
        "request": "launch",
        "program": program,
        "args": args,
        "env": env_list,
        "stopOnEntry": false,
        "initCommands": init_commands,
    })
}

/// Filter the caller-supplied extra environment and the process environment
/// down to string-valued entries, caller entries taking precedence, and
/// prepend the adapter's own directory to `PATH` so it can locate companion
/// tools.
pub fn build_environment(
    adapter_path: &Path,
    extra_env: &std::collections::HashMap<String, String>,
) -> std::collections::HashMap<String, String> {
    let mut merged: std::collections::HashMap<String, String> =
        env::vars().collect::<std::collections::HashMap<_, _>>();

    for (key, value) in extra_env {
        merged.insert(key.clone(), value.clone());
    }

    if let Some(adapter_dir) = adapter_path.parent() {
        let existing = merged.get("PATH").cloned().unwrap_or_default();
        let joined = if existing.is_empty() {
            adapter_dir.to_string_lossy().into_owned()
        } else {
            format!("{}:{existing}", adapter_dir.to_string_lossy())
        };
        merged.insert("PATH".to_string(), joined);
    }

    merged
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn build_environment_prepends_adapter_dir_to_path() {
        let mut extra = std::collections::HashMap::new();
        extra.insert("FOO".to_string(), "bar".to_string());

        let merged = build_environment(Path::new("/opt/lldb/bin/lldb-dap"), &extra);

        assert_eq!(merged.get("FOO"), Some(&"bar".to_string()));
        assert!(merged.get("PATH").unwrap().starts_with("/opt/lldb/bin"));
    }

    #[test]
    fn stage_writes_stdin_payload() {
        let stdio = StdioFiles::stage(Some(b"4\n")).unwrap();
        let contents = std::fs::read(stdio.stdin.path()).unwrap();
        assert_eq!(contents, b"4\n");
    }
}
