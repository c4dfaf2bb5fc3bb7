//! Formatting a stack-frame sequence into a stable, human-readable string.
//!
//! Grounded on `SPEC_FULL.md` §4.2; shares the "one unit per line, innermost
//! marked" shape with the teacher's doc-comment style in `src/request.rs`,
//! generalized from a doc-comment example into runtime formatting logic.

use std::fmt::Write as _;
use std::path::Path;

use crate::dap::types::StackFrame;

/// Render `frames` (innermost first) as a multi-line call-stack string. The
/// innermost frame is prefixed with `*`; frames without a source location
/// fall back to just the frame name. Returns the empty string for no
/// frames.
pub fn format(frames: &[StackFrame]) -> String {
    let mut out = String::new();

    for (index, frame) in frames.iter().enumerate() {
        let marker = if index == 0 { '*' } else { ' ' };
        let location = frame
            .source
            .as_ref()
            .and_then(|source| source.path.as_deref())
            .map(|path| basename(path));

        match location {
            Some(basename) => {
                let _ = writeln!(out, "{marker} #{index}: {} at {basename}:{}", frame.name, frame.line);
            }
            None => {
                let _ = writeln!(out, "{marker} #{index}: {}", frame.name);
            }
        }
    }

    // Drop the trailing newline the `writeln!` loop leaves behind, matching
    // the "string of lines" shape rather than a line-terminated blob.
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

fn basename(path: &str) -> &str {
    Path::new(path).file_name().and_then(|name| name.to_str()).unwrap_or(path)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dap::types::Source;

    fn frame(id: i64, name: &str, path: Option<&str>, line: i64) -> StackFrame {
        StackFrame {
            id,
            name: name.to_string(),
            source: path.map(|path| Source::for_path(path)),
            line,
        }
    }

    #[test]
    fn empty_input_yields_empty_string() {
        assert_eq!(format(&[]), "");
    }

    #[test]
    fn marks_innermost_frame() {
        let frames = vec![
            frame(0, "worker", Some("/build/src/main.c"), 12),
            frame(1, "main", Some("/build/src/main.c"), 40),
        ];
        let rendered = format(&frames);
        assert_eq!(rendered, "* #0: worker at main.c:12\n  #1: main at main.c:40");
    }

    #[test]
    fn handles_missing_source() {
        let frames = vec![frame(0, "??", None, 0)];
        assert_eq!(format(&frames), "* #0: ??");
    }
}
