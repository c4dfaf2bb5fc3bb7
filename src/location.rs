//! Resolving `"file:line"` breakpoint specs into absolute source paths.
//!
//! Grounded on the resolution order in `SPEC_FULL.md` §4.1; the file-search
//! fallback chain mirrors `harp::command`'s (`posit-dev-ark/crates/harp/src/
//! command.rs`) pattern of trying several candidate locations before giving
//! up, generalized from "search for a binary" to "search for a source file".

use std::path::{Path, PathBuf};

/// A `"file:line"` spec resolved to an absolute path, or left unresolved.
#[derive(Debug, Clone)]
pub struct ResolvedLocation {
    pub path: Option<PathBuf>,
    pub line: i64,
}

/// Parse the `line` suffix after the final `:` in a raw `"file:line"` spec.
/// Returns `None` if there is no `:`, or the suffix isn't a positive integer.
fn split_location(raw: &str) -> Option<(&str, i64)> {
    let (file, line) = raw.rsplit_once(':')?;
    let line: i64 = line.parse().ok()?;
    if line <= 0 {
        return None;
    }
    Some((file, line))
}

/// Resolve one `"file:line"` spec against the configured repo root and
/// source map, per the three-step order in `SPEC_FULL.md` §4.1. A spec
/// whose line suffix doesn't parse returns `None` entirely (the caller logs
/// and skips it). Otherwise a path is always produced: if none of the three
/// steps match, the spec's original file part is kept as-is and handed to
/// the adapter unchanged — per §4.1, "on no match, spec is left with its
/// original location and will likely fail registration" at the adapter, not
/// locally.
pub fn resolve(raw: &str, repo_root: Option<&Path>, source_map: &[PathBuf]) -> Option<ResolvedLocation> {
    let (file, line) = split_location(raw)?;
    let file = Path::new(file);

    if file.is_absolute() && file.exists() {
        return Some(ResolvedLocation { path: Some(file.to_path_buf()), line });
    }

    if let Some(repo_root) = repo_root {
        let candidate = repo_root.join(file);
        if candidate.exists() {
            return Some(ResolvedLocation { path: Some(candidate), line });
        }
    }

    if let Some(basename) = file.file_name() {
        if let Some(matched) = source_map.iter().find(|entry| entry.file_name() == Some(basename)) {
            return Some(ResolvedLocation { path: Some(matched.clone()), line });
        }
    }

    Some(ResolvedLocation { path: Some(file.to_path_buf()), line })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_missing_colon() {
        assert!(split_location("main.c").is_none());
    }

    #[test]
    fn rejects_non_positive_line() {
        assert!(split_location("main.c:0").is_none());
        assert!(split_location("main.c:-1").is_none());
    }

    #[test]
    fn parses_valid_location() {
        assert_eq!(split_location("main.c:42"), Some(("main.c", 42)));
    }

    #[test]
    fn falls_back_to_source_map_by_basename() {
        let source_map = vec![PathBuf::from("/build/src/main.c")];
        let resolved = resolve("main.c:10", None, &source_map).unwrap();
        assert_eq!(resolved.path, Some(PathBuf::from("/build/src/main.c")));
        assert_eq!(resolved.line, 10);
    }

    #[test]
    fn falls_back_to_original_file_when_nothing_matches() {
        let resolved = resolve("missing.c:10", None, &[]).unwrap();
        assert_eq!(resolved.path, Some(PathBuf::from("missing.c")));
    }

    #[test]
    fn unparseable_location_resolves_to_none() {
        assert!(resolve("no-colon-here", None, &[]).is_none());
    }
}
