//! Architectural Enforcement Integration Tests
//!
//! This package enforces a few rules over the production sources of the
//! workspace:
//! - No `unwrap()`/`expect()` outside test modules
//! - No blocking sleeps in the context layer
//! - No network I/O issued from the roster
//!
//! Production code is everything in a file before its first `#[cfg(test)]`.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// A rule violation found in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the violation
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// Offending pattern
    pub pattern: &'static str,
}

/// Root of the workspace, relative to this package
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// All `.rs` files under `dir`
pub fn rust_sources(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| e.into_path())
        .collect()
}

/// The part of `source` that is compiled outside of tests
pub fn production_part(source: &str) -> &str {
    source
        .find("#[cfg(test)]")
        .map_or(source, |idx| &source[..idx])
}

/// Find `patterns` in production code, skipping comment lines
pub fn scan(path: &Path, source: &str, patterns: &[&'static str]) -> Vec<Violation> {
    production_part(source)
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim_start().starts_with("//"))
        .flat_map(|(idx, line)| {
            patterns
                .iter()
                .filter(move |p| line.contains(**p))
                .map(move |p| Violation {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    pattern: *p,
                })
        })
        .collect()
}

/// Scan every source file under `dir`
pub fn scan_dir(dir: &Path, patterns: &[&'static str]) -> Vec<Violation> {
    rust_sources(dir)
        .into_iter()
        .filter_map(|path| {
            let source = fs::read_to_string(&path).ok()?;
            Some(scan(&path, &source, patterns))
        })
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_src() -> PathBuf {
        workspace_root().join("context/core/src")
    }

    #[test]
    fn test_production_part_stops_at_tests() {
        let source = "fn a() {}\n#[cfg(test)]\nmod tests { fn b() { x.unwrap(); } }";
        assert_eq!(production_part(source), "fn a() {}\n");
        assert!(scan(Path::new("x.rs"), source, &[".unwrap()"]).is_empty());
    }

    #[test]
    fn test_scan_reports_line_numbers() {
        let source = "fn a() {\n    // x.unwrap()\n    x.unwrap();\n}";
        let found = scan(Path::new("x.rs"), source, &[".unwrap()"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 3);
    }

    #[test]
    fn test_sources_are_found() {
        assert!(rust_sources(&context_src()).len() >= 5);
    }

    #[test]
    fn test_no_panicking_unwraps_in_production_code() {
        let violations = scan_dir(&context_src(), &[".unwrap()", ".expect("]);
        assert!(violations.is_empty(), "{violations:#?}");
    }

    #[test]
    fn test_no_blocking_sleep() {
        let violations = scan_dir(&context_src(), &["thread::sleep", "time::sleep"]);
        assert!(violations.is_empty(), "{violations:#?}");
    }

    #[test]
    fn test_roster_does_no_network_io() {
        let roster = context_src().join("roster");
        let violations = scan_dir(&roster, &["reqwest", "TcpStream", "std::net"]);
        assert!(violations.is_empty(), "{violations:#?}");
    }
}
