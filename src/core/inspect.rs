//! Text inspection helpers for `cargo tree` output, manifests, grep output and
//! generated answers. Nothing here performs IO.

use crate::utils::error::{VerifyError, Result};
use std::collections::BTreeSet;

const DEPENDENCY_TABLES: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

/// Replies known to come from mock engines or leftover ONNX test paths, lowercase.
const CANNED_PHRASES: [&str; 6] = [
    "good team meeting requires",
    "task requires careful planning",
    "this is a generated response from",
    "onnx runtime working",
    "inference attempted",
    "single inference pass",
];

/// Single words that only count when they stand alone ("stub", not "stubborn").
const CANNED_WORDS: [&str; 2] = ["placeholder", "stub"];

/// Crate name on one line of `cargo tree` output.
///
/// Accepts the default glyph style, `--charset ascii` and `--prefix depth`. Section
/// headers such as `[build-dependencies]` and blank lines yield `None`.
pub fn crate_name(line: &str) -> Option<&str> {
    let trimmed = line.trim_start_matches(|c: char| {
        matches!(c, '│' | '├' | '└' | '─' | '|' | '`' | '-' | ' ' | '\t') || c.is_ascii_digit()
    });

    let mut parts = trimmed.split_whitespace();
    let name = parts.next()?;
    let version = parts.next()?;
    if name.starts_with('[') || !version.starts_with('v') {
        return None;
    }
    Some(name)
}

/// Every crate entry of a `cargo tree` listing, repeats included.
pub fn crate_names(tree: &str) -> impl Iterator<Item = &str> {
    tree.lines().filter_map(crate_name)
}

/// Direct dependency names declared in a `Cargo.toml`, sorted and deduplicated.
///
/// Renamed dependencies (`foo = { package = "bar" }`) are reported under the real
/// package name.
pub fn manifest_dependencies(content: &str) -> Result<Vec<String>> {
    let manifest: toml::Table = toml::from_str(content).map_err(|e| VerifyError::ConfigError {
        message: format!("cannot parse Cargo.toml: {}", e),
    })?;

    let mut names = BTreeSet::new();
    collect_tables(&manifest, &mut names);

    if let Some(targets) = manifest.get("target").and_then(|t| t.as_table()) {
        for target in targets.values().filter_map(|t| t.as_table()) {
            collect_tables(target, &mut names);
        }
    }

    if let Some(workspace) = manifest.get("workspace").and_then(|w| w.as_table()) {
        collect_tables(workspace, &mut names);
    }

    Ok(names.into_iter().collect())
}

fn collect_tables(table: &toml::Table, names: &mut BTreeSet<String>) {
    for key in DEPENDENCY_TABLES {
        let Some(deps) = table.get(key).and_then(|d| d.as_table()) else {
            continue;
        };
        for (name, spec) in deps {
            let package = spec
                .get("package")
                .and_then(|p| p.as_str())
                .unwrap_or(name);
            names.insert(package.to_string());
        }
    }
}

/// What a recursive grep over the source tree turned up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendIndicators {
    pub onnx_tests: bool,
    pub ollama: bool,
    pub onnx: bool,
    pub matching_lines: usize,
    pub matching_files: usize,
}

impl BackendIndicators {
    /// Reads `grep -r` output (`path:line` per match).
    pub fn scan(grep_output: &str) -> Self {
        let lower = grep_output.to_lowercase();
        let lines: Vec<&str> = grep_output.lines().filter(|l| !l.trim().is_empty()).collect();
        let files: BTreeSet<&str> = lines
            .iter()
            .filter_map(|l| l.split_once(':').map(|(path, _)| path))
            .collect();

        Self {
            onnx_tests: lower.contains("test_onnx"),
            ollama: lower.contains("ollama"),
            onnx: lower.contains("onnx"),
            matching_lines: lines.len(),
            matching_files: files.len(),
        }
    }
}

/// The canned phrase found in `text`, if any.
pub fn canned_reply(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    if let Some(phrase) = CANNED_PHRASES.iter().copied().find(|p| lower.contains(p)) {
        return Some(phrase);
    }

    let words: BTreeSet<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    CANNED_WORDS.iter().copied().find(|w| words.contains(w))
}
