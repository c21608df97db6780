//! Project configuration discovery
//!
//! Analysis is anchored to a `tsconfig.json`, found by walking parent
//! directories from the target path up to the filesystem root. Not finding
//! one is the single fatal condition of the whole tool.
//!
//! The file's `include`/`exclude` arrays are honored best-effort: a tsconfig
//! that cannot be read or parsed (comments, trailing commas) falls back to
//! defaults without failing, and individual invalid glob patterns are
//! skipped.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default exclude patterns applied in addition to the tsconfig's own
const DEFAULT_EXCLUDES: &[&str] = &[
    "**/node_modules/**",
    "**/dist/**",
    "**/build/**",
];

/// The subset of tsconfig.json this tool reads
#[derive(Debug, Clone, Default, Deserialize)]
struct TsConfigFile {
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

/// Compiled include/exclude filter for source files
#[derive(Debug)]
pub struct ProjectConfig {
    /// Compiled include patterns; `None` means include everything
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl ProjectConfig {
    /// Whether a project-root-relative path should be analyzed
    pub fn should_include(&self, relative: &Path) -> bool {
        if self.exclude.is_match(relative) {
            return false;
        }
        match &self.include {
            Some(include) => include.is_match(relative),
            None => true,
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            include: None,
            exclude: build_globset(DEFAULT_EXCLUDES.iter().map(|s| s.to_string())),
        }
    }
}

/// Locate the project configuration by walking parent directories.
///
/// Returns the path of the nearest `tsconfig.json`, or the distinct
/// "no project configuration found" error when the walk reaches the
/// filesystem root without one.
pub fn find_tsconfig(start: &Path) -> Result<PathBuf> {
    let mut current = if start.is_file() {
        start
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        start.to_path_buf()
    };

    loop {
        let candidate = current.join("tsconfig.json");
        if candidate.is_file() {
            return Ok(candidate);
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => bail!(
                "no project configuration found: no tsconfig.json from {} up to the filesystem root",
                start.display()
            ),
        }
    }
}

/// Load the include/exclude filter from a tsconfig path, best-effort.
///
/// Read or parse failures fall back to the default filter with a warning;
/// analysis proceeds either way.
pub fn load(config_path: &Path) -> ProjectConfig {
    let raw = match std::fs::read_to_string(config_path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!(
                "warning: could not read {}: {}; using default file filter",
                config_path.display(),
                e
            );
            return ProjectConfig::default();
        }
    };

    let parsed: TsConfigFile = match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(_) => {
            // tsconfig.json commonly carries comments serde_json rejects
            return ProjectConfig::default();
        }
    };

    let include = if parsed.include.is_empty() {
        None
    } else {
        Some(build_globset(
            parsed.include.into_iter().map(normalize_tsconfig_glob),
        ))
    };

    let exclude = build_globset(
        parsed
            .exclude
            .into_iter()
            .map(normalize_tsconfig_glob)
            .chain(DEFAULT_EXCLUDES.iter().map(|s| s.to_string())),
    );

    ProjectConfig { include, exclude }
}

/// tsconfig patterns may name bare directories (`"src"`); treat those as
/// recursive matches
fn normalize_tsconfig_glob(pattern: String) -> String {
    if pattern.contains('*') || pattern.contains('.') {
        pattern
    } else {
        format!("{}/**", pattern.trim_end_matches('/'))
    }
}

fn build_globset(patterns: impl Iterator<Item = String>) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(&pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(_) => {
                eprintln!("warning: skipping invalid glob pattern: {}", pattern);
            }
        }
    }
    builder.build().unwrap_or_else(|_| {
        GlobSetBuilder::new()
            .build()
            .expect("empty glob set always builds")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_tsconfig_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("tsconfig.json"), "{}").unwrap();
        let nested = root.join("src/deep");
        fs::create_dir_all(&nested).unwrap();

        let found = find_tsconfig(&nested).unwrap();
        assert_eq!(found, root.join("tsconfig.json"));
    }

    #[test]
    fn test_find_tsconfig_missing_is_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = find_tsconfig(dir.path());
        assert!(result.is_err());
        let message = format!("{}", result.unwrap_err());
        assert!(message.contains("no project configuration found"));
    }

    #[test]
    fn test_default_filter_excludes_node_modules() {
        let config = ProjectConfig::default();
        assert!(!config.should_include(Path::new("node_modules/lib/index.ts")));
        assert!(config.should_include(Path::new("src/app.ts")));
    }

    #[test]
    fn test_include_patterns_scope_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsconfig.json");
        fs::write(&path, r#"{ "include": ["src"], "exclude": ["src/legacy"] }"#).unwrap();

        let config = load(&path);
        assert!(config.should_include(Path::new("src/app.ts")));
        assert!(!config.should_include(Path::new("scripts/tool.ts")));
        assert!(!config.should_include(Path::new("src/legacy/old.ts")));
    }

    #[test]
    fn test_malformed_tsconfig_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsconfig.json");
        fs::write(&path, "{ // comment\n \"include\": [\"src\"], }").unwrap();

        let config = load(&path);
        assert!(config.should_include(Path::new("anything/goes.ts")));
        assert!(!config.should_include(Path::new("node_modules/x.ts")));
    }
}
