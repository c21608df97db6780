//! Callmap core library - indexes TypeScript functions and answers
//! call-graph queries
//!
//! Each invocation builds a [`Session`]: the project is parsed and indexed
//! in one synchronous pass, then queries read the finished registries.

#![deny(warnings)]

// Global invariants enforced in this crate:
// - No global mutable state: every analysis owns its own Session
// - Registries are built once, then read-only
// - No randomness, clocks, threads, or async
// - Deterministic traversal order must be explicit
// - Identical input yields identical records and ids

pub mod calls;
pub mod config;
pub mod extract;
pub mod graph;
pub mod parser;
pub mod record;
pub mod registry;
pub mod report;

pub use record::{FunctionKind, FunctionRecord, Mutation, MutationKind, Parameter, TypeRecord};
pub use registry::{FunctionRegistry, PatternMatches, TypeRegistry};

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use swc_common::{sync::Lrc, SourceMap};

/// One complete analysis of a project: both registries plus the project
/// root they were built from. Constructed per invocation; queries receive
/// it as an explicit argument.
#[derive(Debug)]
pub struct Session {
    pub root: PathBuf,
    pub functions: FunctionRegistry,
    pub types: TypeRegistry,
}

impl Session {
    fn empty(root: PathBuf) -> Self {
        Session {
            root,
            functions: FunctionRegistry::new(),
            types: TypeRegistry::new(),
        }
    }

    /// Analyze the project containing `path`.
    ///
    /// Finds the nearest `tsconfig.json` walking up from `path` (the single
    /// fatal condition when absent), collects the project's TypeScript
    /// files, and indexes every one of them. Files that cannot be read or
    /// parsed are skipped with a warning.
    pub fn analyze(path: &Path) -> Result<Session> {
        let config_path = config::find_tsconfig(path)?;
        let root = config_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let filter = config::load(&config_path);

        let mut files = Vec::new();
        collect_source_files(&root, &mut files)
            .with_context(|| format!("failed to scan project at {}", root.display()))?;
        // Sort files for deterministic order
        files.sort();

        let cm: Lrc<SourceMap> = Default::default();
        let mut session = Session::empty(root.clone());
        let mut skipped = 0usize;

        for file_path in files {
            let relative = file_path
                .strip_prefix(&root)
                .unwrap_or(&file_path)
                .to_string_lossy()
                .replace('\\', "/");

            if !filter.should_include(Path::new(&relative)) {
                continue;
            }

            let src = match std::fs::read_to_string(&file_path) {
                Ok(src) => src,
                Err(e) => {
                    eprintln!("warning: skipping file {}: {}", relative, e);
                    skipped += 1;
                    continue;
                }
            };

            match parser::parse_source(&src, &cm, &relative) {
                Ok(module) => {
                    let extraction = extract::extract_file(&module, &relative, &cm);
                    session.ingest(extraction);
                }
                Err(e) => {
                    eprintln!("warning: skipping file {}: {}", relative, e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            eprintln!("Skipped {} file(s) due to read or parse errors", skipped);
        }

        Ok(session)
    }

    /// Build a session from in-memory sources: (relative path, source text)
    /// pairs. Used by tests and library embedders that already hold the
    /// file contents.
    pub fn from_sources(files: &[(&str, &str)]) -> Result<Session> {
        let cm: Lrc<SourceMap> = Default::default();
        let mut session = Session::empty(PathBuf::from("."));
        for (path, src) in files {
            let module = parser::parse_source(src, &cm, path)?;
            let extraction = extract::extract_file(&module, path, &cm);
            session.ingest(extraction);
        }
        Ok(session)
    }

    fn ingest(&mut self, extraction: extract::FileExtraction) {
        for function in extraction.functions {
            self.functions.insert(function);
        }
        for type_record in extraction.types {
            let name = type_record.name.clone();
            let file = type_record.file_path.clone();
            if let Some(displaced) = self.types.insert(type_record) {
                // Last-write-wins, but never silently
                eprintln!(
                    "warning: type '{}' in {} shadows earlier definition in {}",
                    name, file, displaced.file_path
                );
            }
        }
    }

    /// Directory path -> function ids, derived from the function registry
    pub fn modules(&self) -> BTreeMap<String, Vec<String>> {
        self.functions.modules()
    }
}

/// Check if a file is an analyzable TypeScript source file
fn is_supported_source_file(filename: &str) -> bool {
    // TypeScript files (.ts, .mts, .cts) but not declaration files (.d.ts)
    let is_ts = (filename.ends_with(".ts")
        || filename.ends_with(".mts")
        || filename.ends_with(".cts"))
        && !filename.ends_with(".d.ts");

    // TSX files
    let is_tsx = filename.ends_with(".tsx");

    is_ts || is_tsx
}

/// Recursively collect TypeScript files from a directory
fn collect_source_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    use std::ffi::OsStr;

    for entry_result in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry: std::fs::DirEntry = entry_result?;
        let path = entry.path();

        if path.is_dir() {
            // Skip node_modules and other common non-source directories
            if let Some(name) = path.file_name().and_then(|n: &OsStr| n.to_str()) {
                if name == "node_modules" || name.starts_with('.') {
                    continue;
                }
            }
            collect_source_files(&path, files)?;
        } else if path.is_file() {
            if let Some(filename) = path.file_name().and_then(|n: &OsStr| n.to_str()) {
                if is_supported_source_file(filename) {
                    files.push(path);
                }
            }
        }
    }

    Ok(())
}
