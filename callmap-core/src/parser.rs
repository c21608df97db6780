//! TypeScript parser using SWC
//!
//! Global invariants enforced:
//! - Deterministic parsing order
//! - Formatting, comments, and whitespace must not affect results

use anyhow::Result;
use swc_common::{sync::Lrc, FileName, SourceFile, SourceMap};
use swc_ecma_ast::{EsVersion, Module};
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax};

/// Determine the appropriate syntax configuration based on file extension
fn syntax_for_file(filename: &str) -> Syntax {
    let is_tsx = filename.ends_with(".tsx") || filename.ends_with(".mtsx") || filename.ends_with(".ctsx");
    let is_dts = filename.ends_with(".d.ts");
    Syntax::Typescript(swc_ecma_parser::TsSyntax {
        tsx: is_tsx,
        decorators: false, // No experimental decorators
        dts: is_dts,       // Enable dts mode only for .d.ts files
        ..Default::default()
    })
}

/// Parse TypeScript or TSX source code into an AST module
///
/// Supported file types:
/// - `.ts`, `.mts`, `.cts` - TypeScript
/// - `.tsx`, `.mtsx`, `.ctsx` - TypeScript with JSX
///
/// Returns an error if parse errors occur. Callers treat a per-file parse
/// error as a skip-with-warning, never as a fatal condition.
pub fn parse_source(src: &str, source_map: &Lrc<SourceMap>, filename: &str) -> Result<Module> {
    // Determine syntax based on file extension
    let syntax = syntax_for_file(filename);

    // Create SourceFile for the source code
    let source_file: Lrc<SourceFile> = source_map.new_source_file(
        FileName::Custom(filename.into()).into(),
        src.to_string(),
    );

    // Create StringInput from SourceFile
    let input = StringInput::from(&*source_file);

    // Create lexer with detected syntax
    let lexer = Lexer::new(syntax, EsVersion::Es2022, input, None);

    // Create parser
    let mut parser = Parser::new_from(lexer);

    // Parse module
    parser.parse_module().map_err(|e| {
        let error_msg = e.kind().msg();
        anyhow::anyhow!("Parse error: {}", error_msg)
            .context(format!("Failed to parse source file: {}", filename))
    })
}
