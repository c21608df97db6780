//! Command-line interface for callmap
//!
//! Thin shell over `callmap-core`: every subcommand builds one analysis
//! session, runs a single query against it, and prints the result. Only a
//! failure to start analysis (no tsconfig.json) exits non-zero; lookup
//! misses print a negative result and exit cleanly.

#![deny(warnings)]

use anyhow::Result;
use callmap_core::graph::GraphFormat;
use callmap_core::report::{self, AiScope};
use callmap_core::Session;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "callmap",
    about = "Index a TypeScript project's functions and query its call graph",
    version
)]
struct Cli {
    /// Path inside the project to analyze
    #[arg(long, global = true, default_value = ".")]
    path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every discovered function
    List,
    /// Search function names by regex (falls back to substring matching)
    Find {
        pattern: String,
    },
    /// Show full details for a function
    Info {
        name: String,
    },
    /// Show the project-internal functions a function calls
    Deps {
        name: String,
    },
    /// Show the functions that call a function
    Callers {
        name: String,
    },
    /// Show a type, interface, or enum declaration
    Type {
        name: String,
    },
    /// Trace project-internal calls from a function
    Flow {
        name: String,
        /// Maximum call depth to expand
        #[arg(long, default_value_t = 3)]
        depth: usize,
    },
    /// Render the call graph, whole or scoped to one function
    Graph {
        name: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Show functions grouped by directory
    Tree,
    /// Show aggregate project statistics
    Stats,
    /// Find connected groups in the call graph
    Analyze,
    /// Print the source of one or more functions
    Read {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Emit a machine-readable JSON summary
    Ai {
        /// One entry per directory with per-function briefs
        #[arg(long, conflicts_with = "function")]
        module: bool,
        /// Full function records
        #[arg(long)]
        function: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Mermaid,
    Dot,
}

impl From<Format> for GraphFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => GraphFormat::Text,
            Format::Mermaid => GraphFormat::Mermaid,
            Format::Dot => GraphFormat::Dot,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let session = Session::analyze(&cli.path)?;

    let output = match cli.command {
        Commands::List => report::render_list(&session),
        Commands::Find { pattern } => {
            let found = report::render_find(&session, &pattern);
            if found.used_fallback {
                eprintln!(
                    "warning: '{}' is not a valid regex; matching as a substring",
                    pattern
                );
            }
            found.output
        }
        Commands::Info { name } => report::render_info(&session, &name),
        Commands::Deps { name } => report::render_deps(&session, &name),
        Commands::Callers { name } => report::render_callers(&session, &name),
        Commands::Type { name } => report::render_type(&session, &name),
        Commands::Flow { name, depth } => report::render_flow(&session, &name, depth),
        Commands::Graph { name, format } => callmap_core::graph::render_graph(
            &session.functions,
            name.as_deref(),
            format.into(),
        ),
        Commands::Tree => report::render_tree(&session),
        Commands::Stats => report::render_stats(&session),
        Commands::Analyze => report::render_analyze(&session),
        Commands::Read { names } => report::render_read(&session, &names)?,
        Commands::Ai { module, function } => {
            let scope = if function {
                AiScope::Function
            } else if module {
                AiScope::Module
            } else {
                AiScope::Project
            };
            report::render_ai(&session, scope)?
        }
    };

    print!("{}", output);
    Ok(())
}
