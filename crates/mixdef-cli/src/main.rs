//! Mixin definition CLI.
//!
//! Provides the `mixdef` binary. Every subcommand reads a JSON document
//! holding a type universe and the class contexts to compose, and goes
//! through the same `DefinitionCache` a host application would use:
//!
//! - `tree` prints each composition as an indented tree
//! - `validate` reports the validation log of each composition
//! - `dump` prints one composition graph as JSON
//!
//! Log output is controlled with `MIXDEF_LOG` (default `warn`).

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mixdef_build::{CacheError, CacheOptions, ClassContext, DefinitionBuilder, DefinitionCache, Document};
use mixdef_check::Validator;

/// Mixin composition definitions: build, inspect and validate.
#[derive(Parser)]
#[command(name = "mixdef", about = "Build, inspect and validate mixin compositions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print each composition as an indented tree.
    Tree {
        /// Path to the JSON document.
        document: PathBuf,

        /// Only the context of this target class.
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Validate every composition and print the findings.
    Validate {
        document: PathBuf,

        #[arg(short, long)]
        target: Option<String>,

        /// Treat warnings as failures.
        #[arg(long)]
        strict: bool,

        /// Print validation logs as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print one composition graph as JSON.
    Dump {
        document: PathBuf,

        #[arg(short, long)]
        target: String,
    },
}

/// Exit codes: 0 = success, 1 = build or usage error, 2 = validation
/// failure, 3 = I/O or parse error.
const EXIT_OK: i32 = 0;
const EXIT_BUILD: i32 = 1;
const EXIT_INVALID: i32 = 2;
const EXIT_IO: i32 = 3;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("MIXDEF_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Tree { document, target } => run_tree(&document, target.as_deref()),
        Commands::Validate {
            document,
            target,
            strict,
            json,
        } => run_validate(&document, target.as_deref(), strict, json),
        Commands::Dump { document, target } => run_dump(&document, &target),
    };
    process::exit(exit_code);
}

/// A loaded document and a cache over its universe.
struct Session {
    document: Document,
    cache: DefinitionCache,
}

impl Session {
    fn open(path: &Path, options: CacheOptions) -> Result<Self, i32> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            eprintln!("Error: failed to read '{}': {}", path.display(), e);
            EXIT_IO
        })?;
        let document = Document::from_json(&source).map_err(|e| {
            eprintln!("Error: '{}' is not a valid document: {}", path.display(), e);
            EXIT_IO
        })?;
        let universe = document.universe().map_err(|e| {
            eprintln!("Error: invalid type declarations: {}", e);
            EXIT_BUILD
        })?;
        tracing::debug!(types = universe.len(), contexts = document.contexts.len(), "document loaded");

        let builder = DefinitionBuilder::new(Arc::new(universe));
        let cache = DefinitionCache::with_options(builder, Validator::default(), options);
        Ok(Session { document, cache })
    }

    /// The selected contexts, or every context in the document.
    fn contexts(&self, target: Option<&str>) -> Result<Vec<ClassContext>, i32> {
        match target {
            Some(target) => match self.document.context(target) {
                Some(context) => Ok(vec![context.clone()]),
                None => {
                    eprintln!("Error: no context configured for target '{}'", target);
                    Err(EXIT_BUILD)
                }
            },
            None => Ok(self.document.contexts.clone()),
        }
    }
}

/// Maps a cache error to its exit code after printing it.
fn report(context: &ClassContext, err: &CacheError) -> i32 {
    match err {
        CacheError::Build { .. } => {
            eprintln!("Build error in {}: {}", context, err);
            EXIT_BUILD
        }
        CacheError::Validation { .. } => {
            eprintln!("{}", err);
            EXIT_INVALID
        }
    }
}

fn run_tree(path: &Path, target: Option<&str>) -> i32 {
    let session = match Session::open(path, CacheOptions::default()) {
        Ok(session) => session,
        Err(code) => return code,
    };
    let contexts = match session.contexts(target) {
        Ok(contexts) => contexts,
        Err(code) => return code,
    };

    let mut exit_code = EXIT_OK;
    for context in &contexts {
        match session.cache.get_or_build(context) {
            Ok(graph) => print!("{}", mixdef_core::render_tree(&graph)),
            Err(err) => exit_code = exit_code.max(report(context, &err)),
        }
    }
    exit_code
}

fn run_validate(path: &Path, target: Option<&str>, strict: bool, json: bool) -> i32 {
    let options = CacheOptions {
        fail_on_warnings: strict,
    };
    let session = match Session::open(path, options) {
        Ok(session) => session,
        Err(code) => return code,
    };
    let contexts = match session.contexts(target) {
        Ok(contexts) => contexts,
        Err(code) => return code,
    };

    let mut exit_code = EXIT_OK;
    for context in &contexts {
        let log = match session.cache.get_or_build(context) {
            Ok(graph) => session.cache.validator().validate(&graph),
            Err(CacheError::Validation { log, .. }) => {
                exit_code = exit_code.max(EXIT_INVALID);
                log
            }
            Err(err) => {
                exit_code = exit_code.max(report(context, &err));
                continue;
            }
        };

        if json {
            let value = serde_json::json!({
                "context": context,
                "fingerprint": context.fingerprint().to_hex().to_string(),
                "log": log,
            });
            match serde_json::to_string_pretty(&value) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error: failed to serialize log: {}", e);
                    exit_code = exit_code.max(EXIT_IO);
                }
            }
        } else {
            println!("{} [{}]", context, context.short_fingerprint());
            for line in log.to_string().lines() {
                println!("  {}", line);
            }
        }
    }
    exit_code
}

fn run_dump(path: &Path, target: &str) -> i32 {
    let session = match Session::open(path, CacheOptions::default()) {
        Ok(session) => session,
        Err(code) => return code,
    };
    let context = match session.contexts(Some(target)) {
        Ok(mut contexts) if !contexts.is_empty() => contexts.remove(0),
        Ok(_) => return EXIT_BUILD,
        Err(code) => return code,
    };

    match session.cache.get_or_build(&context) {
        Ok(graph) => match serde_json::to_string_pretty(graph.as_ref()) {
            Ok(json) => {
                println!("{}", json);
                EXIT_OK
            }
            Err(e) => {
                eprintln!("Error: failed to serialize graph: {}", e);
                EXIT_IO
            }
        },
        Err(err) => report(&context, &err),
    }
}
