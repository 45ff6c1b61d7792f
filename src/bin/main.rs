//! tabula CLI - parse filter clauses, render push-down SQL and run reports
//!
//! Usage:
//!   tabula parse <clause> [--dialect <dialect>]
//!   tabula emit <clause> --dialect <dialect>
//!   tabula sql <spec.json> [--engine embedded|warehouse]
//!   tabula run <spec.json> <data.json>
//!
//! Examples:
//!   tabula parse "WHERE country IN ('US', 'CA') AND impr > 0"
//!   tabula emit "name ILIKE 'a%'" --dialect bigquery
//!   tabula sql report.json --engine warehouse --config tabula.toml
//!   tabula run report.json events.json

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use tabula::config::{EngineKind, Settings};
use tabula::data::{Dataset, Frame};
use tabula::engine::{report, EmbeddedEngine, Engine, LocalEngine, WarehouseEngine};
use tabula::model::{PivotResult, ReportSpec};
use tabula::sql::{Dialect, Emitter, SqlPredicate};
use tabula::{ReportError, SyntaxError};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "tabula - a reporting query engine with SQL push-down")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to TABULA_CONFIG, ./tabula.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a WHERE/HAVING clause and print its expression tree as JSON
    Parse {
        clause: String,

        /// Dialect tag recorded on the clause
        #[arg(short, long, default_value = "ansi")]
        dialect: Dialect,
    },

    /// Parse a clause and re-emit it as SQL for a dialect
    Emit {
        clause: String,

        #[arg(short, long)]
        dialect: Dialect,
    },

    /// Print the push-down SQL for a report spec
    Sql {
        /// Path to the report spec (JSON)
        spec: PathBuf,

        /// Push-down engine (defaults to the configured engine)
        #[arg(short, long)]
        engine: Option<EngineKind>,
    },

    /// Run a report over a JSON array of records
    Run {
        /// Path to the report spec (JSON)
        spec: PathBuf,

        /// Path to the dataset (JSON array of objects)
        data: PathBuf,

        /// Engine to run with (defaults to the configured engine)
        #[arg(short, long)]
        engine: Option<EngineKind>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Parse { clause, dialect } => cmd_parse(&clause, dialect),
        Commands::Emit { clause, dialect } => cmd_emit(&clause, dialect),
        Commands::Sql { spec, engine } => {
            cmd_sql(&spec, engine.unwrap_or(settings.engine.default), &settings)
        }
        Commands::Run { spec, data, engine } => cmd_run(
            &spec,
            &data,
            engine.unwrap_or(settings.engine.default),
            &settings,
        ),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tabula=debug" } else { "tabula=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_parse(clause: &str, dialect: Dialect) -> ExitCode {
    let pred = SqlPredicate::new(clause, dialect);
    let parsed = match pred.parsed() {
        Ok(p) => p,
        Err(e) => return fail_clause(&e, clause),
    };
    match serde_json::to_string_pretty(parsed) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_emit(clause: &str, dialect: Dialect) -> ExitCode {
    let pred = SqlPredicate::new(clause, dialect);
    let emitted = pred
        .parsed()
        .and_then(|p| Emitter::new(dialect).predicate(p));
    match emitted {
        Ok(sql) => {
            println!("{}", sql);
            ExitCode::SUCCESS
        }
        Err(e) => fail_clause(&e, clause),
    }
}

fn cmd_sql(spec_path: &Path, engine: EngineKind, settings: &Settings) -> ExitCode {
    let spec = match read_spec(spec_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let sql = match engine {
        EngineKind::Local => {
            eprintln!("Error: the local engine does not generate SQL; use --engine embedded or warehouse");
            return ExitCode::FAILURE;
        }
        EngineKind::Embedded => EmbeddedEngine::new(None).render_sql(&spec),
        EngineKind::Warehouse => match settings.warehouse_config() {
            Ok(config) => WarehouseEngine::new(config).render_sql(&spec),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };
    match sql {
        Ok(sql) => {
            println!("{}", sql);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn cmd_run(spec_path: &Path, data_path: &Path, engine: EngineKind, settings: &Settings) -> ExitCode {
    let spec = match read_spec(spec_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let records = match read_json(data_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let mut dataset = match Frame::from_records(&records) {
        Ok(frame) => Dataset::new(frame),
        Err(e) => return fail(&e),
    };

    // No SQL backend ships with the CLI, so push-down engines report
    // themselves unavailable.
    let engine: Box<dyn Engine> = match engine {
        EngineKind::Local => Box::new(LocalEngine),
        EngineKind::Embedded => {
            let location = match settings.embedded.resolved_location() {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            Box::new(EmbeddedEngine::new(location))
        }
        EngineKind::Warehouse => match settings.warehouse_config() {
            Ok(config) => Box::new(WarehouseEngine::new(config)),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    match report(&mut dataset, &spec, engine.as_ref()) {
        Ok(result) => {
            print_result(&result);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn print_result(result: &PivotResult) {
    for (i, slice) in result.slices.iter().enumerate() {
        if i > 0 {
            println!();
        }
        if !result.slicer_names.is_empty() {
            let labels: Vec<String> = result
                .slicer_names
                .iter()
                .zip(&slice.key)
                .map(|(name, value)| format!("{} = {}", name, value))
                .collect();
            println!("== {} ==", labels.join(", "));
        }
        print!("{}", slice.table.render());
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value, ExitCode> {
    let source = fs::read_to_string(path).map_err(|e| {
        eprintln!("Error reading file '{}': {}", path.display(), e);
        ExitCode::FAILURE
    })?;
    serde_json::from_str(&source).map_err(|e| {
        eprintln!("Error parsing '{}': {}", path.display(), e);
        ExitCode::FAILURE
    })
}

fn read_spec(path: &Path) -> Result<ReportSpec, ExitCode> {
    let value = read_json(path)?;
    ReportSpec::from_structured(value).map_err(|e| fail(&e))
}

fn fail(err: &ReportError) -> ExitCode {
    eprintln!("Error: {}", err);
    ExitCode::FAILURE
}

/// Print an error about `clause`, pointing at the offending offset for
/// syntax errors.
fn fail_clause(err: &ReportError, clause: &str) -> ExitCode {
    match err {
        ReportError::Syntax(e) => print_syntax_error(e, clause),
        other => eprintln!("Error: {}", other),
    }
    ExitCode::FAILURE
}

fn print_syntax_error(err: &SyntaxError, clause: &str) {
    let start = err.offset.min(clause.len());
    let end = match &err.found {
        Some(found) => (start + found.len()).min(clause.len()),
        None => start,
    };
    let label = match &err.found {
        Some(found) => format!("found {}", found),
        None => "here".to_string(),
    };
    let printed = Report::build(ReportKind::Error, ("clause", start..end))
        .with_message(&err.message)
        .with_label(
            Label::new(("clause", start..end))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish()
        .eprint(("clause", Source::from(clause)));
    if printed.is_err() {
        eprintln!("Syntax error: {}", err);
    }
}
