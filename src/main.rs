use clap::{Parser as ClapParser, Subcommand};
use sexp_lang::cli::{self, CheckOptions, CheckResult, CliError};
use sexp_lang::validator::{ValidationLevel, ValidationReport};
use sexp_lang::variables::Scope;
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "sexp")]
#[command(about = "SEXP - the mission-scripting expression language: validate, evaluate, format")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and evaluate a SEXP expression
    Check {
        /// The expression to check
        expression: String,

        /// JSON variable records file (variable store export format)
        #[arg(short, long)]
        vars: Option<String>,

        /// Scope the variable records load into: local, campaign or global
        #[arg(short, long, default_value = "local")]
        scope: String,

        /// Validation level: basic, standard or comprehensive
        #[arg(short, long, default_value = "standard")]
        level: String,

        /// Only validate, don't evaluate
        #[arg(long)]
        validate_only: bool,

        /// Pretty-print the result JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Parse an expression and re-print it canonically
    Fmt {
        /// Expression text (reads from stdin if not provided)
        expression: Option<String>,

        /// Break wide calls across indented lines
        #[arg(short, long)]
        pretty: bool,
    },

    /// Extract SEXP formulas from FS2 mission text
    Extract {
        /// Mission file path (reads from stdin if not provided)
        file: Option<String>,

        /// Validate each extracted formula
        #[arg(long)]
        check: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            expression,
            vars,
            scope,
            level,
            validate_only,
            pretty,
        } => run_check(expression, vars, scope, level, validate_only, pretty),
        Commands::Fmt { expression, pretty } => run_fmt(expression, pretty),
        Commands::Extract { file, check } => run_extract(file, check),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn parse_scope(scope: &str) -> Result<Scope, CliError> {
    match scope {
        "local" => Ok(Scope::Local),
        "campaign" => Ok(Scope::Campaign),
        "global" => Ok(Scope::Global),
        other => Err(CliError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unknown scope '{}' (expected local, campaign or global)", other),
        ))),
    }
}

fn parse_level(level: &str) -> Result<ValidationLevel, CliError> {
    match level {
        "basic" => Ok(ValidationLevel::Basic),
        "standard" => Ok(ValidationLevel::Standard),
        "comprehensive" => Ok(ValidationLevel::Comprehensive),
        other => Err(CliError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "unknown level '{}' (expected basic, standard or comprehensive)",
                other
            ),
        ))),
    }
}

fn read_stdin_if_piped() -> Result<Option<String>, CliError> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
    Ok(Some(buffer))
}

fn print_report(report: &ValidationReport) {
    for error in &report.errors {
        eprintln!("error: {} (line {}, column {})", error.message, error.line, error.column);
    }
    for warning in &report.warnings {
        eprintln!(
            "warning: {} (line {}, column {})",
            warning.message, warning.line, warning.column
        );
    }
    for suggestion in &report.suggestions {
        eprintln!("suggestion: {}\n  {}", suggestion.title, suggestion.replacement);
    }
}

fn run_check(
    expression: String,
    vars: Option<String>,
    scope: String,
    level: String,
    validate_only: bool,
    pretty: bool,
) -> Result<(), CliError> {
    let vars = match vars {
        Some(path) => Some(std::fs::read_to_string(path).map_err(CliError::Io)?),
        None => None,
    };

    let options = CheckOptions {
        expression,
        vars,
        scope: parse_scope(&scope)?,
        level: parse_level(&level)?,
        validate_only,
    };

    match cli::execute_check(&options)? {
        CheckResult::Valid(report) => {
            print_report(&report);
            println!("Expression is valid");
        }
        CheckResult::Invalid(report) => {
            print_report(&report);
            std::process::exit(1);
        }
        CheckResult::Evaluated { value, report } => {
            print_report(&report);
            let json = if pretty {
                serde_json::to_string_pretty(&value)
            } else {
                serde_json::to_string(&value)
            }?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn run_fmt(expression: Option<String>, pretty: bool) -> Result<(), CliError> {
    let text = match expression {
        Some(text) => text,
        None => read_stdin_if_piped()?.ok_or(CliError::NoInput)?,
    };

    println!("{}", cli::execute_fmt(&text, pretty)?);
    Ok(())
}

fn run_extract(file: Option<String>, check: bool) -> Result<(), CliError> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path).map_err(CliError::Io)?,
        None => read_stdin_if_piped()?.ok_or(CliError::NoInput)?,
    };

    let formulas = cli::execute_extract(&text, check)?;
    let mut failures = 0;

    for formula in &formulas {
        println!("line {}: ${}:", formula.line, formula.name);
        println!("{}", formula.text);
        if let Some(report) = &formula.report {
            if report.is_valid() {
                println!("  ok");
            } else {
                failures += 1;
                print_report(report);
            }
        }
        println!();
    }

    if failures > 0 {
        eprintln!("{} invalid formula(s)", failures);
        std::process::exit(1);
    }
    Ok(())
}
