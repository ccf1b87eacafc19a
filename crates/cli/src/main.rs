//! apigen CLI
//!
//! Command-line interface for translating Swagger API descriptions into
//! source code.

mod run;

use anyhow::{Context, Result};
use apigen_common::ConfigFile;
use apigen_generator::TemplatePrinter;
use apigen_parser::{InOut, Translator};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use run::{Options, Outcome};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apigen")]
#[command(version, about = "Generate API client code from Swagger descriptions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file with the type and identifier tables
    #[arg(short, long, global = true, default_value = "apigen.yaml")]
    config: PathBuf,

    /// Which side of each call to translate
    #[arg(long, global = true, value_enum, default_value_t = Direction::Both)]
    direction: Direction,

    /// Keep schemas that only wrap a single parent schema
    #[arg(long, global = true)]
    keep_trivial: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate descriptions and display the resulting models
    #[command(after_help = "EXAMPLES:\n  \
        # Summarize every description in a directory\n  \
        apigen parse api/client\n\n  \
        # Dump the model of one description as JSON\n  \
        apigen parse --json api/client/rooms.yaml")]
    Parse {
        /// Description files or directories containing them
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Print each model as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Translate descriptions and render them through templates
    #[command(after_help = "EXAMPLES:\n  \
        # Generate with the built-in templates\n  \
        apigen generate api/client --output ./generated\n\n  \
        # Generate with custom templates, parameters only\n  \
        apigen generate api/client \\\n    \
        --templates ./templates/cpp \\\n    \
        --direction in \\\n    \
        --output ./generated")]
    Generate {
        /// Description files or directories containing them
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Template directory (overrides the configuration file)
        #[arg(short, long)]
        templates: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Direction {
    /// Call parameters only
    In,
    /// Call responses only
    Out,
    /// Parameters and responses
    Both,
}

impl From<Direction> for InOut {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::In => InOut::In,
            Direction::Out => InOut::Out,
            Direction::Both => InOut::InAndOut,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        println!("{} Verbose mode enabled", "→".cyan());
    }

    let config = ConfigFile::load(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    let translator = Translator::new(&config.analyzer).context("Invalid analyzer configuration")?;
    let options = Options {
        in_out: cli.direction.into(),
        skip_trivial: !cli.keep_trivial,
    };

    let outcome = match cli.command {
        Commands::Parse { inputs, json } => {
            parse_command(&translator, &inputs, options, json, cli.verbose)?
        }
        Commands::Generate {
            inputs,
            output,
            templates,
        } => {
            let templates = templates.or(config.printer.templates);
            generate_command(&translator, &inputs, options, templates.as_deref(), &output)?
        }
    };

    Ok(report(outcome))
}

/// Log to stderr; `RUST_LOG` overrides the default level
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn parse_command(
    translator: &Translator,
    inputs: &[PathBuf],
    options: Options,
    json: bool,
    verbose: bool,
) -> Result<Outcome> {
    let inputs = run::discover_inputs(inputs).context("Failed to collect descriptions")?;

    Ok(run::process_inputs(translator, &inputs, options, |_, model| {
        if json {
            let dump = serde_json::to_string_pretty(&model).context("Failed to serialize model")?;
            println!("{}", dump);
        } else {
            run::summarize(&model, verbose);
        }
        Ok(())
    }))
}

fn generate_command(
    translator: &Translator,
    inputs: &[PathBuf],
    options: Options,
    templates: Option<&Path>,
    output: &Path,
) -> Result<Outcome> {
    let printer = match templates {
        Some(dir) => {
            println!("{} Using templates from {}", "→".cyan(), dir.display());
            TemplatePrinter::from_dir(dir, output)
        }
        None => TemplatePrinter::builtin(output),
    }
    .context("Failed to load templates")?;

    let inputs = run::discover_inputs(inputs).context("Failed to collect descriptions")?;
    let outcome = run::process_inputs(translator, &inputs, options, |_, model| {
        run::generate(&printer, &model).map(|_| ())
    });

    if outcome.succeeded > 0 {
        println!("\n{}", "Generated files are in:".bold());
        println!("  📄 {}", output.display());
    }
    Ok(outcome)
}

/// Print the final tally and choose the exit status
fn report(outcome: Outcome) -> ExitCode {
    if outcome.is_success() {
        println!(
            "\n{}",
            format!("✓ Processed {} description(s)", outcome.succeeded)
                .green()
                .bold()
        );
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "\n{} {} of {} description(s) failed",
            "⚠".yellow(),
            outcome.failed,
            outcome.failed + outcome.succeeded
        );
        ExitCode::FAILURE
    }
}
