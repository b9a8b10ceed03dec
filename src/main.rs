use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use medscribe_lib::config::{self, EngineConfig};
use medscribe_lib::models::{ClinicalContext, Symptom};
use medscribe_lib::{AppError, ClinicalEngine};

#[derive(Parser)]
#[command(name = "medscribe", version, about = "Structure clinical narration and rank differentials")]
struct Cli {
    /// Directory holding vocabulary.json, terminology.json and evidence.json
    #[arg(long, global = true)]
    knowledge_dir: Option<PathBuf>,

    /// Use the local Ollama model to refine rankings and summaries
    #[arg(long, global = true)]
    llm: bool,

    /// Single-line JSON output
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Narration {
    /// Narration file; stdin when omitted
    input: Option<PathBuf>,

    /// Patient context as a JSON file
    #[arg(long)]
    context: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Encounter, differentials, suggested investigations, red flags and summary
    Analyze(Narration),
    /// Structured encounter record only
    Structure(Narration),
    /// Narration with abbreviations and transliterations expanded
    Normalize(Narration),
    /// Ranked differentials for named symptoms
    Differentials {
        #[arg(required = true)]
        symptoms: Vec<String>,

        /// Patient context as a JSON file
        #[arg(long)]
        context: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    medscribe_lib::init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "medscribe failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let mut engine_config = EngineConfig::from_env()?;
    if let Some(dir) = &cli.knowledge_dir {
        engine_config = engine_config.with_knowledge_dir(dir);
    }
    if cli.llm {
        engine_config.llm.enabled = true;
    }

    tracing::debug!(version = config::APP_VERSION, "{} starting", config::APP_NAME);
    let engine = ClinicalEngine::from_config(&engine_config)?;

    match &cli.command {
        Command::Analyze(narration) => {
            let text = read_narration(narration.input.as_deref())?;
            let context = read_context(narration.context.as_deref())?;
            print_json(&engine.analyze(&text, context.as_ref()), cli.compact)
        }
        Command::Structure(narration) => {
            let text = read_narration(narration.input.as_deref())?;
            print_json(&engine.structure_encounter(&text), cli.compact)
        }
        Command::Normalize(narration) => {
            let text = read_narration(narration.input.as_deref())?;
            writeln!(io::stdout(), "{}", engine.normalize(&text))?;
            Ok(())
        }
        Command::Differentials { symptoms, context } => {
            let context = read_context(context.as_deref())?;
            let symptoms: Vec<Symptom> = symptoms.iter().map(|s| Symptom::named(s)).collect();
            print_json(
                &engine.generate_ranked_differentials(&symptoms, context.as_ref()),
                cli.compact,
            )
        }
    }
}

fn read_narration(path: Option<&Path>) -> Result<String, AppError> {
    Ok(match path {
        Some(path) => fs::read_to_string(path)?,
        None => io::read_to_string(io::stdin())?,
    })
}

fn read_context(path: Option<&Path>) -> Result<Option<ClinicalContext>, AppError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let json = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&json)?))
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<(), AppError> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    writeln!(io::stdout(), "{json}")?;
    Ok(())
}
