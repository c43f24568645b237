//! specforge — the requirements-to-SQL CLI
//!
//! # Usage
//!
//! ```bash
//! # Requirements Markdown -> spec.json + mapping docs
//! specforge spec-from-req --req requirements.md --out-root technical_requirements
//!
//! # spec.json -> SQLX transformation files
//! specforge sqlx-from-spec --spec technical_requirements/spec.json --out-dir definitions
//!
//! # spec.json -> SQL test scripts
//! specforge tests-from-spec --spec technical_requirements/spec.json --out-dir generated_tests
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;

use specforge::model::RequirementsDoc;
use specforge::{emit, parser, spec_writer, testgen};

#[derive(Parser)]
#[command(name = "specforge")]
#[command(version)]
#[command(about = "Turn requirements Markdown into pipeline specs and SQLX", long_about = None)]
#[command(after_help = "EXAMPLES:
    specforge spec-from-req --req requirements.md
    specforge sqlx-from-spec --spec technical_requirements/spec.json
    specforge tests-from-spec --spec technical_requirements/spec.json --req-source requirements.md")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a requirements .md and write spec.json plus mapping docs
    SpecFromReq {
        /// Path to the requirements Markdown file
        #[arg(long)]
        req: PathBuf,
        /// Root for technical artifacts (spec + mappings, not code)
        #[arg(long, default_value = "technical_requirements", env = "SPECFORGE_OUT_ROOT")]
        out_root: PathBuf,
    },
    /// Generate SQLX files from a spec.json
    SqlxFromSpec {
        /// Path to spec.json
        #[arg(long)]
        spec: PathBuf,
        /// Where to write generated SQLX code
        #[arg(long, default_value = "pipeline_code/definitions")]
        out_dir: PathBuf,
    },
    /// Generate SQL test scripts from a spec.json
    TestsFromSpec {
        /// Path to spec.json
        #[arg(long)]
        spec: PathBuf,
        /// Where to write generated tests
        #[arg(long, default_value = "generated_tests")]
        out_dir: PathBuf,
        /// Original requirements .md recorded in test headers for traceability
        #[arg(long)]
        req_source: Option<PathBuf>,
    },
    /// Parse a requirements .md and print the normalized document as JSON
    Parse {
        /// Path to the requirements Markdown file
        #[arg(long)]
        req: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::SpecFromReq { req, out_root } => {
            let markdown = fs::read_to_string(&req)
                .with_context(|| format!("reading requirements {}", req.display()))?;
            let doc = parser::parse(&markdown)?;
            let definitions_dir = out_root.join("definitions");
            let artifacts = spec_writer::write_spec_artifacts(&doc, &definitions_dir)?;
            println!(
                "{} {}",
                "Spec JSON:".green().bold(),
                artifacts.spec_json.display()
            );
            println!(
                "{} {} -> {}",
                "Mapping docs:".green().bold(),
                artifacts.mapping_docs.len(),
                out_root.join("mappings").display()
            );
        }
        Commands::SqlxFromSpec { spec, out_dir } => {
            let doc = load_spec(&spec)?;
            let written = emit::generate_sqlx(&doc, &out_dir)?;
            println!(
                "{} {} -> {}",
                "Generated SQLX:".green().bold(),
                written.len(),
                out_dir.display()
            );
        }
        Commands::TestsFromSpec {
            spec,
            out_dir,
            req_source,
        } => {
            let doc = load_spec(&spec)?;
            let source = req_source.unwrap_or_else(|| spec.clone());
            let written = testgen::generate_tests(&doc, &out_dir, &source)?;
            println!(
                "{} {} -> {}",
                "Generated tests:".green().bold(),
                written.len(),
                out_dir.display()
            );
        }
        Commands::Parse { req } => {
            let markdown = fs::read_to_string(&req)
                .with_context(|| format!("reading requirements {}", req.display()))?;
            let doc = parser::parse(&markdown)?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }
    Ok(())
}

fn load_spec(path: &PathBuf) -> anyhow::Result<RequirementsDoc> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading spec {}", path.display()))?;
    let doc = serde_json::from_str(&text)
        .with_context(|| format!("decoding spec {}", path.display()))?;
    Ok(doc)
}
