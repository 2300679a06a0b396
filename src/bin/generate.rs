//! Type and Sample Generation CLI
//!
//! Reads an OpenAPI component document and emits the canonical type model,
//! schema-valid sample files, and extracted RPC method descriptors.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use openapi_typegen::{
    extract_methods, GeneratorConfig, OutputFormat, SchemaDocument, Generator,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "typegen")]
#[command(about = "Generate canonical type models and schema-valid samples from OpenAPI components")]
struct Cli {
    /// Path to the OpenAPI document (JSON)
    #[arg(short, long)]
    document: PathBuf,

    /// Path to a config file (defaults to typegen.toml if present)
    #[arg(short, long)]
    config: Option<String>,

    /// Output directory (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Emit the canonical type model as types.json
    Types,
    /// Emit one validated sample file per schema (and per union variant)
    Samples,
    /// Emit extracted RPC method descriptors as methods.json
    Methods,
    /// Emit types, samples, and methods in one run
    All,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = GeneratorConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(output) = cli.output {
        config.output.directory = output;
    }

    let document = SchemaDocument::from_path(&cli.document)
        .with_context(|| format!("failed to load document {}", cli.document.display()))?;
    info!(schemas = document.schema_count(), "document loaded");

    let out_dir = config.output_directory();
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let format = config.output.format;
    let generator = Generator::new(&document, config);

    match cli.command {
        Command::Types => emit_types(&generator, &out_dir, format)?,
        Command::Samples => emit_samples(&generator, &out_dir, format)?,
        Command::Methods => emit_methods(&document, &out_dir, format)?,
        Command::All => {
            emit_types(&generator, &out_dir, format)?;
            emit_samples(&generator, &out_dir, format)?;
            emit_methods(&document, &out_dir, format)?;
        }
    }
    Ok(())
}

fn emit_types(generator: &Generator<'_>, out_dir: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let model = generator.type_model();
    write_json(&out_dir.join("types.json"), &serde_json::to_value(&model)?, format)?;
    info!(
        types = model.types.len(),
        auxiliary = model.auxiliary.len(),
        "type model written"
    );
    Ok(())
}

fn emit_samples(
    generator: &Generator<'_>,
    out_dir: &Path,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let samples_dir = out_dir.join("samples");
    fs::create_dir_all(&samples_dir)?;

    let (sets, report) = generator.sample_all();
    for set in &sets {
        for sample in &set.samples {
            let file_name = if sample.label.is_empty() {
                format!("{}.json", set.schema)
            } else {
                format!("{}_{}.json", set.schema, sample.label)
            };
            write_json(&samples_dir.join(file_name), &sample.value, format)?;
        }
    }

    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "samples written"
    );
    if !report.failures.is_empty() {
        eprintln!("Schemas with invalid samples: {}", report.failures.join(", "));
    }
    Ok(())
}

fn emit_methods(document: &SchemaDocument, out_dir: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let methods = extract_methods(document);
    write_json(&out_dir.join("methods.json"), &serde_json::to_value(&methods)?, format)?;
    info!(methods = methods.len(), "method descriptors written");
    Ok(())
}

fn write_json(path: &Path, value: &serde_json::Value, format: OutputFormat) -> anyhow::Result<()> {
    let content = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        OutputFormat::Compact => serde_json::to_string(value)?,
    };
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
