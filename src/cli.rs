//! CLI: infer → (model | schema)
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::warn;

use crate::config::Config;
use crate::error::Error;
use crate::inference::Inference;
use crate::schema::Slot;
use crate::source::{SourceSettings, SourceStats};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// learn the structure of JSON log lines and emit a parser model for them
#[derive(Parser, Debug)]
#[command(name = "json-pg", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// infer and write the parser model
    Model(ModelOut),
    /// infer and print the merged schema as JSON (debug view)
    Schema(JsonSchemaOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON config file; flags below override its values
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// JSON Pointer to select a subnode in each line (e.g. /data/event)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs, one JSON document per line. Literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1..)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct ModelOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output file (config `output_file`, else stdout)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// largest distinct-value count emitted as a word list
    #[arg(long)]
    max_enum_values: Option<usize>,

    /// strftime pattern tried for timestamps; repeat for several, in order
    #[arg(long = "date-format")]
    date_formats: Vec<String>,

    /// spaces per indentation level
    #[arg(long)]
    indent: Option<usize>,

    /// print the effective configuration and exit
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct JsonSchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Config file (or defaults) with `--input` applied.
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match self.config.as_deref() {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if !self.input.is_empty() {
            config.input_files = self.input.clone();
        }
        Ok(config)
    }

    /// Fold every sample into one tree.
    fn infer(&self, config: &Config) -> anyhow::Result<(Slot, SourceStats)> {
        let source = SourceSettings { inputs: config.input_files.clone(), json_pointer: self.json_pointer.clone() };
        let mut inf = Inference::new();
        let stats = source.load_process(|value| inf.observe_value(&value)).context("failed to read samples")?;
        let root = inf.solve()?;
        Ok((root, stats))
    }
}

impl ModelOut {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(out) = self.out.as_ref() {
            config.output_file = Some(out.clone());
        }
        if let Some(n) = self.max_enum_values {
            config.max_enum_values = n;
        }
        if !self.date_formats.is_empty() {
            config.date_formats = self.date_formats.clone();
        }
        if let Some(n) = self.indent {
            config.indent = " ".repeat(n);
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Model(target) => {
                let mut config = target.input_settings.load_config()?;
                target.apply_overrides(&mut config);
                config.validate()?;

                // debug path
                if target.no_op {
                    eprintln!("{}", serde_json::to_string_pretty(&config)?);
                    return Ok(());
                }

                // 1) merge samples
                let (root, stats) = target.input_settings.infer(&config)?;

                // 2) pick markers & emit; nothing is written if either fails
                let model = crate::build_model(&root, &config)?;
                if model.inconsistencies > 0 {
                    warn!(count = model.inconsistencies, "nodes with inconsistent shapes; see comments in the model");
                }

                // 3) write once
                write_output(config.output_file.as_deref(), &model.render())?;
                eprintln!(
                    "{} {} samples from {} file(s) → {} catalog entries",
                    "done:".green().bold(),
                    stats.samples,
                    stats.files,
                    model.catalog.len(),
                );
            }
            Command::Schema(target) => {
                let config = target.input_settings.load_config()?;
                let (root, _) = target.input_settings.infer(&config)?;
                let schema = crate::inference::emit_schema(&root);
                let schema_src = serde_json::to_string_pretty(&schema)?;
                write_output(target.out.as_deref(), &format!("{schema_src}\n"))?;
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, text: &str) -> anyhow::Result<()> {
    let Some(out) = out else {
        print!("{text}");
        return Ok(());
    };
    let write_error = |source| Error::Write { path: out.to_path_buf(), source };
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(out, text).map_err(write_error)?;
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
