//! Command-line interface for the harvester.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::categories::{CategoryRegistry, Harvest};
use crate::config::HarvesterConfig;
use crate::error::Result;
use crate::extract::HarvestContext;
use crate::runner::{PipelineRunner, RunOptions, RunOutcome};
use crate::sink::JsonLinesSink;
use crate::store::FileVersionStore;
use crate::transport::HttpTransport;

/// Sea Around Us Harvester - Harvest fisheries datasets into catalog documents.
#[derive(Parser)]
#[command(name = "seaaroundus-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Harvest categories and write their documents as JSON Lines.
    Harvest {
        /// Categories to harvest, in order (see `list`)
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        categories: Vec<String>,

        /// Harvest every registered category
        #[arg(long)]
        all: bool,

        /// Harvest even when the dataset version is unchanged
        #[arg(short, long)]
        force: bool,

        /// Output file, appended to (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// State file with the committed versions
        #[arg(long)]
        state_file: Option<PathBuf>,

        /// Base URL of the provider API
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Fetch a category's index and report its size and version.
    Inspect {
        /// Category name (see `list`)
        category: String,

        /// Base URL of the provider API
        #[arg(long)]
        api_url: Option<String>,
    },

    /// List the registered categories.
    List,
}

/// Run the CLI and return the process exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Harvest {
            categories,
            all,
            force,
            output,
            state_file,
            api_url,
        } => {
            let mut config = load_config(api_url.as_deref())?;
            if let Some(path) = state_file {
                config = config.with_state_file(path);
            }
            harvest_command(&config, &categories, all, force, output.as_deref())
        }
        Commands::Inspect { category, api_url } => {
            let config = load_config(api_url.as_deref())?;
            inspect_command(&config, &category)?;
            Ok(0)
        }
        Commands::List => {
            list_command();
            Ok(0)
        }
    }
}

fn load_config(api_url: Option<&str>) -> Result<HarvesterConfig> {
    let config = HarvesterConfig::from_env()?;
    match api_url {
        Some(url) => config.with_api_base_url(url),
        None => Ok(config),
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn print_outcome(outcome: &RunOutcome) {
    if outcome.skipped() {
        eprintln!(
            "  {} {} (version {} unchanged, {} entities)",
            style("Skipped").yellow().bold(),
            style(&outcome.category).cyan(),
            outcome.version,
            outcome.size
        );
    } else {
        eprintln!(
            "  {} {}: {} entities, {} documents (version {})",
            style("Harvested").green().bold(),
            style(&outcome.category).cyan(),
            outcome.entities,
            outcome.documents,
            style(&outcome.version).green()
        );
    }
}

/// Execute the harvest command.
fn harvest_command(
    config: &HarvesterConfig,
    names: &[String],
    all: bool,
    force: bool,
    output: Option<&Path>,
) -> Result<i32> {
    let registry = CategoryRegistry::new(config);

    // Validate every name before making HTTP requests
    let selected: Vec<&dyn Harvest> = if all {
        registry.iter().map(|entry| entry.category()).collect()
    } else {
        names
            .iter()
            .map(|name| registry.get(name))
            .collect::<Result<_>>()?
    };

    let transport = HttpTransport::new(config)?;
    let mut store = FileVersionStore::open(&config.state_file)?;

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(open_output(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut sink = JsonLinesSink::new(writer);

    eprintln!(
        "{} {} categories from {}",
        style("Harvesting").bold(),
        selected.len(),
        style(&config.api_base_url).cyan()
    );

    let pb = spinner();
    let progress_pb = pb.clone();
    let mut runner = PipelineRunner::new(HarvestContext::new(&transport, config), &mut store)
        .with_options(RunOptions { force })
        .with_progress(move |category, done, total| {
            progress_pb.set_message(format!("{category}: {done}/{total} entities"));
        });

    let mut failed = 0;
    for category in selected {
        pb.set_message(format!("{}: fetching index...", category.name()));

        match category.harvest(&mut runner, &mut sink) {
            Ok(outcome) => pb.suspend(|| print_outcome(&outcome)),
            Err(e) => {
                failed += 1;
                pb.suspend(|| {
                    eprintln!(
                        "  {} {}: {e}",
                        style("Failed").red().bold(),
                        style(category.name()).cyan()
                    );
                });
            }
        }
    }

    pb.finish_and_clear();

    eprintln!();
    eprintln!(
        "{} {} documents written",
        style("Done:").green().bold(),
        sink.written()
    );
    if failed > 0 {
        eprintln!(
            "{} {failed} categories failed, their versions were not committed",
            style("Warning:").yellow().bold()
        );
        return Ok(1);
    }

    Ok(0)
}

/// Open the JSON Lines output for appending, creating it if needed.
///
/// Earlier runs' documents are kept: a run that skips every category
/// leaves the file untouched.
fn open_output(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Execute the inspect command.
fn inspect_command(config: &HarvesterConfig, name: &str) -> Result<()> {
    let registry = CategoryRegistry::new(config);
    let category = registry.get(name)?;
    let transport = HttpTransport::new(config)?;

    let pb = spinner();
    pb.set_message(format!("{name}: fetching index..."));
    let result = category.inspect(HarvestContext::new(&transport, config));
    pb.finish_and_clear();

    let (size, version) = result?;
    println!("{} {}", style("Category:").bold(), style(name).cyan());
    println!("  Entities: {size}");
    println!("  Version: {}", style(&version).green());
    Ok(())
}

/// Execute the list command.
fn list_command() {
    let config = HarvesterConfig::new();
    let registry = CategoryRegistry::new(&config);

    for entry in registry.iter() {
        println!("{:<16} {}", style(entry.name()).cyan(), entry.description());
    }
}
