//! Debgraph CLI
//!
//! - `ingest dm` / `ingest packages`: parse the ledger and archive listing
//!   into JSON record files
//! - `transform`: run the pipeline over a directory of record files and
//!   write one JSON file per collection

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use debgraph_transform::{OutputFlavor, Pipeline, PipelineConfig};
use std::fs;
use std::path::PathBuf;

mod io;

#[derive(Parser)]
#[command(name = "debgraph")]
#[command(author, version, about = "Debgraph: Debian directory and archive data as a graph")]
struct Cli {
    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse raw source text into JSON record files.
    Ingest {
        #[command(subcommand)]
        command: IngestCommands,
    },

    /// Build graph collections from a directory of record files.
    Transform {
        /// Directory holding `<source>.json` record files
        input: PathBuf,
        /// Directory receiving `<collection>.json` files
        output: PathBuf,
        /// Pipeline config (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Field naming of the written documents
        #[arg(long, value_enum, default_value_t = Flavor::Plain)]
        flavor: Flavor,
        /// Pretty-print output files
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Subcommand)]
enum IngestCommands {
    /// DM permission ledger (`dm.txt`) -> records
    Dm {
        input: PathBuf,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// dpkg `available` database -> records
    Packages {
        input: PathBuf,
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Flavor {
    Plain,
    Arango,
}

impl From<Flavor> for OutputFlavor {
    fn from(flavor: Flavor) -> Self {
        match flavor {
            Flavor::Plain => OutputFlavor::Plain,
            Flavor::Arango => OutputFlavor::Arango,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Ingest { command } => match command {
            IngestCommands::Dm { input, out } => cmd_ingest_dm(&input, &out),
            IngestCommands::Packages { input, out } => cmd_ingest_packages(&input, &out),
        },
        Commands::Transform {
            input,
            output,
            config,
            flavor,
            pretty,
        } => cmd_transform(&input, &output, config.as_ref(), flavor.into(), pretty),
    }
}

fn cmd_ingest_dm(input: &PathBuf, out: &PathBuf) -> Result<()> {
    println!(
        "{} DM permissions {}",
        "Ingesting".green().bold(),
        input.display()
    );
    let text =
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    let records = debgraph_ingest::parse_dm_permissions(&text)
        .with_context(|| format!("failed to parse {}", input.display()))?;
    io::write_json(out, &records, false)?;
    println!(
        "  {} {} (entries={})",
        "→".cyan(),
        out.display(),
        records.len()
    );
    Ok(())
}

fn cmd_ingest_packages(input: &PathBuf, out: &PathBuf) -> Result<()> {
    println!(
        "{} package database {}",
        "Ingesting".green().bold(),
        input.display()
    );
    let text =
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    let records = debgraph_ingest::parse_available(&text)
        .with_context(|| format!("failed to parse {}", input.display()))?;
    io::write_json(out, &records, false)?;
    println!(
        "  {} {} (packages={})",
        "→".cyan(),
        out.display(),
        records.len()
    );
    Ok(())
}

fn cmd_transform(
    input: &PathBuf,
    output: &PathBuf,
    config_path: Option<&PathBuf>,
    flavor: OutputFlavor,
    pretty: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    println!(
        "{} {} -> {}",
        "Transforming".green().bold(),
        input.display(),
        output.display()
    );

    let pipeline = Pipeline::standard(&config);
    let mut loader = io::DirectoryLoader::new(input);
    let mut sink = io::DirectorySink::new(output, flavor, pretty);
    let report = pipeline.run(&mut loader, &mut sink)?;

    for stage in &report.stages {
        println!(
            "  {} {} (records={})",
            "✓".green(),
            stage.source,
            stage.records
        );
    }
    for (collection, documents) in sink.written() {
        println!("  {} {collection}.json ({documents})", "→".cyan());
    }
    Ok(())
}
