use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use project_integrity::config::IntegrityConfig;
use project_integrity::integrity::CheckIntegrityResult;
use project_integrity::project::{
    self, FioriProject, PrecompiledModel, ProjectSettings, StaticPaths,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "project-integrity",
    version,
    about = "Protect hand-authored project sources against unintended modification"
)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write logs to the platform data directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a snapshot for an explicit list of files and content values
    Init {
        #[command(flatten)]
        snapshot: SnapshotArg,

        /// File to protect (repeatable)
        #[arg(short = 'f', long = "file", required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        content: ContentArgs,
    },
    /// Compare the snapshot against the current files and content values
    Check {
        #[command(flatten)]
        snapshot: SnapshotArg,

        #[command(flatten)]
        content: ContentArgs,

        /// Print the result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Accept the current files and content values as the new snapshot
    Update {
        #[command(flatten)]
        snapshot: SnapshotArg,

        #[command(flatten)]
        content: ContentArgs,
    },
    /// Enable integrity checks
    Enable {
        #[command(flatten)]
        snapshot: SnapshotArg,
    },
    /// Disable integrity checks
    Disable {
        #[command(flatten)]
        snapshot: SnapshotArg,
    },
    /// Show whether integrity checks are enabled
    Status {
        #[command(flatten)]
        snapshot: SnapshotArg,
    },
    /// Integrity operations for a Fiori/CAP project
    Fiori {
        #[command(flatten)]
        args: FioriArgs,

        #[command(subcommand)]
        action: FioriAction,
    },
}

#[derive(Args)]
pub struct SnapshotArg {
    /// Path of the integrity snapshot file
    #[arg(short = 's', long = "snapshot", default_value = ".fiori-ai/ai-integrity.json")]
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ContentArgs {
    /// Auxiliary content as KEY=VALUE, or KEY=@PATH to read the value from a file
    #[arg(short = 'c', long = "content", value_parser = parse_key_value)]
    pub entries: Vec<(String, String)>,
}

#[derive(Args)]
pub struct FioriArgs {
    /// Project root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Compiled model JSON (e.g. output of `cds compile srv --to csn`), relative to the root
    #[arg(long, default_value = "gen/csn.json")]
    pub model: PathBuf,

    /// Integrity configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Custom project folder as KIND=PATH (repeatable)
    #[arg(long = "path", value_parser = parse_key_value)]
    pub paths: Vec<(String, String)>,
}

#[derive(Subcommand, Clone, Copy)]
pub enum FioriAction {
    /// Create a snapshot of the CDS sources, compiled model, and custom paths
    Init,
    /// Compare the snapshot against the project, ignoring cosmetic source edits
    Check {
        /// Print the result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Accept the current project state as the new snapshot
    Update,
    /// Enable integrity checks
    Enable,
    /// Disable integrity checks
    Disable,
    /// Show whether the project is initialized and enabled
    Status,
}

/// Runs a command; returns `false` when a check found differences.
pub fn run_command(command: Commands) -> Result<bool> {
    match command {
        Commands::Init {
            snapshot,
            files,
            content,
        } => {
            project::initialize_project(&ProjectSettings {
                integrity_file_path: snapshot.path.clone(),
                file_list: files,
                additional_string_content: content.resolve()?,
            })?;
            println!("Integrity snapshot written to {}", snapshot.path.display());
            Ok(true)
        }
        Commands::Check {
            snapshot,
            content,
            json,
        } => {
            let result = project::check_project(&snapshot.path, &content.resolve()?)?;
            report(&result, json)
        }
        Commands::Update { snapshot, content } => {
            project::update_project(&snapshot.path, &content.resolve()?)?;
            println!("Integrity snapshot updated: {}", snapshot.path.display());
            Ok(true)
        }
        Commands::Enable { snapshot } => {
            project::enable_project(&snapshot.path)?;
            println!("Integrity checks enabled");
            Ok(true)
        }
        Commands::Disable { snapshot } => {
            project::disable_project(&snapshot.path)?;
            println!("Integrity checks disabled");
            Ok(true)
        }
        Commands::Status { snapshot } => {
            let enabled = project::is_project_enabled(&snapshot.path)?;
            println!("{}", if enabled { "enabled" } else { "disabled" });
            Ok(true)
        }
        Commands::Fiori { args, action } => run_fiori(args, action),
    }
}

fn run_fiori(args: FioriArgs, action: FioriAction) -> Result<bool> {
    let config = match &args.config {
        Some(path) => IntegrityConfig::load(path)?,
        None => IntegrityConfig::default(),
    };
    let project = FioriProject::new(
        args.root,
        config,
        PrecompiledModel { path: args.model },
        StaticPaths(args.paths.into_iter().collect()),
    );

    match action {
        FioriAction::Init => {
            project.init()?;
            println!(
                "Integrity snapshot written to {}",
                project.integrity_file_path().display()
            );
            Ok(true)
        }
        FioriAction::Check { json } => report(&project.check()?, json),
        FioriAction::Update => {
            project.update()?;
            println!("Integrity snapshot updated");
            Ok(true)
        }
        FioriAction::Enable => {
            project.enable()?;
            println!("Integrity checks enabled");
            Ok(true)
        }
        FioriAction::Disable => {
            project.disable()?;
            println!("Integrity checks disabled");
            Ok(true)
        }
        FioriAction::Status => {
            let state = if !project.is_initialized() {
                "not initialized"
            } else if project.is_enabled()? {
                "enabled"
            } else {
                "disabled"
            };
            println!("{state}");
            Ok(true)
        }
    }
}

fn report(result: &CheckIntegrityResult, json: bool) -> Result<bool> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(result).context("Failed to serialize check result")?
        );
    } else {
        println!("{}", result.format_cli());
    }
    Ok(result.is_clean())
}

impl ContentArgs {
    /// Reads `@PATH` values and builds the content map.
    fn resolve(&self) -> Result<BTreeMap<String, String>> {
        self.entries
            .iter()
            .map(|(key, value)| {
                let value = match value.strip_prefix('@') {
                    Some(path) => std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read content for '{key}' from {path}"))?,
                    None => value.clone(),
                };
                Ok((key.clone(), value))
            })
            .collect()
    }
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
