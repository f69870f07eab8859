//! picpocket CLI
//!
//! Command-line interface for cataloging photos across locations and running
//! incremental import tasks.

mod commands;
mod error;

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "picpocket")]
#[command(about = "Catalog photos across drives and import new ones", long_about = None)]
struct Cli {
    /// PicPocket directory (defaults to $PICPOCKET_DIR or ~/.config/picpocket)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a configuration file and an empty catalog
    Init {
        /// Database backend
        #[arg(long, default_value = "sqlite")]
        backend: String,

        /// Database file, relative to the PicPocket directory
        #[arg(long)]
        path: Option<String>,

        /// File extensions to import (e.g., jpg,png,orf)
        #[arg(long, value_delimiter = ',')]
        formats: Option<Vec<String>>,
    },

    /// Show the program and catalog versions
    Version,

    /// Manage locations
    Location {
        #[command(subcommand)]
        action: LocationAction,
    },

    /// Manage and run import tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
}

#[derive(Subcommand)]
enum LocationAction {
    /// Register a directory or removable drive
    Add {
        name: String,

        /// Root directory (optional for removable drives)
        #[arg(long)]
        path: Option<PathBuf>,

        #[arg(long)]
        description: Option<String>,

        /// Images can be imported from this location
        #[arg(long)]
        source: bool,

        /// Images can be copied into this location
        #[arg(long)]
        destination: bool,

        /// The location is not always attached
        #[arg(long)]
        removable: bool,
    },

    /// List locations
    List,

    /// Change a location (by name or id)
    Edit {
        location: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, conflicts_with = "clear_path")]
        path: Option<PathBuf>,

        /// Remove the stored path
        #[arg(long)]
        clear_path: bool,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        source: Option<bool>,

        #[arg(long)]
        destination: Option<bool>,

        #[arg(long)]
        removable: Option<bool>,
    },

    /// Remove a location (by name or id)
    Remove {
        location: String,

        /// Also remove the location's images from the catalog
        #[arg(short, long)]
        force: bool,
    },

    /// Import every image under a location
    Import {
        location: String,

        /// Use this directory as the location's root for this run
        #[arg(long)]
        mount: Option<PathBuf>,

        #[arg(long)]
        creator: Option<String>,

        /// File extensions to import instead of the configured ones
        #[arg(long, value_delimiter = ',')]
        formats: Option<Vec<String>>,

        #[arg(long, default_value_t = picpocket_import::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Define a task
    Add {
        name: String,

        /// Location to import from (name or id)
        #[arg(long)]
        source: String,

        /// Location to copy into (name or id)
        #[arg(long)]
        destination: String,

        #[arg(long)]
        description: Option<String>,

        /// Directory pattern below the source (e.g., "{year}/{month}")
        #[arg(long)]
        pattern: Option<String>,

        /// Destination path format (e.g., "{date:%Y/%m}/{file}")
        #[arg(long)]
        format: Option<String>,

        #[arg(long)]
        creator: Option<String>,

        /// File extensions to import instead of the configured ones
        #[arg(long, value_delimiter = ',')]
        formats: Option<Vec<String>>,

        /// Replace an existing task with the same name
        #[arg(short, long)]
        force: bool,
    },

    /// List tasks
    List,

    /// Run a task
    Run {
        name: String,

        /// Only import files modified since this date (YYYY-MM-DD[ HH:MM:SS])
        #[arg(long, conflicts_with = "full")]
        since: Option<String>,

        /// Ignore the last run and consider every file
        #[arg(long)]
        full: bool,

        /// Mount a removable source location at this directory for the run
        #[arg(long)]
        mount: Option<PathBuf>,

        #[arg(long, default_value_t = picpocket_import::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Remove a task
    Remove { name: String },
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let directory = cli.config.unwrap_or_else(picpocket_core::default_directory);

    let result = match cli.command {
        Commands::Init {
            backend,
            path,
            formats,
        } => commands::init::run_init(&directory, &backend, path, formats),
        Commands::Version => commands::version::run_version(&directory),
        Commands::Location { action } => run_location(&directory, action),
        Commands::Task { action } => run_task(&directory, action),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run_location(directory: &std::path::Path, action: LocationAction) -> Result<(), CliError> {
    use commands::location;

    match action {
        LocationAction::Add {
            name,
            path,
            description,
            source,
            destination,
            removable,
        } => location::run_add(
            directory,
            picpocket_core::NewLocation {
                name,
                path,
                description,
                source,
                destination,
                removable,
            },
        ),
        LocationAction::List => location::run_list(directory),
        LocationAction::Edit {
            location: target,
            name,
            path,
            clear_path,
            description,
            source,
            destination,
            removable,
        } => {
            let path = if clear_path { Some(None) } else { path.map(Some) };
            location::run_edit(
                directory,
                &target,
                picpocket_core::LocationEdit {
                    name,
                    path,
                    description: description.map(Some),
                    source,
                    destination,
                    removable,
                },
            )
        }
        LocationAction::Remove {
            location: target,
            force,
        } => location::run_remove(directory, &target, force),
        LocationAction::Import {
            location: target,
            mount,
            creator,
            formats,
            batch_size,
        } => location::run_import(
            directory,
            &target,
            mount,
            picpocket_import::LocationImportOptions {
                batch_size,
                creator,
                formats,
            },
        ),
    }
}

fn run_task(directory: &std::path::Path, action: TaskAction) -> Result<(), CliError> {
    use commands::task;

    match action {
        TaskAction::Add {
            name,
            source,
            destination,
            description,
            pattern,
            format,
            creator,
            formats,
            force,
        } => task::run_add(
            directory,
            picpocket_core::NewTask {
                name,
                description,
                source: Some(picpocket_core::LocationRef::parse(&source)),
                destination: Some(picpocket_core::LocationRef::parse(&destination)),
                configuration: picpocket_core::TaskConfiguration {
                    source: pattern,
                    destination: format,
                    creator,
                    formats,
                },
            },
            force,
        ),
        TaskAction::List => task::run_list(directory),
        TaskAction::Run {
            name,
            since,
            full,
            mount,
            batch_size,
        } => task::run_run(directory, &name, since.as_deref(), full, mount, batch_size),
        TaskAction::Remove { name } => task::run_remove(directory, &name),
    }
}

/// Info lines are plain output; other levels carry their level.
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| match record.level() {
            log::Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(buf, "{}: {}", level, record.args()),
        })
        .init();
}

/// Print an empty line through the logger.
pub(crate) fn log_blank() {
    log::info!("");
}
