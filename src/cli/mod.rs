use crate::report::Period;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "worklog", version, about = "Personal time tracking on a local store")]
pub struct Cli {
    /// Store location; `:memory:` for a throwaway store.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start an activity: `name[@project][;tags][#description]`.
    Start {
        #[arg(required = true, num_args = 1..)]
        activity: Vec<String>,
    },
    Stop,
    Status,
    List {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = false, conflicts_with = "limit")]
        all: bool,
    },
    Projects {
        #[arg(long)]
        limit: Option<usize>,
    },
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        /// Project id, 0 to unassign.
        #[arg(long)]
        project: Option<i64>,
    },
    Remove {
        #[command(subcommand)]
        command: RemoveCommands,
    },
    Report {
        #[arg(long, value_enum)]
        period: Option<Period>,
        #[arg(long)]
        project: Option<i64>,
        #[arg(long)]
        tag: Option<String>,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Doctor,
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommands {
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum RemoveCommands {
    Activity {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },
    Project {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}
