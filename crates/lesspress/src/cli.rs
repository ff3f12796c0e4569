use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lesspress")]
#[command(about = "Compile Less stylesheets on save, driven by per-file directives")]
pub struct Cli {
    /// Settings file (JSON with comments) holding a `less.compile` object
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Workspace folders used for `${workspaceFolder}` and settings lookup [default: .]
    #[arg(short, long = "workspace", global = true)]
    pub workspace: Vec<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Less compiler executable
    #[arg(long, default_value = "lessc", global = true)]
    pub lessc: String,

    /// Print every file written
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile Less files (or every Less file below a directory) once
    Compile {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Patterns to ignore when walking directories
        #[arg(long)]
        ignore: Vec<String>,
    },

    /// Watch a directory and compile Less files when they are saved
    Watch {
        /// Directory to watch
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Patterns to ignore
        #[arg(long)]
        ignore: Vec<String>,
    },
}

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
