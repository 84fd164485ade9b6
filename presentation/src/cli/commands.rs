//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// How a finished meeting is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The whole markdown transcript
    Full,
    /// Only the summary
    Summary,
    /// The record as JSON
    Json,
}

/// CLI arguments for ai-roundtable
#[derive(Parser, Debug)]
#[command(name = "ai-roundtable")]
#[command(author, version, about = "AI Roundtable - several models discuss a topic in turns")]
#[command(long_about = r#"
AI Roundtable seats several AI models at one table and runs a meeting.

A meeting has up to three phases:
1. Discussion: participants speak in turn for a number of rounds
2. Cross-Evaluation: each participant critiques the others (optional)
3. Summary: the first participant writes the closing summary

While a meeting runs, type `pause`, `resume` or `stop` and press Enter.
Ctrl-C stops the meeting and keeps what was said so far.

Configuration files are loaded from (in priority order):
1. ROUNDTABLE_* environment variables
2. --config <path>       Explicit config file
3. ./roundtable.toml     Project-level config
4. <config dir>/ai-roundtable/config.toml   Global config

Example:
  ai-roundtable run "Should cities ban cars from downtown?"
  ai-roundtable run -b claude -b gemini -r 3 --lang en "Tabs or spaces?"
  ai-roundtable history list
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Also write daily log files into this directory
    #[arg(long, value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a meeting on a topic
    Run(RunArgs),

    /// Browse saved meetings
    #[command(subcommand)]
    History(HistoryCommand),

    /// List backends and their models
    Backends,

    /// Check which backends accept their credentials
    Check {
        /// Backends to check (default: all)
        #[arg(value_name = "BACKEND")]
        backends: Vec<String>,
    },

    /// Store an API key for a backend
    SetKey {
        #[arg(value_name = "BACKEND")]
        backend: String,
        #[arg(value_name = "KEY")]
        key: String,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// The topic to discuss
    pub topic: String,

    /// Number of discussion rounds
    #[arg(short, long, value_name = "N")]
    pub rounds: Option<u32>,

    /// Backends to seat, in speaking order (can be specified multiple times)
    #[arg(short, long = "backend", value_name = "BACKEND")]
    pub backends: Vec<String>,

    /// Skip the cross-evaluation phase
    #[arg(long)]
    pub no_eval: bool,

    /// Shuffle the speaking order every round
    #[arg(long)]
    pub random: bool,

    /// Response language tag (e.g. en, zh-TW)
    #[arg(long, value_name = "TAG")]
    pub lang: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Write the markdown transcript to this file
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Write every meeting update as JSONL to this file
    #[arg(long, value_name = "PATH")]
    pub events: Option<PathBuf>,

    /// Do not print replies while they stream
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// List saved meetings, newest first
    List,
    /// Print one saved meeting
    Show {
        id: String,
        #[arg(short, long, value_enum, default_value = "full")]
        output: OutputFormat,
    },
    /// Delete a saved meeting
    Delete { id: String },
}
