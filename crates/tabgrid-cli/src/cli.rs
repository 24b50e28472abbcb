use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the PowerSystems table data set for a system
    Export {
        /// System file (JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        system: PathBuf,
        /// Scenario file (TOML, YAML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        scenario: PathBuf,
        /// Output directory, overriding the scenario's output_folder
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        output: Option<PathBuf>,
    },
    /// Summarize the components of a system file
    Inspect {
        /// System file (JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        system: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = InspectFormat::Plain)]
        format: InspectFormat,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectFormat {
    Plain,
    Json,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
