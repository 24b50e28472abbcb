use clap::Parser;
use clap_complete::{generate, Shell};
use std::fs;
use std::io;
use std::path::Path;
use std::process;
use tabgrid_cli::{build_cli_command, Cli, Commands};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn generate_completions(shell: Shell, out: Option<&Path>) -> anyhow::Result<()> {
    let mut cmd = build_cli_command();
    if let Some(path) = out {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        generate(shell, &mut cmd, "tabgrid", &mut file);
        println!("Wrote {shell:?} completion to {}", path.display());
    } else {
        let stdout = &mut io::stdout();
        generate(shell, &mut cmd, "tabgrid", stdout);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {err}");
    }

    let (label, result) = match &cli.command {
        Some(Commands::Export {
            system,
            scenario,
            output,
        }) => (
            "Export",
            commands::export::handle(system, scenario, output.as_deref()),
        ),
        Some(Commands::Inspect { system, format }) => {
            ("Inspect", commands::inspect::handle(system, *format))
        }
        Some(Commands::Completions { shell, out }) => {
            ("Completions", generate_completions(*shell, out.as_deref()))
        }
        None => {
            info!("No subcommand given. Run with --help for usage.");
            return;
        }
    };

    match result {
        Ok(()) => info!("{label} successful!"),
        Err(e) => {
            error!("{label} failed: {e:?}");
            process::exit(1);
        }
    }
}
