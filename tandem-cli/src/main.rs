use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tandem_cli::{BuildOptions, build};

#[derive(Parser)]
#[command(name = "tandem", version, about = "Tandem component compiler")]
struct Cli {
    /// More output; repeat for more detail. `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the entry component to static HTML and generate component modules.
    Build {
        /// Root component file
        entry: PathBuf,
        /// Other component files used by the entry
        components: Vec<PathBuf>,
        /// Output directory (default: `dist` next to the entry)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Config file (default: `tandem.toml` next to the entry, if present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Fail on template warnings
        #[arg(long)]
        strict: bool,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build {
            entry,
            components,
            out_dir,
            config,
            strict,
        } => {
            let report = build(&BuildOptions {
                entry,
                components,
                out_dir,
                config,
                strict,
            })?;
            println!(
                "Built {} component(s) into {}",
                report.components.len(),
                report.out_dir.display()
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
