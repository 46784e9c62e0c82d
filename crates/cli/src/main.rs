//! Slotlist CLI
//!
//! Runs list command scripts against a fixed-capacity node arena.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use slotlist_cli::{EvictionPolicy, ReportFormat, SlotlistConfig, parse_script, run_source};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;

#[derive(ClapParser)]
#[command(name = "slotlist")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run linked-list command scripts against a fixed-capacity node arena", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command script and print the final report
    Run {
        /// Script file (one command per line)
        script: PathBuf,

        /// Configuration file (TOML); only the keys it sets override defaults
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of arena slots
        #[arg(long)]
        capacity: Option<usize>,

        /// Recovery when an insert finds the arena full
        #[arg(long, value_enum)]
        eviction: Option<EvictionPolicy>,

        /// Final report format
        #[arg(long, value_enum)]
        report: Option<ReportFormat>,
    },

    /// Parse a command script without running it
    Check {
        /// Script file to check
        script: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("slotlist=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            script,
            config,
            capacity,
            eviction,
            report,
        } => {
            run_script(&script, config.as_deref(), capacity, eviction, report);
        }
        Commands::Check { script } => {
            run_check(&script);
        }
        Commands::Completions { shell } => {
            run_completions(shell);
        }
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "slotlist", &mut io::stdout());
}

fn read_script(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading script {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn run_check(path: &Path) {
    let source = read_script(path);
    match parse_script(&source) {
        Ok(lines) => println!("{}: {} command(s) OK", path.display(), lines.len()),
        Err(e) => {
            eprintln!("Error: {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn run_script(
    path: &Path,
    config_path: Option<&Path>,
    capacity: Option<usize>,
    eviction: Option<EvictionPolicy>,
    report: Option<ReportFormat>,
) {
    let base = match config_path {
        Some(p) => SlotlistConfig::from_file(p),
        None => SlotlistConfig::default_config(),
    };
    let config = match base.and_then(|c| c.with_overrides(capacity, eviction, report)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    info!(
        capacity = config.capacity,
        eviction = ?config.eviction,
        "running {}",
        path.display()
    );

    let source = read_script(path);
    let output = match run_source(&source, &config) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: {}: {}", path.display(), e);
            process::exit(1);
        }
    };

    for line in &output.lines {
        println!("{}", line);
    }
    match output.report.render(config.report) {
        Ok(text) => println!("{}", text.trim_end()),
        Err(e) => eprintln!("Error: {}", e),
    }

    if let Some(e) = output.error {
        eprintln!("Error: {}: {}", path.display(), e);
        process::exit(1);
    }
}
