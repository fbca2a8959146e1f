mod repl;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use evalshell::{Output, PythonContext, Shell, ShellConfig};

#[derive(Parser)]
#[command(name = "evalshell", version, about = "Interactive Python evaluation shell with magic commands")]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tracing filter directive (overrides the config file; RUST_LOG wins over both)
    #[arg(long)]
    log_filter: Option<String>,

    /// Do not read or write the line history file
    #[arg(long)]
    no_history: bool,

    /// Evaluate one input and exit instead of starting the REPL
    #[arg(short = 'c', long = "eval", value_name = "TEXT")]
    eval: Option<String>,
}

fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::default(),
    };
    if let Some(filter) = cli.log_filter {
        config.log_filter = Some(filter);
    }
    init_tracing(config.log_filter.as_deref().unwrap_or("warn"));

    pyo3::Python::initialize();

    let context = PythonContext::new(Output::stdout())?;
    let mut shell = Shell::create(config, context)?;
    info!(commands = ?shell.commands().names(), "shell initialized");

    if let Some(text) = cli.eval {
        let ok = repl::report(shell.evaluate(&text, "1"));
        return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    repl::run(&mut shell, !cli.no_history)?;
    Ok(ExitCode::SUCCESS)
}
