//! PTTY - CLI

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use ptty::engine::{EngineError, Interpreter, Scope, ScopePair};
use ptty::util::config::{load_config_from, load_user_config};
use ptty::util::logger::{self, LogLevel};
use ptty::{run_file, run_session, NAME, VERSION};

/// Portable mini-interpreter for convenience and debugging
#[derive(Parser, Debug)]
#[command(name = "ptty")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    /// Script to run before the session starts; its names stay defined
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Configuration file to use instead of the user configuration
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Do not load or save line history
    #[arg(long)]
    no_history: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level {
        Some(level) => level,
        None if args.verbose => LogLevel::Debug,
        None => LogLevel::Warn,
    };
    logger::init_with_level(level);

    let config = match &args.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => load_user_config().context("Failed to load user config")?,
    };

    let scopes = ScopePair::shared(Scope::new());
    let mut interp = Interpreter::new();

    if let Some(file) = &args.file {
        if let Err(err) = run_file(&mut interp, file, &scopes) {
            match err.downcast_ref::<EngineError>() {
                Some(EngineError::Runtime(runtime)) if runtime.exit_code().is_some() => {
                    std::process::exit(runtime.exit_code().unwrap_or(1));
                }
                Some(engine_err) => {
                    eprint!("{}", engine_err.render_trace());
                    std::process::exit(1);
                }
                None => return Err(err),
            }
        }
    }

    run_session(interp, scopes, &config, !args.no_history).context("Terminal I/O failed")?;
    Ok(())
}
