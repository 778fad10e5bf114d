mod config;
mod core;
mod leaves;
mod output;
mod repl;
mod shell;

use std::fs::{self, OpenOptions};
use std::process;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::{Args, Config};
use crate::core::controller::Controller;
use crate::core::error::ShellError;
use crate::core::event::{Event, Key};
use crate::core::tree::MenuTree;
use crate::output::Printer;
use crate::repl::Repl;
use crate::shell::Shell;

/// Exit code for internal consistency violations, distinct from a normal
/// quit (0) and a startup failure (1).
const EXIT_FATAL: i32 = 70;

fn main() {
    let config = Config::from_args(Args::parse());

    if let Err(err) = run(&config) {
        let printer = Printer::new(config.no_color);
        printer.error(&format!("fatal: {:#}", err));
        match err.downcast_ref::<ShellError>() {
            Some(ShellError::ContractViolation(_)) => process::exit(EXIT_FATAL),
            _ => process::exit(1),
        }
    }
}

fn run(config: &Config) -> Result<()> {
    init_logging(config)?;

    let registry = leaves::registry();
    let tree = match &config.tree_path {
        Some(path) => MenuTree::load(path, &registry)
            .with_context(|| format!("cannot load tree from {}", path.display()))?,
        None => MenuTree::build(&leaves::default_tree(), &registry)?,
    };

    let printer = Printer::new(config.no_color);
    printer.header("menush");
    println!("Type 'help' for the current menu, 'up' to go back, 'quit' to leave.");
    println!();

    let repl = Repl::new().context("failed to initialize line editor")?;
    let mut shell = Shell::new(Controller::new(tree), repl, printer, config.tick);

    // Ctrl+C outside the line editor lands in the event queue
    let tx = shell.sender();
    ctrlc::set_handler(move || {
        let _ = tx.send(Event::Key(Key::Interrupt));
    })
    .context("error setting Ctrl-C handler")?;

    let session = Uuid::new_v4();
    let span = tracing::info_span!("session", id = %session);
    let _guard = span.enter();
    info!(leaves = ?registry.bindings(), "session started");

    shell.run()?;
    info!("session ended");
    Ok(())
}

/// Logs go to a file so they never interleave with the prompt.
fn init_logging(config: &Config) -> Result<()> {
    if let Some(parent) = config.log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .with_context(|| format!("cannot open log file {}", config.log_path.display()))?;

    let filter = EnvFilter::try_from_env("MENUSH_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
