use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

const APP_DIR: &str = ".menush";
const LOG_FILE: &str = "menush.log";

#[derive(Parser, Debug)]
#[command(name = "menush", version, about = "Navigate a tree of menus and run commands")]
pub struct Args {
    /// JSON tree specification; the built-in demo tree is used when absent
    #[arg(long)]
    pub tree: Option<String>,

    /// Log file (default: ~/.menush/menush.log)
    #[arg(long)]
    pub log: Option<String>,

    #[arg(long)]
    pub no_color: bool,

    /// Interval between ticks delivered to a running command, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub tick_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub tree_path: Option<PathBuf>,
    pub log_path: PathBuf,
    pub no_color: bool,
    pub tick: Duration,
}

impl Config {
    pub fn from_args(args: Args) -> Self {
        Self {
            tree_path: args.tree.as_deref().map(expand),
            log_path: args
                .log
                .as_deref()
                .map(expand)
                .unwrap_or_else(default_log_path),
            no_color: args.no_color,
            tick: Duration::from_millis(args.tick_ms.max(1)),
        }
    }
}

pub fn default_log_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(APP_DIR).join(LOG_FILE)
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
