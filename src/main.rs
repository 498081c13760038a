// Entry point for the terminal front end
// Loads configuration, sets up file logging, and launches the UI loop

use std::error::Error;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;

mod palette; // Adjacency number colours per terminal capability
mod ui;      // Terminal rendering and input forwarding

use minegrid::config::{Config, config_path, load_or_create_config};

/// Create the log directory if needed and open the log for appending
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Log to a file beside the config; the terminal belongs to the UI
fn init_logging(cfg: &Config) {
    let log_name = format!("{}.log", env!("CARGO_PKG_NAME"));
    let Some(path) = config_path().map(|p| p.with_file_name(log_name)) else {
        return;
    };
    let level = cfg.log_level.parse::<Level>().unwrap_or(Level::INFO);
    // no subscriber yet and raw mode is still off, so stderr is visible
    match open_log_file(&path) {
        Ok(file) => tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_max_level(level)
            .init(),
        Err(e) => eprintln!("logging disabled: cannot open {}: {}", path.display(), e),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut cfg = load_or_create_config();
    init_logging(&cfg);

    ui::run(&mut cfg)
}
