#![warn(clippy::pedantic)]

use std::sync::Arc;

use anyhow::Result as AnyResult;
use artivault_core::{store::DirStore, Library};
use clap::Parser;

pub mod cli;
pub mod settings;
pub mod shell;

fn main() -> AnyResult<()> {
    let cli = cli::Cli::parse();

    let settings_path = cli.settings.clone().or_else(settings::Settings::default_path);
    let settings = match settings_path.as_deref() {
        Some(path) => settings::Settings::load_or_default(path),
        None => settings::Settings::no_path(),
    };

    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "artivault.log" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(settings.log_level())
            .init();
    } else {
        let _ = simple_logging::log_to_file("artivault.log", settings.log_level());
    }

    if settings.did_fail_to_load() {
        log::warn!("Settings weren't available, defaulting.");
        // Only write out defaults where there was nothing, never over a file we couldn't parse.
        if let Some(path) = settings_path.as_deref().filter(|path| !path.exists()) {
            if let Err(e) = settings.save(path) {
                log::warn!("Failed to save settings:\n{e:?}");
            }
        }
    }

    let data_dir = cli
        .data_dir
        .or_else(|| settings.data_dir.clone())
        .or_else(settings::default_data_dir)
        .ok_or_else(|| anyhow::anyhow!("No data directory found, pass --data-dir"))?;
    log::debug!("Using data directory {}", data_dir.display());

    let store = Arc::new(DirStore::open(&data_dir)?);
    let library = Library::open(store, settings.library.clone(), settings.session.clone())?;

    shell::run(&library, cli.command, &mut std::io::stdout().lock())
}
