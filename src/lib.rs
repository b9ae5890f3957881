pub mod app;
pub mod backend;
pub mod cli;
mod config;
pub mod debounce;
pub mod error;
pub mod layout;
pub mod logging;
pub mod notice;
pub mod preview;
pub mod resize;
pub mod search;
pub mod selection;
pub mod submission;
pub mod template;
pub mod translation;
pub use config::{load_app_config, AppConfig, ConfigError, DebounceTimings};
pub use error::{AppError, AppResult};

use std::sync::Arc;

/// Entrypoint used by the binary: wires the HTTP backend into the
/// controller and serves commands from stdin until `quit` or EOF.
pub fn run() -> AppResult<()> {
    logging::init();
    tracing::info!("starting postcomposer");

    let config = config::load_app_config();
    let backend = backend::HttpBackend::from_config(&config)?;
    tracing::info!(base_url = %backend.base_url(), "backend configured");

    let mut app = app::App::new(&config, Arc::new(backend), app::ThreadJobRunner);
    app.start();

    let lines = cli::spawn_stdin_reader()?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    cli::run_session(&mut app, lines, &mut out)?;

    tracing::info!("session finished");
    Ok(())
}
