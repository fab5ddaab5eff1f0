//! karashift - terminal pitch/tempo playback controller
//!
//! Run with: cargo run
//!
//! Logs go to karashift.log when RUST_LOG is set, so tracing output never
//! fights the terminal UI.

mod app;
mod ui;

use std::sync::Mutex;

use app::App;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    let Ok(file) = std::fs::File::create("karashift.log") else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();

    let mut terminal = ratatui::init();
    let result = App::new().run(&mut terminal);
    ratatui::restore();
    result
}
