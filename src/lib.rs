//! Top-down science lab adventure.
//!
//! Game logic lives in [`game`] and never touches the window; [`render`]
//! draws a [`game::Session`] and [`input`] turns the keyboard into
//! per-tick frames.

pub mod config;
pub mod game;
pub mod input;
pub mod render;
mod app;

pub use app::{run_game, window_conf, TICKS_PER_SECOND};

use config::GameConfig;

/// Set up logging and run the game loop with the config read at startup.
/// A config error is reported once logging is up, then defaults are used.
pub async fn run(loaded: Result<GameConfig, String>) {
    let config = loaded.clone().unwrap_or_default();

    // Initialize logging; RUST_LOG overrides the config's level
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter())).init();

    if let Err(e) = loaded {
        log::warn!("{}. Using defaults.", e);
    }

    // Set panic hook for native builds
    #[cfg(not(target_arch = "wasm32"))]
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {}", panic_info);
        if let Some(location) = panic_info.location() {
            eprintln!("  at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    log::info!("Starting {} in {:?}", config.window.title, config.start_world);
    run_game(config).await;
}
