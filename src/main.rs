use std::sync::OnceLock;

use lab_quest::config::{GameConfig, CONFIG_PATH};
use macroquad::window::Conf;

/// Config is read once, before the window opens
static CONFIG: OnceLock<Result<GameConfig, String>> = OnceLock::new();

fn loaded_config() -> &'static Result<GameConfig, String> {
    CONFIG.get_or_init(|| GameConfig::load(CONFIG_PATH))
}

fn window_conf() -> Conf {
    lab_quest::window_conf(&loaded_config().clone().unwrap_or_default())
}

#[macroquad::main(window_conf)]
async fn main() {
    lab_quest::run(loaded_config().clone()).await;
}
