//! Game settings loaded from `assets/config.toml`.
//!
//! Every section defaults independently, so a partial file only overrides
//! what it names.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::game::WorldKind;

pub const CONFIG_PATH: &str = "assets/config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Enables debug logging and the debug overlay
    pub debug: bool,
    pub window: WindowConfig,
    pub player: PlayerConfig,
    pub dialogue: DialogueConfig,
    pub assets: AssetConfig,
    pub start_world: WorldKind,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            debug: false,
            window: WindowConfig::default(),
            player: PlayerConfig::default(),
            dialogue: DialogueConfig::default(),
            assets: AssetConfig::default(),
            start_world: WorldKind::Classroom,
        }
    }
}

/// Window size doubles as the camera viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: i32,
    pub height: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Lab Quest".to_string(),
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Pixels moved per tick on each active axis
    pub step: i32,
    pub hitbox_width: i32,
    pub hitbox_height: i32,
    /// Distance from the sprite centre down to the hitbox centre
    pub foot_offset: i32,
    /// Ticks between walk-cycle frames
    pub frame_delay: u32,
    /// Max distance (px) to talk to an NPC or start a station
    pub interact_radius: i32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            step: 4,
            hitbox_width: 40,
            hitbox_height: 18,
            foot_offset: 30,
            frame_delay: 8,
            interact_radius: 72,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    pub reveal_chars_per_tick: usize,
    pub page_chars: usize,
    pub cooldown_ticks: u32,
    pub question_cooldown_ticks: u32,
    /// Extra ticks ignored after ENTER is released on a fresh question
    pub question_drain_ticks: u32,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            reveal_chars_per_tick: 2,
            page_chars: 140,
            cooldown_ticks: 8,
            question_cooldown_ticks: 20,
            question_drain_ticks: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Tried in order; the first readable image wins
    pub tileset_candidates: Vec<String>,
    pub questions: String,
    pub challenges: String,
    pub player_sprite: String,
    pub npc_sprite: String,
    pub font: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            tileset_candidates: vec![
                "assets/tilesets/lab.png".to_string(),
                "assets/tilesets/tileset.png".to_string(),
                "assets/tileset.png".to_string(),
            ],
            questions: "assets/content/questions.toml".to_string(),
            challenges: "assets/content/challenges.toml".to_string(),
            player_sprite: "assets/sprites/player.png".to_string(),
            npc_sprite: "assets/sprites/npc.png".to_string(),
            font: "assets/fonts/ui.ttf".to_string(),
        }
    }
}

impl GameConfig {
    /// Read settings. A missing file gives the defaults; an unreadable or
    /// malformed one is an error for the caller to report.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents).map_err(|e| format!("{} in {:?}", e, path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(format!("Failed to read config {:?}: {}", path, e)),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| format!("Invalid config: {}", e))
    }

    /// Default log filter for env_logger; RUST_LOG still wins
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}
