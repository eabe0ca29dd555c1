use macroquad::prelude::*;
use std::collections::HashMap;

use super::animation::WALK_FRAMES;
use super::brightness::{adjust_brightness, depth_brightness_delta};
use super::font::BitmapFont;
use crate::config::GameConfig;
use crate::game::{Session, WorldKind};

/// Rows in the player sheet, one per direction
const SHEET_ROWS: f32 = 8.0;
/// Box drawn when a sprite is missing
const FALLBACK_SPRITE_SIZE: Vec2 = Vec2::new(32.0, 48.0);

const PLAYER_FALLBACK_COLOR: Color = Color::new(0.39, 0.59, 1.0, 1.0);
const NPC_FALLBACK_COLOR: Color = Color::new(0.95, 0.75, 0.35, 1.0);
const STATION_COLOR: Color = Color::new(0.45, 0.75, 0.95, 1.0);
const STATION_DONE_COLOR: Color = Color::new(0.45, 0.90, 0.55, 1.0);

/// Identifies which map the cached textures were built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MapKey {
    kind: WorldKind,
    repaired: bool,
    generation: u64,
}

#[derive(Default)]
struct MapTextures {
    key: Option<MapKey>,
    full: Option<Texture2D>,
    on_top: Option<Texture2D>,
}

pub struct Renderer {
    /// Multi-size pixel font for sharp text rendering at various sizes
    font: BitmapFont,
    /// Player sheet: rows = directions, columns = walk frames
    player_sheet: Option<Texture2D>,
    /// CPU copy of the NPC sprite, shaded per depth on demand
    npc_image: Option<Image>,
    /// NPC textures by brightness delta
    npc_shaded: HashMap<i16, Texture2D>,
    map: MapTextures,
    frames_per_row: usize,
}

impl Renderer {
    pub async fn new(config: &GameConfig) -> Self {
        let player_sheet = match load_texture(&config.assets.player_sprite).await {
            Ok(tex) => {
                tex.set_filter(FilterMode::Nearest);
                log::info!("Loaded player sprite sheet: {}x{}", tex.width(), tex.height());
                Some(tex)
            }
            Err(e) => {
                log::warn!("Failed to load player sprite {}: {}. Drawing boxes.", config.assets.player_sprite, e);
                None
            }
        };

        let npc_image = match load_image(&config.assets.npc_sprite).await {
            Ok(image) => {
                log::info!("Loaded NPC sprite: {}x{}", image.width, image.height);
                Some(image)
            }
            Err(e) => {
                log::warn!("Failed to load NPC sprite {}: {}. Drawing boxes.", config.assets.npc_sprite, e);
                None
            }
        };

        let font = BitmapFont::load_or_default(&config.assets.font);
        if font.is_loaded() {
            log::info!("Loaded bitmap font at multiple sizes");
        }

        Self {
            font,
            player_sheet,
            npc_image,
            npc_shaded: HashMap::new(),
            map: MapTextures::default(),
            frames_per_row: WALK_FRAMES,
        }
    }

    /// Draw text with pixel font for sharp rendering
    pub fn draw_text_sharp(&self, text: &str, x: f32, y: f32, font_size: f32, color: Color) {
        self.font.draw_text(text, x, y, font_size, color);
    }

    pub(crate) fn measure_text_sharp(&self, text: &str, font_size: f32) -> TextDimensions {
        self.font.measure_text(text, font_size)
    }

    /// Draw text with word wrapping to fit within max_width.
    /// Explicit newlines always break. Returns the total height used.
    pub(crate) fn draw_text_wrapped(
        &self,
        text: &str,
        x: f32,
        y: f32,
        font_size: f32,
        color: Color,
        max_width: f32,
        line_height: f32,
    ) -> f32 {
        let mut current_y = y;
        let space_width = self.measure_text_sharp(" ", font_size).width;

        for paragraph in text.split('\n') {
            let mut current_line = String::new();
            for word in paragraph.split_whitespace() {
                let word_width = self.measure_text_sharp(word, font_size).width;
                let line_width = if current_line.is_empty() {
                    word_width
                } else {
                    self.measure_text_sharp(&current_line, font_size).width + space_width + word_width
                };

                if line_width > max_width && !current_line.is_empty() {
                    self.draw_text_sharp(&current_line, x, current_y, font_size, color);
                    current_y += line_height;
                    current_line = word.to_string();
                } else {
                    if !current_line.is_empty() {
                        current_line.push(' ');
                    }
                    current_line.push_str(word);
                }
            }
            if !current_line.is_empty() {
                self.draw_text_sharp(&current_line, x, current_y, font_size, color);
            }
            current_y += line_height;
        }

        current_y - y
    }

    /// Rebuild map textures when the world or its map generation changed
    fn sync_map_textures(&mut self, session: &Session) {
        let world = session.world();
        let key = MapKey {
            kind: world.kind(),
            repaired: world.is_repaired(),
            generation: world.map_generation(),
        };
        if self.map.key == Some(key) {
            return;
        }

        self.map = MapTextures {
            key: Some(key),
            ..Default::default()
        };
        if let Some(map) = world.map() {
            let full = Texture2D::from_image(&map.full_map_image());
            full.set_filter(FilterMode::Nearest);
            self.map.full = Some(full);
            self.map.on_top = map.on_top_image().map(|image| {
                let tex = Texture2D::from_image(&image);
                tex.set_filter(FilterMode::Nearest);
                tex
            });
            log::debug!("Uploaded map textures for {:?} (generation {})", key.kind, key.generation);
        }
    }

    /// NPC texture shaded by `delta`, built on first use
    fn npc_texture(&mut self, delta: i16) -> Option<Texture2D> {
        let image = self.npc_image.as_ref()?;
        let tex = self.npc_shaded.entry(delta).or_insert_with(|| {
            let tex = Texture2D::from_image(&adjust_brightness(image, delta));
            tex.set_filter(FilterMode::Nearest);
            tex
        });
        Some(tex.clone())
    }

    pub fn render(&mut self, session: &Session) {
        let world = session.world();
        clear_background(world.kind().fallback_color());
        self.sync_map_textures(session);

        let scroll = world.camera().scroll.as_vec2();

        // 1. Base map
        if let Some(tex) = &self.map.full {
            draw_texture(tex, -scroll.x, -scroll.y, WHITE);
        }

        // 2. Stations
        for station in &world.stations {
            let pos = station.screen_pos.as_vec2();
            let done = session.state().is_challenge_completed(&station.challenge_id);
            let color = if done { STATION_DONE_COLOR } else { STATION_COLOR };
            draw_rectangle(pos.x - 16.0, pos.y - 16.0, 32.0, 32.0, color);
            draw_rectangle_lines(pos.x - 16.0, pos.y - 16.0, 32.0, 32.0, 2.0, BLACK);
            if let Some(config) = session.catalog().get(&station.challenge_id) {
                self.draw_label_centered(&config.title, pos.x, pos.y - 22.0, WHITE);
            }
        }

        // 3. NPCs, shaded by depth
        let map_height = world.map_size().y;
        for npc in &world.npcs {
            let pos = npc.screen_pos.as_vec2();
            let delta = depth_brightness_delta(npc.map_pos.y, map_height);
            match self.npc_texture(delta) {
                Some(tex) => {
                    let (w, h) = (tex.width(), tex.height());
                    draw_texture(&tex, (pos.x - w / 2.0).floor(), (pos.y - h).floor(), WHITE);
                    self.draw_label_centered(&npc.name, pos.x, pos.y - h - 4.0, WHITE);
                }
                None => {
                    let size = FALLBACK_SPRITE_SIZE;
                    draw_rectangle(pos.x - size.x / 2.0, pos.y - size.y, size.x, size.y, NPC_FALLBACK_COLOR);
                    self.draw_label_centered(&npc.name, pos.x, pos.y - size.y - 4.0, WHITE);
                }
            }
        }

        // 4. Player
        self.render_player(session);

        // 5. Overlay drawn above characters
        if let Some(tex) = &self.map.on_top {
            draw_texture(tex, -scroll.x, -scroll.y, WHITE);
        }

        if session.config().debug {
            self.render_debug(session);
        }

        // 6. UI
        self.render_hud(session);
        if let Some(active) = session.challenge() {
            self.render_challenge(&active.challenge);
        }
        let dialogue = session.dialogue();
        if let Some(active) = dialogue.active() {
            self.render_dialogue(active, dialogue.dialogue_box(), dialogue.is_accepting_input());
        }
    }

    fn render_player(&self, session: &Session) {
        let player = session.player();
        let pos = session.player_screen_pos().as_vec2();

        match &self.player_sheet {
            Some(sheet) => {
                let frame_w = sheet.width() / self.frames_per_row as f32;
                let frame_h = sheet.height() / SHEET_ROWS;
                let (col, row) = player.animation.sprite_cell();
                draw_texture_ex(
                    sheet,
                    (pos.x - frame_w / 2.0).floor(),
                    (pos.y - frame_h / 2.0).floor(),
                    WHITE,
                    DrawTextureParams {
                        source: Some(Rect::new(col as f32 * frame_w, row as f32 * frame_h, frame_w, frame_h)),
                        ..Default::default()
                    },
                );
            }
            None => {
                let size = FALLBACK_SPRITE_SIZE;
                draw_rectangle(pos.x - size.x / 2.0, pos.y - size.y / 2.0, size.x, size.y, PLAYER_FALLBACK_COLOR);
                // Facing tick
                let dir = player.facing.axis().as_vec2() * 14.0;
                draw_line(pos.x, pos.y, pos.x + dir.x, pos.y + dir.y, 3.0, WHITE);
            }
        }
    }

    /// Collision boxes, exits and the player hitbox
    fn render_debug(&self, session: &Session) {
        let world = session.world();
        let camera = world.camera();
        let outline = |rect: &crate::game::CollisionRect, color: Color| {
            let p = camera.map_to_screen(IVec2::new(rect.x, rect.y)).as_vec2();
            draw_rectangle_lines(p.x, p.y, rect.w as f32, rect.h as f32, 1.0, color);
        };

        if let Some(map) = world.map() {
            for rect in map.collision_rects() {
                outline(rect, RED);
            }
        }
        for exit in &world.exits {
            outline(&exit.rect, SKYBLUE);
        }
        outline(&session.player().hitbox_rect(), YELLOW);

        let p = session.player().position;
        self.draw_text_sharp(&format!("map ({}, {})", p.x, p.y), 8.0, screen_height() - 8.0, 16.0, WHITE);
    }

    fn draw_label_centered(&self, text: &str, x: f32, y: f32, color: Color) {
        let width = self.measure_text_sharp(text, 16.0).width;
        let lx = (x - width / 2.0).floor();
        self.draw_text_sharp(text, lx + 1.0, y + 1.0, 16.0, BLACK);
        self.draw_text_sharp(text, lx, y, 16.0, color);
    }
}
