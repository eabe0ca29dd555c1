//! Overlay for a running station challenge

use macroquad::prelude::*;

use super::super::Renderer;
use super::common::*;
use crate::game::quest::{Challenge, ChallengeMode};

const PANEL_WIDTH: f32 = 420.0;
const PANEL_HEIGHT: f32 = 170.0;

impl Renderer {
    pub(crate) fn render_challenge(&self, challenge: &Challenge) {
        let config = challenge.config();
        let x = ((screen_width() - PANEL_WIDTH) / 2.0).floor();
        let y = ((screen_height() - PANEL_HEIGHT) / 3.0).floor();

        self.draw_panel_frame(x, y, PANEL_WIDTH, PANEL_HEIGHT);
        self.draw_corner_accents(x, y, PANEL_WIDTH, PANEL_HEIGHT);

        let content_x = x + FRAME_THICKNESS + 12.0;
        let content_w = PANEL_WIDTH - (FRAME_THICKNESS + 12.0) * 2.0;
        let mut cy = y + FRAME_THICKNESS + 22.0;

        self.draw_text_sharp(&config.title.to_uppercase(), content_x, cy, TEXT_SIZE, TEXT_TITLE);
        let prompt = format!("[{}]", config.key.label());
        let prompt_w = self.measure_text_sharp(&prompt, TEXT_SIZE).width;
        self.draw_text_sharp(&prompt, content_x + content_w - prompt_w, cy, TEXT_SIZE, FRAME_ACCENT);

        cy += 8.0;
        draw_line(content_x, cy, content_x + content_w, cy, 1.0, HEADER_BORDER);
        cy += 20.0;
        let used = self.draw_text_wrapped(&config.hint, content_x, cy, TEXT_SIZE, TEXT_NORMAL, content_w, LINE_HEIGHT);
        cy += used.max(LINE_HEIGHT);

        // Timing track with the sweet spot and moving marker
        if let (ChallengeMode::Timing { period_ticks, window_ticks }, Some(marker)) = (config.mode, challenge.marker()) {
            let period = period_ticks.max(1) as f32;
            let track_h = 14.0;
            draw_rectangle(content_x, cy, content_w, track_h, ROW_BG);
            let centre = (period_ticks.max(1) / 2) as f32;
            let win_x = content_x + (centre - window_ticks as f32).max(0.0) / period * content_w;
            let win_w = (window_ticks as f32 * 2.0 + 1.0) / period * content_w;
            draw_rectangle(win_x, cy, win_w.min(content_w), track_h, ROW_SELECTED_BG);
            draw_rectangle_lines(win_x, cy, win_w.min(content_w), track_h, 1.0, ROW_SELECTED_BORDER);
            let mx = content_x + marker as f32 / period * content_w;
            let marker_color = if challenge.in_window() { TEXT_GOOD } else { TEXT_NORMAL };
            draw_rectangle(mx - 1.0, cy - 3.0, 3.0, track_h + 6.0, marker_color);
            cy += track_h + 12.0;
        }

        // Time left
        let total = config.duration_ticks.max(1) as f32;
        self.draw_progress_bar(content_x, cy, content_w, EXP_BAR_HEIGHT, challenge.remaining_ticks() as f32 / total);
        cy += EXP_BAR_HEIGHT + 18.0;

        let counts = format!("{} / {}", challenge.hits(), config.target);
        self.draw_text_sharp(&counts, content_x, cy, TEXT_SIZE, TEXT_NORMAL);
        if challenge.misses() > 0 {
            let misses = format!("misses {}", challenge.misses());
            let w = self.measure_text_sharp(&misses, TEXT_SIZE).width;
            self.draw_text_sharp(&misses, content_x + content_w - w, cy, TEXT_SIZE, TEXT_BAD);
        }
    }
}
