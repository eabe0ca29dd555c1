//! Common UI constants and panel drawing shared across UI components

use macroquad::prelude::*;

use super::super::Renderer;

// ============================================================================
// UI Color Palette - School Lab Theme
// ============================================================================

// Panel backgrounds
pub const PANEL_BG_DARK: Color = Color::new(0.063, 0.086, 0.118, 0.941);    // rgba(16, 22, 30, 240)
pub const PANEL_BG_MID: Color = Color::new(0.102, 0.133, 0.176, 1.0);       // rgba(26, 34, 45, 255)

// Frame/Border colors (chalkboard green and brass)
pub const FRAME_OUTER: Color = Color::new(0.125, 0.204, 0.165, 1.0);        // rgba(32, 52, 42, 255)
pub const FRAME_MID: Color = Color::new(0.263, 0.451, 0.345, 1.0);          // rgba(67, 115, 88, 255)
pub const FRAME_INNER: Color = Color::new(0.486, 0.698, 0.561, 1.0);        // rgba(124, 178, 143, 255)
pub const FRAME_ACCENT: Color = Color::new(0.855, 0.698, 0.424, 1.0);       // rgba(218, 178, 108, 255)

// Answer rows
pub const ROW_BG: Color = Color::new(0.086, 0.110, 0.141, 1.0);             // rgba(22, 28, 36, 255)
pub const ROW_BORDER: Color = Color::new(0.200, 0.243, 0.290, 1.0);         // rgba(51, 62, 74, 255)
pub const ROW_SELECTED_BG: Color = Color::new(0.157, 0.239, 0.208, 1.0);    // rgba(40, 61, 53, 255)
pub const ROW_SELECTED_BORDER: Color = Color::new(0.855, 0.737, 0.502, 1.0); // rgba(218, 188, 128, 255)

// Header
pub const HEADER_BG: Color = Color::new(0.118, 0.149, 0.157, 1.0);          // rgba(30, 38, 40, 255)
pub const HEADER_BORDER: Color = Color::new(0.333, 0.447, 0.388, 1.0);      // rgba(85, 114, 99, 255)

// Text colors
pub const TEXT_TITLE: Color = Color::new(0.855, 0.737, 0.502, 1.0);         // rgba(218, 188, 128, 255)
pub const TEXT_NORMAL: Color = Color::new(0.886, 0.906, 0.886, 1.0);        // rgba(226, 231, 226, 255)
pub const TEXT_DIM: Color = Color::new(0.502, 0.541, 0.541, 1.0);           // rgba(128, 138, 138, 255)
pub const TEXT_GOOD: Color = Color::new(0.471, 0.851, 0.549, 1.0);          // rgba(120, 217, 140, 255)
pub const TEXT_BAD: Color = Color::new(0.902, 0.396, 0.365, 1.0);           // rgba(230, 101, 93, 255)

// Experience bar colors - gold/amber theme
pub const EXP_BAR_BG: Color = Color::new(0.04, 0.04, 0.05, 1.0);            // rgba(10, 10, 13, 255)
pub const EXP_BAR_FILL_DARK: Color = Color::new(0.55, 0.40, 0.08, 1.0);     // rgba(140, 102, 20, 255)
pub const EXP_BAR_FILL_LIGHT: Color = Color::new(0.90, 0.70, 0.25, 1.0);    // rgba(230, 179, 64, 255)

// ============================================================================
// Layout Constants
// ============================================================================

pub const FRAME_THICKNESS: f32 = 4.0;
pub const CORNER_ACCENT_SIZE: f32 = 8.0;
pub const TEXT_SIZE: f32 = 16.0;
pub const LINE_HEIGHT: f32 = 22.0;
pub const ANSWER_ROW_HEIGHT: f32 = 24.0;
pub const ANSWER_ROW_SPACING: f32 = 28.0;
pub const EXP_BAR_HEIGHT: f32 = 12.0;

impl Renderer {
    /// Layered border with a dark fill
    pub(crate) fn draw_panel_frame(&self, x: f32, y: f32, w: f32, h: f32) {
        draw_rectangle(x, y, w, h, FRAME_OUTER);
        draw_rectangle(x + 1.0, y + 1.0, w - 2.0, h - 2.0, FRAME_MID);
        draw_rectangle(x + 2.0, y + 2.0, w - 4.0, h - 4.0, FRAME_INNER);
        draw_rectangle(
            x + FRAME_THICKNESS - 1.0,
            y + FRAME_THICKNESS - 1.0,
            w - (FRAME_THICKNESS - 1.0) * 2.0,
            h - (FRAME_THICKNESS - 1.0) * 2.0,
            PANEL_BG_MID,
        );
        draw_rectangle(
            x + FRAME_THICKNESS,
            y + FRAME_THICKNESS,
            w - FRAME_THICKNESS * 2.0,
            h - FRAME_THICKNESS * 2.0,
            PANEL_BG_DARK,
        );
    }

    pub(crate) fn draw_corner_accents(&self, x: f32, y: f32, w: f32, h: f32) {
        let s = CORNER_ACCENT_SIZE;
        for (cx, cy) in [(x, y), (x + w - s, y), (x, y + h - s), (x + w - s, y + h - s)] {
            draw_rectangle(cx, cy, s, 2.0, FRAME_ACCENT);
            draw_rectangle(cx, cy, 2.0, s, FRAME_ACCENT);
            draw_rectangle(cx + s - 2.0, cy, 2.0, s, FRAME_ACCENT);
            draw_rectangle(cx, cy + s - 2.0, s, 2.0, FRAME_ACCENT);
        }
    }

    /// Horizontal progress bar, `progress` in 0..=1
    pub(crate) fn draw_progress_bar(&self, x: f32, y: f32, w: f32, h: f32, progress: f32) {
        draw_rectangle(x - 1.0, y - 1.0, w + 2.0, h + 2.0, FRAME_OUTER);
        draw_rectangle(x, y, w, h, EXP_BAR_BG);
        let fill = w * progress.clamp(0.0, 1.0);
        if fill > 0.0 {
            draw_rectangle(x, y, fill, h, EXP_BAR_FILL_DARK);
            draw_rectangle(x, y, fill, (h / 2.0).floor(), EXP_BAR_FILL_LIGHT);
        }
    }
}
