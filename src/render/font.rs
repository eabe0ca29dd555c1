//! Multi-size pixel font for sharp text
//!
//! The font is rasterized once per native size so text is never scaled
//! from a mismatched atlas. Without a font file, macroquad's built-in font
//! is used.

use macroquad::prelude::*;
use std::collections::HashMap;

/// Native sizes the font is rasterized at
pub const FONT_SIZES: &[u16] = &[12, 16, 20, 24, 32];

#[derive(Default)]
pub struct BitmapFont {
    fonts: HashMap<u16, Font>,
}

impl BitmapFont {
    /// Load `path` at every native size; an unreadable file leaves the font empty
    pub fn load_or_default(path: &str) -> Self {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Font {} not available ({}), using built-in font", path, e);
                return Self::default();
            }
        };

        let mut fonts = HashMap::new();
        for &size in FONT_SIZES {
            match load_ttf_font_from_bytes(&bytes) {
                Ok(mut font) => {
                    font.set_filter(FilterMode::Nearest);
                    fonts.insert(size, font);
                }
                Err(e) => log::warn!("Failed to load font {} at size {}: {}", path, size, e),
            }
        }
        Self { fonts }
    }

    /// Largest native size not above `requested`
    fn closest_size(requested: f32) -> u16 {
        let requested = requested.round() as u16;
        FONT_SIZES
            .iter()
            .rev()
            .find(|&&s| s <= requested)
            .copied()
            .unwrap_or(FONT_SIZES[0])
    }

    pub fn draw_text(&self, text: &str, x: f32, y: f32, font_size: f32, color: Color) {
        let native = Self::closest_size(font_size);
        match self.fonts.get(&native) {
            Some(font) => {
                draw_text_ex(
                    text,
                    x.floor(),
                    y.floor(),
                    TextParams {
                        font: Some(font),
                        font_size: native,
                        font_scale: font_size / native as f32,
                        color,
                        ..Default::default()
                    },
                );
            }
            None => {
                draw_text(text, x.floor(), y.floor(), font_size, color);
            }
        }
    }

    pub fn measure_text(&self, text: &str, font_size: f32) -> TextDimensions {
        let native = Self::closest_size(font_size);
        match self.fonts.get(&native) {
            Some(font) => measure_text(text, Some(font), native, font_size / native as f32),
            None => measure_text(text, None, font_size as u16, 1.0),
        }
    }

    pub fn is_loaded(&self) -> bool {
        !self.fonts.is_empty()
    }
}
