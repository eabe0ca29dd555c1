//! Tileset images and CPU-side map compositing.
//!
//! Maps are painted once into a single [`Image`] at load time. When no
//! tileset image can be read, tiles are painted as flat palette colours so a
//! map always has something to show.

use macroquad::color::Color;
use macroquad::texture::Image;
use std::path::Path;

/// Source of tile pixels for a map
#[derive(Debug, Clone)]
pub enum Tileset {
    /// Regular grid atlas
    Atlas {
        image: Image,
        tile_size: u32,
        columns: u32,
        first_gid: u32,
    },
    /// No image available; every GID gets a palette colour
    Flat { tile_size: u32 },
}

impl Tileset {
    /// Try each candidate path in order, falling back to flat colours
    pub fn load(candidates: &[String], tile_size: u32, first_gid: u32) -> Self {
        for candidate in candidates {
            match load_image_file(Path::new(candidate)) {
                Ok(image) => match Self::from_image(image, tile_size, first_gid) {
                    Some(tileset) => {
                        log::info!("Loaded tileset {}", candidate);
                        return tileset;
                    }
                    None => log::debug!("Tileset {} is smaller than one tile", candidate),
                },
                Err(e) => log::debug!("Tileset candidate {} not usable: {}", candidate, e),
            }
        }
        log::warn!("No tileset image found, using flat colour tiles");
        Tileset::Flat { tile_size }
    }

    pub fn from_image(image: Image, tile_size: u32, first_gid: u32) -> Option<Self> {
        if tile_size == 0 {
            return None;
        }
        let columns = image.width as u32 / tile_size;
        if columns == 0 || (image.height as u32) < tile_size {
            return None;
        }
        Some(Tileset::Atlas {
            image,
            tile_size,
            columns,
            first_gid: first_gid.max(1),
        })
    }

    pub fn flat(tile_size: u32) -> Self {
        Tileset::Flat { tile_size }
    }

    pub fn tile_size(&self) -> u32 {
        match self {
            Tileset::Atlas { tile_size, .. } | Tileset::Flat { tile_size } => *tile_size,
        }
    }

    /// Paint one tile into `target` with its top-left at (`px`, `py`).
    /// GID 0 is empty and paints nothing.
    pub fn paint_tile(&self, target: &mut Image, gid: u32, px: u32, py: u32) {
        if gid == 0 {
            return;
        }
        match self {
            Tileset::Flat { tile_size } => {
                fill_rect(target, px, py, *tile_size, *tile_size, flat_tile_color(gid));
            }
            Tileset::Atlas { image, tile_size, columns, first_gid } => {
                let Some(local) = gid.checked_sub(*first_gid) else {
                    return;
                };
                let src_x = (local % columns) * tile_size;
                let src_y = (local / columns) * tile_size;
                if src_y + tile_size > image.height as u32 {
                    // GID past the end of the atlas
                    fill_rect(target, px, py, *tile_size, *tile_size, flat_tile_color(gid));
                    return;
                }
                blit(image, src_x, src_y, *tile_size, *tile_size, target, px, py);
            }
        }
    }

    /// Composite grids in order (first is bottom-most) into one map image
    pub fn composite(&self, width_tiles: u32, height_tiles: u32, grids: &[&[u32]]) -> Image {
        let ts = self.tile_size();
        let mut image = Image::gen_image_color(
            width_tiles.saturating_mul(ts).min(u16::MAX as u32) as u16,
            height_tiles.saturating_mul(ts).min(u16::MAX as u32) as u16,
            Color::new(0.0, 0.0, 0.0, 0.0),
        );
        for grid in grids {
            for ty in 0..height_tiles {
                for tx in 0..width_tiles {
                    let gid = grid.get((ty * width_tiles + tx) as usize).copied().unwrap_or(0);
                    self.paint_tile(&mut image, gid, tx * ts, ty * ts);
                }
            }
        }
        image
    }
}

fn load_image_file(path: &Path) -> Result<Image, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    Image::from_file_with_format(&bytes, None).map_err(|e| e.to_string())
}

/// Deterministic colour for a tile when no atlas is loaded
pub fn flat_tile_color(gid: u32) -> Color {
    match gid % 8 {
        0 => Color::from_rgba(70, 70, 75, 255),   // Stone floor
        1 => Color::from_rgba(110, 100, 90, 255), // Tiles
        2 => Color::from_rgba(60, 50, 40, 255),   // Wood
        3 => Color::from_rgba(80, 80, 90, 255),   // Bench
        4 => Color::from_rgba(40, 60, 100, 255),  // Glass
        5 => Color::from_rgba(90, 70, 50, 255),   // Cabinet
        6 => Color::from_rgba(60, 90, 50, 255),   // Plants
        _ => Color::from_rgba(100, 50, 100, 255), // Unknown
    }
}

fn fill_rect(target: &mut Image, x: u32, y: u32, w: u32, h: u32, color: Color) {
    let tw = target.width as u32;
    let th = target.height as u32;
    let rgba: [u8; 4] = color.into();
    for py in y..(y + h).min(th) {
        for px in x..(x + w).min(tw) {
            let idx = ((py * tw + px) * 4) as usize;
            target.bytes[idx..idx + 4].copy_from_slice(&rgba);
        }
    }
}

/// Alpha-blend a source region over `target`
#[allow(clippy::too_many_arguments)]
fn blit(src: &Image, sx: u32, sy: u32, w: u32, h: u32, target: &mut Image, dx: u32, dy: u32) {
    let sw = src.width as u32;
    let tw = target.width as u32;
    let th = target.height as u32;
    for row in 0..h {
        let ty = dy + row;
        if ty >= th {
            break;
        }
        for col in 0..w {
            let tx = dx + col;
            if tx >= tw {
                break;
            }
            let s = (((sy + row) * sw + sx + col) * 4) as usize;
            let t = ((ty * tw + tx) * 4) as usize;
            let alpha = src.bytes[s + 3] as u32;
            if alpha == 0 {
                continue;
            }
            if alpha == 255 {
                target.bytes[t..t + 4].copy_from_slice(&src.bytes[s..s + 4]);
                continue;
            }
            for c in 0..3 {
                let over = src.bytes[s + c] as u32 * alpha;
                let under = target.bytes[t + c] as u32 * (255 - alpha);
                target.bytes[t + c] = ((over + under) / 255) as u8;
            }
            let under_alpha = target.bytes[t + 3] as u32;
            target.bytes[t + 3] = (alpha + under_alpha * (255 - alpha) / 255).min(255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(image: &Image, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * image.width as u32 + x) * 4) as usize;
        [image.bytes[idx], image.bytes[idx + 1], image.bytes[idx + 2], image.bytes[idx + 3]]
    }

    #[test]
    fn test_missing_candidates_fall_back_to_flat() {
        let tileset = Tileset::load(&["nope/a.png".to_string(), "nope/b.png".to_string()], 16, 1);
        assert!(matches!(tileset, Tileset::Flat { tile_size: 16 }));
        assert_eq!(tileset.tile_size(), 16);
    }

    #[test]
    fn test_flat_composite_layers_in_order() {
        let tileset = Tileset::flat(2);
        let floor = [1u32, 1, 1, 1];
        let objects = [0u32, 5, 0, 0];
        let image = tileset.composite(2, 2, &[&floor, &objects]);

        assert_eq!((image.width, image.height), (4, 4));
        let floor_rgba: [u8; 4] = flat_tile_color(1).into();
        let object_rgba: [u8; 4] = flat_tile_color(5).into();
        assert_eq!(pixel(&image, 0, 0), floor_rgba);
        // Object tile painted over floor in the top-right cell
        assert_eq!(pixel(&image, 2, 0), object_rgba);
        assert_eq!(pixel(&image, 3, 1), object_rgba);
        assert_eq!(pixel(&image, 2, 2), floor_rgba);
    }

    #[test]
    fn test_atlas_lookup_uses_first_gid() {
        // 2x1 atlas of 1px tiles: red then blue
        let mut atlas = Image::gen_image_color(2, 1, Color::from_rgba(255, 0, 0, 255));
        atlas.set_pixel(1, 0, Color::from_rgba(0, 0, 255, 255));
        let tileset = Tileset::from_image(atlas, 1, 1).unwrap();

        let image = tileset.composite(3, 1, &[&[1, 2, 0]]);
        assert_eq!(pixel(&image, 0, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&image, 1, 0), [0, 0, 255, 255]);
        assert_eq!(pixel(&image, 2, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_transparent_atlas_pixels_keep_floor() {
        let mut atlas = Image::gen_image_color(2, 1, Color::from_rgba(10, 20, 30, 255));
        atlas.set_pixel(1, 0, Color::from_rgba(0, 0, 0, 0));
        let tileset = Tileset::from_image(atlas, 1, 1).unwrap();

        let image = tileset.composite(1, 1, &[&[1], &[2]]);
        let expected: [u8; 4] = Color::from_rgba(10, 20, 30, 255).into();
        assert_eq!(pixel(&image, 0, 0), expected);
    }
}
