//! Per-pixel brightness shifts used for fake depth shading

use macroquad::texture::Image;

/// Strongest darkening applied at the top edge of the map
pub const MAX_DEPTH_DARKEN: i16 = 60;
/// Deltas are snapped to this step so shaded variants can be cached
pub const DEPTH_STEP: i16 = 10;

/// Copy of `image` with `delta` added to every colour channel (alpha kept)
pub fn adjust_brightness(image: &Image, delta: i16) -> Image {
    let mut out = image.clone();
    if delta == 0 {
        return out;
    }
    for px in out.bytes.chunks_exact_mut(4) {
        for channel in &mut px[..3] {
            *channel = (*channel as i16 + delta).clamp(0, 255) as u8;
        }
    }
    out
}

/// Brightness delta for something standing at `map_y` on a map `map_height`
/// pixels tall: full brightness at the bottom, darker toward the top.
pub fn depth_brightness_delta(map_y: i32, map_height: i32) -> i16 {
    if map_height <= 0 {
        return 0;
    }
    let y = map_y.clamp(0, map_height) as i64;
    let raw = -(MAX_DEPTH_DARKEN as i64) * (map_height as i64 - y) / map_height as i64;
    // Snap toward zero so nearby positions share a variant
    (raw as i16 / DEPTH_STEP) * DEPTH_STEP
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::color::Color;

    fn image_with(rgba: [u8; 4]) -> Image {
        let mut image = Image::gen_image_color(2, 1, Color::from_rgba(0, 0, 0, 0));
        for px in image.bytes.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        image
    }

    #[test]
    fn test_brighten_and_darken_clamp() {
        let image = image_with([10, 128, 250, 200]);

        let brighter = adjust_brightness(&image, 20);
        assert_eq!(&brighter.bytes[..4], &[30, 148, 255, 200]);

        let darker = adjust_brightness(&image, -20);
        assert_eq!(&darker.bytes[..4], &[0, 108, 230, 200]);

        // Source untouched
        assert_eq!(&image.bytes[..4], &[10, 128, 250, 200]);
        assert_eq!((darker.width, darker.height), (2, 1));
    }

    #[test]
    fn test_zero_delta_is_identity() {
        let image = image_with([1, 2, 3, 4]);
        assert_eq!(adjust_brightness(&image, 0).bytes, image.bytes);
    }

    #[test]
    fn test_depth_delta() {
        assert_eq!(depth_brightness_delta(720, 720), 0);
        assert_eq!(depth_brightness_delta(0, 720), -MAX_DEPTH_DARKEN);
        assert_eq!(depth_brightness_delta(360, 720), -30);
        assert_eq!(depth_brightness_delta(-50, 720), -MAX_DEPTH_DARKEN);
        assert_eq!(depth_brightness_delta(100, 0), 0);
        // Snapped to the cache step
        assert_eq!(depth_brightness_delta(500, 720) % DEPTH_STEP, 0);
    }
}
