use macroquad::math::IVec2;

/// Scrolling window over the map, kept centred on a focus point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Camera {
    /// Top-left corner of the viewport in map pixels
    pub scroll: IVec2,
    pub viewport: IVec2,
    pub map_size: IVec2,
}

impl Camera {
    pub fn new(viewport: IVec2, map_size: IVec2) -> Self {
        Self {
            scroll: IVec2::ZERO,
            viewport,
            map_size,
        }
    }

    /// Recentre on `focus` (map pixels), clamped to the map bounds.
    /// An axis where the map fits inside the viewport stays pinned at 0.
    pub fn update(&mut self, focus: IVec2) {
        self.scroll = IVec2::new(
            clamp_axis(focus.x - self.viewport.x / 2, self.map_size.x - self.viewport.x),
            clamp_axis(focus.y - self.viewport.y / 2, self.map_size.y - self.viewport.y),
        );
    }

    pub fn screen_to_map(&self, screen: IVec2) -> IVec2 {
        screen + self.scroll
    }

    pub fn map_to_screen(&self, map: IVec2) -> IVec2 {
        map - self.scroll
    }

    pub fn set_map_size(&mut self, map_size: IVec2) {
        self.map_size = map_size;
    }
}

fn clamp_axis(value: i32, max_scroll: i32) -> i32 {
    value.clamp(0, max_scroll.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        // 20x15 tiles at 48px
        Camera::new(IVec2::new(800, 600), IVec2::new(960, 720))
    }

    #[test]
    fn test_centres_on_focus() {
        let mut cam = camera();
        cam.update(IVec2::new(480, 360));
        assert_eq!(cam.scroll, IVec2::new(80, 60));
        assert_eq!(cam.map_to_screen(IVec2::new(480, 360)), IVec2::new(400, 300));
        assert_eq!(cam.screen_to_map(IVec2::new(400, 300)), IVec2::new(480, 360));
    }

    #[test]
    fn test_clamps_to_map_bounds() {
        let mut cam = camera();
        for x in (-200..1300).step_by(37) {
            for y in (-200..1000).step_by(41) {
                cam.update(IVec2::new(x, y));
                assert!(cam.scroll.x >= 0 && cam.scroll.x <= 960 - 800);
                assert!(cam.scroll.y >= 0 && cam.scroll.y <= 720 - 600);
            }
        }

        cam.update(IVec2::new(0, 0));
        assert_eq!(cam.scroll, IVec2::ZERO);
        cam.update(IVec2::new(5000, 5000));
        assert_eq!(cam.scroll, IVec2::new(160, 120));
    }

    #[test]
    fn test_small_map_pins_scroll() {
        let mut cam = Camera::new(IVec2::new(800, 600), IVec2::new(480, 600));
        for x in [-50, 0, 240, 479, 2000] {
            cam.update(IVec2::new(x, x));
            assert_eq!(cam.scroll, IVec2::ZERO);
        }
    }
}
