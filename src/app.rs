//! Window setup and the fixed-rate frame loop

use macroquad::prelude::*;

use crate::config::GameConfig;
use crate::game::Session;
use crate::input::InputHandler;
use crate::render::Renderer;

/// Simulation rate
pub const TICKS_PER_SECOND: f32 = 60.0;
/// Ticks run in one frame at most; a long stall drops time instead of spiralling
const MAX_TICKS_PER_FRAME: u32 = 5;

pub fn window_conf(config: &GameConfig) -> Conf {
    Conf {
        window_title: config.window.title.clone(),
        window_width: config.window.width,
        window_height: config.window.height,
        window_resizable: false,
        fullscreen: false,
        ..Default::default()
    }
}

/// Run ticks and draw until the window closes
pub async fn run_game(config: GameConfig) {
    let mut renderer = Renderer::new(&config).await;
    let mut session = Session::new(config);
    let mut input_handler = InputHandler::new();

    let tick_seconds = 1.0 / TICKS_PER_SECOND;
    let mut accumulator = 0.0;

    loop {
        accumulator += get_frame_time();

        let mut ticks = 0;
        while accumulator >= tick_seconds && ticks < MAX_TICKS_PER_FRAME {
            let frame = input_handler.poll();
            session.tick(&frame);
            accumulator -= tick_seconds;
            ticks += 1;
        }
        if ticks == MAX_TICKS_PER_FRAME {
            accumulator = 0.0;
        }

        renderer.render(&session);

        if session.config().debug {
            renderer.draw_text_sharp(
                &format!("FPS: {}  tick {}", get_fps(), session.ticks()),
                screen_width() - 160.0,
                20.0,
                16.0,
                WHITE,
            );
        }

        next_frame().await;
    }
}
