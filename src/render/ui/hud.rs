//! Progress HUD: level, XP bar, quiz counters and badges

use macroquad::prelude::*;

use super::super::Renderer;
use super::common::*;
use crate::game::question::LabTopic;
use crate::game::state::{QUIZ_GATE_TOTAL, QUIZ_PASS_CORRECT};
use crate::game::Session;

const HUD_X: f32 = 10.0;
const HUD_Y: f32 = 10.0;
const HUD_WIDTH: f32 = 220.0;

impl Renderer {
    pub(crate) fn render_hud(&self, session: &Session) {
        let state = session.state();
        let world = session.world();

        let topic = world.kind().topic();
        let badge_count = state.badges().count();
        let height = 76.0 + if topic.is_some() { LINE_HEIGHT } else { 0.0 } + if badge_count > 0 { LINE_HEIGHT } else { 0.0 };

        self.draw_panel_frame(HUD_X, HUD_Y, HUD_WIDTH, height);

        let x = HUD_X + FRAME_THICKNESS + 8.0;
        let mut y = HUD_Y + FRAME_THICKNESS + 18.0;
        self.draw_text_sharp(world.kind().display_name(), x, y, TEXT_SIZE, TEXT_TITLE);

        let level = format!("Lv {}", state.level());
        let level_w = self.measure_text_sharp(&level, TEXT_SIZE).width;
        self.draw_text_sharp(&level, HUD_X + HUD_WIDTH - FRAME_THICKNESS - 8.0 - level_w, y, TEXT_SIZE, TEXT_NORMAL);

        // ===== XP BAR =====
        y += 10.0;
        let bar_w = HUD_WIDTH - (FRAME_THICKNESS + 8.0) * 2.0;
        self.draw_progress_bar(x, y, bar_w, EXP_BAR_HEIGHT, state.level_progress_percent() as f32 / 100.0);
        y += EXP_BAR_HEIGHT + 18.0;
        self.draw_text_sharp(&format!("{} XP", state.xp()), x, y, TEXT_SIZE, TEXT_DIM);

        // ===== QUIZ =====
        if let Some(topic) = topic {
            y += LINE_HEIGHT;
            self.draw_quiz_line(session, topic, x, y);
        }

        if badge_count > 0 {
            y += LINE_HEIGHT;
            self.draw_text_sharp(&format!("Badges: {}", badge_count), x, y, TEXT_SIZE, FRAME_ACCENT);
        }
    }

    fn draw_quiz_line(&self, session: &Session, topic: LabTopic, x: f32, y: f32) {
        let state = session.state();
        let quiz = state.quiz(topic);
        let color = if state.is_lab_completed(topic) || state.is_quiz_passed(topic) {
            TEXT_GOOD
        } else if state.is_quiz_gate_complete(topic) {
            TEXT_BAD
        } else {
            TEXT_NORMAL
        };
        let text = if state.is_lab_completed(topic) {
            "Lab repaired".to_string()
        } else {
            format!(
                "Quiz {}/{}  correct {} (need {})",
                quiz.answered, QUIZ_GATE_TOTAL, quiz.correct, QUIZ_PASS_CORRECT
            )
        };
        self.draw_text_sharp(&text, x, y, TEXT_SIZE, color);
    }
}
