//! Dialogue box rendering

use macroquad::prelude::*;

use super::super::Renderer;
use super::common::*;
use crate::game::dialogue::{ActiveDialogue, DialogueBox};

impl Renderer {
    pub(crate) fn render_dialogue(&self, dialogue: &ActiveDialogue, dialogue_box: DialogueBox, accepting_input: bool) {
        let box_x = dialogue_box.pos.x as f32;
        let box_width = dialogue_box.size.x as f32;

        // Questions grow upward to fit their answers
        let answer_area = dialogue
            .question()
            .map(|q| q.answers().len() as f32 * ANSWER_ROW_SPACING + 8.0)
            .unwrap_or(0.0);
        let box_height = dialogue_box.size.y as f32 + answer_area;
        let box_y = (dialogue_box.pos.y as f32 + dialogue_box.size.y as f32 - box_height).max(0.0);

        self.draw_panel_frame(box_x, box_y, box_width, box_height);
        self.draw_corner_accents(box_x, box_y, box_width, box_height);

        // ===== SPEAKER NAME TAB =====
        let speaker_text = dialogue.speaker().to_uppercase();
        let speaker_width = self.measure_text_sharp(&speaker_text, TEXT_SIZE).width + 28.0;
        let speaker_x = box_x + 20.0;
        let speaker_y = box_y - 8.0;
        let speaker_h = 26.0;

        draw_rectangle(speaker_x - 1.0, speaker_y - 1.0, speaker_width + 2.0, speaker_h + 2.0, FRAME_OUTER);
        draw_rectangle(speaker_x, speaker_y, speaker_width, speaker_h, HEADER_BG);
        draw_line(speaker_x + 2.0, speaker_y + 2.0, speaker_x + speaker_width - 2.0, speaker_y + 2.0, 1.0, FRAME_INNER);
        self.draw_text_sharp(&speaker_text, speaker_x + 14.0, speaker_y + 18.0, TEXT_SIZE, TEXT_TITLE);

        // ===== TEXT =====
        let content_x = box_x + FRAME_THICKNESS + 12.0;
        let content_y = box_y + FRAME_THICKNESS + 20.0;
        let content_width = box_width - FRAME_THICKNESS * 2.0 - 24.0;
        draw_line(content_x, content_y, content_x + content_width, content_y, 1.0, HEADER_BORDER);

        let text_height = self.draw_text_wrapped(
            dialogue.visible_text(),
            content_x,
            content_y + 26.0,
            TEXT_SIZE,
            TEXT_NORMAL,
            content_width,
            LINE_HEIGHT,
        );

        // ===== ANSWERS / CONTINUE =====
        let hint_y = box_y + box_height - FRAME_THICKNESS - 10.0;
        match (dialogue.question(), dialogue.selected()) {
            (Some(question), Some(selected)) => {
                let start_y = content_y + 26.0 + text_height.max(LINE_HEIGHT);
                for (i, answer) in question.answers().iter().enumerate() {
                    let row_y = start_y + i as f32 * ANSWER_ROW_SPACING;
                    let is_selected = i == selected;
                    let (bg, border) = if is_selected {
                        (ROW_SELECTED_BG, ROW_SELECTED_BORDER)
                    } else {
                        (ROW_BG, ROW_BORDER)
                    };
                    draw_rectangle(content_x, row_y, content_width, ANSWER_ROW_HEIGHT, border);
                    draw_rectangle(content_x + 1.0, row_y + 1.0, content_width - 2.0, ANSWER_ROW_HEIGHT - 2.0, bg);

                    let marker = if is_selected { ">" } else { " " };
                    let label = format!("{} [{}]", marker, i + 1);
                    let text_color = if is_selected { TEXT_TITLE } else { TEXT_NORMAL };
                    self.draw_text_sharp(&label, content_x + 6.0, row_y + ANSWER_ROW_HEIGHT * 0.7, TEXT_SIZE, FRAME_ACCENT);
                    self.draw_text_sharp(answer, content_x + 52.0, row_y + ANSWER_ROW_HEIGHT * 0.7, TEXT_SIZE, text_color);
                }
                self.draw_text_sharp("[1-4 / W S] Select   [Enter] Confirm", content_x, hint_y, TEXT_SIZE, TEXT_DIM);
            }
            _ => {
                let hint = if !dialogue.is_fully_revealed() {
                    "[Enter] Skip"
                } else if dialogue.has_next_page() {
                    "[Enter] Next"
                } else {
                    "[Enter] Close"
                };
                let color = if accepting_input { TEXT_DIM } else { Color::new(0.3, 0.3, 0.3, 1.0) };
                let width = self.measure_text_sharp(hint, TEXT_SIZE).width;
                self.draw_text_sharp(hint, box_x + box_width - width - FRAME_THICKNESS - 14.0, hint_y, TEXT_SIZE, color);

                if dialogue.page_count() > 1 {
                    let pages = format!("{}/{}", dialogue.page_index() + 1, dialogue.page_count());
                    self.draw_text_sharp(&pages, content_x, hint_y, TEXT_SIZE, TEXT_DIM);
                }
            }
        }
    }
}
