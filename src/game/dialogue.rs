//! Dialogue box state machine.
//!
//! One [`DialogueManager`] lives in the session and owns the only dialogue
//! that can be on screen. Plain dialogues are paged and revealed a few
//! characters per tick; question dialogues collect an answer and turn into
//! a response dialogue. Everything is driven by [`DialogueManager::process_input`],
//! which the session calls once per tick before any other gameplay logic.

use macroquad::math::IVec2;

use super::question::{DialogueQuestion, LabTopic};
use crate::config::DialogueConfig;
use crate::input::{InputFrame, Key};

const BOX_MAX_WIDTH: i32 = 700;
const BOX_HEIGHT: i32 = 150;
const BOX_MARGIN: i32 = 20;

/// Who asked for a dialogue, so its outcome can be routed back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    World,
    Npc(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogueBody {
    Text(String),
    Question(DialogueQuestion),
}

/// A dialogue waiting to be shown
#[derive(Debug, Clone, PartialEq)]
pub struct Dialogue {
    pub speaker: String,
    pub body: DialogueBody,
}

impl Dialogue {
    pub fn text(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            body: DialogueBody::Text(text.into()),
        }
    }

    pub fn question(speaker: impl Into<String>, question: DialogueQuestion) -> Self {
        Self {
            speaker: speaker.into(),
            body: DialogueBody::Question(question),
        }
    }

    pub fn is_question(&self) -> bool {
        matches!(self.body, DialogueBody::Question(_))
    }
}

/// What happened to the active dialogue this tick
#[derive(Debug, Clone, PartialEq)]
pub enum DialogueEvent {
    /// The last page was dismissed and nothing was queued
    Closed { requester: Requester },
    /// A question was answered; its response dialogue is now showing
    Answered {
        topic: LabTopic,
        correct: bool,
        requester: Requester,
    },
}

/// Screen rectangle of the dialogue box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogueBox {
    pub pos: IVec2,
    pub size: IVec2,
}

impl DialogueBox {
    /// Fixed bottom-centre placement for a viewport
    pub fn for_viewport(viewport: IVec2) -> Self {
        let width = (viewport.x - 2 * BOX_MARGIN).clamp(0, BOX_MAX_WIDTH);
        let height = BOX_HEIGHT.min(viewport.y);
        Self {
            pos: IVec2::new((viewport.x - width) / 2, (viewport.y - height - BOX_MARGIN).max(0)),
            size: IVec2::new(width, height),
        }
    }
}

/// The dialogue currently on screen
#[derive(Debug, Clone)]
pub struct ActiveDialogue {
    speaker: String,
    pages: Vec<String>,
    page: usize,
    /// Characters of the current page revealed so far
    revealed: usize,
    question: Option<DialogueQuestion>,
    selected: usize,
    requester: Requester,
}

impl ActiveDialogue {
    fn new(dialogue: Dialogue, requester: Requester, page_chars: usize) -> Self {
        let (pages, question) = match dialogue.body {
            DialogueBody::Text(text) => (paginate(&text, page_chars), None),
            DialogueBody::Question(q) => (vec![q.text().to_string()], Some(q)),
        };
        Self {
            speaker: dialogue.speaker,
            pages,
            page: 0,
            revealed: 0,
            question,
            selected: 0,
            requester,
        }
    }

    pub fn speaker(&self) -> &str {
        &self.speaker
    }

    pub fn page_index(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn has_next_page(&self) -> bool {
        self.page + 1 < self.pages.len()
    }

    fn current_page(&self) -> &str {
        self.pages.get(self.page).map(String::as_str).unwrap_or("")
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.revealed >= self.current_page().chars().count()
    }

    /// The typewriter-visible part of the current page
    pub fn visible_text(&self) -> &str {
        let page = self.current_page();
        match page.char_indices().nth(self.revealed) {
            Some((idx, _)) => &page[..idx],
            None => page,
        }
    }

    pub fn question(&self) -> Option<&DialogueQuestion> {
        self.question.as_ref()
    }

    /// Highlighted answer while a question is open
    pub fn selected(&self) -> Option<usize> {
        self.question.as_ref().map(|_| self.selected)
    }

    pub fn requester(&self) -> &Requester {
        &self.requester
    }

    fn reveal(&mut self, chars: usize) {
        let total = self.current_page().chars().count();
        self.revealed = (self.revealed + chars).min(total);
    }

    fn reveal_all(&mut self) {
        self.revealed = self.current_page().chars().count();
    }

    fn next_page(&mut self) {
        self.page += 1;
        self.revealed = 0;
    }
}

pub struct DialogueManager {
    config: DialogueConfig,
    dialogue_box: DialogueBox,
    active: Option<ActiveDialogue>,
    /// Single slot shown automatically after the active dialogue ends
    queued: Option<Dialogue>,
    cooldown: u32,
    /// Set when ENTER triggers an action, cleared when ENTER is released
    enter_latched: bool,
    /// Fresh question still waiting to see ENTER released
    awaiting_release: bool,
    drain: u32,
}

impl DialogueManager {
    pub fn new(config: DialogueConfig, viewport: IVec2) -> Self {
        Self {
            config,
            dialogue_box: DialogueBox::for_viewport(viewport),
            active: None,
            queued: None,
            cooldown: 0,
            enter_latched: false,
            awaiting_release: false,
            drain: 0,
        }
    }

    /// Show `dialogue` unless one is already on screen
    pub fn show_dialogue(&mut self, dialogue: Dialogue, requester: Requester) -> bool {
        if self.active.is_some() {
            log::debug!("Rejected dialogue from {:?}: another dialogue is active", requester);
            return false;
        }
        self.activate(dialogue, requester);
        true
    }

    /// Set the dialogue to show once the active one finishes. Overwrites any earlier one.
    pub fn queue_dialogue(&mut self, dialogue: Dialogue) {
        if self.queued.is_some() {
            log::debug!("Replacing queued dialogue");
        }
        self.queued = Some(dialogue);
    }

    pub fn is_dialogue_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn has_queued(&self) -> bool {
        self.queued.is_some()
    }

    pub fn active(&self) -> Option<&ActiveDialogue> {
        self.active.as_ref()
    }

    pub fn dialogue_box(&self) -> DialogueBox {
        self.dialogue_box
    }

    /// Close the active dialogue and drop anything queued
    pub fn hide_dialogue(&mut self) {
        if self.active.take().is_some() {
            self.queued = None;
            self.cooldown = 0;
            self.awaiting_release = false;
            self.drain = 0;
        }
    }

    /// Forget everything; used when the world is replaced
    pub fn reset(&mut self) {
        self.active = None;
        self.queued = None;
        self.cooldown = 0;
        self.enter_latched = false;
        self.awaiting_release = false;
        self.drain = 0;
    }

    /// True once cooldowns and the question guard have passed
    pub fn is_accepting_input(&self) -> bool {
        self.active.is_some() && self.cooldown == 0 && !self.awaiting_release && self.drain == 0
    }

    fn activate(&mut self, dialogue: Dialogue, requester: Requester) {
        let is_question = dialogue.is_question();
        self.active = Some(ActiveDialogue::new(dialogue, requester, self.config.page_chars));
        if is_question {
            self.cooldown = self.config.question_cooldown_ticks;
            self.awaiting_release = true;
        } else {
            self.cooldown = self.config.cooldown_ticks;
            self.awaiting_release = false;
        }
        self.drain = 0;
    }

    /// Advance the dialogue by one tick of input
    pub fn process_input(&mut self, input: &InputFrame) -> Option<DialogueEvent> {
        let enter_down = input.down(Key::Enter);
        if !enter_down {
            self.enter_latched = false;
        }

        let reveal = self.config.reveal_chars_per_tick;
        let active = self.active.as_mut()?;
        active.reveal(reveal);

        if self.awaiting_release && !enter_down {
            self.awaiting_release = false;
            self.drain = self.config.question_drain_ticks;
        }
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return None;
        }
        if self.awaiting_release {
            return None;
        }
        if self.drain > 0 {
            self.drain -= 1;
            return None;
        }

        let enter = enter_down && !self.enter_latched;
        if active.question.is_some() {
            self.process_question(input, enter)
        } else {
            self.process_text(enter)
        }
    }

    fn process_text(&mut self, enter: bool) -> Option<DialogueEvent> {
        if !enter {
            return None;
        }
        self.enter_latched = true;
        let active = self.active.as_mut()?;

        if !active.is_fully_revealed() {
            active.reveal_all();
            return None;
        }
        if active.has_next_page() {
            active.next_page();
            return None;
        }

        let finished = self.active.take()?;
        match self.queued.take() {
            Some(next) => {
                self.activate(next, finished.requester);
                None
            }
            None => Some(DialogueEvent::Closed {
                requester: finished.requester,
            }),
        }
    }

    fn process_question(&mut self, input: &InputFrame, enter: bool) -> Option<DialogueEvent> {
        let active = self.active.as_mut()?;
        let count = active.question.as_ref().map(|q| q.answers().len()).unwrap_or(0);

        if count > 0 {
            if let Some(index) = input.pressed_digit() {
                if index < count {
                    active.selected = index;
                }
            }
            if input.pressed(Key::Up) || input.pressed(Key::W) {
                active.selected = (active.selected + count - 1) % count;
            }
            if input.pressed(Key::Down) || input.pressed(Key::S) {
                active.selected = (active.selected + 1) % count;
            }
        }

        if !enter {
            return None;
        }
        self.enter_latched = true;

        if !active.is_fully_revealed() {
            active.reveal_all();
            return None;
        }

        let finished = self.active.take()?;
        let question = finished.question?;
        let correct = question.is_correct(finished.selected);
        log::debug!(
            "Answered {} question: {}",
            question.topic().as_str(),
            if correct { "correct" } else { "incorrect" }
        );

        let response = Dialogue::text(finished.speaker, question.response(correct));
        self.activate(response, finished.requester.clone());
        Some(DialogueEvent::Answered {
            topic: question.topic(),
            correct,
            requester: finished.requester,
        })
    }
}

/// Split text into pages of at most `page_chars` characters on word
/// boundaries. A blank line forces a page break.
pub fn paginate(text: &str, page_chars: usize) -> Vec<String> {
    let limit = page_chars.max(1);
    let mut pages = Vec::new();

    for paragraph in text.split("\n\n") {
        let mut page = String::new();
        let mut len = 0;
        for word in paragraph.split_whitespace() {
            let mut word_len = word.chars().count();
            let mut word = word.to_string();

            if len > 0 && len + 1 + word_len > limit {
                pages.push(std::mem::take(&mut page));
                len = 0;
            }
            // Words longer than a page are hard-split
            while word_len > limit {
                let split = word.char_indices().nth(limit).map(|(i, _)| i).unwrap_or(word.len());
                pages.push(word[..split].to_string());
                word = word[split..].to_string();
                word_len -= limit;
            }
            if word.is_empty() {
                continue;
            }
            if len > 0 {
                page.push(' ');
                len += 1;
            }
            page.push_str(&word);
            len += word_len;
        }
        if !page.is_empty() {
            pages.push(page);
        }
    }

    if pages.is_empty() {
        pages.push(String::new());
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> DialogueConfig {
        DialogueConfig {
            reveal_chars_per_tick: 2,
            page_chars: 20,
            cooldown_ticks: 2,
            question_cooldown_ticks: 3,
            question_drain_ticks: 2,
        }
    }

    fn manager() -> DialogueManager {
        DialogueManager::new(config(), IVec2::new(800, 600))
    }

    fn npc() -> Requester {
        Requester::Npc("teacher".to_string())
    }

    fn question() -> DialogueQuestion {
        let mut rng = StdRng::seed_from_u64(3);
        DialogueQuestion::new(
            LabTopic::Physics,
            "Unit of force?",
            vec!["Newton".to_string(), "Joule".to_string(), "Watt".to_string()],
            0,
            ("Right".to_string(), "Wrong".to_string()),
            &mut rng,
        )
    }

    /// Drives the manager with a sequence of key states
    struct Driver {
        frame: InputFrame,
    }

    impl Driver {
        fn new() -> Self {
            Self { frame: InputFrame::default() }
        }

        fn tick(&mut self, dm: &mut DialogueManager, keys: KeyState) -> Option<DialogueEvent> {
            self.frame = self.frame.next(keys);
            dm.process_input(&self.frame)
        }

        fn idle_until_ready(&mut self, dm: &mut DialogueManager) {
            for _ in 0..100 {
                if dm.is_accepting_input() {
                    return;
                }
                assert_eq!(self.tick(dm, KeyState::new()), None);
            }
            panic!("dialogue never accepted input");
        }

        /// Press and release ENTER
        fn enter(&mut self, dm: &mut DialogueManager) -> Option<DialogueEvent> {
            let event = self.tick(dm, KeyState::new().with(Key::Enter));
            self.tick(dm, KeyState::new());
            event
        }
    }

    #[test]
    fn test_show_is_mutually_exclusive() {
        let mut dm = manager();
        assert!(dm.show_dialogue(Dialogue::text("A", "first"), npc()));
        assert!(!dm.show_dialogue(Dialogue::text("B", "second"), Requester::World));
        assert_eq!(dm.active().unwrap().speaker(), "A");

        dm.hide_dialogue();
        assert!(!dm.is_dialogue_active());
        assert!(dm.show_dialogue(Dialogue::text("B", "second"), Requester::World));
    }

    #[test]
    fn test_hide_and_reset_are_noops_when_idle() {
        let mut dm = manager();
        dm.hide_dialogue();
        dm.reset();
        assert!(!dm.is_dialogue_active());
        assert_eq!(dm.process_input(&InputFrame::default()), None);
    }

    #[test]
    fn test_enter_skips_reveal_then_closes() {
        let mut dm = manager();
        let mut driver = Driver::new();
        dm.show_dialogue(Dialogue::text("A", "Hello there, student"), npc());

        // Cooldown ticks reveal two chars each
        driver.tick(&mut dm, KeyState::new());
        assert_eq!(dm.active().unwrap().visible_text(), "He");
        driver.idle_until_ready(&mut dm);
        assert!(!dm.active().unwrap().is_fully_revealed());

        // First press only finishes the reveal
        assert_eq!(driver.enter(&mut dm), None);
        assert!(dm.active().unwrap().is_fully_revealed());

        let event = driver.enter(&mut dm);
        assert_eq!(event, Some(DialogueEvent::Closed { requester: npc() }));
        assert!(!dm.is_dialogue_active());
    }

    #[test]
    fn test_held_enter_acts_once() {
        let mut dm = manager();
        let mut driver = Driver::new();
        dm.show_dialogue(Dialogue::text("A", "one two three four five six seven eight"), npc());
        assert_eq!(dm.active().unwrap().page_count(), 2);
        driver.idle_until_ready(&mut dm);

        let enter = KeyState::new().with(Key::Enter);
        for _ in 0..10 {
            driver.tick(&mut dm, enter);
        }
        // Holding ENTER skipped the reveal but never advanced the page
        let active = dm.active().unwrap();
        assert_eq!(active.page_index(), 0);
        assert!(active.is_fully_revealed());
    }

    #[test]
    fn test_pages_advance_in_order() {
        let mut dm = manager();
        let mut driver = Driver::new();
        dm.show_dialogue(Dialogue::text("A", "one two three four five six seven eight"), npc());
        driver.idle_until_ready(&mut dm);

        driver.enter(&mut dm); // reveal
        driver.enter(&mut dm); // next page
        assert_eq!(dm.active().unwrap().page_index(), 1);
        assert_eq!(dm.active().unwrap().visible_text().len(), 2);
        driver.enter(&mut dm); // reveal
        assert!(driver.enter(&mut dm).is_some());
    }

    #[test]
    fn test_queue_chains_and_overwrites() {
        let mut dm = manager();
        let mut driver = Driver::new();
        dm.show_dialogue(Dialogue::text("A", "hi"), npc());
        dm.queue_dialogue(Dialogue::text("B", "dropped"));
        dm.queue_dialogue(Dialogue::text("C", "yo"));

        driver.idle_until_ready(&mut dm);
        assert_eq!(driver.enter(&mut dm), None);
        let active = dm.active().unwrap();
        assert_eq!(active.speaker(), "C");
        assert_eq!(active.requester(), &npc());
        assert!(!dm.has_queued());

        driver.idle_until_ready(&mut dm);
        assert_eq!(driver.enter(&mut dm), Some(DialogueEvent::Closed { requester: npc() }));
    }

    #[test]
    fn test_hide_drops_queue() {
        let mut dm = manager();
        dm.show_dialogue(Dialogue::text("A", "hi"), npc());
        dm.queue_dialogue(Dialogue::text("B", "later"));
        dm.hide_dialogue();
        assert!(!dm.has_queued());
        assert!(!dm.is_dialogue_active());
    }

    #[test]
    fn test_question_waits_for_enter_release() {
        let mut dm = manager();
        let mut driver = Driver::new();
        let enter = KeyState::new().with(Key::Enter);

        // ENTER is still held from whatever opened the question
        driver.tick(&mut dm, enter);
        dm.show_dialogue(Dialogue::question("T", question()), npc());
        for _ in 0..20 {
            assert_eq!(driver.tick(&mut dm, enter), None);
        }
        assert!(dm.active().unwrap().question().is_some());
        assert!(!dm.is_accepting_input());

        // Released: drain ticks must still pass before input counts
        driver.tick(&mut dm, KeyState::new());
        assert!(!dm.is_accepting_input());
        assert_eq!(driver.tick(&mut dm, enter), None);
        assert!(dm.active().unwrap().question().is_some());

        driver.tick(&mut dm, KeyState::new());
        driver.idle_until_ready(&mut dm);
        assert!(dm.is_accepting_input());
    }

    #[test]
    fn test_question_answer_flow() {
        let mut dm = manager();
        let mut driver = Driver::new();
        let q = question();
        let correct = q.correct_index();
        dm.show_dialogue(Dialogue::question("T", q), npc());
        driver.idle_until_ready(&mut dm);

        let digit = [Key::Digit1, Key::Digit2, Key::Digit3][correct];
        driver.tick(&mut dm, KeyState::new().with(digit));
        assert_eq!(dm.active().unwrap().selected(), Some(correct));

        let event = driver.enter(&mut dm);
        assert_eq!(
            event,
            Some(DialogueEvent::Answered {
                topic: LabTopic::Physics,
                correct: true,
                requester: npc(),
            })
        );
        // Response is a plain dialogue from the same speaker
        let active = dm.active().unwrap();
        assert!(active.question().is_none());
        assert_eq!(active.speaker(), "T");

        driver.idle_until_ready(&mut dm);
        driver.enter(&mut dm);
        driver.enter(&mut dm);
        assert!(!dm.is_dialogue_active());
    }

    #[test]
    fn test_question_selection_wraps() {
        let mut dm = manager();
        let mut driver = Driver::new();
        dm.show_dialogue(Dialogue::question("T", question()), npc());
        driver.idle_until_ready(&mut dm);

        driver.tick(&mut dm, KeyState::new().with(Key::Up));
        assert_eq!(dm.active().unwrap().selected(), Some(2));
        driver.tick(&mut dm, KeyState::new());
        driver.tick(&mut dm, KeyState::new().with(Key::S));
        assert_eq!(dm.active().unwrap().selected(), Some(0));
        // Digit past the answer count is ignored
        driver.tick(&mut dm, KeyState::new().with(Key::Digit4));
        assert_eq!(dm.active().unwrap().selected(), Some(0));
    }

    #[test]
    fn test_wrong_answer_reports_incorrect() {
        let mut dm = manager();
        let mut driver = Driver::new();
        let q = question();
        let wrong = (q.correct_index() + 1) % 3;
        dm.show_dialogue(Dialogue::question("T", q), Requester::World);
        driver.idle_until_ready(&mut dm);

        let digit = [Key::Digit1, Key::Digit2, Key::Digit3][wrong];
        driver.tick(&mut dm, KeyState::new().with(digit));
        match driver.enter(&mut dm) {
            Some(DialogueEvent::Answered { correct, .. }) => assert!(!correct),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut dm = manager();
        dm.show_dialogue(Dialogue::question("T", question()), npc());
        dm.queue_dialogue(Dialogue::text("A", "later"));
        dm.reset();
        assert!(!dm.is_dialogue_active());
        assert!(!dm.has_queued());
        assert!(dm.show_dialogue(Dialogue::text("A", "fresh"), Requester::World));
    }

    #[test]
    fn test_paginate() {
        assert_eq!(paginate("", 10), vec![String::new()]);
        assert_eq!(paginate("short", 10), vec!["short"]);
        assert_eq!(paginate("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
        assert_eq!(paginate("first\n\nsecond", 50), vec!["first", "second"]);
        assert_eq!(paginate("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_box_is_bottom_centred() {
        let b = DialogueBox::for_viewport(IVec2::new(800, 600));
        assert_eq!(b.size, IVec2::new(700, 150));
        assert_eq!(b.pos, IVec2::new(50, 430));
    }
}
