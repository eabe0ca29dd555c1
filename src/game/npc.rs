use macroquad::math::IVec2;
use rand::Rng;

use super::dialogue::Dialogue;
use super::question::{DialogueQuestion, LabTopic, QuestionBank};
use super::quest::ChallengeCatalog;
use super::state::{GameState, QUIZ_GATE_TOTAL, QUIZ_PASS_CORRECT};

// ============================================================================
// NPC Role
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcRole {
    /// Runs a lab's quiz and repairs the lab
    Teacher,
    /// Explains what is left to do in a lab
    Assistant,
    /// Greets the player in the classroom
    Guide,
}

// ============================================================================
// NPC Action
// ============================================================================

/// Result of talking to an NPC, applied by the session
#[derive(Debug, Clone, PartialEq)]
pub enum NpcAction {
    Talk {
        dialogue: Dialogue,
        /// Shown automatically after `dialogue`
        follow_up: Option<Dialogue>,
    },
    /// Show the repair dialogue; the lab is repaired once it closes
    Repair { dialogue: Dialogue, topic: LabTopic },
}

impl NpcAction {
    fn say(dialogue: Dialogue) -> Self {
        NpcAction::Talk {
            dialogue,
            follow_up: None,
        }
    }
}

// ============================================================================
// NPC Entity
// ============================================================================

#[derive(Debug, Clone)]
pub struct Npc {
    pub id: String,
    pub name: String,
    pub role: NpcRole,
    pub topic: Option<LabTopic>,
    /// Fixed position in map pixels
    pub map_pos: IVec2,
    /// Derived each tick from `map_pos` and the camera scroll
    pub screen_pos: IVec2,
    /// Send students who fail the quiz back for another attempt
    pub retry_on_fail: bool,
}

impl Npc {
    pub fn new(id: &str, name: &str, role: NpcRole, topic: Option<LabTopic>, map_pos: IVec2) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role,
            topic,
            map_pos,
            screen_pos: map_pos,
            retry_on_fail: false,
        }
    }

    pub fn with_retry(mut self, retry_on_fail: bool) -> Self {
        self.retry_on_fail = retry_on_fail;
        self
    }

    pub fn in_range(&self, map_point: IVec2, radius: i32) -> bool {
        let d = self.map_pos - map_point;
        (d.x as i64).pow(2) + (d.y as i64).pow(2) <= (radius as i64).pow(2)
    }

    /// Decide what this NPC says given the current progress
    pub fn interact(
        &self,
        state: &mut GameState,
        bank: &QuestionBank,
        catalog: &ChallengeCatalog,
        rng: &mut impl Rng,
    ) -> NpcAction {
        match (self.role, self.topic) {
            (NpcRole::Teacher, Some(topic)) => self.teacher(topic, state, bank, catalog, rng),
            (NpcRole::Assistant, Some(topic)) => self.assistant(topic, state, catalog),
            _ => self.guide(state),
        }
    }

    fn teacher(
        &self,
        topic: LabTopic,
        state: &mut GameState,
        bank: &QuestionBank,
        catalog: &ChallengeCatalog,
        rng: &mut impl Rng,
    ) -> NpcAction {
        let lab = topic.display_name();

        if state.is_lab_completed(topic) {
            return NpcAction::say(self.line(format!(
                "Thank you for fixing the {} lab! Class can finally continue.",
                lab
            )));
        }

        if !state.is_quiz_gate_complete(topic) {
            let pool = bank.pool(topic);
            return match state.random_question_index(topic, pool.len(), rng) {
                Some(index) => {
                    let question = DialogueQuestion::from_template(&pool[index], rng);
                    NpcAction::say(Dialogue::question(self.name.clone(), question))
                }
                None => {
                    log::warn!("No {} questions available", topic.as_str());
                    NpcAction::say(self.line("I have no questions for you today."))
                }
            };
        }

        if self.retry_on_fail && !state.is_quiz_passed(topic) {
            let correct = state.quiz(topic).correct;
            state.reset_quiz(topic);
            return NpcAction::say(self.line(format!(
                "You got {} of {} right, but you need {}. Let's go through the questions again.",
                correct, QUIZ_GATE_TOTAL, QUIZ_PASS_CORRECT
            )));
        }

        let quests_done = state.are_challenges_completed(catalog.for_topic(topic).map(|c| c.id.as_str()));
        if !quests_done {
            return NpcAction::say(self.line(format!(
                "Good work on the quiz! Now get the {} lab stations running. Press G next to a station.",
                lab
            )));
        }

        NpcAction::Repair {
            dialogue: self.line(format!(
                "Everything is ready. Let's repair the {} lab together!",
                lab
            )),
            topic,
        }
    }

    fn assistant(&self, topic: LabTopic, state: &GameState, catalog: &ChallengeCatalog) -> NpcAction {
        if state.is_lab_completed(topic) {
            return NpcAction::say(self.line("The lab works again thanks to you!"));
        }

        let quiz = state.quiz(topic);
        let status = self.line(format!(
            "You have answered {} of {} questions, {} correctly.",
            quiz.answered, QUIZ_GATE_TOTAL, quiz.correct
        ));

        let remaining: Vec<&str> = catalog
            .for_topic(topic)
            .filter(|c| !state.is_challenge_completed(&c.id))
            .map(|c| c.title.as_str())
            .collect();
        let hint = if !state.is_quiz_gate_complete(topic) {
            "Talk to the teacher to answer more questions.".to_string()
        } else if !remaining.is_empty() {
            format!("Stations still broken: {}. Press G next to one.", remaining.join(", "))
        } else {
            "Everything is ready. Ask the teacher to repair the lab!".to_string()
        };

        NpcAction::Talk {
            dialogue: status,
            follow_up: Some(self.line(hint)),
        }
    }

    fn guide(&self, state: &GameState) -> NpcAction {
        let next = LabTopic::ALL.into_iter().find(|t| !state.is_lab_completed(*t));
        let text = match next {
            Some(topic) => format!(
                "Welcome back! The {} lab still needs repairs. Head through its door.",
                topic.display_name()
            ),
            None => format!(
                "You repaired every lab and earned {} badges. Amazing!",
                state.badges().count()
            ),
        };
        NpcAction::say(self.line(text))
    }

    fn line(&self, text: impl Into<String>) -> Dialogue {
        Dialogue::text(self.name.clone(), text)
    }
}
