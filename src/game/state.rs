//! Session progress: XP, labs, badges, quiz gates and the mini-quest lock.
//!
//! Nothing here is persisted; a fresh [`GameState`] is a fresh session.

use rand::Rng;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::question::LabTopic;

/// Answers needed before a lab's quiz gate opens
pub const QUIZ_GATE_TOTAL: u32 = 5;
/// Correct answers (out of the gate total) needed to pass a retrying lab
pub const QUIZ_PASS_CORRECT: u32 = 3;

pub const MAX_LEVEL: u32 = 50;

pub const XP_CORRECT_ANSWER: u64 = 10;
pub const XP_INCORRECT_ANSWER: u64 = 2;
pub const XP_LAB_REPAIR: u64 = 100;

/// Total XP required to reach `level`. Level 1 starts at 0.
pub fn xp_for_level(level: u32) -> u64 {
    let level = level.clamp(1, MAX_LEVEL) as u64;
    50 * level * (level - 1)
}

/// Highest level whose threshold is at or below `xp`
pub fn level_for_xp(xp: u64) -> u32 {
    let (mut lo, mut hi) = (1, MAX_LEVEL);
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        if xp_for_level(mid) <= xp {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Per-topic quiz counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuizProgress {
    pub answered: u32,
    pub correct: u32,
}

#[derive(Debug, Clone, Default)]
pub struct GameState {
    completed_labs: BTreeSet<LabTopic>,
    badges: BTreeSet<String>,
    used_questions: HashMap<LabTopic, HashSet<usize>>,
    quiz: HashMap<LabTopic, QuizProgress>,
    completed_challenges: HashSet<String>,
    xp: u64,
    mini_quest_active: bool,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- labs and badges ----

    /// Mark a lab repaired. Returns false if it already was.
    pub fn complete_lab(&mut self, topic: LabTopic) -> bool {
        let added = self.completed_labs.insert(topic);
        if added {
            log::info!("{} lab completed", topic.display_name());
        }
        added
    }

    pub fn is_lab_completed(&self, topic: LabTopic) -> bool {
        self.completed_labs.contains(&topic)
    }

    pub fn completed_labs(&self) -> impl Iterator<Item = LabTopic> + '_ {
        self.completed_labs.iter().copied()
    }

    pub fn award_badge(&mut self, badge: &str) -> bool {
        let added = self.badges.insert(badge.to_string());
        if added {
            log::info!("Badge awarded: {}", badge);
        }
        added
    }

    pub fn has_badge(&self, badge: &str) -> bool {
        self.badges.contains(badge)
    }

    pub fn badges(&self) -> impl Iterator<Item = &str> {
        self.badges.iter().map(String::as_str)
    }

    // ---- quiz ----

    /// Count an answer and grant its XP. Answers past the gate total only grant XP.
    /// Returns the new level on level-up.
    pub fn record_answer(&mut self, topic: LabTopic, correct: bool) -> Option<u32> {
        let progress = self.quiz.entry(topic).or_default();
        if progress.answered < QUIZ_GATE_TOTAL {
            progress.answered += 1;
            if correct {
                progress.correct += 1;
            }
        }
        log::debug!(
            "{} quiz: {}/{} correct",
            topic.as_str(),
            progress.correct,
            progress.answered
        );
        self.add_xp(if correct { XP_CORRECT_ANSWER } else { XP_INCORRECT_ANSWER })
    }

    pub fn quiz(&self, topic: LabTopic) -> QuizProgress {
        self.quiz.get(&topic).copied().unwrap_or_default()
    }

    /// Gate predicate: the full set of questions has been answered
    pub fn is_quiz_gate_complete(&self, topic: LabTopic) -> bool {
        self.quiz(topic).answered >= QUIZ_GATE_TOTAL
    }

    /// Pass predicate used by labs that send failing students back to the quiz
    pub fn is_quiz_passed(&self, topic: LabTopic) -> bool {
        self.quiz(topic).correct >= QUIZ_PASS_CORRECT
    }

    /// Clear the counters for another attempt. Used questions stay used.
    pub fn reset_quiz(&mut self, topic: LabTopic) {
        self.quiz.remove(&topic);
        log::info!("{} quiz reset for retry", topic.display_name());
    }

    /// Pick a question index from a pool of `pool_len`, avoiding indices
    /// already asked for `topic` until the pool runs out.
    pub fn random_question_index(
        &mut self,
        topic: LabTopic,
        pool_len: usize,
        rng: &mut impl Rng,
    ) -> Option<usize> {
        if pool_len == 0 {
            return None;
        }
        let used = self.used_questions.entry(topic).or_default();
        let mut fresh: Vec<usize> = (0..pool_len).filter(|i| !used.contains(i)).collect();
        if fresh.is_empty() {
            log::debug!("All {} questions used, starting over", topic.as_str());
            used.clear();
            fresh = (0..pool_len).collect();
        }
        let index = fresh[rng.gen_range(0..fresh.len())];
        used.insert(index);
        Some(index)
    }

    pub fn used_question_count(&self, topic: LabTopic) -> usize {
        self.used_questions.get(&topic).map(|u| u.len()).unwrap_or(0)
    }

    // ---- mini-quests ----

    /// Take the global mini-quest lock. False if another mini-quest is running.
    pub fn try_begin_mini_quest(&mut self) -> bool {
        if self.mini_quest_active {
            return false;
        }
        self.mini_quest_active = true;
        true
    }

    /// Release the lock, recording the challenge on success
    pub fn finish_mini_quest(&mut self, challenge_id: &str, success: bool) {
        self.mini_quest_active = false;
        if success && self.completed_challenges.insert(challenge_id.to_string()) {
            log::info!("Mini-quest {} completed", challenge_id);
        }
    }

    pub fn is_mini_quest_active(&self) -> bool {
        self.mini_quest_active
    }

    pub fn is_challenge_completed(&self, challenge_id: &str) -> bool {
        self.completed_challenges.contains(challenge_id)
    }

    pub fn are_challenges_completed<'a>(&self, mut ids: impl Iterator<Item = &'a str>) -> bool {
        ids.all(|id| self.is_challenge_completed(id))
    }

    // ---- XP ----

    /// Returns the new level if this crossed a level threshold
    pub fn add_xp(&mut self, amount: u64) -> Option<u32> {
        let before = self.level();
        self.xp = self.xp.saturating_add(amount);
        let after = self.level();
        if after > before {
            log::info!("Level up! Now level {}", after);
            Some(after)
        } else {
            None
        }
    }

    pub fn xp(&self) -> u64 {
        self.xp
    }

    pub fn level(&self) -> u32 {
        level_for_xp(self.xp)
    }

    /// Progress toward the next level, 0..=100
    pub fn level_progress_percent(&self) -> u32 {
        let level = self.level();
        if level >= MAX_LEVEL {
            return 100;
        }
        let base = xp_for_level(level);
        let next = xp_for_level(level + 1);
        ((self.xp - base) * 100 / (next - base)) as u32
    }
}
