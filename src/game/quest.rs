//! Timed keypress challenges run at lab stations.
//!
//! Every station mini-game is the same machine with different numbers: a
//! key, a target, a time limit and an optional timing window.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::question::LabTopic;
use crate::input::{InputFrame, Key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChallengeMode {
    /// Press the key `target` times before time runs out
    #[default]
    Mash,
    /// A marker sweeps `0..period_ticks`; presses within `window_ticks` of
    /// the period centre are hits
    Timing { period_ticks: u32, window_ticks: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeConfig {
    pub id: String,
    pub title: String,
    pub topic: LabTopic,
    pub key: Key,
    #[serde(default)]
    pub mode: ChallengeMode,
    pub target: u32,
    pub duration_ticks: u32,
    #[serde(default)]
    pub xp_reward: u64,
    #[serde(default)]
    pub badge: Option<String>,
    /// One-line instruction shown in the overlay
    #[serde(default)]
    pub hint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeOutcome {
    pub success: bool,
    /// 0..=100
    pub score: u32,
}

/// A running challenge
#[derive(Debug, Clone)]
pub struct Challenge {
    config: ChallengeConfig,
    elapsed: u32,
    hits: u32,
    misses: u32,
    outcome: Option<ChallengeOutcome>,
}

impl Challenge {
    pub fn new(config: ChallengeConfig) -> Self {
        Self {
            config,
            elapsed: 0,
            hits: 0,
            misses: 0,
            outcome: None,
        }
    }

    pub fn config(&self) -> &ChallengeConfig {
        &self.config
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn remaining_ticks(&self) -> u32 {
        self.config.duration_ticks.saturating_sub(self.elapsed)
    }

    pub fn outcome(&self) -> Option<ChallengeOutcome> {
        self.outcome
    }

    /// Marker position within the period for timing challenges
    pub fn marker(&self) -> Option<u32> {
        match self.config.mode {
            ChallengeMode::Mash => None,
            ChallengeMode::Timing { period_ticks, .. } => Some(self.elapsed % period_ticks.max(1)),
        }
    }

    pub fn in_window(&self) -> bool {
        match self.config.mode {
            ChallengeMode::Mash => true,
            ChallengeMode::Timing { period_ticks, window_ticks } => {
                let period = period_ticks.max(1);
                let centre = period / 2;
                (self.elapsed % period).abs_diff(centre) <= window_ticks
            }
        }
    }

    /// Advance one tick. Returns the outcome on the tick the challenge ends.
    pub fn tick(&mut self, input: &InputFrame) -> Option<ChallengeOutcome> {
        if self.outcome.is_some() {
            return None;
        }

        if input.pressed(self.config.key) {
            if self.in_window() {
                self.hits += 1;
            } else {
                self.misses += 1;
            }
        }
        self.elapsed += 1;

        let target = self.config.target.max(1);
        let outcome = if self.hits >= target {
            Some(ChallengeOutcome {
                success: true,
                score: self.score(),
            })
        } else if self.elapsed >= self.config.duration_ticks {
            Some(ChallengeOutcome {
                success: false,
                score: self.score(),
            })
        } else {
            None
        };
        if let Some(result) = outcome {
            log::debug!(
                "Challenge {} finished: success={} score={}",
                self.config.id,
                result.success,
                result.score
            );
        }
        self.outcome = outcome;
        outcome
    }

    fn score(&self) -> u32 {
        let target = self.config.target.max(1);
        (self.hits * 100 / target).min(100)
    }
}

#[derive(Debug, Deserialize)]
struct ChallengeFile {
    #[serde(default)]
    challenge: Vec<ChallengeConfig>,
}

/// All station challenges, by id
#[derive(Debug, Clone, Default)]
pub struct ChallengeCatalog {
    challenges: Vec<ChallengeConfig>,
}

impl ChallengeCatalog {
    pub fn load_or_builtin(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| Self::from_toml(&content))
        {
            Ok(catalog) => {
                log::info!("Loaded {} challenges from {:?}", catalog.len(), path);
                catalog
            }
            Err(e) => {
                log::warn!("Using built-in challenges ({:?}): {}", path, e);
                Self::builtin()
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        let file: ChallengeFile =
            toml::from_str(content).map_err(|e| format!("Failed to parse challenges: {}", e))?;
        if file.challenge.is_empty() {
            return Err("challenge file is empty".to_string());
        }
        Ok(Self {
            challenges: file.challenge,
        })
    }

    pub fn get(&self, id: &str) -> Option<&ChallengeConfig> {
        self.challenges.iter().find(|c| c.id == id)
    }

    pub fn for_topic(&self, topic: LabTopic) -> impl Iterator<Item = &ChallengeConfig> {
        self.challenges.iter().filter(move |c| c.topic == topic)
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    pub fn builtin() -> Self {
        let timing = |period_ticks, window_ticks| ChallengeMode::Timing { period_ticks, window_ticks };
        let entries = [
            ("pendulum", "Pendulum Timing", LabTopic::Physics, Key::Space, timing(60, 6), 3, 600, "Press SPACE as the pendulum passes the centre"),
            ("dynamo", "Crank the Dynamo", LabTopic::Physics, Key::F, ChallengeMode::Mash, 25, 300, "Mash F to power the lab"),
            ("titration", "Titration", LabTopic::Chemistry, Key::Enter, timing(50, 5), 3, 600, "Press ENTER when the drop is centred"),
            ("stirring", "Stir the Mixture", LabTopic::Chemistry, Key::Space, ChallengeMode::Mash, 30, 360, "Mash SPACE to keep it mixed"),
            ("microscope", "Focus the Microscope", LabTopic::Biology, Key::Space, timing(70, 7), 3, 700, "Press SPACE when the slide is sharp"),
            ("heartbeat", "Heartbeat Pump", LabTopic::Biology, Key::Enter, ChallengeMode::Mash, 20, 300, "Mash ENTER to keep the heart beating"),
        ];
        let challenges = entries
            .into_iter()
            .map(|(id, title, topic, key, mode, target, duration_ticks, hint)| ChallengeConfig {
                id: id.to_string(),
                title: title.to_string(),
                topic,
                key,
                mode,
                target,
                duration_ticks,
                xp_reward: 25,
                badge: None,
                hint: hint.to_string(),
            })
            .collect();
        Self { challenges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyState;

    fn mash(target: u32, duration_ticks: u32) -> ChallengeConfig {
        ChallengeConfig {
            id: "mash".to_string(),
            title: "Mash".to_string(),
            topic: LabTopic::Physics,
            key: Key::Space,
            mode: ChallengeMode::Mash,
            target,
            duration_ticks,
            xp_reward: 10,
            badge: None,
            hint: String::new(),
        }
    }

    /// Alternates press/release so every other tick is a fresh press
    fn run_presses(challenge: &mut Challenge, ticks: u32) -> Option<ChallengeOutcome> {
        let mut frame = InputFrame::default();
        for t in 0..ticks {
            let keys = if t % 2 == 0 { KeyState::new().with(Key::Space) } else { KeyState::new() };
            frame = frame.next(keys);
            if let Some(outcome) = challenge.tick(&frame) {
                return Some(outcome);
            }
        }
        None
    }

    #[test]
    fn test_mash_success() {
        let mut challenge = Challenge::new(mash(3, 100));
        let outcome = run_presses(&mut challenge, 100).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.score, 100);
        assert_eq!(challenge.hits(), 3);
        // Finished challenges ignore further ticks
        assert_eq!(challenge.tick(&InputFrame::fresh(KeyState::new().with(Key::Space))), None);
    }

    #[test]
    fn test_mash_timeout_scores_partial() {
        let mut challenge = Challenge::new(mash(10, 10));
        let outcome = run_presses(&mut challenge, 20).unwrap();
        assert!(!outcome.success);
        assert_eq!(challenge.hits(), 5);
        assert_eq!(outcome.score, 50);
    }

    #[test]
    fn test_held_key_counts_once() {
        let mut challenge = Challenge::new(mash(3, 10));
        let held = KeyState::new().with(Key::Space);
        let mut frame = InputFrame::default();
        for _ in 0..5 {
            frame = frame.next(held);
            challenge.tick(&frame);
        }
        assert_eq!(challenge.hits(), 1);
    }

    #[test]
    fn test_timing_window() {
        let mut config = mash(2, 100);
        config.mode = ChallengeMode::Timing { period_ticks: 10, window_ticks: 1 };
        let mut challenge = Challenge::new(config);

        // Press at elapsed 0: far from centre 5
        challenge.tick(&InputFrame::fresh(KeyState::new().with(Key::Space)));
        assert_eq!(challenge.misses(), 1);

        let mut frame = InputFrame::default();
        // Advance to elapsed 4 without pressing
        for _ in 0..3 {
            frame = frame.next(KeyState::new());
            challenge.tick(&frame);
        }
        assert_eq!(challenge.marker(), Some(4));
        assert!(challenge.in_window());
        frame = frame.next(KeyState::new().with(Key::Space));
        challenge.tick(&frame);
        assert_eq!(challenge.hits(), 1);
    }

    #[test]
    fn test_catalog_from_toml() {
        let catalog = ChallengeCatalog::from_toml(
            r#"
            [[challenge]]
            id = "drip"
            title = "Drip"
            topic = "chemistry"
            key = "enter"
            mode = { kind = "timing", period_ticks = 40, window_ticks = 4 }
            target = 2
            duration_ticks = 300
            xp_reward = 30
            badge = "Steady Hand"

            [[challenge]]
            id = "shake"
            title = "Shake"
            topic = "chemistry"
            key = "g"
            target = 12
            duration_ticks = 200
            "#,
        )
        .unwrap();
        let drip = catalog.get("drip").unwrap();
        assert_eq!(drip.key, Key::Enter);
        assert_eq!(drip.mode, ChallengeMode::Timing { period_ticks: 40, window_ticks: 4 });
        assert_eq!(drip.badge.as_deref(), Some("Steady Hand"));
        assert_eq!(catalog.get("shake").unwrap().mode, ChallengeMode::Mash);
        assert_eq!(catalog.for_topic(LabTopic::Chemistry).count(), 2);
        assert_eq!(catalog.for_topic(LabTopic::Physics).count(), 0);
    }

    #[test]
    fn test_builtin_covers_every_lab() {
        let catalog = ChallengeCatalog::builtin();
        for topic in LabTopic::ALL {
            assert_eq!(catalog.for_topic(topic).count(), 2);
        }
        assert!(ChallengeCatalog::from_toml("").is_err());
    }

    #[test]
    fn test_shipped_catalog_matches_worlds() {
        let catalog = ChallengeCatalog::from_toml(include_str!("../../assets/content/challenges.toml")).unwrap();
        let builtin = ChallengeCatalog::builtin();
        assert_eq!(catalog.len(), builtin.len());
        for id in ["pendulum", "dynamo", "titration", "stirring", "microscope", "heartbeat"] {
            let shipped = catalog.get(id).unwrap();
            assert_eq!(shipped.topic, builtin.get(id).unwrap().topic, "{}", id);
            assert!(shipped.target > 0 && shipped.duration_ticks > 0);
        }
    }
}
