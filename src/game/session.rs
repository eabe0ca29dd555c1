//! One running game: progress, dialogue, the current world and the player.
//!
//! [`Session::tick`] is the whole simulation step. Order matters:
//! dialogue input first, then gameplay (which checks whether a dialogue is
//! open), then the camera, then anything positioned relative to the camera,
//! then world transitions.

use macroquad::math::IVec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::collision::CollisionWorld;
use super::dialogue::{Dialogue, DialogueEvent, DialogueManager, Requester};
use super::entities::{Hitbox, MoveInput, Player};
use super::npc::NpcAction;
use super::quest::{Challenge, ChallengeCatalog};
use super::question::{LabTopic, QuestionBank};
use super::state::{GameState, XP_LAB_REPAIR};
use super::world::{World, WorldKind};
use crate::config::GameConfig;
use crate::input::{InputFrame, Key};
use crate::render::animation::{FrameAnimation, WALK_FRAMES};

/// Challenge running at a station
pub struct ActiveChallenge {
    pub challenge: Challenge,
    pub station: String,
}

pub struct Session {
    config: GameConfig,
    state: GameState,
    dialogue: DialogueManager,
    world: World,
    player: Player,
    bank: QuestionBank,
    catalog: ChallengeCatalog,
    challenge: Option<ActiveChallenge>,
    /// Lab to repair once the repair dialogue has closed
    pending_repair: Option<LabTopic>,
    rng: StdRng,
    ticks: u64,
}

impl Session {
    /// Start a session from config, loading content files
    pub fn new(config: GameConfig) -> Self {
        let bank = QuestionBank::load_or_builtin(&config.assets.questions);
        let catalog = ChallengeCatalog::load_or_builtin(&config.assets.challenges);
        let state = GameState::new();
        let world = World::build(
            config.start_world,
            &state,
            viewport(&config),
            &config.assets.tileset_candidates,
        );
        Self::from_parts(config, state, world, bank, catalog, StdRng::from_entropy())
    }

    pub fn from_parts(
        config: GameConfig,
        state: GameState,
        world: World,
        bank: QuestionBank,
        catalog: ChallengeCatalog,
        rng: StdRng,
    ) -> Self {
        let dialogue = DialogueManager::new(config.dialogue.clone(), viewport(&config));
        let player = Player::new(
            world.spawn(),
            Hitbox {
                width: config.player.hitbox_width,
                height: config.player.hitbox_height,
                foot_offset: config.player.foot_offset,
            },
            config.player.step,
            FrameAnimation::new(WALK_FRAMES, config.player.frame_delay),
        );
        let mut session = Self {
            config,
            state,
            dialogue,
            world,
            player,
            bank,
            catalog,
            challenge: None,
            pending_repair: None,
            rng,
            ticks: 0,
        };
        session.world.sync_barriers(&session.state);
        session.refresh_view();
        session
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn dialogue(&self) -> &DialogueManager {
        &self.dialogue
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn challenge(&self) -> Option<&ActiveChallenge> {
        self.challenge.as_ref()
    }

    pub fn catalog(&self) -> &ChallengeCatalog {
        &self.catalog
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Player position in screen pixels
    pub fn player_screen_pos(&self) -> IVec2 {
        self.world.map_to_screen(self.player.position)
    }

    /// Advance the game by one tick
    pub fn tick(&mut self, input: &InputFrame) {
        self.ticks += 1;

        if let Some(event) = self.dialogue.process_input(input) {
            self.on_dialogue_event(event);
        }

        if self.pending_repair.is_some() && !self.dialogue.is_dialogue_active() {
            self.finish_repair();
        }

        if self.challenge.is_some() {
            self.update_challenge(input);
            self.player.idle();
        } else if self.dialogue.is_dialogue_active() {
            self.player.idle();
        } else {
            self.player.update(MoveInput::from_frame(input), &self.world);
            if input.pressed(Key::F) {
                self.talk_to_nearest_npc();
            } else if input.pressed(Key::G) {
                self.start_nearest_station();
            }
        }

        self.refresh_view();

        if self.challenge.is_none() && !self.dialogue.is_dialogue_active() {
            if let Some(exit) = self.world.exit_touching(&self.player.hitbox_rect()) {
                self.enter_world(exit.target, exit.arrival);
            }
        }
    }

    fn refresh_view(&mut self) {
        self.world.update_camera(self.player.position);
        self.world.update_screen_positions();
    }

    fn on_dialogue_event(&mut self, event: DialogueEvent) {
        match event {
            DialogueEvent::Answered { topic, correct, .. } => {
                self.state.record_answer(topic, correct);
            }
            DialogueEvent::Closed { requester } => {
                log::debug!("Dialogue closed ({:?})", requester);
            }
        }
    }

    fn talk_to_nearest_npc(&mut self) {
        let radius = self.config.player.interact_radius;
        let Some(npc) = self.world.nearest_npc(self.player.position, radius) else {
            return;
        };
        let requester = Requester::Npc(npc.id.clone());
        let action = npc.interact(&mut self.state, &self.bank, &self.catalog, &mut self.rng);

        match action {
            NpcAction::Talk { dialogue, follow_up } => {
                if self.dialogue.show_dialogue(dialogue, requester) {
                    if let Some(next) = follow_up {
                        self.dialogue.queue_dialogue(next);
                    }
                }
            }
            NpcAction::Repair { dialogue, topic } => {
                if self.dialogue.show_dialogue(dialogue, requester) {
                    self.pending_repair = Some(topic);
                }
            }
        }
    }

    fn start_nearest_station(&mut self) {
        let radius = self.config.player.interact_radius;
        let Some(station) = self.world.nearest_station(self.player.position, radius) else {
            return;
        };
        let Some(config) = self.catalog.get(&station.challenge_id).cloned() else {
            log::warn!("Station has unknown challenge {}", station.challenge_id);
            return;
        };
        let station_id = station.challenge_id.clone();

        let blocked = if self.state.is_challenge_completed(&config.id) {
            Some("This station is already working.".to_string())
        } else if !self.state.is_quiz_gate_complete(config.topic) {
            Some(format!(
                "The {} teacher wants you to finish the quiz before touching the equipment.",
                config.topic.display_name()
            ))
        } else if self.world.quiz_requires_pass(config.topic) && !self.state.is_quiz_passed(config.topic) {
            Some(format!(
                "You need a better {} quiz score first. Talk to the teacher again.",
                config.topic.display_name()
            ))
        } else {
            None
        };
        if let Some(text) = blocked {
            self.dialogue.show_dialogue(Dialogue::text(config.title, text), Requester::World);
            return;
        }

        if !self.state.try_begin_mini_quest() {
            log::debug!("Mini-quest already running, ignoring {}", config.id);
            return;
        }
        log::info!("Starting mini-quest {}", config.id);
        self.challenge = Some(ActiveChallenge {
            challenge: Challenge::new(config),
            station: station_id,
        });
    }

    fn update_challenge(&mut self, input: &InputFrame) {
        let Some(active) = self.challenge.as_mut() else {
            return;
        };
        let Some(outcome) = active.challenge.tick(input) else {
            return;
        };
        let config = active.challenge.config().clone();
        self.challenge = None;
        self.state.finish_mini_quest(&config.id, outcome.success);

        let text = if outcome.success {
            self.state.add_xp(config.xp_reward);
            if let Some(badge) = &config.badge {
                self.state.award_badge(badge);
            }
            self.world.sync_barriers(&self.state);
            format!("{} complete! Score {}%. +{} XP", config.title, outcome.score, config.xp_reward)
        } else {
            format!("Time's up! Score {}%. Press G to try again.", outcome.score)
        };
        self.dialogue.show_dialogue(Dialogue::text(config.title, text), Requester::World);
    }

    fn finish_repair(&mut self) {
        let Some(topic) = self.pending_repair.take() else {
            return;
        };
        if self.state.complete_lab(topic) {
            self.state.award_badge(&format!("{} Lab", topic.display_name()));
            self.state.add_xp(XP_LAB_REPAIR);
        }
        if self.world.kind().topic() == Some(topic) {
            self.world
                .set_map_state(true, &self.state, &self.config.assets.tileset_candidates);
        }
    }

    /// Replace the current world. Dialogue state never crosses worlds.
    pub fn enter_world(&mut self, kind: WorldKind, arrival: IVec2) {
        self.dialogue.reset();
        self.pending_repair = None;
        self.world = World::build(
            kind,
            &self.state,
            viewport(&self.config),
            &self.config.assets.tileset_candidates,
        );
        self.player.position = arrival;
        self.refresh_view();
    }
}

fn viewport(config: &GameConfig) -> IVec2 {
    IVec2::new(config.window.width, config.window.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DialogueConfig;
    use crate::game::world::WorldDef;
    use crate::input::KeyState;

    fn config() -> GameConfig {
        let mut config = GameConfig::default();
        config.dialogue = DialogueConfig {
            reveal_chars_per_tick: 500,
            page_chars: 500,
            cooldown_ticks: 1,
            question_cooldown_ticks: 1,
            question_drain_ticks: 1,
        };
        config.assets.tileset_candidates = Vec::new();
        config
    }

    fn session(kind: WorldKind, state: GameState) -> Session {
        let config = config();
        let world = World::from_def(WorldDef::for_kind(kind), None, IVec2::new(800, 600));
        Session::from_parts(
            config,
            state,
            world,
            QuestionBank::builtin(),
            ChallengeCatalog::builtin(),
            StdRng::seed_from_u64(9),
        )
    }

    struct Keys {
        frame: InputFrame,
    }

    impl Keys {
        fn new() -> Self {
            Self { frame: InputFrame::default() }
        }

        fn tick(&mut self, session: &mut Session, keys: KeyState) {
            self.frame = self.frame.next(keys);
            session.tick(&self.frame);
        }

        fn tap(&mut self, session: &mut Session, key: Key) {
            self.tick(session, KeyState::new().with(key));
            self.tick(session, KeyState::new());
        }

        fn idle(&mut self, session: &mut Session, ticks: usize) {
            for _ in 0..ticks {
                self.tick(session, KeyState::new());
            }
        }

        /// Answer the open question with its correct answer or a wrong one
        fn answer(&mut self, session: &mut Session, correct: bool) {
            self.idle(session, 4);
            let question = session.dialogue().active().unwrap().question().unwrap();
            let index = if correct {
                question.correct_index()
            } else {
                (question.correct_index() + 1) % question.answers().len()
            };
            let digit = [Key::Digit1, Key::Digit2, Key::Digit3, Key::Digit4][index];
            self.tap(session, digit);
            self.tap(session, Key::Enter);
            // Dismiss the response
            self.idle(session, 2);
            self.tap(session, Key::Enter);
        }
    }

    fn stand_near_teacher(session: &mut Session) {
        let pos = session.world.npcs[0].map_pos + IVec2::new(0, 40);
        session.player.position = pos;
    }

    #[test]
    fn test_quiz_through_teacher() {
        let mut s = session(WorldKind::PhysicsLab, GameState::new());
        let mut keys = Keys::new();
        stand_near_teacher(&mut s);

        for i in 0..5 {
            keys.tap(&mut s, Key::F);
            assert!(s.dialogue().active().unwrap().question().is_some(), "no question {}", i);
            keys.answer(&mut s, i % 2 == 0);
            assert!(!s.dialogue().is_dialogue_active());
        }
        let quiz = s.state().quiz(LabTopic::Physics);
        assert_eq!((quiz.answered, quiz.correct), (5, 3));
        assert!(s.state().is_quiz_passed(LabTopic::Physics));
        assert_eq!(s.state().xp(), 3 * 10 + 2 * 2);
    }

    #[test]
    fn test_movement_blocked_while_dialogue_open() {
        let mut s = session(WorldKind::Classroom, GameState::new());
        let mut keys = Keys::new();
        s.player.position = IVec2::new(480, 300);
        keys.tap(&mut s, Key::F);
        assert!(s.dialogue().is_dialogue_active());

        let before = s.player().position;
        keys.tick(&mut s, KeyState::new().with(Key::Left));
        assert_eq!(s.player().position, before);
    }

    #[test]
    fn test_station_gated_by_quiz_then_runs() {
        let mut s = session(WorldKind::PhysicsLab, GameState::new());
        let mut keys = Keys::new();
        let station = s.world().stations[1].clone();
        assert_eq!(station.challenge_id, "dynamo");
        assert!(station.is_barrier_active());
        s.player.position = station.map_pos + IVec2::new(0, 40);

        keys.tap(&mut s, Key::G);
        assert!(s.challenge().is_none());
        assert!(s.dialogue().is_dialogue_active());
        keys.idle(&mut s, 2);
        keys.tap(&mut s, Key::Enter);
        assert!(!s.dialogue().is_dialogue_active());

        for _ in 0..5 {
            s.state.record_answer(LabTopic::Physics, true);
        }
        keys.tap(&mut s, Key::G);
        assert!(s.challenge().is_some());
        assert!(s.state().is_mini_quest_active());

        // Dynamo is a mash challenge on F
        for _ in 0..25 {
            keys.tap(&mut s, Key::F);
        }
        assert!(s.challenge().is_none());
        assert!(!s.state().is_mini_quest_active());
        assert!(s.state().is_challenge_completed("dynamo"));
        assert!(!s.world().stations[1].is_barrier_active());
        assert!(s.dialogue().is_dialogue_active());
    }

    fn quiz_state(topic: LabTopic, correct: usize) -> GameState {
        let mut state = GameState::new();
        for i in 0..5 {
            state.record_answer(topic, i < correct);
        }
        state
    }

    #[test]
    fn test_failed_quiz_keeps_retry_lab_stations_shut() {
        let mut s = session(WorldKind::PhysicsLab, quiz_state(LabTopic::Physics, 2));
        let mut keys = Keys::new();
        assert!(s.state().is_quiz_gate_complete(LabTopic::Physics));
        assert!(!s.state().is_quiz_passed(LabTopic::Physics));
        let station = s.world().stations[1].clone();
        s.player.position = station.map_pos + IVec2::new(0, 40);

        keys.tap(&mut s, Key::G);
        assert!(s.challenge().is_none());
        assert!(!s.state().is_mini_quest_active());
        assert!(s.dialogue().is_dialogue_active());
    }

    #[test]
    fn test_failed_quiz_still_opens_biology_stations() {
        let mut s = session(WorldKind::BiologyLab, quiz_state(LabTopic::Biology, 2));
        let mut keys = Keys::new();
        assert!(!s.state().is_quiz_passed(LabTopic::Biology));
        let station = s.world().stations[0].clone();
        s.player.position = station.map_pos + IVec2::new(0, 40);

        keys.tap(&mut s, Key::G);
        assert!(s.challenge().is_some());
        assert_eq!(s.challenge().unwrap().station, station.challenge_id);
    }

    #[test]
    fn test_repair_waits_for_dialogue_close() {
        let mut state = GameState::new();
        for _ in 0..5 {
            state.record_answer(LabTopic::Physics, true);
        }
        state.finish_mini_quest("pendulum", true);
        state.finish_mini_quest("dynamo", true);
        let xp = state.xp();

        let mut s = session(WorldKind::PhysicsLab, state);
        let mut keys = Keys::new();
        stand_near_teacher(&mut s);

        keys.tap(&mut s, Key::F);
        assert!(s.dialogue().is_dialogue_active());
        assert!(!s.state().is_lab_completed(LabTopic::Physics));
        let generation = s.world().map_generation();

        keys.idle(&mut s, 2);
        keys.tap(&mut s, Key::Enter);
        assert!(!s.dialogue().is_dialogue_active());
        assert!(s.state().is_lab_completed(LabTopic::Physics));
        assert!(s.state().has_badge("Physics Lab"));
        assert_eq!(s.state().xp(), xp + XP_LAB_REPAIR);
        assert!(s.world().is_repaired());
        assert_eq!(s.world().map_generation(), generation + 1);
    }

    #[test]
    fn test_exit_switches_world_and_resets_dialogue() {
        let mut s = session(WorldKind::Classroom, GameState::new());
        let mut keys = Keys::new();
        // Just right of the physics door, walking left into it
        s.player.position = IVec2::new(50, 330);
        for _ in 0..10 {
            keys.tick(&mut s, KeyState::new().with(Key::Left));
            if s.world().kind() != WorldKind::Classroom {
                break;
            }
        }
        assert_eq!(s.world().kind(), WorldKind::PhysicsLab);
        assert_eq!(s.player().position, s.world().spawn());
        assert!(!s.dialogue().is_dialogue_active());
    }

    #[test]
    fn test_enter_world_drops_open_dialogue() {
        let mut s = session(WorldKind::Classroom, GameState::new());
        s.dialogue.show_dialogue(Dialogue::text("x", "hello"), Requester::World);
        s.enter_world(WorldKind::BiologyLab, IVec2::new(480, 600));
        assert!(!s.dialogue().is_dialogue_active());
        assert_eq!(s.world().kind(), WorldKind::BiologyLab);
    }
}
