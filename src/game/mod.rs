pub mod camera;
pub mod collision;
pub mod dialogue;
mod entities;
pub mod npc;
pub mod quest;
pub mod question;
pub mod session;
pub mod state;
pub mod tilemap;
pub mod world;

pub use camera::Camera;
pub use collision::{CollisionRect, CollisionWorld};
pub use dialogue::{Dialogue, DialogueEvent, DialogueManager, Requester};
pub use entities::{resolve_move, Direction, Hitbox, MoveInput, MoveResolution, MovementState, Player};
pub use npc::{Npc, NpcAction, NpcRole};
pub use quest::{Challenge, ChallengeCatalog, ChallengeConfig, ChallengeMode, ChallengeOutcome};
pub use question::{DialogueQuestion, LabTopic, QuestionBank};
pub use session::Session;
pub use state::GameState;
pub use tilemap::{MapError, TileMap};
pub use world::{World, WorldKind};
