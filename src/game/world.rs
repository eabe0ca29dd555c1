//! Playable areas: the classroom and the three labs.
//!
//! A [`World`] owns its map, camera, NPCs, mini-quest stations and exits.
//! It is rebuilt from the progress ledger whenever the player walks
//! through an exit.

use macroquad::color::Color;
use macroquad::math::IVec2;
use serde::{Deserialize, Serialize};

use super::camera::Camera;
use super::collision::{CollisionRect, CollisionWorld};
use super::npc::{Npc, NpcRole};
use super::question::LabTopic;
use super::state::GameState;
use super::tilemap::TileMap;

const MAP_DIR: &str = "assets/maps";

/// Map size used when a world has no map: 20x15 tiles of 48px
const FALLBACK_MAP_SIZE: IVec2 = IVec2::new(960, 720);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorldKind {
    #[default]
    Classroom,
    PhysicsLab,
    ChemistryLab,
    BiologyLab,
}

impl WorldKind {
    pub fn topic(&self) -> Option<LabTopic> {
        match self {
            WorldKind::Classroom => None,
            WorldKind::PhysicsLab => Some(LabTopic::Physics),
            WorldKind::ChemistryLab => Some(LabTopic::Chemistry),
            WorldKind::BiologyLab => Some(LabTopic::Biology),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WorldKind::Classroom => "Classroom",
            WorldKind::PhysicsLab => "Physics Lab",
            WorldKind::ChemistryLab => "Chemistry Lab",
            WorldKind::BiologyLab => "Biology Lab",
        }
    }

    /// Background when the map cannot be loaded
    pub fn fallback_color(&self) -> Color {
        match self {
            WorldKind::Classroom => Color::from_rgba(92, 74, 60, 255),
            WorldKind::PhysicsLab => Color::from_rgba(40, 52, 80, 255),
            WorldKind::ChemistryLab => Color::from_rgba(44, 76, 60, 255),
            WorldKind::BiologyLab => Color::from_rgba(70, 86, 44, 255),
        }
    }
}

/// Doorway to another world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exit {
    pub rect: CollisionRect,
    pub target: WorldKind,
    /// Where the player appears in the target world
    pub arrival: IVec2,
}

/// Place where a mini-quest is started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub challenge_id: String,
    pub map_pos: IVec2,
    pub screen_pos: IVec2,
    /// Broken equipment blocking the way until the challenge is done
    pub barrier: Option<CollisionRect>,
    barrier_active: bool,
}

impl Station {
    pub fn new(challenge_id: &str, map_pos: IVec2, barrier: Option<CollisionRect>) -> Self {
        Self {
            challenge_id: challenge_id.to_string(),
            map_pos,
            screen_pos: map_pos,
            barrier,
            barrier_active: false,
        }
    }

    pub fn in_range(&self, map_point: IVec2, radius: i32) -> bool {
        let d = self.map_pos - map_point;
        (d.x as i64).pow(2) + (d.y as i64).pow(2) <= (radius as i64).pow(2)
    }

    pub fn is_barrier_active(&self) -> bool {
        self.barrier_active
    }
}

/// Static layout of a world
#[derive(Debug, Clone)]
pub struct WorldDef {
    pub kind: WorldKind,
    pub map_path: String,
    /// Map shown once the lab is repaired
    pub repaired_map_path: Option<String>,
    pub spawn: IVec2,
    pub npcs: Vec<Npc>,
    pub stations: Vec<Station>,
    pub exits: Vec<Exit>,
}

fn map_path(name: &str) -> String {
    format!("{}/{}", MAP_DIR, name)
}

/// Footprint of a station's broken equipment
fn station_barrier(pos: IVec2) -> Option<CollisionRect> {
    Some(CollisionRect::centered(pos, 96, 48))
}

const LAB_SPAWN: IVec2 = IVec2::new(480, 600);
const LAB_EXIT: CollisionRect = CollisionRect::new(408, 696, 144, 24);

impl WorldDef {
    pub fn for_kind(kind: WorldKind) -> Self {
        match kind {
            WorldKind::Classroom => Self {
                kind,
                map_path: map_path("classroom.json"),
                repaired_map_path: None,
                spawn: IVec2::new(480, 400),
                npcs: vec![Npc::new("guide", "Ms. Rivera", NpcRole::Guide, None, IVec2::new(480, 250))],
                stations: Vec::new(),
                exits: vec![
                    Exit {
                        rect: CollisionRect::new(0, 288, 24, 144),
                        target: WorldKind::PhysicsLab,
                        arrival: LAB_SPAWN,
                    },
                    Exit {
                        rect: CollisionRect::new(936, 288, 24, 144),
                        target: WorldKind::ChemistryLab,
                        arrival: LAB_SPAWN,
                    },
                    Exit {
                        rect: CollisionRect::new(408, 0, 144, 24),
                        target: WorldKind::BiologyLab,
                        arrival: LAB_SPAWN,
                    },
                ],
            },
            WorldKind::PhysicsLab => Self::lab(
                kind,
                "physics_lab",
                "json",
                Npc::new("physics_teacher", "Dr. Volt", NpcRole::Teacher, kind.topic(), IVec2::new(480, 200))
                    .with_retry(true),
                ["pendulum", "dynamo"],
                IVec2::new(90, 360),
            ),
            WorldKind::ChemistryLab => Self::lab(
                kind,
                "chemistry_lab",
                "json",
                Npc::new("chemistry_teacher", "Prof. Beaker", NpcRole::Teacher, kind.topic(), IVec2::new(480, 200))
                    .with_retry(true),
                ["titration", "stirring"],
                IVec2::new(870, 360),
            ),
            WorldKind::BiologyLab => Self::lab(
                kind,
                "biology_lab",
                "tmx",
                Npc::new("biology_teacher", "Dr. Fern", NpcRole::Teacher, kind.topic(), IVec2::new(480, 200)),
                ["microscope", "heartbeat"],
                IVec2::new(480, 100),
            ),
        }
    }

    fn lab(
        kind: WorldKind,
        name: &str,
        ext: &str,
        teacher: Npc,
        challenges: [&str; 2],
        classroom_arrival: IVec2,
    ) -> Self {
        let assistant = Npc::new(
            &format!("{}_assistant", name),
            "Lab Assistant",
            NpcRole::Assistant,
            kind.topic(),
            IVec2::new(160, 520),
        );
        let left = IVec2::new(240, 330);
        let right = IVec2::new(720, 330);
        Self {
            kind,
            map_path: map_path(&format!("{}_broken.{}", name, ext)),
            repaired_map_path: Some(map_path(&format!("{}.{}", name, ext))),
            spawn: LAB_SPAWN,
            npcs: vec![teacher, assistant],
            stations: vec![
                Station::new(challenges[0], left, station_barrier(left)),
                Station::new(challenges[1], right, station_barrier(right)),
            ],
            exits: vec![Exit {
                rect: LAB_EXIT,
                target: WorldKind::Classroom,
                arrival: classroom_arrival,
            }],
        }
    }
}

pub struct World {
    kind: WorldKind,
    map: Option<TileMap>,
    camera: Camera,
    generation: u64,
    repaired: bool,
    spawn: IVec2,
    map_path: String,
    repaired_map_path: Option<String>,
    pub npcs: Vec<Npc>,
    pub stations: Vec<Station>,
    pub exits: Vec<Exit>,
}

impl World {
    /// Build a world, showing the repaired map if its lab is complete
    pub fn build(kind: WorldKind, state: &GameState, viewport: IVec2, tileset_candidates: &[String]) -> Self {
        let def = WorldDef::for_kind(kind);
        let repaired = kind.topic().is_some_and(|t| state.is_lab_completed(t));
        let path = match (&def.repaired_map_path, repaired) {
            (Some(repaired_path), true) => repaired_path.clone(),
            _ => def.map_path.clone(),
        };
        let map = load_map(&path, tileset_candidates);
        let mut world = Self::from_def(def, map, viewport);
        world.repaired = repaired;
        world.sync_barriers(state);
        log::info!("Entered {}", kind.display_name());
        world
    }

    pub fn from_def(def: WorldDef, map: Option<TileMap>, viewport: IVec2) -> Self {
        let map_size = map.as_ref().map(|m| m.pixel_size()).unwrap_or(FALLBACK_MAP_SIZE);
        Self {
            kind: def.kind,
            map,
            camera: Camera::new(viewport, map_size),
            generation: 0,
            repaired: false,
            spawn: def.spawn,
            map_path: def.map_path,
            repaired_map_path: def.repaired_map_path,
            npcs: def.npcs,
            stations: def.stations,
            exits: def.exits,
        }
    }

    pub fn kind(&self) -> WorldKind {
        self.kind
    }

    pub fn spawn(&self) -> IVec2 {
        self.spawn
    }

    pub fn map(&self) -> Option<&TileMap> {
        self.map.as_ref()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn map_size(&self) -> IVec2 {
        self.camera.map_size
    }

    pub fn is_repaired(&self) -> bool {
        self.repaired
    }

    /// Bumped every time the map is replaced
    pub fn map_generation(&self) -> u64 {
        self.generation
    }

    /// Swap between the broken and repaired map in place
    pub fn set_map_state(&mut self, repaired: bool, state: &GameState, tileset_candidates: &[String]) {
        if repaired == self.repaired {
            return;
        }
        let path = if repaired {
            match &self.repaired_map_path {
                Some(path) => path.clone(),
                None => return,
            }
        } else {
            self.map_path.clone()
        };
        self.map = load_map(&path, tileset_candidates);
        self.repaired = repaired;
        self.generation += 1;
        self.camera
            .set_map_size(self.map.as_ref().map(|m| m.pixel_size()).unwrap_or(FALLBACK_MAP_SIZE));
        // Fresh map has none of the barriers
        for station in &mut self.stations {
            station.barrier_active = false;
        }
        self.sync_barriers(state);
    }

    /// Insert barriers for unfinished stations and remove finished ones
    pub fn sync_barriers(&mut self, state: &GameState) {
        for station in &mut self.stations {
            let Some(barrier) = station.barrier else {
                continue;
            };
            let wanted = !state.is_challenge_completed(&station.challenge_id);
            if wanted == station.barrier_active {
                continue;
            }
            if let Some(map) = self.map.as_mut() {
                if wanted {
                    map.add_collision_rect(barrier);
                } else {
                    map.remove_collision_rect(&barrier);
                }
            }
            station.barrier_active = wanted;
        }
    }

    pub fn update_camera(&mut self, focus: IVec2) {
        self.camera.update(focus);
    }

    /// Recompute screen positions; call after the camera moved this tick
    pub fn update_screen_positions(&mut self) {
        let camera = self.camera;
        for npc in &mut self.npcs {
            npc.screen_pos = camera.map_to_screen(npc.map_pos);
        }
        for station in &mut self.stations {
            station.screen_pos = camera.map_to_screen(station.map_pos);
        }
    }

    pub fn exit_touching(&self, rect: &CollisionRect) -> Option<Exit> {
        self.exits.iter().find(|e| e.rect.overlaps(rect)).copied()
    }

    pub fn nearest_npc(&self, map_point: IVec2, radius: i32) -> Option<&Npc> {
        self.npcs
            .iter()
            .filter(|n| n.in_range(map_point, radius))
            .min_by_key(|n| (n.map_pos - map_point).length_squared())
    }

    /// Whether the teacher for `topic` here sends failing students back
    pub fn quiz_requires_pass(&self, topic: LabTopic) -> bool {
        self.npcs
            .iter()
            .any(|n| n.role == NpcRole::Teacher && n.topic == Some(topic) && n.retry_on_fail)
    }

    pub fn nearest_station(&self, map_point: IVec2, radius: i32) -> Option<&Station> {
        self.stations
            .iter()
            .filter(|s| s.in_range(map_point, radius))
            .min_by_key(|s| (s.map_pos - map_point).length_squared())
    }
}

impl CollisionWorld for World {
    fn screen_to_map(&self, screen: IVec2) -> IVec2 {
        self.camera.screen_to_map(screen)
    }

    fn map_to_screen(&self, map: IVec2) -> IVec2 {
        self.camera.map_to_screen(map)
    }

    /// A world without a map never collides
    fn is_collision_at(&self, map_point: IVec2, width: i32, height: i32) -> bool {
        match &self.map {
            Some(map) => map.is_collision_at(map_point, width, height),
            None => false,
        }
    }
}

fn load_map(path: &str, tileset_candidates: &[String]) -> Option<TileMap> {
    match TileMap::load(path, tileset_candidates) {
        Ok(map) => Some(map),
        Err(e) => {
            log::warn!("Could not load map {}: {}. Using plain background.", path, e);
            None
        }
    }
}
