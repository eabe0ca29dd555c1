//! Tile maps: parsing, layer grids, collision geometry and the composited
//! background image.
//!
//! Two source formats yield the same [`TileMap`]:
//! - Tiled JSON (`.json`): flat `data` arrays per tile layer, plus an
//!   optional `Collision` object layer whose pixel rectangles are used as-is.
//! - Legacy XML (`.tmx`/`.xml`): CSV `<data>` per layer. Collision is derived
//!   from the non-empty cells of the object layers.

use macroquad::math::IVec2;
use macroquad::texture::Image;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::collision::{box_collides, CollisionRect};
use crate::render::tileset::Tileset;

/// Top three bits of a GID are horizontal/vertical/diagonal flip flags
pub const GID_FLAG_MASK: u32 = 0x1FFF_FFFF;

/// Largest map edge in pixels; composited images use 16-bit dimensions
pub const MAX_MAP_PIXELS: u32 = u16::MAX as u32;
/// Largest tile count per layer
pub const MAX_MAP_TILES: u32 = 1 << 20;

pub fn strip_gid_flags(raw: u32) -> u32 {
    raw & GID_FLAG_MASK
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON map: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid XML map: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("map is missing attribute '{0}'")]
    MissingAttribute(&'static str),
    #[error("map has zero size ({width}x{height} tiles of {tile_size}px)")]
    EmptyMap { width: u32, height: u32, tile_size: u32 },
    #[error("map is too large ({width}x{height} tiles of {tile_size}px)")]
    TooLarge { width: u32, height: u32, tile_size: u32 },
    #[error("unrecognised map format")]
    UnknownFormat,
}

/// Named tile layers the game understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Floor,
    Objects,
    Objects1,
    OnTop,
}

impl LayerKind {
    /// Match a layer name, accepting the `Collision` aliases
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "floor" => Some(LayerKind::Floor),
            "objects" | "collision" => Some(LayerKind::Objects),
            "objects1" | "collision1" => Some(LayerKind::Objects1),
            "on-top" | "ontop" | "on_top" => Some(LayerKind::OnTop),
            _ => None,
        }
    }
}

/// Fixed-size grid of masked GIDs (0 = empty)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    cells: Vec<u32>,
}

impl TileGrid {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width as usize * height as usize],
        }
    }

    /// Build from raw GIDs; flip flags are stripped. A cell count that does
    /// not match the dimensions yields `None`.
    pub fn from_raw(width: u32, height: u32, raw: &[u32]) -> Option<Self> {
        if raw.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            cells: raw.iter().map(|&gid| strip_gid_flags(gid)).collect(),
        })
    }

    pub fn get(&self, x: u32, y: u32) -> u32 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&gid| gid == 0)
    }
}

/// Parsed map data before any image work
#[derive(Debug, Clone)]
pub struct MapData {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    pub first_gid: u32,
    pub floor: TileGrid,
    pub objects: TileGrid,
    pub objects1: TileGrid,
    pub on_top: Option<TileGrid>,
    /// Rectangles from an explicit collision object layer, if any
    pub collision_objects: Option<Vec<CollisionRect>>,
}

impl MapData {
    fn new(width: u32, height: u32, tile_size: u32) -> Result<Self, MapError> {
        if width == 0 || height == 0 || tile_size == 0 {
            return Err(MapError::EmptyMap { width, height, tile_size });
        }
        let fits = |tiles: u32| tiles.checked_mul(tile_size).is_some_and(|px| px <= MAX_MAP_PIXELS);
        let tiles = width.checked_mul(height);
        if !fits(width) || !fits(height) || tiles.map_or(true, |n| n > MAX_MAP_TILES) {
            return Err(MapError::TooLarge { width, height, tile_size });
        }
        Ok(Self {
            width,
            height,
            tile_size,
            first_gid: 1,
            floor: TileGrid::empty(width, height),
            objects: TileGrid::empty(width, height),
            objects1: TileGrid::empty(width, height),
            on_top: None,
            collision_objects: None,
        })
    }

    /// Store a layer; malformed data leaves the layer empty
    fn set_layer(&mut self, kind: LayerKind, name: &str, raw: Option<Vec<u32>>) {
        let grid = match raw.and_then(|r| TileGrid::from_raw(self.width, self.height, &r)) {
            Some(grid) => grid,
            None => {
                log::warn!("Layer '{}' has malformed data, treating it as empty", name);
                TileGrid::empty(self.width, self.height)
            }
        };
        match kind {
            LayerKind::Floor => self.floor = grid,
            LayerKind::Objects => self.objects = grid,
            LayerKind::Objects1 => self.objects1 = grid,
            LayerKind::OnTop => self.on_top = Some(grid),
        }
    }

    /// Collision geometry: the explicit object layer when present, otherwise
    /// one rectangle per horizontal run of occupied object-layer cells
    pub fn collision_rects(&self) -> Vec<CollisionRect> {
        if let Some(rects) = &self.collision_objects {
            return rects.clone();
        }
        let ts = self.tile_size as i32;
        let mut rects = Vec::new();
        for y in 0..self.height {
            let mut run_start: Option<u32> = None;
            for x in 0..=self.width {
                let blocked = x < self.width && (self.objects.get(x, y) != 0 || self.objects1.get(x, y) != 0);
                match (blocked, run_start) {
                    (true, None) => run_start = Some(x),
                    (false, Some(start)) => {
                        rects.push(CollisionRect::new(
                            start as i32 * ts,
                            y as i32 * ts,
                            (x - start) as i32 * ts,
                            ts,
                        ));
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }
        rects
    }
}

// ============================================================================
// Tiled JSON
// ============================================================================

#[derive(Debug, Deserialize)]
struct JsonMap {
    width: u32,
    height: u32,
    tilewidth: u32,
    #[serde(default)]
    layers: Vec<JsonLayer>,
    #[serde(default)]
    tilesets: Vec<JsonTilesetRef>,
}

#[derive(Debug, Deserialize)]
struct JsonLayer {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    layer_type: String,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    objects: Vec<JsonObject>,
}

#[derive(Debug, Deserialize)]
struct JsonObject {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
}

#[derive(Debug, Deserialize)]
struct JsonTilesetRef {
    #[serde(default = "default_first_gid")]
    firstgid: u32,
}

fn default_first_gid() -> u32 {
    1
}

fn json_gids(value: &serde_json::Value) -> Option<Vec<u32>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_u64().and_then(|n| u32::try_from(n).ok()))
        .collect()
}

pub fn parse_json(source: &str) -> Result<MapData, MapError> {
    let raw: JsonMap = serde_json::from_str(source)?;
    let mut data = MapData::new(raw.width, raw.height, raw.tilewidth)?;
    if let Some(first) = raw.tilesets.first() {
        data.first_gid = first.firstgid;
    }

    for layer in &raw.layers {
        match layer.layer_type.as_str() {
            "tilelayer" => match LayerKind::from_name(&layer.name) {
                Some(kind) => data.set_layer(kind, &layer.name, json_gids(&layer.data)),
                None => log::debug!("Ignoring tile layer '{}'", layer.name),
            },
            "objectgroup" if layer.name.eq_ignore_ascii_case("collision") => {
                let rects = layer
                    .objects
                    .iter()
                    .filter(|o| o.width > 0.0 && o.height > 0.0)
                    .map(|o| {
                        CollisionRect::new(
                            o.x.round() as i32,
                            o.y.round() as i32,
                            o.width.round() as i32,
                            o.height.round() as i32,
                        )
                    })
                    .collect::<Vec<_>>();
                log::debug!("Collision layer has {} rectangles", rects.len());
                data.collision_objects = Some(rects);
            }
            other => log::debug!("Ignoring {} layer '{}'", other, layer.name),
        }
    }

    Ok(data)
}

// ============================================================================
// Legacy XML
// ============================================================================

fn xml_u32(node: roxmltree::Node, name: &'static str) -> Result<u32, MapError> {
    node.attribute(name)
        .and_then(|v| v.trim().parse().ok())
        .ok_or(MapError::MissingAttribute(name))
}

fn csv_gids(text: &str) -> Option<Vec<u32>> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>().ok())
        .collect()
}

pub fn parse_tmx(source: &str) -> Result<MapData, MapError> {
    let doc = roxmltree::Document::parse(source)?;
    let root = doc.root_element();
    if !root.has_tag_name("map") {
        return Err(MapError::UnknownFormat);
    }

    let mut data = MapData::new(
        xml_u32(root, "width")?,
        xml_u32(root, "height")?,
        xml_u32(root, "tilewidth")?,
    )?;

    if let Some(tileset) = root.children().find(|n| n.has_tag_name("tileset")) {
        data.first_gid = xml_u32(tileset, "firstgid").unwrap_or(1);
    }

    for layer in root.children().filter(|n| n.has_tag_name("layer")) {
        let name = layer.attribute("name").unwrap_or_default();
        let Some(kind) = LayerKind::from_name(name) else {
            log::debug!("Ignoring tile layer '{}'", name);
            continue;
        };
        let gids = layer
            .children()
            .find(|n| n.has_tag_name("data"))
            .filter(|d| d.attribute("encoding").map_or(true, |e| e == "csv"))
            .and_then(|d| d.text())
            .and_then(csv_gids);
        data.set_layer(kind, name, gids);
    }

    Ok(data)
}

/// Pick a parser from the extension, or sniff the content
pub fn parse_map(path: &Path, source: &str) -> Result<MapData, MapError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match ext.as_deref() {
        Some("json") => parse_json(source),
        Some("tmx") | Some("xml") => parse_tmx(source),
        _ => match source.trim_start().chars().next() {
            Some('{') => parse_json(source),
            Some('<') => parse_tmx(source),
            _ => Err(MapError::UnknownFormat),
        },
    }
}

// ============================================================================
// TileMap
// ============================================================================

/// A loaded map: grids, collision rectangles and composited images
#[derive(Debug, Clone)]
pub struct TileMap {
    data: MapData,
    collision: Vec<CollisionRect>,
    full_image: Image,
    on_top_image: Option<Image>,
}

impl TileMap {
    /// Read, parse and composite a map file
    pub fn load(path: impl AsRef<Path>, tileset_candidates: &[String]) -> Result<Self, MapError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let data = parse_map(path, &source)?;
        let tileset = Tileset::load(tileset_candidates, data.tile_size, data.first_gid);
        let map = Self::from_data(data, &tileset);
        log::info!(
            "Loaded map {:?}: {}x{} tiles, {} collision rects",
            path,
            map.width(),
            map.height(),
            map.collision.len()
        );
        Ok(map)
    }

    pub fn from_data(data: MapData, tileset: &Tileset) -> Self {
        let full_image = tileset.composite(
            data.width,
            data.height,
            &[data.floor.cells(), data.objects.cells(), data.objects1.cells()],
        );
        let on_top_image = data
            .on_top
            .as_ref()
            .filter(|grid| !grid.is_empty())
            .map(|grid| tileset.composite(data.width, data.height, &[grid.cells()]));
        let collision = data.collision_rects();

        Self {
            data,
            collision,
            full_image,
            on_top_image,
        }
    }

    /// Width in tiles
    pub fn width(&self) -> u32 {
        self.data.width
    }

    /// Height in tiles
    pub fn height(&self) -> u32 {
        self.data.height
    }

    pub fn tile_size(&self) -> u32 {
        self.data.tile_size
    }

    pub fn pixel_size(&self) -> IVec2 {
        IVec2::new(
            self.data.width.saturating_mul(self.data.tile_size).min(i32::MAX as u32) as i32,
            self.data.height.saturating_mul(self.data.tile_size).min(i32::MAX as u32) as i32,
        )
    }

    pub fn layer(&self, kind: LayerKind) -> Option<&TileGrid> {
        match kind {
            LayerKind::Floor => Some(&self.data.floor),
            LayerKind::Objects => Some(&self.data.objects),
            LayerKind::Objects1 => Some(&self.data.objects1),
            LayerKind::OnTop => self.data.on_top.as_ref(),
        }
    }

    pub fn collision_rects(&self) -> &[CollisionRect] {
        &self.collision
    }

    pub fn add_collision_rect(&mut self, rect: CollisionRect) {
        self.collision.push(rect);
    }

    /// Remove one matching rectangle; false if none matched
    pub fn remove_collision_rect(&mut self, rect: &CollisionRect) -> bool {
        match self.collision.iter().position(|r| r == rect) {
            Some(idx) => {
                self.collision.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn is_collision_at(&self, center: IVec2, width: i32, height: i32) -> bool {
        box_collides(&self.collision, center, width, height)
    }

    /// Copy of the composited Floor + Objects + Objects1 image
    pub fn full_map_image(&self) -> Image {
        self.full_image.clone()
    }

    /// Copy of the composited On-Top overlay, if the map has one
    pub fn on_top_image(&self) -> Option<Image> {
        self.on_top_image.clone()
    }
}
