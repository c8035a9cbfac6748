//! # Generation Module
//!
//! Procedural content generation for dungeon levels, enemies and loot.
//!
//! A level is built in one pass from a `GenerationRequest` and an injected
//! `StdRng`: rooms and corridors first, then services (stairs, fountains,
//! shop and inn), then encounters and floor items. Identical seeds produce
//! identical levels.

pub mod dungeon;
pub mod encounters;
pub mod items;

pub use dungeon::*;
pub use encounters::*;
pub use items::*;

use crate::{DepthsError, DepthsResult, EntityId, Position};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Configuration for procedural generation.
///
/// Controls room geometry, spawn probabilities and boss cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Minimum room side length (inclusive)
    pub min_room_size: i32,
    /// Maximum room side length (exclusive)
    pub max_room_size: i32,
    /// Rooms requested on level 0; each level adds one more
    pub base_room_count: u32,
    /// Placement attempts made for each requested room
    pub placement_attempts_per_room: u32,
    /// Probability of a healing fountain in each interior room
    pub fountain_chance: f64,
    /// Probability of an enemy in each room after the first
    pub enemy_chance: f64,
    /// Probability of a floor item in each room
    pub item_chance: f64,
    /// A boss appears on every level that is a positive multiple of this
    pub boss_interval: u32,
}

impl GenerationConfig {
    /// Creates the default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use depths::GenerationConfig;
    ///
    /// let config = GenerationConfig::new();
    /// assert_eq!(config.min_room_size, 4);
    /// assert!(config.max_room_size > config.min_room_size);
    /// ```
    pub fn new() -> Self {
        Self {
            min_room_size: 4,
            max_room_size: 8,
            base_room_count: 5,
            placement_attempts_per_room: 1,
            fountain_chance: 0.3,
            enemy_chance: 0.7,
            item_chance: 0.4,
            boss_interval: 10,
        }
    }

    /// Creates a configuration for tests that wants every requested room.
    pub fn for_testing() -> Self {
        Self {
            placement_attempts_per_room: 50,
            ..Self::new()
        }
    }

    /// Smallest grid side that still fits the largest room plus a border.
    pub fn min_grid_side(&self) -> i32 {
        self.max_room_size + 2
    }

    /// Checks that a grid of the given size can hold at least one room.
    pub fn validate(&self, width: i32, height: i32) -> DepthsResult<()> {
        if self.min_room_size < 1 || self.max_room_size <= self.min_room_size {
            return Err(DepthsError::InvalidState(format!(
                "Room size range [{}, {}) is empty",
                self.min_room_size, self.max_room_size
            )));
        }
        if width < self.min_grid_side() || height < self.min_grid_side() {
            return Err(DepthsError::InvalidState(format!(
                "Grid {}x{} is smaller than the minimum {}x{}",
                width,
                height,
                self.min_grid_side(),
                self.min_grid_side()
            )));
        }
        if self.base_room_count == 0 {
            return Err(DepthsError::InvalidState(
                "At least one room must be requested".to_string(),
            ));
        }
        if self.boss_interval == 0 {
            return Err(DepthsError::InvalidState(
                "Boss interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `level_index` is a boss level.
    pub fn is_boss_level(&self, level_index: u32) -> bool {
        level_index > 0 && level_index % self.boss_interval == 0
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Next free enemy and item ids. Threaded through every generation call so
/// ids stay unique for the whole session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCounters {
    pub next_item_id: EntityId,
    pub next_enemy_id: EntityId,
}

impl IdCounters {
    pub fn new(next_item_id: EntityId, next_enemy_id: EntityId) -> Self {
        Self {
            next_item_id,
            next_enemy_id,
        }
    }

    pub fn take_item_id(&mut self) -> EntityId {
        let id = self.next_item_id;
        self.next_item_id += 1;
        id
    }

    pub fn take_enemy_id(&mut self) -> EntityId {
        let id = self.next_enemy_id;
        self.next_enemy_id += 1;
        id
    }
}

/// What to generate: grid size, depth and the session's id counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub width: i32,
    pub height: i32,
    pub level_index: u32,
    pub ids: IdCounters,
}

/// Represents a rectangular room in the dungeon.
///
/// Every cell of the rectangle is carved to floor; the surrounding walls come
/// from the 1-cell margin enforced between rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Placement order of this room among accepted rooms
    pub id: u32,
    /// Top-left corner of the room
    pub top_left: Position,
    pub width: i32,
    pub height: i32,
    /// Type/purpose of this room
    pub room_type: RoomType,
}

/// What a room ended up hosting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomType {
    /// Standard room with no special properties
    Normal,
    /// Player spawn room (first accepted room)
    Spawn,
    /// Room holding the stairs down (last accepted room)
    Exit,
    /// Room with a healing fountain at its center
    Fountain,
    /// Shop or merchant room
    Shop,
    /// Inn for resting
    Inn,
}

impl Room {
    /// Creates a new room.
    ///
    /// # Examples
    ///
    /// ```
    /// use depths::{Room, Position, RoomType};
    ///
    /// let room = Room::new(1, Position::new(5, 5), 6, 4, RoomType::Normal);
    /// assert_eq!(room.center(), Position::new(8, 7));
    /// assert!(room.contains(Position::new(10, 8)));
    /// ```
    pub fn new(id: u32, top_left: Position, width: i32, height: i32, room_type: RoomType) -> Self {
        Self {
            id,
            top_left,
            width,
            height,
            room_type,
        }
    }

    /// Gets the bottom-right corner of the room.
    pub fn bottom_right(&self) -> Position {
        Position::new(
            self.top_left.x + self.width - 1,
            self.top_left.y + self.height - 1,
        )
    }

    /// Gets the center position of the room.
    pub fn center(&self) -> Position {
        Position::new(
            self.top_left.x + self.width / 2,
            self.top_left.y + self.height / 2,
        )
    }

    pub fn area(&self) -> i32 {
        self.width * self.height
    }

    /// Checks if a position is inside this room.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.top_left.x
            && pos.y >= self.top_left.y
            && pos.x < self.top_left.x + self.width
            && pos.y < self.top_left.y + self.height
    }

    /// Checks if this room overlaps another once inflated by `margin` cells
    /// on every side.
    pub fn overlaps_with_margin(&self, other: &Room, margin: i32) -> bool {
        !(self.top_left.x - margin >= other.top_left.x + other.width
            || other.top_left.x >= self.top_left.x + self.width + margin
            || self.top_left.y - margin >= other.top_left.y + other.height
            || other.top_left.y >= self.top_left.y + self.height + margin)
    }

    /// Checks if this room overlaps with another room.
    pub fn overlaps(&self, other: &Room) -> bool {
        self.overlaps_with_margin(other, 0)
    }

    /// Gets all positions within this room in row-major order.
    pub fn positions(&self) -> Vec<Position> {
        let mut positions = Vec::with_capacity(self.area().max(0) as usize);
        for y in self.top_left.y..(self.top_left.y + self.height) {
            for x in self.top_left.x..(self.top_left.x + self.width) {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }
}

/// Trait for procedural generators.
pub trait Generator<T> {
    /// Generates content for the request using the injected random source.
    fn generate(&self, request: &GenerationRequest, rng: &mut StdRng) -> DepthsResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, request: &GenerationRequest) -> DepthsResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.base_room_count, 5);
        assert_eq!(config.boss_interval, 10);
        assert!(config.validate(60, 40).is_ok());
    }

    #[test]
    fn test_generation_config_rejects_small_grid() {
        let config = GenerationConfig::new();
        assert!(config.validate(9, 40).is_err());
        assert!(config.validate(10, 10).is_ok());
    }

    #[test]
    fn test_boss_levels() {
        let config = GenerationConfig::new();
        assert!(!config.is_boss_level(0));
        assert!(!config.is_boss_level(9));
        assert!(config.is_boss_level(10));
        assert!(config.is_boss_level(20));
    }

    #[test]
    fn test_id_counters() {
        let mut ids = IdCounters::new(3, 10);
        assert_eq!(ids.take_item_id(), 3);
        assert_eq!(ids.take_item_id(), 4);
        assert_eq!(ids.take_enemy_id(), 10);
        assert_eq!(ids, IdCounters::new(5, 11));
    }

    #[test]
    fn test_room_geometry() {
        let room = Room::new(1, Position::new(5, 5), 6, 4, RoomType::Normal);
        assert_eq!(room.bottom_right(), Position::new(10, 8));
        assert_eq!(room.center(), Position::new(8, 7));
        assert_eq!(room.area(), 24);
        assert_eq!(room.positions().len(), 24);
        assert!(room.contains(Position::new(5, 5)));
        assert!(!room.contains(Position::new(11, 5)));
    }

    #[test]
    fn test_room_overlap_margin() {
        let room1 = Room::new(0, Position::new(2, 2), 4, 4, RoomType::Normal);
        // Shares no cell but touches room1's right edge
        let touching = Room::new(1, Position::new(6, 2), 4, 4, RoomType::Normal);
        // One wall column between the two
        let separated = Room::new(2, Position::new(7, 2), 4, 4, RoomType::Normal);

        assert!(!room1.overlaps(&touching));
        assert!(room1.overlaps_with_margin(&touching, 1));
        assert!(touching.overlaps_with_margin(&room1, 1));
        assert!(!room1.overlaps_with_margin(&separated, 1));
        assert!(!separated.overlaps_with_margin(&room1, 1));
    }
}
