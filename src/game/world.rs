//! # World Module
//!
//! Tiles, levels and fog-of-war visibility.

use crate::{config, DepthsError, DepthsResult, Position};
use serde::{Deserialize, Serialize};

/// Terrain of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Floor,
    Wall,
    Door,
    StairsUp,
    StairsDown,
    HealingFountain,
    Shop,
    Inn,
    Empty,
}

impl TileType {
    /// Whether an actor may stand on this tile. Walls never are.
    pub fn is_walkable(self) -> bool {
        self != TileType::Wall
    }
}

/// One grid cell and its fog-of-war flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub position: Position,
    pub tile_type: TileType,
    /// Has ever been inside the field of view
    pub revealed: bool,
    /// Is inside the field of view right now
    pub visible: bool,
}

impl Tile {
    /// Creates an unrevealed tile.
    pub fn new(position: Position, tile_type: TileType) -> Self {
        Self {
            position,
            tile_type,
            revealed: false,
            visible: false,
        }
    }

    /// Sets current visibility; becoming visible also reveals the tile.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if visible {
            self.revealed = true;
        }
    }
}

/// A rectangular level: exactly one tile per position, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<Tile>,
}

impl Level {
    /// Creates a level filled with walls.
    ///
    /// # Examples
    ///
    /// ```
    /// use depths::{Level, Position, TileType};
    ///
    /// let level = Level::new(10, 8);
    /// assert_eq!(level.tiles.len(), 80);
    /// assert_eq!(level.tile_type(Position::new(3, 3)), Some(TileType::Wall));
    /// ```
    pub fn new(width: i32, height: i32) -> Self {
        let mut tiles = Vec::with_capacity((width.max(0) * height.max(0)) as usize);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::new(Position::new(x, y), TileType::Wall));
            }
        }
        Self {
            width,
            height,
            tiles,
        }
    }

    /// Whether the position lies on the grid.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some((pos.y * self.width + pos.x) as usize)
        } else {
            None
        }
    }

    pub fn get_tile(&self, pos: Position) -> Option<&Tile> {
        self.index(pos).and_then(|i| self.tiles.get(i))
    }

    pub fn get_tile_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        self.index(pos).and_then(move |i| self.tiles.get_mut(i))
    }

    pub fn tile_type(&self, pos: Position) -> Option<TileType> {
        self.get_tile(pos).map(|tile| tile.tile_type)
    }

    /// Replaces the terrain at a position, keeping its visibility flags.
    pub fn set_tile_type(&mut self, pos: Position, tile_type: TileType) -> DepthsResult<()> {
        let tile = self
            .get_tile_mut(pos)
            .ok_or(DepthsError::OutOfBounds { x: pos.x, y: pos.y })?;
        tile.tile_type = tile_type;
        Ok(())
    }

    pub fn is_walkable(&self, pos: Position) -> bool {
        self.tile_type(pos).is_some_and(TileType::is_walkable)
    }

    pub fn is_visible(&self, pos: Position) -> bool {
        self.get_tile(pos).is_some_and(|tile| tile.visible)
    }

    pub fn is_revealed(&self, pos: Position) -> bool {
        self.get_tile(pos).is_some_and(|tile| tile.revealed)
    }

    /// Positions of every tile of the given type, in row-major order.
    pub fn positions_of(&self, tile_type: TileType) -> Vec<Position> {
        self.tiles
            .iter()
            .filter(|tile| tile.tile_type == tile_type)
            .map(|tile| tile.position)
            .collect()
    }

    pub fn stairs_down_position(&self) -> Option<Position> {
        self.positions_of(TileType::StairsDown).into_iter().next()
    }

    /// Recomputes the field of view around `origin`.
    ///
    /// Tiles within the sight radius become visible and revealed; all others
    /// become not visible but keep their revealed flag.
    pub fn update_visibility(&mut self, origin: Position) {
        for tile in &mut self.tiles {
            let in_sight = origin.euclidean_distance(tile.position) <= config::SIGHT_RADIUS;
            tile.visible = in_sight;
            tile.revealed |= in_sight;
        }
    }

    /// Reveals every tile without touching current visibility.
    pub fn reveal_all(&mut self) {
        for tile in &mut self.tiles {
            tile.revealed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walkability() {
        assert!(!TileType::Wall.is_walkable());
        assert!(TileType::Floor.is_walkable());
        assert!(TileType::StairsDown.is_walkable());
        assert!(TileType::HealingFountain.is_walkable());
    }

    #[test]
    fn test_tile_visibility_reveals() {
        let mut tile = Tile::new(Position::new(1, 1), TileType::Floor);
        assert!(!tile.revealed);
        tile.set_visible(true);
        assert!(tile.visible && tile.revealed);
        tile.set_visible(false);
        assert!(!tile.visible);
        assert!(tile.revealed);
    }

    #[test]
    fn test_level_bounds_and_lookup() {
        let mut level = Level::new(10, 5);
        assert!(level.in_bounds(Position::new(9, 4)));
        assert!(!level.in_bounds(Position::new(10, 4)));
        assert!(!level.in_bounds(Position::new(-1, 0)));
        assert!(level.get_tile(Position::new(10, 0)).is_none());

        level.set_tile_type(Position::new(2, 3), TileType::Floor).unwrap();
        assert_eq!(level.tile_type(Position::new(2, 3)), Some(TileType::Floor));
        assert_eq!(
            level.get_tile(Position::new(2, 3)).unwrap().position,
            Position::new(2, 3)
        );
        assert!(level.set_tile_type(Position::new(20, 0), TileType::Floor).is_err());
    }

    #[test]
    fn test_visibility_radius_and_memory() {
        let mut level = Level::new(30, 30);
        level.update_visibility(Position::new(5, 5));

        assert!(level.is_visible(Position::new(10, 5))); // distance 5
        assert!(level.is_visible(Position::new(8, 9))); // distance 5
        assert!(!level.is_visible(Position::new(9, 9))); // distance ~5.66
        assert!(!level.is_revealed(Position::new(9, 9)));

        level.update_visibility(Position::new(20, 20));
        assert!(!level.is_visible(Position::new(5, 5)));
        assert!(level.is_revealed(Position::new(5, 5)));
        assert!(level.is_visible(Position::new(20, 20)));
    }

    #[test]
    fn test_positions_of() {
        let mut level = Level::new(6, 6);
        level.set_tile_type(Position::new(4, 1), TileType::StairsDown).unwrap();
        assert_eq!(level.stairs_down_position(), Some(Position::new(4, 1)));
        assert!(level.positions_of(TileType::Shop).is_empty());
    }
}
