//! # Dungeon Generation
//!
//! Room-and-corridor level generation.
//!
//! This generator creates levels by:
//! 1. Placing non-overlapping rooms (with a 1-cell wall margin)
//! 2. Connecting consecutive rooms with L-shaped corridors
//! 3. Adding stairs, healing fountains, a shop and an inn
//! 4. Populating rooms with enemies, a boss on boss levels, and floor loot

use crate::{
    DepthsError, DepthsResult, EncounterGenerator, Enemy, GenerationConfig, GenerationRequest,
    Generator, IdCounters, Item, ItemGenerator, Level, Position, Room, RoomType, TileType,
};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A fully populated level, handed once to the session orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelResult {
    pub level: Level,
    /// Accepted rooms in placement order
    pub rooms: Vec<Room>,
    pub enemies: Vec<Enemy>,
    pub items: Vec<Item>,
    pub player_spawn: Position,
    /// Id counters advanced past everything this level allocated
    pub ids: IdCounters,
}

/// Primary dungeon generator using the room-and-corridor algorithm.
#[derive(Debug, Clone, Default)]
pub struct DungeonGenerator {
    pub config: GenerationConfig,
    pub encounters: EncounterGenerator,
    pub items: ItemGenerator,
}

impl DungeonGenerator {
    /// Creates a new dungeon generator with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use depths::{DungeonGenerator, Generator, GenerationRequest, IdCounters};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let generator = DungeonGenerator::new();
    /// let request = GenerationRequest { width: 60, height: 40, level_index: 1, ids: IdCounters::default() };
    /// let result = generator.generate(&request, &mut StdRng::seed_from_u64(7)).unwrap();
    /// assert!(!result.rooms.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_config(GenerationConfig::new())
    }

    pub fn with_config(config: GenerationConfig) -> Self {
        Self {
            config,
            encounters: EncounterGenerator::new(),
            items: ItemGenerator::new(),
        }
    }

    /// Places up to `base_room_count + level_index` rooms, keeping acceptance order.
    ///
    /// Candidates overlapping an accepted room (inflated by one cell) are
    /// rejected. Running out of attempts yields fewer rooms, never zero: the
    /// first candidate always fits on an empty grid.
    fn place_rooms(&self, request: &GenerationRequest, rng: &mut StdRng) -> Vec<Room> {
        let requested = (self.config.base_room_count + request.level_index) as usize;
        let attempts = requested * self.config.placement_attempts_per_room.max(1) as usize;
        let mut rooms: Vec<Room> = Vec::with_capacity(requested);

        for _ in 0..attempts {
            if rooms.len() == requested {
                break;
            }

            let width = rng.gen_range(self.config.min_room_size..self.config.max_room_size);
            let height = rng.gen_range(self.config.min_room_size..self.config.max_room_size);
            let x = rng.gen_range(1..(request.width - width - 1));
            let y = rng.gen_range(1..(request.height - height - 1));
            let candidate = Room::new(
                rooms.len() as u32,
                Position::new(x, y),
                width,
                height,
                RoomType::Normal,
            );

            if rooms
                .iter()
                .any(|existing| candidate.overlaps_with_margin(existing, 1))
            {
                continue;
            }
            rooms.push(candidate);
        }

        if rooms.len() < requested {
            debug!(
                "Placed {} of {} requested rooms on level {}",
                rooms.len(),
                requested,
                request.level_index
            );
        }
        rooms
    }

    /// Carves every cell of a room to floor.
    fn carve_room(&self, level: &mut Level, room: &Room) -> DepthsResult<()> {
        for pos in room.positions() {
            level.set_tile_type(pos, TileType::Floor)?;
        }
        Ok(())
    }

    /// Carves an L-shaped corridor from `from` to `to`.
    ///
    /// The horizontal run follows `from`'s center row, the vertical run
    /// follows `to`'s center column.
    fn carve_l_corridor(&self, level: &mut Level, from: &Room, to: &Room) -> DepthsResult<()> {
        let start = from.center();
        let end = to.center();

        for x in start.x.min(end.x)..=start.x.max(end.x) {
            level.set_tile_type(Position::new(x, start.y), TileType::Floor)?;
        }
        for y in start.y.min(end.y)..=start.y.max(end.y) {
            level.set_tile_type(Position::new(end.x, y), TileType::Floor)?;
        }
        Ok(())
    }

    /// Rolls a healing fountain at the center of each interior room.
    fn place_fountains(
        &self,
        level: &mut Level,
        rooms: &mut [Room],
        rng: &mut StdRng,
    ) -> DepthsResult<()> {
        if rooms.len() < 3 {
            return Ok(());
        }
        let last = rooms.len() - 1;
        for room in &mut rooms[1..last] {
            if rng.gen_bool(self.config.fountain_chance) {
                level.set_tile_type(room.center(), TileType::HealingFountain)?;
                room.room_type = RoomType::Fountain;
            }
        }
        Ok(())
    }

    /// Places exactly one shop and one inn.
    ///
    /// Both go to the centers of distinct interior rooms drawn from a
    /// shuffled pool. Failing that, they take one plain floor cell in each of
    /// two distinct rooms, walking the rooms in order with the spawn room
    /// last. Only a level with a single usable room puts both in it.
    fn place_services(
        &self,
        level: &mut Level,
        rooms: &mut [Room],
        spawn: Position,
        rng: &mut StdRng,
    ) -> DepthsResult<()> {
        let mut eligible: Vec<usize> = (1..rooms.len().saturating_sub(1))
            .filter(|&i| rooms[i].room_type == RoomType::Normal)
            .collect();
        eligible.shuffle(rng);

        if let [shop, inn, ..] = eligible[..] {
            level.set_tile_type(rooms[shop].center(), TileType::Shop)?;
            rooms[shop].room_type = RoomType::Shop;
            level.set_tile_type(rooms[inn].center(), TileType::Inn)?;
            rooms[inn].room_type = RoomType::Inn;
            return Ok(());
        }

        let order = (1..rooms.len()).chain(0..rooms.len().min(1));
        let spots: Vec<(usize, Position)> = order
            .filter_map(|i| service_spot(level, &rooms[i], spawn).map(|pos| (i, pos)))
            .take(2)
            .collect();

        match spots[..] {
            [(shop_room, shop), (inn_room, inn)] => {
                level.set_tile_type(shop, TileType::Shop)?;
                level.set_tile_type(inn, TileType::Inn)?;
                for (index, room_type) in [(shop_room, RoomType::Shop), (inn_room, RoomType::Inn)] {
                    if rooms[index].room_type == RoomType::Normal {
                        rooms[index].room_type = room_type;
                    }
                }
                Ok(())
            }
            [(room, shop)] => {
                let inn = rooms[room]
                    .positions()
                    .into_iter()
                    .find(|&pos| {
                        pos != spawn && pos != shop && level.tile_type(pos) == Some(TileType::Floor)
                    })
                    .ok_or_else(|| {
                        DepthsError::GenerationFailed("No room left for the inn".to_string())
                    })?;
                level.set_tile_type(shop, TileType::Shop)?;
                level.set_tile_type(inn, TileType::Inn)?;
                Ok(())
            }
            _ => Err(DepthsError::GenerationFailed(
                "No room left for the shop and inn".to_string(),
            )),
        }
    }

    /// Rolls one enemy in each room after the first.
    fn populate_enemies(
        &self,
        level: &Level,
        rooms: &[Room],
        request: &GenerationRequest,
        spawn: Position,
        ids: &mut IdCounters,
        rng: &mut StdRng,
    ) -> Vec<Enemy> {
        let mut enemies: Vec<Enemy> = Vec::new();

        for room in rooms.iter().skip(1) {
            if !rng.gen_bool(self.config.enemy_chance) {
                continue;
            }
            let free: Vec<Position> = room
                .positions()
                .into_iter()
                .filter(|&pos| {
                    pos != spawn
                        && level.tile_type(pos) == Some(TileType::Floor)
                        && !enemies.iter().any(|enemy| enemy.position == pos)
                })
                .collect();
            let Some(&position) = free.choose(rng) else {
                continue;
            };
            if let Some(enemy) =
                self.encounters
                    .spawn_enemy(request.level_index, position, ids, rng)
            {
                enemies.push(enemy);
            }
        }

        enemies
    }

    /// Places the boss in the last room, on its center unless that is the spawn.
    fn place_boss(
        &self,
        level: &Level,
        rooms: &[Room],
        request: &GenerationRequest,
        spawn: Position,
        enemies: &mut Vec<Enemy>,
        ids: &mut IdCounters,
    ) {
        let Some(last) = rooms.last() else {
            return;
        };
        let position = if last.center() != spawn {
            Some(last.center())
        } else {
            last.positions().into_iter().find(|&pos| {
                pos != spawn
                    && level.is_walkable(pos)
                    && !enemies.iter().any(|enemy| enemy.position == pos)
            })
        };

        if let Some(position) = position {
            // A regular spawn on the boss cell steps aside for the boss
            enemies.retain(|enemy| enemy.position != position);
            let boss = self
                .encounters
                .spawn_boss(request.level_index, position, ids);
            debug!("Boss {} guards level {}", boss.name, request.level_index);
            enemies.push(boss);
        }
    }

    /// Rolls one floor item next to each room's center.
    fn populate_items(
        &self,
        level: &Level,
        rooms: &[Room],
        request: &GenerationRequest,
        spawn: Position,
        enemies: &[Enemy],
        ids: &mut IdCounters,
        rng: &mut StdRng,
    ) -> Vec<Item> {
        let mut items: Vec<Item> = Vec::new();

        for room in rooms {
            if !rng.gen_bool(self.config.item_chance) {
                continue;
            }
            let center = room.center();
            let near: Vec<Position> = room
                .positions()
                .into_iter()
                .filter(|&pos| {
                    (pos.x - center.x).abs() <= 1
                        && (pos.y - center.y).abs() <= 1
                        && pos != spawn
                        && level.tile_type(pos) == Some(TileType::Floor)
                        && !enemies.iter().any(|enemy| enemy.position == pos)
                        && !items.iter().any(|item| item.position == Some(pos))
                })
                .collect();
            let Some(&position) = near.choose(rng) else {
                continue;
            };
            let id = ids.take_item_id();
            items.push(
                self.items
                    .random_floor_item(request.level_index, id, position, rng),
            );
        }

        items
    }

    /// Checks that every walkable tile is reachable from the spawn.
    fn validate_connectivity(&self, level: &Level, spawn: Position) -> DepthsResult<()> {
        let reachable: HashSet<Position> = pathfinding::prelude::bfs_reach(spawn, move |&pos| {
            pos.cardinal_adjacent_positions()
                .into_iter()
                .filter(move |&next| level.is_walkable(next))
        })
        .collect();

        let unreachable = level
            .tiles
            .iter()
            .filter(|tile| tile.tile_type.is_walkable() && !reachable.contains(&tile.position))
            .count();

        if unreachable > 0 {
            return Err(DepthsError::GenerationFailed(format!(
                "{} walkable tiles are not connected to the spawn",
                unreachable
            )));
        }
        Ok(())
    }
}

impl Generator<LevelResult> for DungeonGenerator {
    fn generate(&self, request: &GenerationRequest, rng: &mut StdRng) -> DepthsResult<LevelResult> {
        self.config.validate(request.width, request.height)?;

        // Create empty level (all walls)
        let mut level = Level::new(request.width, request.height);
        let mut ids = request.ids;

        let mut rooms = self.place_rooms(request, rng);
        for room in &rooms {
            self.carve_room(&mut level, room)?;
        }
        for pair in rooms.windows(2) {
            self.carve_l_corridor(&mut level, &pair[0], &pair[1])?;
        }

        let spawn = rooms[0].center();
        let last = rooms.len() - 1;
        level.set_tile_type(rooms[last].center(), TileType::StairsDown)?;
        rooms[last].room_type = RoomType::Exit;
        rooms[0].room_type = RoomType::Spawn;

        self.place_fountains(&mut level, &mut rooms, rng)?;
        self.place_services(&mut level, &mut rooms, spawn, rng)?;

        let mut enemies = self.populate_enemies(&level, &rooms, request, spawn, &mut ids, rng);
        if self.config.is_boss_level(request.level_index) {
            self.place_boss(&level, &rooms, request, spawn, &mut enemies, &mut ids);
        }
        let items = self.populate_items(&level, &rooms, request, spawn, &enemies, &mut ids, rng);

        level.update_visibility(spawn);

        let result = LevelResult {
            level,
            rooms,
            enemies,
            items,
            player_spawn: spawn,
            ids,
        };
        self.validate(&result, request)?;

        debug!(
            "Generated level {}: {} rooms, {} enemies, {} items",
            request.level_index,
            result.rooms.len(),
            result.enemies.len(),
            result.items.len()
        );
        Ok(result)
    }

    fn validate(&self, result: &LevelResult, _request: &GenerationRequest) -> DepthsResult<()> {
        for tile_type in [TileType::StairsDown, TileType::Shop, TileType::Inn] {
            let count = result.level.positions_of(tile_type).len();
            if count != 1 {
                return Err(DepthsError::GenerationFailed(format!(
                    "Expected exactly one {:?}, found {}",
                    tile_type, count
                )));
            }
        }
        self.validate_connectivity(&result.level, result.player_spawn)
    }

    fn generator_type(&self) -> &'static str {
        "DungeonGenerator"
    }
}

/// The room's center when it is plain floor, else its first plain floor cell.
fn service_spot(level: &Level, room: &Room, spawn: Position) -> Option<Position> {
    let plain = |pos: Position| pos != spawn && level.tile_type(pos) == Some(TileType::Floor);
    if plain(room.center()) {
        return Some(room.center());
    }
    room.positions().into_iter().find(|&pos| plain(pos))
}
