//! # A* Pathfinding
//!
//! Shortest walkable paths over a tile set for autonomous movement.

use crate::{Position, Tile, TileType};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Open-set entry for the A* search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AStarNode {
    position: Position,
    g_cost: u32,
    f_cost: u32,
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior in BinaryHeap
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| self.g_cost.cmp(&other.g_cost))
            .then_with(|| other.position.cmp(&self.position))
    }
}

/// Finds a shortest 4-directional path from `start` to `goal`.
///
/// Returns the per-step deltas in start-to-goal order (empty when
/// `start == goal`), or `None` when the goal cannot be reached. Cells outside
/// `width` x `height` and `Wall` tiles are impassable; positions that have no
/// tile in `tiles` are treated as open ground.
///
/// # Examples
///
/// ```
/// use depths::{find_path, Level, Position, TileType};
///
/// let mut level = Level::new(5, 3);
/// for x in 0..5 {
///     level.set_tile_type(Position::new(x, 1), TileType::Floor).unwrap();
/// }
/// let path = find_path(Position::new(0, 1), Position::new(4, 1), &level.tiles, 5, 3).unwrap();
/// assert_eq!(path, vec![Position::new(1, 0); 4]);
/// ```
pub fn find_path(
    start: Position,
    goal: Position,
    tiles: &[Tile],
    width: i32,
    height: i32,
) -> Option<Vec<Position>> {
    let in_bounds = |pos: Position| pos.x >= 0 && pos.y >= 0 && pos.x < width && pos.y < height;
    if !in_bounds(start) || !in_bounds(goal) {
        return None;
    }

    let walls: HashSet<Position> = tiles
        .iter()
        .filter(|tile| tile.tile_type == TileType::Wall)
        .map(|tile| tile.position)
        .collect();

    let mut open_set = BinaryHeap::new();
    let mut closed_set = HashSet::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut g_score: HashMap<Position, u32> = HashMap::new();

    g_score.insert(start, 0);
    open_set.push(AStarNode {
        position: start,
        g_cost: 0,
        f_cost: start.manhattan_distance(goal),
    });

    while let Some(current) = open_set.pop() {
        if current.position == goal {
            return Some(reconstruct_deltas(&came_from, start, goal));
        }

        // Stale entries superseded by a cheaper route are skipped here
        if !closed_set.insert(current.position) {
            continue;
        }

        for neighbor in current.position.cardinal_adjacent_positions() {
            if !in_bounds(neighbor) || walls.contains(&neighbor) || closed_set.contains(&neighbor) {
                continue;
            }

            let tentative_g = current.g_cost + 1;
            if g_score
                .get(&neighbor)
                .is_some_and(|&existing| tentative_g >= existing)
            {
                continue;
            }

            came_from.insert(neighbor, current.position);
            g_score.insert(neighbor, tentative_g);
            open_set.push(AStarNode {
                position: neighbor,
                g_cost: tentative_g,
                f_cost: tentative_g + neighbor.manhattan_distance(goal),
            });
        }
    }

    None
}

/// Walks parent links back from the goal and emits unit deltas in order.
fn reconstruct_deltas(
    came_from: &HashMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut deltas = Vec::new();
    let mut current = goal;

    while current != start {
        let Some(&previous) = came_from.get(&current) else {
            break;
        };
        deltas.push(current - previous);
        current = previous;
    }

    deltas.reverse();
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;

    /// Builds a level from rows of `#` (wall) and `.` (floor).
    fn level_from(rows: &[&str]) -> Level {
        let mut level = Level::new(rows[0].len() as i32, rows.len() as i32);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '.' {
                    level
                        .set_tile_type(Position::new(x as i32, y as i32), TileType::Floor)
                        .unwrap();
                }
            }
        }
        level
    }

    fn walk(start: Position, deltas: &[Position]) -> Vec<Position> {
        let mut cells = vec![start];
        let mut current = start;
        for &delta in deltas {
            current = current + delta;
            cells.push(current);
        }
        cells
    }

    #[test]
    fn test_straight_corridor() {
        let level = level_from(&["#######", "#.....#", "#######"]);
        let path = find_path(
            Position::new(1, 1),
            Position::new(5, 1),
            &level.tiles,
            level.width,
            level.height,
        )
        .unwrap();
        assert_eq!(path.len(), 4);
        assert!(path.iter().all(|&d| d == Position::new(1, 0)));
    }

    #[test]
    fn test_detour_around_wall() {
        let level = level_from(&[
            "#######",
            "#..#..#",
            "#..#..#",
            "#.....#",
            "#######",
        ]);
        let start = Position::new(1, 1);
        let goal = Position::new(5, 1);
        let path = find_path(start, goal, &level.tiles, level.width, level.height).unwrap();

        // Down two, across four, up two
        assert_eq!(path.len(), 8);
        let cells = walk(start, &path);
        assert_eq!(*cells.last().unwrap(), goal);
        for cell in cells {
            assert_ne!(level.tile_type(cell), Some(TileType::Wall));
        }
        for delta in path {
            assert_eq!(delta.manhattan_distance(Position::origin()), 1);
        }
    }

    #[test]
    fn test_unreachable_goal() {
        let level = level_from(&["#####", "#.#.#", "#####"]);
        let path = find_path(
            Position::new(1, 1),
            Position::new(3, 1),
            &level.tiles,
            level.width,
            level.height,
        );
        assert!(path.is_none());
    }

    #[test]
    fn test_start_equals_goal() {
        let level = level_from(&["###", "#.#", "###"]);
        let path = find_path(
            Position::new(1, 1),
            Position::new(1, 1),
            &level.tiles,
            level.width,
            level.height,
        );
        assert_eq!(path, Some(Vec::new()));
    }

    #[test]
    fn test_out_of_bounds_endpoints() {
        let level = level_from(&["...", "...", "..."]);
        assert!(find_path(Position::new(0, 0), Position::new(3, 0), &level.tiles, 3, 3).is_none());
        assert!(find_path(Position::new(-1, 0), Position::new(2, 2), &level.tiles, 3, 3).is_none());
    }

    #[test]
    fn test_missing_tiles_are_passable() {
        // Only a single wall is known; the rest of the grid is open ground.
        let tiles = vec![Tile::new(Position::new(1, 0), TileType::Wall)];
        let path = find_path(Position::new(0, 0), Position::new(2, 0), &tiles, 3, 2).unwrap();
        assert_eq!(path.len(), 4);
    }
}
