//! # Depths
//!
//! Simulation core for a dungeon-crawling card battler.
//!
//! ## Architecture Overview
//!
//! Everything in this crate is pure, synchronous state transformation driven
//! by an external tick. Presentation layers call in through a handful of
//! narrow entry points:
//!
//! - **Spatial Model**: grid positions, tiles, levels and fog of war
//! - **Generation System**: rooms, corridors, services, enemies and loot
//! - **Pathfinding**: A* over a tile set for autonomous movement
//! - **Autonomous Agent**: exploration and combat decisions for auto-play
//! - **Battle Resolver**: speed-accumulation turn engine with aggro targeting
//! - **Game State**: the session orchestrator tying the subsystems together
//!
//! Every random decision takes an explicit `StdRng`, so a fixed seed always
//! reproduces the same dungeon, the same agent decisions and the same battle.

pub mod battle;
pub mod game;
pub mod generation;
pub mod utils;

// Core module re-exports
pub use battle::*;
pub use game::*;
pub use generation::*;
pub use utils::*;

/// Core error type for the Depths simulation core.
#[derive(thiserror::Error, Debug)]
pub enum DepthsError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A precondition on the game state or its configuration does not hold
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed right now
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// A move or placement fell outside the grid
    #[error("Position ({x}, {y}) is outside the level")]
    OutOfBounds { x: i32, y: i32 },

    /// Generation produced a level that failed validation
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Depths codebase.
pub type DepthsResult<T> = Result<T, DepthsError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    /// Default dungeon width in tiles
    pub const DEFAULT_DUNGEON_WIDTH: i32 = 60;

    /// Default dungeon height in tiles
    pub const DEFAULT_DUNGEON_HEIGHT: i32 = 40;

    /// Deepest level of a default run
    pub const DEFAULT_MAX_DEPTH: u32 = 20;

    /// Radius (Euclidean) of the player's field of view
    pub const SIGHT_RADIUS: f64 = 5.0;

    /// Messages kept in the session log before the oldest is dropped
    pub const MAX_MESSAGES: usize = 50;

    /// Hit points restored by stepping onto a healing fountain
    pub const FOUNTAIN_HEAL: u32 = 30;

    /// Mana spent by the magic attack in dungeon encounters
    pub const MAGIC_COST: u32 = 15;

    /// Turn credits a battle character can bank before overflowing
    pub const MAX_TURNS: u32 = 3;

    /// Default player starting health
    pub const DEFAULT_PLAYER_HEALTH: u32 = 100;

    /// Default player starting mana
    pub const DEFAULT_PLAYER_MANA: u32 = 50;
}
