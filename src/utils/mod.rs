//! # Utilities Module
//!
//! Combat mathematics and grid pathfinding shared by the orchestrator, the
//! autonomous agent and the battle resolver.

pub mod math;
pub mod astar;

pub use math::*;
pub use astar::*;
