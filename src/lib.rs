/*
 * Flocking Simulation Core - Module Definitions
 *
 * This file defines the module structure for the flocking engine.
 * A FlockWorld owns the agents, obstacles, random source and the quadtree
 * rebuilt every step; the remaining modules are the pieces it is built from.
 */

// Re-export key components for easier access
pub use boid::{AgentId, Boid, Overrides};
pub use debug::{AgentSnapshot, StepStats, WorldSnapshot};
pub use error::{FlockError, FlockResult};
pub use geometry::{Rect, Torus, Wrap};
pub use grid_bridge::{grid_cell_at, GridModel};
pub use obstacle::{Obstacle, Shape};
pub use params::{BehaviourParams, SimulationParams};
pub use quadtree::{QuadPoint, QuadTree};
pub use random::{RandomSource, SeededRandom};
pub use world::FlockWorld;

// Define modules
pub mod boid;
pub mod debug;
pub mod error;
pub mod geometry;
pub mod grid_bridge;
pub mod input;
pub mod obstacle;
pub mod params;
pub mod physics;
pub mod quadtree;
pub mod random;
pub mod world;

// Constants
pub const DEFAULT_BOID_SIZE: f64 = 6.0;
