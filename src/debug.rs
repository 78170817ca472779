/*
 * Debug Information Module
 *
 * Per-step counters and the read-only snapshot handed to whatever draws the
 * world. The snapshot optionally carries every quadtree node boundary for a
 * debug overlay.
 *
 * Includes metrics for:
 * - Step number and population
 * - Quadtree node count and depth
 * - Number of agents currently overlapping another
 */

use glam::DVec2;
use serde::Serialize;

use crate::boid::{AgentId, Boid};
use crate::geometry::Rect;
use crate::obstacle::Obstacle;
use crate::random::RandomSource;
use crate::world::FlockWorld;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepStats {
    pub step: u64,
    pub agents: usize,
    pub tree_nodes: usize,
    pub tree_depth: usize,
    pub overlapping: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub position: DVec2,
    pub velocity: DVec2,
    pub size: f64,
    pub overlapping: bool,
    pub locked: bool,
}

impl From<&Boid> for AgentSnapshot {
    fn from(boid: &Boid) -> Self {
        Self {
            id: boid.id,
            position: boid.position,
            velocity: boid.velocity,
            size: boid.size,
            overlapping: boid.overlapping,
            locked: boid.is_locked(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub step: u64,
    pub width: f64,
    pub height: f64,
    pub agents: Vec<AgentSnapshot>,
    pub obstacles: Vec<Obstacle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quadtree: Option<Vec<Rect>>,
    pub stats: StepStats,
}

impl<R: RandomSource> FlockWorld<R> {
    /// Copy of the state a renderer needs after a step
    pub fn snapshot(&self, with_quadtree: bool) -> WorldSnapshot {
        WorldSnapshot {
            step: self.step,
            width: self.params.width,
            height: self.params.height,
            agents: self.boids.iter().map(AgentSnapshot::from).collect(),
            obstacles: self.obstacles.clone(),
            quadtree: with_quadtree.then(|| self.quadtree.boundaries()),
            stats: self.stats,
        }
    }

    /// Positions in agent order, for trajectory comparisons
    pub fn positions(&self) -> Vec<DVec2> {
        self.boids.iter().map(|b| b.position).collect()
    }
}
