/*
 * Boid Module
 *
 * This module defines the Boid struct and its behavior.
 * Each boid follows the classic steering rules, all evaluated against the
 * neighbour set taken from the previous step's snapshot:
 * 1. Separation: Avoid crowding neighbors
 * 2. Alignment: Steer towards the average heading of neighbors
 * 3. Cohesion: Steer towards the average position of neighbors
 * 4. Collision: Push apart from anything physically overlapping
 *
 * Every behaviour uses the Reynolds pattern: desired direction scaled to
 * max speed, minus current velocity.
 */

use std::collections::BTreeSet;
use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{FlockError, FlockResult};
use crate::geometry::Torus;
use crate::params::SimulationParams;
use crate::random::RandomSource;

/// Stable agent identity; survives removals of other agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-agent overrides. Any `None` falls back to the model-level value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    pub max_speed: Option<f64>,
    pub max_force: Option<f64>,
    pub gravity: Option<f64>,
    pub collision_force: Option<f64>,
    pub alignment_strength: Option<f64>,
    pub cohesion_strength: Option<f64>,
    pub separation_strength: Option<f64>,
    /// Frozen in place: no integration, no Brownian draws
    pub locked: bool,
    /// Agents this one never collides with
    pub ignore: BTreeSet<AgentId>,
}

impl Overrides {
    /// Every set value must be finite; speed and force caps must not be negative
    pub fn validate(&self) -> FlockResult<()> {
        let values = [
            ("max_speed", self.max_speed),
            ("max_force", self.max_force),
            ("gravity", self.gravity),
            ("collision_force", self.collision_force),
            ("alignment_strength", self.alignment_strength),
            ("cohesion_strength", self.cohesion_strength),
            ("separation_strength", self.separation_strength),
        ];
        for (name, value) in values {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(FlockError::InvalidConfig(format!(
                        "override {name} must be finite, got {v}"
                    )));
                }
            }
        }
        for (name, value) in [("max_speed", self.max_speed), ("max_force", self.max_force)] {
            if let Some(v) = value.filter(|v| *v < 0.0) {
                return Err(FlockError::InvalidConfig(format!(
                    "override {name} must not be negative, got {v}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boid {
    pub id: AgentId,
    pub position: DVec2,
    pub velocity: DVec2,
    pub acceleration: DVec2,
    /// Diameter
    pub size: f64,
    pub overrides: Overrides,
    /// Set during force computation when a collision neighbour was found
    pub overlapping: bool,
}

/// Desired-minus-velocity steering for an accumulated direction.
/// An empty or cancelling accumulation steers nowhere.
#[inline]
fn steer(sum: DVec2, count: usize, max_speed: f64, velocity: DVec2) -> DVec2 {
    if count == 0 {
        return DVec2::ZERO;
    }
    let desired = (sum / count as f64).normalize_or_zero();
    if desired == DVec2::ZERO {
        return DVec2::ZERO;
    }
    desired * max_speed - velocity
}

impl Boid {
    pub fn new(id: AgentId, position: DVec2, velocity: DVec2, size: f64) -> Self {
        Self {
            id,
            position,
            velocity,
            acceleration: DVec2::ZERO,
            size,
            overrides: Overrides::default(),
            overlapping: false,
        }
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn max_speed(&self, params: &SimulationParams) -> f64 {
        self.overrides.max_speed.unwrap_or(params.max_speed)
    }

    pub fn max_force(&self, params: &SimulationParams) -> f64 {
        self.overrides.max_force.unwrap_or(params.max_force)
    }

    pub fn gravity(&self, params: &SimulationParams) -> f64 {
        self.overrides.gravity.unwrap_or(params.gravity)
    }

    pub fn collision_force(&self, params: &SimulationParams) -> f64 {
        self.overrides.collision_force.unwrap_or(params.collision_force)
    }

    pub fn alignment_strength(&self, params: &SimulationParams) -> f64 {
        self.overrides.alignment_strength.unwrap_or(params.alignment.strength)
    }

    pub fn cohesion_strength(&self, params: &SimulationParams) -> f64 {
        self.overrides.cohesion_strength.unwrap_or(params.cohesion.strength)
    }

    pub fn separation_strength(&self, params: &SimulationParams) -> f64 {
        self.overrides.separation_strength.unwrap_or(params.separation.strength)
    }

    pub fn is_locked(&self) -> bool {
        self.overrides.locked
    }

    pub fn ignores(&self, other: AgentId) -> bool {
        self.overrides.ignore.contains(&other)
    }

    // Apply a force to the boid
    pub fn apply_force(&mut self, force: DVec2) {
        self.acceleration += force;
    }

    /// Other agents from `neighbours` within `radius` (toroidal), self excluded
    fn within<'a>(
        &'a self,
        boids: &'a [Boid],
        neighbours: &'a [usize],
        radius: f64,
        torus: &'a Torus,
    ) -> impl Iterator<Item = (&'a Boid, DVec2)> + 'a {
        neighbours.iter().filter_map(move |&i| {
            let other = &boids[i];
            if other.id == self.id {
                return None;
            }
            let offset = torus.delta(other.position, self.position);
            (offset.length() <= radius).then_some((other, offset))
        })
    }

    // Steer towards the average heading of neighbours
    pub fn alignment(
        &self,
        boids: &[Boid],
        neighbours: &[usize],
        radius: f64,
        max_speed: f64,
        torus: &Torus,
    ) -> DVec2 {
        let mut sum = DVec2::ZERO;
        let mut count = 0;
        for (other, _) in self.within(boids, neighbours, radius, torus) {
            sum += other.velocity;
            count += 1;
        }
        steer(sum, count, max_speed, self.velocity)
    }

    // Steer away from each neighbour inside the separation radius
    pub fn separation(
        &self,
        boids: &[Boid],
        neighbours: &[usize],
        radius: f64,
        max_speed: f64,
        torus: &Torus,
    ) -> DVec2 {
        let mut sum = DVec2::ZERO;
        let mut count = 0;
        for (_, offset) in self.within(boids, neighbours, radius, torus) {
            // offset points self -> neighbour
            sum += (-offset).normalize_or_zero();
            count += 1;
        }
        steer(sum, count, max_speed, self.velocity)
    }

    // Steer towards the (wrapped) centroid of neighbours
    pub fn cohesion(
        &self,
        boids: &[Boid],
        neighbours: &[usize],
        radius: f64,
        max_speed: f64,
        torus: &Torus,
    ) -> DVec2 {
        let mut sum = DVec2::ZERO;
        let mut count = 0;
        for (_, offset) in self.within(boids, neighbours, radius, torus) {
            sum += offset;
            count += 1;
        }
        steer(sum, count, max_speed, self.velocity)
    }

    /// Separation restricted to bodies closer than this agent's size, skipping
    /// ignored agents. Also returns how many such bodies were found.
    pub fn collision_avoidance(
        &self,
        boids: &[Boid],
        neighbours: &[usize],
        max_speed: f64,
        torus: &Torus,
    ) -> (DVec2, usize) {
        let mut sum = DVec2::ZERO;
        let mut count = 0;
        for &i in neighbours {
            let other = &boids[i];
            if other.id == self.id || self.ignores(other.id) {
                continue;
            }
            let away = torus.delta(self.position, other.position);
            if away.length() < self.size {
                sum += away.normalize_or_zero();
                count += 1;
            }
        }
        (steer(sum, count, max_speed, self.velocity), count)
    }

    /// Pull towards `target` (negative `strength` pushes away)
    pub fn seek_point(&self, target: DVec2, strength: f64, torus: &Torus) -> DVec2 {
        let towards = torus.delta(target, self.position);
        let distance = towards.length();
        let distance = if distance > 0.0 { distance } else { 1.0 };
        towards / distance * strength
    }

    /// One kinematic step: clamp, integrate, friction, Brownian kick, reset.
    /// Locked agents are untouched and draw nothing from `rng`.
    pub fn integrate<R: RandomSource + ?Sized>(&mut self, params: &SimulationParams, rng: &mut R) {
        if self.is_locked() {
            self.acceleration = DVec2::ZERO;
            return;
        }

        let max_force = self.max_force(params);
        let max_speed = self.max_speed(params);

        self.acceleration = self.acceleration.clamp_length_max(max_force);
        self.velocity = (self.velocity + self.acceleration).clamp_length_max(max_speed);
        self.position += self.velocity;
        self.velocity *= 1.0 - params.friction;

        let kick_x = params.brownian * (2.0 * rng.next() - 1.0);
        let kick_y = params.brownian * (2.0 * rng.next() - 1.0);
        self.velocity += DVec2::new(kick_x, kick_y);
        // the kick may not push past max speed
        self.velocity = self.velocity.clamp_length_max(max_speed);

        self.acceleration = DVec2::ZERO;
    }
}
