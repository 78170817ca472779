/*
 * Physics Module
 *
 * This module runs one simulation step in a fixed order:
 * 1. Compute forces for every agent against the quadtree built last step
 * 2. Integrate kinematics
 * 3. Resolve obstacles
 * 4. Resolve world edges (soft walls, or wraparound)
 * 5. Rebuild the quadtree from the new positions
 *
 * Forces for all agents are gathered before any agent moves, so nobody sees
 * a neighbour's updated position within the same step.
 */

use glam::DVec2;

use crate::boid::Boid;
use crate::debug::StepStats;
use crate::geometry::Torus;
use crate::params::SimulationParams;
use crate::random::RandomSource;
use crate::world::FlockWorld;

/// Net steering force for one agent and whether it is overlapping another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub force: DVec2,
    pub overlapping: bool,
}

/// Weighted sum of every behaviour plus gravity for the agent in `slot`
pub fn steering_for<R: RandomSource>(world: &FlockWorld<R>, slot: usize) -> Steering {
    let params = &world.params;
    let torus = &world.torus;
    let boids = &world.boids;
    let boid = &boids[slot];

    let neighbours = world.neighbours(boid.position, params.neighbourhood_radius());
    let max_speed = boid.max_speed(params);

    let alignment = boid.alignment(boids, &neighbours, params.alignment.radius, max_speed, torus);
    let cohesion = boid.cohesion(boids, &neighbours, params.cohesion.radius, max_speed, torus);
    let separation = boid.separation(boids, &neighbours, params.separation.radius, max_speed, torus);
    let (collision, colliders) = boid.collision_avoidance(boids, &neighbours, max_speed, torus);

    let force = alignment * boid.alignment_strength(params)
        + cohesion * boid.cohesion_strength(params)
        + separation * boid.separation_strength(params)
        + collision * boid.collision_force(params)
        + DVec2::new(0.0, boid.gravity(params));

    Steering {
        force,
        overlapping: colliders > 0,
    }
}

/// Forces for every agent, read-only against the current snapshot
pub fn compute_forces<R: RandomSource>(world: &FlockWorld<R>) -> Vec<Steering> {
    (0..world.boids.len())
        .map(|slot| {
            if world.boids[slot].is_locked() {
                Steering {
                    force: DVec2::ZERO,
                    overlapping: false,
                }
            } else {
                steering_for(world, slot)
            }
        })
        .collect()
}

/// Soft walls on closed axes, wraparound on open ones
pub fn resolve_boundaries(boid: &mut Boid, params: &SimulationParams, torus: &Torus) {
    if boid.is_locked() {
        return;
    }
    boid.position = torus.wrap_position(boid.position);

    let half = boid.size / 2.0;
    let max_force = boid.max_force(params);
    let mut spring = DVec2::ZERO;

    if !torus.wrap.x {
        spring.x += wall_push(boid.position.x, half, torus.size.x);
    }
    if !torus.wrap.y {
        spring.y += wall_push(boid.position.y, half, torus.size.y);
    }
    boid.apply_force(spring * max_force);
}

/// Signed penetration of a body of half-extent `half` past [0, extent]
#[inline]
fn wall_push(p: f64, half: f64, extent: f64) -> f64 {
    let low = half - p;
    let high = p + half - extent;
    if low > 0.0 {
        low
    } else if high > 0.0 {
        -high
    } else {
        0.0
    }
}

// Update boid positions and behaviors
pub fn update_boids<R: RandomSource>(world: &mut FlockWorld<R>) {
    let forces = compute_forces(world);

    let FlockWorld {
        params,
        torus,
        boids,
        obstacles,
        rng,
        ..
    } = &mut *world;

    let mut overlapping = 0;
    for (boid, steering) in boids.iter_mut().zip(forces) {
        boid.apply_force(steering.force);
        boid.overlapping = steering.overlapping;
        overlapping += usize::from(steering.overlapping);
    }

    for boid in boids.iter_mut() {
        boid.integrate(params, &mut *rng);
    }

    for boid in boids.iter_mut() {
        for obstacle in obstacles.iter() {
            obstacle.resolve(boid, torus);
        }
        resolve_boundaries(boid, params, torus);
    }

    world.rebuild_index();
    world.step += 1;
    world.stats = StepStats {
        step: world.step,
        agents: world.boids.len(),
        tree_nodes: world.quadtree.node_count(),
        tree_depth: world.quadtree.depth(),
        overlapping,
    };
}
