/*
 * Input Module
 *
 * This module is the interaction surface a front end drives between steps:
 * pointer attraction/repulsion, placing and removing agents, placing
 * obstacles, and editing per-agent overrides.
 *
 * Anything that changes the agent set rebuilds the quadtree immediately so
 * the next step still starts from a consistent index.
 */

use std::f64::consts::TAU;

use glam::DVec2;
use tracing::trace;

use crate::boid::{AgentId, Overrides};
use crate::error::FlockResult;
use crate::obstacle::Obstacle;
use crate::random::RandomSource;
use crate::world::FlockWorld;

impl<R: RandomSource> FlockWorld<R> {
    /// Pull every agent within `mouse_radius` of `target` towards it
    /// (`sign` < 0 pushes away). Returns how many agents were affected.
    pub fn attract_point(&mut self, target: DVec2, sign: f64) -> usize {
        let strength = self.params.mouse_attraction * sign;
        let affected = self.neighbours(target, self.params.mouse_radius);
        for &slot in &affected {
            let force = self.boids[slot].seek_point(target, strength, &self.torus);
            self.boids[slot].apply_force(force);
        }
        trace!(x = target.x, y = target.y, strength, affected = affected.len(), "point attraction");
        affected.len()
    }

    /// Drop a single agent with a random heading at `position`
    pub fn add_agent_at(&mut self, position: DVec2, size: f64) -> FlockResult<AgentId> {
        let angle = self.rng.next() * TAU;
        let speed = self.rng.next() * self.params.max_speed;
        let velocity = DVec2::new(angle.cos(), angle.sin()) * speed;
        let id = self.spawn(position, velocity, size, Overrides::default())?;
        trace!(%id, x = position.x, y = position.y, "agent added");
        Ok(id)
    }

    /// Remove every agent within `radius` of `position`
    pub fn remove_agents_near(&mut self, position: DVec2, radius: f64) -> usize {
        let doomed: Vec<AgentId> = self
            .neighbours(position, radius)
            .into_iter()
            .map(|slot| self.boids[slot].id)
            .collect();
        self.remove_ids(&doomed);
        trace!(removed = doomed.len(), "agents removed");
        doomed.len()
    }

    pub fn remove_agent(&mut self, id: AgentId) -> FlockResult<()> {
        self.index_of(id)?;
        self.remove_ids(&[id]);
        Ok(())
    }

    fn remove_ids(&mut self, ids: &[AgentId]) {
        if ids.is_empty() {
            return;
        }
        self.boids.retain(|b| !ids.contains(&b.id));
        for boid in &mut self.boids {
            for id in ids {
                boid.overrides.ignore.remove(id);
            }
        }
        self.rebuild_index();
    }

    pub fn place_obstacle(&mut self, obstacle: Obstacle) {
        trace!(?obstacle, "obstacle placed");
        self.obstacles.push(obstacle);
    }

    pub fn clear_obstacles(&mut self) {
        self.obstacles.clear();
    }

    pub fn set_locked(&mut self, id: AgentId, locked: bool) -> FlockResult<()> {
        let slot = self.index_of(id)?;
        self.boids[slot].overrides.locked = locked;
        Ok(())
    }

    pub fn set_overrides(&mut self, id: AgentId, overrides: Overrides) -> FlockResult<()> {
        let slot = self.index_of(id)?;
        overrides.validate()?;
        self.boids[slot].overrides = overrides;
        Ok(())
    }

    /// Make two agents pass through each other
    pub fn ignore_pair(&mut self, a: AgentId, b: AgentId) -> FlockResult<()> {
        let sa = self.index_of(a)?;
        let sb = self.index_of(b)?;
        self.boids[sa].overrides.ignore.insert(b);
        self.boids[sb].overrides.ignore.insert(a);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlockError;
    use crate::geometry::Wrap;
    use crate::params::SimulationParams;

    fn world() -> FlockWorld {
        FlockWorld::seeded(SimulationParams {
            width: 100.0,
            height: 100.0,
            wrap: Wrap::BOTH,
            mouse_radius: 20.0,
            mouse_attraction: 0.5,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn attraction_only_reaches_agents_in_radius() {
        let mut w = world();
        w.spawn(DVec2::new(50.0, 50.0), DVec2::ZERO, 2.0, Overrides::default()).unwrap();
        w.spawn(DVec2::new(90.0, 50.0), DVec2::ZERO, 2.0, Overrides::default()).unwrap();

        assert_eq!(w.attract_point(DVec2::new(60.0, 50.0), 1.0), 1);
        assert_eq!(w.boids()[0].acceleration, DVec2::new(0.5, 0.0));
        assert_eq!(w.boids()[1].acceleration, DVec2::ZERO);

        w.attract_point(DVec2::new(60.0, 50.0), -2.0);
        assert_eq!(w.boids()[0].acceleration, DVec2::new(-0.5, 0.0));
    }

    #[test]
    fn removal_purges_ignore_lists() {
        let mut w = world();
        let a = w.spawn(DVec2::new(10.0, 10.0), DVec2::ZERO, 2.0, Overrides::default()).unwrap();
        let b = w.spawn(DVec2::new(80.0, 80.0), DVec2::ZERO, 2.0, Overrides::default()).unwrap();
        w.ignore_pair(a, b).unwrap();
        assert!(w.boid(a).unwrap().ignores(b));

        assert_eq!(w.remove_agents_near(DVec2::new(81.0, 81.0), 3.0), 1);
        assert!(w.boid(b).is_none());
        assert!(!w.boid(a).unwrap().ignores(b));
        assert_eq!(w.quadtree().len(), 1);
        assert_eq!(w.remove_agent(b), Err(FlockError::UnknownAgent(b)));
    }

    #[test]
    fn ids_stay_stable_after_removal() {
        let mut w = world();
        let ids: Vec<AgentId> = (0..4)
            .map(|i| w.add_agent_at(DVec2::new(10.0 + 20.0 * i as f64, 50.0), 2.0).unwrap())
            .collect();
        w.remove_agent(ids[1]).unwrap();
        let fresh = w.add_agent_at(DVec2::new(5.0, 5.0), 2.0).unwrap();
        assert!(!ids.contains(&fresh));
        assert_eq!(w.boid(ids[2]).map(|b| b.position), Some(DVec2::new(50.0, 50.0)));
    }

    #[test]
    fn lock_and_obstacle_edits() {
        let mut w = world();
        let id = w.add_agent_at(DVec2::new(30.0, 30.0), 2.0).unwrap();
        w.set_locked(id, true).unwrap();
        assert!(w.boid(id).unwrap().is_locked());
        assert!(w.set_locked(AgentId(999), true).is_err());

        w.place_obstacle(Obstacle::circle(50.0, 50.0, 5.0, 1.0).unwrap());
        assert_eq!(w.obstacles().len(), 1);
        w.clear_obstacles();
        assert!(w.obstacles().is_empty());
    }

    #[test]
    fn rejected_overrides_leave_the_agent_untouched() {
        let mut w = world();
        let id = w.add_agent_at(DVec2::new(30.0, 30.0), 2.0).unwrap();
        let fast = Overrides {
            max_speed: Some(6.0),
            ..Default::default()
        };
        w.set_overrides(id, fast.clone()).unwrap();

        let broken = Overrides {
            max_speed: Some(f64::NAN),
            ..Default::default()
        };
        assert!(matches!(w.set_overrides(id, broken), Err(FlockError::InvalidConfig(_))));
        assert_eq!(w.boid(id).unwrap().overrides, fast);
    }
}
