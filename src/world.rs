/*
 * World Module
 *
 * FlockWorld owns everything one simulation needs: frozen params, agents,
 * obstacles, the random source and the quadtree built at the end of the last
 * step. Every operation goes through an explicit world handle; there is no
 * ambient global state.
 */

use std::f64::consts::TAU;

use glam::DVec2;
use tracing::{debug, info};

use crate::boid::{AgentId, Boid, Overrides};
use crate::debug::StepStats;
use crate::error::{FlockError, FlockResult};
use crate::geometry::{Rect, Torus};
use crate::obstacle::Obstacle;
use crate::params::SimulationParams;
use crate::quadtree::{QuadPoint, QuadTree};
use crate::random::{RandomSource, SeededRandom};

pub struct FlockWorld<R: RandomSource = SeededRandom> {
    pub(crate) params: SimulationParams,
    pub(crate) torus: Torus,
    pub(crate) boids: Vec<Boid>,
    pub(crate) obstacles: Vec<Obstacle>,
    pub(crate) rng: R,
    pub(crate) quadtree: QuadTree,
    pub(crate) next_id: u64,
    pub(crate) step: u64,
    pub(crate) stats: StepStats,
}

impl FlockWorld<SeededRandom> {
    /// World driven by a ChaCha stream seeded from `params.seed`
    pub fn seeded(params: SimulationParams) -> FlockResult<Self> {
        let rng = SeededRandom::new(params.seed);
        Self::new(params, rng)
    }
}

impl<R: RandomSource> FlockWorld<R> {
    pub fn new(params: SimulationParams, rng: R) -> FlockResult<Self> {
        params.validate()?;
        let torus = Torus::new(params.width, params.height, params.wrap);
        let quadtree = QuadTree::new(torus.rect(), params.qt_capacity, params.max_depth);

        info!(
            width = params.width,
            height = params.height,
            wrap_x = params.wrap.x,
            wrap_y = params.wrap.y,
            neighbourhood_radius = params.neighbourhood_radius(),
            "flock world created"
        );

        Ok(Self {
            params,
            torus,
            boids: Vec::new(),
            obstacles: Vec::new(),
            rng,
            quadtree,
            next_id: 0,
            step: 0,
            stats: StepStats::default(),
        })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn torus(&self) -> &Torus {
        &self.torus
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn quadtree(&self) -> &QuadTree {
        &self.quadtree
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn stats(&self) -> &StepStats {
        &self.stats
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    pub fn boid(&self, id: AgentId) -> Option<&Boid> {
        self.boids.iter().find(|b| b.id == id)
    }

    pub(crate) fn index_of(&self, id: AgentId) -> FlockResult<usize> {
        self.boids
            .iter()
            .position(|b| b.id == id)
            .ok_or(FlockError::UnknownAgent(id))
    }

    /// Add one agent. The position is folded onto the torus on wrapping axes.
    pub fn spawn(
        &mut self,
        position: DVec2,
        velocity: DVec2,
        size: f64,
        overrides: Overrides,
    ) -> FlockResult<AgentId> {
        let id = self.push_boid(position, velocity, size, overrides)?;
        self.rebuild_index();
        Ok(id)
    }

    fn push_boid(
        &mut self,
        position: DVec2,
        velocity: DVec2,
        size: f64,
        overrides: Overrides,
    ) -> FlockResult<AgentId> {
        if !position.is_finite() || !velocity.is_finite() {
            return Err(FlockError::InvalidConfig(format!(
                "agent state must be finite, got position {position} velocity {velocity}"
            )));
        }
        if !size.is_finite() || size <= 0.0 {
            return Err(FlockError::InvalidConfig(format!(
                "agent size must be positive, got {size}"
            )));
        }
        overrides.validate()?;

        let id = AgentId(self.next_id);
        self.next_id += 1;
        let boid = Boid::new(id, self.torus.wrap_position(position), velocity, size)
            .with_overrides(overrides);
        self.boids.push(boid);
        Ok(id)
    }

    /// Scatter `n` agents uniformly over a disc of `radius` around `spot`,
    /// each with a random velocity no faster than `max_speed`.
    pub fn populate(
        &mut self,
        n: usize,
        spot: DVec2,
        radius: f64,
        size: f64,
    ) -> FlockResult<Vec<AgentId>> {
        let max_speed = self.params.max_speed;
        let mut ids = Vec::with_capacity(n);
        for _ in 0..n {
            let angle = self.rng.next() * TAU;
            let r = radius * self.rng.next().sqrt();
            let position = spot + DVec2::new(angle.cos(), angle.sin()) * r;
            let velocity = DVec2::new(
                (2.0 * self.rng.next() - 1.0) * max_speed,
                (2.0 * self.rng.next() - 1.0) * max_speed,
            )
            .clamp_length_max(max_speed);
            ids.push(self.push_boid(position, velocity, size, Overrides::default())?);
        }
        self.rebuild_index();
        info!(added = n, total = self.boids.len(), "population spawned");
        Ok(ids)
    }

    /// Root boundary: the domain, grown to cover agents that overshot a soft wall
    fn index_boundary(&self) -> Rect {
        let domain = self.torus.rect();
        let (mut min, mut max) = (domain.min(), domain.max());
        for boid in &self.boids {
            min = min.min(boid.position);
            max = max.max(boid.position);
        }
        if min == domain.min() && max == domain.max() {
            return domain;
        }
        // pad so rounding in the centre/extent form cannot shave off an edge point
        Rect::from_corners(min - DVec2::ONE, max + DVec2::ONE)
    }

    /// Throw the old tree away and index current positions
    pub fn rebuild_index(&mut self) {
        let boundary = self.index_boundary();
        self.quadtree = QuadTree::build(
            boundary,
            self.params.qt_capacity,
            self.params.max_depth,
            self.boids
                .iter()
                .enumerate()
                .map(|(i, b)| QuadPoint::new(i, b.position)),
        );
        debug_assert_eq!(self.quadtree.len(), self.boids.len());
    }

    /// Slots of all agents within `radius` of `position`, measured on the torus.
    ///
    /// The tree only knows raw coordinates, so the square window is queried
    /// at the true position and at each translation by the domain size on the
    /// wrapping axes (up to nine windows), then filtered to the circle.
    pub fn neighbours(&self, position: DVec2, radius: f64) -> Vec<usize> {
        let window = Rect::around(position, radius);
        let size = self.torus.size;
        let wrap = self.torus.wrap;

        let xs: &[f64] = if wrap.x { &[0.0, -size.x, size.x] } else { &[0.0] };
        let ys: &[f64] = if wrap.y { &[0.0, -size.y, size.y] } else { &[0.0] };

        let mut found = Vec::new();
        for &oy in ys {
            for &ox in xs {
                self.quadtree.query(&window.translated(DVec2::new(ox, oy)), &mut found);
            }
        }

        // Windows can only overlap once the window spans the whole axis
        if (wrap.x && 2.0 * radius >= size.x) || (wrap.y && 2.0 * radius >= size.y) {
            let mut seen = vec![false; self.boids.len()];
            found.retain(|p| !std::mem::replace(&mut seen[p.index], true));
        }

        found
            .into_iter()
            .filter(|p| self.torus.distance(position, p.position) <= radius)
            .map(|p| p.index)
            .collect()
    }

    /// Advance one step: forces, integration, obstacles, walls, reindex
    pub fn step(&mut self) -> &StepStats {
        crate::physics::update_boids(self);
        debug!(
            step = self.stats.step,
            agents = self.stats.agents,
            tree_nodes = self.stats.tree_nodes,
            tree_depth = self.stats.tree_depth,
            overlapping = self.stats.overlapping,
            "step complete"
        );
        &self.stats
    }

    pub fn run(&mut self, steps: u64) -> &StepStats {
        for _ in 0..steps {
            self.step();
        }
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Wrap;
    use crate::params::BehaviourParams;

    fn world(wrap: Wrap) -> FlockWorld {
        let params = SimulationParams {
            width: 100.0,
            height: 100.0,
            wrap,
            qt_capacity: 2,
            alignment: BehaviourParams::new(10.0, 1.0),
            cohesion: BehaviourParams::new(10.0, 1.0),
            separation: BehaviourParams::new(10.0, 1.0),
            ..Default::default()
        };
        FlockWorld::seeded(params).unwrap()
    }

    #[test]
    fn rejects_invalid_params() {
        let params = SimulationParams {
            qt_capacity: 0,
            ..Default::default()
        };
        assert!(FlockWorld::seeded(params).is_err());
    }

    #[test]
    fn neighbours_found_across_the_seam() {
        let mut w = world(Wrap::BOTH);
        w.spawn(DVec2::new(1.0, 50.0), DVec2::ZERO, 2.0, Overrides::default()).unwrap();
        w.spawn(DVec2::new(99.0, 50.0), DVec2::ZERO, 2.0, Overrides::default()).unwrap();
        w.spawn(DVec2::new(50.0, 99.5), DVec2::ZERO, 2.0, Overrides::default()).unwrap();
        w.spawn(DVec2::new(50.0, 0.5), DVec2::ZERO, 2.0, Overrides::default()).unwrap();

        let mut found = w.neighbours(DVec2::new(1.0, 50.0), 5.0);
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);

        let mut found = w.neighbours(DVec2::new(50.0, 0.5), 5.0);
        found.sort_unstable();
        assert_eq!(found, vec![2, 3]);

        // corner to corner
        let found = w.neighbours(DVec2::new(99.0, 99.0), 3.0);
        assert!(found.is_empty());
        w.spawn(DVec2::new(0.5, 0.5), DVec2::ZERO, 2.0, Overrides::default()).unwrap();
        assert_eq!(w.neighbours(DVec2::new(99.0, 99.0), 3.0), vec![4]);
    }

    #[test]
    fn no_wrap_means_no_seam() {
        let mut w = world(Wrap::NONE);
        w.spawn(DVec2::new(1.0, 50.0), DVec2::ZERO, 2.0, Overrides::default()).unwrap();
        w.spawn(DVec2::new(99.0, 50.0), DVec2::ZERO, 2.0, Overrides::default()).unwrap();
        assert_eq!(w.neighbours(DVec2::new(1.0, 50.0), 5.0), vec![0]);
    }

    #[test]
    fn neighbours_match_brute_force() {
        let mut w = world(Wrap::new(true, false));
        w.populate(200, DVec2::new(50.0, 50.0), 50.0, 2.0).unwrap();
        for probe in [DVec2::new(2.0, 50.0), DVec2::new(98.0, 3.0), DVec2::new(40.0, 60.0)] {
            let mut got = w.neighbours(probe, 12.0);
            got.sort_unstable();
            let expected: Vec<usize> = w
                .boids()
                .iter()
                .enumerate()
                .filter(|(_, b)| w.torus().distance(probe, b.position) <= 12.0)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn huge_radius_does_not_duplicate() {
        let mut w = world(Wrap::BOTH);
        w.populate(30, DVec2::new(50.0, 50.0), 40.0, 2.0).unwrap();
        let mut got = w.neighbours(DVec2::new(50.0, 50.0), 80.0);
        got.sort_unstable();
        assert_eq!(got, (0..30).collect::<Vec<_>>());
    }

    #[test]
    fn populate_stays_in_spot_and_indexes_everyone() {
        let mut w = world(Wrap::BOTH);
        let ids = w.populate(50, DVec2::new(30.0, 30.0), 10.0, 2.0).unwrap();
        assert_eq!(ids.len(), 50);
        assert_eq!(w.quadtree().len(), 50);
        for b in w.boids() {
            assert!(b.position.distance(DVec2::new(30.0, 30.0)) <= 10.0 + 1e-9);
            assert!(b.velocity.length() <= w.params().max_speed + 1e-12);
        }
    }

    #[test]
    fn spawn_rejects_bad_agents() {
        let mut w = world(Wrap::BOTH);
        assert!(w.spawn(DVec2::new(f64::NAN, 0.0), DVec2::ZERO, 1.0, Overrides::default()).is_err());
        assert!(w.spawn(DVec2::ZERO, DVec2::ZERO, 0.0, Overrides::default()).is_err());
        let negative = Overrides {
            max_speed: Some(-1.0),
            ..Default::default()
        };
        assert!(w.spawn(DVec2::ZERO, DVec2::ZERO, 1.0, negative).is_err());
        assert!(w.boids().is_empty());
    }

    #[test]
    fn index_grows_to_cover_agents_past_soft_walls() {
        let mut w = world(Wrap::NONE);
        w.spawn(DVec2::new(-4.0, 50.0), DVec2::ZERO, 2.0, Overrides::default()).unwrap();
        w.spawn(DVec2::new(50.0, 103.0), DVec2::ZERO, 2.0, Overrides::default()).unwrap();
        assert_eq!(w.quadtree().len(), 2);
        assert_eq!(w.neighbours(DVec2::new(-3.0, 50.0), 2.0), vec![0]);
    }
}
