/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct that holds every tunable
 * strength and radius of the flocking model. Params are read from TOML or
 * JSON, validated once, and then frozen inside the world: nothing mutates
 * them after construction.
 */

use serde::{Deserialize, Serialize};

use crate::error::{FlockError, FlockResult};
use crate::geometry::Wrap;
use crate::quadtree::DEFAULT_MAX_DEPTH;

/// Radius and weight of one steering behaviour.
/// A table that sets only one field gets the other from `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviourParams {
    pub radius: f64,
    pub strength: f64,
}

impl Default for BehaviourParams {
    fn default() -> Self {
        Self::new(30.0, 1.0)
    }
}

impl BehaviourParams {
    pub fn new(radius: f64, strength: f64) -> Self {
        Self { radius, strength }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub width: f64,
    pub height: f64,
    pub wrap: Wrap,
    pub max_force: f64,
    pub max_speed: f64,
    pub friction: f64,
    pub qt_capacity: usize,
    pub max_depth: usize,
    pub brownian: f64,
    pub gravity: f64,
    pub collision_force: f64,
    pub alignment: BehaviourParams,
    pub cohesion: BehaviourParams,
    pub separation: BehaviourParams,
    pub mouse_radius: f64,
    #[serde(rename = "mouseattraction")]
    pub mouse_attraction: f64,
    pub seed: u64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 400.0,
            wrap: Wrap::BOTH,
            max_force: 1.0,
            max_speed: 4.0,
            friction: 0.0,
            qt_capacity: 5,
            max_depth: DEFAULT_MAX_DEPTH,
            brownian: 0.0,
            gravity: 0.0,
            collision_force: 0.0,
            alignment: BehaviourParams::default(),
            cohesion: BehaviourParams::default(),
            separation: BehaviourParams::new(10.0, 1.5),
            mouse_radius: 100.0,
            mouse_attraction: 1.0,
            seed: 0,
        }
    }
}

fn check(ok: bool, msg: impl Into<String>) -> FlockResult<()> {
    if ok {
        Ok(())
    } else {
        Err(FlockError::InvalidConfig(msg.into()))
    }
}

impl SimulationParams {
    pub fn from_toml_str(src: &str) -> FlockResult<Self> {
        let params: Self = toml::from_str(src).map_err(|e| FlockError::Parse(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_str(src: &str) -> FlockResult<Self> {
        let params: Self = serde_json::from_str(src).map_err(|e| FlockError::Parse(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Largest of the three behaviour radii; the single query radius per agent
    pub fn neighbourhood_radius(&self) -> f64 {
        self.alignment
            .radius
            .max(self.cohesion.radius)
            .max(self.separation.radius)
    }

    pub fn validate(&self) -> FlockResult<()> {
        let finite = [
            ("width", self.width),
            ("height", self.height),
            ("max_force", self.max_force),
            ("max_speed", self.max_speed),
            ("friction", self.friction),
            ("brownian", self.brownian),
            ("gravity", self.gravity),
            ("collision_force", self.collision_force),
            ("alignment.radius", self.alignment.radius),
            ("alignment.strength", self.alignment.strength),
            ("cohesion.radius", self.cohesion.radius),
            ("cohesion.strength", self.cohesion.strength),
            ("separation.radius", self.separation.radius),
            ("separation.strength", self.separation.strength),
            ("mouse_radius", self.mouse_radius),
            ("mouseattraction", self.mouse_attraction),
        ];
        for (name, value) in finite {
            check(value.is_finite(), format!("{name} must be finite, got {value}"))?;
        }

        check(self.width > 0.0, format!("width must be positive, got {}", self.width))?;
        check(self.height > 0.0, format!("height must be positive, got {}", self.height))?;
        check(self.qt_capacity > 0, "qt_capacity must be at least 1")?;
        check(self.max_depth > 0, "max_depth must be at least 1")?;
        check(self.max_speed >= 0.0, "max_speed must not be negative")?;
        check(self.max_force >= 0.0, "max_force must not be negative")?;
        check(self.brownian >= 0.0, "brownian must not be negative")?;
        check(self.mouse_radius >= 0.0, "mouse_radius must not be negative")?;
        check(
            (0.0..=1.0).contains(&self.friction),
            format!("friction must lie in [0, 1], got {}", self.friction),
        )?;

        for (name, b) in [
            ("alignment", self.alignment),
            ("cohesion", self.cohesion),
            ("separation", self.separation),
        ] {
            check(b.radius >= 0.0, format!("{name}.radius must not be negative"))?;
        }

        Ok(())
    }
}
