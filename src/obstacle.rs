/*
 * Obstacle Module
 *
 * Static bodies agents bounce off. Rectangles are hard: the agent is pushed
 * fully out, loses its inward velocity and is damped. Circles are soft: half
 * the overlap is corrected per call and a repulsive acceleration does the rest.
 */

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::boid::Boid;
use crate::error::{FlockError, FlockResult};
use crate::geometry::Torus;

const RECT_DAMPING: f64 = 0.8;
const CIRCLE_DAMPING: f64 = 0.8;
/// Circle overlap below this is left undamped so resting contacts don't jitter
const CIRCLE_DAMPING_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// Top-left corner plus width and height
    Rectangle { x: f64, y: f64, w: f64, h: f64 },
    /// Centre plus radius
    Circle { x: f64, y: f64, r: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawObstacle")]
pub struct Obstacle {
    shape: Shape,
    force: f64,
}

/// Unchecked wire form; deserialization goes through `Obstacle::new`
#[derive(Deserialize)]
struct RawObstacle {
    shape: Shape,
    #[serde(default)]
    force: f64,
}

impl TryFrom<RawObstacle> for Obstacle {
    type Error = FlockError;

    fn try_from(raw: RawObstacle) -> FlockResult<Self> {
        Self::new(raw.shape, raw.force)
    }
}

impl Obstacle {
    pub fn rectangle(x: f64, y: f64, w: f64, h: f64, force: f64) -> FlockResult<Self> {
        Self::new(Shape::Rectangle { x, y, w, h }, force)
    }

    pub fn circle(x: f64, y: f64, r: f64, force: f64) -> FlockResult<Self> {
        Self::new(Shape::Circle { x, y, r }, force)
    }

    pub fn new(shape: Shape, force: f64) -> FlockResult<Self> {
        let invalid = |msg: String| Err(FlockError::InvalidObstacle(msg));
        if !force.is_finite() || force < 0.0 {
            return invalid(format!("force must be finite and non-negative, got {force}"));
        }
        match shape {
            Shape::Rectangle { x, y, w, h } => {
                if ![x, y, w, h].iter().all(|v| v.is_finite()) || w <= 0.0 || h <= 0.0 {
                    return invalid(format!("degenerate rectangle {w}x{h} at ({x}, {y})"));
                }
            }
            Shape::Circle { x, y, r } => {
                if ![x, y, r].iter().all(|v| v.is_finite()) || r <= 0.0 {
                    return invalid(format!("degenerate circle r={r} at ({x}, {y})"));
                }
            }
        }
        Ok(Self { shape, force })
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn force(&self) -> f64 {
        self.force
    }

    /// Resolve one agent against this obstacle; true when they were in contact.
    /// Contact is measured on the torus, so a shape straddling a wrapping
    /// seam also touches agents on the far side.
    pub fn resolve(&self, boid: &mut Boid, torus: &Torus) -> bool {
        if boid.is_locked() {
            return false;
        }
        match self.shape {
            Shape::Rectangle { x, y, w, h } => resolve_rectangle(boid, x, y, w, h, torus),
            Shape::Circle { x, y, r } => self.resolve_circle(boid, DVec2::new(x, y), r, torus),
        }
    }

    fn resolve_circle(&self, boid: &mut Boid, centre: DVec2, r: f64, torus: &Torus) -> bool {
        let offset = torus.delta(boid.position, centre);
        let distance = offset.length();
        let overlap = r + boid.size / 2.0 - distance;
        if overlap <= 0.0 {
            return false;
        }

        let normal = if distance > 0.0 { offset / distance } else { DVec2::X };
        boid.position += normal * (overlap * 0.5);
        boid.apply_force(normal * self.force);
        if overlap > CIRCLE_DAMPING_THRESHOLD {
            boid.velocity *= CIRCLE_DAMPING;
        }
        true
    }
}

fn resolve_rectangle(boid: &mut Boid, x: f64, y: f64, w: f64, h: f64, torus: &Torus) -> bool {
    let half = boid.size / 2.0;
    // agent position taken in the rectangle's own image of the torus
    let centre = DVec2::new(x + w / 2.0, y + h / 2.0);
    let p = centre + torus.delta(boid.position, centre);
    let closest = DVec2::new(p.x.clamp(x, x + w), p.y.clamp(y, y + h));
    let offset = p - closest;
    let distance = offset.length();
    if distance >= half {
        return false;
    }

    let (normal, depth) = if distance > 0.0 {
        (offset / distance, half - distance)
    } else {
        // Centre inside the rectangle: leave through the nearest edge
        let exits = [
            (p.x - x, DVec2::NEG_X),
            (x + w - p.x, DVec2::X),
            (p.y - y, DVec2::NEG_Y),
            (y + h - p.y, DVec2::Y),
        ];
        let (gap, normal) = exits
            .into_iter()
            .fold(exits[0], |best, e| if e.0 < best.0 { e } else { best });
        (normal, gap + half)
    };

    boid.position += normal * depth;
    let inward = boid.velocity.dot(normal);
    if inward < 0.0 {
        boid.velocity -= normal * inward;
    }
    boid.velocity *= RECT_DAMPING;
    true
}
