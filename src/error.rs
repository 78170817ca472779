/*
 * Error Module
 *
 * Construction-time failures for the flocking core. Stepping the world never
 * fails; only building params, obstacles and agents can.
 */

use thiserror::Error;

use crate::boid::AgentId;

/// Result alias used across the crate
pub type FlockResult<T> = Result<T, FlockError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlockError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid obstacle: {0}")]
    InvalidObstacle(String),

    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),

    #[error("failed to parse params: {0}")]
    Parse(String),
}
