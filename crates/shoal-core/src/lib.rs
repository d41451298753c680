//! Core engine for a two-population shoal: prey boids that school together
//! and predators that hunt them.
//!
//! The engine owns per-agent kinematics and behavioral state and advances
//! them tick by tick. Each tick it publishes an immutable snapshot of every
//! agent, lets a staggered subset recompute their steering against that
//! snapshot in parallel, and then integrates motion for everyone. Scene
//! geometry stays outside: neighbor lookups and obstacle raycasts come in
//! through the [`shoal_spatial`] traits.
//!
//! Determinism is a design constraint. All randomness flows from the world
//! seed through per-agent streams derived from the agent's serial number and
//! the tick, so identical configurations produce identical runs regardless
//! of thread count.

pub mod agent;
pub mod avoidance;
pub mod config;
pub mod math;
pub mod motion;
pub mod states;
pub mod steering;
pub mod wander;
pub mod world;

use serde::{Deserialize, Serialize};

pub use agent::{
    AgentArena, AgentBody, AgentColumns, AgentId, AgentMind, BehaviorState, BoidState,
    PredatorState, WanderPhase, WanderState,
};
pub use config::{
    AvoidanceParams, BoidParams, ConfigError, PredatorParams, Profiles, RadiusBand, ShoalConfig,
    WanderParams,
};
pub use math::FORWARD;
pub use shoal_spatial::{
    AgentKind, AgentSighting, GridNeighborIndex, KindFilter, NeighborQuery, NullProbe,
    ObstacleProbe, Sphere, SphereField, Volume,
};
pub use steering::NeighborPressure;
pub use world::{FlockWorld, TickEvents, TickSummary};

/// Simulation clock measured in ticks since world creation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Tick(pub u64);

impl Tick {
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}
