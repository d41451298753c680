//! Agent storage: dense kinematic columns behind stable handles, plus the
//! slow-changing decision state kept in a side map.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use shoal_spatial::AgentKind;
use slotmap::{SecondaryMap, SlotMap, new_key_type};

use crate::math;

new_key_type! {
    /// Stable handle to an agent, valid until the agent is removed.
    pub struct AgentId;
}

/// Side storage keyed by agent handle.
pub type AgentMap<T> = SecondaryMap<AgentId, T>;

/// Behavioral state of a prey boid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoidState {
    /// Schooling with visible mates at cruising speed.
    #[default]
    Normal,
    /// No schoolmate in view; speeds up to find the school again.
    Alone,
    /// A predator is inside the fear band; fleeing at full speed.
    Afraid,
}

/// Behavioral state of a predator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PredatorState {
    /// Drifting; not interested in prey yet.
    #[default]
    Chilling,
    /// Searching for a dense enough patch of prey.
    Hunting,
    /// Enough prey in view; closing in at burst speed.
    Attacking,
}

/// State of either population under one roof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorState {
    Boid(BoidState),
    Predator(PredatorState),
}

impl BehaviorState {
    /// Default state for a freshly spawned agent of `kind`.
    #[must_use]
    pub const fn spawn_state(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Boid => BehaviorState::Boid(BoidState::Normal),
            AgentKind::Predator => BehaviorState::Predator(PredatorState::Chilling),
        }
    }

    /// Emergency states swap the normal acceleration cap for the burst cap.
    #[must_use]
    pub const fn is_emergency(self) -> bool {
        matches!(
            self,
            BehaviorState::Boid(BoidState::Afraid)
                | BehaviorState::Predator(PredatorState::Attacking)
        )
    }
}

/// Phase of the two-step random walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WanderPhase {
    /// Not walking; the next stimulus-free decision starts a fresh phase.
    #[default]
    Idle,
    /// Holding the current heading for one period.
    StraightLine,
    /// Turning toward a sampled target over one period.
    DirectionChange,
}

/// Random-walk bookkeeping carried between decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WanderState {
    pub phase: WanderPhase,
    /// Heading at the start of the current phase.
    pub from: Vec3,
    /// Heading the phase steers toward.
    pub target: Vec3,
    /// Ticks of the current phase still to run.
    pub ticks_left: u32,
}

impl Default for WanderState {
    fn default() -> Self {
        Self {
            phase: WanderPhase::Idle,
            from: math::FORWARD,
            target: math::FORWARD,
            ticks_left: 0,
        }
    }
}

/// Slow-changing per-agent decision state, kept out of the dense columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMind {
    pub state: BehaviorState,
    /// Orientation at the moment of the last steering decision.
    pub last_orientation: Quat,
    /// Orientation the agent is turning toward until the next decision.
    pub target_orientation: Quat,
    /// Ticks integrated since the last steering decision.
    pub ticks_since_decision: u32,
    pub wander: WanderState,
    /// Multiplier on the state target velocity, re-rolled periodically.
    pub speed_bonus: f32,
}

impl AgentMind {
    #[must_use]
    pub fn new(kind: AgentKind, direction: Vec3) -> Self {
        let orientation = math::orientation_toward(direction);
        Self {
            state: BehaviorState::spawn_state(kind),
            last_orientation: orientation,
            target_orientation: orientation,
            ticks_since_decision: 0,
            wander: WanderState::default(),
            speed_bonus: 1.0,
        }
    }
}

/// One agent's kinematic row, used for insertion and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentBody {
    pub kind: AgentKind,
    pub position: Vec3,
    /// Unit heading.
    pub direction: Vec3,
    /// Scalar speed along the heading.
    pub velocity: f32,
    /// Monotone spawn counter; never reused, drives per-agent RNG streams
    /// and decision staggering.
    pub serial: u64,
}

/// Struct-of-arrays storage for the per-tick hot fields.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AgentColumns {
    kinds: Vec<AgentKind>,
    positions: Vec<Vec3>,
    directions: Vec<Vec3>,
    velocities: Vec<f32>,
    serials: Vec<u64>,
}

impl AgentColumns {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            kinds: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            directions: Vec::with_capacity(capacity),
            velocities: Vec::with_capacity(capacity),
            serials: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn push(&mut self, body: AgentBody) {
        self.kinds.push(body.kind);
        self.positions.push(body.position);
        self.directions.push(body.direction);
        self.velocities.push(body.velocity);
        self.serials.push(body.serial);
    }

    /// Removes row `index` by swapping the last row into its place.
    pub fn swap_remove(&mut self, index: usize) -> AgentBody {
        AgentBody {
            kind: self.kinds.swap_remove(index),
            position: self.positions.swap_remove(index),
            direction: self.directions.swap_remove(index),
            velocity: self.velocities.swap_remove(index),
            serial: self.serials.swap_remove(index),
        }
    }

    #[must_use]
    pub fn row(&self, index: usize) -> AgentBody {
        AgentBody {
            kind: self.kinds[index],
            position: self.positions[index],
            direction: self.directions[index],
            velocity: self.velocities[index],
            serial: self.serials[index],
        }
    }

    pub fn set_kinematics(&mut self, index: usize, position: Vec3, direction: Vec3, velocity: f32) {
        self.positions[index] = position;
        self.directions[index] = direction;
        self.velocities[index] = velocity;
    }

    #[must_use]
    pub fn kinds(&self) -> &[AgentKind] {
        &self.kinds
    }

    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[must_use]
    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }

    #[must_use]
    pub fn velocities(&self) -> &[f32] {
        &self.velocities
    }

    #[must_use]
    pub fn serials(&self) -> &[u64] {
        &self.serials
    }
}

/// Dense agent store addressed by stable [`AgentId`] handles.
///
/// Rows live in [`AgentColumns`]; the slotmap maps handles to dense indices
/// and `order` maps dense indices back to handles. Removal swaps the last
/// row down, so dense indices are only valid within a tick.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AgentArena {
    entries: SlotMap<AgentId, usize>,
    order: Vec<AgentId>,
    columns: AgentColumns,
}

impl AgentArena {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SlotMap::with_capacity_and_key(capacity),
            order: Vec::with_capacity(capacity),
            columns: AgentColumns::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn insert(&mut self, body: AgentBody) -> AgentId {
        let index = self.columns.len();
        let id = self.entries.insert(index);
        self.order.push(id);
        self.columns.push(body);
        id
    }

    pub fn remove(&mut self, id: AgentId) -> Option<AgentBody> {
        let index = self.entries.remove(id)?;
        let body = self.columns.swap_remove(index);
        self.order.swap_remove(index);
        if let Some(&moved) = self.order.get(index) {
            // The former last row now lives at `index`.
            self.entries[moved] = index;
        }
        Some(body)
    }

    #[must_use]
    pub fn contains(&self, id: AgentId) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn index_of(&self, id: AgentId) -> Option<usize> {
        self.entries.get(id).copied()
    }

    #[must_use]
    pub fn snapshot(&self, id: AgentId) -> Option<AgentBody> {
        self.index_of(id).map(|index| self.columns.row(index))
    }

    /// Handles in dense-row order; `handles()[i]` owns row `i`.
    #[must_use]
    pub fn handles(&self) -> &[AgentId] {
        &self.order
    }

    #[must_use]
    pub fn columns(&self) -> &AgentColumns {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut AgentColumns {
        &mut self.columns
    }
}
