//! Per-tick kinematic integration: decision staggering, orientation slerp,
//! bounded velocity approach, and periodic displacement.

use glam::{Quat, Vec3};
use shoal_spatial::Volume;

use crate::Tick;
use crate::agent::AgentMind;
use crate::math;

/// True when `serial`'s steering decision falls on `tick`.
///
/// Agents recompute every `interval` ticks, offset by their serial, so each
/// tick carries roughly `1/interval` of the population's decisions.
#[must_use]
pub fn is_decision_tick(tick: Tick, serial: u64, interval: u32) -> bool {
    let interval = u64::from(interval.max(1));
    tick.0 % interval == serial % interval
}

/// Orientation for the current tick, part way through the turn from the last
/// decision's orientation to the target.
#[must_use]
pub fn interpolated_orientation(mind: &AgentMind, interval: u32) -> Quat {
    let progress = (mind.ticks_since_decision as f32 / interval.max(1) as f32).min(1.0);
    mind.last_orientation.slerp(mind.target_orientation, progress)
}

/// Points the turn at `new_direction` and restarts the interpolation clock.
///
/// The turn starts from the orientation the agent actually shows this tick,
/// so a retarget never snaps the heading.
pub fn retarget_orientation(mind: &mut AgentMind, interval: u32, new_direction: Vec3) {
    mind.last_orientation = interpolated_orientation(mind, interval);
    mind.target_orientation = math::orientation_toward(new_direction);
    mind.ticks_since_decision = 0;
}

/// Moves `current` toward the state target, changing by at most
/// `acceleration * dt`, and never below zero.
#[must_use]
pub fn advance_velocity(current: f32, target: f32, acceleration: f32, dt: f32) -> f32 {
    math::approach(current, target, acceleration * dt).max(0.0)
}

/// One tick of displacement, wrapped back into the periodic volume.
#[must_use]
pub fn displace(position: Vec3, direction: Vec3, velocity: f32, dt: f32, volume: &Volume) -> Vec3 {
    volume.wrap(position + direction * velocity * dt)
}
