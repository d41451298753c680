//! Direction, band, and sampling helpers shared across the engine.

use glam::{Quat, Vec3};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Canonical forward axis; an agent with identity orientation faces +Z.
pub const FORWARD: Vec3 = Vec3::Z;

/// World up axis; vertical limits clamp the Y component of directions.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Threshold below which a squared length or accumulated weight counts as zero.
pub const EPSILON: f32 = 1.0e-6;

/// Above this |dot|, a reference axis is too parallel to the forward axis to
/// anchor a basis and the alternate axis is used instead.
const PARALLEL_GUARD: f32 = 0.97;

/// Builds two unit vectors spanning the plane perpendicular to `forward`.
///
/// The basis is anchored to `reference` so repeated calls with the same
/// anchor produce a stable plane; when `reference` is nearly parallel to
/// `forward` the anchor silently switches to a fixed alternate axis.
/// Returns `(side, up)` with `side ⟂ up ⟂ forward`.
#[must_use]
pub fn orthonormal_basis(forward: Vec3, reference: Vec3) -> (Vec3, Vec3) {
    let mut anchor = reference;
    if forward.dot(anchor).abs() > PARALLEL_GUARD {
        anchor = if anchor.dot(WORLD_UP).abs() > PARALLEL_GUARD {
            FORWARD
        } else {
            WORLD_UP
        };
    }
    let side = anchor
        .cross(forward)
        .try_normalize()
        .unwrap_or_else(|| forward.any_orthonormal_vector());
    let up = forward.cross(side).normalize();
    (side, up)
}

/// Smooth influence ramp over squared distances.
///
/// Returns 0 at `zero_sq`, 1 at `one_sq`, linear in squared distance between
/// them, clamped outside. The edge order encodes the ramp direction: growing
/// behaviors (cohesion, fear) pass `zero_sq < one_sq`, shrinking behaviors
/// (separation) pass them reversed. Callers keep the edges distinct; equal
/// edges degenerate to a hard step at the shared value.
#[must_use]
pub fn band_weight(dist_sq: f32, zero_sq: f32, one_sq: f32) -> f32 {
    let span = one_sq - zero_sq;
    if span.abs() <= EPSILON {
        return if dist_sq >= zero_sq { 1.0 } else { 0.0 };
    }
    ((dist_sq - zero_sq) / span).clamp(0.0, 1.0)
}

/// Normalized linear blend between two unit directions.
///
/// `t` is clamped to [0, 1]; `t = 0` yields `from`, `t = 1` yields `to`.
/// When the blend cancels to near zero (antiparallel inputs at the midpoint)
/// the original `from` direction is returned.
#[must_use]
pub fn steer_lerp(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    from.lerp(to, t.clamp(0.0, 1.0))
        .try_normalize()
        .unwrap_or(from)
}

/// Orientation whose forward axis points along `direction`.
#[must_use]
pub fn orientation_toward(direction: Vec3) -> Quat {
    Quat::from_rotation_arc(FORWARD, direction.try_normalize().unwrap_or(FORWARD))
}

/// Unit forward axis of `orientation`.
#[must_use]
pub fn direction_of(orientation: Quat) -> Vec3 {
    (orientation * FORWARD).normalize()
}

/// Restricts the vertical component of a unit direction to `max_component`.
///
/// The horizontal heading is preserved and the result is unit length with
/// `|y| <= max_component` exactly. A direction pointing almost straight up or
/// down has no usable horizontal heading and is returned unchanged.
#[must_use]
pub fn clamp_vertical(direction: Vec3, max_component: f32) -> Vec3 {
    let max_component = max_component.clamp(0.0, 1.0);
    if direction.y.abs() <= max_component {
        return direction;
    }
    let Some(flat) = Vec3::new(direction.x, 0.0, direction.z).try_normalize() else {
        return direction;
    };
    let vertical = max_component.copysign(direction.y);
    flat * (1.0 - max_component * max_component).sqrt() + WORLD_UP * vertical
}

/// Uniform random direction on the unit sphere.
#[must_use]
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let y: f32 = rng.random_range(-1.0..=1.0);
    let theta: f32 = rng.random_range(0.0..std::f32::consts::TAU);
    let ring = (1.0 - y * y).max(0.0).sqrt();
    Vec3::new(ring * theta.cos(), y, ring * theta.sin())
}

/// Moves `current` toward `target` by at most `max_step`.
#[must_use]
pub fn approach(current: f32, target: f32, max_step: f32) -> f32 {
    let step = max_step.abs();
    current + (target - current).clamp(-step, step)
}

/// Deterministic decision stream for one agent on one tick.
///
/// Streams are derived from `(seed, serial, tick)` through a SplitMix-style
/// avalanche, so every agent draws from its own sequence and a rerun with the
/// same world seed reproduces every draw independent of scheduling.
#[must_use]
pub fn decision_rng(seed: u64, serial: u64, tick: u64) -> SmallRng {
    let mut state = seed
        ^ serial.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ tick.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    state ^= state >> 30;
    state = state.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    state ^= state >> 27;
    state = state.wrapping_mul(0x94D0_49BB_1331_11EB);
    state ^= state >> 31;
    SmallRng::seed_from_u64(state)
}
