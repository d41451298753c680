//! Random walk for agents with nothing to react to.
//!
//! The walk alternates fixed-length phases: either hold the current heading
//! or turn toward a freshly sampled target over the phase. Targets are
//! pulled toward the current heading by momentum, capped in steepness, and
//! optionally resampled a few times when the probe says they head straight
//! into an obstacle.

use glam::Vec3;
use rand::Rng;
use rand::rngs::SmallRng;
use shoal_spatial::ObstacleProbe;

use crate::agent::{WanderPhase, WanderState};
use crate::avoidance::ProbeReach;
use crate::config::WanderParams;
use crate::math;

/// Advances the walk by one decision and returns the heading to steer toward.
///
/// `state` carries the phase between decisions; a fresh phase starts whenever
/// the walk is idle or the countdown ran out. The caller resets `state` to
/// idle when an obstacle deflection interrupts the walk.
pub fn wander_direction(
    params: &WanderParams,
    state: &mut WanderState,
    current: Vec3,
    origin: Vec3,
    reach: ProbeReach,
    probe: &dyn ObstacleProbe,
    rng: &mut SmallRng,
) -> Vec3 {
    if state.phase == WanderPhase::Idle || state.ticks_left == 0 {
        begin_phase(params, state, current, origin, reach, probe, rng);
    }
    state.ticks_left -= 1;
    match state.phase {
        WanderPhase::Idle | WanderPhase::StraightLine => state.target,
        WanderPhase::DirectionChange => {
            let done = (params.period_ticks - state.ticks_left) as f32;
            math::steer_lerp(state.from, state.target, done / params.period_ticks as f32)
        }
    }
}

fn begin_phase(
    params: &WanderParams,
    state: &mut WanderState,
    current: Vec3,
    origin: Vec3,
    reach: ProbeReach,
    probe: &dyn ObstacleProbe,
    rng: &mut SmallRng,
) {
    state.ticks_left = params.period_ticks;
    state.from = current;
    if rng.random_bool(f64::from(params.straight_probability)) {
        state.phase = WanderPhase::StraightLine;
        state.target = current;
    } else {
        state.phase = WanderPhase::DirectionChange;
        state.target = sample_target(params, current, origin, reach, probe, rng);
    }
}

/// Draws a turn target; retries while the probe reports it blocked, keeping
/// the last sample once the attempts run out.
fn sample_target(
    params: &WanderParams,
    current: Vec3,
    origin: Vec3,
    reach: ProbeReach,
    probe: &dyn ObstacleProbe,
    rng: &mut SmallRng,
) -> Vec3 {
    let mut choice = aim(params, current, rng);
    for _ in 1..params.max_probe_attempts.max(1) {
        if probe.probe(origin, choice, reach.distance).is_none() {
            break;
        }
        choice = aim(params, current, rng);
    }
    choice
}

fn aim(params: &WanderParams, current: Vec3, rng: &mut SmallRng) -> Vec3 {
    let sampled = math::random_unit_vector(rng);
    let pulled = math::steer_lerp(sampled, current, params.momentum);
    math::clamp_vertical(pulled, params.max_vertical_component)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_spatial::NullProbe;

    fn reach() -> ProbeReach {
        ProbeReach {
            distance: 3.0,
            margin: 0.5,
        }
    }

    fn params() -> WanderParams {
        WanderParams {
            period_ticks: 10,
            momentum: 0.3,
            straight_probability: 0.5,
            max_vertical_component: 0.5,
            max_probe_attempts: 4,
        }
    }

    #[test]
    fn straight_phase_holds_the_heading() {
        let params = WanderParams {
            straight_probability: 1.0,
            ..params()
        };
        let mut state = WanderState::default();
        let mut rng = math::decision_rng(1, 0, 0);
        let heading = Vec3::new(0.6, 0.0, 0.8);
        for _ in 0..10 {
            let dir = wander_direction(
                &params, &mut state, heading, Vec3::ZERO, reach(), &NullProbe, &mut rng,
            );
            assert_eq!(dir, heading);
            assert_eq!(state.phase, WanderPhase::StraightLine);
        }
        assert_eq!(state.ticks_left, 0);
    }

    #[test]
    fn turn_phase_interpolates_to_its_target() {
        let params = WanderParams {
            straight_probability: 0.0,
            // Strong enough pull that the sampled target stays well clear of
            // the antiparallel degenerate blend.
            momentum: 0.6,
            ..params()
        };
        let mut state = WanderState::default();
        let mut rng = math::decision_rng(2, 0, 0);
        let heading = Vec3::Z;
        let mut dir = wander_direction(
            &params, &mut state, heading, Vec3::ZERO, reach(), &NullProbe, &mut rng,
        );
        assert_eq!(state.phase, WanderPhase::DirectionChange);
        let target = state.target;
        let mut last = dir.dot(target);
        for _ in 1..10 {
            dir = wander_direction(
                &params, &mut state, heading, Vec3::ZERO, reach(), &NullProbe, &mut rng,
            );
            assert!((dir.length() - 1.0).abs() < 1e-5);
            // Monotonically closes in on the sampled target.
            let toward_target = dir.dot(target);
            assert!(toward_target >= last - 1e-5);
            last = toward_target;
        }
        // A full period later the walk has arrived.
        assert!((dir - target).length() < 1e-4);
        assert_eq!(state.ticks_left, 0);
    }

    #[test]
    fn sampled_targets_respect_the_vertical_cap() {
        let params = WanderParams {
            straight_probability: 0.0,
            momentum: 0.0,
            ..params()
        };
        let mut rng = math::decision_rng(3, 0, 0);
        for _ in 0..64 {
            let target = aim(&params, Vec3::Z, &mut rng);
            assert!(target.y.abs() <= params.max_vertical_component + 1e-5);
            assert!((target.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn full_momentum_never_leaves_the_heading() {
        let params = WanderParams {
            momentum: 1.0,
            straight_probability: 0.0,
            ..params()
        };
        let mut state = WanderState::default();
        let mut rng = math::decision_rng(4, 0, 0);
        let heading = Vec3::X;
        for _ in 0..30 {
            let dir = wander_direction(
                &params, &mut state, heading, Vec3::ZERO, reach(), &NullProbe, &mut rng,
            );
            assert!((dir - heading).length() < 1e-5);
        }
    }

    #[test]
    fn blocked_targets_are_resampled_up_to_the_attempt_limit() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        /// Blocks everything and counts the probes.
        struct CountingBlock(AtomicUsize);

        impl ObstacleProbe for CountingBlock {
            fn probe(&self, _o: Vec3, _d: Vec3, max: f32) -> Option<f32> {
                self.0.fetch_add(1, Ordering::Relaxed);
                Some(max.min(0.1))
            }
        }

        let params = WanderParams {
            straight_probability: 0.0,
            max_probe_attempts: 4,
            ..params()
        };
        let probe = CountingBlock(AtomicUsize::new(0));
        let mut state = WanderState::default();
        let mut rng = math::decision_rng(5, 0, 0);
        let dir = wander_direction(
            &params, &mut state, Vec3::Z, Vec3::ZERO, reach(), &probe, &mut rng,
        );
        // Three probes cover attempts two through four; the final sample is
        // kept even though it still reads blocked.
        assert_eq!(probe.0.load(Ordering::Relaxed), 3);
        assert!((dir.length() - 1.0).abs() < 1e-4);
    }
}
