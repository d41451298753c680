//! Per-kind behavioral state machines.
//!
//! States change only on an agent's own decision ticks. Stimulus-driven
//! transitions (a predator in the fear band, enough prey to attack) fire
//! deterministically; time-driven transitions are Bernoulli trials whose
//! per-decision probability is derived from the configured dwell times, so
//! expected residence in a state is independent of the decision interval.

use rand::Rng;
use rand::rngs::SmallRng;

use crate::agent::{BehaviorState, BoidState, PredatorState};
use crate::config::{BoidProfile, PredatorProfile, Profiles};
use crate::math;
use crate::steering::NeighborPressure;

/// Advances either kind of state for one decision.
pub fn advance(
    state: BehaviorState,
    pressure: NeighborPressure,
    profiles: &Profiles,
    rng: &mut SmallRng,
) -> BehaviorState {
    match state {
        BehaviorState::Boid(state) => {
            BehaviorState::Boid(advance_boid(state, pressure, &profiles.boid, rng))
        }
        BehaviorState::Predator(state) => {
            BehaviorState::Predator(advance_predator(state, pressure, &profiles.predator, rng))
        }
    }
}

/// Boid transitions: any predator pressure forces Afraid; calming down is a
/// Bernoulli trial; otherwise the state tracks whether schoolmates are in
/// view.
pub fn advance_boid(
    state: BoidState,
    pressure: NeighborPressure,
    profile: &BoidProfile,
    rng: &mut SmallRng,
) -> BoidState {
    if pressure.other_kind > math::EPSILON {
        return BoidState::Afraid;
    }
    match state {
        BoidState::Afraid => {
            if rng.random_bool(profile.calm_probability) {
                schooling_state(pressure)
            } else {
                BoidState::Afraid
            }
        }
        BoidState::Normal | BoidState::Alone => schooling_state(pressure),
    }
}

fn schooling_state(pressure: NeighborPressure) -> BoidState {
    if pressure.same_kind > math::EPSILON {
        BoidState::Normal
    } else {
        BoidState::Alone
    }
}

/// Predator transitions: enough prey in view flips (and holds) an attack;
/// starting a hunt, giving one up, and resuming after a broken attack are
/// Bernoulli trials.
pub fn advance_predator(
    state: PredatorState,
    pressure: NeighborPressure,
    profile: &PredatorProfile,
    rng: &mut SmallRng,
) -> PredatorState {
    let prey_in_reach = pressure.other_kind > profile.attack_prey_threshold;
    match state {
        PredatorState::Chilling => {
            if rng.random_bool(profile.hunt_probability) {
                PredatorState::Hunting
            } else {
                PredatorState::Chilling
            }
        }
        PredatorState::Hunting => {
            if prey_in_reach {
                PredatorState::Attacking
            } else if rng.random_bool(profile.rest_probability) {
                PredatorState::Chilling
            } else {
                PredatorState::Hunting
            }
        }
        PredatorState::Attacking => {
            if prey_in_reach {
                PredatorState::Attacking
            } else if rng.random_bool(profile.rehunt_probability) {
                PredatorState::Hunting
            } else {
                PredatorState::Chilling
            }
        }
    }
}

impl BehaviorState {
    /// Cruising speed the state aims for, before the speed bonus.
    #[must_use]
    pub fn target_velocity(self, profiles: &Profiles) -> f32 {
        match self {
            BehaviorState::Boid(BoidState::Normal) => profiles.boid.normal_velocity,
            BehaviorState::Boid(BoidState::Alone) => profiles.boid.alone_velocity,
            BehaviorState::Boid(BoidState::Afraid) => profiles.boid.afraid_velocity,
            BehaviorState::Predator(PredatorState::Chilling) => profiles.predator.chilling_velocity,
            BehaviorState::Predator(PredatorState::Hunting) => profiles.predator.hunting_velocity,
            BehaviorState::Predator(PredatorState::Attacking) => {
                profiles.predator.attacking_velocity
            }
        }
    }

    /// Per-tick velocity change cap for the state.
    #[must_use]
    pub fn acceleration(self, profiles: &Profiles) -> f32 {
        match self {
            BehaviorState::Boid(_) if self.is_emergency() => profiles.boid.emergency_acceleration,
            BehaviorState::Boid(_) => profiles.boid.acceleration,
            BehaviorState::Predator(_) if self.is_emergency() => {
                profiles.predator.emergency_acceleration
            }
            BehaviorState::Predator(_) => profiles.predator.acceleration,
        }
    }
}
