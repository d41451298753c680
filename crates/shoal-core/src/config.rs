//! Tunable parameters and their validated, precomputed profiles.
//!
//! Raw parameter structs are what lands in a JSON config file; they carry
//! human units (radii, seconds, radians). [`ShoalConfig::profiles`] validates
//! the whole record once and derives the squared bands, cosine cones, and
//! per-decision transition probabilities the hot path reads. Steering itself
//! never fails at runtime: anything malformed is rejected here.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use shoal_spatial::{Sphere, Volume};
use thiserror::Error;

use crate::math;

/// Errors raised while validating a [`ShoalConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Indicates configuration values that cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

fn ensure(cond: bool, message: &'static str) -> Result<(), ConfigError> {
    if cond {
        Ok(())
    } else {
        Err(ConfigError::InvalidConfig(message))
    }
}

fn finite_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn finite_non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

fn unit_interval(value: f32) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Distance band over which a behavior's influence ramps between 0 and 1.
///
/// `radius` is the edge of zero influence, `full_effect_radius` the edge of
/// full influence. Behaviors that strengthen with distance (cohesion, fear,
/// prey attraction, peer repulsion) keep `full_effect_radius >= radius`;
/// separation strengthens as distance shrinks and keeps it `<= radius`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RadiusBand {
    pub radius: f32,
    pub full_effect_radius: f32,
}

impl RadiusBand {
    fn finite(&self) -> bool {
        finite_non_negative(self.radius) && finite_non_negative(self.full_effect_radius)
    }

    /// Squared band for behaviors that strengthen with distance.
    fn outward_sq(&self) -> BandSq {
        let zero_sq = self.radius * self.radius;
        let one_sq = (self.full_effect_radius * self.full_effect_radius)
            .max(zero_sq + 1.0e-5);
        BandSq { zero_sq, one_sq }
    }

    /// Squared band for behaviors that weaken with distance.
    fn inward_sq(&self) -> BandSq {
        let zero_sq = self.radius * self.radius;
        let one_sq = (self.full_effect_radius * self.full_effect_radius)
            .min(zero_sq - 1.0e-5);
        BandSq { zero_sq, one_sq }
    }
}

/// Precomputed squared-distance band; edges are ordered zero-end, one-end.
#[derive(Debug, Clone, Copy)]
pub struct BandSq {
    zero_sq: f32,
    one_sq: f32,
}

impl BandSq {
    /// Influence of a neighbor at `dist_sq`, in [0, 1].
    #[must_use]
    pub fn weight(&self, dist_sq: f32) -> f32 {
        math::band_weight(dist_sq, self.zero_sq, self.one_sq)
    }

    #[must_use]
    pub const fn zero_edge_sq(&self) -> f32 {
        self.zero_sq
    }
}

/// Obstacle probe tuning shared by both populations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AvoidanceParams {
    /// Base raycast length at rest.
    pub probe_distance: f32,
    /// Hits closer than this count as touching; deflection takes over fully.
    pub clearance_margin: f32,
    /// The probe stretches by this factor per unit of current speed.
    pub velocity_factor: f32,
    /// Score multiplier for vertical deflection candidates; 1 means no bias.
    pub vertical_preference: f32,
}

impl Default for AvoidanceParams {
    fn default() -> Self {
        Self {
            probe_distance: 3.0,
            clearance_margin: 0.5,
            velocity_factor: 0.35,
            vertical_preference: 1.0,
        }
    }
}

impl AvoidanceParams {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            finite_positive(self.probe_distance),
            "avoidance probe distance must be positive",
        )?;
        ensure(
            finite_non_negative(self.clearance_margin) && self.clearance_margin < self.probe_distance,
            "avoidance clearance margin must be non-negative and below the probe distance",
        )?;
        ensure(
            finite_non_negative(self.velocity_factor),
            "avoidance velocity factor must be non-negative",
        )?;
        ensure(
            unit_interval(self.vertical_preference),
            "avoidance vertical preference must be in [0, 1]",
        )
    }
}

/// Random-walk tuning for agents with nothing to react to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderParams {
    /// Length of one walk phase in ticks.
    pub period_ticks: u32,
    /// Pull of the current heading on freshly sampled targets, in [0, 1].
    pub momentum: f32,
    /// Chance a new phase holds the current heading instead of turning.
    pub straight_probability: f32,
    /// Cap on the |y| component of sampled wander targets.
    pub max_vertical_component: f32,
    /// Samples drawn before accepting a target that still probes blocked.
    pub max_probe_attempts: u32,
}

impl Default for WanderParams {
    fn default() -> Self {
        Self {
            period_ticks: 45,
            momentum: 0.65,
            straight_probability: 0.6,
            max_vertical_component: 0.5,
            max_probe_attempts: 4,
        }
    }
}

impl WanderParams {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.period_ticks >= 1, "wander period must be at least one tick")?;
        ensure(unit_interval(self.momentum), "wander momentum must be in [0, 1]")?;
        ensure(
            unit_interval(self.straight_probability),
            "wander straight probability must be in [0, 1]",
        )?;
        ensure(
            unit_interval(self.max_vertical_component),
            "wander vertical limit must be in [0, 1]",
        )?;
        ensure(
            self.max_probe_attempts >= 1,
            "wander probe attempts must be at least one",
        )
    }
}

/// Prey population parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoidParams {
    pub vision_radius: f32,
    /// Half-angle of the view cone, radians.
    pub vision_half_angle: f32,
    /// Push away from schoolmates closing in.
    pub separation: RadiusBand,
    pub separation_weight: f32,
    /// Match heading with every visible schoolmate.
    pub alignment_weight: f32,
    /// Pull toward schoolmates drifting away.
    pub cohesion: RadiusBand,
    pub cohesion_weight: f32,
    /// Push away from visible predators.
    pub fear: RadiusBand,
    pub fear_weight: f32,
    /// Pull of the current heading in the blend.
    pub momentum_weight: f32,
    pub normal_velocity: f32,
    pub alone_velocity: f32,
    pub afraid_velocity: f32,
    pub acceleration: f32,
    /// Acceleration used while afraid.
    pub emergency_acceleration: f32,
    /// Expected time to calm down after losing sight of predators, seconds.
    pub calm_dwell_seconds: f32,
    pub wander: WanderParams,
    pub avoidance: AvoidanceParams,
}

impl Default for BoidParams {
    fn default() -> Self {
        Self {
            vision_radius: 6.0,
            vision_half_angle: 2.6,
            separation: RadiusBand {
                radius: 1.2,
                full_effect_radius: 0.6,
            },
            separation_weight: 2.2,
            alignment_weight: 1.4,
            cohesion: RadiusBand {
                radius: 2.5,
                full_effect_radius: 4.0,
            },
            cohesion_weight: 1.6,
            fear: RadiusBand {
                radius: 3.0,
                full_effect_radius: 6.0,
            },
            fear_weight: 3.5,
            momentum_weight: 1.0,
            normal_velocity: 1.6,
            alone_velocity: 2.2,
            afraid_velocity: 3.4,
            acceleration: 1.8,
            emergency_acceleration: 5.0,
            calm_dwell_seconds: 2.5,
            wander: WanderParams::default(),
            avoidance: AvoidanceParams::default(),
        }
    }
}

/// Predator population parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredatorParams {
    pub vision_radius: f32,
    /// Half-angle of the view cone, radians.
    pub vision_half_angle: f32,
    /// Pull toward visible prey.
    pub prey_attraction: RadiusBand,
    pub prey_attraction_weight: f32,
    /// Push apart from other predators to spread the hunt.
    pub peer_repulsion: RadiusBand,
    pub peer_repulsion_weight: f32,
    pub momentum_weight: f32,
    pub chilling_velocity: f32,
    pub hunting_velocity: f32,
    pub attacking_velocity: f32,
    pub acceleration: f32,
    /// Acceleration used while attacking.
    pub emergency_acceleration: f32,
    /// Expected idle time before a hunt starts, seconds.
    pub hunt_dwell_seconds: f32,
    /// Expected hunt time before giving up, seconds.
    pub rest_dwell_seconds: f32,
    /// Expected time an interrupted attack keeps hunting, seconds.
    pub rehunt_dwell_seconds: f32,
    /// Smoothly weighted prey count that flips a hunt into an attack.
    pub attack_prey_threshold: f32,
    /// Cap on the |y| component of blended steering directions.
    pub max_vertical_component: f32,
    pub wander: WanderParams,
    pub avoidance: AvoidanceParams,
}

impl Default for PredatorParams {
    fn default() -> Self {
        Self {
            vision_radius: 9.0,
            vision_half_angle: 2.2,
            prey_attraction: RadiusBand {
                radius: 2.0,
                full_effect_radius: 7.0,
            },
            prey_attraction_weight: 2.0,
            peer_repulsion: RadiusBand {
                radius: 3.0,
                full_effect_radius: 7.0,
            },
            peer_repulsion_weight: 1.5,
            momentum_weight: 1.2,
            chilling_velocity: 1.1,
            hunting_velocity: 2.0,
            attacking_velocity: 3.8,
            acceleration: 1.2,
            emergency_acceleration: 4.0,
            hunt_dwell_seconds: 6.0,
            rest_dwell_seconds: 8.0,
            rehunt_dwell_seconds: 3.0,
            attack_prey_threshold: 4.0,
            max_vertical_component: 0.45,
            wander: WanderParams::default(),
            avoidance: AvoidanceParams {
                probe_distance: 4.0,
                clearance_margin: 0.8,
                velocity_factor: 0.3,
                vertical_preference: 0.35,
            },
        }
    }
}

/// Full simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoalConfig {
    /// Periodic volume the agents swim in.
    pub volume: Volume,
    /// Seconds advanced per tick.
    pub dt: f32,
    /// Ticks between steering recomputations for any one agent.
    pub decision_interval: u32,
    /// Ticks between speed bonus re-rolls for any one agent.
    pub bonus_interval: u32,
    pub bonus_min: f32,
    pub bonus_max: f32,
    /// World seed; drawn at world creation when absent.
    pub rng_seed: Option<u64>,
    /// Tick summaries retained in the in-memory ring.
    pub history_capacity: usize,
    /// Populations the harness spawns at startup.
    pub initial_boids: usize,
    pub initial_predators: usize,
    /// Sphere obstacles for hosts that use the bundled sphere field.
    pub obstacles: Vec<Sphere>,
    pub boid: BoidParams,
    pub predator: PredatorParams,
}

impl Default for ShoalConfig {
    fn default() -> Self {
        Self {
            volume: Volume {
                min: Vec3::new(-30.0, -10.0, -30.0),
                max: Vec3::new(30.0, 10.0, 30.0),
            },
            dt: 1.0 / 30.0,
            decision_interval: 6,
            bonus_interval: 90,
            bonus_min: 1.0,
            bonus_max: 1.35,
            rng_seed: None,
            history_capacity: 512,
            initial_boids: 160,
            initial_predators: 3,
            obstacles: Vec::new(),
            boid: BoidParams::default(),
            predator: PredatorParams::default(),
        }
    }
}

impl ShoalConfig {
    /// Validates every field and derives the profiles the hot path reads.
    ///
    /// A cohesion base radius below the separation base radius is repaired by
    /// clamping it up rather than rejected; every other inconsistency is an
    /// error.
    pub fn profiles(&self) -> Result<Profiles, ConfigError> {
        self.volume
            .validate()
            .map_err(|_| ConfigError::InvalidConfig("volume extent must be finite and positive"))?;
        ensure(finite_positive(self.dt), "dt must be positive")?;
        ensure(
            self.decision_interval >= 1,
            "decision interval must be at least one tick",
        )?;
        ensure(
            self.bonus_interval >= 1,
            "bonus interval must be at least one tick",
        )?;
        ensure(
            finite_positive(self.bonus_min) && self.bonus_max >= self.bonus_min,
            "bonus range must be positive and ordered",
        )?;
        ensure(self.bonus_max.is_finite(), "bonus range must be finite")?;
        ensure(
            self.history_capacity >= 1,
            "history capacity must be non-zero",
        )?;

        let decision_seconds = self.decision_interval as f32 * self.dt;
        let boid = BoidProfile::derive(&self.boid, decision_seconds)?;
        let predator = PredatorProfile::derive(&self.predator, decision_seconds)?;
        Ok(Profiles { boid, predator })
    }
}

fn validate_vision(radius: f32, half_angle: f32) -> Result<(), ConfigError> {
    ensure(finite_positive(radius), "vision radius must be positive")?;
    ensure(
        half_angle.is_finite() && half_angle > 0.0 && half_angle <= std::f32::consts::PI,
        "vision half-angle must be in (0, pi]",
    )
}

fn validate_motion(
    velocities: &[f32],
    acceleration: f32,
    emergency_acceleration: f32,
) -> Result<(), ConfigError> {
    ensure(
        velocities.iter().copied().all(finite_non_negative),
        "state velocities must be non-negative",
    )?;
    ensure(
        finite_positive(acceleration) && finite_positive(emergency_acceleration),
        "accelerations must be positive",
    )
}

/// Chance of one Bernoulli transition per decision, derived from an expected
/// dwell time.
fn dwell_probability(dwell_seconds: f32, decision_seconds: f32) -> Result<f64, ConfigError> {
    ensure(
        finite_positive(dwell_seconds),
        "state dwell times must be positive",
    )?;
    Ok(f64::from((decision_seconds / dwell_seconds).clamp(0.0, 1.0)))
}

/// Validated, precomputed boid parameters.
#[derive(Debug, Clone)]
pub struct BoidProfile {
    pub vision_radius_sq: f32,
    pub cos_half_angle: f32,
    pub separation: BandSq,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion: BandSq,
    pub cohesion_weight: f32,
    pub fear: BandSq,
    pub fear_weight: f32,
    pub momentum_weight: f32,
    pub normal_velocity: f32,
    pub alone_velocity: f32,
    pub afraid_velocity: f32,
    pub acceleration: f32,
    pub emergency_acceleration: f32,
    /// Chance per decision that an afraid boid with no predator in the fear
    /// band calms down.
    pub calm_probability: f64,
    pub wander: WanderParams,
    pub avoidance: AvoidanceParams,
}

impl BoidProfile {
    fn derive(params: &BoidParams, decision_seconds: f32) -> Result<Self, ConfigError> {
        validate_vision(params.vision_radius, params.vision_half_angle)?;
        ensure(
            params.separation.finite() && params.cohesion.finite() && params.fear.finite(),
            "boid radius bands must be finite and non-negative",
        )?;
        ensure(
            params.separation.full_effect_radius <= params.separation.radius,
            "separation full-effect radius must not exceed its base radius",
        )?;
        ensure(
            params.cohesion.full_effect_radius >= params.cohesion.radius,
            "cohesion full-effect radius must not undercut its base radius",
        )?;
        ensure(
            params.fear.full_effect_radius >= params.fear.radius,
            "fear full-effect radius must not undercut its base radius",
        )?;
        ensure(
            [
                params.separation_weight,
                params.alignment_weight,
                params.cohesion_weight,
                params.fear_weight,
                params.momentum_weight,
            ]
            .into_iter()
            .all(finite_non_negative),
            "boid behavior weights must be non-negative",
        )?;
        validate_motion(
            &[
                params.normal_velocity,
                params.alone_velocity,
                params.afraid_velocity,
            ],
            params.acceleration,
            params.emergency_acceleration,
        )?;
        params.wander.validate()?;
        params.avoidance.validate()?;

        // Overlapping bands would let cohesion and separation fight over the
        // same neighbors; pull cohesion's inner edge out instead of failing.
        let mut cohesion = params.cohesion;
        if cohesion.radius < params.separation.radius {
            cohesion.radius = params.separation.radius;
            cohesion.full_effect_radius = cohesion.full_effect_radius.max(cohesion.radius);
        }

        Ok(Self {
            vision_radius_sq: params.vision_radius * params.vision_radius,
            cos_half_angle: params.vision_half_angle.cos(),
            separation: params.separation.inward_sq(),
            separation_weight: params.separation_weight,
            alignment_weight: params.alignment_weight,
            cohesion: cohesion.outward_sq(),
            cohesion_weight: params.cohesion_weight,
            fear: params.fear.outward_sq(),
            fear_weight: params.fear_weight,
            momentum_weight: params.momentum_weight,
            normal_velocity: params.normal_velocity,
            alone_velocity: params.alone_velocity,
            afraid_velocity: params.afraid_velocity,
            acceleration: params.acceleration,
            emergency_acceleration: params.emergency_acceleration,
            calm_probability: dwell_probability(params.calm_dwell_seconds, decision_seconds)?,
            wander: params.wander,
            avoidance: params.avoidance,
        })
    }
}

/// Validated, precomputed predator parameters.
#[derive(Debug, Clone)]
pub struct PredatorProfile {
    pub vision_radius_sq: f32,
    pub cos_half_angle: f32,
    pub prey_attraction: BandSq,
    pub prey_attraction_weight: f32,
    pub peer_repulsion: BandSq,
    pub peer_repulsion_weight: f32,
    pub momentum_weight: f32,
    pub chilling_velocity: f32,
    pub hunting_velocity: f32,
    pub attacking_velocity: f32,
    pub acceleration: f32,
    pub emergency_acceleration: f32,
    /// Chance per decision that a chilling predator starts hunting.
    pub hunt_probability: f64,
    /// Chance per decision that a fruitless hunt winds down.
    pub rest_probability: f64,
    /// Chance per decision that an interrupted attack resumes hunting.
    pub rehunt_probability: f64,
    pub attack_prey_threshold: f32,
    pub max_vertical_component: f32,
    pub wander: WanderParams,
    pub avoidance: AvoidanceParams,
}

impl PredatorProfile {
    fn derive(params: &PredatorParams, decision_seconds: f32) -> Result<Self, ConfigError> {
        validate_vision(params.vision_radius, params.vision_half_angle)?;
        ensure(
            params.prey_attraction.finite() && params.peer_repulsion.finite(),
            "predator radius bands must be finite and non-negative",
        )?;
        ensure(
            params.prey_attraction.full_effect_radius >= params.prey_attraction.radius,
            "prey-attraction full-effect radius must not undercut its base radius",
        )?;
        ensure(
            params.peer_repulsion.full_effect_radius >= params.peer_repulsion.radius,
            "peer-repulsion full-effect radius must not undercut its base radius",
        )?;
        ensure(
            [
                params.prey_attraction_weight,
                params.peer_repulsion_weight,
                params.momentum_weight,
            ]
            .into_iter()
            .all(finite_non_negative),
            "predator behavior weights must be non-negative",
        )?;
        validate_motion(
            &[
                params.chilling_velocity,
                params.hunting_velocity,
                params.attacking_velocity,
            ],
            params.acceleration,
            params.emergency_acceleration,
        )?;
        ensure(
            finite_non_negative(params.attack_prey_threshold),
            "attack prey threshold must be non-negative",
        )?;
        ensure(
            unit_interval(params.max_vertical_component),
            "predator vertical limit must be in [0, 1]",
        )?;
        params.wander.validate()?;
        params.avoidance.validate()?;

        Ok(Self {
            vision_radius_sq: params.vision_radius * params.vision_radius,
            cos_half_angle: params.vision_half_angle.cos(),
            prey_attraction: params.prey_attraction.outward_sq(),
            prey_attraction_weight: params.prey_attraction_weight,
            peer_repulsion: params.peer_repulsion.outward_sq(),
            peer_repulsion_weight: params.peer_repulsion_weight,
            momentum_weight: params.momentum_weight,
            chilling_velocity: params.chilling_velocity,
            hunting_velocity: params.hunting_velocity,
            attacking_velocity: params.attacking_velocity,
            acceleration: params.acceleration,
            emergency_acceleration: params.emergency_acceleration,
            hunt_probability: dwell_probability(params.hunt_dwell_seconds, decision_seconds)?,
            rest_probability: dwell_probability(params.rest_dwell_seconds, decision_seconds)?,
            rehunt_probability: dwell_probability(params.rehunt_dwell_seconds, decision_seconds)?,
            attack_prey_threshold: params.attack_prey_threshold,
            max_vertical_component: params.max_vertical_component,
            wander: params.wander,
            avoidance: params.avoidance,
        })
    }
}

/// Both derived profiles, built once per configuration.
#[derive(Debug, Clone)]
pub struct Profiles {
    pub boid: BoidProfile,
    pub predator: PredatorProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(ShoalConfig::default().profiles().is_ok());
    }

    #[test]
    fn rejects_degenerate_timing() {
        let mut config = ShoalConfig {
            dt: 0.0,
            ..ShoalConfig::default()
        };
        assert!(config.profiles().is_err());
        config.dt = 1.0 / 30.0;
        config.decision_interval = 0;
        assert!(config.profiles().is_err());
    }

    #[test]
    fn rejects_inverted_bonus_range() {
        let config = ShoalConfig {
            bonus_min: 1.4,
            bonus_max: 1.1,
            ..ShoalConfig::default()
        };
        assert!(config.profiles().is_err());
    }

    #[test]
    fn rejects_inverted_bands() {
        let mut config = ShoalConfig::default();
        config.boid.separation.full_effect_radius = config.boid.separation.radius + 1.0;
        assert!(config.profiles().is_err());

        let mut config = ShoalConfig::default();
        config.boid.fear.full_effect_radius = config.boid.fear.radius - 1.0;
        assert!(config.profiles().is_err());

        let mut config = ShoalConfig::default();
        config.predator.peer_repulsion.full_effect_radius =
            config.predator.peer_repulsion.radius - 1.0;
        assert!(config.profiles().is_err());
    }

    #[test]
    fn rejects_out_of_range_probabilities_and_limits() {
        let mut config = ShoalConfig::default();
        config.boid.wander.straight_probability = 1.5;
        assert!(config.profiles().is_err());

        let mut config = ShoalConfig::default();
        config.predator.max_vertical_component = 1.2;
        assert!(config.profiles().is_err());

        let mut config = ShoalConfig::default();
        config.boid.avoidance.clearance_margin = config.boid.avoidance.probe_distance;
        assert!(config.profiles().is_err());
    }

    #[test]
    fn cohesion_band_is_clamped_up_to_separation() {
        let mut config = ShoalConfig::default();
        config.boid.separation.radius = 2.0;
        config.boid.separation.full_effect_radius = 1.0;
        config.boid.cohesion.radius = 0.5;
        config.boid.cohesion.full_effect_radius = 0.8;
        let profiles = config.profiles().unwrap();
        // Inner cohesion edge pulled out to the separation radius.
        assert!((profiles.boid.cohesion.zero_edge_sq() - 4.0).abs() < 1e-5);
        // At the shared edge separation is done and cohesion has not started.
        assert_eq!(profiles.boid.separation.weight(4.0), 0.0);
        assert_eq!(profiles.boid.cohesion.weight(4.0), 0.0);
        assert!(profiles.boid.cohesion.weight(4.5) > 0.0);
    }

    #[test]
    fn dwell_times_become_per_decision_probabilities() {
        let config = ShoalConfig {
            dt: 0.1,
            decision_interval: 5,
            ..ShoalConfig::default()
        };
        // One decision every 0.5 seconds.
        let mut with_dwell = config.clone();
        with_dwell.boid.calm_dwell_seconds = 1.0;
        let profiles = with_dwell.profiles().unwrap();
        assert!((profiles.boid.calm_probability - 0.5).abs() < 1e-6);

        // Dwell shorter than a decision clamps to certainty.
        let mut instant = config;
        instant.predator.hunt_dwell_seconds = 0.1;
        let profiles = instant.profiles().unwrap();
        assert!((profiles.predator.hunt_probability - 1.0).abs() < 1e-9);
    }

    #[test]
    fn band_weights_ramp_between_edges() {
        let profiles = ShoalConfig::default().profiles().unwrap();
        let separation = profiles.boid.separation;
        // Full effect inside the inner edge, fading to zero at the base radius.
        assert_eq!(separation.weight(0.25 * 0.25), 1.0);
        assert_eq!(separation.weight(1.2 * 1.2), 0.0);
        let mid = separation.weight(0.9 * 0.9);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn partial_json_fills_with_defaults() {
        let config: ShoalConfig =
            serde_json::from_str(r#"{ "decision_interval": 4, "bonus_max": 1.5 }"#).unwrap();
        assert_eq!(config.decision_interval, 4);
        assert!((config.bonus_max - 1.5).abs() < 1e-6);
        assert_eq!(config.bonus_interval, ShoalConfig::default().bonus_interval);
        assert!(config.profiles().is_ok());
    }
}
