//! Multi-behavior steering blend.
//!
//! Every behavior accumulates its neighbors into a weighted sum, then the
//! per-behavior directions are combined in one pass: each direction enters
//! the blend scaled by an effective weight (the accumulated neighbor weight
//! capped at one, times the behavior's configured weight), momentum keeps
//! the current heading in the mix, and the result is normalized. Neighbor
//! weights come from squared-distance bands, so a mate drifting across a
//! band edge fades in or out instead of popping.

use glam::Vec3;
use shoal_spatial::{AgentKind, AgentSighting, KindFilter, NeighborQuery};

use crate::config::{BoidProfile, PredatorProfile};
use crate::math;

/// Smoothly weighted neighbor counts seen by one agent during a decision.
///
/// `same_kind` counts visible agents of the agent's own population (one per
/// schoolmate for boids, band-weighted for predator peers); `other_kind` is
/// the band-weighted count of the opposite population and drives the fear
/// and attack triggers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeighborPressure {
    pub same_kind: f32,
    pub other_kind: f32,
}

/// Outcome of one steering decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringDecision {
    /// Unit direction to steer toward, or `None` when nothing in view
    /// produced any pull and the agent should fall back to its random walk.
    pub direction: Option<Vec3>,
    pub pressure: NeighborPressure,
}

/// Weighted running sum for one behavior.
#[derive(Debug, Clone, Copy, Default)]
struct BehaviorAccumulator {
    sum: Vec3,
    weight: f32,
}

impl BehaviorAccumulator {
    fn add(&mut self, weight: f32, value: Vec3) {
        if weight > math::EPSILON {
            self.sum += value * weight;
            self.weight += weight;
        }
    }

    /// Unit direction from `from` toward the weighted mean position.
    fn toward_mean(&self, from: Vec3) -> Option<Vec3> {
        if self.weight <= math::EPSILON {
            return None;
        }
        ((self.sum / self.weight) - from).try_normalize()
    }

    /// Unit mean of accumulated directions.
    fn mean_direction(&self) -> Option<Vec3> {
        if self.weight <= math::EPSILON {
            return None;
        }
        self.sum.try_normalize()
    }

    /// Blend weight: accumulated neighbor weight capped at one, scaled by
    /// the behavior's configured weight.
    fn effective(&self, base_weight: f32) -> f32 {
        self.weight.min(1.0) * base_weight
    }
}

/// Running blend over behavior directions.
#[derive(Debug, Clone, Copy)]
struct Blend {
    sum: Vec3,
    total: f32,
    stimulus: f32,
}

impl Blend {
    fn with_momentum(direction: Vec3, momentum_weight: f32) -> Self {
        Self {
            sum: direction * momentum_weight,
            total: momentum_weight,
            stimulus: 0.0,
        }
    }

    fn add(&mut self, direction: Option<Vec3>, effective: f32) {
        if let Some(direction) = direction
            && effective > math::EPSILON
        {
            self.sum += direction * effective;
            self.total += effective;
            self.stimulus += effective;
        }
    }

    /// Weighted average of the entered directions, renormalized. `None`
    /// when no behavior contributed anything: momentum alone is not a
    /// stimulus, and an agent with nothing to react to should wander.
    fn resolve(self, fallback: Vec3) -> Option<Vec3> {
        if self.stimulus <= math::EPSILON || self.total <= math::EPSILON {
            return None;
        }
        Some((self.sum / self.total).try_normalize().unwrap_or(fallback))
    }
}

/// True when `offset` (pointing at a neighbor `distance` away) falls inside
/// the view cone around `direction`.
fn in_view(offset: Vec3, direction: Vec3, distance: f32, cos_half_angle: f32) -> bool {
    // dot(offset/d, dir) >= cos  without the divide; d > 0 preserves order.
    offset.dot(direction) >= cos_half_angle * distance
}

/// One boid steering decision against the published snapshot.
///
/// `me` is the boid's own index into `sightings` and is skipped during
/// accumulation.
pub fn blend_boid(
    profile: &BoidProfile,
    me: usize,
    position: Vec3,
    direction: Vec3,
    sightings: &[AgentSighting],
    query: &dyn NeighborQuery,
) -> SteeringDecision {
    let mut separation = BehaviorAccumulator::default();
    let mut alignment = BehaviorAccumulator::default();
    let mut cohesion = BehaviorAccumulator::default();
    let mut fear = BehaviorAccumulator::default();

    query.for_each_within(
        position,
        profile.vision_radius_sq,
        KindFilter::Any,
        &mut |idx, dist_sq| {
            if idx == me {
                return;
            }
            let dist_sq = dist_sq.into_inner();
            if dist_sq <= math::EPSILON {
                // Co-located neighbor: no usable bearing.
                return;
            }
            let sighting = &sightings[idx];
            let offset = sighting.position - position;
            if !in_view(offset, direction, dist_sq.sqrt(), profile.cos_half_angle) {
                return;
            }
            match sighting.kind {
                AgentKind::Boid => {
                    separation.add(profile.separation.weight(dist_sq), sighting.position);
                    cohesion.add(profile.cohesion.weight(dist_sq), sighting.position);
                    alignment.add(1.0, sighting.direction);
                }
                AgentKind::Predator => {
                    fear.add(profile.fear.weight(dist_sq), sighting.position);
                }
            }
        },
    );

    let pressure = NeighborPressure {
        same_kind: alignment.weight,
        other_kind: fear.weight,
    };

    let mut blend = Blend::with_momentum(direction, profile.momentum_weight);
    if let Some(toward) = separation.toward_mean(position) {
        blend.add(Some(-toward), separation.effective(profile.separation_weight));
    }
    blend.add(
        alignment.mean_direction(),
        alignment.effective(profile.alignment_weight),
    );
    blend.add(
        cohesion.toward_mean(position),
        cohesion.effective(profile.cohesion_weight),
    );
    if let Some(toward) = fear.toward_mean(position) {
        blend.add(Some(-toward), fear.effective(profile.fear_weight));
    }

    SteeringDecision {
        direction: blend.resolve(direction),
        pressure,
    }
}

/// One predator steering decision against the published snapshot.
///
/// Predators keep their blended heading shallow: the vertical component of
/// the result is clamped to the profile limit.
pub fn blend_predator(
    profile: &PredatorProfile,
    me: usize,
    position: Vec3,
    direction: Vec3,
    sightings: &[AgentSighting],
    query: &dyn NeighborQuery,
) -> SteeringDecision {
    let mut prey = BehaviorAccumulator::default();
    let mut peers = BehaviorAccumulator::default();

    query.for_each_within(
        position,
        profile.vision_radius_sq,
        KindFilter::Any,
        &mut |idx, dist_sq| {
            if idx == me {
                return;
            }
            let dist_sq = dist_sq.into_inner();
            if dist_sq <= math::EPSILON {
                return;
            }
            let sighting = &sightings[idx];
            let offset = sighting.position - position;
            if !in_view(offset, direction, dist_sq.sqrt(), profile.cos_half_angle) {
                return;
            }
            match sighting.kind {
                AgentKind::Boid => {
                    prey.add(profile.prey_attraction.weight(dist_sq), sighting.position);
                }
                AgentKind::Predator => {
                    peers.add(profile.peer_repulsion.weight(dist_sq), sighting.position);
                }
            }
        },
    );

    let pressure = NeighborPressure {
        same_kind: peers.weight,
        other_kind: prey.weight,
    };

    let mut blend = Blend::with_momentum(direction, profile.momentum_weight);
    blend.add(
        prey.toward_mean(position),
        prey.effective(profile.prey_attraction_weight),
    );
    if let Some(toward) = peers.toward_mean(position) {
        blend.add(Some(-toward), peers.effective(profile.peer_repulsion_weight));
    }

    let steered = blend
        .resolve(direction)
        .map(|dir| math::clamp_vertical(dir, profile.max_vertical_component));

    SteeringDecision {
        direction: steered,
        pressure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShoalConfig;
    use shoal_spatial::GridNeighborIndex;

    fn snapshot(entries: &[(AgentKind, Vec3, Vec3)]) -> (Vec<AgentSighting>, GridNeighborIndex) {
        let sightings: Vec<AgentSighting> = entries
            .iter()
            .map(|&(kind, position, direction)| AgentSighting {
                kind,
                position,
                direction,
            })
            .collect();
        let mut grid = GridNeighborIndex::new(4.0).unwrap();
        grid.rebuild(&sightings).unwrap();
        (sightings, grid)
    }

    #[test]
    fn empty_view_yields_no_stimulus() {
        let profiles = ShoalConfig::default().profiles().unwrap();
        let (sightings, grid) =
            snapshot(&[(AgentKind::Boid, Vec3::ZERO, Vec3::Z)]);
        let decision = blend_boid(&profiles.boid, 0, Vec3::ZERO, Vec3::Z, &sightings, &grid);
        assert_eq!(decision.direction, None);
        assert_eq!(decision.pressure, NeighborPressure::default());
    }

    #[test]
    fn cohesion_pulls_toward_distant_mate() {
        let profiles = ShoalConfig::default().profiles().unwrap();
        // Mate ahead at the cohesion full-effect edge.
        let (sightings, grid) = snapshot(&[
            (AgentKind::Boid, Vec3::ZERO, Vec3::Z),
            (AgentKind::Boid, Vec3::new(0.0, 0.0, 4.0), Vec3::Z),
        ]);
        let decision = blend_boid(&profiles.boid, 0, Vec3::ZERO, Vec3::Z, &sightings, &grid);
        let dir = decision.direction.unwrap();
        assert!(dir.z > 0.9);
        assert!((decision.pressure.same_kind - 1.0).abs() < 1e-5);
    }

    #[test]
    fn separation_pushes_away_from_close_mate() {
        let mut config = ShoalConfig::default();
        // Isolate separation: drop momentum and alignment for a pure readout.
        config.boid.momentum_weight = 0.0;
        config.boid.alignment_weight = 0.0;
        let profiles = config.profiles().unwrap();
        let mate = Vec3::new(0.3, 0.0, 0.4);
        let (sightings, grid) = snapshot(&[
            (AgentKind::Boid, Vec3::ZERO, Vec3::Z),
            (AgentKind::Boid, mate, Vec3::Z),
        ]);
        let decision = blend_boid(&profiles.boid, 0, Vec3::ZERO, Vec3::Z, &sightings, &grid);
        let dir = decision.direction.unwrap();
        assert!(dir.dot(mate.normalize()) < 0.0);
    }

    #[test]
    fn neighbors_behind_are_ignored() {
        let mut config = ShoalConfig::default();
        // Narrow cone so "behind" is unambiguous.
        config.boid.vision_half_angle = 1.0;
        let profiles = config.profiles().unwrap();
        let (sightings, grid) = snapshot(&[
            (AgentKind::Boid, Vec3::ZERO, Vec3::Z),
            (AgentKind::Boid, Vec3::new(0.0, 0.0, -3.0), Vec3::Z),
        ]);
        let decision = blend_boid(&profiles.boid, 0, Vec3::ZERO, Vec3::Z, &sightings, &grid);
        assert_eq!(decision.direction, None);
        assert_eq!(decision.pressure.same_kind, 0.0);
    }

    #[test]
    fn predator_in_fear_band_repels_and_registers() {
        let mut config = ShoalConfig::default();
        config.boid.momentum_weight = 0.0;
        let profiles = config.profiles().unwrap();
        // Predator ahead at the fear full-effect edge.
        let (sightings, grid) = snapshot(&[
            (AgentKind::Boid, Vec3::ZERO, Vec3::Z),
            (AgentKind::Predator, Vec3::new(0.0, 0.0, 5.9), Vec3::Z),
        ]);
        let decision = blend_boid(&profiles.boid, 0, Vec3::ZERO, Vec3::Z, &sightings, &grid);
        let dir = decision.direction.unwrap();
        assert!(dir.z < -0.9);
        assert!(decision.pressure.other_kind > 0.9);
    }

    #[test]
    fn fear_weight_is_zero_inside_base_radius_edge() {
        let profiles = ShoalConfig::default().profiles().unwrap();
        // Predator exactly at the fear base radius: band weight is zero.
        let (sightings, grid) = snapshot(&[
            (AgentKind::Boid, Vec3::ZERO, Vec3::Z),
            (AgentKind::Predator, Vec3::new(0.0, 0.0, 3.0), Vec3::Z),
        ]);
        let decision = blend_boid(&profiles.boid, 0, Vec3::ZERO, Vec3::Z, &sightings, &grid);
        assert_eq!(decision.pressure.other_kind, 0.0);
    }

    #[test]
    fn opposing_stimuli_fall_back_to_current_heading() {
        let mut config = ShoalConfig::default();
        config.boid.momentum_weight = 0.0;
        config.boid.separation_weight = 0.0;
        config.boid.cohesion_weight = 1.0;
        config.boid.alignment_weight = 0.0;
        config.boid.fear_weight = 1.0;
        // Put the fear band edges on top of the cohesion band so a mate and a
        // predator at mirrored offsets produce exactly cancelling pulls.
        config.boid.fear = config.boid.cohesion;
        let profiles = config.profiles().unwrap();
        let (sightings, grid) = snapshot(&[
            (AgentKind::Boid, Vec3::ZERO, Vec3::X),
            (AgentKind::Boid, Vec3::new(0.0, 0.0, 4.0), Vec3::Z),
            (AgentKind::Predator, Vec3::new(0.0, 0.0, 4.0), Vec3::Z),
        ]);
        let decision = blend_boid(&profiles.boid, 0, Vec3::ZERO, Vec3::X, &sightings, &grid);
        // Cohesion pulls toward +Z, fear pushes toward -Z with equal weight;
        // the degenerate blend keeps the current heading.
        assert_eq!(decision.direction, Some(Vec3::X));
    }

    #[test]
    fn predator_steers_at_prey_cluster_with_shallow_climb() {
        let mut config = ShoalConfig::default();
        config.predator.momentum_weight = 0.0;
        let profiles = config.profiles().unwrap();
        // Prey cluster above and ahead, well inside the attraction band.
        let (sightings, grid) = snapshot(&[
            (AgentKind::Predator, Vec3::ZERO, Vec3::Z),
            (AgentKind::Boid, Vec3::new(0.0, 5.0, 2.0), Vec3::Z),
            (AgentKind::Boid, Vec3::new(0.5, 5.0, 2.5), Vec3::Z),
            (AgentKind::Boid, Vec3::new(-0.5, 5.0, 2.5), Vec3::Z),
        ]);
        let decision =
            blend_predator(&profiles.predator, 0, Vec3::ZERO, Vec3::Z, &sightings, &grid);
        let dir = decision.direction.unwrap();
        assert!((dir.length() - 1.0).abs() < 1e-5);
        // Pull is upward but the climb is clamped.
        assert!(dir.y > 0.0);
        assert!(dir.y <= profiles.predator.max_vertical_component + 1e-5);
        assert!(decision.pressure.other_kind > 0.0);
    }

    #[test]
    fn predator_peers_register_as_same_kind_pressure() {
        let mut config = ShoalConfig::default();
        config.predator.momentum_weight = 0.0;
        let profiles = config.profiles().unwrap();
        let (sightings, grid) = snapshot(&[
            (AgentKind::Predator, Vec3::ZERO, Vec3::Z),
            (AgentKind::Predator, Vec3::new(0.0, 0.0, 6.0), Vec3::Z),
        ]);
        let decision =
            blend_predator(&profiles.predator, 0, Vec3::ZERO, Vec3::Z, &sightings, &grid);
        assert!(decision.pressure.same_kind > 0.0);
        // Repulsion pushes the blend straight away from the peer.
        let dir = decision.direction.unwrap();
        assert!(dir.z < 0.0);
    }

    #[test]
    fn co_located_neighbor_is_skipped_without_nan() {
        let profiles = ShoalConfig::default().profiles().unwrap();
        let (sightings, grid) = snapshot(&[
            (AgentKind::Boid, Vec3::ZERO, Vec3::Z),
            (AgentKind::Boid, Vec3::ZERO, Vec3::X),
        ]);
        let decision = blend_boid(&profiles.boid, 0, Vec3::ZERO, Vec3::Z, &sightings, &grid);
        assert_eq!(decision.pressure.same_kind, 0.0);
        if let Some(dir) = decision.direction {
            assert!(dir.is_finite());
        }
    }
}
