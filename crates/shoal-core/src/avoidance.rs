//! Obstacle deflection.
//!
//! A forward probe guards every proposed direction. On a hit, eight
//! candidate directions in the plane perpendicular to the proposal are
//! blended toward the proposal by perceived clearance and probed in turn;
//! the first clear candidate wins, and if every ray hits, the candidate
//! with the best preference-scaled hit distance is kept as the least bad
//! way out.

use glam::Vec3;
use ordered_float::OrderedFloat;
use shoal_spatial::ObstacleProbe;

use crate::config::AvoidanceParams;
use crate::math;

/// Probe length and contact margin for one decision.
///
/// The reach stretches with speed so fast agents look farther ahead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeReach {
    pub distance: f32,
    pub margin: f32,
}

impl ProbeReach {
    #[must_use]
    pub fn for_velocity(params: &AvoidanceParams, velocity: f32) -> Self {
        Self {
            distance: params.probe_distance * (1.0 + velocity.max(0.0) * params.velocity_factor),
            margin: params.clearance_margin,
        }
    }

    /// Remaps a hit distance to perceived clearance in [0, 1]: hits inside
    /// the margin count as contact (0), hits at full reach as clear (1).
    fn clearance(&self, hit: f32) -> f32 {
        let span = self.distance - self.margin;
        if span <= math::EPSILON {
            return 0.0;
        }
        ((hit - self.margin) / span).clamp(0.0, 1.0)
    }
}

/// Candidate deflections: the four cardinals of the perpendicular plane,
/// then its four diagonals. Probe order is fixed, so the first-clear
/// short-circuit is deterministic.
fn candidates(side: Vec3, lift: Vec3) -> [Vec3; 8] {
    let diag = std::f32::consts::FRAC_1_SQRT_2;
    [
        side,
        -side,
        lift,
        -lift,
        (side + lift) * diag,
        (side - lift) * diag,
        (-side + lift) * diag,
        (-side - lift) * diag,
    ]
}

/// Checks `proposed` against the obstacle field and searches for a way
/// around when it is blocked.
///
/// Returns `None` when the proposal is already clear. `reference_axis`
/// anchors the candidate plane; `vertical_preference` down-weights vertical
/// candidates when all rays hit (1 means no bias). The returned direction is
/// unit length.
pub fn deflect(
    proposed: Vec3,
    origin: Vec3,
    reach: ProbeReach,
    reference_axis: Vec3,
    vertical_preference: f32,
    probe: &dyn ObstacleProbe,
) -> Option<Vec3> {
    let ahead = probe.probe(origin, proposed, reach.distance)?;
    let clearance = reach.clearance(ahead);
    let (side, lift) = math::orthonormal_basis(proposed, reference_axis);

    let mut best: Option<(OrderedFloat<f32>, Vec3)> = None;
    for candidate in candidates(side, lift) {
        // The nearer the obstacle, the more the candidate dominates the blend.
        let blended = math::steer_lerp(candidate, proposed, clearance);
        match probe.probe(origin, blended, reach.distance) {
            None => return Some(blended),
            Some(hit) => {
                let preference = 1.0 - (1.0 - vertical_preference) * candidate.y.abs();
                let score = OrderedFloat(hit * preference);
                if best.is_none_or(|(best_score, _)| score > best_score) {
                    best = Some((score, blended));
                }
            }
        }
    }
    best.map(|(_, direction)| direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::WORLD_UP;
    use shoal_spatial::NullProbe;

    /// Blocks rays within a cone around `axis` at a fixed hit distance.
    struct ConeBlock {
        axis: Vec3,
        cos: f32,
        hit: f32,
    }

    impl ObstacleProbe for ConeBlock {
        fn probe(&self, _origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
            (direction.dot(self.axis) > self.cos && self.hit <= max_distance).then_some(self.hit)
        }
    }

    /// Blocks every ray; vertical rays see farther than horizontal ones.
    struct GradedBlock;

    impl ObstacleProbe for GradedBlock {
        fn probe(&self, _origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
            Some((1.0 + 2.0 * direction.y.abs()).min(max_distance))
        }
    }

    fn reach() -> ProbeReach {
        ProbeReach {
            distance: 3.0,
            margin: 0.5,
        }
    }

    #[test]
    fn reach_stretches_with_velocity() {
        let params = AvoidanceParams {
            probe_distance: 2.0,
            clearance_margin: 0.4,
            velocity_factor: 0.5,
            vertical_preference: 1.0,
        };
        let at_rest = ProbeReach::for_velocity(&params, 0.0);
        assert!((at_rest.distance - 2.0).abs() < 1e-6);
        let fast = ProbeReach::for_velocity(&params, 3.0);
        assert!((fast.distance - 5.0).abs() < 1e-6);
        assert!((fast.margin - 0.4).abs() < 1e-6);
    }

    #[test]
    fn clearance_remaps_margin_to_reach() {
        let reach = reach();
        assert_eq!(reach.clearance(0.2), 0.0);
        assert_eq!(reach.clearance(0.5), 0.0);
        assert!((reach.clearance(1.75) - 0.5).abs() < 1e-6);
        assert_eq!(reach.clearance(3.0), 1.0);
    }

    #[test]
    fn clear_proposal_is_untouched() {
        let result = deflect(Vec3::Z, Vec3::ZERO, reach(), WORLD_UP, 1.0, &NullProbe);
        assert_eq!(result, None);
    }

    #[test]
    fn blocked_ahead_returns_first_clear_candidate() {
        let probe = ConeBlock {
            axis: Vec3::Z,
            cos: 0.95,
            hit: 1.0,
        };
        let result = deflect(Vec3::Z, Vec3::ZERO, reach(), WORLD_UP, 1.0, &probe)
            .expect("forward ray is blocked");
        assert!((result.length() - 1.0).abs() < 1e-5);
        // Deflected outside the blocked cone, leaning to the first candidate.
        assert!(result.dot(Vec3::Z) < 0.95);
        assert!(result.x > 0.9);
    }

    #[test]
    fn contact_hit_yields_pure_candidate() {
        let probe = ConeBlock {
            axis: Vec3::Z,
            cos: 0.95,
            hit: 0.3,
        };
        // Hit inside the margin: clearance 0, no pull back toward the proposal.
        let result = deflect(Vec3::Z, Vec3::ZERO, reach(), WORLD_UP, 1.0, &probe);
        assert_eq!(result, Some(Vec3::X));
    }

    #[test]
    fn fully_blocked_picks_longest_preferred_ray() {
        // No vertical bias: the vertical candidate sees farthest and wins.
        let unbiased = deflect(Vec3::Z, Vec3::ZERO, reach(), WORLD_UP, 1.0, &GradedBlock)
            .expect("everything is blocked");
        assert!(unbiased.y > 0.5);

        // Full vertical bias: vertical rays score zero, a horizontal one wins.
        let biased = deflect(Vec3::Z, Vec3::ZERO, reach(), WORLD_UP, 0.0, &GradedBlock)
            .expect("everything is blocked");
        assert!(biased.y.abs() < 0.5);
    }
}
