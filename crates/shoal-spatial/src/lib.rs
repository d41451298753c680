//! Spatial contracts between the shoal steering engine and its host scene.
//!
//! The engine never owns scene geometry. Neighbor lookups and obstacle
//! raycasts are supplied by the embedding application through the
//! [`NeighborQuery`] and [`ObstacleProbe`] traits. This crate also ships
//! reference implementations (a uniform grid and a sphere field) used by the
//! headless harness, the tests, and the benches.

use std::collections::HashMap;

use glam::Vec3;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by spatial collaborators.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpatialError {
    /// Indicates construction parameters that cannot be used.
    #[error("invalid spatial configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Population an agent belongs to. Fixed for the agent's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// Prey; schools with its own kind and flees predators.
    Boid,
    /// Hunter; seeks boids and keeps distance from other predators.
    Predator,
}

impl AgentKind {
    #[must_use]
    pub const fn is_predator(self) -> bool {
        matches!(self, AgentKind::Predator)
    }

    /// The kind this kind reacts to as its opposite population.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            AgentKind::Boid => AgentKind::Predator,
            AgentKind::Predator => AgentKind::Boid,
        }
    }
}

/// Immutable per-agent record published once per tick for neighbor queries.
///
/// Sightings describe the world as it stood at the end of the previous tick,
/// so every agent deciding on the current tick reads the same snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSighting {
    pub kind: AgentKind,
    pub position: Vec3,
    /// Unit heading of the sighted agent.
    pub direction: Vec3,
}

/// Restricts a neighbor query to one population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    /// Visit agents of both kinds.
    #[default]
    Any,
    /// Visit only agents of the given kind.
    Only(AgentKind),
}

impl KindFilter {
    #[must_use]
    pub fn admits(self, kind: AgentKind) -> bool {
        match self {
            KindFilter::Any => true,
            KindFilter::Only(wanted) => wanted == kind,
        }
    }
}

/// Range lookup over the published sightings of the current tick.
///
/// `rebuild` is called once per tick with the full snapshot; `for_each_within`
/// may then be called concurrently from many worker threads. Visitors receive
/// the index of the sighting inside the slice passed to `rebuild`, along with
/// the squared distance from the query center. Implementations must visit
/// every sighting within the radius exactly once, in a deterministic order,
/// and must not visit anything outside it.
pub trait NeighborQuery: Send + Sync {
    /// Rebuild internal acceleration structures from this tick's snapshot.
    fn rebuild(&mut self, sightings: &[AgentSighting]) -> Result<(), SpatialError>;

    /// Visit every sighting within `radius_sq` of `center` admitted by `filter`.
    fn for_each_within(
        &self,
        center: Vec3,
        radius_sq: f32,
        filter: KindFilter,
        visitor: &mut dyn FnMut(usize, OrderedFloat<f32>),
    );
}

/// Obstacle raycast supplied by the host scene.
///
/// `direction` must be unit length. A hit is reported as the distance from
/// `origin` along `direction`, never exceeding `max_distance`; `None` means
/// the ray is clear for the whole probe length.
pub trait ObstacleProbe: Send + Sync {
    fn probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32>;
}

/// Axis-aligned periodic bounding volume the agents swim in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub min: Vec3,
    pub max: Vec3,
}

impl Volume {
    pub fn new(min: Vec3, max: Vec3) -> Result<Self, SpatialError> {
        let volume = Self { min, max };
        volume.validate()?;
        Ok(volume)
    }

    /// Checks the extent is finite and strictly positive on every axis.
    pub fn validate(&self) -> Result<(), SpatialError> {
        let extent = self.extent();
        if !extent.is_finite() {
            return Err(SpatialError::InvalidConfig("volume extent must be finite"));
        }
        if extent.min_element() <= 0.0 {
            return Err(SpatialError::InvalidConfig(
                "volume extent must be positive on every axis",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmplt(self.max).all()
    }

    /// Wraps `point` back into the volume, treating each axis as periodic.
    ///
    /// An agent overshooting `max.x` by epsilon reappears at `min.x` plus the
    /// same epsilon; the other coordinates are untouched.
    #[must_use]
    pub fn wrap(&self, point: Vec3) -> Vec3 {
        let extent = self.extent();
        Vec3::new(
            self.min.x + (point.x - self.min.x).rem_euclid(extent.x),
            self.min.y + (point.y - self.min.y).rem_euclid(extent.y),
            self.min.z + (point.z - self.min.z).rem_euclid(extent.z),
        )
    }
}

/// Uniform hash-grid neighbor index.
///
/// Sightings are bucketed by cell each rebuild; queries scan the cell range
/// covered by the search sphere and distance-check every candidate. Queries
/// iterate cells in a fixed axis order, so visit order is deterministic
/// regardless of hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridNeighborIndex {
    cell_size: f32,
    #[serde(skip)]
    buckets: HashMap<(i32, i32, i32), Vec<u32>>,
    #[serde(skip)]
    kinds: Vec<AgentKind>,
    #[serde(skip)]
    positions: Vec<Vec3>,
}

impl GridNeighborIndex {
    pub fn new(cell_size: f32) -> Result<Self, SpatialError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(SpatialError::InvalidConfig("grid cell size must be positive"));
        }
        Ok(Self {
            cell_size,
            buckets: HashMap::new(),
            kinds: Vec::new(),
            positions: Vec::new(),
        })
    }

    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn cell_of(&self, point: Vec3) -> (i32, i32, i32) {
        // Float-to-int casts saturate, so non-finite points land in a far
        // bucket and are rejected later by the exact distance check.
        (
            (point.x / self.cell_size).floor() as i32,
            (point.y / self.cell_size).floor() as i32,
            (point.z / self.cell_size).floor() as i32,
        )
    }
}

impl NeighborQuery for GridNeighborIndex {
    fn rebuild(&mut self, sightings: &[AgentSighting]) -> Result<(), SpatialError> {
        self.buckets.clear();
        self.kinds.clear();
        self.positions.clear();
        self.kinds.reserve(sightings.len());
        self.positions.reserve(sightings.len());
        for (idx, sighting) in sightings.iter().enumerate() {
            self.kinds.push(sighting.kind);
            self.positions.push(sighting.position);
            self.buckets
                .entry(self.cell_of(sighting.position))
                .or_default()
                .push(idx as u32);
        }
        Ok(())
    }

    fn for_each_within(
        &self,
        center: Vec3,
        radius_sq: f32,
        filter: KindFilter,
        visitor: &mut dyn FnMut(usize, OrderedFloat<f32>),
    ) {
        if !(radius_sq > 0.0) {
            return;
        }
        let radius = radius_sq.sqrt();
        let (x0, y0, z0) = self.cell_of(center - Vec3::splat(radius));
        let (x1, y1, z1) = self.cell_of(center + Vec3::splat(radius));
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                for cz in z0..=z1 {
                    let Some(bucket) = self.buckets.get(&(cx, cy, cz)) else {
                        continue;
                    };
                    for &idx in bucket {
                        let idx = idx as usize;
                        if !filter.admits(self.kinds[idx]) {
                            continue;
                        }
                        let dist_sq = self.positions[idx].distance_squared(center);
                        if dist_sq <= radius_sq {
                            visitor(idx, OrderedFloat(dist_sq));
                        }
                    }
                }
            }
        }
    }
}

/// A solid sphere obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

/// Obstacle field made of solid spheres, probed by exact ray-sphere tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SphereField {
    spheres: Vec<Sphere>,
}

impl SphereField {
    #[must_use]
    pub fn new(spheres: Vec<Sphere>) -> Self {
        Self { spheres }
    }

    #[must_use]
    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }
}

impl ObstacleProbe for SphereField {
    fn probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        if !direction.is_finite() || direction.length_squared() < 1.0e-9 {
            return None;
        }
        let mut nearest: Option<f32> = None;
        for sphere in &self.spheres {
            let to_center = sphere.center - origin;
            if to_center.length_squared() <= sphere.radius * sphere.radius {
                // Probing from inside a solid: immediate contact.
                return Some(0.0);
            }
            let along = to_center.dot(direction);
            if along < 0.0 {
                continue;
            }
            let closest_sq = to_center.length_squared() - along * along;
            let radius_sq = sphere.radius * sphere.radius;
            if closest_sq > radius_sq {
                continue;
            }
            let hit = along - (radius_sq - closest_sq).sqrt();
            if hit >= 0.0 && hit <= max_distance {
                nearest = Some(match nearest {
                    Some(best) => best.min(hit),
                    None => hit,
                });
            }
        }
        nearest
    }
}

/// Probe for scenes without obstacles; every ray is clear.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl ObstacleProbe for NullProbe {
    fn probe(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> Option<f32> {
        None
    }
}
