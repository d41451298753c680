//! World container and the staged tick pipeline.
//!
//! A tick runs in three stages: publish an immutable snapshot of every agent
//! and rebuild the neighbor index over it; compute per-agent outcomes in
//! parallel against that snapshot (steering decisions for the staggered
//! subset, integration for everyone); write the outcomes back and record a
//! summary. Nothing mutates shared state during the parallel stage, and all
//! randomness comes from per-agent streams, so runs are reproducible for a
//! fixed seed no matter how many threads execute them.

use std::collections::VecDeque;

use glam::Vec3;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use shoal_spatial::{
    AgentKind, AgentSighting, GridNeighborIndex, NeighborQuery, NullProbe, ObstacleProbe, Volume,
};

use crate::Tick;
use crate::agent::{AgentArena, AgentBody, AgentId, AgentMap, AgentMind, WanderState};
use crate::agent::{BehaviorState, BoidState, PredatorState};
use crate::avoidance::{self, ProbeReach};
use crate::config::{ConfigError, Profiles, ShoalConfig};
use crate::math;
use crate::motion;
use crate::states;
use crate::steering;
use crate::wander;

/// What happened during one call to [`FlockWorld::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvents {
    pub tick: Tick,
    /// Agents whose steering decision fell on this tick.
    pub decisions: usize,
    /// Decisions the obstacle probe deflected.
    pub deflections: usize,
}

/// Aggregate statistics captured at the end of each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    pub tick: Tick,
    pub boids: usize,
    pub predators: usize,
    pub mean_speed: f32,
    pub afraid: usize,
    pub alone: usize,
    pub hunting: usize,
    pub attacking: usize,
}

/// Per-agent result of the parallel stage, written back sequentially.
struct TickOutcome {
    position: Vec3,
    direction: Vec3,
    velocity: f32,
    mind: AgentMind,
    decided: bool,
    deflected: bool,
}

/// Read-only view shared by the parallel stage.
struct TickContext<'a> {
    profiles: &'a Profiles,
    query: &'a dyn NeighborQuery,
    probe: &'a dyn ObstacleProbe,
    sightings: &'a [AgentSighting],
    minds: &'a AgentMap<AgentMind>,
    tick: Tick,
    seed: u64,
    volume: Volume,
    dt: f32,
    interval: u32,
    bonus_interval: u64,
    bonus_min: f32,
    bonus_max: f32,
    decisions_allowed: bool,
}

/// The simulation world: agents, their minds, and the spatial collaborators.
pub struct FlockWorld {
    config: ShoalConfig,
    profiles: Profiles,
    seed: u64,
    tick: Tick,
    rng: SmallRng,
    next_serial: u64,
    arena: AgentArena,
    minds: AgentMap<AgentMind>,
    sightings: Vec<AgentSighting>,
    query: Box<dyn NeighborQuery>,
    probe: Box<dyn ObstacleProbe>,
    history: VecDeque<TickSummary>,
}

impl FlockWorld {
    /// World with the bundled grid index and no obstacles.
    pub fn new(config: ShoalConfig) -> Result<Self, ConfigError> {
        let cell = config
            .boid
            .vision_radius
            .max(config.predator.vision_radius);
        let query = GridNeighborIndex::new(cell)
            .map_err(|_| ConfigError::InvalidConfig("vision radius must be positive"))?;
        Self::with_collaborators(config, Box::new(query), Box::new(NullProbe))
    }

    /// World with caller-supplied spatial collaborators.
    pub fn with_collaborators(
        config: ShoalConfig,
        query: Box<dyn NeighborQuery>,
        probe: Box<dyn ObstacleProbe>,
    ) -> Result<Self, ConfigError> {
        let profiles = config.profiles()?;
        let seed = config.rng_seed.unwrap_or_else(rand::random);
        let history_capacity = config.history_capacity;
        Ok(Self {
            config,
            profiles,
            seed,
            tick: Tick::zero(),
            rng: SmallRng::seed_from_u64(seed),
            next_serial: 0,
            arena: AgentArena::default(),
            minds: AgentMap::new(),
            sightings: Vec::new(),
            query,
            probe,
            history: VecDeque::with_capacity(history_capacity),
        })
    }

    /// Spawns an agent at a random position with a random heading.
    pub fn spawn(&mut self, kind: AgentKind) -> AgentId {
        let volume = self.config.volume;
        let position = Vec3::new(
            self.rng.random_range(volume.min.x..volume.max.x),
            self.rng.random_range(volume.min.y..volume.max.y),
            self.rng.random_range(volume.min.z..volume.max.z),
        );
        let direction = math::random_unit_vector(&mut self.rng);
        self.spawn_at(kind, position, direction)
    }

    /// Spawns an agent with explicit kinematics. The position is wrapped into
    /// the volume and the direction normalized; agents start at rest in their
    /// kind's default state with a neutral speed bonus.
    pub fn spawn_at(&mut self, kind: AgentKind, position: Vec3, direction: Vec3) -> AgentId {
        let direction = direction.try_normalize().unwrap_or(math::FORWARD);
        let serial = self.next_serial;
        self.next_serial += 1;
        let id = self.arena.insert(AgentBody {
            kind,
            position: self.config.volume.wrap(position),
            direction,
            velocity: 0.0,
            serial,
        });
        self.minds.insert(id, AgentMind::new(kind, direction));
        id
    }

    /// Removes an agent; stale handles are a no-op.
    pub fn remove(&mut self, id: AgentId) -> Option<AgentBody> {
        self.minds.remove(id);
        self.arena.remove(id)
    }

    /// Advances the world by one tick.
    pub fn step(&mut self) -> TickEvents {
        let tick = self.tick.next();

        // Stage 1: publish the snapshot and rebuild the index over it.
        self.sightings.clear();
        {
            let columns = self.arena.columns();
            self.sightings.reserve(columns.len());
            for idx in 0..columns.len() {
                self.sightings.push(AgentSighting {
                    kind: columns.kinds()[idx],
                    position: columns.positions()[idx],
                    direction: columns.directions()[idx],
                });
            }
        }
        // A failed rebuild skips decisions for a tick; motion carries on.
        let decisions_allowed = self.query.rebuild(&self.sightings).is_ok();

        // Stage 2: per-agent outcomes, in parallel, against the snapshot.
        let ctx = TickContext {
            profiles: &self.profiles,
            query: &*self.query,
            probe: &*self.probe,
            sightings: &self.sightings,
            minds: &self.minds,
            tick,
            seed: self.seed,
            volume: self.config.volume,
            dt: self.config.dt,
            interval: self.config.decision_interval,
            bonus_interval: u64::from(self.config.bonus_interval),
            bonus_min: self.config.bonus_min,
            bonus_max: self.config.bonus_max,
            decisions_allowed,
        };
        let columns = self.arena.columns();
        let handles = self.arena.handles();
        let outcomes: Vec<TickOutcome> = (0..columns.len())
            .into_par_iter()
            .map(|idx| agent_outcome(&ctx, idx, columns.row(idx), handles[idx]))
            .collect();

        // Stage 3: write back, count events, record the summary.
        let mut decisions = 0;
        let mut deflections = 0;
        {
            let columns = self.arena.columns_mut();
            for (idx, outcome) in outcomes.iter().enumerate() {
                columns.set_kinematics(idx, outcome.position, outcome.direction, outcome.velocity);
            }
        }
        for (idx, outcome) in outcomes.into_iter().enumerate() {
            decisions += usize::from(outcome.decided);
            deflections += usize::from(outcome.deflected);
            self.minds.insert(self.arena.handles()[idx], outcome.mind);
        }

        let summary = self.summarize(tick);
        while self.history.len() >= self.config.history_capacity.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(summary);
        self.tick = tick;
        TickEvents {
            tick,
            decisions,
            deflections,
        }
    }

    fn summarize(&self, tick: Tick) -> TickSummary {
        let columns = self.arena.columns();
        let mut summary = TickSummary {
            tick,
            boids: 0,
            predators: 0,
            mean_speed: 0.0,
            afraid: 0,
            alone: 0,
            hunting: 0,
            attacking: 0,
        };
        let mut speed_sum = 0.0f32;
        for (idx, id) in self.arena.handles().iter().enumerate() {
            match columns.kinds()[idx] {
                AgentKind::Boid => summary.boids += 1,
                AgentKind::Predator => summary.predators += 1,
            }
            speed_sum += columns.velocities()[idx];
            match self.minds.get(*id).map(|mind| mind.state) {
                Some(BehaviorState::Boid(BoidState::Afraid)) => summary.afraid += 1,
                Some(BehaviorState::Boid(BoidState::Alone)) => summary.alone += 1,
                Some(BehaviorState::Predator(PredatorState::Hunting)) => summary.hunting += 1,
                Some(BehaviorState::Predator(PredatorState::Attacking)) => summary.attacking += 1,
                _ => {}
            }
        }
        if !columns.is_empty() {
            summary.mean_speed = speed_sum / columns.len() as f32;
        }
        summary
    }

    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Seed all randomness in this world derives from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn config(&self) -> &ShoalConfig {
        &self.config
    }

    /// Mutable configuration access for hot edits. Derived values are only
    /// refreshed by [`FlockWorld::reload_profiles`].
    pub fn config_mut(&mut self) -> &mut ShoalConfig {
        &mut self.config
    }

    /// Revalidates the configuration and swaps in freshly derived profiles.
    /// On error the previous profiles stay active.
    pub fn reload_profiles(&mut self) -> Result<(), ConfigError> {
        self.profiles = self.config.profiles()?;
        Ok(())
    }

    #[must_use]
    pub const fn profiles(&self) -> &Profiles {
        &self.profiles
    }

    #[must_use]
    pub const fn agents(&self) -> &AgentArena {
        &self.arena
    }

    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.arena.len()
    }

    /// `(boids, predators)` currently alive.
    #[must_use]
    pub fn counts_by_kind(&self) -> (usize, usize) {
        let predators = self
            .arena
            .columns()
            .kinds()
            .iter()
            .filter(|kind| kind.is_predator())
            .count();
        (self.arena.len() - predators, predators)
    }

    #[must_use]
    pub fn mind(&self, id: AgentId) -> Option<&AgentMind> {
        self.minds.get(id)
    }

    /// Retained summaries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &TickSummary> + '_ {
        self.history.iter()
    }

    #[must_use]
    pub fn latest_summary(&self) -> Option<&TickSummary> {
        self.history.back()
    }
}

/// One agent's tick: a steering decision when the stagger says so, then one
/// tick of integration. `idx` is the agent's dense row, which is also its
/// index into the published sightings.
fn agent_outcome(ctx: &TickContext<'_>, idx: usize, body: AgentBody, id: AgentId) -> TickOutcome {
    let AgentBody {
        kind,
        position,
        direction,
        velocity,
        serial,
    } = body;

    let Some(mind) = ctx.minds.get(id) else {
        // A row without a mind should not exist; carry it through inert.
        return TickOutcome {
            position,
            direction,
            velocity,
            mind: AgentMind::new(kind, direction),
            decided: false,
            deflected: false,
        };
    };
    let mut mind = mind.clone();
    let mut rng = math::decision_rng(ctx.seed, serial, ctx.tick.0);
    let mut decided = false;
    let mut deflected = false;

    if ctx.decisions_allowed && motion::is_decision_tick(ctx.tick, serial, ctx.interval) {
        decided = true;
        let (decision, wander_params, avoidance_params, anchor) = match kind {
            AgentKind::Boid => (
                steering::blend_boid(
                    &ctx.profiles.boid,
                    idx,
                    position,
                    direction,
                    ctx.sightings,
                    ctx.query,
                ),
                &ctx.profiles.boid.wander,
                &ctx.profiles.boid.avoidance,
                math::random_unit_vector(&mut rng),
            ),
            AgentKind::Predator => (
                steering::blend_predator(
                    &ctx.profiles.predator,
                    idx,
                    position,
                    direction,
                    ctx.sightings,
                    ctx.query,
                ),
                &ctx.profiles.predator.wander,
                &ctx.profiles.predator.avoidance,
                math::WORLD_UP,
            ),
        };

        mind.state = states::advance(mind.state, decision.pressure, ctx.profiles, &mut rng);

        let reach = ProbeReach::for_velocity(avoidance_params, velocity);
        let proposed = match decision.direction {
            Some(dir) => dir,
            None => wander::wander_direction(
                wander_params,
                &mut mind.wander,
                direction,
                position,
                reach,
                ctx.probe,
                &mut rng,
            ),
        };
        match avoidance::deflect(
            proposed,
            position,
            reach,
            anchor,
            avoidance_params.vertical_preference,
            ctx.probe,
        ) {
            Some(dir) => {
                deflected = true;
                // An interrupted walk starts over after the detour.
                mind.wander = WanderState::default();
                motion::retarget_orientation(&mut mind, ctx.interval, dir);
            }
            None => motion::retarget_orientation(&mut mind, ctx.interval, proposed),
        }
    }

    // Integration, every tick.
    mind.ticks_since_decision = mind.ticks_since_decision.saturating_add(1);
    let new_direction = math::direction_of(motion::interpolated_orientation(&mind, ctx.interval));
    if (ctx.tick.0 + serial).is_multiple_of(ctx.bonus_interval) {
        mind.speed_bonus = rng.random_range(ctx.bonus_min..=ctx.bonus_max);
    }
    let target = mind.state.target_velocity(ctx.profiles) * mind.speed_bonus;
    let acceleration = mind.state.acceleration(ctx.profiles);
    let new_velocity = motion::advance_velocity(velocity, target, acceleration, ctx.dt);
    let new_position = motion::displace(position, new_direction, new_velocity, ctx.dt, &ctx.volume);

    TickOutcome {
        position: new_position,
        direction: new_direction,
        velocity: new_velocity,
        mind,
        decided,
        deflected,
    }
}
