/*
 * Flocking Engine Module
 *
 * The FlockingEngine owns one population of fish and the feeding points
 * around them, and advances the whole flock by one tick per frame.
 *
 * Agents are processed in index order and each one is integrated as soon as
 * its forces are summed, so agent i+1 already sees where agent i moved to
 * during the same tick. Neighbor search is brute force over the flock.
 */

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::agent::{Agent, AgentSnapshot, MAX_ENERGY, MIN_ENERGY};
use crate::feeding::{self, FeedingPoint};
use crate::params::{FlockBounds, FlockParams};
use crate::physics::{self, SteeringForces};

pub const ENERGY_DECAY_RATE: f32 = 0.01;
pub const PREDATOR_BOOST: f32 = 1.5;
pub const SPEED_RELAX: f32 = 0.1;
pub const IDLE_DAMPING: f32 = 0.3;
pub const IDLE_SPEED_CAP: f32 = 0.2;
pub const FOOD_DAMPING: f32 = 0.7;

// One leader per ten fish, at least one for any non-empty flock
pub fn leader_count(population: usize) -> usize {
    population.div_ceil(10)
}

pub struct FlockingEngine {
    agents: Vec<Agent>,
    feeding_points: Vec<FeedingPoint>,
    bounds: FlockBounds,
    params: FlockParams,
    elapsed: f32,
    motion_enabled: bool,
    rng: StdRng,
    // Scratch buffer reused by every neighbor query
    neighbors: Vec<usize>,
}

impl FlockingEngine {
    pub fn new(population: usize, bounds: FlockBounds) -> Self {
        Self::with_params(population, bounds, FlockParams::default(), 1.0, None)
    }

    pub fn with_params(
        population: usize,
        bounds: FlockBounds,
        params: FlockParams,
        size_scale: f32,
        seed: Option<u64>,
    ) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let leaders = leader_count(population);
        let agents = (0..population)
            .map(|i| {
                let mut agent = spawn_agent(&mut rng, &bounds, &params, size_scale);
                agent.is_leader = i < leaders;
                agent
            })
            .collect();

        log::debug!("spawned flock of {population} ({leaders} leaders)");

        Self::assemble(agents, bounds, params, rng)
    }

    // Build an engine around agents placed by the caller
    pub fn from_agents(agents: Vec<Agent>, bounds: FlockBounds, params: FlockParams, seed: u64) -> Self {
        Self::assemble(agents, bounds, params, StdRng::seed_from_u64(seed))
    }

    fn assemble(agents: Vec<Agent>, bounds: FlockBounds, params: FlockParams, rng: StdRng) -> Self {
        Self {
            agents,
            feeding_points: Vec::new(),
            bounds,
            params,
            elapsed: 0.0,
            motion_enabled: true,
            rng,
            neighbors: Vec::new(),
        }
    }

    // Advance the flock by one tick
    pub fn update(&mut self, dt: f32) {
        if !self.motion_enabled {
            return;
        }

        let dt = dt.max(0.0);
        self.elapsed += dt;

        let expired = feeding::expire(&mut self.feeding_points, self.elapsed);
        if expired > 0 {
            log::debug!("{expired} feeding point(s) expired at t={:.1}", self.elapsed);
        }
        if let Some(point) = feeding::maybe_spawn(&self.feeding_points, &self.bounds, self.elapsed, &mut self.rng) {
            log::debug!("feeding point appeared at {:?}", point.position);
            self.feeding_points.push(point);
        }

        for i in 0..self.agents.len() {
            self.step_agent(i, dt);
        }
    }

    fn step_agent(&mut self, i: usize, dt: f32) {
        let mut neighbors = std::mem::take(&mut self.neighbors);
        physics::find_neighbors(&self.agents, i, self.params.neighbor_radius, &mut neighbors);

        // Read phase: every force comes from the flock as it is right now
        let agent = &self.agents[i];
        let (feeding, energy_gain) = physics::feeding_attraction(agent, &self.feeding_points);
        let threat = physics::predator_avoidance(&self.agents, i);
        let forces = SteeringForces {
            alignment: physics::alignment(agent, &self.agents, &neighbors),
            cohesion: physics::cohesion(agent, &self.agents, &neighbors),
            separation: physics::separation(agent, &self.agents, &neighbors),
            boundary: physics::boundary_avoidance(agent.position, &self.bounds),
            feeding,
            predator: threat.unwrap_or(Vec3::ZERO),
            formation: physics::formation(agent, &self.agents, &neighbors, self.elapsed),
        };
        let force = forces.combine(agent.energy, &self.params);
        let idle = physics::wants_to_idle(agent);
        let calm = physics::near_food(agent, &self.feeding_points);
        self.neighbors = neighbors;

        // Write phase
        let agent = &mut self.agents[i];
        agent.gain_energy(energy_gain);
        agent.energy = (agent.energy - ENERGY_DECAY_RATE * dt).clamp(MIN_ENERGY, MAX_ENERGY);
        agent.idle_timer += dt;

        // The boost relaxes every tick, threat or not
        if threat.is_some() {
            agent.max_speed = agent.nominal_speed * PREDATOR_BOOST;
        }
        agent.max_speed += (agent.nominal_speed - agent.max_speed) * SPEED_RELAX;

        agent.apply_force(force);
        if idle {
            agent.velocity *= IDLE_DAMPING;
            agent.max_speed = agent.max_speed.min(agent.nominal_speed * IDLE_SPEED_CAP);
        }
        if calm {
            agent.velocity *= FOOD_DAMPING;
        }

        agent.update();
    }

    // Soft pause: disabling zeroes all motion but keeps positions and energy
    pub fn set_motion_enabled(&mut self, enabled: bool) {
        self.motion_enabled = enabled;
        if !enabled {
            for agent in &mut self.agents {
                agent.halt();
            }
        }
    }

    pub fn motion_enabled(&self) -> bool {
        self.motion_enabled
    }

    pub fn set_alignment(&mut self, weight: f32) {
        self.params.alignment = weight.max(0.0);
    }

    pub fn set_cohesion(&mut self, weight: f32) {
        self.params.cohesion = weight.max(0.0);
    }

    pub fn set_separation(&mut self, weight: f32) {
        self.params.separation = weight.max(0.0);
    }

    pub fn spawn_feeding_point(&mut self, position: Vec3, lifetime: f32) {
        self.feeding_points.push(FeedingPoint::new(position, self.elapsed, lifetime));
    }

    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents.iter().map(Agent::snapshot).collect()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn feeding_points(&self) -> &[FeedingPoint] {
        &self.feeding_points
    }

    pub fn params(&self) -> &FlockParams {
        &self.params
    }

    pub fn bounds(&self) -> &FlockBounds {
        &self.bounds
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn average_energy(&self) -> f32 {
        if self.agents.is_empty() {
            return 0.0;
        }
        self.agents.iter().map(|a| a.energy).sum::<f32>() / self.agents.len() as f32
    }
}

fn spawn_agent(rng: &mut StdRng, bounds: &FlockBounds, params: &FlockParams, size_scale: f32) -> Agent {
    // Keep fresh fish out of the boundary margin when the tank is big enough
    let inset = (bounds.size() * 0.5).min(Vec3::splat(physics::BOUNDARY_MARGIN));
    let lo = bounds.min + inset;
    let hi = bounds.max - inset;
    let position = Vec3::new(
        lo.x + (hi.x - lo.x) * rng.gen::<f32>(),
        lo.y + (hi.y - lo.y) * rng.gen::<f32>(),
        lo.z + (hi.z - lo.z) * rng.gen::<f32>(),
    );

    let heading = Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-0.2..0.2), rng.gen_range(-1.0..1.0));
    let velocity = heading.normalize_or_zero() * params.max_speed * 0.5;

    let mut agent = Agent::new(position, velocity, params.max_speed, params.max_force);
    agent.size = size_scale * rng.gen_range(0.8..1.2);
    agent.energy = rng.gen_range(0.6..=MAX_ENERGY);
    agent.idle_timer = rng.gen_range(0.0..100.0);
    agent.phase = rng.gen_range(0.0..std::f32::consts::TAU);
    agent
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tank() -> FlockBounds {
        FlockBounds::new(Vec3::splat(-10.0), Vec3::splat(10.0))
    }

    #[test]
    fn invariants_hold_over_many_ticks() {
        let mut engine = FlockingEngine::with_params(60, tank(), FlockParams::default(), 1.0, Some(3));
        engine.spawn_feeding_point(Vec3::new(0.0, 4.0, 0.0), 12.0);

        for _ in 0..500 {
            engine.update(1.0 / 60.0);
            for agent in engine.agents() {
                assert!(agent.velocity.length() <= agent.max_speed + 1e-5);
                assert_eq!(agent.acceleration, Vec3::ZERO);
                assert!((MIN_ENERGY..=MAX_ENERGY).contains(&agent.energy));
                assert!(agent.position.is_finite());
            }
        }
    }

    #[test]
    fn first_tenth_of_the_flock_leads() {
        let engine = FlockingEngine::with_params(25, tank(), FlockParams::default(), 1.0, Some(1));
        let leaders: Vec<bool> = engine.agents().iter().map(|a| a.is_leader).collect();
        assert_eq!(leaders.iter().filter(|l| **l).count(), 3);
        assert!(leaders[..3].iter().all(|l| *l));
    }

    #[test]
    fn eating_adds_one_tenth_energy_before_decay() {
        let dt = 1.0 / 60.0;
        let mut agent = Agent::new(Vec3::new(0.0, 4.2, 0.0), Vec3::ZERO, 0.05, 0.003);
        agent.energy = 0.5;
        agent.idle_timer = 0.0;
        let mut engine = FlockingEngine::from_agents(vec![agent], tank(), FlockParams::default(), 9);
        engine.spawn_feeding_point(Vec3::new(0.0, 4.0, 0.0), 12.0);

        engine.update(dt);
        let expected = 0.5 + physics::EATING_ENERGY - ENERGY_DECAY_RATE * dt;
        assert!((engine.agents()[0].energy - expected).abs() < 1e-6);

        // Without elapsed time the gain is exactly one tenth
        let mut agent = Agent::new(Vec3::new(0.0, 4.2, 0.0), Vec3::ZERO, 0.05, 0.003);
        agent.energy = 0.5;
        let mut engine = FlockingEngine::from_agents(vec![agent], tank(), FlockParams::default(), 9);
        engine.spawn_feeding_point(Vec3::new(0.0, 4.0, 0.0), 12.0);
        engine.update(0.0);
        assert!((engine.agents()[0].energy - 0.6).abs() < 1e-6);

        // Saturates at the cap, then decays
        let mut full = Agent::new(Vec3::new(0.0, 4.0, 0.1), Vec3::ZERO, 0.05, 0.003);
        full.energy = 0.95;
        let mut engine = FlockingEngine::from_agents(vec![full], tank(), FlockParams::default(), 9);
        engine.spawn_feeding_point(Vec3::new(0.0, 4.0, 0.0), 12.0);
        engine.update(dt);
        assert!((engine.agents()[0].energy - (MAX_ENERGY - ENERGY_DECAY_RATE * dt)).abs() < 1e-6);
    }

    #[test]
    fn energy_decays_to_the_floor() {
        let mut agent = Agent::new(Vec3::ZERO, Vec3::ZERO, 0.05, 0.003);
        agent.energy = 0.4;
        let mut engine = FlockingEngine::from_agents(vec![agent], tank(), FlockParams::default(), 2);

        engine.update(5.0);
        assert!((engine.agents()[0].energy - 0.35).abs() < 1e-5);
        engine.update(100.0);
        assert_eq!(engine.agents()[0].energy, MIN_ENERGY);
    }

    #[test]
    fn threatened_prey_get_a_decaying_speed_boost() {
        let mut prey = Agent::new(Vec3::ZERO, Vec3::ZERO, 0.05, 0.003);
        prey.size = 0.7;
        let mut predator = Agent::new(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, 0.05, 0.003);
        predator.size = 1.4;
        let mut engine = FlockingEngine::from_agents(vec![prey, predator], tank(), FlockParams::default(), 4);

        // Boosted to 1.5x, then relaxed by a tenth of the gap in the same tick
        let relaxed = 0.05 * PREDATOR_BOOST + (0.05 - 0.05 * PREDATOR_BOOST) * SPEED_RELAX;
        for _ in 0..5 {
            engine.update(0.0);
            assert!((engine.agents()[0].max_speed - relaxed).abs() < 1e-6);
        }
        assert!(relaxed < 0.05 * PREDATOR_BOOST);
        assert!(engine.agents()[0].velocity.x < 0.0);
    }

    #[test]
    fn tired_fish_idle_with_damped_and_capped_speed() {
        let mut agent = Agent::new(Vec3::ZERO, Vec3::new(0.05, 0.0, 0.0), 0.05, 0.003);
        agent.energy = 0.4;
        // sin(idle_timer * 0.1) peaks here
        agent.idle_timer = std::f32::consts::FRAC_PI_2 * 10.0;
        assert!(physics::wants_to_idle(&agent));
        let mut engine = FlockingEngine::from_agents(vec![agent], tank(), FlockParams::default(), 6);

        engine.update(0.0);
        let agent = &engine.agents()[0];
        assert!((agent.max_speed - 0.05 * IDLE_SPEED_CAP).abs() < 1e-6);
        assert!((agent.velocity.length() - 0.05 * IDLE_SPEED_CAP).abs() < 1e-6);
    }

    #[test]
    fn fish_slow_down_near_food() {
        let dt = 1.0 / 60.0;
        let food = Vec3::new(0.0, 4.0, 0.0);
        // Heading straight at the food at full speed, so the seek term is zero
        let close = Agent::new(Vec3::new(-1.5, 4.0, 0.0), Vec3::new(0.05, 0.0, 0.0), 0.05, 0.003);
        let mut engine = FlockingEngine::from_agents(vec![close], tank(), FlockParams::default(), 8);
        engine.spawn_feeding_point(food, 12.0);
        engine.update(dt);
        assert!((engine.agents()[0].velocity.length() - 0.05 * FOOD_DAMPING).abs() < 1e-6);

        let far = Agent::new(Vec3::new(-3.0, 4.0, 0.0), Vec3::new(0.05, 0.0, 0.0), 0.05, 0.003);
        let mut engine = FlockingEngine::from_agents(vec![far], tank(), FlockParams::default(), 8);
        engine.spawn_feeding_point(food, 12.0);
        engine.update(dt);
        assert!((engine.agents()[0].velocity.length() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn disabling_motion_halts_the_flock() {
        let mut engine = FlockingEngine::with_params(20, tank(), FlockParams::default(), 1.0, Some(5));
        for _ in 0..10 {
            engine.update(0.016);
        }
        let positions: Vec<Vec3> = engine.agents().iter().map(|a| a.position).collect();

        engine.set_motion_enabled(false);
        engine.update(0.016);

        assert!(engine.agents().iter().all(|a| a.velocity == Vec3::ZERO && a.acceleration == Vec3::ZERO));
        let after: Vec<Vec3> = engine.agents().iter().map(|a| a.position).collect();
        assert_eq!(positions, after);
    }

    #[test]
    fn empty_flock_is_a_no_op() {
        let mut engine = FlockingEngine::new(0, tank());
        engine.update(0.016);
        assert!(engine.is_empty());
        assert!(engine.snapshots().is_empty());
        assert_eq!(engine.average_energy(), 0.0);
    }

    #[test]
    fn weight_setters_reject_negative_values() {
        let mut engine = FlockingEngine::new(1, tank());
        engine.set_alignment(-1.0);
        engine.set_cohesion(2.5);
        engine.set_separation(0.5);
        assert_eq!(engine.params().alignment, 0.0);
        assert_eq!(engine.params().cohesion, 2.5);
        assert_eq!(engine.params().separation, 0.5);
    }
}
