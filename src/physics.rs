/*
 * Physics Module
 *
 * This module holds the steering rules applied to every fish each tick:
 * 1. Alignment, cohesion and separation against neighbors
 * 2. Soft boundary avoidance against the six faces of the tank
 * 3. Attraction to feeding points
 * 4. Predator avoidance for prey-sized fish
 * 5. Leader wander and follower formation
 *
 * Every rule is a pure function of the current agent state and returns a
 * force; the engine in flock.rs weights, sums and integrates them. Empty
 * neighbor sets and zero-length vectors short-circuit to Vec3::ZERO.
 */

use glam::Vec3;

use crate::agent::{limit, Agent};
use crate::feeding::FeedingPoint;
use crate::params::{FlockBounds, FlockParams};

pub const SEPARATION_DISTANCE: f32 = 1.0;
pub const BOUNDARY_MARGIN: f32 = 2.0;
pub const TURN_FORCE: f32 = 2.0;
pub const FEEDING_RADIUS: f32 = 5.0;
pub const EATING_RADIUS: f32 = 0.5;
pub const EATING_ENERGY: f32 = 0.1;
pub const FOOD_CALM_RADIUS: f32 = 2.0;
pub const THREAT_RANGE_FACTOR: f32 = 3.0;
pub const FLEE_STRENGTH: f32 = 4.0;

// Weights applied when combining the forces
pub const BOUNDARY_WEIGHT: f32 = 1.5;
pub const PREDATOR_WEIGHT: f32 = 3.0;
pub const FORMATION_WEIGHT: f32 = 0.5;

// Follower slot relative to its leader
const FORMATION_BEHIND: f32 = 1.5;
const FORMATION_SIDE: f32 = 0.8;

const IDLE_ENERGY: f32 = 0.5;
const IDLE_THRESHOLD: f32 = 0.7;

// Collect indices of every other agent within radius of agents[index]
pub fn find_neighbors(agents: &[Agent], index: usize, radius: f32, neighbors: &mut Vec<usize>) {
    neighbors.clear();
    let position = agents[index].position;
    let radius_sq = radius * radius;

    for (j, other) in agents.iter().enumerate() {
        if j != index && position.distance_squared(other.position) < radius_sq {
            neighbors.push(j);
        }
    }
}

// Steer towards the average heading of neighbors
pub fn alignment(agent: &Agent, agents: &[Agent], neighbors: &[usize]) -> Vec3 {
    if neighbors.is_empty() {
        return Vec3::ZERO;
    }

    let heading = neighbors.iter().fold(Vec3::ZERO, |acc, &j| acc + agents[j].velocity);
    let desired = heading.normalize_or_zero() * agent.max_speed;
    if desired == Vec3::ZERO {
        return Vec3::ZERO;
    }

    limit(desired - agent.velocity, agent.max_force)
}

// Steer towards the average position of neighbors
pub fn cohesion(agent: &Agent, agents: &[Agent], neighbors: &[usize]) -> Vec3 {
    if neighbors.is_empty() {
        return Vec3::ZERO;
    }

    let center = neighbors.iter().fold(Vec3::ZERO, |acc, &j| acc + agents[j].position) / neighbors.len() as f32;
    agent.seek(center)
}

// Push away from neighbors that are too close, closer ones weigh more
pub fn separation(agent: &Agent, agents: &[Agent], neighbors: &[usize]) -> Vec3 {
    let mut repulsion = Vec3::ZERO;

    for &j in neighbors {
        let offset = agent.position - agents[j].position;
        let d = offset.length();
        if d > 0.0 && d < SEPARATION_DISTANCE {
            repulsion += offset / d / d;
        }
    }

    let desired = repulsion.normalize_or_zero() * agent.max_speed;
    if desired == Vec3::ZERO {
        return Vec3::ZERO;
    }

    limit(desired - agent.velocity, agent.max_force)
}

// Soft walls: each face closer than the margin pushes inwards, corners add up
pub fn boundary_avoidance(position: Vec3, bounds: &FlockBounds) -> Vec3 {
    let mut steering = Vec3::ZERO;

    for axis in 0..3 {
        let to_min = position[axis] - bounds.min[axis];
        let to_max = bounds.max[axis] - position[axis];

        if to_min < BOUNDARY_MARGIN {
            steering[axis] += (BOUNDARY_MARGIN - to_min) / BOUNDARY_MARGIN * TURN_FORCE;
        }
        if to_max < BOUNDARY_MARGIN {
            steering[axis] -= (BOUNDARY_MARGIN - to_max) / BOUNDARY_MARGIN * TURN_FORCE;
        }
    }

    steering
}

// Attraction to nearby food plus the energy gained from food within reach
pub fn feeding_attraction(agent: &Agent, points: &[FeedingPoint]) -> (Vec3, f32) {
    let mut steering = Vec3::ZERO;
    let mut energy_gain = 0.0;

    for point in points {
        let d = agent.position.distance(point.position);
        if d < FEEDING_RADIUS {
            steering += agent.seek(point.position) * (3.0 / (d + 1.0));
            if d < EATING_RADIUS {
                energy_gain += EATING_ENERGY;
            }
        }
    }

    (steering, energy_gain)
}

// Prey flee from predators within three body lengths; None when unthreatened
pub fn predator_avoidance(agents: &[Agent], index: usize) -> Option<Vec3> {
    let agent = &agents[index];
    if !agent.is_prey() {
        return None;
    }

    let radius = THREAT_RANGE_FACTOR * agent.size;
    let mut steering = Vec3::ZERO;
    let mut threatened = false;

    for (j, other) in agents.iter().enumerate() {
        if j == index || !other.is_predator() {
            continue;
        }
        let d = agent.position.distance(other.position);
        if d < radius {
            let urgency = (radius - d) / radius;
            steering += agent.flee(other.position) * urgency * FLEE_STRENGTH;
            threatened = true;
        }
    }

    threatened.then_some(steering)
}

// Low amplitude meander for leaders, no target involved
pub fn leader_wander(agent: &Agent, time: f32) -> Vec3 {
    let p = agent.position;
    Vec3::new(
        (time * 0.5 + p.z * 0.1).sin(),
        (time * 0.3 + p.x * 0.1).sin() * 0.3,
        (time * 0.4 + p.y * 0.1 + p.x * 0.05).cos(),
    ) * agent.max_force
        * 0.5
}

// Seek a slot behind and beside the nearest leader among neighbors
pub fn follow_leader(agent: &Agent, agents: &[Agent], neighbors: &[usize]) -> Vec3 {
    let leader = neighbors
        .iter()
        .map(|&j| &agents[j])
        .filter(|other| other.is_leader)
        .min_by(|a, b| {
            agent
                .position
                .distance_squared(a.position)
                .total_cmp(&agent.position.distance_squared(b.position))
        });

    let Some(leader) = leader else {
        return Vec3::ZERO;
    };

    let forward = leader.velocity.normalize_or_zero();
    let right = match Vec3::Y.cross(forward).normalize_or_zero() {
        v if v == Vec3::ZERO => Vec3::X,
        v => v,
    };
    let side = if agent.position.x - leader.position.x >= 0.0 {
        FORMATION_SIDE
    } else {
        -FORMATION_SIDE
    };

    let slot = leader.position - forward * FORMATION_BEHIND + right * side;
    agent.seek(slot)
}

pub fn formation(agent: &Agent, agents: &[Agent], neighbors: &[usize], time: f32) -> Vec3 {
    if agent.is_leader {
        leader_wander(agent, time)
    } else {
        follow_leader(agent, agents, neighbors)
    }
}

// Tired fish sometimes hang in place; the sine keeps it deterministic per fish
pub fn wants_to_idle(agent: &Agent) -> bool {
    if agent.energy >= IDLE_ENERGY {
        return false;
    }
    let p = agent.position;
    (agent.idle_timer * 0.1 + p.x * 0.3 + p.z * 0.2).sin() > IDLE_THRESHOLD
}

pub fn near_food(agent: &Agent, points: &[FeedingPoint]) -> bool {
    points
        .iter()
        .any(|p| agent.position.distance_squared(p.position) < FOOD_CALM_RADIUS * FOOD_CALM_RADIUS)
}

// Raw forces for one agent in one tick, before weighting
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringForces {
    pub alignment: Vec3,
    pub cohesion: Vec3,
    pub separation: Vec3,
    pub boundary: Vec3,
    pub feeding: Vec3,
    pub predator: Vec3,
    pub formation: Vec3,
}

impl SteeringForces {
    // Weighted sum; flocking urges fade with energy, hunger grows as it drops
    pub fn combine(&self, energy: f32, params: &FlockParams) -> Vec3 {
        self.alignment * params.alignment * energy
            + self.cohesion * params.cohesion * energy
            + self.separation * params.separation
            + self.boundary * BOUNDARY_WEIGHT
            + self.feeding * (2.0 * (2.0 - energy))
            + self.predator * PREDATOR_WEIGHT
            + self.formation * FORMATION_WEIGHT
    }
}
