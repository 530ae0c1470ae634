/*
 * Agent Module
 *
 * This module defines the Agent struct: one simulated fish with its
 * kinematic state and the two steering primitives every behavior is
 * built from:
 * 1. Seek: steer towards a target point
 * 2. Flee: steer away from a target point
 *
 * Forces accumulate into `acceleration` and are integrated once per tick.
 */

use glam::Vec3;

// Agents smaller than this are prey, larger than PREDATOR_SIZE are predators
pub const PREY_SIZE: f32 = 0.9;
pub const PREDATOR_SIZE: f32 = 1.1;

pub const MIN_ENERGY: f32 = 0.3;
pub const MAX_ENERGY: f32 = 1.0;

// Clamp the length of a vector without ever normalizing a zero vector
#[inline]
pub fn limit(v: Vec3, max: f32) -> Vec3 {
    let length_squared = v.length_squared();
    if length_squared > max * max && length_squared > 0.0 {
        v * (max / length_squared.sqrt())
    } else {
        v
    }
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub max_speed: f32,
    pub nominal_speed: f32,
    pub max_force: f32,
    pub energy: f32,
    pub size: f32,
    pub is_leader: bool,
    pub idle_timer: f32,
    // Cosmetic phase offset, only read by the render bridge
    pub phase: f32,
}

/// Read-only view of an agent handed to consumers outside the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl Agent {
    pub fn new(position: Vec3, velocity: Vec3, max_speed: f32, max_force: f32) -> Self {
        Self {
            position,
            velocity: limit(velocity, max_speed),
            acceleration: Vec3::ZERO,
            max_speed,
            nominal_speed: max_speed,
            max_force,
            energy: MAX_ENERGY,
            size: 1.0,
            is_leader: false,
            idle_timer: 0.0,
            phase: 0.0,
        }
    }

    // Apply a force to the agent
    pub fn apply_force(&mut self, force: Vec3) {
        self.acceleration += force;
    }

    // Steering force towards a target (Reynolds: steering = desired - velocity)
    pub fn seek(&self, target: Vec3) -> Vec3 {
        let desired = (target - self.position).normalize_or_zero() * self.max_speed;
        if desired == Vec3::ZERO {
            return Vec3::ZERO;
        }
        limit(desired - self.velocity, self.max_force)
    }

    // Steering force away from a target
    pub fn flee(&self, target: Vec3) -> Vec3 {
        let desired = (self.position - target).normalize_or_zero() * self.max_speed;
        if desired == Vec3::ZERO {
            return Vec3::ZERO;
        }
        limit(desired - self.velocity, self.max_force)
    }

    // Integrate accumulated forces into velocity and position
    pub fn update(&mut self) {
        self.velocity = limit(self.velocity + self.acceleration, self.max_speed);
        self.position += self.velocity;
        self.acceleration = Vec3::ZERO;
    }

    // Zero all motion but keep position, energy and role
    pub fn halt(&mut self) {
        self.velocity = Vec3::ZERO;
        self.acceleration = Vec3::ZERO;
    }

    pub fn gain_energy(&mut self, amount: f32) {
        self.energy = (self.energy + amount).clamp(MIN_ENERGY, MAX_ENERGY);
    }

    pub fn is_prey(&self) -> bool {
        self.size < PREY_SIZE
    }

    pub fn is_predator(&self) -> bool {
        self.size > PREDATOR_SIZE
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            position: self.position,
            velocity: self.velocity,
        }
    }
}
