/*
 * Fish Flocking Simulation - Module Definitions
 *
 * This file defines the module structure for the aquarium simulation.
 * The simulation core (agents, forces, flocks) has no rendering
 * dependencies; the render bridge turns flock state into instance data and
 * the app/ui modules drive everything from a nannou window.
 */

// Re-export key components for easier access
pub use agent::{Agent, AgentSnapshot};
pub use aquarium::{Aquarium, Flock, RebuildStatus};
pub use camera::Camera;
pub use config::{AquariumConfig, PopulationConfig, SpeciesGroup};
pub use debug::RenderStats;
pub use error::{FlockError, RenderError};
pub use flock::FlockingEngine;
pub use lod::QualityTier;
pub use params::{BehaviorClass, FlockBounds, FlockParams};
pub use renderer::{RenderBridge, RenderMode};
pub use species::{SpeciesCatalog, Variant};

// Math types used across the public API
pub use glam;

// Define modules
pub mod agent;
pub mod animation;
pub mod app;
pub mod aquarium;
pub mod camera;
pub mod config;
pub mod culling;
pub mod debug;
pub mod error;
pub mod feeding;
pub mod flock;
pub mod input;
pub mod lod;
pub mod params;
pub mod physics;
pub mod renderer;
pub mod species;
pub mod ui;

// Default population when no configuration is given
pub const DEFAULT_POPULATION: usize = 120;
