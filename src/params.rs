/*
 * Flock Parameters Module
 *
 * This module defines the tunable parameters of a flock: the bounding box
 * the fish try to stay inside, the per-flock steering weights and the
 * behavior presets those weights come from. It also provides the control
 * state the driver edits each frame, with snapshot based change detection
 * so a rebuild only happens when the group list actually changed.
 */

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::SpeciesGroup;
use crate::lod::QualityTier;

// Axis-aligned box the flock steers to remain within
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlockBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl FlockBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

impl Default for FlockBounds {
    fn default() -> Self {
        Self::new(Vec3::new(-20.0, -8.0, -20.0), Vec3::new(20.0, 8.0, 20.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorClass {
    Schooling,
    Territorial,
    Solitary,
}

// Steering weights shared by every agent of one flock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlockParams {
    pub alignment: f32,
    pub cohesion: f32,
    pub separation: f32,
    pub max_speed: f32,
    pub max_force: f32,
    pub neighbor_radius: f32,
}

impl Default for FlockParams {
    fn default() -> Self {
        Self {
            alignment: 1.0,
            cohesion: 1.0,
            separation: 1.0,
            max_speed: 0.05,
            max_force: 0.003,
            neighbor_radius: 2.0,
        }
    }
}

impl FlockParams {
    // Build the weights for a behavior class, scaling speed by the variant multiplier
    pub fn from_behavior(behavior: BehaviorClass, speed_multiplier: f32) -> Self {
        let (alignment, separation, cohesion) = match behavior {
            BehaviorClass::Schooling => (0.8, 0.5, 0.3),
            BehaviorClass::Territorial => (0.2, 2.0, 0.1),
            BehaviorClass::Solitary => (0.1, 1.0, 0.1),
        };
        let base = Self::default();
        Self {
            alignment,
            cohesion,
            separation,
            max_speed: base.max_speed * speed_multiplier.max(0.0),
            ..base
        }
    }

    pub fn get_weight_range() -> std::ops::RangeInclusive<f32> {
        0.0..=3.0
    }
}

// Parameters the driver can change between frames
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    pub groups: Vec<SpeciesGroup>,
    pub quality: QualityTier,
    pub motion_enabled: bool,
    pub selected_flock: usize,
    pub alignment: f32,
    pub cohesion: f32,
    pub separation: f32,

    // Internal state for tracking changes
    previous: Option<ControlSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
struct ControlSnapshot {
    groups: Vec<SpeciesGroup>,
    quality: QualityTier,
    motion_enabled: bool,
    selected_flock: usize,
    alignment: f32,
    cohesion: f32,
    separation: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlChanges {
    pub groups: bool,
    pub quality: bool,
    pub motion: bool,
    pub weights: bool,
}

impl ControlChanges {
    pub fn any(&self) -> bool {
        self.groups || self.quality || self.motion || self.weights
    }
}

impl ControlState {
    pub fn new(groups: Vec<SpeciesGroup>, quality: QualityTier, motion_enabled: bool) -> Self {
        Self {
            groups,
            quality,
            motion_enabled,
            selected_flock: 0,
            alignment: 1.0,
            cohesion: 1.0,
            separation: 1.0,
            previous: None,
        }
    }

    // Load the weights of a flock into the editable fields
    pub fn select_flock(&mut self, index: usize, params: &FlockParams) {
        self.selected_flock = index;
        self.alignment = params.alignment;
        self.cohesion = params.cohesion;
        self.separation = params.separation;
    }

    // Take a snapshot of current values for change detection
    pub fn take_snapshot(&mut self) {
        self.previous = Some(ControlSnapshot {
            groups: self.groups.clone(),
            quality: self.quality,
            motion_enabled: self.motion_enabled,
            selected_flock: self.selected_flock,
            alignment: self.alignment,
            cohesion: self.cohesion,
            separation: self.separation,
        });
    }

    // Compare against the last snapshot; nothing has changed without one
    pub fn detect_changes(&self) -> ControlChanges {
        let Some(prev) = &self.previous else {
            return ControlChanges::default();
        };

        // Switching the selected flock reloads weights, it does not edit them
        let same_flock = prev.selected_flock == self.selected_flock;

        ControlChanges {
            groups: !crate::config::same_population(&prev.groups, &self.groups),
            quality: prev.quality != self.quality,
            motion: prev.motion_enabled != self.motion_enabled,
            weights: same_flock
                && (prev.alignment != self.alignment
                    || prev.cohesion != self.cohesion
                    || prev.separation != self.separation),
        }
    }
}
