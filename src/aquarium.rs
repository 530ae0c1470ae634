/*
 * Aquarium Module
 *
 * The aquarium ties the pieces together for a driver: one flock per
 * species group, an optional render bridge and the camera it renders from.
 *
 * Population changes rebuild every flock and every instance buffer. When
 * the bridge has not been attached yet, the request is parked and applied
 * on attach; the returned RebuildStatus tells the caller which happened.
 */

use glam::Vec3;

use crate::agent::AgentSnapshot;
use crate::camera::Camera;
use crate::config::{AquariumConfig, PopulationConfig, SpeciesGroup};
use crate::debug::RenderStats;
use crate::error::FlockError;
use crate::flock::FlockingEngine;
use crate::lod::QualityTier;
use crate::params::FlockBounds;
use crate::renderer::{RenderBridge, RenderMode};
use crate::species::{SpeciesCatalog, Variant};

// One species' population and the variant it was built from
pub struct Flock {
    pub variant: Variant,
    pub engine: FlockingEngine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildStatus {
    Applied,
    Pending,
}

pub struct Aquarium {
    catalog: SpeciesCatalog,
    bounds: FlockBounds,
    seed: Option<u64>,
    groups: Vec<SpeciesGroup>,
    flocks: Vec<Flock>,
    bridge: Option<RenderBridge>,
    pending: Option<Vec<SpeciesGroup>>,
    quality: QualityTier,
    render_mode: RenderMode,
    motion_enabled: bool,
    camera: Camera,
}

impl Aquarium {
    pub fn new(catalog: SpeciesCatalog, bounds: FlockBounds, seed: Option<u64>) -> Self {
        Self {
            catalog,
            bounds,
            seed,
            groups: Vec::new(),
            flocks: Vec::new(),
            bridge: None,
            pending: None,
            quality: QualityTier::High,
            render_mode: RenderMode::default(),
            motion_enabled: true,
            camera: Camera::default(),
        }
    }

    // Build the aquarium and its bridge from a configuration
    pub fn from_config(config: &AquariumConfig, catalog: SpeciesCatalog) -> Result<Self, FlockError> {
        config.validate()?;

        let mut aquarium = Self::new(catalog, config.bounds, config.seed);
        aquarium.quality = config.quality;
        aquarium.render_mode = config.render_mode;
        aquarium.motion_enabled = config.motion_enabled;
        aquarium.set_groups(config.population.groups.clone());
        aquarium.attach_bridge(RenderBridge::new(config.lod_distances.clone(), config.quality, config.render_mode));

        Ok(aquarium)
    }

    // Replace the species/count list. The caller decides whether it changed.
    pub fn set_groups(&mut self, groups: Vec<SpeciesGroup>) -> RebuildStatus {
        if self.bridge.is_none() {
            log::info!("render bridge not ready, queueing rebuild of {} group(s)", groups.len());
            self.pending = Some(groups);
            return RebuildStatus::Pending;
        }

        self.rebuild_flocks(groups);
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.rebuild(&self.flocks);
        }
        RebuildStatus::Applied
    }

    // Install the bridge and apply any rebuild that was waiting for it
    pub fn attach_bridge(&mut self, mut bridge: RenderBridge) -> RebuildStatus {
        if let Some(groups) = self.pending.take() {
            self.rebuild_flocks(groups);
        }
        bridge.set_quality(self.quality);
        bridge.set_mode(self.render_mode);
        bridge.rebuild(&self.flocks);
        self.bridge = Some(bridge);
        RebuildStatus::Applied
    }

    pub fn has_pending_rebuild(&self) -> bool {
        self.pending.is_some()
    }

    fn rebuild_flocks(&mut self, groups: Vec<SpeciesGroup>) {
        let flocks = groups
            .iter()
            .filter(|group| group.count > 0)
            .enumerate()
            .map(|(i, group)| {
                let variant = self.catalog.resolve(&group.species).clone();
                let seed = self.seed.map(|s| s.wrapping_add(i as u64));
                let mut engine =
                    FlockingEngine::with_params(group.count, self.bounds, variant.flock_params(), variant.scale, seed);
                engine.set_motion_enabled(self.motion_enabled);
                Flock { variant, engine }
            })
            .collect();

        self.flocks = flocks;
        self.groups = groups;
        log::info!("rebuilt {} flock(s), {} fish", self.flocks.len(), self.population());
    }

    // Per-frame driver: simulate every flock, then refresh instance data
    pub fn frame(&mut self, dt: f32, elapsed: f32) {
        for flock in &mut self.flocks {
            flock.engine.update(dt);
        }
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.update(dt, elapsed, &self.camera, &self.flocks);
        }
    }

    pub fn set_quality(&mut self, quality: QualityTier) {
        self.quality = quality;
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.set_quality(quality);
        }
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.render_mode = mode;
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.set_mode(mode);
        }
    }

    pub fn set_motion_enabled(&mut self, enabled: bool) {
        self.motion_enabled = enabled;
        for flock in &mut self.flocks {
            flock.engine.set_motion_enabled(enabled);
        }
    }

    // Weight setters address a flock by index; false when it does not exist
    pub fn set_alignment(&mut self, flock: usize, weight: f32) -> bool {
        self.with_engine(flock, |engine| engine.set_alignment(weight))
    }

    pub fn set_cohesion(&mut self, flock: usize, weight: f32) -> bool {
        self.with_engine(flock, |engine| engine.set_cohesion(weight))
    }

    pub fn set_separation(&mut self, flock: usize, weight: f32) -> bool {
        self.with_engine(flock, |engine| engine.set_separation(weight))
    }

    fn with_engine(&mut self, flock: usize, f: impl FnOnce(&mut FlockingEngine)) -> bool {
        match self.flocks.get_mut(flock) {
            Some(flock) => {
                f(&mut flock.engine);
                true
            }
            None => false,
        }
    }

    // Every flock gets its own copy of the food; flocks never share state
    pub fn drop_food(&mut self, position: Vec3, lifetime: f32) {
        for flock in &mut self.flocks {
            flock.engine.spawn_feeding_point(position, lifetime);
        }
    }

    pub fn export_population(&self) -> PopulationConfig {
        PopulationConfig::new(self.pending.clone().unwrap_or_else(|| self.groups.clone()))
    }

    pub fn import_population(&mut self, json: &str) -> Result<RebuildStatus, FlockError> {
        let population = PopulationConfig::from_json(json)?;
        Ok(self.set_groups(population.groups))
    }

    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.flocks.iter().flat_map(|f| f.engine.snapshots()).collect()
    }

    pub fn flocks(&self) -> &[Flock] {
        &self.flocks
    }

    pub fn groups(&self) -> &[SpeciesGroup] {
        &self.groups
    }

    pub fn population(&self) -> usize {
        self.flocks.iter().map(|f| f.engine.len()).sum()
    }

    pub fn bridge(&self) -> Option<&RenderBridge> {
        self.bridge.as_ref()
    }

    pub fn stats(&self) -> Option<&RenderStats> {
        self.bridge.as_ref().map(RenderBridge::stats)
    }

    pub fn catalog(&self) -> &SpeciesCatalog {
        &self.catalog
    }

    pub fn bounds(&self) -> &FlockBounds {
        &self.bounds
    }

    pub fn quality(&self) -> QualityTier {
        self.quality
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn motion_enabled(&self) -> bool {
        self.motion_enabled
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }
}
