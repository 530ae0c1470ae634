/*
 * Renderer Module
 *
 * This module is the bridge between the simulation and instanced drawing.
 * Each frame it turns the current fish state into per-instance transforms:
 * - LOD mode sorts every flock into distance tiers, frustum culls each fish
 *   as a bounding sphere and fills each tier up to its active budget
 * - Simple mode draws every fish once and layers cosmetic swimming
 *   animation on top of the physical transform
 *
 * Buffers are created on rebuild (population change) with their baseline
 * capacity; quality changes only move the active budget inside them.
 */

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::animation::AnimationParams;
use crate::aquarium::Flock;
use crate::camera::Camera;
use crate::debug::RenderStats;
use crate::error::RenderError;
use crate::lod::{self, LodLevel, MeshDetail, QualityTier, DEFAULT_TIER_DISTANCES};
use crate::species::Variant;

// Below this speed a fish keeps its previous heading
const MIN_HEADING_SPEED: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Lod,
    Simple,
}

// Geometry description handed to the excluded graphics layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshDescriptor {
    pub segments: u32,
    pub rings: u32,
}

impl MeshDescriptor {
    pub fn vertex_count(&self) -> usize {
        (self.segments as usize + 1) * (self.rings as usize + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshHandle {
    Mesh(MeshDescriptor),
    // Plain low-poly cone used when a mesh could not be built
    Fallback,
}

impl MeshHandle {
    pub fn is_fallback(&self) -> bool {
        matches!(self, MeshHandle::Fallback)
    }
}

pub trait MeshFactory {
    fn build(&mut self, variant: &Variant, detail: MeshDetail) -> Result<MeshDescriptor, RenderError>;
}

// Lathe-style fish body whose resolution follows the detail level
#[derive(Debug, Clone, Copy, Default)]
pub struct ProceduralMeshFactory;

impl MeshFactory for ProceduralMeshFactory {
    fn build(&mut self, variant: &Variant, detail: MeshDetail) -> Result<MeshDescriptor, RenderError> {
        if !variant.scale.is_finite() || variant.scale <= 0.0 {
            return Err(RenderError::MeshBuild {
                species: variant.id.clone(),
                detail,
                reason: format!("invalid scale {}", variant.scale),
            });
        }
        let (segments, rings) = match detail {
            MeshDetail::High => (24, 12),
            MeshDetail::Medium => (12, 6),
            MeshDetail::Low => (6, 3),
        };
        Ok(MeshDescriptor { segments, rings })
    }
}

fn build_mesh(factory: &mut dyn MeshFactory, variant: &Variant, detail: MeshDetail) -> MeshHandle {
    match factory.build(variant, detail) {
        Ok(mesh) => MeshHandle::Mesh(mesh),
        Err(err) => {
            log::warn!("{err}; using fallback mesh");
            MeshHandle::Fallback
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceData {
    pub transform: Mat4,
    pub tail_angle: f32,
    pub tint: [f32; 3],
}

#[derive(Debug, Clone)]
pub struct InstanceBuffer {
    mesh: MeshHandle,
    detail: MeshDetail,
    baseline_cap: usize,
    active_cap: usize,
    instances: Vec<InstanceData>,
    // Agent indices drawn this frame, rebuilt every update
    visible: Vec<usize>,
}

impl InstanceBuffer {
    fn new(mesh: MeshHandle, detail: MeshDetail, baseline_cap: usize, quality: QualityTier) -> Self {
        Self {
            mesh,
            detail,
            baseline_cap,
            active_cap: quality.scale_cap(baseline_cap),
            instances: Vec::with_capacity(baseline_cap),
            visible: Vec::with_capacity(baseline_cap),
        }
    }

    fn clear(&mut self) {
        self.instances.clear();
        self.visible.clear();
    }

    fn push(&mut self, agent_index: usize, instance: InstanceData) {
        self.visible.push(agent_index);
        self.instances.push(instance);
    }

    pub fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    pub fn detail(&self) -> MeshDetail {
        self.detail
    }

    pub fn capacity(&self) -> usize {
        self.baseline_cap
    }

    pub fn active_capacity(&self) -> usize {
        self.active_cap
    }

    pub fn count(&self) -> usize {
        self.instances.len()
    }

    pub fn instances(&self) -> &[InstanceData] {
        &self.instances
    }

    pub fn visible(&self) -> &[usize] {
        &self.visible
    }
}

// All render state for one flock
#[derive(Debug, Clone)]
pub struct VariantBatch {
    species: String,
    tint: [f32; 3],
    levels: Vec<LodLevel>,
    tiers: Vec<InstanceBuffer>,
    simple: InstanceBuffer,
    orientations: Vec<Quat>,
    animation: Vec<AnimationParams>,
}

impl VariantBatch {
    fn build(flock: &Flock, levels: Vec<LodLevel>, quality: QualityTier, factory: &mut dyn MeshFactory) -> Self {
        let agents = flock.engine.agents();
        let tiers = levels
            .iter()
            .map(|level| {
                let mesh = build_mesh(factory, &flock.variant, level.detail);
                InstanceBuffer::new(mesh, level.detail, level.instance_cap, quality)
            })
            .collect();

        // Simple mode always uses the detailed mesh and draws everyone
        let simple_mesh = build_mesh(factory, &flock.variant, MeshDetail::High);
        let simple = InstanceBuffer::new(simple_mesh, MeshDetail::High, agents.len(), QualityTier::High);

        let [r, g, b] = flock.variant.primary_color;
        Self {
            species: flock.variant.id.clone(),
            tint: [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0],
            levels,
            tiers,
            simple,
            orientations: agents.iter().map(|a| heading(a.velocity).unwrap_or(Quat::IDENTITY)).collect(),
            animation: agents.iter().map(|a| AnimationParams::for_agent(a.phase, a.size)).collect(),
        }
    }

    fn apply_quality(&mut self, quality: QualityTier) {
        for tier in &mut self.tiers {
            tier.active_cap = quality.scale_cap(tier.baseline_cap);
        }
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    pub fn tiers(&self) -> &[InstanceBuffer] {
        &self.tiers
    }

    pub fn simple(&self) -> &InstanceBuffer {
        &self.simple
    }
}

// Rotation taking the mesh's +Z forward onto the given direction, keeping +Y up
pub fn look_rotation(forward: Vec3) -> Quat {
    let forward = forward.normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut right = Vec3::Y.cross(forward);
    if right.length_squared() < 1e-6 {
        // Swimming straight up or down, any perpendicular will do
        right = Vec3::Z.cross(forward);
    }
    let right = right.normalize();
    let up = forward.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}

fn heading(velocity: Vec3) -> Option<Quat> {
    (velocity.length_squared() > MIN_HEADING_SPEED * MIN_HEADING_SPEED).then(|| look_rotation(velocity))
}

pub struct RenderBridge {
    distances: Vec<f32>,
    fixed_caps: Option<Vec<usize>>,
    quality: QualityTier,
    mode: RenderMode,
    factory: Box<dyn MeshFactory>,
    batches: Vec<VariantBatch>,
    stats: RenderStats,
}

impl Default for RenderBridge {
    fn default() -> Self {
        Self::new(DEFAULT_TIER_DISTANCES.to_vec(), QualityTier::High, RenderMode::Lod)
    }
}

impl RenderBridge {
    pub fn new(distances: Vec<f32>, quality: QualityTier, mode: RenderMode) -> Self {
        Self::with_factory(distances, quality, mode, Box::new(ProceduralMeshFactory))
    }

    pub fn with_factory(
        distances: Vec<f32>,
        quality: QualityTier,
        mode: RenderMode,
        factory: Box<dyn MeshFactory>,
    ) -> Self {
        Self {
            distances,
            fixed_caps: None,
            quality,
            mode,
            factory,
            batches: Vec::new(),
            stats: RenderStats::default(),
        }
    }

    // Use the same baseline caps for every flock instead of sizing by population
    pub fn with_tier_caps(mut self, caps: Vec<usize>) -> Self {
        self.fixed_caps = Some(caps);
        self
    }

    fn levels_for(&self, population: usize) -> Vec<LodLevel> {
        match &self.fixed_caps {
            Some(caps) => LodLevel::with_caps(&self.distances, caps),
            None => LodLevel::ladder(population, &self.distances),
        }
    }

    // Recreate every instance buffer for the current flocks
    pub fn rebuild(&mut self, flocks: &[Flock]) {
        let mut batches = Vec::with_capacity(flocks.len());
        for flock in flocks {
            let levels = self.levels_for(flock.engine.len());
            batches.push(VariantBatch::build(flock, levels, self.quality, self.factory.as_mut()));
        }
        self.batches = batches;
        self.stats.reset(self.distances.len());

        log::info!(
            "render bridge rebuilt: {} batches, {} fish",
            self.batches.len(),
            flocks.iter().map(|f| f.engine.len()).sum::<usize>()
        );
    }

    // Scale active budgets without touching buffer capacity
    pub fn set_quality(&mut self, quality: QualityTier) {
        if quality == self.quality {
            return;
        }
        self.quality = quality;
        for batch in &mut self.batches {
            batch.apply_quality(quality);
        }
        log::info!("render quality set to {quality}");
    }

    pub fn quality(&self) -> QualityTier {
        self.quality
    }

    pub fn set_mode(&mut self, mode: RenderMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn batches(&self) -> &[VariantBatch] {
        &self.batches
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    pub fn instance_count(&self, batch: usize, tier: usize) -> usize {
        self.batches
            .get(batch)
            .and_then(|b| b.tiers.get(tier))
            .map_or(0, InstanceBuffer::count)
    }

    // Rewrite all instance data from the current state of the flocks
    pub fn update(&mut self, dt: f32, elapsed: f32, camera: &Camera, flocks: &[Flock]) {
        self.stats.reset(self.distances.len());
        self.stats.frame_time_ms = dt.max(0.0) * 1000.0;

        if self.batches.len() != flocks.len() {
            log::warn!(
                "render bridge holds {} batches for {} flocks; rebuild pending",
                self.batches.len(),
                flocks.len()
            );
        }

        let frustum = camera.frustum();
        let mode = self.mode;

        for (batch, flock) in self.batches.iter_mut().zip(flocks) {
            let agents = flock.engine.agents();
            if batch.orientations.len() != agents.len() {
                batch.orientations.resize(agents.len(), Quat::IDENTITY);
            }
            for (orientation, agent) in batch.orientations.iter_mut().zip(agents) {
                if let Some(q) = heading(agent.velocity) {
                    *orientation = q;
                }
            }

            for tier in &mut batch.tiers {
                tier.clear();
            }
            batch.simple.clear();

            match mode {
                RenderMode::Lod => {
                    let positions: Vec<Vec3> = agents.iter().map(|a| a.position).collect();
                    let caps: Vec<usize> = batch.tiers.iter().map(|t| t.active_cap).collect();
                    let assignment = lod::assign_tiers(&batch.levels, &caps, camera.position, &frustum, &positions);

                    for (t, visible) in assignment.visible.iter().enumerate() {
                        let tier = &mut batch.tiers[t];
                        for &i in visible {
                            let agent = &agents[i];
                            let transform = Mat4::from_scale_rotation_translation(
                                Vec3::splat(agent.size),
                                batch.orientations[i],
                                agent.position,
                            );
                            tier.push(
                                i,
                                InstanceData {
                                    transform,
                                    tail_angle: 0.0,
                                    tint: batch.tint,
                                },
                            );
                        }
                        if let Some(count) = self.stats.per_tier.get_mut(t) {
                            *count += tier.count();
                        }
                    }

                    self.stats.visible_count += assignment.rendered();
                    self.stats.culled_count += assignment.culled + assignment.out_of_range;
                    self.stats.over_budget_count += assignment.over_budget;
                }
                RenderMode::Simple => {
                    let capacity = batch.simple.capacity();
                    for (i, agent) in agents.iter().enumerate().take(capacity) {
                        let speed_ratio = agent.velocity.length() / agent.nominal_speed.max(f32::EPSILON);
                        let pose = batch.animation[i].pose(elapsed, speed_ratio);
                        batch.simple.push(
                            i,
                            InstanceData {
                                transform: pose.apply(agent.position, batch.orientations[i], agent.size),
                                tail_angle: pose.tail_angle,
                                tint: batch.tint,
                            },
                        );
                    }
                    self.stats.visible_count += batch.simple.count();
                    self.stats.over_budget_count += agents.len() - batch.simple.count();
                }
            }
        }
    }
}
