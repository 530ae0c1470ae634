/*
 * Level of Detail Module
 *
 * A LOD ladder is an ordered list of distance brackets. Each bracket has an
 * instance budget and a mesh detail level; fish closer to the camera get
 * the detailed mesh, distant ones a cheaper one, and a bracket that is out
 * of budget simply stops drawing fish for that frame.
 *
 * Brackets are chosen by the distance to the far side of a fish's bounding
 * sphere: camera distance plus the 2 unit bounding radius used for culling.
 * A fish at 29 units therefore already lands in the [30, 50) bracket. Each
 * bracket is half-open, so a fish exactly on a boundary takes the farther one.
 *
 * Render quality scales the *active* budget of every bracket. The buffers
 * keep their baseline capacity so switching quality never reallocates.
 */

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::culling::{Frustum, AGENT_BOUNDING_RADIUS};
use crate::error::FlockError;

pub const DEFAULT_TIER_DISTANCES: [f32; 3] = [0.0, 30.0, 50.0];

// Baseline budget of each tier as a fraction of the flock size
const TIER_CAP_FRACTIONS: [f32; 3] = [1.0, 0.75, 0.5];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    #[default]
    High,
}

impl QualityTier {
    pub const ALL: [QualityTier; 3] = [QualityTier::Low, QualityTier::Medium, QualityTier::High];

    pub fn multiplier(self) -> f32 {
        match self {
            QualityTier::Low => 0.5,
            QualityTier::Medium => 0.75,
            QualityTier::High => 1.0,
        }
    }

    // Active budget for a tier; a non-empty tier never drops to zero
    pub fn scale_cap(self, baseline: usize) -> usize {
        if baseline == 0 {
            return 0;
        }
        ((baseline as f32 * self.multiplier()).floor() as usize).clamp(1, baseline)
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QualityTier::Low => "low",
            QualityTier::Medium => "medium",
            QualityTier::High => "high",
        };
        f.write_str(name)
    }
}

impl FromStr for QualityTier {
    type Err = FlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(QualityTier::Low),
            "medium" => Ok(QualityTier::Medium),
            "high" => Ok(QualityTier::High),
            _ => Err(FlockError::UnknownQuality(s.to_string())),
        }
    }
}

// Mesh fidelity used for a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshDetail {
    High,
    Medium,
    Low,
}

impl MeshDetail {
    pub fn for_tier(index: usize) -> Self {
        match index {
            0 => MeshDetail::High,
            1 => MeshDetail::Medium,
            _ => MeshDetail::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodLevel {
    pub distance: f32,
    pub instance_cap: usize,
    pub detail: MeshDetail,
}

impl LodLevel {
    // Ladder sized for a flock, caps shrinking with distance
    pub fn ladder(population: usize, distances: &[f32]) -> Vec<LodLevel> {
        distances
            .iter()
            .enumerate()
            .map(|(i, &distance)| {
                let fraction = TIER_CAP_FRACTIONS.get(i).copied().unwrap_or(0.5);
                LodLevel {
                    distance,
                    instance_cap: (population as f32 * fraction).ceil() as usize,
                    detail: MeshDetail::for_tier(i),
                }
            })
            .collect()
    }

    pub fn with_caps(distances: &[f32], caps: &[usize]) -> Vec<LodLevel> {
        distances
            .iter()
            .zip(caps)
            .enumerate()
            .map(|(i, (&distance, &instance_cap))| LodLevel {
                distance,
                instance_cap,
                detail: MeshDetail::for_tier(i),
            })
            .collect()
    }
}

// Distance used for tier selection: the far side of the fish's bounding
// sphere, so a fish drops to the cheaper tier as soon as it starts crossing
pub fn tier_distance(camera_position: Vec3, position: Vec3) -> f32 {
    camera_position.distance(position) + AGENT_BOUNDING_RADIUS
}

// Index of the tier whose [distance, next distance) bracket holds d
pub fn tier_for_distance(levels: &[LodLevel], d: f32) -> Option<usize> {
    levels.iter().enumerate().find_map(|(i, level)| {
        let upper = levels.get(i + 1).map_or(f32::INFINITY, |next| next.distance);
        (d >= level.distance && d < upper).then_some(i)
    })
}

// Result of sorting one variant's fish into tiers for one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierAssignment {
    pub visible: Vec<Vec<usize>>,
    pub culled: usize,
    pub over_budget: usize,
    pub out_of_range: usize,
}

impl TierAssignment {
    pub fn rendered(&self) -> usize {
        self.visible.iter().map(Vec::len).sum()
    }
}

// Walk the tiers nearest first, filling each one up to its active cap
pub fn assign_tiers(
    levels: &[LodLevel],
    active_caps: &[usize],
    camera_position: Vec3,
    frustum: &Frustum,
    positions: &[Vec3],
) -> TierAssignment {
    let mut assignment = TierAssignment {
        visible: vec![Vec::new(); levels.len()],
        ..TierAssignment::default()
    };

    for (index, &position) in positions.iter().enumerate() {
        let d = tier_distance(camera_position, position);
        let Some(tier) = tier_for_distance(levels, d) else {
            assignment.out_of_range += 1;
            continue;
        };

        if !frustum.intersects_sphere(position, AGENT_BOUNDING_RADIUS) {
            assignment.culled += 1;
            continue;
        }

        let cap = active_caps.get(tier).copied().unwrap_or(0).min(levels[tier].instance_cap);
        if assignment.visible[tier].len() < cap {
            assignment.visible[tier].push(index);
        } else {
            assignment.over_budget += 1;
        }
    }

    assignment
}
