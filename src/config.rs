/*
 * Configuration Module
 *
 * Serializable configuration for an aquarium: which species live in it and
 * how many of each, the tank bounds, the render quality and LOD ladder.
 * Population lists can be exported to JSON and imported back; two lists are
 * considered the same population when their per-species totals match,
 * regardless of order.
 */

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FlockError;
use crate::lod::{QualityTier, DEFAULT_TIER_DISTANCES};
use crate::params::FlockBounds;
use crate::renderer::RenderMode;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeciesGroup {
    pub species: String,
    pub count: usize,
}

// Per-species totals, merging duplicate entries
pub fn counts_by_species(groups: &[SpeciesGroup]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for group in groups {
        *counts.entry(group.species.clone()).or_insert(0) += group.count;
    }
    counts.retain(|_, count| *count > 0);
    counts
}

// Order-insensitive population equality
pub fn same_population(a: &[SpeciesGroup], b: &[SpeciesGroup]) -> bool {
    counts_by_species(a) == counts_by_species(b)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub groups: Vec<SpeciesGroup>,
}

impl PopulationConfig {
    pub fn new(groups: Vec<SpeciesGroup>) -> Self {
        Self { groups }
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }

    pub fn counts(&self) -> BTreeMap<String, usize> {
        counts_by_species(&self.groups)
    }

    pub fn to_json(&self) -> Result<String, FlockError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, FlockError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn default_motion() -> bool {
    true
}

fn default_tiers() -> Vec<f32> {
    DEFAULT_TIER_DISTANCES.to_vec()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AquariumConfig {
    #[serde(default)]
    pub bounds: FlockBounds,
    #[serde(default)]
    pub population: PopulationConfig,
    #[serde(default)]
    pub quality: QualityTier,
    #[serde(default)]
    pub render_mode: RenderMode,
    #[serde(default = "default_tiers")]
    pub lod_distances: Vec<f32>,
    #[serde(default = "default_motion")]
    pub motion_enabled: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for AquariumConfig {
    fn default() -> Self {
        Self {
            bounds: FlockBounds::default(),
            population: PopulationConfig::default(),
            quality: QualityTier::default(),
            render_mode: RenderMode::default(),
            lod_distances: default_tiers(),
            motion_enabled: true,
            seed: None,
        }
    }
}

impl AquariumConfig {
    pub fn from_json(json: &str) -> Result<Self, FlockError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FlockError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, FlockError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // Callers downstream assume the ladder is ascending and starts somewhere finite
    pub fn validate(&self) -> Result<(), FlockError> {
        if self.lod_distances.is_empty() {
            return Err(FlockError::InvalidConfig("lod_distances must not be empty"));
        }
        if self.lod_distances.windows(2).any(|w| w[0] >= w[1]) {
            return Err(FlockError::InvalidConfig("lod_distances must be strictly ascending"));
        }
        if self.lod_distances.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(FlockError::InvalidConfig("lod_distances must be finite and non-negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(species: &str, count: usize) -> SpeciesGroup {
        SpeciesGroup {
            species: species.to_string(),
            count,
        }
    }

    #[test]
    fn population_round_trips_through_json() {
        let config = PopulationConfig::new(vec![group("clownfish", 12), group("barracuda", 3), group("clownfish", 4)]);
        let json = config.to_json().expect("export");
        let imported = PopulationConfig::from_json(&json).expect("import");

        assert_eq!(imported.counts(), config.counts());
        assert_eq!(imported.counts()["clownfish"], 16);
    }

    #[test]
    fn zero_count_groups_do_not_count_as_population() {
        assert!(same_population(&[group("shark", 0)], &[]));
        assert!(!same_population(&[group("shark", 1)], &[]));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config = AquariumConfig::from_json("{}").expect("defaults");
        assert_eq!(config, AquariumConfig::default());
    }

    #[test]
    fn rejects_descending_lod_ladder() {
        let err = AquariumConfig::from_json(r#"{"lod_distances":[0.0,50.0,30.0]}"#).unwrap_err();
        assert!(matches!(err, FlockError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(PopulationConfig::from_json("{groups:"), Err(FlockError::Json(_))));
    }
}
