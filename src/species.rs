/*
 * Species Catalog Module
 *
 * Maps a species id to its visual identity (colors, scale), its speed
 * multiplier, its behavior class and its share of a default population.
 * The flocking math only ever sees the FlockParams derived from a variant,
 * so adding a species is a data change here and nothing else.
 */

use serde::{Deserialize, Serialize};

use crate::config::SpeciesGroup;
use crate::params::{BehaviorClass, FlockParams};

pub const DEFAULT_SPECIES: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    pub display_name: String,
    pub primary_color: [u8; 3],
    pub secondary_color: [u8; 3],
    pub scale: f32,
    pub speed_multiplier: f32,
    pub behavior: BehaviorClass,
    pub population_share: f32,
}

impl Variant {
    pub fn flock_params(&self) -> FlockParams {
        FlockParams::from_behavior(self.behavior, self.speed_multiplier)
    }
}

#[allow(clippy::too_many_arguments)]
fn variant(
    id: &str,
    display_name: &str,
    primary_color: [u8; 3],
    secondary_color: [u8; 3],
    scale: f32,
    speed_multiplier: f32,
    behavior: BehaviorClass,
    population_share: f32,
) -> Variant {
    Variant {
        id: id.to_string(),
        display_name: display_name.to_string(),
        primary_color,
        secondary_color,
        scale,
        speed_multiplier,
        behavior,
        population_share,
    }
}

#[derive(Debug, Clone)]
pub struct SpeciesCatalog {
    variants: Vec<Variant>,
    fallback: Variant,
}

impl Default for SpeciesCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SpeciesCatalog {
    pub fn builtin() -> Self {
        let variants = vec![
            variant("clownfish", "Clownfish", [255, 120, 30], [250, 250, 250], 0.7, 1.0, BehaviorClass::Schooling, 0.35),
            variant("blue_tang", "Blue Tang", [40, 90, 220], [250, 210, 40], 0.85, 1.1, BehaviorClass::Schooling, 0.3),
            variant("angelfish", "Angelfish", [240, 230, 120], [30, 30, 40], 1.0, 0.8, BehaviorClass::Territorial, 0.2),
            variant("barracuda", "Barracuda", [150, 160, 170], [60, 70, 80], 1.4, 1.5, BehaviorClass::Solitary, 0.15),
        ];
        let fallback = variant(DEFAULT_SPECIES, "Fish", [200, 200, 200], [120, 120, 120], 1.0, 1.0, BehaviorClass::Schooling, 0.0);
        Self { variants, fallback }
    }

    // Add or replace a species
    pub fn register(&mut self, variant: Variant) {
        match self.variants.iter_mut().find(|v| v.id == variant.id) {
            Some(existing) => *existing = variant,
            None => self.variants.push(variant),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }

    // Unknown ids degrade to the default entry
    pub fn resolve(&self, id: &str) -> &Variant {
        self.get(id).unwrap_or_else(|| {
            log::debug!("unknown species '{id}', using default variant");
            &self.fallback
        })
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    // Split a total population between species according to their shares.
    // Rounding leftovers go to the species with the largest share.
    pub fn default_groups(&self, total: usize) -> Vec<SpeciesGroup> {
        let share_sum: f32 = self.variants.iter().map(|v| v.population_share.max(0.0)).sum();
        if self.variants.is_empty() || share_sum <= 0.0 {
            return Vec::new();
        }

        let mut groups: Vec<SpeciesGroup> = self
            .variants
            .iter()
            .map(|v| SpeciesGroup {
                species: v.id.clone(),
                count: (total as f32 * v.population_share.max(0.0) / share_sum).floor() as usize,
            })
            .collect();

        let assigned: usize = groups.iter().map(|g| g.count).sum();
        if let Some(largest) = self
            .variants
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.population_share.total_cmp(&b.1.population_share))
            .map(|(i, _)| i)
        {
            groups[largest].count += total.saturating_sub(assigned);
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_species_resolves_to_default() {
        let catalog = SpeciesCatalog::builtin();
        assert_eq!(catalog.resolve("kraken").id, DEFAULT_SPECIES);
        assert_eq!(catalog.resolve("barracuda").display_name, "Barracuda");
    }

    #[test]
    fn register_replaces_existing_entry() {
        let mut catalog = SpeciesCatalog::builtin();
        let count = catalog.variants().len();
        let mut tang = catalog.resolve("blue_tang").clone();
        tang.scale = 2.0;
        catalog.register(tang);

        assert_eq!(catalog.variants().len(), count);
        assert_eq!(catalog.resolve("blue_tang").scale, 2.0);
    }

    #[test]
    fn default_groups_cover_the_whole_population() {
        let catalog = SpeciesCatalog::builtin();
        for total in [0, 1, 7, 100, 333] {
            let groups = catalog.default_groups(total);
            assert_eq!(groups.iter().map(|g| g.count).sum::<usize>(), total);
        }
    }
}
