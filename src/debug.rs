/*
 * Debug Information Module
 *
 * Aggregate per-frame statistics produced by the render bridge:
 * - Visible instance count (total and per LOD tier)
 * - Fish culled by the frustum or dropped for lack of budget
 * - Frame time
 */

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStats {
    pub visible_count: usize,
    pub culled_count: usize,
    pub over_budget_count: usize,
    pub frame_time_ms: f32,
    pub per_tier: Vec<usize>,
}

impl RenderStats {
    pub fn reset(&mut self, tiers: usize) {
        self.visible_count = 0;
        self.culled_count = 0;
        self.over_budget_count = 0;
        self.per_tier.clear();
        self.per_tier.resize(tiers, 0);
    }

    // Share of the population that was not drawn this frame, in percent
    pub fn culling_efficiency(&self) -> f32 {
        let total = self.visible_count + self.culled_count + self.over_budget_count;
        if total == 0 {
            return 0.0;
        }
        (1.0 - self.visible_count as f32 / total as f32) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn culling_efficiency_counts_everything_not_drawn() {
        let mut stats = RenderStats::default();
        assert_eq!(stats.culling_efficiency(), 0.0);

        stats.visible_count = 6;
        stats.culled_count = 3;
        stats.over_budget_count = 1;
        assert!((stats.culling_efficiency() - 40.0).abs() < 1e-4);

        stats.reset(3);
        assert_eq!(stats.per_tier, vec![0, 0, 0]);
        assert_eq!(stats.culling_efficiency(), 0.0);
    }
}
