/*
 * Feeding Module
 *
 * Feeding points are transient food sources. They appear at random near the
 * top of the tank, pull hungry fish towards them and disappear once their
 * lifetime runs out. Expiry is an absolute simulation timestamp that the
 * engine checks each tick, so a rebuild never leaves a stale timer behind.
 */

use glam::Vec3;
use rand::Rng;

use crate::params::FlockBounds;

pub const MAX_FEEDING_POINTS: usize = 3;
pub const SPAWN_CHANCE: f32 = 0.001;
pub const MIN_LIFETIME: f32 = 10.0;
pub const MAX_LIFETIME: f32 = 15.0;

// How far below the top of the bounds new food appears
const SPAWN_DEPTH: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedingPoint {
    pub position: Vec3,
    pub created_at: f32,
    pub expires_at: f32,
}

impl FeedingPoint {
    pub fn new(position: Vec3, now: f32, lifetime: f32) -> Self {
        Self {
            position,
            created_at: now,
            expires_at: now + lifetime.max(0.0),
        }
    }

    pub fn is_expired(&self, now: f32) -> bool {
        now >= self.expires_at
    }

    pub fn remaining(&self, now: f32) -> f32 {
        (self.expires_at - now).max(0.0)
    }
}

// Drop every point whose lifetime has elapsed, returning how many were removed
pub fn expire(points: &mut Vec<FeedingPoint>, now: f32) -> usize {
    let before = points.len();
    points.retain(|p| !p.is_expired(now));
    before - points.len()
}

// Roll for a new feeding point near the top of the bounds
pub fn maybe_spawn<R: Rng>(points: &[FeedingPoint], bounds: &FlockBounds, now: f32, rng: &mut R) -> Option<FeedingPoint> {
    if points.len() >= MAX_FEEDING_POINTS || rng.gen::<f32>() >= SPAWN_CHANCE {
        return None;
    }

    let x = lerp(bounds.min.x, bounds.max.x, rng.gen::<f32>());
    let z = lerp(bounds.min.z, bounds.max.z, rng.gen::<f32>());
    let y = (bounds.max.y - SPAWN_DEPTH).max(bounds.min.y);
    let lifetime = rng.gen_range(MIN_LIFETIME..MAX_LIFETIME);

    Some(FeedingPoint::new(Vec3::new(x, y, z), now, lifetime))
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn points_expire_at_their_timestamp() {
        let mut points = vec![
            FeedingPoint::new(Vec3::ZERO, 0.0, 10.0),
            FeedingPoint::new(Vec3::ONE, 0.0, 15.0),
        ];

        assert_eq!(expire(&mut points, 9.9), 0);
        assert_eq!(expire(&mut points, 10.0), 1);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].remaining(12.0), 3.0);
    }

    #[test]
    fn spawned_points_sit_near_the_top_with_bounded_lifetime() {
        let bounds = FlockBounds::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut spawned = Vec::new();

        // Spawn chance is tiny, so roll plenty of ticks
        for tick in 0..200_000 {
            if let Some(point) = maybe_spawn(&[], &bounds, tick as f32, &mut rng) {
                spawned.push(point);
            }
        }

        assert!(!spawned.is_empty());
        for point in spawned {
            assert_eq!(point.position.y, bounds.max.y - SPAWN_DEPTH);
            let lifetime = point.expires_at - point.created_at;
            // Timestamps grow large here, allow for f32 rounding
            assert!(lifetime >= MIN_LIFETIME - 0.05 && lifetime <= MAX_LIFETIME + 0.05);
        }
    }

    #[test]
    fn never_spawns_past_the_limit() {
        let bounds = FlockBounds::default();
        let full = vec![FeedingPoint::new(Vec3::ZERO, 0.0, 10.0); MAX_FEEDING_POINTS];
        let mut rng = StdRng::seed_from_u64(1);

        assert!((0..50_000).all(|_| maybe_spawn(&full, &bounds, 0.0, &mut rng).is_none()));
    }
}
