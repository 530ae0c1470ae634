/*
 * Culling Module
 *
 * This module handles frustum culling for the render bridge. The six
 * frustum planes are extracted from the camera's view-projection matrix and
 * every fish is tested as a bounding sphere, so a fish half-way off screen
 * still counts as visible.
 */

use glam::{Mat4, Vec3, Vec4};

// Radius of the bounding sphere used for every fish
pub const AGENT_BOUNDING_RADIUS: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    fn from_row(row: Vec4) -> Self {
        let normal = row.truncate();
        let length = normal.length();
        if length > 0.0 {
            Self {
                normal: normal / length,
                distance: row.w / length,
            }
        } else {
            Self {
                normal: Vec3::ZERO,
                distance: row.w,
            }
        }
    }

    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    // Gribb/Hartmann plane extraction for a [0, 1] depth range projection
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let rows = view_projection.transpose();
        let (r0, r1, r2, r3) = (rows.x_axis, rows.y_axis, rows.z_axis, rows.w_axis);

        Self {
            planes: [
                Plane::from_row(r3 + r0), // left
                Plane::from_row(r3 - r0), // right
                Plane::from_row(r3 + r1), // bottom
                Plane::from_row(r3 - r1), // top
                Plane::from_row(r2),      // near
                Plane::from_row(r3 - r2), // far
            ],
        }
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes.iter().all(|plane| plane.signed_distance(center) >= -radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;

    fn forward_camera() -> Camera {
        // Looks down -Z from the origin
        Camera::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0))
    }

    impl Frustum {
        fn contains_point(&self, point: Vec3) -> bool {
            self.intersects_sphere(point, 0.0)
        }
    }

    #[test]
    fn points_ahead_are_inside() {
        let frustum = forward_camera().frustum();
        assert!(frustum.contains_point(Vec3::new(0.0, 0.0, -10.0)));
        assert!(frustum.contains_point(Vec3::new(1.0, 1.0, -60.0)));
    }

    #[test]
    fn points_behind_or_beyond_far_are_outside() {
        let frustum = forward_camera().frustum();
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 10.0)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -600.0)));
        assert!(!frustum.contains_point(Vec3::new(500.0, 0.0, -10.0)));
    }

    #[test]
    fn sphere_radius_keeps_edge_fish_visible() {
        let frustum = forward_camera().frustum();
        // Just behind the near plane, but the sphere reaches into the frustum
        let center = Vec3::new(0.0, 0.0, 1.0);
        assert!(!frustum.contains_point(center));
        assert!(frustum.intersects_sphere(center, AGENT_BOUNDING_RADIUS));
    }
}
