/*
 * Camera Module
 *
 * This module defines the perspective Camera the render bridge culls and
 * sorts against. It provides the view/projection matrices, the view
 * frustum, and the transformation from world space to screen space used
 * by the demo window. Moving the camera is left to the driver.
 */

use glam::{Mat4, Vec2, Vec3};

use crate::culling::Frustum;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 12.0, 45.0), Vec3::ZERO)
    }
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            fov_y: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 500.0,
        }
    }

    // Keep the projection in step with the window
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }

    // Convert a point from world space to screen space (origin at the
    // viewport center, y up); None when the point is behind the camera
    pub fn world_to_screen(&self, point: Vec3, viewport: Vec2) -> Option<Vec2> {
        let clip = self.view_projection() * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(ndc.x * viewport.x * 0.5, ndc.y * viewport.y * 0.5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_projects_to_screen_center() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let screen = camera.world_to_screen(Vec3::ZERO, Vec2::new(800.0, 600.0)).expect("in front");
        assert!(screen.length() < 1e-3);
    }

    #[test]
    fn points_behind_the_camera_do_not_project() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        assert!(camera.world_to_screen(Vec3::new(0.0, 0.0, 20.0), Vec2::new(800.0, 600.0)).is_none());
    }

    #[test]
    fn viewport_updates_aspect() {
        let mut camera = Camera::default();
        camera.set_viewport(1000.0, 500.0);
        assert_eq!(camera.aspect, 2.0);
        camera.set_viewport(0.0, 500.0);
        assert_eq!(camera.aspect, 2.0);
    }
}
