/*
 * Animation Module
 *
 * Cosmetic swimming motion for the simple render mode: a body wiggle, a
 * tail sway at twice the wiggle frequency, a pitch that follows speed and a
 * slow breathing scale. Everything here is a function of elapsed time and
 * a per-fish phase; none of it is written back into the simulation.
 */

use glam::{Mat4, Quat, Vec3};

const WIGGLE_FREQUENCY: f32 = 4.0;
const WIGGLE_AMPLITUDE: f32 = 0.08;
const TAIL_AMPLITUDE: f32 = 0.35;
const MAX_PITCH: f32 = 0.2;
const BREATHING_FREQUENCY: f32 = 1.5;
const BREATHING_AMPLITUDE: f32 = 0.03;

/// Per-instance animation parameters owned by the render bridge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationParams {
    pub phase: f32,
    pub wiggle_frequency: f32,
    pub wiggle_amplitude: f32,
    pub tail_amplitude: f32,
    pub breathing_amplitude: f32,
}

impl AnimationParams {
    // Bigger fish swim with slower, wider strokes
    pub fn for_agent(phase: f32, size: f32) -> Self {
        let size = size.max(0.1);
        Self {
            phase,
            wiggle_frequency: WIGGLE_FREQUENCY / size,
            wiggle_amplitude: WIGGLE_AMPLITUDE,
            tail_amplitude: TAIL_AMPLITUDE * size.min(1.5),
            breathing_amplitude: BREATHING_AMPLITUDE,
        }
    }

    pub fn pose(&self, elapsed: f32, speed_ratio: f32) -> Pose {
        let t = elapsed * self.wiggle_frequency + self.phase;
        Pose {
            body_yaw: t.sin() * self.wiggle_amplitude,
            tail_angle: (t * 2.0).sin() * self.tail_amplitude,
            pitch: -speed_ratio.clamp(0.0, 1.0) * MAX_PITCH,
            breathing_scale: 1.0 + (elapsed * BREATHING_FREQUENCY + self.phase).sin() * self.breathing_amplitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub body_yaw: f32,
    pub tail_angle: f32,
    pub pitch: f32,
    pub breathing_scale: f32,
}

impl Pose {
    // Layer the pose on top of a base transform in the fish's local frame
    pub fn apply(&self, position: Vec3, orientation: Quat, scale: f32) -> Mat4 {
        let local = Quat::from_rotation_y(self.body_yaw) * Quat::from_rotation_x(self.pitch);
        Mat4::from_scale_rotation_translation(
            Vec3::splat(scale * self.breathing_scale),
            orientation * local,
            position,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_sways_at_twice_the_wiggle_frequency() {
        let params = AnimationParams::for_agent(0.0, 1.0);
        // Quarter wiggle period: body at its peak, tail back through zero
        let quarter = std::f32::consts::FRAC_PI_2 / params.wiggle_frequency;
        let pose = params.pose(quarter, 0.0);

        assert!((pose.body_yaw - params.wiggle_amplitude).abs() < 1e-5);
        assert!(pose.tail_angle.abs() < 1e-4);
    }

    #[test]
    fn pitch_follows_speed_and_is_bounded() {
        let params = AnimationParams::for_agent(1.0, 1.0);
        assert_eq!(params.pose(0.0, 0.0).pitch, 0.0);
        assert_eq!(params.pose(0.0, 5.0).pitch, -MAX_PITCH);
    }

    #[test]
    fn breathing_stays_close_to_unit_scale() {
        let params = AnimationParams::for_agent(0.3, 0.8);
        for step in 0..100 {
            let scale = params.pose(step as f32 * 0.1, 0.5).breathing_scale;
            assert!((scale - 1.0).abs() <= BREATHING_AMPLITUDE + 1e-6);
        }
    }
}
