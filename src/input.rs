/*
 * Input Module
 *
 * This module handles user input events for the aquarium demo.
 *
 * Features:
 * - Camera zooming with the mouse wheel (orbit radius)
 * - Keyboard shortcuts: Space pauses motion, F drops food, D toggles debug
 */

use nannou::prelude::*;
use nannou::winit::event::{MouseScrollDelta, TouchPhase};

use crate::app::{Model, MAX_ORBIT_RADIUS, MIN_ORBIT_RADIUS};

// Food dropped by hand lives a little longer than spawned food
const DROPPED_FOOD_LIFETIME: f32 = 15.0;

// Mouse wheel event handler
pub fn mouse_wheel(_app: &App, model: &mut Model, delta: MouseScrollDelta, _phase: TouchPhase) {
    if model.egui.ctx().is_pointer_over_area() {
        return;
    }

    let amount = match delta {
        MouseScrollDelta::LineDelta(_, y) => y * 2.0,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.05,
    };
    model.orbit_radius = (model.orbit_radius - amount).clamp(MIN_ORBIT_RADIUS, MAX_ORBIT_RADIUS);
}

// Key pressed event handler
pub fn key_pressed(_app: &App, model: &mut Model, key: Key) {
    match key {
        // Keep the control state in step so the checkbox follows the key
        Key::Space => {
            let enabled = !model.aquarium.motion_enabled();
            model.controls.motion_enabled = enabled;
            model.aquarium.set_motion_enabled(enabled);
        }
        Key::F => {
            let bounds = *model.aquarium.bounds();
            let position = crate::glam::Vec3::new(bounds.center().x, bounds.max.y - 1.0, bounds.center().z);
            model.aquarium.drop_food(position, DROPPED_FOOD_LIFETIME);
            log::debug!("food dropped at {position:?}");
        }
        Key::D => model.show_debug = !model.show_debug,
        _ => {}
    }
}
