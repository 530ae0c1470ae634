/*
 * Application Module
 *
 * This module defines the nannou model for the aquarium demo. It owns the
 * aquarium (flocks + render bridge), the editable control state and the
 * egui context, and it draws the bridge's instance data as a simple
 * perspective projection of each fish.
 *
 * The window shows exactly what the bridge decided to draw: culled and
 * over-budget fish never reach the view function.
 */

use nannou::prelude::*;
use nannou_egui::Egui;

use crate::aquarium::Aquarium;
use crate::config::{AquariumConfig, PopulationConfig};
use crate::input;
use crate::lod::MeshDetail;
use crate::params::ControlState;
use crate::renderer::RenderMode;
use crate::species::SpeciesCatalog;
use crate::ui;
use crate::DEFAULT_POPULATION;

// Camera orbit; the simulation itself lives in tank units
const ORBIT_HEIGHT: f32 = 12.0;
const ORBIT_SPEED: f32 = 0.05;
pub const MIN_ORBIT_RADIUS: f32 = 10.0;
pub const MAX_ORBIT_RADIUS: f32 = 120.0;

// Main model for the application
pub struct Model {
    pub aquarium: Aquarium,
    pub controls: ControlState,
    pub egui: Egui,
    pub show_debug: bool,
    pub auto_orbit: bool,
    pub orbit_angle: f32,
    pub orbit_radius: f32,
    // Text area used by the population export/import buttons
    pub population_text: String,
}

// Read the configuration named on the command line, or fall back to defaults
fn load_config() -> AquariumConfig {
    let default_config = || AquariumConfig {
        population: PopulationConfig::new(SpeciesCatalog::builtin().default_groups(DEFAULT_POPULATION)),
        ..AquariumConfig::default()
    };

    match std::env::args().nth(1) {
        Some(path) => match AquariumConfig::load(&path) {
            Ok(config) => {
                log::info!("loaded configuration from {path}");
                config
            }
            Err(err) => {
                log::error!("could not load {path}: {err}; using defaults");
                default_config()
            }
        },
        None => default_config(),
    }
}

// Initialize the model
pub fn model(app: &App) -> Model {
    let window_id = app
        .new_window()
        .title("Fish Flocking Aquarium")
        .size(1280, 720)
        .view(view)
        .resized(window_resized)
        .mouse_wheel(input::mouse_wheel)
        .key_pressed(input::key_pressed)
        .raw_event(raw_window_event)
        .build()
        .expect("failed to build window");

    let window = app.window(window_id).expect("window was just created");
    let egui = Egui::from_window(&window);
    let (width, height) = window.inner_size_points();

    let config = load_config();
    let mut aquarium = match Aquarium::from_config(&config, SpeciesCatalog::builtin()) {
        Ok(aquarium) => aquarium,
        Err(err) => {
            log::error!("invalid configuration: {err}; using defaults");
            let mut aquarium = Aquarium::new(SpeciesCatalog::builtin(), config.bounds, config.seed);
            aquarium.set_groups(aquarium.catalog().default_groups(DEFAULT_POPULATION));
            aquarium.attach_bridge(Default::default());
            aquarium
        }
    };
    aquarium.camera_mut().set_viewport(width, height);

    let mut controls = ControlState::new(aquarium.groups().to_vec(), aquarium.quality(), aquarium.motion_enabled());
    if let Some(flock) = aquarium.flocks().first() {
        controls.select_flock(0, flock.engine.params());
    }

    let population_text = aquarium.export_population().to_json().unwrap_or_default();

    Model {
        aquarium,
        controls,
        egui,
        show_debug: true,
        auto_orbit: true,
        orbit_angle: 0.0,
        orbit_radius: 45.0,
        population_text,
    }
}

// Update the model
pub fn update(_app: &App, model: &mut Model, update: Update) {
    let dt = update.since_last.as_secs_f32();
    let elapsed = update.since_start.as_secs_f32();

    let actions = ui::update_ui(
        &mut model.egui,
        &mut model.controls,
        &model.aquarium,
        &mut model.population_text,
        &mut model.show_debug,
        &mut model.auto_orbit,
    );
    apply_controls(model, actions);

    if model.auto_orbit {
        model.orbit_angle += ORBIT_SPEED * dt;
    }
    let position = crate::glam::Vec3::new(
        model.orbit_angle.sin() * model.orbit_radius,
        ORBIT_HEIGHT,
        model.orbit_angle.cos() * model.orbit_radius,
    );
    model.aquarium.camera_mut().position = position;

    model.aquarium.frame(dt, elapsed);
}

// Push whatever the UI changed into the aquarium
fn apply_controls(model: &mut Model, actions: ui::UiActions) {
    let changes = actions.changes;
    let aquarium = &mut model.aquarium;
    let controls = &mut model.controls;

    if changes.groups {
        let status = aquarium.set_groups(controls.groups.clone());
        log::debug!("population change: {status:?}");
        resync_selection(aquarium, controls);
    }
    if changes.quality {
        aquarium.set_quality(controls.quality);
    }
    if changes.motion {
        aquarium.set_motion_enabled(controls.motion_enabled);
    }
    if changes.weights {
        let index = controls.selected_flock;
        aquarium.set_alignment(index, controls.alignment);
        aquarium.set_cohesion(index, controls.cohesion);
        aquarium.set_separation(index, controls.separation);
    }

    if let Some(mode) = actions.render_mode {
        aquarium.set_render_mode(mode);
    }

    if actions.export {
        match aquarium.export_population().to_json() {
            Ok(json) => model.population_text = json,
            Err(err) => log::error!("population export failed: {err}"),
        }
    }
    if actions.import {
        match aquarium.import_population(&model.population_text) {
            Ok(status) => {
                log::info!("population imported: {status:?}");
                controls.groups = aquarium.groups().to_vec();
                resync_selection(aquarium, controls);
            }
            Err(err) => log::error!("population import failed: {err}"),
        }
    }
}

// Flocks were rebuilt; reload the edited weights from whatever is selected now
fn resync_selection(aquarium: &Aquarium, controls: &mut ControlState) {
    let index = controls.selected_flock.min(aquarium.flocks().len().saturating_sub(1));
    if let Some(flock) = aquarium.flocks().get(index) {
        controls.select_flock(index, flock.engine.params());
    }
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    draw.background().color(rgb(8u8, 24, 48));

    let window_rect = app.window_rect();
    let viewport = crate::glam::Vec2::new(window_rect.w(), window_rect.h());
    let camera = model.aquarium.camera();

    if let Some(bridge) = model.aquarium.bridge() {
        for batch in bridge.batches() {
            let buffers: Vec<_> = match bridge.mode() {
                RenderMode::Lod => batch.tiers().iter().collect(),
                RenderMode::Simple => vec![batch.simple()],
            };

            for buffer in buffers {
                // Cheaper meshes get flatter silhouettes
                let outline = match buffer.detail() {
                    MeshDetail::High => 1.0,
                    MeshDetail::Medium => 0.5,
                    MeshDetail::Low => 0.0,
                };

                for instance in buffer.instances() {
                    let world = instance.transform.w_axis.truncate();
                    let Some(screen) = camera.world_to_screen(world, viewport) else {
                        continue;
                    };
                    let scale = instance.transform.x_axis.truncate().length();
                    let radius = (scale * 60.0 / camera.distance_to(world).max(1.0)).max(1.0);
                    let [r, g, b] = instance.tint;

                    draw.ellipse()
                        .x_y(screen.x, screen.y)
                        .w_h(radius * 2.0, radius)
                        .color(rgb(r, g, b))
                        .stroke(rgba(1.0, 1.0, 1.0, 0.3))
                        .stroke_weight(outline);
                }
            }
        }
    }

    // Food is per flock, so overlapping points are drawn once per flock
    for flock in model.aquarium.flocks() {
        for point in flock.engine.feeding_points() {
            if let Some(screen) = camera.world_to_screen(point.position, viewport) {
                draw.ellipse().x_y(screen.x, screen.y).radius(3.0).color(rgba(1.0, 0.85, 0.3, 0.8));
            }
        }
    }

    if model.show_debug {
        if let Some(stats) = model.aquarium.stats() {
            ui::draw_debug_info(&draw, stats, window_rect, model.aquarium.population(), app.fps());
        }
    }

    if let Err(err) = draw.to_frame(app, &frame) {
        log::error!("failed to draw frame: {err:?}");
    }
    if let Err(err) = model.egui.draw_to_frame(&frame) {
        log::error!("failed to draw ui: {err:?}");
    }
}

fn window_resized(_app: &App, model: &mut Model, size: Vec2) {
    model.aquarium.camera_mut().set_viewport(size.x, size.y);
}

// Handle raw window events for egui
fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}
