/*
 * UI Module
 *
 * This module contains functions for creating and updating the user interface
 * using nannou_egui. It provides controls for render quality, motion, the
 * steering weights of the selected flock and the species population.
 * Change detection is handled by the ControlState struct.
 */

use nannou_egui::{egui, Egui};

use crate::aquarium::Aquarium;
use crate::debug::RenderStats;
use crate::lod::QualityTier;
use crate::params::{ControlChanges, ControlState, FlockParams};
use crate::renderer::RenderMode;

// Everything the UI asked for this frame
#[derive(Debug, Clone, Copy, Default)]
pub struct UiActions {
    pub changes: ControlChanges,
    pub render_mode: Option<RenderMode>,
    pub export: bool,
    pub import: bool,
}

pub fn update_ui(
    egui: &mut Egui,
    controls: &mut ControlState,
    aquarium: &Aquarium,
    population_text: &mut String,
    show_debug: &mut bool,
    auto_orbit: &mut bool,
) -> UiActions {
    let mut actions = UiActions::default();

    // Take a snapshot of current values for change detection
    controls.take_snapshot();

    let ctx = egui.begin_frame();

    egui::Window::new("Aquarium Controls")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            ui.collapsing("Rendering", |ui| {
                egui::ComboBox::from_label("Quality")
                    .selected_text(controls.quality.to_string())
                    .show_ui(ui, |ui| {
                        for quality in QualityTier::ALL {
                            ui.selectable_value(&mut controls.quality, quality, quality.to_string());
                        }
                    });

                if let Some(bridge) = aquarium.bridge() {
                    let mut mode = bridge.mode();
                    ui.horizontal(|ui| {
                        ui.radio_value(&mut mode, RenderMode::Lod, "LOD");
                        ui.radio_value(&mut mode, RenderMode::Simple, "Animated");
                    });
                    if mode != bridge.mode() {
                        actions.render_mode = Some(mode);
                    }
                }

                ui.checkbox(auto_orbit, "Orbit camera");
            });

            ui.collapsing("Flocking Behavior", |ui| {
                let flocks = aquarium.flocks();
                if flocks.is_empty() {
                    ui.label("No fish in the tank");
                    return;
                }

                let mut selected = controls.selected_flock.min(flocks.len() - 1);
                egui::ComboBox::from_label("Flock")
                    .selected_text(flocks[selected].variant.display_name.as_str())
                    .show_ui(ui, |ui| {
                        for (i, flock) in flocks.iter().enumerate() {
                            ui.selectable_value(&mut selected, i, flock.variant.display_name.as_str());
                        }
                    });
                if selected != controls.selected_flock {
                    controls.select_flock(selected, flocks[selected].engine.params());
                }

                ui.add(egui::Slider::new(&mut controls.alignment, FlockParams::get_weight_range()).text("Alignment"));
                ui.add(egui::Slider::new(&mut controls.cohesion, FlockParams::get_weight_range()).text("Cohesion"));
                ui.add(egui::Slider::new(&mut controls.separation, FlockParams::get_weight_range()).text("Separation"));
            });

            ui.collapsing("Population", |ui| {
                for group in &mut controls.groups {
                    let name = aquarium.catalog().resolve(&group.species).display_name.clone();
                    ui.horizontal(|ui| {
                        ui.add(egui::DragValue::new(&mut group.count).clamp_range(0..=500));
                        ui.label(name);
                    });
                }

                ui.separator();
                ui.horizontal(|ui| {
                    actions.export = ui.button("Export").clicked();
                    actions.import = ui.button("Import").clicked();
                });
                ui.text_edit_multiline(population_text);
            });

            ui.checkbox(&mut controls.motion_enabled, "Motion");
            ui.checkbox(show_debug, "Show Debug Info");
        });

    actions.changes = controls.detect_changes();
    actions
}

// Draw render statistics in the top-right corner of the window
pub fn draw_debug_info(
    draw: &nannou::Draw,
    stats: &RenderStats,
    window_rect: nannou::geom::Rect,
    population: usize,
    fps: f32,
) {
    let margin = 20.0;
    let line_height = 20.0;
    let panel_width = 220.0;

    let mut lines = vec![
        format!("FPS: {:.1}", fps),
        format!("Frame time: {:.2} ms", stats.frame_time_ms),
        format!("Fish: {}", population),
        format!("Visible: {}", stats.visible_count),
        format!("Culled: {}", stats.culled_count),
        format!("Over budget: {}", stats.over_budget_count),
        format!("Not drawn: {:.1}%", stats.culling_efficiency()),
    ];
    for (tier, count) in stats.per_tier.iter().enumerate() {
        lines.push(format!("Tier {}: {}", tier, count));
    }

    let panel_height = line_height * lines.len() as f32 + margin;
    draw.rect()
        .x_y(window_rect.right() - panel_width / 2.0, window_rect.top() - panel_height / 2.0)
        .w_h(panel_width, panel_height)
        .color(nannou::color::rgba(0.0, 0.0, 0.0, 0.7));

    let text_x = window_rect.right() - panel_width / 2.0;
    let text_y = window_rect.top() - margin;
    for (i, text) in lines.iter().enumerate() {
        draw.text(text)
            .x_y(text_x, text_y - i as f32 * line_height)
            .color(nannou::color::WHITE)
            .font_size(14);
    }
}
