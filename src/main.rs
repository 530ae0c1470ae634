/*
 * Fish Flocking Aquarium
 *
 * This application simulates schools of fish of several species:
 * 1. Flocking: alignment, cohesion and separation within each species
 * 2. Behavior: feeding, predator avoidance, leader formations and idling
 * 3. Rendering: distance based level of detail with per-tier budgets
 *
 * Usage: fishflock [config.json]
 * Set RUST_LOG=debug for simulation events.
 */

use fishflock::app::{model, update};

fn main() {
    env_logger::init();

    nannou::app(model).update(update).run();
}
