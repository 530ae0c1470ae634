use fishflock::agent::Agent;
use fishflock::lod::{MeshDetail, QualityTier};
use fishflock::renderer::{MeshDescriptor, MeshFactory, RenderBridge, RenderMode};
use fishflock::{Camera, Flock, FlockBounds, FlockParams, FlockingEngine, RenderError, SpeciesCatalog, Variant};
use glam::{Mat4, Vec3};

const DT: f32 = 1.0 / 60.0;

fn forward_camera() -> Camera {
    Camera::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0))
}

fn flock_at(positions: &[Vec3], velocity: Vec3) -> Flock {
    let params = FlockParams::default();
    let agents = positions
        .iter()
        .map(|&p| Agent::new(p, velocity, params.max_speed, params.max_force))
        .collect();
    let bounds = FlockBounds::new(Vec3::splat(-100.0), Vec3::splat(100.0));
    Flock {
        variant: SpeciesCatalog::builtin().resolve("clownfish").clone(),
        engine: FlockingEngine::from_agents(agents, bounds, params, 3),
    }
}

fn bridge_with_caps(caps: Vec<usize>) -> RenderBridge {
    RenderBridge::default().with_tier_caps(caps)
}

fn approx_mat(a: &Mat4, b: &Mat4) -> bool {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .all(|(x, y)| (x - y).abs() < 1e-5)
}

#[test]
fn fish_at_three_distances_land_in_three_tiers() {
    let flocks = vec![flock_at(
        &[Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -28.0), Vec3::new(0.0, 0.0, -60.0)],
        Vec3::ZERO,
    )];
    let mut bridge = bridge_with_caps(vec![10, 10, 10]);
    bridge.rebuild(&flocks);
    bridge.update(DT, 0.0, &forward_camera(), &flocks);

    for tier in 0..3 {
        assert_eq!(bridge.instance_count(0, tier), 1, "tier {tier}");
    }
    let visible: Vec<&[usize]> = bridge.batches()[0].tiers().iter().map(|t| t.visible()).collect();
    assert_eq!(visible, vec![&[0][..], &[1][..], &[2][..]]);

    let stats = bridge.stats();
    assert_eq!(stats.per_tier, vec![1, 1, 1]);
    assert_eq!(stats.visible_count, 3);
    assert_eq!(stats.culled_count, 0);
}

#[test]
fn tier_budget_is_never_exceeded() {
    let positions: Vec<Vec3> = (0..8).map(|i| Vec3::new(i as f32 - 4.0, 0.0, -10.0)).collect();
    let flocks = vec![flock_at(&positions, Vec3::ZERO)];
    let mut bridge = bridge_with_caps(vec![3, 3, 3]);
    bridge.rebuild(&flocks);
    bridge.update(DT, 0.0, &forward_camera(), &flocks);

    assert_eq!(bridge.instance_count(0, 0), 3);
    assert_eq!(bridge.stats().over_budget_count, 5);
}

#[test]
fn low_quality_halves_active_budget_and_high_restores_it() {
    let positions: Vec<Vec3> = (0..12).map(|i| Vec3::new(i as f32 * 0.5 - 3.0, 0.0, -10.0)).collect();
    let flocks = vec![flock_at(&positions, Vec3::ZERO)];
    let mut bridge = bridge_with_caps(vec![10, 10, 10]);
    bridge.rebuild(&flocks);

    bridge.set_quality(QualityTier::Low);
    for tier in bridge.batches()[0].tiers() {
        assert_eq!(tier.active_capacity(), 5);
        assert_eq!(tier.capacity(), 10);
    }
    bridge.update(DT, 0.0, &forward_camera(), &flocks);
    assert_eq!(bridge.instance_count(0, 0), 5);

    bridge.set_quality(QualityTier::High);
    for tier in bridge.batches()[0].tiers() {
        assert_eq!(tier.active_capacity(), 10);
        assert_eq!(tier.capacity(), 10);
    }
    bridge.update(DT, 0.0, &forward_camera(), &flocks);
    assert_eq!(bridge.instance_count(0, 0), 10);
}

#[test]
fn fish_behind_the_camera_are_culled() {
    let flocks = vec![flock_at(&[Vec3::new(0.0, 0.0, -10.0), Vec3::new(0.0, 0.0, 10.0)], Vec3::ZERO)];
    let mut bridge = bridge_with_caps(vec![10, 10, 10]);
    bridge.rebuild(&flocks);
    bridge.update(DT, 0.0, &forward_camera(), &flocks);

    assert_eq!(bridge.stats().visible_count, 1);
    assert_eq!(bridge.stats().culled_count, 1);
}

#[test]
fn stationary_fish_keep_their_last_heading() {
    let mut flocks = vec![flock_at(&[Vec3::new(0.0, 0.0, -10.0)], Vec3::new(0.01, 0.0, 0.0))];
    let mut bridge = bridge_with_caps(vec![10, 10, 10]);
    bridge.rebuild(&flocks);
    let camera = forward_camera();

    bridge.update(DT, 0.0, &camera, &flocks);
    let moving = bridge.batches()[0].tiers()[0].instances()[0].transform;
    // The mesh's forward axis follows the velocity
    assert!((moving.z_axis.truncate().normalize() - Vec3::X).length() < 1e-4);

    flocks[0].engine.set_motion_enabled(false);
    bridge.update(DT, DT, &camera, &flocks);
    let parked = bridge.batches()[0].tiers()[0].instances()[0].transform;
    assert!(approx_mat(&moving, &parked));
}

#[test]
fn simple_mode_animates_without_touching_the_simulation() {
    let positions: Vec<Vec3> = (0..4).map(|i| Vec3::new(i as f32, 0.0, -10.0)).collect();
    let flocks = vec![flock_at(&positions, Vec3::new(0.0, 0.0, 0.02))];
    let before = flocks[0].engine.snapshots();

    let mut bridge = RenderBridge::new(vec![0.0, 30.0, 50.0], QualityTier::Low, RenderMode::Simple);
    bridge.rebuild(&flocks);
    bridge.update(DT, 0.1, &forward_camera(), &flocks);
    let first: Vec<f32> = bridge.batches()[0].simple().instances().iter().map(|i| i.tail_angle).collect();
    bridge.update(DT, 0.3, &forward_camera(), &flocks);
    let second: Vec<f32> = bridge.batches()[0].simple().instances().iter().map(|i| i.tail_angle).collect();

    // One instance per fish regardless of quality or distance
    assert_eq!(bridge.batches()[0].simple().count(), 4);
    assert_eq!(bridge.stats().visible_count, 4);
    assert_ne!(first, second);
    assert_eq!(flocks[0].engine.snapshots(), before);
}

struct BrokenFactory;

impl MeshFactory for BrokenFactory {
    fn build(&mut self, variant: &Variant, detail: MeshDetail) -> Result<MeshDescriptor, RenderError> {
        Err(RenderError::MeshBuild {
            species: variant.id.clone(),
            detail,
            reason: "no geometry backend".to_string(),
        })
    }
}

#[test]
fn failed_mesh_builds_fall_back_and_keep_rendering() {
    let flocks = vec![flock_at(&[Vec3::new(0.0, 0.0, -10.0)], Vec3::ZERO)];
    let mut bridge = RenderBridge::with_factory(
        vec![0.0, 30.0, 50.0],
        QualityTier::High,
        RenderMode::Lod,
        Box::new(BrokenFactory),
    );
    bridge.rebuild(&flocks);

    let batch = &bridge.batches()[0];
    assert!(batch.tiers().iter().all(|t| t.mesh().is_fallback()));
    assert!(batch.simple().mesh().is_fallback());

    bridge.update(DT, 0.0, &forward_camera(), &flocks);
    assert_eq!(bridge.stats().visible_count, 1);
}

#[test]
fn frame_time_is_reported_in_milliseconds() {
    let flocks = vec![flock_at(&[Vec3::new(0.0, 0.0, -10.0)], Vec3::ZERO)];
    let mut bridge = RenderBridge::default();
    bridge.rebuild(&flocks);
    bridge.update(0.02, 0.0, &forward_camera(), &flocks);
    assert!((bridge.stats().frame_time_ms - 20.0).abs() < 1e-4);
}
