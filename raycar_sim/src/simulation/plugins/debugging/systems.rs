// raycar_sim/src/simulation/plugins/debugging/systems.rs

use bevy::math::Isometry3d;
use nalgebra::Vector3;

use super::components::{DebugGizmoSettings, FollowCamera};
use crate::prelude::*;
use crate::simulation::core::transforms::{
    pose_to_bevy_transform, z_up_extent_to_bevy, z_up_quat_to_bevy, z_up_vector_to_bevy,
};

const CHASSIS_COLOR: Color = Color::srgb(0.85, 0.25, 0.2);
const WHEEL_COLOR: Color = Color::srgb(0.9, 0.9, 0.9);
const RAY_COLOR: Color = Color::srgba(1.0, 0.8, 0.0, 0.6);
const CONTACT_COLOR: Color = Color::srgb(0.2, 1.0, 0.3);
const GRID_COLOR: Color = Color::srgba(0.5, 0.5, 0.5, 0.4);

// =========================================================================
// == Scene Setup ==
// =========================================================================

pub fn spawn_camera_and_light(mut commands: Commands, latest: Option<Res<LatestPose>>) {
    let target = latest
        .map(|l| z_up_vector_to_bevy(&l.0.chassis.position))
        .unwrap_or(Vec3::ZERO);

    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(target + Vec3::new(0.0, 3.0, -6.0)).looking_at(target, Vec3::Y),
        FollowCamera::default(),
        Name::new("FollowCamera"),
    ));
    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(4.0, 10.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
        Name::new("Sun"),
    ));
}

// =========================================================================
// == Toggle Systems (Hotkeys) ==
// =========================================================================

pub fn toggle_gizmos(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut settings: ResMut<DebugGizmoSettings>,
) {
    if keyboard.just_pressed(KeyCode::F1) {
        settings.show_suspension = !settings.show_suspension;
        info!(
            "[Debug] Toggled suspension visuals {}",
            if settings.show_suspension { "ON" } else { "OFF" }
        );
    }
    if keyboard.just_pressed(KeyCode::F2) {
        settings.show_grid = !settings.show_grid;
        info!(
            "[Debug] Toggled ground grid {}",
            if settings.show_grid { "ON" } else { "OFF" }
        );
    }
}

// =========================================================================
// == Camera and Drawing Systems ==
// =========================================================================

/// Eases the camera toward its chassis-frame offset, always looking at the car.
pub fn follow_chassis(
    time: Res<Time>,
    latest: Res<LatestPose>,
    mut cameras: Query<(&mut Transform, &FollowCamera)>,
) {
    let chassis = &latest.0.chassis;
    let target = z_up_vector_to_bevy(&chassis.position);

    for (mut transform, follow) in &mut cameras {
        // Only the heading is followed, so body roll does not shake the view.
        let forward = chassis.orientation * Vector3::x();
        let yaw = forward.y.atan2(forward.x);
        let o = follow.offset;
        let offset = Vector3::new(
            o.x as Real * yaw.cos() - o.y as Real * yaw.sin(),
            o.x as Real * yaw.sin() + o.y as Real * yaw.cos(),
            o.z as Real,
        );
        let desired = target + z_up_vector_to_bevy(&offset);

        let blend = 1.0 - (-follow.stiffness * time.delta_secs()).exp();
        transform.translation = transform.translation.lerp(desired, blend);
        transform.look_at(target, Vec3::Y);
    }
}

pub fn draw_ground_grid(mut gizmos: Gizmos, settings: Res<DebugGizmoSettings>) {
    if !settings.show_grid {
        return;
    }
    // Gizmo grids lie in their local XY plane; rotate onto Bevy's XZ ground.
    gizmos.grid(
        Isometry3d::from_rotation(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)),
        UVec2::splat(40),
        Vec2::splat(1.0),
        GRID_COLOR,
    );
}

/// Chassis box and wheel rims from the published snapshot.
pub fn draw_vehicle(mut gizmos: Gizmos, latest: Res<LatestPose>, sim: Res<Simulation>) {
    let snap = &latest.0;
    let tuning = sim.tuning();

    let body = snap.chassis_visual_pose(&tuning.chassis_offset());
    let mut body_transform = pose_to_bevy_transform(&body);
    body_transform.scale = z_up_extent_to_bevy(&tuning.chassis_size());
    gizmos.cuboid(body_transform, CHASSIS_COLOR);

    let radius = tuning.wheel_radius as f32;
    for wheel in WheelPosition::ALL {
        let pose = snap.wheel(wheel);
        let center = z_up_vector_to_bevy(&pose.position);
        let rotation = z_up_quat_to_bevy(&pose.orientation);

        // The wheel plane is the local forward/up plane, which is the circle's XY.
        gizmos.circle(Isometry3d::new(center, rotation), radius, WHEEL_COLOR);
        // A spoke, so spin is visible.
        gizmos.line(center, center + rotation * Vec3::Y * radius, WHEEL_COLOR);
    }
}

/// Suspension rays and ground contacts.
pub fn draw_suspension(
    mut gizmos: Gizmos,
    settings: Res<DebugGizmoSettings>,
    sim: Res<Simulation>,
) {
    if !settings.show_suspension {
        return;
    }
    for (spec, state) in WheelPosition::ALL
        .iter()
        .map(|w| (sim.suspension().spec(*w), sim.suspension().wheel(*w)))
    {
        let start = z_up_vector_to_bevy(&state.connection_world);
        if state.in_contact {
            let contact = z_up_vector_to_bevy(&state.contact_point);
            gizmos.line(start, contact, RAY_COLOR);
            gizmos.sphere(Isometry3d::from_translation(contact), 0.04, CONTACT_COLOR);
        } else {
            let end = state.connection_world + state.direction_world * spec.ray_length();
            gizmos.line(start, z_up_vector_to_bevy(&end), RAY_COLOR);
        }
    }
}
