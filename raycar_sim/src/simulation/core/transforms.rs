// raycar_sim/src/simulation/core/transforms.rs

use bevy::prelude::{Quat as BevyQuat, Transform as BevyTransform, Vec3 as BevyVec3};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use raycar_core::prelude::{Pose, Real};
use std::f64::consts::FRAC_PI_2;

// =========================================================================
// == Z-up World <-> Bevy Conversion Helpers ==
// =========================================================================

/// Rotation taking Z-up world basis vectors to Bevy's Y-up frame.
/// X stays X, world Y becomes Bevy -Z, world Z (up) becomes Bevy Y.
/// This is a -90 degree rotation about X.
pub fn z_up_frame_to_bevy() -> UnitQuaternion<Real> {
    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2)
}

/// Converts a vector or point from the Z-up world into Bevy's frame.
pub fn z_up_vector_to_bevy(v: &Vector3<Real>) -> BevyVec3 {
    BevyVec3::new(v.x as f32, v.z as f32, -v.y as f32)
}

/// Converts a vector or point from Bevy's frame into the Z-up world.
pub fn bevy_vector_to_z_up(v: &BevyVec3) -> Vector3<Real> {
    Vector3::new(v.x as Real, -v.z as Real, v.y as Real)
}

/// Converts an object orientation. The frame change conjugates the rotation so
/// that a yaw about world Z becomes a yaw about Bevy Y.
pub fn z_up_quat_to_bevy(q: &UnitQuaternion<Real>) -> BevyQuat {
    let frame = z_up_frame_to_bevy();
    let r = frame * q * frame.inverse();
    BevyQuat::from_xyzw(
        r.coords.x as f32,
        r.coords.y as f32,
        r.coords.z as f32,
        r.coords.w as f32,
    )
}

pub fn bevy_quat_to_z_up(q: &BevyQuat) -> UnitQuaternion<Real> {
    let bevy = UnitQuaternion::from_quaternion(Quaternion::new(
        q.w as Real,
        q.x as Real,
        q.y as Real,
        q.z as Real,
    ));
    let frame = z_up_frame_to_bevy();
    frame.inverse() * bevy * frame
}

pub fn pose_to_bevy_transform(pose: &Pose) -> BevyTransform {
    BevyTransform {
        translation: z_up_vector_to_bevy(&pose.position),
        rotation: z_up_quat_to_bevy(&pose.orientation),
        scale: BevyVec3::ONE,
    }
}

pub fn bevy_transform_to_pose(transform: &BevyTransform) -> Pose {
    Pose::new(
        bevy_vector_to_z_up(&transform.translation),
        bevy_quat_to_z_up(&transform.rotation),
    )
}

/// Box dimensions expressed along the local axes of a converted orientation.
/// Sizes are unsigned, so only the axes swap.
pub fn z_up_extent_to_bevy(size: &Vector3<Real>) -> BevyVec3 {
    BevyVec3::new(size.x as f32, size.z as f32, size.y as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI as PI_F32;
    use std::f64::consts::PI;

    const F64_EPSILON: f64 = 1e-6;
    const F32_EPSILON: f32 = 1e-5;

    fn assert_bevy_quat_approx_eq(a: &BevyQuat, b: &BevyQuat) {
        // q and -q are the same rotation.
        let dot = a.dot(*b);
        assert!(dot.abs() > 1.0 - F32_EPSILON, "{a:?} vs {b:?}, dot {dot}");
    }

    fn assert_bevy_vec3_approx_eq(a: BevyVec3, b: BevyVec3) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = F32_EPSILON);
        assert_abs_diff_eq!(a.y, b.y, epsilon = F32_EPSILON);
        assert_abs_diff_eq!(a.z, b.z, epsilon = F32_EPSILON);
    }

    #[test]
    fn frame_rotation_matches_the_component_swap() {
        let v = Vector3::new(0.3, -1.7, 2.2);
        let rotated = z_up_frame_to_bevy() * v;
        assert_bevy_vec3_approx_eq(z_up_vector_to_bevy(&v), z_up_vector_to_bevy_raw(&rotated));
    }

    // Reads a vector already expressed in Bevy axes.
    fn z_up_vector_to_bevy_raw(v: &Vector3<Real>) -> BevyVec3 {
        BevyVec3::new(v.x as f32, v.y as f32, v.z as f32)
    }

    #[test]
    fn up_maps_to_bevy_y_and_back() {
        let up = z_up_vector_to_bevy(&Vector3::z());
        assert_bevy_vec3_approx_eq(up, BevyVec3::Y);

        let v = Vector3::new(1.0, 2.0, 3.0);
        let bevy = z_up_vector_to_bevy(&v);
        assert_bevy_vec3_approx_eq(bevy, BevyVec3::new(1.0, 3.0, -2.0));
        let back = bevy_vector_to_z_up(&bevy);
        assert_abs_diff_eq!(back, v, epsilon = F64_EPSILON);
    }

    #[test]
    fn yaw_about_z_becomes_yaw_about_bevy_y() {
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI / 2.0);
        assert_bevy_quat_approx_eq(
            &z_up_quat_to_bevy(&yaw),
            &BevyQuat::from_rotation_y(PI_F32 / 2.0),
        );

        let back = bevy_quat_to_z_up(&BevyQuat::from_rotation_y(PI_F32 / 2.0));
        assert!(back.angle_to(&yaw) < F64_EPSILON);
    }

    #[test]
    fn roll_about_x_is_unchanged() {
        let roll = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.7);
        assert_bevy_quat_approx_eq(&z_up_quat_to_bevy(&roll), &BevyQuat::from_rotation_x(0.7));
    }

    #[test]
    fn spawn_heading_faces_bevy_positive_z() {
        // Spawn yaw of -90 degrees points chassis +X along world -Y.
        let pose = Pose::new(
            Vector3::new(0.0, 0.0, 2.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -PI / 2.0),
        );
        let transform = pose_to_bevy_transform(&pose);
        assert_bevy_vec3_approx_eq(transform.translation, BevyVec3::new(0.0, 2.0, 0.0));
        assert_bevy_vec3_approx_eq(transform.rotation * BevyVec3::X, BevyVec3::Z);
    }

    #[test]
    fn pose_round_trips_through_a_transform() {
        let pose = Pose::new(
            Vector3::new(1.0, 2.0, 0.5),
            UnitQuaternion::from_euler_angles(0.1, -0.2, PI / 4.0),
        );
        let back = bevy_transform_to_pose(&pose_to_bevy_transform(&pose));
        assert_abs_diff_eq!(back.position, pose.position, epsilon = F64_EPSILON);
        assert!(back.orientation.angle_to(&pose.orientation) < 1e-5);
    }

    #[test]
    fn box_extents_follow_the_converted_axes() {
        // A chassis-frame box: 2 long, 1 wide, 0.5 tall.
        let size = Vector3::new(2.0, 1.0, 0.5);
        let orientation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.3);
        let rotation = z_up_quat_to_bevy(&orientation);
        let extent = z_up_extent_to_bevy(&size);

        // The long side points along the converted chassis X axis.
        let long_axis = rotation * BevyVec3::X * extent.x;
        let expected = z_up_vector_to_bevy(&(orientation * Vector3::x() * 2.0));
        assert_bevy_vec3_approx_eq(long_axis, expected);

        // The height lies along the converted chassis Z (Bevy local Y).
        let tall_axis = rotation * BevyVec3::Y * extent.y;
        let expected = z_up_vector_to_bevy(&(orientation * Vector3::z() * 0.5));
        assert_bevy_vec3_approx_eq(tall_axis, expected);
    }
}
