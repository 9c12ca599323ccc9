//! Navigation systems.

use bevy::prelude::*;

use super::{yaw_of, yaw_towards, KinematicNavigator};
use crate::combat::Dead;

/// System: move every navigator toward its destination.
///
/// Position is integrated here; yaw turns toward the velocity at
/// `angular_speed`. Halted navigators keep whatever facing AI assigned.
pub fn steer_navigators(
    time: Res<Time<Fixed>>,
    mut movers: Query<(&mut Transform, &mut KinematicNavigator), Without<Dead>>,
) {
    let delta = time.delta_secs();
    if delta <= 0.0 {
        return;
    }

    for (mut transform, mut navigator) in movers.iter_mut() {
        navigator.sync_position(transform.translation);

        let velocity = navigator.step(delta);
        if velocity == Vec3::ZERO {
            continue;
        }

        transform.translation += velocity * delta;
        navigator.sync_position(transform.translation);

        if let Some(desired) = yaw_towards(velocity) {
            let current = yaw_of(transform.rotation);
            let max_turn = navigator.angular_speed.to_radians() * delta;
            let diff = wrap_angle(desired - current);
            let turn = diff.clamp(-max_turn, max_turn);
            transform.rotation = Quat::from_rotation_y(current + turn);
        }
    }
}

/// Wraps an angle into `[-PI, PI]`.
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU);
    wrapped - std::f32::consts::PI
}
