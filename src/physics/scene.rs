//! ECS side of the box-collider host: a raycast `SystemParam` over the
//! scene's static colliders and the kinematic integration step.
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::{cast_ray_against, penetration, Collider, KinematicBody, LayerMask, QueryError, RayHit, Raycaster};

/// Raycast access to every static collider in the scene.
///
/// Kinematic bodies (the player) are never returned as hits.
#[derive(SystemParam)]
pub struct SceneColliders<'w, 's> {
    colliders: Query<
        'w,
        's,
        (Entity, &'static Transform, &'static Collider),
        (With<Collider>, Without<KinematicBody>),
    >,
}

impl Raycaster for SceneColliders<'_, '_> {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Result<Option<RayHit>, QueryError> {
        cast_ray_against(
            self.colliders.iter().map(|(e, tf, c)| (e, tf.translation, *c)),
            origin,
            direction,
            max_distance,
            mask,
        )
    }
}

/// Move kinematic bodies by their velocity and push them out of any static
/// collider on their collision mask. Velocity pointing into a surface is
/// cancelled so the next frame starts from rest against it.
///
/// Must run after every system that writes `KinematicBody::velocity`.
#[allow(clippy::needless_pass_by_value)]
pub fn integrate_bodies(
    time: Res<Time>,
    mut bodies: Query<(&mut Transform, &mut KinematicBody, &Collider)>,
    statics: Query<(&Transform, &Collider), Without<KinematicBody>>,
) {
    let dt = time.delta_seconds();
    for (mut tf, mut body, collider) in &mut bodies {
        let step = body.velocity * dt;
        tf.translation += step;

        for (s_tf, s_col) in &statics {
            if !s_col.layers.intersects(body.collision_mask) {
                continue;
            }
            let Some(push) =
                penetration(tf.translation, collider.half_extents, s_tf.translation, s_col.half_extents)
            else {
                continue;
            };
            tf.translation += push;
            let normal = push.normalize_or_zero();
            let into = body.velocity.dot(normal);
            if into < 0.0 {
                body.velocity -= normal * into;
            }
        }
    }
}
