//! "Use" action: look at something and press the interact key.
use bevy::prelude::*;

use crate::camera::{ActiveCamera, CameraDirectionProvider};
use crate::combat::Health;
use crate::input::PlayerAction;
use crate::interaction::ScreenRay;
use crate::physics::SceneColliders;

/// Something the player can use. `restore_health` heals whoever used it.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Interactable {
    pub label: String,
    pub restore_health: f32,
}

/// Gives an entity the ability to interact, with its own reach.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Interactor {
    pub ray: ScreenRay,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractEvent {
    pub target: Entity,
    pub actor: Entity,
}

/// Turn `Interact` actions into [`InteractEvent`]s for whatever
/// interactable sits under the crosshair.
#[allow(clippy::needless_pass_by_value)]
pub fn try_interact(
    mut actions: EventReader<PlayerAction>,
    camera: Res<ActiveCamera>,
    scene: SceneColliders,
    actors: Query<(Entity, &Interactor)>,
    interactables: Query<(), With<Interactable>>,
    mut events: EventWriter<InteractEvent>,
) {
    if !actions.read().any(|a| *a == PlayerAction::Interact) {
        return;
    }
    let facing = camera.active_facing();
    for (actor, interactor) in &actors {
        match interactor.ray.try_to_hit(&facing, &scene) {
            Ok(shot) => {
                if let Some(hit) = shot.hit
                    && interactables.contains(hit.entity)
                {
                    events.send(InteractEvent { target: hit.entity, actor });
                }
            }
            Err(e) => warn!("interact query failed: {e}"),
        }
    }
}

/// Run the effect of each interaction.
#[allow(clippy::needless_pass_by_value)]
pub fn apply_interactions(
    mut events: EventReader<InteractEvent>,
    interactables: Query<&Interactable>,
    mut healths: Query<&mut Health>,
) {
    for ev in events.read() {
        let Ok(item) = interactables.get(ev.target) else { continue };
        info!("{:?} used {}", ev.actor, item.label);
        if item.restore_health > 0.0
            && let Ok(mut health) = healths.get_mut(ev.actor)
        {
            let now = health.restore(item.restore_health);
            info!("{:?} health restored to {now:.0}", ev.actor);
        }
    }
}
