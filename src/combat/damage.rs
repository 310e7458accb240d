//! Damage sources, contact damage and death handling.
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::combat::{DamageOutcome, Health};
use crate::physics::Collider;

/// Boxes closer than this count as touching.
pub const CONTACT_SKIN: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DamageKind {
    /// Full amount per hit.
    #[default]
    Instant,
    /// Amount per second, scaled by the frame time.
    OverTime,
}

/// Something that deals damage, by contact or through a weapon.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DamageSource {
    pub base: f32,
    pub kind: DamageKind,
}

impl DamageSource {
    #[must_use]
    pub fn new(base: f32, kind: DamageKind) -> Self {
        Self { base, kind }
    }

    /// Damage dealt for one application over a frame of `dt` seconds.
    #[must_use]
    pub fn amount(&self, dt: f32) -> f32 {
        match self.kind {
            DamageKind::Instant => self.base,
            DamageKind::OverTime => self.base * dt,
        }
    }
}

/// Entities on the same team never damage each other by contact.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Team(pub u32);

/// Sent once when an entity's health reaches zero.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeathEvent {
    pub entity: Entity,
}

/// Remove the entity from the world when it dies.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct DespawnOnDeath;

/// Source/target pairs that were touching last frame.
#[derive(Resource, Debug, Default)]
pub struct ContactLedger {
    touching: HashSet<(Entity, Entity)>,
}

impl ContactLedger {
    #[must_use]
    pub fn is_touching(&self, source: Entity, target: Entity) -> bool {
        self.touching.contains(&(source, target))
    }
}

/// Apply `amount` to `health` and report a kill.
pub fn deal_damage(
    entity: Entity,
    health: &mut Health,
    amount: f32,
    deaths: &mut EventWriter<DeathEvent>,
) -> DamageOutcome {
    let outcome = health.take_damage(amount);
    match outcome {
        DamageOutcome::Killed => {
            info!("{entity:?} died");
            deaths.send(DeathEvent { entity });
        }
        DamageOutcome::Damaged { remaining } => debug!("{entity:?} took {amount:.2} damage, {remaining:.2} left"),
        DamageOutcome::Ignored => {}
    }
    outcome
}

/// Whether two boxes overlap or sit within [`CONTACT_SKIN`] of each other.
#[must_use]
pub fn in_contact(a_center: Vec3, a: &Collider, b_center: Vec3, b: &Collider) -> bool {
    let gap = (a_center - b_center).abs() - (a.half_extents + b.half_extents);
    gap.max_element() < CONTACT_SKIN
}

/// Contact damage between `DamageSource` colliders and `Health` colliders.
///
/// `Instant` sources hit once when contact begins; `OverTime` sources hit
/// every frame while touching. Same-team pairs are skipped.
#[allow(clippy::needless_pass_by_value)]
pub fn apply_contact_damage(
    time: Res<Time>,
    mut ledger: ResMut<ContactLedger>,
    sources: Query<(Entity, &Transform, &Collider, &DamageSource, Option<&Team>)>,
    mut targets: Query<(Entity, &Transform, &Collider, &mut Health, Option<&Team>)>,
    mut deaths: EventWriter<DeathEvent>,
) {
    let dt = time.delta_seconds();
    let mut touching = HashSet::new();

    for (source, s_tf, s_col, damage, s_team) in &sources {
        for (target, t_tf, t_col, mut health, t_team) in &mut targets {
            if source == target || !in_contact(s_tf.translation, s_col, t_tf.translation, t_col) {
                continue;
            }
            if s_team.is_some() && s_team == t_team {
                continue;
            }
            touching.insert((source, target));
            let fresh = !ledger.is_touching(source, target);
            if damage.kind == DamageKind::OverTime || fresh {
                deal_damage(target, &mut health, damage.amount(dt), &mut deaths);
            }
        }
    }

    ledger.touching = touching;
}

/// Despawn entities marked [`DespawnOnDeath`] when they die.
pub fn despawn_dead(
    mut commands: Commands,
    mut deaths: EventReader<DeathEvent>,
    marked: Query<(), With<DespawnOnDeath>>,
) {
    for death in deaths.read() {
        if marked.contains(death.entity) {
            commands.entity(death.entity).despawn_recursive();
        }
    }
}
