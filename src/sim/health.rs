//! Hit points and damage
//!
//! Damage processing for one hit:
//! 1. ignored if the entity is gone, has no [`Health`], or is already marked
//!    for destruction
//! 2. the damage transform may rewrite the amount; zero stops here
//! 3. on-hit hook, then hit sound
//! 4. hit points drop; at zero the destroy sound, rumble and on-destroy hook
//!    run and the entity is marked [`Destroy`]

use std::rc::Rc;

use super::components::{Destroy, Player, Transform};
use super::emit::Sound;
use super::interface::SimInterface;
use crate::ecs::EntityId;
use crate::math::FVec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DamageType {
    #[default]
    Normal,
    /// Ignores shields
    Penetrating,
    Bomb,
}

/// Rewrites the amount of an incoming hit
pub type DamageTransformFn = Rc<dyn Fn(&mut SimInterface, EntityId, u32, DamageType) -> u32>;
/// Hit and destroy hooks: `(sim, target, damage type, source)`
pub type DamageHookFn = Rc<dyn Fn(&mut SimInterface, EntityId, DamageType, Option<EntityId>)>;

#[derive(Clone)]
pub struct Health {
    pub hp: u32,
    pub max_hp: u32,
    pub hit_sound: Option<Sound>,
    pub destroy_sound: Option<Sound>,
    /// Rumble ticks for the destroying player; zero for none
    pub destroy_rumble: u32,
    damage_transform: Option<DamageTransformFn>,
    on_hit: Option<DamageHookFn>,
    on_destroy: Option<DamageHookFn>,
}

impl Health {
    pub fn new(hp: u32) -> Self {
        Self {
            hp,
            max_hp: hp,
            hit_sound: None,
            destroy_sound: None,
            destroy_rumble: 0,
            damage_transform: None,
            on_hit: None,
            on_destroy: None,
        }
    }

    pub fn sounds(mut self, hit: Option<Sound>, destroy: Option<Sound>) -> Self {
        self.hit_sound = hit;
        self.destroy_sound = destroy;
        self
    }

    pub fn destroy_rumble(mut self, ticks: u32) -> Self {
        self.destroy_rumble = ticks;
        self
    }

    pub fn damage_transform(
        mut self,
        f: impl Fn(&mut SimInterface, EntityId, u32, DamageType) -> u32 + 'static,
    ) -> Self {
        self.damage_transform = Some(Rc::new(f));
        self
    }

    pub fn on_hit(
        mut self,
        f: impl Fn(&mut SimInterface, EntityId, DamageType, Option<EntityId>) + 'static,
    ) -> Self {
        self.on_hit = Some(Rc::new(f));
        self
    }

    pub fn on_destroy(
        mut self,
        f: impl Fn(&mut SimInterface, EntityId, DamageType, Option<EntityId>) + 'static,
    ) -> Self {
        self.on_destroy = Some(Rc::new(f));
        self
    }

    pub fn is_dead(&self) -> bool {
        self.hp == 0
    }
}

/// Apply `amount` damage to `id`. Returns true if this hit destroyed it.
pub fn damage(
    sim: &mut SimInterface,
    id: EntityId,
    amount: u32,
    damage_type: DamageType,
    source: Option<EntityId>,
) -> bool {
    let Some(entity) = sim.get_ref(id) else {
        return false;
    };
    if entity.has::<Destroy>() {
        return false;
    }
    let Some(health) = entity.get::<Health>().cloned() else {
        return false;
    };
    let position = entity
        .get::<Transform>()
        .map_or(FVec2::ZERO, |t| t.centre);

    let mut amount = amount;
    if let Some(transform) = &health.damage_transform {
        amount = transform(sim, id, amount, damage_type);
        if amount == 0 {
            return false;
        }
    }

    if let Some(on_hit) = &health.on_hit {
        on_hit(sim, id, damage_type, source);
    }
    if let Some(sound) = health.hit_sound {
        sim.play_sound(sound, position);
    }

    // Hooks may have removed the component or marked the entity already
    if sim.is_destroyed(id) {
        return false;
    }
    let Some(current) = sim.component_mut::<Health>(id) else {
        return false;
    };
    current.hp = current.hp.saturating_sub(amount);
    if current.hp > 0 {
        return false;
    }

    if let Some(sound) = health.destroy_sound {
        sim.play_sound(sound, position);
    }
    if health.destroy_rumble > 0 {
        let player = source
            .and_then(|s| sim.get_ref(s))
            .and_then(|e| e.get::<Player>())
            .map(|p| p.number);
        if let Some(player) = player {
            sim.rumble(player, health.destroy_rumble);
        }
    }
    if let Some(on_destroy) = &health.on_destroy {
        on_destroy(sim, id, damage_type, source);
    }
    log::trace!("{id} destroyed by {source:?} ({damage_type:?})");
    sim.destroy(id, source, damage_type);
    true
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::config::SimConfig;
    use crate::sim::emit::Effect;

    fn sim() -> SimInterface {
        SimInterface::new(SimConfig::default(), 3)
    }

    #[test]
    fn test_destroyed_exactly_once() {
        let mut sim = sim();
        let destroyed = Rc::new(Cell::new(0));
        let counter = Rc::clone(&destroyed);
        let health = Health::new(10).on_destroy(move |_, _, _, _| counter.set(counter.get() + 1));
        let id = sim.create_with((health,)).id();

        assert!(!damage(&mut sim, id, 5, DamageType::Normal, None));
        assert_eq!(sim.component::<Health>(id).map(|h| h.hp), Some(5));
        assert!(!sim.get_ref(id).is_some_and(|e| e.has::<Destroy>()));

        assert!(damage(&mut sim, id, 5, DamageType::Normal, None));
        assert_eq!(sim.component::<Health>(id).map(|h| h.hp), Some(0));
        assert!(sim.get_ref(id).is_some_and(|e| e.has::<Destroy>()));
        assert_eq!(destroyed.get(), 1);

        // Already marked; ignored
        assert!(!damage(&mut sim, id, 5, DamageType::Normal, None));
        assert_eq!(destroyed.get(), 1);
    }

    #[test]
    fn test_zero_transform_stops_processing() {
        let mut sim = sim();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let health = Health::new(3)
            .damage_transform(|_, _, amount, kind| if kind == DamageType::Bomb { amount } else { 0 })
            .on_hit(move |_, _, _, _| counter.set(counter.get() + 1))
            .sounds(Some(Sound::EnemyHit), None);
        let id = sim.create_with((health,)).id();

        assert!(!damage(&mut sim, id, 2, DamageType::Normal, None));
        assert_eq!(hits.get(), 0);
        assert!(sim.emit().effects().is_empty());
        assert_eq!(sim.component::<Health>(id).map(|h| h.hp), Some(3));

        assert!(!damage(&mut sim, id, 2, DamageType::Bomb, None));
        assert_eq!(hits.get(), 1);
        assert_eq!(sim.emit().effects().len(), 1);
        assert_eq!(sim.component::<Health>(id).map(|h| h.hp), Some(1));
    }

    #[test]
    fn test_destroy_effects_and_source() {
        let mut sim = sim();
        let player = sim.create_with((Player::new(2),)).id();
        let health = Health::new(1)
            .sounds(Some(Sound::EnemyHit), Some(Sound::EnemyDestroy))
            .destroy_rumble(10);
        let id = sim
            .create_with((health, Transform::at(FVec2::from_ints(320, 10))))
            .id();

        assert!(damage(&mut sim, id, 4, DamageType::Penetrating, Some(player)));
        let effects = sim.emit().take();
        assert_eq!(effects.len(), 3);
        assert!(matches!(&effects[0], Effect::Sound(s) if s.sound == Sound::EnemyHit));
        assert!(matches!(&effects[1], Effect::Sound(s) if s.sound == Sound::EnemyDestroy && s.pan == 0.0));
        assert_eq!(effects[2], Effect::Rumble { player: 2, ticks: 10 });
        assert_eq!(
            sim.component::<Destroy>(id).copied(),
            Some(Destroy {
                source: Some(player),
                damage_type: DamageType::Penetrating
            })
        );
    }

    #[test]
    fn test_without_health_ignored() {
        let mut sim = sim();
        let id = sim.create().id();
        assert!(!damage(&mut sim, id, 100, DamageType::Normal, None));
        assert!(!sim.is_destroyed(id));
        assert!(!damage(&mut sim, EntityId::from_raw(500), 1, DamageType::Normal, None));
    }
}
