//! The world as seen from inside a tick
//!
//! Every entity callback gets `&mut SimInterface`: the entity index, the
//! collision index, the random engines, this tick's inputs, and the effect
//! output. Nothing here touches wall-clock time or floating point state that
//! could differ between machines.

use std::cell::RefCell;
use std::rc::Rc;

use super::components::{Destroy, GlobalData, Player, Transform};
use super::emit::{EmitOutput, Effect, ResolveKey, Sound, SoundRequest, pan_for};
use super::health::DamageType;
use super::input::InputFrame;
use super::random::{RandomEngine, RandomEngines, RandomSource};
use super::shape;
use crate::collision::{
    Collision, CollisionHit, IndexEntry, RangeHit, SharedCollisionIndex, new_collision_index,
};
use crate::config::SimConfig;
use crate::ecs::{Bundle, EntityHandle, EntityId, EntityIndex, EntityRef};
use crate::geom::{CheckQuery, Colour, ShapeFlag};
use crate::math::{FVec2, Fixed};

pub struct SimInterface {
    index: EntityIndex,
    collision: SharedCollisionIndex,
    random: RandomEngines,
    emit: EmitOutput,
    inputs: Vec<InputFrame>,
    config: SimConfig,
    global: EntityId,
    tick: u64,
}

impl SimInterface {
    pub fn new(config: SimConfig, seed: u64) -> Self {
        let collision: SharedCollisionIndex = Rc::new(RefCell::new(new_collision_index(&config)));
        let mut index = EntityIndex::new();
        link_collision(&mut index, &collision);
        let global = index.create_with((GlobalData::default(),)).id();
        log::debug!(
            "sim interface ready: seed {seed}, {} collision, {} players",
            config.collision.as_str(),
            config.player_count
        );
        Self {
            index,
            collision,
            random: RandomEngines::new(seed),
            emit: EmitOutput::new(),
            inputs: Vec::new(),
            config,
            global,
            tick: 0,
        }
    }

    // Entities

    pub fn index(&self) -> &EntityIndex {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut EntityIndex {
        &mut self.index
    }

    pub fn create(&mut self) -> EntityHandle<'_> {
        self.index.create()
    }

    pub fn create_with<B: Bundle>(&mut self, bundle: B) -> EntityHandle<'_> {
        self.index.create_with(bundle)
    }

    pub fn get(&mut self, id: EntityId) -> Option<EntityHandle<'_>> {
        self.index.get(id)
    }

    pub fn get_ref(&self, id: EntityId) -> Option<EntityRef<'_>> {
        self.index.get_ref(id)
    }

    pub fn component<C: 'static>(&self, id: EntityId) -> Option<&C> {
        self.index.component(id)
    }

    pub fn component_mut<C: 'static>(&mut self, id: EntityId) -> Option<&mut C> {
        self.index.component_mut(id)
    }

    pub fn count<C: 'static>(&self) -> usize {
        self.index.count::<C>()
    }

    /// Mark `id` for removal at the end of the tick. The first mark wins.
    pub fn destroy(&mut self, id: EntityId, source: Option<EntityId>, damage_type: DamageType) {
        let Some(mut entity) = self.index.get(id) else {
            return;
        };
        if entity.has::<Destroy>() {
            return;
        }
        entity.emplace(Destroy {
            source,
            damage_type,
        });
    }

    /// Gone, or on its way out
    pub fn is_destroyed(&self, id: EntityId) -> bool {
        self.index.get_ref(id).is_none_or(|e| e.has::<Destroy>())
    }

    /// Re-evaluate shape parameters and move the collision entry after the
    /// entity changed its transform
    pub fn refresh(&mut self, id: EntityId) {
        shape::refresh_parameters(&mut self.index, id);
        let Some(entity) = self.index.get_ref(id) else {
            return;
        };
        if let (Some(_), Some(transform)) = (entity.get::<Collision>(), entity.get::<Transform>()) {
            self.collision.borrow_mut().update(id, transform.centre);
        }
    }

    // World state

    pub fn global_id(&self) -> EntityId {
        self.global
    }

    pub fn global(&self) -> Option<&GlobalData> {
        self.index.component(self.global)
    }

    pub fn global_mut(&mut self) -> Option<&mut GlobalData> {
        self.index.component_mut(self.global)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Ticks completed so far
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub(crate) fn finish_tick(&mut self) {
        self.tick += 1;
    }

    pub fn world_size(&self) -> FVec2 {
        FVec2::from_ints(self.config.world_width, self.config.world_height)
    }

    pub fn is_on_screen(&self, p: FVec2) -> bool {
        let size = self.world_size();
        p.x >= Fixed::ZERO && p.y >= Fixed::ZERO && p.x <= size.x && p.y <= size.y
    }

    /// Clamp into the world rectangle, `margin` in from every edge
    pub fn clamp_to_world(&self, p: FVec2, margin: Fixed) -> FVec2 {
        let m = FVec2::splat(margin);
        p.clamp(m, self.world_size() - m)
    }

    // Input

    pub(crate) fn set_inputs(&mut self, inputs: &[InputFrame]) {
        self.inputs.clear();
        self.inputs.extend_from_slice(inputs);
    }

    /// Input for player `number`; idle when none was supplied
    pub fn input(&self, number: u32) -> InputFrame {
        self.inputs.get(number as usize).copied().unwrap_or_default()
    }

    // Randomness

    pub fn random(&mut self, source: RandomSource) -> &mut RandomEngine {
        self.random.get(source)
    }

    pub fn random_draws(&self, source: RandomSource) -> u64 {
        self.random.draws(source)
    }

    // Players

    pub fn players(&self) -> Vec<EntityId> {
        self.index.ids::<Player>()
    }

    pub fn player_by_number(&self, number: u32) -> Option<EntityId> {
        self.index
            .components::<Player>()
            .find(|(_, p)| p.number == number)
            .map(|(id, _)| id)
    }

    /// Closest live player; ties go to the lower id
    pub fn nearest_player(&self, p: FVec2) -> Option<EntityId> {
        self.index
            .components::<Player>()
            .filter_map(|(id, _)| {
                let entity = self.index.get_ref(id)?;
                if entity.has::<Destroy>() {
                    return None;
                }
                let t = entity.get::<Transform>()?;
                Some((t.centre.distance_squared(p), id))
            })
            .min()
            .map(|(_, id)| id)
    }

    // Collision

    fn query(&self, query: CheckQuery) -> CheckQuery {
        query.legacy(self.config.legacy_ngon_collision)
    }

    pub fn any_collision(&self, query: &CheckQuery) -> bool {
        self.collision.borrow().any_collision(&self.index, query)
    }

    pub fn collide(&self, query: &CheckQuery) -> Vec<CollisionHit> {
        self.collision.borrow().collide(&self.index, query)
    }

    pub fn collide_point(&self, p: FVec2, mask: ShapeFlag) -> Vec<CollisionHit> {
        self.collide(&self.query(CheckQuery::point(p, mask)))
    }

    pub fn collide_ball(&self, centre: FVec2, radius: Fixed, mask: ShapeFlag) -> Vec<CollisionHit> {
        self.collide(&self.query(CheckQuery::ball(centre, radius, mask)))
    }

    pub fn first_collision_point(&self, p: FVec2, mask: ShapeFlag) -> Option<CollisionHit> {
        let query = self.query(CheckQuery::point(p, mask));
        self.collision.borrow().first_collision(&self.index, &query)
    }

    pub fn any_collision_point(&self, p: FVec2, mask: ShapeFlag) -> bool {
        let query = self.query(CheckQuery::point(p, mask));
        self.collision.borrow().any_collision(&self.index, &query)
    }

    pub fn any_collision_ball(&self, centre: FVec2, radius: Fixed, mask: ShapeFlag) -> bool {
        let query = self.query(CheckQuery::ball(centre, radius, mask));
        self.collision.borrow().any_collision(&self.index, &query)
    }

    /// See [`crate::collision::CollisionIndex::in_range`]
    pub fn in_range(&self, centre: FVec2, radius: Fixed, flags: ShapeFlag, max_n: usize) -> Vec<RangeHit> {
        self.collision.borrow().in_range(centre, radius, flags, max_n)
    }

    pub(crate) fn begin_collision_tick(&mut self) {
        self.collision.borrow_mut().begin_tick();
    }

    pub fn collision_len(&self) -> usize {
        self.collision.borrow().len()
    }

    // Effects

    pub fn emit(&mut self) -> &mut EmitOutput {
        &mut self.emit
    }

    pub fn play_sound(&mut self, sound: Sound, position: FVec2) {
        self.play_sound_request(SoundRequest::new(sound, position));
    }

    /// Pans the request across the configured world width
    pub fn play_sound_request(&mut self, mut request: SoundRequest) {
        request.pan = pan_for(request.position, self.config.world_width);
        self.emit.push(Effect::Sound(request));
    }

    /// Particle burst; the spread is drawn from the legacy aesthetic engine
    pub fn explosion_effect(&mut self, position: FVec2, colour: Colour, particles: u32) -> Effect {
        let seed = self.random.get(RandomSource::LegacyAesthetic).next_u32();
        Effect::Explosion {
            position,
            colour,
            particles,
            seed,
        }
    }

    pub fn explosion(&mut self, position: FVec2, colour: Colour, particles: u32) {
        let effect = self.explosion_effect(position, colour, particles);
        self.emit.push(effect);
    }

    pub fn rumble(&mut self, player: u32, ticks: u32) {
        self.emit.push(Effect::Rumble { player, ticks });
    }

    /// Emit once per `(tick, entity, slot)`
    pub fn emit_keyed(&mut self, entity: EntityId, slot: u32, effect: Effect) -> bool {
        let key = ResolveKey {
            tick: self.tick,
            entity,
            slot,
        };
        self.emit.push_keyed(key, effect)
    }
}

/// Keep the collision index in step with `Collision` components
fn link_collision(index: &mut EntityIndex, collision: &SharedCollisionIndex) {
    let shared = Rc::clone(collision);
    index.on_component_add::<Collision>(move |entity| {
        let Some(c) = entity.get::<Collision>() else {
            return;
        };
        let centre = entity.get::<Transform>().map_or(FVec2::ZERO, |t| t.centre);
        shared.borrow_mut().add(
            entity.id(),
            IndexEntry {
                centre,
                bounding_width: c.bounding_width,
                flags: c.flags,
            },
        );
    });

    let shared = Rc::clone(collision);
    index.on_component_add::<Transform>(move |entity| {
        if let Some(t) = entity.get::<Transform>() {
            shared.borrow_mut().update(entity.id(), t.centre);
        }
    });

    let shared = Rc::clone(collision);
    index.on_component_remove::<Collision>(move |entity| {
        shared.borrow_mut().remove(entity.id());
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollisionMode;

    fn sim() -> SimInterface {
        SimInterface::new(SimConfig::default(), 1)
    }

    fn shield_box(sim: &mut SimInterface, x: i32, y: i32) -> EntityId {
        sim.create_with((
            Transform::at(FVec2::from_ints(x, y)),
            Collision::bounding_box(ShapeFlag::SHIELD, Fixed::from_int(5)),
        ))
        .id()
    }

    #[test]
    fn test_collision_index_follows_components() {
        for mode in [CollisionMode::Grid, CollisionMode::Legacy] {
            let config = SimConfig {
                collision: mode,
                ..SimConfig::default()
            };
            let mut sim = SimInterface::new(config, 1);
            let a = shield_box(&mut sim, 100, 100);
            let b = shield_box(&mut sim, 300, 100);
            sim.begin_collision_tick();
            assert_eq!(sim.collision_len(), 2);

            let hits = sim.collide_point(FVec2::from_ints(102, 98), ShapeFlag::SHIELD);
            assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![a]);

            if let Some(t) = sim.component_mut::<Transform>(b) {
                t.centre = FVec2::from_ints(101, 101);
            }
            sim.refresh(b);
            sim.begin_collision_tick();
            let hits = sim.collide_point(FVec2::from_ints(102, 98), ShapeFlag::SHIELD);
            assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![a, b]);

            sim.index_mut().destroy(a);
            assert_eq!(sim.collision_len(), 1);
            assert!(sim.any_collision_point(FVec2::from_ints(102, 98), ShapeFlag::SHIELD));
            assert!(!sim.any_collision_point(FVec2::from_ints(102, 98), ShapeFlag::VULNERABLE));
        }
    }

    #[test]
    fn test_transform_added_after_collision() {
        let mut sim = sim();
        let id = sim
            .create_with((Collision::bounding_box(ShapeFlag::VULNERABLE, Fixed::from_int(4)),))
            .id();
        if let Some(mut e) = sim.get(id) {
            e.emplace(Transform::at(FVec2::from_ints(50, 50)));
        }
        sim.begin_collision_tick();
        assert!(sim.any_collision_ball(FVec2::from_ints(56, 50), Fixed::from_int(3), ShapeFlag::ALL));
        assert!(!sim.any_collision_point(FVec2::ZERO, ShapeFlag::ALL));
    }

    #[test]
    fn test_destroy_first_mark_wins() {
        let mut sim = sim();
        let id = sim.create().id();
        let source = Some(EntityId::from_raw(99));
        sim.destroy(id, source, DamageType::Bomb);
        sim.destroy(id, None, DamageType::Normal);
        let mark = sim.component::<Destroy>(id).copied();
        assert_eq!(
            mark,
            Some(Destroy {
                source,
                damage_type: DamageType::Bomb
            })
        );
        assert!(sim.is_destroyed(id));
        assert!(sim.is_destroyed(EntityId::from_raw(1000)));
    }

    #[test]
    fn test_nearest_player() {
        let mut sim = sim();
        assert_eq!(sim.nearest_player(FVec2::ZERO), None);
        let far = sim
            .create_with((Player::new(0), Transform::at(FVec2::from_ints(100, 0))))
            .id();
        let near = sim
            .create_with((Player::new(1), Transform::at(FVec2::from_ints(10, 0))))
            .id();
        assert_eq!(sim.nearest_player(FVec2::ZERO), Some(near));
        sim.destroy(near, None, DamageType::Normal);
        assert_eq!(sim.nearest_player(FVec2::ZERO), Some(far));
        assert_eq!(sim.player_by_number(1), Some(near));
    }

    #[test]
    fn test_input_defaults_to_idle() {
        let mut sim = sim();
        let frame = InputFrame::moving(FVec2::from_ints(1, 0));
        sim.set_inputs(&[frame]);
        assert_eq!(sim.input(0), frame);
        assert_eq!(sim.input(3), InputFrame::default());
    }

    #[test]
    fn test_keyed_effects_per_tick() {
        let mut sim = sim();
        let id = sim.create().id();
        let effect = || Effect::Rumble { player: 0, ticks: 5 };
        assert!(sim.emit_keyed(id, 0, effect()));
        assert!(!sim.emit_keyed(id, 0, effect()));
        sim.finish_tick();
        assert!(sim.emit_keyed(id, 0, effect()));
        assert_eq!(sim.emit().take().len(), 2);
    }

    #[test]
    fn test_sound_pan_follows_world_width() {
        let config = SimConfig {
            world_width: 1000,
            ..SimConfig::default()
        };
        let mut sim = SimInterface::new(config, 1);
        sim.play_sound(Sound::EnemyHit, FVec2::from_ints(500, 10));
        sim.play_sound_request(SoundRequest::new(Sound::Bomb, FVec2::from_ints(750, 10)).volume(0.5));
        let pans: Vec<f32> = sim
            .emit()
            .take()
            .iter()
            .filter_map(|e| match e {
                Effect::Sound(s) => Some(s.pan),
                _ => None,
            })
            .collect();
        assert_eq!(pans, vec![0.0, 0.5]);
    }

    #[test]
    fn test_world_bounds() {
        let sim = sim();
        assert!(sim.is_on_screen(FVec2::from_ints(0, 0)));
        assert!(!sim.is_on_screen(FVec2::from_ints(-1, 5)));
        let p = sim.clamp_to_world(FVec2::from_ints(-50, 9000), Fixed::from_int(8));
        assert_eq!(p, FVec2::new(Fixed::from_int(8), sim.world_size().y - Fixed::from_int(8)));
        assert!(sim.global().is_some());
    }
}
