//! Fixed timestep simulation tick
//!
//! One call to [`Simulation::update`] runs, in order:
//! 1. inputs latched, collision index prepared, enemies recounted
//! 2. pre-update hooks
//! 3. every entity with an [`Update`] that existed when the pass started and
//!    is not marked [`Destroy`], in storage order; spawned entities wait for
//!    the next tick
//! 4. fireworks count down
//! 5. post-update hooks
//! 6. destroyed entities resolved: shatter and explosion effects, scoring,
//!    drop rolls
//! 7. marked entities removed, storage compacted

use super::components::{
    Destroy, DropKind, Enemy, Health, PendingDrop, Player, Shape, Transform, Update,
};
use super::emit::{Effect, Sound, SoundRequest};
use super::input::InputFrame;
use super::interface::SimInterface;
use super::random::RandomSource;
use crate::config::SimConfig;
use crate::ecs::EntityId;
use crate::geom::{self, LineSegment};
use crate::render::{self, RenderShape};

/// Threat destroyed between two drops
pub const DROP_THREAT: u32 = 12;
/// Particles per explosion centre
pub const EXPLOSION_PARTICLES: u32 = 24;
pub const FIREWORK_PARTICLES: u32 = 48;

/// Pre/post-update hook
pub type TickHook = Box<dyn FnMut(&mut SimInterface)>;

pub struct Simulation {
    sim: SimInterface,
    seed: u64,
    pre_update: Vec<TickHook>,
    post_update: Vec<TickHook>,
}

impl Simulation {
    pub fn new(config: SimConfig, seed: u64) -> Self {
        Self {
            sim: SimInterface::new(config, seed),
            seed,
            pre_update: Vec::new(),
            post_update: Vec::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn interface(&self) -> &SimInterface {
        &self.sim
    }

    pub fn interface_mut(&mut self) -> &mut SimInterface {
        &mut self.sim
    }

    pub fn tick_count(&self) -> u64 {
        self.sim.tick_count()
    }

    pub fn add_pre_update(&mut self, hook: impl FnMut(&mut SimInterface) + 'static) {
        self.pre_update.push(Box::new(hook));
    }

    pub fn add_post_update(&mut self, hook: impl FnMut(&mut SimInterface) + 'static) {
        self.post_update.push(Box::new(hook));
    }

    /// Advance the world by one tick. `inputs[n]` belongs to player `n`.
    pub fn update(&mut self, inputs: &[InputFrame]) {
        self.sim.set_inputs(inputs);
        // Resolve keys carry their tick; earlier ones can never repeat
        let tick = self.sim.tick_count();
        self.sim.emit().forget_before(tick);
        self.sim.begin_collision_tick();
        count_enemies(&mut self.sim);

        for hook in &mut self.pre_update {
            hook(&mut self.sim);
        }

        run_updates(&mut self.sim);
        tick_fireworks(&mut self.sim);

        for hook in &mut self.post_update {
            hook(&mut self.sim);
        }
        resolve_destroyed(&mut self.sim);

        let destroyed = self.sim.index().ids::<Destroy>();
        for id in &destroyed {
            self.sim.index_mut().destroy(*id);
        }
        self.sim.index_mut().compact();
        if !destroyed.is_empty() {
            log::trace!(
                "tick {}: removed {} entities",
                self.sim.tick_count(),
                destroyed.len()
            );
        }
        self.sim.finish_tick();
    }

    pub fn render(&self) -> Vec<RenderShape> {
        render::render_world(self.sim.index())
    }

    pub fn render_lines(&self) -> Vec<LineSegment> {
        render::world_lines(self.sim.index())
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        self.sim.emit().take()
    }

    /// Hash of the gameplay state: transforms, hit points, scores and the
    /// game random sequence position. Equal across machines for equal
    /// seeds and inputs.
    pub fn checksum(&self) -> u64 {
        let sim = &self.sim;
        let index = sim.index();
        let mut hash = Fnv::new();
        hash.write(sim.tick_count());
        hash.write(index.entity_count() as u64);
        hash.write(sim.random_draws(RandomSource::GameSequence));
        for (id, t) in index.components::<Transform>() {
            hash.write(id.raw() as u64);
            hash.write(t.centre.x.raw() as u64);
            hash.write(t.centre.y.raw() as u64);
            hash.write(t.rotation.raw() as u64);
        }
        for (id, h) in index.components::<Health>() {
            hash.write(id.raw() as u64);
            hash.write(h.hp as u64);
        }
        for (id, p) in index.components::<Player>() {
            hash.write(id.raw() as u64);
            hash.write(p.score);
            hash.write(p.kill_count as u64);
        }
        if let Some(global) = sim.global() {
            hash.write(global.score);
            hash.write(global.drop_counter as u64);
        }
        hash.finish()
    }
}

/// 64-bit FNV-1a
struct Fnv(u64);

impl Fnv {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    fn new() -> Self {
        Self(Self::OFFSET)
    }

    fn write(&mut self, value: u64) {
        for byte in value.to_le_bytes() {
            self.0 ^= byte as u64;
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

fn count_enemies(sim: &mut SimInterface) {
    let (count, threat) = sim
        .index()
        .components::<Enemy>()
        .filter(|(id, _)| !sim.is_destroyed(*id))
        .fold((0, 0), |(count, threat), (_, e)| (count + 1, threat + e.threat_value));
    if let Some(global) = sim.global_mut() {
        global.enemy_count = count;
        global.threat_total = threat;
    }
}

fn run_updates(sim: &mut SimInterface) {
    let mut cursor = sim.index_mut().cursor::<Update>(false);
    while let Some(id) = sim.index().advance(&mut cursor) {
        if sim.is_destroyed(id) {
            continue;
        }
        let Some(update) = sim.component::<Update>(id).cloned() else {
            continue;
        };
        (update.0)(sim, id);
        sim.refresh(id);
    }
    sim.index_mut().end_iteration(cursor);
}

fn resolve_destroyed(sim: &mut SimInterface) {
    for id in sim.index().ids::<Destroy>() {
        destruction_effects(sim, id);
        award_kill(sim, id);
    }
}

/// Shatter the outline and burst every centre of a destroyed entity that had
/// hit points; silent removals (expired shots and pickups) show nothing
fn destruction_effects(sim: &mut SimInterface, id: EntityId) {
    let Some(entity) = sim.get_ref(id) else {
        return;
    };
    if !entity.has::<Health>() {
        return;
    }
    let (Some(shape), Some(transform)) = (entity.get::<Shape>(), entity.get::<Transform>()) else {
        return;
    };
    let affine = Shape::affine(transform);
    let lines = geom::lines(&shape.node, &shape.params, affine);
    let centres = geom::centres(&shape.node, &shape.params, affine);

    sim.emit_keyed(id, 0, Effect::Shatter { lines });
    for (slot, centre) in (1..).zip(centres) {
        let effect = sim.explosion_effect(centre.position, centre.colour, EXPLOSION_PARTICLES);
        sim.emit_keyed(id, slot, effect);
    }
}

fn award_kill(sim: &mut SimInterface, id: EntityId) {
    let Some(entity) = sim.get_ref(id) else {
        return;
    };
    let (Some(destroy), Some(enemy)) = (entity.get::<Destroy>().copied(), entity.get::<Enemy>().copied())
    else {
        return;
    };
    let position = entity.get::<Transform>().map(|t| t.centre).unwrap_or_default();

    let Some(source) = destroy.source else {
        return;
    };
    let Some(player) = sim.component_mut::<Player>(source) else {
        return;
    };
    player.score += enemy.score;
    player.kill_count += 1;

    let Some(global) = sim.global_mut() else {
        return;
    };
    global.score += enemy.score;
    global.drop_counter += enemy.threat_value;
    if global.drop_counter < DROP_THREAT {
        return;
    }
    global.drop_counter -= DROP_THREAT;
    let kind = if sim.random(RandomSource::GameSequence).uniform(4) == 0 {
        DropKind::Shield
    } else {
        DropKind::Bomb
    };
    if let Some(global) = sim.global_mut() {
        global.pending_drops.push(PendingDrop { position, kind });
    }
}

fn tick_fireworks(sim: &mut SimInterface) {
    let Some(global) = sim.global_mut() else {
        return;
    };
    let mut ready = Vec::new();
    global.fireworks.retain_mut(|f| {
        f.countdown = f.countdown.saturating_sub(1);
        if f.countdown == 0 {
            ready.push(*f);
            false
        } else {
            true
        }
    });
    for firework in ready {
        sim.explosion(firework.position, firework.colour, FIREWORK_PARTICLES);
        sim.play_sound_request(SoundRequest::new(Sound::Firework, firework.position).volume(0.5));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::collision::Collision;
    use crate::geom::{ShapeFlag, ball};
    use crate::math::{FVec2, Fixed};
    use crate::sim::components::{DamageType, Firework};
    use crate::sim::health::damage;

    fn simulation() -> Simulation {
        Simulation::new(SimConfig::default(), 12345)
    }

    #[test]
    fn test_spawned_entities_wait_a_tick() {
        let mut sim = simulation();
        let log = Rc::new(RefCell::new(Vec::new()));

        let seen = Rc::clone(&log);
        let child_log = Rc::clone(&log);
        let parent = sim
            .interface_mut()
            .create_with((Update::new(move |sim, id| {
                seen.borrow_mut().push(id);
                let child_log = Rc::clone(&child_log);
                if sim.tick_count() == 0 {
                    sim.create_with((Update::new(move |_, id| child_log.borrow_mut().push(id)),));
                }
            }),))
            .id();

        sim.update(&[]);
        assert_eq!(*log.borrow(), vec![parent]);
        sim.update(&[]);
        let log = log.borrow();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1], parent);
        assert!(log[2] > parent);
    }

    #[test]
    fn test_destroyed_entities_removed_at_end_of_tick() {
        let mut sim = simulation();
        let runs = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&runs);
        let victim = sim
            .interface_mut()
            .create_with((
                Transform::at(FVec2::from_ints(50, 50)),
                Collision::bounding_box(ShapeFlag::VULNERABLE, Fixed::from_int(4)),
                Update::new(move |_, _| *counter.borrow_mut() += 1),
            ))
            .id();
        // Marks the victim before it gets its turn
        sim.interface_mut()
            .index_mut()
            .create_with((Update::new(move |sim, _| sim.destroy(victim, None, DamageType::Normal)),));

        let before = sim.interface().collision_len();
        sim.update(&[]);
        // The victim came first in storage order and updated once
        assert_eq!(*runs.borrow(), 1);
        assert!(!sim.interface().index().contains(victim));
        assert_eq!(sim.interface().collision_len(), before - 1);
    }

    #[test]
    fn test_marked_entity_skips_update() {
        let mut sim = simulation();
        let runs = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&runs);
        let marker = sim
            .interface_mut()
            .create_with((Update::new(|_, _| {}),))
            .id();
        let victim = sim
            .interface_mut()
            .create_with((Update::new(move |_, _| *counter.borrow_mut() += 1),))
            .id();
        // Swap in a marker update that destroys the later entity
        if let Some(update) = sim.interface_mut().component_mut::<Update>(marker) {
            *update = Update::new(move |sim, _| sim.destroy(victim, None, DamageType::Normal));
        }
        sim.update(&[]);
        assert_eq!(*runs.borrow(), 0);
    }

    #[test]
    fn test_hook_order() {
        let mut sim = simulation();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (a, b, c) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));
        sim.add_post_update(move |_| a.borrow_mut().push("post"));
        sim.add_pre_update(move |_| b.borrow_mut().push("pre"));
        sim.interface_mut()
            .create_with((Update::new(move |_, _| c.borrow_mut().push("update")),));
        sim.update(&[]);
        assert_eq!(*log.borrow(), vec!["pre", "update", "post"]);
        assert_eq!(sim.tick_count(), 1);
    }

    #[test]
    fn test_kill_scores_and_drops() {
        let mut sim = simulation();
        let player = sim
            .interface_mut()
            .create_with((Player::new(0), Transform::default()))
            .id();
        let mut enemies = Vec::new();
        for i in 0..3 {
            let id = sim
                .interface_mut()
                .create_with((
                    Enemy {
                        threat_value: 5,
                        score: 100,
                    },
                    Health::new(1),
                    Transform::at(FVec2::from_ints(100 + i * 40, 100)),
                    Shape::fixed(ball(6).into()),
                ))
                .id();
            enemies.push(id);
        }
        sim.update(&[]);
        let global = sim.interface().global().cloned().unwrap_or_default();
        assert_eq!(global.enemy_count, 3);
        assert_eq!(global.threat_total, 15);

        let targets = enemies.clone();
        sim.add_pre_update(move |sim| {
            for &id in &targets {
                damage(sim, id, 1, DamageType::Normal, Some(player));
            }
        });
        sim.update(&[]);

        let p = sim.interface().component::<Player>(player).copied();
        assert_eq!(p.map(|p| (p.score, p.kill_count)), Some((300, 3)));
        let global = sim.interface().global().cloned().unwrap_or_default();
        assert_eq!(global.score, 300);
        assert_eq!(global.drop_counter, 3);
        assert_eq!(global.pending_drops.len(), 1);
        assert_eq!(global.pending_drops[0].position, FVec2::from_ints(180, 100));

        let effects = sim.take_effects();
        let shatters = effects.iter().filter(|e| matches!(e, Effect::Shatter { .. })).count();
        let explosions = effects.iter().filter(|e| matches!(e, Effect::Explosion { .. })).count();
        assert_eq!((shatters, explosions), (3, 3));
        assert!(enemies.iter().all(|&id| !sim.interface().index().contains(id)));
    }

    #[test]
    fn test_post_hook_kill_is_resolved() {
        let mut sim = simulation();
        let player = sim
            .interface_mut()
            .create_with((Player::new(0), Transform::default()))
            .id();
        let enemy = sim
            .interface_mut()
            .create_with((
                Enemy {
                    threat_value: 1,
                    score: 50,
                },
                Health::new(3),
                Transform::at(FVec2::from_ints(200, 120)),
                Shape::fixed(ball(6).into()),
            ))
            .id();
        sim.add_post_update(move |sim| {
            if sim.index().contains(enemy) {
                sim.destroy(enemy, Some(player), DamageType::Normal);
            }
        });
        sim.update(&[]);

        assert!(!sim.interface().index().contains(enemy));
        let p = sim.interface().component::<Player>(player).copied();
        assert_eq!(p.map(|p| (p.score, p.kill_count)), Some((50, 1)));
        let effects = sim.take_effects();
        assert!(effects.iter().any(|e| matches!(e, Effect::Shatter { .. })));
    }

    #[test]
    fn test_resolve_keys_stay_bounded() {
        let mut sim = simulation();
        sim.add_pre_update(|sim| {
            let id = sim
                .create_with((
                    Health::new(1),
                    Transform::at(FVec2::from_ints(60, 60)),
                    Shape::fixed(ball(4).into()),
                ))
                .id();
            sim.destroy(id, None, DamageType::Normal);
        });
        for _ in 0..200 {
            sim.update(&[]);
            sim.take_effects();
        }
        // Only the last tick's keys remain
        let remembered = sim.interface_mut().emit().remembered();
        assert!(remembered > 0 && remembered < 10);
    }

    #[test]
    fn test_fireworks_count_down() {
        let mut sim = simulation();
        if let Some(global) = sim.interface_mut().global_mut() {
            global.fireworks.push(Firework {
                countdown: 2,
                position: FVec2::from_ints(10, 10),
                colour: crate::render::colours::FIREWORK,
            });
        }
        sim.update(&[]);
        assert!(sim.take_effects().is_empty());
        sim.update(&[]);
        let effects = sim.take_effects();
        assert_eq!(effects.len(), 2);
        assert!(matches!(effects[0], Effect::Explosion { particles: FIREWORK_PARTICLES, .. }));
        assert!(sim.interface().global().is_some_and(|g| g.fireworks.is_empty()));
    }

    #[test]
    fn test_checksum_tracks_state() {
        let mut a = simulation();
        let mut b = simulation();
        assert_eq!(a.checksum(), b.checksum());
        a.interface_mut()
            .create_with((Transform::at(FVec2::from_ints(1, 2)),));
        b.interface_mut()
            .create_with((Transform::at(FVec2::from_ints(1, 3)),));
        assert_ne!(a.checksum(), b.checksum());
    }
}
