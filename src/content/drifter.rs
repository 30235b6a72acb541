//! Drifter: a slow square that bounces around the arena
//!
//! The body kills on contact. The core alternates between shielded and open
//! every [`CORE_PERIOD`] ticks; shots only hurt it while it is open.

use crate::ecs::EntityId;
use crate::geom::{
    Node, NgonStyle, Param, Parameters, ShapeFlag, Styled, ball, compound, conditional, ngon,
    rotate,
};
use crate::math::{FVec2, Fixed};
use crate::render::colours;
use crate::sim::{
    Enemy, Firework, Health, RandomSource, ShapeEntity, SimInterface, Sound, Transform, Update,
    add_shape,
};

pub const SCORE: u64 = 50;
pub const THREAT: u32 = 4;
pub const HIT_POINTS: u32 = 3;
pub const DRIFTER_SPEED: Fixed = Fixed::from_ratio(3, 2);
pub const CORE_PERIOD: u32 = 90;
const SIZE: i32 = 14;
const CORE_RADIUS: i32 = 8;
const SPIN_RATE: Fixed = Fixed::from_ratio(1, 40);

const CORE_OPEN: Param<bool> = Param::new(0);
const SPIN: Param<Fixed> = Param::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drifter {
    pub velocity: FVec2,
    pub timer: u32,
}

impl Drifter {
    pub fn core_open(&self) -> bool {
        (self.timer / CORE_PERIOD) % 2 == 1
    }
}

impl ShapeEntity for Drifter {
    const BOUNDING_WIDTH: Fixed = Fixed::from_int(SIZE + 2);

    fn construct_shape() -> Node {
        compound(vec![
            ngon(4, SIZE)
                .flags(ShapeFlag::DANGEROUS)
                .colour(colours::DRIFTER)
                .line_width(Fixed::from_int(2))
                .into(),
            rotate(
                SPIN,
                ngon(4, SIZE - 4)
                    .kind(NgonStyle::Polystar)
                    .colour(colours::DRIFTER)
                    .z(-1),
            ),
            conditional(
                CORE_OPEN,
                ball(CORE_RADIUS)
                    .flags(ShapeFlag::VULNERABLE)
                    .colour(colours::DRIFTER_CORE)
                    .z(1),
                ball(CORE_RADIUS)
                    .flags(ShapeFlag::SHIELD)
                    .colour(colours::SHIELD)
                    .z(1),
            ),
        ])
    }

    fn set_parameters(&self, _transform: &Transform, params: &mut Parameters) {
        params
            .set(CORE_OPEN, self.core_open())
            .set(SPIN, (SPIN_RATE * Fixed::from_int(self.timer as i32)).normalize_angle());
    }
}

pub fn spawn(sim: &mut SimInterface, position: FVec2, velocity: FVec2, timer: u32) -> EntityId {
    let health = Health::new(HIT_POINTS)
        .sounds(Some(Sound::EnemyHit), Some(Sound::EnemyDestroy))
        .destroy_rumble(10)
        .on_destroy(|sim, id, _, _| {
            if let Some(t) = sim.component::<Transform>(id).copied() {
                schedule_fireworks(sim, t.centre);
            }
        });
    let mut entity = sim.create_with((
        Drifter { velocity, timer },
        Transform::at(position),
        Enemy {
            threat_value: THREAT,
            score: SCORE,
        },
        health,
        Update::new(update),
    ));
    add_shape::<Drifter>(&mut entity);
    entity.id()
}

/// Velocity with a uniformly random heading
pub fn random_velocity(sim: &mut SimInterface) -> FVec2 {
    let angle = sim.random(RandomSource::GameSequence).angle();
    FVec2::from_polar(angle, DRIFTER_SPEED)
}

fn schedule_fireworks(sim: &mut SimInterface, centre: FVec2) {
    let spread = Fixed::from_int(SIZE);
    let fireworks: Vec<Firework> = (0..2)
        .map(|_| {
            let rng = sim.random(RandomSource::Aesthetic);
            let offset = FVec2::new(rng.fixed_range(-spread, spread), rng.fixed_range(-spread, spread));
            Firework {
                countdown: 4 + rng.uniform(12),
                position: centre + offset,
                colour: colours::FIREWORK,
            }
        })
        .collect();
    if let Some(global) = sim.global_mut() {
        global.fireworks.extend(fireworks);
    }
}

fn update(sim: &mut SimInterface, id: EntityId) {
    let (Some(mut drifter), Some(mut transform)) = (
        sim.component::<Drifter>(id).copied(),
        sim.component::<Transform>(id).copied(),
    ) else {
        return;
    };
    transform.advance(drifter.velocity);

    let margin = Fixed::from_int(SIZE);
    let size = sim.world_size();
    if transform.centre.x < margin || transform.centre.x > size.x - margin {
        drifter.velocity.x = -drifter.velocity.x;
    }
    if transform.centre.y < margin || transform.centre.y > size.y - margin {
        drifter.velocity.y = -drifter.velocity.y;
    }
    transform.centre = sim.clamp_to_world(transform.centre, margin);
    transform.rotate(SPIN_RATE);
    drifter.timer = drifter.timer.wrapping_add(1);

    if let Some(d) = sim.component_mut::<Drifter>(id) {
        *d = drifter;
    }
    if let Some(t) = sim.component_mut::<Transform>(id) {
        *t = transform;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::geom;
    use crate::sim::{DamageType, GlobalData, Shape, Simulation, damage};

    fn flags_at(sim: &Simulation, id: EntityId) -> ShapeFlag {
        let shape = sim.interface().component::<Shape>(id).unwrap();
        geom::flags(&shape.node, &shape.params)
    }

    #[test]
    fn test_core_alternates() {
        let mut sim = Simulation::new(SimConfig::default(), 1);
        let id = spawn(sim.interface_mut(), FVec2::from_ints(200, 200), FVec2::ZERO, CORE_PERIOD - 1);
        assert!(flags_at(&sim, id).contains(ShapeFlag::SHIELD));
        assert!(!flags_at(&sim, id).contains(ShapeFlag::VULNERABLE));

        sim.update(&[]);
        let flags = flags_at(&sim, id);
        assert!(flags.contains(ShapeFlag::VULNERABLE | ShapeFlag::DANGEROUS));
        assert!(!flags.contains(ShapeFlag::SHIELD));
    }

    #[test]
    fn test_bounces_off_edges() {
        let mut sim = Simulation::new(SimConfig::default(), 1);
        let velocity = FVec2::new(-DRIFTER_SPEED, Fixed::ZERO);
        let id = spawn(sim.interface_mut(), FVec2::from_ints(SIZE + 1, 100), velocity, 0);
        sim.update(&[]);
        let drifter = sim.interface().component::<Drifter>(id).copied().unwrap();
        assert_eq!(drifter.velocity.x, DRIFTER_SPEED);
        let t = sim.interface().component::<Transform>(id).copied().unwrap();
        assert_eq!(t.centre.x, Fixed::from_int(SIZE));
    }

    #[test]
    fn test_destruction_schedules_fireworks() {
        let mut sim = Simulation::new(SimConfig::default(), 1);
        let id = spawn(sim.interface_mut(), FVec2::from_ints(200, 200), FVec2::ZERO, 0);
        assert!(damage(sim.interface_mut(), id, HIT_POINTS, DamageType::Bomb, None));
        let global: GlobalData = sim.interface().global().cloned().unwrap();
        assert_eq!(global.fireworks.len(), 2);
        for f in &global.fireworks {
            assert!((4..16).contains(&f.countdown));
            assert!(f.position.distance_squared(FVec2::from_ints(200, 200)) <= Fixed::from_int(2 * SIZE * SIZE));
        }
        sim.update(&[]);
        assert!(!sim.interface().index().contains(id));
    }
}
