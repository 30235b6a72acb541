//! Player shots

use crate::ecs::EntityId;
use crate::geom::{Node, ShapeFlag, Styled, ball};
use crate::math::{FVec2, Fixed};
use crate::render::colours;
use crate::sim::{
    DamageType, ShapeEntity, SimInterface, Sound, SoundRequest, Transform, Update, add_shape,
    damage,
};

/// Distance per tick
pub const SHOT_SPEED: Fixed = Fixed::from_int(8);
pub const SHOT_DAMAGE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shot {
    pub velocity: FVec2,
    /// Credited with anything the shot destroys
    pub owner: EntityId,
}

impl ShapeEntity for Shot {
    const BOUNDING_WIDTH: Fixed = Fixed::from_int(3);

    fn construct_shape() -> Node {
        ball(2).colour(colours::SHOT).z(2).into()
    }
}

pub fn spawn(sim: &mut SimInterface, position: FVec2, angle: Fixed, owner: EntityId) -> EntityId {
    let shot = Shot {
        velocity: FVec2::from_polar(angle, SHOT_SPEED),
        owner,
    };
    let mut entity = sim.create_with((shot, Transform::new(position, angle), Update::new(update)));
    add_shape::<Shot>(&mut entity);
    entity.id()
}

fn update(sim: &mut SimInterface, id: EntityId) {
    let Some(shot) = sim.component::<Shot>(id).copied() else {
        return;
    };
    let Some(transform) = sim.component_mut::<Transform>(id) else {
        return;
    };
    transform.advance(shot.velocity);
    let position = transform.centre;

    if !sim.is_on_screen(position) {
        sim.destroy(id, None, DamageType::Normal);
        return;
    }

    let mask = ShapeFlag::VULNERABLE | ShapeFlag::SHIELD | ShapeFlag::WEAK_SHIELD;
    let Some(hit) = sim.first_collision_point(position, mask) else {
        return;
    };
    if hit.flags.intersects(ShapeFlag::SHIELD) {
        sim.play_sound_request(SoundRequest::new(Sound::ShieldDeflect, position).volume(0.5));
    } else if hit.flags.intersects(ShapeFlag::VULNERABLE) {
        damage(sim, hit.id, SHOT_DAMAGE, DamageType::Normal, Some(shot.owner));
    } else {
        sim.play_sound_request(SoundRequest::new(Sound::ShieldDeflect, position).volume(0.2));
    }
    sim.destroy(id, None, DamageType::Normal);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::content::drifter::{self, CORE_PERIOD};
    use crate::sim::{Effect, Health, Player, Simulation};

    fn setup(core_timer: u32) -> (Simulation, EntityId, EntityId, EntityId) {
        let mut sim = Simulation::new(SimConfig::default(), 5);
        let owner = sim
            .interface_mut()
            .create_with((Player::new(0), Transform::default()))
            .id();
        let enemy = drifter::spawn(sim.interface_mut(), FVec2::from_ints(300, 200), FVec2::ZERO, core_timer);
        let shot = spawn(sim.interface_mut(), FVec2::from_ints(278, 200), Fixed::ZERO, owner);
        (sim, owner, enemy, shot)
    }

    fn hp(sim: &Simulation, id: EntityId) -> Option<u32> {
        sim.interface().component::<Health>(id).map(|h| h.hp)
    }

    #[test]
    fn test_open_core_takes_damage() {
        let (mut sim, _, enemy, shot) = setup(CORE_PERIOD);
        // 286: still outside the core
        sim.update(&[]);
        assert!(sim.interface().index().contains(shot));
        assert_eq!(hp(&sim, enemy), Some(drifter::HIT_POINTS));
        // 294: inside the core
        sim.update(&[]);
        assert!(!sim.interface().index().contains(shot));
        assert_eq!(hp(&sim, enemy), Some(drifter::HIT_POINTS - 1));
    }

    #[test]
    fn test_closed_core_deflects() {
        let (mut sim, _, enemy, shot) = setup(0);
        sim.update(&[]);
        sim.update(&[]);
        assert!(!sim.interface().index().contains(shot));
        assert_eq!(hp(&sim, enemy), Some(drifter::HIT_POINTS));
        let deflected = sim
            .take_effects()
            .iter()
            .any(|e| matches!(e, Effect::Sound(s) if s.sound == Sound::ShieldDeflect));
        assert!(deflected);
    }

    #[test]
    fn test_leaves_screen() {
        let mut sim = Simulation::new(SimConfig::default(), 5);
        let owner = sim.interface_mut().create().id();
        let shot = spawn(sim.interface_mut(), FVec2::from_ints(636, 100), Fixed::ZERO, owner);
        sim.update(&[]);
        assert!(!sim.interface().index().contains(shot));
        assert!(sim.take_effects().is_empty());
    }
}
