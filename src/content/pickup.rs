//! Drops left behind by destroyed enemies

use crate::ecs::EntityId;
use crate::geom::{Node, NgonStyle, Param, Parameters, Styled, ngon, switch};
use crate::math::{FVec2, Fixed};
use crate::render::colours;
use crate::sim::{
    DamageType, DropKind, ShapeEntity, SimInterface, Sound, Transform, Update, add_shape,
};

use super::player::{PlayerShip, SHIELD_TICKS};

/// Ticks before an uncollected pickup disappears
pub const PICKUP_LIFETIME: u32 = 600;
pub const COLLECT_RADIUS: Fixed = Fixed::from_int(16);
const SIZE: i32 = 8;

const SIDES: Param<u32> = Param::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pickup {
    pub kind: DropKind,
    pub lifetime: u32,
}

impl ShapeEntity for Pickup {
    const BOUNDING_WIDTH: Fixed = Fixed::from_int(SIZE);

    fn construct_shape() -> Node {
        switch(
            SIDES,
            vec![
                ngon(5, SIZE).kind(NgonStyle::Polygram).colour(colours::PICKUP).into(),
                ngon(6, SIZE).kind(NgonStyle::Polygram).colour(colours::SHIELD).into(),
            ],
        )
    }

    fn set_parameters(&self, _transform: &Transform, params: &mut Parameters) {
        let branch = match self.kind {
            DropKind::Bomb => 0,
            DropKind::Shield => 1,
        };
        params.set(SIDES, branch);
    }
}

pub fn spawn(sim: &mut SimInterface, position: FVec2, kind: DropKind) -> EntityId {
    let pickup = Pickup {
        kind,
        lifetime: PICKUP_LIFETIME,
    };
    let mut entity = sim.create_with((pickup, Transform::at(position), Update::new(update)));
    add_shape::<Pickup>(&mut entity);
    log::trace!("{kind:?} pickup {} at {position:?}", entity.id());
    entity.id()
}

fn update(sim: &mut SimInterface, id: EntityId) {
    let Some(mut pickup) = sim.component::<Pickup>(id).copied() else {
        return;
    };
    pickup.lifetime = pickup.lifetime.saturating_sub(1);
    if pickup.lifetime == 0 {
        sim.destroy(id, None, DamageType::Normal);
        return;
    }
    if let Some(p) = sim.component_mut::<Pickup>(id) {
        *p = pickup;
    }
    let Some(transform) = sim.component_mut::<Transform>(id) else {
        return;
    };
    transform.rotate(Fixed::from_ratio(1, 30));
    let position = transform.centre;

    let Some(player) = sim.nearest_player(position) else {
        return;
    };
    let in_reach = sim
        .component::<Transform>(player)
        .is_some_and(|t| t.centre.distance_squared(position) <= COLLECT_RADIUS * COLLECT_RADIUS);
    let Some(ship) = sim.component_mut::<PlayerShip>(player) else {
        return;
    };
    if !in_reach || !ship.is_alive() {
        return;
    }
    match pickup.kind {
        DropKind::Bomb => ship.bombs += 1,
        DropKind::Shield => ship.shield = SHIELD_TICKS,
    }
    sim.play_sound(Sound::PickupCollect, position);
    sim.destroy(id, Some(player), DamageType::Normal);
}
