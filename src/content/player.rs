//! Player ship

use crate::ecs::EntityId;
use crate::geom::{
    self, Colour, Node, Param, Parameters, ShapeFlag, Styled, attachment, ball, compound, enable,
    ngon,
};
use crate::math::{FVec2, Fixed};
use crate::render::colours;
use crate::sim::{
    DamageType, InputKeys, Player, Shape, ShapeEntity, SimInterface, Sound, SoundRequest, Transform,
    Update, add_shape, damage,
};

use super::shot;

/// Movement per tick at full stick
pub const PLAYER_SPEED: Fixed = Fixed::from_ratio(5, 2);
pub const SHOT_COOLDOWN: u32 = 6;
pub const RESPAWN_TICKS: u32 = 120;
pub const INVULNERABLE_TICKS: u32 = 90;
pub const SHIELD_TICKS: u32 = 300;
pub const STARTING_BOMBS: u32 = 1;
/// Radius of the area that kills the ship
pub const HIT_RADIUS: Fixed = Fixed::from_int(5);
pub const BOMB_RADIUS: Fixed = Fixed::from_int(160);
pub const BOMB_DAMAGE: u32 = 10;
const SHIP_SIZE: i32 = 10;

const VISIBLE: Param<bool> = Param::new(0);
const COLOUR: Param<Colour> = Param::new(1);
const SHIELDED: Param<bool> = Param::new(2);

/// Muzzle attachment index
const MUZZLE: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerShip {
    pub number: u32,
    pub fire_timer: u32,
    /// Ticks until respawn; zero while alive
    pub dead_timer: u32,
    pub invulnerable: u32,
    pub shield: u32,
    pub bombs: u32,
    bomb_held: bool,
}

impl PlayerShip {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            fire_timer: 0,
            dead_timer: 0,
            invulnerable: INVULNERABLE_TICKS,
            shield: 0,
            bombs: STARTING_BOMBS,
            bomb_held: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.dead_timer == 0
    }

    fn is_visible(&self) -> bool {
        self.is_alive() && (self.invulnerable == 0 || self.invulnerable % 8 >= 4)
    }
}

impl ShapeEntity for PlayerShip {
    const BOUNDING_WIDTH: Fixed = Fixed::from_int(16);

    fn construct_shape() -> Node {
        compound(vec![
            enable(
                VISIBLE,
                compound(vec![
                    ngon(3, SHIP_SIZE).colour(COLOUR).line_width(Fixed::from_int(2)).into(),
                    enable(SHIELDED, ball(14).colour(colours::SHIELD).z(1)),
                ]),
            ),
            attachment(MUZZLE, FVec2::from_ints(SHIP_SIZE + 2, 0)).into(),
        ])
    }

    fn set_parameters(&self, _transform: &Transform, params: &mut Parameters) {
        params
            .set(VISIBLE, self.is_visible())
            .set(COLOUR, colours::player(self.number))
            .set(SHIELDED, self.shield > 0);
    }
}

/// Spawn point for player `number`, spread across the middle of the world
pub fn spawn_point(sim: &SimInterface, number: u32) -> FVec2 {
    let count = sim.config().player_count.max(1) as i32;
    let size = sim.world_size();
    let x = size.x * Fixed::from_ratio(number as i32 + 1, count + 1);
    FVec2::new(x, size.y * Fixed::HALF)
}

pub fn spawn(sim: &mut SimInterface, number: u32) -> EntityId {
    let position = spawn_point(sim, number);
    let mut entity = sim.create_with((
        PlayerShip::new(number),
        Player::new(number),
        Transform::new(position, -Fixed::HALF_PI),
        Update::new(update),
    ));
    add_shape::<PlayerShip>(&mut entity);
    log::debug!("player {number} spawned as {}", entity.id());
    entity.id()
}

fn update(sim: &mut SimInterface, id: EntityId) {
    let (Some(mut ship), Some(mut transform)) = (
        sim.component::<PlayerShip>(id).copied(),
        sim.component::<Transform>(id).copied(),
    ) else {
        return;
    };

    if !ship.is_alive() {
        ship.dead_timer -= 1;
        if ship.dead_timer == 0 {
            ship.invulnerable = INVULNERABLE_TICKS;
            transform.centre = spawn_point(sim, ship.number);
            sim.play_sound(Sound::PlayerRespawn, transform.centre);
        }
        store(sim, id, ship, transform);
        return;
    }

    let input = sim.input(ship.number);
    ship.invulnerable = ship.invulnerable.saturating_sub(1);
    ship.shield = ship.shield.saturating_sub(1);
    ship.fire_timer = ship.fire_timer.saturating_sub(1);

    let moved = transform.centre + input.clamped_velocity() * PLAYER_SPEED;
    transform.centre = sim.clamp_to_world(moved, Fixed::from_int(SHIP_SIZE));
    if let Some(angle) = input.aim_angle(transform.centre) {
        transform.rotation = angle;
    }
    store(sim, id, ship, transform);

    if input.keys.contains(InputKeys::FIRE) && ship.fire_timer == 0 {
        if let Some(muzzle) = muzzle(sim, id, &transform) {
            shot::spawn(sim, muzzle, transform.rotation, id);
            ship.fire_timer = SHOT_COOLDOWN;
            sim.play_sound_request(SoundRequest::new(Sound::PlayerFire, muzzle).volume(0.3));
        }
    }

    let bomb_pressed = input.keys.contains(InputKeys::BOMB);
    if bomb_pressed && !ship.bomb_held && ship.bombs > 0 {
        ship.bombs -= 1;
        bomb(sim, id, transform.centre);
    }
    ship.bomb_held = bomb_pressed;

    let safe = ship.invulnerable > 0 || ship.shield > 0;
    if !safe && sim.any_collision_ball(transform.centre, HIT_RADIUS, ShapeFlag::DANGEROUS) {
        ship.dead_timer = RESPAWN_TICKS;
        sim.play_sound(Sound::PlayerDestroy, transform.centre);
        sim.rumble(ship.number, 30);
        sim.explosion(transform.centre, colours::player(ship.number), 64);
        log::debug!("player {} destroyed at tick {}", ship.number, sim.tick_count());
    }
    store(sim, id, ship, transform);
}

fn store(sim: &mut SimInterface, id: EntityId, ship: PlayerShip, transform: Transform) {
    if let Some(s) = sim.component_mut::<PlayerShip>(id) {
        *s = ship;
    }
    if let Some(t) = sim.component_mut::<Transform>(id) {
        *t = transform;
    }
}

fn muzzle(sim: &SimInterface, id: EntityId, transform: &Transform) -> Option<FVec2> {
    let shape = sim.component::<Shape>(id)?;
    geom::attachment_points(&shape.node, &shape.params, Shape::affine(transform))
        .into_iter()
        .find(|a| a.index == MUZZLE)
        .map(|a| a.position)
}

/// Damage everything hittable around `centre`, nearest first
fn bomb(sim: &mut SimInterface, owner: EntityId, centre: FVec2) {
    let mask = ShapeFlag::VULNERABLE | ShapeFlag::SHIELD | ShapeFlag::WEAK_SHIELD;
    let hits = sim.in_range(centre, BOMB_RADIUS, mask, 0);
    log::debug!("bomb from {owner} caught {} entities", hits.len());
    for hit in hits {
        damage(sim, hit.id, BOMB_DAMAGE, DamageType::Bomb, Some(owner));
    }
    sim.play_sound(Sound::Bomb, centre);
    sim.explosion(centre, colours::WHITE, 96);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::content::drifter;
    use crate::content::shot::Shot;
    use crate::sim::{Effect, InputFrame, Simulation};

    fn simulation() -> Simulation {
        let config = SimConfig {
            player_count: 1,
            ..SimConfig::default()
        };
        Simulation::new(config, 77)
    }

    fn ship(sim: &Simulation, id: EntityId) -> PlayerShip {
        sim.interface().component::<PlayerShip>(id).copied().unwrap()
    }

    fn vulnerable_now(sim: &mut Simulation, id: EntityId) {
        if let Some(s) = sim.interface_mut().component_mut::<PlayerShip>(id) {
            s.invulnerable = 0;
        }
    }

    #[test]
    fn test_moves_and_clamps() {
        let mut sim = simulation();
        let id = spawn(sim.interface_mut(), 0);
        let start = sim.interface().component::<Transform>(id).unwrap().centre;
        assert_eq!(start, FVec2::from_ints(320, 240));

        sim.update(&[InputFrame::moving(FVec2::from_ints(1, 0))]);
        let t = sim.interface().component::<Transform>(id).copied().unwrap();
        assert_eq!(t.centre, start + FVec2::new(PLAYER_SPEED, Fixed::ZERO));
        assert_eq!(t.rotation, -Fixed::HALF_PI);

        for _ in 0..400 {
            sim.update(&[InputFrame::moving(FVec2::from_ints(1, 0))]);
        }
        let t = sim.interface().component::<Transform>(id).copied().unwrap();
        assert_eq!(t.centre.x, Fixed::from_int(640 - SHIP_SIZE));
    }

    #[test]
    fn test_fire_spawns_shot_at_muzzle() {
        let mut sim = simulation();
        let id = spawn(sim.interface_mut(), 0);
        let fire = InputFrame::default()
            .aiming(FVec2::from_ints(1, 0))
            .with_keys(InputKeys::FIRE);
        sim.update(&[fire]);
        assert_eq!(sim.interface().count::<Shot>(), 1);
        assert_eq!(ship(&sim, id).fire_timer, SHOT_COOLDOWN);
        let (shot_id, _) = sim.interface().index().components::<Shot>().next().unwrap();
        let t = sim.interface().component::<Transform>(shot_id).copied().unwrap();
        assert_eq!(t.centre, FVec2::from_ints(320 + SHIP_SIZE + 2, 240));

        // Cooldown holds the next shot back
        sim.update(&[fire]);
        assert_eq!(sim.interface().count::<Shot>(), 1);
    }

    #[test]
    fn test_dies_on_dangerous_contact_and_respawns() {
        let mut sim = simulation();
        let id = spawn(sim.interface_mut(), 0);
        vulnerable_now(&mut sim, id);
        let at = FVec2::from_ints(320, 240);
        drifter::spawn(sim.interface_mut(), at, FVec2::ZERO, 0);

        sim.update(&[]);
        assert_eq!(ship(&sim, id).dead_timer, RESPAWN_TICKS);
        let effects = sim.take_effects();
        assert!(effects.contains(&Effect::Rumble { player: 0, ticks: 30 }));

        for _ in 0..RESPAWN_TICKS {
            sim.update(&[]);
        }
        let s = ship(&sim, id);
        assert!(s.is_alive());
        assert_eq!(s.invulnerable, INVULNERABLE_TICKS);
    }

    #[test]
    fn test_invulnerable_ship_survives() {
        let mut sim = simulation();
        let id = spawn(sim.interface_mut(), 0);
        drifter::spawn(sim.interface_mut(), FVec2::from_ints(320, 240), FVec2::ZERO, 0);
        sim.update(&[]);
        assert!(ship(&sim, id).is_alive());
    }

    #[test]
    fn test_bomb_destroys_and_scores() {
        let mut sim = simulation();
        let id = spawn(sim.interface_mut(), 0);
        let enemy = drifter::spawn(sim.interface_mut(), FVec2::from_ints(420, 240), FVec2::ZERO, 0);
        let far = drifter::spawn(sim.interface_mut(), FVec2::from_ints(40, 40), FVec2::ZERO, 0);

        let bomb = InputFrame::default().with_keys(InputKeys::BOMB);
        sim.update(&[bomb]);
        assert!(!sim.interface().index().contains(enemy));
        assert!(sim.interface().index().contains(far));
        assert_eq!(ship(&sim, id).bombs, STARTING_BOMBS - 1);
        let player = sim.interface().component::<Player>(id).copied().unwrap();
        assert_eq!((player.score, player.kill_count), (drifter::SCORE, 1));

        // Held button does not fire again, and there are no bombs left anyway
        sim.update(&[bomb]);
        assert!(sim.interface().index().contains(far));
    }
}
