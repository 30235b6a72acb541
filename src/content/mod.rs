//! Game content built on the simulation core
//!
//! Every entity kind is a component struct plus a [`ShapeEntity`] impl and an
//! update callback. [`spawn_demo`] sets up the headless demo game used by the
//! runner and the replay tests.
//!
//! [`ShapeEntity`]: crate::sim::ShapeEntity

pub mod drifter;
pub mod pickup;
pub mod player;
pub mod shot;

use crate::math::{FVec2, Fixed};
use crate::sim::{RandomSource, SimInterface, Simulation, Sound};

/// Drifters in the first wave; each later wave adds one more
pub const FIRST_WAVE: u32 = 4;
/// Height of the spawn bands along the top and bottom edges
const SPAWN_BAND: i32 = 80;

/// Players from the config, a first wave of drifters, and a hook that turns
/// rolled drops into pickups and sends a new wave whenever the arena is clear
pub fn spawn_demo(sim: &mut Simulation) {
    let sim_interface = sim.interface_mut();
    for number in 0..sim_interface.config().player_count {
        player::spawn(sim_interface, number);
    }
    spawn_wave(sim_interface, FIRST_WAVE);

    let mut wave = 1;
    sim.add_pre_update(move |sim| {
        let drops = sim.global_mut().map(|g| g.take_pending_drops()).unwrap_or_default();
        for drop in drops {
            pickup::spawn(sim, drop.position, drop.kind);
        }
        if sim.global().is_some_and(|g| g.enemy_count == 0) {
            wave += 1;
            let size = sim.world_size();
            sim.play_sound(Sound::WaveStart, size * Fixed::HALF);
            spawn_wave(sim, FIRST_WAVE + wave - 1);
            log::info!("wave {wave} at tick {}", sim.tick_count());
        }
    });
}

/// `count` drifters in the top and bottom bands, alternating, with random
/// headings and core phases
pub fn spawn_wave(sim: &mut SimInterface, count: u32) {
    let size = sim.world_size();
    let band = Fixed::from_int(SPAWN_BAND);
    for n in 0..count {
        let rng = sim.random(RandomSource::GameSequence);
        let x = rng.fixed_range(band, size.x - band);
        let y = rng.fixed_range(band / Fixed::from_int(2), band);
        let y = if n % 2 == 0 { y } else { size.y - y };
        let timer = rng.uniform(2 * drifter::CORE_PERIOD);
        let velocity = drifter::random_velocity(sim);
        drifter::spawn(sim, FVec2::new(x, y), velocity, timer);
    }
    log::debug!("spawned wave of {count} drifters");
}
