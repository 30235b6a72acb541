//! Twinstick headless runner
//!
//! Runs the demo game with scripted inputs, records a replay, verifies it,
//! and prints the final checksum.
//!
//! Usage: `twinstick-sim [config.json] [ticks] [seed]`

use std::env;

use twinstick_core::content;
use twinstick_core::math::FVec2;
use twinstick_core::render::line_vertices;
use twinstick_core::render::vertex::Vertex;
use twinstick_core::sim::{InputFrame, InputKeys};
use twinstick_core::{Replay, SimConfig, Simulation};

const DEFAULT_TICKS: u64 = 3600;
const DEFAULT_SEED: u64 = 0x5eed;

/// Circle strafing, firing in bursts, a bomb every ten seconds
fn scripted_inputs(player_count: u32, tick: u64) -> Vec<InputFrame> {
    (0..player_count)
        .map(|n| {
            let phase = (tick / 45 + n as u64) % 4;
            let velocity = match phase {
                0 => FVec2::from_ints(1, 0),
                1 => FVec2::from_ints(0, 1),
                2 => FVec2::from_ints(-1, 0),
                _ => FVec2::from_ints(0, -1),
            };
            let mut keys = InputKeys::NONE;
            if tick % 20 < 12 {
                keys |= InputKeys::FIRE;
            }
            if tick % 600 == 300 {
                keys |= InputKeys::BOMB;
            }
            let aim = if (tick / 90) % 2 == 0 {
                FVec2::from_ints(0, -1)
            } else {
                FVec2::from_ints(0, 1)
            };
            InputFrame::moving(velocity).aiming(aim).with_keys(keys)
        })
        .collect()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = match args.first() {
        Some(path) => SimConfig::load(path).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {e}");
            SimConfig::default()
        }),
        None => SimConfig::default(),
    };
    let ticks = args
        .get(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TICKS);
    let seed = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);

    log::info!(
        "Twinstick sim starting: {ticks} ticks, seed {seed}, {} collision",
        config.collision.as_str()
    );

    let mut sim = Simulation::new(config.clone(), seed);
    content::spawn_demo(&mut sim);
    let mut replay = Replay::new(seed, config.clone());
    let mut effects = 0usize;
    for tick in 0..ticks {
        let inputs = scripted_inputs(config.player_count, tick);
        sim.update(&inputs);
        effects += sim.take_effects().len();
        replay.record(&inputs, sim.checksum());
    }

    let vertices: Vec<Vertex> = line_vertices(&sim.render_lines());
    log::info!(
        "{} entities, {} effects emitted, {} vertex bytes in the last frame",
        sim.interface().index().entity_count(),
        effects,
        Vertex::as_bytes(&vertices).len()
    );

    match replay.verify(content::spawn_demo) {
        Ok(checksum) => println!("{checksum:016x}"),
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    }

    if let Ok(path) = env::var("TWINSTICK_REPLAY_OUT") {
        if let Err(e) = replay.save(&path) {
            log::error!("{e}");
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
