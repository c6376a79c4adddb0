//! Headless SKIRMISH simulation.
//!
//! Runs a small scripted brawl without a host engine attached, for smoke
//! testing and determinism checks.

use bevy::prelude::*;
use skirmish_simulation::{
    create_headless_app, step_simulation, ActorState, Health, LightAttackIntent, SimulationPlugin,
    WeaponKind, WeaponOverlap, WeaponSwitchIntent,
};

fn main() {
    let seed = 42;
    println!("Starting SKIRMISH headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.finish();
    app.cleanup();

    let attacker = app.world_mut().spawn(ActorState::default()).id();
    let defender = app.world_mut().spawn(ActorState::default()).id();

    app.world_mut().send_event(WeaponSwitchIntent {
        entity: attacker,
        kind: WeaponKind::Sword,
    });
    step_simulation(&mut app, 1);

    // Swing at the defender once a second for ten seconds
    for _ in 0..10 {
        app.world_mut()
            .send_event(LightAttackIntent { entity: attacker });
        app.world_mut().send_event(WeaponOverlap {
            attacker,
            target: defender,
        });
        step_simulation(&mut app, 60);

        let health = app.world().get::<Health>(defender).unwrap();
        let state = app.world().get::<ActorState>(defender).unwrap();
        println!(
            "defender: {:>5.1} hp, {:?}/{:?}",
            health.current,
            state.able(),
            state.action()
        );
    }

    println!("Simulation complete!");
}
