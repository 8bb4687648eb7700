use std::path::Path;

use bevy::log::LogPlugin;
use bevy::prelude::*;

use fluid_sim::{FluidError, FluidParams, FluidPlugin, FluidSimulation};

const DEFAULT_TICKS: u64 = 600;
const REPORT_INTERVAL: u64 = 60;

/// Headless driver: `fluid_sim [params.json] [ticks]`.
fn main() -> Result<(), FluidError> {
    let args: Vec<String> = std::env::args().collect();
    let params = match args.get(1) {
        Some(path) => FluidParams::load_json(Path::new(path))?,
        None => FluidParams::water(),
    };
    let ticks = args
        .get(2)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default(), FluidPlugin::new(params)));
    app.finish();
    app.cleanup();

    for _ in 0..ticks {
        app.update();

        let Some(simulation) = app.world().get_resource::<FluidSimulation>() else {
            break;
        };
        if simulation.tick() % REPORT_INTERVAL == 0 {
            let active = simulation.particles().iter().filter(|p| p.is_active).count();
            let stats = simulation.last_stats();
            info!(
                "tick {} ({:.2}s): {} particles, {} active, {} spawned, {} removed, {} collisions",
                simulation.tick(),
                simulation.elapsed(),
                simulation.particle_count(),
                active,
                stats.spawned,
                stats.removed,
                stats.collisions
            );
        }
    }

    Ok(())
}
