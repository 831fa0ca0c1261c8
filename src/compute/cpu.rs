use super::SimulationBackend;
use crate::config::GameConfig;
use crate::simulation::{resolve_car_collisions, NavigationEngine, PlayerPhysics, SimulationState, TrackBounds};
use crate::track::Track;
use anyhow::{Context, Result};

/// Single-threaded tick: AI navigation, then the player, then one
/// collision pass over every pair.
pub struct CpuBackend {
    navigation: NavigationEngine,
    player_physics: PlayerPhysics,
    max_dt: f32,
}

impl CpuBackend {
    pub fn new(config: &GameConfig) -> Self {
        let bounds = TrackBounds::new(config.track.half_extent);

        Self {
            navigation: NavigationEngine::new(bounds, config.ai.avoid_player),
            player_physics: PlayerPhysics::new(&config.player, bounds),
            max_dt: config.simulation.max_dt,
        }
    }
}

impl SimulationBackend for CpuBackend {
    fn update(&mut self, state: &mut SimulationState, track: &Track, dt: f32) -> Result<()> {
        // A stalled or reversed clock skips the tick entirely.
        if !(dt > 0.0) {
            return Ok(());
        }
        let dt = dt.min(self.max_dt);

        let waypoints = track
            .waypoints()
            .with_context(|| format!("Track '{}' was not regenerated before the tick", track.name()))?;

        self.navigation.update(state, waypoints, dt);
        self.player_physics.update(&mut state.player, dt);

        let contacts = resolve_car_collisions(&mut state.player, &mut state.ai_cars);
        if contacts > 0 {
            log::debug!("Resolved {} car contacts at t={:.2}s", contacts, state.time);
        }

        state.time += dt;
        state.ticks += 1;
        Ok(())
    }

    fn get_name(&self) -> &'static str {
        "CPU"
    }
}
