use crate::simulation::SimulationState;
use crate::track::Track;
use anyhow::Result;

pub mod cpu;

pub use cpu::*;

/// Advances the race by one tick against the live track.
pub trait SimulationBackend {
    fn update(&mut self, state: &mut SimulationState, track: &Track, dt: f32) -> Result<()>;
    fn get_name(&self) -> &'static str;
}
