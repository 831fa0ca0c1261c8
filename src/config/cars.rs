use super::Validate;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Upper bound on a single tick's elapsed time, in seconds.
    pub max_dt: f32,
    pub seed: Option<u64>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            max_dt: 0.1,
            seed: None,
        }
    }
}

/// Inclusive range a per-car parameter is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Largest AI field a config may ask for.
pub const MAX_AI_CARS: usize = 64;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AiConfig {
    pub car_count: usize,
    pub max_speed: ParamRange,
    pub acceleration: ParamRange,
    pub steering_damping: ParamRange,
    /// Whether AI drivers also slow down and swerve for the player's car.
    pub avoid_player: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            car_count: 3,
            max_speed: ParamRange::new(1.5, 1.8),
            acceleration: ParamRange::new(0.08, 0.1),
            steering_damping: ParamRange::new(0.9, 0.95),
            avoid_player: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_speed: f32,
    pub acceleration: f32,
    /// Degrees of heading change per second at full lock.
    pub turn_rate: f32,
    /// Per-tick multiplicative speed decay.
    pub friction: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_speed: 2.0,
            acceleration: 0.1,
            turn_rate: 100.0,
            friction: 0.99,
        }
    }
}

impl Validate for SimulationParams {
    fn validate(&self) -> Result<()> {
        if !(self.max_dt > 0.0) {
            return Err(anyhow!("Maximum tick duration must be positive"));
        }
        Ok(())
    }
}

impl Validate for AiConfig {
    fn validate(&self) -> Result<()> {
        if self.car_count > MAX_AI_CARS {
            return Err(anyhow!(
                "AI car count must be at most {}, got {}",
                MAX_AI_CARS,
                self.car_count
            ));
        }

        if !self.max_speed.is_valid() || self.max_speed.min <= 0.0 {
            return Err(anyhow!("AI max speed range must be positive and ordered"));
        }

        if !self.acceleration.is_valid() || self.acceleration.min <= 0.0 {
            return Err(anyhow!("AI acceleration range must be positive and ordered"));
        }

        let damping = &self.steering_damping;
        if !damping.is_valid() || damping.min < 0.0 || damping.max >= 1.0 {
            return Err(anyhow!(
                "Steering damping must lie in [0, 1), got [{}, {}]",
                damping.min,
                damping.max
            ));
        }

        Ok(())
    }
}

impl Validate for PlayerConfig {
    fn validate(&self) -> Result<()> {
        if self.max_speed <= 0.0 || self.acceleration <= 0.0 {
            return Err(anyhow!("Player speed and acceleration must be positive"));
        }

        if self.turn_rate <= 0.0 {
            return Err(anyhow!("Player turn rate must be positive"));
        }

        if self.friction <= 0.0 || self.friction > 1.0 {
            return Err(anyhow!("Friction factor must be in range (0, 1]"));
        }

        Ok(())
    }
}
