use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod cars;
pub mod track;

pub use cars::*;
pub use track::*;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GameConfig {
    #[serde(default)]
    pub simulation: SimulationParams,
    #[serde(default)]
    pub track: TrackConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub editor: EditorConfig,
}

impl GameConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(content)?;

        // Validate configurations
        config.validate()?;

        Ok(config)
    }
}

impl Validate for GameConfig {
    fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.track.validate()?;
        self.ai.validate()?;
        self.player.validate()?;
        self.editor.validate()?;
        Ok(())
    }
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}
