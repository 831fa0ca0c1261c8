use super::Validate;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaypointGeneratorKind {
    /// Follow the authored segments.
    #[default]
    SegmentPath,
    /// Fixed eight-point loop that ignores segment content.
    ReferenceLoop,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Cars are out of bounds once |x| or |z| exceeds this.
    pub half_extent: f32,
    pub waypoint_generator: WaypointGeneratorKind,
    pub waypoint_spacing: f32,
    /// Track file loaded at startup instead of the default circuit.
    pub file: Option<PathBuf>,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            half_extent: 19.0,
            waypoint_generator: WaypointGeneratorKind::SegmentPath,
            waypoint_spacing: 2.0,
            file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EditorConfig {
    pub initial_zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Pan distance per pixel is `zoom / pan_divisor`.
    pub pan_divisor: f32,
    pub grid_size: f32,
    pub panel_width: f32,
    pub default_file: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            initial_zoom: 20.0,
            min_zoom: 5.0,
            max_zoom: 50.0,
            pan_divisor: 10.0,
            grid_size: 2.0,
            panel_width: 250.0,
            default_file: PathBuf::from("circuit.track"),
        }
    }
}

impl Validate for TrackConfig {
    fn validate(&self) -> Result<()> {
        if !(self.half_extent > 0.0) {
            return Err(anyhow!("Track half extent must be positive"));
        }

        if !(self.waypoint_spacing > 0.0) {
            return Err(anyhow!("Waypoint spacing must be positive"));
        }

        Ok(())
    }
}

impl Validate for EditorConfig {
    fn validate(&self) -> Result<()> {
        if self.min_zoom <= 0.0 || self.min_zoom >= self.max_zoom {
            return Err(anyhow!(
                "Editor zoom limits must satisfy 0 < min < max, got [{}, {}]",
                self.min_zoom,
                self.max_zoom
            ));
        }

        if self.initial_zoom < self.min_zoom || self.initial_zoom > self.max_zoom {
            return Err(anyhow!("Initial zoom {} is outside the zoom limits", self.initial_zoom));
        }

        if self.pan_divisor <= 0.0 {
            return Err(anyhow!("Pan divisor must be positive"));
        }

        if !(1.0..=10.0).contains(&self.grid_size) {
            return Err(anyhow!("Grid size must be in range [1, 10]"));
        }

        if self.panel_width < 0.0 {
            return Err(anyhow!("Panel width must be non-negative"));
        }

        Ok(())
    }
}
