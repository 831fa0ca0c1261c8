use super::{Track, TrackError, TrackSegment, WaypointGenerator};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// On-disk track: metadata plus the authored segments. Waypoints and mesh
/// are never stored since they regenerate from the segments.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrackFile {
    #[serde(default)]
    pub metadata: TrackMetadata,
    #[serde(default, rename = "segment")]
    pub segments: Vec<TrackSegment>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrackMetadata {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub author: String,
}

impl Default for TrackMetadata {
    fn default() -> Self {
        Self {
            name: default_name(),
            author: String::new(),
        }
    }
}

fn default_name() -> String {
    "Untitled".to_string()
}

impl TrackFile {
    pub fn from_track(track: &Track) -> Self {
        Self {
            metadata: TrackMetadata {
                name: track.name().to_string(),
                author: String::new(),
            },
            segments: track.segments().to_vec(),
        }
    }

    /// Build a regenerated, unmodified track from the stored segments.
    /// Out-of-range segment values are clamped to the editable limits.
    pub fn into_track(self, generator: Arc<dyn WaypointGenerator>) -> Track {
        let mut track = Track::with_generator(&self.metadata.name, generator);
        let adjusted = track.set_segments(self.segments);
        if adjusted > 0 {
            log::warn!(
                "Track '{}': clamped {} segments to the editable limits",
                self.metadata.name,
                adjusted
            );
        }
        track.regenerate();
        track.mark_saved();
        track
    }

    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, TrackError> {
        toml::from_str(text).map_err(|source| TrackError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_toml_string(&self) -> Result<String, TrackError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load a track from a TOML file.
    pub fn load(path: &Path) -> Result<Self, TrackError> {
        let text = std::fs::read_to_string(path).map_err(|source| TrackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Save this track to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), TrackError> {
        let text = self.to_toml_string()?;
        std::fs::write(path, text).map_err(|source| TrackError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn load_track_from_file(
    path: impl AsRef<Path>,
    generator: Arc<dyn WaypointGenerator>,
) -> Result<Track, TrackError> {
    let path = path.as_ref();
    let file = TrackFile::load(path)?;
    log::info!(
        "Loaded track '{}' ({} segments) from {}",
        file.metadata.name,
        file.segments.len(),
        path.display()
    );
    Ok(file.into_track(generator))
}

pub fn save_track_to_file(track: &Track, path: impl AsRef<Path>) -> Result<(), TrackError> {
    let path = path.as_ref();
    TrackFile::from_track(track).save(path)?;
    log::info!("Saved track '{}' to {}", track.name(), path.display());
    Ok(())
}
