use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub mod format;
pub mod generator;
pub mod mesh;

pub use format::*;
pub use generator::*;
pub use mesh::*;

pub const MIN_SEGMENT_LENGTH: f32 = 5.0;
pub const MAX_SEGMENT_LENGTH: f32 = 50.0;
pub const MIN_CURVATURE: f32 = 0.05;
pub const MAX_CURVATURE: f32 = 1.0;
pub const MIN_TRACK_WIDTH: f32 = 3.0;
pub const MAX_TRACK_WIDTH: f32 = 10.0;
pub const DEFAULT_TRACK_WIDTH: f32 = 5.0;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("could not allocate room for another {0}")]
    Allocation(&'static str),
    #[error("derived track data is stale; regenerate waypoints and mesh before reading")]
    StaleDerivedData,
    #[error("{kind} index {index} is out of range ({len} present)")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize track: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentType {
    Straight,
    CurveLeft,
    CurveRight,
    HairpinLeft,
    HairpinRight,
}

impl SegmentType {
    pub const ALL: [SegmentType; 5] = [
        SegmentType::Straight,
        SegmentType::CurveLeft,
        SegmentType::CurveRight,
        SegmentType::HairpinLeft,
        SegmentType::HairpinRight,
    ];

    pub fn is_straight(self) -> bool {
        self == SegmentType::Straight
    }

    /// +1 for left-hand turns (increasing heading), -1 for right-hand, 0 for straights.
    pub fn turn_sign(self) -> f32 {
        match self {
            SegmentType::Straight => 0.0,
            SegmentType::CurveLeft | SegmentType::HairpinLeft => 1.0,
            SegmentType::CurveRight | SegmentType::HairpinRight => -1.0,
        }
    }

    pub fn default_length(self) -> f32 {
        if self.is_straight() { 20.0 } else { 15.0 }
    }

    pub fn default_curvature(self) -> f32 {
        if self.is_straight() { 0.0 } else { 0.2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TrackSegment {
    #[serde(rename = "type")]
    pub kind: SegmentType,
    pub length: f32,
    pub curvature: f32,
    pub width: f32,
    #[serde(default)]
    pub texture_id: u32,
}

impl TrackSegment {
    pub fn new(kind: SegmentType, length: f32, curvature: f32, width: f32) -> Self {
        Self {
            kind,
            length,
            curvature,
            width,
            texture_id: 0,
        }
    }

    /// Segment as the editor inserts it: type defaults and the standard width.
    pub fn with_defaults(kind: SegmentType) -> Self {
        Self::new(kind, kind.default_length(), kind.default_curvature(), DEFAULT_TRACK_WIDTH)
    }

    /// Signed heading change across the segment, in radians.
    ///
    /// Curves turn by `curvature * length`, capped at a quarter turn; hairpins
    /// always turn half a circle.
    pub fn turn_angle(&self) -> f32 {
        use std::f32::consts::{FRAC_PI_2, PI};

        let magnitude = match self.kind {
            SegmentType::Straight => 0.0,
            SegmentType::CurveLeft | SegmentType::CurveRight => {
                (self.curvature * self.length).clamp(0.0, FRAC_PI_2)
            }
            SegmentType::HairpinLeft | SegmentType::HairpinRight => PI,
        };
        magnitude * self.kind.turn_sign()
    }

    /// Pull every field into the editable limits. NaN or infinite values
    /// fall back to the defaults for the segment type.
    pub fn clamp_to_limits(&mut self) {
        self.length = clamp_or(self.length, MIN_SEGMENT_LENGTH, MAX_SEGMENT_LENGTH, self.kind.default_length());
        self.width = clamp_or(self.width, MIN_TRACK_WIDTH, MAX_TRACK_WIDTH, DEFAULT_TRACK_WIDTH);
        if self.kind.is_straight() {
            self.curvature = 0.0;
        } else {
            self.curvature = clamp_or(self.curvature, MIN_CURVATURE, MAX_CURVATURE, self.kind.default_curvature());
        }
    }

    pub fn clamped(mut self) -> Self {
        self.clamp_to_limits();
        self
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// A point on the racing line. The track surface is always at height 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub x: f32,
    pub z: f32,
    pub width: f32,
}

impl Waypoint {
    pub const fn new(x: f32, z: f32, width: f32) -> Self {
        Self { x, z, width }
    }

    pub fn position(&self) -> Point2<f32> {
        Point2::new(self.x, self.z)
    }
}

/// A circuit: the authored segment list plus the waypoints and mesh derived from it.
///
/// Segment mutations mark the derived data stale. Until [`Track::regenerate`]
/// runs, [`Track::waypoints`] and [`Track::mesh`] refuse to answer.
#[derive(Debug, Clone)]
pub struct Track {
    name: String,
    segments: Vec<TrackSegment>,
    waypoints: Vec<Waypoint>,
    mesh: Option<TrackMesh>,
    generator: Arc<dyn WaypointGenerator>,
    waypoints_stale: bool,
    mesh_stale: bool,
    modified: bool,
    next_mesh_id: u64,
}

impl Track {
    /// An empty track with no segments. It starts out modified (never saved).
    pub fn new(name: &str) -> Self {
        Self::with_generator(name, Arc::new(SegmentPathGenerator::default()))
    }

    pub fn with_generator(name: &str, generator: Arc<dyn WaypointGenerator>) -> Self {
        log::debug!("Created empty track '{}'", name);
        Self {
            name: name.to_string(),
            segments: Vec::new(),
            waypoints: Vec::new(),
            mesh: None,
            generator,
            waypoints_stale: false,
            mesh_stale: false,
            modified: true,
            next_mesh_id: 1,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.modified = true;
    }

    pub fn generator(&self) -> &Arc<dyn WaypointGenerator> {
        &self.generator
    }

    pub fn set_generator(&mut self, generator: Arc<dyn WaypointGenerator>) {
        self.generator = generator;
        self.invalidate();
    }

    pub fn segments(&self) -> &[TrackSegment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&TrackSegment> {
        self.segments.get(index)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Sum of authored segment lengths.
    pub fn total_length(&self) -> f32 {
        self.segments.iter().map(|s| s.length).sum()
    }

    /// True when the track has edits that were not saved.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// True when waypoints or mesh lag behind the segments.
    pub fn needs_regeneration(&self) -> bool {
        self.waypoints_stale || self.mesh_stale
    }

    pub fn waypoints(&self) -> Result<&[Waypoint], TrackError> {
        if self.waypoints_stale {
            return Err(TrackError::StaleDerivedData);
        }
        Ok(&self.waypoints)
    }

    pub fn mesh(&self) -> Result<Option<&TrackMesh>, TrackError> {
        if self.needs_regeneration() {
            return Err(TrackError::StaleDerivedData);
        }
        Ok(self.mesh.as_ref())
    }

    pub fn add_segment(
        &mut self,
        kind: SegmentType,
        length: f32,
        curvature: f32,
        width: f32,
    ) -> Result<(), TrackError> {
        self.push_segment(TrackSegment::new(kind, length, curvature, width))
    }

    pub fn push_segment(&mut self, segment: TrackSegment) -> Result<(), TrackError> {
        let index = self.segments.len();
        self.insert_segment(index, segment)
    }

    /// Insert at `index` (0..=len), clamped to the editable limits. Nothing
    /// changes if the insert fails.
    pub fn insert_segment(&mut self, index: usize, segment: TrackSegment) -> Result<(), TrackError> {
        if index > self.segments.len() {
            return Err(TrackError::IndexOutOfRange {
                kind: "segment",
                index,
                len: self.segments.len(),
            });
        }

        if self.segments.try_reserve(1).is_err() {
            log::warn!("Allocation failed while adding a segment to '{}'", self.name);
            return Err(TrackError::Allocation("track segment"));
        }

        self.segments.insert(index, segment.clamped());
        self.invalidate();
        Ok(())
    }

    pub fn remove_segment(&mut self, index: usize) -> Result<TrackSegment, TrackError> {
        if index >= self.segments.len() {
            return Err(TrackError::IndexOutOfRange {
                kind: "segment",
                index,
                len: self.segments.len(),
            });
        }

        let removed = self.segments.remove(index);
        self.invalidate();
        Ok(removed)
    }

    /// Apply `edit` to one segment and clamp the result to the editable limits.
    pub fn update_segment<F>(&mut self, index: usize, edit: F) -> Result<(), TrackError>
    where
        F: FnOnce(&mut TrackSegment),
    {
        let len = self.segments.len();
        let segment = self.segments.get_mut(index).ok_or(TrackError::IndexOutOfRange {
            kind: "segment",
            index,
            len,
        })?;

        let before = *segment;
        edit(segment);
        segment.clamp_to_limits();

        if *segment != before {
            self.invalidate();
        }
        Ok(())
    }

    /// Replace the segment list wholesale. Returns how many segments had to
    /// be clamped to the editable limits.
    pub fn set_segments(&mut self, segments: Vec<TrackSegment>) -> usize {
        let mut adjusted = 0;
        self.segments = segments
            .into_iter()
            .map(|segment| {
                let clamped = segment.clamped();
                if clamped != segment {
                    adjusted += 1;
                }
                clamped
            })
            .collect();
        self.invalidate();
        adjusted
    }

    /// Move one derived waypoint by hand. Only the mesh goes stale; the next
    /// segment regeneration discards the manual placement.
    pub fn move_waypoint(&mut self, index: usize, x: f32, z: f32) -> Result<(), TrackError> {
        if self.waypoints_stale {
            return Err(TrackError::StaleDerivedData);
        }

        let len = self.waypoints.len();
        let waypoint = self.waypoints.get_mut(index).ok_or(TrackError::IndexOutOfRange {
            kind: "waypoint",
            index,
            len,
        })?;

        waypoint.x = x;
        waypoint.z = z;
        self.mesh_stale = true;
        self.modified = true;
        Ok(())
    }

    /// Recompute the whole waypoint sequence from the segments.
    pub fn generate_waypoints(&mut self) {
        self.waypoints = if self.segments.is_empty() {
            Vec::new()
        } else {
            self.generator.generate(&self.segments)
        };
        self.waypoints_stale = false;
        self.mesh_stale = true;

        log::debug!(
            "Track '{}': {} segments -> {} waypoints",
            self.name,
            self.segments.len(),
            self.waypoints.len()
        );
    }

    /// Rebuild the mesh from the current waypoints, releasing the previous one.
    pub fn generate_track_mesh(&mut self) {
        if self.waypoints_stale {
            self.generate_waypoints();
        }

        let id = MeshId(self.next_mesh_id);
        self.next_mesh_id += 1;

        let replaced = std::mem::replace(&mut self.mesh, build_track_mesh(&self.waypoints, id));
        if let Some(old) = replaced {
            log::debug!("Released track mesh {:?} ({} vertices)", old.id, old.vertices.len());
        }
        self.mesh_stale = false;
    }

    /// Waypoints then mesh, in that order.
    pub fn regenerate(&mut self) {
        self.generate_waypoints();
        self.generate_track_mesh();
    }

    /// Waypoint index closest to where segment `index` begins, measured by
    /// the fraction of total length travelled along each representation.
    pub fn segment_anchor(&self, index: usize) -> Option<usize> {
        if self.waypoints_stale || self.waypoints.is_empty() || index >= self.segments.len() {
            return None;
        }

        let total_segments = self.total_length();
        if total_segments <= 0.0 {
            return Some(0);
        }
        let fraction = self.segments[..index].iter().map(|s| s.length).sum::<f32>() / total_segments;

        let mut arc = Vec::with_capacity(self.waypoints.len());
        let mut travelled = 0.0;
        for (i, wp) in self.waypoints.iter().enumerate() {
            if i > 0 {
                travelled += (wp.position() - self.waypoints[i - 1].position()).norm();
            }
            arc.push(travelled);
        }
        let closing = self
            .waypoints
            .last()
            .zip(self.waypoints.first())
            .map(|(last, first)| (first.position() - last.position()).norm())
            .unwrap_or(0.0);
        let target = fraction * (travelled + closing);

        arc.iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (*a - target).abs().total_cmp(&(*b - target).abs()))
            .map(|(i, _)| i)
    }

    fn invalidate(&mut self) {
        self.waypoints_stale = true;
        self.mesh_stale = true;
        self.modified = true;
    }
}

impl Drop for Track {
    fn drop(&mut self) {
        if let Some(mesh) = self.mesh.take() {
            log::debug!("Track '{}' destroyed, releasing mesh {:?}", self.name, mesh.id);
        }
    }
}
