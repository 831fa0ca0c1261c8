use crate::config::EditorConfig;
use crate::input::{EditorCommand, PointerButton};
use crate::simulation::Point;
use crate::track::{
    generate_random_track, load_track_from_file, save_track_to_file, SegmentType, Track, TrackError,
    TrackSegment, WaypointGenerator,
};
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub mod camera;

pub use camera::*;

/// A click selects a waypoint only if one lies within this many world units.
pub const WAYPOINT_PICK_RADIUS: f32 = 1.0;
/// A click selects a segment if the waypoint where it begins is this close.
pub const SEGMENT_PICK_RADIUS: f32 = 2.0;
/// Height of the tab strip at the top of the side panel, in pixels.
pub const TAB_BAR_HEIGHT: f32 = 40.0;
pub const MIN_GRID_SIZE: f32 = 1.0;
pub const MAX_GRID_SIZE: f32 = 10.0;
pub const NEW_TRACK_NAME: &str = "New Circuit";
pub const RANDOM_TRACK_NAME: &str = "Random Circuit";

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("no segment is selected")]
    NoSelection,
    #[error("the clipboard is empty")]
    EmptyClipboard,
    #[error(transparent)]
    Track(#[from] TrackError),
}

/// Which side-panel tab is active. The order matches the tabs left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Segments,
    Waypoints,
    Properties,
}

impl EditorMode {
    pub const TABS: [EditorMode; 3] = [EditorMode::Segments, EditorMode::Waypoints, EditorMode::Properties];
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragMode {
    #[default]
    None,
    MoveWaypoint,
    PanCamera {
        start: (f32, f32),
        anchor: (f32, f32),
    },
    ZoomCamera {
        last_y: f32,
    },
}

/// At most one segment or one waypoint is selected, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Segment(usize),
    Waypoint(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorOutcome {
    Continue,
    Exit,
}

/// Interactive editing of a working copy of a track.
///
/// Every structural edit regenerates waypoints and mesh before returning,
/// so the working track is never observed stale from outside.
pub struct TrackEditor {
    track: Track,
    generator: Arc<dyn WaypointGenerator>,
    mode: EditorMode,
    drag: DragMode,
    selection: Selection,
    clipboard: Option<TrackSegment>,
    camera: EditorCamera,
    grid_visible: bool,
    grid_size: f32,
    panel_width: f32,
    default_file: PathBuf,
}

impl TrackEditor {
    pub fn new(mut track: Track, config: &EditorConfig, viewport: (f32, f32)) -> Self {
        if track.needs_regeneration() {
            track.regenerate();
        }
        let generator = Arc::clone(track.generator());

        Self {
            track,
            generator,
            mode: EditorMode::default(),
            drag: DragMode::None,
            selection: Selection::None,
            clipboard: None,
            camera: EditorCamera::new(config, viewport.0, viewport.1),
            grid_visible: true,
            grid_size: config.grid_size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE),
            panel_width: config.panel_width,
            default_file: config.default_file.clone(),
        }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Hand the working track back, regenerated.
    pub fn into_track(mut self) -> Track {
        if self.track.needs_regeneration() {
            self.track.regenerate();
        }
        self.track
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EditorMode) {
        if self.mode != mode {
            log::debug!("Editor mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
    }

    pub fn drag_mode(&self) -> DragMode {
        self.drag
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selected_segment(&self) -> Option<usize> {
        match self.selection {
            Selection::Segment(index) => Some(index),
            _ => None,
        }
    }

    pub fn selected_waypoint(&self) -> Option<usize> {
        match self.selection {
            Selection::Waypoint(index) => Some(index),
            _ => None,
        }
    }

    /// Out-of-range indices are ignored.
    pub fn select_segment(&mut self, index: usize) {
        if index < self.track.segment_count() {
            self.selection = Selection::Segment(index);
        }
    }

    pub fn select_waypoint(&mut self, index: usize) {
        if index < self.waypoint_count() {
            self.selection = Selection::Waypoint(index);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    pub fn clipboard(&self) -> Option<&TrackSegment> {
        self.clipboard.as_ref()
    }

    pub fn camera(&self) -> &EditorCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut EditorCamera {
        &mut self.camera
    }

    pub fn grid_visible(&self) -> bool {
        self.grid_visible
    }

    pub fn toggle_grid(&mut self) {
        self.grid_visible = !self.grid_visible;
    }

    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }

    pub fn set_grid_size(&mut self, size: f32) {
        self.grid_size = size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE);
    }

    fn waypoint_count(&self) -> usize {
        self.track.waypoints().map(|w| w.len()).unwrap_or(0)
    }

    // Pointer handling

    fn panel_left(&self) -> f32 {
        self.camera.viewport().0 - self.panel_width
    }

    pub fn pointer_down(&mut self, button: PointerButton, screen_x: f32, screen_y: f32) {
        match button {
            PointerButton::Left => {
                if screen_x > self.panel_left() {
                    self.click_panel(screen_x, screen_y);
                    return;
                }

                let world = self.camera.screen_to_world(screen_x, screen_y);
                match self.mode {
                    EditorMode::Waypoints => self.pick_waypoint(world),
                    EditorMode::Segments => self.pick_segment(world),
                    EditorMode::Properties => {}
                }

                self.drag = if self.selected_waypoint().is_some() {
                    DragMode::MoveWaypoint
                } else {
                    DragMode::None
                };
            }
            PointerButton::Right => {
                self.drag = DragMode::PanCamera {
                    start: (screen_x, screen_y),
                    anchor: (self.camera.x, self.camera.z),
                };
            }
            PointerButton::Middle => {
                self.drag = DragMode::ZoomCamera { last_y: screen_y };
            }
        }
    }

    pub fn pointer_motion(&mut self, screen_x: f32, screen_y: f32) -> Result<(), EditorError> {
        match self.drag {
            DragMode::None => {}
            DragMode::MoveWaypoint => {
                if let Selection::Waypoint(index) = self.selection {
                    let world = self.camera.screen_to_world(screen_x, screen_y);
                    self.track.move_waypoint(index, world.x, world.y)?;
                    self.track.generate_track_mesh();
                }
            }
            DragMode::PanCamera { start, anchor } => {
                self.camera.pan_from(anchor, screen_x - start.0, screen_y - start.1);
            }
            DragMode::ZoomCamera { last_y } => {
                self.camera.drag_zoom(screen_y - last_y);
                self.drag = DragMode::ZoomCamera { last_y: screen_y };
            }
        }
        Ok(())
    }

    pub fn pointer_up(&mut self, _button: PointerButton) {
        self.drag = DragMode::None;
    }

    pub fn wheel(&mut self, lines: f32) {
        self.camera.wheel(lines);
    }

    fn click_panel(&mut self, screen_x: f32, screen_y: f32) {
        if screen_y >= TAB_BAR_HEIGHT || self.panel_width <= 0.0 {
            return;
        }

        let tab_width = self.panel_width / EditorMode::TABS.len() as f32;
        let tab = ((screen_x - self.panel_left()) / tab_width) as usize;
        if let Some(mode) = EditorMode::TABS.get(tab) {
            self.set_mode(*mode);
        }
    }

    fn pick_waypoint(&mut self, world: Point) {
        let nearest = self.track.waypoints().ok().and_then(|waypoints| {
            waypoints
                .iter()
                .enumerate()
                .map(|(i, wp)| (i, (wp.position() - world).norm()))
                .filter(|(_, distance)| *distance < WAYPOINT_PICK_RADIUS)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i)
        });

        self.selection = nearest.map_or(Selection::None, Selection::Waypoint);
    }

    fn pick_segment(&mut self, world: Point) {
        let nearest = match self.track.waypoints() {
            Ok(waypoints) => (0..self.track.segment_count())
                .filter_map(|i| {
                    let anchor = self.track.segment_anchor(i)?;
                    Some((i, (waypoints[anchor].position() - world).norm()))
                })
                .filter(|(_, distance)| *distance < SEGMENT_PICK_RADIUS)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i),
            Err(_) => None,
        };

        self.selection = nearest.map_or(Selection::None, Selection::Segment);
    }

    // Structural edits

    fn insert_position(&self) -> usize {
        match self.selection {
            Selection::Segment(index) => (index + 1).min(self.track.segment_count()),
            _ => self.track.segment_count(),
        }
    }

    fn require_segment(&self) -> Result<usize, EditorError> {
        match self.selection {
            Selection::Segment(index) if index < self.track.segment_count() => Ok(index),
            _ => Err(EditorError::NoSelection),
        }
    }

    fn commit(&mut self, edit: &str) {
        self.track.regenerate();
        log::debug!(
            "Editor {}: '{}' now has {} segments",
            edit,
            self.track.name(),
            self.track.segment_count()
        );
    }

    /// Re-clamp the selection after the lists shrank.
    fn clamp_selection(&mut self) {
        self.selection = match self.selection {
            Selection::Segment(index) => match self.track.segment_count() {
                0 => Selection::None,
                count => Selection::Segment(index.min(count - 1)),
            },
            Selection::Waypoint(index) => match self.waypoint_count() {
                0 => Selection::None,
                count => Selection::Waypoint(index.min(count - 1)),
            },
            Selection::None => Selection::None,
        };
    }

    /// Insert a default segment of `kind` after the selected one (or at the
    /// end) and select it.
    pub fn add_segment(&mut self, kind: SegmentType) -> Result<usize, EditorError> {
        let index = self.insert_position();
        self.track.insert_segment(index, TrackSegment::with_defaults(kind))?;
        self.selection = Selection::Segment(index);
        self.commit("add");
        Ok(index)
    }

    pub fn duplicate_selected(&mut self) -> Result<usize, EditorError> {
        let index = self.require_segment()?;
        let copy = self.track.segments()[index];
        self.track.insert_segment(index + 1, copy)?;
        self.selection = Selection::Segment(index + 1);
        self.commit("duplicate");
        Ok(index + 1)
    }

    pub fn copy_selected(&mut self) -> Result<(), EditorError> {
        let index = self.require_segment()?;
        self.clipboard = Some(self.track.segments()[index]);
        Ok(())
    }

    pub fn cut_selected(&mut self) -> Result<TrackSegment, EditorError> {
        let index = self.require_segment()?;
        let removed = self.track.remove_segment(index)?;
        self.clipboard = Some(removed);
        self.clamp_selection();
        self.commit("cut");
        Ok(removed)
    }

    /// Insert the clipboard after the selected segment, or at the end when
    /// nothing is selected.
    pub fn paste(&mut self) -> Result<usize, EditorError> {
        let segment = self.clipboard.ok_or(EditorError::EmptyClipboard)?;
        let index = self.insert_position();
        self.track.insert_segment(index, segment)?;
        self.selection = Selection::Segment(index);
        self.commit("paste");
        Ok(index)
    }

    pub fn delete_selected(&mut self) -> Result<TrackSegment, EditorError> {
        let index = self.require_segment()?;
        let removed = self.track.remove_segment(index)?;
        self.clamp_selection();
        self.commit("delete");
        Ok(removed)
    }

    // Segment properties

    fn edit_selected<F>(&mut self, edit: F) -> Result<(), EditorError>
    where
        F: FnOnce(&mut TrackSegment),
    {
        let index = self.require_segment()?;
        self.track.update_segment(index, edit)?;
        if self.track.needs_regeneration() {
            self.commit("property edit");
        }
        Ok(())
    }

    /// Switching a straight to a curve picks up the curve's default curvature.
    pub fn set_segment_kind(&mut self, kind: SegmentType) -> Result<(), EditorError> {
        self.edit_selected(|segment| {
            if segment.kind.is_straight() && !kind.is_straight() {
                segment.curvature = kind.default_curvature();
            }
            segment.kind = kind;
        })
    }

    pub fn set_segment_length(&mut self, length: f32) -> Result<(), EditorError> {
        self.edit_selected(|segment| segment.length = length)
    }

    pub fn set_segment_curvature(&mut self, curvature: f32) -> Result<(), EditorError> {
        self.edit_selected(|segment| segment.curvature = curvature)
    }

    pub fn set_segment_width(&mut self, width: f32) -> Result<(), EditorError> {
        self.edit_selected(|segment| segment.width = width)
    }

    // Whole-track actions

    fn replace_track(&mut self, track: Track) {
        let old = std::mem::replace(&mut self.track, track);
        log::debug!("Editor replaced '{}' with '{}'", old.name(), self.track.name());
        self.selection = Selection::None;
        self.drag = DragMode::None;
    }

    pub fn new_track(&mut self, name: &str) {
        let mut track = Track::with_generator(name, Arc::clone(&self.generator));
        track.regenerate();
        self.replace_track(track);
    }

    /// On failure the working track is left as it was.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), EditorError> {
        let track = load_track_from_file(path, Arc::clone(&self.generator))?;
        self.replace_track(track);
        Ok(())
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), EditorError> {
        save_track_to_file(&self.track, path)?;
        self.track.mark_saved();
        Ok(())
    }

    pub fn load_default(&mut self) -> Result<(), EditorError> {
        let path = self.default_file.clone();
        self.load(path)
    }

    pub fn save_default(&mut self) -> Result<(), EditorError> {
        let path = self.default_file.clone();
        self.save(path)
    }

    /// Replace the working track with a random loop of 8 to 12 segments.
    pub fn random_track<R: Rng>(&mut self, rng: &mut R) {
        let count = rng.gen_range(8..=12);
        let track = generate_random_track(RANDOM_TRACK_NAME, count, Arc::clone(&self.generator), rng);
        self.replace_track(track);
    }

    pub fn handle_command(&mut self, command: EditorCommand) -> Result<EditorOutcome, EditorError> {
        match command {
            EditorCommand::Exit => return Ok(EditorOutcome::Exit),
            EditorCommand::Delete => {
                if self.mode == EditorMode::Segments && self.selected_segment().is_some() {
                    self.delete_selected()?;
                }
            }
            EditorCommand::Save => self.save_default()?,
            EditorCommand::New => self.new_track(NEW_TRACK_NAME),
        }
        Ok(EditorOutcome::Continue)
    }
}
