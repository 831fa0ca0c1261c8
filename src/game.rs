use crate::compute::{CpuBackend, SimulationBackend};
use crate::config::GameConfig;
use crate::editor::{EditorOutcome, TrackEditor};
use crate::input::{EditorCommand, GameAction, InputOutcome, PlayerControls, ViewMode};
use crate::simulation::{SimulationState, TrackBounds};
use crate::track::{default_circuit, generator_for, load_track_from_file, Track};
use anyhow::{Context, Result};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const DEFAULT_TRACK_NAME: &str = "Default Circuit";
/// Viewport handed to the editor until a front end reports a real size.
pub const DEFAULT_VIEWPORT: (f32, f32) = (1024.0, 768.0);

/// One running game: the live track, the cars racing on it and, while the
/// player is editing, the editor holding a working copy of the track.
pub struct Game {
    config: GameConfig,
    track: Track,
    state: SimulationState,
    backend: Box<dyn SimulationBackend>,
    editor: Option<TrackEditor>,
    controls: PlayerControls,
    viewport: (f32, f32),
    rng: StdRng,
    quit_requested: bool,
}

impl Game {
    /// Load the configured track file, or build the default circuit.
    pub fn new(config: GameConfig) -> Result<Self> {
        let generator = generator_for(&config.track);
        let track = match &config.track.file {
            Some(path) => load_track_from_file(path, generator)
                .with_context(|| format!("Failed to load track file {}", path.display()))?,
            None => default_circuit(DEFAULT_TRACK_NAME, generator),
        };
        Self::with_track(config, track)
    }

    pub fn with_track(config: GameConfig, mut track: Track) -> Result<Self> {
        let mut rng = match config.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        if track.needs_regeneration() {
            track.regenerate();
        }
        let waypoints = track.waypoints()?;
        let bounds = TrackBounds::new(config.track.half_extent);
        let state = SimulationState::new_race(&config.player, &config.ai, waypoints, &bounds, &mut rng);

        info!(
            "Race on '{}': {} segments, {} waypoints, {} AI cars",
            track.name(),
            track.segment_count(),
            waypoints.len(),
            state.ai_cars.len()
        );

        Ok(Self {
            backend: Box::new(CpuBackend::new(&config)),
            config,
            track,
            state,
            editor: None,
            controls: PlayerControls::new(),
            viewport: DEFAULT_VIEWPORT,
            rng,
            quit_requested: false,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.get_name()
    }

    pub fn view(&self) -> ViewMode {
        self.controls.view
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    pub fn editor(&self) -> Option<&TrackEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut TrackEditor> {
        self.editor.as_mut()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);
        if let Some(editor) = &mut self.editor {
            editor.camera_mut().resize(width, height);
        }
    }

    /// One simulation tick. The race is frozen while the editor is open.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        if self.editor.is_some() {
            return Ok(());
        }
        self.backend.update(&mut self.state, &self.track, dt)
    }

    pub fn key_down(&mut self, action: GameAction) -> InputOutcome {
        if self.editor.is_some() {
            return InputOutcome::Continue;
        }

        let outcome = self.controls.key_down(&mut self.state.player, action);
        match outcome {
            InputOutcome::OpenEditor => self.enter_editor(),
            InputOutcome::Quit => {
                info!("Quit requested");
                self.quit_requested = true;
            }
            InputOutcome::Continue => {}
        }
        outcome
    }

    pub fn key_up(&mut self, action: GameAction) {
        if self.editor.is_none() {
            self.controls.key_up(&mut self.state.player, action);
        }
    }

    /// Open the editor on a copy of the live track. The live track stays
    /// untouched until the editor closes.
    pub fn enter_editor(&mut self) {
        if self.editor.is_some() {
            return;
        }
        info!("Entering track editor on '{}'", self.track.name());
        self.editor = Some(TrackEditor::new(self.track.clone(), &self.config.editor, self.viewport));
    }

    /// Close the editor and promote its working track to the live one.
    pub fn exit_editor(&mut self) {
        let Some(editor) = self.editor.take() else {
            return;
        };

        self.track = editor.into_track();
        let waypoint_count = self.track.waypoints().map(|w| w.len()).unwrap_or(0);
        self.state.clamp_waypoint_indices(waypoint_count);

        info!(
            "Track '{}' is now live ({} segments, {} waypoints)",
            self.track.name(),
            self.track.segment_count(),
            waypoint_count
        );
    }

    /// Forward an editor shortcut; `Exit` closes the editor.
    pub fn editor_command(&mut self, command: EditorCommand) -> Result<()> {
        let Some(editor) = self.editor.as_mut() else {
            return Ok(());
        };

        if editor.handle_command(command)? == EditorOutcome::Exit {
            self.exit_editor();
        }
        Ok(())
    }
}
