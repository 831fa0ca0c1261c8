//! Device-independent input vocabulary. Whatever produces key and pointer
//! events maps them onto these types; the game and the editor only ever see
//! the mapped form.

use crate::simulation::Car;

#[cfg(feature = "window-input")]
pub mod winit_events;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameAction {
    Accelerate,
    Brake,
    SteerLeft,
    SteerRight,
    ChangeView,
    OpenEditor,
    Quit,
}

/// Camera placement around the player car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Chase,
    Front,
    Rear,
    Top,
}

impl ViewMode {
    pub fn next(self) -> Self {
        match self {
            ViewMode::Chase => ViewMode::Front,
            ViewMode::Front => ViewMode::Rear,
            ViewMode::Rear => ViewMode::Top,
            ViewMode::Top => ViewMode::Chase,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Continue,
    OpenEditor,
    Quit,
}

/// Keyboard handling for the player car while racing.
#[derive(Debug, Clone, Default)]
pub struct PlayerControls {
    pub view: ViewMode,
}

impl PlayerControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Speed changes are applied once per key press, not per tick. Reverse
    /// is capped at half the forward top speed.
    pub fn key_down(&mut self, car: &mut Car, action: GameAction) -> InputOutcome {
        match action {
            GameAction::Accelerate => {
                car.speed = (car.speed + car.acceleration).min(car.max_speed);
            }
            GameAction::Brake => {
                car.speed = (car.speed - car.acceleration).max(-car.max_speed / 2.0);
            }
            GameAction::SteerLeft => car.steering = 1.0,
            GameAction::SteerRight => car.steering = -1.0,
            GameAction::ChangeView => {
                self.view = self.view.next();
                log::debug!("View changed to {:?}", self.view);
            }
            GameAction::OpenEditor => return InputOutcome::OpenEditor,
            GameAction::Quit => return InputOutcome::Quit,
        }
        InputOutcome::Continue
    }

    pub fn key_up(&mut self, car: &mut Car, action: GameAction) {
        if matches!(action, GameAction::SteerLeft | GameAction::SteerRight) {
            car.steering = 0.0;
        }
    }
}

/// Keyboard shortcuts understood by the track editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorCommand {
    /// Leave the editor and hand the working track back to the game.
    Exit,
    /// Remove the selected segment.
    Delete,
    /// Save to the default track file.
    Save,
    /// Replace the working track with an empty one.
    New,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}
