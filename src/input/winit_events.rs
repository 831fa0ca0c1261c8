use super::{EditorCommand, GameAction, PointerButton};
use winit::event::{MouseButton, MouseScrollDelta};
use winit::keyboard::{KeyCode, ModifiersState};

pub fn game_action_for(key: KeyCode) -> Option<GameAction> {
    match key {
        KeyCode::ArrowUp | KeyCode::KeyW => Some(GameAction::Accelerate),
        KeyCode::ArrowDown | KeyCode::KeyS => Some(GameAction::Brake),
        KeyCode::ArrowLeft | KeyCode::KeyA => Some(GameAction::SteerLeft),
        KeyCode::ArrowRight | KeyCode::KeyD => Some(GameAction::SteerRight),
        KeyCode::KeyV => Some(GameAction::ChangeView),
        KeyCode::KeyE => Some(GameAction::OpenEditor),
        KeyCode::Escape => Some(GameAction::Quit),
        _ => None,
    }
}

pub fn editor_command_for(key: KeyCode, modifiers: ModifiersState) -> Option<EditorCommand> {
    match key {
        KeyCode::Escape => Some(EditorCommand::Exit),
        KeyCode::Delete => Some(EditorCommand::Delete),
        KeyCode::KeyS if modifiers.control_key() => Some(EditorCommand::Save),
        KeyCode::KeyN if modifiers.control_key() => Some(EditorCommand::New),
        _ => None,
    }
}

pub fn pointer_button_for(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Left),
        MouseButton::Right => Some(PointerButton::Right),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// Wheel movement in lines; pixel deltas from touchpads are scaled down.
pub fn wheel_lines(delta: &MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => *y,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.01,
    }
}
