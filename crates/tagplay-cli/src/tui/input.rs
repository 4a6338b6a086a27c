//! Key bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use tagplay_core::Screen;

use crate::controller::UserAction;

/// What a key press means on the current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Action(UserAction),
    Quit,
    Ignored,
}

/// Map a key press to an outcome.
///
/// Enter and Space press the screen's one button. `x` and Esc close the
/// video, and only while it is mounted.
pub fn action_for_key(screen: &Screen, key: KeyEvent) -> KeyOutcome {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyOutcome::Quit;
    }

    match key.code {
        KeyCode::Char('q') => KeyOutcome::Quit,
        KeyCode::Char('r') => KeyOutcome::Action(UserAction::Reload),
        KeyCode::Enter | KeyCode::Char(' ') => screen
            .affordance()
            .map_or(KeyOutcome::Ignored, |a| KeyOutcome::Action(a.into())),
        KeyCode::Char('x') | KeyCode::Esc if screen.is_video_visible() => {
            KeyOutcome::Action(UserAction::CloseVideo)
        }
        _ => KeyOutcome::Ignored,
    }
}
