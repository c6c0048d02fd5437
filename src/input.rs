use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{Action, AppEvent};

pub fn key_action(key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::Next),
        KeyCode::Left | KeyCode::Char('h') => Some(Action::Previous),
        KeyCode::Char('a') => Some(Action::First),
        KeyCode::Char('e') => Some(Action::Last),
        KeyCode::Char('r') => Some(Action::Random),
        _ => None,
    }
}

/// Terminal events the client reacts to; everything else is dropped.
pub fn translate(event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) => key_action(key).map(AppEvent::Action),
        Event::Resize(width, height) => Some(AppEvent::Resize { width, height }),
        _ => None,
    }
}
