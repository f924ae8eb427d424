use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;

use crate::{App, AppState, Focus};

/// A UI Screen boundary: responsible for rendering and optional key handling
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
    /// Optional per-screen key handling. Returns true if the key was handled.
    fn on_key(&mut self, _key: KeyEvent, _app: &mut App) -> bool {
        false
    }
}

/// Book and chapter picker
pub struct LibraryScreen;

impl Screen for LibraryScreen {
    fn on_key(&mut self, key: KeyEvent, app: &mut App) -> bool {
        match key.code {
            KeyCode::Up => app.move_selection(-1),
            KeyCode::Down => app.move_selection(1),
            KeyCode::PageUp => app.move_selection(-10),
            KeyCode::PageDown => app.move_selection(10),
            KeyCode::Left => app.cursor.focus = Focus::Books,
            KeyCode::Right | KeyCode::Tab => app.cursor.focus = Focus::Chapters,
            KeyCode::Enter => app.start_selected(),
            KeyCode::Char('v') => app.cycle_version(),
            KeyCode::Char('c') => app.continue_reading(),
            KeyCode::Char('d') => app.toggle_dark_mode(),
            KeyCode::Char('+') | KeyCode::Char('=') => app.change_font_size(true),
            KeyCode::Char('-') => app.change_font_size(false),
            _ => return false,
        }
        true
    }
}

/// The RSVP display
pub struct ReadingScreen;

impl Screen for ReadingScreen {
    fn on_key(&mut self, key: KeyEvent, app: &mut App) -> bool {
        match key.code {
            KeyCode::Char(' ') => app.session.toggle_pause(),
            KeyCode::Up | KeyCode::Right => {
                app.session.faster();
            }
            KeyCode::Down | KeyCode::Left => {
                app.session.slower();
            }
            KeyCode::Esc => app.session.stop(),
            _ => return false,
        }
        true
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Library => Box::new(LibraryScreen),
        AppState::Reading => Box::new(ReadingScreen),
    }
}
