use ratatui::Frame;

use crate::app::{App, AppState};
use crate::ui::{composer::render_composer, overlay::render_overlay};

/// A UI Screen boundary: draws one application state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Sequence editor with the stored-sequence library
pub struct ComposerScreen;

impl Screen for ComposerScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_composer(app, f);
    }
}

/// Playback overlay
pub struct OverlayScreen;

impl Screen for OverlayScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_overlay(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Composer => Box::new(ComposerScreen),
        AppState::Overlay => Box::new(OverlayScreen),
    }
}
