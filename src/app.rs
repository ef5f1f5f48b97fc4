use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{info, warn};
use std::time::Duration;

use crate::composer::Composer;
use crate::config::Config;
use crate::history_db::HistoryDb;
use crate::overlay::Overlay;
use crate::player::SequencePlayer;
use crate::store::{KeyValueStore, SequenceStore};
use crate::time_format::parse_duration;

/// Name recorded in the history for sequences that were never titled
pub const UNTITLED: &str = "untitled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Composer,
    Overlay,
}

/// Which composer pane receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Timers,
    Library,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Label,
    Duration,
    Title,
}

/// A single-line text prompt shown over the composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    pub field: EditField,
    pub buffer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub state: AppState,
    pub focus: Focus,
    pub config: Config,
    pub composer: Composer,
    pub library: Vec<String>,
    pub library_selected: usize,
    pub player: Option<SequencePlayer>,
    pub overlay: Overlay,
    pub input: Option<TextInput>,
    pub notice: Option<String>,
    store: SequenceStore<Box<dyn KeyValueStore>>,
    history_db: Option<HistoryDb>,
}

impl App {
    pub fn new(
        config: Config,
        backend: Box<dyn KeyValueStore>,
        history_db: Option<HistoryDb>,
    ) -> Self {
        let mut app = Self {
            state: AppState::Composer,
            focus: Focus::Timers,
            composer: Composer::new(config.default_timer_secs),
            overlay: Overlay::new("", config.bell),
            config,
            library: Vec::new(),
            library_selected: 0,
            player: None,
            input: None,
            notice: None,
            store: SequenceStore::new(backend),
            history_db,
        };
        app.refresh_library();
        app
    }

    pub fn refresh_library(&mut self) {
        self.library = self.store.sequences().into_keys().collect();
        if self.library_selected >= self.library.len() {
            self.library_selected = self.library.len().saturating_sub(1);
        }
    }

    /// Load a stored sequence into the composer
    pub fn load_stored(&mut self, name: &str) -> bool {
        match self.store.sequence(name) {
            Some(definition) => match self.composer.load(name, definition) {
                Ok(()) => {
                    self.notice = Some(format!("Loaded '{name}'"));
                    true
                }
                Err(e) => {
                    warn!("could not load '{name}': {e}");
                    self.notice = Some(format!("Could not load '{name}': {e}"));
                    false
                }
            },
            None => {
                self.notice = Some(format!("No sequence named '{name}'"));
                false
            }
        }
    }

    pub fn save_current(&mut self) {
        let title = self.composer.title.trim().to_string();
        if title.is_empty() {
            self.notice = Some("Set a title first (n)".to_string());
            return;
        }

        let result = self
            .composer
            .definition()
            .map_err(|e| e.to_string())
            .and_then(|def| {
                self.store
                    .store_sequence(&title, &def)
                    .map_err(|e| e.to_string())
            });

        self.notice = Some(match result {
            Ok(()) => {
                info!("saved sequence '{title}'");
                format!("Saved '{title}'")
            }
            Err(e) => {
                warn!("could not save '{title}': {e}");
                format!("Could not save '{title}': {e}")
            }
        });
        self.refresh_library();
    }

    pub fn remove_stored(&mut self, name: &str) {
        self.notice = Some(match self.store.remove_sequence(name) {
            Ok(true) => format!("Removed '{name}'"),
            Ok(false) => format!("No sequence named '{name}'"),
            Err(e) => format!("Could not remove '{name}': {e}"),
        });
        self.refresh_library();
    }

    /// Start a fresh playback session of the composed sequence
    pub fn play(&mut self) {
        let definition = match self.composer.definition() {
            Ok(definition) => definition,
            Err(e) => {
                self.notice = Some(e.to_string());
                return;
            }
        };
        let mut player = match SequencePlayer::new(definition) {
            Ok(player) => player,
            Err(e) => {
                self.notice = Some(e.to_string());
                return;
            }
        };

        self.overlay.open(self.composer.title.trim());
        self.overlay.attach(&mut player);
        player.start();
        self.player = Some(player);
        self.state = AppState::Overlay;
        self.sync_overlay();
    }

    /// Leave playback and return to the composer. A running timer is checked out first so
    /// its last segment reaches the history.
    pub fn close_overlay(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.pause();
            self.sync_overlay();
        }
        if let Some(mut player) = self.player.take() {
            player.restore_sequence();
        }
        self.state = AppState::Composer;
    }

    /// Deliver due player ticks
    pub fn on_tick(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.poll();
            self.sync_overlay();
        }
    }

    /// Time left until the running player's next tick
    pub fn until_player_tick(&self) -> Option<Duration> {
        self.player
            .as_ref()
            .filter(|player| player.is_running())
            .and_then(|player| player.ticker().until_due())
    }

    /// Feed player events to the overlay and persist what it logged
    pub fn sync_overlay(&mut self) {
        let logged = self.overlay.sync();
        if !self.config.record_history || logged.is_empty() {
            return;
        }
        let Some(db) = self.history_db.as_ref() else {
            return;
        };

        let sequence = match self.overlay.title() {
            "" => UNTITLED,
            title => title,
        };
        for entry in &logged {
            if let Err(e) = db.record(sequence, entry) {
                warn!("could not record history entry: {e}");
            }
        }
    }

    pub fn history_db(&self) -> Option<&HistoryDb> {
        self.history_db.as_ref()
    }

    pub fn take_bell(&mut self) -> bool {
        self.overlay.take_bell()
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        if self.input.is_some() {
            self.on_input_key(key);
            return Flow::Continue;
        }

        match self.state {
            AppState::Composer => self.on_composer_key(key),
            AppState::Overlay => {
                self.on_overlay_key(key);
                Flow::Continue
            }
        }
    }

    fn on_composer_key(&mut self, key: KeyEvent) -> Flow {
        self.notice = None;

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Timers => Focus::Library,
                    Focus::Library => Focus::Timers,
                };
            }
            KeyCode::Char(' ') | KeyCode::Char('p') => self.play(),
            KeyCode::Char('s') => self.save_current(),
            KeyCode::Char('n') => self.begin_input(EditField::Title),
            KeyCode::Char('x') => self.composer.adjust_executions(1),
            KeyCode::Char('X') => self.composer.adjust_executions(-1),
            _ => match self.focus {
                Focus::Timers => self.on_timers_key(key),
                Focus::Library => self.on_library_key(key),
            },
        }
        Flow::Continue
    }

    fn on_timers_key(&mut self, key: KeyEvent) {
        let step = self.config.duration_step_secs as i64;

        match key.code {
            KeyCode::Up if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.composer.move_selected(true)
            }
            KeyCode::Down if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.composer.move_selected(false)
            }
            KeyCode::Char('K') => self.composer.move_selected(true),
            KeyCode::Char('J') => self.composer.move_selected(false),
            KeyCode::Up | KeyCode::Char('k') => self.composer.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.composer.select_next(),
            KeyCode::Char('a') => self.composer.add_timer(),
            KeyCode::Char('d') | KeyCode::Delete => {
                if !self.composer.remove_selected() {
                    self.notice = Some("A sequence needs at least one timer".to_string());
                }
            }
            KeyCode::Char('t') => self.composer.toggle_direction(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.composer.adjust_duration(step),
            KeyCode::Char('-') => self.composer.adjust_duration(-step),
            KeyCode::Char('.') => self.composer.adjust_duration(1),
            KeyCode::Char(',') => self.composer.adjust_duration(-1),
            KeyCode::Enter | KeyCode::Char('e') => self.begin_input(EditField::Label),
            KeyCode::Char('T') => self.begin_input(EditField::Duration),
            _ => {}
        }
    }

    fn on_library_key(&mut self, key: KeyEvent) {
        let Some(name) = self.library.get(self.library_selected).cloned() else {
            return;
        };

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.library_selected = self.library_selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.library_selected + 1 < self.library.len() {
                    self.library_selected += 1;
                }
            }
            KeyCode::Enter => {
                if self.load_stored(&name) {
                    self.focus = Focus::Timers;
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => self.remove_stored(&name),
            _ => {}
        }
    }

    fn on_overlay_key(&mut self, key: KeyEvent) {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('c')
        ) {
            self.close_overlay();
            return;
        }

        let Some(player) = self.player.as_mut() else {
            return;
        };
        let controls = Overlay::controls(&player.info());

        match key.code {
            KeyCode::Char(' ') if controls.toggle => {
                if player.is_running() {
                    player.pause();
                } else {
                    player.start();
                }
            }
            KeyCode::Right | KeyCode::Char('l') if controls.next => player.skip(true),
            KeyCode::Left | KeyCode::Char('h') if controls.prev => player.skip(false),
            KeyCode::Char('+') | KeyCode::Char('a') if controls.add => player.extend_execution(),
            _ => return,
        }
        self.sync_overlay();
    }

    fn begin_input(&mut self, field: EditField) {
        let buffer = match field {
            EditField::Label => self.composer.selected_timer().label.clone(),
            EditField::Duration => self.composer.selected_timer().duration.to_string(),
            EditField::Title => self.composer.title.clone(),
        };
        self.input = Some(TextInput { field, buffer });
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        let Some(input) = self.input.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Esc => self.input = None,
            KeyCode::Backspace => {
                input.buffer.pop();
            }
            KeyCode::Char(c) => input.buffer.push(c),
            KeyCode::Enter => {
                if let Some(TextInput { field, buffer }) = self.input.take() {
                    self.commit_input(field, &buffer);
                }
            }
            _ => {}
        }
    }

    fn commit_input(&mut self, field: EditField, buffer: &str) {
        match field {
            EditField::Label => self.composer.set_label(buffer),
            EditField::Title => self.composer.title = buffer.trim().to_string(),
            EditField::Duration => match parse_duration(buffer) {
                Some(secs) => {
                    let current = self.composer.selected_timer().duration as i64;
                    self.composer.adjust_duration(secs as i64 - current);
                }
                None => self.notice = Some(format!("Not a duration: '{buffer}'")),
            },
        }
    }
}
