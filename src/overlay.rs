//! Playback overlay state: turns player events into a history log, notifications and the
//! text shown on the playback screen.

use chrono::{DateTime, Local};
use std::cell::RefCell;
use std::rc::Rc;

use crate::history::{progress_label, History, HistoryEntry};
use crate::player::{PlayerEvent, PlayerInfo, SequencePlayer};
use crate::sequence::TimerDirection;
use crate::ticker::TickSource;
use crate::time_format::{secs_to_hms, secs_to_hms_short};

#[derive(Debug, Clone)]
struct FeedItem {
    event: PlayerEvent,
    info: PlayerInfo,
    at: DateTime<Local>,
}

/// Which playback controls are usable right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub prev: bool,
    pub next: bool,
    pub toggle: bool,
    pub add: bool,
}

#[derive(Debug)]
pub struct Overlay {
    title: String,
    feed: Rc<RefCell<Vec<FeedItem>>>,
    history: History,
    notification: Option<String>,
    bell_enabled: bool,
    bell_pending: bool,
}

impl Overlay {
    pub fn new(title: &str, bell_enabled: bool) -> Self {
        Self {
            title: title.to_string(),
            feed: Rc::new(RefCell::new(Vec::new())),
            history: History::new(),
            notification: None,
            bell_enabled,
            bell_pending: false,
        }
    }

    /// Subscribe to every event of `player`
    pub fn attach<T: TickSource>(&self, player: &mut SequencePlayer<T>) {
        for event in PlayerEvent::ALL {
            let feed = Rc::clone(&self.feed);
            player.on(event, move |ctx| {
                feed.borrow_mut().push(FeedItem {
                    event: ctx.event(),
                    info: ctx.info().clone(),
                    at: Local::now(),
                });
            });
        }
    }

    /// Reset for a fresh playback session
    pub fn open(&mut self, title: &str) {
        self.title = title.to_string();
        self.feed.borrow_mut().clear();
        self.history.clear();
        self.notification = None;
        self.bell_pending = false;
    }

    /// Process queued player events. Returns the history entries logged by this call.
    pub fn sync(&mut self) -> Vec<HistoryEntry> {
        let items: Vec<FeedItem> = self.feed.borrow_mut().drain(..).collect();
        let logged_before = self.history.entries().len();

        for FeedItem { event, info, at } in items {
            match event {
                PlayerEvent::TimerStart => {
                    self.history.checkin(at);
                    self.notification = Some(format!("{} Started.", info.timer_label));
                }
                PlayerEvent::TimerPause => {
                    self.checkout(&info, at);
                }
                PlayerEvent::TimerFinished => {
                    self.checkout(&info, at);
                    self.bell_pending |= self.bell_enabled;
                }
                PlayerEvent::SequenceFinished => {
                    self.notification = Some("Sequence finished.".to_string());
                }
                PlayerEvent::TimerTick | PlayerEvent::ExtendExecution => {}
            }
        }

        self.history.entries()[logged_before..].to_vec()
    }

    fn checkout(&mut self, info: &PlayerInfo, at: DateTime<Local>) {
        let progress = progress_label(info.timer_type, info.timer_value, info.timer_total);
        self.history.checkout(&info.timer_label, progress, at);
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn notification(&self) -> Option<&str> {
        self.notification.as_deref()
    }

    /// True once per finished timer when the bell is enabled
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell_pending)
    }

    /// `Focus [00:24:59]` while playing, `pomodoro - Finished` at the end
    pub fn header(&self, info: &PlayerInfo) -> String {
        if info.finished {
            format!("{} - Finished", self.display_title())
        } else {
            format!("{} [{}]", info.timer_label, secs_to_hms(info.timer_value))
        }
    }

    pub fn sequence_state(info: &PlayerInfo) -> String {
        format!(
            "sequence: {}/{}  timer: {}/{}",
            info.execution_value,
            info.execution_total,
            info.timer_index_value + 1,
            info.timer_index_total
        )
    }

    pub fn consumed_line(info: &PlayerInfo) -> String {
        match info.finished {
            true => format!("Total Time: {}", secs_to_hms_short(info.consumed)),
            false => format!("Time Consumed: {}", secs_to_hms_short(info.consumed)),
        }
    }

    /// Fraction of the active count-down already spent; count-up timers have none
    pub fn timer_ratio(info: &PlayerInfo) -> Option<f64> {
        match info.timer_type {
            TimerDirection::CountDown if info.timer_total > 0 => {
                let spent = info.timer_total.saturating_sub(info.timer_value);
                Some(spent as f64 / info.timer_total as f64)
            }
            _ => None,
        }
    }

    pub fn controls(info: &PlayerInfo) -> Controls {
        let at_start = info.execution_value == 1 && info.timer_index_value == 0;
        Controls {
            prev: !info.finished && !at_start,
            next: !info.finished,
            toggle: !info.finished,
            add: !info.finished,
        }
    }

    fn display_title(&self) -> &str {
        match self.title.is_empty() {
            true => "Sequence",
            false => &self.title,
        }
    }
}
