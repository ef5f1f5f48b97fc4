//! Host loop plumbing. Terminal input is read on a background thread and handed to a
//! [`Runner`], which wakes up for input, for the next player tick, or for a periodic redraw,
//! whichever comes first.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};
use log::debug;

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// The wait ended without input: poll the player and redraw
    Tick,
}

/// Where the runner gets input from
pub trait AppEventSource {
    /// Wait up to `timeout`. `None` when nothing arrived or the source is gone.
    fn next_event(&self, timeout: Duration) -> Option<AppEvent>;
}

fn wait_on(rx: &Receiver<AppEvent>, timeout: Duration) -> Option<AppEvent> {
    match rx.recv_timeout(timeout) {
        Ok(event) => Some(event),
        Err(RecvTimeoutError::Timeout) => None,
        Err(RecvTimeoutError::Disconnected) => {
            // keep the loop paced once input is gone
            thread::sleep(timeout);
            None
        }
    }
}

/// Terminal input read by crossterm on a dedicated thread
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || forward_terminal_events(tx));
        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

fn forward_terminal_events(tx: Sender<AppEvent>) {
    loop {
        let event = match event::read() {
            // release events would double every keystroke on some platforms
            Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => AppEvent::Key(key),
            Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
            Ok(_) => continue,
            Err(e) => {
                debug!("terminal input closed: {e}");
                return;
            }
        };
        if tx.send(event).is_err() {
            return;
        }
    }
}

impl AppEventSource for CrosstermEventSource {
    fn next_event(&self, timeout: Duration) -> Option<AppEvent> {
        wait_on(&self.rx, timeout)
    }
}

/// Scripted input for headless tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl AppEventSource for TestEventSource {
    fn next_event(&self, timeout: Duration) -> Option<AppEvent> {
        wait_on(&self.rx, timeout)
    }
}

pub struct Runner<E: AppEventSource> {
    source: E,
    redraw_every: Duration,
}

impl<E: AppEventSource> Runner<E> {
    pub fn new(source: E, redraw_every: Duration) -> Self {
        Self {
            source,
            redraw_every,
        }
    }

    /// Block until input arrives, the player's next tick is due, or the redraw interval
    /// passes. Anything but input comes back as [`AppEvent::Tick`].
    pub fn step(&self, next_tick: Option<Duration>) -> AppEvent {
        let timeout = match next_tick {
            Some(due) => due.min(self.redraw_every),
            None => self.redraw_every,
        };
        self.source.next_event(timeout).unwrap_or(AppEvent::Tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(1));

        assert!(matches!(runner.step(None), AppEvent::Tick));
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(10));

        assert!(matches!(runner.step(None), AppEvent::Resize));
    }

    #[test]
    fn step_wakes_early_for_a_due_tick() {
        let (_tx, rx) = mpsc::channel::<AppEvent>();
        let runner = Runner::new(TestEventSource::new(rx), Duration::from_secs(30));

        let started = Instant::now();
        assert!(matches!(
            runner.step(Some(Duration::from_millis(5))),
            AppEvent::Tick
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn step_ticks_after_sender_hangs_up() {
        let (tx, rx) = mpsc::channel::<AppEvent>();
        drop(tx);
        let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(1));

        assert!(matches!(runner.step(None), AppEvent::Tick));
    }
}
