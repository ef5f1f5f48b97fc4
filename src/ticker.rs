use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Period of a sequence timer tick
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Periodic tick source a player arms while one of its timers runs.
///
/// The source never calls back into the player. The host polls the player, and the player
/// drains due ticks through [`TickSource::take_due`] one at a time.
pub trait TickSource {
    /// Start firing every `period`. Re-arming restarts the period from now.
    fn arm(&mut self, period: Duration);
    /// Stop firing and drop any tick that was due but not yet taken.
    fn disarm(&mut self);
    fn is_armed(&self) -> bool;
    /// Consume one due tick. Returns false when nothing is due or the source is disarmed.
    fn take_due(&mut self) -> bool;
}

/// Wall clock tick source backed by [`Instant`]
#[derive(Clone, Copy, Debug)]
pub struct IntervalTicker {
    period: Duration,
    next_due: Option<Instant>,
}

impl IntervalTicker {
    pub fn new() -> Self {
        Self {
            period: TICK_PERIOD,
            next_due: None,
        }
    }

    /// Time left until the next tick, if armed
    pub fn until_due(&self) -> Option<Duration> {
        self.next_due
            .map(|due| due.saturating_duration_since(Instant::now()))
    }
}

impl Default for IntervalTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for IntervalTicker {
    fn arm(&mut self, period: Duration) {
        self.period = period;
        self.next_due = Some(Instant::now() + period);
    }

    fn disarm(&mut self) {
        self.next_due = None;
    }

    fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    fn take_due(&mut self) -> bool {
        match self.next_due {
            Some(due) if Instant::now() >= due => {
                self.next_due = Some(due + self.period);
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
struct ManualState {
    armed: bool,
    pending: u32,
    arm_count: u32,
}

/// Tick source driven by hand, for deterministic tests and headless hosts.
///
/// Keep a [`ManualTickHandle`] before moving the ticker into a player, then call
/// [`ManualTickHandle::fire`] to simulate one elapsed period.
#[derive(Debug, Default)]
pub struct ManualTicker {
    state: Rc<RefCell<ManualState>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> ManualTickHandle {
        ManualTickHandle {
            state: Rc::clone(&self.state),
        }
    }
}

impl TickSource for ManualTicker {
    fn arm(&mut self, _period: Duration) {
        let mut state = self.state.borrow_mut();
        state.armed = true;
        state.pending = 0;
        state.arm_count += 1;
    }

    fn disarm(&mut self) {
        let mut state = self.state.borrow_mut();
        state.armed = false;
        state.pending = 0;
    }

    fn is_armed(&self) -> bool {
        self.state.borrow().armed
    }

    fn take_due(&mut self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.armed && state.pending > 0 {
            state.pending -= 1;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManualTickHandle {
    state: Rc<RefCell<ManualState>>,
}

impl ManualTickHandle {
    /// Queue one tick. Ignored while the ticker is disarmed.
    pub fn fire(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.armed {
            state.pending += 1;
        }
        state.armed
    }

    pub fn is_armed(&self) -> bool {
        self.state.borrow().armed
    }

    /// How many times the ticker has been armed
    pub fn arm_count(&self) -> u32 {
        self.state.borrow().arm_count
    }
}
