//! Sequence playback engine.
//!
//! A [`SequencePlayer`] owns a timeline of [`TimeSlot`]s, one row per execution of the
//! sequence and one slot per timer, plus a cursor onto the active slot. Only the active
//! slot ever ticks. Finishing a timer advances the cursor and restarts automatically until
//! the last timer of the last execution, at which point the player is finished and stays
//! that way until [`SequencePlayer::restore_sequence`].
//!
//! ```text
//! idle -> running <-> paused
//!            |
//!            +-> timer finished -> running (next slot) | finished
//! ```

use chrono::{DateTime, Local};
use log::debug;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::sequence::{DefinitionError, SequenceDefinition, TimerDirection, TimerSpec};
use crate::ticker::{IntervalTicker, TickSource, TICK_PERIOD};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<DefinitionError> for PlayerError {
    fn from(err: DefinitionError) -> Self {
        PlayerError::InvalidArgument(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "camelCase")]
pub enum PlayerEvent {
    TimerTick,
    TimerStart,
    TimerPause,
    TimerFinished,
    SequenceFinished,
    ExtendExecution,
}

impl PlayerEvent {
    pub const ALL: [PlayerEvent; 6] = [
        PlayerEvent::TimerTick,
        PlayerEvent::TimerStart,
        PlayerEvent::TimerPause,
        PlayerEvent::TimerFinished,
        PlayerEvent::SequenceFinished,
        PlayerEvent::ExtendExecution,
    ];
}

/// Progress of one timer within one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    /// Configured duration
    pub total: u64,
    /// Remaining seconds for count-down, elapsed seconds for count-up
    pub value: u64,
}

impl TimeSlot {
    fn fresh(spec: &TimerSpec) -> Self {
        let value = match spec.direction {
            TimerDirection::CountDown => spec.duration,
            TimerDirection::CountUp => 0,
        };
        Self {
            total: spec.duration,
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub execution: usize,
    pub timer: usize,
}

/// Point-in-time snapshot of a player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub running: bool,
    pub finished: bool,
    /// Wall clock time of the first start since construction or restore
    pub start_time: Option<DateTime<Local>>,
    /// 1-based
    pub execution_value: usize,
    pub execution_total: usize,
    /// 0-based
    pub timer_index_value: usize,
    pub timer_index_total: usize,
    pub timer_label: String,
    pub timer_type: TimerDirection,
    pub timer_value: u64,
    pub timer_total: u64,
    /// Seconds ticked across the whole session
    pub consumed: u64,
}

/// A player command. Listeners issue these through [`EventContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Skip { forward: bool },
    ExtendExecution,
    RestoreSequence,
}

/// What a listener sees while an event is being dispatched.
///
/// Commands queued here run right after every listener of the current event has returned,
/// before the player handles anything else.
pub struct EventContext<'a> {
    event: PlayerEvent,
    info: &'a PlayerInfo,
    commands: &'a mut Vec<Command>,
}

impl EventContext<'_> {
    pub fn event(&self) -> PlayerEvent {
        self.event
    }

    pub fn info(&self) -> &PlayerInfo {
        self.info
    }

    pub fn send(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn start(&mut self) {
        self.send(Command::Start);
    }

    pub fn pause(&mut self) {
        self.send(Command::Pause);
    }

    pub fn skip(&mut self, forward: bool) {
        self.send(Command::Skip { forward });
    }

    pub fn extend_execution(&mut self) {
        self.send(Command::ExtendExecution);
    }

    pub fn restore_sequence(&mut self) {
        self.send(Command::RestoreSequence);
    }
}

pub type Listener = Box<dyn FnMut(&mut EventContext<'_>)>;

pub struct SequencePlayer<T: TickSource = IntervalTicker> {
    timers: Vec<TimerSpec>,
    /// Execution count of the definition, before any extension
    base_executions: usize,
    timeline: Vec<Vec<TimeSlot>>,
    cursor: Cursor,
    running: bool,
    finished: bool,
    first_run: bool,
    start_time: Option<DateTime<Local>>,
    consumed: u64,
    ticker: T,
    listeners: HashMap<PlayerEvent, Vec<Listener>>,
}

impl SequencePlayer<IntervalTicker> {
    pub fn new(definition: SequenceDefinition) -> Result<Self, PlayerError> {
        Self::with_ticker(definition, IntervalTicker::new())
    }

    /// Build from a definition that may not exist, e.g. a store lookup by name
    pub fn from_optional(definition: Option<SequenceDefinition>) -> Result<Self, PlayerError> {
        let definition = definition.ok_or_else(|| {
            PlayerError::InvalidArgument("sequence definition is missing".to_string())
        })?;
        Self::new(definition)
    }
}

impl<T: TickSource> SequencePlayer<T> {
    pub fn with_ticker(definition: SequenceDefinition, ticker: T) -> Result<Self, PlayerError> {
        definition.validate()?;

        let SequenceDefinition { timers, executions } = definition;
        let timeline = build_timeline(&timers, executions);

        Ok(Self {
            timers,
            base_executions: executions,
            timeline,
            cursor: Cursor::default(),
            running: false,
            finished: false,
            first_run: true,
            start_time: None,
            consumed: 0,
            ticker,
            listeners: HashMap::new(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn timers(&self) -> &[TimerSpec] {
        &self.timers
    }

    pub fn timeline(&self) -> &[Vec<TimeSlot>] {
        &self.timeline
    }

    pub fn ticker(&self) -> &T {
        &self.ticker
    }

    pub fn info(&self) -> PlayerInfo {
        let spec = &self.timers[self.cursor.timer];
        let slot = self.timeline[self.cursor.execution][self.cursor.timer];

        PlayerInfo {
            running: self.running,
            finished: self.finished,
            start_time: self.start_time,
            execution_value: self.cursor.execution + 1,
            execution_total: self.timeline.len(),
            timer_index_value: self.cursor.timer,
            timer_index_total: self.timers.len(),
            timer_label: spec.label.clone(),
            timer_type: spec.direction,
            timer_value: slot.value,
            timer_total: slot.total,
            consumed: self.consumed,
        }
    }

    /// Register a callback for `event`. Callbacks run in registration order.
    pub fn on<F>(&mut self, event: PlayerEvent, callback: F)
    where
        F: FnMut(&mut EventContext<'_>) + 'static,
    {
        self.listeners
            .entry(event)
            .or_default()
            .push(Box::new(callback));
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Pause => self.pause(),
            Command::Skip { forward } => self.skip(forward),
            Command::ExtendExecution => self.extend_execution(),
            Command::RestoreSequence => self.restore_sequence(),
        }
    }

    pub fn start(&mut self) {
        if self.running || self.finished {
            return;
        }

        self.running = true;
        self.ticker.arm(TICK_PERIOD);

        if self.first_run {
            self.first_run = false;
            self.start_time = Some(Local::now());
        }

        self.emit(PlayerEvent::TimerStart);
    }

    pub fn pause(&mut self) {
        if !self.running || self.finished {
            return;
        }

        self.running = false;
        self.ticker.disarm();

        self.emit(PlayerEvent::TimerPause);
    }

    /// Forward finishes the active timer now. Backward steps to the previous timer, or to
    /// the last timer of the previous execution, keeping whatever progress that slot had.
    pub fn skip(&mut self, forward: bool) {
        if self.finished {
            return;
        }

        if forward {
            self.finish_timer();
        } else if self.cursor.timer > 0 {
            self.pause();
            self.cursor.timer -= 1;
            self.start();
        } else if self.cursor.execution > 0 {
            self.pause();
            self.cursor.execution -= 1;
            self.cursor.timer = self.timers.len() - 1;
            self.start();
        }
    }

    /// Append one more execution. A finished player stays finished.
    pub fn extend_execution(&mut self) {
        self.timeline.push(fresh_row(&self.timers));
        self.emit(PlayerEvent::ExtendExecution);
    }

    /// Back to the state right after construction. Extensions are discarded.
    pub fn restore_sequence(&mut self) {
        self.ticker.disarm();

        self.running = false;
        self.finished = false;
        self.first_run = true;
        self.start_time = None;
        self.consumed = 0;
        self.cursor = Cursor::default();
        self.timeline = build_timeline(&self.timers, self.base_executions);

        debug!("sequence restored");
    }

    /// Advance the active slot by one period. Ignored unless running.
    pub fn tick(&mut self) {
        if !self.running || self.finished {
            return;
        }

        let Cursor { execution, timer } = self.cursor;
        let direction = self.timers[timer].direction;
        let slot = &mut self.timeline[execution][timer];
        match direction {
            TimerDirection::CountDown => slot.value = slot.value.saturating_sub(1),
            TimerDirection::CountUp => slot.value += 1,
        }
        let value = slot.value;
        self.consumed += 1;

        self.emit(PlayerEvent::TimerTick);

        if direction == TimerDirection::CountDown && value == 0 && !self.finished {
            self.finish_timer();
        }
    }

    /// Deliver every tick the source reports as due
    pub fn poll(&mut self) {
        while self.running && self.ticker.take_due() {
            self.tick();
        }
    }

    fn finish_timer(&mut self) {
        self.ticker.disarm();
        self.running = false;
        self.emit(PlayerEvent::TimerFinished);

        if self.cursor.timer + 1 < self.timers.len() {
            self.cursor.timer += 1;
            self.start();
        } else if self.cursor.execution + 1 < self.timeline.len() {
            self.cursor.execution += 1;
            self.cursor.timer = 0;
            self.start();
        } else {
            // marked before dispatch so listeners observe the final state
            self.finished = true;
            self.emit(PlayerEvent::SequenceFinished);
        }
    }

    fn emit(&mut self, event: PlayerEvent) {
        debug!(
            "{event}: execution {}/{} timer {}/{}",
            self.cursor.execution + 1,
            self.timeline.len(),
            self.cursor.timer + 1,
            self.timers.len()
        );

        if !self.listeners.contains_key(&event) {
            return;
        }

        let info = self.info();
        let mut commands = Vec::new();
        if let Some(listeners) = self.listeners.get_mut(&event) {
            for listener in listeners.iter_mut() {
                let mut ctx = EventContext {
                    event,
                    info: &info,
                    commands: &mut commands,
                };
                listener(&mut ctx);
            }
        }

        for command in commands {
            self.apply(command);
        }
    }
}

impl<T: TickSource> fmt::Debug for SequencePlayer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequencePlayer")
            .field("timers", &self.timers)
            .field("cursor", &self.cursor)
            .field("running", &self.running)
            .field("finished", &self.finished)
            .field("executions", &self.timeline.len())
            .finish_non_exhaustive()
    }
}

fn fresh_row(timers: &[TimerSpec]) -> Vec<TimeSlot> {
    timers.iter().map(TimeSlot::fresh).collect()
}

fn build_timeline(timers: &[TimerSpec], executions: usize) -> Vec<Vec<TimeSlot>> {
    (0..executions).map(|_| fresh_row(timers)).collect()
}
