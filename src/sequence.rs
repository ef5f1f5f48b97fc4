use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::time_format::parse_duration;

/// Upper bound on how many times a sequence repeats
pub const MAX_EXECUTIONS: usize = 99;

/// Whether a timer counts down to zero or up without bound
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum TimerDirection {
    #[serde(rename = "Count-Up")]
    #[strum(serialize = "Count-Up")]
    CountUp,
    #[serde(rename = "Count-Down")]
    #[strum(serialize = "Count-Down")]
    CountDown,
}

impl TimerDirection {
    pub fn toggled(self) -> Self {
        match self {
            TimerDirection::CountUp => TimerDirection::CountDown,
            TimerDirection::CountDown => TimerDirection::CountUp,
        }
    }
}

/// One timer of a sequence as the user configured it.
///
/// `duration` is the countdown target for [`TimerDirection::CountDown`]; for count-up timers
/// it is kept for display and estimates only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSpec {
    pub label: String,
    #[serde(rename = "type")]
    pub direction: TimerDirection,
    #[serde(rename = "time")]
    pub duration: u64,
}

impl TimerSpec {
    pub fn new(label: impl Into<String>, direction: TimerDirection, duration: u64) -> Self {
        Self {
            label: label.into(),
            direction,
            duration,
        }
    }

    pub fn count_down(label: impl Into<String>, duration: u64) -> Self {
        Self::new(label, TimerDirection::CountDown, duration)
    }

    pub fn count_up(label: impl Into<String>) -> Self {
        Self::new(label, TimerDirection::CountUp, 0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("a sequence needs at least one timer")]
    NoTimers,
    #[error("a sequence must execute at least once")]
    NoExecutions,
    #[error("a sequence can execute at most {MAX_EXECUTIONS} times, got {0}")]
    TooManyExecutions(usize),
    #[error("invalid timer '{0}': expected LABEL:up|down:DURATION")]
    MalformedTimer(String),
}

/// `LABEL:up|down:DURATION`, e.g. `Work:down:25m` or `Stretch:up:0`.
/// The label may itself contain colons.
impl FromStr for TimerSpec {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DefinitionError::MalformedTimer(s.to_string());

        let mut parts = s.rsplitn(3, ':');
        let duration = parts.next().and_then(parse_duration).ok_or_else(malformed)?;
        let direction = match parts.next().map(|d| d.trim().to_ascii_lowercase()) {
            Some(d) if d == "up" || d == "count-up" => TimerDirection::CountUp,
            Some(d) if d == "down" || d == "count-down" => TimerDirection::CountDown,
            _ => return Err(malformed()),
        };
        let label = parts.next().map(str::trim).ok_or_else(malformed)?;
        if label.is_empty() {
            return Err(malformed());
        }

        Ok(TimerSpec::new(label, direction, duration))
    }
}

/// Ordered timers plus the number of times the whole list repeats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceDefinition {
    pub timers: Vec<TimerSpec>,
    pub executions: usize,
}

impl SequenceDefinition {
    pub fn new(timers: Vec<TimerSpec>, executions: usize) -> Self {
        Self { timers, executions }
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.timers.is_empty() {
            return Err(DefinitionError::NoTimers);
        }
        if self.executions < 1 {
            return Err(DefinitionError::NoExecutions);
        }
        if self.executions > MAX_EXECUTIONS {
            return Err(DefinitionError::TooManyExecutions(self.executions));
        }
        Ok(())
    }

    /// Sum of all timer durations times the execution count. Informational only.
    pub fn estimated_secs(&self) -> u64 {
        estimate_secs(&self.timers, self.executions)
    }
}

pub(crate) fn estimate_secs(timers: &[TimerSpec], executions: usize) -> u64 {
    let per_execution: u64 = timers.iter().map(|t| t.duration).sum();
    per_execution.saturating_mul(executions as u64)
}
