use chrono::{DateTime, Local};

use crate::sequence::TimerDirection;
use crate::time_format::secs_to_hms_short;

const CLOCK_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Timer { label: String, progress: String },
    DeadTime,
}

/// One line of the activity log: a stretch of time spent on a timer, or idle between timers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub kind: EntryKind,
    pub from: DateTime<Local>,
    pub to: DateTime<Local>,
}

impl HistoryEntry {
    pub fn title(&self) -> &str {
        match &self.kind {
            EntryKind::Timer { label, .. } => label,
            EntryKind::DeadTime => "Dead time",
        }
    }

    pub fn duration_secs(&self) -> u64 {
        (self.to - self.from).num_seconds().max(0) as u64
    }

    /// `10:00:00 - 10:05:00 (5m)`
    pub fn time_range(&self) -> String {
        format!(
            "{} - {} ({})",
            self.from.format(CLOCK_FORMAT),
            self.to.format(CLOCK_FORMAT),
            secs_to_hms_short(self.duration_secs())
        )
    }

    pub fn is_dead_time(&self) -> bool {
        self.kind == EntryKind::DeadTime
    }
}

/// `"42s"` for a count-up timer, `"1m of 5m"` for a count-down timer
pub fn progress_label(direction: TimerDirection, value: u64, total: u64) -> String {
    match direction {
        TimerDirection::CountUp => secs_to_hms_short(value),
        TimerDirection::CountDown => format!(
            "{} of {}",
            secs_to_hms_short(total.saturating_sub(value)),
            secs_to_hms_short(total)
        ),
    }
}

/// Checkin/checkout bookkeeping for a playback session
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    checkin: Option<DateTime<Local>>,
    last_checkout: Option<DateTime<Local>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// A timer became active
    pub fn checkin(&mut self, at: DateTime<Local>) {
        self.checkin = Some(at);

        if let Some(out) = self.last_checkout {
            if out != at {
                self.add_dead_time(out, at);
            }
        }
    }

    /// A timer stopped being active. Returns the entry that was logged.
    pub fn checkout(
        &mut self,
        label: &str,
        progress: String,
        at: DateTime<Local>,
    ) -> &HistoryEntry {
        let from = match self.checkin.take() {
            Some(checkin) => checkin,
            None => {
                // no open checkin: the gap since the last checkout was idle
                if let Some(out) = self.last_checkout {
                    if out != at {
                        self.add_dead_time(out, at);
                    }
                }
                at
            }
        };
        self.last_checkout = Some(at);

        self.entries.push(HistoryEntry {
            kind: EntryKind::Timer {
                label: label.to_string(),
                progress,
            },
            from,
            to: at,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.checkin = None;
        self.last_checkout = None;
    }

    fn add_dead_time(&mut self, from: DateTime<Local>, to: DateTime<Local>) {
        if self.entries.is_empty() {
            return;
        }
        if (to - from).num_seconds() < 1 {
            return;
        }
        self.entries.push(HistoryEntry {
            kind: EntryKind::DeadTime,
            from,
            to,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_progress_label() {
        assert_eq!(progress_label(TimerDirection::CountUp, 42, 0), "42s");
        assert_eq!(
            progress_label(TimerDirection::CountDown, 240, 300),
            "1m of 5m"
        );
        assert_eq!(progress_label(TimerDirection::CountDown, 300, 300), "0s of 5m");
    }

    #[test]
    fn test_checkin_checkout_logs_timer_entry() {
        let mut history = History::new();
        history.checkin(at(0));
        let entry = history.checkout("Focus", "5m of 5m".into(), at(300)).clone();

        assert_eq!(entry.title(), "Focus");
        assert_eq!(entry.duration_secs(), 300);
        assert_eq!(entry.time_range(), "10:00:00 - 10:05:00 (5m)");
        assert_eq!(history.entries().len(), 1);
    }

    #[test]
    fn test_gap_between_timers_is_dead_time() {
        let mut history = History::new();
        history.checkin(at(0));
        history.checkout("Focus", "1m".into(), at(60));
        history.checkin(at(90));
        history.checkout("Break", "10s".into(), at(100));

        let entries = history.entries();
        assert_eq!(entries.len(), 3);
        assert!(entries[1].is_dead_time());
        assert_eq!(entries[1].duration_secs(), 30);
        assert_eq!(entries[2].from, at(90));
    }

    #[test]
    fn test_back_to_back_timers_have_no_dead_time() {
        let mut history = History::new();
        history.checkin(at(0));
        history.checkout("A", "1m".into(), at(60));
        history.checkin(at(60));
        history.checkout("B", "1m".into(), at(120));

        assert!(history.entries().iter().all(|e| !e.is_dead_time()));
    }

    #[test]
    fn test_checkout_without_checkin() {
        let mut history = History::new();
        history.checkin(at(0));
        history.checkout("A", "5s".into(), at(5));
        history.checkout("A", "5s".into(), at(20));

        let entries = history.entries();
        assert_eq!(entries.len(), 3);
        assert!(entries[1].is_dead_time());
        assert_eq!(entries[2].duration_secs(), 0);
    }

    #[test]
    fn test_sub_second_gap_is_not_dead_time() {
        let mut history = History::new();
        history.checkin(at(0));
        history.checkout("A", "1m".into(), at(60));
        history.checkin(at(60) + Duration::milliseconds(300));

        assert_eq!(history.entries().len(), 1);
    }

    #[test]
    fn test_first_checkin_never_logs_dead_time() {
        let mut history = History::new();
        history.checkin(at(0));
        assert!(history.entries().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut history = History::new();
        history.checkin(at(0));
        history.checkout("A", "5s".into(), at(5));
        history.clear();
        history.checkin(at(100));

        assert!(history.entries().is_empty());
    }
}
