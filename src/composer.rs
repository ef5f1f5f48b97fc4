use crate::sequence::{
    estimate_secs, DefinitionError, SequenceDefinition, TimerDirection, TimerSpec, MAX_EXECUTIONS,
};

/// Largest duration the editor accepts: 99:59:59
pub const MAX_DURATION_SECS: u64 = 99 * 3600 + 59 * 60 + 59;

/// Editing model behind the composer screen.
///
/// Always holds at least one timer and at least one execution, so
/// [`Composer::definition`] only fails if those invariants are broken from outside.
#[derive(Debug, Clone)]
pub struct Composer {
    pub title: String,
    timers: Vec<TimerSpec>,
    executions: usize,
    selected: usize,
    next_number: usize,
    default_timer_secs: u64,
}

impl Composer {
    pub fn new(default_timer_secs: u64) -> Self {
        let mut composer = Self {
            title: String::new(),
            timers: Vec::new(),
            executions: 1,
            selected: 0,
            next_number: 1,
            default_timer_secs,
        };
        let first = composer.fresh_timer();
        composer.timers.push(first);
        composer
    }

    /// Replace the whole sequence with a stored one. An invalid definition leaves the
    /// composer untouched.
    pub fn load(
        &mut self,
        title: &str,
        definition: SequenceDefinition,
    ) -> Result<(), DefinitionError> {
        definition.validate()?;
        let SequenceDefinition { timers, executions } = definition;
        self.title = title.to_string();
        self.timers = timers;
        self.executions = executions;
        self.selected = 0;
        Ok(())
    }

    pub fn timers(&self) -> &[TimerSpec] {
        &self.timers
    }

    pub fn executions(&self) -> usize {
        self.executions
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_timer(&self) -> &TimerSpec {
        &self.timers[self.selected]
    }

    pub fn estimated_secs(&self) -> u64 {
        estimate_secs(&self.timers, self.executions)
    }

    /// Snapshot for a player or the store
    pub fn definition(&self) -> Result<SequenceDefinition, DefinitionError> {
        let definition = SequenceDefinition::new(self.timers.clone(), self.executions);
        definition.validate()?;
        Ok(definition)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.timers.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Insert a default timer after the selection and select it
    pub fn add_timer(&mut self) {
        let timer = self.fresh_timer();
        self.selected += 1;
        self.timers.insert(self.selected, timer);
    }

    /// Remove the selected timer, unless it is the only one
    pub fn remove_selected(&mut self) -> bool {
        if self.timers.len() <= 1 {
            return false;
        }
        self.timers.remove(self.selected);
        if self.selected >= self.timers.len() {
            self.selected = self.timers.len() - 1;
        }
        true
    }

    pub fn move_selected(&mut self, up: bool) {
        let target = match up {
            true if self.selected > 0 => self.selected - 1,
            false if self.selected + 1 < self.timers.len() => self.selected + 1,
            _ => return,
        };
        self.timers.swap(self.selected, target);
        self.selected = target;
    }

    pub fn set_label(&mut self, label: &str) {
        let label = label.trim();
        if !label.is_empty() {
            self.timers[self.selected].label = label.to_string();
        }
    }

    pub fn toggle_direction(&mut self) {
        let timer = &mut self.timers[self.selected];
        timer.direction = timer.direction.toggled();
    }

    pub fn adjust_duration(&mut self, delta: i64) {
        let timer = &mut self.timers[self.selected];
        timer.duration = timer
            .duration
            .saturating_add_signed(delta)
            .min(MAX_DURATION_SECS);
    }

    pub fn adjust_executions(&mut self, delta: i64) {
        self.executions = self
            .executions
            .saturating_add_signed(delta as isize)
            .clamp(1, MAX_EXECUTIONS);
    }

    fn fresh_timer(&mut self) -> TimerSpec {
        let label = format!("Timer #{}", self.next_number);
        self.next_number += 1;
        TimerSpec::new(label, TimerDirection::CountDown, self.default_timer_secs)
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_composer_has_one_timer() {
        let composer = Composer::new(5);
        assert_eq!(composer.timers().len(), 1);
        assert_eq!(composer.timers()[0], TimerSpec::count_down("Timer #1", 5));
        assert_eq!(composer.executions(), 1);
        assert!(composer.definition().is_ok());
    }

    #[test]
    fn test_add_timer_inserts_after_selection() {
        let mut composer = Composer::new(5);
        composer.add_timer();
        composer.select_prev();
        composer.add_timer();

        let labels: Vec<&str> = composer.timers().iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Timer #1", "Timer #3", "Timer #2"]);
        assert_eq!(composer.selected(), 1);
    }

    #[test]
    fn test_remove_keeps_at_least_one_timer() {
        let mut composer = Composer::new(5);
        assert!(!composer.remove_selected());

        composer.add_timer();
        assert!(composer.remove_selected());
        assert_eq!(composer.timers().len(), 1);
        assert_eq!(composer.selected(), 0);
    }

    #[test]
    fn test_move_selected() {
        let mut composer = Composer::new(5);
        composer.add_timer();
        composer.move_selected(true);

        assert_eq!(composer.timers()[0].label, "Timer #2");
        assert_eq!(composer.selected(), 0);

        composer.move_selected(true);
        assert_eq!(composer.selected(), 0);
    }

    #[test]
    fn test_adjust_duration_clamps() {
        let mut composer = Composer::new(5);
        composer.adjust_duration(-60);
        assert_eq!(composer.selected_timer().duration, 0);

        composer.adjust_duration(i64::MAX);
        assert_eq!(composer.selected_timer().duration, MAX_DURATION_SECS);
    }

    #[test]
    fn test_adjust_executions_never_below_one() {
        let mut composer = Composer::new(5);
        composer.adjust_executions(3);
        assert_eq!(composer.executions(), 4);
        composer.adjust_executions(-10);
        assert_eq!(composer.executions(), 1);

        composer.adjust_executions(isize::MAX as i64);
        assert_eq!(composer.executions(), MAX_EXECUTIONS);
    }

    #[test]
    fn test_estimated_secs() {
        let mut composer = Composer::new(60);
        composer.add_timer();
        composer.adjust_executions(2);
        assert_eq!(composer.estimated_secs(), 360);
    }

    #[test]
    fn test_label_and_direction_edits() {
        let mut composer = Composer::new(5);
        composer.set_label("  Warm up ");
        composer.toggle_direction();

        assert_eq!(composer.selected_timer().label, "Warm up");
        assert_eq!(composer.selected_timer().direction, TimerDirection::CountUp);

        composer.set_label("   ");
        assert_eq!(composer.selected_timer().label, "Warm up");
    }

    #[test]
    fn test_load_replaces_sequence() {
        let mut composer = Composer::new(5);
        composer.load(
            "tabata",
            SequenceDefinition::new(
                vec![TimerSpec::count_down("Work", 20), TimerSpec::count_down("Rest", 10)],
                8,
            ),
        )
        .unwrap();

        assert_eq!(composer.title, "tabata");
        assert_eq!(composer.timers().len(), 2);
        assert_eq!(composer.executions(), 8);
        assert_eq!(composer.estimated_secs(), 240);
    }

    #[test]
    fn test_load_rejects_invalid_definition() {
        let mut composer = Composer::new(5);
        composer.title = "draft".to_string();

        let empty = SequenceDefinition::new(vec![], 3);
        assert_eq!(composer.load("empty", empty), Err(DefinitionError::NoTimers));
        assert_eq!(composer.title, "draft");
        assert_eq!(composer.timers().len(), 1);
        assert_eq!(composer.executions(), 1);
    }
}
