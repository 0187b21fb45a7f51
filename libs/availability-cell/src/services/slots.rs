use chrono::{DateTime, Duration, NaiveDate, Utc};

use shared_models::{ScheduleRule, Slot};

/// Builds the legal slot grid for a rule on one date.
pub struct SlotGenerator;

impl SlotGenerator {
    /// Slots of `service_duration_minutes` laid out from the rule's start,
    /// stepping by `service_duration_minutes + buffer_minutes` (not the rule's
    /// own slot length) until the next slot would end past the rule's end.
    ///
    /// Yields nothing when the rule is inactive, belongs to another weekday,
    /// or the duration is not positive.
    pub fn generate(rule: &ScheduleRule, date: NaiveDate, service_duration_minutes: i32) -> SlotIter {
        let window_start = date.and_time(rule.start_time).and_utc();
        let window_end = date.and_time(rule.end_time).and_utc();

        let usable = rule.applies_to(date) && service_duration_minutes > 0 && window_start < window_end;

        let duration = i64::from(service_duration_minutes.max(0));
        let buffer = i64::from(rule.buffer_minutes.max(0));

        SlotIter {
            current: window_start,
            window_end: if usable { window_end } else { window_start },
            duration: Duration::minutes(duration),
            step: Duration::minutes(duration + buffer),
        }
    }
}

/// Lazy, side-effect free iterator over a rule's slots. Clone it to restart.
#[derive(Debug, Clone)]
pub struct SlotIter {
    current: DateTime<Utc>,
    window_end: DateTime<Utc>,
    duration: Duration,
    step: Duration,
}

impl Iterator for SlotIter {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        if self.step <= Duration::zero() {
            return None;
        }

        let end = self.current + self.duration;
        if end > self.window_end || self.current >= self.window_end {
            return None;
        }

        let slot = Slot::new(self.current, end);
        self.current += self.step;
        Some(slot)
    }
}
