use chrono::{Days, NaiveDate};

/// Inclusive iterator over calendar days from the first date through the last.
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl DateRange {
    /// The `day_interval + 1` days ending at `end`, i.e. `[end - day_interval, end]`.
    pub fn ending_at(end: NaiveDate, day_interval: u32) -> Self {
        let start = end
            .checked_sub_days(Days::new(day_interval as u64))
            .unwrap_or(NaiveDate::MIN);
        DateRange(start, end)
    }

    /// Days strictly between two dates, exclusive on both ends.
    pub fn between(after: NaiveDate, before: NaiveDate) -> Self {
        match (after.succ_opt(), before.pred_opt()) {
            (Some(start), Some(end)) => DateRange(start, end),
            _ => DateRange(NaiveDate::MAX, NaiveDate::MIN),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.0 <= date && date <= self.1
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 > self.1 {
            return None;
        }
        let current = self.0;
        match current.succ_opt() {
            Some(next) => self.0 = next,
            // Past the last representable day: make the range empty.
            None => self.1 = NaiveDate::MIN,
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let days = (self.1 - self.0).num_days() + 1;
        let n = days.max(0) as usize;
        (n, Some(n))
    }
}
