use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Source of "now" for date rules (past-dated leave, today's attendance).
pub trait Clock: Send + Sync {
    /// Local wall-clock date and time of the server.
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    fn time_of_day(&self) -> NaiveTime {
        self.now().time()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Frozen clock for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        Self(date.and_time(time))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_splits_date_and_time() {
        let clock = FixedClock::at(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveTime::from_hms_opt(8, 45, 0).unwrap(),
        );
        assert_eq!(clock.today().to_string(), "2024-06-01");
        assert_eq!(clock.time_of_day().to_string(), "08:45:00");
    }
}
