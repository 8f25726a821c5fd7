// ABOUTME: Daily trigger loop firing one sync cycle per calendar day at the configured local time
// ABOUTME: Computes the next occurrence in the configured timezone and sleeps until it
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Daily scheduler.
//!
//! The scheduler guarantees at most one cycle in flight: it sleeps until the
//! next occurrence of the configured wall-clock time, runs the cycle to
//! completion, then computes the occurrence after that. Shutdown is observed
//! only while sleeping, so an in-flight cycle always finishes cleanly and
//! state is never corrupted mid-cycle.

use crate::providers::core::{MeasurementSource, MeasurementUploader};
use crate::sync::SyncEngine;
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};

/// Daily trigger configuration
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    sync_time: NaiveTime,
    timezone: Tz,
}

impl Scheduler {
    /// Scheduler firing at `sync_time` wall-clock in `timezone`
    #[must_use]
    pub const fn new(sync_time: NaiveTime, timezone: Tz) -> Self {
        Self {
            sync_time,
            timezone,
        }
    }

    /// Today's calendar date in the scheduler's timezone
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    /// Next occurrence of the configured wall-clock time strictly after `now`.
    ///
    /// DST folds resolve to the earlier occurrence unless it has already
    /// passed, in which case the later one fires; a wall-clock time that does
    /// not exist on a gap day slides forward in one-hour steps until it does.
    /// The result is always strictly after `now`, also on fold days where the
    /// wall-clock comparison alone would pick an instant behind it.
    #[must_use]
    pub fn next_trigger_after(&self, now: DateTime<Tz>) -> DateTime<Tz> {
        let mut date = now.date_naive();
        if now.time() >= self.sync_time {
            date = date.succ_opt().unwrap_or(date);
        }

        let mut candidate = date.and_time(self.sync_time);
        loop {
            let resolved = match self.timezone.from_local_datetime(&candidate) {
                LocalResult::Single(instant) => Some(instant),
                LocalResult::Ambiguous(earlier, later) => {
                    Some(if earlier > now { earlier } else { later })
                }
                LocalResult::None => None,
            };

            match resolved {
                Some(instant) if instant > now => return instant,
                Some(_) => {
                    // Both occurrences have passed; the trigger moves to tomorrow
                    date = date.succ_opt().unwrap_or(date);
                    candidate = date.and_time(self.sync_time);
                }
                None => candidate += Duration::hours(1),
            }
        }
    }

    /// Run the daily loop until shutdown is requested.
    ///
    /// Each iteration sleeps until the next trigger, runs one cycle, and logs
    /// its outcome. A failed cycle never exits the loop; the process waits for
    /// the next scheduled trigger.
    pub async fn run<S, U>(&self, engine: &mut SyncEngine<S, U>)
    where
        S: MeasurementSource,
        U: MeasurementUploader,
    {
        loop {
            let now = Utc::now().with_timezone(&self.timezone);
            let next = self.next_trigger_after(now);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_trigger = %next, "sleeping until next scheduled sync");

            tokio::select! {
                () = tokio::time::sleep(wait) => {
                    let outcome = engine.run_cycle(self.today()).await;
                    info!(outcome = outcome.label(), "scheduled sync cycle finished");
                }
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!(error = %e, "shutdown signal listener failed, stopping");
                    } else {
                        info!("shutdown signal received, stopping scheduler");
                    }
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(tz: Tz, y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        tz.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn fires_later_today_when_before_sync_time() {
        let tz = chrono_tz::UTC;
        let scheduler = Scheduler::new(NaiveTime::from_hms_opt(3, 0, 0).unwrap(), tz);
        let now = at(tz, 2025, 6, 2, 1, 30);
        assert_eq!(scheduler.next_trigger_after(now), at(tz, 2025, 6, 2, 3, 0));
    }

    #[test]
    fn fires_tomorrow_when_past_sync_time() {
        let tz = chrono_tz::UTC;
        let scheduler = Scheduler::new(NaiveTime::from_hms_opt(3, 0, 0).unwrap(), tz);
        let now = at(tz, 2025, 6, 2, 3, 0);
        assert_eq!(scheduler.next_trigger_after(now), at(tz, 2025, 6, 3, 3, 0));
    }

    #[test]
    fn trigger_is_always_strictly_in_the_future() {
        let tz = chrono_tz::America::Chicago;
        let scheduler = Scheduler::new(NaiveTime::from_hms_opt(23, 59, 0).unwrap(), tz);
        let now = at(tz, 2025, 12, 31, 23, 59);
        let next = scheduler.next_trigger_after(now);
        assert!(next > now);
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn dst_fold_from_the_second_occurrence_stays_in_the_future() {
        // 2025-11-02 01:45 occurs twice in Chicago (fall-back). From inside
        // the repeated hour's second pass, the earlier occurrence is already
        // behind the clock and must not fire again.
        let tz = chrono_tz::America::Chicago;
        let scheduler = Scheduler::new(NaiveTime::from_hms_opt(1, 45, 0).unwrap(), tz);
        let now = tz
            .with_ymd_and_hms(2025, 11, 2, 1, 30, 0)
            .latest()
            .unwrap();

        let next = scheduler.next_trigger_after(now);
        assert!(next > now);
        assert_eq!(
            next,
            tz.with_ymd_and_hms(2025, 11, 2, 1, 45, 0).latest().unwrap()
        );
    }

    #[test]
    fn dst_fold_prefers_the_earlier_occurrence_when_still_ahead() {
        let tz = chrono_tz::America::Chicago;
        let scheduler = Scheduler::new(NaiveTime::from_hms_opt(1, 45, 0).unwrap(), tz);
        let now = tz.with_ymd_and_hms(2025, 11, 2, 0, 30, 0).unwrap();

        let next = scheduler.next_trigger_after(now);
        assert!(next > now);
        assert_eq!(
            next,
            tz.with_ymd_and_hms(2025, 11, 2, 1, 45, 0)
                .earliest()
                .unwrap()
        );
    }

    #[test]
    fn dst_gap_slides_forward_instead_of_panicking() {
        // 2025-03-09 02:30 does not exist in Chicago (spring-forward)
        let tz = chrono_tz::America::Chicago;
        let scheduler = Scheduler::new(NaiveTime::from_hms_opt(2, 30, 0).unwrap(), tz);
        let now = at(tz, 2025, 3, 9, 0, 0);
        let next = scheduler.next_trigger_after(now);
        assert!(next > now);
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
    }
}
