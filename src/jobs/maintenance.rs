//! Srovnání `Event.status` s kalendářem a aktivitou zápasů.
//!
//! `upcoming → ongoing → finished` podle `now` vs `dateStart`/`dateEnd`.
//! Event po konci s live zápasem (nebo s nedohranými zápasy v ochranné lhůtě)
//! se neuzavírá.

use super::{JobContext, JobOutcome};
use crate::error::JobError;
use canon_db::{EventStatus, MatchActivity};
use chrono::{DateTime, Days, NaiveDate, Utc};
use tracing::{debug, info};

/// Kolik dní po `dateEnd` ještě čekáme na scheduled zápasy
pub const SCHEDULED_GRACE_DAYS: u64 = 3;

pub fn reconcile_status(
    date_start: NaiveDate,
    date_end: NaiveDate,
    activity: &MatchActivity,
    today: NaiveDate,
) -> EventStatus {
    if today < date_start {
        return EventStatus::Upcoming;
    }
    if today <= date_end {
        return EventStatus::Ongoing;
    }

    if activity.live > 0 {
        return EventStatus::Ongoing;
    }
    let grace_end = date_end.checked_add_days(Days::new(SCHEDULED_GRACE_DAYS)).unwrap_or(NaiveDate::MAX);
    if activity.scheduled > 0 && today < grace_end {
        return EventStatus::Ongoing;
    }
    EventStatus::Finished
}

/// Projde všechny eventy; `written` = počet eventů se změněným stavem
pub fn fix_status(ctx: &JobContext, now: DateTime<Utc>) -> Result<JobOutcome, JobError> {
    let today = now.date_naive();
    let mut changed = 0;

    for event in ctx.store.all_events()? {
        let activity = ctx.store.match_activity(event.id)?;
        let target = reconcile_status(event.date_start, event.date_end, &activity, today);
        if target == event.status {
            continue;
        }
        debug!("event {} {}: {} → {}", event.id, event.name, event.status, target);
        if ctx.store.set_event_status(event.id, target)? {
            changed += 1;
        }
    }

    info!("🔧 Fix status: {} events changed", changed);
    Ok(JobOutcome { written: changed, failed: 0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn activity(scheduled: i64, live: i64) -> MatchActivity {
        MatchActivity { total: scheduled + live, scheduled, live, finished: 0 }
    }

    #[test]
    fn future_event_is_upcoming_whatever_the_matches_say() {
        let s = reconcile_status(day("2026-11-01"), day("2026-11-10"), &activity(0, 2), day("2026-10-16"));
        assert_eq!(s, EventStatus::Upcoming);
    }

    #[test]
    fn inside_date_range_is_ongoing() {
        let s = reconcile_status(day("2026-10-10"), day("2026-10-20"), &activity(0, 0), day("2026-10-20"));
        assert_eq!(s, EventStatus::Ongoing);
    }

    #[test]
    fn past_end_with_live_match_is_not_finished() {
        let s = reconcile_status(day("2026-09-01"), day("2026-09-10"), &activity(0, 1), day("2026-10-16"));
        assert_eq!(s, EventStatus::Ongoing);
    }

    #[test]
    fn scheduled_matches_hold_only_within_grace() {
        let end = day("2026-10-10");
        assert_eq!(reconcile_status(day("2026-10-01"), end, &activity(2, 0), day("2026-10-12")), EventStatus::Ongoing);
        assert_eq!(reconcile_status(day("2026-10-01"), end, &activity(2, 0), day("2026-10-13")), EventStatus::Finished);
    }

    #[test]
    fn past_end_without_activity_is_finished() {
        let s = reconcile_status(day("2026-09-01"), day("2026-09-10"), &activity(0, 0), day("2026-09-11"));
        assert_eq!(s, EventStatus::Finished);
    }
}
