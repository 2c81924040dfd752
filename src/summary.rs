//! Pure recomputation of the day summary from sessions, inactive periods,
//! and the daily target. Everything here is a function of its inputs so the
//! store can recompute at any moment without side effects.

use chrono::NaiveTime;

use crate::{
    store::entities::{DayLog, DaySummary},
    utils::time::{clamped_minutes_between, hhmm_to_minutes, minutes_to_hhmm, parse_hhmm},
};

/// Recomputes every derived field of the summary. `manual_adjustments` is the
/// only value read from the previous summary; the rest is a function of the
/// sessions, the inactive periods, and `now`.
pub fn compute(day: &DayLog, now: NaiveTime) -> DaySummary {
    let total_tracked: u32 = day
        .sessions
        .iter()
        .filter_map(|session| tracked_minutes(&session.start_time, session.end_time.as_deref(), now))
        .sum();

    let total_inactive: u32 = day
        .inactive_periods
        .iter()
        .filter_map(|period| closed_minutes(&period.start_time, period.end_time.as_deref()))
        .sum();

    let manual_adjustments = hhmm_to_minutes(&day.summary.manual_adjustments).unwrap_or(0);
    let required_minutes = hhmm_to_minutes(&day.required_time).unwrap_or(0);
    let total_reported = total_tracked + manual_adjustments;

    DaySummary {
        missing_time: minutes_to_hhmm(required_minutes.saturating_sub(total_reported)),
        total_tracked: minutes_to_hhmm(total_tracked),
        total_inactive: minutes_to_hhmm(total_inactive),
        manual_adjustments: minutes_to_hhmm(manual_adjustments),
        total_reported: minutes_to_hhmm(total_reported),
        overtime: minutes_to_hhmm(total_reported.saturating_sub(required_minutes)),
        met_target: total_reported >= required_minutes,
    }
}

/// A session with no end yet counts up to `now`. A malformed time skips the
/// whole entry instead of failing the computation.
fn tracked_minutes(start: &str, end: Option<&str>, now: NaiveTime) -> Option<u32> {
    let start = parse_hhmm(start)?;
    let end = match end {
        Some(value) if !value.is_empty() => parse_hhmm(value)?,
        _ => now,
    };
    Some(clamped_minutes_between(start, end))
}

/// Inactive periods get no `now` fallback: a period that is still open
/// contributes nothing until it is closed.
fn closed_minutes(start: &str, end: Option<&str>) -> Option<u32> {
    let start = parse_hhmm(start)?;
    let end = parse_hhmm(end.filter(|value| !value.is_empty())?)?;
    Some(clamped_minutes_between(start, end))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use crate::store::entities::{
        DayLog, InactivePeriod, Session, SessionKind, SessionSource,
    };
    use crate::utils::time::hhmm_to_minutes;

    use super::compute;

    fn at(hours: u32, minutes: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hours, minutes, 0).unwrap()
    }

    fn session(start: &str, end: Option<&str>, kind: SessionKind) -> Session {
        Session {
            start_time: start.into(),
            end_time: end.map(Into::into),
            source: SessionSource::Auto,
            kind,
            note: None,
        }
    }

    fn day_with(sessions: Vec<Session>, inactive_periods: Vec<InactivePeriod>) -> DayLog {
        DayLog {
            sessions,
            inactive_periods,
            ..DayLog::new("08:48".into())
        }
    }

    #[test]
    fn single_session_misses_target() {
        let day = day_with(
            vec![session("09:00", Some("17:00"), SessionKind::Start)],
            vec![],
        );
        let summary = compute(&day, at(18, 0));
        assert_eq!(summary.total_tracked, "08:00");
        assert_eq!(summary.total_reported, "08:00");
        assert_eq!(summary.missing_time, "00:48");
        assert_eq!(summary.overtime, "00:00");
        assert!(!summary.met_target);
    }

    #[test]
    fn second_session_shrinks_missing_time() {
        let day = day_with(
            vec![
                session("09:00", Some("17:00"), SessionKind::Start),
                session("17:15", Some("17:45"), SessionKind::Activity),
            ],
            vec![],
        );
        let summary = compute(&day, at(18, 0));
        assert_eq!(summary.total_tracked, "08:30");
        assert_eq!(summary.missing_time, "00:18");
    }

    #[test]
    fn open_session_counts_up_to_now() {
        let day = day_with(vec![session("09:00", None, SessionKind::Start)], vec![]);
        let summary = compute(&day, at(12, 30));
        assert_eq!(summary.total_tracked, "03:30");
    }

    #[test]
    fn overtime_and_missing_are_never_both_positive() {
        let short = day_with(vec![session("09:00", Some("10:00"), SessionKind::Start)], vec![]);
        let long = day_with(vec![session("08:00", Some("19:00"), SessionKind::Start)], vec![]);
        for day in [short, long] {
            let summary = compute(&day, at(20, 0));
            let overtime = hhmm_to_minutes(&summary.overtime).unwrap();
            let missing = hhmm_to_minutes(&summary.missing_time).unwrap();
            assert!(overtime == 0 || missing == 0);
        }
    }

    #[test]
    fn exact_target_zeroes_both_overtime_and_missing() {
        let day = day_with(vec![session("09:00", Some("17:48"), SessionKind::Start)], vec![]);
        let summary = compute(&day, at(18, 0));
        assert_eq!(summary.overtime, "00:00");
        assert_eq!(summary.missing_time, "00:00");
        assert!(summary.met_target);
    }

    #[test]
    fn manual_adjustments_feed_reported_time() {
        let mut day = day_with(vec![session("09:00", Some("17:00"), SessionKind::Start)], vec![]);
        day.summary.manual_adjustments = "01:00".into();
        let summary = compute(&day, at(18, 0));
        assert_eq!(summary.total_tracked, "08:00");
        assert_eq!(summary.total_reported, "09:00");
        assert_eq!(summary.overtime, "00:12");
        assert_eq!(summary.missing_time, "00:00");
        assert!(summary.met_target);
    }

    #[test]
    fn closed_inactive_periods_are_summed() {
        let day = day_with(
            vec![],
            vec![
                InactivePeriod {
                    start_time: "12:00".into(),
                    end_time: Some("12:45".into()),
                    note: Some("idle".into()),
                },
                InactivePeriod {
                    start_time: "15:00".into(),
                    end_time: Some("15:10".into()),
                    note: None,
                },
            ],
        );
        let summary = compute(&day, at(18, 0));
        assert_eq!(summary.total_inactive, "00:55");
    }

    // Unlike sessions, an open inactive period is not padded out to `now`.
    // Historical behaviour, kept on purpose.
    #[test]
    fn open_inactive_period_contributes_nothing() {
        let day = day_with(
            vec![],
            vec![InactivePeriod {
                start_time: "12:00".into(),
                end_time: None,
                note: Some("idle".into()),
            }],
        );
        let summary = compute(&day, at(18, 0));
        assert_eq!(summary.total_inactive, "00:00");
    }

    #[test]
    fn malformed_times_skip_only_their_entry() {
        let day = day_with(
            vec![
                session("nine", Some("17:00"), SessionKind::Start),
                session("10:00", Some("oops"), SessionKind::Activity),
                session("11:00", Some("12:00"), SessionKind::Activity),
            ],
            vec![],
        );
        let summary = compute(&day, at(18, 0));
        assert_eq!(summary.total_tracked, "01:00");
    }

    #[test]
    fn midnight_crossing_clamps_to_zero() {
        let day = day_with(vec![session("23:00", Some("01:00"), SessionKind::Start)], vec![]);
        let summary = compute(&day, at(1, 30));
        assert_eq!(summary.total_tracked, "00:00");
    }

    #[test]
    fn recomputation_is_idempotent_for_closed_days() {
        let mut day = day_with(
            vec![session("09:00", Some("17:00"), SessionKind::Start)],
            vec![InactivePeriod {
                start_time: "12:00".into(),
                end_time: Some("12:30".into()),
                note: None,
            }],
        );
        let first = compute(&day, at(18, 0));
        day.summary = first.clone();
        let second = compute(&day, at(19, 0));
        assert_eq!(first, second);
    }
}
