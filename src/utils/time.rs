use chrono::{NaiveDate, NaiveTime};

/// This is the standard way of converting a date to a work log key in workday.
pub fn date_to_log_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses a `HH:MM` wall-clock string. Returns [None] for anything else.
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn minutes_to_hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

pub fn hhmm_to_minutes(value: &str) -> Option<u32> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    Some(hours * 60 + minutes)
}

/// Whole minutes from `start` to `end`, floored at zero. A pair that crosses
/// midnight comes out negative and is clamped away.
pub fn clamped_minutes_between(start: NaiveTime, end: NaiveTime) -> u32 {
    (end - start).num_minutes().max(0) as u32
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    #[test]
    fn hhmm_round_trips() {
        assert_eq!(minutes_to_hhmm(528), "08:48");
        assert_eq!(hhmm_to_minutes("08:48"), Some(528));
        assert_eq!(hhmm_to_minutes("00:00"), Some(0));
        assert_eq!(minutes_to_hhmm(0), "00:00");
    }

    #[test]
    fn hhmm_rejects_garbage() {
        assert_eq!(hhmm_to_minutes("noon"), None);
        assert_eq!(hhmm_to_minutes("12"), None);
        assert_eq!(parse_hhmm("25:99"), None);
        assert_eq!(parse_hhmm(""), None);
    }

    #[test]
    fn minutes_between_clamps_midnight_crossings() {
        let start = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
        let end = NaiveTime::from_hms_opt(0, 15, 0).unwrap();
        assert_eq!(clamped_minutes_between(start, end), 0);
        assert_eq!(clamped_minutes_between(end, start), 23 * 60 + 15);
    }
}
