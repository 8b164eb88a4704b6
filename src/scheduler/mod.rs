use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Timelike, Utc};
use std::collections::HashSet;
use tokio::time::{sleep, Duration};

use crate::engine::{TickOutcome, TradingPipeline};
use crate::error::TickError;
use crate::strategy::Strategy;

/// Which wall-clock minutes fire a trading tick
///
/// Cron-style day-of-week, hour, and minute filters, evaluated at a
/// fixed UTC offset, gated by a start timestamp. Parsing failures are
/// startup errors; matching is a pure function of the clock.
#[derive(Debug, Clone)]
pub struct ScheduleSpec {
    /// Monday = 0 .. Sunday = 6
    days: HashSet<u32>,
    hours: HashSet<u32>,
    minutes: HashSet<u32>,
    offset: FixedOffset,
    start: DateTime<Utc>,
}

const DAY_TOKENS: &[(&str, u32)] = &[
    ("mon", 0),
    ("tue", 1),
    ("wed", 2),
    ("thu", 3),
    ("fri", 4),
    ("sat", 5),
    ("sun", 6),
];

fn parse_day_token(token: &str) -> anyhow::Result<u32> {
    DAY_TOKENS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, idx)| *idx)
        .ok_or_else(|| anyhow!("unknown day-of-week token '{}'", token))
}

/// Parse a cron-like field: `*`, single values, ranges, comma lists
///
/// Ranges wrap, so `sat-mon` means sat, sun, mon.
fn parse_field(
    spec: &str,
    modulus: u32,
    parse_token: impl Fn(&str) -> anyhow::Result<u32>,
) -> anyhow::Result<HashSet<u32>> {
    let spec = spec.trim();
    if spec == "*" {
        return Ok((0..modulus).collect());
    }

    let mut values = HashSet::new();
    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            bail!("empty entry in schedule field '{}'", spec);
        }

        match part.split_once('-') {
            Some((lo, hi)) => {
                let lo = parse_token(lo.trim())?;
                let hi = parse_token(hi.trim())?;
                let mut v = lo;
                loop {
                    values.insert(v);
                    if v == hi {
                        break;
                    }
                    v = (v + 1) % modulus;
                }
            }
            None => {
                values.insert(parse_token(part)?);
            }
        }
    }

    Ok(values)
}

fn parse_number(token: &str, limit: u32, what: &str) -> anyhow::Result<u32> {
    let n: u32 = token
        .parse()
        .map_err(|_| anyhow!("invalid {} value '{}'", what, token))?;
    if n >= limit {
        bail!("{} value {} out of range (max {})", what, n, limit - 1);
    }
    Ok(n)
}

impl ScheduleSpec {
    /// Build a schedule from cron-like field strings
    ///
    /// `start` is `YYYY-MM-DD HH:MM:SS`, interpreted at `utc_offset_minutes`.
    pub fn parse(
        day_of_week: &str,
        hours: &str,
        minutes: &str,
        utc_offset_minutes: i32,
        start: &str,
    ) -> anyhow::Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
            .ok_or_else(|| anyhow!("UTC offset {} minutes out of range", utc_offset_minutes))?;

        let days = parse_field(day_of_week, 7, parse_day_token)
            .with_context(|| format!("bad day-of-week spec '{}'", day_of_week))?;
        let hours = parse_field(hours, 24, |t| parse_number(t, 24, "hour"))
            .with_context(|| format!("bad hour spec '{}'", hours))?;
        let minutes = parse_field(minutes, 60, |t| parse_number(t, 60, "minute"))
            .with_context(|| format!("bad minute spec '{}'", minutes))?;

        let naive = NaiveDateTime::parse_from_str(start, "%Y-%m-%d %H:%M:%S")
            .with_context(|| format!("bad start timestamp '{}'", start))?;
        let start = naive
            .and_local_timezone(offset)
            .single()
            .ok_or_else(|| anyhow!("ambiguous start timestamp '{}'", start))?
            .with_timezone(&Utc);

        Ok(Self {
            days,
            hours,
            minutes,
            offset,
            start,
        })
    }

    /// Does this instant fall on a scheduled minute?
    pub fn matches(&self, now: DateTime<Utc>) -> bool {
        if now < self.start {
            return false;
        }

        let local = now.with_timezone(&self.offset);
        self.days
            .contains(&local.weekday().num_days_from_monday())
            && self.hours.contains(&local.hour())
            && self.minutes.contains(&local.minute())
    }
}

/// How long until the next minute boundary (XX:XX:00.000)
///
/// Derived from the wall clock on every call, so fires cannot drift
/// ahead of the boundary the way a fixed-period monotonic timer can
/// over a long run. At the boundary itself the wait is a full minute;
/// the caller has just handled that minute.
fn until_next_minute(now: DateTime<Utc>) -> Duration {
    let millis_into_minute =
        u64::from(now.second()) * 1_000 + u64::from(now.timestamp_subsec_millis());
    Duration::from_millis(60_000 - millis_into_minute.min(59_999))
}

/// Drives the pipeline at the scheduled minutes
///
/// A single loop, so ticks are serialized by construction; the terminal
/// session behind the pipeline is an exclusive resource. A tick that
/// overruns its minute causes later fires to be skipped, never stacked:
/// the next sleep targets whatever boundary is still ahead.
pub struct Scheduler {
    spec: ScheduleSpec,
}

impl Scheduler {
    pub fn new(spec: ScheduleSpec) -> Self {
        Self { spec }
    }

    pub async fn run<S: Strategy>(&self, pipeline: &TradingPipeline<S>) {
        tracing::info!("Scheduler running, waiting for the next scheduled minute");

        loop {
            sleep(until_next_minute(Utc::now())).await;

            let now = Utc::now();
            if !self.spec.matches(now) {
                continue;
            }

            tracing::info!(at = %now.format("%Y-%m-%d %H:%M:%SZ"), "Scheduled tick firing");

            match pipeline.run_tick().await {
                Ok(TickOutcome::NoSignal) => {}
                Ok(TickOutcome::Submitted { side, receipt }) => {
                    tracing::info!(
                        side = %side.as_str(),
                        ticket = receipt.ticket,
                        "Tick completed with an order"
                    );
                }
                Err(e @ TickError::OrderRejected { .. }) => {
                    tracing::error!(error = %e, "Tick failed at order submission");
                }
                Err(e) => {
                    // Tick-local; next scheduled minute starts clean
                    tracing::warn!(error = %e, "Tick skipped");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn spec_nyc_winter() -> ScheduleSpec {
        // UTC-5, New York in winter
        ScheduleSpec::parse("mon-fri", "00-23", "1,16,31,46", -300, "2024-01-01 00:00:01")
            .unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_matches_scheduled_minute() {
        let spec = spec_nyc_winter();

        // 2024-06-12 is a Wednesday; 14:16 UTC is 09:16 at UTC-5
        assert!(spec.matches(utc(2024, 6, 12, 14, 16, 0)));
        assert!(!spec.matches(utc(2024, 6, 12, 14, 17, 0)));
    }

    #[test]
    fn test_weekend_filtered_out() {
        let spec = spec_nyc_winter();

        // 2024-06-15 is a Saturday, also Saturday at UTC-5
        assert!(!spec.matches(utc(2024, 6, 15, 14, 16, 0)));
        // Friday still matches
        assert!(spec.matches(utc(2024, 6, 14, 14, 16, 0)));
    }

    #[test]
    fn test_offset_shifts_the_weekday() {
        let spec = spec_nyc_winter();

        // Saturday 02:01 UTC is Friday 21:01 at UTC-5
        assert!(spec.matches(utc(2024, 6, 15, 2, 1, 0)));
        // Monday 02:01 UTC is still Sunday at UTC-5
        assert!(!spec.matches(utc(2024, 6, 17, 2, 1, 0)));
    }

    #[test]
    fn test_start_timestamp_gates_matching() {
        let spec =
            ScheduleSpec::parse("mon-fri", "*", "*", 0, "2024-06-12 12:00:00").unwrap();

        assert!(!spec.matches(utc(2024, 6, 12, 11, 59, 0)));
        assert!(spec.matches(utc(2024, 6, 12, 12, 0, 0)));
    }

    #[test]
    fn test_hour_range_filter() {
        let spec = ScheduleSpec::parse("*", "9-17", "0", 0, "2024-01-01 00:00:00").unwrap();

        assert!(spec.matches(utc(2024, 6, 12, 9, 0, 0)));
        assert!(spec.matches(utc(2024, 6, 12, 17, 0, 0)));
        assert!(!spec.matches(utc(2024, 6, 12, 18, 0, 0)));
        assert!(!spec.matches(utc(2024, 6, 12, 8, 0, 0)));
    }

    #[test]
    fn test_wrapping_day_range() {
        let spec = ScheduleSpec::parse("sat-mon", "*", "*", 0, "2024-01-01 00:00:00").unwrap();

        assert!(spec.matches(utc(2024, 6, 15, 10, 0, 0))); // Saturday
        assert!(spec.matches(utc(2024, 6, 16, 10, 0, 0))); // Sunday
        assert!(spec.matches(utc(2024, 6, 17, 10, 0, 0))); // Monday
        assert!(!spec.matches(utc(2024, 6, 18, 10, 0, 0))); // Tuesday
    }

    #[test]
    fn test_wildcards_accept_everything() {
        let spec = ScheduleSpec::parse("*", "*", "*", 0, "2024-01-01 00:00:00").unwrap();

        assert!(spec.matches(utc(2024, 6, 16, 3, 59, 30)));
    }

    #[test]
    fn test_invalid_specs_fail_at_parse() {
        assert!(ScheduleSpec::parse("monfri", "*", "*", 0, "2024-01-01 00:00:00").is_err());
        assert!(ScheduleSpec::parse("*", "25", "*", 0, "2024-01-01 00:00:00").is_err());
        assert!(ScheduleSpec::parse("*", "*", "61", 0, "2024-01-01 00:00:00").is_err());
        assert!(ScheduleSpec::parse("*", "*", "*", 0, "not-a-date").is_err());
        assert!(ScheduleSpec::parse("*", "*", "*", 100_000, "2024-01-01 00:00:00").is_err());
    }

    #[test]
    fn test_sleep_always_lands_on_or_after_the_boundary() {
        // Mid-minute: wait out the remainder
        assert_eq!(
            until_next_minute(utc(2024, 6, 12, 14, 15, 30)),
            Duration::from_secs(30)
        );
        // One second short of the boundary
        assert_eq!(
            until_next_minute(utc(2024, 6, 12, 14, 15, 59)),
            Duration::from_secs(1)
        );
        // Exactly on the boundary: that minute is the caller's current
        // one, so the next fire is a full minute out
        assert_eq!(
            until_next_minute(utc(2024, 6, 12, 14, 16, 0)),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_sub_second_wakeups_round_forward() {
        let just_before = utc(2024, 6, 12, 14, 15, 59)
            .checked_add_signed(chrono::Duration::milliseconds(700))
            .unwrap();

        assert_eq!(until_next_minute(just_before), Duration::from_millis(300));
    }

    #[test]
    fn test_minute_list_parsing() {
        let spec =
            ScheduleSpec::parse("*", "*", "1, 16, 31, 46", 0, "2024-01-01 00:00:00").unwrap();

        assert!(spec.matches(utc(2024, 6, 12, 7, 31, 0)));
        assert!(!spec.matches(utc(2024, 6, 12, 7, 30, 0)));
    }
}
