//! Trigger rules — the pure decision logic of the schedule manager.
//!
//! Each rule kind answers the same question: given the current wall-clock
//! reading and the job's last-fire marker, is the job due right now, and
//! what should the marker become? No rule ever errors for a configuration
//! that is merely unsatisfiable (bad weekday name, unknown custom type) —
//! those degrade to "never due".

use botmill_core::config::{CustomRuleSpec, JobSpec};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Weekday};

/// Format of the dedup key for time-based rules.
const MINUTE_FORMAT: &str = "%H:%M";

/// Built-in custom rule tag.
const RULE_LAST_DAY_OF_WEEK_IN_MONTH: &str = "last_day_of_week_in_month";

/// A job's trigger, derived once from its [`JobSpec`].
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Fire every `every_ms` milliseconds.
    Interval { every_ms: u64 },
    /// Fire at each listed "HH:MM", any day.
    TimeOfDay { times: Vec<String> },
    /// Fire at each listed "HH:MM", on the listed weekdays only.
    WeekdayAndTime { days: Vec<String>, times: Vec<String> },
    /// Tagged extensible rule; unknown tags warn and never fire.
    Custom(CustomRuleSpec),
}

impl Trigger {
    /// Derive the trigger from whichever descriptor keys are present.
    /// `None` means the job has no trigger and can never become due.
    pub fn from_spec(job: &JobSpec) -> Option<Self> {
        if let Some(every_ms) = job.interval {
            return Some(Trigger::Interval { every_ms });
        }
        if !job.time.is_empty() {
            if job.day.is_empty() {
                return Some(Trigger::TimeOfDay { times: job.time.clone() });
            }
            return Some(Trigger::WeekdayAndTime {
                days: job.day.clone(),
                times: job.time.clone(),
            });
        }
        // `day` without `time` lands here too: no usable trigger.
        if let Some(rule) = &job.custom_rule {
            return Some(Trigger::Custom(rule.clone()));
        }
        None
    }
}

/// Per-job memory of the last fire, used purely for de-duplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// Epoch milliseconds of the last interval fire. The sentinel `0`
    /// lets the very first check fire immediately.
    Elapsed(i64),
    /// Last "HH:MM" at which a time-based rule fired. The empty-string
    /// sentinel can never equal a real clock reading.
    Minute(String),
}

impl Marker {
    /// The initial marker appropriate to a trigger kind.
    pub fn sentinel_for(trigger: &Trigger) -> Self {
        match trigger {
            Trigger::Interval { .. } => Marker::Elapsed(0),
            _ => Marker::Minute(String::new()),
        }
    }

    fn as_millis(&self) -> i64 {
        match self {
            Marker::Elapsed(ms) => *ms,
            Marker::Minute(_) => 0,
        }
    }

    fn as_minute(&self) -> &str {
        match self {
            Marker::Minute(m) => m,
            Marker::Elapsed(_) => "",
        }
    }
}

/// Result of one due-check: whether to fire, and the marker to store back.
#[derive(Debug, Clone)]
pub struct Decision {
    pub fire: bool,
    pub marker: Marker,
}

impl Decision {
    fn hold(marker: &Marker) -> Self {
        Self { fire: false, marker: marker.clone() }
    }
}

/// Evaluate a job's trigger against a single clock reading.
///
/// `job_path` is only used in log lines; the evaluation itself is pure.
pub fn evaluate(job_path: &str, trigger: &Trigger, now: DateTime<Local>, marker: &Marker) -> Decision {
    match trigger {
        Trigger::Interval { every_ms } => check_interval(*every_ms, now, marker),
        Trigger::TimeOfDay { times } => check_minute_match(times.iter().any(|t| t == &minute_of(now)), now, marker),
        Trigger::WeekdayAndTime { days, times } => {
            let day_ok = days.iter().any(|d| weekday_matches(d, now.weekday()));
            let time_ok = times.iter().any(|t| t == &minute_of(now));
            check_minute_match(day_ok && time_ok, now, marker)
        }
        Trigger::Custom(rule) => check_custom(job_path, rule, now, marker),
    }
}

/// "HH:MM" of the given instant.
fn minute_of(now: DateTime<Local>) -> String {
    now.format(MINUTE_FORMAT).to_string()
}

/// Case-insensitive weekday-name match. Unknown names match nothing.
fn weekday_matches(name: &str, weekday: Weekday) -> bool {
    name.parse::<Weekday>().is_ok_and(|w| w == weekday)
}

fn check_interval(every_ms: u64, now: DateTime<Local>, marker: &Marker) -> Decision {
    let now_ms = now.timestamp_millis();
    // One fire per check regardless of how many multiples elapsed.
    if now_ms - marker.as_millis() >= every_ms as i64 {
        Decision { fire: true, marker: Marker::Elapsed(now_ms) }
    } else {
        Decision::hold(marker)
    }
}

/// Shared dedup for every minute-keyed rule. Once the rule's conditions
/// match the current minute, the marker is set to that minute on every
/// check, so the poll loop fires at most once per matching minute.
fn check_minute_match(matched: bool, now: DateTime<Local>, marker: &Marker) -> Decision {
    if !matched {
        return Decision::hold(marker);
    }
    let hhmm = minute_of(now);
    let fire = marker.as_minute() != hhmm;
    Decision { fire, marker: Marker::Minute(hhmm) }
}

fn check_custom(job_path: &str, rule: &CustomRuleSpec, now: DateTime<Local>, marker: &Marker) -> Decision {
    match rule.kind.as_str() {
        RULE_LAST_DAY_OF_WEEK_IN_MONTH => {
            let day_ok = rule
                .day_of_week
                .as_deref()
                .and_then(|name| name.parse::<Weekday>().ok())
                .is_some_and(|w| is_last_weekday_occurrence_in_month(now.date_naive(), w));
            let time_ok = rule.time.iter().any(|t| t == &minute_of(now));
            check_minute_match(day_ok && time_ok, now, marker)
        }
        unknown => {
            tracing::warn!("job '{}' has unknown custom rule type '{}', skipping", job_path, unknown);
            Decision::hold(marker)
        }
    }
}

/// True iff `date` is the last occurrence of `weekday` within its month.
///
/// Walks back from the last calendar day of the month until the weekday
/// matches, then compares against `date`.
pub fn is_last_weekday_occurrence_in_month(date: NaiveDate, weekday: Weekday) -> bool {
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let Some(first_of_next) = NaiveDate::from_ymd_opt(next_year, next_month, 1) else {
        return false;
    };
    let mut candidate = first_of_next - Duration::days(1);
    while candidate.weekday() != weekday {
        candidate -= Duration::days(1);
    }
    candidate == date
}
