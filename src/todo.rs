//! The todo record and its lifecycle operations.

use chrono::{DateTime, Datelike, Days, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ical::DateValue;

/// VTODO status, per RFC 5545.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum Status {
    NeedsAction,
    InProcess,
    Completed,
    Cancelled,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::NeedsAction,
        Status::InProcess,
        Status::Completed,
        Status::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NeedsAction => "NEEDS-ACTION",
            Status::InProcess => "IN-PROCESS",
            Status::Completed => "COMPLETED",
            Status::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Result<Status> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NEEDS-ACTION" => Ok(Status::NeedsAction),
            "IN-PROCESS" => Ok(Status::InProcess),
            "COMPLETED" => Ok(Status::Completed),
            "CANCELLED" => Ok(Status::Cancelled),
            other => Err(Error::InvalidArgument(format!(
                "invalid status '{other}', expected one of NEEDS-ACTION, IN-PROCESS, COMPLETED, CANCELLED, or ANY"
            ))),
        }
    }
}

/// Map a 0-9 priority to its display bucket.
pub fn priority_label(priority: u8) -> &'static str {
    match priority {
        0 => "none",
        1..=4 => "high",
        5 => "medium",
        _ => "low",
    }
}

/// Parse a priority bucket label (or a bare 0-9 digit) into the 0-9 scale.
pub fn parse_priority(value: &str) -> Result<u8> {
    match value.trim().to_ascii_lowercase().as_str() {
        "none" => Ok(0),
        "high" => Ok(4),
        "medium" => Ok(5),
        "low" => Ok(9),
        other => match other.parse::<u8>() {
            Ok(n) if n <= 9 => Ok(n),
            _ => Err(Error::InvalidArgument(format!(
                "priority must be low, medium, high, none, or 0-9 (got '{value}')"
            ))),
        },
    }
}

/// A single task, backed by one VTODO component on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub uid: String,
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub status: Status,
    /// 0 means no priority; 1 is highest, 9 lowest.
    #[serde(default)]
    pub priority: u8,
    #[serde(default)]
    pub percent_complete: u8,
    #[serde(default)]
    pub categories: Vec<String>,
    pub start: Option<DateValue>,
    pub due: Option<DateValue>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub dtstamp: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sequence: u32,
    #[serde(default)]
    pub rrule: String,
    /// File name within the list directory.
    pub filename: String,
    /// Name of the list this todo belongs to; derived, never written to disk.
    pub list_name: String,
    /// Session-scoped id. Assigned by the cache at listing time; never stable
    /// across cache rebuilds.
    #[serde(default)]
    pub id: Option<i64>,
}

impl Todo {
    /// A fresh, empty todo in the given list, with a generated UID.
    pub fn new(list_name: &str) -> Self {
        let uid = format!("{}@{}", Uuid::new_v4().simple(), hostname());
        let filename = format!("{uid}.ics");
        Self {
            uid,
            summary: String::new(),
            description: String::new(),
            location: String::new(),
            status: Status::NeedsAction,
            priority: 0,
            percent_complete: 0,
            categories: Vec::new(),
            start: None,
            due: None,
            completed_at: None,
            created_at: Some(Utc::now()),
            dtstamp: Some(Utc::now()),
            last_modified: None,
            sequence: 0,
            rrule: String::new(),
            filename,
            list_name: list_name.to_string(),
            id: None,
        }
    }

    /// A copy with a fresh identity (new UID and filename), used by `copy`.
    pub fn clone_new(&self) -> Self {
        let mut copy = Todo::new(&self.list_name);
        copy.summary = self.summary.clone();
        copy.description = self.description.clone();
        copy.location = self.location.clone();
        copy.status = self.status;
        copy.priority = self.priority;
        copy.percent_complete = self.percent_complete;
        copy.categories = self.categories.clone();
        copy.start = self.start;
        copy.due = self.due;
        copy.completed_at = self.completed_at;
        copy.rrule = self.rrule.clone();
        copy
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
            || matches!(self.status, Status::Completed | Status::Cancelled)
    }

    pub fn is_recurring(&self) -> bool {
        !self.rrule.is_empty()
    }

    /// Mark this todo completed. For a recurring todo the next instance is
    /// split off first (with a fresh UID) and returned; the completed copy
    /// loses its rrule.
    pub fn complete(&mut self) -> Option<Todo> {
        let next = if self.is_recurring() {
            let spawned = self.next_instance();
            if spawned.is_some() {
                self.rrule.clear();
            }
            spawned
        } else {
            None
        };

        self.completed_at = Some(Utc::now());
        self.percent_complete = 100;
        self.status = Status::Completed;
        next
    }

    /// Restore a completed todo to NEEDS-ACTION.
    pub fn undo(&mut self) {
        self.completed_at = None;
        self.percent_complete = 0;
        self.status = Status::NeedsAction;
    }

    pub fn cancel(&mut self) {
        self.status = Status::Cancelled;
    }

    /// Enforce the date invariant: due must not precede start. The offending
    /// start is dropped rather than rejecting the save; the returned warning
    /// describes what happened.
    pub fn normalize_dates(&mut self) -> Option<String> {
        if let (Some(start), Some(due)) = (&self.start, &self.due) {
            if start.timestamp() >= due.timestamp() {
                self.start = None;
                return Some(format!(
                    "start date of '{}' is not before its due date; dropping start",
                    self.summary
                ));
            }
        }
        None
    }

    /// The next instance of a recurring todo, with start/due advanced per the
    /// rrule. Returns None when the rule is unsupported or no dates advance.
    fn next_instance(&self) -> Option<Todo> {
        let rule = RecurrenceRule::parse(&self.rrule)?;
        let next_due = self.due.map(|d| rule.advance(d));
        let next_start = self.start.map(|s| rule.advance(s));
        if next_due.is_none() && next_start.is_none() {
            return None;
        }
        let mut next = self.clone_new();
        next.due = next_due;
        next.start = next_start;
        next.status = Status::NeedsAction;
        next.completed_at = None;
        next.percent_complete = 0;
        Some(next)
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// The subset of RRULE this crate can advance: FREQ plus INTERVAL.
/// Anything else is treated as opaque.
struct RecurrenceRule {
    freq: Freq,
    interval: u32,
}

#[derive(Clone, Copy)]
enum Freq {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceRule {
    fn parse(rrule: &str) -> Option<Self> {
        let mut freq = None;
        let mut interval = 1u32;
        for part in rrule.split(';') {
            let mut kv = part.splitn(2, '=');
            let key = kv.next()?.trim().to_ascii_uppercase();
            let value = kv.next().unwrap_or("").trim().to_ascii_uppercase();
            match key.as_str() {
                "FREQ" => {
                    freq = Some(match value.as_str() {
                        "DAILY" => Freq::Daily,
                        "WEEKLY" => Freq::Weekly,
                        "MONTHLY" => Freq::Monthly,
                        "YEARLY" => Freq::Yearly,
                        _ => return None,
                    });
                }
                "INTERVAL" => interval = value.parse().ok()?,
                // COUNT, UNTIL, BYDAY, ... need a real recurrence engine.
                _ => return None,
            }
        }
        freq.map(|freq| Self { freq, interval })
    }

    fn advance(&self, value: DateValue) -> DateValue {
        let n = self.interval;
        match value {
            DateValue::Date(d) => DateValue::Date(match self.freq {
                Freq::Daily => d + Days::new(n as u64),
                Freq::Weekly => d + Days::new(7 * n as u64),
                Freq::Monthly => d + Months::new(n),
                Freq::Yearly => d
                    .with_year(d.year() + n as i32)
                    .unwrap_or(d + Months::new(12 * n)),
            }),
            DateValue::DateTime(dt) => DateValue::DateTime(match self.freq {
                Freq::Daily => dt + Days::new(n as u64),
                Freq::Weekly => dt + Days::new(7 * n as u64),
                Freq::Monthly => dt + Months::new(n),
                Freq::Yearly => dt + Months::new(12 * n),
            }),
        }
    }
}
