//! Filtering and sorting of cached todos
//!
//! Everything here works on in-memory records; the cache has already paid
//! the parsing cost.

use std::cmp::Ordering;

use chrono::Local;

use crate::error::{Error, Result};
use crate::ical::DateValue;
use crate::todo::{Status, Todo};

/// Statuses shown when the user asks for nothing specific
pub const DEFAULT_STATUSES: [Status; 2] = [Status::NeedsAction, Status::InProcess];

/// Which todos a listing includes. An empty/None field means "no constraint".
#[derive(Debug, Default, Clone)]
pub struct TodoFilter {
    /// Restrict to these list names (already resolved, exact)
    pub lists: Vec<String>,
    /// None applies [`DEFAULT_STATUSES`]; an explicit set matches exactly
    pub statuses: Option<Vec<Status>>,
    /// Match any of these categories, case-insensitively
    pub categories: Vec<String>,
    /// Case-insensitive substring over summary and description
    pub grep: Option<String>,
    /// Case-insensitive substring over location
    pub location: Option<String>,
    /// Keep todos at least this important (1 is highest; excludes no-priority)
    pub priority_at_least: Option<u8>,
    /// Keep todos due within this many hours from now
    pub due_within_hours: Option<u32>,
    /// Keep todos whose start is on or before this value
    pub start_before: Option<DateValue>,
    /// Keep todos whose start is on or after this value
    pub start_after: Option<DateValue>,
    /// Keep todos with no start, or a start of today or earlier
    pub startable: bool,
}

impl TodoFilter {
    pub fn matches(&self, todo: &Todo) -> bool {
        if !self.lists.is_empty() && !self.lists.iter().any(|l| *l == todo.list_name) {
            return false;
        }

        match &self.statuses {
            Some(statuses) => {
                if !statuses.contains(&todo.status) {
                    return false;
                }
            }
            None => {
                if !DEFAULT_STATUSES.contains(&todo.status) {
                    return false;
                }
            }
        }

        if !self.categories.is_empty() {
            let hit = self.categories.iter().any(|wanted| {
                todo.categories
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(wanted))
            });
            if !hit {
                return false;
            }
        }

        if let Some(needle) = &self.grep {
            let needle = needle.to_lowercase();
            if !todo.summary.to_lowercase().contains(&needle)
                && !todo.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if let Some(needle) = &self.location {
            if !todo
                .location
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }

        if let Some(floor) = self.priority_at_least {
            // Priority 1 is highest; 0 means unprioritized and never matches.
            if todo.priority == 0 || todo.priority > floor {
                return false;
            }
        }

        if let Some(hours) = self.due_within_hours {
            let Some(due) = &todo.due else { return false };
            let horizon = Local::now().timestamp() + i64::from(hours) * 3600;
            if due.timestamp() > horizon {
                return false;
            }
        }

        if let Some(bound) = &self.start_before {
            let Some(start) = &todo.start else {
                return false;
            };
            if start.timestamp() > bound.timestamp() {
                return false;
            }
        }
        if let Some(bound) = &self.start_after {
            let Some(start) = &todo.start else {
                return false;
            };
            if start.timestamp() < bound.timestamp() {
                return false;
            }
        }

        if self.startable {
            if let Some(start) = &todo.start {
                if start.date() > Local::now().date_naive() {
                    return false;
                }
            }
        }

        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Due,
    Priority,
    Created,
    Start,
    Summary,
    List,
}

/// One sort criterion; `reverse` flips the field's natural order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub reverse: bool,
}

/// Parse a comma-separated sort spec like `due,-priority,summary`.
/// A leading `-` reverses that key.
pub fn parse_sort(spec: &str) -> Result<Vec<SortKey>> {
    spec.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (reverse, name) = match part.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, part),
            };
            let field = match name {
                "due" => SortField::Due,
                "priority" => SortField::Priority,
                "created" => SortField::Created,
                "start" => SortField::Start,
                "summary" => SortField::Summary,
                "list" => SortField::List,
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "unknown sort field '{other}' (expected due|priority|created|start|summary|list)"
                    )))
                }
            };
            Ok(SortKey { field, reverse })
        })
        .collect()
}

/// The order used when no sort spec is given: soonest due first (undated
/// last), then most important, oldest created, uid.
pub fn default_sort() -> Vec<SortKey> {
    vec![
        SortKey {
            field: SortField::Due,
            reverse: false,
        },
        SortKey {
            field: SortField::Priority,
            reverse: false,
        },
        SortKey {
            field: SortField::Created,
            reverse: false,
        },
    ]
}

/// Stable multi-key sort with a final uid tiebreak
pub fn sort_todos(todos: &mut [Todo], keys: &[SortKey]) {
    todos.sort_by(|a, b| {
        for key in keys {
            let ord = compare_by(a, b, key.field);
            let ord = if key.reverse { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.uid.cmp(&b.uid)
    });
}

fn compare_by(a: &Todo, b: &Todo, field: SortField) -> Ordering {
    match field {
        SortField::Due => compare_dates(&a.due, &b.due),
        SortField::Priority => priority_rank(a.priority).cmp(&priority_rank(b.priority)),
        SortField::Created => match (&a.created_at, &b.created_at) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortField::Start => compare_dates(&a.start, &b.start),
        SortField::Summary => a.summary.to_lowercase().cmp(&b.summary.to_lowercase()),
        SortField::List => a.list_name.cmp(&b.list_name),
    }
}

// Absent dates sort after present ones so undated todos trail the listing.
fn compare_dates(a: &Option<DateValue>, b: &Option<DateValue>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.timestamp().cmp(&y.timestamp()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// 1 is the most important priority; 0 (none) ranks below 9.
fn priority_rank(priority: u8) -> u8 {
    if priority == 0 {
        10
    } else {
        priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn todo(uid: &str, summary: &str) -> Todo {
        let mut t = Todo::new("home");
        t.uid = uid.to_string();
        t.summary = summary.to_string();
        t
    }

    fn date(y: i32, m: u32, d: u32) -> DateValue {
        DateValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn default_statuses_hide_done_and_cancelled() {
        let filter = TodoFilter::default();
        let mut open = todo("a", "open");
        assert!(filter.matches(&open));

        open.status = Status::InProcess;
        assert!(filter.matches(&open));

        open.status = Status::Completed;
        assert!(!filter.matches(&open));

        open.status = Status::Cancelled;
        assert!(!filter.matches(&open));
    }

    #[test]
    fn explicit_statuses_override_default() {
        let filter = TodoFilter {
            statuses: Some(vec![Status::Completed]),
            ..Default::default()
        };
        let mut t = todo("a", "x");
        assert!(!filter.matches(&t));
        t.status = Status::Completed;
        assert!(filter.matches(&t));
    }

    #[test]
    fn categories_match_any_case_insensitively() {
        let filter = TodoFilter {
            categories: vec!["Work".to_string(), "urgent".to_string()],
            ..Default::default()
        };
        let mut t = todo("a", "x");
        assert!(!filter.matches(&t));
        t.categories = vec!["home".to_string(), "WORK".to_string()];
        assert!(filter.matches(&t));
    }

    #[test]
    fn grep_searches_summary_and_description() {
        let filter = TodoFilter {
            grep: Some("report".to_string()),
            ..Default::default()
        };
        let mut t = todo("a", "Write the Report");
        assert!(filter.matches(&t));
        t.summary = "other".to_string();
        assert!(!filter.matches(&t));
        t.description = "quarterly report notes".to_string();
        assert!(filter.matches(&t));
    }

    #[test]
    fn priority_floor_excludes_unprioritized() {
        let filter = TodoFilter {
            priority_at_least: Some(4),
            ..Default::default()
        };
        let mut t = todo("a", "x");
        assert!(!filter.matches(&t)); // priority 0
        t.priority = 2;
        assert!(filter.matches(&t));
        t.priority = 4;
        assert!(filter.matches(&t));
        t.priority = 5;
        assert!(!filter.matches(&t));
    }

    #[test]
    fn startable_keeps_unstarted_and_past_starts() {
        let filter = TodoFilter {
            startable: true,
            ..Default::default()
        };
        let mut t = todo("a", "x");
        assert!(filter.matches(&t));
        t.start = Some(date(2000, 1, 1));
        assert!(filter.matches(&t));
        t.start = Some(date(2999, 1, 1));
        assert!(!filter.matches(&t));
    }

    #[test]
    fn due_within_hours() {
        let filter = TodoFilter {
            due_within_hours: Some(48),
            ..Default::default()
        };
        let mut t = todo("a", "x");
        assert!(!filter.matches(&t)); // no due date
        t.due = Some(date(2000, 1, 1));
        assert!(filter.matches(&t)); // long overdue still counts
        t.due = Some(date(2999, 1, 1));
        assert!(!filter.matches(&t));
    }

    #[test]
    fn parse_sort_handles_reversal_and_rejects_unknown() {
        let keys = parse_sort("due,-priority, summary").unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0].field, SortField::Due);
        assert!(!keys[0].reverse);
        assert_eq!(keys[1].field, SortField::Priority);
        assert!(keys[1].reverse);
        assert_eq!(keys[2].field, SortField::Summary);

        assert!(parse_sort("due,bogus").is_err());
    }

    #[test]
    fn default_sort_orders_due_then_priority_then_created() {
        let mut undated = todo("c-undated", "no due");
        undated.priority = 1;

        let mut soon = todo("b-soon", "due soon");
        soon.due = Some(date(2024, 3, 1));
        soon.priority = 9;

        let mut later_high = todo("a-later", "due later, high");
        later_high.due = Some(date(2024, 4, 1));
        later_high.priority = 1;

        let mut later_low = todo("d-later", "due later, low");
        later_low.due = Some(date(2024, 4, 1));
        later_low.priority = 9;

        let mut todos = vec![
            undated.clone(),
            later_low.clone(),
            later_high.clone(),
            soon.clone(),
        ];
        sort_todos(&mut todos, &default_sort());

        let uids: Vec<_> = todos.iter().map(|t| t.uid.as_str()).collect();
        assert_eq!(uids, vec!["b-soon", "a-later", "d-later", "c-undated"]);
    }

    #[test]
    fn created_breaks_ties_then_uid() {
        let mut older = todo("z-older", "same");
        older.created_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let mut newer = todo("a-newer", "same");
        newer.created_at = Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());

        let mut todos = vec![newer.clone(), older.clone()];
        sort_todos(&mut todos, &default_sort());
        assert_eq!(todos[0].uid, "z-older");

        // Identical on every key: uid decides, deterministically.
        let mut a = todo("a", "same");
        let mut b = todo("b", "same");
        a.created_at = older.created_at;
        b.created_at = older.created_at;
        let mut todos = vec![b, a];
        sort_todos(&mut todos, &default_sort());
        assert_eq!(todos[0].uid, "a");
    }

    #[test]
    fn reversed_due_puts_undated_first() {
        let mut dated = todo("a", "dated");
        dated.due = Some(date(2024, 3, 1));
        let undated = todo("b", "undated");

        let mut todos = vec![dated.clone(), undated.clone()];
        sort_todos(
            &mut todos,
            &[SortKey {
                field: SortField::Due,
                reverse: true,
            }],
        );
        assert_eq!(todos[0].uid, "b");
    }
}
