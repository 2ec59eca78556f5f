//! Icalendar record adapter: VTODO components <-> [`Todo`] records.
//!
//! Serialization is read-modify write-back: the caller hands over the current
//! on-disk bytes, and only the properties this system owns are rewritten.
//! Every other property and subcomponent is re-emitted verbatim.

use std::path::Path;

use crate::error::{Error, Result};
use crate::ical::{
    escape_text, format_utc, parse_date_value, parse_datetime_value, split_value_list,
    unescape_text, Component, Property,
};
use crate::todo::{Status, Todo};

/// Properties overwritten on every save. Anything else is preserved.
const OWNED_PROPS: [&str; 16] = [
    "UID",
    "SUMMARY",
    "DESCRIPTION",
    "LOCATION",
    "STATUS",
    "PRIORITY",
    "PERCENT-COMPLETE",
    "CATEGORIES",
    "DTSTART",
    "DUE",
    "COMPLETED",
    "CREATED",
    "DTSTAMP",
    "LAST-MODIFIED",
    "SEQUENCE",
    "RRULE",
];

const PRODID: &str = "-//vido//EN";

/// Result of parsing one calendar file.
#[derive(Debug)]
pub struct ParsedFile {
    pub todo: Todo,
    /// Number of VTODO components found. More than one marks the file
    /// read-only.
    pub vtodo_count: usize,
}

/// Parse calendar text into a todo record.
///
/// Fails when the calendar structure is invalid, no VTODO component is
/// present, or the VTODO carries no UID. `path` is only used for error
/// reporting; the caller fills in list name and filename.
pub fn parse(text: &str, path: &Path) -> Result<ParsedFile> {
    let cal = Component::parse(text).map_err(|message| Error::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    let vtodo_count = cal.components("VTODO").count();
    let vtodo = cal.component("VTODO").ok_or_else(|| Error::Parse {
        path: path.to_path_buf(),
        message: "no VTODO component".to_string(),
    })?;

    let uid = vtodo
        .prop("UID")
        .map(|p| p.value_raw().trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::Parse {
            path: path.to_path_buf(),
            message: "VTODO has no UID".to_string(),
        })?;

    let text_of = |name: &str| {
        vtodo
            .prop(name)
            .map(|p| unescape_text(&p.value_raw()))
            .unwrap_or_default()
    };

    let mut categories = Vec::new();
    for prop in vtodo.props.iter().filter(|p| p.name() == "CATEGORIES") {
        for part in split_value_list(&prop.value_raw()) {
            let category = unescape_text(&part).trim().to_string();
            if !category.is_empty() && !categories.contains(&category) {
                categories.push(category);
            }
        }
    }

    let status = vtodo
        .prop("STATUS")
        .and_then(|p| Status::parse(&p.value_raw()).ok())
        .unwrap_or(Status::NeedsAction);

    let int_of = |name: &str| -> u32 {
        vtodo
            .prop(name)
            .and_then(|p| p.value_raw().trim().parse::<u32>().ok())
            .unwrap_or(0)
    };

    let todo = Todo {
        uid,
        summary: text_of("SUMMARY"),
        description: text_of("DESCRIPTION"),
        location: text_of("LOCATION"),
        status,
        priority: int_of("PRIORITY").min(9) as u8,
        percent_complete: int_of("PERCENT-COMPLETE").min(100) as u8,
        categories,
        start: vtodo.prop("DTSTART").and_then(parse_date_value),
        due: vtodo.prop("DUE").and_then(parse_date_value),
        completed_at: vtodo.prop("COMPLETED").and_then(parse_datetime_value),
        created_at: vtodo.prop("CREATED").and_then(parse_datetime_value),
        dtstamp: vtodo.prop("DTSTAMP").and_then(parse_datetime_value),
        last_modified: vtodo.prop("LAST-MODIFIED").and_then(parse_datetime_value),
        sequence: int_of("SEQUENCE"),
        rrule: vtodo
            .prop("RRULE")
            .map(|p| p.value_raw().trim().to_string())
            .unwrap_or_default(),
        filename: String::new(),
        list_name: String::new(),
        id: None,
    };

    Ok(ParsedFile { todo, vtodo_count })
}

/// Serialize a todo, merging into `existing` calendar bytes when given.
///
/// With existing bytes the current on-disk VTODO is located (by UID, falling
/// back to the first one) and only the owned properties are replaced; all
/// other properties keep their original text. Without existing bytes a fresh
/// VCALENDAR is produced.
pub fn serialize(existing: Option<&str>, todo: &Todo, path: &Path) -> Result<String> {
    let cal = match existing {
        Some(text) => {
            let mut cal = Component::parse(text).map_err(|message| Error::Parse {
                path: path.to_path_buf(),
                message,
            })?;
            let vtodo = find_vtodo_mut(&mut cal, &todo.uid).ok_or_else(|| Error::Parse {
                path: path.to_path_buf(),
                message: "no VTODO component".to_string(),
            })?;
            merge_owned(vtodo, todo);
            cal
        }
        None => {
            let mut cal = Component::new("VCALENDAR");
            cal.props.push(Property::new("VERSION", "2.0"));
            cal.props.push(Property::new("PRODID", PRODID));
            let mut vtodo = Component::new("VTODO");
            merge_owned(&mut vtodo, todo);
            cal.children.push(vtodo);
            cal
        }
    };
    Ok(cal.to_ical())
}

fn find_vtodo_mut<'a>(cal: &'a mut Component, uid: &str) -> Option<&'a mut Component> {
    let index = cal
        .children
        .iter()
        .position(|c| {
            c.name == "VTODO"
                && c.prop("UID")
                    .map(|p| p.value_raw().trim() == uid)
                    .unwrap_or(false)
        })
        .or_else(|| cal.children.iter().position(|c| c.name == "VTODO"))?;
    cal.children.get_mut(index)
}

/// Replace the owned properties of a VTODO with the record's current values.
/// Preserved properties keep their position and original text.
fn merge_owned(vtodo: &mut Component, todo: &Todo) {
    vtodo
        .props
        .retain(|p| !OWNED_PROPS.contains(&p.name().as_str()));

    let mut push = |prop: Property| vtodo.props.push(prop);

    push(Property::new("UID", &todo.uid));
    push(Property::new("SUMMARY", &escape_text(&todo.summary)));
    if !todo.description.is_empty() {
        push(Property::new("DESCRIPTION", &escape_text(&todo.description)));
    }
    if !todo.location.is_empty() {
        push(Property::new("LOCATION", &escape_text(&todo.location)));
    }
    push(Property::new("STATUS", todo.status.as_str()));
    if todo.priority > 0 {
        push(Property::new("PRIORITY", &todo.priority.to_string()));
    }
    if todo.percent_complete > 0 {
        push(Property::new(
            "PERCENT-COMPLETE",
            &todo.percent_complete.to_string(),
        ));
    }
    if !todo.categories.is_empty() {
        let joined = todo
            .categories
            .iter()
            .map(|c| escape_text(c))
            .collect::<Vec<_>>()
            .join(",");
        push(Property::new("CATEGORIES", &joined));
    }
    for (name, value) in [("DTSTART", &todo.start), ("DUE", &todo.due)] {
        if let Some(dv) = value {
            let (param, rendered) = dv.to_ical();
            push(match param {
                Some(param) => Property::with_param(name, param, &rendered),
                None => Property::new(name, &rendered),
            });
        }
    }
    for (name, value) in [
        ("COMPLETED", &todo.completed_at),
        ("CREATED", &todo.created_at),
        ("DTSTAMP", &todo.dtstamp),
        ("LAST-MODIFIED", &todo.last_modified),
    ] {
        if let Some(dt) = value {
            push(Property::new(name, &format_utc(dt)));
        }
    }
    if todo.sequence > 0 {
        push(Property::new("SEQUENCE", &todo.sequence.to_string()));
    }
    if !todo.rrule.is_empty() {
        push(Property::new("RRULE", &todo.rrule));
    }
}
