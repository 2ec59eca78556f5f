//! RFC 5545 text layer.
//!
//! Parses icalendar content into a component tree while keeping the original
//! folded text of every property verbatim. Properties this crate does not
//! understand are carried through untouched, which is what makes the
//! read-modify write-back contract of the adapter possible.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Maximum line length before folding, per RFC 5545 §3.1.
const FOLD_WIDTH: usize = 75;

pub fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// Split a multi-valued property value on unescaped commas. An escaped
/// comma (`\,`) stays inside its value; unescaping happens per part,
/// afterwards.
pub fn split_value_list(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                current.push(ch);
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ',' => parts.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    parts.push(current);
    parts
}

pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Fold a logical line at 75 octets, not splitting multi-byte characters.
pub fn fold_line(s: &str) -> String {
    if s.len() <= FOLD_WIDTH {
        return s.to_string();
    }
    let mut result = String::new();
    let mut pos = 0;
    while pos < s.len() {
        let mut end = (pos + FOLD_WIDTH).min(s.len());
        while end < s.len() && !s.is_char_boundary(end) {
            end -= 1;
        }
        if pos > 0 {
            result.push_str("\r\n ");
        }
        result.push_str(&s[pos..end]);
        pos = end;
    }
    result
}

/// A single content line, stored with its original folded text.
///
/// `raw` never includes a trailing line terminator; internal fold breaks keep
/// whatever terminator the source used so untouched properties re-emit
/// byte-identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    raw: String,
}

impl Property {
    /// Build a property from a name and a pre-escaped value.
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            raw: fold_line(&format!("{name}:{value}")),
        }
    }

    /// Build a property carrying a single parameter.
    pub fn with_param(name: &str, param: &str, value: &str) -> Self {
        Self {
            raw: fold_line(&format!("{name};{param}:{value}")),
        }
    }

    pub(crate) fn from_raw(raw: String) -> Self {
        Self { raw }
    }

    /// The original (possibly folded) text of this line.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The logical line with fold breaks removed.
    pub fn unfolded(&self) -> String {
        let mut out = String::with_capacity(self.raw.len());
        for (i, line) in self.raw.lines().enumerate() {
            if i == 0 {
                out.push_str(line);
            } else {
                // Continuation lines drop exactly one leading space or tab.
                out.push_str(line.get(1..).unwrap_or(""));
            }
        }
        out
    }

    /// Property name, uppercased, with parameters stripped.
    pub fn name(&self) -> String {
        let logical = self.unfolded();
        let head = logical
            .split(|c| c == ':' || c == ';')
            .next()
            .unwrap_or("");
        head.trim().to_ascii_uppercase()
    }

    /// Raw value: everything after the first unquoted colon.
    pub fn value_raw(&self) -> String {
        let logical = self.unfolded();
        match split_at_value(&logical) {
            Some(idx) => logical[idx + 1..].to_string(),
            None => String::new(),
        }
    }

    /// Look up a parameter value, unquoted. Case-insensitive on the key.
    pub fn param(&self, key: &str) -> Option<String> {
        let logical = self.unfolded();
        let value_start = split_at_value(&logical)?;
        let head = &logical[..value_start];
        for part in head.split(';').skip(1) {
            let mut kv = part.splitn(2, '=');
            let k = kv.next()?.trim();
            let v = kv.next().unwrap_or("");
            if k.eq_ignore_ascii_case(key) {
                return Some(v.trim_matches('"').to_string());
            }
        }
        None
    }
}

/// Position of the colon separating the property head from its value,
/// ignoring colons inside quoted parameter values.
fn split_at_value(logical: &str) -> Option<usize> {
    let mut in_quotes = false;
    for (idx, ch) in logical.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => return Some(idx),
            _ => {}
        }
    }
    None
}

/// A calendar component: BEGIN/END block with ordered properties and
/// subcomponents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub props: Vec<Property>,
    pub children: Vec<Component>,
}

impl Component {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            props: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Parse a full calendar text into its root component.
    pub fn parse(input: &str) -> Result<Component, String> {
        let mut stack: Vec<Component> = Vec::new();
        let mut root: Option<Component> = None;

        for raw in logical_lines(input) {
            let prop = Property::from_raw(raw);
            let name = prop.name();

            if name == "BEGIN" {
                stack.push(Component::new(&prop.value_raw()));
                continue;
            }

            if name == "END" {
                let closing = prop.value_raw().trim().to_ascii_uppercase();
                let component = stack
                    .pop()
                    .ok_or_else(|| format!("END:{closing} without matching BEGIN"))?;
                if component.name != closing {
                    return Err(format!(
                        "mismatched END:{closing}, expected END:{}",
                        component.name
                    ));
                }
                match stack.last_mut() {
                    Some(parent) => parent.children.push(component),
                    None => {
                        if root.is_some() {
                            return Err("multiple top-level components".to_string());
                        }
                        root = Some(component);
                    }
                }
                continue;
            }

            match stack.last_mut() {
                Some(component) => component.props.push(prop),
                None => {
                    if prop.unfolded().trim().is_empty() {
                        continue;
                    }
                    return Err(format!("content line outside any component: {name}"));
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(format!("unterminated component {}", open.name));
        }
        root.ok_or_else(|| "no calendar component found".to_string())
    }

    /// Serialize back to icalendar text. Untouched properties re-emit their
    /// original folded text; structural lines use CRLF.
    pub fn to_ical(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        out.push_str("BEGIN:");
        out.push_str(&self.name);
        out.push_str("\r\n");
        for prop in &self.props {
            out.push_str(prop.raw());
            out.push_str("\r\n");
        }
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("END:");
        out.push_str(&self.name);
        out.push_str("\r\n");
    }

    pub fn prop(&self, name: &str) -> Option<&Property> {
        self.props.iter().find(|p| p.name() == name)
    }

    /// Remove every property with the given name.
    pub fn remove_props(&mut self, name: &str) {
        self.props.retain(|p| p.name() != name);
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components(name).next()
    }

    pub fn components<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Component> + 'a {
        let name = name.to_ascii_uppercase();
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn component_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.children.iter_mut().find(|c| c.name == name)
    }
}

/// Group physical lines into logical lines, keeping the original text of each
/// (internal fold terminators included, final terminator stripped).
fn logical_lines(input: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for chunk in input.split_inclusive('\n') {
        let content = chunk
            .strip_suffix("\r\n")
            .or_else(|| chunk.strip_suffix('\n'))
            .unwrap_or(chunk);
        let is_continuation = content.starts_with(' ') || content.starts_with('\t');
        match lines.last_mut() {
            Some(last) if is_continuation => {
                // Re-attach the terminator we stripped from the previous
                // physical line so `raw` reproduces the source folding.
                last.push_str(last_terminator(chunk, input));
                last.push_str(content);
            }
            _ if content.is_empty() => continue,
            _ => lines.push(content.to_string()),
        }
    }
    lines
}

/// The terminator that preceded `chunk` in `input`. Falls back to CRLF.
fn last_terminator<'a>(chunk: &str, input: &'a str) -> &'a str {
    let offset = chunk.as_ptr() as usize - input.as_ptr() as usize;
    if offset >= 2 && &input[offset - 2..offset] == "\r\n" {
        "\r\n"
    } else if offset >= 1 && &input[offset - 1..offset] == "\n" {
        "\n"
    } else {
        "\r\n"
    }
}

/// A DATE or DATE-TIME value, tagged with whether it carries a time component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DateValue {
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl DateValue {
    pub fn has_time(&self) -> bool {
        matches!(self, DateValue::DateTime(_))
    }

    /// Epoch seconds; dates count as local midnight so that date and
    /// date-time values compare sensibly.
    pub fn timestamp(&self) -> i64 {
        match self {
            DateValue::DateTime(dt) => dt.timestamp(),
            DateValue::Date(d) => {
                let midnight = d.and_hms_opt(0, 0, 0).unwrap_or_default();
                match Local.from_local_datetime(&midnight) {
                    chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
                        dt.timestamp()
                    }
                    chrono::LocalResult::None => midnight.and_utc().timestamp(),
                }
            }
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            DateValue::Date(d) => *d,
            DateValue::DateTime(dt) => dt.with_timezone(&Local).date_naive(),
        }
    }

    /// Render as an icalendar property value, with the parameter it needs.
    pub fn to_ical(&self) -> (Option<&'static str>, String) {
        match self {
            DateValue::Date(d) => (Some("VALUE=DATE"), d.format("%Y%m%d").to_string()),
            DateValue::DateTime(dt) => (None, dt.format("%Y%m%dT%H%M%SZ").to_string()),
        }
    }
}

impl PartialOrd for DateValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.timestamp().cmp(&other.timestamp())
    }
}

/// Parse a DATE or DATE-TIME property value.
///
/// A `VALUE=DATE` parameter or a bare 8-digit value yields a date. Date-times
/// ending in `Z` are UTC; anything else (including TZID-tagged values) is
/// interpreted in local time.
pub fn parse_date_value(prop: &Property) -> Option<DateValue> {
    let raw = prop.value_raw();
    let raw = raw.trim();

    let is_date_param = prop
        .param("VALUE")
        .map(|v| v.eq_ignore_ascii_case("DATE"))
        .unwrap_or(false);

    if is_date_param || raw.len() == 8 {
        return NaiveDate::parse_from_str(raw, "%Y%m%d").ok().map(DateValue::Date);
    }

    if let Some(stripped) = raw.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(stripped, "%Y%m%dT%H%M%S").ok()?;
        return Some(DateValue::DateTime(Utc.from_utc_datetime(&naive)));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%S").ok()?;
    let local = match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => dt,
        chrono::LocalResult::None => return None,
    };
    Some(DateValue::DateTime(local.with_timezone(&Utc)))
}

/// Render a UTC timestamp as an icalendar DATE-TIME value.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Parse a DATE-TIME-only property (DTSTAMP, CREATED, COMPLETED, ...).
pub fn parse_datetime_value(prop: &Property) -> Option<DateTime<Utc>> {
    match parse_date_value(prop)? {
        DateValue::DateTime(dt) => Some(dt),
        DateValue::Date(d) => {
            let midnight = d.and_hms_opt(0, 0, 0)?;
            Some(Utc.from_utc_datetime(&midnight))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//EN\r\nBEGIN:VTODO\r\nUID:abc-123\r\nSUMMARY:Water the plants\r\nX-FANCY-PROP;X-PARAM=1:kept verbatim\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";

    #[test]
    fn parse_and_reserialize_roundtrips() {
        let cal = Component::parse(SAMPLE).expect("parse");
        assert_eq!(cal.name, "VCALENDAR");
        assert_eq!(cal.to_ical(), SAMPLE);
    }

    #[test]
    fn folded_property_keeps_original_text() {
        let long_summary = format!("SUMMARY:{}", "x".repeat(100));
        let folded = fold_line(&long_summary);
        let text = format!("BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\n{folded}\r\nEND:VTODO\r\nEND:VCALENDAR\r\n");
        let cal = Component::parse(&text).expect("parse");
        let vtodo = cal.component("VTODO").expect("vtodo");
        let prop = vtodo.prop("SUMMARY").expect("summary");
        assert_eq!(prop.raw(), folded);
        assert_eq!(prop.value_raw(), "x".repeat(100));
        assert_eq!(cal.to_ical(), text);
    }

    #[test]
    fn lf_only_input_is_accepted() {
        let text = SAMPLE.replace("\r\n", "\n");
        let cal = Component::parse(&text).expect("parse");
        let vtodo = cal.component("VTODO").expect("vtodo");
        assert_eq!(vtodo.prop("UID").unwrap().value_raw(), "abc-123");
    }

    #[test]
    fn params_are_parsed_and_quoted_colons_ignored() {
        let prop = Property::from_raw("DUE;TZID=\"A:B\";VALUE=DATE:20240110".to_string());
        assert_eq!(prop.name(), "DUE");
        assert_eq!(prop.param("VALUE").as_deref(), Some("DATE"));
        assert_eq!(prop.param("TZID").as_deref(), Some("A:B"));
        assert_eq!(prop.value_raw(), "20240110");
    }

    #[test]
    fn date_values_parse_both_forms() {
        let date = Property::with_param("DUE", "VALUE=DATE", "20240110");
        assert_eq!(
            parse_date_value(&date),
            Some(DateValue::Date(
                NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
            ))
        );

        let dt = Property::new("DUE", "20240110T120000Z");
        match parse_date_value(&dt) {
            Some(DateValue::DateTime(parsed)) => {
                assert_eq!(format_utc(&parsed), "20240110T120000Z");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn mismatched_end_is_an_error() {
        let text = "BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nEND:VCALENDAR\r\n";
        assert!(Component::parse(text).is_err());
    }

    #[test]
    fn value_list_splits_on_unescaped_commas_only() {
        assert_eq!(
            split_value_list("work,deep\\,focus"),
            vec!["work", "deep\\,focus"]
        );
        assert_eq!(split_value_list("solo"), vec!["solo"]);
        assert_eq!(split_value_list("a,,b"), vec!["a", "", "b"]);
        // A trailing backslash swallows nothing.
        assert_eq!(split_value_list("x\\"), vec!["x\\"]);
    }

    #[test]
    fn component_lookup_accepts_short_lived_names() {
        let cal = Component::parse(SAMPLE).expect("parse");
        let name = String::from("vtodo");
        let found = cal.component(&name);
        drop(name);
        assert!(found.is_some());
        assert_eq!(cal.components("VTODO").count(), 1);
    }

    #[test]
    fn escape_roundtrip() {
        let original = "a,b;c\\d\nnew line";
        assert_eq!(unescape_text(&escape_text(original)), original);
    }

    #[test]
    fn subcomponents_survive() {
        let text = "BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nUID:u1\r\nBEGIN:VALARM\r\nTRIGGER:-PT15M\r\nEND:VALARM\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";
        let cal = Component::parse(text).expect("parse");
        assert_eq!(cal.to_ical(), text);
        let vtodo = cal.component("VTODO").unwrap();
        assert!(vtodo.component("VALARM").is_some());
    }
}
