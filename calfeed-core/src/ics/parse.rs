//! Block parser: logical lines -> property tree.
//!
//! An explicit state machine over [`FrameKind`] with an explicit stack. Blocks
//! the grammar does not recognize (including recognized names in the wrong
//! place) are skipped wholesale, so unknown components never fail a feed.

use std::io::BufRead;

use crate::ics::datetime::resolve_with_params;
use crate::ics::lines::LineReader;
use crate::ics::tree::{
    CalendarNode, EventNode, Node, Observance, ObservanceKind, Parameter, Property, PropertyValue,
    TimezoneNode,
};

/// Properties whose values go through the date-time resolver.
const DATE_PROPERTIES: &[&str] = &[
    "DTSTART",
    "DTEND",
    "DTSTAMP",
    "CREATED",
    "LAST-MODIFIED",
    "RECURRENCE-ID",
];

const INTEGER_PROPERTY: &str = "SEQUENCE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Calendar,
    Event,
    Timezone,
    Observance(ObservanceKind),
}

impl FrameKind {
    /// Classify a `BEGIN:` name given the kind of the enclosing frame.
    fn open(name: &str, parent: Option<FrameKind>) -> Option<FrameKind> {
        let kind = match name {
            "VCALENDAR" => FrameKind::Calendar,
            "VEVENT" => FrameKind::Event,
            "VTIMEZONE" => FrameKind::Timezone,
            "STANDARD" => FrameKind::Observance(ObservanceKind::Standard),
            "DAYLIGHT" => FrameKind::Observance(ObservanceKind::Daylight),
            _ => return None,
        };

        let allowed = match kind {
            FrameKind::Calendar => parent.is_none(),
            FrameKind::Event | FrameKind::Timezone => parent == Some(FrameKind::Calendar),
            FrameKind::Observance(_) => parent == Some(FrameKind::Timezone),
        };

        allowed.then_some(kind)
    }

    fn name(self) -> &'static str {
        match self {
            FrameKind::Calendar => "VCALENDAR",
            FrameKind::Event => "VEVENT",
            FrameKind::Timezone => "VTIMEZONE",
            FrameKind::Observance(ObservanceKind::Standard) => "STANDARD",
            FrameKind::Observance(ObservanceKind::Daylight) => "DAYLIGHT",
        }
    }

    fn empty_node(self) -> Node {
        match self {
            FrameKind::Calendar => Node::Calendar(CalendarNode::default()),
            FrameKind::Event => Node::Event(EventNode::default()),
            FrameKind::Timezone => Node::Timezone(TimezoneNode::default()),
            FrameKind::Observance(kind) => Node::Observance(Observance {
                kind,
                properties: Default::default(),
            }),
        }
    }
}

struct Frame {
    kind: FrameKind,
    node: Node,
}

/// Discarding an unrecognized block until its matching END.
struct Skip {
    name: String,
    depth: usize,
}

enum Marker {
    Begin(String),
    End(String),
}

/// Incremental parser; feed it logical lines, then call [`BlockParser::finish`].
#[derive(Default)]
pub struct BlockParser {
    stack: Vec<Frame>,
    skip: Option<Skip>,
    calendars: Vec<CalendarNode>,
}

impl BlockParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed_line(&mut self, line: &str) {
        let marker = block_marker(line);

        if let Some(skip) = &mut self.skip {
            match marker {
                Some(Marker::Begin(name)) if name == skip.name => skip.depth += 1,
                Some(Marker::End(name)) if name == skip.name => {
                    skip.depth -= 1;
                    if skip.depth == 0 {
                        self.skip = None;
                    }
                }
                _ => {}
            }
            return;
        }

        match marker {
            Some(Marker::Begin(name)) => self.open(name),
            Some(Marker::End(name)) => self.close(&name),
            None => {
                // Lines outside any calendar are discarded
                if let Some(frame) = self.stack.last_mut()
                    && let Some((key, property)) = parse_property_line(line)
                {
                    frame.node.properties_mut().insert(key, property);
                }
            }
        }
    }

    fn open(&mut self, name: String) {
        let parent = self.stack.last().map(|f| f.kind);

        match FrameKind::open(&name, parent) {
            Some(kind) => self.stack.push(Frame {
                kind,
                node: kind.empty_node(),
            }),
            None => {
                tracing::debug!(block = %name, "skipping unrecognized block");
                self.skip = Some(Skip { name, depth: 1 });
            }
        }
    }

    fn close(&mut self, name: &str) {
        let Some(pos) = self.stack.iter().rposition(|f| f.kind.name() == name) else {
            tracing::debug!(block = %name, "ignoring END without matching BEGIN");
            return;
        };

        let unclosed = self.stack.len() - pos - 1;
        if unclosed > 0 {
            tracing::warn!(block = %name, unclosed, "discarding blocks closed by an outer END");
        }
        self.stack.truncate(pos + 1);

        if let Some(frame) = self.stack.pop() {
            self.attach(frame.node);
        }
    }

    fn attach(&mut self, node: Node) {
        let parent = self.stack.last_mut().map(|f| &mut f.node);

        match (node, parent) {
            (Node::Calendar(calendar), None) => self.calendars.push(calendar),
            (Node::Event(event), Some(Node::Calendar(calendar))) => calendar.events.push(event),
            (Node::Timezone(timezone), Some(Node::Calendar(calendar))) => {
                match timezone.tzid().map(str::to_string) {
                    Some(tzid) => {
                        calendar.timezones.insert(tzid, timezone);
                    }
                    None => tracing::warn!("dropping VTIMEZONE without TZID"),
                }
            }
            (Node::Observance(observance), Some(Node::Timezone(timezone))) => {
                timezone.observances.push(observance)
            }
            // FrameKind::open only admits the pairs above
            _ => {}
        }
    }

    /// Close out the stream. Frames still open are closed innermost-first and
    /// attached, so a truncated feed yields a shallower tree.
    pub fn finish(mut self) -> Vec<CalendarNode> {
        if !self.stack.is_empty() {
            let open: Vec<&str> = self.stack.iter().map(|f| f.kind.name()).collect();
            tracing::warn!(open = ?open, "feed ended with unclosed blocks");
        }
        while let Some(frame) = self.stack.pop() {
            self.attach(frame.node);
        }
        self.calendars
    }
}

/// Parse every calendar from a sequence of logical lines.
pub fn parse_calendars<I, S>(lines: I) -> Vec<CalendarNode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = BlockParser::new();
    for line in lines {
        parser.feed_line(line.as_ref());
    }
    parser.finish()
}

/// Unfold and parse a feed stream.
pub fn parse_reader<R: BufRead>(reader: R) -> Vec<CalendarNode> {
    parse_calendars(LineReader::new(reader))
}

pub fn parse_str(content: &str) -> Vec<CalendarNode> {
    parse_reader(content.as_bytes())
}

/// Recognize `BEGIN:NAME` / `END:NAME` lines. Names are compared uppercase.
fn block_marker(line: &str) -> Option<Marker> {
    let (key, value) = line.split_once(':')?;
    let name = value.trim().to_ascii_uppercase();
    if name.is_empty() {
        return None;
    }

    if key.trim().eq_ignore_ascii_case("BEGIN") {
        Some(Marker::Begin(name))
    } else if key.trim().eq_ignore_ascii_case("END") {
        Some(Marker::End(name))
    } else {
        None
    }
}

/// Parse `NAME[;PARAM=VALUE[,VALUE]]*:VALUE` into a property.
fn parse_property_line(line: &str) -> Option<(String, Property)> {
    let colon = find_unquoted(line, ':')?;
    let head = &line[..colon];
    let raw_value = &line[colon + 1..];

    let mut segments = split_unquoted(head, ';').into_iter();
    let name = segments.next()?.trim().to_ascii_uppercase();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }

    let params: Vec<Parameter> = segments.filter_map(parse_parameter).collect();

    let value = if DATE_PROPERTIES.contains(&name.as_str()) {
        match resolve_with_params(&params, raw_value) {
            Some(dt) => PropertyValue::DateTime(dt),
            None => PropertyValue::Text(unescape_value(raw_value)),
        }
    } else if name == INTEGER_PROPERTY {
        match raw_value.trim().parse::<i64>() {
            Ok(n) => PropertyValue::Integer(n),
            Err(_) => PropertyValue::Text(unescape_value(raw_value)),
        }
    } else {
        PropertyValue::Text(unescape_value(raw_value))
    };

    Some((name, Property { value, params }))
}

fn parse_parameter(segment: &str) -> Option<Parameter> {
    let (name, values) = segment.split_once('=')?;
    let name = name.trim().to_ascii_uppercase();
    if name.is_empty() {
        return None;
    }

    let values = split_unquoted(values, ',')
        .into_iter()
        .map(|v| v.trim().trim_matches('"').to_string())
        .collect();

    Some(Parameter { name, values })
}

/// Byte index of the first `needle` outside double quotes.
fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c == needle && !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

fn split_unquoted(s: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(i) = find_unquoted(rest, separator) {
        parts.push(&rest[..i]);
        rest = &rest[i + separator.len_utf8()..];
    }
    parts.push(rest);
    parts
}

/// Reverse text escaping: `\n`/`\N` -> newline, `\t` -> tab, `\x` -> `x`.
fn unescape_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::datetime::DateTimeValue;
    use chrono::{TimeZone, Utc};
    use indoc::indoc;

    const FEED: &str = indoc! {r#"
        BEGIN:VCALENDAR
        VERSION:2.0
        X-WR-CALNAME:Town events
        BEGIN:VTIMEZONE
        TZID:America/Denver
        BEGIN:STANDARD
        DTSTART:19701101T020000
        TZOFFSETFROM:-0600
        TZOFFSETTO:-0700
        END:STANDARD
        BEGIN:DAYLIGHT
        DTSTART:19700308T020000
        TZOFFSETFROM:-0700
        TZOFFSETTO:-0600
        END:DAYLIGHT
        END:VTIMEZONE
        BEGIN:VEVENT
        UID:1@test
        SUMMARY:Farmers market
        DTSTART;TZID=America/Denver:20250601T090000
        DTEND;TZID=America/Denver:20250601T130000
        SEQUENCE:3
        BEGIN:VALARM
        TRIGGER:-PT15M
        SUMMARY:Alarm summary must not leak
        END:VALARM
        LOCATION:Main St
        END:VEVENT
        BEGIN:VEVENT
        UID:2@test
        SUMMARY:Council meeting
        DTSTART:20250115T190000Z
        END:VEVENT
        END:VCALENDAR
    "#};

    #[test]
    fn test_parse_calendar_with_events_and_timezone() {
        let calendars = parse_str(FEED);
        assert_eq!(calendars.len(), 1);

        let calendar = &calendars[0];
        assert_eq!(calendar.name(), Some("Town events"));
        assert_eq!(calendar.events.len(), 2);

        let first = &calendar.events[0];
        assert_eq!(first.uid(), Some("1@test"));
        assert_eq!(first.summary(), Some("Farmers market"));
        assert_eq!(first.location(), Some("Main St"));
        assert_eq!(first.sequence(), Some(3));
        assert!(first.get("TRIGGER").is_none());
        assert_eq!(
            first.start().map(|dt| dt.to_utc(chrono_tz::Tz::UTC)),
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 15, 0, 0).unwrap())
        );

        assert_eq!(calendar.events[1].uid(), Some("2@test"));

        let timezone = &calendar.timezones["America/Denver"];
        assert_eq!(timezone.observances.len(), 2);
        assert_eq!(timezone.observances[0].kind, ObservanceKind::Standard);
        assert!(matches!(
            timezone.observances[1].properties["DTSTART"].value,
            PropertyValue::DateTime(DateTimeValue::Floating(_))
        ));
    }

    #[test]
    fn test_folded_and_crlf_input() {
        let feed = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:1\r\nSUMMARY:Hello\r\n  World\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let calendars = parse_str(feed);
        assert_eq!(calendars[0].events[0].summary(), Some("Hello World"));
    }

    #[test]
    fn test_unknown_blocks_are_skipped_including_nested_same_name() {
        let feed = indoc! {"
            BEGIN:VCALENDAR
            BEGIN:X-WIDGET
            BEGIN:X-WIDGET
            UID:inner
            END:X-WIDGET
            BEGIN:VEVENT
            UID:hidden
            END:VEVENT
            END:X-WIDGET
            BEGIN:VFREEBUSY
            UID:busy
            END:VFREEBUSY
            BEGIN:VEVENT
            UID:visible
            END:VEVENT
            END:VCALENDAR
        "};
        let calendars = parse_str(feed);
        let uids: Vec<_> = calendars[0].events.iter().filter_map(|e| e.uid()).collect();
        assert_eq!(uids, vec!["visible"]);
    }

    #[test]
    fn test_lines_outside_calendar_are_discarded() {
        let feed = indoc! {"
            SUMMARY:stray
            BEGIN:VEVENT
            UID:top-level
            END:VEVENT
            BEGIN:VCALENDAR
            BEGIN:VEVENT
            UID:a
            END:VEVENT
            END:VCALENDAR
            BEGIN:VCALENDAR
            BEGIN:VEVENT
            UID:b
            END:VEVENT
            END:VCALENDAR
        "};
        let calendars = parse_str(feed);
        assert_eq!(calendars.len(), 2);
        assert_eq!(calendars[0].events[0].uid(), Some("a"));
        assert_eq!(calendars[1].events[0].uid(), Some("b"));
        assert!(calendars[0].properties.is_empty());
    }

    #[test]
    fn test_truncated_feed_keeps_complete_events() {
        let calendars = parse_str("BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:complete\nEND:VEVENT\n");
        assert_eq!(calendars.len(), 1);
        assert_eq!(calendars[0].events[0].uid(), Some("complete"));

        // Implicitly closed at end of stream, innermost first
        let feed = indoc! {"
            BEGIN:VCALENDAR
            X-WR-CALNAME:Town
            BEGIN:VEVENT
            UID:complete
            END:VEVENT
            BEGIN:VEVENT
            UID:truncated
        "};
        let calendars = parse_str(feed);
        assert_eq!(calendars.len(), 1);
        assert_eq!(calendars[0].name(), Some("Town"));
        let uids: Vec<_> = calendars[0].events.iter().filter_map(|e| e.uid()).collect();
        assert_eq!(uids, vec!["complete", "truncated"]);

        // An outer END still discards the frames it closes over
        let feed = indoc! {"
            BEGIN:VCALENDAR
            BEGIN:VEVENT
            UID:complete
            END:VEVENT
            BEGIN:VEVENT
            UID:truncated
            END:VCALENDAR
        "};
        let calendars = parse_str(feed);
        let uids: Vec<_> = calendars[0].events.iter().filter_map(|e| e.uid()).collect();
        assert_eq!(uids, vec!["complete"]);
    }

    #[test]
    fn test_stray_end_and_malformed_lines_are_ignored() {
        let feed = indoc! {"
            BEGIN:VCALENDAR
            END:VTODO
            BEGIN:VEVENT
            this line has no colon
            :empty key
            BAD KEY:value
            UID:ok
            END:VEVENT
            END:VCALENDAR
        "};
        let calendars = parse_str(feed);
        let event = &calendars[0].events[0];
        assert_eq!(event.uid(), Some("ok"));
        assert_eq!(event.properties.len(), 1);
    }

    #[test]
    fn test_timezone_without_tzid_is_dropped() {
        let feed = indoc! {"
            BEGIN:VCALENDAR
            BEGIN:VTIMEZONE
            X-LIC-LOCATION:Nowhere
            END:VTIMEZONE
            END:VCALENDAR
        "};
        assert!(parse_str(feed)[0].timezones.is_empty());
    }

    #[test]
    fn test_parameters_quoted_and_multi_valued() {
        let (name, property) = parse_property_line(
            r#"ORGANIZER;CN="Doe, Jane: Events";DELEGATED-TO="mailto:a@x.org","mailto:b@x.org":mailto:jane@example.com"#,
        )
        .unwrap();
        assert_eq!(name, "ORGANIZER");
        assert_eq!(property.text(), Some("mailto:jane@example.com"));
        assert_eq!(property.param("cn"), Some("Doe, Jane: Events"));
        assert_eq!(
            property.params[1].values,
            vec!["mailto:a@x.org".to_string(), "mailto:b@x.org".to_string()]
        );
    }

    #[test]
    fn test_values_are_unescaped() {
        let (_, property) =
            parse_property_line(r"DESCRIPTION:Line one\nLine two\, with comma\;\ttab \\ done\Q").unwrap();
        assert_eq!(
            property.text(),
            Some("Line one\nLine two, with comma;\ttab \\ doneQ")
        );
    }

    #[test]
    fn test_sequence_and_date_coercion_fallbacks() {
        let (_, seq) = parse_property_line("SEQUENCE:not-a-number").unwrap();
        assert_eq!(seq.text(), Some("not-a-number"));

        let (_, start) = parse_property_line("DTSTART:someday").unwrap();
        assert_eq!(start.text(), Some("someday"));

        let (_, stamp) = parse_property_line("dtstamp:20250101T000000Z").unwrap();
        assert_eq!(
            stamp.datetime(),
            Some(&DateTimeValue::Utc(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_duplicate_keys_keep_last_value() {
        let calendars = parse_calendars([
            "BEGIN:VCALENDAR",
            "BEGIN:VEVENT",
            "SUMMARY:first",
            "SUMMARY:second",
            "END:VEVENT",
            "END:VCALENDAR",
        ]);
        assert_eq!(calendars[0].events[0].summary(), Some("second"));
    }
}
