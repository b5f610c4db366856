//! Property tree produced by the block parser.
//!
//! Known properties get typed accessors; everything else stays reachable
//! through the generic property map so unknown keys are carried, not rejected.

use std::collections::BTreeMap;
use std::fmt;

use crate::ics::datetime::DateTimeValue;

/// A named property parameter (`CN=Jane`, `MEMBER="a","b"`).
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub values: Vec<String>,
}

impl Parameter {
    pub fn single(name: &str, value: &str) -> Self {
        Parameter {
            name: name.to_string(),
            values: vec![value.to_string()],
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// The primary value of a property line.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    DateTime(DateTimeValue),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(text) => write!(f, "{}", text),
            PropertyValue::Integer(n) => write!(f, "{}", n),
            PropertyValue::DateTime(DateTimeValue::Utc(dt)) => write!(f, "{}", dt.to_rfc3339()),
            PropertyValue::DateTime(DateTimeValue::Zoned(dt)) => write!(f, "{}", dt.to_rfc3339()),
            PropertyValue::DateTime(DateTimeValue::Floating(dt)) => {
                write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S"))
            }
            PropertyValue::DateTime(DateTimeValue::Date(d)) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub value: PropertyValue,
    pub params: Vec<Parameter>,
}

impl Property {
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            PropertyValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn datetime(&self) -> Option<&DateTimeValue> {
        match &self.value {
            PropertyValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn integer(&self) -> Option<i64> {
        match self.value {
            PropertyValue::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// First value of the named parameter (case-insensitive name match).
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .and_then(Parameter::first)
    }
}

/// Property name -> value. A repeated key keeps its last value.
pub type PropertyMap = BTreeMap<String, Property>;

/// A `VEVENT` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventNode {
    pub properties: PropertyMap,
}

impl EventNode {
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Property::text).filter(|s| !s.is_empty())
    }

    pub fn uid(&self) -> Option<&str> {
        self.text("UID").map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn summary(&self) -> Option<&str> {
        self.text("SUMMARY")
    }

    pub fn description(&self) -> Option<&str> {
        self.text("DESCRIPTION")
    }

    pub fn location(&self) -> Option<&str> {
        self.text("LOCATION")
    }

    pub fn url(&self) -> Option<&str> {
        self.text("URL").map(str::trim)
    }

    pub fn organizer(&self) -> Option<&Property> {
        self.get("ORGANIZER")
    }

    pub fn start(&self) -> Option<&DateTimeValue> {
        self.get("DTSTART").and_then(Property::datetime)
    }

    pub fn end(&self) -> Option<&DateTimeValue> {
        self.get("DTEND").and_then(Property::datetime)
    }

    pub fn sequence(&self) -> Option<i64> {
        self.get("SEQUENCE").and_then(Property::integer)
    }
}

/// A `STANDARD` or `DAYLIGHT` sub-element of a timezone.
#[derive(Debug, Clone, PartialEq)]
pub struct Observance {
    pub kind: ObservanceKind,
    pub properties: PropertyMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservanceKind {
    Standard,
    Daylight,
}

/// A `VTIMEZONE` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimezoneNode {
    pub properties: PropertyMap,
    pub observances: Vec<Observance>,
}

impl TimezoneNode {
    pub fn tzid(&self) -> Option<&str> {
        self.properties
            .get("TZID")
            .and_then(Property::text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A `VCALENDAR` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarNode {
    pub properties: PropertyMap,
    pub events: Vec<EventNode>,
    pub timezones: BTreeMap<String, TimezoneNode>,
}

impl CalendarNode {
    pub fn name(&self) -> Option<&str> {
        self.properties.get("X-WR-CALNAME").and_then(Property::text)
    }
}

/// Any block of the tree. The parser builds one of these per open frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Calendar(CalendarNode),
    Event(EventNode),
    Timezone(TimezoneNode),
    Observance(Observance),
}

impl Node {
    pub fn properties_mut(&mut self) -> &mut PropertyMap {
        match self {
            Node::Calendar(calendar) => &mut calendar.properties,
            Node::Event(event) => &mut event.properties,
            Node::Timezone(timezone) => &mut timezone.properties,
            Node::Observance(observance) => &mut observance.properties,
        }
    }
}
