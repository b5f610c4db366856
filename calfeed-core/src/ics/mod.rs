//! Calendar feed parsing.
//!
//! Three layers, leaves first: [`lines`] unfolds the raw stream, [`datetime`]
//! resolves date-time tokens, and [`parse`] builds the [`tree`] from logical
//! lines. Only the event-bearing subset of RFC 5545 is handled.

pub mod datetime;
pub mod lines;
mod parse;
pub mod tree;

pub use datetime::{DateTimeValue, resolve};
pub use lines::{LineReader, logical_lines};
pub use parse::{BlockParser, parse_calendars, parse_reader, parse_str};
pub use tree::{CalendarNode, EventNode, Property, PropertyValue, TimezoneNode};
