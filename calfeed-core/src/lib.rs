//! Core library for calfeed.
//!
//! Parses iCalendar feeds and imports their events into a local catalog:
//! - `ics` for line unfolding, date-time resolution and the block parser
//! - `import` for the reconciliation engine that drives one import run
//! - `catalog` for the storage contracts plus in-memory and JSON-file catalogs

pub mod catalog;
pub mod config;
pub mod error;
pub mod event;
pub mod fetch;
pub mod ics;
pub mod import;
pub mod link;
pub mod source;
