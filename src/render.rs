//! TUI rendering traits for calfeed types.
//!
//! Extension traits that add colored terminal rendering to calfeed-core
//! types using owo_colors.

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use owo_colors::OwoColorize;

use calfeed_core::event::Event;
use calfeed_core::import::{ImportReport, SkipReason, Skipped};
use calfeed_core::link::TrackingLink;
use calfeed_core::source::Source;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Source {
    fn render(&self) -> String {
        format!("📅 {}", self.name)
    }
}

/// Events need the zone their all-day dates were anchored in.
pub trait EventRender {
    fn render(&self, floating_tz: Tz) -> String;
}

impl EventRender for Event {
    fn render(&self, floating_tz: Tz) -> String {
        let time = self
            .fields
            .start
            .map(|start| format_start(start, self.fields.all_day, floating_tz))
            .unwrap_or_default();
        let approved = if self.approved { " ✓".green().to_string() } else { String::new() };

        format!("{}{} {}", self.fields.title, approved, time.dimmed())
    }
}

impl Render for SkipReason {
    fn render(&self) -> String {
        match self {
            SkipReason::LocallyModified => self.to_string().yellow().to_string(),
            SkipReason::Invalid(_) => self.to_string().red().to_string(),
            SkipReason::Ignored | SkipReason::Unchanged => self.to_string().dimmed().to_string(),
        }
    }
}

impl Render for Skipped {
    fn render(&self) -> String {
        let title = self.item.summary().unwrap_or("(untitled)");
        let uid = self.item.uid().unwrap_or("no uid");
        format!("{} {} ({})", title, format!("[{}]", uid).dimmed(), self.reason.render())
    }
}

impl Render for TrackingLink {
    fn render(&self) -> String {
        let id = self.id.to_string();
        let short_id = &id[..8];
        let external = self.external_id.as_deref().unwrap_or("(no uid)");

        let state = if self.is_ignored() {
            "ignored".dimmed().to_string()
        } else if self.has_local_modifications {
            "locally modified".yellow().to_string()
        } else {
            "active".green().to_string()
        };

        format!(
            "{} {} {} {}",
            short_id.bold(),
            external,
            state,
            format!("sourced {}", format_ago(self.last_sourced_at)).dimmed()
        )
    }
}

/// Threshold for compact view (show counts instead of individual items)
const COMPACT_THRESHOLD: usize = 5;

/// Extended rendering for an import report
pub trait ReportRender {
    fn render(&self, verbose: bool, floating_tz: Tz) -> String;
}

impl ReportRender for ImportReport {
    fn render(&self, verbose: bool, floating_tz: Tz) -> String {
        if self.total() == 0 {
            return "   No events in feed".dimmed().to_string();
        }

        let mut lines = Vec::new();
        render_bucket(&self.created, "+", "new", verbose, floating_tz, &mut lines, |s| {
            s.green().to_string()
        });
        render_bucket(&self.updated, "~", "updated", verbose, floating_tz, &mut lines, |s| {
            s.yellow().to_string()
        });

        // Unchanged items are the common case; only list them when asked
        let skipped: Vec<&Skipped> = self
            .skipped
            .iter()
            .filter(|s| verbose || s.reason != SkipReason::Unchanged)
            .collect();
        let unchanged = self.skipped.len() - skipped.len();

        if verbose || skipped.len() <= COMPACT_THRESHOLD {
            for item in &skipped {
                lines.push(format!("   {} {}", "·".dimmed(), item.render()));
            }
        } else {
            let label = format!("({} skipped {})", skipped.len(), pluralize("event", skipped.len()));
            lines.push(format!("   {} {}", "·".dimmed(), label.dimmed()));
        }

        if unchanged > 0 {
            let label = format!("({} unchanged)", unchanged);
            lines.push(format!("   {}", label.dimmed()));
        }

        lines.join("\n")
    }
}

fn render_bucket(
    events: &[Event],
    symbol: &str,
    label: &str,
    verbose: bool,
    floating_tz: Tz,
    lines: &mut Vec<String>,
    color: impl Fn(&str) -> String,
) {
    if events.is_empty() {
        return;
    }

    if verbose || events.len() <= COMPACT_THRESHOLD {
        for event in events {
            lines.push(format!("   {} {}", color(symbol), event.render(floating_tz)));
        }
    } else {
        let text = format!("({} {} {})", events.len(), label, pluralize("event", events.len()));
        lines.push(format!("   {} {}", color(symbol), color(&text)));
    }
}

/// Simple pluralization helper
fn pluralize(word: &str, count: usize) -> String {
    if count == 1 { word.to_string() } else { format!("{}s", word) }
}

/// All-day starts are midnight in `floating_tz`, so their date is read there.
fn format_start(start: DateTime<Utc>, all_day: bool, floating_tz: Tz) -> String {
    if all_day {
        start.with_timezone(&floating_tz).format("%a %b %-d").to_string()
    } else {
        start.with_timezone(&Local).format("%a %b %-d %H:%M").to_string()
    }
}

/// "3h ago" style rendering of a past instant.
pub fn format_ago(when: DateTime<Utc>) -> String {
    let elapsed = (Utc::now() - when).to_std().unwrap_or_default();
    // Whole minutes only
    let rounded = std::time::Duration::from_secs(elapsed.as_secs() / 60 * 60);
    if rounded.is_zero() {
        "just now".to_string()
    } else {
        format!("{} ago", humantime::format_duration(rounded))
    }
}
