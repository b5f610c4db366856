use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use calfeed_core::ics::{PropertyValue, parse_reader};

pub fn run(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
    let calendars = parse_reader(BufReader::new(file));

    if calendars.is_empty() {
        println!("{}", "No calendars found in file".yellow());
        return Ok(());
    }

    for (i, calendar) in calendars.iter().enumerate() {
        let name = calendar.name().unwrap_or("(unnamed)");
        println!("📅 {} {}", name.bold(), format!("calendar {}", i + 1).dimmed());

        if !calendar.timezones.is_empty() {
            let tzids: Vec<&str> = calendar.timezones.keys().map(String::as_str).collect();
            println!("   {} {}", "timezones:".dimmed(), tzids.join(", "));
        }

        println!("   {} {}", "events:".dimmed(), calendar.events.len());
        for event in &calendar.events {
            let summary = event.summary().unwrap_or("(no summary)");
            let uid = event.uid().unwrap_or("(no uid)");
            let start = event
                .get("DTSTART")
                .map(|p| match &p.value {
                    PropertyValue::Text(raw) => format!("unparsed '{}'", raw),
                    value => value.to_string(),
                })
                .unwrap_or_else(|| "no start".to_string());

            println!("   - {} {} {}", summary, start.dimmed(), format!("[{}]", uid).dimmed());
        }
    }

    Ok(())
}
