use anyhow::Result;
use owo_colors::OwoColorize;

use super::open_catalog;
use crate::render::EventRender;

pub fn run() -> Result<()> {
    let (config, catalog) = open_catalog()?;
    let floating_tz = config.floating_timezone()?;

    let mut events: Vec<_> = catalog.memory().events().iter().collect();
    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    events.sort_by_key(|e| e.fields.start);

    for event in events {
        let status = if event.approved { "" } else { " (pending approval)" };
        println!("  {}{}", event.render(floating_tz), status.dimmed());
        if let Some(location) = &event.fields.location {
            println!("    {}", location.dimmed());
        }
    }

    Ok(())
}
