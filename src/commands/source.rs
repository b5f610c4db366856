use anyhow::Result;
use owo_colors::OwoColorize;

use calfeed_core::source::{FetchMethod, Source};

use super::open_catalog;
use crate::render::{Render, format_ago};

pub fn add(name: &str, url: &str, method: FetchMethod, area: Option<&str>) -> Result<()> {
    let (_, mut catalog) = open_catalog()?;

    let mut source = Source::new(name, url).with_method(method);
    if let Some(area) = area {
        source = source.with_area(area);
    }

    catalog.memory_mut().add_source(source.clone())?;
    catalog.save()?;

    println!("{} Added source {}", "✓".green(), source.render());
    println!("   {}", format!("{} {} (area: {})", source.method, source.url, source.area).dimmed());
    Ok(())
}

pub fn list() -> Result<()> {
    let (_, catalog) = open_catalog()?;
    let sources = catalog.memory().sources();

    if sources.is_empty() {
        println!("{}", "No sources yet. Add one with: calfeed source add <name> <url>".dimmed());
        return Ok(());
    }

    for source in sources {
        let refreshed = source
            .last_refreshed_at
            .map(|at| format!("refreshed {}", format_ago(at)))
            .unwrap_or_else(|| "never refreshed".to_string());
        let event_count = catalog.memory().links_for(source.id).filter(|l| !l.is_ignored()).count();

        println!("{}", source.render());
        println!("   {}", source.url.dimmed());
        println!(
            "   {}",
            format!("{} events, area {}, {}", event_count, source.area, refreshed).dimmed()
        );
    }

    Ok(())
}

pub fn remove(name: &str) -> Result<()> {
    let (_, mut catalog) = open_catalog()?;

    let source = catalog.memory_mut().remove_source(name)?;
    catalog.save()?;

    println!("{} Removed source {}", "✓".green(), source.render());
    println!("   {}", "Imported events and tracking links were kept".dimmed());
    Ok(())
}
