use anyhow::Result;
use owo_colors::OwoColorize;

use calfeed_core::link::TrackingLink;

use super::open_catalog;
use crate::render::Render;

pub fn list(source_filter: Option<&str>) -> Result<()> {
    let (_, catalog) = open_catalog()?;
    let memory = catalog.memory();

    let sources: Vec<_> = match source_filter {
        Some(name) => match memory.source(name) {
            Some(source) => vec![source],
            None => anyhow::bail!("Source '{}' not found", name),
        },
        None => memory.sources().iter().collect(),
    };

    let mut shown = 0;
    for source in sources {
        let links: Vec<&TrackingLink> = memory.links_for(source.id).collect();
        if links.is_empty() {
            continue;
        }

        println!("{}", source.render());
        for link in links {
            let title = link
                .event_id
                .and_then(|id| memory.events().iter().find(|e| e.id == id))
                .map(|e| e.fields.title.as_str())
                .unwrap_or("");
            println!("   {} {}", link.render(), title);
            shown += 1;
        }
    }

    if shown == 0 {
        println!("{}", "No tracking links".dimmed());
    }

    Ok(())
}

pub fn ignore(link_id: &str) -> Result<()> {
    let (_, mut catalog) = open_catalog()?;

    let link = catalog.memory_mut().update_link(link_id, TrackingLink::ignore)?;
    catalog.save()?;

    println!("{} {}", "Ignoring".yellow(), link.render());
    Ok(())
}

pub fn reset(link_id: &str) -> Result<()> {
    let (_, mut catalog) = open_catalog()?;

    let link = catalog
        .memory_mut()
        .update_link(link_id, TrackingLink::clear_local_modifications)?;
    catalog.save()?;

    println!("{} {}", "Reset".green(), link.render());
    Ok(())
}
