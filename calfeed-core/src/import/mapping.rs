//! Upstream event node -> local event fields.

use crate::event::EventFields;
use crate::ics::{EventNode, Property};
use crate::import::ImportContext;
use crate::import::split::split_description;

pub fn map_event(item: &EventNode, context: &ImportContext) -> EventFields {
    let url = item.url().filter(|u| !u.is_empty());

    let (description, content) = match item.description() {
        Some(text) => split_description(text, url, context.description_limit),
        None => (None, None),
    };

    EventFields {
        title: item.summary().map(str::trim).unwrap_or_default().to_string(),
        description,
        content,
        start: item.start().map(|dt| dt.to_utc(context.floating_tz)),
        end: item.end().map(|dt| dt.to_utc(context.floating_tz)),
        all_day: item.start().is_some_and(|dt| dt.is_all_day()),
        organizer: item.organizer().and_then(organizer_name),
        location: item.location().map(str::trim).map(String::from),
        external_url: url.map(String::from),
    }
}

/// The organizer's `CN`, else the address without its `mailto:` scheme.
pub fn organizer_name(organizer: &Property) -> Option<String> {
    if let Some(cn) = organizer.param("CN").map(str::trim)
        && !cn.is_empty()
    {
        return Some(cn.to_string());
    }

    let value = organizer.text()?.trim();
    let address = match value.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("mailto:") => &value[7..],
        _ => value,
    };

    if address.is_empty() { None } else { Some(address.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Actor;
    use crate::ics::parse_str;
    use chrono::{TimeZone, Utc};
    use indoc::indoc;

    fn context() -> ImportContext {
        ImportContext::new(
            Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap(),
            Actor::new("importer"),
        )
    }

    fn first_event(feed: &str) -> EventNode {
        parse_str(feed).remove(0).events.remove(0)
    }

    #[test]
    fn test_maps_all_fields() {
        let item = first_event(indoc! {"
            BEGIN:VCALENDAR
            BEGIN:VEVENT
            UID:1@test
            SUMMARY:  Board meeting
            DESCRIPTION:Agenda\\nMinutes
            LOCATION:Town hall
            ORGANIZER;CN=\"Clerk, Town\":mailto:clerk@example.com
            DTSTART;TZID=America/Denver:20250601T090000
            DTEND;TZID=America/Denver:20250601T100000
            URL:https://example.com/events/1
            END:VEVENT
            END:VCALENDAR
        "});

        let fields = map_event(&item, &context());
        assert_eq!(fields.title, "Board meeting");
        assert_eq!(fields.description.as_deref(), Some("Agenda\nMinutes"));
        assert_eq!(fields.content, None);
        assert_eq!(fields.location.as_deref(), Some("Town hall"));
        assert_eq!(fields.organizer.as_deref(), Some("Clerk, Town"));
        assert_eq!(
            fields.start,
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 15, 0, 0).unwrap())
        );
        assert_eq!(
            fields.end,
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 16, 0, 0).unwrap())
        );
        assert!(!fields.all_day);
        assert_eq!(fields.external_url.as_deref(), Some("https://example.com/events/1"));
    }

    #[test]
    fn test_organizer_without_cn_strips_mailto() {
        let item = first_event(indoc! {"
            BEGIN:VCALENDAR
            BEGIN:VEVENT
            ORGANIZER:MAILTO:events@example.com
            END:VEVENT
            END:VCALENDAR
        "});
        let fields = map_event(&item, &context());
        assert_eq!(fields.organizer.as_deref(), Some("events@example.com"));
        assert_eq!(fields.title, "");
    }

    #[test]
    fn test_floating_and_date_values_use_context_timezone() {
        let item = first_event(indoc! {"
            BEGIN:VCALENDAR
            BEGIN:VEVENT
            DTSTART;VALUE=DATE:20250704
            DTEND:20250704T180000
            END:VEVENT
            END:VCALENDAR
        "});
        let context = context().with_floating_timezone(chrono_tz::Europe::Berlin);

        let fields = map_event(&item, &context);
        assert!(fields.all_day);
        assert_eq!(
            fields.start,
            Some(Utc.with_ymd_and_hms(2025, 7, 3, 22, 0, 0).unwrap())
        );
        assert_eq!(
            fields.end,
            Some(Utc.with_ymd_and_hms(2025, 7, 4, 16, 0, 0).unwrap())
        );
    }
}
