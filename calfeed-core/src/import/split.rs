//! Oversized description handling.

/// Maximum description length accepted by the catalog, in characters.
pub const DEFAULT_DESCRIPTION_LIMIT: usize = 510;

/// A line break only counts as a split point past this many characters.
const MIN_BREAK: usize = 100;

/// Where to cut when the text offers no natural break.
const HARD_CUT: usize = 100;

const DETAILS_LABEL: &str = "Details:";

/// Split `text` into a description within `limit` characters and overflow content.
///
/// Text within the limit is returned untouched. Otherwise a trailing copy of
/// the item's own `url` is removed first, and the remainder is cut at the
/// best break point. The break character itself is dropped.
pub fn split_description(
    text: &str,
    url: Option<&str>,
    limit: usize,
) -> (Option<String>, Option<String>) {
    if text.chars().count() <= limit {
        return (non_empty(text.to_string()), None);
    }

    let text = match url {
        Some(url) => strip_trailing_url(text, url),
        None => text.trim(),
    };

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= limit {
        return (non_empty(text.to_string()), None);
    }

    let (cut, skip) = match find_break(&chars, limit) {
        Some(pos) => (pos, 1),
        None => (HARD_CUT.min(limit), 0),
    };

    let description: String = chars[..cut].iter().collect();
    let content: String = chars[cut + skip..].iter().collect();

    (
        non_empty(description.trim().to_string()),
        non_empty(content.trim().to_string()),
    )
}

/// Index of the break character, by priority: a line break past
/// [`MIN_BREAK`], the last sentence end, the last space.
fn find_break(chars: &[char], limit: usize) -> Option<usize> {
    let window = &chars[..=limit.min(chars.len() - 1)];

    window
        .iter()
        .enumerate()
        .skip(MIN_BREAK)
        .find(|(_, c)| **c == '\n')
        .map(|(i, _)| i)
        .or_else(|| window.iter().rposition(|c| matches!(c, '.' | '!' | '?')))
        .or_else(|| window.iter().rposition(|c| *c == ' '))
}

/// Remove a trailing `url`, optionally preceded by a `Details:` label.
pub fn strip_trailing_url<'a>(text: &'a str, url: &str) -> &'a str {
    let trimmed = text.trim();
    if url.is_empty() {
        return trimmed;
    }

    match trimmed.strip_suffix(url) {
        Some(rest) => {
            let rest = rest.trim_end();
            rest.strip_suffix(DETAILS_LABEL).unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
