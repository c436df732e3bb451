//! Markdown metadata extraction.
//!
//! Pulls `{title, description, tags}` out of one raw Markdown document.
//! Documents with a leading front-matter block get exact values from the
//! block; everything else falls back to heuristics (first heading, first
//! paragraph). Parsing never fails — malformed front matter silently
//! degrades to the heuristic path and missing fields stay unfilled.

use crate::models::ParsedDoc;

/// Upper bound on stored descriptions, in characters.
const DESCRIPTION_MAX: usize = 200;

/// Extract metadata from raw Markdown text.
pub fn parse_markdown(text: &str) -> ParsedDoc {
    let mut doc = match parse_front_matter(text) {
        Some(doc) => doc,
        None => parse_heuristic(text),
    };
    doc.description = doc.description.map(|d| truncate_chars(&d, DESCRIPTION_MAX));
    doc
}

/// Parse a leading `---` fenced block of flat `key: value` lines.
///
/// Returns `None` when the block is absent or unterminated, which sends the
/// document down the heuristic path.
fn parse_front_matter(text: &str) -> Option<ParsedDoc> {
    let mut lines = text.lines();
    if lines.next()?.trim_end() != "---" {
        return None;
    }

    let mut doc = ParsedDoc::default();
    let mut closed = false;

    for line in lines {
        if line.trim_end() == "---" {
            closed = true;
            break;
        }
        let Some((raw_key, raw_value)) = line.split_once(':') else {
            continue;
        };
        let value = raw_value.trim();
        match raw_key.trim().to_ascii_lowercase().as_str() {
            "title" => {
                let title = strip_quotes(value);
                if !title.is_empty() {
                    doc.title = Some(title.to_string());
                }
            }
            "description" => {
                let description = strip_quotes(value);
                if !description.is_empty() {
                    doc.description = Some(description.to_string());
                }
            }
            "tags" => doc.tags = parse_tag_list(value),
            _ => {}
        }
    }

    if closed {
        Some(doc)
    } else {
        None
    }
}

/// Heuristic extraction: first heading line as title, first
/// blank-line-delimited paragraph after it as description.
fn parse_heuristic(text: &str) -> ParsedDoc {
    let mut doc = ParsedDoc::default();
    let mut body_start = 0;

    for (i, line) in text.lines().enumerate() {
        if line.starts_with('#') {
            let title = line.trim_start_matches('#').trim();
            if !title.is_empty() {
                doc.title = Some(title.to_string());
                body_start = i + 1;
            }
            break;
        }
    }

    doc.description = first_paragraph(text.lines().skip(body_start));
    doc
}

/// The first run of consecutive non-blank, non-heading lines, joined with
/// single spaces.
fn first_paragraph<'a>(lines: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut collected: Vec<&str> = Vec::new();

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if collected.is_empty() {
                continue;
            }
            break;
        }
        if trimmed.starts_with('#') {
            if collected.is_empty() {
                continue;
            }
            break;
        }
        collected.push(trimmed);
    }

    if collected.is_empty() {
        None
    } else {
        Some(collected.join(" "))
    }
}

/// Parse a bracketed, comma-separated tag list: `[rust, "sqlite", mcp]`.
fn parse_tag_list(value: &str) -> Vec<String> {
    let inner = value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']');

    inner
        .split(',')
        .map(|t| strip_quotes(t.trim()).to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Strip one matching pair of surrounding single or double quotes.
fn strip_quotes(value: &str) -> &str {
    let v = value.trim();
    if v.len() >= 2
        && ((v.starts_with('"') && v.ends_with('"'))
            || (v.starts_with('\'') && v.ends_with('\'')))
    {
        &v[1..v.len() - 1]
    } else {
        v
    }
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
