//! Remote content API client.
//!
//! Queries a WordPress-style article API (`/wp-json/wp/v2/posts`) by
//! keyword and normalizes the results into [`ContentItem`]s: excerpt HTML
//! is stripped, embedded taxonomy terms are flattened into category and tag
//! lists. One request per query, no retries, nothing cached — a failed call
//! is this source's degraded state and the aggregator maps it to an empty
//! contribution.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::config::ContentApiConfig;
use crate::models::ContentItem;

/// Remote API page-size ceiling (the WordPress REST maximum).
pub const PER_PAGE_MAX: i64 = 100;

/// Search the remote article API by keyword.
///
/// `per_page` is clamped to 1..=[`PER_PAGE_MAX`] before the request.
pub async fn search_articles(
    api: &ContentApiConfig,
    keywords: &str,
    per_page: i64,
) -> Result<Vec<ContentItem>> {
    let per_page = clamp_per_page(per_page);
    let url = format!(
        "{}/wp-json/wp/v2/posts",
        api.base_url.trim_end_matches('/')
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(api.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let resp = client
        .get(&url)
        .query(&[
            ("search", keywords),
            ("per_page", &per_page.to_string()),
            ("_embed", "wp:term"),
        ])
        .send()
        .await
        .with_context(|| format!("Content API request failed: {}", url))?;

    if !resp.status().is_success() {
        bail!("Content API returned HTTP {}", resp.status());
    }

    let body: Value = resp
        .json()
        .await
        .context("Content API returned invalid JSON")?;

    parse_articles(&body)
}

pub fn clamp_per_page(per_page: i64) -> i64 {
    per_page.clamp(1, PER_PAGE_MAX)
}

/// Normalize a JSON array of post objects into [`ContentItem`]s.
///
/// Unparseable entries are skipped rather than failing the batch.
pub fn parse_articles(body: &Value) -> Result<Vec<ContentItem>> {
    let posts = body
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("Content API response is not a JSON array"))?;

    let mut items = Vec::new();
    for post in posts {
        let Some(id) = post.get("id").and_then(|v| v.as_i64()) else {
            continue;
        };

        let title = rendered_field(post, "title");
        let excerpt = strip_html(&rendered_field(post, "excerpt"));
        let link = post
            .get("link")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let published_at = post
            .get("date")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let (categories, tags) = embedded_terms(post);

        items.push(ContentItem {
            id,
            title,
            link,
            excerpt,
            published_at,
            categories,
            tags,
        });
    }

    Ok(items)
}

/// Pull `field.rendered` out of a post object, tolerating plain strings.
fn rendered_field(post: &Value, field: &str) -> String {
    match post.get(field) {
        Some(Value::Object(obj)) => obj
            .get("rendered")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Flatten `_embedded["wp:term"]` into (categories, tags).
///
/// The embed is an array of term groups; each term carries a `taxonomy`
/// discriminator.
fn embedded_terms(post: &Value) -> (Vec<String>, Vec<String>) {
    let mut categories = Vec::new();
    let mut tags = Vec::new();

    let groups = post
        .get("_embedded")
        .and_then(|e| e.get("wp:term"))
        .and_then(|t| t.as_array());

    if let Some(groups) = groups {
        for group in groups {
            let Some(terms) = group.as_array() else {
                continue;
            };
            for term in terms {
                let Some(name) = term.get("name").and_then(|n| n.as_str()) else {
                    continue;
                };
                match term.get("taxonomy").and_then(|t| t.as_str()) {
                    Some("category") => categories.push(name.to_string()),
                    Some("post_tag") => tags.push(name.to_string()),
                    _ => {}
                }
            }
        }
    }

    (categories, tags)
}

/// Strip HTML tags and decode the handful of entities WordPress excerpts
/// actually contain, then collapse surrounding whitespace.
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;

    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }

    out.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#8217;", "'")
        .replace("&hellip;", "...")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_posts() -> Value {
        json!([
            {
                "id": 101,
                "date": "2024-11-02T09:30:00",
                "link": "https://example.com/posts/release-notes",
                "title": { "rendered": "Release Notes" },
                "excerpt": { "rendered": "<p>What shipped this&nbsp;week&hellip;</p>\n" },
                "_embedded": {
                    "wp:term": [
                        [
                            { "taxonomy": "category", "name": "Engineering" },
                            { "taxonomy": "category", "name": "Releases" }
                        ],
                        [
                            { "taxonomy": "post_tag", "name": "changelog" }
                        ]
                    ]
                }
            },
            {
                "id": 102,
                "title": { "rendered": "Bare Post" },
                "excerpt": { "rendered": "" }
            },
            { "not_a_post": true }
        ])
    }

    #[test]
    fn test_parse_articles_normalizes() {
        let items = parse_articles(&sample_posts()).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.id, 101);
        assert_eq!(first.title, "Release Notes");
        assert_eq!(first.excerpt, "What shipped this week...");
        assert_eq!(first.categories, vec!["Engineering", "Releases"]);
        assert_eq!(first.tags, vec!["changelog"]);
        assert_eq!(first.published_at.as_deref(), Some("2024-11-02T09:30:00"));

        let second = &items[1];
        assert!(second.categories.is_empty());
        assert!(second.excerpt.is_empty());
    }

    #[test]
    fn test_parse_articles_rejects_non_array() {
        assert!(parse_articles(&json!({"error": "nope"})).is_err());
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Hello <strong>world</strong></p>\n  "),
            "Hello world"
        );
        assert_eq!(strip_html("a &amp; b"), "a & b");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_clamp_per_page() {
        assert_eq!(clamp_per_page(0), 1);
        assert_eq!(clamp_per_page(-3), 1);
        assert_eq!(clamp_per_page(10), 10);
        assert_eq!(clamp_per_page(500), PER_PAGE_MAX);
    }
}
