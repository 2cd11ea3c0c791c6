//! Whole-site artifacts: `sitemap.xml` and `rss.xml`.
//!
//! Both are derived from the front matter of every scanned page and written
//! once, after all pages render, and only when the build changed something.
//! Pages marked `draft` are left out of both.
//!
//! | Front matter key | Sitemap     | Feed          |
//! |------------------|-------------|---------------|
//! | `title`          |             | item title    |
//! | `description`    |             | description   |
//! | `publish_date`   | `<lastmod>` | `<pubDate>`   |
//! | `draft`          | excluded    | excluded      |

pub mod feed;
pub mod sitemap;

use crate::config::{ProjectPaths, SiteConfig};
use crate::render;
use crate::scan::ContentItem;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum SyndicationError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("site.url is required to build the feed")]
    MissingUrl,
}

/// What the sitemap and feed need to know about one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub slug: String,
    /// Site-relative URL, e.g. `/blog/launch/`.
    pub path: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

impl PageSummary {
    /// Absolute URL when `base` is given, the site-relative path otherwise.
    pub fn url(&self, base: Option<&str>) -> String {
        match base {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), self.path),
            None => self.path.clone(),
        }
    }
}

/// Site-relative URL of a slug, matching where its HTML is written.
///
/// `index` is the site root and `<dir>/index` is `<dir>/`.
pub fn url_path(slug: &str) -> String {
    let dir = match slug.strip_suffix("index") {
        Some(prefix) if prefix.is_empty() || prefix.ends_with('/') => prefix.trim_end_matches('/'),
        _ => slug,
    };
    if dir.is_empty() {
        "/".to_string()
    } else {
        format!("/{dir}/")
    }
}

/// Parse a `publish_date` value.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` (both UTC)
/// and a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_publish_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Read front matter for every item, dropping drafts and unreadable pages.
pub fn collect_pages(items: &[ContentItem]) -> Vec<PageSummary> {
    items
        .iter()
        .filter_map(|item| match render::read_front_matter(&item.path) {
            Ok(front_matter) => summarize(&item.slug, &front_matter),
            Err(e) => {
                warn!(path = %item.path.display(), error = %e, "skipping page in sitemap and feed");
                None
            }
        })
        .collect()
}

fn summarize(slug: &str, front_matter: &serde_json::Map<String, Value>) -> Option<PageSummary> {
    if front_matter.get("draft").is_some_and(render::is_draft) {
        return None;
    }
    let text = |key: &str| front_matter.get(key).and_then(Value::as_str).map(str::to_string);
    Some(PageSummary {
        slug: slug.to_string(),
        path: url_path(slug),
        title: text("title"),
        description: text("description"),
        published: front_matter
            .get("publish_date")
            .and_then(Value::as_str)
            .and_then(parse_publish_date),
    })
}

/// Write every enabled artifact into the output directory.
///
/// Returns the paths written.
pub fn write_site_artifacts(
    paths: &ProjectPaths,
    config: &SiteConfig,
    items: &[ContentItem],
) -> Result<Vec<PathBuf>, SyndicationError> {
    if !config.build.sitemap && !config.build.feed {
        return Ok(Vec::new());
    }
    let pages = collect_pages(items);
    let mut written = Vec::new();
    if config.build.sitemap {
        written.push(sitemap::write_sitemap(&paths.output, &pages, config.site.url.as_deref())?);
    }
    if config.build.feed {
        written.push(feed::write_feed(&paths.output, &pages, &config.site)?);
    }
    Ok(written)
}
