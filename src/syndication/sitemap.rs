//! `sitemap.xml` generation.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!     <lastmod>2024-06-01</lastmod>
//!   </url>
//! </urlset>
//! ```
//!
//! Without `site.url` the `<loc>` entries are site-relative.

use super::{PageSummary, SyndicationError};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SITEMAP_FILENAME: &str = "sitemap.xml";

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Sitemap XML for `pages`, in the given order.
pub fn build_sitemap(pages: &[PageSummary], base_url: Option<&str>) -> String {
    let mut xml = String::with_capacity(128 + pages.len() * 96);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"");
    xml.push_str(SITEMAP_NS);
    xml.push_str("\">\n");

    for page in pages {
        xml.push_str("  <url>\n    <loc>");
        xml.push_str(&escape_xml(&page.url(base_url)));
        xml.push_str("</loc>\n");
        if let Some(published) = page.published {
            xml.push_str("    <lastmod>");
            xml.push_str(&published.format("%Y-%m-%d").to_string());
            xml.push_str("</lastmod>\n");
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Write `sitemap.xml` into `output_dir`.
pub fn write_sitemap(
    output_dir: &Path,
    pages: &[PageSummary],
    base_url: Option<&str>,
) -> Result<PathBuf, SyndicationError> {
    let path = output_dir.join(SITEMAP_FILENAME);
    fs::write(&path, build_sitemap(pages, base_url))?;
    debug!(urls = pages.len(), "wrote sitemap");
    Ok(path)
}

pub(crate) fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}
