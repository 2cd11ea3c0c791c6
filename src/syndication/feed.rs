//! RSS 2.0 feed generation.
//!
//! One item per page, newest `publish_date` first; undated pages follow in
//! scan order. Requires `site.url`, since feed readers need absolute links.

use super::{PageSummary, SyndicationError};
use crate::config::SiteInfo;
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const FEED_FILENAME: &str = "rss.xml";

/// RSS XML for `pages`.
pub fn build_feed(pages: &[PageSummary], site: &SiteInfo) -> Result<String, SyndicationError> {
    let base_url = site.url.as_deref().ok_or(SyndicationError::MissingUrl)?;

    let mut ordered: Vec<&PageSummary> = pages.iter().collect();
    // Stable: undated pages keep their relative order at the end
    ordered.sort_by(|a, b| b.published.cmp(&a.published));

    let items: Vec<rss::Item> = ordered
        .into_iter()
        .map(|page| {
            let link = page.url(Some(base_url));
            ItemBuilder::default()
                .title(page.title.clone().or_else(|| Some(page.slug.clone())))
                .link(Some(link.clone()))
                .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
                .description(page.description.clone())
                .pub_date(page.published.map(|d| d.to_rfc2822()))
                .build()
        })
        .collect();

    let channel = ChannelBuilder::default()
        .title(site.title.clone())
        .link(base_url.to_string())
        .description(site.description.clone())
        .generator(Some("kiln".to_string()))
        .items(items)
        .build();

    Ok(channel.to_string())
}

/// Write `rss.xml` into `output_dir`.
pub fn write_feed(
    output_dir: &Path,
    pages: &[PageSummary],
    site: &SiteInfo,
) -> Result<PathBuf, SyndicationError> {
    let xml = build_feed(pages, site)?;
    let path = output_dir.join(FEED_FILENAME);
    fs::write(&path, xml)?;
    debug!(items = pages.len(), "wrote feed");
    Ok(path)
}
