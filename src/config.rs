//! Project configuration module.
//!
//! Handles loading, validating, and merging `kiln.toml`. The file lives in the
//! project root (next to `content/`) and is entirely optional: stock defaults
//! are serialized to a TOML value, the user's file is merged on top, and the
//! result is deserialized and validated.
//!
//! ## Project Layout
//!
//! ```text
//! site/
//! ├── kiln.toml          # This file (optional)
//! ├── content/           # Markdown sources, one page per file
//! ├── templates/         # Jinja templates (content.html, wildcard fallbacks)
//! ├── static/            # Copied into output/static/ on every build
//! ├── data/              # JSON files exposed to templates as `data`
//! ├── output/            # Rendered HTML (created on build)
//! └── output.json        # Fingerprint manifest from the last build
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! content_dir = "content"
//! templates_dir = "templates"
//! static_dir = "static"
//! data_dir = "data"
//! output_dir = "output"
//! manifest_file = "output.json"
//!
//! [site]
//! url = "https://example.com"
//! title = "My Site"
//! description = ""
//!
//! [build]
//! threads = 4                     # Omit for auto = cores / 2 - 1
//! markdown = "commonmark"         # or "extended"
//! default_template = "content.html"
//! sitemap = true
//! feed = true
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file within the project root.
pub const CONFIG_FILENAME: &str = "kiln.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `kiln.toml`.
///
/// Every directory is relative to the project root unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Markdown sources.
    pub content_dir: String,
    /// Template directory searched by the template engine.
    pub templates_dir: String,
    /// Static assets copied into `<output>/static/`.
    pub static_dir: String,
    /// JSON data files merged into the `data` template variable.
    pub data_dir: String,
    /// Where rendered HTML is written.
    pub output_dir: String,
    /// Fingerprint manifest persisted between builds.
    pub manifest_file: String,
    /// Site metadata used by templates, the sitemap and the feed.
    pub site: SiteInfo,
    /// Build pipeline settings.
    pub build: BuildConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_dir: "content".to_string(),
            templates_dir: "templates".to_string(),
            static_dir: "static".to_string(),
            data_dir: "data".to_string(),
            output_dir: "output".to_string(),
            manifest_file: "output.json".to_string(),
            site: SiteInfo::default(),
            build: BuildConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build.threads == Some(0) {
            return Err(ConfigError::Validation(
                "build.threads must be at least 1".into(),
            ));
        }
        if self.build.default_template.trim().is_empty() {
            return Err(ConfigError::Validation(
                "build.default_template must not be empty".into(),
            ));
        }
        if self.build.feed && self.site.url.is_none() {
            return Err(ConfigError::Validation(
                "site.url is required when build.feed is enabled".into(),
            ));
        }
        Ok(())
    }
}

/// Site-wide metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Absolute base URL, e.g. `https://example.com`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub title: String,
    pub description: String,
}

/// Build pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Render worker count. When absent, see [`effective_threads`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    /// Markdown dialect used for every page.
    pub markdown: MarkdownFlavor,
    /// Template used when a page's front matter names none.
    pub default_template: String,
    /// Write `sitemap.xml` after a build that changed anything.
    pub sitemap: bool,
    /// Write `rss.xml` after a build that changed anything.
    pub feed: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            threads: None,
            markdown: MarkdownFlavor::default(),
            default_template: "content.html".to_string(),
            sitemap: true,
            feed: false,
        }
    }
}

/// Markdown dialect, chosen once per project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkdownFlavor {
    /// Plain CommonMark.
    #[default]
    CommonMark,
    /// CommonMark plus tables, footnotes, strikethrough, task lists and
    /// heading attributes.
    Extended,
}

/// Absolute locations of every project directory, resolved once per run.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub content: PathBuf,
    pub templates: PathBuf,
    pub static_files: PathBuf,
    pub data: PathBuf,
    pub output: PathBuf,
    pub manifest: PathBuf,
}

impl ProjectPaths {
    /// Resolve config directories against `root`. `output_override` wins over
    /// `output_dir` when given (the `--output` flag).
    pub fn resolve(root: &Path, config: &SiteConfig, output_override: Option<&Path>) -> Self {
        let output = match output_override {
            Some(dir) => root.join(dir),
            None => root.join(&config.output_dir),
        };
        Self {
            root: root.to_path_buf(),
            content: root.join(&config.content_dir),
            templates: root.join(&config.templates_dir),
            static_files: root.join(&config.static_dir),
            data: root.join(&config.data_dir),
            output,
            manifest: root.join(&config.manifest_file),
        }
    }

    /// Directory the static asset pipeline copies into.
    pub fn output_static(&self) -> PathBuf {
        self.output.join("static")
    }
}

/// Resolve the render worker count.
///
/// - CLI override wins, then `build.threads`
/// - otherwise half the logical cores minus one, never below 1
pub fn effective_threads(config: &BuildConfig, cli_override: Option<usize>) -> usize {
    if let Some(n) = cli_override.or(config.threads) {
        return n.max(1);
    }
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    default_threads(cores)
}

fn default_threads(cores: usize) -> usize {
    (cores / 2).saturating_sub(1).max(1)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `kiln.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from `kiln.toml` in the project root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let merged = match load_raw_config(root)? {
        Some(overlay) => merge_toml(stock_defaults_value(), overlay),
        None => stock_defaults_value(),
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `kiln.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# kiln configuration
# ==================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Directories, relative to the project root.
content_dir = "content"
templates_dir = "templates"
static_dir = "static"
data_dir = "data"
output_dir = "output"

# Fingerprints from the last build. Delete it (or pass --force) to rebuild
# everything.
manifest_file = "output.json"

# ---------------------------------------------------------------------------
# Site metadata (available to templates as `site`)
# ---------------------------------------------------------------------------
[site]
# Absolute base URL. Required for the RSS feed; the sitemap falls back to
# relative URLs without it.
# url = "https://example.com"
title = ""
description = ""

# ---------------------------------------------------------------------------
# Build
# ---------------------------------------------------------------------------
[build]
# Render workers. Omit to auto-detect (half the logical cores minus one).
# threads = 4

# "commonmark" or "extended" (tables, footnotes, strikethrough, task lists,
# heading attributes).
markdown = "commonmark"

# Template used when a page's front matter has no `template` key.
default_template = "content.html"

# Whole-site artifacts regenerated after any build that changed something.
sitemap = true
feed = false
"##
}
