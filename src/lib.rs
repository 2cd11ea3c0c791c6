//! # Kiln
//!
//! An incremental static site builder. Markdown pages with YAML front matter
//! are rendered through Jinja-style templates into a directory of HTML, and a
//! fingerprint manifest lets the next build skip every page that did not
//! change.
//!
//! # Architecture: One Incremental Pass
//!
//! ```text
//! content/*.md ──► scan ──► manifest check ──► render (parallel) ──► output/<slug>/index.html
//! static/**    ──► assets ──► staticfiles.json ─┘ (any change forces every page)
//! data/*.json  ──► render context
//! ```
//!
//! Each page is fingerprinted by modification time and MD5. A page whose time
//! matches the manifest is skipped outright; a page whose time moved but whose
//! hash did not is skipped and its stored time refreshed. The manifest, the
//! sitemap and the feed are only rewritten when something changed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`builder`] | Build orchestration: per-page decisions, worker pool, report |
//! | [`scan`] | Walks the content root, derives slugs and output paths |
//! | [`manifest`] | Fingerprint store (`output.json`): load, classify, persist |
//! | [`render`] | Front matter, markdown, render context; the [`render::Renderer`] seam |
//! | [`templates`] | minijinja environment over the templates directory |
//! | [`wildcard`] | Wildcard template candidates for slugs without an exact template |
//! | [`toc`] | Heading anchors and the nested table of contents |
//! | [`assets`] | Static file copy and the `staticfiles.json` fingerprint |
//! | [`syndication`] | `sitemap.xml` and `rss.xml` |
//! | [`config`] | `kiln.toml` loading, merging over defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Two-Step Freshness Check
//!
//! Comparing modification times alone rebuilds every page after a fresh
//! checkout or a `touch`. Comparing hashes alone reads every file on every
//! build. Kiln checks the time first and only hashes when it moved, then
//! stores the new time so the next build takes the fast path again.
//!
//! ## Static Changes Render Everything
//!
//! Templates link stylesheets and scripts, and there is no dependency graph
//! between pages and the files they reference. Any change to `static/` is
//! treated as a change to every page.
//!
//! ## Failures Stay Local
//!
//! A page that fails to render is reported and left without a manifest
//! record, so the next build retries it. Its siblings render as usual. Only a
//! missing content root, an unwritable output directory, or a broken static
//! pipeline aborts a run.

pub mod assets;
pub mod builder;
pub mod config;
pub mod manifest;
pub mod output;
pub mod render;
pub mod scan;
pub mod syndication;
pub mod templates;
pub mod toc;
pub mod wildcard;
