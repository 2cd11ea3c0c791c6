//! Incremental build orchestrator.
//!
//! One build run, start to finish:
//!
//! ```text
//! scan content/ ─► copy static/ ─► load manifest ─► render pages (parallel)
//!                       │               │                  │
//!                staticfiles.json   check_static      per page: fingerprint,
//!                                   (forces all)      skip or render + write
//!                                                          │
//!                  persist manifest ◄─ sitemap + feed ◄────┘ (only when dirty)
//! ```
//!
//! ## Per-page decision
//!
//! Unless the run is forced (`--force`, or the static asset fingerprint
//! changed), each page is classified by [`Manifest::freshness`]. Unchanged and
//! touched pages are skipped; touched pages still get their stored mtime
//! refreshed. Everything else is rendered and written to
//! [`ContentItem::output_path`], reported as created when the file did not
//! exist before and as updated otherwise.
//!
//! ## Failure handling
//!
//! A failing page never stops its siblings. Its error is recorded as
//! `"<source path>: <reason>"` and the run carries on; [`BuildReport::errors`]
//! lists every failure. Only a missing content root, an unwritable output
//! directory, or a failure in the static asset pipeline aborts the run.
//!
//! ## Concurrency
//!
//! Pages render on a dedicated rayon pool sized by
//! [`effective_threads`](crate::config::effective_threads). If the pool cannot
//! be created the pages render sequentially on the calling thread. Shared
//! state lives in a [`BuildContext`] built per run: the manifest and error
//! list behind mutexes, the outcome counters as atomics. Progress is streamed
//! as [`BuildEvent`]s over an optional channel so the CLI can print while
//! workers run.

use crate::assets::{self, AssetError};
use crate::config::{ProjectPaths, SiteConfig, effective_threads};
use crate::manifest::{Freshness, Manifest};
use crate::render::{self, MarkdownRenderer, RenderError, Renderer};
use crate::scan::{self, ContentItem, ScanError};
use crate::syndication;
use crate::templates::TemplateEngine;
use parking_lot::Mutex;
use rayon::prelude::*;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Static assets: {0}")]
    Asset(#[from] AssetError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Knobs for one run, usually straight from the CLI.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Render every page regardless of the manifest.
    pub force: bool,
    /// Worker count override; see [`effective_threads`].
    pub threads: Option<usize>,
    /// Report page failures without failing the run.
    pub ignore_errors: bool,
}

/// Why a page was not rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Modification time matches the manifest.
    Unchanged,
    /// Modification time moved but the content hash matches.
    Touched,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unchanged => f.write_str("the modified date is not changed"),
            SkipReason::Touched => f.write_str("the content is not changed"),
        }
    }
}

/// Per-page progress, sent as each page finishes.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    /// Page written to a file that did not exist before. `output` is relative
    /// to the output directory.
    Created { slug: String, output: PathBuf },
    /// Page written over an existing file.
    Updated { slug: String, output: PathBuf },
    Skipped { name: String, reason: SkipReason },
    /// `error` is already formatted as `"<source path>: <reason>"`.
    Failed { error: String },
}

/// Outcome of a run.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Every page failure, sorted.
    pub errors: Vec<String>,
    /// Whether the static asset fingerprint changed, forcing a full render.
    pub static_changed: bool,
    /// Whether the manifest was rewritten.
    pub manifest_written: bool,
    /// Sitemap and feed files written this run.
    pub artifacts: Vec<PathBuf>,
    pub threads: usize,
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Process exit status: 1 when pages failed and errors are not ignored.
    pub fn exit_code(&self, ignore_errors: bool) -> i32 {
        if self.has_errors() && !ignore_errors { 1 } else { 0 }
    }
}

/// Everything a render task shares with its siblings for one run.
pub struct BuildContext<'a> {
    paths: &'a ProjectPaths,
    renderer: &'a dyn Renderer,
    templates: &'a TemplateEngine,
    force: bool,
    manifest: Mutex<Manifest>,
    items: Mutex<Vec<ContentItem>>,
    errors: Mutex<Vec<String>>,
    created: AtomicUsize,
    updated: AtomicUsize,
    skipped: AtomicUsize,
    events: Option<Sender<BuildEvent>>,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        paths: &'a ProjectPaths,
        renderer: &'a dyn Renderer,
        templates: &'a TemplateEngine,
        manifest: Manifest,
        force: bool,
        events: Option<Sender<BuildEvent>>,
    ) -> Self {
        Self {
            paths,
            renderer,
            templates,
            force,
            manifest: Mutex::new(manifest),
            items: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            created: AtomicUsize::new(0),
            updated: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            events,
        }
    }

    /// Build one page, recording the outcome. Never fails.
    pub fn process(&self, source: &Path) {
        let event = match self.build_page(source) {
            Ok(event) => event,
            Err(e) => {
                let error = format!("{}: {}", source.display(), e);
                warn!(%error, "page failed");
                self.errors.lock().push(error.clone());
                BuildEvent::Failed { error }
            }
        };
        match &event {
            BuildEvent::Created { .. } => self.created.fetch_add(1, Ordering::Relaxed),
            BuildEvent::Updated { .. } => self.updated.fetch_add(1, Ordering::Relaxed),
            BuildEvent::Skipped { .. } => self.skipped.fetch_add(1, Ordering::Relaxed),
            BuildEvent::Failed { .. } => 0,
        };
        self.emit(event);
    }

    fn build_page(&self, source: &Path) -> Result<BuildEvent, RenderError> {
        let item = ContentItem::from_root(&self.paths.content, source)?;
        self.items.lock().push(item.clone());

        if !self.force {
            let mut manifest = self.manifest.lock();
            match manifest.freshness(&item) {
                Freshness::Unchanged => {
                    debug!(name = %item.name, "skip: mtime unchanged");
                    return Ok(skipped(&item, SkipReason::Unchanged));
                }
                Freshness::Touched => {
                    debug!(name = %item.name, "skip: content unchanged, refreshing mtime");
                    manifest.insert(item.name.clone(), item.record());
                    return Ok(skipped(&item, SkipReason::Touched));
                }
                Freshness::New | Freshness::Stale => {}
            }
        }

        let rendered = self.renderer.render(&item.slug)?;
        let html = self.templates.render(&rendered.template, &rendered.context)?;

        let output = item.output_path(&self.paths.output);
        let existed = output.exists();
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output, html)?;
        self.manifest.lock().insert(item.name.clone(), item.record());

        let relative = output
            .strip_prefix(&self.paths.output)
            .map(Path::to_path_buf)
            .unwrap_or(output);
        let slug = item.slug;
        Ok(if existed {
            BuildEvent::Updated {
                slug,
                output: relative,
            }
        } else {
            BuildEvent::Created {
                slug,
                output: relative,
            }
        })
    }

    fn record_error(&self, source: &Path, reason: impl fmt::Display) {
        let error = format!("{}: {}", source.display(), reason);
        warn!(%error, "build step failed");
        self.errors.lock().push(error.clone());
        self.emit(BuildEvent::Failed { error });
    }

    fn emit(&self, event: BuildEvent) {
        if let Some(tx) = &self.events {
            tx.send(event).ok();
        }
    }
}

fn skipped(item: &ContentItem, reason: SkipReason) -> BuildEvent {
    BuildEvent::Skipped {
        name: item.name.clone(),
        reason,
    }
}

/// Build the site with the markdown renderer.
pub fn build(
    paths: &ProjectPaths,
    config: &SiteConfig,
    options: &BuildOptions,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildReport, BuildError> {
    let templates = TemplateEngine::new(&paths.templates).with_content_root(&paths.content);
    let renderer = MarkdownRenderer::new(paths, config, &templates);
    build_with_renderer(&renderer, &templates, paths, config, options, events)
}

/// Build the site with a specific renderer (allows testing with mock).
pub fn build_with_renderer(
    renderer: &impl Renderer,
    templates: &TemplateEngine,
    paths: &ProjectPaths,
    config: &SiteConfig,
    options: &BuildOptions,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildReport, BuildError> {
    let started = Instant::now();

    let sources = scan::scan(&paths.content)?;
    fs::create_dir_all(&paths.output)?;

    let collected = assets::collect_static(&paths.static_files, &paths.output_static())?;
    let mut manifest = Manifest::load(&paths.manifest);
    let static_changed = manifest.check_static(&collected.manifest_path)?;
    let force = options.force || static_changed;
    if static_changed && !options.force {
        debug!("static assets changed, rendering every page");
    }

    let threads = effective_threads(&config.build, options.threads);
    let ctx = BuildContext::new(paths, renderer, templates, manifest, force, events);
    run_tasks(&ctx, &sources, threads);

    let manifest_dirty = ctx.manifest.lock().is_dirty();
    let mut artifacts = Vec::new();
    if manifest_dirty {
        let mut items = std::mem::take(&mut *ctx.items.lock());
        items.sort_by(|a, b| a.name.cmp(&b.name));
        match syndication::write_site_artifacts(paths, config, &items) {
            Ok(written) => artifacts = written,
            Err(e) => ctx.record_error(&paths.output, e),
        }
    }

    let BuildContext {
        manifest,
        errors,
        created,
        updated,
        skipped,
        ..
    } = ctx;
    let manifest = manifest.into_inner();
    if manifest_dirty {
        manifest.write_data(&paths.manifest)?;
    }

    let mut errors = errors.into_inner();
    errors.sort();
    let report = BuildReport {
        created: created.into_inner(),
        updated: updated.into_inner(),
        skipped: skipped.into_inner(),
        errors,
        static_changed,
        manifest_written: manifest_dirty,
        artifacts,
        threads,
        elapsed: started.elapsed(),
    };
    debug!(
        created = report.created,
        updated = report.updated,
        skipped = report.skipped,
        errors = report.errors.len(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "build finished"
    );
    Ok(report)
}

/// One page as the `check` command reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct PageStatus {
    pub name: String,
    pub slug: String,
    /// Output file relative to the output directory.
    pub output: PathBuf,
    pub title: Option<String>,
    pub freshness: Freshness,
    pub draft: bool,
}

/// Classify every page against the manifest without rendering anything.
///
/// Unreadable front matter is logged and the page listed without a title.
pub fn check(paths: &ProjectPaths) -> Result<Vec<PageStatus>, BuildError> {
    let items = scan::scan_items(&paths.content)?;
    let manifest = Manifest::load(&paths.manifest);

    let pages = items
        .into_iter()
        .map(|item| {
            let (title, draft) = match render::read_front_matter(&item.path) {
                Ok(front_matter) => (
                    front_matter.get("title").and_then(Value::as_str).map(str::to_string),
                    front_matter.get("draft").is_some_and(render::is_draft),
                ),
                Err(e) => {
                    warn!(path = %item.path.display(), error = %e, "unreadable front matter");
                    (None, false)
                }
            };
            PageStatus {
                freshness: manifest.freshness(&item),
                output: scan::output_path_for_slug(Path::new(""), &item.slug),
                name: item.name,
                slug: item.slug,
                title,
                draft,
            }
        })
        .collect();
    Ok(pages)
}

fn run_tasks(ctx: &BuildContext<'_>, sources: &[PathBuf], threads: usize) {
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(|| sources.par_iter().for_each(|source| ctx.process(source))),
        Err(e) => {
            warn!(error = %e, "could not start render pool, building sequentially");
            sources.iter().for_each(|source| ctx.process(source));
        }
    }
}
