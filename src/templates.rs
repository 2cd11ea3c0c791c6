//! Template engine adapter.
//!
//! Thin wrapper over a `minijinja::Environment` that loads templates lazily
//! from the project's `templates/` directory. Template names are paths
//! relative to that directory (`content.html`, `blog/*.html`).
//!
//! Output is not auto-escaped: page bodies and the table of contents are
//! already HTML when they reach the layout template. Use the `escape` filter
//! for untrusted values.
//!
//! A missing templates directory is not an error here; every lookup simply
//! fails, which surfaces as a per-page render error.
//!
//! ## Functions
//!
//! With a content root attached ([`TemplateEngine::with_content_root`]),
//! templates can call `directory_contents(directory?)`. It returns
//! `[{slug, title}]` for every page directly inside `directory`, skipping
//! `index.md`. Without an argument it lists the directory of the page being
//! rendered: `blog/index` lists `blog`, `index` lists the content root.
//!
//! ```jinja
//! {% for page in directory_contents("blog") %}
//!   <a href="/{{ page.slug }}/">{{ page.title or page.slug }}</a>
//! {% endfor %}
//! ```

use crate::render;
use minijinja::{AutoEscape, Environment, ErrorKind, State, Value};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub use minijinja::Error as TemplateError;

/// Name used in error messages for inline (string) templates.
const INLINE_TEMPLATE_NAME: &str = "<content>";

pub struct TemplateEngine {
    env: Environment<'static>,
    root: PathBuf,
}

impl TemplateEngine {
    /// Engine loading templates from `templates_dir`.
    pub fn new(templates_dir: &Path) -> Self {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(templates_dir));
        env.set_auto_escape_callback(|_| AutoEscape::None);
        Self {
            env,
            root: templates_dir.to_path_buf(),
        }
    }

    /// Register the functions that read the content tree below `content_dir`.
    pub fn with_content_root(mut self, content_dir: &Path) -> Self {
        let content_dir = content_dir.to_path_buf();
        self.env.add_function(
            "directory_contents",
            move |state: &State, directory: Option<String>| -> Result<Value, TemplateError> {
                let directory = match directory {
                    Some(dir) => dir,
                    None => state
                        .lookup("slug")
                        .and_then(|slug| slug.as_str().map(directory_of_slug))
                        .unwrap_or_default(),
                };
                let links = render::directory_contents(&content_dir, &directory)
                    .map_err(|e| TemplateError::new(ErrorKind::InvalidOperation, e.to_string()))?;
                Ok(Value::from_serialize(&links))
            },
        );
        self
    }

    /// Whether `name` resolves to a loadable template.
    ///
    /// A template that exists but fails to parse also counts as missing.
    pub fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Render the named template with `ctx`.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, TemplateError> {
        self.env.get_template(name)?.render(ctx)
    }

    /// Render `source` as an anonymous template with `ctx`.
    pub fn render_str<S: Serialize>(&self, source: &str, ctx: S) -> Result<String, TemplateError> {
        self.env.render_named_str(INLINE_TEMPLATE_NAME, source, ctx)
    }
}

/// The directory a page's URL points at: `blog/index` → `blog`, `index` → ``.
fn directory_of_slug(slug: &str) -> String {
    match slug.strip_suffix("index") {
        Some(prefix) if prefix.is_empty() || prefix.ends_with('/') => {
            prefix.trim_end_matches('/').to_string()
        }
        _ => slug.to_string(),
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
