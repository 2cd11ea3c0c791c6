//! Page rendering.
//!
//! The build pipeline only needs one thing from a page: which template to use
//! and the context to fill it with. [`Renderer`] is that seam; the production
//! implementation is [`MarkdownRenderer`], and tests substitute mocks.
//!
//! ## Markdown pages
//!
//! ```text
//! ---
//! title: Launch
//! template: post.html        # optional, else build.default_template
//! publish_date: 2024-06-01
//! ---
//! # Launch day
//! Welcome to {{ site.title }}.
//! ```
//!
//! 1. Front matter (YAML between `---` fences) becomes context keys.
//! 2. The body goes through pulldown-cmark. Headings get `id` attributes and
//!    feed the [table of contents](crate::toc).
//! 3. The resulting HTML is itself rendered as a template, so page bodies can
//!    use the same variables as layouts. Code spans and code blocks are
//!    wrapped in `{% raw %}` so template syntax shown in code stays literal.
//! 4. The context gains `slug`, `content`, `toc`, `data`, `site` and `now`,
//!    which take precedence over front matter keys of the same name. A
//!    `draft` key is normalised to a boolean.
//!
//! ## Template-only pages
//!
//! A slug with no markdown file is served by `<slug>.html` if that template
//! exists, otherwise by the most specific [wildcard](crate::wildcard)
//! template. `content` and `toc` are empty for such pages.

use crate::config::{MarkdownFlavor, ProjectPaths, SiteConfig};
use crate::templates::{TemplateEngine, TemplateError};
use crate::toc::{Toc, TocBuilder};
use crate::wildcard;
use chrono::Utc;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

const FRONT_MATTER_FENCE: &str = "---";

/// Opens a span the template engine copies through untouched.
pub const RAW_START: &str = "{% raw %}";
/// Closes a [`RAW_START`] span. Code containing this literal ends the span early.
pub const RAW_END: &str = "{% endraw %}";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no content file or template matches '{0}'")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("front matter error: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
    #[error("front matter must be a mapping")]
    FrontMatterShape,
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("content directory does not exist: {0}")]
    MissingDirectory(String),
}

/// Template name plus the context to render it with.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub template: String,
    pub context: Value,
}

/// Turns a slug into a template invocation.
///
/// Implementations are shared across render workers.
pub trait Renderer: Sync {
    fn render(&self, slug: &str) -> Result<Rendered, RenderError>;
}

/// Production renderer: markdown sources, YAML front matter, JSON data files.
pub struct MarkdownRenderer<'a> {
    content_dir: PathBuf,
    flavor: MarkdownFlavor,
    default_template: String,
    templates: &'a TemplateEngine,
    site: Value,
    data: Value,
}

impl<'a> MarkdownRenderer<'a> {
    /// Build a renderer for one run. Loads the data directory eagerly.
    pub fn new(paths: &ProjectPaths, config: &SiteConfig, templates: &'a TemplateEngine) -> Self {
        Self {
            content_dir: paths.content.clone(),
            flavor: config.build.markdown,
            default_template: config.build.default_template.clone(),
            templates,
            site: serde_json::to_value(&config.site).unwrap_or(Value::Null),
            data: load_data(&paths.data),
        }
    }

    fn base_context(&self, slug: &str) -> Map<String, Value> {
        let mut ctx = Map::new();
        ctx.insert("slug".into(), Value::from(slug));
        ctx.insert("data".into(), self.data.clone());
        ctx.insert("site".into(), self.site.clone());
        ctx.insert("now".into(), Value::from(Utc::now().to_rfc3339()));
        ctx
    }

    fn render_template_only(&self, slug: &str) -> Result<Rendered, RenderError> {
        let exact = format!("{slug}.html");
        let template = if self.templates.has_template(&exact) {
            exact
        } else {
            wildcard::resolve(slug, |name| self.templates.has_template(name))
                .ok_or_else(|| RenderError::NotFound(slug.to_string()))?
        };
        debug!(slug, template = template.as_str(), "no content file, using template");

        let mut context = self.base_context(slug);
        context.insert("content".into(), Value::from(""));
        context.insert("toc".into(), Value::from(""));
        Ok(Rendered {
            template,
            context: Value::Object(context),
        })
    }
}

impl Renderer for MarkdownRenderer<'_> {
    fn render(&self, slug: &str) -> Result<Rendered, RenderError> {
        let source_path = self.content_dir.join(format!("{slug}.md"));
        if !source_path.is_file() {
            return self.render_template_only(slug);
        }

        let source = fs::read_to_string(&source_path)?;
        let (front_matter, body) = split_front_matter(&source)?;
        let (body_html, toc) = render_markdown(body, self.flavor);

        let template = front_matter
            .get("template")
            .and_then(Value::as_str)
            .unwrap_or(self.default_template.as_str())
            .to_string();

        let mut context = front_matter;
        if let Some(draft) = context.get_mut("draft") {
            *draft = Value::Bool(is_draft(draft));
        }
        context.extend(self.base_context(slug));
        context.insert("toc".into(), Value::from(toc.html));
        let content = self.templates.render_str(&body_html, &context)?;
        context.insert("content".into(), Value::from(content));

        Ok(Rendered {
            template,
            context: Value::Object(context),
        })
    }
}

// =============================================================================
// Front matter
// =============================================================================

/// Split a source file into its front matter mapping and markdown body.
///
/// Front matter is only recognised when the file starts with a `---` line
/// and a later line closes it. Anything else is all body.
pub fn split_front_matter(source: &str) -> Result<(Map<String, Value>, &str), RenderError> {
    let Some(rest) = source
        .strip_prefix(FRONT_MATTER_FENCE)
        .and_then(|r| r.strip_prefix('\n').or_else(|| r.strip_prefix("\r\n")))
    else {
        return Ok((Map::new(), source));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((parse_front_matter(yaml)?, body));
        }
        offset += line.len();
    }
    Ok((Map::new(), source))
}

fn parse_front_matter(yaml: &str) -> Result<Map<String, Value>, RenderError> {
    if yaml.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(RenderError::FrontMatterShape),
    }
}

/// Whether a front matter `draft` value marks the page as a draft.
///
/// `true`, `"true"` and `"1"` do; anything else does not.
pub fn is_draft(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true" || s == "1",
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}

/// Read only the front matter of a source file.
pub fn read_front_matter(path: &Path) -> Result<Map<String, Value>, RenderError> {
    let source = fs::read_to_string(path)?;
    Ok(split_front_matter(&source)?.0)
}

// =============================================================================
// Directory listings
// =============================================================================

/// One page in a [`directory_contents`] listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLink {
    pub slug: String,
    pub title: Option<String>,
}

/// The pages directly inside `directory` (relative to `content_dir`), sorted
/// by file name. `index.md` and hidden files are left out; an empty
/// `directory` lists the content root.
pub fn directory_contents(content_dir: &Path, directory: &str) -> Result<Vec<PageLink>, RenderError> {
    let directory = directory.trim_matches('/');
    if directory.split('/').any(|segment| segment == "..") {
        return Err(RenderError::MissingDirectory(directory.to_string()));
    }
    let dir = content_dir.join(directory);
    if !dir.is_dir() {
        return Err(RenderError::MissingDirectory(directory.to_string()));
    }

    let mut links = Vec::new();
    for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let file_name = entry.file_name().to_string_lossy();
        if !entry.file_type().is_file() || file_name.starts_with('.') || file_name == "index.md" {
            continue;
        }
        let Some(stem) = file_name.strip_suffix(".md") else {
            continue;
        };
        let slug = if directory.is_empty() {
            stem.to_string()
        } else {
            format!("{directory}/{stem}")
        };
        let title = read_front_matter(entry.path())?
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string);
        links.push(PageLink { slug, title });
    }
    Ok(links)
}

// =============================================================================
// Markdown
// =============================================================================

/// Parser options for a markdown flavor.
pub fn markdown_options(flavor: MarkdownFlavor) -> Options {
    match flavor {
        MarkdownFlavor::CommonMark => Options::empty(),
        MarkdownFlavor::Extended => {
            Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_HEADING_ATTRIBUTES
        }
    }
}

/// Render markdown to HTML, anchoring every heading and collecting the
/// table of contents.
///
/// Heading ids always come from the heading text, replacing any explicit
/// `{#id}` attribute, so TOC links and anchors agree.
///
/// The HTML is a template source: code is fenced with [`RAW_START`] and
/// [`RAW_END`] and must go through the template engine before it is served.
pub fn render_markdown(body: &str, flavor: MarkdownFlavor) -> (String, Toc) {
    let mut events: Vec<Event> = Parser::new_ext(body, markdown_options(flavor)).collect();
    let mut toc = TocBuilder::new();

    let mut open: Option<(usize, u8, String)> = None;
    let mut anchors: Vec<(usize, String)> = Vec::new();
    for (idx, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                open = Some((idx, *level as u8, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, heading_text)) = open.as_mut() {
                    heading_text.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((start, level, text)) = open.take() {
                    anchors.push((start, toc.push(level, &text)));
                }
            }
            _ => {}
        }
    }

    for (idx, anchor) in anchors {
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[idx] {
            *id = Some(CowStr::from(anchor));
        }
    }

    let mut out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut out, protect_code(events).into_iter());
    (out, toc.finish())
}

/// Wrap every code block and code span in a raw template span.
fn protect_code(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(_)) => {
                out.push(Event::Html(CowStr::Borrowed(RAW_START)));
                out.push(event);
            }
            Event::End(TagEnd::CodeBlock) => {
                out.push(event);
                out.push(Event::Html(CowStr::Borrowed(RAW_END)));
            }
            Event::Code(_) => {
                out.push(Event::InlineHtml(CowStr::Borrowed(RAW_START)));
                out.push(event);
                out.push(Event::InlineHtml(CowStr::Borrowed(RAW_END)));
            }
            other => out.push(other),
        }
    }
    out
}

// =============================================================================
// Data files
// =============================================================================

/// Merge every `*.json` below `dir` into one nested object.
///
/// `data/nav.json` becomes `data.nav`, `data/team/people.json` becomes
/// `data.team.people`. Unparsable files are logged and skipped. A missing
/// directory yields an empty object.
pub fn load_data(dir: &Path) -> Value {
    let mut root = Map::new();
    if !dir.is_dir() {
        return Value::Object(root);
    }

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable data entry");
                continue;
            }
        };
        let path = entry.path();
        let is_json = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if !entry.file_type().is_file() || !is_json {
            continue;
        }

        let value = match fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<Value>(&s).map_err(|e| e.to_string()))
        {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping invalid data file");
                continue;
            }
        };

        let Ok(rel) = path.strip_prefix(dir) else {
            continue;
        };
        let mut keys: Vec<String> = rel
            .parent()
            .into_iter()
            .flat_map(|p| p.components())
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if let Some(stem) = path.file_stem() {
            keys.push(stem.to_string_lossy().into_owned());
        }
        insert_nested(&mut root, &keys, value);
    }

    debug!(dir = %dir.display(), keys = root.len(), "loaded data files");
    Value::Object(root)
}

fn insert_nested(root: &mut Map<String, Value>, keys: &[String], value: Value) {
    let Some((last, parents)) = keys.split_last() else {
        return;
    };
    let mut current = root;
    for key in parents {
        let slot = current
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert(last.clone(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    struct Site {
        tmp: TempDir,
        paths: ProjectPaths,
        config: SiteConfig,
    }

    impl Site {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let mut config = SiteConfig::default();
            config.site.title = "Kiln".to_string();
            let paths = ProjectPaths::resolve(tmp.path(), &config, None);
            fs::create_dir_all(&paths.content).unwrap();
            fs::create_dir_all(&paths.templates).unwrap();
            Self { tmp, paths, config }
        }

        fn write(&self, rel: &str, body: &str) {
            let path = self.tmp.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
    }

    // =========================================================================
    // Front matter
    // =========================================================================

    #[test]
    fn split_front_matter_parses_yaml() {
        let src = "---\ntitle: Hello\ndraft: true\ntags: [a, b]\n---\n# Body\n";
        let (fm, body) = split_front_matter(src).unwrap();
        assert_eq!(fm["title"], "Hello");
        assert_eq!(fm["draft"], true);
        assert_eq!(fm["tags"], json!(["a", "b"]));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn split_front_matter_absent() {
        let (fm, body) = split_front_matter("# Just markdown\n").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, "# Just markdown\n");
    }

    #[test]
    fn split_front_matter_empty_block() {
        let (fm, body) = split_front_matter("---\n---\nbody").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, "body");
    }

    #[test]
    fn split_front_matter_unterminated_is_body() {
        let src = "---\ntitle: x\nno closing fence";
        let (fm, body) = split_front_matter(src).unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, src);
    }

    #[test]
    fn split_front_matter_crlf() {
        let (fm, body) = split_front_matter("---\r\ntitle: Hi\r\n---\r\ntext").unwrap();
        assert_eq!(fm["title"], "Hi");
        assert_eq!(body, "text");
    }

    #[test]
    fn split_front_matter_dates_stay_strings() {
        let (fm, _) = split_front_matter("---\npublish_date: 2024-06-01\n---\n").unwrap();
        assert_eq!(fm["publish_date"], "2024-06-01");
    }

    #[test]
    fn draft_values() {
        assert!(is_draft(&json!(true)));
        assert!(is_draft(&json!("true")));
        assert!(is_draft(&json!("1")));
        assert!(is_draft(&json!(1)));
        assert!(!is_draft(&json!(false)));
        assert!(!is_draft(&json!("blob")));
        assert!(!is_draft(&json!(null)));
    }

    #[test]
    fn front_matter_must_be_mapping() {
        let result = split_front_matter("---\n- a\n- b\n---\nbody");
        assert!(matches!(result, Err(RenderError::FrontMatterShape)));
    }

    #[test]
    fn front_matter_invalid_yaml() {
        let result = split_front_matter("---\ntitle: [unclosed\n---\nbody");
        assert!(matches!(result, Err(RenderError::FrontMatter(_))));
    }

    // =========================================================================
    // Markdown
    // =========================================================================

    #[test]
    fn headings_get_ids_and_toc() {
        let (html, toc) = render_markdown("# Intro\n\n## Getting `started`\n", MarkdownFlavor::CommonMark);
        assert!(html.contains(r#"<h1 id="intro">Intro</h1>"#));
        assert!(html.contains(r#"<h2 id="getting-started">"#));
        assert_eq!(toc.entries.len(), 2);
        assert!(toc.html.contains(r##"href="#getting-started""##));
    }

    #[test]
    fn no_headings_empty_toc() {
        let (html, toc) = render_markdown("plain *text*", MarkdownFlavor::CommonMark);
        assert!(html.contains("<em>text</em>"));
        assert!(toc.html.is_empty());
    }

    #[test]
    fn commonmark_has_no_tables() {
        let md = "| a | b |\n|---|---|\n| 1 | 2 |\n";
        let (plain, _) = render_markdown(md, MarkdownFlavor::CommonMark);
        let (extended, _) = render_markdown(md, MarkdownFlavor::Extended);
        assert!(!plain.contains("<table>"));
        assert!(extended.contains("<table>"));
    }

    #[test]
    fn extended_heading_attribute_id_is_replaced() {
        let (html, _) = render_markdown("# Title {#custom}\n", MarkdownFlavor::Extended);
        assert!(html.contains(r#"id="title""#));
        assert!(!html.contains("custom"));
    }

    #[test]
    fn code_is_wrapped_in_raw_spans() {
        let md = "Use `{{ x }}` here.\n\n```\n{% for x in y %}\n```\n";
        let (html, _) = render_markdown(md, MarkdownFlavor::CommonMark);
        assert!(html.contains("{% raw %}<code>{{ x }}</code>{% endraw %}"));
        assert!(html.contains("<pre><code>{% for x in y %}\n</code></pre>\n{% endraw %}"));
        assert_eq!(html.matches(RAW_START).count(), 2);
        assert_eq!(html.matches(RAW_END).count(), 2);
        let block_start = html.rfind(RAW_START).unwrap();
        assert!(block_start < html.find("<pre>").unwrap());
    }

    // =========================================================================
    // Directory listings
    // =========================================================================

    #[test]
    fn directory_contents_lists_pages_with_titles() {
        let site = Site::new();
        site.write("content/blog/index.md", "---\ntitle: Blog\n---\n");
        site.write("content/blog/b-second.md", "no front matter");
        site.write("content/blog/a-first.md", "---\ntitle: First\n---\nbody");
        site.write("content/blog/notes.txt", "skip");
        site.write("content/blog/2024/deep.md", "skip");

        let links = directory_contents(&site.paths.content, "blog").unwrap();
        assert_eq!(
            links,
            vec![
                PageLink {
                    slug: "blog/a-first".into(),
                    title: Some("First".into()),
                },
                PageLink {
                    slug: "blog/b-second".into(),
                    title: None,
                },
            ]
        );
    }

    #[test]
    fn directory_contents_root_and_missing() {
        let site = Site::new();
        site.write("content/index.md", "home");
        site.write("content/about.md", "about");

        let links = directory_contents(&site.paths.content, "").unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].slug, "about");

        assert!(matches!(
            directory_contents(&site.paths.content, "nope"),
            Err(RenderError::MissingDirectory(_))
        ));
        assert!(matches!(
            directory_contents(&site.paths.content, "../data"),
            Err(RenderError::MissingDirectory(_))
        ));
    }

    // =========================================================================
    // Data files
    // =========================================================================

    #[test]
    fn load_data_nests_by_path() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("data");
        fs::create_dir_all(dir.join("team")).unwrap();
        fs::write(dir.join("nav.json"), r#"["home","about"]"#).unwrap();
        fs::write(dir.join("team/people.json"), r#"{"lead":"Ana"}"#).unwrap();

        let data = load_data(&dir);
        assert_eq!(data["nav"], json!(["home", "about"]));
        assert_eq!(data["team"]["people"]["lead"], "Ana");
    }

    #[test]
    fn load_data_skips_invalid_json() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("data");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("bad.json"), "{nope").unwrap();
        fs::write(dir.join("good.json"), "1").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let data = load_data(&dir);
        assert_eq!(data, json!({"good": 1}));
    }

    #[test]
    fn load_data_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(load_data(&tmp.path().join("data")), json!({}));
    }

    // =========================================================================
    // MarkdownRenderer
    // =========================================================================

    #[test]
    fn renders_page_context() {
        let site = Site::new();
        site.write(
            "content/about.md",
            "---\ntitle: About\ndraft: true\n---\n# About {{ site.title }}\n\nText.\n",
        );
        site.write("data/nav.json", r#"{"home":"/"}"#);
        let engine = TemplateEngine::new(&site.paths.templates);
        let renderer = MarkdownRenderer::new(&site.paths, &site.config, &engine);

        let rendered = renderer.render("about").unwrap();
        assert_eq!(rendered.template, "content.html");
        let ctx = &rendered.context;
        assert_eq!(ctx["title"], "About");
        assert_eq!(ctx["draft"], true);
        assert_eq!(ctx["slug"], "about");
        assert_eq!(ctx["site"]["title"], "Kiln");
        assert_eq!(ctx["data"]["nav"]["home"], "/");
        let content = ctx["content"].as_str().unwrap();
        assert!(content.contains(r#"<h1 id="about-sitetitle">About Kiln</h1>"#));
        assert!(ctx["toc"].as_str().unwrap().starts_with("<ul>"));
    }

    #[test]
    fn template_syntax_in_code_stays_literal() {
        let site = Site::new();
        site.write(
            "content/jinja.md",
            "---\ntitle: Jinja\n---\nTitle is {{ title }}, written `{{ title }}`.\n\n```\n{{ title }} and {% for x in y %}\n```\n",
        );
        let engine = TemplateEngine::new(&site.paths.templates);
        let renderer = MarkdownRenderer::new(&site.paths, &site.config, &engine);

        let ctx = renderer.render("jinja").unwrap().context;
        let content = ctx["content"].as_str().unwrap();
        assert!(content.contains("Title is Jinja, written <code>{{ title }}</code>."));
        assert!(content.contains("<pre><code>{{ title }} and {% for x in y %}\n</code></pre>"));
        assert!(!content.contains(RAW_START));
    }

    #[test]
    fn front_matter_template_overrides_default() {
        let site = Site::new();
        site.write("content/post.md", "---\ntemplate: post.html\n---\nhi\n");
        let engine = TemplateEngine::new(&site.paths.templates);
        let renderer = MarkdownRenderer::new(&site.paths, &site.config, &engine);
        assert_eq!(renderer.render("post").unwrap().template, "post.html");
    }

    #[test]
    fn reserved_keys_win_over_front_matter() {
        let site = Site::new();
        site.write("content/x.md", "---\nslug: other\ndraft: \"1\"\n---\nbody\n");
        let engine = TemplateEngine::new(&site.paths.templates);
        let renderer = MarkdownRenderer::new(&site.paths, &site.config, &engine);
        let ctx = renderer.render("x").unwrap().context;
        assert_eq!(ctx["slug"], "x");
        assert_eq!(ctx["draft"], true);
        assert!(ctx["now"].is_string());
    }

    #[test]
    fn missing_content_uses_exact_template() {
        let site = Site::new();
        site.write("templates/contact.html", "contact");
        site.write("templates/*.html", "fallback");
        let engine = TemplateEngine::new(&site.paths.templates);
        let renderer = MarkdownRenderer::new(&site.paths, &site.config, &engine);

        let rendered = renderer.render("contact").unwrap();
        assert_eq!(rendered.template, "contact.html");
        assert_eq!(rendered.context["content"], "");
    }

    #[test]
    fn missing_content_uses_wildcard_template() {
        let site = Site::new();
        site.write("templates/blog/*.html", "post");
        site.write("templates/*/*.html", "any");
        let engine = TemplateEngine::new(&site.paths.templates);
        let renderer = MarkdownRenderer::new(&site.paths, &site.config, &engine);

        assert_eq!(renderer.render("blog/hello").unwrap().template, "blog/*.html");
        assert_eq!(renderer.render("news/today").unwrap().template, "*/*.html");
    }

    #[test]
    fn missing_content_and_template_is_not_found() {
        let site = Site::new();
        let engine = TemplateEngine::new(&site.paths.templates);
        let renderer = MarkdownRenderer::new(&site.paths, &site.config, &engine);
        let err = renderer.render("ghost/page").unwrap_err();
        assert!(matches!(err, RenderError::NotFound(ref slug) if slug == "ghost/page"));
    }

    #[test]
    fn body_template_error_is_reported() {
        let site = Site::new();
        site.write("content/bad.md", "{% if %}\n");
        let engine = TemplateEngine::new(&site.paths.templates);
        let renderer = MarkdownRenderer::new(&site.paths, &site.config, &engine);
        assert!(matches!(renderer.render("bad"), Err(RenderError::Template(_))));
    }
}
