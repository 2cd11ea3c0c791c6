//! Table of contents from a flat heading sequence.
//!
//! Headings arrive in document order with levels 1–6. Each gets an anchor id
//! (its slugified text) and a list item in a nested `<ul>` outline. Documents
//! rarely have perfectly monotonic levels, so the builder keeps an explicit
//! stack of open list levels instead of assuming each step is ±1:
//!
//! | Next heading vs. current | Markup emitted                              |
//! |--------------------------|---------------------------------------------|
//! | first heading            | `<ul>`                                      |
//! | deeper                   | `<ul>` nested in the open item              |
//! | same level               | `</li>`                                     |
//! | shallower                | `</li></ul>` per closed level, then `</li>` |
//!
//! followed by `<li><a href="#id">text</a>`. [`TocBuilder::finish`] closes
//! everything still open, so the output is always balanced.
//!
//! A shallower heading closes only the open levels deeper than itself, never
//! the list it lands in. After `h1 → h4`, an `h2` takes the `h4` list's place
//! under the `h1` instead of starting a new top-level item.
//!
//! Anchor ids are not de-duplicated: two headings with the same text share an
//! id, and the second link points at the first heading.
//!
//! The builder is a single-pass, order-dependent transform. Feed it the whole
//! heading sequence of one document; a partial sequence yields a partial
//! outline that cannot be resumed.

use serde::Serialize;

/// One outline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Finished outline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Toc {
    /// Nested `<ul>` markup, empty when the document has no headings.
    pub html: String,
    pub entries: Vec<TocEntry>,
}

/// Incremental outline builder. See the [module docs](self).
#[derive(Debug, Default)]
pub struct TocBuilder {
    /// Level of each open `<ul>`, outermost first. Strictly increasing.
    open_levels: Vec<u8>,
    html: String,
    entries: Vec<TocEntry>,
}

impl TocBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open lists.
    pub fn depth(&self) -> usize {
        self.open_levels.len()
    }

    /// Level of the previous heading, if any.
    pub fn last_level(&self) -> Option<u8> {
        self.open_levels.last().copied()
    }

    /// Append a heading and return its anchor id.
    pub fn push(&mut self, level: u8, text: &str) -> String {
        let level = level.clamp(1, 6);

        match self.last_level() {
            None => self.open_list(level),
            Some(last) if level > last => self.open_list(level),
            Some(last) if level == last => self.html.push_str("</li>"),
            Some(_) => {
                let deeper = self
                    .open_levels
                    .iter()
                    .rev()
                    .skip(1)
                    .take_while(|&&open| open >= level)
                    .count();
                self.close_levels(deeper);
                self.html.push_str("</li>");
                // A jump to a level between two open ones joins the shallower list
                if let Some(top) = self.open_levels.last_mut() {
                    *top = level;
                }
            }
        }

        let id = slugify(text);
        self.html.push_str("<li><a href=\"#");
        self.html.push_str(&escape_html(&id));
        self.html.push_str("\">");
        self.html.push_str(&escape_html(text));
        self.html.push_str("</a>");
        self.entries.push(TocEntry {
            level,
            id: id.clone(),
            text: text.to_string(),
        });
        id
    }

    /// Close everything still open and return the outline.
    pub fn finish(mut self) -> Toc {
        let depth = self.depth();
        self.close_levels(depth);
        Toc {
            html: self.html,
            entries: self.entries,
        }
    }

    fn open_list(&mut self, level: u8) {
        self.html.push_str("<ul>");
        self.open_levels.push(level);
    }

    /// Close the innermost `n` lists together with their open items.
    fn close_levels(&mut self, n: usize) {
        for _ in 0..n.min(self.open_levels.len()) {
            self.html.push_str("</li></ul>");
            self.open_levels.pop();
        }
    }
}

/// Build an outline from `(level, text)` pairs.
pub fn build_toc<'a>(headings: impl IntoIterator<Item = (u8, &'a str)>) -> Toc {
    let mut builder = TocBuilder::new();
    for (level, text) in headings {
        builder.push(level, text);
    }
    builder.finish()
}

/// Anchor id for heading text.
///
/// Transliterates to ASCII, lowercases, drops everything but letters, digits,
/// `_`, `-` and whitespace, then joins the remaining words with single dashes.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c == '-' || c.is_whitespace() {
            pending_dash = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
