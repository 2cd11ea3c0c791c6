//! Content discovery.
//!
//! Walks the content root and returns every markdown source in a stable,
//! sorted order. Each source becomes a [`ContentItem`] carrying the
//! fingerprint the manifest compares against on the next build.
//!
//! ## Directory Structure
//!
//! ```text
//! content/
//! ├── index.md               # slug "index"   → output/index.html
//! ├── about.md               # slug "about"   → output/about/index.html
//! ├── 2024/
//! │   └── launch.md          # slug "2024/launch"
//! └── .drafts/               # hidden entries are ignored
//! ```
//!
//! A missing content root is fatal for the run; an empty one is not.

use crate::manifest::{self, ManifestRecord};
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;
use walkdir::WalkDir;

const MARKDOWN_EXTENSION: &str = "md";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Content directory does not exist: {0}")]
    MissingRoot(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A markdown source and its fingerprint at scan time.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    /// Absolute (or root-joined) path on disk.
    pub path: PathBuf,
    /// Path relative to the content root, e.g. `2024/launch.md`. Identity.
    pub name: String,
    /// `name` without the `.md` extension, e.g. `2024/launch`.
    pub slug: String,
    /// Modification time in seconds since the epoch.
    pub mtime: f64,
    /// Hex MD5 digest of the file bytes.
    pub hash: String,
}

impl ContentItem {
    /// Fingerprint the file at `path`, named by [`manifest::item_name`].
    pub fn from_path(path: &Path) -> io::Result<Self> {
        Self::named(path, manifest::item_name(path))
    }

    /// Fingerprint a file found below the content root `root`.
    ///
    /// The name is the path relative to `root` whatever the root is called.
    /// A path outside `root` falls back to [`manifest::item_name`].
    pub fn from_root(root: &Path, path: &Path) -> io::Result<Self> {
        let name = relative_name(root, path).unwrap_or_else(|| manifest::item_name(path));
        Self::named(path, name)
    }

    fn named(path: &Path, name: String) -> io::Result<Self> {
        let slug = slug_for(&name);
        Ok(Self {
            path: path.to_path_buf(),
            name,
            slug,
            mtime: file_mtime(path)?,
            hash: manifest::hash_file(path)?,
        })
    }

    /// The fingerprint as it is persisted in the manifest.
    pub fn record(&self) -> ManifestRecord {
        ManifestRecord {
            mtime: self.mtime,
            md5: self.hash.clone(),
        }
    }

    /// Where this item's HTML lands below `output_root`.
    ///
    /// `index` and `<dir>/index` map onto the directory itself so the site
    /// root gets an `index.html`; every other slug becomes `<slug>/index.html`.
    pub fn output_path(&self, output_root: &Path) -> PathBuf {
        output_path_for_slug(output_root, &self.slug)
    }
}

/// Output location for a slug. See [`ContentItem::output_path`].
pub fn output_path_for_slug(output_root: &Path, slug: &str) -> PathBuf {
    let dir = match slug.strip_suffix("index") {
        Some(prefix) if prefix.is_empty() || prefix.ends_with('/') => prefix,
        _ => slug,
    };
    let mut path = output_root.to_path_buf();
    for segment in dir.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.join("index.html")
}

/// `path` relative to `root`, `/`-joined. `None` when `path` is not below it.
pub fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let segments: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!segments.is_empty()).then(|| segments.join("/"))
}

/// Strip the markdown extension from an item name.
pub fn slug_for(name: &str) -> String {
    name.strip_suffix(".md").unwrap_or(name).to_string()
}

/// Modification time of `path` as float seconds since the epoch.
pub fn file_mtime(path: &Path) -> io::Result<f64> {
    let modified = path.metadata()?.modified()?;
    let since_epoch = modified
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::other(e.to_string()))?;
    Ok(since_epoch.as_secs_f64())
}

/// Enumerate every markdown file below `root`, sorted by path.
///
/// Hidden files and directories (leading `.`) are skipped.
pub fn scan(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }

    let mut paths = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && is_markdown(entry.path()) {
            paths.push(entry.into_path());
        }
    }

    paths.sort();
    Ok(paths)
}

/// Scan and fingerprint every item. Used by `check` and the post-build
/// artifact generators, which need the full inventory rather than paths.
pub fn scan_items(root: &Path) -> Result<Vec<ContentItem>, ScanError> {
    scan(root)?
        .iter()
        .map(|p| ContentItem::from_root(root, p).map_err(ScanError::from))
        .collect()
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(MARKDOWN_EXTENSION))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }

    // =========================================================================
    // scan
    // =========================================================================

    #[test]
    fn scan_finds_nested_markdown_sorted() {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        write(&content, "b.md", "# B");
        write(&content, "a.md", "# A");
        write(&content, "2024/launch.md", "# Launch");

        let paths = scan(&content).unwrap();
        let rel: Vec<String> = paths
            .iter()
            .map(|p| p.strip_prefix(&content).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(rel, vec!["2024/launch.md", "a.md", "b.md"]);
    }

    #[test]
    fn scan_ignores_other_extensions_and_hidden_entries() {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        write(&content, "page.md", "");
        write(&content, "notes.txt", "");
        write(&content, ".hidden.md", "");
        write(&content, ".drafts/secret.md", "");

        let paths = scan(&content).unwrap();
        assert_eq!(paths, vec![content.join("page.md")]);
    }

    #[test]
    fn scan_empty_root_is_ok() {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        fs::create_dir_all(&content).unwrap();
        assert!(scan(&content).unwrap().is_empty());
    }

    #[test]
    fn scan_missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = scan(&tmp.path().join("content"));
        assert!(matches!(result, Err(ScanError::MissingRoot(_))));
    }

    // =========================================================================
    // ContentItem
    // =========================================================================

    #[test]
    fn content_item_name_and_slug() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp.path().join("content"), "2024/launch.md", "# Launch");

        let item = ContentItem::from_path(&path).unwrap();
        assert_eq!(item.name, "2024/launch.md");
        assert_eq!(item.slug, "2024/launch");
        assert_eq!(item.hash.len(), 32);
        assert!(item.mtime > 0.0);
    }

    #[test]
    fn content_item_named_relative_to_any_root() {
        let tmp = TempDir::new().unwrap();
        let pages = tmp.path().join("pages");
        let a = write(&pages, "a/index.md", "a");
        let b = write(&pages, "b/index.md", "b");

        let a = ContentItem::from_root(&pages, &a).unwrap();
        let b = ContentItem::from_root(&pages, &b).unwrap();
        assert_eq!(a.name, "a/index.md");
        assert_eq!(b.slug, "b/index");
        assert_ne!(a.output_path(Path::new("out")), b.output_path(Path::new("out")));
    }

    #[test]
    fn relative_name_outside_root() {
        assert_eq!(
            relative_name(Path::new("/site/pages"), Path::new("/site/pages/blog/post.md")).as_deref(),
            Some("blog/post.md")
        );
        assert_eq!(relative_name(Path::new("/site/pages"), Path::new("/elsewhere/post.md")), None);
        assert_eq!(relative_name(Path::new("/site/pages"), Path::new("/site/pages")), None);
    }

    #[test]
    fn content_item_record_matches_fingerprint() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp.path().join("content"), "a.md", "body");
        let item = ContentItem::from_path(&path).unwrap();
        let record = item.record();
        assert_eq!(record.mtime, item.mtime);
        assert_eq!(record.md5, item.hash);
    }

    #[test]
    fn scan_items_fingerprints_everything() {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        write(&content, "a.md", "one");
        write(&content, "b.md", "two");
        let items = scan_items(&content).unwrap();
        assert_eq!(items.len(), 2);
        assert_ne!(items[0].hash, items[1].hash);
    }

    #[test]
    fn slug_strips_only_trailing_extension() {
        assert_eq!(slug_for("notes.md"), "notes");
        assert_eq!(slug_for("my.md.guide.md"), "my.md.guide");
        assert_eq!(slug_for("staticfiles.json"), "staticfiles.json");
    }

    // =========================================================================
    // Output paths
    // =========================================================================

    #[test]
    fn output_path_for_plain_slug() {
        let out = Path::new("/out");
        assert_eq!(
            output_path_for_slug(out, "about"),
            PathBuf::from("/out/about/index.html")
        );
        assert_eq!(
            output_path_for_slug(out, "2024/launch"),
            PathBuf::from("/out/2024/launch/index.html")
        );
    }

    #[test]
    fn output_path_for_index_slugs() {
        let out = Path::new("/out");
        assert_eq!(output_path_for_slug(out, "index"), PathBuf::from("/out/index.html"));
        assert_eq!(
            output_path_for_slug(out, "docs/index"),
            PathBuf::from("/out/docs/index.html")
        );
        // Only a whole trailing segment counts as an index page
        assert_eq!(
            output_path_for_slug(out, "reindex"),
            PathBuf::from("/out/reindex/index.html")
        );
    }
}
