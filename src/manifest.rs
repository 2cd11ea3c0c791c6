//! Fingerprint manifest for incremental builds.
//!
//! Rendering a page means running markdown, front matter, data files and two
//! template passes. This module lets the build skip all of that when a source
//! file has not changed since the last successful render.
//!
//! # Design
//!
//! Every rendered item gets a [`ManifestRecord`] of `(mtime, md5)` keyed by its
//! name. On the next build each item is classified with [`Manifest::freshness`]:
//!
//! | Stored record          | Classification        | Action                 |
//! |------------------------|-----------------------|------------------------|
//! | none                   | [`Freshness::New`]     | render                 |
//! | same mtime             | [`Freshness::Unchanged`] | skip                 |
//! | other mtime, same md5  | [`Freshness::Touched`] | skip, refresh mtime    |
//! | other mtime, other md5 | [`Freshness::Stale`]   | render                 |
//!
//! The mtime comparison is a cheap fast path; the hash makes the cache survive
//! `git checkout` and `touch`, which reset modification times without changing
//! content.
//!
//! ## Static assets
//!
//! One synthetic record tracks `staticfiles.json`, the fingerprint file written
//! by the static asset pipeline. When its hash differs from the stored one (or
//! nothing was stored), [`Manifest::static_files_manifest_changed`] is true for
//! this run and the build renders every page, because templates may reference
//! any asset. The per-item records are untouched by that decision.
//!
//! ## Storage
//!
//! A flat JSON object at the project's `manifest_file` (default
//! `output.json`):
//!
//! ```json
//! {
//!   "2024/launch.md": { "mtime": 1718000000.123, "md5": "9e107d9d…" },
//!   "staticfiles.json": { "mtime": 1718000001.0, "md5": "e4d909c2…" }
//! }
//! ```
//!
//! There is no schema version. A missing or unparsable file loads as an empty
//! manifest, which simply means everything renders once.

use crate::scan::ContentItem;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path};
use tracing::{debug, warn};

/// File name of the static asset fingerprint, also its manifest key.
pub const STATIC_MANIFEST_NAME: &str = "staticfiles.json";

/// Directory name item names are made relative to.
const CONTENT_DIR_MARKER: &str = "content";

/// Persisted fingerprint of one file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestRecord {
    pub mtime: f64,
    pub md5: String,
}

/// Outcome of comparing a scanned item with its stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No record yet.
    New,
    /// Same modification time.
    Unchanged,
    /// Modification time moved but the bytes are identical.
    Touched,
    /// Content changed.
    Stale,
}

impl Freshness {
    pub fn needs_render(self) -> bool {
        matches!(self, Freshness::New | Freshness::Stale)
    }
}

/// In-memory manifest. Loaded once at build start, written once at the end.
#[derive(Debug, Default)]
pub struct Manifest {
    records: BTreeMap<String, ManifestRecord>,
    dirty: bool,
    static_files_changed: bool,
}

impl Manifest {
    /// Create an empty manifest (first build).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from `path`. Returns an empty manifest if the file doesn't exist
    /// or can't be parsed.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "unreadable manifest, starting empty");
                }
                return Self::empty();
            }
        };
        match serde_json::from_str::<BTreeMap<String, ManifestRecord>>(&content) {
            Ok(records) => {
                debug!(path = %path.display(), entries = records.len(), "loaded manifest");
                Self {
                    records,
                    ..Self::default()
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt manifest, starting empty");
                Self::empty()
            }
        }
    }

    /// Look up a record by item name.
    pub fn get(&self, name: &str) -> Option<&ManifestRecord> {
        self.records.get(name)
    }

    /// Fingerprint `path` now and store it under its derived name, replacing
    /// any previous record.
    pub fn add(&mut self, path: &Path) -> io::Result<ManifestRecord> {
        let item = ContentItem::from_path(path)?;
        let record = item.record();
        self.insert(item.name, record.clone());
        Ok(record)
    }

    /// Store an already computed fingerprint.
    pub fn insert(&mut self, name: String, record: ManifestRecord) {
        self.records.insert(name, record);
        self.dirty = true;
    }

    /// Whether anything was added since load.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the static asset fingerprint changed during this run.
    pub fn static_files_manifest_changed(&self) -> bool {
        self.static_files_changed
    }

    /// Compare the static asset fingerprint file with its stored record.
    ///
    /// A missing record or a different hash stores the new fingerprint and
    /// flags the change. A missing file changes nothing.
    pub fn check_static(&mut self, static_manifest: &Path) -> io::Result<bool> {
        if !static_manifest.is_file() {
            return Ok(false);
        }
        let current = hash_file(static_manifest)?;
        let changed = self
            .get(STATIC_MANIFEST_NAME)
            .is_none_or(|stored| stored.md5 != current);
        if changed {
            self.add(static_manifest)?;
            self.static_files_changed = true;
            debug!("static asset fingerprint changed");
        }
        Ok(changed)
    }

    /// Classify a scanned item against its stored record.
    pub fn freshness(&self, item: &ContentItem) -> Freshness {
        match self.get(&item.name) {
            None => Freshness::New,
            Some(stored) if stored.mtime == item.mtime => Freshness::Unchanged,
            Some(stored) if stored.md5 == item.hash => Freshness::Touched,
            Some(_) => Freshness::Stale,
        }
    }

    /// Serialize every record and overwrite `path`.
    pub fn write_data(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(path, json)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Derive the manifest name of `path`.
///
/// The static fingerprint file is always named by its file name. Anything
/// else is named relative to the nearest ancestor directory literally called
/// `content`; with no such ancestor the file name is used. A project nesting
/// one `content` directory inside another gets names relative to the inner
/// one.
pub fn item_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if file_name == STATIC_MANIFEST_NAME {
        return file_name;
    }

    let mut segments = Vec::new();
    for component in path.components().rev() {
        match component {
            Component::Normal(part) if part == CONTENT_DIR_MARKER => {
                segments.reverse();
                return segments.join("/");
            }
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            _ => {}
        }
    }
    file_name
}

/// MD5 of a file's contents as a lowercase hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Md5::digest(&bytes)))
}
