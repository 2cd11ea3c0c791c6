//! Static asset pipeline.
//!
//! Copies `static/` into `<output>/static/` and writes
//! `<output>/static/staticfiles.json`, a sorted map of relative path to
//! SHA-256 hex digest:
//!
//! ```json
//! {
//!   "css/site.css": "3a7bd3e2…",
//!   "img/logo.svg": "9f86d081…"
//! }
//! ```
//!
//! The build fingerprints that file in its manifest. Any asset change alters
//! its bytes, which forces every page to re-render on that run.
//!
//! Runs before any page renders. Hidden files are not copied. A missing
//! `static/` directory produces an empty map.

use crate::manifest::STATIC_MANIFEST_NAME;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of one asset collection pass.
#[derive(Debug, Clone)]
pub struct CollectedAssets {
    /// Path of the written `staticfiles.json`.
    pub manifest_path: PathBuf,
    /// Relative path → SHA-256 hex.
    pub files: BTreeMap<String, String>,
}

/// Copy every asset from `static_dir` into `output_static` and write the
/// fingerprint file there.
pub fn collect_static(static_dir: &Path, output_static: &Path) -> Result<CollectedAssets, AssetError> {
    fs::create_dir_all(output_static)?;
    let mut files = BTreeMap::new();

    if static_dir.is_dir() {
        let walker = WalkDir::new(static_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(static_dir) else {
                continue;
            };
            let rel_name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if rel_name == STATIC_MANIFEST_NAME {
                continue;
            }

            let bytes = fs::read(entry.path())?;
            let dest = output_static.join(rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, &bytes)?;
            files.insert(rel_name, format!("{:x}", Sha256::digest(&bytes)));
        }
    } else {
        debug!(dir = %static_dir.display(), "no static directory");
    }

    let manifest_path = output_static.join(STATIC_MANIFEST_NAME);
    fs::write(&manifest_path, serde_json::to_string_pretty(&files)?)?;
    debug!(files = files.len(), "collected static assets");

    Ok(CollectedAssets {
        manifest_path,
        files,
    })
}
