//! Wildcard fallback templates.
//!
//! A request for a slug with no content file can still be served by a
//! template whose path matches the slug with some segments replaced by `*`.
//! For `blog/2024/launch` the candidates include `blog/2024/*.html`,
//! `blog/*/*.html`, `*/2024/*.html` and the catch-all `*/*/*.html`.
//!
//! ## Candidate generation
//!
//! For every index pair `(outer, inner)` over the slug's segments:
//!
//! - `outer == inner`: wildcard only segment `outer`
//! - `0 < outer < inner`: keep the first `outer` segments, wildcard the rest
//! - `outer > inner` with `count - outer - 1 > 0` remaining segments: keep
//!   segment `outer` alone and pad both sides with that many wildcards
//!
//! Multi-segment slugs additionally get the all-wildcard catch-all.
//!
//! ## Ranking
//!
//! Each segment at index `i` scores `count - i` when literal and
//! `(count - i) * 100` when a wildcard, so wildcards near the root cost the
//! most. Candidates sort ascending by score (stable); the caller probes them in
//! that order and the first template that exists wins.

use std::fmt;

/// Marker replacing a path segment.
pub const WILDCARD: &str = "*";

const TEMPLATE_EXTENSION: &str = ".html";

/// Weight multiplier for wildcard segments.
const WILDCARD_WEIGHT: usize = 100;

/// A fallback template path with its specificity score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardCandidate {
    segments: Vec<String>,
    score: usize,
}

impl WildcardCandidate {
    fn new(segments: Vec<String>) -> Self {
        let score = score_segments(&segments);
        Self { segments, score }
    }

    /// Lower is more specific.
    pub fn score(&self) -> usize {
        self.score
    }

    /// Template name, e.g. `blog/*.html`.
    pub fn template_name(&self) -> String {
        format!("{}{}", self.segments.join("/"), TEMPLATE_EXTENSION)
    }
}

impl fmt::Display for WildcardCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.template_name(), self.score)
    }
}

fn score_segments(segments: &[String]) -> usize {
    let count = segments.len();
    segments
        .iter()
        .enumerate()
        .map(|(idx, segment)| {
            let weight = count - idx;
            if segment == WILDCARD {
                weight * WILDCARD_WEIGHT
            } else {
                weight
            }
        })
        .sum()
}

/// All wildcard candidates for `slug`, most specific first.
///
/// Duplicate paths keep only their first (best-ranked) occurrence.
pub fn candidates(slug: &str) -> Vec<WildcardCandidate> {
    let pieces: Vec<&str> = slug.split('/').collect();
    let count = pieces.len();
    let wildcards = |n: usize| std::iter::repeat_n(WILDCARD, n);

    let mut generated: Vec<Vec<String>> = Vec::new();

    if count > 1 {
        generated.push(wildcards(count).map(String::from).collect());
    }

    for outer in 0..count {
        for inner in 0..count {
            let segments: Vec<&str> = if outer == inner {
                pieces[..outer]
                    .iter()
                    .copied()
                    .chain(wildcards(1))
                    .chain(pieces[outer + 1..].iter().copied())
                    .collect()
            } else if outer < inner && outer > 0 {
                pieces[..outer]
                    .iter()
                    .copied()
                    .chain(wildcards(count - outer))
                    .collect()
            } else if outer > inner && count - outer - 1 > 0 {
                let pad = count - outer - 1;
                wildcards(pad)
                    .chain(std::iter::once(pieces[outer]))
                    .chain(wildcards(pad))
                    .collect()
            } else {
                continue;
            };
            generated.push(segments.into_iter().map(String::from).collect());
        }
    }

    let mut ranked: Vec<WildcardCandidate> =
        generated.into_iter().map(WildcardCandidate::new).collect();
    ranked.sort_by_key(WildcardCandidate::score);

    let mut seen = std::collections::HashSet::new();
    ranked.retain(|c| seen.insert(c.segments.clone()));
    ranked
}

/// Template names for `slug`, most specific first.
pub fn candidate_templates(slug: &str) -> Vec<String> {
    candidates(slug)
        .iter()
        .map(WildcardCandidate::template_name)
        .collect()
}

/// Probe candidates in rank order and return the first one `exists` accepts.
///
/// `None` means no fallback template matches; callers surface it as
/// not-found.
pub fn resolve(slug: &str, exists: impl Fn(&str) -> bool) -> Option<String> {
    candidate_templates(slug)
        .into_iter()
        .find(|name| exists(name))
}
