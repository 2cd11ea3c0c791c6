//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Each page leads with
//! its positional index and title; the source file, output path and build
//! status follow as indented context lines. Build progress is the exception:
//! it streams one line per page as workers finish, in completion order.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! - Create about/index.html
//! - Update index.html
//! - Skip blog/post.md because the modified date is not changed
//! - Error content/broken.md: no content file or template matches 'broken'
//!
//! Created 1, updated 1, skipped 1, failed 1 (3 threads, 0.04s)
//! - Static assets changed, rendered every page
//! - Wrote sitemap.xml
//! - Update output.json manifest
//! Output HTML to: output
//! ```
//!
//! ## Check
//!
//! ```text
//! Pages
//! 001 About → about/index.html
//!     Source: about.md
//!     Status: unchanged
//!
//! 1 page (1 unchanged)
//! ```
//!
//! ## Templates
//!
//! ```text
//! Templates for blog/post
//!     exact: blog/post.html (missing)
//! 001 blog/*.html (102) ← selected
//! 002 */post.html (201)
//! 003 */*.html (300)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::builder::{BuildEvent, BuildReport, PageStatus};
use crate::manifest::Freshness;
use crate::wildcard::WildcardCandidate;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page` / `2 pages`.
fn pages_noun(n: usize) -> String {
    if n == 1 {
        "1 page".to_string()
    } else {
        format!("{n} pages")
    }
}

fn freshness_label(freshness: Freshness) -> &'static str {
    match freshness {
        Freshness::New => "new",
        Freshness::Unchanged => "unchanged",
        Freshness::Touched => "touched",
        Freshness::Stale => "changed",
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format a single build progress event as display lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::Created { output, .. } => {
            vec![format!("- Create {}", output.display())]
        }
        BuildEvent::Updated { output, .. } => {
            vec![format!("- Update {}", output.display())]
        }
        BuildEvent::Skipped { name, reason } => {
            vec![format!("- Skip {} because {}", name, reason)]
        }
        BuildEvent::Failed { error } => vec![format!("- Error {}", error)],
    }
}

/// Format the end-of-build summary.
pub fn format_build_summary(report: &BuildReport, output_dir: &Path, manifest_file: &str) -> Vec<String> {
    let mut lines = vec![String::new()];

    let mut counts = format!(
        "Created {}, updated {}, skipped {}",
        report.created, report.updated, report.skipped
    );
    if report.has_errors() {
        counts.push_str(&format!(", failed {}", report.errors.len()));
    }
    lines.push(format!(
        "{} ({} {}, {:.2}s)",
        counts,
        report.threads,
        if report.threads == 1 { "thread" } else { "threads" },
        report.elapsed.as_secs_f64()
    ));

    if report.static_changed {
        lines.push("- Static assets changed, rendered every page".to_string());
    }
    for artifact in &report.artifacts {
        let name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| artifact.display().to_string());
        lines.push(format!("- Wrote {}", name));
    }
    if report.manifest_written {
        lines.push(format!("- Update {} manifest", manifest_file));
    }
    lines.push(format!("Output HTML to: {}", output_dir.display()));
    lines
}

/// Format the full error list printed after a build.
pub fn format_errors(errors: &[String]) -> Vec<String> {
    if errors.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!(
        "{} failed:",
        pages_noun(errors.len())
    )];
    lines.extend(errors.iter().map(|e| format!("{}{}", indent(1), e)));
    lines
}

/// Print the end-of-build summary and any errors to stdout.
pub fn print_build_summary(report: &BuildReport, output_dir: &Path, manifest_file: &str) {
    for line in format_build_summary(report, output_dir, manifest_file) {
        println!("{}", line);
    }
    for line in format_errors(&report.errors) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the content inventory with each page's build status.
pub fn format_check_output(pages: &[PageStatus]) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];

    for (i, page) in pages.iter().enumerate() {
        let title = page.title.as_deref().unwrap_or(&page.slug);
        lines.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            title,
            page.output.display()
        ));
        lines.push(format!("{}Source: {}", indent(1), page.name));
        let mut status = freshness_label(page.freshness).to_string();
        if page.draft {
            status.push_str(", draft");
        }
        lines.push(format!("{}Status: {}", indent(1), status));
    }

    let tally: Vec<String> = [
        Freshness::New,
        Freshness::Stale,
        Freshness::Touched,
        Freshness::Unchanged,
    ]
    .into_iter()
    .filter_map(|f| {
        let n = pages.iter().filter(|p| p.freshness == f).count();
        (n > 0).then(|| format!("{} {}", n, freshness_label(f)))
    })
    .collect();

    lines.push(String::new());
    if tally.is_empty() {
        lines.push("0 pages".to_string());
    } else {
        lines.push(format!("{} ({})", pages_noun(pages.len()), tally.join(", ")));
    }
    lines
}

/// Print check output to stdout.
pub fn print_check_output(pages: &[PageStatus]) {
    for line in format_check_output(pages) {
        println!("{}", line);
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Format the template lookup order for a slug.
///
/// `exact` is whether `<slug>.html` exists; `candidates` pairs every wildcard
/// candidate with whether its template exists. The first existing template is
/// marked as selected.
pub fn format_candidates(slug: &str, exact: bool, candidates: &[(WildcardCandidate, bool)]) -> Vec<String> {
    let mut lines = vec![format!("Templates for {}", slug)];
    lines.push(format!(
        "{}exact: {}.html ({})",
        indent(1),
        slug,
        if exact { "selected" } else { "missing" }
    ));

    let mut selected = exact;
    for (i, (candidate, exists)) in candidates.iter().enumerate() {
        let mut line = format!("{} {}", format_index(i + 1), candidate);
        if *exists && !selected {
            line.push_str(" \u{2190} selected");
            selected = true;
        } else if *exists {
            line.push_str(" (exists)");
        }
        lines.push(line);
    }

    if !selected {
        lines.push(format!("No template matches {}", slug));
    }
    lines
}

/// Print template candidates to stdout.
pub fn print_candidates(slug: &str, exact: bool, candidates: &[(WildcardCandidate, bool)]) {
    for line in format_candidates(slug, exact, candidates) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SkipReason;
    use crate::wildcard;
    use std::path::PathBuf;
    use std::time::Duration;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn pages_noun_pluralizes() {
        assert_eq!(pages_noun(1), "1 page");
        assert_eq!(pages_noun(3), "3 pages");
    }

    // =========================================================================
    // Build event formatting tests
    // =========================================================================

    #[test]
    fn format_created_and_updated() {
        let created = BuildEvent::Created {
            slug: "about".into(),
            output: PathBuf::from("about/index.html"),
        };
        let updated = BuildEvent::Updated {
            slug: "index".into(),
            output: PathBuf::from("index.html"),
        };
        assert_eq!(format_build_event(&created), vec!["- Create about/index.html"]);
        assert_eq!(format_build_event(&updated), vec!["- Update index.html"]);
    }

    #[test]
    fn format_skip_reasons() {
        let unchanged = BuildEvent::Skipped {
            name: "a.md".into(),
            reason: SkipReason::Unchanged,
        };
        let touched = BuildEvent::Skipped {
            name: "a.md".into(),
            reason: SkipReason::Touched,
        };
        assert_eq!(
            format_build_event(&unchanged),
            vec!["- Skip a.md because the modified date is not changed"]
        );
        assert_eq!(
            format_build_event(&touched),
            vec!["- Skip a.md because the content is not changed"]
        );
    }

    #[test]
    fn format_failed_event() {
        let event = BuildEvent::Failed {
            error: "content/x.md: boom".into(),
        };
        assert_eq!(format_build_event(&event), vec!["- Error content/x.md: boom"]);
    }

    // =========================================================================
    // Summary and errors
    // =========================================================================

    fn report() -> BuildReport {
        BuildReport {
            created: 2,
            updated: 1,
            skipped: 4,
            threads: 3,
            elapsed: Duration::from_millis(1500),
            ..BuildReport::default()
        }
    }

    #[test]
    fn summary_clean_build() {
        let lines = format_build_summary(&report(), Path::new("output"), "output.json");
        assert_eq!(
            lines,
            vec![
                "",
                "Created 2, updated 1, skipped 4 (3 threads, 1.50s)",
                "Output HTML to: output",
            ]
        );
    }

    #[test]
    fn summary_with_everything() {
        let mut report = report();
        report.threads = 1;
        report.errors = vec!["a.md: x".into()];
        report.static_changed = true;
        report.manifest_written = true;
        report.artifacts = vec![PathBuf::from("/site/output/sitemap.xml")];

        let lines = format_build_summary(&report, Path::new("output"), "output.json");
        assert_eq!(lines[1], "Created 2, updated 1, skipped 4, failed 1 (1 thread, 1.50s)");
        assert_eq!(lines[2], "- Static assets changed, rendered every page");
        assert_eq!(lines[3], "- Wrote sitemap.xml");
        assert_eq!(lines[4], "- Update output.json manifest");
    }

    #[test]
    fn errors_listed_indented() {
        let lines = format_errors(&["a.md: one".into(), "b.md: two".into()]);
        assert_eq!(lines, vec!["2 pages failed:", "    a.md: one", "    b.md: two"]);
        assert!(format_errors(&[]).is_empty());
    }

    // =========================================================================
    // Check
    // =========================================================================

    fn status(name: &str, title: Option<&str>, freshness: Freshness) -> PageStatus {
        let slug = crate::scan::slug_for(name);
        PageStatus {
            output: crate::scan::output_path_for_slug(Path::new(""), &slug),
            name: name.to_string(),
            slug,
            title: title.map(str::to_string),
            freshness,
            draft: false,
        }
    }

    #[test]
    fn check_output_lists_pages() {
        let mut draft = status("wip.md", None, Freshness::New);
        draft.draft = true;
        let pages = vec![
            status("about.md", Some("About"), Freshness::Unchanged),
            status("index.md", Some("Home"), Freshness::Stale),
            draft,
        ];
        let lines = format_check_output(&pages);
        assert_eq!(lines[0], "Pages");
        assert_eq!(lines[1], "001 About \u{2192} about/index.html");
        assert_eq!(lines[2], "    Source: about.md");
        assert_eq!(lines[3], "    Status: unchanged");
        assert_eq!(lines[4], "002 Home \u{2192} index.html");
        assert_eq!(lines[7], "003 wip \u{2192} wip/index.html");
        assert_eq!(lines[9], "    Status: new, draft");
        assert_eq!(lines.last().unwrap(), "3 pages (1 new, 1 changed, 1 unchanged)");
    }

    #[test]
    fn check_output_empty() {
        assert_eq!(format_check_output(&[]), vec!["Pages", "", "0 pages"]);
    }

    // =========================================================================
    // Templates
    // =========================================================================

    #[test]
    fn candidates_mark_first_existing() {
        let candidates: Vec<(WildcardCandidate, bool)> = wildcard::candidates("a/b")
            .into_iter()
            .map(|c| {
                let exists = c.template_name() != "a/*.html";
                (c, exists)
            })
            .collect();
        let lines = format_candidates("a/b", false, &candidates);
        assert_eq!(
            lines,
            vec![
                "Templates for a/b",
                "    exact: a/b.html (missing)",
                "001 a/*.html (102)",
                "002 */b.html (201) \u{2190} selected",
                "003 */*.html (300) (exists)",
            ]
        );
    }

    #[test]
    fn candidates_exact_wins() {
        let candidates: Vec<(WildcardCandidate, bool)> =
            wildcard::candidates("a/b").into_iter().map(|c| (c, true)).collect();
        let lines = format_candidates("a/b", true, &candidates);
        assert_eq!(lines[1], "    exact: a/b.html (selected)");
        assert!(lines.iter().all(|l| !l.contains('\u{2190}')));
    }

    #[test]
    fn candidates_none_found() {
        let candidates: Vec<(WildcardCandidate, bool)> =
            wildcard::candidates("a/b").into_iter().map(|c| (c, false)).collect();
        let lines = format_candidates("a/b", false, &candidates);
        assert_eq!(lines.last().unwrap(), "No template matches a/b");
    }
}
