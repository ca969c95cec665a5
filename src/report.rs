//! Text rendering of an [`AnalysisResult`].
//!
//! Styling is passed in explicitly through [`Style`], so the same result can
//! be rendered with terminal colors or as plain text.

use colored::Colorize;
use std::fmt::Write;

use crate::differ::BlockedBase;
use crate::highlight::Highlighted;
use crate::stats::AnalysisResult;
use crate::utils::format_percent;

const COOKIEBLOCK_MARKER: &str = "❋";
/// Site TLDs called out in newly blocked listings.
const NOTABLE_TLDS: [&str; 2] = ["edu", "org"];

pub trait Style {
    fn added(&self, text: &str) -> String;
    fn removed(&self, text: &str) -> String;
    fn notice(&self, text: &str) -> String;
    /// Emphasis for highlighted spans and markers.
    fn mark(&self, text: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

impl Style for Plain {
    fn added(&self, text: &str) -> String {
        text.to_string()
    }

    fn removed(&self, text: &str) -> String {
        text.to_string()
    }

    fn notice(&self, text: &str) -> String {
        text.to_string()
    }

    fn mark(&self, text: &str) -> String {
        text.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Colored;

impl Style for Colored {
    fn added(&self, text: &str) -> String {
        text.bright_green().bold().to_string()
    }

    fn removed(&self, text: &str) -> String {
        text.bright_red().bold().to_string()
    }

    fn notice(&self, text: &str) -> String {
        text.bright_yellow().bold().to_string()
    }

    fn mark(&self, text: &str) -> String {
        text.bright_yellow().bold().to_string()
    }
}

fn render_highlighted(h: &Highlighted, style: &dyn Style) -> String {
    let (before, marked, after) = h.parts();
    if marked.is_empty() {
        return before.to_string();
    }
    format!("{}{}{}", before, style.mark(marked), after)
}

/// Marks notable TLDs, e.g. the `edu` in `school.edu`.
fn render_site(site: &str, style: &dyn Style) -> String {
    for tld in NOTABLE_TLDS {
        if let Some(name) = site.strip_suffix(tld).and_then(|s| s.strip_suffix('.')) {
            return format!("{}.{}", name, style.mark(tld));
        }
    }
    site.to_string()
}

fn render_sites(sites: &[String], style: &dyn Style, mark_tlds: bool) -> String {
    sites
        .iter()
        .map(|site| {
            if mark_tlds {
                render_site(site, style)
            } else {
                site.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn cookieblock_marker(cookieblocked: bool, style: &dyn Style) -> String {
    if cookieblocked {
        style.mark(COOKIEBLOCK_MARKER)
    } else {
        String::new()
    }
}

fn render_blocked(out: &mut String, entry: &BlockedBase, style: &dyn Style, added: bool) {
    let (marker, base) = if added {
        (cookieblock_marker(entry.cookieblocked, style), style.added(&entry.base))
    } else {
        (String::new(), style.removed(&entry.base))
    };
    let _ = write!(out, "  {}{}", marker, base);
    if let Some(sites) = &entry.sites {
        let _ = write!(out, " on {}", render_sites(sites, style, added));
    }
    out.push('\n');

    for sub in &entry.subdomains {
        let marker = if added {
            cookieblock_marker(sub.cookieblocked, style)
        } else {
            String::new()
        };
        let _ = write!(out, "    • {}{}", marker, sub.domain);
        if let Some(sites) = &sub.sites {
            let _ = write!(out, " on {}", sites.join(", "));
        }
        out.push('\n');
    }
}

pub fn render(result: &AnalysisResult, style: &dyn Style) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "New action map has {} new domains and dropped {} old domains\n",
        result.keys.added,
        result.keys.dropped
    );

    let blocked = &result.blocked;
    if let Some(pct) = blocked.percent_change() {
        let _ = writeln!(
            out,
            "\nCount of blocked base domains went from {} to {} ({})",
            blocked.old_count,
            blocked.new_count,
            format_percent(pct)
        );
    }

    let _ = writeln!(
        out,
        "\n{} Newly blocked domains ({}):\n",
        style.added("++"),
        blocked.newly_blocked.len()
    );
    for entry in &blocked.newly_blocked {
        render_blocked(&mut out, entry, style, true);
    }

    if !blocked.no_longer_blocked.is_empty() {
        let _ = writeln!(
            out,
            "\n{} No longer blocked domains ({}):\n",
            style.removed("--"),
            blocked.no_longer_blocked.len()
        );
        for entry in &blocked.no_longer_blocked {
            render_blocked(&mut out, entry, style, false);
        }
    }

    if !result.mdfp.is_empty() {
        let _ = writeln!(out, "\n{} MDFP candidates:\n", style.notice("??"));
        for candidate in &result.mdfp {
            let sites = candidate
                .sites
                .iter()
                .map(|site| render_highlighted(site, style))
                .collect::<Vec<_>>()
                .join(", ");
            let other = if candidate.other_sites > 0 {
                format!(", and {} other sites", candidate.other_sites)
            } else {
                String::new()
            };
            let _ = writeln!(
                out,
                "  {} on {}{}",
                render_highlighted(&candidate.base, style),
                sites,
                other
            );
        }
    }

    if let Some(findings) = result.canvas.as_ref().filter(|f| !f.is_empty()) {
        let _ = writeln!(
            out,
            "\n{} Cookieblocked canvas fingerprinters:\n",
            style.notice("??")
        );
        for finding in findings {
            let _ = writeln!(
                out,
                "  {} on {}",
                style.notice(&finding.domain),
                finding.techniques.join(", ")
            );
        }
    }

    out
}
