// Report rendering for a finished analysis

use crate::aggregate::AnalysisResult;
use crate::score::{Category, CategoryResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const RULE: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";
const THIN_RULE: &str =
    "────────────────────────────────────────────────────────────────────────────────\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "md",
        }
    }
}

/// Qualitative band for a 0-100 score.
pub fn score_grade(score: u8) -> &'static str {
    match score {
        80..=100 => "Excellent",
        60..=79 => "Good",
        40..=59 => "Needs work",
        _ => "Poor",
    }
}

/// Render in the requested format.
pub fn render_report(result: &AnalysisResult, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(result)),
        ReportFormat::Json => generate_json_report(result),
        ReportFormat::Markdown => Ok(generate_markdown_report(result)),
    }
}

fn section(report: &mut String, title: &str) {
    report.push_str(RULE);
    report.push_str(title);
    report.push('\n');
    report.push_str(RULE);
    report.push('\n');
}

pub fn generate_text_report(result: &AnalysisResult) -> String {
    let mut report = String::new();

    // Header
    report.push_str(RULE);
    report.push_str("                           SEOSCAN SEO AUDIT REPORT\n");
    report.push_str(RULE);
    report.push('\n');

    report.push_str(&format!("Site:          {}\n", result.target.base_url));
    report.push_str(&format!("Domain:        {}\n", result.target.domain));
    report.push_str(&format!("Analyzed:      {}\n", format_timestamp(result.analyzed_at)));
    report.push_str(&format!("Fetch Mode:    {}\n", result.fetch_mode));
    report.push_str(&format!("Pages:         {}\n", result.pages_analyzed));
    report.push_str(&format!("Sitemaps:      {}\n", result.sitemaps.len()));
    report.push_str(&format!(
        "robots.txt:    {}\n",
        if result.robots.found { "found" } else { "not found" }
    ));
    report.push('\n');

    // Summary
    section(&mut report, "OVERALL SCORE");
    report.push_str(&format!(
        "  {}/100  ({})\n\n",
        result.overall_score,
        score_grade(result.overall_score)
    ));

    for (category, category_result) in &result.categories {
        let weight = category
            .weight()
            .map(|w| format!("{:>3.0}%", w * 100.0))
            .unwrap_or_else(|| "  --".to_string());
        report.push_str(&format!(
            "  {:<22} {:>3}/100   weight {}\n",
            category.label(),
            category_result.score,
            weight
        ));
    }
    report.push('\n');

    // Category details
    section(&mut report, "CATEGORY DETAILS");
    for (category, category_result) in &result.categories {
        write_text_category(&mut report, *category, category_result);
    }

    // Pages
    if !result.page_details.is_empty() {
        section(&mut report, "PAGES");
        for (idx, page) in result.page_details.iter().enumerate() {
            report.push_str(&format!("[{}] {}\n", idx + 1, page.url));
            report.push_str(&format!("Title:         {}\n", or_na(&page.title)));
            report.push_str(&format!("Description:   {}\n", or_na(&page.meta_description)));
            report.push_str(&format!("Status:        {}\n", page.status_code));
            report.push_str(&format!("Response:      {:.2}s\n", page.response_time));
            report.push_str(&format!(
                "Headings:      {} H1, structure {}/100\n",
                page.h1_count, page.heading_structure_score
            ));
            report.push_str(&format!("Canonical:     {}\n", yes_no(page.has_canonical)));
            report.push_str(&format!("Favicon:       {}\n", yes_no(page.has_favicon)));
            report.push('\n');
        }
    }

    // Footer
    report.push_str(RULE);
    report.push_str("                                End of Report\n");
    report.push_str(RULE);
    report.push_str(&format!(
        "\nGenerated by seoscan {}\n\n",
        env!("CARGO_PKG_VERSION")
    ));

    report
}

fn write_text_category(report: &mut String, category: Category, result: &CategoryResult) {
    report.push_str(&format!("{} ({}/100)\n", category.label(), result.score));

    if !result.issues.is_empty() {
        report.push_str("\nIssues:\n");
        for issue in &result.issues {
            report.push_str(&wrap_text(&format!("- {}", issue), 80, "  "));
        }
    }
    if !result.successes.is_empty() {
        report.push_str("\nPassed:\n");
        for success in &result.successes {
            report.push_str(&wrap_text(&format!("+ {}", success), 80, "  "));
        }
    }
    if !result.recommendations.is_empty() {
        report.push_str("\nRecommendations:\n");
        for recommendation in &result.recommendations {
            report.push_str(&wrap_text(&format!("> {}", recommendation), 80, "  "));
        }
    }

    report.push('\n');
    report.push_str(THIN_RULE);
    report.push('\n');
}

pub fn generate_markdown_report(result: &AnalysisResult) -> String {
    let mut report = String::new();

    report.push_str(&format!("# SEO Audit: {}\n\n", result.target.domain));
    report.push_str(&format!(
        "**Overall score: {}/100** ({})\n\n",
        result.overall_score,
        score_grade(result.overall_score)
    ));
    report.push_str(&format!("- Site: {}\n", result.target.base_url));
    report.push_str(&format!("- Analyzed: {}\n", format_timestamp(result.analyzed_at)));
    report.push_str(&format!("- Pages analyzed: {}\n", result.pages_analyzed));
    report.push_str(&format!("- Fetch mode: {}\n", result.fetch_mode));
    report.push_str(&format!(
        "- robots.txt: {}\n\n",
        if result.robots.found { "found" } else { "not found" }
    ));

    report.push_str("## Scores\n\n");
    report.push_str("| Category | Score | Weight |\n");
    report.push_str("|---|---:|---:|\n");
    for (category, category_result) in &result.categories {
        let weight = category
            .weight()
            .map(|w| format!("{:.0}%", w * 100.0))
            .unwrap_or_else(|| "-".to_string());
        report.push_str(&format!(
            "| {} | {} | {} |\n",
            category.label(),
            category_result.score,
            weight
        ));
    }
    report.push('\n');

    report.push_str("## Details\n\n");
    for (category, category_result) in &result.categories {
        report.push_str(&format!(
            "### {} ({}/100)\n\n",
            category.label(),
            category_result.score
        ));
        for issue in &category_result.issues {
            report.push_str(&format!("- ✗ {}\n", escape_markdown(issue)));
        }
        for success in &category_result.successes {
            report.push_str(&format!("- ✓ {}\n", escape_markdown(success)));
        }
        for recommendation in &category_result.recommendations {
            report.push_str(&format!("- → {}\n", escape_markdown(recommendation)));
        }
        report.push('\n');
    }

    if !result.sitemaps.is_empty() {
        report.push_str("## Sitemaps\n\n");
        for sitemap in &result.sitemaps {
            report.push_str(&format!("- {}\n", sitemap));
        }
        report.push('\n');
    }

    if !result.page_details.is_empty() {
        report.push_str("## Pages\n\n");
        report.push_str("| URL | Title | Status | Time (s) | H1 | Canonical | Favicon |\n");
        report.push_str("|---|---|---:|---:|---:|---|---|\n");
        for page in &result.page_details {
            report.push_str(&format!(
                "| {} | {} | {} | {:.2} | {} | {} | {} |\n",
                page.url,
                escape_markdown(or_na(&page.title)),
                page.status_code,
                page.response_time,
                page.h1_count,
                yes_no(page.has_canonical),
                yes_no(page.has_favicon)
            ));
        }
        report.push('\n');
    }

    report.push_str(&format!(
        "---\n_Generated by seoscan {}_\n",
        env!("CARGO_PKG_VERSION")
    ));
    report
}

pub fn generate_json_report(result: &AnalysisResult) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "seoscan",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "site": {
                "url": result.target.base_url,
                "domain": result.target.domain,
                "analyzed_at": format_iso8601_timestamp(result.analyzed_at),
                "fetch_mode": result.fetch_mode
            },
            "summary": {
                "overall_score": result.overall_score,
                "grade": score_grade(result.overall_score),
                "pages_analyzed": result.pages_analyzed,
                "total_issues": result.total_issues()
            },
            "categories": result.categories,
            "page_details": result.page_details,
            "sitemaps": result.sitemaps,
            "robots": {
                "found": result.robots.found,
                "disallow_rules": result.robots.disallow_rules,
                "allow_rules": result.robots.allow_rules,
                "crawl_delay": result.robots.crawl_delay,
                "sitemap_urls": result.robots.sitemap_urls,
                "user_agents": result.robots.user_agents
            }
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

// Helper functions
fn or_na(text: &str) -> &str {
    if text.is_empty() { "N/A" } else { text }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|")
}

fn format_timestamp(timestamp: i64) -> String {
    use chrono::{DateTime, Utc};
    let datetime = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
    datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn format_iso8601_timestamp(timestamp: i64) -> String {
    use chrono::{DateTime, Utc};
    let datetime = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
    datetime.to_rfc3339()
}

fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let mut result = String::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() + 1 > width - indent.len() && !current_line.is_empty() {
            result.push_str(indent);
            result.push_str(&current_line);
            result.push('\n');
            current_line.clear();
        }

        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        result.push_str(indent);
        result.push_str(&current_line);
        result.push('\n');
    }

    result
}
