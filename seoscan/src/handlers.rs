use clap::ArgMatches;
use colored::{ColoredString, Colorize};
use seoscan_core::analysis::{AnalysisOptions, execute_analysis};
use seoscan_core::history::{HistoryEntry, HistoryStats, HistoryStore};
use seoscan_core::report::{ReportFormat, render_report, save_report, score_grade};
use seoscan_core::{AnalysisResult, Category};
use seoscan_scanner::fetch::FetchMode;
use seoscan_scanner::{ScanConfig, normalize_url};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

pub const HISTORY_DB_FILE: &str = "history.db";

// Helper functions for the analyze handler

/// Sites from either a hosts file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&String>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        parse_url_line(url)
            .map(|url| vec![url])
            .ok_or_else(|| format!("Invalid URL '{}'", url))
    } else {
        Err("Either a URL or --hosts-file must be provided".to_string())
    }
}

/// Load and normalize sites from a file, one per line. `#` starts a comment.
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Normalize one line into a site base URL
pub fn parse_url_line(line: &str) -> Option<String> {
    match normalize_url(line.trim()) {
        Ok(target) => Some(target.base_url),
        Err(e) => {
            eprintln!("{} Skipping invalid URL '{}': {}", "⚠".yellow(), line, e);
            None
        }
    }
}

/// The history database inside a (tilde-expanded) config directory
pub fn history_db_path(config_dir: &str) -> PathBuf {
    let expanded = shellexpand::tilde(config_dir);
    Path::new(expanded.as_ref()).join(HISTORY_DB_FILE)
}

pub fn open_history(config_dir: &str) -> Result<HistoryStore, String> {
    let db_path = history_db_path(config_dir);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            format!("Failed to create config directory {}: {}", parent.display(), e)
        })?;
    }
    HistoryStore::open(&db_path)
        .map_err(|e| format!("Failed to open history at {}: {}", db_path.display(), e))
}

pub fn build_scan_config(
    max_pages: usize,
    delay_ms: u64,
    timeout_secs: u64,
    headless: bool,
    skip_legal: bool,
) -> ScanConfig {
    let fetch_mode = if headless {
        FetchMode::Headless
    } else {
        FetchMode::Http
    };
    ScanConfig::default()
        .with_max_pages(max_pages)
        .with_polite_delay(Duration::from_millis(delay_ms))
        .with_timeout(Duration::from_secs(timeout_secs.max(1)))
        .with_fetch_mode(fetch_mode)
        .with_exclude_legal_pages(skip_legal)
}

/// Where to write one site's report. With several sites the domain is added to
/// the file name so reports don't overwrite each other.
pub fn report_path_for(output: &Path, domain: &str, several: bool) -> PathBuf {
    if !several {
        return output.to_path_buf();
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".to_string());
    let file_name = match output.extension() {
        Some(ext) => format!("{}-{}.{}", stem, domain, ext.to_string_lossy()),
        None => format!("{}-{}", stem, domain),
    };
    output.with_file_name(file_name)
}

pub fn colored_score(score: u8) -> ColoredString {
    let text = format!("{:>3}/100", score);
    match score {
        80..=100 => text.green().bold(),
        50..=79 => text.yellow().bold(),
        _ => text.red().bold(),
    }
}

/// Category score lines for the terminal summary
pub fn format_category_lines(result: &AnalysisResult) -> Vec<String> {
    result
        .categories
        .iter()
        .map(|(category, category_result)| {
            format!(
                "  {:<22} {}  ({} issue(s))",
                category.label(),
                colored_score(category_result.score),
                category_result.issues.len()
            )
        })
        .collect()
}

pub fn format_history_table(entries: &[HistoryEntry]) -> String {
    let mut table = String::new();
    table.push_str(&format!(
        "{:<32} {:>6} {:>6}  {}\n",
        "DOMAIN", "SCORE", "PAGES", "ANALYZED"
    ));
    for entry in entries {
        let analyzed = chrono::DateTime::<chrono::Utc>::from_timestamp(entry.timestamp, 0)
            .map(|dt| {
                dt.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            })
            .unwrap_or_else(|| "unknown".to_string());
        table.push_str(&format!(
            "{:<32} {:>6} {:>6}  {}\n",
            entry.domain, entry.score, entry.summary.total_pages, analyzed
        ));
    }
    table
}

pub fn format_stats(stats: &HistoryStats) -> String {
    format!(
        "Sites analyzed:   {}\n\
         Average score:    {}\n\
         Best score:       {}\n\
         Worst score:      {}\n\
         Analyzed today:   {}\n",
        stats.total_sites,
        stats.average_score,
        stats.best_score,
        stats.worst_score,
        stats.today_analyses
    )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> String {
    print!("{} ", msg.bright_cyan().bold());
    let _ = io::stdout().flush();
    let mut response = String::new();
    if io::stdin().read_line(&mut response).is_err() {
        return String::new();
    }
    response.trim().to_lowercase()
}

fn print_summary(result: &AnalysisResult) {
    print_divider();
    println!(
        "{} {}",
        "  SEO SCORE".bright_white().bold(),
        result.target.domain.bright_white()
    );
    print_divider();
    println!(
        "  Overall: {}  {}",
        colored_score(result.overall_score),
        score_grade(result.overall_score).dimmed()
    );
    println!(
        "  Pages: {}   Sitemaps: {}   Fetch: {}\n",
        result.pages_analyzed,
        result.sitemaps.len(),
        result.fetch_mode
    );
    for line in format_category_lines(result) {
        println!("{}", line);
    }
    println!();

    for recommendation in top_recommendations(result, 5) {
        println!("{} {}", "→".blue(), recommendation);
    }
    println!();
}

/// First recommendation of each weighted category, weakest categories first
pub fn top_recommendations(result: &AnalysisResult, limit: usize) -> Vec<String> {
    let mut weak: Vec<(&Category, u8)> = result
        .categories
        .iter()
        .filter(|(category, _)| category.weight().is_some())
        .map(|(category, category_result)| (category, category_result.score))
        .collect();
    weak.sort_by_key(|(_, score)| *score);

    weak.into_iter()
        .filter_map(|(category, _)| result.categories[category].recommendations.first())
        .take(limit)
        .cloned()
        .collect()
}

pub async fn handle_analyze(sub_matches: &ArgMatches) {
    init_tracing();

    let url = sub_matches.get_one::<String>("URL");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let quiet = sub_matches.get_flag("quiet");

    let urls = match load_urls_from_source(url, hosts_file) {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    let config = build_scan_config(
        *sub_matches.get_one::<usize>("max-pages").unwrap_or(&50),
        *sub_matches.get_one::<u64>("delay-ms").unwrap_or(&500),
        *sub_matches.get_one::<u64>("timeout").unwrap_or(&10),
        sub_matches.get_flag("headless"),
        sub_matches.get_flag("skip-legal"),
    );
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let output = sub_matches.get_one::<PathBuf>("output");
    let no_history = sub_matches.get_flag("no-history");
    let db_dir = sub_matches
        .get_one::<String>("db")
        .map(String::as_str)
        .unwrap_or("~/.config/seoscan/");

    if !quiet {
        println!("\n🔎 Analyzing {} site(s)", urls.len());
        println!("Max pages: {}", config.max_pages);
        println!("Delay: {} ms", config.polite_delay.as_millis());
        println!("Fetch mode: {}\n", config.fetch_mode);
    }

    let several = urls.len() > 1;
    let mut failures = 0;

    for url in &urls {
        let options = AnalysisOptions::new(url.as_str())
            .with_config(config.clone())
            .with_progress(!quiet);

        let result = match execute_analysis(options, None).await {
            Ok(result) => result,
            Err(e) if e.is_fatal() => {
                eprintln!("{} Skipping {}: {}", "✗".red().bold(), url, e);
                failures += 1;
                continue;
            }
            Err(e) => {
                warn!("Analysis of {} aborted: {}", url, e);
                eprintln!("{} Analysis of {} failed: {}", "✗".red().bold(), url, e);
                failures += 1;
                continue;
            }
        };

        if !quiet {
            println!("{} Analysis of {} complete\n", "✓".green().bold(), url);
            print_summary(&result);
        }

        let report = match render_report(&result, format) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("{} Failed to render report: {}", "✗".red().bold(), e);
                failures += 1;
                continue;
            }
        };

        match output {
            Some(output) => {
                let path = report_path_for(output, &result.target.domain, several);
                match save_report(&report, &path) {
                    Ok(()) => println!(
                        "{} Report saved to {}",
                        "✓".green().bold(),
                        path.display()
                    ),
                    Err(e) => {
                        eprintln!(
                            "{} Failed to save report to {}: {}",
                            "✗".red().bold(),
                            path.display(),
                            e
                        );
                        failures += 1;
                    }
                }
            }
            None => print!("{}", report),
        }

        if !no_history {
            let saved = open_history(db_dir).and_then(|mut store| {
                store
                    .save(&result)
                    .map_err(|e| format!("Failed to save history: {}", e))
            });
            if let Err(e) = saved {
                warn!("{}", e);
                eprintln!("{} {}", "⚠".yellow(), e);
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
}

fn history_store_or_exit(sub_matches: &ArgMatches) -> HistoryStore {
    let db_dir = sub_matches
        .get_one::<String>("db")
        .map(String::as_str)
        .unwrap_or("~/.config/seoscan/");
    match open_history(db_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

pub fn handle_history_list(sub_matches: &ArgMatches) {
    let limit = *sub_matches.get_one::<usize>("limit").unwrap_or(&10);
    let store = history_store_or_exit(sub_matches);

    match store.recent(limit) {
        Ok(entries) if entries.is_empty() => println!("No analyses recorded yet."),
        Ok(entries) => print!("{}", format_history_table(&entries)),
        Err(e) => {
            eprintln!("{} Failed to read history: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

pub fn handle_history_stats(sub_matches: &ArgMatches) {
    let store = history_store_or_exit(sub_matches);

    match store.stats() {
        Ok(stats) => print!("{}", format_stats(&stats)),
        Err(e) => {
            eprintln!("{} Failed to read history: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

pub fn handle_history_clear(sub_matches: &ArgMatches) {
    let force = sub_matches.get_flag("force");
    let store = history_store_or_exit(sub_matches);

    if !force {
        let response = print_prompt("Delete all stored analyses? [y/N]:");
        if response != "y" && response != "yes" {
            println!("Nothing deleted.");
            return;
        }
    }

    match store.clear() {
        Ok(removed) => println!("{} Removed {} analyses", "✓".green().bold(), removed),
        Err(e) => {
            eprintln!("{} Failed to clear history: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}
