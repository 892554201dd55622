// Tests for the analysis history store

use seoscan_core::aggregate::assemble;
use seoscan_core::history::{
    HistoryEntry, HistoryStats, HistoryStore, HistorySummary, MAX_HISTORY_ENTRIES,
};
use seoscan_scanner::{CrawlOutcome, FetchMode, PageSignals, RobotsReport, normalize_url};
use tempfile::TempDir;

fn create_test_store() -> (TempDir, HistoryStore) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("history.db");
    let store = HistoryStore::open(&db_path).unwrap();
    (temp_dir, store)
}

fn entry(domain: &str, score: u8) -> HistoryEntry {
    HistoryEntry {
        url: format!("https://{}", domain),
        domain: domain.to_string(),
        score,
        timestamp: chrono::Utc::now().timestamp(),
        summary: HistorySummary {
            total_pages: 3,
            titles_score: score,
            ..HistorySummary::default()
        },
    }
}

// ============================================================================
// Store Creation Tests
// ============================================================================

#[test]
fn test_store_creation() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("history.db");

    let store = HistoryStore::open(&db_path);
    assert!(store.is_ok());
    assert!(db_path.exists());
    assert!(store.unwrap().is_empty().unwrap());
}

#[test]
fn test_store_persists_across_open() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("history.db");

    {
        let mut store = HistoryStore::open(&db_path).unwrap();
        store.save_entry(&entry("example.com", 72)).unwrap();
    }

    let store = HistoryStore::open(&db_path).unwrap();
    let recent = store.recent(10).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].domain, "example.com");
    assert_eq!(recent[0].summary.titles_score, 72);
}

// ============================================================================
// Save / Recent Tests
// ============================================================================

#[test]
fn test_recent_newest_first() {
    let (_temp_dir, mut store) = create_test_store();
    store.save_entry(&entry("first.test", 10)).unwrap();
    store.save_entry(&entry("second.test", 20)).unwrap();
    store.save_entry(&entry("third.test", 30)).unwrap();

    let recent = store.recent(2).unwrap();
    let domains: Vec<&str> = recent.iter().map(|e| e.domain.as_str()).collect();
    assert_eq!(domains, vec!["third.test", "second.test"]);
}

#[test]
fn test_same_domain_replaces_prior_entry() {
    let (_temp_dir, mut store) = create_test_store();
    store.save_entry(&entry("example.com", 40)).unwrap();
    store.save_entry(&entry("other.org", 55)).unwrap();
    store.save_entry(&entry("example.com", 81)).unwrap();

    let recent = store.recent(10).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].domain, "example.com");
    assert_eq!(recent[0].score, 81);
    assert_eq!(recent[1].domain, "other.org");
}

#[test]
fn test_store_capped_keeping_newest() {
    let (_temp_dir, mut store) = create_test_store();
    for i in 0..(MAX_HISTORY_ENTRIES + 5) {
        store
            .save_entry(&entry(&format!("site{}.test", i), 50))
            .unwrap();
    }

    assert_eq!(store.len().unwrap(), MAX_HISTORY_ENTRIES);
    let recent = store.recent(100).unwrap();
    assert_eq!(recent.len(), MAX_HISTORY_ENTRIES);
    assert_eq!(recent[0].domain, format!("site{}.test", MAX_HISTORY_ENTRIES + 4));
    assert!(recent.iter().all(|e| e.domain != "site4.test"));
    assert!(recent.iter().any(|e| e.domain == "site5.test"));
}

#[test]
fn test_save_analysis_result() {
    let (_temp_dir, mut store) = create_test_store();
    let result = assemble(CrawlOutcome {
        target: normalize_url("www.example.com").unwrap(),
        robots: RobotsReport::not_found(),
        sitemaps: Vec::new(),
        pages: vec![PageSignals {
            url: "https://www.example.com".to_string(),
            status_code: 200,
            ..PageSignals::default()
        }],
        fetch_mode: FetchMode::Http,
    });

    store.save(&result).unwrap();

    let recent = store.recent(1).unwrap();
    assert_eq!(recent[0].url, "https://www.example.com");
    assert_eq!(recent[0].domain, "example.com");
    assert_eq!(recent[0].score, result.overall_score);
    assert_eq!(recent[0].timestamp, result.analyzed_at);
    assert_eq!(recent[0].summary.total_pages, 1);
    assert_eq!(recent[0].summary.images_score, 100);
    assert_eq!(recent[0].summary.headings_score, 0);
}

// ============================================================================
// Stats / Clear Tests
// ============================================================================

#[test]
fn test_stats_empty() {
    let store = HistoryStore::open_in_memory().unwrap();
    assert_eq!(store.stats().unwrap(), HistoryStats::default());
}

#[test]
fn test_stats_aggregates() {
    let mut store = HistoryStore::open_in_memory().unwrap();
    store.save_entry(&entry("a.test", 90)).unwrap();
    store.save_entry(&entry("b.test", 61)).unwrap();
    store.save_entry(&entry("c.test", 0)).unwrap();

    let mut old = entry("d.test", 40);
    old.timestamp -= 3 * 24 * 60 * 60;
    store.save_entry(&old).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_sites, 4);
    assert_eq!(stats.average_score, 64);
    assert_eq!(stats.best_score, 90);
    assert_eq!(stats.worst_score, 40);
    assert_eq!(stats.today_analyses, 3);
}

#[test]
fn test_clear() {
    let (_temp_dir, mut store) = create_test_store();
    store.save_entry(&entry("a.test", 50)).unwrap();
    store.save_entry(&entry("b.test", 60)).unwrap();

    assert_eq!(store.clear().unwrap(), 2);
    assert!(store.is_empty().unwrap());
    assert!(store.recent(10).unwrap().is_empty());
}
