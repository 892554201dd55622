use crate::aggregate::AnalysisResult;
use crate::error::Result;
use crate::score::Category;
use chrono::{DateTime, Local, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Analyses kept in the store; older ones are discarded.
pub const MAX_HISTORY_ENTRIES: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_pages: usize,
    pub titles_score: u8,
    pub headings_score: u8,
    pub images_score: u8,
    pub meta_descriptions_score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub url: String,
    pub domain: String,
    pub score: u8,
    /// Unix timestamp (seconds)
    pub timestamp: i64,
    pub summary: HistorySummary,
}

impl HistoryEntry {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            url: result.target.base_url.clone(),
            domain: result.target.domain.clone(),
            score: result.overall_score,
            timestamp: result.analyzed_at,
            summary: HistorySummary {
                total_pages: result.pages_analyzed,
                titles_score: result.score_of(Category::Titles),
                headings_score: result.score_of(Category::Headings),
                images_score: result.score_of(Category::ImagesAlt),
                meta_descriptions_score: result.score_of(Category::MetaDescriptions),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_sites: usize,
    pub average_score: u8,
    pub best_score: u8,
    pub worst_score: u8,
    pub today_analyses: usize,
}

/// Past analyses, one per domain.
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = HistoryStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS analyses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                domain TEXT NOT NULL UNIQUE,
                url TEXT NOT NULL,
                score INTEGER NOT NULL CHECK(score BETWEEN 0 AND 100),
                analyzed_at INTEGER NOT NULL,
                summary TEXT NOT NULL  -- JSON
            );
            ",
        )?;
        Ok(())
    }

    pub fn save(&mut self, result: &AnalysisResult) -> Result<()> {
        self.save_entry(&HistoryEntry::from_result(result))
    }

    /// Store an entry as the newest one, replacing any earlier entry for the
    /// same domain, then drop the oldest entries beyond the cap.
    pub fn save_entry(&mut self, entry: &HistoryEntry) -> Result<()> {
        let summary = serde_json::to_string(&entry.summary)?;
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM analyses WHERE domain = ?1", params![&entry.domain])?;
        tx.execute(
            "INSERT INTO analyses (domain, url, score, analyzed_at, summary) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![&entry.domain, &entry.url, entry.score, entry.timestamp, &summary],
        )?;
        let evicted = tx.execute(
            "DELETE FROM analyses WHERE id NOT IN (SELECT id FROM analyses ORDER BY id DESC LIMIT ?1)",
            params![MAX_HISTORY_ENTRIES as i64],
        )?;

        tx.commit()?;
        debug!(
            "Saved analysis of {} (score {}), evicted {} old entries",
            entry.domain, entry.score, evicted
        );
        Ok(())
    }

    /// Most recent entries first.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, domain, score, analyzed_at, summary FROM analyses ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u8>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(url, domain, score, timestamp, summary)| -> Result<HistoryEntry> {
                Ok(HistoryEntry {
                    url,
                    domain,
                    score,
                    timestamp,
                    summary: serde_json::from_str(&summary)?,
                })
            })
            .collect()
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM analyses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Aggregates over the stored entries. Zero scores are left out of the
    /// average, best and worst figures.
    pub fn stats(&self) -> Result<HistoryStats> {
        let mut stmt = self
            .conn
            .prepare("SELECT score, analyzed_at FROM analyses")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, u8>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        if rows.is_empty() {
            return Ok(HistoryStats::default());
        }

        let scores: Vec<u8> = rows
            .iter()
            .map(|(score, _)| *score)
            .filter(|score| *score > 0)
            .collect();
        let today = Local::now().date_naive();
        let today_analyses = rows
            .iter()
            .filter(|(_, timestamp)| {
                DateTime::<Utc>::from_timestamp(*timestamp, 0)
                    .is_some_and(|dt| dt.with_timezone(&Local).date_naive() == today)
            })
            .count();

        let average_score = if scores.is_empty() {
            0
        } else {
            let sum: u32 = scores.iter().map(|s| *s as u32).sum();
            (sum as f64 / scores.len() as f64).round() as u8
        };

        Ok(HistoryStats {
            total_sites: rows.len(),
            average_score,
            best_score: scores.iter().copied().max().unwrap_or(0),
            worst_score: scores.iter().copied().min().unwrap_or(0),
            today_analyses,
        })
    }

    pub fn clear(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM analyses", [])?;
        Ok(removed)
    }
}
