use rusqlite::{Connection, OptionalExtension, Result, params};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use sitescout_discovery::AggregationResult;

/// SQLite-backed sink for discovery results: one row per run, the unique
/// URL list per run, and a rolling per-domain summary record.
pub struct ResultStore {
    conn: Connection,
}

#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: String,
    pub domain: String,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub status: String,
    pub total_urls: Option<i64>,
    pub last_modified: Option<String>,
    pub blob_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DomainRecord {
    pub domain: String,
    pub last_run_id: String,
    pub last_crawled: i64,
    pub total_urls: i64,
    pub last_modified: Option<String>,
    pub blob_path: Option<String>,
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

impl ResultStore {
    pub fn drop(path: &Path) {
        fs::remove_file(path).unwrap();
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Optimize for concurrent writes
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let store = ResultStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            -- One row per discovery invocation
            CREATE TABLE IF NOT EXISTS discovery_runs (
    id TEXT PRIMARY KEY,
    domain TEXT NOT NULL,
    started_at INTEGER NOT NULL,
    completed_at INTEGER,
    status TEXT NOT NULL CHECK(status IN ('running', 'completed', 'failed')),
    total_urls INTEGER,
    last_modified TEXT,
    blob_path TEXT
);

CREATE INDEX IF NOT EXISTS idx_runs_domain ON discovery_runs(domain);
CREATE INDEX IF NOT EXISTS idx_runs_started ON discovery_runs(started_at);

-- Unique URLs found by a run
CREATE TABLE IF NOT EXISTS discovered_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id TEXT NOT NULL,
    url TEXT NOT NULL,

    FOREIGN KEY(run_id) REFERENCES discovery_runs(id) ON DELETE CASCADE,
    UNIQUE(run_id, url)
);

CREATE INDEX IF NOT EXISTS idx_urls_run ON discovered_urls(run_id);

-- Rolling per-domain summary, overwritten by each completed run
CREATE TABLE IF NOT EXISTS domains (
    domain TEXT PRIMARY KEY,
    last_run_id TEXT NOT NULL,
    last_crawled INTEGER NOT NULL,
    total_urls INTEGER NOT NULL,
    last_modified TEXT,
    blob_path TEXT,

    FOREIGN KEY(last_run_id) REFERENCES discovery_runs(id) ON DELETE CASCADE
);
            ",
        )?;
        Ok(())
    }

    // Run management
    pub fn create_run(&self, domain: &str) -> Result<String> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let timestamp = current_timestamp();

        self.conn.execute(
            "INSERT INTO discovery_runs (id, domain, started_at, status) VALUES (?1, ?2, ?3, ?4)",
            params![&run_id, domain, timestamp, "running"],
        )?;

        Ok(run_id)
    }

    /// Record a finished run: summary fields on the run row, the URL list,
    /// and the per-domain summary record.
    pub fn complete_run(
        &self,
        run_id: &str,
        result: &AggregationResult,
        blob_path: Option<&str>,
    ) -> Result<()> {
        let timestamp = current_timestamp();

        self.conn.execute(
            "UPDATE discovery_runs
             SET status = ?1, completed_at = ?2, total_urls = ?3, last_modified = ?4, blob_path = ?5
             WHERE id = ?6",
            params![
                "completed",
                timestamp,
                result.total_urls as i64,
                &result.last_modified,
                blob_path,
                run_id,
            ],
        )?;

        {
            let mut stmt = self
                .conn
                .prepare("INSERT OR IGNORE INTO discovered_urls (run_id, url) VALUES (?1, ?2)")?;
            for url in &result.sitemap_urls {
                stmt.execute(params![run_id, url])?;
            }
        }

        self.conn.execute(
            "INSERT INTO domains (domain, last_run_id, last_crawled, total_urls, last_modified, blob_path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(domain) DO UPDATE SET
                last_run_id = excluded.last_run_id,
                last_crawled = excluded.last_crawled,
                total_urls = excluded.total_urls,
                last_modified = excluded.last_modified,
                blob_path = excluded.blob_path",
            params![
                &result.domain,
                run_id,
                timestamp,
                result.total_urls as i64,
                &result.last_modified,
                blob_path,
            ],
        )?;

        Ok(())
    }

    pub fn fail_run(&self, run_id: &str) -> Result<()> {
        let timestamp = current_timestamp();
        self.conn.execute(
            "UPDATE discovery_runs SET status = ?1, completed_at = ?2 WHERE id = ?3",
            params!["failed", timestamp, run_id],
        )?;
        Ok(())
    }

    // Query methods
    pub fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, domain, started_at, completed_at, status, total_urls, last_modified, blob_path
             FROM discovery_runs WHERE id = ?1",
        )?;

        let record = stmt
            .query_row(params![run_id], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    domain: row.get(1)?,
                    started_at: row.get(2)?,
                    completed_at: row.get(3)?,
                    status: row.get(4)?,
                    total_urls: row.get(5)?,
                    last_modified: row.get(6)?,
                    blob_path: row.get(7)?,
                })
            })
            .optional()?;
        Ok(record)
    }

    pub fn list_runs(&self, domain: Option<&str>, limit: usize) -> Result<Vec<RunRecord>> {
        let map_row = |row: &rusqlite::Row<'_>| {
            Ok(RunRecord {
                id: row.get(0)?,
                domain: row.get(1)?,
                started_at: row.get(2)?,
                completed_at: row.get(3)?,
                status: row.get(4)?,
                total_urls: row.get(5)?,
                last_modified: row.get(6)?,
                blob_path: row.get(7)?,
            })
        };

        let runs = match domain {
            Some(domain) => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, domain, started_at, completed_at, status, total_urls, last_modified, blob_path
                     FROM discovery_runs WHERE domain = ?1 ORDER BY started_at DESC LIMIT ?2",
                )?;
                stmt.query_map(params![domain, limit as i64], map_row)?
                    .collect::<Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, domain, started_at, completed_at, status, total_urls, last_modified, blob_path
                     FROM discovery_runs ORDER BY started_at DESC LIMIT ?1",
                )?;
                stmt.query_map(params![limit as i64], map_row)?
                    .collect::<Result<Vec<_>>>()?
            }
        };

        Ok(runs)
    }

    pub fn get_urls_for_run(&self, run_id: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM discovered_urls WHERE run_id = ?1 ORDER BY url")?;

        let urls = stmt
            .query_map(params![run_id], |row| row.get(0))?
            .collect::<Result<Vec<_>>>()?;

        Ok(urls)
    }

    pub fn latest_for_domain(&self, domain: &str) -> Result<Option<DomainRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT domain, last_run_id, last_crawled, total_urls, last_modified, blob_path
             FROM domains WHERE domain = ?1",
        )?;

        let record = stmt
            .query_row(params![domain], |row| {
                Ok(DomainRecord {
                    domain: row.get(0)?,
                    last_run_id: row.get(1)?,
                    last_crawled: row.get(2)?,
                    total_urls: row.get(3)?,
                    last_modified: row.get(4)?,
                    blob_path: row.get(5)?,
                })
            })
            .optional()?;
        Ok(record)
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}
