//! Song catalog stored in SQLite.
//!
//! The catalog is a single `songs` table whose `title` column is matched with
//! a case-insensitive "contains" query. Case folding is done in Rust through a
//! `fold` SQL function, so accented titles match too. Rows with a missing or
//! blank title are never returned.

use anyhow::{Context, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;

use crate::models::SongTitle;
use crate::util::lock;

pub struct CatalogStore {
    conn: Mutex<Connection>,
}

impl CatalogStore {
    /// Open the catalog database at `path`, creating the table if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open catalog at {}", path.display()))?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        register_fold(&conn)?;
        create_schema(&conn)?;
        Ok(CatalogStore {
            conn: Mutex::new(conn),
        })
    }

    /// Titles containing `query` (ignoring case), at most `limit` of them.
    pub fn search(&self, query: &str, limit: usize) -> rusqlite::Result<Vec<SongTitle>> {
        let conn = lock(&self.conn);
        let mut stmt = conn.prepare_cached(
            "SELECT title FROM songs
             WHERE title IS NOT NULL
               AND instr(fold(title), fold(?1)) > 0
               AND trim(title) != ''
             ORDER BY id
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![query, limit as i64], |row| row.get::<_, String>(0))?;
        rows.collect()
    }

    /// Insert titles in one transaction, skipping blank ones. Returns how many were stored.
    pub fn insert_titles<I, S>(&self, titles: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut conn = lock(&self.conn);
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached("INSERT INTO songs (title) VALUES (?1)")?;
            for title in titles {
                let title = title.as_ref().trim();
                if title.is_empty() {
                    continue;
                }
                stmt.execute(params![title])?;
                inserted += 1;
            }
        }
        tx.commit().context("Failed to commit catalog import")?;
        Ok(inserted)
    }
}

fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT
        );",
    )
    .context("Failed to create catalog schema")
}

/// `fold(text)`: Unicode lowercase, NULL stays NULL
fn register_fold(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "fold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| text.to_lowercase())),
    )
    .context("Failed to register catalog fold function")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with(titles: &[&str]) -> CatalogStore {
        let catalog = CatalogStore::open_in_memory().unwrap();
        catalog.insert_titles(titles).unwrap();
        catalog
    }

    #[test]
    fn test_contains_match_ignores_case() {
        let catalog = catalog_with(&["Bohemian Rhapsody", "Bohemian Like You", "Yellow Submarine"]);

        assert_eq!(
            catalog.search("bohemian", 10).unwrap(),
            vec!["Bohemian Rhapsody", "Bohemian Like You"]
        );
        assert_eq!(catalog.search("MARINE", 10).unwrap(), vec!["Yellow Submarine"]);
    }

    #[test]
    fn test_accented_titles_match_in_any_case() {
        let catalog =
            catalog_with(&["Motörhead - Ace of Spades", "Édith Piaf - La Vie en Rose"]);

        assert_eq!(catalog.search("MOTÖRHEAD", 10).unwrap(), vec!["Motörhead - Ace of Spades"]);
        assert_eq!(catalog.search("édith", 10).unwrap(), vec!["Édith Piaf - La Vie en Rose"]);
        assert_eq!(catalog.search("VIE EN", 10).unwrap(), vec!["Édith Piaf - La Vie en Rose"]);
    }

    #[test]
    fn test_results_are_capped() {
        let titles: Vec<String> = (1..=25).map(|i| format!("Track {i}")).collect();
        let catalog = catalog_with(&titles.iter().map(String::as_str).collect::<Vec<_>>());

        let found = catalog.search("track", 10).unwrap();
        assert_eq!(found.len(), 10);
        assert_eq!(found[0], "Track 1");
    }

    #[test]
    fn test_wildcards_match_literally() {
        let catalog =
            catalog_with(&["100% Pure Love", "1000 Miles", "Under_score", r"Back\Slash"]);

        assert_eq!(catalog.search("100%", 10).unwrap(), vec!["100% Pure Love"]);
        assert_eq!(catalog.search("_", 10).unwrap(), vec!["Under_score"]);
        assert_eq!(catalog.search("\\", 10).unwrap(), vec![r"Back\Slash"]);
    }

    #[test]
    fn test_blank_titles_are_skipped() {
        let catalog = catalog_with(&["Song A", "   ", ""]);
        {
            let conn = lock(&catalog.conn);
            conn.execute("INSERT INTO songs (title) VALUES (NULL)", []).unwrap();
            conn.execute("INSERT INTO songs (title) VALUES ('  ')", []).unwrap();
        }

        assert_eq!(catalog.search("  ", 10).unwrap(), Vec::<String>::new());
        assert_eq!(catalog.search("song", 10).unwrap(), vec!["Song A"]);
    }

    #[test]
    fn test_insert_reports_stored_count() {
        let catalog = CatalogStore::open_in_memory().unwrap();
        assert_eq!(catalog.insert_titles(["One", "", "Two", "  "]).unwrap(), 2);
    }
}
