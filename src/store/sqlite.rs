use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, VaultError};
use crate::domain::{Category, ConsoleEntry, GameRecord};
use crate::store::{Store, Upsert};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| VaultError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            VaultError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn console_from_row(row: &Row) -> rusqlite::Result<ConsoleEntry> {
        Ok(ConsoleEntry {
            name: row.get(0)?,
            url: row.get(1)?,
            year: row.get(2)?,
            category: Category::parse(&row.get::<_, String>(3)?).unwrap_or(Category::Console),
        })
    }

    fn game_from_row(row: &Row) -> rusqlite::Result<GameRecord> {
        let params_json: String = row.get(15)?;
        let download_params: BTreeMap<String, String> =
            serde_json::from_str(&params_json).unwrap_or_default();

        Ok(GameRecord {
            console: row.get(0)?,
            game_name: row.get(1)?,
            region: row.get(2)?,
            players: row.get(3)?,
            year: row.get(4)?,
            publisher: row.get(5)?,
            serial: row.get(6)?,
            format: row.get(7)?,
            version: row.get(8)?,
            graphics: row.get(9)?,
            sound: row.get(10)?,
            gameplay: row.get(11)?,
            overall: row.get(12)?,
            can_be_downloaded: row.get::<_, i64>(13)? != 0,
            download_url: row.get(14)?,
            download_params,
        })
    }

    fn is_constraint_violation(e: &rusqlite::Error) -> bool {
        matches!(
            e,
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

const GAME_COLUMNS: &str = "console, game_name, region, players, year, publisher, serial, \
     format, version, graphics, sound, gameplay, overall, can_be_downloaded, \
     download_url, download_params";

impl Store for SqliteStore {
    fn upsert_console(&self, entry: &ConsoleEntry) -> Result<Upsert> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM consoles WHERE name = ?1",
                params![entry.name],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE consoles SET url = ?1, year = ?2, category = ?3, last_seen_at = ?4
                     WHERE id = ?5",
                    params![entry.url, entry.year, entry.category.as_str(), now, id],
                )?;
                Ok(Upsert::Updated)
            }
            None => {
                let inserted = conn.execute(
                    "INSERT INTO consoles (name, url, year, category, first_seen_at, last_seen_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![entry.name, entry.url, entry.year, entry.category.as_str(), now],
                );
                match inserted {
                    Ok(_) => Ok(Upsert::Inserted),
                    // The key repeats across re-crawls; losing the race to an
                    // earlier insert is not an error.
                    Err(e) if Self::is_constraint_violation(&e) => Ok(Upsert::Updated),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    fn get_console_by_name(&self, name: &str) -> Result<Option<ConsoleEntry>> {
        let conn = self.lock()?;
        let result = conn
            .query_row(
                "SELECT name, url, year, category FROM consoles WHERE name = ?1",
                params![name],
                Self::console_from_row,
            )
            .optional()?;
        Ok(result)
    }

    fn get_consoles(&self) -> Result<Vec<ConsoleEntry>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT name, url, year, category FROM consoles ORDER BY category, name")?;
        let consoles = stmt
            .query_map([], Self::console_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(consoles)
    }

    fn upsert_game(&self, record: &GameRecord) -> Result<Upsert> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let params_json = serde_json::to_string(&record.download_params)
            .map_err(|e| VaultError::Other(format!("params encode: {}", e)))?;

        // `IS` instead of `=` so records without a decoded name still match
        // their earlier selves.
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM games WHERE console IS ?1 AND game_name IS ?2",
                params![record.console, record.game_name],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE games SET region = ?1, players = ?2, year = ?3, publisher = ?4,
                         serial = ?5, format = ?6, version = ?7, graphics = ?8, sound = ?9,
                         gameplay = ?10, overall = ?11, can_be_downloaded = ?12,
                         download_url = ?13, download_params = ?14, last_seen_at = ?15
                     WHERE id = ?16",
                    params![
                        record.region,
                        record.players,
                        record.year,
                        record.publisher,
                        record.serial,
                        record.format,
                        record.version,
                        record.graphics,
                        record.sound,
                        record.gameplay,
                        record.overall,
                        record.can_be_downloaded as i64,
                        record.download_url,
                        params_json,
                        now,
                        id
                    ],
                )?;
                Ok(Upsert::Updated)
            }
            None => {
                let inserted = conn.execute(
                    &format!(
                        "INSERT INTO games ({}, first_seen_at, last_seen_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)",
                        GAME_COLUMNS
                    ),
                    params![
                        record.console,
                        record.game_name,
                        record.region,
                        record.players,
                        record.year,
                        record.publisher,
                        record.serial,
                        record.format,
                        record.version,
                        record.graphics,
                        record.sound,
                        record.gameplay,
                        record.overall,
                        record.can_be_downloaded as i64,
                        record.download_url,
                        params_json,
                        now
                    ],
                );
                match inserted {
                    Ok(_) => Ok(Upsert::Inserted),
                    Err(e) if Self::is_constraint_violation(&e) => Ok(Upsert::Updated),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    fn get_game(&self, console: Option<&str>, name: Option<&str>) -> Result<Option<GameRecord>> {
        let conn = self.lock()?;
        let result = conn
            .query_row(
                &format!(
                    "SELECT {} FROM games WHERE console IS ?1 AND game_name IS ?2",
                    GAME_COLUMNS
                ),
                params![console, name],
                Self::game_from_row,
            )
            .optional()?;
        Ok(result)
    }

    fn get_games_by_console(&self, console: &str) -> Result<Vec<GameRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM games WHERE console = ?1 ORDER BY game_name",
            GAME_COLUMNS
        ))?;
        let games = stmt
            .query_map(params![console], Self::game_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(games)
    }

    fn get_all_games(&self) -> Result<Vec<GameRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM games ORDER BY console, game_name",
            GAME_COLUMNS
        ))?;
        let games = stmt
            .query_map([], Self::game_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console(name: &str) -> ConsoleEntry {
        ConsoleEntry::new(
            name.into(),
            format!("https://vimm.net/vault/{}", name),
            Some("1977".into()),
            Category::Console,
        )
    }

    fn game(console: &str, name: &str) -> GameRecord {
        GameRecord {
            console: Some(console.into()),
            game_name: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_console_insert_then_update() {
        let store = SqliteStore::in_memory().unwrap();

        assert_eq!(
            store.upsert_console(&console("Atari 2600")).unwrap(),
            Upsert::Inserted
        );

        let mut updated = console("Atari 2600");
        updated.year = Some("1978".into());
        assert_eq!(store.upsert_console(&updated).unwrap(), Upsert::Updated);

        let stored = store.get_console_by_name("Atari 2600").unwrap().unwrap();
        assert_eq!(stored.year.as_deref(), Some("1978"));
        assert_eq!(store.get_consoles().unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_game_is_idempotent_and_last_write_wins() {
        let store = SqliteStore::in_memory().unwrap();

        let mut record = game("NES", "The Legend of Zelda");
        record.region = Some("USA".into());
        assert_eq!(store.upsert_game(&record).unwrap(), Upsert::Inserted);

        record.region = Some("Japan".into());
        record.graphics = Some(4.5);
        assert_eq!(store.upsert_game(&record).unwrap(), Upsert::Updated);

        let games = store.get_games_by_console("NES").unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].region.as_deref(), Some("Japan"));
        assert_eq!(games[0].graphics, Some(4.5));
    }

    #[test]
    fn test_same_name_on_different_consoles_do_not_collide() {
        let store = SqliteStore::in_memory().unwrap();

        store.upsert_game(&game("NES", "Tetris")).unwrap();
        store.upsert_game(&game("Game Boy", "Tetris")).unwrap();

        assert_eq!(store.get_all_games().unwrap().len(), 2);
        assert_eq!(store.get_games_by_console("NES").unwrap().len(), 1);
    }

    #[test]
    fn test_download_params_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();

        let mut record = game("NES", "Metroid");
        record.can_be_downloaded = true;
        record.download_url = Some("https://download2.example/?mediaId=9".into());
        record.download_params.insert("mediaId".into(), "9".into());
        record.download_params.insert("alt".into(), "0".into());
        store.upsert_game(&record).unwrap();

        let stored = store
            .get_game(Some("NES"), Some("Metroid"))
            .unwrap()
            .unwrap();
        assert!(stored.can_be_downloaded);
        assert_eq!(stored.media_id(), Some("9"));
        assert_eq!(stored.download_params.len(), 2);
    }

    #[test]
    fn test_get_game_with_absent_name() {
        let store = SqliteStore::in_memory().unwrap();

        let record = GameRecord {
            console: Some("NES".into()),
            ..Default::default()
        };
        store.upsert_game(&record).unwrap();
        store.upsert_game(&record).unwrap();

        // A nameless record still matches itself on re-crawl.
        let stored = store.get_game(Some("NES"), None).unwrap();
        assert!(stored.is_some());
        assert_eq!(store.get_all_games().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_console_lookup() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_console_by_name("nope").unwrap().is_none());
        assert!(store.get_games_by_console("nope").unwrap().is_empty());
    }
}
