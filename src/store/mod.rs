pub mod sqlite;

use crate::app::Result;
use crate::domain::{ConsoleEntry, GameRecord};

pub use sqlite::SqliteStore;

/// What an upsert did with the record it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

pub trait Store {
    // Console operations (keyed by name)
    fn upsert_console(&self, entry: &ConsoleEntry) -> Result<Upsert>;
    fn get_console_by_name(&self, name: &str) -> Result<Option<ConsoleEntry>>;
    fn get_consoles(&self) -> Result<Vec<ConsoleEntry>>;

    // Game operations (keyed by console + game name)
    fn upsert_game(&self, record: &GameRecord) -> Result<Upsert>;
    fn get_game(&self, console: Option<&str>, name: Option<&str>) -> Result<Option<GameRecord>>;
    fn get_games_by_console(&self, console: &str) -> Result<Vec<GameRecord>>;
    fn get_all_games(&self) -> Result<Vec<GameRecord>>;
}
