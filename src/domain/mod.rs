pub mod console;
pub mod game;

pub use console::{Category, ConsoleEntry};
pub use game::GameRecord;
