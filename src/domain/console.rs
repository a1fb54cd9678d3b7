use serde::{Deserialize, Serialize};

/// Whether an index-page entry came from the console or the handheld table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Console,
    Handheld,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Console => "Console",
            Category::Handheld => "Handheld",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Console" => Some(Category::Console),
            "Handheld" => Some(Category::Handheld),
            _ => None,
        }
    }
}

/// One row from the vault index page: a console or handheld system.
///
/// Immutable once extracted; persisted keyed by `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleEntry {
    pub name: String,
    /// Absolute URL of the system's vault page.
    pub url: String,
    pub year: Option<String>,
    pub category: Category,
}

impl ConsoleEntry {
    pub fn new(name: String, url: String, year: Option<String>, category: Category) -> Self {
        Self {
            name,
            url,
            year,
            category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        assert_eq!(Category::parse("Console"), Some(Category::Console));
        assert_eq!(Category::parse("Handheld"), Some(Category::Handheld));
        assert_eq!(Category::parse("console"), None);
        assert_eq!(Category::Console.as_str(), "Console");
    }
}
