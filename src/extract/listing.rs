use scraper::{ElementRef, Html, Selector};

use crate::app::{Result, VaultError};
use crate::domain::{Category, ConsoleEntry};
use crate::extract::absolutize;

/// Class signature that marks a per-console game-listing table.
const GAME_TABLE_CLASS: &str = "rounded centered cellpadding1 hovertable striped";

/// A game link discovered on a console's listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameLink {
    pub name: String,
    /// Absolute detail-page URL.
    pub url: String,
}

/// Extract console and handheld entries from the vault index page.
///
/// The index carries exactly two tables in fixed order: consoles first,
/// handhelds second. That ordering is a structural assumption of the source
/// site; when it breaks we fail this page rather than mislabel categories.
pub fn extract_index(doc: &Html, origin: &str) -> Result<(Vec<ConsoleEntry>, Vec<ConsoleEntry>)> {
    let table_sel = Selector::parse("table").unwrap();
    let mut tables = doc.select(&table_sel);

    let (Some(consoles_table), Some(handhelds_table)) = (tables.next(), tables.next()) else {
        return Err(VaultError::Extract(
            "index page does not have the expected two tables".into(),
        ));
    };

    let consoles = extract_entries(&consoles_table, Category::Console, origin);
    let handhelds = extract_entries(&handhelds_table, Category::Handheld, origin);
    Ok((consoles, handhelds))
}

/// Each qualifying row (more than one cell, link in the first cell) yields one
/// entry, in row order. The second cell holds the system's release year when
/// the site knows it.
fn extract_entries(table: &ElementRef, category: Category, origin: &str) -> Vec<ConsoleEntry> {
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();
    let link_sel = Selector::parse("a").unwrap();

    let mut entries = Vec::new();
    for row in table.select(&row_sel) {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.len() <= 1 {
            continue;
        }

        let Some(link) = cells[0].select(&link_sel).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };

        let name = link.text().collect::<String>().trim().to_string();
        let url = absolutize(origin, href);
        let year = Some(cells[1].text().collect::<String>().trim().to_string())
            .filter(|y| !y.is_empty());

        entries.push(ConsoleEntry::new(name, url, year, category));
    }

    entries
}

/// Extract game links from a console's listing page.
///
/// The listing table is located by its class signature; a page without one is
/// a console with no games for that letter, not an error.
pub fn extract_game_links(doc: &Html, origin: &str) -> Vec<GameLink> {
    let table_sel =
        Selector::parse(&format!(r#"table[class="{}"]"#, GAME_TABLE_CLASS)).unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();
    let link_sel = Selector::parse("a").unwrap();

    let Some(table) = doc.select(&table_sel).next() else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for row in table.select(&row_sel) {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.len() <= 1 {
            continue;
        }

        let Some(link) = cells[0].select(&link_sel).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };

        links.push(GameLink {
            name: link.text().collect::<String>().trim().to_string(),
            url: absolutize(origin, href),
        });
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://vimm.net";

    const INDEX_PAGE: &str = r#"
<html><body>
<table>
  <tr><th>Console</th><th>Year</th></tr>
  <tr><td><a href="/vault/Atari2600">Atari 2600</a></td><td>1977</td></tr>
  <tr><td><a href="/vault/NES">NES</a></td><td>1983</td></tr>
  <tr><td>no link here</td><td>1990</td></tr>
  <tr><td colspan="2">single cell row</td></tr>
</table>
<table>
  <tr><td><a href="/vault/GB">Game Boy</a></td><td>1989</td></tr>
</table>
</body></html>
"#;

    const LISTING_PAGE: &str = r#"
<html><body>
<table class="rounded centered cellpadding1 hovertable striped">
  <tr><th>Title</th><th>Region</th></tr>
  <tr><td><a href="/vault/15704">The Legend of Zelda</a></td><td>USA</td></tr>
  <tr><td><a href="/vault/15705">Zelda II</a></td><td>USA</td></tr>
</table>
</body></html>
"#;

    #[test]
    fn test_index_extraction() {
        let doc = Html::parse_document(INDEX_PAGE);
        let (consoles, handhelds) = extract_index(&doc, ORIGIN).unwrap();

        assert_eq!(consoles.len(), 2);
        assert_eq!(consoles[0].name, "Atari 2600");
        assert_eq!(consoles[0].url, "https://vimm.net/vault/Atari2600");
        assert_eq!(consoles[0].year.as_deref(), Some("1977"));
        assert_eq!(consoles[0].category, Category::Console);
        assert_eq!(consoles[1].name, "NES");

        assert_eq!(handhelds.len(), 1);
        assert_eq!(handhelds[0].name, "Game Boy");
        assert_eq!(handhelds[0].url, "https://vimm.net/vault/GB");
        assert_eq!(handhelds[0].category, Category::Handheld);
    }

    #[test]
    fn test_index_rejects_missing_tables() {
        let doc = Html::parse_document("<html><body><table></table></body></html>");
        assert!(extract_index(&doc, ORIGIN).is_err());
    }

    #[test]
    fn test_game_links_in_row_order() {
        let doc = Html::parse_document(LISTING_PAGE);
        let links = extract_game_links(&doc, ORIGIN);

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].name, "The Legend of Zelda");
        assert_eq!(links[0].url, "https://vimm.net/vault/15704");
        assert_eq!(links[1].name, "Zelda II");
    }

    #[test]
    fn test_missing_listing_table_yields_empty() {
        let doc = Html::parse_document("<html><body><p>no games</p></body></html>");
        assert!(extract_game_links(&doc, ORIGIN).is_empty());
    }

    #[test]
    fn test_wrong_table_class_yields_empty() {
        let html = r#"<table class="rounded cellpadding1">
            <tr><td><a href="/vault/1">X</a></td><td>y</td></tr></table>"#;
        let doc = Html::parse_document(html);
        assert!(extract_game_links(&doc, ORIGIN).is_empty());
    }
}
