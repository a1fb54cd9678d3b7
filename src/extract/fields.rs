use scraper::{ElementRef, Html, Selector};

use crate::domain::GameRecord;

/// How a recognized label's value cell is normalized before landing in the
/// record.
enum Normalize {
    /// Trimmed text, kept verbatim.
    Text,
    /// Only the first whitespace-delimited token (drops trailing annotations).
    FirstToken,
}

/// Parse the detail page's key/value field table into `record`.
///
/// Each recognized row has exactly three cells: label, separator, value.
/// Unrecognized labels and rows with any other shape are skipped, so the
/// extraction survives page layout drift. Star-rating widgets render the value
/// as an icon; its `title` attribute carries the text we want.
pub fn apply_field_table(doc: &Html, record: &mut GameRecord) {
    let table_sel = Selector::parse(r#"table[class="rounded cellpadding1"]"#).unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();

    let Some(table) = doc.select(&table_sel).next() else {
        tracing::debug!("Detail page has no field table");
        return;
    };

    for row in table.select(&row_sel) {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.len() != 3 {
            continue;
        }

        let label = text_of(&cells[0]);
        let value = value_of(&cells[2]);

        match label.as_str() {
            "Region" => record.region = normalize(value, Normalize::Text),
            "Players" => record.players = normalize(value, Normalize::Text),
            "Year" => record.year = normalize(value, Normalize::Text),
            "Publisher" => record.publisher = normalize(value, Normalize::Text),
            "Serial #" => record.serial = normalize(value, Normalize::Text),
            "Format" => record.format = normalize(value, Normalize::Text),
            "Version" => record.version = normalize(value, Normalize::FirstToken),
            "Graphics" => record.graphics = rating(&value),
            "Sound" => record.sound = rating(&value),
            "Gameplay" => record.gameplay = rating(&value),
            "Overall" => record.overall = rating(&value),
            _ => {}
        }
    }
}

fn text_of(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// The value cell's text, unless it holds an image whose `title` attribute
/// carries the real value (star-rating icons).
fn value_of(cell: &ElementRef) -> String {
    let img_sel = Selector::parse("img[title]").unwrap();
    if let Some(img) = cell.select(&img_sel).next() {
        if let Some(title) = img.value().attr("title") {
            return title.trim().to_string();
        }
    }
    text_of(cell)
}

fn normalize(value: String, mode: Normalize) -> Option<String> {
    let normalized = match mode {
        Normalize::Text => Some(value.trim().to_string()),
        Normalize::FirstToken => value.split_whitespace().next().map(str::to_string),
    };
    normalized.filter(|v| !v.is_empty())
}

/// A malformed rating must never abort record construction.
fn rating(value: &str) -> Option<f64> {
    value.split_whitespace().next()?.parse::<f64>().ok()
}
