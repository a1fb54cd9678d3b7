use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use scraper::{ElementRef, Html, Selector};

use crate::domain::GameRecord;
use crate::extract::ensure_scheme;
use crate::extract::fields::apply_field_table;

/// Extract one game record from a detail-page document.
///
/// Best effort by contract: a page missing any of the expected structure
/// produces a record with those fields absent, never an error.
pub fn extract_game(doc: &Html) -> GameRecord {
    let mut record = GameRecord::default();

    extract_titles(doc, &mut record);
    extract_download_form(doc, &mut record);
    apply_field_table(doc, &mut record);

    record
}

/// The section-title element carries the console name as text. The game's
/// display name sits in the next canvas element's `data-v` attribute,
/// base64-encoded to frustrate naive scrapers.
fn extract_titles(doc: &Html, record: &mut GameRecord) {
    let title_sel = Selector::parse("div.sectionTitle").unwrap();

    let Some(title) = doc.select(&title_sel).next() else {
        return;
    };

    let console = title.text().collect::<String>().trim().to_string();
    record.console = Some(console).filter(|c| !c.is_empty());

    if let Some(canvas) = next_canvas_after(doc, &title) {
        if let Some(encoded) = canvas.value().attr("data-v") {
            record.game_name = decode_name(encoded);
        }
    }
}

/// First canvas element following `title` in document order, including any
/// nested inside the title element itself.
fn next_canvas_after<'a>(doc: &'a Html, title: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    let mut past_title = false;
    for node in doc.root_element().descendants() {
        if node.id() == title.id() {
            past_title = true;
            continue;
        }
        if !past_title {
            continue;
        }
        if let Some(element) = ElementRef::wrap(node) {
            if element.value().name() == "canvas" {
                return Some(element);
            }
        }
    }
    None
}

fn decode_name(encoded: &str) -> Option<String> {
    let bytes = BASE64.decode(encoded).ok()?;
    let name = String::from_utf8(bytes).ok()?;
    Some(name).filter(|n| !n.is_empty())
}

/// A `form#dl_form` on the page means the game can be downloaded. The form's
/// action is the download endpoint (often protocol-relative) and its named
/// inputs are replayed later to reconstruct the request.
fn extract_download_form(doc: &Html, record: &mut GameRecord) {
    let form_sel = Selector::parse("form#dl_form").unwrap();
    let input_sel = Selector::parse("input[name]").unwrap();

    let Some(form) = doc.select(&form_sel).next() else {
        return;
    };

    record.can_be_downloaded = true;
    record.download_url = form.value().attr("action").map(ensure_scheme);

    for input in form.select(&input_sel) {
        if let Some(name) = input.value().attr("name") {
            let value = input.value().attr("value").unwrap_or("");
            record
                .download_params
                .insert(name.to_string(), value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // "The Legend of Zelda" in base64.
    const DETAIL_PAGE: &str = r#"
<html><body>
<div class="sectionTitle">Nintendo</div>
<canvas width="400" data-v="VGhlIExlZ2VuZCBvZiBaZWxkYQ=="></canvas>
<form id="dl_form" action="//download2.example/?mediaId=123" method="post">
  <input type="hidden" name="mediaId" value="123">
  <input type="hidden" name="alt" value="0">
  <input type="hidden" name="size" value="85703">
  <input type="submit" value="Download">
  <input type="checkbox">
</form>
<table class="rounded cellpadding1">
  <tr><td>Region</td><td>:</td><td>USA</td></tr>
  <tr><td>Year</td><td>:</td><td>1986</td></tr>
</table>
</body></html>
"#;

    const BARE_PAGE: &str = "<html><body><p>not a game page</p></body></html>";

    #[test]
    fn test_full_detail_extraction() {
        let doc = Html::parse_document(DETAIL_PAGE);
        let record = extract_game(&doc);

        assert_eq!(record.console.as_deref(), Some("Nintendo"));
        assert_eq!(record.game_name.as_deref(), Some("The Legend of Zelda"));
        assert_eq!(record.region.as_deref(), Some("USA"));
        assert_eq!(record.year.as_deref(), Some("1986"));
    }

    #[test]
    fn test_download_form_detection() {
        let doc = Html::parse_document(DETAIL_PAGE);
        let record = extract_game(&doc);

        assert!(record.can_be_downloaded);
        assert_eq!(
            record.download_url.as_deref(),
            Some("https://download2.example/?mediaId=123")
        );
        assert_eq!(record.media_id(), Some("123"));
        assert_eq!(record.download_params.get("alt").map(String::as_str), Some("0"));
        assert_eq!(record.download_size(), Some("85703"));
        // The nameless checkbox contributes nothing.
        assert_eq!(record.download_params.len(), 3);
    }

    #[test]
    fn test_missing_structure_yields_empty_record() {
        let doc = Html::parse_document(BARE_PAGE);
        let record = extract_game(&doc);

        assert!(record.game_name.is_none());
        assert!(record.console.is_none());
        assert!(!record.can_be_downloaded);
        assert!(record.download_params.is_empty());
        assert!(record.download_url.is_none());
    }

    #[test]
    fn test_no_download_form_means_no_params() {
        let html = r#"
<div class="sectionTitle">Nintendo</div>
<canvas data-v="VGV0cmlz"></canvas>"#;
        let doc = Html::parse_document(html);
        let record = extract_game(&doc);

        assert_eq!(record.game_name.as_deref(), Some("Tetris"));
        assert!(!record.can_be_downloaded);
        assert!(record.download_params.is_empty());
    }

    #[test]
    fn test_invalid_base64_leaves_name_unset() {
        let html = r#"
<div class="sectionTitle">Nintendo</div>
<canvas data-v="!!! not base64 !!!"></canvas>"#;
        let doc = Html::parse_document(html);
        let record = extract_game(&doc);

        assert_eq!(record.console.as_deref(), Some("Nintendo"));
        assert!(record.game_name.is_none());
    }

    #[test]
    fn test_absolute_action_url_is_kept() {
        let html = r#"<form id="dl_form" action="https://dl.example/get"></form>"#;
        let doc = Html::parse_document(html);
        let record = extract_game(&doc);

        assert!(record.can_be_downloaded);
        assert_eq!(record.download_url.as_deref(), Some("https://dl.example/get"));
        assert!(record.download_params.is_empty());
    }
}
