use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Everything extracted from a single game detail page.
///
/// Every field is optional: the extractor produces a best-effort partial
/// record rather than failing when the page is missing structure. A record is
/// built once per fetch and persisted immediately; it is never mutated
/// afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameRecord {
    pub region: Option<String>,
    pub players: Option<String>,
    pub year: Option<String>,
    pub publisher: Option<String>,
    pub serial: Option<String>,
    pub format: Option<String>,
    pub version: Option<String>,
    /// Star ratings in [0, 5]. Absent when the page value failed to parse.
    pub graphics: Option<f64>,
    pub sound: Option<f64>,
    pub gameplay: Option<f64>,
    pub overall: Option<f64>,
    /// Display name, base64-decoded from the obfuscated page attribute.
    pub game_name: Option<String>,
    pub console: Option<String>,
    pub can_be_downloaded: bool,
    /// Absolute action URL of the download form, when one was present.
    pub download_url: Option<String>,
    /// Hidden form fields, used to reconstruct the download request.
    pub download_params: BTreeMap<String, String>,
}

impl GameRecord {
    /// The media identifier the download host expects, if the form carried one.
    pub fn media_id(&self) -> Option<&str> {
        self.download_params.get("mediaId").map(String::as_str)
    }

    /// Advertised file size, if the form carried one as a hidden field.
    pub fn download_size(&self) -> Option<&str> {
        self.download_params.get("size").map(String::as_str)
    }

    pub fn display_name(&self) -> &str {
        self.game_name.as_deref().unwrap_or("(unknown)")
    }

    /// A record qualifies for the download sweep only when the detail page had
    /// a download form and that form included a media id.
    pub fn is_downloadable(&self) -> bool {
        self.can_be_downloaded && self.media_id().is_some()
    }
}
