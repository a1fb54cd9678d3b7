pub mod detail;
pub mod fields;
pub mod listing;

pub use detail::extract_game;
pub use listing::{extract_game_links, extract_index, GameLink};

/// Rewrite a site-relative URL (`/vault/...`) to an absolute one.
///
/// Anything not starting with `/` is passed through untouched.
pub fn absolutize(origin: &str, href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", origin.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}

/// Give a protocol-relative URL (`//host/...`) an explicit `https:` scheme.
pub fn ensure_scheme(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}
