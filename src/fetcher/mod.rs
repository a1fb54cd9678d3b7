pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

/// Page-fetch collaborator: GET a URL and hand back the response body.
///
/// Implementations are expected to have already rejected non-2xx responses.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
