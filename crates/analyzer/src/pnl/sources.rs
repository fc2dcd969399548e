use anyhow::Result;
use common::polymarket::PolymarketClient;
use common::types::{ApiPosition, SubgraphPosition};

/// Raw access to the three PNL upstreams. Implementations return transport
/// and decode failures as errors; the adapter layer in [`super::PnlFetcher`]
/// converts every failure to "unavailable" and counts the attempt.
pub trait PnlSource {
    fn fetch_profile_page(
        &self,
        wallet: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    fn fetch_positions(
        &self,
        wallet: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ApiPosition>>> + Send;

    fn fetch_subgraph_positions(
        &self,
        wallet: &str,
        first: u32,
    ) -> impl std::future::Future<Output = Result<Vec<SubgraphPosition>>> + Send;
}

impl PnlSource for PolymarketClient {
    async fn fetch_profile_page(&self, wallet: &str) -> Result<String> {
        PolymarketClient::fetch_profile_page(self, wallet).await
    }

    async fn fetch_positions(&self, wallet: &str) -> Result<Vec<ApiPosition>> {
        PolymarketClient::fetch_positions(self, wallet).await
    }

    async fn fetch_subgraph_positions(
        &self,
        wallet: &str,
        first: u32,
    ) -> Result<Vec<SubgraphPosition>> {
        PolymarketClient::fetch_subgraph_positions(self, wallet, first).await
    }
}

/// Pull the account PNL out of a profile page body.
///
/// The page embeds its state as JSON, so the number the UI displays is
/// reachable by scanning for a `"pnl": <number>` token. Deliberately brittle:
/// the payload is not parsed as a document, we only want the exact figure the
/// platform shows.
pub fn extract_profile_pnl(body: &str) -> Option<f64> {
    let mut rest = body;
    while let Some(at) = rest.find("\"pnl\"") {
        rest = &rest[at + "\"pnl\"".len()..];
        let candidate = rest.trim_start();
        let Some(candidate) = candidate.strip_prefix(':') else {
            continue;
        };
        let candidate = candidate.trim_start();
        let end = candidate
            .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-')
            .unwrap_or(candidate.len());
        if let Ok(value) = candidate[..end].parse::<f64>() {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_pnl_from_fixture_page() {
        let html = include_str!("../../../../tests/fixtures/profile_page_sample.html");
        assert_eq!(extract_profile_pnl(html), Some(41186.29626801953));
    }

    #[test]
    fn test_extract_pnl_with_spacing_and_negatives() {
        assert_eq!(extract_profile_pnl(r#"{"pnl" : -12.5}"#), Some(-12.5));
        assert_eq!(extract_profile_pnl(r#"{"pnl":0}"#), Some(0.0));
    }

    #[test]
    fn test_extract_pnl_takes_first_numeric_occurrence() {
        let body = r#"{"a":{"pnl":1.5},"b":{"pnl":99}}"#;
        assert_eq!(extract_profile_pnl(body), Some(1.5));
    }

    #[test]
    fn test_extract_pnl_absent_or_non_numeric() {
        assert_eq!(extract_profile_pnl("<html>no data here</html>"), None);
        assert_eq!(extract_profile_pnl(r#"{"pnl":"n/a"}"#), None);
        assert_eq!(extract_profile_pnl(r#"{"pnl-30d":5}"#), None);
    }
}
