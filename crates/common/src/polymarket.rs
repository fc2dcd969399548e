use crate::types::{
    ApiHolderResponse, ApiPosition, GammaEvent, GammaMarket, SubgraphPosition, SubgraphResponse,
};
use anyhow::Result;
use reqwest::Url;
use std::time::Duration;

/// GraphQL query against the positions subgraph. `realizedPnl` comes back
/// as integer micro-units; callers divide by 1e6.
const USER_POSITIONS_QUERY: &str = "query UserPositions($user: String!, $first: Int!) { \
     userPositions(where: { user: $user }, first: $first) { realizedPnl } }";

pub struct PolymarketClient {
    http: reqwest::Client,
    data_api_url: String,
    gamma_api_url: String,
    profile_url: String,
    subgraph_url: String,
}

impl PolymarketClient {
    pub fn new(
        data_api_url: &str,
        gamma_api_url: &str,
        profile_url: &str,
        subgraph_url: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        // A finite timeout is mandatory: adapters must never block a batch
        // indefinitely on a stuck upstream.
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            data_api_url: data_api_url.trim_end_matches('/').to_string(),
            gamma_api_url: gamma_api_url.trim_end_matches('/').to_string(),
            profile_url: profile_url.trim_end_matches('/').to_string(),
            subgraph_url: subgraph_url.to_string(),
        })
    }

    pub fn from_config(cfg: &crate::config::Polymarket) -> Result<Self> {
        Self::new(
            &cfg.data_api_url,
            &cfg.gamma_api_url,
            &cfg.profile_url,
            &cfg.subgraph_url,
            Duration::from_secs(cfg.request_timeout_secs),
        )
    }

    pub fn positions_url(&self, user: &str) -> String {
        let mut url = Url::parse(&format!("{}/positions", self.data_api_url))
            .expect("data_api_url must be a valid absolute URL");
        url.query_pairs_mut().append_pair("user", user);
        url.to_string()
    }

    pub fn holders_url(&self, condition_id: &str, limit: u32) -> String {
        let mut url = Url::parse(&format!("{}/holders", self.data_api_url))
            .expect("data_api_url must be a valid absolute URL");
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("market", condition_id);
            qp.append_pair("limit", &limit.to_string());
        }
        url.to_string()
    }

    pub fn profile_page_url(&self, wallet: &str) -> String {
        format!("{}/profile/{wallet}", self.profile_url)
    }

    pub fn markets_by_slug_url(&self, slug: &str) -> String {
        let mut url = Url::parse(&format!("{}/markets", self.gamma_api_url))
            .expect("gamma_api_url must be a valid absolute URL");
        url.query_pairs_mut().append_pair("slug", slug);
        url.to_string()
    }

    pub fn events_by_slug_url(&self, slug: &str) -> String {
        let mut url = Url::parse(&format!("{}/events", self.gamma_api_url))
            .expect("gamma_api_url must be a valid absolute URL");
        url.query_pairs_mut().append_pair("slug", slug);
        url.to_string()
    }

    /// All positions for a wallet from the data API.
    pub async fn fetch_positions(&self, user: &str) -> Result<Vec<ApiPosition>> {
        let body = self
            .http
            .get(self.positions_url(user))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Raw profile page HTML for a wallet. Non-2xx is an error here; the
    /// adapter layer decides what "unavailable" means.
    pub async fn fetch_profile_page(&self, wallet: &str) -> Result<String> {
        let body = self
            .http
            .get(self.profile_page_url(wallet))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }

    /// Per-token holder lists for a market.
    pub async fn fetch_holders(
        &self,
        condition_id: &str,
        limit: u32,
    ) -> Result<Vec<ApiHolderResponse>> {
        let body = self
            .http
            .get(self.holders_url(condition_id, limit))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Position records for a wallet from the positions subgraph.
    pub async fn fetch_subgraph_positions(
        &self,
        user: &str,
        first: u32,
    ) -> Result<Vec<SubgraphPosition>> {
        let resp: SubgraphResponse = self
            .http
            .post(&self.subgraph_url)
            .json(&subgraph_request_body(user, first))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.data.map(|d| d.user_positions).unwrap_or_default())
    }

    pub async fn fetch_markets_by_slug(&self, slug: &str) -> Result<Vec<GammaMarket>> {
        let body = self
            .http
            .get(self.markets_by_slug_url(slug))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn fetch_events_by_slug(&self, slug: &str) -> Result<Vec<GammaEvent>> {
        let body = self
            .http
            .get(self.events_by_slug_url(slug))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

pub fn subgraph_request_body(user: &str, first: u32) -> serde_json::Value {
    serde_json::json!({
        "query": USER_POSITIONS_QUERY,
        "variables": { "user": user, "first": first },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PolymarketClient {
        PolymarketClient::new(
            "https://data-api.polymarket.com",
            "https://gamma-api.polymarket.com",
            "https://polymarket.com",
            "https://example.com/subgraph",
            Duration::from_secs(15),
        )
        .unwrap()
    }

    #[test]
    fn test_positions_url_includes_user() {
        let url = client().positions_url("0xabc123");
        assert!(url.contains("/positions"));
        assert!(url.contains("user=0xabc123"));
    }

    #[test]
    fn test_holders_url_includes_market_and_limit() {
        let url = client().holders_url("0xcond", 20);
        assert!(url.contains("market=0xcond"));
        assert!(url.contains("limit=20"));
    }

    #[test]
    fn test_profile_page_url() {
        assert_eq!(
            client().profile_page_url("0xabc"),
            "https://polymarket.com/profile/0xabc"
        );
    }

    #[test]
    fn test_subgraph_request_body_shape() {
        let body = subgraph_request_body("0xabc", 1000);
        assert_eq!(body["variables"]["user"], "0xabc");
        assert_eq!(body["variables"]["first"], 1000);
        assert!(body["query"].as_str().unwrap().contains("userPositions"));
    }

    #[test]
    fn test_markets_by_slug_url() {
        let url = client().markets_by_slug_url("will-it-rain");
        assert!(url.contains("/markets?slug=will-it-rain"));
    }
}
