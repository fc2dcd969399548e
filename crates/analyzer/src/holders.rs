use anyhow::Result;
use common::polymarket::PolymarketClient;
use common::types::ApiHolderResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
        }
    }
}

/// One wallet holding a position on one side of a market. The enrichment
/// pass fills in the PNL fields; until then they keep these defaults.
#[derive(Debug, Clone)]
pub struct MarketHolder {
    pub proxy_wallet: String,
    pub side: Side,
    pub amount: f64,
    pub pseudonym: Option<String>,
    /// Unrealized PNL on this market's position when a market context was
    /// supplied to enrichment, else all-time PNL.
    pub overall_pnl: Option<f64>,
    /// All-time realized PNL.
    pub realized_pnl: Option<f64>,
    pub is_on_leaderboard: bool,
}

impl MarketHolder {
    pub fn new(proxy_wallet: &str, side: Side, amount: f64) -> Self {
        Self {
            // Addresses are case-insensitive; normalize once at the boundary.
            proxy_wallet: proxy_wallet.to_lowercase(),
            side,
            amount,
            pseudonym: None,
            overall_pnl: None,
            realized_pnl: None,
            is_on_leaderboard: false,
        }
    }
}

pub trait HolderSource {
    fn fetch_holders(
        &self,
        condition_id: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ApiHolderResponse>>> + Send;
}

impl HolderSource for PolymarketClient {
    async fn fetch_holders(
        &self,
        condition_id: &str,
        limit: u32,
    ) -> Result<Vec<ApiHolderResponse>> {
        PolymarketClient::fetch_holders(self, condition_id, limit).await
    }
}

/// Fetch the top holders of a market and split them into YES/NO sides by
/// token id. Order within a side is whatever the API returned (largest
/// positions first).
pub async fn fetch_market_holders<H: HolderSource + Sync>(
    source: &H,
    condition_id: &str,
    token_id_yes: &str,
    token_id_no: &str,
    limit: u32,
) -> Result<(Vec<MarketHolder>, Vec<MarketHolder>)> {
    let response = source.fetch_holders(condition_id, limit).await?;

    let mut yes_holders = Vec::new();
    let mut no_holders = Vec::new();

    for group in response {
        let side = match group.token.as_deref() {
            Some(token) if token == token_id_yes => Side::Yes,
            Some(token) if token == token_id_no => Side::No,
            _ => continue,
        };
        for h in group.holders {
            let Some(wallet) = h.proxy_wallet.as_deref().filter(|w| !w.is_empty()) else {
                continue;
            };
            let mut holder = MarketHolder::new(wallet, side, h.amount.unwrap_or(0.0));
            holder.pseudonym = h.pseudonym;
            match side {
                Side::Yes => yes_holders.push(holder),
                Side::No => no_holders.push(holder),
            }
        }
    }

    Ok((yes_holders, no_holders))
}
