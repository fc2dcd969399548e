use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The data API is inconsistent about numeric encoding: the same field can
/// arrive as a JSON number, a numeric string, or null. Fold all of those
/// into `Option<f64>`; anything unparseable becomes `None`.
pub fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Position from Data API /positions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiPosition {
    #[serde(rename = "proxyWallet")]
    pub proxy_wallet: Option<String>,
    #[serde(rename = "conditionId")]
    pub condition_id: Option<String>,
    pub asset: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub size: Option<f64>,
    #[serde(rename = "cashPnl", default, deserialize_with = "de_opt_f64")]
    pub cash_pnl: Option<f64>,
    #[serde(rename = "realizedPnl", default, deserialize_with = "de_opt_f64")]
    pub realized_pnl: Option<f64>,
    pub outcome: Option<String>,
    #[serde(rename = "outcomeIndex")]
    pub outcome_index: Option<i32>,
}

/// Holder from Data API /holders.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiHolder {
    #[serde(rename = "proxyWallet")]
    pub proxy_wallet: Option<String>,
    pub amount: Option<f64>,
    pub pseudonym: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "outcomeIndex")]
    pub outcome_index: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiHolderResponse {
    pub token: Option<String>,
    pub holders: Vec<ApiHolder>,
}

/// Market from Gamma API. The list-ish fields (`outcomes`, `clobTokenIds`,
/// `outcomePrices`) are kept as raw JSON because Gamma serves them either as
/// arrays or as JSON-encoded strings depending on the endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GammaMarket {
    pub id: Option<String>,
    pub question: Option<String>,
    pub slug: Option<String>,
    #[serde(rename = "conditionId")]
    pub condition_id: Option<String>,
    pub outcomes: Option<Value>,
    #[serde(rename = "clobTokenIds")]
    pub clob_token_ids: Option<Value>,
    #[serde(rename = "outcomePrices")]
    pub outcome_prices: Option<Value>,
    #[serde(rename = "volumeNum", default, deserialize_with = "de_opt_f64")]
    pub volume_num: Option<f64>,
    #[serde(rename = "liquidityNum", default, deserialize_with = "de_opt_f64")]
    pub liquidity_num: Option<f64>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub events: Vec<GammaEventRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GammaEventRef {
    pub slug: Option<String>,
    pub category: Option<String>,
}

/// Event from Gamma API, carrying its sub-markets.
#[derive(Debug, Clone, Deserialize)]
pub struct GammaEvent {
    pub slug: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub markets: Vec<GammaMarket>,
}

/// One position record from the positions subgraph. `realizedPnl` is a
/// BigInt in micro-units, so it usually arrives as a decimal string.
#[derive(Debug, Clone, Deserialize)]
pub struct SubgraphPosition {
    #[serde(rename = "realizedPnl", default, deserialize_with = "de_opt_f64")]
    pub realized_pnl: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubgraphData {
    #[serde(rename = "userPositions", default)]
    pub user_positions: Vec<SubgraphPosition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubgraphResponse {
    pub data: Option<SubgraphData>,
}
