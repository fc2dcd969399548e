use anyhow::Result;
use chrono::{DateTime, Utc};
use common::polymarket::PolymarketClient;
use common::types::GammaMarket;
use serde_json::Value;

/// A binary market resolved from a user-supplied URL.
#[derive(Debug, Clone)]
pub struct ActiveMarket {
    pub market_id: String,
    pub condition_id: String,
    pub question: String,
    pub slug: String,
    pub token_id_yes: String,
    pub token_id_no: String,
    pub volume: f64,
    pub liquidity: f64,
    pub yes_price: f64,
    pub no_price: f64,
    pub end_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
}

/// Gamma serves list fields either as JSON arrays or as JSON-encoded strings
/// depending on the endpoint. Normalize both to a string vector.
fn decode_string_list(value: Option<&Value>) -> Vec<String> {
    fn from_items(items: &[Value]) -> Vec<String> {
        items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect()
    }

    match value {
        Some(Value::Array(items)) => from_items(items),
        Some(Value::String(s)) => serde_json::from_str::<Vec<Value>>(s)
            .map(|items| from_items(&items))
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Parse a raw Gamma market without any expiry filtering: the user asked for
/// this market explicitly, so closed or far-dated markets are still shown.
pub fn parse_market_lenient(raw: &GammaMarket) -> Option<ActiveMarket> {
    let outcomes = decode_string_list(raw.outcomes.as_ref());
    let token_ids = decode_string_list(raw.clob_token_ids.as_ref());
    if outcomes.len() < 2 || token_ids.len() < 2 {
        return None;
    }
    if token_ids[0].is_empty() || token_ids[1].is_empty() {
        return None;
    }

    let condition_id = raw.condition_id.clone().filter(|c| !c.is_empty())?;

    let prices = decode_string_list(raw.outcome_prices.as_ref());
    let price_at = |i: usize| prices.get(i).and_then(|p| p.parse::<f64>().ok()).unwrap_or(0.5);

    let end_date = raw
        .end_date
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    // Prefer the parent event's slug and category when present: the market's
    // own slug is often an internal variant of the event slug.
    let mut slug = raw.slug.clone().unwrap_or_default();
    let mut category = raw.category.clone();
    if let Some(event) = raw.events.first() {
        if let Some(event_slug) = event.slug.clone().filter(|s| !s.is_empty()) {
            slug = event_slug;
        }
        if let Some(event_category) = event.category.clone().filter(|c| !c.is_empty()) {
            category = Some(event_category);
        }
    }

    Some(ActiveMarket {
        market_id: raw.id.clone().unwrap_or_default(),
        condition_id,
        question: raw.question.clone().unwrap_or_default(),
        slug,
        token_id_yes: token_ids[0].clone(),
        token_id_no: token_ids[1].clone(),
        volume: raw.volume_num.unwrap_or(0.0),
        liquidity: raw.liquidity_num.unwrap_or(0.0),
        yes_price: price_at(0),
        no_price: price_at(1),
        end_date,
        category,
    })
}

async fn market_by_slug(client: &PolymarketClient, slug: &str) -> Option<ActiveMarket> {
    match client.fetch_markets_by_slug(slug).await {
        Ok(raw_markets) => raw_markets.first().and_then(parse_market_lenient),
        Err(e) => {
            tracing::warn!(slug = %slug, error = %e, "market lookup failed; trying next strategy");
            None
        }
    }
}

/// Resolve an event/market slug pair into markets.
///
/// Tries the market slug first, then the event slug as a direct market (some
/// sports URLs are market-only), then falls back to the event's sub-markets.
pub async fn resolve_url(
    client: &PolymarketClient,
    event_slug: &str,
    market_slug: Option<&str>,
) -> Result<Vec<ActiveMarket>> {
    if let Some(market_slug) = market_slug {
        if let Some(market) = market_by_slug(client, market_slug).await {
            return Ok(vec![market]);
        }
    }

    if market_slug != Some(event_slug) {
        if let Some(market) = market_by_slug(client, event_slug).await {
            return Ok(vec![market]);
        }
    }

    let events = match client.fetch_events_by_slug(event_slug).await {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!(slug = %event_slug, error = %e, "event lookup failed");
            return Ok(Vec::new());
        }
    };

    let Some(event) = events.first() else {
        return Ok(Vec::new());
    };

    Ok(event.markets.iter().filter_map(parse_market_lenient).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_market() -> GammaMarket {
        let markets: Vec<GammaMarket> =
            serde_json::from_str(include_str!("../../../tests/fixtures/gamma_market_sample.json"))
                .unwrap();
        markets.into_iter().next().unwrap()
    }

    #[test]
    fn test_parse_market_from_stringified_lists() {
        let market = parse_market_lenient(&fixture_market()).unwrap();
        assert_eq!(market.question, "Will it rain in NYC on Friday?");
        assert!(market.condition_id.starts_with("0x178cf420"));
        assert!(market.token_id_yes.starts_with("71367563"));
        assert!(market.token_id_no.starts_with("10926592"));
        assert_eq!(market.yes_price, 0.315);
        assert_eq!(market.no_price, 0.685);
        // Event slug wins over the market's own slug.
        assert_eq!(market.slug, "nyc-weather-friday");
        assert!(market.end_date.is_some());
    }

    #[test]
    fn test_parse_market_with_array_lists() {
        let raw = GammaMarket {
            condition_id: Some("0xc1".to_string()),
            outcomes: Some(serde_json::json!(["Yes", "No"])),
            clob_token_ids: Some(serde_json::json!(["1", "2"])),
            outcome_prices: Some(serde_json::json!(["0.40", "0.60"])),
            ..GammaMarket::default()
        };
        let market = parse_market_lenient(&raw).unwrap();
        assert_eq!(market.token_id_yes, "1");
        assert_eq!(market.yes_price, 0.40);
    }

    #[test]
    fn test_parse_market_missing_prices_defaults_to_half() {
        let raw = GammaMarket {
            condition_id: Some("0xc1".to_string()),
            outcomes: Some(serde_json::json!(["Yes", "No"])),
            clob_token_ids: Some(serde_json::json!(["1", "2"])),
            ..GammaMarket::default()
        };
        let market = parse_market_lenient(&raw).unwrap();
        assert_eq!(market.yes_price, 0.5);
        assert_eq!(market.no_price, 0.5);
    }

    #[test]
    fn test_parse_market_rejects_missing_tokens_or_condition() {
        let mut raw = fixture_market();
        raw.clob_token_ids = Some(serde_json::json!([]));
        assert!(parse_market_lenient(&raw).is_none());

        let mut raw = fixture_market();
        raw.condition_id = None;
        assert!(parse_market_lenient(&raw).is_none());
    }

    #[test]
    fn test_decode_string_list_garbage_is_empty() {
        assert!(decode_string_list(Some(&serde_json::json!("not json"))).is_empty());
        assert!(decode_string_list(Some(&serde_json::json!(42))).is_empty());
        assert!(decode_string_list(None).is_empty());
    }
}
