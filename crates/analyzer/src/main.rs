use anyhow::Result;
use common::polymarket::PolymarketClient;
use std::sync::Arc;
use std::time::Duration;

mod holders;
mod imbalance;
mod markets;
mod pnl;
mod url_parser;

use holders::MarketHolder;
use imbalance::ScanResult;
use markets::ActiveMarket;

fn parse_args<I>(mut args: I) -> std::result::Result<String, String>
where
    I: Iterator<Item = String>,
{
    // Drop argv[0].
    let _ = args.next();

    let Some(url) = args.next() else {
        return Err("usage: analyzer <polymarket-event-url>".to_string());
    };
    if args.next().is_some() {
        return Err("usage: analyzer <polymarket-event-url>".to_string());
    }
    Ok(url)
}

struct MarketReport {
    scan: ScanResult,
    yes_holders: Vec<MarketHolder>,
    no_holders: Vec<MarketHolder>,
    enriched: usize,
}

async fn analyze_market(
    client: &PolymarketClient,
    fetcher: &pnl::PnlFetcher<PolymarketClient>,
    market: &ActiveMarket,
    config: &common::config::Config,
) -> Result<MarketReport> {
    let (yes_holders, no_holders) = holders::fetch_market_holders(
        client,
        &market.condition_id,
        &market.token_id_yes,
        &market.token_id_no,
        config.analysis.holders_per_market,
    )
    .await?;

    // Enrich both sides in one pass so batching spans the whole holder set.
    let yes_len = yes_holders.len();
    let mut all_holders = yes_holders;
    all_holders.extend(no_holders);
    let enriched = fetcher
        .enrich_holders(
            &mut all_holders,
            Some(&market.condition_id),
            config.enrichment.batch_size,
        )
        .await;

    let no_holders = all_holders.split_off(yes_len);
    let yes_holders = all_holders;

    let scan = imbalance::scan_market(&yes_holders, &no_holders, &config.analysis);
    Ok(MarketReport {
        scan,
        yes_holders,
        no_holders,
        enriched,
    })
}

fn print_holder_lines(side_holders: &[MarketHolder], limit: usize) {
    for h in side_holders.iter().take(limit) {
        let overall = h
            .overall_pnl
            .map_or_else(|| "-".to_string(), |v| format!("{v:+.2}"));
        let realized = h
            .realized_pnl
            .map_or_else(|| "-".to_string(), |v| format!("{v:+.2}"));
        println!(
            "    {:<44}  size={:>12.2}  market_pnl={overall:>12}  account_pnl={realized:>14}",
            h.proxy_wallet, h.amount
        );
    }
}

fn print_report(market: &ActiveMarket, report: &MarketReport) {
    let flag = if report.scan.is_flagged { "FLAGGED" } else { "ok" };
    println!();
    println!("Market: {}", market.question);
    println!(
        "  prices yes/no: {:.3}/{:.3}  volume: {:.0}  liquidity: {:.0}",
        market.yes_price, market.no_price, market.volume, market.liquidity
    );
    println!(
        "  holders: {} YES / {} NO  enriched: {}",
        report.yes_holders.len(),
        report.no_holders.len(),
        report.enriched
    );
    println!(
        "  imbalance: {flag}  dominant={}  ratio={:.2}  top_holder_share={:.2}",
        report.scan.dominant_side.as_str(),
        report.scan.imbalance_ratio,
        report.scan.top_holder_share
    );
    println!("  YES holders:");
    print_holder_lines(&report.yes_holders, 5);
    println!("  NO holders:");
    print_holder_lines(&report.no_holders, 5);
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = common::config::Config::load()?;

    common::observability::init(&config.general.log_level);

    let url = parse_args(std::env::args()).map_err(anyhow::Error::msg)?;
    let parsed = url_parser::parse_polymarket_url(&url)?;
    tracing::info!(
        event_slug = %parsed.event_slug,
        market_slug = parsed.market_slug.as_deref().unwrap_or(""),
        "resolving markets"
    );

    let client = Arc::new(PolymarketClient::from_config(&config.polymarket)?);
    let markets =
        markets::resolve_url(&client, &parsed.event_slug, parsed.market_slug.as_deref()).await?;
    if markets.is_empty() {
        anyhow::bail!("no markets found for this URL; it may be closed or mistyped");
    }
    tracing::info!(count = markets.len(), "markets resolved");

    // One fetcher for the whole run so the PNL cache spans markets.
    let fetcher = pnl::PnlFetcher::new(
        Arc::clone(&client),
        Duration::from_millis(config.enrichment.batch_delay_ms),
        config.enrichment.subgraph_page_limit,
    );

    let mut flagged = 0_usize;
    let mut completed = 0_usize;
    for market in &markets {
        match analyze_market(&client, &fetcher, market, &config).await {
            Ok(report) => {
                completed += 1;
                if report.scan.is_flagged {
                    flagged += 1;
                }
                print_report(market, &report);
            }
            Err(e) => {
                tracing::error!(
                    condition_id = %market.condition_id,
                    error = %e,
                    "market analysis failed; continuing with remaining markets"
                );
            }
        }
    }

    let stats = fetcher.stats();
    println!();
    println!(
        "Done: {completed}/{} markets analyzed, {flagged} flagged, {} wallets cached, {} API calls",
        markets.len(),
        stats.cached_wallets,
        stats.api_calls
    );
    tracing::info!(
        completed,
        flagged,
        cached_wallets = stats.cached_wallets,
        api_calls = stats.api_calls,
        "analysis complete"
    );

    Ok(())
}
