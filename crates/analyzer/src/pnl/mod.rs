//! PNL enrichment for market holders.
//!
//! Three upstreams know something about a wallet's profit and loss: the
//! profile page (scraped, matches what the platform displays), the positions
//! endpoint (per-market cash PNL, fallback totals) and the positions
//! subgraph (realized PNL in micro-units). Each is unreliable on its own, so
//! every wallet is fetched from all three, merged by [`reconcile`], and the
//! result cached for the lifetime of the process. Holders are enriched in
//! small concurrent batches with a fixed pause in between; that pause is the
//! only rate limiting applied to the upstream.

mod reconcile;
mod sources;

pub use reconcile::{reconcile, PnlRecord, SourceFragments, SubgraphAggregate};
pub use sources::{extract_profile_pnl, PnlSource};

use crate::holders::MarketHolder;
use common::types::ApiPosition;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Subgraph `realizedPnl` values are integer micro-USDC.
const MICRO_UNITS: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallStats {
    pub cached_wallets: usize,
    pub api_calls: u64,
}

/// Fetches and caches per-wallet PNL. Clones share one cache and one call
/// counter, so a single instance can serve every market in a run.
pub struct PnlFetcher<S> {
    source: Arc<S>,
    cache: Arc<Mutex<HashMap<String, PnlRecord>>>,
    api_calls: Arc<AtomicU64>,
    batch_delay: Duration,
    subgraph_page_limit: u32,
}

impl<S> Clone for PnlFetcher<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            cache: Arc::clone(&self.cache),
            api_calls: Arc::clone(&self.api_calls),
            batch_delay: self.batch_delay,
            subgraph_page_limit: self.subgraph_page_limit,
        }
    }
}

impl<S: PnlSource + Send + Sync + 'static> PnlFetcher<S> {
    pub fn new(source: Arc<S>, batch_delay: Duration, subgraph_page_limit: u32) -> Self {
        Self {
            source,
            cache: Arc::new(Mutex::new(HashMap::new())),
            api_calls: Arc::new(AtomicU64::new(0)),
            batch_delay,
            subgraph_page_limit,
        }
    }

    /// Cached record for a wallet, if any. Addresses are case-insensitive.
    pub fn cached(&self, wallet: &str) -> Option<PnlRecord> {
        self.cache
            .lock()
            .expect("pnl cache lock poisoned")
            .get(&wallet.to_lowercase())
            .cloned()
    }

    fn store(&self, wallet_lower: &str, record: PnlRecord) {
        self.cache
            .lock()
            .expect("pnl cache lock poisoned")
            .insert(wallet_lower.to_string(), record);
    }

    pub fn stats(&self) -> CallStats {
        CallStats {
            cached_wallets: self.cache.lock().expect("pnl cache lock poisoned").len(),
            api_calls: self.api_calls.load(Ordering::Relaxed),
        }
    }

    /// Every adapter attempt counts as one outbound call, success or not.
    fn count_attempt(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// All-time PNL scraped from the wallet's profile page. Any transport
    /// failure, non-2xx status or missing token is "unavailable".
    async fn profile_pnl(&self, wallet: &str) -> Option<f64> {
        self.count_attempt();
        match self.source.fetch_profile_page(wallet).await {
            Ok(body) => {
                metrics::counter!("analyzer_api_requests_total", "endpoint" => "profile", "status" => "ok")
                    .increment(1);
                extract_profile_pnl(&body)
            }
            Err(e) => {
                metrics::counter!("analyzer_api_requests_total", "endpoint" => "profile", "status" => "error")
                    .increment(1);
                tracing::debug!(wallet = %wallet, error = %e, "profile pnl unavailable");
                None
            }
        }
    }

    /// The wallet's raw positions list; empty on any failure.
    async fn wallet_positions(&self, wallet: &str) -> Vec<ApiPosition> {
        self.count_attempt();
        match self.source.fetch_positions(wallet).await {
            Ok(positions) => {
                metrics::counter!("analyzer_api_requests_total", "endpoint" => "positions", "status" => "ok")
                    .increment(1);
                positions
            }
            Err(e) => {
                metrics::counter!("analyzer_api_requests_total", "endpoint" => "positions", "status" => "error")
                    .increment(1);
                tracing::debug!(wallet = %wallet, error = %e, "positions unavailable");
                Vec::new()
            }
        }
    }

    /// Realized PNL summed over the wallet's subgraph records, converted out
    /// of micro-units. An empty result set is "unavailable", not zero.
    async fn subgraph_aggregate(&self, wallet: &str) -> Option<SubgraphAggregate> {
        self.count_attempt();
        let records = match self
            .source
            .fetch_subgraph_positions(wallet, self.subgraph_page_limit)
            .await
        {
            Ok(records) => {
                metrics::counter!("analyzer_api_requests_total", "endpoint" => "subgraph", "status" => "ok")
                    .increment(1);
                records
            }
            Err(e) => {
                metrics::counter!("analyzer_api_requests_total", "endpoint" => "subgraph", "status" => "error")
                    .increment(1);
                tracing::debug!(wallet = %wallet, error = %e, "subgraph unavailable");
                return None;
            }
        };

        if records.is_empty() {
            return None;
        }

        let realized_pnl: f64 = records
            .iter()
            .map(|r| r.realized_pnl.unwrap_or(0.0) / MICRO_UNITS)
            .sum();
        Some(SubgraphAggregate {
            realized_pnl,
            position_count: records.len() as u32,
        })
    }

    /// Fetch-and-reconcile for one wallet. A cache hit short-circuits all
    /// network activity; "not found" is never cached, so missing wallets are
    /// retried on later calls.
    pub async fn fetch_wallet_pnl(
        &self,
        wallet: &str,
        condition_id: Option<&str>,
    ) -> Option<PnlRecord> {
        let wallet = wallet.to_lowercase();
        if let Some(hit) = self.cached(&wallet) {
            return Some(hit);
        }

        let (profile_pnl, positions, subgraph) = tokio::join!(
            self.profile_pnl(&wallet),
            self.wallet_positions(&wallet),
            self.subgraph_aggregate(&wallet),
        );

        let fragments = SourceFragments {
            profile_pnl,
            positions,
            subgraph,
        };
        let record = reconcile(&fragments, condition_id)?;
        self.store(&wallet, record.clone());
        Some(record)
    }

    /// Enrich holders in place, `batch_size` wallets at a time.
    ///
    /// Wallets within a batch are fetched concurrently; batches run strictly
    /// one after another with `batch_delay` in between (none after the last).
    /// A wallet whose sources all fail — or whose task panics — is simply
    /// left unenriched; siblings are unaffected. Returns how many holders
    /// got data.
    pub async fn enrich_holders(
        &self,
        holders: &mut [MarketHolder],
        condition_id: Option<&str>,
        batch_size: usize,
    ) -> usize {
        let batch_size = batch_size.max(1);
        let batch_count = holders.len().div_ceil(batch_size);
        let mut found = 0_usize;

        for (batch_index, batch) in holders.chunks_mut(batch_size).enumerate() {
            let mut tasks = Vec::with_capacity(batch.len());
            for (i, holder) in batch.iter().enumerate() {
                let fetcher = self.clone();
                let wallet = holder.proxy_wallet.clone();
                let condition_id = condition_id.map(str::to_owned);
                tasks.push(tokio::spawn(async move {
                    let record = fetcher.fetch_wallet_pnl(&wallet, condition_id.as_deref()).await;
                    (i, record)
                }));
            }

            for task in tasks {
                match task.await {
                    Ok((i, Some(record))) => {
                        let holder = &mut batch[i];
                        holder.overall_pnl = if condition_id.is_some() {
                            record.market_cash_pnl
                        } else {
                            record.total_pnl
                        };
                        holder.realized_pnl = record.realized_pnl;
                        holder.is_on_leaderboard = true;
                        found += 1;
                    }
                    Ok((_, None)) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "enrichment task failed; siblings unaffected");
                    }
                }
            }

            if batch_index + 1 < batch_count {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        found
    }
}
