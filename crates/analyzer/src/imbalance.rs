use crate::holders::{MarketHolder, Side};
use common::config::Analysis;

/// Holder-concentration scan for one market.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub yes_total: f64,
    pub no_total: f64,
    pub dominant_side: Side,
    /// Dominant side total over the other side's total; `INFINITY` when the
    /// other side holds nothing.
    pub imbalance_ratio: f64,
    /// Largest single holder's share of the dominant side.
    pub top_holder_share: f64,
    pub is_flagged: bool,
}

fn side_total(holders: &[MarketHolder]) -> f64 {
    holders.iter().map(|h| h.amount).sum()
}

fn top_share(holders: &[MarketHolder], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    holders.iter().map(|h| h.amount).fold(0.0, f64::max) / total
}

/// Flag a market whose holder distribution is lopsided: one side dwarfs the
/// other and that side is dominated by a single wallet. Both thresholds have
/// to trip, and tiny holder sets never flag.
pub fn scan_market(
    yes_holders: &[MarketHolder],
    no_holders: &[MarketHolder],
    cfg: &Analysis,
) -> ScanResult {
    let yes_total = side_total(yes_holders);
    let no_total = side_total(no_holders);

    let (dominant_side, dominant_holders, dominant_total, other_total) = if yes_total >= no_total {
        (Side::Yes, yes_holders, yes_total, no_total)
    } else {
        (Side::No, no_holders, no_total, yes_total)
    };

    let imbalance_ratio = if other_total > 0.0 {
        dominant_total / other_total
    } else if dominant_total > 0.0 {
        f64::INFINITY
    } else {
        1.0
    };

    let top_holder_share = top_share(dominant_holders, dominant_total);

    let is_flagged = dominant_holders.len() >= cfg.min_holders_for_flag
        && imbalance_ratio >= cfg.side_ratio_threshold
        && top_holder_share >= cfg.top_holder_share_threshold;

    ScanResult {
        yes_total,
        no_total,
        dominant_side,
        imbalance_ratio,
        top_holder_share,
        is_flagged,
    }
}
