use common::types::ApiPosition;

/// Canonical enrichment result for one wallet.
///
/// `total_pnl` and `realized_pnl` describe the same all-time quantity;
/// both are kept because downstream consumers read either name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PnlRecord {
    pub total_pnl: Option<f64>,
    pub realized_pnl: Option<f64>,
    /// Present only when the subgraph supplied data.
    pub position_count: Option<u32>,
    /// Unrealized PNL on one specific market's position; present only when a
    /// market context was supplied and a matching position was found.
    pub market_cash_pnl: Option<f64>,
}

impl PnlRecord {
    /// An all-null record is "not found" and must never be cached.
    pub fn is_found(&self) -> bool {
        self.total_pnl.is_some() || self.market_cash_pnl.is_some()
    }
}

/// Aggregate of a wallet's subgraph position records, already converted out
/// of micro-units.
#[derive(Debug, Clone, PartialEq)]
pub struct SubgraphAggregate {
    pub realized_pnl: f64,
    pub position_count: u32,
}

/// Whatever the source adapters managed to fetch for one wallet. Any field
/// can be empty; the reconciler decides what survives.
#[derive(Debug, Clone, Default)]
pub struct SourceFragments {
    pub profile_pnl: Option<f64>,
    pub positions: Vec<ApiPosition>,
    pub subgraph: Option<SubgraphAggregate>,
}

fn market_cash_pnl(positions: &[ApiPosition], condition_id: &str) -> Option<f64> {
    positions
        .iter()
        .find(|p| {
            p.condition_id
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(condition_id))
        })
        .map(|p| p.cash_pnl.unwrap_or(0.0))
}

/// Merge per-source fragments into one record.
///
/// Trust order for the all-time figures: profile scrape (it matches the
/// value the platform itself displays), then the subgraph aggregate, then
/// the positions list — realized sum first, cash sum when realized nets to
/// zero. The market-scoped cash PNL always comes from the positions filter,
/// independent of which source won the totals. Returns `None` when every
/// source came up empty.
pub fn reconcile(fragments: &SourceFragments, condition_id: Option<&str>) -> Option<PnlRecord> {
    let mut record = PnlRecord {
        position_count: fragments.subgraph.as_ref().map(|s| s.position_count),
        market_cash_pnl: condition_id.and_then(|c| market_cash_pnl(&fragments.positions, c)),
        ..PnlRecord::default()
    };

    if let Some(profile_pnl) = fragments.profile_pnl {
        record.total_pnl = Some(profile_pnl);
        record.realized_pnl = Some(profile_pnl);
    } else if let Some(subgraph) = &fragments.subgraph {
        record.total_pnl = Some(subgraph.realized_pnl);
        record.realized_pnl = Some(subgraph.realized_pnl);
    } else if !fragments.positions.is_empty() {
        let realized_sum: f64 = fragments
            .positions
            .iter()
            .map(|p| p.realized_pnl.unwrap_or(0.0))
            .sum();
        record.realized_pnl = Some(realized_sum);
        if realized_sum != 0.0 {
            record.total_pnl = Some(realized_sum);
        } else {
            let cash_sum: f64 = fragments
                .positions
                .iter()
                .map(|p| p.cash_pnl.unwrap_or(0.0))
                .sum();
            record.total_pnl = Some(cash_sum);
        }
    }

    record.is_found().then_some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(condition_id: &str, cash_pnl: Option<f64>, realized_pnl: Option<f64>) -> ApiPosition {
        ApiPosition {
            condition_id: Some(condition_id.to_string()),
            cash_pnl,
            realized_pnl,
            ..ApiPosition::default()
        }
    }

    #[test]
    fn test_all_sources_empty_is_not_found() {
        assert_eq!(reconcile(&SourceFragments::default(), None), None);
        assert_eq!(reconcile(&SourceFragments::default(), Some("0xaa")), None);
    }

    #[test]
    fn test_profile_wins_over_everything() {
        let fragments = SourceFragments {
            profile_pnl: Some(123.45),
            positions: vec![position("0xaa", Some(5.0), Some(10.0))],
            subgraph: Some(SubgraphAggregate {
                realized_pnl: 90.0,
                position_count: 3,
            }),
        };
        let record = reconcile(&fragments, None).unwrap();
        assert_eq!(record.total_pnl, Some(123.45));
        assert_eq!(record.realized_pnl, Some(123.45));
        // Position count still reflects what the subgraph reported.
        assert_eq!(record.position_count, Some(3));
    }

    #[test]
    fn test_subgraph_wins_over_positions() {
        let fragments = SourceFragments {
            profile_pnl: None,
            positions: vec![position("0xaa", Some(1.0), Some(10.0))],
            subgraph: Some(SubgraphAggregate {
                realized_pnl: 90.0,
                position_count: 3,
            }),
        };
        let record = reconcile(&fragments, None).unwrap();
        assert_eq!(record.total_pnl, Some(90.0));
        assert_eq!(record.position_count, Some(3));
    }

    #[test]
    fn test_positions_realized_sum_fallback() {
        let fragments = SourceFragments {
            positions: vec![
                position("0xaa", Some(1.0), Some(10.0)),
                position("0xbb", Some(2.0), Some(-4.0)),
            ],
            ..SourceFragments::default()
        };
        let record = reconcile(&fragments, None).unwrap();
        assert_eq!(record.total_pnl, Some(6.0));
        assert_eq!(record.realized_pnl, Some(6.0));
        assert_eq!(record.position_count, None);
    }

    #[test]
    fn test_zero_realized_falls_back_to_cash_sum() {
        let fragments = SourceFragments {
            positions: vec![
                position("0xaa", Some(40.0), Some(0.0)),
                position("0xbb", Some(2.0), None),
            ],
            ..SourceFragments::default()
        };
        let record = reconcile(&fragments, None).unwrap();
        assert_eq!(record.total_pnl, Some(42.0));
        assert_eq!(record.realized_pnl, Some(0.0));
    }

    #[test]
    fn test_market_scoped_extraction_is_case_insensitive_first_match() {
        let fragments = SourceFragments {
            positions: vec![
                position("0xAA", Some(5.0), None),
                position("0xBB", Some(9.0), None),
                position("0xbb", Some(100.0), None),
            ],
            ..SourceFragments::default()
        };
        let record = reconcile(&fragments, Some("0xbb")).unwrap();
        assert_eq!(record.market_cash_pnl, Some(9.0));
    }

    #[test]
    fn test_market_match_with_null_cash_pnl_reads_zero() {
        let fragments = SourceFragments {
            profile_pnl: Some(7.0),
            positions: vec![position("0xaa", None, None)],
            ..SourceFragments::default()
        };
        let record = reconcile(&fragments, Some("0xAA")).unwrap();
        assert_eq!(record.market_cash_pnl, Some(0.0));
    }

    #[test]
    fn test_market_cash_pnl_alone_is_a_found_record() {
        // Profile and subgraph down, positions exist but only for the scoped
        // market; the record is still worth caching.
        let fragments = SourceFragments {
            positions: vec![position("0xaa", Some(-3.5), Some(0.0))],
            ..SourceFragments::default()
        };
        let record = reconcile(&fragments, Some("0xaa")).unwrap();
        assert_eq!(record.market_cash_pnl, Some(-3.5));
        assert_eq!(record.total_pnl, Some(-3.5));
    }

    #[test]
    fn test_no_market_context_leaves_market_cash_pnl_empty() {
        let fragments = SourceFragments {
            profile_pnl: Some(1.0),
            positions: vec![position("0xaa", Some(5.0), None)],
            ..SourceFragments::default()
        };
        let record = reconcile(&fragments, None).unwrap();
        assert_eq!(record.market_cash_pnl, None);
    }
}
