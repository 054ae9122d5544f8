use eval_core::{EvalError, TradeRecord};

use crate::models::{BrokerConfig, CostBreakdown};

/// Price the frictional cost of executing a trade ledger.
///
/// Per row: `spread_cost = spread * volume`, while commission, slippage and
/// market impact are each `volume * rate`. The ledger is read-only; the
/// component vectors stay aligned 1:1 with its rows.
pub fn estimate_costs(
    trades: &[TradeRecord],
    broker: &BrokerConfig,
) -> Result<CostBreakdown, EvalError> {
    broker.validate()?;

    let mut spread_cost = Vec::with_capacity(trades.len());
    let mut commission = Vec::with_capacity(trades.len());
    let mut slippage = Vec::with_capacity(trades.len());
    let mut market_impact = Vec::with_capacity(trades.len());
    let mut total_volume = 0.0;

    for (i, trade) in trades.iter().enumerate() {
        if !trade.volume.is_finite() || trade.volume < 0.0 {
            return Err(EvalError::InvalidInput(format!(
                "trade {i} has invalid volume {}",
                trade.volume
            )));
        }
        if !trade.spread.is_finite() || trade.spread < 0.0 {
            return Err(EvalError::InvalidInput(format!(
                "trade {i} has invalid spread {}",
                trade.spread
            )));
        }

        spread_cost.push(trade.spread * trade.volume);
        commission.push(trade.volume * broker.commission_rate);
        slippage.push(trade.volume * broker.slippage_rate);
        market_impact.push(trade.volume * broker.market_impact_rate);
        total_volume += trade.volume;
    }

    if total_volume == 0.0 {
        return Err(EvalError::DegenerateInput(
            "total traded volume is zero, cost percentage is undefined".to_string(),
        ));
    }

    let total_cost = spread_cost.iter().sum::<f64>()
        + commission.iter().sum::<f64>()
        + slippage.iter().sum::<f64>()
        + market_impact.iter().sum::<f64>();

    Ok(CostBreakdown {
        spread_cost,
        commission,
        slippage,
        market_impact,
        total_cost,
        total_cost_percentage: total_cost / total_volume,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn trade(volume: f64, spread: f64) -> TradeRecord {
        TradeRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 15, 30, 0).unwrap(),
            volume,
            spread,
        }
    }

    fn broker() -> BrokerConfig {
        BrokerConfig {
            commission_rate: 0.001,
            slippage_rate: 0.0005,
            market_impact_rate: 0.0001,
        }
    }

    #[test]
    fn two_row_ledger_matches_hand_computation() {
        let trades = vec![trade(100.0, 0.01), trade(200.0, 0.02)];
        let breakdown = estimate_costs(&trades, &broker()).unwrap();

        let close = |actual: &[f64], expected: &[f64]| {
            actual
                .iter()
                .zip(expected)
                .all(|(a, e)| (a - e).abs() < 1e-12)
        };
        assert!(close(&breakdown.spread_cost, &[1.0, 4.0]));
        assert!(close(&breakdown.commission, &[0.1, 0.2]));
        assert!(close(&breakdown.slippage, &[0.05, 0.1]));
        assert!(close(&breakdown.market_impact, &[0.01, 0.02]));

        let expected_total = 1.0 + 4.0 + 0.1 + 0.2 + 0.05 + 0.1 + 0.01 + 0.02;
        assert!((breakdown.total_cost - expected_total).abs() < 1e-12);
        assert!((breakdown.total_cost_percentage - expected_total / 300.0).abs() < 1e-12);
    }

    #[test]
    fn zero_volume_ledger_is_degenerate() {
        let trades = vec![trade(0.0, 0.01), trade(0.0, 0.02)];
        assert!(matches!(
            estimate_costs(&trades, &broker()),
            Err(EvalError::DegenerateInput(_))
        ));
    }

    #[test]
    fn empty_ledger_is_degenerate() {
        assert!(matches!(
            estimate_costs(&[], &broker()),
            Err(EvalError::DegenerateInput(_))
        ));
    }

    #[test]
    fn negative_volume_is_invalid() {
        let trades = vec![trade(-1.0, 0.01)];
        assert!(matches!(
            estimate_costs(&trades, &broker()),
            Err(EvalError::InvalidInput(_))
        ));
    }

    #[test]
    fn negative_spread_is_invalid() {
        let trades = vec![trade(10.0, -0.01)];
        assert!(matches!(
            estimate_costs(&trades, &broker()),
            Err(EvalError::InvalidInput(_))
        ));
    }

    #[test]
    fn negative_rate_is_rejected() {
        let mut bad = broker();
        bad.slippage_rate = -0.1;
        assert!(matches!(
            estimate_costs(&[trade(10.0, 0.01)], &bad),
            Err(EvalError::InvalidConfiguration(_))
        ));
    }
}
