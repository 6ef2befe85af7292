// 5.0: mark-to-market. pnl = sign * investment * multiplier * (exit - entry) / entry,
// floored at -investment: a position can never lose more than the capital it
// committed. pure function of (position, new mid); a stale tick is rejected and
// the position's prior state is left untouched.

use crate::config::EnginePolicy;
use crate::errors::EngineError;
use crate::position::Position;
use crate::settlement::CloseReason;
use crate::spread::derive_bid_ask;
use crate::types::{Direction, Multiplier, Price, Quote};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

// 5.1: all three conditions are evaluated independently against the same tick.
// more than one can fire at once; `fired` applies the priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triggers {
    pub should_liquidate: bool,
    pub stop_loss_hit: bool,
    pub take_profit_hit: bool,
}

impl Triggers {
    pub fn none() -> Self {
        Self {
            should_liquidate: false,
            stop_loss_hit: false,
            take_profit_hit: false,
        }
    }

    pub fn any(&self) -> bool {
        self.should_liquidate || self.stop_loss_hit || self.take_profit_hit
    }

    // liquidation is a risk-of-ruin event and preempts voluntary exits
    pub fn fired(&self) -> Option<CloseReason> {
        if self.should_liquidate {
            Some(CloseReason::Liquidated)
        } else if self.stop_loss_hit {
            Some(CloseReason::StoppedOut)
        } else if self.take_profit_hit {
            Some(CloseReason::TookProfit)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkUpdate {
    pub exit_price: Price,
    pub floating_pnl: Quote,
    pub floating_pnl_percent: Decimal,
    pub triggers: Triggers,
}

// 5.2: the pnl formula. clamped so the loss never exceeds the investment.
pub fn floating_pnl(
    direction: Direction,
    investment: Quote,
    multiplier: Multiplier,
    entry_price: Price,
    exit_price: Price,
) -> Quote {
    let relative_change =
        (exit_price.value() - entry_price.value()) / entry_price.value();
    let raw = direction.sign() * investment.value() * multiplier.as_decimal() * relative_change;

    Quote::new(raw.max(-investment.value()))
}

pub fn pnl_percent(pnl: Quote, investment: Quote) -> Decimal {
    pnl.value() / investment.value() * dec!(100)
}

// 5.3: recompute the floating state for a new mid and report which terminal
// conditions are newly satisfied. does not mutate the position; acting on a
// trigger (and the status transition) is the caller's decision.
pub fn mark_position(
    position: &Position,
    new_mid: Decimal,
    policy: &EnginePolicy,
) -> Result<MarkUpdate, EngineError> {
    if !position.is_active() {
        return Err(EngineError::PositionNotActive {
            id: position.id,
            status: position.status,
        });
    }

    let mid = Price::new(new_mid).ok_or(EngineError::StalePrice { got: new_mid })?;
    let quote = derive_bid_ask(mid, position.spread_fraction, policy.max_spread_fraction);
    let exit_price = quote.exit_side(position.direction);

    let pnl = floating_pnl(
        position.direction,
        position.investment,
        position.multiplier,
        position.entry_price,
        exit_price,
    );

    Ok(MarkUpdate {
        exit_price,
        floating_pnl: pnl,
        floating_pnl_percent: pnl_percent(pnl, position.investment),
        triggers: evaluate_triggers(position, exit_price, pnl),
    })
}

// 5.4: liquidation on the pnl floor; stop/take compared against the exit-side
// price, direction-aware.
fn evaluate_triggers(position: &Position, exit_price: Price, pnl: Quote) -> Triggers {
    let should_liquidate = pnl.value() <= -position.investment.value();

    let stop_loss_hit = match (position.direction, position.stop_loss) {
        (Direction::Long, Some(stop)) => exit_price <= stop,
        (Direction::Short, Some(stop)) => exit_price >= stop,
        (_, None) => false,
    };

    let take_profit_hit = match (position.direction, position.take_profit) {
        (Direction::Long, Some(take)) => exit_price >= take,
        (Direction::Short, Some(take)) => exit_price <= take,
        (_, None) => false,
    };

    Triggers {
        should_liquidate,
        stop_loss_hit,
        take_profit_hit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnginePolicy;
    use crate::pricing::{open_position, OpenRequest};
    use crate::spread::SpreadTable;
    use crate::types::{PositionId, Symbol, Timestamp, UserId};
    use rust_decimal_macros::dec;

    fn open_test_position(
        direction: Direction,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
    ) -> Position {
        let request = OpenRequest {
            user_id: UserId(1),
            symbol: Symbol::new("EUR/USD"),
            direction,
            investment: dec!(100),
            multiplier: dec!(10),
            mid_price: dec!(1.0000),
            stop_loss,
            take_profit,
            spread_override: Some(dec!(0)),
        };
        open_position(
            PositionId(1),
            &request,
            &SpreadTable::default(),
            &EnginePolicy::default(),
            Timestamp::from_millis(0),
        )
        .unwrap()
    }

    #[test]
    fn pnl_zero_at_entry_with_no_spread() {
        let pos = open_test_position(Direction::Long, None, None);
        let update = mark_position(&pos, dec!(1.0000), &EnginePolicy::default()).unwrap();

        assert_eq!(update.floating_pnl.value(), dec!(0));
        assert_eq!(update.floating_pnl_percent, dec!(0));
        assert!(!update.triggers.any());
    }

    #[test]
    fn long_loss_before_liquidation() {
        let pos = open_test_position(Direction::Long, None, None);
        // relative change = -0.095, pnl = 1 * 100 * 10 * -0.095 = -95
        let update = mark_position(&pos, dec!(0.9050), &EnginePolicy::default()).unwrap();

        assert_eq!(update.floating_pnl.value(), dec!(-95.0000));
        assert_eq!(update.floating_pnl_percent, dec!(-95.000000));
        assert!(!update.triggers.should_liquidate);
    }

    #[test]
    fn loss_clamped_and_liquidation_fires() {
        let pos = open_test_position(Direction::Long, None, None);
        // raw pnl = -101, clamped to -100, liquidation fires
        let update = mark_position(&pos, dec!(0.8990), &EnginePolicy::default()).unwrap();

        assert_eq!(update.floating_pnl.value(), dec!(-100));
        assert!(update.triggers.should_liquidate);
        assert_eq!(update.triggers.fired(), Some(CloseReason::Liquidated));
    }

    #[test]
    fn liquidation_exactly_at_liquidation_price() {
        let pos = open_test_position(Direction::Long, None, None);
        assert_eq!(pos.liquidation_price.value(), dec!(0.9000));

        let update = mark_position(&pos, dec!(0.9000), &EnginePolicy::default()).unwrap();

        assert_eq!(update.floating_pnl.value(), dec!(-100.0000));
        assert!(update.triggers.should_liquidate);
    }

    #[test]
    fn stop_loss_direction_rules() {
        let long = open_test_position(Direction::Long, Some(dec!(0.9900)), None);
        let update = mark_position(&long, dec!(0.9890), &EnginePolicy::default()).unwrap();
        assert!(update.triggers.stop_loss_hit);

        let short = open_test_position(Direction::Short, Some(dec!(1.0100)), None);
        let update = mark_position(&short, dec!(1.0110), &EnginePolicy::default()).unwrap();
        assert!(update.triggers.stop_loss_hit);

        // not reached yet
        let update = mark_position(&short, dec!(1.0050), &EnginePolicy::default()).unwrap();
        assert!(!update.triggers.stop_loss_hit);
    }

    #[test]
    fn take_profit_direction_rules() {
        let long = open_test_position(Direction::Long, None, Some(dec!(1.0200)));
        let update = mark_position(&long, dec!(1.0200), &EnginePolicy::default()).unwrap();
        assert!(update.triggers.take_profit_hit);
        assert_eq!(update.triggers.fired(), Some(CloseReason::TookProfit));

        let short = open_test_position(Direction::Short, None, Some(dec!(0.9800)));
        let update = mark_position(&short, dec!(0.9790), &EnginePolicy::default()).unwrap();
        assert!(update.triggers.take_profit_hit);
    }

    #[test]
    fn liquidation_preempts_stop_and_take() {
        let triggers = Triggers {
            should_liquidate: true,
            stop_loss_hit: true,
            take_profit_hit: true,
        };
        assert_eq!(triggers.fired(), Some(CloseReason::Liquidated));

        let triggers = Triggers {
            should_liquidate: false,
            stop_loss_hit: true,
            take_profit_hit: true,
        };
        assert_eq!(triggers.fired(), Some(CloseReason::StoppedOut));
    }

    #[test]
    fn stale_tick_rejected() {
        let pos = open_test_position(Direction::Long, None, None);

        let err = mark_position(&pos, dec!(0), &EnginePolicy::default()).unwrap_err();
        assert_eq!(err, EngineError::StalePrice { got: dec!(0) });

        let err = mark_position(&pos, dec!(-1), &EnginePolicy::default()).unwrap_err();
        assert_eq!(err, EngineError::StalePrice { got: dec!(-1) });
    }

    #[test]
    fn spread_cost_shows_as_initial_loss() {
        let request = OpenRequest {
            user_id: UserId(1),
            symbol: Symbol::new("EUR/USD"),
            direction: Direction::Long,
            investment: dec!(100),
            multiplier: dec!(10),
            mid_price: dec!(1.0000),
            stop_loss: None,
            take_profit: None,
            spread_override: Some(dec!(0.001)), // 0.1%
        };
        let pos = open_position(
            PositionId(1),
            &request,
            &SpreadTable::default(),
            &EnginePolicy::default(),
            Timestamp::from_millis(0),
        )
        .unwrap();

        // entered at ask, marked at bid: P/L starts slightly negative
        assert!(pos.floating_pnl.is_negative());

        let update = mark_position(&pos, dec!(1.0000), &EnginePolicy::default()).unwrap();
        assert_eq!(update.floating_pnl, pos.floating_pnl);
    }
}
