// 4.0: position pricing. validates an open request, applies the spread model,
// derives the liquidation price closed form, and returns a fully populated
// Active position. no side effects: persistence, balance debit, and
// notification belong to the caller.

use crate::config::EnginePolicy;
use crate::errors::EngineError;
use crate::mark::{floating_pnl, pnl_percent};
use crate::position::{Position, PositionStatus};
use crate::spread::{derive_bid_ask, SpreadTable};
use crate::types::{Direction, Multiplier, PositionId, Price, Quote, Symbol, Timestamp, UserId};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// 4.1: the open request as it arrives from outside. numeric fields are raw
// decimals on purpose: validation happens in open_position, and a rejected
// request never produces a partial position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRequest {
    pub user_id: UserId,
    pub symbol: Symbol,
    pub direction: Direction,
    pub investment: Decimal,
    pub multiplier: Decimal,
    pub mid_price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    /// Explicit spread fraction; wins over the symbol table when set.
    pub spread_override: Option<Decimal>,
}

// 4.2: liquidation closed form. solving pnl = -investment for price gives
// entry * (1 - sign/multiplier). floored at policy.min_price: a 1x long
// would otherwise land on exactly zero.
pub fn liquidation_price(
    entry_price: Price,
    direction: Direction,
    multiplier: Multiplier,
    policy: &EnginePolicy,
) -> Price {
    let raw = entry_price.value()
        * (Decimal::ONE - direction.sign() / multiplier.as_decimal());

    Price::new_unchecked(raw.max(policy.min_price))
}

// 4.3: open a position. the initial mark uses the exit side of the same quote,
// so the cost of the spread shows up immediately as a small unrealized loss.
pub fn open_position(
    id: PositionId,
    request: &OpenRequest,
    spreads: &SpreadTable,
    policy: &EnginePolicy,
    timestamp: Timestamp,
) -> Result<Position, EngineError> {
    if request.investment <= Decimal::ZERO {
        return Err(EngineError::InvalidInvestment {
            got: request.investment,
        });
    }

    let multiplier = validate_multiplier(request.multiplier, policy)?;

    let mid = Price::new(request.mid_price).ok_or(EngineError::InvalidOpenPrice {
        got: request.mid_price,
    })?;

    let stop_loss = validate_stop_level(request.stop_loss)?;
    let take_profit = validate_stop_level(request.take_profit)?;

    let spread_fraction = spreads
        .resolve(&request.symbol, request.spread_override)
        .max(Decimal::ZERO)
        .min(policy.max_spread_fraction);

    let quote = derive_bid_ask(mid, spread_fraction, policy.max_spread_fraction);
    let entry_price = quote.entry_side(request.direction);
    let exit_price = quote.exit_side(request.direction);

    let investment = Quote::new(request.investment);
    let initial_pnl = floating_pnl(
        request.direction,
        investment,
        multiplier,
        entry_price,
        exit_price,
    );

    Ok(Position {
        id,
        user_id: request.user_id,
        symbol: request.symbol.clone(),
        direction: request.direction,
        investment,
        multiplier,
        spread_fraction,
        entry_price,
        liquidation_price: liquidation_price(entry_price, request.direction, multiplier, policy),
        stop_loss,
        take_profit,
        current_price: exit_price,
        floating_pnl: initial_pnl,
        floating_pnl_percent: pnl_percent(initial_pnl, investment),
        status: PositionStatus::Active,
        exit_price: None,
        final_pnl: None,
        opened_at: timestamp,
        closed_at: None,
    })
}

fn validate_multiplier(
    multiplier: Decimal,
    policy: &EnginePolicy,
) -> Result<Multiplier, EngineError> {
    let rejected = EngineError::InvalidMultiplier {
        got: multiplier,
        max: policy.max_multiplier,
    };

    if !multiplier.is_integer() || multiplier < Decimal::ONE {
        return Err(rejected);
    }

    let value = multiplier.to_u32().ok_or_else(|| rejected.clone())?;
    if value > policy.max_multiplier {
        return Err(rejected);
    }

    Multiplier::new(value).ok_or(rejected)
}

fn validate_stop_level(level: Option<Decimal>) -> Result<Option<Price>, EngineError> {
    match level {
        None => Ok(None),
        Some(value) => Price::new(value)
            .map(Some)
            .ok_or(EngineError::InvalidStopLevel { got: value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> OpenRequest {
        OpenRequest {
            user_id: UserId(1),
            symbol: Symbol::new("EUR/USD"),
            direction: Direction::Long,
            investment: dec!(100),
            multiplier: dec!(10),
            mid_price: dec!(1.0000),
            stop_loss: None,
            take_profit: None,
            spread_override: Some(dec!(0)),
        }
    }

    fn open(request: &OpenRequest) -> Result<Position, EngineError> {
        open_position(
            PositionId(1),
            request,
            &SpreadTable::default(),
            &EnginePolicy::default(),
            Timestamp::from_millis(0),
        )
    }

    #[test]
    fn open_long_no_spread() {
        let pos = open(&request()).unwrap();

        assert_eq!(pos.entry_price.value(), dec!(1.0000));
        assert_eq!(pos.liquidation_price.value(), dec!(0.9000));
        assert_eq!(pos.notional().value(), dec!(1000));
        assert_eq!(pos.floating_pnl.value(), dec!(0));
        assert_eq!(pos.status, PositionStatus::Active);
    }

    #[test]
    fn open_short_enters_at_bid() {
        let mut req = request();
        req.direction = Direction::Short;
        req.investment = dec!(50);
        req.multiplier = dec!(4);
        req.mid_price = dec!(2.000);
        req.spread_override = Some(dec!(0.001)); // 0.1%

        let pos = open(&req).unwrap();

        assert_eq!(pos.entry_price.value(), dec!(1.999));
        // short liquidation is above entry: 1.999 * (1 + 1/4)
        assert_eq!(pos.liquidation_price.value(), dec!(2.49875));
    }

    #[test]
    fn liquidation_price_short_above_entry() {
        let policy = EnginePolicy::default();
        let entry = Price::new_unchecked(dec!(1.0000));
        let m = Multiplier::new(10).unwrap();

        let long = liquidation_price(entry, Direction::Long, m, &policy);
        let short = liquidation_price(entry, Direction::Short, m, &policy);

        assert_eq!(long.value(), dec!(0.9000));
        assert_eq!(short.value(), dec!(1.1000));
    }

    #[test]
    fn one_x_long_liquidation_floored() {
        let policy = EnginePolicy::default();
        let entry = Price::new_unchecked(dec!(1.0000));
        let m = Multiplier::new(1).unwrap();

        let liq = liquidation_price(entry, Direction::Long, m, &policy);
        assert_eq!(liq.value(), policy.min_price);
    }

    #[test]
    fn rejects_non_positive_investment() {
        let mut req = request();
        req.investment = dec!(0);
        assert!(matches!(
            open(&req),
            Err(EngineError::InvalidInvestment { .. })
        ));

        req.investment = dec!(-10);
        assert!(matches!(
            open(&req),
            Err(EngineError::InvalidInvestment { .. })
        ));
    }

    #[test]
    fn rejects_bad_multiplier() {
        let mut req = request();
        req.multiplier = dec!(0.5);
        assert!(matches!(
            open(&req),
            Err(EngineError::InvalidMultiplier { .. })
        ));

        req.multiplier = dec!(0);
        assert!(matches!(
            open(&req),
            Err(EngineError::InvalidMultiplier { .. })
        ));

        req.multiplier = dec!(2.5);
        assert!(matches!(
            open(&req),
            Err(EngineError::InvalidMultiplier { .. })
        ));

        // above the policy cap
        req.multiplier = dec!(5000);
        assert!(matches!(
            open(&req),
            Err(EngineError::InvalidMultiplier { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_mid() {
        let mut req = request();
        req.mid_price = dec!(-1);
        assert!(matches!(
            open(&req),
            Err(EngineError::InvalidOpenPrice { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_stop_levels() {
        let mut req = request();
        req.stop_loss = Some(dec!(0));
        assert!(matches!(
            open(&req),
            Err(EngineError::InvalidStopLevel { .. })
        ));
    }

    #[test]
    fn multiplier_cap_is_policy() {
        let mut req = request();
        req.multiplier = dec!(500);

        // default policy allows 500x, the conservative preset does not
        assert!(open(&req).is_ok());

        let err = open_position(
            PositionId(1),
            &req,
            &SpreadTable::default(),
            &EnginePolicy::conservative(),
            Timestamp::from_millis(0),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidMultiplier {
                got: dec!(500),
                max: 100
            }
        );
    }
}
