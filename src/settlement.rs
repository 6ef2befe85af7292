// 6.0: close & settlement. the final P/L is the mark-to-market formula
// evaluated once at the closing price, with the same -investment floor. the
// balance delta returns the earmarked investment together with the realized
// P/L; the ledger write-back itself is external.

use crate::config::EnginePolicy;
use crate::errors::EngineError;
use crate::mark::{floating_pnl, pnl_percent};
use crate::position::{Position, PositionStatus};
use crate::spread::derive_bid_ask;
use crate::types::{Price, Quote};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// maps 1:1 onto the terminal status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    Manual,
    Liquidated,
    StoppedOut,
    TookProfit,
}

impl CloseReason {
    pub fn terminal_status(&self) -> PositionStatus {
        match self {
            CloseReason::Manual => PositionStatus::Closed,
            CloseReason::Liquidated => PositionStatus::Liquidated,
            CloseReason::StoppedOut => PositionStatus::StoppedOut,
            CloseReason::TookProfit => PositionStatus::TookProfit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub exit_price: Price,
    pub final_pnl: Quote,
    pub final_pnl_percent: Decimal,
    pub reason: CloseReason,
    pub status: PositionStatus,
    /// Amount credited back to the ledger: investment + final P/L.
    /// Never negative because the P/L is floored at -investment.
    pub returned: Quote,
}

// 6.1: pure settlement calculation. does not mutate the position; the single
// status transition is applied by the caller (see Position::settle and the book).
pub fn close_position(
    position: &Position,
    closing_mid: Decimal,
    reason: CloseReason,
    policy: &EnginePolicy,
) -> Result<Settlement, EngineError> {
    if !position.is_active() {
        return Err(EngineError::PositionNotActive {
            id: position.id,
            status: position.status,
        });
    }

    let mid = Price::new(closing_mid).ok_or(EngineError::StalePrice { got: closing_mid })?;
    let quote = derive_bid_ask(mid, position.spread_fraction, policy.max_spread_fraction);
    let exit_price = quote.exit_side(position.direction);

    let final_pnl = floating_pnl(
        position.direction,
        position.investment,
        position.multiplier,
        position.entry_price,
        exit_price,
    );

    Ok(Settlement {
        exit_price,
        final_pnl,
        final_pnl_percent: pnl_percent(final_pnl, position.investment),
        reason,
        status: reason.terminal_status(),
        returned: position.investment.add(final_pnl),
    })
}

// 6.2: new ledger balance after settlement. the investment was debited at
// open, so the net effect on the balance is just the realized P/L.
pub fn settle_balance(old_balance: Quote, investment: Quote, final_pnl: Quote) -> Quote {
    old_balance.add(investment).add(final_pnl)
}
