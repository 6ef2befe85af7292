// 3.0: the position. investment and multiplier are fixed at open, entry and
// liquidation prices are set once and never mutated, and status moves out of
// Active exactly once, into exactly one terminal state.

use crate::mark::MarkUpdate;
use crate::settlement::Settlement;
use crate::types::{Direction, Multiplier, PositionId, Price, Quote, Symbol, Timestamp, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Active,
    Closed,
    Liquidated,
    StoppedOut,
    TookProfit,
}

impl PositionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PositionStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub user_id: UserId,
    pub symbol: Symbol,
    pub direction: Direction,
    /// Capital at risk. Strictly positive, fixed at open.
    pub investment: Quote,
    pub multiplier: Multiplier,
    /// Spread fraction resolved at open (override, table, or fallback).
    /// Stored here so marking stays a pure function of (position, mid).
    pub spread_fraction: Decimal,
    /// Spread-adjusted price on the entry side. Immutable.
    pub entry_price: Price,
    /// Price at which floating loss equals the full investment. Immutable.
    pub liquidation_price: Price,
    pub stop_loss: Option<Price>,
    pub take_profit: Option<Price>,
    /// Exit-side mark from the latest accepted tick.
    pub current_price: Price,
    pub floating_pnl: Quote,
    pub floating_pnl_percent: Decimal,
    pub status: PositionStatus,
    pub exit_price: Option<Price>,
    pub final_pnl: Option<Quote>,
    pub opened_at: Timestamp,
    pub closed_at: Option<Timestamp>,
}

impl Position {
    pub fn is_active(&self) -> bool {
        self.status == PositionStatus::Active
    }

    // 3.1: effective exposure = investment * multiplier
    pub fn notional(&self) -> Quote {
        Quote::new(self.investment.value() * self.multiplier.as_decimal())
    }

    // 3.2: fold an accepted mark update into the floating fields. entry price,
    // liquidation price, and status are untouched here.
    pub fn apply_mark(&mut self, update: &MarkUpdate) {
        debug_assert!(self.is_active(), "mark applied to a settled position");
        debug_assert!(
            update.floating_pnl.value() >= -self.investment.value(),
            "floating P/L breached the -investment floor"
        );

        self.current_price = update.exit_price;
        self.floating_pnl = update.floating_pnl;
        self.floating_pnl_percent = update.floating_pnl_percent;
    }

    // 3.3: the single transition out of Active. exit fields are written exactly
    // once; the floating fields are frozen at their settled values.
    pub fn settle(&mut self, settlement: &Settlement, closed_at: Timestamp) {
        debug_assert!(self.is_active(), "settle called on a settled position");

        self.status = settlement.status;
        self.exit_price = Some(settlement.exit_price);
        self.final_pnl = Some(settlement.final_pnl);
        self.current_price = settlement.exit_price;
        self.floating_pnl = settlement.final_pnl;
        self.floating_pnl_percent = settlement.final_pnl_percent;
        self.closed_at = Some(closed_at);
    }
}
