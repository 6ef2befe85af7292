// 7.0: persistence boundary. one flat row shape and one explicit adapter in
// each direction. the row speaks its own dialect: direction travels as both an
// integer and a label, and the status vocabulary differs from the in-memory
// enum. nothing outside this module reads those encodings.

use crate::errors::EngineError;
use crate::position::{Position, PositionStatus};
use crate::types::{Direction, Multiplier, PositionId, Price, Quote, Symbol, Timestamp, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    pub id: u64,
    pub user_id: u64,
    pub symbol: String,
    /// +1 = long, -1 = short.
    pub direction: i8,
    pub direction_label: String,
    pub investment: Decimal,
    pub multiplier: u32,
    /// investment * multiplier, stored denormalized.
    pub volume: Decimal,
    pub spread_fraction: Decimal,
    pub entry_price: Decimal,
    pub liquidation_price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub current_price: Decimal,
    pub floating_pnl: Decimal,
    pub floating_pnl_percent: Decimal,
    /// open | closed | liquidated | stop_loss | take_profit
    pub status: String,
    pub exit_price: Option<Decimal>,
    pub final_pnl: Option<Decimal>,
    pub opened_at: i64,
    pub closed_at: Option<i64>,
}

fn status_label(status: PositionStatus) -> &'static str {
    match status {
        PositionStatus::Active => "open",
        PositionStatus::Closed => "closed",
        PositionStatus::Liquidated => "liquidated",
        PositionStatus::StoppedOut => "stop_loss",
        PositionStatus::TookProfit => "take_profit",
    }
}

fn status_from_label(label: &str) -> Option<PositionStatus> {
    match label {
        "open" => Some(PositionStatus::Active),
        "closed" => Some(PositionStatus::Closed),
        "liquidated" => Some(PositionStatus::Liquidated),
        "stop_loss" => Some(PositionStatus::StoppedOut),
        "take_profit" => Some(PositionStatus::TookProfit),
        _ => None,
    }
}

// 7.1: serialize to the row shape. every numeric field is carried as Decimal
// so no precision is lost on the way out.
pub fn to_row(position: &Position) -> TradeRow {
    TradeRow {
        id: position.id.0,
        user_id: position.user_id.0,
        symbol: position.symbol.as_str().to_string(),
        direction: position.direction.as_int(),
        direction_label: position.direction.label().to_string(),
        investment: position.investment.value(),
        multiplier: position.multiplier.value(),
        volume: position.notional().value(),
        spread_fraction: position.spread_fraction,
        entry_price: position.entry_price.value(),
        liquidation_price: position.liquidation_price.value(),
        stop_loss: position.stop_loss.map(|p| p.value()),
        take_profit: position.take_profit.map(|p| p.value()),
        current_price: position.current_price.value(),
        floating_pnl: position.floating_pnl.value(),
        floating_pnl_percent: position.floating_pnl_percent,
        status: status_label(position.status).to_string(),
        exit_price: position.exit_price.map(|p| p.value()),
        final_pnl: position.final_pnl.map(|q| q.value()),
        opened_at: position.opened_at.as_millis(),
        closed_at: position.closed_at.map(|t| t.as_millis()),
    }
}

// 7.2: rebuild a position from a row. the integer direction field is
// authoritative; a corrupt row comes back as a typed error, never a panic.
pub fn from_row(row: &TradeRow) -> Result<Position, EngineError> {
    let direction = Direction::from_int(i64::from(row.direction))
        .ok_or(EngineError::UnknownRowDirection(i64::from(row.direction)))?;

    let status = status_from_label(&row.status)
        .ok_or_else(|| EngineError::UnknownRowStatus(row.status.clone()))?;

    let multiplier =
        Multiplier::new(row.multiplier).ok_or(EngineError::InvalidRowField {
            field: "multiplier",
            got: Decimal::from(row.multiplier),
        })?;

    if row.investment <= Decimal::ZERO {
        return Err(EngineError::InvalidRowField {
            field: "investment",
            got: row.investment,
        });
    }

    Ok(Position {
        id: PositionId(row.id),
        user_id: UserId(row.user_id),
        symbol: Symbol::new(row.symbol.clone()),
        direction,
        investment: Quote::new(row.investment),
        multiplier,
        spread_fraction: row.spread_fraction,
        entry_price: row_price(row.entry_price, "entry_price")?,
        liquidation_price: row_price(row.liquidation_price, "liquidation_price")?,
        stop_loss: opt_row_price(row.stop_loss, "stop_loss")?,
        take_profit: opt_row_price(row.take_profit, "take_profit")?,
        current_price: row_price(row.current_price, "current_price")?,
        floating_pnl: Quote::new(row.floating_pnl),
        floating_pnl_percent: row.floating_pnl_percent,
        status,
        exit_price: opt_row_price(row.exit_price, "exit_price")?,
        final_pnl: row.final_pnl.map(Quote::new),
        opened_at: Timestamp::from_millis(row.opened_at),
        closed_at: row.closed_at.map(Timestamp::from_millis),
    })
}

fn row_price(value: Decimal, field: &'static str) -> Result<Price, EngineError> {
    Price::new(value).ok_or(EngineError::InvalidRowField { field, got: value })
}

fn opt_row_price(
    value: Option<Decimal>,
    field: &'static str,
) -> Result<Option<Price>, EngineError> {
    value.map(|v| row_price(v, field)).transpose()
}
