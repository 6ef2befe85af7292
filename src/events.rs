// 8.0: every state change produces an event. used for audit trails, state
// reconstruction, and notifying external systems. the engine itself does no
// I/O; the event log is its observability surface.

use crate::settlement::CloseReason;
use crate::types::{Direction, Price, PositionId, Quote, Symbol, Timestamp, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    PositionOpened(PositionOpenedEvent),
    StopLevelsUpdated(StopLevelsUpdatedEvent),
    PositionClosed(PositionClosedEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionOpenedEvent {
    pub position_id: PositionId,
    pub user_id: UserId,
    pub symbol: Symbol,
    pub direction: Direction,
    pub investment: Quote,
    pub multiplier: u32,
    pub entry_price: Price,
    pub liquidation_price: Price,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopLevelsUpdatedEvent {
    pub position_id: PositionId,
    pub stop_loss: Option<Price>,
    pub take_profit: Option<Price>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionClosedEvent {
    pub position_id: PositionId,
    pub user_id: UserId,
    pub exit_price: Price,
    pub final_pnl: Quote,
    pub reason: CloseReason,
    /// investment + final P/L, the amount handed back to the ledger
    pub returned: Quote,
}
