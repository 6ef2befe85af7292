// 10.0: the position book. owns every position and is the single writer:
// all mutation funnels through here one call at a time, which is what makes
// the status transition monotonic in practice. a position closes exactly once
// and is never revived; racing ticks and close requests must be serialized by
// whoever drives this book (one in-flight mutation per position).

use crate::config::EnginePolicy;
use crate::errors::EngineError;
use crate::events::{
    Event, EventId, EventPayload, PositionClosedEvent, PositionOpenedEvent,
    StopLevelsUpdatedEvent,
};
use crate::mark::{mark_position, MarkUpdate};
use crate::position::Position;
use crate::pricing::{open_position, OpenRequest};
use crate::settlement::{close_position, CloseReason, Settlement};
use crate::spread::SpreadTable;
use crate::types::{PositionId, Price, Symbol, Timestamp};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Outcome of a price tick: the mark update that was applied, and the
/// settlement if a trigger fired on this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub update: MarkUpdate,
    pub settlement: Option<Settlement>,
}

#[derive(Debug)]
pub struct PositionBook {
    policy: EnginePolicy,
    spreads: SpreadTable,
    positions: HashMap<PositionId, Position>,
    events: Vec<Event>,
    next_position_id: u64,
    next_event_id: u64,
    current_time: Timestamp,
}

impl PositionBook {
    pub fn new(policy: EnginePolicy, spreads: SpreadTable) -> Self {
        Self {
            policy,
            spreads,
            positions: HashMap::new(),
            events: Vec::new(),
            next_position_id: 1,
            next_event_id: 1,
            current_time: Timestamp::from_millis(0),
        }
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis() + millis);
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn get(&self, id: PositionId) -> Option<&Position> {
        self.positions.get(&id)
    }

    pub fn positions_iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn active_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values().filter(|p| p.is_active())
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    // 10.1: open. validation failures surface verbatim; nothing is stored on error.
    pub fn open(&mut self, request: &OpenRequest) -> Result<PositionId, EngineError> {
        let id = PositionId(self.next_position_id);
        let position = open_position(id, request, &self.spreads, &self.policy, self.current_time)?;
        self.next_position_id += 1;

        self.emit(EventPayload::PositionOpened(PositionOpenedEvent {
            position_id: id,
            user_id: position.user_id,
            symbol: position.symbol.clone(),
            direction: position.direction,
            investment: position.investment,
            multiplier: position.multiplier.value(),
            entry_price: position.entry_price,
            liquidation_price: position.liquidation_price,
        }));

        self.positions.insert(id, position);
        Ok(id)
    }

    // 10.2: amend stop levels on an Active position. owners may move or clear
    // them at any time before the position settles.
    pub fn set_stop_levels(
        &mut self,
        id: PositionId,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
    ) -> Result<(), EngineError> {
        let stop_loss = validate_level(stop_loss)?;
        let take_profit = validate_level(take_profit)?;

        let position = self
            .positions
            .get_mut(&id)
            .ok_or(EngineError::PositionNotFound(id))?;

        if !position.is_active() {
            return Err(EngineError::PositionNotActive {
                id,
                status: position.status,
            });
        }

        position.stop_loss = stop_loss;
        position.take_profit = take_profit;

        self.emit(EventPayload::StopLevelsUpdated(StopLevelsUpdatedEvent {
            position_id: id,
            stop_loss,
            take_profit,
        }));

        Ok(())
    }

    // 10.3: price tick. applies the mark, then acts on the highest-priority
    // trigger at the same tick price. a stale tick rejects without touching
    // the position.
    pub fn tick(&mut self, id: PositionId, mid: Decimal) -> Result<TickOutcome, EngineError> {
        let position = self
            .positions
            .get(&id)
            .ok_or(EngineError::PositionNotFound(id))?;

        let update = mark_position(position, mid, &self.policy)?;

        let settlement = match update.triggers.fired() {
            Some(reason) => Some(close_position(position, mid, reason, &self.policy)?),
            None => None,
        };

        let position = self.positions.get_mut(&id).expect("position checked above");
        position.apply_mark(&update);

        if let Some(settlement) = settlement {
            self.apply_settlement(id, &settlement);
        }

        Ok(TickOutcome { update, settlement })
    }

    // 10.4: mark every active position on a symbol against the same tick.
    pub fn tick_symbol(
        &mut self,
        symbol: &Symbol,
        mid: Decimal,
    ) -> Result<Vec<(PositionId, TickOutcome)>, EngineError> {
        // reject the tick up front so no position sees a corrupt price
        Price::new(mid).ok_or(EngineError::StalePrice { got: mid })?;

        let ids: Vec<PositionId> = self
            .positions
            .values()
            .filter(|p| p.is_active() && p.symbol == *symbol)
            .map(|p| p.id)
            .collect();

        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = self.tick(id, mid)?;
            outcomes.push((id, outcome));
        }
        Ok(outcomes)
    }

    // 10.5: manual close by the owner.
    pub fn close(&mut self, id: PositionId, mid: Decimal) -> Result<Settlement, EngineError> {
        let position = self
            .positions
            .get(&id)
            .ok_or(EngineError::PositionNotFound(id))?;

        let settlement = close_position(position, mid, CloseReason::Manual, &self.policy)?;
        self.apply_settlement(id, &settlement);
        Ok(settlement)
    }

    // the one place a position leaves Active
    fn apply_settlement(&mut self, id: PositionId, settlement: &Settlement) {
        let closed_at = self.current_time;
        let position = self.positions.get_mut(&id).expect("settling unknown position");
        position.settle(settlement, closed_at);

        let user_id = position.user_id;
        self.emit(EventPayload::PositionClosed(PositionClosedEvent {
            position_id: id,
            user_id,
            exit_price: settlement.exit_price,
            final_pnl: settlement.final_pnl,
            reason: settlement.reason,
            returned: settlement.returned,
        }));
    }

    fn emit(&mut self, payload: EventPayload) {
        let event = Event {
            id: EventId(self.next_event_id),
            timestamp: self.current_time,
            payload,
        };
        self.next_event_id += 1;
        self.events.push(event);
    }
}

fn validate_level(level: Option<Decimal>) -> Result<Option<Price>, EngineError> {
    match level {
        None => Ok(None),
        Some(value) => Price::new(value)
            .map(Some)
            .ok_or(EngineError::InvalidStopLevel { got: value }),
    }
}
