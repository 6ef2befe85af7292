// 0.1: typed failures for every expected business condition. the engine never
// panics on bad input; errors come back as Result and carry the reason.

use crate::position::PositionStatus;
use crate::types::PositionId;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("investment must be positive, got {got}")]
    InvalidInvestment { got: Decimal },

    #[error("multiplier must be a whole number between 1 and {max}, got {got}")]
    InvalidMultiplier { got: Decimal, max: u32 },

    #[error("open price must be positive, got {got}")]
    InvalidOpenPrice { got: Decimal },

    #[error("stop level must be positive, got {got}")]
    InvalidStopLevel { got: Decimal },

    #[error("unrecognized direction {0:?}, expected buy/long/sell/short")]
    UnknownDirection(String),

    // stale or corrupt tick: the position's prior state is left untouched
    #[error("price tick must be positive, got {got}; update rejected")]
    StalePrice { got: Decimal },

    #[error("position {0:?} not found")]
    PositionNotFound(PositionId),

    #[error("position {id:?} is {status:?}, not Active")]
    PositionNotActive {
        id: PositionId,
        status: PositionStatus,
    },

    #[error("row field {field} out of range: {got}")]
    InvalidRowField { field: &'static str, got: Decimal },

    #[error("unknown row status {0:?}")]
    UnknownRowStatus(String),

    #[error("unknown row direction {0}")]
    UnknownRowDirection(i64),
}
