// fxmargin-core: fixed-risk FX margin position engine.
// risk-first design: a position can never lose more than its committed
// investment. floating loss is floored at -investment and liquidation fires
// exactly when the floor is reached.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   0.x  errors.rs: the EngineError taxonomy
//   1.x  types.rs: primitives: PositionId, UserId, Symbol, Direction, Price, Quote, Multiplier
//   2.x  spread.rs: bid/ask from mid + spread fraction, per-symbol defaults, entry/exit sides
//   3.x  position.rs: position struct, status lifecycle, mark/settle application
//   4.x  pricing.rs: open-request validation, entry pricing, liquidation closed form
//   5.x  mark.rs: mark-to-market, trigger evaluation (liq > stop > take)
//   6.x  settlement.rs: final P/L at close, reason -> status, balance delta
//   7.x  row.rs: flat persistence row and the one adapter in each direction
//   8.x  events.rs: state transition events for audit
//   9.x  config.rs: policy knobs: multiplier cap, spread clamp, price floor
//   10.x book.rs: position book: single writer, monotonic status transitions

pub mod book;
pub mod config;
pub mod errors;
pub mod events;
pub mod mark;
pub mod position;
pub mod pricing;
pub mod row;
pub mod settlement;
pub mod spread;
pub mod types;

// re exports for convenience
pub use book::*;
pub use config::*;
pub use errors::*;
pub use events::*;
pub use mark::*;
pub use position::*;
pub use pricing::*;
pub use row::{from_row, to_row, TradeRow};
pub use settlement::*;
pub use spread::*;
pub use types::*;
