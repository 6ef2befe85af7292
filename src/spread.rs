// 2.0: bid/ask derivation. ask = mid + mid*spread/2, bid = mid - mid*spread/2.
// a long enters at the ask and marks/exits at the bid; a short is the mirror.
// the asymmetry bakes the spread cost into a position the moment it opens.

use crate::types::{Direction, Price, Symbol};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidAsk {
    pub ask: Price,
    pub bid: Price,
}

impl BidAsk {
    // 2.1: the buyer pays the higher price, the seller receives the lower one
    pub fn entry_side(&self, direction: Direction) -> Price {
        match direction {
            Direction::Long => self.ask,
            Direction::Short => self.bid,
        }
    }

    // marking and closing happen on the opposite side of entry
    pub fn exit_side(&self, direction: Direction) -> Price {
        match direction {
            Direction::Long => self.bid,
            Direction::Short => self.ask,
        }
    }
}

// 2.2: spread fraction is clamped to max_spread so a corrupt table entry or a
// bad override can never produce an absurd quote. max_spread stays well below
// 2, which keeps the bid positive.
pub fn derive_bid_ask(mid: Price, spread_fraction: Decimal, max_spread: Decimal) -> BidAsk {
    let spread = spread_fraction.max(Decimal::ZERO).min(max_spread);
    let half = mid.value() * spread / dec!(2);

    BidAsk {
        ask: Price::new_unchecked(mid.value() + half),
        bid: Price::new_unchecked(mid.value() - half),
    }
}

// 2.3: static per-symbol spread defaults. unknown symbols fall back to the
// generic entry. an explicit override on the open request wins over the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadTable {
    defaults: HashMap<String, Decimal>,
    fallback: Decimal,
}

impl SpreadTable {
    pub fn new(fallback: Decimal) -> Self {
        Self {
            defaults: HashMap::new(),
            fallback,
        }
    }

    pub fn insert(&mut self, symbol: Symbol, spread_fraction: Decimal) {
        self.defaults.insert(symbol.as_str().to_string(), spread_fraction);
    }

    pub fn resolve(&self, symbol: &Symbol, override_fraction: Option<Decimal>) -> Decimal {
        if let Some(fraction) = override_fraction {
            return fraction;
        }
        self.defaults
            .get(symbol.as_str())
            .copied()
            .unwrap_or(self.fallback)
    }
}

impl Default for SpreadTable {
    fn default() -> Self {
        let mut table = Self::new(dec!(0.0002)); // generic default: 0.02%
        for (symbol, fraction) in [
            ("EUR/USD", dec!(0.00008)),
            ("GBP/USD", dec!(0.00012)),
            ("USD/JPY", dec!(0.00010)),
            ("USD/CHF", dec!(0.00012)),
            ("AUD/USD", dec!(0.00012)),
            ("USD/CAD", dec!(0.00014)),
            ("NZD/USD", dec!(0.00016)),
            ("EUR/GBP", dec!(0.00012)),
        ] {
            table.insert(Symbol::new(symbol), fraction);
        }
        table
    }
}
