// 9.0 config.rs: policy knobs in one place. caps are policy, not law: callers
// tune them per deployment instead of the engine hardcoding limits.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnginePolicy {
    /// Upper bound on the leverage multiplier accepted at open.
    pub max_multiplier: u32,
    /// Hard clamp on the spread fraction; guards against bad table data.
    pub max_spread_fraction: Decimal,
    /// Floor for the derived liquidation price. A 1x long would otherwise
    /// get a liquidation price of exactly zero, which is not a valid price.
    pub min_price: Decimal,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            max_multiplier: 1000,
            max_spread_fraction: dec!(0.01), // 1%
            min_price: dec!(0.0001),
        }
    }
}

impl EnginePolicy {
    // retail preset: tighter leverage and spread bounds
    pub fn conservative() -> Self {
        Self {
            max_multiplier: 100,
            max_spread_fraction: dec!(0.005),
            min_price: dec!(0.0001),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_ordered() {
        let default = EnginePolicy::default();
        let conservative = EnginePolicy::conservative();

        assert!(conservative.max_multiplier < default.max_multiplier);
        assert!(conservative.max_spread_fraction < default.max_spread_fraction);
    }
}
