//! FX Margin Engine Simulation.
//!
//! Walks through the full position lifecycle: spread-adjusted entry, floating
//! P/L per tick, stop/take triggers, liquidation, and settlement.

use fxmargin_core::*;
use rust_decimal_macros::dec;

fn main() {
    println!("FX Margin Core Engine Simulation");
    println!("Fixed-Risk Positions, Full Lifecycle\n");

    scenario_1_spread_cost();
    scenario_2_profitable_long();
    scenario_3_liquidation();
    scenario_4_stop_and_take_triggers();
    scenario_5_short_on_rising_market();

    println!("\nAll simulations completed successfully.");
}

fn new_book() -> PositionBook {
    PositionBook::new(EnginePolicy::default(), SpreadTable::default())
}

/// The spread is paid the moment a position opens.
fn scenario_1_spread_cost() {
    println!("Scenario 1: Spread Cost at Open\n");

    let mut book = new_book();
    let id = book
        .open(&OpenRequest {
            user_id: UserId(1),
            symbol: Symbol::new("EUR/USD"),
            direction: Direction::Long,
            investment: dec!(1000),
            multiplier: dec!(50),
            mid_price: dec!(1.0850),
            stop_loss: None,
            take_profit: None,
            spread_override: None,
        })
        .unwrap();

    let pos = book.get(id).unwrap();
    println!("  Long 1000 @ 50x on EUR/USD, mid 1.0850");
    println!("  Entry (ask): {}", pos.entry_price);
    println!("  Mark (bid):  {}", pos.current_price);
    println!("  Initial P/L: {} ({}%)\n", pos.floating_pnl, pos.floating_pnl_percent.round_dp(4));
}

/// Open, mark through a rally, close manually.
fn scenario_2_profitable_long() {
    println!("Scenario 2: Profitable Long\n");

    let mut book = new_book();
    let id = book
        .open(&OpenRequest {
            user_id: UserId(1),
            symbol: Symbol::new("EUR/USD"),
            direction: Direction::Long,
            investment: dec!(100),
            multiplier: dec!(10),
            mid_price: dec!(1.0000),
            stop_loss: None,
            take_profit: None,
            spread_override: Some(dec!(0)),
        })
        .unwrap();

    for mid in [dec!(1.0050), dec!(1.0120), dec!(1.0200)] {
        book.advance_time(60_000);
        let outcome = book.tick(id, mid).unwrap();
        println!(
            "  tick {} -> floating P/L {} ({}%)",
            mid,
            outcome.update.floating_pnl,
            outcome.update.floating_pnl_percent
        );
    }

    book.advance_time(60_000);
    let settlement = book.close(id, dec!(1.0200)).unwrap();
    let balance = settle_balance(Quote::new(dec!(900)), Quote::new(dec!(100)), settlement.final_pnl);
    println!("  closed manually: final P/L {}, balance 900 -> {}\n", settlement.final_pnl, balance);
}

/// The loss floor: liquidation fires when floating loss reaches the investment.
fn scenario_3_liquidation() {
    println!("Scenario 3: Liquidation\n");

    let mut book = new_book();
    let id = book
        .open(&OpenRequest {
            user_id: UserId(2),
            symbol: Symbol::new("EUR/USD"),
            direction: Direction::Long,
            investment: dec!(100),
            multiplier: dec!(10),
            mid_price: dec!(1.0000),
            stop_loss: None,
            take_profit: None,
            spread_override: Some(dec!(0)),
        })
        .unwrap();

    println!("  Long 100 @ 10x, entry 1.0000, liquidation price {}", book.get(id).unwrap().liquidation_price);

    let outcome = book.tick(id, dec!(0.9050)).unwrap();
    println!("  tick 0.9050 -> P/L {}, still active", outcome.update.floating_pnl);

    let outcome = book.tick(id, dec!(0.8990)).unwrap();
    let settlement = outcome.settlement.expect("liquidated");
    println!(
        "  tick 0.8990 -> P/L clamped to {}, liquidated, returned {}\n",
        settlement.final_pnl, settlement.returned
    );
}

/// Stop-loss and take-profit settle automatically on the triggering tick.
fn scenario_4_stop_and_take_triggers() {
    println!("Scenario 4: Stop-Loss / Take-Profit\n");

    let mut book = new_book();
    let id = book
        .open(&OpenRequest {
            user_id: UserId(3),
            symbol: Symbol::new("GBP/USD"),
            direction: Direction::Long,
            investment: dec!(200),
            multiplier: dec!(20),
            mid_price: dec!(1.2650),
            stop_loss: None,
            take_profit: Some(dec!(1.2700)),
            spread_override: Some(dec!(0)),
        })
        .unwrap();

    book.set_stop_levels(id, Some(dec!(1.2600)), Some(dec!(1.2700))).unwrap();
    println!("  Long 200 @ 20x GBP/USD, stop 1.2600, take 1.2700");

    let outcome = book.tick(id, dec!(1.2705)).unwrap();
    let settlement = outcome.settlement.expect("take profit");
    println!(
        "  tick 1.2705 -> took profit at {}, final P/L {}\n",
        settlement.exit_price, settlement.final_pnl
    );
}

/// A short profits when the market falls and bleeds when it rises.
fn scenario_5_short_on_rising_market() {
    println!("Scenario 5: Short Against a Rising Market\n");

    let mut book = new_book();
    let id = book
        .open(&OpenRequest {
            user_id: UserId(4),
            symbol: Symbol::new("USD/JPY"),
            direction: Direction::Short,
            investment: dec!(50),
            multiplier: dec!(4),
            mid_price: dec!(2.000),
            stop_loss: None,
            take_profit: None,
            spread_override: Some(dec!(0.001)),
        })
        .unwrap();

    println!("  Short 50 @ 4x, mid 2.000, spread 0.1% -> entry (bid) {}", book.get(id).unwrap().entry_price);

    let outcome = book.tick(id, dec!(2.100)).unwrap();
    println!(
        "  tick 2.100 -> marks at ask {}, floating P/L {}",
        outcome.update.exit_price,
        outcome.update.floating_pnl.value().round_dp(2)
    );

    let settlement = book.close(id, dec!(2.100)).unwrap();
    println!("  closed: final P/L {}\n", settlement.final_pnl.value().round_dp(2));
}
