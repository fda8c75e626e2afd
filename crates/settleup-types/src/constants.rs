//! System-wide constants for the SettleUp settlement engine.

use rust_decimal::Decimal;

/// Default dust threshold: net balances with magnitude strictly below one
/// cent are dropped by the aggregator and ignored by the matcher.
pub const DEFAULT_BALANCE_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Default time a settlement run waits for its group lock (milliseconds).
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;
