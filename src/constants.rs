use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Reporting (base) currency of every ledger
pub const BASE_CURRENCY: &str = "TWD";

/// Currency assumed for foreign-listed instruments
pub const FOREIGN_CURRENCY: &str = "USD";

/// Fixed USD/TWD rate used when no live rate is available
pub const DEFAULT_USD_TWD_RATE: Decimal = dec!(32.5);

/// Decimal precision for valuation calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Quantity threshold below which a share count is treated as zero
pub const QUANTITY_THRESHOLD: &str = "0.00000001";
