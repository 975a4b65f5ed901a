pub mod format;
pub mod units;

pub use format::format_balance;
pub use units::to_ui_amount;
