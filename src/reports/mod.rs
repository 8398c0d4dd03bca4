// Reports module - valued profit and period trade ledgers

pub mod ledger;
pub mod period;
pub mod profit;

pub use ledger::{LedgerRow, TradeLedger};
pub use period::Period;
pub use profit::{ProfitReport, ValuedMatch, RATE_BUFFER_DAYS};
