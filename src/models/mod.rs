pub mod pool;
pub mod quote;
pub mod gas;
pub mod alert;

pub use pool::{PoolRecord, EnrichedPool, PoolSnapshot};
pub use quote::{QuoteRequest, NormalizedQuote, QuoteReport};
pub use gas::{GasReport, ChainGas, GasStatus};
pub use alert::{AlertRule, AlertCondition, Notification};
