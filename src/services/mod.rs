pub mod cache;
pub mod pipeline;
pub mod aggregator;
pub mod gas;
pub mod alerts;
pub mod rules;

pub use cache::{KeyedTtlCache, TtlCache};
pub use pipeline::PoolPipeline;
pub use aggregator::QuoteAggregator;
pub use gas::GasService;
pub use alerts::{AlertEngine, NotificationSink, TracingSink};
pub use rules::RuleStore;
