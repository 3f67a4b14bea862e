//! The static fan-out graph: one shared ingest/format/channelize path
//! feeding N independent channel chains (spec §4.7).

pub mod executor;
pub mod operator;

pub use executor::GraphExecutor;
pub use operator::Operator;
