pub mod config;
pub mod fixtures;

pub use config::BenchConfig;
pub use fixtures::{IdGenerator, SlowUpstream, catalogue_records};
