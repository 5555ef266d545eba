pub mod metrics;
pub mod memory;

pub use metrics::Metrics;
pub use memory::Memory;
