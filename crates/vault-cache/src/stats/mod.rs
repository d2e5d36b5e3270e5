//! Statistics counters

mod counters;

pub use counters::InMemoryStats;
