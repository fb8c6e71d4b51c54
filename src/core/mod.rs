pub mod engine;
pub mod io;
pub mod metrics;
pub mod model;
pub mod resolve;
pub mod stats;

#[cfg(test)]
pub mod testing;
