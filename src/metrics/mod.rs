//! Status-code aggregation shared by all workers.
mod histogram;


pub use histogram::{StatusCounts, StatusHistogram};
