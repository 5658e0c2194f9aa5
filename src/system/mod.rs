pub mod logger;
pub mod summary_output;
