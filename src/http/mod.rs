//! Request template, transport, and the worker-pool dispatcher.
mod template;
mod tester;
mod transport;
mod worker;

#[cfg(test)]
mod tests;

pub use template::RequestTemplate;
pub use tester::{LoadTestConfig, LoadTester, RunReport};
pub use transport::{HttpTransport, Transport};
