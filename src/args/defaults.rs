pub(crate) const DEFAULT_USER_AGENT: &str = concat!("load-test/", env!("CARGO_PKG_VERSION"));

pub(crate) const DEFAULT_REQUESTS: &str = "500";
pub(crate) const DEFAULT_CONCURRENCY: &str = "100";
pub(crate) const DEFAULT_TIMEOUT: &str = "10s";
