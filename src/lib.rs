pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod input;
pub mod model;
pub mod preprocess;
pub mod ranking;
pub mod server;
pub mod service;

/// Number of ranked classes returned for every prediction
pub const TOP_N: usize = 3;

/// Process-level helpers used by the binary
pub mod util {
    use tracing_subscriber::EnvFilter;

    /// Install the global tracing subscriber. `RUST_LOG` wins over the
    /// configured level when it is set.
    pub fn init_tracing(default_level: &str) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        // A second call (e.g. from tests) leaves the first subscriber in place
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}
