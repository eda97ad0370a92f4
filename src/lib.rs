//! Download/upload throughput, latency and jitter measurement against
//! Cloudflare-style speed test endpoints.

pub mod cloudflare;
pub mod errors;
pub mod measurements;
pub mod progress;
pub mod results;
pub mod stats;

pub use cloudflare::tests::adaptive::AdaptiveSizing;
pub use cloudflare::tests::engine::{SessionConfig, SpeedTestSession};
pub use cloudflare::tests::latency::ProbeConfig;
pub use cloudflare::tests::Direction;
pub use errors::{ErrorKind, SpeedTestError};
pub use results::{Latency, Report, ServerMetadata, SpeedResult};
