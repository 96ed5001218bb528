//! Tracing setup shared by the tcpingmap binaries.

mod subscriber;

pub use subscriber::{LogFormat, init, init_tracing};
