//! Broker Core Components
//!
//! HTTP transport infrastructure shared by the upstream-facing stages.

pub mod transport;

pub use transport::*;
