//! Adapters Layer - Concrete Implementations of the Ports
//!
//! Everything that touches the outside world lives here: the HTTP
//! intake server, the venue catalog client, file persistence, and the
//! Prometheus metrics registry. The usecases layer only ever sees the
//! port traits.

pub mod catalog;
pub mod http;
pub mod metrics;
pub mod persistence;
