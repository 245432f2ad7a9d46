//! # Exchange Adapters
//!
//! REST adapters for the seven funding venues. Every adapter implements
//! [`ExchangeAdapter`]; failures are absorbed by its provided `fetch` method.

pub mod http;
pub mod registry;
pub mod venues;

pub use exchange_adapter_trait::{ExchangeAdapter, ExchangeAdapters};
pub use http::{build_client, DEFAULT_TIMEOUT};
pub use registry::{build_adapter, default_registry};
