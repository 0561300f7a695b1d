//! HTTP request execution and pooled exchange buffers.
mod builders;
mod builders_auth;
mod executor;
mod pool;


pub use executor::{ExecutionFacts, ReqwestExecutor, RequestExecutor};
pub use pool::{ExchangeBuffers, ExchangePool, PooledExchange, RequestRecord, ResponseRecord};
