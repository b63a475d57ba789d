pub mod registry;
pub mod chain;
pub mod cache;
pub mod executor;
pub mod session;
pub mod storage;
pub mod redis_storage;
