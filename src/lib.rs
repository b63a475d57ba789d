pub mod config;
pub mod error;
pub mod dsl;
pub mod runtime;
pub mod compiler;
pub mod nodes;
