pub mod extractor;
pub mod validator;
pub mod aggregator;
pub mod loader;
