// The binary entry point is main.rs; the library exposes the module tree to
// the integration tests and criterion benchmarks.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod session;
pub mod store;
