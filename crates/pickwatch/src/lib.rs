// Library root: re-exports all modules so integration tests and the binary
// can reach the crate's public API.

pub mod app;
pub mod catalog;
pub mod config;
pub mod console;
pub mod db;
pub mod draft;
pub mod plan;
pub mod protocol;
pub mod provider;
pub mod queue;
pub mod recommend;
pub mod sync;
pub mod timer;
pub mod valuation;
